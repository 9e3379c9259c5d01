use std::{
    fs,
    ops::Range,
    path::{Path, PathBuf},
};

use indicatif::{ProgressBar, ProgressStyle};
use lorenz::{Divergence, ExperimentResult, SinkError, TrajectorySink};
use plotters::{coord::Shift, prelude::*};
use tracing::info;

const COLORS: [RGBColor; 2] = [BLUE, RGBColor(255, 140, 0)];

/// Writes `attractor.png` and `divergence.png` into a folder.
#[derive(Debug)]
pub struct PlotSink {
    folder: PathBuf,
    size: (u32, u32),
}

impl PlotSink {
    pub fn new(folder: impl Into<PathBuf>, size: (u32, u32)) -> Self {
        Self {
            folder: folder.into(),
            size,
        }
    }
}

impl TrajectorySink for PlotSink {
    fn name(&self) -> &str {
        "plot"
    }

    fn consume(&mut self, result: &ExperimentResult) -> Result<(), SinkError> {
        fs::create_dir_all(&self.folder)?;

        let path = self.folder.join("attractor.png");
        let root = BitMapBackend::new(&path, self.size).into_drawing_area();
        root.fill(&WHITE)?;
        draw_attractor(&root, result, result.len())?;
        root.present()?;
        info!(path = %path.display(), "wrote attractor plot");

        let path = self.folder.join("divergence.png");
        let root = BitMapBackend::new(&path, self.size).into_drawing_area();
        root.fill(&WHITE)?;
        draw_divergence(&root, result)?;
        root.present()?;
        info!(path = %path.display(), "wrote divergence plot");
        Ok(())
    }
}

/// Writes `attractor.gif`, tracing both trajectories out over time.
#[derive(Debug)]
pub struct AnimationSink {
    path: PathBuf,
    size: (u32, u32),
    frames: usize,
    delay_ms: u32,
}

impl AnimationSink {
    pub fn new(folder: &Path, size: (u32, u32), frames: usize, delay_ms: u32) -> Self {
        Self {
            path: folder.join("attractor.gif"),
            size,
            frames,
            delay_ms,
        }
    }
}

impl TrajectorySink for AnimationSink {
    fn name(&self) -> &str {
        "animation"
    }

    fn consume(&mut self, result: &ExperimentResult) -> Result<(), SinkError> {
        if let Some(folder) = self.path.parent() {
            fs::create_dir_all(folder)?;
        }
        let ends = frame_ends(result.len(), self.frames);

        let progress = ProgressBar::new(ends.len() as u64);
        progress.set_style(ProgressStyle::with_template(
            "{msg} [{bar:40.cyan/blue}] {pos}/{len} frames",
        )?);
        progress.set_message("animating");

        let root = BitMapBackend::gif(&self.path, self.size, self.delay_ms)?.into_drawing_area();
        for &end in &ends {
            root.fill(&WHITE)?;
            draw_attractor(&root, result, end)?;
            root.present()?;
            progress.inc(1);
        }
        progress.finish_and_clear();

        info!(path = %self.path.display(), frames = ends.len(), "wrote animation");
        Ok(())
    }
}

/// Draws both trajectories up to sample `end` in 3-D, with z vertical and a marker
/// on each trajectory's latest point.
fn draw_attractor<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    result: &ExperimentResult,
    end: usize,
) -> Result<(), SinkError>
where
    DB::ErrorType: 'static,
{
    let [x, y, z] = result.bounds();
    let mut chart = ChartBuilder::on(area)
        .caption("Lorenz Attractor", ("sans-serif", 30))
        .margin(20)
        .build_cartesian_3d(padded(x, 0.05), padded(z, 0.05), padded(y, 0.05))?;

    chart.with_projection(|mut pb| {
        pb.pitch = 0.25;
        pb.yaw = 0.7;
        pb.scale = 0.85;
        pb.into_matrix()
    });

    chart
        .configure_axes()
        .light_grid_style(BLACK.mix(0.1))
        .max_light_lines(3)
        .draw()?;

    for (i, (trajectory, color)) in result.trajectories().iter().zip(COLORS).enumerate() {
        let states = &trajectory.states()[..end.min(trajectory.len())];
        let initial = trajectory.initial();

        chart
            .draw_series(LineSeries::new(
                states.iter().map(|s| (s[0], s[2], s[1])),
                color.mix(0.8).stroke_width(1),
            ))?
            .label(format!(
                "Trajectory {}: ({}, {}, {})",
                i + 1,
                initial[0],
                initial[1],
                initial[2]
            ))
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });

        if let Some(s) = states.last() {
            chart.draw_series(std::iter::once(Circle::new(
                (s[0], s[2], s[1]),
                4,
                color.filled(),
            )))?;
        }
    }

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()?;
    Ok(())
}

/// Draws the separation of the two trajectories against time on a log axis.
fn draw_divergence<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    result: &ExperimentResult,
) -> Result<(), SinkError>
where
    DB::ErrorType: 'static,
{
    let times = result.times();
    let distances = result.divergence();
    let (t0, t1) = match (times.first(), times.last()) {
        (Some(&t0), Some(&t1)) => (t0, t1),
        _ => result.config().t_span,
    };

    let mut chart = ChartBuilder::on(area)
        .caption("Divergence of Nearby Trajectories", ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(
            padded((t0, t1), 0.0),
            log_range(distances.floored()).log_scale(),
        )?;

    chart
        .configure_mesh()
        .x_desc("Time")
        .y_desc("Distance")
        .y_label_formatter(&|v| format!("{v:.0e}"))
        .draw()?;

    chart.draw_series(LineSeries::new(
        times.iter().copied().zip(distances.floored()),
        RED.stroke_width(2),
    ))?;
    Ok(())
}

/// `(min, max)` widened by `fraction` of its width on each side. Degenerate ranges
/// get a unit margin.
fn padded((min, max): (f64, f64), fraction: f64) -> Range<f64> {
    let width = max - min;
    let margin = if width > 0.0 { width * fraction } else { 1.0 };
    (min - margin)..(max + margin)
}

/// Axis range covering every floored distance, for a log scale.
fn log_range(distances: impl Iterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = distances
        .map(|d| d.max(Divergence::FLOOR))
        .fold((f64::INFINITY, 0.0_f64), |(lo, hi), d| (lo.min(d), hi.max(d)));
    if hi <= lo {
        let d = if lo.is_finite() { lo } else { 1.0 };
        return (d / 10.0)..(d * 10.0);
    }
    (lo / 2.0)..(hi * 2.0)
}

/// Exclusive sample indices at which each animation frame ends. Every frame shows
/// at least one sample and the last frame shows them all.
fn frame_ends(samples: usize, frames: usize) -> Vec<usize> {
    let frames = frames.clamp(1, samples.max(1));
    let mut ends: Vec<usize> = (1..=frames)
        .map(|f| (samples * f).div_ceil(frames).max(1))
        .collect();
    ends.dedup();
    ends
}
