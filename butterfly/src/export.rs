use std::{fs, path::PathBuf};

use csv::Writer;
use lorenz::{ExperimentResult, SinkError, TrajectorySink};
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
struct TrajectoryRow {
    t: f64,
    x1: f64,
    y1: f64,
    z1: f64,
    x2: f64,
    y2: f64,
    z2: f64,
}

#[derive(Serialize)]
struct DivergenceRow {
    t: f64,
    divergence: f64,
}

/// Writes `trajectories.csv` and `divergence.csv` into a folder, one row per sample.
#[derive(Debug)]
pub struct CsvSink {
    folder: PathBuf,
}

impl CsvSink {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }
}

impl TrajectorySink for CsvSink {
    fn name(&self) -> &str {
        "csv"
    }

    fn consume(&mut self, result: &ExperimentResult) -> Result<(), SinkError> {
        fs::create_dir_all(&self.folder)?;
        let [a, b] = result.trajectories();

        let path = self.folder.join("trajectories.csv");
        let mut writer = Writer::from_path(&path)?;
        for ((&t, p), q) in result.times().iter().zip(a.states()).zip(b.states()) {
            writer.serialize(TrajectoryRow {
                t,
                x1: p[0],
                y1: p[1],
                z1: p[2],
                x2: q[0],
                y2: q[1],
                z2: q[2],
            })?;
        }
        writer.flush()?;
        info!(path = %path.display(), rows = result.len(), "wrote trajectories");

        let path = self.folder.join("divergence.csv");
        let mut writer = Writer::from_path(&path)?;
        for (&t, &divergence) in result.times().iter().zip(result.divergence().iter()) {
            writer.serialize(DivergenceRow { t, divergence })?;
        }
        writer.flush()?;
        info!(path = %path.display(), rows = result.len(), "wrote divergence");
        Ok(())
    }
}
