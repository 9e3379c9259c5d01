//! Command line front end: integrates two nearby Lorenz trajectories and renders
//! or exports how quickly they separate.

mod config;
mod error;
mod export;
mod logging;
mod render;

use std::{
    error::Error,
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
    time::Duration,
};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::ProgressBar;
use lorenz::{Divergence, Experiment, ExperimentConfig, ExperimentResult, TrajectorySink, deliver};
use tracing::{error, info};

use crate::{
    config::Overrides,
    error::CliError,
    export::CsvSink,
    render::{AnimationSink, PlotSink},
};

#[derive(Debug, Parser)]
#[command(
    name = "butterfly",
    version,
    about = "Sensitive dependence on initial conditions in the Lorenz system"
)]
struct Cli {
    /// Experiment configuration in RON format
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Folder for plots, animations and exports
    #[arg(short, long, global = true, default_value = ".")]
    output: PathBuf,

    /// Number of evenly spaced sample times
    #[arg(long, global = true)]
    samples: Option<usize>,

    /// End of the integration time span
    #[arg(long, global = true)]
    t_end: Option<f64>,

    /// Integrate the two trajectories one after the other
    #[arg(long, global = true)]
    no_parallel: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Debug, Subcommand)]
enum Commands {
    /// Run the experiment and print a summary
    Run,
    /// Write attractor.png and divergence.png
    Plot {
        #[arg(long, default_value_t = 1200)]
        width: u32,
        #[arg(long, default_value_t = 900)]
        height: u32,
    },
    /// Write attractor.gif, tracing both trajectories out over time
    Animate {
        #[arg(long, default_value_t = 300)]
        frames: usize,
        #[arg(long, default_value_t = 20)]
        delay_ms: u32,
        #[arg(long, default_value_t = 800)]
        width: u32,
        #[arg(long, default_value_t = 600)]
        height: u32,
    },
    /// Write trajectories.csv and divergence.csv
    Export,
    /// Print the default configuration, or write it to PATH
    Init { path: Option<PathBuf> },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            let mut source = e.source();
            while let Some(cause) = source {
                error!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let command = cli.command.clone().unwrap_or(Commands::Run);
    let overrides = Overrides {
        samples: cli.samples,
        t_end: cli.t_end,
        sequential: cli.no_parallel,
    };

    if let Commands::Init { path } = &command {
        return init(path.as_deref(), overrides);
    }

    let config = config::resolve(cli.config.as_deref(), overrides)?;
    let experiment = Experiment::new(config)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_message("integrating trajectories");
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = experiment.run();
    spinner.finish_and_clear();
    let result = result?;

    print_summary(&result);

    let mut sinks = sinks_for(&command, &cli.output);
    deliver(&result, &mut sinks)?;
    Ok(())
}

fn sinks_for(command: &Commands, output: &Path) -> Vec<Box<dyn TrajectorySink>> {
    match *command {
        Commands::Run | Commands::Init { .. } => Vec::new(),
        Commands::Plot { width, height } => vec![Box::new(PlotSink::new(output, (width, height)))],
        Commands::Animate {
            frames,
            delay_ms,
            width,
            height,
        } => vec![Box::new(AnimationSink::new(
            output,
            (width, height),
            frames,
            delay_ms,
        ))],
        Commands::Export => vec![Box::new(CsvSink::new(output))],
    }
}

fn init(path: Option<&Path>, overrides: Overrides) -> Result<(), CliError> {
    let mut config = ExperimentConfig::default();
    overrides.apply(&mut config);
    let text = config::to_ron(&config)?;
    match path {
        Some(path) => {
            fs::write(path, text).map_err(|source| CliError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            info!(path = %path.display(), "wrote default config");
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn print_summary(result: &ExperimentResult) {
    let config = result.config();
    let d = result.divergence();
    println!("{}", "Lorenz butterfly effect".bold().underline());
    println!("  {:<22}{}", "parameters".bold(), config.parameters);
    for (i, trajectory) in result.trajectories().iter().enumerate() {
        let stats = trajectory.stats();
        let x0 = trajectory.initial();
        println!(
            "  {:<22}({}, {}, {})  {} steps, {} rejected, {} evals",
            format!("trajectory {}", i + 1).bold(),
            x0[0],
            x0[1],
            x0[2],
            stats.accepted_steps,
            stats.rejected_steps,
            stats.fn_evals,
        );
    }
    println!(
        "  {:<22}{} over t in [{}, {}]",
        "samples".bold(),
        result.len(),
        config.t_span.0,
        config.t_span.1
    );
    if let (Some(first), Some(last), Some(max)) = (d.initial(), d.last(), d.max()) {
        println!("  {:<22}{}", "initial divergence".bold(), format!("{first:.3e}").green());
        println!("  {:<22}{}", "final divergence".bold(), format!("{last:.3e}").yellow());
        println!("  {:<22}{}", "max divergence".bold(), format!("{max:.3e}").red());
    }
    if let Some((start, end)) = growth_window(result.times(), d) {
        if let Ok(rate) = d.lyapunov_estimate(result.times(), start, end) {
            println!(
                "  {:<22}{} over t in [{start}, {end:.2}]",
                "growth rate".bold(),
                format!("{rate:.3}").cyan()
            );
        }
    }
}

/// Separation treated as attractor-sized.
const SATURATION: f64 = 1.0;

/// From the first sample to the first sample whose divergence reaches
/// [`SATURATION`], or `None` if the separation never gets there.
fn growth_window(times: &[f64], divergence: &Divergence) -> Option<(f64, f64)> {
    let start = *times.first()?;
    let end = times
        .iter()
        .zip(divergence.iter())
        .find(|(_, d)| **d >= SATURATION)
        .map(|(t, _)| *t)?;
    (end > start).then_some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use lorenz::LorenzState;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_run() {
        let cli = Cli::try_parse_from(["butterfly"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.output, PathBuf::from("."));
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn global_options_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "butterfly", "plot", "--samples", "500", "--t-end", "20", "--no-parallel", "-vv",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::Plot { width: 1200, height: 900 })));
        assert_eq!(cli.samples, Some(500));
        assert_eq!(cli.t_end, Some(20.0));
        assert!(cli.no_parallel);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn animate_options_parse() {
        let cli = Cli::try_parse_from([
            "butterfly",
            "animate",
            "--frames",
            "50",
            "--delay-ms",
            "40",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Animate { frames: 50, delay_ms: 40, .. })
        ));
    }

    #[test]
    fn each_command_gets_its_sinks() {
        let output = Path::new("out");
        assert!(sinks_for(&Commands::Run, output).is_empty());
        assert_eq!(sinks_for(&Commands::Export, output)[0].name(), "csv");
        assert_eq!(
            sinks_for(&Commands::Plot { width: 10, height: 10 }, output)[0].name(),
            "plot"
        );
    }

    fn separations(values: &[f64]) -> Divergence {
        let origin: Vec<LorenzState> = values.iter().map(|_| LorenzState::default()).collect();
        let offset: Vec<LorenzState> = values
            .iter()
            .map(|&v| LorenzState::new([v, 0.0, 0.0]))
            .collect();
        lorenz::divergence(&origin, &offset).unwrap()
    }

    #[test]
    fn growth_window_ends_at_saturation() {
        let times = [0.0, 1.0, 2.0, 3.0];
        let d = separations(&[1e-4, 1e-2, 2.0, 5.0]);
        assert_eq!(growth_window(&times, &d), Some((0.0, 2.0)));

        let rate = d.lyapunov_estimate(&times, 0.0, 2.0).unwrap();
        assert!(rate > 0.0);
    }

    #[test]
    fn no_growth_window_without_saturation() {
        let times = [0.0, 1.0, 2.0];
        let small = separations(&[1e-4, 1e-3, 1e-2]);
        assert_eq!(growth_window(&times, &small), None);
        let saturated = separations(&[3.0, 4.0, 5.0]);
        assert_eq!(growth_window(&times, &saturated), None);
    }

    #[test]
    fn init_writes_a_loadable_config() {
        let path = std::env::temp_dir().join(format!("butterfly-{}-init.ron", std::process::id()));
        let overrides = Overrides {
            samples: Some(123),
            ..Default::default()
        };
        init(Some(&path), overrides).unwrap();
        let config = config::load(&path).unwrap();
        assert_eq!(config.samples, 123);
        fs::remove_file(&path).unwrap();
    }
}
