use std::{fs, path::Path};

use lorenz::ExperimentConfig;
use ron::{Options, extensions::Extensions, ser::PrettyConfig};

use crate::error::CliError;

/// Command line values that take precedence over the config file.
#[derive(Clone, Copy, Debug, Default)]
pub struct Overrides {
    pub samples: Option<usize>,
    pub t_end: Option<f64>,
    pub sequential: bool,
}

impl Overrides {
    pub fn apply(&self, config: &mut ExperimentConfig) {
        if let Some(samples) = self.samples {
            config.samples = samples;
        }
        if let Some(t_end) = self.t_end {
            config.t_span.1 = t_end;
        }
        if self.sequential {
            config.parallel = false;
        }
    }
}

pub fn load(path: &Path) -> Result<ExperimentConfig, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    from_ron(&text).map_err(|source| CliError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses a config. Optional fields may be written as a bare value.
pub fn from_ron(text: &str) -> Result<ExperimentConfig, ron::error::SpannedError> {
    Options::default()
        .with_default_extension(Extensions::IMPLICIT_SOME)
        .from_str(text)
}

pub fn to_ron(config: &ExperimentConfig) -> Result<String, CliError> {
    Ok(ron::ser::to_string_pretty(config, PrettyConfig::default())?)
}

/// Loads `path` if given, else the reference configuration, then applies `overrides`.
pub fn resolve(path: Option<&Path>, overrides: Overrides) -> Result<ExperimentConfig, CliError> {
    let mut config = match path {
        Some(path) => load(path)?,
        None => ExperimentConfig::default(),
    };
    overrides.apply(&mut config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lorenz::AdaptiveStepControl;

    #[test]
    fn default_config_round_trips() {
        let config = ExperimentConfig::default();
        let text = to_ron(&config).unwrap();
        assert_eq!(from_ron(&text).unwrap(), config);
    }

    #[test]
    fn custom_solver_round_trips() {
        let config = ExperimentConfig {
            solver: AdaptiveStepControl::default()
                .with_rel_tol(1e-9)
                .with_max_dt(0.01)
                .with_max_steps(1_000_000),
            ..Default::default()
        };
        let text = to_ron(&config).unwrap();
        assert_eq!(from_ron(&text).unwrap(), config);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config =
            from_ron("(samples: 500, parameters: (sigma: 10.0, beta: 1.0, rho: 14.0))").unwrap();
        assert_eq!(config.samples, 500);
        assert_eq!(config.parameters.rho, 14.0);
        assert_eq!(config.t_span, (0.0, 100.0));
        assert_eq!(config.solver, AdaptiveStepControl::default());
    }

    #[test]
    fn documented_example_is_the_default() {
        let text = r#"
ExperimentConfig(
    parameters: (sigma: 10.0, beta: 2.6666666666666665, rho: 28.0),
    initial_conditions: ((1.0, 1.0, 1.0), (1.0001, 1.0, 1.0)),
    t_span: (0.0, 100.0),
    samples: 15000,
    solver: (rel_tol: 1e-3, abs_tol: 1e-6, max_dt: None, min_dt: None, max_steps: None),
    parallel: true,
)
"#;
        assert_eq!(from_ron(text).unwrap(), ExperimentConfig::default());
    }

    #[test]
    fn optional_fields_accept_bare_values() {
        let text = "(solver: (max_steps: 1000000, max_dt: Some(0.01)))";
        let config = from_ron(text).unwrap();
        assert_eq!(config.solver.max_steps, Some(1_000_000));
        assert_eq!(config.solver.max_dt, Some(0.01));
        assert_eq!(config.solver.min_dt, None);
    }

    #[test]
    fn malformed_config_is_a_parse_error() {
        assert!(from_ron("(samples: \"many\")").is_err());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load(Path::new("/nonexistent/butterfly.ron")).unwrap_err();
        assert!(matches!(err, CliError::ConfigRead { .. }));
    }

    #[test]
    fn overrides_win_over_file_values() {
        let overrides = Overrides {
            samples: Some(42),
            t_end: Some(7.5),
            sequential: true,
        };
        let config = resolve(None, overrides).unwrap();
        assert_eq!(config.samples, 42);
        assert_eq!(config.t_span, (0.0, 7.5));
        assert!(!config.parallel);
    }
}
