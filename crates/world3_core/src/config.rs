use crate::model::{Component, Params, State};
use crate::solvers::{IntegratorKind, UnknownIntegrator};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Upper bound on time grid length accepted by [`SimulationConfig::validate`].
pub const MAX_GRID_POINTS: usize = 50_000_000;

fn default_dt() -> f64 {
    1.0
}

fn default_t_max() -> f64 {
    200.0
}

/// Everything one simulation run needs.
///
/// Missing fields fall back to the default scenario, so a YAML file only has
/// to name what it changes:
///
/// ```yaml
/// params:
///   birth_rate: 0.04
/// initial_state:
///   pollution: 0.1
/// integrator: Euler
/// dt: 0.5
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub initial_state: State,
    #[serde(default, alias = "name_integrator")]
    pub integrator: IntegratorKind,
    #[serde(default = "default_dt")]
    pub dt: f64,
    #[serde(default = "default_t_max", alias = "tmax")]
    pub t_max: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            params: Params::default(),
            initial_state: State::default(),
            integrator: IntegratorKind::default(),
            dt: default_dt(),
            t_max: default_t_max(),
        }
    }
}

/// Rejected run settings, raised before any integration work.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("step size dt must be positive (got {0})")]
    NonPositiveStep(f64),
    #[error("horizon t_max must be positive (got {0})")]
    NonPositiveHorizon(f64),
    #[error("{field} must be finite (got {value})")]
    NonFinite { field: &'static str, value: f64 },
    #[error("initial {component} must be finite and non-negative (got {value})")]
    InvalidInitialState { component: Component, value: f64 },
    #[error("system dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("time grid of {points} points exceeds the limit of {}", MAX_GRID_POINTS)]
    GridTooLarge { points: f64 },
    #[error(transparent)]
    UnknownIntegrator(#[from] UnknownIntegrator),
}

impl SimulationConfig {
    /// Parses a YAML scenario.
    pub fn from_yaml_str(data: &str) -> Result<Self> {
        serde_yaml::from_str(data).context("Failed to parse simulation config")
    }

    /// Reads and parses a YAML scenario file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_yaml::from_str(&data).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Checks the step settings, parameters and initial state.
    ///
    /// Zero denominators inside the rate equations (e.g. `resource_efficiency
    /// = 0`) are left to the rate function, which reports them as domain
    /// errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_grid(self.dt, self.t_max)?;

        for (field, value) in Params::NAMES.into_iter().zip(self.params.to_array()) {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field, value });
            }
        }

        validate_state(&self.initial_state)
    }
}

/// Checks that every stock is finite and non-negative.
pub fn validate_state(state: &State) -> Result<(), ConfigError> {
    for component in Component::ALL {
        let value = state.get(component);
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::InvalidInitialState { component, value });
        }
    }
    Ok(())
}

/// Checks `dt` and `t_max` and returns the time grid length.
pub fn validate_grid(dt: f64, t_max: f64) -> Result<usize, ConfigError> {
    if !dt.is_finite() {
        return Err(ConfigError::NonFinite {
            field: "dt",
            value: dt,
        });
    }
    if !t_max.is_finite() {
        return Err(ConfigError::NonFinite {
            field: "t_max",
            value: t_max,
        });
    }
    if dt <= 0.0 {
        return Err(ConfigError::NonPositiveStep(dt));
    }
    if t_max <= 0.0 {
        return Err(ConfigError::NonPositiveHorizon(t_max));
    }

    let points = (t_max / dt).ceil();
    if points > MAX_GRID_POINTS as f64 {
        return Err(ConfigError::GridTooLarge { points });
    }
    Ok(points as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_standard_run() {
        let config = SimulationConfig::default();
        assert_eq!(config.integrator, IntegratorKind::Rk4);
        assert_eq!(config.dt, 1.0);
        assert_eq!(config.t_max, 200.0);
        assert_eq!(config.params.food_impact_on_death, 2.0);
        assert_eq!(config.initial_state.pollution, 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = SimulationConfig::from_yaml_str("{}").expect("empty mapping parses");
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn partial_yaml_overrides_only_named_fields() {
        let yaml = "\
params:
  birth_rate: 0.05
initial_state:
  pollution: 0.25
name_integrator: Euler
tmax: 50
";
        let config = SimulationConfig::from_yaml_str(yaml).expect("yaml parses");
        assert_eq!(config.params.birth_rate, 0.05);
        assert_eq!(config.params.death_rate, 0.01);
        assert_eq!(config.initial_state.pollution, 0.25);
        assert_eq!(config.initial_state.population, 1.0);
        assert_eq!(config.integrator, IntegratorKind::Euler);
        assert_eq!(config.t_max, 50.0);
        assert_eq!(config.dt, 1.0);
    }

    #[test]
    fn unknown_integrator_in_yaml_is_rejected() {
        let err = SimulationConfig::from_yaml_str("integrator: leapfrog")
            .expect_err("unknown integrator must fail");
        assert!(format!("{err:#}").contains("leapfrog"));
    }

    #[test]
    fn load_reads_file_and_reports_missing_path() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "dt: 0.25").expect("write");
        let config = SimulationConfig::load(file.path()).expect("config loads");
        assert_eq!(config.dt, 0.25);

        let err = SimulationConfig::load("does/not/exist.yaml").expect_err("missing file");
        assert!(format!("{err}").contains("Failed to read config file"));
    }

    #[test]
    fn validate_rejects_bad_step_settings() {
        let zero_dt = SimulationConfig {
            dt: 0.0,
            ..SimulationConfig::default()
        };
        assert_eq!(zero_dt.validate(), Err(ConfigError::NonPositiveStep(0.0)));

        let zero_horizon = SimulationConfig {
            t_max: 0.0,
            ..SimulationConfig::default()
        };
        assert_eq!(
            zero_horizon.validate(),
            Err(ConfigError::NonPositiveHorizon(0.0))
        );

        assert!(matches!(
            validate_grid(f64::NAN, 1.0),
            Err(ConfigError::NonFinite { field: "dt", .. })
        ));
        assert!(matches!(
            validate_grid(1e-12, 1e6),
            Err(ConfigError::GridTooLarge { .. })
        ));
    }

    #[test]
    fn validate_rejects_bad_params_and_initial_state() {
        let mut config = SimulationConfig::default();
        config.params.pollution_decay = f64::INFINITY;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFinite {
                field: "pollution_decay",
                ..
            })
        ));

        let mut config = SimulationConfig::default();
        config.initial_state.arable_land = -0.5;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidInitialState {
                component: Component::ArableLand,
                value: -0.5
            })
        );
    }

    #[test]
    fn grid_length_is_ceiling_of_horizon_over_step() {
        assert_eq!(validate_grid(1.0, 2.0), Ok(2));
        assert_eq!(validate_grid(1.0, 200.0), Ok(200));
        assert_eq!(validate_grid(0.3, 1.0), Ok(4));
        assert_eq!(validate_grid(2.0, 1.0), Ok(1));
    }
}
