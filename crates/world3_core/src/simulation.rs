//! Fixed-step simulation driver.
//!
//! The time grid is the half-open interval `[0, t_max)` sampled every `dt`:
//! `grid[i] = i * dt` for `i < ceil(t_max / dt)`. The trajectory holds one
//! state per grid point, starting with the initial state.

use crate::config::{validate_grid, ConfigError, SimulationConfig};
use crate::model::{Component, DomainError, State, World3, STATE_DIM};
use crate::solvers::IntegratorKind;
use crate::traits::{DynamicalSystem, Steppable};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("numeric domain error computing step {step} from t = {time} ({component}): {source}")]
    Domain {
        /// Index of the grid point being computed.
        step: usize,
        /// Grid time the step started from.
        time: f64,
        component: Component,
        #[source]
        source: DomainError,
    },
}

/// The complete output of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    pub integrator: IntegratorKind,
    pub dt: f64,
    pub t_max: f64,
    pub times: Vec<f64>,
    pub states: Vec<State>,
}

impl Simulation {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn final_state(&self) -> Option<&State> {
        self.states.last()
    }

    /// One component across the whole trajectory.
    pub fn series(&self, component: Component) -> Vec<f64> {
        self.states.iter().map(|state| state.get(component)).collect()
    }

    /// Time and value of the first maximum of `component`.
    pub fn peak(&self, component: Component) -> Option<(f64, f64)> {
        self.times
            .iter()
            .zip(&self.states)
            .map(|(&t, state)| (t, state.get(component)))
            .fold(None, |best, (t, value)| match best {
                Some((_, best_value)) if best_value >= value => best,
                _ => Some((t, value)),
            })
    }
}

/// Builds `[0, dt, 2dt, ...]` strictly below `t_max`.
pub fn time_grid(dt: f64, t_max: f64) -> Result<Vec<f64>, ConfigError> {
    let points = validate_grid(dt, t_max)?;
    Ok((0..points).map(|i| i as f64 * dt).collect())
}

/// Validates `config` and runs the World3 model over its time grid.
pub fn simulate(config: &SimulationConfig) -> Result<Simulation, SimulationError> {
    config.validate()?;

    let system = World3::new(config.params);
    let (times, states) = integrate(
        &system,
        config.integrator,
        &config.initial_state,
        config.dt,
        config.t_max,
    )?;

    Ok(Simulation {
        integrator: config.integrator,
        dt: config.dt,
        t_max: config.t_max,
        times,
        states,
    })
}

/// Advances `initial` across the time grid with the chosen integrator.
///
/// Any six-dimensional system can be driven; the stepper is built once
/// before the loop. The first failing step aborts the run.
pub fn integrate<S>(
    system: &S,
    integrator: IntegratorKind,
    initial: &State,
    dt: f64,
    t_max: f64,
) -> Result<(Vec<f64>, Vec<State>), SimulationError>
where
    S: DynamicalSystem<f64, Error = DomainError>,
{
    if system.dimension() != STATE_DIM {
        return Err(ConfigError::DimensionMismatch {
            expected: STATE_DIM,
            actual: system.dimension(),
        }
        .into());
    }

    let times = time_grid(dt, t_max)?;
    let mut stepper = integrator.build::<f64>(STATE_DIM);
    let mut states = Vec::with_capacity(times.len());
    states.push(*initial);

    let mut x = initial.to_array();
    for step in 1..times.len() {
        let time = times[step - 1];
        let mut t = time;
        let fail = |source: DomainError| SimulationError::Domain {
            step,
            time,
            component: source.component(),
            source,
        };

        stepper
            .step(system, &mut t, &mut x, dt)
            .map_err(|err| fail(err.into()))?;

        states.push(State::from_array(x));
    }

    Ok((times, states))
}
