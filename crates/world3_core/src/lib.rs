//! The `world3_core` crate provides the numerical engine for the World3-lite simulator.
//! It integrates a fixed six-stock population/resource/pollution model with
//! fixed-step integrators and returns the full trajectory.
//!
//! Key components:
//! - **Traits**: `Scalar` (numeric type abstraction), `DynamicalSystem` (fallible ODE right-hand side), `Steppable` (Solvers).
//! - **Model**: named `State`/`Params` records and the `derivatives` rate function.
//! - **Solvers**: clamping fixed-step integrators (Euler, RK4) selected by `IntegratorKind`.
//! - **Simulation**: time grid construction and the `simulate` driver.
//! - **Config**: run settings with defaults, YAML loading and validation.

pub mod config;
pub mod model;
pub mod simulation;
pub mod solvers;
pub mod traits;

pub use config::{ConfigError, SimulationConfig};
pub use model::{derivatives, Component, DomainError, Params, State, World3};
pub use simulation::{simulate, Simulation, SimulationError};
pub use solvers::IntegratorKind;
pub use traits::StepError;
