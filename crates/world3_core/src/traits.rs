use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as scalars by the steppers.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// Represents a system of first-order ODEs `dx/dt = f(t, x)`.
pub trait DynamicalSystem<T: Scalar> {
    /// Raised when the right-hand side cannot be evaluated at `(t, x)`.
    type Error;

    /// Returns the dimension of the state space.
    fn dimension(&self) -> usize;

    /// Evaluates the vector field.
    /// t: current time
    /// x: current state
    /// out: buffer to write dx/dt into
    fn apply(&self, t: T, x: &[T], out: &mut [T]) -> Result<(), Self::Error>;
}

/// Failure of a single fixed-step update.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum StepError<E> {
    /// The right-hand side could not be evaluated at one of the stages.
    #[error("{0}")]
    System(E),
    /// The combined update produced a non-finite value before clamping.
    #[error("state slot {index} is not finite after the step ({value})")]
    NonFinite { index: usize, value: f64 },
}

/// A trait for fixed-step solvers that can step a system forward.
pub trait Steppable<T: Scalar> {
    /// Number of right-hand side evaluations per step.
    fn stages(&self) -> usize;

    /// Performs one step of size dt.
    /// t: current time (updated after step)
    /// state: current state (updated after step, clamped to be non-negative)
    /// dt: step size
    ///
    /// On error neither `t` nor `state` is modified.
    fn step<S>(
        &mut self,
        system: &S,
        t: &mut T,
        state: &mut [T],
        dt: T,
    ) -> Result<(), StepError<S::Error>>
    where
        S: DynamicalSystem<T>;
}
