use crate::traits::{DynamicalSystem, Scalar, StepError, Steppable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Explicit (forward) Euler Solver
///
/// `y_next = max(y + dt * f(t, y), 0)` component-wise.
pub struct Euler<T: Scalar> {
    k: Vec<T>,
}

impl<T: Scalar> Euler<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            k: vec![T::zero(); dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for Euler<T> {
    fn stages(&self) -> usize {
        1
    }

    fn step<S>(
        &mut self,
        system: &S,
        t: &mut T,
        state: &mut [T],
        dt: T,
    ) -> Result<(), StepError<S::Error>>
    where
        S: DynamicalSystem<T>,
    {
        system
            .apply(*t, state, &mut self.k)
            .map_err(StepError::System)?;

        for i in 0..state.len() {
            self.k[i] = state[i] + dt * self.k[i];
        }
        commit_clamped(&self.k, state)?;

        *t = *t + dt;
        Ok(())
    }
}

/// Classic Runge-Kutta 4th Order Solver
///
/// The combined update is clamped to be non-negative; the intermediate stage
/// states are not.
pub struct RK4<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    tmp: Vec<T>,
}

impl<T: Scalar> RK4<T> {
    pub fn new(dim: usize) -> Self {
        let z = T::zero();
        Self {
            k1: vec![z; dim],
            k2: vec![z; dim],
            k3: vec![z; dim],
            k4: vec![z; dim],
            tmp: vec![z; dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for RK4<T> {
    fn stages(&self) -> usize {
        4
    }

    fn step<S>(
        &mut self,
        system: &S,
        t: &mut T,
        state: &mut [T],
        dt: T,
    ) -> Result<(), StepError<S::Error>>
    where
        S: DynamicalSystem<T>,
    {
        let two = T::one() + T::one();
        let six = two + two + two;
        let half_dt = dt / two;

        let t0 = *t;

        // k1 = f(t, y)
        system
            .apply(t0, state, &mut self.k1)
            .map_err(StepError::System)?;

        // k2 = f(t + dt/2, y + dt/2*k1)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + half_dt * self.k1[i];
        }
        system
            .apply(t0 + half_dt, &self.tmp, &mut self.k2)
            .map_err(StepError::System)?;

        // k3 = f(t + dt/2, y + dt/2*k2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + half_dt * self.k2[i];
        }
        system
            .apply(t0 + half_dt, &self.tmp, &mut self.k3)
            .map_err(StepError::System)?;

        // k4 = f(t + dt, y + dt*k3)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k3[i];
        }
        system
            .apply(t0 + dt, &self.tmp, &mut self.k4)
            .map_err(StepError::System)?;

        // y_next = y + dt/6 * (k1 + 2k2 + 2k3 + k4)
        for i in 0..state.len() {
            self.tmp[i] = state[i]
                + dt / six * (self.k1[i] + two * self.k2[i] + two * self.k3[i] + self.k4[i]);
        }
        commit_clamped(&self.tmp, state)?;

        *t = t0 + dt;
        Ok(())
    }
}

/// Copies `next` into `state` with every slot clamped to be non-negative.
///
/// `max` maps NaN to zero, so finiteness is checked first; on failure
/// `state` is left as it was.
fn commit_clamped<T: Scalar, E>(next: &[T], state: &mut [T]) -> Result<(), StepError<E>> {
    if let Some(index) = next.iter().position(|value| !value.is_finite()) {
        return Err(StepError::NonFinite {
            index,
            value: next[index].to_f64().unwrap_or(f64::NAN),
        });
    }
    for (slot, &value) in state.iter_mut().zip(next) {
        *slot = value.max(T::zero());
    }
    Ok(())
}

/// Named choice of fixed-step rule, resolved once before a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum IntegratorKind {
    Euler,
    #[default]
    Rk4,
}

impl IntegratorKind {
    pub fn build<T: Scalar>(self, dim: usize) -> Stepper<T> {
        match self {
            IntegratorKind::Euler => Stepper::Euler(Euler::new(dim)),
            IntegratorKind::Rk4 => Stepper::Rk4(RK4::new(dim)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IntegratorKind::Euler => "euler",
            IntegratorKind::Rk4 => "rk4",
        }
    }
}

impl fmt::Display for IntegratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown integrator \"{0}\" (expected \"RK4\" or \"Euler\")")]
pub struct UnknownIntegrator(pub String);

impl FromStr for IntegratorKind {
    type Err = UnknownIntegrator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rk4" => Ok(IntegratorKind::Rk4),
            "euler" => Ok(IntegratorKind::Euler),
            _ => Err(UnknownIntegrator(s.to_string())),
        }
    }
}

impl TryFrom<String> for IntegratorKind {
    type Error = UnknownIntegrator;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<IntegratorKind> for String {
    fn from(kind: IntegratorKind) -> Self {
        kind.name().to_string()
    }
}

/// A stepper built from an [`IntegratorKind`].
pub enum Stepper<T: Scalar> {
    Euler(Euler<T>),
    Rk4(RK4<T>),
}

impl<T: Scalar> Steppable<T> for Stepper<T> {
    fn stages(&self) -> usize {
        match self {
            Stepper::Euler(s) => s.stages(),
            Stepper::Rk4(s) => s.stages(),
        }
    }

    fn step<S>(
        &mut self,
        system: &S,
        t: &mut T,
        state: &mut [T],
        dt: T,
    ) -> Result<(), StepError<S::Error>>
    where
        S: DynamicalSystem<T>,
    {
        match self {
            Stepper::Euler(s) => s.step(system, t, state, dt),
            Stepper::Rk4(s) => s.step(system, t, state, dt),
        }
    }
}
