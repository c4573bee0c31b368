//! The World3-lite rate equations.
//!
//! Six stocks (population, resources, industrial capital, food production,
//! pollution and arable land) evolve under ten fixed coefficients. The
//! right-hand side floors every derivative at `-x` so a single unit Euler
//! step cannot push a stock below zero; the steppers clamp again after each
//! step.

use crate::traits::{DynamicalSystem, StepError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of stocks tracked by the model.
pub const STATE_DIM: usize = 6;

/// Number of coefficients governing the rate equations.
pub const PARAM_COUNT: usize = 10;

/// Names the six state slots, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Population,
    Resources,
    IndustrialCapital,
    FoodProduction,
    Pollution,
    ArableLand,
}

impl Component {
    pub const ALL: [Component; STATE_DIM] = [
        Component::Population,
        Component::Resources,
        Component::IndustrialCapital,
        Component::FoodProduction,
        Component::Pollution,
        Component::ArableLand,
    ];

    pub fn index(self) -> usize {
        match self {
            Component::Population => 0,
            Component::Resources => 1,
            Component::IndustrialCapital => 2,
            Component::FoodProduction => 3,
            Component::Pollution => 4,
            Component::ArableLand => 5,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Column name used by tabular outputs.
    pub fn key(self) -> &'static str {
        match self {
            Component::Population => "population",
            Component::Resources => "resources",
            Component::IndustrialCapital => "industrial_capital",
            Component::FoodProduction => "food_production",
            Component::Pollution => "pollution",
            Component::ArableLand => "arable_land",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Model state. Every component is non-negative after each integration step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct State {
    pub population: f64,
    pub resources: f64,
    pub industrial_capital: f64,
    pub food_production: f64,
    pub pollution: f64,
    pub arable_land: f64,
}

impl State {
    pub fn from_array(values: [f64; STATE_DIM]) -> Self {
        let [population, resources, industrial_capital, food_production, pollution, arable_land] =
            values;
        Self {
            population,
            resources,
            industrial_capital,
            food_production,
            pollution,
            arable_land,
        }
    }

    pub fn to_array(&self) -> [f64; STATE_DIM] {
        [
            self.population,
            self.resources,
            self.industrial_capital,
            self.food_production,
            self.pollution,
            self.arable_land,
        ]
    }

    /// Builds a state from a slice, returning `None` on a length mismatch.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        let array: [f64; STATE_DIM] = values.try_into().ok()?;
        Some(Self::from_array(array))
    }

    pub fn get(&self, component: Component) -> f64 {
        match component {
            Component::Population => self.population,
            Component::Resources => self.resources,
            Component::IndustrialCapital => self.industrial_capital,
            Component::FoodProduction => self.food_production,
            Component::Pollution => self.pollution,
            Component::ArableLand => self.arable_land,
        }
    }

    /// Applies `max(d_x, -x)` to each derivative component.
    fn floor_against(self, stocks: &State) -> Self {
        Self {
            population: self.population.max(-stocks.population),
            resources: self.resources.max(-stocks.resources),
            industrial_capital: self.industrial_capital.max(-stocks.industrial_capital),
            food_production: self.food_production.max(-stocks.food_production),
            pollution: self.pollution.max(-stocks.pollution),
            arable_land: self.arable_land.max(-stocks.arable_land),
        }
    }
}

/// The default scenario's initial conditions.
impl Default for State {
    fn default() -> Self {
        Self {
            population: 1.0,
            resources: 1.0,
            industrial_capital: 1.0,
            food_production: 1.0,
            pollution: 0.0,
            arable_land: 1.0,
        }
    }
}

/// Coefficients of the rate equations, fixed for one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub birth_rate: f64,
    pub death_rate: f64,
    pub resource_efficiency: f64,
    pub pollution_decay: f64,
    pub investment_rate: f64,
    pub depreciation_rate: f64,
    pub industrial_productivity: f64,
    pub land_degradation_rate: f64,
    pub pollution_impact_on_death: f64,
    pub food_impact_on_death: f64,
}

impl Params {
    pub const NAMES: [&'static str; PARAM_COUNT] = [
        "birth_rate",
        "death_rate",
        "resource_efficiency",
        "pollution_decay",
        "investment_rate",
        "depreciation_rate",
        "industrial_productivity",
        "land_degradation_rate",
        "pollution_impact_on_death",
        "food_impact_on_death",
    ];

    pub fn from_array(values: [f64; PARAM_COUNT]) -> Self {
        let [birth_rate, death_rate, resource_efficiency, pollution_decay, investment_rate, depreciation_rate, industrial_productivity, land_degradation_rate, pollution_impact_on_death, food_impact_on_death] =
            values;
        Self {
            birth_rate,
            death_rate,
            resource_efficiency,
            pollution_decay,
            investment_rate,
            depreciation_rate,
            industrial_productivity,
            land_degradation_rate,
            pollution_impact_on_death,
            food_impact_on_death,
        }
    }

    pub fn to_array(&self) -> [f64; PARAM_COUNT] {
        [
            self.birth_rate,
            self.death_rate,
            self.resource_efficiency,
            self.pollution_decay,
            self.investment_rate,
            self.depreciation_rate,
            self.industrial_productivity,
            self.land_degradation_rate,
            self.pollution_impact_on_death,
            self.food_impact_on_death,
        ]
    }

    /// Builds parameters from a slice, returning `None` on a length mismatch.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        let array: [f64; PARAM_COUNT] = values.try_into().ok()?;
        Some(Self::from_array(array))
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            birth_rate: 0.03,
            death_rate: 0.01,
            resource_efficiency: 0.02,
            pollution_decay: 0.005,
            investment_rate: 0.2,
            depreciation_rate: 0.1,
            industrial_productivity: 0.1,
            land_degradation_rate: 0.01,
            pollution_impact_on_death: 1.0,
            food_impact_on_death: 2.0,
        }
    }
}

/// Failure to evaluate the rate equations at a given state.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("population is zero; food production term F / P is undefined")]
    ZeroPopulation,
    #[error("resource_efficiency is zero; resource usage is undefined")]
    ZeroResourceEfficiency,
    #[error("industrial growth denominator vanishes at resources = {resources}")]
    SingularGrowthDenominator { resources: f64 },
    #[error("{component} is not finite ({value})")]
    NonFinite { component: Component, value: f64 },
}

impl DomainError {
    /// The state component whose value made the evaluation fail.
    pub fn component(&self) -> Component {
        match self {
            DomainError::ZeroPopulation => Component::Population,
            DomainError::ZeroResourceEfficiency => Component::Resources,
            DomainError::SingularGrowthDenominator { .. } => Component::Resources,
            DomainError::NonFinite { component, .. } => *component,
        }
    }
}

/// Lifts a failed step of the six-slot model back to a named component.
impl From<StepError<DomainError>> for DomainError {
    fn from(err: StepError<DomainError>) -> Self {
        match err {
            StepError::System(source) => source,
            StepError::NonFinite { index, value } => DomainError::NonFinite {
                component: Component::ALL[index],
                value,
            },
        }
    }
}

/// Instantaneous rates of change of every stock.
///
/// The model is autonomous; `t` is accepted for the common ODE signature.
pub fn derivatives(_t: f64, state: &State, params: &Params) -> Result<State, DomainError> {
    let State {
        population: p,
        resources: r,
        industrial_capital: k_i,
        food_production: f,
        pollution: p_pol,
        arable_land: a_land,
    } = *state;

    if p == 0.0 {
        return Err(DomainError::ZeroPopulation);
    }
    if params.resource_efficiency == 0.0 {
        return Err(DomainError::ZeroResourceEfficiency);
    }
    let growth_denominator = 1.0 + params.resource_efficiency * (1.0 - r);
    if growth_denominator == 0.0 {
        return Err(DomainError::SingularGrowthDenominator { resources: r });
    }

    let effective_birth_rate = params.birth_rate * (f / (1.0 + f));
    let effective_death_rate = params.death_rate
        + params.pollution_impact_on_death * p_pol
        + params.food_impact_on_death * (1.0 - f);
    let d_population = p * (effective_birth_rate - effective_death_rate);

    let resource_usage_rate = params.industrial_productivity * k_i / params.resource_efficiency;
    let d_resources = -resource_usage_rate;

    let industrial_growth =
        params.investment_rate * params.industrial_productivity * k_i * (r / growth_denominator);
    let d_capital = industrial_growth - params.depreciation_rate * k_i;

    let d_food = (f * a_land * params.industrial_productivity) * (1.0 - p_pol) - f / p;

    let pollution_rate = params.industrial_productivity * k_i;
    let d_pollution = pollution_rate - params.pollution_decay * p_pol;

    let d_arable_land = -params.land_degradation_rate * p_pol;

    let rates = State {
        population: d_population,
        resources: d_resources,
        industrial_capital: d_capital,
        food_production: d_food,
        pollution: d_pollution,
        arable_land: d_arable_land,
    };

    // max() would swallow a NaN, so check before flooring.
    for component in Component::ALL {
        let value = rates.get(component);
        if !value.is_finite() {
            return Err(DomainError::NonFinite { component, value });
        }
    }

    Ok(rates.floor_against(state))
}

/// The rate equations bound to one parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct World3 {
    pub params: Params,
}

impl World3 {
    pub fn new(params: Params) -> Self {
        Self { params }
    }
}

impl DynamicalSystem<f64> for World3 {
    type Error = DomainError;

    fn dimension(&self) -> usize {
        STATE_DIM
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) -> Result<(), DomainError> {
        let state = State::from_array([x[0], x[1], x[2], x[3], x[4], x[5]]);
        let rates = derivatives(t, &state, &self.params)?;
        out[..STATE_DIM].copy_from_slice(&rates.to_array());
        Ok(())
    }
}
