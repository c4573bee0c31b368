//! Core WASM model wrapper.

use js_sys::Float64Array;
use wasm_bindgen::prelude::*;
use world3_core::model::{derivatives, Params, State, World3, PARAM_COUNT, STATE_DIM};
use world3_core::solvers::{IntegratorKind, Stepper};
use world3_core::traits::Steppable;
use world3_core::config::validate_state;
use world3_core::{simulate, DomainError, SimulationConfig};

#[wasm_bindgen]
pub struct WasmWorld3 {
    pub(crate) system: World3,
    state: [f64; STATE_DIM],
    t: f64,
    pub(crate) integrator: IntegratorKind,
    stepper: Stepper<f64>,
}

pub(crate) fn build_model(
    params: &[f64],
    initial_state: &[f64],
    integrator_name: &str,
) -> Result<(World3, State, IntegratorKind), String> {
    let params = Params::from_slice(params).ok_or_else(|| {
        format!(
            "Expected {} parameters, got {}.",
            PARAM_COUNT,
            params.len()
        )
    })?;
    let state = parse_state(initial_state)?;
    let integrator = integrator_name
        .parse::<IntegratorKind>()
        .map_err(|err| err.to_string())?;
    Ok((World3::new(params), state, integrator))
}

fn parse_state(values: &[f64]) -> Result<State, String> {
    let state = State::from_slice(values).ok_or_else(|| {
        format!(
            "Expected {} state values, got {}.",
            STATE_DIM,
            values.len()
        )
    })?;
    validate_state(&state).map_err(|err| err.to_string())?;
    Ok(state)
}

impl WasmWorld3 {
    pub(crate) fn try_step(&mut self, dt: f64) -> Result<(), String> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err("dt must be positive.".to_string());
        }
        self.stepper
            .step(&self.system, &mut self.t, &mut self.state, dt)
            .map_err(|err| format!("Step failed at t = {}: {}", self.t, DomainError::from(err)))
    }

    pub(crate) fn try_set_state(&mut self, values: &[f64]) -> Result<(), String> {
        self.state = parse_state(values)?.to_array();
        Ok(())
    }

    pub(crate) fn config(&self, dt: f64, t_max: f64) -> SimulationConfig {
        SimulationConfig {
            params: self.system.params,
            initial_state: State::from_array(self.state),
            integrator: self.integrator,
            dt,
            t_max,
        }
    }
}

#[wasm_bindgen]
impl WasmWorld3 {
    #[wasm_bindgen(constructor)]
    pub fn new(
        params: Vec<f64>,
        initial_state: Vec<f64>,
        integrator_name: &str,
    ) -> Result<WasmWorld3, JsValue> {
        console_error_panic_hook::set_once();

        let (system, state, integrator) = build_model(&params, &initial_state, integrator_name)
            .map_err(|e| JsValue::from_str(&e))?;

        Ok(WasmWorld3 {
            system,
            state: state.to_array(),
            t: 0.0,
            integrator,
            stepper: integrator.build(STATE_DIM),
        })
    }

    pub fn set_state(&mut self, state: &[f64]) -> Result<(), JsValue> {
        self.try_set_state(state).map_err(|e| JsValue::from_str(&e))
    }

    pub fn get_state(&self) -> Vec<f64> {
        self.state.to_vec()
    }

    pub fn set_t(&mut self, t: f64) {
        self.t = t;
    }

    pub fn get_t(&self) -> f64 {
        self.t
    }

    pub fn integrator_name(&self) -> String {
        self.integrator.to_string()
    }

    pub fn step(&mut self, dt: f64) -> Result<(), JsValue> {
        self.try_step(dt).map_err(|e| JsValue::from_str(&e))
    }

    /// Rates of change at the current state.
    pub fn derivatives(&self) -> Result<Float64Array, JsValue> {
        let rates = derivatives(self.t, &State::from_array(self.state), &self.system.params)
            .map_err(|e| JsValue::from_str(&format!("Rate evaluation failed: {}", e)))?;
        Ok(Float64Array::from(rates.to_array().as_slice()))
    }

    /// Runs a full simulation from the current state over `[0, tmax)`.
    pub fn simulate(&self, dt: f64, tmax: f64) -> Result<JsValue, JsValue> {
        let simulation = simulate(&self.config(dt, tmax))
            .map_err(|e| JsValue::from_str(&format!("Simulation failed: {}", e)))?;
        serde_wasm_bindgen::to_value(&simulation)
            .map_err(|err| JsValue::from_str(&format!("Failed to serialize simulation: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_PARAMS: [f64; PARAM_COUNT] =
        [0.03, 0.01, 0.02, 0.005, 0.2, 0.1, 0.1, 0.01, 1.0, 2.0];
    const DEFAULT_STATE: [f64; STATE_DIM] = [1.0, 1.0, 1.0, 1.0, 0.0, 1.0];

    fn model(integrator: &str) -> WasmWorld3 {
        WasmWorld3::new(DEFAULT_PARAMS.to_vec(), DEFAULT_STATE.to_vec(), integrator)
            .expect("model should build")
    }

    #[test]
    fn build_model_rejects_wrong_lengths_and_names() {
        let err = build_model(&DEFAULT_PARAMS[..9], &DEFAULT_STATE, "rk4").expect_err("params");
        assert!(err.contains("Expected 10 parameters"));

        let err = build_model(&DEFAULT_PARAMS, &DEFAULT_STATE[..5], "rk4").expect_err("state");
        assert!(err.contains("Expected 6 state values"));

        let err = build_model(&DEFAULT_PARAMS, &DEFAULT_STATE, "leapfrog").expect_err("name");
        assert!(err.contains("leapfrog"));
    }

    #[test]
    fn build_model_maps_named_fields() {
        let (system, state, integrator) =
            build_model(&DEFAULT_PARAMS, &DEFAULT_STATE, "RK4").expect("model");
        assert_eq!(system.params, Params::default());
        assert_eq!(state, State::default());
        assert_eq!(integrator, IntegratorKind::Rk4);
    }

    #[test]
    fn wasm_world3_step_advances_state_and_time() {
        let mut world = model("rk4");
        world.step(1.0).expect("step");

        let state = world.get_state();
        assert!((world.get_t() - 1.0).abs() < 1e-12);
        assert!((state[0] - 0.46963126889829476).abs() < 1e-9);
        assert!((state[1] - 0.375).abs() < 1e-9);
        assert_eq!(world.integrator_name(), "rk4");
    }

    #[test]
    fn euler_collapse_is_reported_by_try_step() {
        let mut world = model("Euler");
        world.try_step(1.0).expect("first step");
        world.try_step(1.0).expect("second step");
        assert_eq!(world.get_state()[0], 0.0);

        let err = world.try_step(1.0).expect_err("population is empty");
        assert!(err.contains("population is zero"), "{err}");
        assert!((world.get_t() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn try_step_rejects_non_positive_dt() {
        let mut world = model("rk4");
        assert!(world.try_step(0.0).is_err());
        assert!(world.try_step(f64::NAN).is_err());
        assert_eq!(world.get_t(), 0.0);
    }

    #[test]
    fn overflowing_step_is_rejected_and_state_kept() {
        let start = [1e308, 1.0, 1.0, 1.0, 0.0, 1.0];
        let mut world = WasmWorld3::new(DEFAULT_PARAMS.to_vec(), start.to_vec(), "euler")
            .expect("model should build");

        let err = world.try_step(1000.0).expect_err("population overflows");
        assert!(err.contains("population is not finite"), "{err}");
        assert_eq!(world.get_state(), start.to_vec());
        assert_eq!(world.get_t(), 0.0);
    }

    #[test]
    fn negative_or_non_finite_stocks_are_rejected() {
        let err = build_model(&DEFAULT_PARAMS, &[1.0, -1.0, 1.0, 1.0, 0.0, 1.0], "rk4")
            .expect_err("negative resources");
        assert!(err.contains("initial resources"), "{err}");

        let mut world = model("rk4");
        assert!(parse_state(&[1.0, 1.0, 1.0, f64::NAN, 0.0, 1.0]).is_err());
        assert!(world.try_set_state(&[1.0, 1.0, 1.0, 1.0, -0.1, 1.0]).is_err());
        assert_eq!(world.get_state(), DEFAULT_STATE.to_vec());
    }

    #[test]
    fn config_starts_from_current_state() {
        let mut world = model("rk4");
        world.set_t(5.0);
        world
            .try_set_state(&[2.0, 1.0, 0.5, 1.0, 0.1, 1.0])
            .expect("state has six values");

        let config = world.config(0.5, 10.0);
        assert_eq!(config.initial_state.population, 2.0);
        assert_eq!(config.integrator, IntegratorKind::Rk4);
        assert_eq!(config.dt, 0.5);
        assert_eq!(config.t_max, 10.0);
    }

    #[test]
    fn wasm_world3_get_state_returns_copy() {
        let world = model("rk4");
        let mut snapshot = world.get_state();
        snapshot[0] = 9.0;
        assert_eq!(world.get_state(), DEFAULT_STATE.to_vec());
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::wasm_bindgen_test;

    const DEFAULT_PARAMS: [f64; PARAM_COUNT] =
        [0.03, 0.01, 0.02, 0.005, 0.2, 0.1, 0.1, 0.01, 1.0, 2.0];
    const DEFAULT_STATE: [f64; STATE_DIM] = [1.0, 1.0, 1.0, 1.0, 0.0, 1.0];

    fn model(integrator: &str) -> WasmWorld3 {
        WasmWorld3::new(DEFAULT_PARAMS.to_vec(), DEFAULT_STATE.to_vec(), integrator)
            .expect("model should build")
    }

    #[wasm_bindgen_test]
    fn wasm_world3_rejects_unknown_integrator() {
        let result = WasmWorld3::new(DEFAULT_PARAMS.to_vec(), DEFAULT_STATE.to_vec(), "nope");
        assert!(result.is_err(), "expected unknown integrator error");
    }

    #[wasm_bindgen_test]
    fn wasm_world3_set_state_rejects_negative_stock() {
        let mut world = model("rk4");
        assert!(world.set_state(&[1.0, 1.0, -2.0, 1.0, 0.0, 1.0]).is_err());
        assert!(world.step(-1.0).is_err());
    }

    #[wasm_bindgen_test]
    fn wasm_world3_simulate_returns_payload() {
        let world = model("rk4");
        let payload = world.simulate(1.0, 10.0).expect("simulation");
        let simulation: world3_core::Simulation =
            serde_wasm_bindgen::from_value(payload).expect("payload decodes");
        assert_eq!(simulation.len(), 10);
        assert_eq!(simulation.states[0], State::default());
        assert!(world.simulate(0.0, 10.0).is_err());

        let rates = world.derivatives().expect("rates");
        assert_eq!(rates.length(), 6);
        assert!((rates.get_index(1) + 1.0).abs() < 1e-12);
    }
}
