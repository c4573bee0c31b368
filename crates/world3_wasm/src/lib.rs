//! WASM bindings for the World3-lite simulator.
//!
//! `WasmWorld3` wraps the core model for interactive stepping and full runs;
//! simulation results cross the boundary as serialized `Simulation` values
//! for the browser plotting layer.

mod system;

pub use system::WasmWorld3;
