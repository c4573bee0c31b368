use anyhow::Result;
use clap::Parser;
use world3_cli::{run, Cli};
use world3_core::Component;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let simulation = run(&cli)?;

    if let Some(state) = simulation.final_state() {
        let peak = simulation.peak(Component::Population);
        eprintln!(
            "{} run finished: {} points (dt = {}), final population {:.6e}{}",
            simulation.integrator,
            simulation.len(),
            simulation.dt,
            state.population,
            peak.map(|(t, p)| format!(", peak population {p:.6} at t = {t}"))
                .unwrap_or_default()
        );
    }
    Ok(())
}
