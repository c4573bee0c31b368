//! Command-line front end for `world3_core`.
//!
//! Settings are layered: built-in defaults, then an optional YAML scenario,
//! then individual flags.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use world3_core::{
    simulate, Component, ConfigError, IntegratorKind, Simulation, SimulationConfig,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Standard run of the World3-lite model.",
    allow_negative_numbers = true
)]
pub struct Cli {
    /// YAML scenario file; flags below override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Birth rate
    #[arg(long)]
    pub birth_rate: Option<f64>,

    /// Death rate
    #[arg(long)]
    pub death_rate: Option<f64>,

    /// Resource efficiency
    #[arg(long)]
    pub resource_efficiency: Option<f64>,

    /// Pollution decay
    #[arg(long)]
    pub pollution_decay: Option<f64>,

    /// Investment rate
    #[arg(long)]
    pub investment_rate: Option<f64>,

    /// Depreciation rate
    #[arg(long)]
    pub depreciation_rate: Option<f64>,

    /// Industrial productivity
    #[arg(long)]
    pub industrial_productivity: Option<f64>,

    /// Land degradation rate
    #[arg(long)]
    pub land_degradation_rate: Option<f64>,

    /// Pollution impact on death
    #[arg(long)]
    pub pollution_impact_on_death: Option<f64>,

    /// Food impact on death
    #[arg(long)]
    pub food_impact_on_death: Option<f64>,

    /// Initial population
    #[arg(long)]
    pub initial_population: Option<f64>,

    /// Initial resources
    #[arg(long)]
    pub initial_resources: Option<f64>,

    /// Initial capital
    #[arg(long)]
    pub initial_capital: Option<f64>,

    /// Initial food
    #[arg(long)]
    pub initial_food: Option<f64>,

    /// Initial pollution
    #[arg(long)]
    pub initial_pollution: Option<f64>,

    /// Initial arable land
    #[arg(long)]
    pub initial_arable_land: Option<f64>,

    /// Numerical integrator: RK4 or Euler
    #[arg(long)]
    pub name_integrator: Option<String>,

    /// Timestep for the integrator
    #[arg(long)]
    pub dt: Option<f64>,

    /// Duration of the simulation in years
    #[arg(long)]
    pub tmax: Option<f64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Output file (stdout when omitted)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

fn override_with(target: &mut f64, value: Option<f64>) {
    if let Some(value) = value {
        *target = value;
    }
}

/// Builds the run settings from defaults, the scenario file and the flags.
pub fn resolve_config(cli: &Cli) -> Result<SimulationConfig> {
    let mut config = match &cli.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };

    let params = &mut config.params;
    override_with(&mut params.birth_rate, cli.birth_rate);
    override_with(&mut params.death_rate, cli.death_rate);
    override_with(&mut params.resource_efficiency, cli.resource_efficiency);
    override_with(&mut params.pollution_decay, cli.pollution_decay);
    override_with(&mut params.investment_rate, cli.investment_rate);
    override_with(&mut params.depreciation_rate, cli.depreciation_rate);
    override_with(&mut params.industrial_productivity, cli.industrial_productivity);
    override_with(&mut params.land_degradation_rate, cli.land_degradation_rate);
    override_with(&mut params.pollution_impact_on_death, cli.pollution_impact_on_death);
    override_with(&mut params.food_impact_on_death, cli.food_impact_on_death);

    let state = &mut config.initial_state;
    override_with(&mut state.population, cli.initial_population);
    override_with(&mut state.resources, cli.initial_resources);
    override_with(&mut state.industrial_capital, cli.initial_capital);
    override_with(&mut state.food_production, cli.initial_food);
    override_with(&mut state.pollution, cli.initial_pollution);
    override_with(&mut state.arable_land, cli.initial_arable_land);

    if let Some(name) = &cli.name_integrator {
        config.integrator = name
            .parse::<IntegratorKind>()
            .map_err(ConfigError::from)?;
    }
    override_with(&mut config.dt, cli.dt);
    override_with(&mut config.t_max, cli.tmax);

    Ok(config)
}

/// Writes one row per grid point, time first, then the six stocks.
pub fn write_csv<W: Write>(simulation: &Simulation, mut writer: W) -> io::Result<()> {
    let header: Vec<&str> = std::iter::once("time")
        .chain(Component::ALL.iter().map(|component| component.key()))
        .collect();
    writeln!(writer, "{}", header.join(","))?;

    for (t, state) in simulation.times.iter().zip(&simulation.states) {
        write!(writer, "{t}")?;
        for value in state.to_array() {
            write!(writer, ",{value}")?;
        }
        writeln!(writer)?;
    }
    writer.flush()
}

pub fn write_json<W: Write>(simulation: &Simulation, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, simulation)
        .context("Failed to serialize simulation")?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn write_output<W: Write>(simulation: &Simulation, format: OutputFormat, writer: W) -> Result<()> {
    match format {
        OutputFormat::Csv => write_csv(simulation, writer).context("Failed to write CSV output"),
        OutputFormat::Json => write_json(simulation, writer),
    }
}

/// Resolves the settings, runs the model and writes the trajectory.
pub fn run(cli: &Cli) -> Result<Simulation> {
    let config = resolve_config(cli)?;
    let simulation = simulate(&config).context("Simulation failed")?;

    match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_output(&simulation, cli.format, BufWriter::new(file))?;
        }
        None => write_output(&simulation, cli.format, io::stdout().lock())?,
    }

    Ok(simulation)
}
