use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use h2_plant_opt::general::finance::{cost_breakdown, log_cost_breakdown};
use h2_plant_opt::general::wind_data::load_wind_table;
use h2_plant_opt::plant::config::PlantConfig;
use h2_plant_opt::plant::hydrogen_opt::build_plant_model_from_wind;
use h2_plant_opt::plant::plot::plot_daily_schedule;
use h2_plant_opt::plant::results::{aggregate_results, log_results};
use h2_plant_opt::plant::solver::{HighsSolver, solve_plant};

/// Schedule turbines, battery, grid trade and electrolyzers of a green hydrogen plant
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// TOML file with plant parameters (defaults are used when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Daily wind speeds: a `turbine,day,speed_kmh` CSV or a workbook with one column per turbine
    #[arg(long)]
    wind: PathBuf,

    /// Write a PNG chart of the daily schedule to this file
    #[arg(long)]
    plot: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PlantConfig::from_path(path)?,
        None => PlantConfig::default(),
    };
    h2_plant_opt::log::init(config.log_level.as_deref())?;

    let wind = load_wind_table(&cli.wind, config.turbine_count, config.horizon_days)?;
    let plant = build_plant_model_from_wind(&config, &wind)?;
    let result = solve_plant(&plant, &HighsSolver::new(config.solver_verbose));

    let results = match aggregate_results(&plant, &result) {
        Ok(results) => results,
        Err(e) if e.is_solver_failure() => bail!(e),
        Err(e) => {
            log::warn!("{e}");
            return Ok(());
        }
    };

    log_results(&results);
    log_cost_breakdown(&cost_breakdown(&config, &results));

    if let Some(path) = &cli.plot {
        if let Err(e) = plot_daily_schedule(&results.daily, path) {
            log::error!("Error plotting the daily schedule: {e}");
        }
    }

    Ok(())
}
