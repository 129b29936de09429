use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use plant_model::electrolyzer::Electrolyzer;
use plant_model::grid::GridTariff;
use plant_model::storage::Battery;
use plant_model::turbine::{WindBand, WindTurbine};
use serde::Deserialize;

use crate::error::InputError;

/// Configuration struct holding all plant and solver parameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlantConfig {
    // Index sets
    pub horizon_days: usize,      // Number of days in the planning horizon
    pub turbine_count: usize,     // Number of wind turbines
    pub electrolyzer_count: usize, // Number of electrolyzers

    // Components
    pub turbine: WindTurbine,
    pub electrolyzer: Electrolyzer,
    pub battery: Battery,
    pub grid: GridTariff,

    // Economic parameters
    pub water_unit_cost: f64,     // Cost of water per litre ($/L)
    pub target_hydrogen_kg: f64,  // Hydrogen to produce over the whole horizon (kg)

    // Solver parameters
    pub time_limit_seconds: f64, // Wall clock budget for the solver
    pub solver_verbose: bool,    // Forward HiGHS output to the console

    pub log_level: Option<String>,
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            horizon_days: 365,
            turbine_count: 4,
            electrolyzer_count: 4,

            turbine: WindTurbine::default(),
            electrolyzer: Electrolyzer::default(),
            battery: Battery::default(),
            grid: GridTariff::default(),

            water_unit_cost: 1.0,
            target_hydrogen_kg: 718_000.0,

            time_limit_seconds: 1800.0,
            solver_verbose: false,

            log_level: None,
        }
    }
}

impl PlantConfig {
    /// Read a configuration from a TOML file. Missing keys take their default.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: PlantConfig = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the parameters describe a well-posed model
    pub fn validate(&self) -> Result<(), InputError> {
        let fail = |msg: String| Err(InputError::InvalidConfig(msg));

        if self.horizon_days == 0 || self.turbine_count == 0 || self.electrolyzer_count == 0 {
            return fail(format!(
                "index sets must not be empty (days={}, turbines={}, electrolyzers={})",
                self.horizon_days, self.turbine_count, self.electrolyzer_count
            ));
        }

        let band = &self.turbine.wind_band;
        if let Err(msg) = WindBand::new(band.min_kmh, band.max_kmh) {
            return fail(msg);
        }

        let non_negative = [
            ("turbine.max_output_mwh", self.turbine.max_output_mwh),
            ("turbine.maintenance_cost", self.turbine.maintenance_cost),
            ("electrolyzer.max_hydrogen_kg", self.electrolyzer.max_hydrogen_kg),
            ("battery.capacity_mwh", self.battery.capacity_mwh),
            ("grid.buy_price", self.grid.buy_price),
            ("grid.sell_price", self.grid.sell_price),
            ("water_unit_cost", self.water_unit_cost),
            ("target_hydrogen_kg", self.target_hydrogen_kg),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return fail(format!("{name} must be a finite non-negative number, got {value}"));
            }
        }

        let positive = [
            ("electrolyzer.energy_per_kg_mwh", self.electrolyzer.energy_per_kg_mwh),
            ("electrolyzer.water_per_kg_l", self.electrolyzer.water_per_kg_l),
            ("time_limit_seconds", self.time_limit_seconds),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return fail(format!("{name} must be a finite positive number, got {value}"));
            }
        }

        if !(0.0..=1.0).contains(&self.battery.decay_per_day) {
            return fail(format!(
                "battery.decay_per_day must lie in [0, 1], got {}",
                self.battery.decay_per_day
            ));
        }

        // Buying and reselling the same energy would be profitable and the model unbounded
        if self.grid.spread() < 0.0 {
            return fail(format!(
                "grid.sell_price ({}) exceeds grid.buy_price ({})",
                self.grid.sell_price, self.grid.buy_price
            ));
        }

        Ok(())
    }

    /// Largest amount of hydrogen the electrolyzers can make over the horizon
    pub fn hydrogen_capacity_kg(&self) -> f64 {
        self.electrolyzer.max_hydrogen_kg * (self.electrolyzer_count * self.horizon_days) as f64
    }
}
