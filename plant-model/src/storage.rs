use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// How the battery level of the first day is determined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./storage.ts")]
#[serde(rename_all = "snake_case")]
pub enum InitialCharge {
    /// The level at the end of day 0 is the net of day 0 charge and discharge.
    #[default]
    NetFlow,
    /// The level at the end of day 0 is fixed at zero.
    Empty,
}

/// Battery storage shared by the whole plant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./storage.ts")]
#[serde(default)]
pub struct Battery {
    /// Storage capacity (MWh).
    pub capacity_mwh: f64,
    /// Fraction of the stored energy lost per day.
    pub decay_per_day: f64,
    /// Boundary condition for the first day.
    pub initial_charge: InitialCharge,
}

impl Battery {
    /// Fraction of the stored energy kept from one day to the next
    pub fn retention(&self) -> f64 {
        1.0 - self.decay_per_day
    }
}

impl Default for Battery {
    fn default() -> Self {
        Self {
            capacity_mwh: 600.0,
            decay_per_day: 0.00015,
            initial_charge: InitialCharge::NetFlow,
        }
    }
}
