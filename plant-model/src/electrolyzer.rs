use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// An electrolyzer turning electricity and water into hydrogen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./electrolyzer.ts")]
#[serde(default)]
pub struct Electrolyzer {
    /// Maximum hydrogen produced in one day (kg).
    pub max_hydrogen_kg: f64,
    /// Electricity needed per kg of hydrogen (MWh/kg).
    pub energy_per_kg_mwh: f64,
    /// Water needed per kg of hydrogen (L/kg).
    pub water_per_kg_l: f64,
}

impl Electrolyzer {
    /// Litres of water consumed per MWh of electricity.
    ///
    /// Both conversion paths pin the hydrogen output, so a running electrolyzer
    /// always consumes water and electricity in this ratio.
    pub fn water_per_mwh(&self) -> f64 {
        self.water_per_kg_l / self.energy_per_kg_mwh
    }
}

impl Default for Electrolyzer {
    fn default() -> Self {
        Self {
            max_hydrogen_kg: 530.0,
            energy_per_kg_mwh: 0.05,
            water_per_kg_l: 15.0,
        }
    }
}
