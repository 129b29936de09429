use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// Prices for trading energy with the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./grid.ts")]
#[serde(default)]
pub struct GridTariff {
    /// Price paid per MWh bought from the grid ($/MWh).
    pub buy_price: f64,
    /// Price received per MWh sold to the grid ($/MWh).
    pub sell_price: f64,
}

impl GridTariff {
    /// Create a tariff with the same price for both directions
    pub fn flat(price: f64) -> Self {
        Self {
            buy_price: price,
            sell_price: price,
        }
    }

    /// Margin lost on a unit of energy that is bought and sold again
    pub fn spread(&self) -> f64 {
        self.buy_price - self.sell_price
    }
}

impl Default for GridTariff {
    fn default() -> Self {
        Self {
            buy_price: 120_000.0,
            sell_price: 50_000.0,
        }
    }
}
