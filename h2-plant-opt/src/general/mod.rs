pub mod finance;
pub mod wind_data;

pub use finance::{CostBreakdown, cost_breakdown};
pub use wind_data::{WindTable, load_wind_table};
