pub mod error;
pub mod general;
pub mod log;
pub mod plant;

// Re-export commonly used items for convenience
pub use plant::config::PlantConfig;
pub use plant::hydrogen_opt::{PlantModel, build_plant_model, build_plant_model_from_wind};
pub use plant::results::{PlantResults, aggregate_results};
pub use plant::solver::{HighsSolver, MilpSolver, SolveResult, SolveStatus, solve_plant};
