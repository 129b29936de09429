pub mod availability;
pub mod config;
pub mod hydrogen_opt;
pub mod linear;
pub mod plot;
pub mod results;
pub mod solver;
