use thiserror::Error;

use crate::plant::solver::SolveStatus;

/// Problems with the data fed into the model, detected before it is built
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("missing wind sample for turbine {turbine} on day {day}")]
    MissingSample { turbine: usize, day: usize },
    #[error("duplicate wind sample for turbine {turbine} on day {day}")]
    DuplicateSample { turbine: usize, day: usize },
    #[error("wind sample for turbine {turbine} on day {day} lies outside the {turbines}x{days} table")]
    SampleOutOfRange {
        turbine: usize,
        day: usize,
        turbines: usize,
        days: usize,
    },
    #[error("invalid wind speed {speed} for turbine {turbine} on day {day}")]
    InvalidSpeed { turbine: usize, day: usize, speed: f64 },
    #[error("wind table covers {found_turbines} turbines x {found_days} days, expected {turbines} x {days}")]
    ShapeMismatch {
        turbines: usize,
        days: usize,
        found_turbines: usize,
        found_days: usize,
    },
    #[error("wind row of turbine {turbine} has {found_days} days, expected {days}")]
    RaggedRow {
        turbine: usize,
        days: usize,
        found_days: usize,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Problems found while assembling the model
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("{set} index {index} is out of range (size {size})")]
    IndexOutOfRange {
        set: &'static str,
        index: usize,
        size: usize,
    },
    #[error("variable #{0} does not belong to this model")]
    UnknownVariable(usize),
    #[error("non-finite coefficient in {0}")]
    NonFiniteCoefficient(String),
    #[error(transparent)]
    Input(#[from] InputError),
}

/// Raised when a solve result without a usable schedule is aggregated
#[derive(Debug, Error, PartialEq)]
#[error("no schedule to report: {status}")]
pub struct ResultError {
    pub status: SolveStatus,
}

impl ResultError {
    /// Whether the solver itself failed, as opposed to proving infeasibility
    pub fn is_solver_failure(&self) -> bool {
        matches!(self.status, SolveStatus::Error(_))
    }
}
