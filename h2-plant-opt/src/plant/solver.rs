//! Hand a [`Model`] to a MILP solver and read back the schedule.
use std::fmt;

use good_lp::solvers::SolutionStatus;
use good_lp::{Expression, ProblemVariables, ResolutionError, Solution, SolverModel, constraint, variable};

use crate::plant::hydrogen_opt::PlantModel;
use crate::plant::linear::{Direction, Domain, LinearExpr, Model, Relation, VarId};

/// Absolute tolerance used when checking an incumbent against the model
pub const FEASIBILITY_TOLERANCE: f64 = 1e-5;

/// Outcome of a solve
#[derive(Debug, Clone, PartialEq)]
pub enum SolveStatus {
    /// Proven optimum
    Optimal,
    /// Best incumbent found before the time limit; feasible but possibly suboptimal
    TimeLimitReached,
    /// No schedule satisfies the constraints
    Infeasible,
    /// The solver failed
    Error(String),
}

impl SolveStatus {
    /// Whether the result carries a feasible assignment
    pub fn has_schedule(&self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::TimeLimitReached)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "optimal"),
            SolveStatus::TimeLimitReached => write!(f, "time limit reached (best incumbent)"),
            SolveStatus::Infeasible => {
                write!(f, "infeasible: no feasible schedule exists for the given parameters")
            }
            SolveStatus::Error(msg) => write!(f, "solver error: {msg}"),
        }
    }
}

/// A value for every variable of a model, plus the objective
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    values: Vec<f64>,
    objective: f64,
}

impl Assignment {
    pub fn value(&self, var: VarId) -> f64 {
        self.values[var.index()]
    }

    /// Sum of the values of several variables
    pub fn sum(&self, vars: impl IntoIterator<Item = VarId>) -> f64 {
        vars.into_iter().map(|var| self.value(var)).sum()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn objective(&self) -> f64 {
        self.objective
    }
}

/// Status of a solve, with the assignment whenever the status has one
#[derive(Debug, Clone, PartialEq)]
pub struct SolveResult {
    status: SolveStatus,
    assignment: Option<Assignment>,
}

impl SolveResult {
    /// A result with a schedule. The objective is evaluated from the values.
    ///
    /// An assignment that does not cover every variable of the model is
    /// turned into a `SolveStatus::Error` result.
    pub fn with_values(model: &Model, status: SolveStatus, values: Vec<f64>) -> Self {
        debug_assert!(status.has_schedule());
        if values.len() != model.variables().len() {
            return Self::without_values(SolveStatus::Error(format!(
                "solver returned {} values for {} variables",
                values.len(),
                model.variables().len()
            )));
        }
        let objective = model.objective().evaluate(&values);
        Self {
            status,
            assignment: Some(Assignment { values, objective }),
        }
    }

    /// A result without a schedule
    pub fn without_values(status: SolveStatus) -> Self {
        debug_assert!(!status.has_schedule());
        Self {
            status,
            assignment: None,
        }
    }

    pub fn status(&self) -> &SolveStatus {
        &self.status
    }

    pub fn assignment(&self) -> Option<&Assignment> {
        self.assignment.as_ref()
    }

    pub fn objective(&self) -> Option<f64> {
        self.assignment.as_ref().map(Assignment::objective)
    }
}

/// Anything able to optimise a [`Model`] within a wall-clock budget
pub trait MilpSolver {
    fn optimize(&self, model: &Model, time_limit_seconds: f64) -> SolveResult;
}

/// HiGHS, driven through `good_lp`
#[derive(Debug, Clone, Copy, Default)]
pub struct HighsSolver {
    /// Forward the HiGHS log to the console
    pub verbose: bool,
}

impl HighsSolver {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

fn to_expression(expr: &LinearExpr, columns: &[good_lp::Variable]) -> Expression {
    let mut expression = Expression::default();
    for (var, coefficient) in expr.terms() {
        expression += coefficient * columns[var.index()];
    }
    expression + expr.constant_term()
}

impl MilpSolver for HighsSolver {
    fn optimize(&self, model: &Model, time_limit_seconds: f64) -> SolveResult {
        let mut vars = ProblemVariables::new();
        let columns: Vec<good_lp::Variable> = model
            .variables()
            .iter()
            .map(|def| match def.domain {
                Domain::Binary => vars.add(variable().binary()),
                Domain::Continuous { upper: Some(ub) } => vars.add(variable().min(0.0).max(ub)),
                Domain::Continuous { upper: None } => vars.add(variable().min(0.0)),
            })
            .collect();

        let objective = to_expression(model.objective(), &columns);
        let unsolved = match model.direction() {
            Direction::Minimise => vars.minimise(objective),
            Direction::Maximise => vars.maximise(objective),
        };
        let mut problem = unsolved
            .using(good_lp::highs)
            .set_time_limit(time_limit_seconds);
        problem.set_verbose(self.verbose);

        for row in model.constraints() {
            let lhs = to_expression(&row.expr, &columns);
            let rhs = row.rhs;
            problem = problem.with(match row.relation {
                Relation::LessEq => constraint!(lhs <= rhs),
                Relation::Eq => constraint!(lhs == rhs),
                Relation::GreaterEq => constraint!(lhs >= rhs),
            });
        }

        // Time the optimization
        let start_time = std::time::Instant::now();
        let opt_result = problem.solve();
        log::info!("HiGHS finished after {:.2?}", start_time.elapsed());

        match opt_result {
            Ok(solution) => {
                // Gap limits count as optimal: HiGHS stops at its default relative gap
                let status = match solution.status() {
                    SolutionStatus::TimeLimit => SolveStatus::TimeLimitReached,
                    _ => SolveStatus::Optimal,
                };
                let values: Vec<f64> = columns.iter().map(|&col| solution.value(col)).collect();
                if status == SolveStatus::TimeLimitReached {
                    let violations = model.violations(&values, FEASIBILITY_TOLERANCE);
                    if let Some(first) = violations.first() {
                        return SolveResult::without_values(SolveStatus::Error(format!(
                            "time limit reached without a feasible incumbent ({} violated rows, first: {})",
                            violations.len(),
                            first.constraint
                        )));
                    }
                }
                SolveResult::with_values(model, status, values)
            }
            Err(ResolutionError::Infeasible) => SolveResult::without_values(SolveStatus::Infeasible),
            Err(e) => SolveResult::without_values(SolveStatus::Error(e.to_string())),
        }
    }
}

/// Submit a plant model to a solver, honouring the configured time limit
pub fn solve_plant<S: MilpSolver>(plant: &PlantModel, solver: &S) -> SolveResult {
    let time_limit = plant.config().time_limit_seconds;
    log::info!(
        "Submitting model with {} variables to the solver (time limit {}s)",
        plant.model().variables().len(),
        time_limit
    );

    let result = solver.optimize(plant.model(), time_limit);
    match result.status() {
        SolveStatus::Optimal => log::info!("Solve finished: {}", result.status()),
        SolveStatus::TimeLimitReached => {
            log::warn!("Solve stopped early, the schedule may be suboptimal")
        }
        SolveStatus::Infeasible => log::warn!("Solve finished: {}", result.status()),
        SolveStatus::Error(_) => log::error!("Solve failed: {}", result.status()),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::general::wind_data::WindTable;
    use crate::plant::config::PlantConfig;
    use crate::plant::hydrogen_opt::build_plant_model_from_wind;
    use plant_model::grid::GridTariff;

    const TOLERANCE: f64 = 1e-6;

    fn config(days: usize, turbines: usize, electrolyzers: usize) -> PlantConfig {
        PlantConfig {
            horizon_days: days,
            turbine_count: turbines,
            electrolyzer_count: electrolyzers,
            target_hydrogen_kg: 10.0,
            time_limit_seconds: 60.0,
            ..PlantConfig::default()
        }
    }

    fn solve(config: &PlantConfig, wind: &WindTable) -> (PlantModel, SolveResult) {
        let plant = build_plant_model_from_wind(config, wind).unwrap();
        let result = solve_plant(&plant, &HighsSolver::default());
        (plant, result)
    }

    /// Properties every returned schedule must have
    fn assert_schedule_properties(plant: &PlantModel, result: &SolveResult) {
        assert!(result.status().has_schedule(), "status: {}", result.status());
        let assignment = result.assignment().unwrap();
        let vars = plant.variables();
        let config = plant.config();

        let violations = plant.model().violations(assignment.values(), FEASIBILITY_TOLERANCE);
        assert!(violations.is_empty(), "violations: {violations:?}");

        for m in 0..vars.turbines() {
            for t in 0..vars.horizon() {
                if assignment.value(vars.turbine_on(m, t).unwrap()) > 0.5 {
                    assert!(plant.availability().is_available(m, t).unwrap());
                }
            }
        }

        for t in 1..vars.horizon() {
            let expected = config.battery.retention() * assignment.value(vars.level(t - 1).unwrap())
                + assignment.value(vars.charge(t).unwrap())
                - assignment.value(vars.discharge(t).unwrap());
            assert!((assignment.value(vars.level(t).unwrap()) - expected).abs() < 1e-5);
        }

        let hydrogen: f64 = (0..vars.electrolyzers())
            .flat_map(|n| (0..vars.horizon()).map(move |t| (n, t)))
            .map(|(n, t)| assignment.value(vars.hydrogen_out(n, t).unwrap()))
            .sum();
        assert!(hydrogen >= config.target_hydrogen_kg - 1e-5);

        let sold = assignment.sum((0..vars.horizon()).map(|t| vars.sell(t).unwrap()));
        let bought = assignment.sum((0..vars.horizon()).map(|t| vars.buy(t).unwrap()));
        assert!(sold - bought >= -1e-5);
    }

    /// Returns an all-zero assignment of a fixed length
    struct FixedLengthSolver(usize);

    impl MilpSolver for FixedLengthSolver {
        fn optimize(&self, model: &Model, _time_limit_seconds: f64) -> SolveResult {
            SolveResult::with_values(model, SolveStatus::Optimal, vec![0.0; self.0])
        }
    }

    #[test]
    fn test_short_assignment_is_a_solver_error() {
        let config = config(2, 1, 1);
        let wind = WindTable::uniform(1, 2, 30.0).unwrap();
        let plant = build_plant_model_from_wind(&config, &wind).unwrap();

        let result = solve_plant(&plant, &FixedLengthSolver(3));
        assert!(matches!(result.status(), SolveStatus::Error(_)));
        assert_eq!(result.assignment(), None);

        let full = plant.model().variables().len();
        let result = solve_plant(&plant, &FixedLengthSolver(full));
        assert_eq!(result.status(), &SolveStatus::Optimal);
        assert_eq!(result.objective(), Some(0.0));
    }

    #[test]
    fn test_single_day_without_costs() {
        let mut config = config(1, 1, 1);
        config.turbine.maintenance_cost = 0.0;
        config.water_unit_cost = 0.0;
        config.grid = GridTariff::flat(0.0);
        let wind = WindTable::uniform(1, 1, 30.0).unwrap();

        let (plant, result) = solve(&config, &wind);
        assert_eq!(result.status(), &SolveStatus::Optimal);
        assert_schedule_properties(&plant, &result);

        let assignment = result.assignment().unwrap();
        assert!(assignment.objective().abs() < TOLERANCE);
        let hydrogen = plant.variables().hydrogen_out(0, 0).unwrap();
        assert!(assignment.value(hydrogen) >= 10.0 - TOLERANCE);
    }

    #[test]
    fn test_turbine_stays_off_outside_wind_band() {
        let config = config(2, 1, 1);
        let wind = WindTable::from_rows(vec![vec![5.0, 30.0]]).unwrap();

        let (plant, result) = solve(&config, &wind);
        assert_eq!(result.status(), &SolveStatus::Optimal);
        assert_schedule_properties(&plant, &result);

        let vars = plant.variables();
        let assignment = result.assignment().unwrap();
        assert!(assignment.value(vars.turbine_on(0, 0).unwrap()) < 0.5);
        assert!(assignment.value(vars.turbine_output(0, 0).unwrap()) < TOLERANCE);
        // Day 1 is the only source of green energy
        assert!(assignment.value(vars.turbine_on(0, 1).unwrap()) > 0.5);
    }

    #[test]
    fn test_zero_battery_capacity_forces_balanced_flows() {
        let mut config = config(3, 2, 1);
        config.battery.capacity_mwh = 0.0;
        let wind = WindTable::from_rows(vec![vec![30.0, 5.0, 30.0], vec![5.0, 30.0, 40.0]]).unwrap();

        let (plant, result) = solve(&config, &wind);
        assert!(result.status().has_schedule());
        assert_schedule_properties(&plant, &result);

        let vars = plant.variables();
        let assignment = result.assignment().unwrap();
        for t in 0..3 {
            assert!(assignment.value(vars.level(t).unwrap()).abs() < TOLERANCE);
            let charge = assignment.value(vars.charge(t).unwrap());
            let discharge = assignment.value(vars.discharge(t).unwrap());
            assert!((charge - discharge).abs() < TOLERANCE);
        }
    }

    #[test]
    fn test_no_wind_in_band_is_infeasible() {
        let config = config(3, 2, 2);
        let wind = WindTable::uniform(2, 3, 5.0).unwrap();

        let (plant, result) = solve(&config, &wind);
        assert!(plant.availability().is_never_available());
        assert_eq!(result.status(), &SolveStatus::Infeasible);
        assert_eq!(result.assignment(), None);
    }

    #[test]
    fn test_higher_sell_price_never_raises_cost() {
        let mut config = config(4, 2, 2);
        config.target_hydrogen_kg = 1500.0;
        let wind = WindTable::from_rows(vec![
            vec![30.0, 5.0, 95.0, 20.0],
            vec![12.0, 45.0, 60.0, 8.0],
        ])
        .unwrap();

        let (plant, base) = solve(&config, &wind);
        assert_schedule_properties(&plant, &base);

        config.grid.sell_price *= 2.0;
        let (plant, doubled) = solve(&config, &wind);
        assert_schedule_properties(&plant, &doubled);

        let base = base.objective().unwrap();
        let doubled = doubled.objective().unwrap();
        // Allow for the relative MIP gap HiGHS stops at
        assert!(doubled <= base + 1e-3 * base.abs().max(1.0));
    }

    #[test]
    fn test_empty_initial_battery() {
        let mut config = config(2, 1, 1);
        config.battery.initial_charge = plant_model::storage::InitialCharge::Empty;
        let wind = WindTable::uniform(1, 2, 30.0).unwrap();

        let (plant, result) = solve(&config, &wind);
        assert_schedule_properties(&plant, &result);
        let level = plant.variables().level(0).unwrap();
        assert!(result.assignment().unwrap().value(level).abs() < TOLERANCE);
    }
}
