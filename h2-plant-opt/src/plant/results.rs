use crate::error::{ModelError, ResultError};
use crate::plant::hydrogen_opt::{PlantModel, PlantVariables};
use crate::plant::solver::{Assignment, SolveResult, SolveStatus};

/// Summary of a solved plant schedule
#[derive(Debug, Clone, PartialEq)]
pub struct PlantResults {
    pub status: SolveStatus,
    pub objective: f64,

    // Horizon totals
    pub total_energy_bought_mwh: f64,
    pub total_energy_sold_mwh: f64,
    pub net_energy_balance_mwh: f64, // sold minus bought
    pub total_hydrogen_kg: f64,
    pub total_water_l: f64,
    pub committed_turbine_days: usize,

    // Per entity totals
    pub turbine_output_mwh: Vec<f64>,
    pub electrolyzer_hydrogen_kg: Vec<f64>,

    // Daily averages
    pub avg_energy_bought_mwh: f64,
    pub avg_energy_sold_mwh: f64,
    pub avg_hydrogen_kg: f64,

    // Daily data for plotting
    pub daily: DailySeries,
}

impl PlantResults {
    /// Whether the schedule is a proven optimum
    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }
}

/// Per-day plant totals
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailySeries {
    pub turbine_output_mwh: Vec<f64>,
    pub bought_mwh: Vec<f64>,
    pub sold_mwh: Vec<f64>,
    pub battery_level_mwh: Vec<f64>,
    pub electrolyzer_energy_mwh: Vec<f64>,
    pub hydrogen_kg: Vec<f64>,
}

/// Reduce a solve result to summary metrics.
///
/// Only results carrying a schedule (optimal or time limited) are accepted.
pub fn aggregate_results(
    plant: &PlantModel,
    result: &SolveResult,
) -> Result<PlantResults, ResultError> {
    let assignment = match (result.status(), result.assignment()) {
        (status, Some(assignment)) if status.has_schedule() => assignment,
        (status, _) => {
            return Err(ResultError {
                status: status.clone(),
            });
        }
    };

    let vars = plant.variables();
    let reduce = || -> Result<PlantResults, ModelError> {
        let horizon = vars.horizon();
        let daily = daily_series(vars, assignment)?;

        let total_energy_bought_mwh: f64 = daily.bought_mwh.iter().sum();
        let total_energy_sold_mwh: f64 = daily.sold_mwh.iter().sum();
        let total_hydrogen_kg: f64 = daily.hydrogen_kg.iter().sum();

        let mut turbine_output_mwh = Vec::with_capacity(vars.turbines());
        let mut committed_turbine_days = 0;
        for m in 0..vars.turbines() {
            let mut output = 0.0;
            for t in 0..horizon {
                output += assignment.value(vars.turbine_output(m, t)?);
                if assignment.value(vars.turbine_on(m, t)?) > 0.5 {
                    committed_turbine_days += 1;
                }
            }
            turbine_output_mwh.push(output);
        }

        let mut electrolyzer_hydrogen_kg = Vec::with_capacity(vars.electrolyzers());
        let mut total_water_l = 0.0;
        for n in 0..vars.electrolyzers() {
            let mut hydrogen = 0.0;
            for t in 0..horizon {
                hydrogen += assignment.value(vars.hydrogen_out(n, t)?);
                total_water_l += assignment.value(vars.water_to_electrolyzer(n, t)?);
            }
            electrolyzer_hydrogen_kg.push(hydrogen);
        }

        let days = horizon as f64;
        Ok(PlantResults {
            status: result.status().clone(),
            objective: assignment.objective(),
            total_energy_bought_mwh,
            total_energy_sold_mwh,
            net_energy_balance_mwh: total_energy_sold_mwh - total_energy_bought_mwh,
            total_hydrogen_kg,
            total_water_l,
            committed_turbine_days,
            turbine_output_mwh,
            electrolyzer_hydrogen_kg,
            avg_energy_bought_mwh: total_energy_bought_mwh / days,
            avg_energy_sold_mwh: total_energy_sold_mwh / days,
            avg_hydrogen_kg: total_hydrogen_kg / days,
            daily,
        })
    };

    // Handles come from the same model, so lookups only fail on a corrupted result
    reduce().map_err(|e| ResultError {
        status: SolveStatus::Error(e.to_string()),
    })
}

fn daily_series(
    vars: &PlantVariables,
    assignment: &Assignment,
) -> Result<DailySeries, ModelError> {
    let horizon = vars.horizon();
    let mut daily = DailySeries::default();

    for t in 0..horizon {
        let mut turbine_output = 0.0;
        for m in 0..vars.turbines() {
            turbine_output += assignment.value(vars.turbine_output(m, t)?);
        }
        let mut electrolyzer_energy = 0.0;
        let mut hydrogen = 0.0;
        for n in 0..vars.electrolyzers() {
            electrolyzer_energy += assignment.value(vars.energy_to_electrolyzer(n, t)?);
            hydrogen += assignment.value(vars.hydrogen_out(n, t)?);
        }

        daily.turbine_output_mwh.push(turbine_output);
        daily.bought_mwh.push(assignment.value(vars.buy(t)?));
        daily.sold_mwh.push(assignment.value(vars.sell(t)?));
        daily.battery_level_mwh.push(assignment.value(vars.level(t)?));
        daily.electrolyzer_energy_mwh.push(electrolyzer_energy);
        daily.hydrogen_kg.push(hydrogen);
    }

    Ok(daily)
}

/// Write the summary the way the plant report is usually read
pub fn log_results(results: &PlantResults) {
    log::info!("=== PLANT OPTIMIZATION RESULTS ===");
    log::info!("Status: {}", results.status);
    if !results.is_optimal() {
        log::warn!("The schedule below is not proven optimal");
    }
    log::info!("Optimal cost: ${:.2}", results.objective);

    log::info!("Total energy bought: {:.2} MWh", results.total_energy_bought_mwh);
    log::info!("Total energy sold: {:.2} MWh", results.total_energy_sold_mwh);
    log::info!("Net energy balance: {:.2} MWh", results.net_energy_balance_mwh);
    log::info!("Total green hydrogen produced: {:.2} kg", results.total_hydrogen_kg);

    log::info!("Daily averages:");
    log::info!("  Energy bought: {:.3} MWh/day", results.avg_energy_bought_mwh);
    log::info!("  Energy sold: {:.3} MWh/day", results.avg_energy_sold_mwh);
    log::info!("  Hydrogen produced: {:.3} kg/day", results.avg_hydrogen_kg);

    for (m, output) in results.turbine_output_mwh.iter().enumerate() {
        log::info!("Turbine {m} generation: {output:.2} MWh");
    }
    for (n, hydrogen) in results.electrolyzer_hydrogen_kg.iter().enumerate() {
        log::info!("Electrolyzer {n} hydrogen: {hydrogen:.2} kg");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::general::wind_data::WindTable;
    use crate::plant::config::PlantConfig;
    use crate::plant::hydrogen_opt::build_plant_model_from_wind;
    use crate::plant::linear::{Model, VarId};
    use crate::plant::solver::{MilpSolver, solve_plant};

    /// Returns a fixed status without looking at the model
    struct FixedStatusSolver(SolveStatus);

    impl MilpSolver for FixedStatusSolver {
        fn optimize(&self, _model: &Model, _time_limit_seconds: f64) -> SolveResult {
            SolveResult::without_values(self.0.clone())
        }
    }

    fn two_day_plant() -> PlantModel {
        let config = PlantConfig {
            horizon_days: 2,
            turbine_count: 2,
            electrolyzer_count: 1,
            target_hydrogen_kg: 10.0,
            ..PlantConfig::default()
        };
        let wind = WindTable::uniform(2, 2, 30.0).unwrap();
        build_plant_model_from_wind(&config, &wind).unwrap()
    }

    #[test]
    fn test_infeasible_and_error_are_rejected() {
        let plant = two_day_plant();

        for status in [SolveStatus::Infeasible, SolveStatus::Error("boom".to_string())] {
            let result = solve_plant(&plant, &FixedStatusSolver(status.clone()));
            assert_eq!(result.objective(), None);
            assert_eq!(
                aggregate_results(&plant, &result),
                Err(ResultError { status })
            );
        }
    }

    #[test]
    fn test_only_solver_errors_are_failures() {
        let plant = two_day_plant();

        let infeasible = solve_plant(&plant, &FixedStatusSolver(SolveStatus::Infeasible));
        let err = aggregate_results(&plant, &infeasible).unwrap_err();
        assert!(!err.is_solver_failure());

        let failed = solve_plant(
            &plant,
            &FixedStatusSolver(SolveStatus::Error("no licence".to_string())),
        );
        let err = aggregate_results(&plant, &failed).unwrap_err();
        assert!(err.is_solver_failure());
    }

    #[test]
    fn test_aggregate_hand_made_schedule() {
        let plant = two_day_plant();
        let vars = plant.variables();
        let mut values = vec![0.0; plant.model().variables().len()];
        let mut set = |var: VarId, value: f64| values[var.index()] = value;

        set(vars.turbine_on(0, 0).unwrap(), 1.0);
        set(vars.turbine_output(0, 0).unwrap(), 3.0);
        set(vars.turbine_on(1, 1).unwrap(), 1.0);
        set(vars.turbine_output(1, 1).unwrap(), 2.0);
        set(vars.energy_to_electrolyzer(0, 0).unwrap(), 0.5);
        set(vars.water_to_electrolyzer(0, 0).unwrap(), 150.0);
        set(vars.hydrogen_out(0, 0).unwrap(), 10.0);
        set(vars.sell(0).unwrap(), 2.5);
        set(vars.sell(1).unwrap(), 1.0);
        set(vars.buy(1).unwrap(), 1.0);
        set(vars.charge(1).unwrap(), 2.0);
        set(vars.level(1).unwrap(), 2.0);

        let result =
            SolveResult::with_values(plant.model(), SolveStatus::TimeLimitReached, values);
        let results = aggregate_results(&plant, &result).unwrap();

        assert!(!results.is_optimal());
        assert_eq!(results.total_energy_bought_mwh, 1.0);
        assert_eq!(results.total_energy_sold_mwh, 3.5);
        assert_eq!(results.net_energy_balance_mwh, 2.5);
        assert_eq!(results.total_hydrogen_kg, 10.0);
        assert_eq!(results.total_water_l, 150.0);
        assert_eq!(results.committed_turbine_days, 2);
        assert_eq!(results.turbine_output_mwh, vec![3.0, 2.0]);
        assert_eq!(results.electrolyzer_hydrogen_kg, vec![10.0]);
        assert_eq!(results.avg_energy_sold_mwh, 1.75);
        assert_eq!(results.avg_hydrogen_kg, 5.0);
        assert_eq!(results.daily.turbine_output_mwh, vec![3.0, 2.0]);
        assert_eq!(results.daily.battery_level_mwh, vec![0.0, 2.0]);

        // 2 committed turbine-days, 150 L of water, 1 MWh bought, 3.5 MWh sold
        let expected = 2.0 * 130_000.0 + 150.0 + 120_000.0 - 3.5 * 50_000.0;
        assert!((results.objective - expected).abs() < 1e-6);
        let values = result.assignment().unwrap().values();
        assert!(plant.model().violations(values, 1e-9).is_empty());
    }
}
