use crate::plant::config::PlantConfig;
use crate::plant::results::PlantResults;

/// The objective of a schedule split into its cost components
#[derive(Debug, Clone, PartialEq)]
pub struct CostBreakdown {
    pub maintenance_cost: f64,
    pub water_cost: f64,
    pub grid_purchase_cost: f64,
    pub grid_revenue: f64,
    pub committed_turbine_days: usize,
    pub cost_per_kg: Option<f64>, // None when no hydrogen is produced
}

impl CostBreakdown {
    /// Net cost; equals the objective of the schedule
    pub fn total(&self) -> f64 {
        self.maintenance_cost + self.water_cost + self.grid_purchase_cost - self.grid_revenue
    }
}

/// Split the cost of an aggregated schedule using the prices of `config`
pub fn cost_breakdown(config: &PlantConfig, results: &PlantResults) -> CostBreakdown {
    let maintenance_cost = results.committed_turbine_days as f64 * config.turbine.maintenance_cost;
    let water_cost = results.total_water_l * config.water_unit_cost;
    let grid_purchase_cost = results.total_energy_bought_mwh * config.grid.buy_price;
    let grid_revenue = results.total_energy_sold_mwh * config.grid.sell_price;

    let total = maintenance_cost + water_cost + grid_purchase_cost - grid_revenue;
    let cost_per_kg = (results.total_hydrogen_kg > 0.0).then(|| total / results.total_hydrogen_kg);

    CostBreakdown {
        maintenance_cost,
        water_cost,
        grid_purchase_cost,
        grid_revenue,
        committed_turbine_days: results.committed_turbine_days,
        cost_per_kg,
    }
}

pub fn log_cost_breakdown(breakdown: &CostBreakdown) {
    log::info!("=== COST BREAKDOWN ===");
    log::info!(
        "Turbine maintenance: ${:.2} ({} turbine-days)",
        breakdown.maintenance_cost,
        breakdown.committed_turbine_days
    );
    log::info!("Water: ${:.2}", breakdown.water_cost);
    log::info!("Grid purchases: ${:.2}", breakdown.grid_purchase_cost);
    log::info!("Grid revenue: -${:.2}", breakdown.grid_revenue);
    log::info!("Net cost: ${:.2}", breakdown.total());
    match breakdown.cost_per_kg {
        Some(cost) => log::info!("Cost per kg of hydrogen: ${cost:.2}"),
        None => log::info!("Cost per kg of hydrogen: n/a (no hydrogen produced)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plant::results::DailySeries;
    use crate::plant::solver::SolveStatus;

    fn results(hydrogen: f64) -> PlantResults {
        PlantResults {
            status: SolveStatus::Optimal,
            objective: 0.0,
            total_energy_bought_mwh: 1.0,
            total_energy_sold_mwh: 3.5,
            net_energy_balance_mwh: 2.5,
            total_hydrogen_kg: hydrogen,
            total_water_l: 150.0,
            committed_turbine_days: 2,
            turbine_output_mwh: vec![3.0, 2.0],
            electrolyzer_hydrogen_kg: vec![hydrogen],
            avg_energy_bought_mwh: 0.5,
            avg_energy_sold_mwh: 1.75,
            avg_hydrogen_kg: hydrogen / 2.0,
            daily: DailySeries::default(),
        }
    }

    #[test]
    fn test_breakdown_matches_objective_terms() {
        let config = PlantConfig::default();
        let breakdown = cost_breakdown(&config, &results(10.0));

        assert_eq!(breakdown.maintenance_cost, 260_000.0);
        assert_eq!(breakdown.water_cost, 150.0);
        assert_eq!(breakdown.grid_purchase_cost, 120_000.0);
        assert_eq!(breakdown.grid_revenue, 175_000.0);
        assert_eq!(breakdown.total(), 205_150.0);
        assert_eq!(breakdown.cost_per_kg, Some(20_515.0));
    }

    #[test]
    fn test_no_hydrogen_has_no_unit_cost() {
        let config = PlantConfig::default();
        let breakdown = cost_breakdown(&config, &results(0.0));
        assert_eq!(breakdown.cost_per_kg, None);
    }
}
