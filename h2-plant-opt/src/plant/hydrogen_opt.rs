//! Formulation of the plant scheduling problem.
//!
//! Every day the wind turbines, the grid and the battery have to cover the
//! electricity taken by the electrolyzers. Over the whole horizon the plant
//! must deliver a fixed amount of hydrogen and sell at least as much energy to
//! the grid as it buys. The model minimises turbine maintenance, water and net
//! grid costs.
//!
//! Note that an electrolyzer's hydrogen output is pinned twice, once by its
//! electricity input and once by its water input. Together the two rows fix
//! the water to electricity ratio at `water_per_kg / energy_per_kg`.
use plant_model::storage::InitialCharge;

use crate::error::ModelError;
use crate::general::wind_data::WindTable;
use crate::plant::availability::AvailabilityMask;
use crate::plant::config::PlantConfig;
use crate::plant::linear::{Direction, LinearExpr, Model, ModelBuilder, Relation, VarId};

/// Handles to the decision variables of a plant model.
///
/// Per-entity families are stored entity-major: entry `m * horizon + t`
/// belongs to turbine (or electrolyzer) `m` on day `t`.
#[derive(Debug, Clone)]
pub struct PlantVariables {
    horizon: usize,
    turbines: usize,
    electrolyzers: usize,
    buy: Vec<VarId>,
    sell: Vec<VarId>,
    charge: Vec<VarId>,
    discharge: Vec<VarId>,
    level: Vec<VarId>,
    turbine_output: Vec<VarId>,
    turbine_on: Vec<VarId>,
    energy_to_electrolyzer: Vec<VarId>,
    water_to_electrolyzer: Vec<VarId>,
    hydrogen_out: Vec<VarId>,
}

impl PlantVariables {
    fn declare(builder: &mut ModelBuilder, config: &PlantConfig) -> Result<Self, ModelError> {
        let horizon = config.horizon_days;
        let turbines = config.turbine_count;
        let electrolyzers = config.electrolyzer_count;

        let mut daily = |name: &str, upper: Option<f64>| {
            (0..horizon)
                .map(|t| builder.add_continuous(format!("{name}[{t}]"), upper))
                .collect::<Result<Vec<_>, _>>()
        };
        let buy = daily("buy", None)?;
        let sell = daily("sell", None)?;
        let charge = daily("charge", None)?;
        let discharge = daily("discharge", None)?;
        let level = daily("level", Some(config.battery.capacity_mwh))?;

        let mut turbine_output = Vec::with_capacity(turbines * horizon);
        let mut turbine_on = Vec::with_capacity(turbines * horizon);
        for m in 0..turbines {
            for t in 0..horizon {
                turbine_output.push(builder.add_continuous(
                    format!("turbine_output[{m},{t}]"),
                    Some(config.turbine.max_output_mwh),
                )?);
                turbine_on.push(builder.add_binary(format!("turbine_on[{m},{t}]")));
            }
        }

        let mut energy_to_electrolyzer = Vec::with_capacity(electrolyzers * horizon);
        let mut water_to_electrolyzer = Vec::with_capacity(electrolyzers * horizon);
        let mut hydrogen_out = Vec::with_capacity(electrolyzers * horizon);
        for n in 0..electrolyzers {
            for t in 0..horizon {
                energy_to_electrolyzer
                    .push(builder.add_continuous(format!("energy_to_electrolyzer[{n},{t}]"), None)?);
                water_to_electrolyzer
                    .push(builder.add_continuous(format!("water_to_electrolyzer[{n},{t}]"), None)?);
                hydrogen_out.push(builder.add_continuous(
                    format!("hydrogen_out[{n},{t}]"),
                    Some(config.electrolyzer.max_hydrogen_kg),
                )?);
            }
        }

        Ok(Self {
            horizon,
            turbines,
            electrolyzers,
            buy,
            sell,
            charge,
            discharge,
            level,
            turbine_output,
            turbine_on,
            energy_to_electrolyzer,
            water_to_electrolyzer,
            hydrogen_out,
        })
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn turbines(&self) -> usize {
        self.turbines
    }

    pub fn electrolyzers(&self) -> usize {
        self.electrolyzers
    }

    fn day(&self, vars: &[VarId], t: usize) -> Result<VarId, ModelError> {
        if t >= self.horizon {
            return Err(ModelError::IndexOutOfRange {
                set: "day",
                index: t,
                size: self.horizon,
            });
        }
        Ok(vars[t])
    }

    fn entity_day(
        &self,
        vars: &[VarId],
        set: &'static str,
        size: usize,
        index: usize,
        t: usize,
    ) -> Result<VarId, ModelError> {
        if index >= size {
            return Err(ModelError::IndexOutOfRange { set, index, size });
        }
        self.day(&vars[index * self.horizon..(index + 1) * self.horizon], t)
    }

    pub fn buy(&self, t: usize) -> Result<VarId, ModelError> {
        self.day(&self.buy, t)
    }

    pub fn sell(&self, t: usize) -> Result<VarId, ModelError> {
        self.day(&self.sell, t)
    }

    pub fn charge(&self, t: usize) -> Result<VarId, ModelError> {
        self.day(&self.charge, t)
    }

    pub fn discharge(&self, t: usize) -> Result<VarId, ModelError> {
        self.day(&self.discharge, t)
    }

    pub fn level(&self, t: usize) -> Result<VarId, ModelError> {
        self.day(&self.level, t)
    }

    pub fn turbine_output(&self, m: usize, t: usize) -> Result<VarId, ModelError> {
        self.entity_day(&self.turbine_output, "turbine", self.turbines, m, t)
    }

    pub fn turbine_on(&self, m: usize, t: usize) -> Result<VarId, ModelError> {
        self.entity_day(&self.turbine_on, "turbine", self.turbines, m, t)
    }

    pub fn energy_to_electrolyzer(&self, n: usize, t: usize) -> Result<VarId, ModelError> {
        self.entity_day(
            &self.energy_to_electrolyzer,
            "electrolyzer",
            self.electrolyzers,
            n,
            t,
        )
    }

    pub fn water_to_electrolyzer(&self, n: usize, t: usize) -> Result<VarId, ModelError> {
        self.entity_day(
            &self.water_to_electrolyzer,
            "electrolyzer",
            self.electrolyzers,
            n,
            t,
        )
    }

    pub fn hydrogen_out(&self, n: usize, t: usize) -> Result<VarId, ModelError> {
        self.entity_day(&self.hydrogen_out, "electrolyzer", self.electrolyzers, n, t)
    }

    /// All continuous variables, in declaration order per family
    fn continuous(&self) -> impl Iterator<Item = VarId> + '_ {
        [
            &self.buy,
            &self.sell,
            &self.charge,
            &self.discharge,
            &self.level,
            &self.turbine_output,
            &self.energy_to_electrolyzer,
            &self.water_to_electrolyzer,
            &self.hydrogen_out,
        ]
        .into_iter()
        .flatten()
        .copied()
    }
}

/// A plant model ready to be handed to the solver
#[derive(Debug, Clone)]
pub struct PlantModel {
    model: Model,
    variables: PlantVariables,
    availability: AvailabilityMask,
    config: PlantConfig,
}

impl PlantModel {
    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn variables(&self) -> &PlantVariables {
        &self.variables
    }

    pub fn availability(&self) -> &AvailabilityMask {
        &self.availability
    }

    pub fn config(&self) -> &PlantConfig {
        &self.config
    }
}

/// Validate the configuration, derive turbine availability from the wind
/// table and build the model
pub fn build_plant_model_from_wind(
    config: &PlantConfig,
    wind: &WindTable,
) -> Result<PlantModel, ModelError> {
    config.validate()?;
    let availability = AvailabilityMask::compute(
        wind,
        &config.turbine.wind_band,
        config.turbine_count,
        config.horizon_days,
    )?;
    build_plant_model(config, availability)
}

/// Build the scheduling model for a configuration and availability mask
pub fn build_plant_model(
    config: &PlantConfig,
    availability: AvailabilityMask,
) -> Result<PlantModel, ModelError> {
    config.validate()?;
    if availability.turbines() != config.turbine_count {
        return Err(ModelError::IndexOutOfRange {
            set: "turbine",
            index: availability.turbines(),
            size: config.turbine_count,
        });
    }
    if availability.days() != config.horizon_days {
        return Err(ModelError::IndexOutOfRange {
            set: "day",
            index: availability.days(),
            size: config.horizon_days,
        });
    }

    for m in 0..availability.turbines() {
        log::info!(
            "Turbine {m} can run on {} of {} days",
            availability.available_days(m),
            availability.days()
        );
    }
    if config.target_hydrogen_kg > config.hydrogen_capacity_kg() {
        log::warn!(
            "Hydrogen target of {} kg exceeds the electrolyzer capacity of {} kg",
            config.target_hydrogen_kg,
            config.hydrogen_capacity_kg()
        );
    }
    log::debug!(
        "Electrolyzers draw {} L of water per MWh",
        config.electrolyzer.water_per_mwh()
    );

    let mut builder = ModelBuilder::new();
    let vars = PlantVariables::declare(&mut builder, config)?;
    log::debug!(
        "Declared {} variables for {} days, {} turbines, {} electrolyzers",
        builder.num_variables(),
        vars.horizon,
        vars.turbines,
        vars.electrolyzers
    );

    add_turbine_constraints(&mut builder, config, &vars, &availability)?;
    add_energy_balance_constraints(&mut builder, &vars)?;
    add_battery_constraints(&mut builder, config, &vars)?;
    add_electrolyzer_constraints(&mut builder, config, &vars)?;
    add_horizon_constraints(&mut builder, config, &vars)?;
    add_non_negativity_constraints(&mut builder, &vars)?;

    let objective = generate_objective(config, &vars)?;
    let model = builder.build(Direction::Minimise, objective)?;

    log::info!(
        "Built plant model with {} variables ({} binary) and {} constraints",
        model.variables().len(),
        model.num_binaries(),
        model.constraints().len()
    );

    Ok(PlantModel {
        model,
        variables: vars,
        availability,
        config: config.clone(),
    })
}

/// Cost over the horizon: maintenance of committed turbines, water, and grid
/// purchases minus grid revenue
fn generate_objective(
    config: &PlantConfig,
    vars: &PlantVariables,
) -> Result<LinearExpr, ModelError> {
    let mut objective = LinearExpr::new();

    for t in 0..vars.horizon {
        for m in 0..vars.turbines {
            objective += config.turbine.maintenance_cost * vars.turbine_on(m, t)?;
        }
        for n in 0..vars.electrolyzers {
            objective += config.water_unit_cost * vars.water_to_electrolyzer(n, t)?;
        }
        objective += config.grid.buy_price * vars.buy(t)?;
        objective -= config.grid.sell_price * vars.sell(t)?;
    }

    Ok(objective)
}

/// A turbine may only be committed on available days, and only delivers
/// energy when committed
fn add_turbine_constraints(
    builder: &mut ModelBuilder,
    config: &PlantConfig,
    vars: &PlantVariables,
    availability: &AvailabilityMask,
) -> Result<(), ModelError> {
    for m in 0..vars.turbines {
        for t in 0..vars.horizon {
            let on = vars.turbine_on(m, t)?;
            let available = if availability.is_available(m, t)? { 1.0 } else { 0.0 };
            builder.add_constraint(
                format!("availability_gate[{m},{t}]"),
                on,
                Relation::LessEq,
                available,
            )?;

            builder.add_constraint(
                format!("output_cap[{m},{t}]"),
                LinearExpr::from(vars.turbine_output(m, t)?)
                    - config.turbine.max_output_mwh * on,
                Relation::LessEq,
                0.0,
            )?;
        }
    }
    Ok(())
}

/// Turbines + purchases + discharge = electrolyzers + sales + charge
fn add_energy_balance_constraints(
    builder: &mut ModelBuilder,
    vars: &PlantVariables,
) -> Result<(), ModelError> {
    for t in 0..vars.horizon {
        let mut supply = LinearExpr::new();
        for m in 0..vars.turbines {
            supply += vars.turbine_output(m, t)?;
        }
        supply += vars.buy(t)?;
        supply += vars.discharge(t)?;

        let mut demand = LinearExpr::new();
        for n in 0..vars.electrolyzers {
            demand += vars.energy_to_electrolyzer(n, t)?;
        }
        demand += vars.sell(t)?;
        demand += vars.charge(t)?;

        builder.add_constraint(
            format!("energy_balance[{t}]"),
            supply - demand,
            Relation::Eq,
            0.0,
        )?;
    }
    Ok(())
}

fn add_battery_constraints(
    builder: &mut ModelBuilder,
    config: &PlantConfig,
    vars: &PlantVariables,
) -> Result<(), ModelError> {
    let retention = config.battery.retention();

    // Day 0 has no previous level: it stores the net flow of the day
    builder.add_constraint(
        "battery_initial",
        LinearExpr::from(vars.charge(0)?) - vars.discharge(0)? - vars.level(0)?,
        Relation::Eq,
        0.0,
    )?;
    if config.battery.initial_charge == InitialCharge::Empty {
        builder.add_constraint("battery_initial_empty", vars.level(0)?, Relation::Eq, 0.0)?;
    }

    for t in 1..vars.horizon {
        builder.add_constraint(
            format!("battery_dynamics[{t}]"),
            retention * vars.level(t - 1)? + vars.charge(t)? - vars.discharge(t)?
                - vars.level(t)?,
            Relation::Eq,
            0.0,
        )?;
    }

    for t in 0..vars.horizon {
        builder.add_constraint(
            format!("battery_capacity[{t}]"),
            vars.level(t)?,
            Relation::LessEq,
            config.battery.capacity_mwh,
        )?;
    }
    Ok(())
}

/// Conversion rows for both inputs of every electrolyzer, plus its daily cap
fn add_electrolyzer_constraints(
    builder: &mut ModelBuilder,
    config: &PlantConfig,
    vars: &PlantVariables,
) -> Result<(), ModelError> {
    let kg_per_mwh = 1.0 / config.electrolyzer.energy_per_kg_mwh;
    let kg_per_litre = 1.0 / config.electrolyzer.water_per_kg_l;

    for n in 0..vars.electrolyzers {
        for t in 0..vars.horizon {
            let hydrogen = vars.hydrogen_out(n, t)?;
            builder.add_constraint(
                format!("conversion_energy[{n},{t}]"),
                LinearExpr::from(hydrogen) - kg_per_mwh * vars.energy_to_electrolyzer(n, t)?,
                Relation::Eq,
                0.0,
            )?;
            builder.add_constraint(
                format!("conversion_water[{n},{t}]"),
                LinearExpr::from(hydrogen) - kg_per_litre * vars.water_to_electrolyzer(n, t)?,
                Relation::Eq,
                0.0,
            )?;
            builder.add_constraint(
                format!("electrolyzer_cap[{n},{t}]"),
                hydrogen,
                Relation::LessEq,
                config.electrolyzer.max_hydrogen_kg,
            )?;
        }
    }
    Ok(())
}

/// Rows spanning the whole horizon: hydrogen target and net green export
fn add_horizon_constraints(
    builder: &mut ModelBuilder,
    config: &PlantConfig,
    vars: &PlantVariables,
) -> Result<(), ModelError> {
    let mut hydrogen = LinearExpr::new();
    for n in 0..vars.electrolyzers {
        for t in 0..vars.horizon {
            hydrogen += vars.hydrogen_out(n, t)?;
        }
    }
    builder.add_constraint(
        "hydrogen_target",
        hydrogen,
        Relation::GreaterEq,
        config.target_hydrogen_kg,
    )?;

    let mut net_export = LinearExpr::new();
    for t in 0..vars.horizon {
        net_export += vars.sell(t)?;
        net_export -= vars.buy(t)?;
    }
    builder.add_constraint("self_sufficiency", net_export, Relation::GreaterEq, 0.0)?;
    Ok(())
}

/// Variable bounds already enforce these; the rows make them checkable on
/// their own
fn add_non_negativity_constraints(
    builder: &mut ModelBuilder,
    vars: &PlantVariables,
) -> Result<(), ModelError> {
    for var in vars.continuous() {
        builder.add_constraint(
            format!("non_negative[{}]", var.index()),
            var,
            Relation::GreaterEq,
            0.0,
        )?;
    }
    Ok(())
}
