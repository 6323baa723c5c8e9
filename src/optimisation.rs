//! The building optimisation model.
//!
//! For one building and scenario, [`compute`] builds a single MILP which chooses the devices, their
//! capacities and hourly operation, the retrofit of each envelope component and the subsidies which
//! are claimed, then solves it and extracts the result records.
use crate::clustering::ClusteredData;
use crate::error::ModelError;
use crate::model::{Model, Objective};
use crate::solver::{MilpProblem, Solver, solve_problem};
use log::{debug, info};

pub mod context;
pub mod results;
pub mod variables;

mod balances;
mod devices;
mod economics;
mod envelope;
mod presets;
mod storage;
mod subsidies;
mod ventilation;

use context::Context;
pub use results::{ResultRecord, ScenarioResult, collect_results};
use variables::Variables;

/// Build the complete problem for a scenario on its representative days
pub fn build_problem(ctx: &Context) -> Result<(MilpProblem, Variables), ModelError> {
    let mut problem = MilpProblem::default();
    let vars = Variables::new(&mut problem, ctx);
    let options = ctx.options();

    devices::add_device_constraints(&mut problem, ctx, &vars);
    storage::add_storage_constraints(&mut problem, ctx, &vars);
    balances::add_balance_constraints(&mut problem, ctx, &vars);
    envelope::add_envelope_constraints(&mut problem, ctx, &vars);
    ventilation::add_ventilation_constraints(&mut problem, ctx, &vars)?;
    economics::add_economic_constraints(&mut problem, ctx, &vars)?;
    subsidies::add_subsidy_constraints(&mut problem, ctx, &vars)?;
    presets::add_preset_constraints(&mut problem, &vars, options.preset);

    // Caps on the quantity which is not minimised
    let costs = &vars.costs;
    problem.add_le("emission_cap", 0.001 * costs.emission, options.max_emissions);
    problem.add_le("cost_cap", costs.c_total, options.max_cost);

    problem.set_objective(match options.objective {
        Objective::Costs => costs.c_total,
        Objective::Emissions => costs.emission,
    });

    debug!(
        "Built model with {} variables and {} constraints in {} groups",
        problem.num_columns(),
        problem.num_rows(),
        problem.group_counts().len()
    );

    Ok((problem, vars))
}

/// Build and solve the model of a scenario.
///
/// # Arguments
///
/// * `model` - The scenario inputs
/// * `clustered` - Representative days of the time series
/// * `solver` - The MILP solver
///
/// # Returns
///
/// The result records, or an error if the model is infeasible or no solution was found in time.
/// A solution found when the time limit was reached is returned with a `TimedOut` status.
pub fn compute(
    model: &Model,
    clustered: &ClusteredData,
    solver: &dyn Solver,
) -> Result<ScenarioResult, ModelError> {
    let ctx = Context::new(model, clustered)?;
    let (problem, vars) = build_problem(&ctx)?;
    let solution = solve_problem(&problem, solver, &model.options.solver)?;
    let result = collect_results(&ctx, &problem, &vars, &solution);
    info!(
        "Total cost: {:.2} EUR/a, emissions: {:.3} t/a",
        result.total_cost, result.emission
    );

    Ok(result)
}
