//! Trade-off between cost and emissions.
//!
//! The two ends of the front are found lexicographically (the best emissions at the lowest cost
//! and the lowest cost at the best emissions), then the emission range between them is divided
//! into equal steps and the cost is minimised under each emission cap.
use crate::clustering::ClusteredData;
use crate::error::ModelError;
use crate::model::{Model, Objective};
use crate::optimisation::{ScenarioResult, compute};
use crate::output::{create_output_directory, write_metadata, write_results};
use crate::solver::{SolveStatus, Solver};
use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The output file name for the summary of the front
pub const PARETO_FILE_NAME: &str = "pareto.csv";

/// Default number of points between the two ends of the front
pub const DEFAULT_POINTS: usize = 8;

/// Slack on the optimum of the first objective when optimising the second (EUR/a or t/a)
const LEXICOGRAPHIC_TOLERANCE: f64 = 0.01;

/// A solved point of the front
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParetoPoint {
    /// Index of the point, 0 being the cost-optimal end
    pub point: usize,
    /// Annualised total cost (EUR/a)
    pub cost: f64,
    /// Annual emissions (t/a)
    pub emission: f64,
    /// `optimal` or `timed_out`
    pub status: String,
}

impl ParetoPoint {
    fn new(point: usize, result: &ScenarioResult) -> Self {
        let status = match result.status {
            SolveStatus::Optimal => "optimal",
            SolveStatus::TimedOut { .. } => "timed_out",
        };
        Self {
            point,
            cost: result.total_cost,
            emission: result.emission,
            status: status.into(),
        }
    }
}

/// Solve the model with another objective and caps
fn solve_with(
    model: &Model,
    clustered: &ClusteredData,
    solver: &dyn Solver,
    objective: Objective,
    max_cost: Option<f64>,
    max_emissions: Option<f64>,
) -> Result<ScenarioResult, ModelError> {
    let mut model = model.clone();
    model.options.objective = objective;
    if let Some(max_cost) = max_cost {
        model.options.max_cost = max_cost;
    }
    if let Some(max_emissions) = max_emissions {
        model.options.max_emissions = max_emissions;
    }

    compute(&model, clustered, solver)
}

/// Write the results of one point to its own folder
fn write_point(
    output_dir: &Path,
    model: &Model,
    point: usize,
    result: &ScenarioResult,
) -> Result<()> {
    let point_dir = output_dir.join(format!("pareto_{point:02}"));
    create_output_directory(&point_dir, true)?;
    write_results(&point_dir, result)?;
    write_metadata(&point_dir, &model.model_dir, Some(result))
}

/// Compute the cost-emission front of a scenario.
///
/// # Arguments
///
/// * `model` - The scenario
/// * `clustered` - Representative days of the time series
/// * `solver` - The MILP solver
/// * `points` - Number of points between the two ends of the front
/// * `output_dir` - Folder for the results of each point and the summary
///
/// # Returns
///
/// The solved points, ordered from the cheapest to the cleanest. Intermediate points which
/// cannot be solved are skipped.
pub fn run_pareto(
    model: &Model,
    clustered: &ClusteredData,
    solver: &dyn Solver,
    points: usize,
    output_dir: &Path,
) -> Result<Vec<ParetoPoint>> {
    let solve = |objective, max_cost, max_emissions| {
        solve_with(model, clustered, solver, objective, max_cost, max_emissions)
    };

    // Cost-optimal end
    info!("Minimising costs");
    let cost_optimum = solve(Objective::Costs, None, None).context("Failed to minimise costs")?;
    let cheapest = solve(
        Objective::Emissions,
        Some(cost_optimum.total_cost + LEXICOGRAPHIC_TOLERANCE),
        None,
    )
    .context("Failed to minimise emissions at the lowest cost")?;

    // Emission-optimal end
    info!("Minimising emissions");
    let emission_optimum =
        solve(Objective::Emissions, None, None).context("Failed to minimise emissions")?;
    let cleanest = solve(
        Objective::Costs,
        None,
        Some(emission_optimum.emission + LEXICOGRAPHIC_TOLERANCE),
    )
    .context("Failed to minimise costs at the lowest emissions")?;

    let e_max = cheapest.emission;
    let e_min = cleanest.emission;
    info!("Emissions range from {e_min:.3} to {e_max:.3} t/a");

    let mut front = vec![ParetoPoint::new(0, &cheapest)];
    write_point(output_dir, model, 0, &cheapest)?;

    for i in 1..=points {
        let cap = e_max - (e_max - e_min) * i as f64 / (points + 1) as f64;
        info!("Point {i}: emissions capped at {cap:.3} t/a");
        match solve(Objective::Costs, None, Some(cap)) {
            Ok(result) => {
                write_point(output_dir, model, i, &result)?;
                front.push(ParetoPoint::new(i, &result));
            }
            Err(err @ (ModelError::InfeasibleModel { .. } | ModelError::SolveTimedOut { .. })) => {
                warn!("Skipping point {i}: {err}");
            }
            Err(err) => return Err(err).with_context(|| format!("Failed to solve point {i}")),
        }
    }

    let last = points + 1;
    write_point(output_dir, model, last, &cleanest)?;
    front.push(ParetoPoint::new(last, &cleanest));

    let mut writer = csv::Writer::from_path(output_dir.join(PARETO_FILE_NAME))?;
    for point in &front {
        writer.serialize(point)?;
    }
    writer.flush()?;

    Ok(front)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{clustered, model};
    use crate::output::read_results;
    use crate::solver::HighsSolver;
    use itertools::Itertools;
    use rstest::rstest;
    use tempfile::tempdir;

    #[rstest]
    fn test_run_pareto(model: Model, clustered: ClusteredData) {
        let dir = tempdir().unwrap();
        let front = run_pareto(&model, &clustered, &HighsSolver, 1, dir.path()).unwrap();

        assert_eq!(front.first().unwrap().point, 0);
        assert_eq!(front.last().unwrap().point, 2);
        for (a, b) in front.iter().tuple_windows() {
            let slack = LEXICOGRAPHIC_TOLERANCE + 1e-6;
            assert!(b.emission <= a.emission + slack);
            assert!(b.cost >= a.cost - slack);
        }

        for point in &front {
            let point_dir = dir.path().join(format!("pareto_{:02}", point.point));
            assert!(!read_results(&point_dir).unwrap().is_empty());
        }
        let summary: Vec<ParetoPoint> = csv::Reader::from_path(dir.path().join(PARETO_FILE_NAME))
            .unwrap()
            .into_deserialize()
            .try_collect()
            .unwrap();
        assert_eq!(summary, front);
    }
}
