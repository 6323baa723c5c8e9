//! Reduction of the annual time series to a few weighted representative days.
//!
//! Days are compared on normalised, weighted profiles and grouped by solving a p-median problem,
//! so that every representative day is an actual day of the year (a medoid).
use crate::error::ModelError;
use crate::model::{ClusteringOptions, SolverOptions};
use crate::solver::{LinExpr, MilpProblem, SolveStatus, Solver, Var, solve_problem};
use crate::time_series::{Profile, SeriesKind, TimeSeriesSet};
use indexmap::IndexMap;
use itertools::Itertools;
use log::{info, warn};

/// Representative days and how often each occurs
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteredData {
    /// Number of time steps per day
    pub time_steps: usize,
    /// Number of original days represented by each representative day
    pub weights: Vec<f64>,
    /// For every original day, the index of its representative day
    pub assignment: Vec<usize>,
    /// For every representative day, the original day it is taken from
    pub medoids: Vec<usize>,
    /// The representative profiles of each series
    pub series: IndexMap<SeriesKind, Profile>,
    /// Total weighted distance of the days to their representatives
    pub objective: f64,
}

impl ClusteredData {
    /// Number of representative days
    pub fn num_days(&self) -> usize {
        self.weights.len()
    }

    /// Hours per time step
    pub fn dt(&self) -> f64 {
        24.0 / self.time_steps as f64
    }

    /// The largest weight of any representative day
    pub fn max_weight(&self) -> f64 {
        self.weights.iter().copied().fold(0.0, f64::max)
    }

    /// The representative profile of a series, if it was provided
    pub fn profile(&self, kind: SeriesKind) -> Option<&Profile> {
        self.series.get(&kind)
    }

    /// The representative profile of a series which the model cannot do without
    pub fn require(&self, kind: SeriesKind) -> Result<&Profile, ModelError> {
        self.profile(kind)
            .ok_or_else(|| ModelError::construction(format!("Missing time series {kind}")))
    }

    /// Weighted annual sum of a clustered profile
    pub fn annual_sum(&self, profile: &Profile) -> f64 {
        self.weights
            .iter()
            .zip(profile)
            .map(|(w, day)| w * day.iter().sum::<f64>())
            .sum()
    }

    /// Every day of the year as its own representative
    fn identity(ts: &TimeSeriesSet) -> Self {
        let days = ts.days_per_year;
        let series = ts
            .series
            .iter()
            .map(|(&kind, values)| (kind, split_days(values, ts.time_steps)))
            .collect();

        Self {
            time_steps: ts.time_steps,
            weights: vec![1.0; days],
            assignment: (0..days).collect(),
            medoids: (0..days).collect(),
            series,
            objective: 0.0,
        }
    }
}

/// Split an annual series into one vector per day
fn split_days(values: &[f64], time_steps: usize) -> Profile {
    values.chunks(time_steps).map(<[f64]>::to_vec).collect()
}

/// Scale a series to [0, 1] and multiply by its importance.
///
/// A constant series becomes all zeros.
fn normalise(values: &[f64], weight: f64) -> Vec<f64> {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;
    if range <= 0.0 {
        return vec![0.0; values.len()];
    }

    values.iter().map(|v| weight * (v - min) / range).collect()
}

/// Distance between two days, using the absolute (norm 1) or squared (norm 2) differences
fn distance(a: &[f64], b: &[f64], norm: u32) -> f64 {
    let diffs = a.iter().zip(b).map(|(x, y)| (x - y).abs());
    if norm == 1 {
        diffs.sum()
    } else {
        diffs.map(|d| d * d).sum()
    }
}

/// Check the inputs of the clustering
fn check_inputs(ts: &TimeSeriesSet, options: &ClusteringOptions) -> Result<(), ModelError> {
    if options.number_clusters == 0 {
        return Err(ModelError::clustering("The number of clusters must be positive"));
    }
    if !matches!(options.norm, 1 | 2) {
        return Err(ModelError::clustering(format!(
            "Unsupported norm {}",
            options.norm
        )));
    }
    if ts.days_per_year != options.days_per_year {
        return Err(ModelError::clustering(format!(
            "Time series cover {} days, expected {}",
            ts.days_per_year, options.days_per_year
        )));
    }

    if let Some(kind) = options.weights.keys().find(|k| !ts.series.contains_key(*k)) {
        return Err(ModelError::clustering(format!(
            "A weight is given for time series {kind}, which was not provided"
        )));
    }

    Ok(())
}

/// Build the normalised, weighted feature vector of every day
fn day_features(ts: &TimeSeriesSet, options: &ClusteringOptions) -> Vec<Vec<f64>> {
    let normalised = ts
        .series
        .iter()
        .map(|(&kind, values)| normalise(values, options.weight(kind)))
        .collect_vec();

    (0..ts.days_per_year)
        .map(|day| {
            let range = day * ts.time_steps..(day + 1) * ts.time_steps;
            normalised
                .iter()
                .flat_map(|values| values[range.clone()].iter().copied())
                .collect()
        })
        .collect()
}

/// Select `k` medoids minimising the total distance of all days to their medoid.
///
/// Returns the medoids in ascending order, the index of the medoid each day is assigned to and the
/// objective value.
fn solve_p_median(
    distances: &[Vec<f64>],
    k: usize,
    options: &ClusteringOptions,
    solver: &dyn Solver,
) -> Result<(Vec<usize>, Vec<usize>, f64), ModelError> {
    let days = distances.len();
    let mut problem = MilpProblem::default();
    let y: Vec<Var> = (0..days)
        .map(|m| problem.add_binary(format!("y[{m}]")))
        .collect();
    let z: Vec<Vec<Var>> = (0..days)
        .map(|d| {
            (0..days)
                .map(|m| problem.add_binary(format!("z[{d},{m}]")))
                .collect()
        })
        .collect();

    for d in 0..days {
        let assigned: LinExpr = z[d].iter().sum();
        problem.add_eq("assignment", assigned, 1.0);
        for m in 0..days {
            problem.add_le("medoid", z[d][m], y[m]);
        }
    }
    let medoids: LinExpr = y.iter().sum();
    problem.add_eq("number_clusters", medoids, k as f64);
    problem.set_objective(LinExpr::weighted_sum(
        (0..days)
            .cartesian_product(0..days)
            .map(|(d, m)| (z[d][m], distances[d][m])),
    ));

    let solver_options = SolverOptions {
        time_limit: options.time_limit,
        mip_gap: options.mip_gap,
        diagnose: false,
    };
    let solution = solve_problem(&problem, solver, &solver_options)
        .map_err(|err| ModelError::clustering(err.to_string()))?;
    if let SolveStatus::TimedOut { gap } = solution.status {
        return Err(ModelError::clustering(format!(
            "Time limit reached before optimality was proven (gap: {:.2}%)",
            100.0 * gap
        )));
    }

    let medoids = (0..days)
        .filter(|&m| solution.value(y[m]) > 0.5)
        .collect_vec();
    if medoids.len() != k {
        return Err(ModelError::clustering(format!(
            "Expected {k} medoids, the solver selected {}",
            medoids.len()
        )));
    }

    let assignment = (0..days)
        .map(|d| {
            medoids
                .iter()
                .position(|&m| solution.value(z[d][m]) > 0.5)
                .ok_or_else(|| ModelError::clustering(format!("Day {d} was not assigned")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok((medoids, assignment, solution.objective))
}

/// Scale the non-negative series so that the weighted representative days reproduce the annual
/// totals
fn rescale(clustered: &mut ClusteredData, ts: &TimeSeriesSet) {
    let weights = clustered.weights.clone();
    for (kind, profile) in clustered.series.iter_mut() {
        let Some(values) = ts.get(*kind) else {
            continue;
        };
        if kind.allows_negative() || values.iter().any(|&v| v < 0.0) {
            continue;
        }

        let annual: f64 = values.iter().sum();
        let clustered_sum: f64 = weights
            .iter()
            .zip(profile.iter())
            .map(|(w, day)| w * day.iter().sum::<f64>())
            .sum();
        if clustered_sum <= 0.0 {
            if annual > 0.0 {
                warn!("Cannot rescale time series {kind}: the representative days are all zero");
            }
            continue;
        }

        let factor = annual / clustered_sum;
        for value in profile.iter_mut().flatten() {
            *value *= factor;
        }
    }
}

/// Reduce the annual time series to representative days.
///
/// # Arguments
///
/// * `ts` - The annual time series
/// * `options` - Number of clusters, norm, series weights and solver limits
/// * `solver` - The MILP solver for the p-median problem
///
/// # Returns
///
/// The representative days, or [`ModelError::ClusteringFailed`] if the inputs are invalid or
/// optimality could not be proven.
pub fn cluster(
    ts: &TimeSeriesSet,
    options: &ClusteringOptions,
    solver: &dyn Solver,
) -> Result<ClusteredData, ModelError> {
    check_inputs(ts, options)?;

    let days = ts.days_per_year;
    let k = options.number_clusters;
    if k >= days {
        info!("{k} clusters requested for {days} days; using every day");
        return Ok(ClusteredData::identity(ts));
    }

    let features = day_features(ts, options);
    let distances = features
        .iter()
        .map(|a| {
            features
                .iter()
                .map(|b| distance(a, b, options.norm))
                .collect()
        })
        .collect_vec();
    let (medoids, assignment, objective) = solve_p_median(&distances, k, options, solver)?;

    let mut weights = vec![0.0; k];
    for &representative in &assignment {
        weights[representative] += 1.0;
    }

    let series = ts
        .series
        .iter()
        .map(|(&kind, values)| {
            let days = split_days(values, ts.time_steps);
            (kind, medoids.iter().map(|&m| days[m].clone()).collect())
        })
        .collect();

    let mut clustered = ClusteredData {
        time_steps: ts.time_steps,
        weights,
        assignment,
        medoids,
        series,
        objective,
    };
    if options.rescale {
        rescale(&mut clustered, ts);
    }

    info!(
        "Clustered {days} days into {k} representative days (objective {:.4})",
        clustered.objective
    );

    Ok(clustered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{HighsSolver, SolveOutcome};
    use float_cmp::assert_approx_eq;
    use indexmap::indexmap;
    use rstest::{fixture, rstest};

    /// Six days with three time steps: two cold, two mild and two warm days
    #[fixture]
    fn time_series() -> TimeSeriesSet {
        let temperature = [
            [-5.0, -3.0, -4.0],
            [8.0, 10.0, 9.0],
            [20.0, 24.0, 22.0],
            [-6.0, -2.0, -4.0],
            [9.0, 11.0, 8.0],
            [21.0, 25.0, 23.0],
        ];
        let electricity = [
            [0.5, 0.9, 0.7],
            [0.4, 0.6, 0.5],
            [0.3, 0.4, 0.3],
            [0.6, 0.9, 0.8],
            [0.4, 0.7, 0.5],
            [0.2, 0.4, 0.3],
        ];
        TimeSeriesSet::new(
            6,
            indexmap! {
                SeriesKind::Temperature => temperature.concat(),
                SeriesKind::Electricity => electricity.concat(),
            },
        )
        .unwrap()
    }

    fn options(k: usize, norm: u32) -> ClusteringOptions {
        ClusteringOptions {
            number_clusters: k,
            norm,
            days_per_year: 6,
            time_limit: 30.0,
            ..ClusteringOptions::default()
        }
    }

    #[test]
    fn test_normalise() {
        assert_eq!(normalise(&[1.0, 3.0, 2.0], 2.0), [0.0, 2.0, 1.0]);
        assert_eq!(normalise(&[4.0, 4.0], 8.0), [0.0, 0.0]);
    }

    #[rstest]
    #[case(1, 3.0)]
    #[case(2, 5.0)]
    fn test_distance(#[case] norm: u32, #[case] expected: f64) {
        assert_eq!(distance(&[0.0, 1.0], &[1.0, 3.0], norm), expected);
    }

    #[rstest]
    fn test_cluster_identity(time_series: TimeSeriesSet) {
        // No solver is needed when every day is its own cluster
        struct PanickingSolver;
        impl Solver for PanickingSolver {
            fn solve(&self, _: &MilpProblem, _: f64, _: f64) -> SolveOutcome {
                panic!("Solver should not be called")
            }
        }

        let clustered = cluster(&time_series, &options(6, 2), &PanickingSolver).unwrap();
        assert_eq!(clustered.weights, [1.0; 6]);
        assert_eq!(clustered.assignment, [0, 1, 2, 3, 4, 5]);
        assert_eq!(clustered.medoids, clustered.assignment);
        assert_eq!(clustered.profile(SeriesKind::Temperature).unwrap()[2], [20.0, 24.0, 22.0]);
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    fn test_cluster_groups_similar_days(time_series: TimeSeriesSet, #[case] norm: u32) {
        let clustered = cluster(&time_series, &options(3, norm), &HighsSolver).unwrap();
        assert_eq!(clustered.num_days(), 3);
        assert_eq!(clustered.weights, [2.0; 3]);

        // Cold, mild and warm days end up together
        let a = &clustered.assignment;
        assert_eq!(a[0], a[3]);
        assert_eq!(a[1], a[4]);
        assert_eq!(a[2], a[5]);
        for (i, &m) in clustered.medoids.iter().enumerate() {
            assert_eq!(a[m], i);
        }
    }

    #[rstest]
    fn test_cluster_conserves_weights_and_totals(time_series: TimeSeriesSet) {
        let clustered = cluster(&time_series, &options(2, 2), &HighsSolver).unwrap();
        assert_eq!(clustered.weights.iter().sum::<f64>(), 6.0);
        assert!(clustered.weights.iter().all(|w| *w >= 0.0 && w.fract() == 0.0));

        let annual: f64 = time_series.get(SeriesKind::Electricity).unwrap().iter().sum();
        let electricity = clustered.profile(SeriesKind::Electricity).unwrap();
        assert_approx_eq!(f64, clustered.annual_sum(electricity), annual, epsilon = 1e-9);

        // Temperature is never rescaled, so the representative days are real days
        let temperature = clustered.profile(SeriesKind::Temperature).unwrap();
        for (day, &m) in temperature.iter().zip(&clustered.medoids) {
            assert_eq!(day, &time_series.day(SeriesKind::Temperature, m).unwrap());
        }
    }

    #[rstest]
    fn test_cluster_without_rescaling(time_series: TimeSeriesSet) {
        let mut options = options(2, 2);
        options.rescale = false;
        let clustered = cluster(&time_series, &options, &HighsSolver).unwrap();
        let electricity = clustered.profile(SeriesKind::Electricity).unwrap();
        for (day, &m) in electricity.iter().zip(&clustered.medoids) {
            assert_eq!(day, &time_series.day(SeriesKind::Electricity, m).unwrap());
        }
    }

    #[rstest]
    #[case(options(0, 2), "Clustering failed: The number of clusters must be positive")]
    #[case(options(2, 3), "Clustering failed: Unsupported norm 3")]
    #[case(
        ClusteringOptions { days_per_year: 3, ..options(2, 2) },
        "Clustering failed: Time series cover 6 days, expected 3"
    )]
    #[case(
        ClusteringOptions {
            weights: indexmap! { SeriesKind::WindSpeed => 2.0 },
            ..options(2, 2)
        },
        "Clustering failed: A weight is given for time series wind_speed, which was not provided"
    )]
    fn test_cluster_invalid(
        time_series: TimeSeriesSet,
        #[case] options: ClusteringOptions,
        #[case] msg: &str,
    ) {
        let err = cluster(&time_series, &options, &HighsSolver).unwrap_err();
        assert_eq!(err.to_string(), msg);
    }

    #[rstest]
    fn test_cluster_timed_out(time_series: TimeSeriesSet) {
        struct TimingOutSolver;
        impl Solver for TimingOutSolver {
            fn solve(&self, _: &MilpProblem, _: f64, _: f64) -> SolveOutcome {
                SolveOutcome::TimedOut(None)
            }
        }

        let err = cluster(&time_series, &options(2, 2), &TimingOutSolver).unwrap_err();
        assert!(matches!(err, ModelError::ClusteringFailed { .. }));
    }
}
