//! Typed errors surfaced by the optimiser.
//!
//! Application code (input loading, the CLI) works with [`anyhow::Result`] like the rest of the
//! program, but the outcome of clustering and of `compute()` needs to be distinguishable by
//! callers, e.g. a Pareto sweep skips an infeasible point but aborts on a construction error.
use derive_more::{Display, Error};

/// An error which prevents a scenario from producing a usable solution.
#[derive(Debug, Clone, PartialEq, Display, Error)]
pub enum ModelError {
    /// A time series, catalog or configuration file is missing or malformed
    #[display("Failed to load input data: {message}")]
    DataLoad {
        /// Description of the problem, including the file concerned
        message: String,
    },
    /// The time-series clustering could not produce a proven-optimal set of representative days
    #[display("Clustering failed: {reason}")]
    ClusteringFailed {
        /// Why clustering failed
        reason: String,
    },
    /// An internal invariant was violated while building the model
    #[display("Could not construct model: {message}")]
    ModelConstruction {
        /// Which invariant was violated
        message: String,
    },
    /// The solver proved that no feasible assignment exists
    #[display("Model is infeasible{}", format_diagnosis(diagnosis))]
    InfeasibleModel {
        /// Constraint groups whose removal makes the model feasible, if a diagnosis was run
        diagnosis: Vec<String>,
    },
    /// The time limit was reached before the solver found a usable solution
    #[display("Solver reached its time limit{}", format_gap(*gap))]
    SolveTimedOut {
        /// The relative optimality gap of the best incumbent, if any
        gap: Option<f64>,
    },
}

fn format_diagnosis(diagnosis: &[String]) -> String {
    if diagnosis.is_empty() {
        String::new()
    } else {
        format!(" (conflicting constraint groups: {})", diagnosis.join(", "))
    }
}

fn format_gap(gap: Option<f64>) -> String {
    gap.map(|gap| format!(" (gap: {:.2}%)", 100.0 * gap))
        .unwrap_or_default()
}

impl ModelError {
    /// Create a [`ModelError::ModelConstruction`] error
    pub fn construction(message: impl Into<String>) -> Self {
        Self::ModelConstruction {
            message: message.into(),
        }
    }

    /// Create a [`ModelError::ClusteringFailed`] error
    pub fn clustering(reason: impl Into<String>) -> Self {
        Self::ClusteringFailed {
            reason: reason.into(),
        }
    }

    /// Create a [`ModelError::DataLoad`] error from an error chain
    pub fn data_load(err: &anyhow::Error) -> Self {
        Self::DataLoad {
            message: format!("{err:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ModelError::InfeasibleModel { diagnosis: vec![] }, "Model is infeasible")]
    #[case(
        ModelError::InfeasibleModel { diagnosis: vec!["emission_cap".into(), "benchmark".into()] },
        "Model is infeasible (conflicting constraint groups: emission_cap, benchmark)"
    )]
    #[case(ModelError::SolveTimedOut { gap: None }, "Solver reached its time limit")]
    #[case(
        ModelError::SolveTimedOut { gap: Some(0.125) },
        "Solver reached its time limit (gap: 12.50%)"
    )]
    #[case(ModelError::clustering("k must be positive"), "Clustering failed: k must be positive")]
    fn test_display(#[case] err: ModelError, #[case] expected: &str) {
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn test_data_load_keeps_context() {
        let err = anyhow::anyhow!("missing column").context("Error reading devices.toml");
        assert_eq!(
            ModelError::data_load(&err).to_string(),
            "Failed to load input data: Error reading devices.toml: missing column"
        );
    }
}
