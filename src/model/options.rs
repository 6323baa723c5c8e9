//! Defines the `ScenarioOptions` struct, which represents the contents of `scenario.toml`.
use crate::input::{check_non_negative, check_positive, input_err_msg, read_toml};
use crate::time_series::SeriesKind;
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use log::warn;
use serde::Deserialize;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use std::path::Path;

const SCENARIO_FILE_NAME: &str = "scenario.toml";

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_param_default!(default_true, bool, true);
define_param_default!(default_max_emissions, f64, 99_999.0);
define_param_default!(default_max_cost, f64, 99_999.0);
define_param_default!(default_inside_temperature, f64, 20.0);
define_param_default!(default_design_temperature, f64, -12.0);
define_param_default!(default_time_limit, f64, 3600.0);
define_param_default!(default_mip_gap, f64, 0.01);
define_param_default!(default_number_clusters, usize, 8);
define_param_default!(default_norm, u32, 2);
define_param_default!(default_cluster_time_limit, f64, 300.0);
define_param_default!(default_days_per_year, usize, 365);

/// The quantity which is minimised
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    SerializeLabeledStringEnum,
    DeserializeLabeledStringEnum,
)]
pub enum Objective {
    /// Annualised total cost
    #[default]
    #[string = "costs"]
    Costs,
    /// Annual CO2 emissions
    #[string = "emissions"]
    Emissions,
}

/// A named set of fixed design decisions
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    SerializeLabeledStringEnum,
    DeserializeLabeledStringEnum,
)]
pub enum Preset {
    /// Nothing is fixed
    #[default]
    #[string = "free"]
    Free,
    /// Gas boiler in an unrenovated building
    #[string = "benchmark"]
    Benchmark,
    /// CHP unit in an unrenovated building
    #[string = "s1"]
    S1,
    /// Benchmark heating with every component retrofitted
    #[string = "retrofit"]
    Retrofit,
    /// Benchmark heating with every component given an advanced retrofit
    #[string = "adv_retr"]
    AdvRetr,
}

/// How ventilation heat losses are modelled
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    SerializeLabeledStringEnum,
    DeserializeLabeledStringEnum,
)]
pub enum VentilationMode {
    /// A static air exchange rate
    #[default]
    #[string = "simple"]
    Simple,
    /// Window opening and infiltration driven by the weather
    #[string = "detailed"]
    Detailed,
}

/// The subsidy programs which may be claimed
#[derive(Debug, Clone, Default, PartialEq, Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Programs {
    /// Feed-in tariff for PV (EEG)
    pub eeg: bool,
    /// KfW grant for batteries combined with PV
    pub kfw_battery: bool,
    /// CHP surcharge (KWKG)
    pub kwkg: bool,
    /// BAFA investment grant for mini-CHP units
    pub bafa_chp: bool,
    /// BAFA grant for heat pumps
    pub bafa_hp: bool,
    /// BAFA grant for solar thermal collectors
    pub bafa_stc: bool,
    /// BAFA grant for pellet boilers
    pub bafa_pellet: bool,
    /// KfW grant for efficiency buildings
    pub kfw_efficiency_buildings: bool,
    /// KfW grant for individual retrofit measures
    pub kfw_individual_measures: bool,
}

/// Limits for a MILP solve
#[derive(Debug, Clone, PartialEq, Deserialize, serde::Serialize)]
pub struct SolverOptions {
    /// Wall-clock time limit (s)
    #[serde(default = "default_time_limit")]
    pub time_limit: f64,
    /// Relative MIP gap at which to stop
    #[serde(default = "default_mip_gap")]
    pub mip_gap: f64,
    /// Whether to look for the offending constraint groups of an infeasible model
    #[serde(default = "default_true")]
    pub diagnose: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            time_limit: default_time_limit(),
            mip_gap: default_mip_gap(),
            diagnose: true,
        }
    }
}

/// Parameters for reducing the year to representative days
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClusteringOptions {
    /// Number of representative days
    #[serde(default = "default_number_clusters")]
    pub number_clusters: usize,
    /// Distance norm (1 or 2)
    #[serde(default = "default_norm")]
    pub norm: u32,
    /// Relative MIP gap of the clustering problem
    #[serde(default)]
    pub mip_gap: f64,
    /// Time limit of the clustering problem (s)
    #[serde(default = "default_cluster_time_limit")]
    pub time_limit: f64,
    /// Number of days in the input series
    #[serde(default = "default_days_per_year")]
    pub days_per_year: usize,
    /// Whether to rescale non-negative series to their annual totals
    #[serde(default = "default_true")]
    pub rescale: bool,
    /// Importance of each series
    #[serde(default)]
    pub weights: IndexMap<SeriesKind, f64>,
}

impl Default for ClusteringOptions {
    fn default() -> Self {
        Self {
            number_clusters: default_number_clusters(),
            norm: default_norm(),
            mip_gap: 0.0,
            time_limit: default_cluster_time_limit(),
            days_per_year: default_days_per_year(),
            rescale: true,
            weights: IndexMap::new(),
        }
    }
}

impl ClusteringOptions {
    /// Importance of a series, falling back to its default
    pub fn weight(&self, kind: SeriesKind) -> f64 {
        self.weights
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.default_weight())
    }
}

/// Represents the contents of `scenario.toml`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScenarioOptions {
    /// What to minimise
    #[serde(default)]
    pub objective: Objective,
    /// Fixed design decisions
    #[serde(default)]
    pub preset: Preset,
    /// Ventilation model
    #[serde(default)]
    pub ventilation: VentilationMode,
    /// Whether the building is a new building (low supply temperature)
    #[serde(default)]
    pub new_building: bool,
    /// Whether the building is a multi-family house
    #[serde(default)]
    pub multi_family: bool,
    /// Whether heat pumps may use a dedicated electricity tariff
    #[serde(default = "default_true")]
    pub hp_tariff: bool,
    /// Whether domestic hot water is heated electrically
    #[serde(default)]
    pub dhw_electric: bool,
    /// Whether the heaters must cover the design heat load
    #[serde(default)]
    pub design_heat_load: bool,
    /// Cap on the annual emissions (t/a)
    #[serde(default = "default_max_emissions")]
    pub max_emissions: f64,
    /// Cap on the annualised cost (EUR/a)
    #[serde(default = "default_max_cost")]
    pub max_cost: f64,
    /// Indoor set temperature (°C)
    #[serde(default = "default_inside_temperature")]
    pub inside_temperature: f64,
    /// Outdoor design temperature (°C)
    #[serde(default = "default_design_temperature")]
    pub design_temperature: f64,
    /// The subsidy programs which may be claimed
    #[serde(default)]
    pub programs: Programs,
    /// MILP solver limits
    #[serde(default)]
    pub solver: SolverOptions,
    /// Clustering parameters
    #[serde(default)]
    pub clustering: ClusteringOptions,
}

impl Default for ScenarioOptions {
    fn default() -> Self {
        Self {
            objective: Objective::default(),
            preset: Preset::default(),
            ventilation: VentilationMode::default(),
            new_building: false,
            multi_family: false,
            hp_tariff: true,
            dhw_electric: false,
            design_heat_load: false,
            max_emissions: default_max_emissions(),
            max_cost: default_max_cost(),
            inside_temperature: default_inside_temperature(),
            design_temperature: default_design_temperature(),
            programs: Programs::default(),
            solver: SolverOptions::default(),
            clustering: ClusteringOptions::default(),
        }
    }
}

/// Check the solver limits are valid
fn check_solver_limits(time_limit: f64, mip_gap: f64, section: &str) -> Result<()> {
    check_positive(time_limit, &format!("{section}.time_limit"))?;
    ensure!(
        (0.0..1.0).contains(&mip_gap),
        "{section}.mip_gap must be in [0, 1) (got {mip_gap})"
    );

    Ok(())
}

impl ScenarioOptions {
    /// Read the scenario options from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing the scenario files
    ///
    /// # Returns
    ///
    /// The options or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ScenarioOptions> {
        let file_path = model_dir.as_ref().join(SCENARIO_FILE_NAME);
        let options: ScenarioOptions = read_toml(&file_path)?;

        options
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(options)
    }

    /// Validate options after reading in file
    fn validate(&self) -> Result<()> {
        check_non_negative(self.max_emissions, "max_emissions")?;
        check_non_negative(self.max_cost, "max_cost")?;
        ensure!(
            self.inside_temperature.is_finite() && self.design_temperature.is_finite(),
            "Temperatures must be finite"
        );
        ensure!(
            self.design_temperature < self.inside_temperature,
            "design_temperature ({}) must be below inside_temperature ({})",
            self.design_temperature,
            self.inside_temperature
        );

        check_solver_limits(self.solver.time_limit, self.solver.mip_gap, "solver")?;

        let clustering = &self.clustering;
        check_solver_limits(clustering.time_limit, clustering.mip_gap, "clustering")?;
        ensure!(
            clustering.number_clusters > 0,
            "clustering.number_clusters cannot be zero"
        );
        ensure!(
            matches!(clustering.norm, 1 | 2),
            "clustering.norm must be 1 or 2 (got {})",
            clustering.norm
        );
        ensure!(
            clustering.days_per_year > 0,
            "clustering.days_per_year cannot be zero"
        );
        for (kind, weight) in &clustering.weights {
            check_non_negative(*weight, &format!("clustering.weights.{kind}"))?;
        }

        if self.preset != Preset::Free && self.programs != Programs::default() {
            warn!(
                "Preset '{}' is used together with subsidy programs. Programs for devices which \
                the preset excludes will not be claimed.",
                self.preset
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use rstest::rstest;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let options: ScenarioOptions = toml::from_str("").unwrap();
        assert_eq!(options, ScenarioOptions::default());
        assert_eq!(options.clustering.weight(SeriesKind::Electricity), 8.0);
        assert_eq!(options.clustering.weight(SeriesKind::WindSpeed), 1.0);
        assert!(options.solver.diagnose);
    }

    #[test]
    fn test_from_path() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(SCENARIO_FILE_NAME),
            "objective = \"emissions\"
            preset = \"benchmark\"
            ventilation = \"detailed\"
            [programs]
            eeg = true
            [clustering]
            number_clusters = 4
            norm = 1
            [clustering.weights]
            temperature = 5.0",
        )
        .unwrap();

        let options = ScenarioOptions::from_path(dir.path()).unwrap();
        assert_eq!(options.objective, Objective::Emissions);
        assert_eq!(options.preset, Preset::Benchmark);
        assert_eq!(options.ventilation, VentilationMode::Detailed);
        assert!(options.programs.eeg);
        assert!(!options.programs.kwkg);
        assert_eq!(options.clustering.number_clusters, 4);
        assert_eq!(options.clustering.weight(SeriesKind::Temperature), 5.0);
    }

    #[rstest]
    #[case("[clustering]\nnorm = 3", "clustering.norm must be 1 or 2 (got 3)")]
    #[case(
        "[clustering]\nnumber_clusters = 0",
        "clustering.number_clusters cannot be zero"
    )]
    #[case("[solver]\nmip_gap = 1.5", "solver.mip_gap must be in [0, 1) (got 1.5)")]
    #[case(
        "design_temperature = 25.0",
        "design_temperature (25) must be below inside_temperature (20)"
    )]
    fn test_validate_invalid(#[case] contents: &str, #[case] msg: &str) {
        let options: ScenarioOptions = toml::from_str(contents).unwrap();
        assert_error!(options.validate(), msg);
    }

    #[test]
    fn test_display() {
        assert_eq!(Preset::AdvRetr.to_string(), "adv_retr");
        assert_eq!(Objective::Emissions.to_string(), "emissions");
    }
}
