//! The static input data of a scenario.
use crate::building::Building;
use crate::device::DeviceCatalog;
use crate::economics::Economics;
use crate::heating_concept::HeatingConceptMap;
use crate::subsidy::Subsidies;
use crate::tariff::TariffMap;
use crate::time_series::TimeSeriesSet;
use crate::ventilation::VentilationData;
use std::path::PathBuf;

pub mod options;
pub use options::{
    ClusteringOptions, Objective, Preset, Programs, ScenarioOptions, SolverOptions,
    VentilationMode,
};

/// Everything loaded from a scenario directory
#[derive(Debug, Clone)]
pub struct Model {
    /// Path to the scenario directory
    pub model_dir: PathBuf,
    /// Options from `scenario.toml`
    pub options: ScenarioOptions,
    /// The building
    pub building: Building,
    /// Device parameters
    pub devices: DeviceCatalog,
    /// Economic parameters
    pub economics: Economics,
    /// Gas tariffs
    pub gas_tariffs: TariffMap,
    /// Electricity tariffs
    pub electricity_tariffs: TariffMap,
    /// Subsidy program parameters
    pub subsidies: Subsidies,
    /// Heating concepts for the primary energy calculation
    pub heating_concepts: HeatingConceptMap,
    /// Data for the detailed ventilation mode
    pub ventilation: Option<VentilationData>,
    /// Annual time series
    pub time_series: TimeSeriesSet,
}
