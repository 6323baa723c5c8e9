//! Everything the constraint builders need to know about a scenario, derived once per solve.
use super::variables::Grid;
use crate::building::{Building, Component, RetrofitScenario};
use crate::clustering::ClusteredData;
use crate::device::{DeviceCatalog, DevicePerformance};
use crate::economics::{AnnuityFactors, Economics};
use crate::error::ModelError;
use crate::model::{Model, ScenarioOptions, VentilationMode};
use crate::reference_building::ReferenceBuilding;
use crate::solver::LinExpr;
use crate::subsidy::Subsidies;
use crate::time_series::{Profile, SeriesKind};
use itertools::Itertools;
use strum::IntoEnumIterator;

/// Scenario data on the representative days
pub struct Context<'a> {
    /// The static input data
    pub model: &'a Model,
    /// Number of representative days
    pub days: usize,
    /// Number of time steps per day
    pub steps: usize,
    /// Hours per time step
    pub dt: f64,
    /// Number of days each representative day stands for
    pub weights: &'a [f64],
    /// Whether the representative days are consecutive days of the year (all weights are one)
    pub chain_days: bool,
    /// Whether every representative day must end in the storage state it started in
    pub cyclic_storage: bool,
    /// 0 for a new building, 1 for an existing one
    pub alpha: f64,
    /// 1 for a multi-family house, 0 otherwise
    pub mfh: f64,
    /// Annuity and price-dynamic factors
    pub factors: AnnuityFactors,
    /// Usable roof area for PV and STC (m²)
    pub a_max: f64,
    /// Efficiencies of the weather-dependent devices
    pub performance: DevicePerformance,
    /// Reference building of the same geometry
    pub reference: ReferenceBuilding,
    /// Ambient temperature (°C)
    pub temperature: &'a Profile,
    /// Household electricity demand (kW)
    pub electricity: &'a Profile,
    /// Domestic hot water demand (kW)
    pub dhw: &'a Profile,
    /// Internal gains (kW)
    pub int_gains: &'a Profile,
    /// Irradiation on the roof (kW/m²)
    pub solar_roof: &'a Profile,
    /// Irradiation on the south, east, west and north facades (kW/m²)
    pub facades: [&'a Profile; 4],
    /// Difference between the inside and the ambient temperature, never negative (K)
    pub delta_t: Profile,
    /// Air flow through open windows (m³/h), for the detailed ventilation mode
    pub window_air_flow: Option<Profile>,
}

/// Check that a profile covers every time step of every representative day
fn check_shape(
    kind: SeriesKind,
    profile: &Profile,
    days: usize,
    steps: usize,
) -> Result<(), ModelError> {
    if profile.len() != days || profile.iter().any(|day| day.len() != steps) {
        return Err(ModelError::construction(format!(
            "Time series {kind} does not cover {days} days with {steps} time steps"
        )));
    }

    Ok(())
}

impl<'a> Context<'a> {
    /// Derive the context of a scenario from its inputs and representative days
    pub fn new(model: &'a Model, clustered: &'a ClusteredData) -> Result<Self, ModelError> {
        let days = clustered.num_days();
        let steps = clustered.time_steps;
        if days == 0 || steps == 0 {
            return Err(ModelError::construction("No representative days"));
        }

        let profile = |kind| -> Result<&'a Profile, ModelError> {
            let profile = clustered.require(kind)?;
            check_shape(kind, profile, days, steps)?;
            Ok(profile)
        };
        let temperature = profile(SeriesKind::Temperature)?;
        let solar_roof = profile(SeriesKind::SolarRoof)?;
        let options = &model.options;

        let window_air_flow = match options.ventilation {
            VentilationMode::Simple => None,
            VentilationMode::Detailed => {
                let data = model.ventilation.as_ref().ok_or_else(|| {
                    ModelError::construction("Detailed ventilation requires ventilation data")
                })?;
                let wind_speed = profile(SeriesKind::WindSpeed)?;
                Some(data.window_air_flow_profile(
                    temperature,
                    wind_speed,
                    options.inside_temperature,
                ))
            }
        };

        let delta_t = temperature
            .iter()
            .map(|day| {
                day.iter()
                    .map(|t| (options.inside_temperature - t).max(0.0))
                    .collect()
            })
            .collect();

        Ok(Self {
            model,
            days,
            steps,
            dt: clustered.dt(),
            weights: &clustered.weights,
            chain_days: clustered.weights.iter().all(|&w| w == 1.0),
            cyclic_storage: clustered.max_weight() > 1.0,
            alpha: if options.new_building { 0.0 } else { 1.0 },
            mfh: if options.multi_family { 1.0 } else { 0.0 },
            factors: model.economics.annuity_factors(),
            a_max: model.building.max_solar_area().value(),
            performance: DevicePerformance::calculate(&model.devices, temperature, solar_roof),
            reference: ReferenceBuilding::calculate(&model.building),
            temperature,
            electricity: profile(SeriesKind::Electricity)?,
            dhw: profile(SeriesKind::Dhw)?,
            int_gains: profile(SeriesKind::IntGains)?,
            solar_roof,
            facades: [
                profile(SeriesKind::SolarSouth)?,
                profile(SeriesKind::SolarEast)?,
                profile(SeriesKind::SolarWest)?,
                profile(SeriesKind::SolarNorth)?,
            ],
            delta_t,
            window_air_flow,
        })
    }

    /// The scenario options
    pub fn options(&self) -> &'a ScenarioOptions {
        &self.model.options
    }

    /// The device catalog
    pub fn devices(&self) -> &'a DeviceCatalog {
        &self.model.devices
    }

    /// The building
    pub fn building(&self) -> &'a Building {
        &self.model.building
    }

    /// The economic parameters
    pub fn economics(&self) -> &'a Economics {
        &self.model.economics
    }

    /// The subsidy program parameters
    pub fn subsidies(&self) -> &'a Subsidies {
        &self.model.subsidies
    }

    /// Every (day, time step) pair
    pub fn time_steps(&self) -> impl Iterator<Item = (usize, usize)> + use<> {
        (0..self.days).cartesian_product(0..self.steps)
    }

    /// Number of hours in the year the representative days stand for
    pub fn hours_per_year(&self) -> f64 {
        24.0 * self.weights.iter().sum::<f64>()
    }

    /// Annual sum of a variable given per time step, e.g. energy from power (kWh from kW)
    pub fn annual(&self, grid: &Grid) -> LinExpr {
        LinExpr::weighted_sum(
            self.time_steps()
                .map(|(d, t)| (grid[d][t], self.dt * self.weights[d])),
        )
    }

    /// Residual value share of an investment at the end of the observation period
    pub fn residual_value(&self, lifetime: u32) -> Result<f64, ModelError> {
        self.economics()
            .residual_value(lifetime)
            .map_err(|err| ModelError::construction(format!("{err:#}")))
    }

    /// Upper bound on the building's transmission coefficient (W/K)
    pub fn max_transmission_coefficient(&self) -> f64 {
        let building = self.building();
        building.transmission_coefficient(|component: Component| {
            let data = building.components.get(component);
            RetrofitScenario::iter()
                .max_by(|a, b| {
                    data.scenario(*a)
                        .u_value
                        .total_cmp(&data.scenario(*b).u_value)
                })
                .unwrap_or(RetrofitScenario::Standard)
        })
    }
}
