//! Ventilation heat losses: a static air exchange proxy and a weather-driven window opening model.
use crate::building::RetrofitScenario;
use crate::time_series::Profile;
use indexmap::IndexMap;
use serde::Deserialize;

/// Upper edges of the daily mean temperature buckets of the window opening profile (°C)
pub const TEMPERATURE_BUCKETS: [f64; 11] =
    [-5.0, 0.0, 3.0, 6.0, 9.0, 12.0, 15.0, 18.0, 21.0, 24.0, 27.0];

/// Number of columns of the window opening profile
pub const NUM_BUCKETS: usize = TEMPERATURE_BUCKETS.len() + 1;

/// Reference temperature of the air density (K)
const REFERENCE_TEMPERATURE: f64 = 293.15;

/// Degree-hours used by the static ventilation proxy (kKh)
const SIMPLE_DEGREE_HOURS: f64 = 0.024 * 3380.0 * 0.95;

/// Ventilation heat loss per hour under the static air exchange proxy (kW)
///
/// Assumes an air change rate of 0.7 1/h and a volumetric heat capacity of 0.34 Wh/m³K.
pub fn simple_ventilation_loss(volume: f64) -> f64 {
    let h_v = 0.34 * 0.7 * volume;
    h_v * SIMPLE_DEGREE_HOURS / 8760.0
}

/// Physical parameters of the window ventilation model
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VentilationParameters {
    /// Height of a window opening (m)
    pub window_height: f64,
    /// Total window area which can be opened (m²)
    pub window_area_total: f64,
    /// Shielding coefficient of the infiltration flow (e_z)
    pub shielding: f64,
    /// Air density at 20 °C (kg/m³)
    pub rho_a_ref: f64,
    /// Wind coefficient
    pub c_wnd: f64,
    /// Stack (buoyancy) coefficient
    pub c_st: f64,
    /// Ratio of wind speed at building height to measured wind speed
    pub wind_height_factor: f64,
    /// Volumetric heat capacity of air (Wh/m³K)
    pub heat_capacity_air: f64,
}

/// Flags per retrofit scenario
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[allow(missing_docs)]
pub struct ScenarioFlags {
    pub standard: bool,
    pub retrofit: bool,
    pub adv_retr: bool,
}

impl ScenarioFlags {
    /// Whether the flag is set for the scenario
    pub fn get(&self, scenario: RetrofitScenario) -> bool {
        match scenario {
            RetrofitScenario::Standard => self.standard,
            RetrofitScenario::Retrofit => self.retrofit,
            RetrofitScenario::AdvRetr => self.adv_retr,
        }
    }
}

/// An airtightness class of the building shell
#[derive(Debug, Clone, PartialEq)]
pub struct InfiltrationClass {
    /// Air change rate at 50 Pa pressure difference (1/h)
    pub n50: f64,
    /// Window scenarios compatible with the class
    pub window: ScenarioFlags,
    /// Roof scenarios compatible with the class
    pub rooftop: ScenarioFlags,
    /// Whether the class applies with (true) or without (false) mechanical ventilation
    pub vent: bool,
}

/// Share of the window area which is open, per hour of day and temperature bucket
#[derive(Debug, Clone, PartialEq)]
pub struct WindowOpening {
    shares: Vec<[f64; NUM_BUCKETS]>,
}

impl WindowOpening {
    /// Create a profile from 24 hourly rows
    pub fn new(shares: Vec<[f64; NUM_BUCKETS]>) -> Self {
        assert_eq!(shares.len(), 24, "Window opening profile must have 24 rows");
        Self { shares }
    }

    /// Open share at an hour of day for a daily mean temperature
    pub fn share(&self, hour: usize, mean_temperature: f64) -> f64 {
        self.shares[hour][temperature_bucket(mean_temperature)]
    }
}

/// Index of the temperature bucket containing `temperature`
pub fn temperature_bucket(temperature: f64) -> usize {
    TEMPERATURE_BUCKETS
        .iter()
        .position(|&edge| temperature < edge)
        .unwrap_or(TEMPERATURE_BUCKETS.len())
}

/// All data needed by the detailed ventilation mode
#[derive(Debug, Clone, PartialEq)]
pub struct VentilationData {
    /// Physical parameters
    pub parameters: VentilationParameters,
    /// Airtightness classes for the building class, keyed by name
    pub classes: IndexMap<String, InfiltrationClass>,
    /// Window opening behaviour
    pub window_opening: WindowOpening,
}

impl VentilationParameters {
    /// Air flow through open windows (m³/h)
    ///
    /// The flow is driven by whichever of wind and buoyancy is stronger.
    pub fn window_air_flow(
        &self,
        open_share: f64,
        ambient: f64,
        wind_speed: f64,
        inside: f64,
    ) -> f64 {
        let rho_e = self.rho_a_ref * REFERENCE_TEMPERATURE / (273.15 + ambient);
        let u = self.wind_height_factor * wind_speed;
        let driver =
            (self.c_wnd * u * u).max(self.c_st * self.window_height * (inside - ambient).abs());

        3600.0
            * (self.rho_a_ref / rho_e)
            * (self.window_area_total * open_share / 2.0)
            * driver.sqrt()
    }
}

impl VentilationData {
    /// Window air flow for every representative time step (m³/h)
    pub fn window_air_flow_profile(
        &self,
        temperature: &Profile,
        wind_speed: &Profile,
        inside: f64,
    ) -> Profile {
        temperature
            .iter()
            .zip(wind_speed)
            .map(|(t_day, u_day)| {
                let mean = t_day.iter().sum::<f64>() / t_day.len() as f64;
                let steps = t_day.len();
                t_day
                    .iter()
                    .zip(u_day)
                    .enumerate()
                    .map(|(t, (&ambient, &wind))| {
                        let hour = t * 24 / steps;
                        let share = self.window_opening.share(hour, mean);
                        self.parameters.window_air_flow(share, ambient, wind, inside)
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::ventilation_data;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    #[case(-10.0, 0)]
    #[case(-5.0, 1)]
    #[case(2.9, 2)]
    #[case(26.9, 10)]
    #[case(27.0, 11)]
    #[case(35.0, 11)]
    fn test_temperature_bucket(#[case] temperature: f64, #[case] expected: usize) {
        assert_eq!(temperature_bucket(temperature), expected);
    }

    #[test]
    fn test_simple_ventilation_loss() {
        let expected = 0.34 * 0.7 * 100.0 * 0.024 * 3380.0 * 0.95 / 8760.0;
        assert_approx_eq!(f64, simple_ventilation_loss(100.0), expected, epsilon = 1e-12);
    }

    #[rstest]
    fn test_window_air_flow(ventilation_data: VentilationData) {
        let params = &ventilation_data.parameters;
        assert_eq!(params.window_air_flow(0.0, 0.0, 5.0, 20.0), 0.0);

        // Buoyancy dominates without wind
        let rho_e = params.rho_a_ref * REFERENCE_TEMPERATURE / 273.15;
        let expected = 3600.0
            * (params.rho_a_ref / rho_e)
            * (params.window_area_total * 0.5 / 2.0)
            * (params.c_st * params.window_height * 20.0).sqrt();
        assert_approx_eq!(
            f64,
            params.window_air_flow(0.5, 0.0, 0.0, 20.0),
            expected,
            epsilon = 1e-9
        );

        // More wind never reduces the flow
        assert!(params.window_air_flow(0.5, 0.0, 10.0, 20.0) >= expected);
    }

    #[rstest]
    fn test_window_air_flow_profile(ventilation_data: VentilationData) {
        let temperature = vec![vec![0.0; 4], vec![30.0; 4]];
        let wind = vec![vec![2.0; 4], vec![2.0; 4]];
        let flow = ventilation_data.window_air_flow_profile(&temperature, &wind, 20.0);
        assert_eq!(flow.len(), 2);
        assert_eq!(flow[0].len(), 4);
        assert!(flow.iter().flatten().all(|&q| q >= 0.0));
    }
}
