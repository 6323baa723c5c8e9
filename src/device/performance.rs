//! Weather-dependent efficiencies of heat pumps and solar devices.
use super::{CopPoint, DeviceCatalog, HeatPumpParams, PvParams, StcParams};
use crate::time_series::Profile;
use serde::Serialize;
use strum::{Display, EnumIter, IntoStaticStr};

/// Irradiance at which the nominal operating cell temperature is defined (kW/m²)
const NOCT_IRRADIANCE: f64 = 0.8;

/// Ambient temperature at which the nominal operating cell temperature is defined (°C)
const NOCT_AMBIENT: f64 = 20.0;

/// Cell temperature at standard test conditions (°C)
const STC_CELL_TEMPERATURE: f64 = 25.0;

/// Supply temperature of the space heating system
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    IntoStaticStr,
    Display,
    Serialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FlowTemperature {
    /// 35 °C (new buildings, floor heating)
    Tvl35,
    /// 55 °C (existing buildings, radiators)
    Tvl55,
}

/// Linearly interpolate a COP curve at the given source temperature.
///
/// Outside the datasheet range the COP of the closest point is used. The points must be sorted by
/// temperature and there must be at least one.
pub fn interpolate_cop(points: &[CopPoint], temperature: f64) -> f64 {
    let first = &points[0];
    if temperature <= first.temperature {
        return first.cop;
    }

    for pair in points.windows(2) {
        let (lo, hi) = (&pair[0], &pair[1]);
        if temperature <= hi.temperature {
            let share = (temperature - lo.temperature) / (hi.temperature - lo.temperature);
            return lo.cop + share * (hi.cop - lo.cop);
        }
    }

    points[points.len() - 1].cop
}

/// Electrical efficiency of PV modules for the given ambient temperature and irradiation
pub fn pv_efficiency(pv: &PvParams, ambient: f64, irradiation: f64) -> f64 {
    let cell = ambient + (pv.noct - NOCT_AMBIENT) / NOCT_IRRADIANCE * irradiation;
    let eta = pv.eta_nom * (1.0 - pv.temperature_coefficient * (cell - STC_CELL_TEMPERATURE));
    eta.max(0.0)
}

/// Thermal efficiency of a solar collector for the given ambient temperature and irradiation
pub fn stc_efficiency(stc: &StcParams, ambient: f64, irradiation: f64) -> f64 {
    // W/m²
    let g = 1000.0 * irradiation;
    if g <= 0.0 {
        return 0.0;
    }

    let dt = stc.mean_temperature - ambient;
    (stc.eta0 - stc.a1 * dt / g - stc.a2 * dt * dt / g).max(0.0)
}

/// COP profiles of one heat pump
#[derive(Debug, Clone, PartialEq)]
pub struct HeatPumpCop {
    /// COP at 35 °C supply temperature
    pub tvl35: Profile,
    /// COP at 55 °C supply temperature
    pub tvl55: Profile,
}

impl HeatPumpCop {
    fn calculate(hp: &HeatPumpParams, temperature: &Profile) -> Self {
        let cop = |curve: &[CopPoint]| -> Profile {
            temperature
                .iter()
                .map(|day| {
                    day.iter()
                        .map(|&t| interpolate_cop(curve, hp.source_temperature.unwrap_or(t)))
                        .collect()
                })
                .collect()
        };

        Self {
            tvl35: cop(&hp.cop_w35),
            tvl55: cop(&hp.cop_w55),
        }
    }

    /// The COP profile for a supply temperature
    pub fn get(&self, flow: FlowTemperature) -> &Profile {
        match flow {
            FlowTemperature::Tvl35 => &self.tvl35,
            FlowTemperature::Tvl55 => &self.tvl55,
        }
    }
}

/// Time-dependent efficiencies of all weather-dependent devices on the representative days
#[derive(Debug, Clone, PartialEq)]
pub struct DevicePerformance {
    /// Air-source heat pump
    pub hp_air: HeatPumpCop,
    /// Ground-source heat pump
    pub hp_geo: HeatPumpCop,
    /// Electrical efficiency of the PV modules
    pub eta_pv: Profile,
    /// Thermal efficiency of the solar collector
    pub eta_stc: Profile,
}

impl DevicePerformance {
    /// Calculate the efficiencies from the ambient temperature and roof irradiation profiles
    pub fn calculate(devices: &DeviceCatalog, temperature: &Profile, solar_roof: &Profile) -> Self {
        let map = |f: &dyn Fn(f64, f64) -> f64| -> Profile {
            temperature
                .iter()
                .zip(solar_roof)
                .map(|(t_day, i_day)| t_day.iter().zip(i_day).map(|(&t, &i)| f(t, i)).collect())
                .collect()
        };

        Self {
            hp_air: HeatPumpCop::calculate(&devices.hp_air, temperature),
            hp_geo: HeatPumpCop::calculate(&devices.hp_geo, temperature),
            eta_pv: map(&|t, i| pv_efficiency(&devices.pv, t, i)),
            eta_stc: map(&|t, i| stc_efficiency(&devices.stc, t, i)),
        }
    }

    /// The COP profiles of a heat pump
    ///
    /// # Panics
    ///
    /// If `device` is not a heat pump.
    pub fn cop(&self, device: super::Device) -> &HeatPumpCop {
        match device {
            super::Device::HpAir => &self.hp_air,
            super::Device::HpGeo => &self.hp_geo,
            _ => panic!("{device} is not a heat pump"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::devices;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn curve() -> Vec<CopPoint> {
        vec![
            CopPoint {
                temperature: -10.0,
                cop: 2.0,
            },
            CopPoint {
                temperature: 0.0,
                cop: 3.0,
            },
            CopPoint {
                temperature: 10.0,
                cop: 4.0,
            },
        ]
    }

    #[rstest]
    #[case(-20.0, 2.0)]
    #[case(-10.0, 2.0)]
    #[case(-5.0, 2.5)]
    #[case(2.0, 3.2)]
    #[case(10.0, 4.0)]
    #[case(25.0, 4.0)]
    fn test_interpolate_cop(#[case] temperature: f64, #[case] expected: f64) {
        assert_approx_eq!(f64, interpolate_cop(&curve(), temperature), expected, epsilon = 1e-12);
    }

    #[rstest]
    fn test_pv_efficiency(devices: DeviceCatalog) {
        let pv = &devices.pv;

        // Cell at 25 °C gives the nominal efficiency
        let ambient = STC_CELL_TEMPERATURE - (pv.noct - NOCT_AMBIENT) / NOCT_IRRADIANCE * 0.5;
        assert_approx_eq!(f64, pv_efficiency(pv, ambient, 0.5), pv.eta_nom, epsilon = 1e-12);

        // Hotter cells are less efficient
        assert!(pv_efficiency(pv, 30.0, 0.8) < pv_efficiency(pv, 0.0, 0.8));
    }

    #[rstest]
    fn test_stc_efficiency(devices: DeviceCatalog) {
        let stc = &devices.stc;
        assert_eq!(stc_efficiency(stc, 10.0, 0.0), 0.0);

        let dt: f64 = stc.mean_temperature - 10.0;
        let expected = stc.eta0 - stc.a1 * dt / 800.0 - stc.a2 * dt.powi(2) / 800.0;
        assert_approx_eq!(f64, stc_efficiency(stc, 10.0, 0.8), expected.max(0.0), epsilon = 1e-12);

        // Very low irradiation on a cold day cannot give a negative efficiency
        assert_eq!(stc_efficiency(stc, -15.0, 0.001), 0.0);
    }

    #[rstest]
    fn test_device_performance(devices: DeviceCatalog) {
        let temperature = vec![vec![-5.0, 5.0], vec![0.0, 10.0]];
        let solar = vec![vec![0.0, 0.5], vec![0.2, 0.0]];
        let perf = DevicePerformance::calculate(&devices, &temperature, &solar);

        assert_eq!(perf.eta_stc[0][0], 0.0);
        assert_eq!(perf.eta_pv.len(), 2);

        // The ground-source heat pump sees a constant source temperature
        let geo = &perf.hp_geo.tvl35;
        assert!(geo.iter().flatten().all(|&cop| cop == geo[0][0]));

        // Air-source COP rises with ambient temperature
        let air = perf.cop(super::super::Device::HpAir).get(FlowTemperature::Tvl55);
        assert!(air[0][1] > air[0][0]);
    }
}
