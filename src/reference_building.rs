//! Reference values of a building of the same geometry built to current regulations.
//!
//! These follow the monthly balance method of DIN V 4108-6 in its annual form, with the reference
//! U-values of the German building energy regulations. They are only used as bounds for the KfW
//! programs.
use crate::building::{Building, Component, ComponentValues, THERMAL_BRIDGE_SURCHARGE};
use crate::units::{Area, Energy, EnergyPerArea, HeatLossCoefficient, KelvinHours, UValue};
use strum::IntoEnumIterator;

/// Length of the heating period (days)
const HEATING_DAYS: f64 = 185.0;

/// Heating degree days (Kd)
const DEGREE_DAYS: f64 = 2900.0;

/// Reduction for night setback
const NIGHT_SETBACK: f64 = 0.95;

/// Volumetric heat capacity of air (Wh/m³K)
const RHO_CP_AIR: f64 = 0.34;

/// Air change rate (1/h)
const AIR_CHANGE_RATE: f64 = 0.7;

/// Solar irradiation on south, east, west and north facades during the heating period (kWh/m²)
const SOLAR_IRRADIATION: [f64; 4] = [270.0, 155.0, 155.0, 100.0];

/// Frame, shading and sun protection factors and the effective g-value of the reference window
const SOLAR_REDUCTION: f64 = 0.7 * 0.9 * 1.0 * (0.6 * 0.9);

/// Internal gains (W/m²)
const INTERNAL_GAINS: f64 = 5.0;

/// Utilisation factor of the gains
const UTILISATION: f64 = 0.95;

/// Hot water demand (kWh/m²a)
const HOT_WATER_DEMAND: f64 = 12.5;

/// Expenditure factor of the reference heating system (improved condensing boiler)
const REFERENCE_EXPENDITURE: f64 = 0.97;

/// The reference U-values (W/m²K)
pub const REFERENCE_U_VALUES: ComponentValues = ComponentValues {
    window: 1.3,
    outer_wall: 0.28,
    ground_floor: 0.35,
    rooftop: 0.2,
};

/// Normative values of the reference building
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceBuilding {
    /// Transmission coefficient (W/K)
    pub h_t: f64,
    /// Transmission coefficient per m² of envelope (W/m²K)
    pub h_t_spec: f64,
    /// Primary energy demand (MWh/a)
    pub q_p: f64,
    /// Solar gains in the heating period (kWh)
    pub q_s: f64,
    /// Internal gains in the heating period (kWh)
    pub q_i: f64,
    /// Hot water demand (kWh/a)
    pub q_tw: f64,
    /// Ventilation coefficient (W/K)
    pub h_v: f64,
    /// Degree-hours of the heating period (kKh)
    pub f_ql: f64,
    /// Utilisation factor of the gains
    pub eta: f64,
    /// Reference U-values (W/m²K)
    pub u_values: ComponentValues,
}

impl ReferenceBuilding {
    /// Calculate the reference values for the building's geometry
    pub fn calculate(building: &Building) -> Self {
        let u_values = REFERENCE_U_VALUES;
        let shell_area = building.shell_area();

        let h_t = Component::iter()
            .map(|c| {
                UValue(u_values.get(c) * c.temperature_correction()) * building.component_area(c)
            })
            .sum::<HeatLossCoefficient>()
            + UValue(THERMAL_BRIDGE_SURCHARGE) * shell_area;
        let h_v = HeatLossCoefficient(RHO_CP_AIR * AIR_CHANGE_RATE * building.volume().value());
        let f_ql = KelvinHours(0.024 * DEGREE_DAYS * NIGHT_SETBACK);

        let q_s = SOLAR_REDUCTION
            * building
                .window_areas()
                .iter()
                .zip(SOLAR_IRRADIATION)
                .map(|(area, irradiation)| area.value() * irradiation)
                .sum::<f64>();
        let q_i = 0.024 * INTERNAL_GAINS * building.area * HEATING_DAYS;
        let q_tw = EnergyPerArea(HOT_WATER_DEMAND) * Area(building.area);

        let q_h = (h_t + h_v) * f_ql - Energy(UTILISATION * (q_i + q_s));
        let q_p = REFERENCE_EXPENDITURE * (q_h + q_tw).value() / 1000.0;

        Self {
            h_t: h_t.value(),
            h_t_spec: (h_t / shell_area).value(),
            q_p,
            q_s,
            q_i,
            q_tw: q_tw.value(),
            h_v: h_v.value(),
            f_ql: f_ql.value(),
            eta: UTILISATION,
            u_values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::building;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_reference_building(building: Building) {
        let reference = ReferenceBuilding::calculate(&building);

        // 150 m² living area with window 0.2, wall 0.9, floor 0.6 and roof 0.6 per m²
        let h_t = 150.0 * (0.2 * 1.3 + 0.9 * 0.28 + 0.6 * 0.35 * 0.6 + 0.6 * 0.2 + 0.05 * 2.3);
        assert_approx_eq!(f64, reference.h_t, h_t, epsilon = 1e-9);
        assert_approx_eq!(f64, reference.h_t_spec, h_t / 345.0, epsilon = 1e-12);
        assert_approx_eq!(f64, reference.f_ql, 66.12, epsilon = 1e-9);
        assert_approx_eq!(
            f64,
            reference.h_v,
            0.34 * 0.7 * 0.76 * 150.0 * 3.0,
            epsilon = 1e-9
        );
        assert_approx_eq!(f64, reference.q_i, 0.024 * 5.0 * 150.0 * 185.0, epsilon = 1e-9);
        assert_approx_eq!(f64, reference.q_tw, 1875.0, epsilon = 1e-9);

        // Window area 30 m² split 40/20/20/20 between south, east, west and north
        let q_s = 0.7 * 0.9 * 0.54 * (12.0 * 270.0 + 6.0 * 155.0 + 6.0 * 155.0 + 6.0 * 100.0);
        assert_approx_eq!(f64, reference.q_s, q_s, epsilon = 1e-9);

        let q_h = (h_t + reference.h_v) * 66.12 - 0.95 * (reference.q_i + q_s);
        assert_approx_eq!(f64, reference.q_p, 0.97 * (q_h + 1875.0) / 1000.0, epsilon = 1e-9);
        assert_eq!(reference.u_values, REFERENCE_U_VALUES);
    }

    #[rstest]
    fn test_reference_building_is_reproducible(building: Building) {
        let a = ReferenceBuilding::calculate(&building);
        let b = ReferenceBuilding::calculate(&building);
        assert_eq!(a.q_p.to_bits(), b.q_p.to_bits());
        assert_eq!(a, b);
    }
}
