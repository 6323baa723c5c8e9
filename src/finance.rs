//! Annuity calculations following VDI 2067.
//!
//! All costs in the optimisation are annualised over a common observation period. Investment costs
//! are multiplied by the capital recovery factor (less the residual value of the device at the end
//! of the period) and running costs by the capital recovery factor and a price-dynamic cash value
//! factor which accounts for annual price changes.
use crate::units::Dimensionless;
use anyhow::{Result, ensure};

/// Calculates the capital recovery factor (CRF) for a given period and interest rate.
///
/// The CRF converts a present value into a series of equal annual payments over the period.
pub fn capital_recovery_factor(period: u32, interest_rate: Dimensionless) -> Dimensionless {
    if period == 0 {
        return Dimensionless(0.0);
    }
    if interest_rate == Dimensionless(0.0) {
        return Dimensionless(1.0) / Dimensionless(period as f64);
    }
    let factor = (Dimensionless(1.0) + interest_rate).powi(period as i32);
    (interest_rate * factor) / (factor - Dimensionless(1.0))
}

/// Calculates the price-dynamic cash value factor for payments which change by `price_change`
/// each year.
///
/// Multiplying the first-year payment by this factor and by the CRF gives the equivalent constant
/// annual payment over the observation period.
pub fn price_dynamic_factor(
    period: u32,
    interest_rate: Dimensionless,
    price_change: Dimensionless,
) -> Dimensionless {
    let q = 1.0 + interest_rate.0;
    let r = 1.0 + price_change.0;
    if (r - q).abs() < f64::EPSILON {
        return Dimensionless(period as f64 / q);
    }

    Dimensionless((1.0 - (r / q).powi(period as i32)) / (q - r))
}

/// Calculates the residual value of a device at the end of the observation period, as a share of
/// its investment cost.
///
/// A device whose lifetime is shorter than the observation period is replaced (at inflated cost)
/// as often as needed. The value of the last replacement which is not yet written off at the end
/// of the period is discounted back to the present.
pub fn residual_value(
    period: u32,
    lifetime: u32,
    interest_rate: Dimensionless,
    inflation: Dimensionless,
) -> Result<Dimensionless> {
    ensure!(lifetime > 0, "Lifetime must be greater than zero");

    let q = 1.0 + interest_rate.0;
    let r = 1.0 + inflation.0;
    let replacements = period.div_ceil(lifetime).saturating_sub(1);
    let remaining = ((replacements + 1) * lifetime - period) as f64 / lifetime as f64;

    Ok(Dimensionless(
        r.powi((replacements * lifetime) as i32) * remaining / q.powi(period as i32),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0.05, 0.0)]
    #[case(10, 0.0, 0.1)]
    #[case(20, 0.055, 0.083_679_330_034_933_22)]
    #[case(10, 0.08, 0.149_029_488_697_075_33)]
    fn test_capital_recovery_factor(
        #[case] period: u32,
        #[case] interest_rate: f64,
        #[case] expected: f64,
    ) {
        let crf = capital_recovery_factor(period, Dimensionless(interest_rate));
        assert_approx_eq!(f64, crf.0, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_price_dynamic_factor_constant_prices() {
        // Without price changes the factor is the inverse of the CRF
        let interest = Dimensionless(0.055);
        let b = price_dynamic_factor(20, interest, Dimensionless(0.0));
        let crf = capital_recovery_factor(20, interest);
        assert_approx_eq!(f64, b.0 * crf.0, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_price_dynamic_factor_equal_rates() {
        let b = price_dynamic_factor(10, Dimensionless(0.03), Dimensionless(0.03));
        assert_approx_eq!(f64, b.0, 10.0 / 1.03, epsilon = 1e-12);
    }

    #[test]
    fn test_price_dynamic_factor_rising_prices() {
        let interest = Dimensionless(0.055);
        let flat = price_dynamic_factor(20, interest, Dimensionless(0.0));
        let rising = price_dynamic_factor(20, interest, Dimensionless(0.02));
        assert!(rising.0 > flat.0);
    }

    #[rstest]
    #[case(20, 20, 0.0)]
    #[case(20, 40, 0.5 / 1.055_f64.powi(20))]
    #[case(20, 15, 1.02_f64.powi(15) * (2.0 / 3.0) / 1.055_f64.powi(20))]
    fn test_residual_value(#[case] period: u32, #[case] lifetime: u32, #[case] expected: f64) {
        let rval =
            residual_value(period, lifetime, Dimensionless(0.055), Dimensionless(0.02)).unwrap();
        assert_approx_eq!(f64, rval.0, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_residual_value_zero_lifetime() {
        assert!(residual_value(20, 0, Dimensionless(0.05), Dimensionless(0.0)).is_err());
    }
}
