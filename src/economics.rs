//! Economic parameters and the annuity factors derived from them.
use crate::finance::{capital_recovery_factor, price_dynamic_factor, residual_value};
use crate::units::Dimensionless;
use anyhow::Result;
use serde::Deserialize;

/// Annual price change rates
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PriceChange {
    /// Electricity
    pub el: f64,
    /// Natural gas
    pub gas: f64,
    /// Wood pellets
    pub pellet: f64,
    /// Electricity sold on the exchange
    pub eex: f64,
    /// General inflation (applied to O&M and replacements)
    pub inflation: f64,
}

fn default_feed_in_emission() -> f64 {
    0.566
}

fn default_rho_w() -> f64 {
    1000.0
}

fn default_c_w() -> f64 {
    4180.0
}

/// Economic boundary conditions
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Economics {
    /// Interest rate
    pub interest_rate: f64,
    /// Observation period (years)
    pub observation_period: u32,
    /// Annual price changes
    pub price_change: PriceChange,
    /// Price for electricity sold to the grid (EUR/kWh)
    pub price_sell_el: f64,
    /// Energy tax refunded for gas used in CHP units (EUR/kWh)
    pub energy_tax: f64,
    /// Pellet price (EUR/kWh)
    pub pellet_price: f64,
    /// Pellet emission factor (kg/kWh)
    pub pellet_emission: f64,
    /// Emissions avoided by electricity fed into the grid (kg/kWh)
    #[serde(default = "default_feed_in_emission")]
    pub feed_in_emission: f64,
    /// Density of water (kg/m³)
    #[serde(default = "default_rho_w")]
    pub rho_w: f64,
    /// Heat capacity of water (J/kgK)
    #[serde(default = "default_c_w")]
    pub c_w: f64,
}

/// Factors used to annualise costs and revenues
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnuityFactors {
    /// Capital recovery factor
    pub crf: f64,
    /// Price-dynamic factor for electricity
    pub b_el: f64,
    /// Price-dynamic factor for gas
    pub b_gas: f64,
    /// Price-dynamic factor for pellets
    pub b_pellet: f64,
    /// Price-dynamic factor for electricity sold on the exchange
    pub b_eex: f64,
    /// Price-dynamic factor for O&M
    pub b_infl: f64,
}

impl Economics {
    /// Calculate the annuity factors for the observation period
    pub fn annuity_factors(&self) -> AnnuityFactors {
        let period = self.observation_period;
        let interest = Dimensionless(self.interest_rate);
        let b = |change: f64| price_dynamic_factor(period, interest, Dimensionless(change)).0;

        AnnuityFactors {
            crf: capital_recovery_factor(period, interest).0,
            b_el: b(self.price_change.el),
            b_gas: b(self.price_change.gas),
            b_pellet: b(self.price_change.pellet),
            b_eex: b(self.price_change.eex),
            b_infl: b(self.price_change.inflation),
        }
    }

    /// Residual value share of an investment with the given lifetime
    pub fn residual_value(&self, lifetime: u32) -> Result<f64> {
        Ok(residual_value(
            self.observation_period,
            lifetime,
            Dimensionless(self.interest_rate),
            Dimensionless(self.price_change.inflation),
        )?
        .0)
    }

    /// Energy (kWh) stored per m³ of water and K of temperature difference
    pub fn water_heat_capacity(&self) -> f64 {
        self.rho_w * self.c_w / 3.6e6
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::economics;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_annuity_factors(economics: Economics) {
        let factors = economics.annuity_factors();
        assert_approx_eq!(
            f64,
            factors.crf,
            capital_recovery_factor(20, Dimensionless(0.055)).0
        );

        // Rising prices increase the present value of future payments
        assert!(factors.b_el > factors.b_infl);
        assert!(factors.b_el * factors.crf > 1.0);
    }

    #[rstest]
    fn test_residual_value(economics: Economics) {
        assert_eq!(economics.residual_value(20).unwrap(), 0.0);
        assert!(economics.residual_value(30).unwrap() > 0.0);
        assert!(economics.residual_value(0).is_err());
    }

    #[rstest]
    fn test_water_heat_capacity(economics: Economics) {
        assert_approx_eq!(
            f64,
            economics.water_heat_capacity(),
            1000.0 * 4180.0 / 3.6e6,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_defaults() {
        let economics: Economics = toml::from_str(
            "interest_rate = 0.05
            observation_period = 10
            price_sell_el = 0.1
            energy_tax = 0.0055
            pellet_price = 0.05
            pellet_emission = 0.02
            [price_change]
            el = 0.0
            gas = 0.0
            pellet = 0.0
            eex = 0.0
            inflation = 0.0",
        )
        .unwrap();
        assert_eq!(economics.feed_in_emission, 0.566);
        assert_eq!(economics.rho_w, 1000.0);
    }
}
