//! Unit types for the physical quantities used by the building calculations.
//!
//! The MILP itself works on plain `f64` coefficients, but the closed-form calculations feeding it
//! (reference building, annuity factors) use these newtypes so that mixing up, say, an area with a
//! heat loss coefficient is a compile error.
#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

/// Represents a dimensionless quantity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    PartialOrd,
    Serialize,
    Deserialize,
    derive_more::Add,
    derive_more::Sub,
)]
pub struct Dimensionless(pub f64);

impl std::ops::Mul for Dimensionless {
    type Output = Dimensionless;

    fn mul(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 * rhs.0)
    }
}

impl std::ops::Div for Dimensionless {
    type Output = Dimensionless;

    fn div(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 / rhs.0)
    }
}

impl Dimensionless {
    pub fn powi(self, rhs: i32) -> Self {
        Dimensionless(self.0.powi(rhs))
    }
}

impl From<f64> for Dimensionless {
    fn from(val: f64) -> Self {
        Self(val)
    }
}

impl From<Dimensionless> for f64 {
    fn from(val: Dimensionless) -> Self {
        val.0
    }
}

macro_rules! unit_struct {
    ($name:ident) => {
        /// Represents a type of quantity.
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            PartialOrd,
            Default,
            Serialize,
            Deserialize,
            derive_more::Add,
            derive_more::Sub,
        )]
        pub struct $name(pub f64);

        impl $name {
            /// Returns the value of the unit type as a f64.
            pub fn value(self) -> f64 {
                self.0
            }
        }

        impl std::ops::Mul<Dimensionless> for $name {
            type Output = $name;
            fn mul(self, rhs: Dimensionless) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Mul<$name> for Dimensionless {
            type Output = $name;
            fn mul(self, rhs: $name) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Div<Dimensionless> for $name {
            type Output = $name;
            fn div(self, rhs: Dimensionless) -> $name {
                $name(self.0 / rhs.0)
            }
        }

        impl std::ops::Div for $name {
            type Output = Dimensionless;
            fn div(self, rhs: $name) -> Dimensionless {
                Dimensionless(self.0 / rhs.0)
            }
        }

        impl std::iter::Sum for $name {
            fn sum<I: Iterator<Item = $name>>(iter: I) -> $name {
                $name(iter.map(|x| x.0).sum())
            }
        }
    };
}

macro_rules! impl_mul {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Mul<$Rhs> for $Lhs {
            type Output = $Out;
            fn mul(self, rhs: $Rhs) -> $Out {
                <$Out>::from(self.0 * rhs.0)
            }
        }
        impl std::ops::Mul<$Lhs> for $Rhs {
            type Output = $Out;
            fn mul(self, lhs: $Lhs) -> $Out {
                <$Out>::from(self.0 * lhs.0)
            }
        }
    };
}

macro_rules! impl_div {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Div<$Rhs> for $Lhs {
            type Output = $Out;
            fn div(self, rhs: $Rhs) -> $Out {
                <$Out>::from(self.0 / rhs.0)
            }
        }
    };
}

macro_rules! impl_from_f64 {
    ($($name:ty),*) => {
        $(
            impl From<f64> for $name {
                fn from(val: f64) -> Self {
                    Self(val)
                }
            }
        )*
    };
}

// Base quantities
unit_struct!(Area);
unit_struct!(Volume);
unit_struct!(Energy);

// Derived quantities
unit_struct!(UValue);
unit_struct!(HeatLossCoefficient);
unit_struct!(KelvinHours);
unit_struct!(EnergyPerArea);

impl_from_f64!(Area, Volume, Energy);
impl_from_f64!(UValue, HeatLossCoefficient, KelvinHours, EnergyPerArea);

// Multiplication rules
impl_mul!(UValue, Area, HeatLossCoefficient);
impl_mul!(HeatLossCoefficient, KelvinHours, Energy);
impl_mul!(EnergyPerArea, Area, Energy);

// Division rules
impl_div!(HeatLossCoefficient, Area, UValue);
impl_div!(Energy, Area, EnergyPerArea);

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_heat_loss_from_u_value() {
        let h = UValue(0.28) * Area(100.0);
        assert_approx_eq!(f64, h.value(), 28.0, epsilon = 1e-12);
        assert_approx_eq!(f64, (h / Area(100.0)).value(), 0.28, epsilon = 1e-12);
    }

    #[test]
    fn test_energy_from_kelvin_hours() {
        // W/K * kKh gives kWh
        let q = HeatLossCoefficient(50.0) * KelvinHours(66.12);
        assert_approx_eq!(f64, q.value(), 3306.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sum() {
        let total: Area = [Area(1.0), Area(2.5), Area(0.5)].into_iter().sum();
        assert_eq!(total, Area(4.0));
    }
}
