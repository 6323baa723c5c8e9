//! Annual time series driving the building model.
use crate::model::VentilationMode;
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};

/// Values indexed by representative day, then time step
pub type Profile = Vec<Vec<f64>>;

/// The kinds of annual series known to the model
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
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    /// Household electricity demand (kW)
    Electricity,
    /// Domestic hot water demand (kW)
    Dhw,
    /// Internal heat gains (kW)
    IntGains,
    /// Irradiation on the roof (kW/m²)
    SolarRoof,
    /// Irradiation on south-facing facades (kW/m²)
    SolarSouth,
    /// Irradiation on west-facing facades (kW/m²)
    SolarWest,
    /// Irradiation on east-facing facades (kW/m²)
    SolarEast,
    /// Irradiation on north-facing facades (kW/m²)
    SolarNorth,
    /// Ambient temperature (°C)
    Temperature,
    /// Wind speed (m/s)
    WindSpeed,
}

impl SeriesKind {
    /// Whether the series may contain negative values (and must never be rescaled)
    pub fn allows_negative(self) -> bool {
        self == Self::Temperature
    }

    /// Importance of the series for clustering unless configured otherwise
    pub fn default_weight(self) -> f64 {
        match self {
            Self::Electricity | Self::Dhw | Self::SolarRoof => 8.0,
            Self::Temperature => 3.0,
            _ => 1.0,
        }
    }

    /// Whether the series has to be provided for the given ventilation mode
    pub fn is_required(self, ventilation: VentilationMode) -> bool {
        self != Self::WindSpeed || ventilation == VentilationMode::Detailed
    }
}

/// A set of annual series with a common resolution
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesSet {
    /// Number of days in a year
    pub days_per_year: usize,
    /// Number of time steps per day
    pub time_steps: usize,
    /// The series, in the order they were loaded
    pub series: IndexMap<SeriesKind, Vec<f64>>,
}

impl TimeSeriesSet {
    /// Create a new set, checking that every series covers the whole year at the same resolution
    pub fn new(days_per_year: usize, series: IndexMap<SeriesKind, Vec<f64>>) -> Result<Self> {
        ensure!(days_per_year > 0, "days_per_year must be greater than zero");
        ensure!(!series.is_empty(), "No time series provided");

        let len = series[0].len();
        ensure!(
            len > 0 && len % days_per_year == 0,
            "Time series length ({len}) must be a non-zero multiple of days_per_year \
            ({days_per_year})"
        );
        for (kind, values) in &series {
            ensure!(
                values.len() == len,
                "Time series {kind} has {} values, expected {len}",
                values.len()
            );
            ensure!(
                values.iter().all(|v| v.is_finite()),
                "Time series {kind} contains non-finite values"
            );
        }

        Ok(Self {
            days_per_year,
            time_steps: len / days_per_year,
            series,
        })
    }

    /// Get the values of a series
    pub fn get(&self, kind: SeriesKind) -> Option<&[f64]> {
        self.series.get(&kind).map(Vec::as_slice)
    }

    /// The values of a series on one day
    pub fn day(&self, kind: SeriesKind, day: usize) -> Option<&[f64]> {
        let start = day * self.time_steps;
        self.get(kind)
            .and_then(|values| values.get(start..start + self.time_steps))
    }

    /// Hours per time step
    pub fn dt(&self) -> f64 {
        24.0 / self.time_steps as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;
    use rstest::rstest;

    #[test]
    fn test_time_series_set() {
        let set = TimeSeriesSet::new(
            2,
            indexmap! {
                SeriesKind::Electricity => vec![1.0, 2.0, 3.0, 4.0],
                SeriesKind::Temperature => vec![-1.0, 0.0, 1.0, 2.0],
            },
        )
        .unwrap();
        assert_eq!(set.time_steps, 2);
        assert_eq!(set.dt(), 12.0);
        assert_eq!(set.day(SeriesKind::Temperature, 1), Some([1.0, 2.0].as_slice()));
        assert_eq!(set.day(SeriesKind::Temperature, 2), None);
        assert!(set.get(SeriesKind::Dhw).is_none());
    }

    #[rstest]
    #[case(3, vec![1.0; 4], vec![1.0; 4])]
    #[case(2, vec![1.0; 4], vec![1.0; 6])]
    #[case(2, vec![1.0, f64::NAN, 1.0, 1.0], vec![1.0; 4])]
    fn test_time_series_set_invalid(
        #[case] days: usize,
        #[case] a: Vec<f64>,
        #[case] b: Vec<f64>,
    ) {
        let series = indexmap! { SeriesKind::Electricity => a, SeriesKind::Dhw => b };
        assert!(TimeSeriesSet::new(days, series).is_err());
    }

    #[test]
    fn test_series_kind() {
        assert_eq!(SeriesKind::SolarRoof.to_string(), "solar_roof");
        assert!(SeriesKind::Temperature.allows_negative());
        assert!(!SeriesKind::WindSpeed.is_required(VentilationMode::Simple));
        assert!(SeriesKind::WindSpeed.is_required(VentilationMode::Detailed));
        assert_eq!(SeriesKind::Dhw.default_weight(), 8.0);
    }
}
