//! Gas and electricity tariffs with consumption-dependent price tiers.
use indexmap::IndexMap;

/// A price level of a tariff, valid for a range of annual consumption
#[derive(Debug, Clone, PartialEq)]
pub struct TariffTier {
    /// Lower consumption limit (MWh/a)
    pub lower: f64,
    /// Upper consumption limit (MWh/a)
    pub upper: f64,
    /// Energy price (EUR/kWh)
    pub price: f64,
    /// Annual fixed charge (EUR/a)
    pub fixed: f64,
}

/// A supply tariff
#[derive(Debug, Clone, PartialEq)]
pub struct Tariff {
    /// Whether the tariff may only be used for heat pumps
    pub heat_pump: bool,
    /// Emission factor of the supplied energy (kg/kWh)
    pub emission: f64,
    /// Price tiers, ordered by consumption
    pub tiers: Vec<TariffTier>,
}

/// A map of tariffs, keyed by name
pub type TariffMap = IndexMap<String, Tariff>;

/// Names of the tariffs which are (or are not) reserved for heat pumps
pub fn tariffs_for(tariffs: &TariffMap, heat_pump: bool) -> impl Iterator<Item = &str> {
    tariffs
        .iter()
        .filter(move |(_, tariff)| tariff.heat_pump == heat_pump)
        .map(|(name, _)| name.as_str())
}
