//! Parameters of the German subsidy programs.
use crate::building::ComponentValues;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};

/// Global bound used where no tighter bound of a subsidy linearisation is known
pub const BIG_M: f64 = 10_000.0;

/// The KfW efficiency building tiers
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
pub enum KfwTier {
    /// KfW efficiency building 55
    #[strum(serialize = "kfw_eff_55")]
    #[serde(rename = "kfw_eff_55")]
    Eff55,
    /// KfW efficiency building 70
    #[strum(serialize = "kfw_eff_70")]
    #[serde(rename = "kfw_eff_70")]
    Eff70,
    /// KfW efficiency building 85
    #[strum(serialize = "kfw_eff_85")]
    #[serde(rename = "kfw_eff_85")]
    Eff85,
    /// KfW efficiency building 100
    #[strum(serialize = "kfw_eff_100")]
    #[serde(rename = "kfw_eff_100")]
    Eff100,
    /// KfW efficiency building 115
    #[strum(serialize = "kfw_eff_115")]
    #[serde(rename = "kfw_eff_115")]
    Eff115,
}

/// A PV size class of the feed-in tariff
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EegStep {
    /// Upper limit of the installed peak power (kWp)
    pub peak_power: f64,
    /// Feed-in tariff (EUR/kWh)
    pub tariff: f64,
}

/// Feed-in tariff for PV (EEG)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EegParams {
    /// Factor applied to all tariffs
    pub price_factor: f64,
    /// Size classes in ascending order
    pub steps: Vec<EegStep>,
}

/// KfW program for batteries combined with PV
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KfwBatteryParams {
    /// Maximum share of the eligible cost
    pub share_max: f64,
    /// Maximum eligible cost per kWp of PV (EUR/kWp)
    pub sub_bat_max: f64,
    /// Cost per kWp of PV which is not eligible (EUR/kWp)
    pub sub_bat: f64,
}

/// A full-load-hours class of the CHP surcharge
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KwkgClass {
    /// Annual full load hours of the class
    pub full_load_hours: f64,
    /// Present value of the payments, relative to one year's payment
    pub present_value_factor: f64,
}

/// CHP surcharge (KWKG)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KwkgParams {
    /// Surcharge for self-used electricity (EUR/kWh)
    pub self_use_rate: f64,
    /// Surcharge for electricity fed into the grid (EUR/kWh)
    pub sell_rate: f64,
    /// Full load hours classes
    pub classes: Vec<KwkgClass>,
}

/// BAFA investment grant for mini-CHP units
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BafaChpParams {
    /// Maximum basic grant for mini units (EUR)
    pub basic_max: f64,
    /// Grant per kW_el for each of the four power steps (EUR/kW)
    pub steps: [f64; 4],
    /// Bonus share for thermally efficient units
    pub thermal_efficiency_share: f64,
    /// Bonus share for electrically efficient units
    pub electrical_efficiency_share: f64,
}

/// BAFA grant for solar thermal collectors
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BafaStcParams {
    /// Minimum storage per collector area (kg/m²)
    pub min_storage: f64,
    /// Minimum area for the basic grant (m²)
    pub basic_area_min: f64,
    /// Area up to which the variable basic grant is paid (m²)
    pub basic_area_max: f64,
    /// Fixed basic grant (EUR)
    pub basic_fix: f64,
    /// Variable basic grant (EUR/m²)
    pub basic_var: f64,
    /// Minimum annual collector yield for the innovation grant (kWh/m²)
    pub annual_gain: f64,
    /// Minimum area for the innovation grant (m²)
    pub inno_area_min: f64,
    /// Area up to which the innovation grant is paid (m²)
    pub inno_area_max: f64,
    /// Innovation grant for new buildings (EUR/m²)
    pub inno_new: f64,
    /// Additional innovation grant for existing buildings (EUR/m²)
    pub inno_existing: f64,
    /// Bonus for the combination with a heat pump (EUR)
    pub stc_hp_combi: f64,
    /// Building efficiency bonus as a share of the grant
    pub build_eff: f64,
}

/// BAFA grant for one heat pump type
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BafaHpParams {
    /// Minimum seasonal COP for the basic grant
    pub basic_scop: f64,
    /// Fixed basic grant (EUR)
    pub basic_fix: f64,
    /// Fixed basic grant bonus for power controlled units (EUR)
    pub basic_fix_pc: f64,
    /// Variable basic grant (EUR/kW)
    pub basic_var: f64,
    /// Capacity up to which the variable grant is paid (kW)
    pub max_cap: f64,
    /// Minimum seasonal COP for the innovation grant
    pub inno_scop: f64,
    /// Fixed innovation grant (EUR)
    pub inno_fix: f64,
    /// Fixed innovation grant bonus for power controlled units (EUR)
    pub inno_fix_pc: f64,
    /// Variable innovation grant (EUR/kW)
    pub inno_var: f64,
    /// Bonus for smart grid ready units (EUR)
    pub smart_grid: f64,
    /// Minimum storage per kW of heat pump capacity for the smart grid bonus (kg/kW)
    pub storage_ratio: f64,
    /// Building efficiency bonus as a share of the grant
    pub build_eff: f64,
}

/// BAFA grant for pellet boilers
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BafaPelletParams {
    /// Minimum capacity (kW)
    pub min_cap: f64,
    /// Minimum storage per kW of boiler capacity for the storage grants (kg/kW)
    pub storage_ratio: f64,
    /// Fixed basic grant (EUR)
    pub basic_fix: f64,
    /// Basic grant with buffer storage (EUR)
    pub basic_storage: f64,
    /// Variable basic grant (EUR/kW)
    pub basic_var: f64,
    /// Fixed innovation grant for new buildings (EUR)
    pub inno_fix_new: f64,
    /// Additional fixed innovation grant for existing buildings (EUR)
    pub inno_fix_old: f64,
    /// Innovation grant with buffer storage for new buildings (EUR)
    pub inno_fix_new_storage: f64,
    /// Additional innovation grant with buffer storage for existing buildings (EUR)
    pub inno_fix_old_storage: f64,
    /// Bonus for the combination with a solar thermal collector (EUR)
    pub stc_pellet_combi: f64,
    /// Building efficiency bonus as a share of the grant
    pub build_eff: f64,
}

/// BAFA heat pump grants
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[allow(missing_docs)]
pub struct BafaHpPrograms {
    pub hp_air: BafaHpParams,
    pub hp_geo: BafaHpParams,
}

/// KfW grant for individual retrofit measures
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KfwIndividualParams {
    /// Grant per measure (EUR)
    pub grant: f64,
    /// Maximum share of the investment
    pub share_max: f64,
    /// U-value each component must meet (W/m²K)
    pub u_value: ComponentValues,
}

/// KfW grant for one efficiency building tier
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KfwTierParams {
    /// Grant (EUR)
    pub grant: f64,
    /// Maximum share of the shell investment
    pub share_max: f64,
    /// Limit of the specific transmission coefficient relative to the reference building
    pub factor_h: f64,
    /// Limit of the primary energy demand relative to the reference building
    pub factor_q: f64,
}

/// Parameters of all subsidy programs
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[allow(missing_docs)]
pub struct Subsidies {
    pub eeg: EegParams,
    pub kfw_battery: KfwBatteryParams,
    pub kwkg: KwkgParams,
    pub bafa_chp: BafaChpParams,
    pub bafa_stc: BafaStcParams,
    pub bafa_hp: BafaHpPrograms,
    pub bafa_pellet: BafaPelletParams,
    pub kfw_individual: KfwIndividualParams,
    pub kfw_efficiency: IndexMap<KfwTier, KfwTierParams>,
}

impl Subsidies {
    /// The parameters of a KfW efficiency tier
    ///
    /// # Panics
    ///
    /// If the tier is missing. Every tier is checked when the file is loaded.
    pub fn kfw_tier(&self, tier: KfwTier) -> &KfwTierParams {
        &self.kfw_efficiency[&tier]
    }

    /// The BAFA parameters of a heat pump
    ///
    /// # Panics
    ///
    /// If `device` is not a heat pump.
    pub fn bafa_hp(&self, device: crate::device::Device) -> &BafaHpParams {
        use crate::device::Device;
        match device {
            Device::HpAir => &self.bafa_hp.hp_air,
            Device::HpGeo => &self.bafa_hp.hp_geo,
            _ => panic!("{device} is not a heat pump"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_tier_names() {
        let names: Vec<String> = KfwTier::iter().map(|t| t.to_string()).collect();
        assert_eq!(
            names,
            [
                "kfw_eff_55",
                "kfw_eff_70",
                "kfw_eff_85",
                "kfw_eff_100",
                "kfw_eff_115"
            ]
        );
        let tier: KfwTier = toml::Value::String("kfw_eff_85".into()).try_into().unwrap();
        assert_eq!(tier, KfwTier::Eff85);
    }
}
