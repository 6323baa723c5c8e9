//! Devices which can be installed in the building and their technical and economic parameters.
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};

pub mod performance;
pub use performance::DevicePerformance;

/// A device which may be purchased
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
pub enum Device {
    /// Gas condensing boiler
    Boiler,
    /// Combined heat and power unit
    Chp,
    /// Electric (resistive) heater
    Eh,
    /// Air-source heat pump
    HpAir,
    /// Ground-source heat pump
    HpGeo,
    /// Pellet boiler
    Pellet,
    /// Photovoltaic modules
    Pv,
    /// Solar thermal collector
    Stc,
    /// Battery
    Bat,
    /// Thermal energy storage (hot water tank)
    Tes,
    /// Mechanical ventilation unit with heat recovery
    Vent,
}

impl Device {
    /// Devices with a nominal heat output and an hourly on/off status
    pub const HEATERS: [Device; 6] = [
        Device::Boiler,
        Device::Chp,
        Device::Eh,
        Device::HpAir,
        Device::HpGeo,
        Device::Pellet,
    ];

    /// The heat pumps
    pub const HEAT_PUMPS: [Device; 2] = [Device::HpAir, Device::HpGeo];

    /// Storage devices
    pub const STORAGES: [Device; 2] = [Device::Bat, Device::Tes];

    /// Devices mounted on the roof
    pub const SOLAR: [Device; 2] = [Device::Pv, Device::Stc];

    /// Devices which can sell or self-use electricity
    pub const ELECTRICITY_SOURCES: [Device; 3] = [Device::Pv, Device::Bat, Device::Chp];

    /// Devices which are fired with natural gas
    pub const GAS_CONSUMERS: [Device; 2] = [Device::Boiler, Device::Chp];

    /// Whether this device is a heater
    pub fn is_heater(self) -> bool {
        Self::HEATERS.contains(&self)
    }

    /// Whether this device is a heat pump
    pub fn is_heat_pump(self) -> bool {
        Self::HEAT_PUMPS.contains(&self)
    }

    /// Whether this device has an hourly activation binary
    pub fn has_activation(self) -> bool {
        self.is_heater() || self == Self::Stc
    }

    /// Whether the device limits the TES loading temperature when active
    pub fn limits_storage_temperature(self) -> bool {
        self.is_heat_pump() || self == Self::Stc
    }
}

/// Economic parameters shared by all devices
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeviceCosts {
    /// Fixed investment cost (EUR)
    pub c_inv_fix: f64,
    /// Variable investment cost per unit of capacity
    pub c_inv_var: f64,
    /// Annual operation and maintenance cost as a share of the investment
    pub c_om_rel: f64,
    /// Lifetime in years
    pub lifetime: u32,
    /// Installation cost in a single-family house (EUR)
    #[serde(default)]
    pub inst_costs_sfh: f64,
    /// Installation cost in a multi-family house (EUR)
    #[serde(default)]
    pub inst_costs_mfh: f64,
}

impl DeviceCosts {
    /// Installation cost for the building class
    pub fn installation(&self, multi_family: bool) -> f64 {
        if multi_family {
            self.inst_costs_mfh
        } else {
            self.inst_costs_sfh
        }
    }
}

/// Boilers and electric heaters
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HeaterParams {
    #[serde(flatten)]
    #[allow(missing_docs)]
    pub costs: DeviceCosts,
    /// Minimum nominal heat output (kW)
    pub cap_min: f64,
    /// Maximum nominal heat output (kW)
    pub cap_max: f64,
    /// Minimum part load as a share of the nominal output
    pub mod_lvl: f64,
    /// Conversion efficiency
    pub eta: f64,
}

/// Combined heat and power unit
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChpParams {
    #[serde(flatten)]
    #[allow(missing_docs)]
    pub costs: DeviceCosts,
    /// Minimum nominal heat output (kW)
    pub cap_min: f64,
    /// Maximum nominal heat output (kW)
    pub cap_max: f64,
    /// Minimum part load as a share of the nominal output
    pub mod_lvl: f64,
    /// Power-to-heat ratio
    pub sigma: f64,
    /// Total (heat plus power) efficiency
    pub omega: f64,
    /// Whether the unit qualifies for the thermal efficiency bonus
    #[serde(default)]
    pub thermal_efficiency_bonus: bool,
    /// Whether the unit qualifies for the electrical efficiency bonus
    #[serde(default)]
    pub electrical_efficiency_bonus: bool,
}

/// A point on a heat pump datasheet
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CopPoint {
    /// Source temperature (°C)
    pub temperature: f64,
    /// Coefficient of performance at that temperature
    pub cop: f64,
}

/// Air- or ground-source heat pump
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HeatPumpParams {
    #[serde(flatten)]
    #[allow(missing_docs)]
    pub costs: DeviceCosts,
    /// Minimum nominal heat output (kW)
    pub cap_min: f64,
    /// Maximum nominal heat output (kW)
    pub cap_max: f64,
    /// Minimum part load as a share of the nominal power
    pub mod_lvl: f64,
    /// COP curve for 35 °C supply temperature
    pub cop_w35: Vec<CopPoint>,
    /// COP curve for 55 °C supply temperature
    pub cop_w55: Vec<CopPoint>,
    /// COP at the A2/W35 rating point
    pub cop_a2w35: f64,
    /// COP at the A2/W55 rating point
    pub cop_a2w55: f64,
    /// Temperature difference up to which the heat pump can load the TES (K)
    pub dt_max: f64,
    /// Whether the heat pump is power controlled (BAFA bonus)
    #[serde(default)]
    pub power_controlled: bool,
    /// Whether the heat pump is smart grid ready (BAFA bonus)
    #[serde(default)]
    pub smart_grid_ready: bool,
    /// Constant source temperature (ground-source heat pumps only)
    #[serde(default)]
    pub source_temperature: Option<f64>,
}

/// Pellet boiler
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PelletParams {
    #[serde(flatten)]
    #[allow(missing_docs)]
    pub heater: HeaterParams,
    /// Whether the boiler meets the BAFA innovation requirements
    #[serde(default)]
    pub innovation_eligible: bool,
}

/// Photovoltaic modules
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PvParams {
    #[serde(flatten)]
    #[allow(missing_docs)]
    pub costs: DeviceCosts,
    /// Minimum module area (m²)
    pub area_min: f64,
    /// Peak power of one module (kW)
    pub p_nom: f64,
    /// Area of one module (m²)
    pub area_mean: f64,
    /// Nominal electrical efficiency
    pub eta_nom: f64,
    /// Relative efficiency loss per K above 25 °C cell temperature
    pub temperature_coefficient: f64,
    /// Nominal operating cell temperature (°C)
    pub noct: f64,
}

impl PvParams {
    /// Peak power per m² of modules (kWp/m²)
    pub fn specific_peak_power(&self) -> f64 {
        self.p_nom / self.area_mean
    }
}

/// Solar thermal collector
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StcParams {
    #[serde(flatten)]
    #[allow(missing_docs)]
    pub costs: DeviceCosts,
    /// Minimum collector area (m²)
    pub area_min: f64,
    /// Optical efficiency
    pub eta0: f64,
    /// Linear heat loss coefficient (W/m²K)
    pub a1: f64,
    /// Quadratic heat loss coefficient (W/m²K²)
    pub a2: f64,
    /// Mean collector fluid temperature (°C)
    pub mean_temperature: f64,
    /// Temperature difference up to which the collector can load the TES (K)
    pub dt_max: f64,
    /// Annual collector yield (kWh/m²), used for BAFA innovation eligibility
    #[serde(default)]
    pub annual_gain: f64,
}

/// Thermal energy storage
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TesParams {
    #[serde(flatten)]
    #[allow(missing_docs)]
    pub costs: DeviceCosts,
    /// Minimum volume (m³)
    pub volume_min: f64,
    /// Maximum volume (m³)
    pub volume_max: f64,
    /// Usable temperature difference (K)
    pub dt_max: f64,
    /// Self-discharge per time step
    pub k_loss: f64,
    /// Charging efficiency
    pub eta_ch: f64,
    /// Discharging efficiency
    pub eta_dch: f64,
}

/// Battery
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatteryParams {
    #[serde(flatten)]
    #[allow(missing_docs)]
    pub costs: DeviceCosts,
    /// Minimum capacity (kWh)
    pub cap_min: f64,
    /// Maximum capacity (kWh)
    pub cap_max: f64,
    /// Charging and discharging efficiency
    pub eta: f64,
    /// Self-discharge per time step
    pub k_loss: f64,
    /// Fixed part of the charging power limit (kW)
    pub p_ch_fix: f64,
    /// Charging power per kWh of capacity
    pub p_ch_var: f64,
    /// Fixed part of the discharging power limit (kW)
    pub p_dch_fix: f64,
    /// Discharging power per kWh of capacity
    pub p_dch_var: f64,
}

/// Mechanical ventilation unit
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VentParams {
    #[serde(flatten)]
    #[allow(missing_docs)]
    pub costs: DeviceCosts,
    /// Air flow (m³/h)
    pub air_flow: f64,
    /// Heat recovery efficiency
    pub heat_recovery: f64,
    /// Electric fan power (kW)
    pub fan_power: f64,
}

/// Capacity limits and part-load behaviour of a heater
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaterLimits {
    /// Minimum nominal output
    pub cap_min: f64,
    /// Maximum nominal output
    pub cap_max: f64,
    /// Minimum part load
    pub mod_lvl: f64,
}

/// The parameters of every device
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[allow(missing_docs)]
pub struct DeviceCatalog {
    pub boiler: HeaterParams,
    pub chp: ChpParams,
    pub eh: HeaterParams,
    pub hp_air: HeatPumpParams,
    pub hp_geo: HeatPumpParams,
    pub pellet: PelletParams,
    pub pv: PvParams,
    pub stc: StcParams,
    pub bat: BatteryParams,
    pub tes: TesParams,
    pub vent: VentParams,
}

impl DeviceCatalog {
    /// The economic parameters of a device
    pub fn costs(&self, device: Device) -> &DeviceCosts {
        match device {
            Device::Boiler => &self.boiler.costs,
            Device::Chp => &self.chp.costs,
            Device::Eh => &self.eh.costs,
            Device::HpAir => &self.hp_air.costs,
            Device::HpGeo => &self.hp_geo.costs,
            Device::Pellet => &self.pellet.heater.costs,
            Device::Pv => &self.pv.costs,
            Device::Stc => &self.stc.costs,
            Device::Bat => &self.bat.costs,
            Device::Tes => &self.tes.costs,
            Device::Vent => &self.vent.costs,
        }
    }

    /// The parameters of a heat pump
    ///
    /// # Panics
    ///
    /// If `device` is not a heat pump.
    pub fn heat_pump(&self, device: Device) -> &HeatPumpParams {
        match device {
            Device::HpAir => &self.hp_air,
            Device::HpGeo => &self.hp_geo,
            _ => panic!("{device} is not a heat pump"),
        }
    }

    /// Capacity limits of a heater, or `None` for other devices
    pub fn heater_limits(&self, device: Device) -> Option<HeaterLimits> {
        let limits = |cap_min, cap_max, mod_lvl| {
            Some(HeaterLimits {
                cap_min,
                cap_max,
                mod_lvl,
            })
        };

        match device {
            Device::Boiler => limits(self.boiler.cap_min, self.boiler.cap_max, self.boiler.mod_lvl),
            Device::Chp => limits(self.chp.cap_min, self.chp.cap_max, self.chp.mod_lvl),
            Device::Eh => limits(self.eh.cap_min, self.eh.cap_max, self.eh.mod_lvl),
            Device::HpAir | Device::HpGeo => {
                let hp = self.heat_pump(device);
                limits(hp.cap_min, hp.cap_max, hp.mod_lvl)
            }
            Device::Pellet => {
                let p = &self.pellet.heater;
                limits(p.cap_min, p.cap_max, p.mod_lvl)
            }
            _ => None,
        }
    }

    /// Upper bound on the capacity variable of a device, given the usable roof area
    pub fn capacity_bound(&self, device: Device, max_solar_area: f64) -> f64 {
        if let Some(limits) = self.heater_limits(device) {
            return limits.cap_max;
        }

        match device {
            Device::Pv | Device::Stc => max_solar_area,
            Device::Bat => self.bat.cap_max,
            Device::Tes => self.tes.volume_max,
            Device::Vent => self.vent.air_flow,
            _ => unreachable!(),
        }
    }

    /// Temperature difference up to which a device can load the TES (K)
    pub fn storage_temperature_limit(&self, device: Device) -> Option<f64> {
        match device {
            Device::HpAir | Device::HpGeo => Some(self.heat_pump(device).dt_max),
            Device::Stc => Some(self.stc.dt_max),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::devices;
    use rstest::rstest;
    use strum::IntoEnumIterator;

    #[test]
    fn test_device_names() {
        let names: Vec<&str> = Device::iter().map(Into::into).collect();
        assert_eq!(
            names,
            [
                "boiler", "chp", "eh", "hp_air", "hp_geo", "pellet", "pv", "stc", "bat", "tes",
                "vent"
            ]
        );
    }

    #[test]
    fn test_device_groups() {
        assert!(Device::Pellet.is_heater());
        assert!(!Device::Stc.is_heater());
        assert!(Device::Stc.has_activation());
        assert!(!Device::Pv.has_activation());
        assert!(Device::HpGeo.limits_storage_temperature());
        assert!(!Device::Boiler.limits_storage_temperature());
    }

    #[rstest]
    fn test_heater_limits(devices: DeviceCatalog) {
        let boiler = devices.heater_limits(Device::Boiler).unwrap();
        assert_eq!(boiler.cap_max, devices.boiler.cap_max);
        assert!(devices.heater_limits(Device::Tes).is_none());
        assert_eq!(devices.capacity_bound(Device::Pv, 36.0), 36.0);
        assert_eq!(devices.capacity_bound(Device::Tes, 36.0), devices.tes.volume_max);
    }

    #[test]
    fn test_installation_cost() {
        let costs = DeviceCosts {
            c_inv_fix: 1000.0,
            c_inv_var: 100.0,
            c_om_rel: 0.01,
            lifetime: 20,
            inst_costs_sfh: 500.0,
            inst_costs_mfh: 800.0,
        };
        assert_eq!(costs.installation(false), 500.0);
        assert_eq!(costs.installation(true), 800.0);
    }
}
