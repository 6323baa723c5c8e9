//! Heating concepts used to determine the primary energy demand of the building.
use crate::device::Device;
use indexmap::IndexMap;

/// The devices whose presence defines a heating concept
pub const CONCEPT_DEVICES: [Device; 7] = [
    Device::Boiler,
    Device::Chp,
    Device::Eh,
    Device::HpAir,
    Device::HpGeo,
    Device::Pellet,
    Device::Stc,
];

/// A combination of heating devices and supply temperature with its primary energy factor
#[derive(Debug, Clone, PartialEq)]
pub struct HeatingConcept {
    /// Which of [`CONCEPT_DEVICES`] are part of the concept
    pub devices: [bool; 7],
    /// Whether the concept uses 35 °C supply temperature
    pub tvl35: bool,
    /// Primary energy expenditure factor
    pub ep: f64,
}

impl HeatingConcept {
    /// Whether the concept includes the device
    pub fn includes(&self, device: Device) -> bool {
        CONCEPT_DEVICES
            .iter()
            .position(|&d| d == device)
            .is_some_and(|i| self.devices[i])
    }
}

/// Heating concepts, keyed by name
pub type HeatingConceptMap = IndexMap<String, HeatingConcept>;
