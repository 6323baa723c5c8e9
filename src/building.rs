//! The building envelope: geometry, shell components and their retrofit scenarios.
use crate::units::{Area, Volume};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator, IntoStaticStr};

/// Thermal bridge surcharge applied to the whole envelope (W/m²K)
pub const THERMAL_BRIDGE_SURCHARGE: f64 = 0.05;

/// A part of the building shell which can be retrofitted
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
pub enum Component {
    /// Windows (the only transparent component)
    Window,
    /// Outer walls
    OuterWall,
    /// Floor slab against the ground
    GroundFloor,
    /// Roof
    Rooftop,
}

impl Component {
    /// Temperature correction factor `Fx` for components without contact to ambient air
    pub fn temperature_correction(self) -> f64 {
        match self {
            Self::GroundFloor => 0.6,
            _ => 1.0,
        }
    }

    /// Whether the component is opaque (i.e. insulated rather than replaced)
    pub fn is_opaque(self) -> bool {
        self != Self::Window
    }
}

/// One of three mutually exclusive retrofit levels for a shell component
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
pub enum RetrofitScenario {
    /// The existing state of the component
    Standard,
    /// Retrofit to current regulations
    Retrofit,
    /// Advanced retrofit
    AdvRetr,
}

impl RetrofitScenario {
    /// Whether choosing this scenario incurs investment
    pub fn is_retrofit(self) -> bool {
        self != Self::Standard
    }

    /// The scenarios which involve investment
    pub fn retrofits() -> impl Iterator<Item = Self> {
        Self::iter().filter(|s| s.is_retrofit())
    }
}

/// Properties of a component in one retrofit scenario
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScenarioProperties {
    /// Heat transfer coefficient (W/m²K)
    pub u_value: f64,
    /// Total solar energy transmittance (windows only)
    #[serde(default)]
    pub g_value: f64,
    /// Added insulation thickness in m (opaque components only)
    #[serde(default)]
    pub thickness: f64,
}

/// Cost coefficients and scenarios for one shell component
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ComponentData {
    /// Fixed cost per m² of component (EUR/m²)
    pub cost_constant: f64,
    /// Variable cost per m² and cm of insulation (or per unit U-value for windows)
    pub cost_variable: f64,
    /// Lifetime in years
    pub lifetime: u32,
    /// Properties of the existing component
    pub standard: ScenarioProperties,
    /// Properties after a retrofit
    pub retrofit: ScenarioProperties,
    /// Properties after an advanced retrofit
    pub adv_retr: ScenarioProperties,
}

impl ComponentData {
    /// Get the properties for the given scenario
    pub fn scenario(&self, scenario: RetrofitScenario) -> &ScenarioProperties {
        match scenario {
            RetrofitScenario::Standard => &self.standard,
            RetrofitScenario::Retrofit => &self.retrofit,
            RetrofitScenario::AdvRetr => &self.adv_retr,
        }
    }

    /// Investment cost per m² of component for a scenario (before annualisation)
    ///
    /// Windows are priced by U-value, opaque components by insulation thickness in cm.
    pub fn specific_cost(&self, component: Component, scenario: RetrofitScenario) -> f64 {
        if !scenario.is_retrofit() {
            return 0.0;
        }

        let props = self.scenario(scenario);
        let driver = if component.is_opaque() {
            100.0 * props.thickness
        } else {
            props.u_value
        };

        self.cost_constant + self.cost_variable * driver
    }
}

/// Shell components
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ComponentMap {
    /// Windows
    pub window: ComponentData,
    /// Outer walls
    pub outer_wall: ComponentData,
    /// Ground floor
    pub ground_floor: ComponentData,
    /// Roof
    pub rooftop: ComponentData,
}

impl ComponentMap {
    /// Get the data for a component
    pub fn get(&self, component: Component) -> &ComponentData {
        match component {
            Component::Window => &self.window,
            Component::OuterWall => &self.outer_wall,
            Component::GroundFloor => &self.ground_floor,
            Component::Rooftop => &self.rooftop,
        }
    }
}

/// A value for each shell component
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ComponentValues {
    #[allow(missing_docs)]
    pub window: f64,
    #[allow(missing_docs)]
    pub outer_wall: f64,
    #[allow(missing_docs)]
    pub ground_floor: f64,
    #[allow(missing_docs)]
    pub rooftop: f64,
}

impl ComponentValues {
    /// Get the value for a component
    pub fn get(&self, component: Component) -> f64 {
        match component {
            Component::Window => self.window,
            Component::OuterWall => self.outer_wall,
            Component::GroundFloor => self.ground_floor,
            Component::Rooftop => self.rooftop,
        }
    }
}

/// Share of the window area facing each direction
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[allow(missing_docs)]
pub struct WindowOrientation {
    pub south: f64,
    pub east: f64,
    pub west: f64,
    pub north: f64,
}

/// A residential building
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Building {
    /// Living area (m²)
    pub area: f64,
    /// Ratio of heated volume to living area
    pub volume_factor: f64,
    /// Fraction of the roof which can be covered with PV or STC
    pub usable_roof: f64,
    /// Number of apartments
    pub apartments: u32,
    /// Component areas relative to the living area
    pub fractions: ComponentValues,
    /// Orientation of the windows
    pub window_orientation: WindowOrientation,
    /// Shell components
    pub components: ComponentMap,
}

impl Building {
    /// Area of a shell component
    pub fn component_area(&self, component: Component) -> Area {
        Area(self.area * self.fractions.get(component))
    }

    /// Total envelope area
    pub fn shell_area(&self) -> Area {
        Component::iter().map(|c| self.component_area(c)).sum()
    }

    /// Window area facing south, east, west and north
    pub fn window_areas(&self) -> [Area; 4] {
        let window = self.component_area(Component::Window).value();
        let o = &self.window_orientation;
        [o.south, o.east, o.west, o.north].map(|share| Area(window * share))
    }

    /// The heated air volume
    pub fn volume(&self) -> Volume {
        Volume(0.76 * self.area * self.volume_factor)
    }

    /// The roof area available for PV and STC (`A_max`)
    pub fn max_solar_area(&self) -> Area {
        Area(self.usable_roof * self.area * self.fractions.rooftop)
    }

    /// Sum of the component fractions weighted by thermal bridges
    pub fn thermal_bridge_loss(&self) -> f64 {
        THERMAL_BRIDGE_SURCHARGE * Component::iter().map(|c| self.fractions.get(c)).sum::<f64>()
    }

    /// Transmission coefficient `H_t` (W/K) when each component uses the given scenario
    pub fn transmission_coefficient<F>(&self, mut scenario_for: F) -> f64
    where
        F: FnMut(Component) -> RetrofitScenario,
    {
        let components: f64 = Component::iter()
            .map(|c| {
                let u = self.components.get(c).scenario(scenario_for(c)).u_value;
                self.fractions.get(c) * c.temperature_correction() * u
            })
            .sum();

        self.area * (components + self.thermal_bridge_loss())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::building;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[test]
    fn test_names() {
        assert_eq!(Component::OuterWall.to_string(), "outer_wall");
        assert_eq!(RetrofitScenario::AdvRetr.to_string(), "adv_retr");
        let name: &str = Component::GroundFloor.into();
        assert_eq!(name, "ground_floor");
    }

    #[test]
    fn test_retrofits() {
        assert_eq!(
            RetrofitScenario::retrofits().collect::<Vec<_>>(),
            [RetrofitScenario::Retrofit, RetrofitScenario::AdvRetr]
        );
    }

    #[rstest]
    fn test_geometry(building: Building) {
        assert_approx_eq!(f64, building.shell_area().value(), 150.0 * 2.3, epsilon = 1e-9);
        assert_approx_eq!(f64, building.volume().value(), 0.76 * 150.0 * 3.0, epsilon = 1e-9);
        assert_approx_eq!(f64, building.max_solar_area().value(), 0.4 * 150.0 * 0.6);
        let total: Area = building.window_areas().into_iter().sum();
        assert_approx_eq!(f64, total.value(), 150.0 * 0.2, epsilon = 1e-9);
    }

    #[rstest]
    fn test_specific_cost(building: Building) {
        let wall = building.components.get(Component::OuterWall);
        assert_eq!(
            wall.specific_cost(Component::OuterWall, RetrofitScenario::Standard),
            0.0
        );
        assert_approx_eq!(
            f64,
            wall.specific_cost(Component::OuterWall, RetrofitScenario::Retrofit),
            wall.cost_constant + wall.cost_variable * 100.0 * wall.retrofit.thickness,
            epsilon = 1e-9
        );

        let window = building.components.get(Component::Window);
        assert_approx_eq!(
            f64,
            window.specific_cost(Component::Window, RetrofitScenario::AdvRetr),
            window.cost_constant + window.cost_variable * window.adv_retr.u_value,
            epsilon = 1e-9
        );
    }

    #[rstest]
    fn test_transmission_coefficient(building: Building) {
        let standard = building.transmission_coefficient(|_| RetrofitScenario::Standard);
        let retrofit = building.transmission_coefficient(|_| RetrofitScenario::AdvRetr);
        assert!(retrofit < standard);

        let expected = 150.0
            * (Component::iter()
                .map(|c| {
                    building.fractions.get(c)
                        * c.temperature_correction()
                        * building.components.get(c).standard.u_value
                })
                .sum::<f64>()
                + 0.05 * 2.3);
        assert_approx_eq!(f64, standard, expected, epsilon = 1e-9);
    }
}
