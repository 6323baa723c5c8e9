//! Fixtures for tests
use crate::building::Building;
use crate::clustering::ClusteredData;
use crate::device::DeviceCatalog;
use crate::economics::Economics;
use crate::input::load_model;
use crate::model::{Model, Programs};
use crate::subsidy::Subsidies;
use crate::time_series::{Profile, SeriesKind};
use crate::ventilation::{
    InfiltrationClass, NUM_BUCKETS, ScenarioFlags, VentilationData, WindowOpening,
};
use indexmap::indexmap;
use rstest::fixture;
use std::path::{Path, PathBuf};

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Path to one of the bundled demo scenarios
pub fn demo_dir(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}

#[fixture]
pub fn building() -> Building {
    toml::from_str(include_str!("../demos/simple/building.toml")).unwrap()
}

#[fixture]
pub fn devices() -> DeviceCatalog {
    toml::from_str(include_str!("../demos/simple/devices.toml")).unwrap()
}

#[fixture]
pub fn economics() -> Economics {
    toml::from_str(include_str!("../demos/simple/economics.toml")).unwrap()
}

#[fixture]
pub fn subsidies() -> Subsidies {
    toml::from_str(include_str!("../demos/simple/subsidies.toml")).unwrap()
}

#[fixture]
pub fn ventilation_data() -> VentilationData {
    let flags = |standard, retrofit, adv_retr| ScenarioFlags {
        standard,
        retrofit,
        adv_retr,
    };
    let class = |n50, vent, window_standard| InfiltrationClass {
        n50,
        window: flags(window_standard, !window_standard, !window_standard),
        rooftop: flags(true, true, true),
        vent,
    };

    // Windows are opened more often on warm afternoons
    let shares = (0..24)
        .map(|hour| {
            let mut row = [0.0; NUM_BUCKETS];
            for (bucket, share) in row.iter_mut().enumerate() {
                let daytime = if (8..20).contains(&hour) { 2.0 } else { 1.0 };
                *share = 0.01 * daytime * (1 + bucket) as f64;
            }
            row
        })
        .collect();

    VentilationData {
        parameters: toml::from_str(include_str!("../demos/detailed_ventilation/ventilation.toml"))
            .unwrap(),
        classes: indexmap! {
            "leaky".into() => class(7.0, false, true),
            "tight".into() => class(3.0, false, false),
            "leaky_vent".into() => class(4.0, true, true),
            "tight_vent".into() => class(1.0, true, false),
        },
        window_opening: WindowOpening::new(shares),
    }
}

/// The simple demo scenario with all programs switched off and tight solver limits
#[fixture]
pub fn model() -> Model {
    let mut model = load_model(demo_dir("simple")).unwrap();
    model.options.programs = Programs::default();
    model.options.design_heat_load = false;
    model.options.solver.time_limit = 120.0;
    model.options.solver.mip_gap = 0.0;
    model
}

/// A profile of the two representative days
fn two_days(day0: [f64; 4], day1: [f64; 4]) -> Profile {
    vec![day0.to_vec(), day1.to_vec()]
}

/// Two representative days (a cold and a mild one) with four time steps each
#[fixture]
pub fn clustered() -> ClusteredData {
    let solar_roof = two_days([0.0, 0.2, 0.35, 0.05], [0.0, 0.45, 0.6, 0.1]);
    let facade = |share: f64| -> Profile {
        solar_roof
            .iter()
            .map(|day| day.iter().map(|i| share * i).collect())
            .collect()
    };

    ClusteredData {
        time_steps: 4,
        weights: vec![200.0, 165.0],
        assignment: (0..365).map(|day| usize::from(day >= 200)).collect(),
        medoids: vec![10, 250],
        series: indexmap! {
            SeriesKind::Electricity => two_days([0.3, 0.5, 0.4, 0.8], [0.3, 0.4, 0.4, 0.7]),
            SeriesKind::Dhw => two_days([0.1, 0.3, 0.2, 0.3], [0.1, 0.3, 0.2, 0.3]),
            SeriesKind::IntGains => two_days([0.6; 4], [0.6; 4]),
            SeriesKind::SolarRoof => solar_roof.clone(),
            SeriesKind::SolarSouth => facade(0.8),
            SeriesKind::SolarWest => facade(0.45),
            SeriesKind::SolarEast => facade(0.45),
            SeriesKind::SolarNorth => facade(0.15),
            SeriesKind::Temperature => two_days([-6.0, -3.0, 0.0, -4.0], [6.0, 10.0, 14.0, 9.0]),
            SeriesKind::WindSpeed => two_days([3.0, 4.0, 5.0, 3.0], [3.0, 4.0, 5.0, 3.0]),
        },
        objective: 0.0,
    }
}
