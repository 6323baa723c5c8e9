//! Fixed design decisions for the reference scenarios.
use super::variables::Variables;
use crate::building::{Component, RetrofitScenario};
use crate::device::Device;
use crate::model::Preset;
use crate::solver::MilpProblem;
use strum::IntoEnumIterator;

/// The heating system and shell state fixed by a preset, or `None` if nothing is fixed
fn preset_design(preset: Preset) -> Option<(&'static [(Device, f64)], RetrofitScenario)> {
    // Gas boiler only; the TES is always installed
    const BOILER_ONLY: &[(Device, f64)] = &[
        (Device::Boiler, 1.0),
        (Device::Chp, 0.0),
        (Device::Eh, 0.0),
        (Device::HpAir, 0.0),
        (Device::HpGeo, 0.0),
        (Device::Pellet, 0.0),
        (Device::Pv, 0.0),
        (Device::Stc, 0.0),
        (Device::Bat, 0.0),
        (Device::Vent, 0.0),
    ];
    // CHP unit; peak boiler and electric heater stay free
    const CHP: &[(Device, f64)] = &[
        (Device::Chp, 1.0),
        (Device::Boiler, 0.0),
        (Device::HpAir, 0.0),
        (Device::HpGeo, 0.0),
        (Device::Stc, 0.0),
        (Device::Pv, 0.0),
        (Device::Bat, 0.0),
        (Device::Pellet, 0.0),
    ];

    match preset {
        Preset::Free => None,
        Preset::Benchmark => Some((BOILER_ONLY, RetrofitScenario::Standard)),
        Preset::Retrofit => Some((BOILER_ONLY, RetrofitScenario::Retrofit)),
        Preset::AdvRetr => Some((BOILER_ONLY, RetrofitScenario::AdvRetr)),
        Preset::S1 => Some((CHP, RetrofitScenario::Standard)),
    }
}

/// Fix the purchase and retrofit decisions of a preset.
///
/// The decisions are added as equality rows in a group named after the preset, so that an
/// infeasible preset shows up in the diagnosis.
pub fn add_preset_constraints(problem: &mut MilpProblem, vars: &Variables, preset: Preset) {
    let Some((devices, scenario)) = preset_design(preset) else {
        return;
    };

    let group = preset.to_string();
    for &(dev, value) in devices {
        problem.add_eq(&group, vars.x(dev), value);
    }
    for component in Component::iter() {
        problem.add_eq(&group, vars.x_restruc(component, scenario), 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::ClusteredData;
    use crate::fixture::{clustered, model};
    use crate::model::Model;
    use crate::optimisation::context::Context;
    use rstest::rstest;

    #[rstest]
    #[case(Preset::Free, 0)]
    #[case(Preset::Benchmark, 14)]
    #[case(Preset::Retrofit, 14)]
    #[case(Preset::AdvRetr, 14)]
    #[case(Preset::S1, 12)]
    fn test_preset_rows(
        model: Model,
        clustered: ClusteredData,
        #[case] preset: Preset,
        #[case] rows: usize,
    ) {
        let ctx = Context::new(&model, &clustered).unwrap();
        let mut problem = MilpProblem::default();
        let vars = Variables::new(&mut problem, &ctx);
        add_preset_constraints(&mut problem, &vars, preset);

        let counts = problem.group_counts();
        assert_eq!(counts.get(preset.to_string().as_str()).copied().unwrap_or(0), rows);
    }
}
