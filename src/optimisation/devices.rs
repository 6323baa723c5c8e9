//! Operating envelopes of the heaters, heat pumps and solar devices.
use super::context::Context;
use super::variables::Variables;
use crate::device::performance::{FlowTemperature, HeatPumpCop};
use crate::device::{Device, HeatPumpParams};
use crate::solver::{LinExpr, MilpProblem, linearise_product};
use strum::IntoEnumIterator;

/// Share of the PV output left after the inverter
const INVERTER_EFFICIENCY: f64 = 0.97;

/// Add the constraints of all devices except the storages
pub fn add_device_constraints(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    add_heater_capacity_constraints(problem, ctx, vars);
    add_conversion_constraints(problem, ctx, vars);
    add_heat_pump_constraints(problem, ctx, vars);
    add_solar_constraints(problem, ctx, vars);
    add_ventilation_unit_constraints(problem, ctx, vars);
    add_design_heat_load_constraints(problem, ctx, vars);
}

/// Couple capacity, hourly activation and nominal output of the heaters.
///
/// While a heater is active, its nominal output equals its capacity. Otherwise the nominal output
/// is zero and the capacity is only bounded by the purchase decision.
fn add_heater_capacity_constraints(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let group = "heater_capacity";
    let devices = ctx.devices();
    let num_steps = (ctx.days * ctx.steps) as f64;

    for dev in Device::HEATERS {
        let Some(limits) = devices.heater_limits(dev) else {
            continue;
        };
        let x = vars.x(dev);
        let cap = vars.capacity(dev);
        let y = &vars.devices.y[&dev];
        let heat_nom = &vars.devices.heat_nom[&dev];

        problem.add_le(group, limits.cap_min * x, cap);
        problem.add_le(group, cap, limits.cap_max * x);
        problem.add_le(group, y.iter().flatten().sum::<LinExpr>(), num_steps * x);

        for (d, t) in ctx.time_steps() {
            let (y, heat_nom) = (y[d][t], heat_nom[d][t]);
            problem.add_le(group, limits.cap_min * y, heat_nom);
            problem.add_le(group, heat_nom, limits.cap_max * y);
            problem.add_le(group, cap, heat_nom + limits.cap_max * (x - y));
            problem.add_ge(group, cap, heat_nom + limits.cap_min * (x - y));

            // Heat pumps modulate their power input instead
            if !dev.is_heat_pump() {
                let heat = vars.devices.heat[&dev][d][t];
                problem.add_le(group, limits.mod_lvl * heat_nom, heat);
                problem.add_le(group, heat, heat_nom);
            }
        }
    }
}

/// Convert between fuel, heat and power
fn add_conversion_constraints(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let group = "device_conversion";
    let devices = ctx.devices();
    let heat = &vars.devices.heat;
    let power = &vars.devices.power;
    let energy = &vars.devices.energy;

    for (d, t) in ctx.time_steps() {
        for (dev, eta) in [
            (Device::Boiler, devices.boiler.eta),
            (Device::Pellet, devices.pellet.heater.eta),
        ] {
            problem.add_eq(group, heat[&dev][d][t], eta * energy[&dev][d][t]);
        }

        let chp = &devices.chp;
        let (chp_heat, chp_power) = (heat[&Device::Chp][d][t], power[&Device::Chp][d][t]);
        problem.add_eq(group, chp_power, chp.sigma * chp_heat);
        problem.add_eq(
            group,
            chp.omega * energy[&Device::Chp][d][t],
            chp_heat + chp_power,
        );

        problem.add_eq(
            group,
            heat[&Device::Eh][d][t],
            devices.eh.eta * power[&Device::Eh][d][t],
        );
    }
}

/// Heat pump power from the COP at the building's supply temperature.
///
/// The supply temperature is a global choice, so the heat output is split into one share per
/// temperature which is non-zero only for the chosen one.
fn add_heat_pump_constraints(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let group = "heat_pump";
    let b_tvl = &vars.devices.b_tvl;

    problem.add_eq(group, b_tvl.values().sum::<LinExpr>(), 1.0);
    problem.add_eq(group, b_tvl[&FlowTemperature::Tvl35], 1.0 - ctx.alpha);

    for dev in Device::HEAT_PUMPS {
        let hp = ctx.devices().heat_pump(dev);
        let cop = ctx.performance.cop(dev);
        let lin_tvl = &vars.devices.lin_tvl[&dev];
        let big_m = max_heat_output(hp, cop);

        for (d, t) in ctx.time_steps() {
            let heat = vars.devices.heat[&dev][d][t];
            let power = vars.devices.power[&dev][d][t];
            let power_nom = vars.devices.power_nom[&dev][d][t];

            problem.add_eq(group, vars.devices.heat_nom[&dev][d][t], hp.cop_a2w35 * power_nom);
            problem.add_le(group, hp.mod_lvl * power_nom, power);
            problem.add_le(group, power, power_nom);

            let mut input = LinExpr::default();
            for flow in FlowTemperature::iter() {
                let lin = lin_tvl[&flow][d][t];
                linearise_product(problem, group, lin, heat, b_tvl[&flow], big_m);
                input.add_term(lin, 1.0 / cop.get(flow)[d][t]);
            }
            problem.add_eq(group, power, input);
        }
    }
}

/// Upper bound on the heat output of a heat pump in any time step.
///
/// `heat = power·cop ≤ power_nom·cop = heat_nom·cop/cop_a2w35`, so the output exceeds `cap_max`
/// whenever the COP beats the rated A2/W35 value.
fn max_heat_output(hp: &HeatPumpParams, cop: &HeatPumpCop) -> f64 {
    let best_cop = FlowTemperature::iter()
        .flat_map(|flow| cop.get(flow).iter().flatten().copied())
        .fold(hp.cop_a2w35, f64::max);
    hp.cap_max * best_cop / hp.cop_a2w35
}

/// Roof area and irradiation limits of PV and STC
fn add_solar_constraints(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let group = "solar";
    let devices = ctx.devices();
    let a_max = ctx.a_max;

    for (dev, area_min) in [
        (Device::Pv, devices.pv.area_min),
        (Device::Stc, devices.stc.area_min),
    ] {
        let x = vars.x(dev);
        problem.add_le(group, area_min * x, vars.capacity(dev));
        problem.add_le(group, vars.capacity(dev), a_max * x);
    }
    problem.add_le(
        group,
        vars.capacity(Device::Pv) + vars.capacity(Device::Stc),
        a_max,
    );

    let x_stc = vars.x(Device::Stc);
    for (d, t) in ctx.time_steps() {
        let irradiation = ctx.solar_roof[d][t];

        let pv_yield = ctx.performance.eta_pv[d][t] * INVERTER_EFFICIENCY * irradiation;
        problem.add_le(
            group,
            vars.devices.power[&Device::Pv][d][t],
            pv_yield * vars.capacity(Device::Pv),
        );

        let stc_yield = ctx.performance.eta_stc[d][t] * irradiation;
        let heat = vars.devices.heat[&Device::Stc][d][t];
        let y = vars.devices.y[&Device::Stc][d][t];
        problem.add_le(group, heat, stc_yield * vars.capacity(Device::Stc));
        problem.add_le(group, heat, a_max * stc_yield * y);
        problem.add_le(group, y, x_stc);
    }
}

/// The ventilation unit is sized by its fixed air flow
fn add_ventilation_unit_constraints(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    problem.add_eq(
        "ventilation_unit",
        vars.capacity(Device::Vent),
        ctx.devices().vent.air_flow * vars.x(Device::Vent),
    );
}

/// The heaters must cover the design heat load following DIN EN 12831
fn add_design_heat_load_constraints(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let group = "design_heat_load";
    let dsh = vars.devices.dsh;
    let options = ctx.options();
    if !options.design_heat_load {
        problem.add_eq(group, dsh, 0.0);
        return;
    }

    let building = ctx.building();
    let factor = (options.inside_temperature - options.design_temperature) / 1000.0;
    let ventilation = 0.5 * 0.34 * building.volume_factor * building.area;
    problem.add_eq(group, dsh, factor * (vars.envelope.h_t + ventilation));

    let mut supply: LinExpr = [Device::Boiler, Device::Chp, Device::Eh]
        .into_iter()
        .map(|dev| vars.capacity(dev))
        .sum();
    for dev in Device::HEAT_PUMPS {
        supply.add_term(vars.capacity(dev), ctx.devices().heat_pump(dev).cop_a2w55);
    }
    problem.add_le(group, dsh, supply);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::ClusteredData;
    use crate::fixture::{clustered, model};
    use crate::model::Model;
    use rstest::rstest;

    #[rstest]
    fn test_max_heat_output(model: Model, clustered: ClusteredData) {
        let ctx = Context::new(&model, &clustered).unwrap();
        for dev in Device::HEAT_PUMPS {
            let hp = ctx.devices().heat_pump(dev);
            let cop = ctx.performance.cop(dev);
            let big_m = max_heat_output(hp, cop);
            assert!(big_m >= hp.cap_max);
            for flow in FlowTemperature::iter() {
                for (d, t) in ctx.time_steps() {
                    let heat = hp.cap_max * cop.get(flow)[d][t] / hp.cop_a2w35;
                    assert!(heat <= big_m + 1e-9, "{dev} {flow} ({d}, {t})");
                }
            }
        }

        // Air is warmer than 2 °C on the mild day, so the rated capacity can be exceeded
        let hp = ctx.devices().heat_pump(Device::HpAir);
        assert!(max_heat_output(hp, ctx.performance.cop(Device::HpAir)) > hp.cap_max);
    }
}
