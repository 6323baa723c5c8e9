//! Thermal and electrical energy balances.
use super::context::Context;
use super::variables::{EhSplit, GridConnection, HEAT_PRODUCERS, Variables};
use crate::device::Device;
use crate::solver::{LinExpr, MilpProblem};

/// Add the balances for every time step
pub fn add_balance_constraints(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    add_thermal_balance(problem, ctx, vars);
    add_electricity_balances(problem, ctx, vars);
    add_electricity_splits(problem, ctx, vars);
}

/// All heat passes through the hot water tank
fn add_thermal_balance(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let group = "thermal_balance";
    let tes = &vars.storage[&Device::Tes];
    let dhw_electric = ctx.options().dhw_electric;

    for (d, t) in ctx.time_steps() {
        let mut demand = LinExpr::from(vars.envelope.heat_mod[d][t]);
        if !dhw_electric {
            demand += ctx.dhw[d][t];
        }
        problem.add_eq(group, tes.dch[d][t], demand);

        let supply: LinExpr = HEAT_PRODUCERS
            .iter()
            .map(|dev| vars.devices.heat[dev][d][t])
            .sum();
        problem.add_eq(group, tes.ch[d][t], supply);
    }
}

/// The household and the heat pumps are metered separately
fn add_electricity_balances(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let group = "electricity_balance";
    let el = &vars.electricity;
    let fan_power = ctx.devices().vent.fan_power;

    for (d, t) in ctx.time_steps() {
        let mut household = LinExpr::constant(ctx.electricity[d][t])
            + el.eh_split[&EhSplit::WithoutHp][d][t]
            + vars.storage[&Device::Bat].ch[d][t]
            + fan_power * vars.x(Device::Vent);
        if ctx.options().dhw_electric {
            household += ctx.dhw[d][t];
        }
        let own_supply: LinExpr = el.p_use.values().map(|grid| grid[d][t]).sum();
        problem.add_eq(
            group,
            household,
            el.p_grid[&GridConnection::GridHou][d][t] + own_supply,
        );

        let heat_pumps: LinExpr = Device::HEAT_PUMPS
            .iter()
            .map(|dev| vars.devices.power[dev][d][t])
            .sum::<LinExpr>()
            + el.eh_split[&EhSplit::WithHp][d][t];
        let own_supply: LinExpr = el.p_hp.values().map(|grid| grid[d][t]).sum();
        problem.add_eq(
            group,
            heat_pumps,
            el.p_grid[&GridConnection::GridHp][d][t] + own_supply,
        );
    }
}

/// Split the output of each electricity source and the electric heater's input between meters
fn add_electricity_splits(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let group = "electricity_split";
    let el = &vars.electricity;
    let eh_cap_max = ctx.devices().eh.cap_max;
    let x_hp = vars.x(Device::HpAir) + vars.x(Device::HpGeo);

    for (d, t) in ctx.time_steps() {
        for dev in Device::ELECTRICITY_SOURCES {
            let output = match dev {
                Device::Bat => vars.storage[&Device::Bat].dch[d][t],
                _ => vars.devices.power[&dev][d][t],
            };
            problem.add_eq(
                group,
                output,
                el.p_sell[&dev][d][t] + el.p_use[&dev][d][t] + el.p_hp[&dev][d][t],
            );
        }

        let without_hp = el.eh_split[&EhSplit::WithoutHp][d][t];
        let with_hp = el.eh_split[&EhSplit::WithHp][d][t];
        problem.add_eq(group, vars.devices.power[&Device::Eh][d][t], without_hp + with_hp);
        problem.add_le(group, with_hp, eh_cap_max * x_hp.clone());
        problem.add_le(
            group,
            without_hp,
            eh_cap_max * (LinExpr::constant(1.0) - x_hp.clone()),
        );
    }
}
