//! Storage sizing and dynamics for the battery and the thermal energy storage.
use super::context::Context;
use super::variables::Variables;
use crate::device::Device;
use crate::solver::{LinExpr, MilpProblem};

/// Efficiencies and losses of a storage device
struct StorageParams {
    eta_ch: f64,
    eta_dch: f64,
    k_loss: f64,
}

/// Add the sizing, state of charge and power constraints of both storages
pub fn add_storage_constraints(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    add_sizing_constraints(problem, ctx, vars);

    let devices = ctx.devices();
    let params = [
        (
            Device::Tes,
            StorageParams {
                eta_ch: devices.tes.eta_ch,
                eta_dch: devices.tes.eta_dch,
                k_loss: devices.tes.k_loss,
            },
        ),
        (
            Device::Bat,
            StorageParams {
                eta_ch: devices.bat.eta,
                eta_dch: devices.bat.eta,
                k_loss: devices.bat.k_loss,
            },
        ),
    ];
    for (dev, params) in &params {
        add_dynamics(problem, ctx, vars, *dev, params);
    }

    add_battery_power_constraints(problem, ctx, vars);
    add_temperature_limit_constraints(problem, ctx, vars);
}

/// Capacity bounds and the usable storage content
fn add_sizing_constraints(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let group = "storage_sizing";
    let devices = ctx.devices();

    // Every building has a hot water tank
    let tes = &devices.tes;
    let x_tes = vars.x(Device::Tes);
    let volume = vars.capacity(Device::Tes);
    problem.add_eq(group, x_tes, 1.0);
    problem.add_le(group, tes.volume_min * x_tes, volume);
    problem.add_le(group, volume, tes.volume_max * x_tes);
    problem.add_eq(
        group,
        vars.storage[&Device::Tes].soc_nom,
        ctx.economics().water_heat_capacity() * tes.dt_max * volume,
    );

    let bat = &devices.bat;
    let x_bat = vars.x(Device::Bat);
    let cap = vars.capacity(Device::Bat);
    problem.add_eq(group, cap, vars.storage[&Device::Bat].soc_nom);
    problem.add_le(group, bat.cap_min * x_bat, cap);
    problem.add_le(group, cap, bat.cap_max * x_bat);
}

/// State of charge balance.
///
/// Representative days which stand for several days must end where they started. If every day
/// stands for itself, the days form a chain instead.
fn add_dynamics(
    problem: &mut MilpProblem,
    ctx: &Context,
    vars: &Variables,
    dev: Device,
    params: &StorageParams,
) {
    let group = "storage_balance";
    let storage = &vars.storage[&dev];
    let last = ctx.steps - 1;

    for d in 0..ctx.days {
        problem.add_ge(group, storage.soc_nom, storage.soc_init[d]);
        if ctx.cyclic_storage {
            problem.add_eq(group, storage.soc_init[d], storage.soc[d][last]);
        }
    }

    for (d, t) in ctx.time_steps() {
        let soc = storage.soc[d][t];
        problem.add_ge(group, storage.soc_nom, soc);

        let previous = if t > 0 {
            storage.soc[d][t - 1]
        } else if ctx.chain_days && d > 0 {
            storage.soc[d - 1][last]
        } else {
            storage.soc_init[d]
        };

        let flows = params.eta_ch * storage.ch[d][t] - storage.dch[d][t] * (1.0 / params.eta_dch);
        problem.add_eq(
            group,
            soc,
            (1.0 - params.k_loss) * previous + ctx.dt * flows,
        );
    }
}

/// Charging and discharging power grow with the battery capacity
fn add_battery_power_constraints(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let group = "battery_power";
    let bat = &ctx.devices().bat;
    let x = vars.x(Device::Bat);
    let cap = vars.capacity(Device::Bat);
    let storage = &vars.storage[&Device::Bat];

    for (d, t) in ctx.time_steps() {
        problem.add_le(group, storage.ch[d][t], bat.p_ch_fix * x + bat.p_ch_var * cap);
        problem.add_le(group, storage.dch[d][t], bat.p_dch_fix * x + bat.p_dch_var * cap);
    }
}

/// Heat pumps and solar collectors can only heat the tank up to their own temperature limit.
///
/// While such a device is active, the tank content is limited to the share of the usable
/// temperature difference the device can reach.
fn add_temperature_limit_constraints(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let group = "storage_temperature";
    let devices = ctx.devices();
    let tes = &devices.tes;
    let storage = &vars.storage[&Device::Tes];

    for dev in [Device::HpAir, Device::HpGeo, Device::Stc] {
        let Some(dt_max) = devices.storage_temperature_limit(dev) else {
            continue;
        };
        let dt_rel = dt_max / tes.dt_max;
        if dt_rel >= 1.0 {
            continue;
        }

        // Largest tank content above the device's limit
        let residual =
            tes.volume_max * tes.dt_max * ctx.economics().water_heat_capacity() * (1.0 - dt_rel);
        let y = &vars.devices.y[&dev];
        for (d, t) in ctx.time_steps() {
            problem.add_le(
                group,
                storage.soc[d][t],
                dt_rel * storage.soc_nom + residual * (LinExpr::constant(1.0) - y[d][t]),
            );
        }
    }
}
