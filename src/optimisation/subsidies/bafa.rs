//! BAFA grants for renewable heating: solar thermal collectors, heat pumps and pellet boilers.
//!
//! Each grant has a basic and an innovation part, a combination bonus and a building efficiency
//! bonus which is only paid for KfW-55 buildings.
use super::{program_binary, program_variable};
use crate::device::Device;
use crate::optimisation::context::Context;
use crate::optimisation::variables::Variables;
use crate::solver::{LinExpr, MilpProblem, Var, linearise_product};
use crate::subsidy::{BIG_M, KfwTier};

/// Add the BAFA programs for STC, heat pumps and pellet boilers
pub fn add_bafa_programs(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    add_stc_grant(problem, ctx, vars);
    for dev in Device::HEAT_PUMPS {
        add_heat_pump_grant(problem, ctx, vars, dev);
    }
    add_pellet_grant(problem, ctx, vars);
}

/// Mass of water in the TES (kg)
fn storage_mass(ctx: &Context, vars: &Variables) -> LinExpr {
    ctx.economics().rho_w * vars.capacity(Device::Tes)
}

/// Bonus for KfW-55 buildings as a share of the other grants
fn add_efficiency_bonus(
    problem: &mut MilpProblem,
    group: &str,
    vars: &Variables,
    bonus: Var,
    share: f64,
    grants: LinExpr,
) {
    problem.add_le(group, bonus, BIG_M * vars.envelope.b_sub_tier[&KfwTier::Eff55]);
    problem.add_le(group, bonus, share * grants);
}

fn add_stc_grant(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let group = "bafa_stc";
    let subsidy = vars.subsidy(Device::Stc);
    if !ctx.options().programs.bafa_stc {
        problem.add_eq(group, subsidy, 0.0);
        return;
    }

    let params = &ctx.subsidies().bafa_stc;
    let program = "bafa_stc";
    let b_basic_fix = program_binary(problem, program, "b_basic_fix");
    let b_basic_var = program_binary(problem, program, "b_basic_var");
    let b_inno = program_binary(problem, program, "b_inno");
    let b_combi = program_binary(problem, program, "b_add1");
    let sub_basic_fix = program_variable(problem, program, "basic_fix");
    let sub_basic_var = program_variable(problem, program, "basic_var");
    let sub_inno = program_variable(problem, program, "inno");
    let sub_build_eff = program_variable(problem, program, "build_eff");
    let lin_storage = program_variable(problem, program, "lin_storage");

    let cap = vars.capacity(Device::Stc);
    let x_stc = vars.x(Device::Stc);
    let (alpha, mfh) = (ctx.alpha, ctx.mfh);

    // Only one of the basic and innovation grants
    let any = b_basic_fix + b_basic_var + b_inno;
    problem.add_le(group, any.clone(), x_stc);
    problem.add_le(group, any.clone(), vars.x(Device::Tes));

    // Minimum storage per collector area
    linearise_product(problem, group, lin_storage, cap, any.clone(), ctx.a_max);
    problem.add_ge(group, storage_mass(ctx, vars), params.min_storage * lin_storage);

    // Basic grant: existing buildings with a minimum area
    problem.add_ge(group, cap, params.basic_area_min * (b_basic_fix + b_basic_var));
    problem.add_le(group, sub_basic_fix, params.basic_fix * alpha * b_basic_fix);
    problem.add_le(group, sub_basic_var, params.basic_var * cap);
    problem.add_le(
        group,
        sub_basic_var,
        params.basic_var * params.basic_area_max * alpha * b_basic_var,
    );

    // Innovation grant: multi-family buildings with high-yield collectors
    problem.add_le(group, params.annual_gain * b_inno, ctx.devices().stc.annual_gain);
    problem.add_ge(group, cap, params.inno_area_min * b_inno);
    let inno_rate = (params.inno_new + params.inno_existing * alpha) * mfh;
    problem.add_le(group, sub_inno, inno_rate * cap);
    problem.add_le(group, sub_inno, inno_rate * params.inno_area_max * b_inno);

    // Combination with a heat pump
    problem.add_le(group, b_combi, x_stc);
    problem.add_le(group, b_combi, vars.x(Device::HpAir) + vars.x(Device::HpGeo));
    problem.add_le(group, b_combi, any);

    let grants = sub_basic_fix + sub_basic_var + sub_inno;
    add_efficiency_bonus(
        problem,
        group,
        vars,
        sub_build_eff,
        params.build_eff,
        grants.clone(),
    );

    problem.add_eq(
        group,
        subsidy,
        ctx.factors.crf * (grants + params.stc_hp_combi * b_combi + sub_build_eff),
    );
}

/// The grant depends on the seasonal COP the heat pump reaches in the building
fn add_heat_pump_grant(problem: &mut MilpProblem, ctx: &Context, vars: &Variables, dev: Device) {
    let group = "bafa_hp";
    let subsidy = vars.subsidy(dev);
    if !ctx.options().programs.bafa_hp {
        problem.add_eq(group, subsidy, 0.0);
        return;
    }

    let params = ctx.subsidies().bafa_hp(dev);
    let hp = ctx.devices().heat_pump(dev);
    let program = format!("bafa_{dev}");
    let b_basic_fix = program_binary(problem, &program, "b_basic_fix");
    let b_basic_var = program_binary(problem, &program, "b_basic_var");
    let b_inno_fix = program_binary(problem, &program, "b_inno_fix");
    let b_inno_var = program_binary(problem, &program, "b_inno_var");
    let b_smart_grid = program_binary(problem, &program, "b_add1");
    let sub_basic = program_variable(problem, &program, "basic");
    let sub_inno = program_variable(problem, &program, "inno");
    let sub_build_eff = program_variable(problem, &program, "build_eff");
    let lin_basic = program_variable(problem, &program, "lin_basic");
    let lin_inno = program_variable(problem, &program, "lin_inno");
    let lin_storage = program_variable(problem, &program, "lin_storage");

    let cap = vars.capacity(dev);
    let alpha = ctx.alpha;
    let pc = if hp.power_controlled { 1.0 } else { 0.0 };
    let sg = if hp.smart_grid_ready { 1.0 } else { 0.0 };

    let basic = b_basic_fix + b_basic_var;
    let inno = b_inno_fix + b_inno_var;
    problem.add_le(group, basic.clone() + inno.clone(), vars.x(dev));

    // Seasonal COP thresholds on the annual heat and power
    let heat = ctx.annual(&vars.devices.heat[&dev]);
    let power = ctx.annual(&vars.devices.power[&dev]);
    let max_power = ctx.hours_per_year() * hp.cap_max / hp.cop_a2w35;
    for (scop, claimed) in [
        (params.basic_scop, basic.clone()),
        (params.inno_scop, inno.clone()),
    ] {
        problem.add_ge(
            group,
            heat.clone(),
            scop * power.clone() - scop * max_power * (LinExpr::constant(1.0) - claimed),
        );
    }

    // Basic grant
    let basic_fix = params.basic_fix + params.basic_fix_pc * pc;
    problem.add_le(
        group,
        sub_basic,
        basic_fix * b_basic_fix + params.basic_var * lin_basic,
    );
    problem.add_le(
        group,
        sub_basic,
        params.basic_var * params.max_cap * alpha * basic.clone(),
    );
    linearise_product(problem, group, lin_basic, cap, b_basic_var, hp.cap_max);

    // Innovation grant; new buildings receive the basic rates
    let inno_fix = (params.inno_fix + params.inno_fix_pc * pc) * alpha + basic_fix * (1.0 - alpha);
    let inno_var = params.basic_var + params.inno_var * alpha;
    problem.add_le(group, sub_inno, inno_fix * b_inno_fix + inno_var * lin_inno);
    problem.add_le(
        group,
        sub_inno,
        inno_var * params.max_cap * inno.clone(),
    );
    linearise_product(problem, group, lin_inno, cap, b_inno_var, hp.cap_max);

    // Smart grid bonus needs a sufficiently large storage
    problem.add_le(group, b_smart_grid, sg * (basic + inno));
    linearise_product(problem, group, lin_storage, cap, b_smart_grid, hp.cap_max);
    problem.add_ge(group, storage_mass(ctx, vars), params.storage_ratio * lin_storage);

    add_efficiency_bonus(
        problem,
        group,
        vars,
        sub_build_eff,
        params.build_eff,
        sub_basic + sub_inno,
    );

    problem.add_eq(
        group,
        subsidy,
        ctx.factors.crf
            * (sub_basic + sub_inno + params.smart_grid * b_smart_grid + sub_build_eff),
    );
}

fn add_pellet_grant(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let group = "bafa_pellet";
    let subsidy = vars.subsidy(Device::Pellet);
    if !ctx.options().programs.bafa_pellet {
        problem.add_eq(group, subsidy, 0.0);
        return;
    }

    let params = &ctx.subsidies().bafa_pellet;
    let pellet = &ctx.devices().pellet;
    let program = "bafa_pellet";
    let b_basic_fix = program_binary(problem, program, "b_basic_fix");
    let b_basic_storage = program_binary(problem, program, "b_basic_storage");
    let b_basic_var = program_binary(problem, program, "b_basic_var");
    let b_inno_fix = program_binary(problem, program, "b_inno_fix");
    let b_inno_storage = program_binary(problem, program, "b_inno_storage");
    let b_combi = program_binary(problem, program, "b_add1");
    let sub_basic = program_variable(problem, program, "basic");
    let sub_inno = program_variable(problem, program, "inno");
    let sub_build_eff = program_variable(problem, program, "build_eff");
    let lin_basic = program_variable(problem, program, "lin_basic");
    let lin_storage = program_variable(problem, program, "lin_storage");

    let cap = vars.capacity(Device::Pellet);
    let x_pellet = vars.x(Device::Pellet);
    let cap_max = pellet.heater.cap_max;
    let alpha = ctx.alpha;

    let any = b_basic_fix + b_basic_storage + b_basic_var + b_inno_fix + b_inno_storage;
    problem.add_le(group, any.clone(), x_pellet);
    problem.add_ge(group, cap, params.min_cap * any.clone());

    // Storage grants need a minimum storage per kW
    let with_storage = b_basic_storage + b_inno_storage;
    linearise_product(problem, group, lin_storage, cap, with_storage, cap_max);
    problem.add_ge(group, storage_mass(ctx, vars), params.storage_ratio * lin_storage);

    // Basic grant: existing buildings only
    linearise_product(problem, group, lin_basic, cap, b_basic_var, cap_max);
    problem.add_le(
        group,
        sub_basic,
        alpha
            * (params.basic_fix * b_basic_fix
                + params.basic_storage * b_basic_storage
                + params.basic_var * lin_basic),
    );

    // Innovation grant for eligible boilers
    if pellet.innovation_eligible {
        problem.add_le(
            group,
            sub_inno,
            (params.inno_fix_new + params.inno_fix_old * alpha) * b_inno_fix
                + (params.inno_fix_new_storage + params.inno_fix_old_storage * alpha)
                    * b_inno_storage,
        );
    } else {
        problem.add_eq(group, sub_inno, 0.0);
    }

    // Combination with a solar thermal collector
    problem.add_le(group, b_combi, vars.x(Device::Stc));
    problem.add_le(group, b_combi, x_pellet);
    problem.add_le(group, b_combi, any);

    add_efficiency_bonus(
        problem,
        group,
        vars,
        sub_build_eff,
        params.build_eff,
        sub_basic + sub_inno,
    );

    problem.add_eq(
        group,
        subsidy,
        ctx.factors.crf
            * (sub_basic + sub_inno + params.stc_pellet_combi * b_combi + sub_build_eff),
    );
}
