//! Feed-in tariff for PV and the KfW grant for batteries combined with PV.
use super::{program_binary, program_variable};
use crate::device::Device;
use crate::optimisation::context::Context;
use crate::optimisation::variables::Variables;
use crate::solver::{LinExpr, MilpProblem, linearise_product};
use crate::subsidy::BIG_M;

/// Share of the rated PV power which may be fed in when a program reduces the feed-in
const EEG_REDUCTION: f64 = 0.3;
const KFW_REDUCTION: f64 = 0.5;

/// Add the EEG, KfW battery and feed-in limit constraints
pub fn add_pv_programs(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    add_feed_in_tariff(problem, ctx, vars);
    add_battery_grant(problem, ctx, vars);
    add_feed_in_limits(problem, ctx, vars);
}

/// Installed peak power of the PV modules (kWp)
fn pv_power(ctx: &Context, vars: &Variables) -> LinExpr {
    ctx.devices().pv.specific_peak_power() * vars.capacity(Device::Pv)
}

/// Fed-in electricity is either paid at the EEG tariffs or sold at the exchange price
fn add_feed_in_tariff(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let group = "eeg";
    let factors = ctx.factors;
    let sold = ctx.annual(&vars.electricity.p_sell[&Device::Pv]);
    let subsidy = vars.subsidy(Device::Pv);
    let revenue = vars.costs.revenue[Device::Pv.to_string().as_str()];
    let b_eeg = vars.subsidies.b_pv_power["eeg"];

    if !ctx.options().programs.eeg {
        problem.add_eq(group, subsidy, 0.0);
        problem.add_eq(
            group,
            revenue,
            factors.b_eex * factors.crf * ctx.economics().price_sell_el * sold,
        );
        problem.fix(b_eeg, 0.0);
        return;
    }

    let eeg = &ctx.subsidies().eeg;
    let x_pv = vars.x(Device::Pv);

    // The feed-in never exceeds the peak power of the largest possible array
    let max_feed_in = ctx.a_max * ctx.devices().pv.specific_peak_power() * ctx.hours_per_year();

    let mut steps = LinExpr::default();
    let mut peak_power = LinExpr::default();
    let mut step_feed_in = LinExpr::default();
    let mut payment = LinExpr::default();
    for step in &eeg.steps {
        let name = step.peak_power.to_string();
        let b = program_binary(problem, "b_eeg", &name);
        let feed_in = program_variable(problem, "p_sell_pv", &name);

        steps.add_term(b, 1.0);
        peak_power.add_term(b, step.peak_power);
        step_feed_in.add_term(feed_in, 1.0);
        payment.add_term(feed_in, step.tariff);
        problem.add_le(group, feed_in, max_feed_in * b);
    }

    // The size class follows from the installed peak power
    problem.add_le(group, pv_power(ctx, vars), peak_power);
    problem.add_le(group, steps, x_pv);
    problem.add_eq(group, step_feed_in, sold);

    let price_factor = factors.crf * eeg.price_factor;
    problem.add_eq(group, subsidy, price_factor * payment);

    let max_tariff = eeg
        .steps
        .iter()
        .map(|step| step.tariff)
        .fold(0.0, f64::max);
    problem.add_le(group, subsidy, price_factor * max_feed_in * max_tariff * b_eeg);
    problem.add_le(group, b_eeg, x_pv);

    // The tariff replaces the market revenue
    problem.add_eq(group, revenue, 0.0);
}

/// Grant for a battery installed together with PV.
///
/// Claiming the grant reduces the PV feed-in limit.
fn add_battery_grant(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let group = "kfw_battery";
    let subsidy = vars.subsidy(Device::Bat);
    let b_kfw = vars.subsidies.b_pv_power["kfw"];

    if !ctx.options().programs.kfw_battery {
        problem.add_eq(group, subsidy, 0.0);
        problem.fix(b_kfw, 0.0);
        return;
    }

    let params = &ctx.subsidies().kfw_battery;
    let share = ctx.factors.crf * params.share_max;
    let pv_power = pv_power(ctx, vars);

    problem.add_le(group, subsidy, share * params.sub_bat_max * pv_power.clone());
    problem.add_le(
        group,
        subsidy,
        vars.c_inv(Device::Pv) + vars.c_inv(Device::Bat) - share * params.sub_bat * pv_power
            + BIG_M * (LinExpr::constant(1.0) - b_kfw),
    );
    problem.add_le(group, subsidy, BIG_M * b_kfw);
    problem.add_le(group, b_kfw, vars.x(Device::Bat));
}

/// PV and battery may feed in at most 70% of the rated PV power under the EEG and 50% under the
/// KfW battery program
fn add_feed_in_limits(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let group = "feed_in_limit";
    let pv = &ctx.devices().pv;
    let cap = vars.capacity(Device::Pv);
    let subsidies = &vars.subsidies;

    for (program, &lin) in &subsidies.lin_pv_power {
        let b = subsidies.b_pv_power[program];
        linearise_product(problem, group, lin, cap, b, ctx.a_max);
        problem.add_ge(group, lin, pv.area_min * b);
    }

    let spp = pv.specific_peak_power();
    let limits = [
        (EEG_REDUCTION, subsidies.lin_pv_power["eeg"]),
        (KFW_REDUCTION, subsidies.lin_pv_power["kfw"]),
    ];
    for (d, t) in ctx.time_steps() {
        let fed_in = vars.electricity.p_sell[&Device::Pv][d][t]
            + vars.electricity.p_sell[&Device::Bat][d][t];
        for (reduction, lin) in limits {
            problem.add_le(group, fed_in.clone(), spp * (cap - reduction * lin));
        }
    }
}
