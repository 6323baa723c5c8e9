//! The two CHP programs: the KWKG surcharge on CHP electricity and the BAFA mini-CHP grant.
use super::{program_binary, program_variable};
use crate::device::Device;
use crate::optimisation::context::Context;
use crate::optimisation::variables::Variables;
use crate::solver::{LinExpr, MilpProblem, linearise_product};

/// Upper bound of the annual KWKG payment (EUR)
const KWKG_PAYMENT_BOUND: f64 = 40_000.0;

/// Lower bound of the electrical capacity bound in the KWKG linearisation (kW)
const KWKG_CAPACITY_BOUND: f64 = 50.0;

/// Electrical capacity limits of the BAFA size classes (kW)
const MICRO_LIMIT: f64 = 1.0;
const MINI_LIMIT: f64 = 20.0;

/// Widths of the BAFA power steps above the first kW (kW)
const POWER_STEP_WIDTHS: [f64; 3] = [3.0, 6.0, 10.0];

/// Add the CHP subsidy programs; the CHP subsidy is the sum of both
pub fn add_chp_programs(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    add_output_totals(problem, ctx, vars);
    add_kwkg(problem, ctx, vars);
    add_bafa_grant(problem, ctx, vars);

    let sub_chp = &vars.subsidies.sub_chp;
    problem.add_eq(
        "chp_subsidy",
        vars.subsidy(Device::Chp),
        sub_chp.values().sum::<LinExpr>(),
    );
}

/// Annual CHP electricity, split into self-used and sold energy.
///
/// Electricity supplied to the heat pump meter counts as self-used.
fn add_output_totals(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let group = "chp_output";
    let el = &vars.electricity;
    let totals = &vars.subsidies.p_chp_total;
    let used = ctx.annual(&el.p_use[&Device::Chp]) + ctx.annual(&el.p_hp[&Device::Chp]);
    let sold = ctx.annual(&el.p_sell[&Device::Chp]);

    problem.add_eq(group, totals["total"], used.clone() + sold.clone());
    problem.add_eq(group, totals["use"], used);
    problem.add_eq(group, totals["sell"], sold);
}

/// The surcharge is paid for a number of years which depends on the annual full load hours
fn add_kwkg(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let group = "kwkg";
    let subsidies = &vars.subsidies;
    let sub = subsidies.sub_chp["kwkg"];

    if !ctx.options().programs.kwkg {
        problem.add_eq(group, sub, 0.0);
        for var in subsidies
            .b_kwkg
            .iter()
            .chain(&subsidies.lin_kwkg_1)
            .chain(&subsidies.lin_kwkg_2)
        {
            problem.fix(*var, 0.0);
        }
        problem.fix(subsidies.sub_kwkg_temp, 0.0);
        return;
    }

    let params = &ctx.subsidies().kwkg;
    let chp = &ctx.devices().chp;
    let electrical_capacity = chp.sigma * vars.capacity(Device::Chp);
    let capacity_bound = KWKG_CAPACITY_BOUND.max(chp.sigma * chp.cap_max);
    let totals = &subsidies.p_chp_total;

    problem.add_le(group, subsidies.b_kwkg.iter().sum::<LinExpr>(), 1.0);
    problem.add_eq(
        group,
        subsidies.sub_kwkg_temp,
        params.self_use_rate * totals["use"] + params.sell_rate * totals["sell"],
    );

    let mut full_load_limit = LinExpr::default();
    let mut payment = LinExpr::default();
    for (n, class) in params.classes.iter().enumerate() {
        let b = subsidies.b_kwkg[n];
        let (lin_1, lin_2) = (subsidies.lin_kwkg_1[n], subsidies.lin_kwkg_2[n]);
        linearise_product(
            problem,
            group,
            lin_1,
            electrical_capacity.clone(),
            b,
            capacity_bound,
        );
        linearise_product(
            problem,
            group,
            lin_2,
            subsidies.sub_kwkg_temp,
            b,
            KWKG_PAYMENT_BOUND,
        );
        full_load_limit.add_term(lin_1, class.full_load_hours);
        payment.add_term(lin_2, class.present_value_factor);
    }

    problem.add_le(group, totals["total"], full_load_limit);
    problem.add_eq(group, sub, ctx.factors.crf * payment);
}

/// Investment grant for mini-CHP units up to 20 kW_el
fn add_bafa_grant(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let group = "bafa_chp";
    let sub = vars.subsidies.sub_chp["bafa"];

    if !ctx.options().programs.bafa_chp {
        problem.add_eq(group, sub, 0.0);
        return;
    }

    let params = &ctx.subsidies().bafa_chp;
    let chp = &ctx.devices().chp;
    let electrical_capacity = chp.sigma * vars.capacity(Device::Chp);

    let micro = program_binary(problem, "x_chp", "micro");
    let mini = program_binary(problem, "x_chp", "mini");
    let large = program_binary(problem, "x_chp", "large");
    problem.add_eq(group, vars.x(Device::Chp), micro + mini + large);

    let large_limit = MINI_LIMIT.max(chp.sigma * chp.cap_max);
    problem.add_le(
        group,
        electrical_capacity.clone(),
        MICRO_LIMIT * micro + MINI_LIMIT * mini + large_limit * large,
    );

    // The first kW of a mini unit and up to three further steps
    let steps: Vec<_> = (1..=4)
        .map(|i| program_variable(problem, "chp_powerstep", &i.to_string()))
        .collect();
    problem.add_ge(group, electrical_capacity, steps.iter().sum::<LinExpr>());
    problem.add_eq(group, steps[0], MICRO_LIMIT * mini);
    for (&step, width) in steps[1..].iter().zip(POWER_STEP_WIDTHS) {
        problem.add_le(group, step, width * mini);
    }

    let basic = program_variable(problem, "sub_chp", "basic");
    problem.add_le(group, basic, params.basic_max * mini + params.steps[0] * micro);
    let mut stepped = params.steps[0] * (micro + steps[0]);
    for (&step, rate) in steps[1..].iter().zip(&params.steps[1..]) {
        stepped.add_term(step, *rate);
    }
    problem.add_le(group, basic, stepped);

    let mut bonus = 1.0;
    if chp.thermal_efficiency_bonus {
        bonus += params.thermal_efficiency_share;
    }
    if chp.electrical_efficiency_bonus {
        bonus += params.electrical_efficiency_share;
    }
    problem.add_eq(group, sub, ctx.factors.crf * bonus * basic);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::ClusteredData;
    use crate::fixture::{clustered, model};
    use crate::model::Model;
    use rstest::rstest;

    #[rstest]
    fn test_kwkg_off_fixes_classes(mut model: Model, clustered: ClusteredData) {
        model.options.programs.kwkg = false;
        let ctx = Context::new(&model, &clustered).unwrap();
        let mut problem = MilpProblem::default();
        let vars = Variables::new(&mut problem, &ctx);
        add_chp_programs(&mut problem, &ctx, &vars);

        let counts = problem.group_counts();
        assert_eq!(counts["kwkg"], 1);
        assert_eq!(counts["bafa_chp"], 1);
        assert_eq!(counts["chp_output"], 3);
    }
}
