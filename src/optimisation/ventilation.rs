//! Ventilation heat losses in the simple and the detailed mode.
use super::context::Context;
use super::variables::Variables;
use crate::building::{Component, RetrofitScenario};
use crate::device::Device;
use crate::error::ModelError;
use crate::model::VentilationMode;
use crate::solver::{LinExpr, MilpProblem, Var};
use crate::ventilation::{ScenarioFlags, simple_ventilation_loss};
use strum::IntoEnumIterator;

/// Add the ventilation losses for the configured mode
pub fn add_ventilation_constraints(
    problem: &mut MilpProblem,
    ctx: &Context,
    vars: &Variables,
) -> Result<(), ModelError> {
    match ctx.options().ventilation {
        VentilationMode::Simple => {
            add_simple_ventilation(problem, ctx, vars);
            Ok(())
        }
        VentilationMode::Detailed => add_detailed_ventilation(problem, ctx, vars),
    }
}

/// A constant air exchange; infiltration is not modelled separately
fn add_simple_ventilation(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let loss = simple_ventilation_loss(ctx.building().volume().value());
    let env = &vars.envelope;
    for (d, t) in ctx.time_steps() {
        problem.add_eq("ventilation", env.q_vent[d][t], loss);
        problem.fix(env.q_inf[d][t], 0.0);
        problem.fix(env.n_total[d][t], 0.0);
    }
}

/// `Σ_s flag[s]·x[component, s]`
fn allowed_by_scenario(vars: &Variables, component: Component, flags: ScenarioFlags) -> LinExpr {
    RetrofitScenario::iter()
        .filter(|&s| flags.get(s))
        .map(|s| vars.x_restruc(component, s))
        .sum()
}

/// Window opening driven by the weather plus infiltration through the envelope.
///
/// The infiltration class follows from the window and roof scenarios and whether a ventilation
/// unit is installed.
fn add_detailed_ventilation(
    problem: &mut MilpProblem,
    ctx: &Context,
    vars: &Variables,
) -> Result<(), ModelError> {
    let group = "ventilation";
    let (Some(data), Some(window_air_flow)) = (&ctx.model.ventilation, &ctx.window_air_flow)
    else {
        return Err(ModelError::construction(
            "Detailed ventilation requires ventilation data",
        ));
    };
    let env = &vars.envelope;
    let x_vent = vars.x(Device::Vent);

    problem.add_eq(group, env.b_n50.values().sum::<LinExpr>(), 1.0);
    for (name, class) in &data.classes {
        let b: Var = env.b_n50[name.as_str()];
        problem.add_le(group, b, allowed_by_scenario(vars, Component::Window, class.window));
        problem.add_le(group, b, allowed_by_scenario(vars, Component::Rooftop, class.rooftop));
        if class.vent {
            problem.add_le(group, b, x_vent);
        } else {
            problem.add_le(group, b, LinExpr::constant(1.0) - x_vent);
        }
    }

    let params = &data.parameters;
    let unit = &ctx.devices().vent;
    let volume = ctx.building().volume().value();

    // Infiltration air flow (m³/h)
    let infiltration = LinExpr::weighted_sum(
        data.classes
            .iter()
            .map(|(name, class)| (env.b_n50[name.as_str()], params.shielding * volume * class.n50)),
    );

    for (d, t) in ctx.time_steps() {
        let q_win = window_air_flow[d][t];
        let c = params.heat_capacity_air * ctx.delta_t[d][t] / 1000.0;

        // The windows stay closed while the ventilation unit runs
        let windows = LinExpr::constant(q_win) - q_win * x_vent;
        problem.add_eq(
            group,
            env.q_vent[d][t],
            c * (windows.clone()
                + unit.air_flow * (1.0 - unit.heat_recovery) * x_vent
                + infiltration.clone()),
        );
        problem.add_eq(group, env.q_inf[d][t], c * infiltration.clone());
        problem.add_eq(
            group,
            volume * env.n_total[d][t],
            windows + unit.air_flow * x_vent + infiltration.clone(),
        );
    }

    Ok(())
}
