//! Retrofit choice and the heat balance of the building envelope.
use super::context::Context;
use super::variables::Variables;
use crate::building::{Component, RetrofitScenario};
use crate::solver::{LinExpr, MilpProblem};
use strum::IntoEnumIterator;

/// Frame share, shading, non-perpendicular irradiation and sun protection of the windows
/// (DIN V 4108-6)
const SOLAR_GAIN_FACTOR: f64 = 0.9 * 1.0 * 0.7 * 0.85;

/// Add the retrofit choice, heat losses, solar gains and the space heating demand
pub fn add_envelope_constraints(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    add_retrofit_choice(problem, vars);
    add_transmission_losses(problem, ctx, vars);
    add_solar_gains(problem, ctx, vars);
    add_heating_demand(problem, ctx, vars);
}

/// Each component is in exactly one state
fn add_retrofit_choice(problem: &mut MilpProblem, vars: &Variables) {
    for scenarios in vars.envelope.x_restruc.values() {
        problem.add_eq("retrofit_choice", scenarios.values().sum::<LinExpr>(), 1.0);
    }
}

/// The transmission coefficient follows from the chosen U-values
fn add_transmission_losses(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let group = "transmission";
    let building = ctx.building();
    let env = &vars.envelope;

    let mut h_t = LinExpr::constant(building.area * building.thermal_bridge_loss());
    for component in Component::iter() {
        let data = building.components.get(component);
        let factor =
            building.component_area(component).value() * component.temperature_correction();
        for scenario in RetrofitScenario::iter() {
            h_t.add_term(
                vars.x_restruc(component, scenario),
                factor * data.scenario(scenario).u_value,
            );
        }
    }
    problem.add_eq(group, env.h_t, h_t);

    for (d, t) in ctx.time_steps() {
        problem.add_eq(group, env.q_ht[d][t], ctx.delta_t[d][t] / 1000.0 * env.h_t);
    }
}

/// Solar gains through the windows depend on the g-value of the chosen windows
fn add_solar_gains(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let window = ctx.building().components.get(Component::Window);
    let areas = ctx.building().window_areas();
    let g_value = LinExpr::weighted_sum(RetrofitScenario::iter().map(|s| {
        (
            vars.x_restruc(Component::Window, s),
            window.scenario(s).g_value,
        )
    }));

    for (d, t) in ctx.time_steps() {
        let irradiation: f64 = areas
            .iter()
            .zip(ctx.facades)
            .map(|(area, facade)| area.value() * facade[d][t])
            .sum();
        problem.add_eq(
            "solar_gains",
            vars.envelope.q_s[d][t],
            SOLAR_GAIN_FACTOR * irradiation * g_value.clone(),
        );
    }
}

/// Gains may be wasted, but the losses must always be covered
fn add_heating_demand(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let group = "heating_demand";
    let env = &vars.envelope;

    for (d, t) in ctx.time_steps() {
        let losses = env.q_ht[d][t] + env.q_vent[d][t];
        problem.add_ge(
            group,
            env.heat_mod[d][t],
            losses.clone() - env.q_s[d][t] - ctx.int_gains[d][t],
        );
        problem.add_le(group, env.heat_mod[d][t], losses);
    }
}

