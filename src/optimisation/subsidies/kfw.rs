//! Primary energy demand and the KfW grants for retrofitting the building shell.
//!
//! The primary energy demand follows DIN V 4108-6 in the same static form as for the reference
//! building. Only the transmission losses and the expenditure factor of the heating concept
//! depend on the decisions.
use crate::building::{Component, RetrofitScenario};
use crate::device::Device;
use crate::device::performance::FlowTemperature;
use crate::error::ModelError;
use crate::heating_concept::CONCEPT_DEVICES;
use crate::optimisation::context::Context;
use crate::optimisation::variables::Variables;
use crate::solver::{LinExpr, MilpProblem, linearise_product};
use crate::subsidy::{BIG_M, KfwTier};
use strum::IntoEnumIterator;

/// Add the primary energy calculation and both KfW programs
pub fn add_kfw_programs(
    problem: &mut MilpProblem,
    ctx: &Context,
    vars: &Variables,
) -> Result<(), ModelError> {
    add_heating_concepts(problem, ctx, vars);
    add_primary_energy(problem, ctx, vars);
    add_individual_measure_requirement(problem, ctx, vars);
    add_individual_measures(problem, ctx, vars)?;
    add_efficiency_buildings(problem, ctx, vars)?;

    Ok(())
}

/// `1 − x` as an expression
fn not(x: impl Into<LinExpr>) -> LinExpr {
    LinExpr::constant(1.0) - x
}

/// Exactly one heating concept, the one matching the installed devices and supply temperature
fn add_heating_concepts(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let group = "heating_concept";
    let env = &vars.envelope;
    let b_tvl35 = vars.devices.b_tvl[&FlowTemperature::Tvl35];

    problem.add_eq(group, env.heating_concept.values().sum::<LinExpr>(), 1.0);
    for (name, concept) in &ctx.model.heating_concepts {
        let mut matches: LinExpr = CONCEPT_DEVICES
            .into_iter()
            .map(|dev| {
                let x = vars.x(dev);
                if concept.includes(dev) {
                    LinExpr::from(x)
                } else {
                    not(x)
                }
            })
            .sum();
        matches += if concept.tvl35 {
            LinExpr::from(b_tvl35)
        } else {
            not(b_tvl35)
        };

        // The concept is forced on if every device and the supply temperature match
        let criteria = (CONCEPT_DEVICES.len() + 1) as f64;
        problem.add_ge(group, env.heating_concept[name], matches - (criteria - 1.0));
    }

    // Device combinations no concept covers
    let x = |dev| vars.x(dev);
    problem.add_le(group, x(Device::Boiler) + x(Device::Eh), 1.0);
    problem.add_le(group, x(Device::Chp) + x(Device::Eh), 1.0);
    problem.add_le(group, x(Device::Chp) + x(Device::Stc), 1.0);
    problem.add_le(group, x(Device::Eh), x(Device::HpAir) + x(Device::HpGeo));
    problem.add_le(
        group,
        x(Device::Pellet) + x(Device::HpGeo) + x(Device::HpAir) + x(Device::Chp),
        1.0,
    );
}

/// `Q_p = (f_ql·Σ ep·H_t·concept + H_v·f_ql + Q_tw − eta·(Q_i + Q_s)·Σ ep·concept) / 1000`
fn add_primary_energy(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let group = "primary_energy";
    let env = &vars.envelope;
    let reference = &ctx.reference;
    let h_t_max = ctx.max_transmission_coefficient();

    let mut transmission = LinExpr::default();
    let mut expenditure = LinExpr::default();
    for (name, concept) in &ctx.model.heating_concepts {
        let b = env.heating_concept[name];
        let lin = env.lin_ht[name];
        linearise_product(problem, group, lin, env.h_t, b, h_t_max);
        transmission.add_term(lin, concept.ep);
        expenditure.add_term(b, concept.ep);
    }

    let q_p = reference.f_ql * transmission
        + reference.h_v * reference.f_ql
        + reference.q_tw
        - reference.eta * (reference.q_i + reference.q_s) * expenditure;
    problem.add_eq(group, env.q_p_din, q_p * 0.001);
}

/// `H_t` per m² of shell
fn specific_transmission(ctx: &Context, vars: &Variables) -> LinExpr {
    (1.0 / ctx.building().shell_area().value()) * vars.envelope.h_t
}

/// Components retrofitted above the reference U-values are only allowed if the whole building
/// meets the reference values
fn add_individual_measure_requirement(
    problem: &mut MilpProblem,
    ctx: &Context,
    vars: &Variables,
) {
    let group = "individual_measure_requirement";
    let building = ctx.building();
    let reference = &ctx.reference;
    let b_ind_mea = vars.envelope.b_ind_mea;

    for component in Component::iter() {
        let data = building.components.get(component);
        let u_ref = reference.u_values.get(component);
        for scenario in RetrofitScenario::retrofits() {
            let u_value = data.scenario(scenario).u_value;
            problem.add_le(
                group,
                vars.x_restruc(component, scenario),
                b_ind_mea + u_ref / u_value,
            );
        }
    }

    problem.add_le(
        group,
        specific_transmission(ctx, vars),
        BIG_M * not(b_ind_mea) + reference.h_t_spec,
    );
    problem.add_le(
        group,
        vars.envelope.q_p_din,
        BIG_M * not(b_ind_mea) + reference.q_p,
    );
}

/// A fixed grant per retrofitted component which meets the program's U-value
fn add_individual_measures(
    problem: &mut MilpProblem,
    ctx: &Context,
    vars: &Variables,
) -> Result<(), ModelError> {
    let group = "kfw_individual_measures";
    let building = ctx.building();
    let params = &ctx.subsidies().kfw_individual;
    let enabled = ctx.options().programs.kfw_individual_measures;

    for component in Component::iter() {
        let b = vars.envelope.b_sub_component[&component];
        let subsidy = vars.subsidy(component);
        let data = building.components.get(component);

        let u_value = LinExpr::weighted_sum(RetrofitScenario::iter().map(|s| {
            (vars.x_restruc(component, s), data.scenario(s).u_value)
        }));
        problem.add_le(
            group,
            u_value,
            BIG_M * not(b) + params.u_value.get(component),
        );

        if !enabled {
            problem.add_eq(group, subsidy, 0.0);
            problem.fix(b, 0.0);
            continue;
        }

        let rval = ctx.residual_value(data.lifetime)?;
        let grant = ctx.factors.crf * (1.0 - rval) * params.grant * (1.0 - ctx.mfh);
        problem.add_le(group, subsidy, grant * b);
        problem.add_le(group, subsidy, params.share_max * vars.c_inv(component));
    }

    Ok(())
}

/// A grant for reaching an efficiency building tier, exclusive with individual measures
fn add_efficiency_buildings(
    problem: &mut MilpProblem,
    ctx: &Context,
    vars: &Variables,
) -> Result<(), ModelError> {
    let group = "kfw_efficiency_buildings";
    let env = &vars.envelope;
    let reference = &ctx.reference;
    let subsidies = ctx.subsidies();

    for tier in KfwTier::iter() {
        let params = subsidies.kfw_tier(tier);
        let b = env.b_sub_tier[&tier];
        problem.add_le(
            group,
            specific_transmission(ctx, vars),
            BIG_M * not(b) + params.factor_h * reference.h_t_spec,
        );
        problem.add_le(
            group,
            env.q_p_din,
            BIG_M * not(b) + params.factor_q * reference.q_p,
        );
    }

    let tiers: LinExpr = env.b_sub_tier.values().sum();
    problem.add_le(group, tiers.clone(), 1.0);
    for &b in env.b_sub_component.values() {
        problem.add_le(group, tiers.clone() + b, 1.0);
    }

    let enabled = ctx.options().programs.kfw_efficiency_buildings;
    let window_lifetime = ctx.building().components.get(Component::Window).lifetime;
    let rval = ctx.residual_value(window_lifetime)?;
    let shell_investment: LinExpr = Component::iter().map(|c| vars.c_inv(c)).sum();

    for tier in KfwTier::iter() {
        let subsidy = vars.subsidy(tier);
        if !enabled {
            problem.add_eq(group, subsidy, 0.0);
            continue;
        }

        let params = subsidies.kfw_tier(tier);
        let grant = ctx.factors.crf * (1.0 - rval) * params.grant * (1.0 - ctx.mfh);
        problem.add_le(group, subsidy, grant * env.b_sub_tier[&tier]);
        problem.add_le(group, subsidy, params.share_max * shell_investment.clone());
    }

    Ok(())
}
