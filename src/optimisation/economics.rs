//! Annualised costs, tariff choice and emissions.
//!
//! All costs are annuities over the observation period (VDI 2067): investments are multiplied by
//! the capital recovery factor less the residual value, running costs additionally by the
//! price-dynamic cash value factor of the respective price.
use super::context::Context;
use super::variables::{Carrier, GridConnection, TariffVars, Variables};
use crate::building::{Component, RetrofitScenario};
use crate::device::Device;
use crate::error::ModelError;
use crate::solver::{LinExpr, MilpProblem};
use crate::tariff::TariffMap;
use indexmap::IndexMap;
use strum::IntoEnumIterator;

/// Tier limits are given in MWh
const TIER_UNIT: f64 = 0.001;

/// Add the cost, tariff and emission constraints
pub fn add_economic_constraints(
    problem: &mut MilpProblem,
    ctx: &Context,
    vars: &Variables,
) -> Result<(), ModelError> {
    add_total_cost(problem, vars);
    add_device_costs(problem, ctx, vars)?;
    add_component_costs(problem, ctx, vars)?;
    add_gas_tariffs(problem, ctx, vars);
    add_electricity_tariffs(problem, ctx, vars);
    add_pellet_costs(problem, ctx, vars);
    add_chp_revenue(problem, ctx, vars);
    add_emissions(problem, ctx, vars);

    Ok(())
}

/// `c_total = Σc_inv + Σc_om + Σc_dem + Σc_fix − Σrevenue − Σsubsidy`
fn add_total_cost(problem: &mut MilpProblem, vars: &Variables) {
    let costs = &vars.costs;
    let sum = |map: &IndexMap<String, _>| map.values().sum::<LinExpr>();
    let total = sum(&costs.c_inv) + sum(&costs.c_om) + sum(&costs.c_dem) + sum(&costs.c_fix)
        - sum(&costs.revenue)
        - sum(&costs.subsidy);
    problem.add_eq("total_cost", costs.c_total, total);
}

/// Investment and O&M of every device
fn add_device_costs(
    problem: &mut MilpProblem,
    ctx: &Context,
    vars: &Variables,
) -> Result<(), ModelError> {
    let group = "device_costs";
    let factors = ctx.factors;
    let multi_family = ctx.options().multi_family;

    for dev in Device::iter() {
        let costs = ctx.devices().costs(dev);
        let rval = ctx.residual_value(costs.lifetime)?;
        let (x, cap) = (vars.x(dev), vars.capacity(dev));

        let investment = (costs.c_inv_fix + costs.installation(multi_family)) * x
            + costs.c_inv_var * cap;
        problem.add_eq(
            group,
            vars.c_inv(dev),
            factors.crf * (1.0 - rval) * investment,
        );

        let base = costs.c_inv_fix * x + costs.c_inv_var * cap;
        problem.add_eq(
            group,
            vars.costs.c_om[dev.to_string().as_str()],
            factors.b_infl * factors.crf * costs.c_om_rel * base,
        );
    }

    Ok(())
}

/// Investment in the building shell; keeping a component in its existing state is free
fn add_component_costs(
    problem: &mut MilpProblem,
    ctx: &Context,
    vars: &Variables,
) -> Result<(), ModelError> {
    let building = ctx.building();
    for component in Component::iter() {
        let data = building.components.get(component);
        let rval = ctx.residual_value(data.lifetime)?;
        let factor = building.component_area(component).value() * ctx.factors.crf * (1.0 - rval);
        let investment = LinExpr::weighted_sum(RetrofitScenario::retrofits().map(|s| {
            (
                vars.x_restruc(component, s),
                factor * data.specific_cost(component, s),
            )
        }));
        problem.add_eq("component_costs", vars.c_inv(component), investment);
    }

    Ok(())
}

/// Tier choice and consumption bookkeeping shared by gas and electricity.
///
/// Returns the cost of the consumption of each consumer before annualisation, using `price`
/// to adjust the tier price for a consumer.
fn add_tariff_tiers<F>(
    problem: &mut MilpProblem,
    group: &str,
    tariffs: &TariffMap,
    tariff_vars: &TariffVars,
    annual_consumption: &IndexMap<&'static str, LinExpr>,
    price: F,
) -> IndexMap<&'static str, LinExpr>
where
    F: Fn(&str, f64) -> f64,
{
    let mut costs: IndexMap<&'static str, LinExpr> = annual_consumption
        .keys()
        .map(|&consumer| (consumer, LinExpr::default()))
        .collect();

    for (name, tariff) in tariffs {
        let tiers = &tariff_vars.tiers[name];
        let amounts = &tariff_vars.amounts[name];
        problem.add_eq(
            group,
            tariff_vars.selected[name],
            tiers.iter().sum::<LinExpr>(),
        );

        for (n, (tier, &x)) in tariff.tiers.iter().zip(tiers).enumerate() {
            let consumed: LinExpr = amounts.values().map(|amounts| amounts[n]).sum();
            problem.add_le(group, tier.lower * x, TIER_UNIT * consumed.clone());
            problem.add_le(group, TIER_UNIT * consumed, tier.upper * x);

            for (&consumer, amounts) in amounts {
                costs[consumer].add_term(amounts[n], price(consumer, tier.price));
            }
        }
    }

    for (&consumer, annual) in annual_consumption {
        let total = tariff_vars.totals[consumer];
        let amounts: LinExpr = tariff_vars
            .amounts
            .values()
            .flat_map(|amounts| amounts[consumer].iter())
            .sum();
        problem.add_eq(group, total, amounts);
        problem.add_eq(group, total, annual.clone());
    }

    costs
}

/// A gas tariff is always chosen; boiler and CHP are billed separately because of the energy tax
fn add_gas_tariffs(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let group = "gas_tariff";
    let tariff_vars = &vars.tariffs[&Carrier::Gas];
    let selected: LinExpr = tariff_vars.selected.values().sum();

    problem.add_ge(group, selected.clone(), 1.0);
    for dev in Device::GAS_CONSUMERS {
        problem.add_le(group, vars.x(dev), selected.clone());
    }

    let annual: IndexMap<&'static str, LinExpr> = Device::GAS_CONSUMERS
        .into_iter()
        .map(|dev| (dev.into(), ctx.annual(&vars.devices.energy[&dev])))
        .collect();
    let chp: &str = Device::Chp.into();
    let energy_tax = ctx.economics().energy_tax;
    let costs = add_tariff_tiers(
        problem,
        group,
        &ctx.model.gas_tariffs,
        tariff_vars,
        &annual,
        |consumer, price| {
            if consumer == chp {
                price - energy_tax
            } else {
                price
            }
        },
    );

    let factor = ctx.factors.crf * ctx.factors.b_gas;
    for (consumer, cost) in costs {
        problem.add_eq(group, vars.costs.c_dem[consumer], factor * cost);
    }
    add_fixed_charges(problem, vars, Carrier::Gas, &ctx.model.gas_tariffs);
}

/// One household tariff plus, optionally, a heat pump tariff on a separate meter
fn add_electricity_tariffs(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let group = "electricity_tariff";
    let tariffs = &ctx.model.electricity_tariffs;
    let tariff_vars = &vars.tariffs[&Carrier::El];

    let selected = |heat_pump: bool| -> LinExpr {
        tariffs
            .iter()
            .filter(|(_, tariff)| tariff.heat_pump == heat_pump)
            .map(|(name, _)| tariff_vars.selected[name])
            .sum()
    };
    problem.add_eq(group, selected(false), 1.0);
    if ctx.options().hp_tariff {
        problem.add_le(
            group,
            selected(true),
            vars.x(Device::HpAir) + vars.x(Device::HpGeo),
        );
    } else {
        problem.add_le(group, selected(true), 0.0);
    }

    // The household meter cannot be billed under a heat pump tariff
    let household: &str = GridConnection::GridHou.into();
    for (name, tariff) in tariffs {
        if tariff.heat_pump {
            for &amount in &tariff_vars.amounts[name][household] {
                problem.add_eq(group, amount, 0.0);
            }
        }
    }

    let annual: IndexMap<&'static str, LinExpr> = GridConnection::iter()
        .map(|grid| (grid.into(), ctx.annual(&vars.electricity.p_grid[&grid])))
        .collect();
    let costs = add_tariff_tiers(problem, group, tariffs, tariff_vars, &annual, |_, price| {
        price
    });

    let factor = ctx.factors.crf * ctx.factors.b_el;
    for (consumer, cost) in costs {
        problem.add_eq(group, vars.costs.c_dem[consumer], factor * cost);
    }
    add_fixed_charges(problem, vars, Carrier::El, tariffs);
}

/// Fixed charges of the chosen tariff tiers
fn add_fixed_charges(
    problem: &mut MilpProblem,
    vars: &Variables,
    carrier: Carrier,
    tariffs: &TariffMap,
) {
    let tariff_vars = &vars.tariffs[&carrier];
    let fixed = LinExpr::weighted_sum(tariffs.iter().flat_map(|(name, tariff)| {
        tariff_vars.tiers[name]
            .iter()
            .zip(&tariff.tiers)
            .map(|(&x, tier)| (x, tier.fixed))
    }));
    problem.add_eq(
        "fixed_charges",
        vars.costs.c_fix[carrier.to_string().as_str()],
        fixed,
    );
}

/// Pellets are bought at a single price
fn add_pellet_costs(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let factors = ctx.factors;
    let energy = ctx.annual(&vars.devices.energy[&Device::Pellet]);
    problem.add_eq(
        "pellet_costs",
        vars.costs.c_dem[Device::Pellet.to_string().as_str()],
        factors.crf * factors.b_pellet * ctx.economics().pellet_price * energy,
    );
}

/// Electricity sold by the CHP is paid at the exchange price
fn add_chp_revenue(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let factors = ctx.factors;
    let sold = ctx.annual(&vars.electricity.p_sell[&Device::Chp]);
    problem.add_eq(
        "revenue",
        vars.costs.revenue[Device::Chp.to_string().as_str()],
        factors.b_eex * factors.crf * ctx.economics().price_sell_el * sold,
    );
}

/// Annual emissions (kg); electricity fed into the grid is credited
fn add_emissions(problem: &mut MilpProblem, ctx: &Context, vars: &Variables) {
    let economics = ctx.economics();
    let mut emission =
        economics.pellet_emission * ctx.annual(&vars.devices.energy[&Device::Pellet]);

    for (carrier, tariffs) in [
        (Carrier::Gas, &ctx.model.gas_tariffs),
        (Carrier::El, &ctx.model.electricity_tariffs),
    ] {
        let tariff_vars = &vars.tariffs[&carrier];
        for (name, tariff) in tariffs {
            let consumed: LinExpr = tariff_vars.amounts[name].values().flatten().sum();
            emission += tariff.emission * consumed;
        }
    }

    for sold in vars.electricity.p_sell.values() {
        emission -= economics.feed_in_emission * ctx.annual(sold);
    }

    problem.add_eq("emission", vars.costs.emission, emission);
}
