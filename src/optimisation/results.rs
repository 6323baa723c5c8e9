//! Extraction of the solved variables into flat result records.
use super::context::Context;
use super::variables::{Carrier, Grid, Variables};
use crate::device::Device;
use crate::solver::{MilpProblem, Solution, SolveStatus, Var};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Separator between the parts of a composite key
const KEY_SEPARATOR: &str = "/";

/// One value of the solution, as written to `results.csv`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Name of the variable family
    pub record: String,
    /// Index within the family, with parts joined by `/`; empty for scalars
    pub key: String,
    /// Representative day, for time-dependent records
    pub day: Option<usize>,
    /// Time step within the day, for time-dependent records
    pub time_step: Option<usize>,
    #[allow(missing_docs)]
    pub value: f64,
}

/// The solved scenario
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioResult {
    /// Every record in a fixed order
    pub records: Vec<ResultRecord>,
    /// Value of the objective
    pub objective: f64,
    /// Annualised total cost (EUR/a)
    pub total_cost: f64,
    /// Annual emissions (t/a)
    pub emission: f64,
    /// Solve time (s)
    pub runtime: f64,
    /// Relative optimality gap
    pub gap: f64,
    #[allow(missing_docs)]
    pub status: SolveStatus,
    /// Number of rows in each constraint group
    pub constraint_groups: IndexMap<String, usize>,
}

impl ScenarioResult {
    /// Find the value of a record, e.g. `value("x", "boiler")`
    pub fn value(&self, record: &str, key: &str) -> Option<f64> {
        self.records
            .iter()
            .find(|r| r.record == record && r.key == key)
            .map(|r| r.value)
    }

    /// All values of a time-dependent record, in day and time step order
    pub fn series(&self, record: &str, key: &str) -> Vec<f64> {
        self.records
            .iter()
            .filter(|r| r.record == record && r.key == key && r.time_step.is_some())
            .map(|r| r.value)
            .collect()
    }
}

/// Join key parts with `/`
fn join_key<I>(parts: I) -> String
where
    I: IntoIterator,
    I::Item: Display,
{
    parts
        .into_iter()
        .map(|part| part.to_string())
        .collect::<Vec<_>>()
        .join(KEY_SEPARATOR)
}

/// Collects records in output order
struct RecordWriter<'a> {
    solution: &'a Solution,
    records: Vec<ResultRecord>,
}

impl RecordWriter<'_> {
    fn push(
        &mut self,
        record: &str,
        key: String,
        day: Option<usize>,
        step: Option<usize>,
        value: f64,
    ) {
        self.records.push(ResultRecord {
            record: record.to_string(),
            key,
            day,
            time_step: step,
            value,
        });
    }

    fn constant(&mut self, record: &str, key: impl Display, value: f64) {
        self.push(record, key.to_string(), None, None, value);
    }

    fn scalar(&mut self, record: &str, key: impl Display, var: Var) {
        let value = self.solution.value(var);
        self.constant(record, key, value);
    }

    fn scalars<K: Display>(&mut self, record: &str, vars: &IndexMap<K, Var>) {
        for (key, &var) in vars {
            self.scalar(record, key, var);
        }
    }

    fn grid(&mut self, record: &str, key: impl Display, grid: &Grid) {
        let key = key.to_string();
        for (d, day) in grid.iter().enumerate() {
            for (t, &var) in day.iter().enumerate() {
                let value = self.solution.value(var);
                self.push(record, key.clone(), Some(d), Some(t), value);
            }
        }
    }

    fn grids<K: Display>(&mut self, record: &str, grids: &IndexMap<K, Grid>) {
        for (key, grid) in grids {
            self.grid(record, key, grid);
        }
    }
}

/// Turn a solution into result records.
///
/// Emissions are reported in t/a and the transmission coefficient per m² of shell.
pub fn collect_results(
    ctx: &Context,
    problem: &MilpProblem,
    vars: &Variables,
    solution: &Solution,
) -> ScenarioResult {
    let mut w = RecordWriter {
        solution,
        records: Vec::new(),
    };
    let devices = &vars.devices;
    let el = &vars.electricity;
    let env = &vars.envelope;
    let costs = &vars.costs;
    let subsidies = &vars.subsidies;

    // Decisions
    w.scalars("x", &devices.x);
    w.grids("y", &devices.y);
    for (carrier, tariff_vars) in &vars.tariffs {
        for (name, tiers) in &tariff_vars.tiers {
            for (n, &var) in tiers.iter().enumerate() {
                w.scalar(
                    "x_tariff",
                    join_key([carrier.to_string(), name.clone(), n.to_string()]),
                    var,
                );
            }
        }
    }
    w.scalars("x_gas", &vars.tariffs[&Carrier::Gas].selected);
    w.scalars("x_el", &vars.tariffs[&Carrier::El].selected);

    // Operation
    w.grids("power", &devices.power);
    w.grids("heat", &devices.heat);
    w.grids("energy", &devices.energy);

    // Purchases
    w.grids("p_grid", &el.p_grid);
    for (carrier, amounts, totals) in [
        (Carrier::Gas, "G", "G_total"),
        (Carrier::El, "El", "El_total"),
    ]
    .map(|(carrier, amounts, totals)| (&vars.tariffs[&carrier], amounts, totals))
    {
        for (name, consumers) in &carrier.amounts {
            for (consumer, tiers) in consumers {
                for (n, &var) in tiers.iter().enumerate() {
                    w.scalar(
                        amounts,
                        join_key([name.as_str(), *consumer, n.to_string().as_str()]),
                        var,
                    );
                }
            }
        }
        w.scalars(totals, &carrier.totals);
    }

    // Storage
    for (dev, storage) in &vars.storage {
        w.grid("soc", dev, &storage.soc);
    }
    for (dev, storage) in &vars.storage {
        for (d, &var) in storage.soc_init.iter().enumerate() {
            let value = solution.value(var);
            w.push("soc_init", dev.to_string(), Some(d), None, value);
        }
    }
    for (dev, storage) in &vars.storage {
        w.grid("ch", dev, &storage.ch);
    }
    for (dev, storage) in &vars.storage {
        w.grid("dch", dev, &storage.dch);
    }

    w.grids("p_use", &el.p_use);
    w.grids("p_sell", &el.p_sell);
    w.grids("p_hp", &el.p_hp);

    // Economics
    w.scalars("c_inv", &costs.c_inv);
    w.scalars("c_om", &costs.c_om);
    w.scalars("c_dem", &costs.c_dem);
    w.scalars("c_fix", &costs.c_fix);
    w.scalar("c_total", "", costs.c_total);
    w.scalars("rev", &costs.revenue);
    w.scalars("sub", &costs.subsidy);
    let emission = 0.001 * solution.value(costs.emission);
    w.constant("emission", "", emission);

    w.constant("ObjVal", "", solution.objective);
    w.constant("Runtime", "", solution.runtime);
    w.constant("MIPGap", "", solution.gap);

    // Sizing
    for (dev, storage) in &vars.storage {
        w.scalar("soc_nom", dev, storage.soc_nom);
    }
    w.grids("power_nom", &devices.power_nom);
    w.grids("heat_nom", &devices.heat_nom);
    w.scalars("cap", &devices.capacity);

    // Envelope
    w.grid("heat_mod", "", &env.heat_mod);
    w.scalars("b_sub_restruc", &env.b_sub_component);
    w.scalars("b_sub_restruc", &env.b_sub_tier);
    for (component, scenarios) in &env.x_restruc {
        for (scenario, &var) in scenarios {
            w.scalar("x_restruc", join_key([component.to_string(), scenario.to_string()]), var);
        }
    }
    let shell_area = ctx.building().shell_area().value();
    w.constant("Ht", "", solution.value(env.h_t) / shell_area);
    w.grid("Qs", "", &env.q_s);
    w.scalar("Qp_DIN", "", env.q_p_din);
    w.scalars("heating_concept", &env.heating_concept);
    w.scalars("lin_Ht", &env.lin_ht);

    // Subsidy bookkeeping
    w.scalars("sub_chp", &subsidies.sub_chp);
    w.scalars("b_pv_power", &subsidies.b_pv_power);
    w.scalars("lin_pv_power", &subsidies.lin_pv_power);
    w.scalars("p_chp_total", &subsidies.p_chp_total);
    for (n, &var) in subsidies.lin_kwkg_2.iter().enumerate() {
        w.scalar("lin_kwkg_2", n, var);
    }
    for (n, &var) in subsidies.lin_kwkg_1.iter().enumerate() {
        w.scalar("lin_kwkg_1", n, var);
    }
    for (n, &var) in subsidies.b_kwkg.iter().enumerate() {
        w.scalar("b_kwkg", n, var);
    }
    w.scalar("sub_kwkg_temp", "", subsidies.sub_kwkg_temp);

    // Heat losses
    w.grid("Q_Ht", "", &env.q_ht);
    w.grid("Q_vent_loss", "", &env.q_vent);
    w.grid("Q_v_Inf_wirk", "", &env.q_inf);
    w.grid("n_total", "", &env.n_total);
    w.scalar("x_vent", "", vars.x(Device::Vent));

    ScenarioResult {
        records: w.records,
        objective: solution.objective,
        total_cost: solution.value(costs.c_total),
        emission,
        runtime: solution.runtime,
        gap: solution.gap,
        status: solution.status,
        constraint_groups: problem
            .group_counts()
            .into_iter()
            .map(|(group, count)| (group.to_string(), count))
            .collect(),
    }
}

/// The names of the records in output order, without repetitions
pub fn record_names(records: &[ResultRecord]) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for record in records {
        if names.last() != Some(&record.record.as_str()) {
            names.push(&record.record);
        }
    }
    names
}
