//! The decision variables of the building model.
//!
//! The shared variables are created here, once per problem, so that the constraint builders only
//! look them up. The subsidy programs add a few auxiliaries of their own. Families which are
//! indexed by time are stored as day/time step grids.
use super::context::Context;
use crate::building::{Component, RetrofitScenario};
use crate::device::Device;
use crate::device::performance::FlowTemperature;
use crate::model::VentilationMode;
use crate::solver::{MilpProblem, Var};
use crate::subsidy::KfwTier;
use crate::tariff::TariffMap;
use indexmap::IndexMap;
use serde::Serialize;
use strum::{Display, EnumIter, IntoEnumIterator, IntoStaticStr};

/// A variable for every time step of every representative day
pub type Grid = Vec<Vec<Var>>;

/// Devices with a heat output
pub const HEAT_PRODUCERS: [Device; 7] = [
    Device::Boiler,
    Device::Chp,
    Device::Eh,
    Device::HpAir,
    Device::HpGeo,
    Device::Pellet,
    Device::Stc,
];

/// Devices with an electrical output or input
pub const POWER_DEVICES: [Device; 5] = [
    Device::Chp,
    Device::Eh,
    Device::HpAir,
    Device::HpGeo,
    Device::Pv,
];

/// Devices with a fuel input
pub const FUEL_CONSUMERS: [Device; 3] = [Device::Boiler, Device::Chp, Device::Pellet];

/// Connection to the electricity grid
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr, Display, Serialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum GridConnection {
    /// Household meter
    GridHou,
    /// Separate meter for the heat pump tariff
    GridHp,
}

/// Which meter the electric heater is supplied through
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr, Display, Serialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum EhSplit {
    /// Household meter (no heat pump installed)
    WithoutHp,
    /// Heat pump meter
    WithHp,
}

/// An energy carrier bought under a tariff
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr, Display, Serialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum Carrier {
    #[allow(missing_docs)]
    Gas,
    #[allow(missing_docs)]
    El,
}

/// Variables of the devices
pub struct DeviceVars {
    /// Purchase decision
    pub x: IndexMap<Device, Var>,
    /// Hourly activation (heaters and STC)
    pub y: IndexMap<Device, Grid>,
    /// Installed capacity
    pub capacity: IndexMap<Device, Var>,
    /// Nominal heat output while active (heaters)
    pub heat_nom: IndexMap<Device, Grid>,
    /// Nominal power input while active (heat pumps)
    pub power_nom: IndexMap<Device, Grid>,
    /// Heat output (kW)
    pub heat: IndexMap<Device, Grid>,
    /// Electrical output or input (kW)
    pub power: IndexMap<Device, Grid>,
    /// Fuel input (kW)
    pub energy: IndexMap<Device, Grid>,
    /// Supply temperature of the heating system
    pub b_tvl: IndexMap<FlowTemperature, Var>,
    /// Heat pump output at each supply temperature
    pub lin_tvl: IndexMap<Device, IndexMap<FlowTemperature, Grid>>,
    /// Design heat load (kW)
    pub dsh: Var,
}

/// Variables of one storage device
pub struct StorageVars {
    /// State of charge (kWh)
    pub soc: Grid,
    /// Charging power (kW)
    pub ch: Grid,
    /// Discharging power (kW)
    pub dch: Grid,
    /// State of charge at the start of each day
    pub soc_init: Vec<Var>,
    /// Usable storage capacity (kWh)
    pub soc_nom: Var,
}

/// Electricity flows
pub struct ElectricityVars {
    /// Imports per meter
    pub p_grid: IndexMap<GridConnection, Grid>,
    /// Self-used power per source
    pub p_use: IndexMap<Device, Grid>,
    /// Sold power per source
    pub p_sell: IndexMap<Device, Grid>,
    /// Power supplied to the heat pump meter per source
    pub p_hp: IndexMap<Device, Grid>,
    /// Electric heater power per meter
    pub eh_split: IndexMap<EhSplit, Grid>,
}

/// Tariff choice and consumption of one carrier
pub struct TariffVars {
    /// Whether a tariff is chosen
    pub selected: IndexMap<String, Var>,
    /// Whether a tier of a tariff is chosen
    pub tiers: IndexMap<String, Vec<Var>>,
    /// Annual consumption per tariff, consumer and tier (kWh)
    pub amounts: IndexMap<String, IndexMap<&'static str, Vec<Var>>>,
    /// Annual consumption per consumer (kWh)
    pub totals: IndexMap<&'static str, Var>,
}

/// Variables of the building envelope and the primary energy calculation
pub struct EnvelopeVars {
    /// Retrofit scenario chosen for each component
    pub x_restruc: IndexMap<Component, IndexMap<RetrofitScenario, Var>>,
    /// Whether a component is claimed as a KfW individual measure
    pub b_sub_component: IndexMap<Component, Var>,
    /// Whether a KfW efficiency building tier is claimed
    pub b_sub_tier: IndexMap<KfwTier, Var>,
    /// Transmission coefficient (W/K)
    pub h_t: Var,
    /// Transmission losses (kW)
    pub q_ht: Grid,
    /// Solar gains (kW)
    pub q_s: Grid,
    /// Space heating demand (kW)
    pub heat_mod: Grid,
    /// Ventilation losses (kW)
    pub q_vent: Grid,
    /// Infiltration losses (kW)
    pub q_inf: Grid,
    /// Total air exchange (1/h)
    pub n_total: Grid,
    /// Infiltration class (detailed ventilation only)
    pub b_n50: IndexMap<String, Var>,
    /// Primary energy demand (MWh/a)
    pub q_p_din: Var,
    /// Whether the building meets the reference values, allowing components above the reference
    /// U-values
    pub b_ind_mea: Var,
    /// Heating concept
    pub heating_concept: IndexMap<String, Var>,
    /// `H_t` if the concept is chosen, else 0
    pub lin_ht: IndexMap<String, Var>,
}

/// Annualised costs and their totals
pub struct CostVars {
    /// Investment per device and component (EUR/a)
    pub c_inv: IndexMap<String, Var>,
    /// Operation and maintenance per device (EUR/a)
    pub c_om: IndexMap<String, Var>,
    /// Fuel and electricity per consumer (EUR/a)
    pub c_dem: IndexMap<String, Var>,
    /// Fixed tariff charges per carrier (EUR/a)
    pub c_fix: IndexMap<String, Var>,
    /// Revenue from selling electricity (EUR/a)
    pub revenue: IndexMap<String, Var>,
    /// Subsidies per device, component and efficiency tier (EUR/a)
    pub subsidy: IndexMap<String, Var>,
    /// Total annualised cost (EUR/a)
    pub c_total: Var,
    /// Annual emissions (kg/a)
    pub emission: Var,
}

/// Variables shared by several subsidy programs
pub struct SubsidyVars {
    /// Whether the PV output is reduced for the EEG or the KfW battery program
    pub b_pv_power: IndexMap<&'static str, Var>,
    /// PV area if the reduction applies, else 0
    pub lin_pv_power: IndexMap<&'static str, Var>,
    /// CHP subsidies by program
    pub sub_chp: IndexMap<&'static str, Var>,
    /// Annual CHP output (total, self-used, sold; kWh)
    pub p_chp_total: IndexMap<&'static str, Var>,
    /// KWKG full load hours class
    pub b_kwkg: Vec<Var>,
    /// Electrical CHP capacity if the class is chosen, else 0
    pub lin_kwkg_1: Vec<Var>,
    /// Annual KWKG payment if the class is chosen, else 0
    pub lin_kwkg_2: Vec<Var>,
    /// Annual KWKG payment
    pub sub_kwkg_temp: Var,
}

/// The program names sharing the PV output reduction
pub const PV_POWER_PROGRAMS: [&str; 2] = ["eeg", "kfw"];

/// The CHP subsidy programs
pub const CHP_PROGRAMS: [&str; 2] = ["kwkg", "bafa"];

/// The parts of the annual CHP output
pub const CHP_OUTPUT_PARTS: [&str; 3] = ["total", "use", "sell"];

/// Devices which can receive a subsidy
pub const SUBSIDISED_DEVICES: [Device; 7] = [
    Device::Chp,
    Device::Bat,
    Device::HpAir,
    Device::HpGeo,
    Device::Stc,
    Device::Pellet,
    Device::Pv,
];

/// All decision variables of the problem
pub struct Variables {
    #[allow(missing_docs)]
    pub devices: DeviceVars,
    #[allow(missing_docs)]
    pub storage: IndexMap<Device, StorageVars>,
    #[allow(missing_docs)]
    pub electricity: ElectricityVars,
    /// Tariff variables per carrier
    pub tariffs: IndexMap<Carrier, TariffVars>,
    #[allow(missing_docs)]
    pub envelope: EnvelopeVars,
    #[allow(missing_docs)]
    pub costs: CostVars,
    #[allow(missing_docs)]
    pub subsidies: SubsidyVars,
}

/// Creates named variables
struct Builder<'p> {
    problem: &'p mut MilpProblem,
    days: usize,
    steps: usize,
}

impl Builder<'_> {
    fn non_negative(&mut self, name: String) -> Var {
        self.problem.add_non_negative(name)
    }

    fn binary(&mut self, name: String) -> Var {
        self.problem.add_binary(name)
    }

    fn grid(&mut self, name: &str, binary: bool) -> Grid {
        let mut grid = Vec::with_capacity(self.days);
        for d in 0..self.days {
            let mut day = Vec::with_capacity(self.steps);
            for t in 0..self.steps {
                let name = format!("{name}[{d}][{t}]");
                day.push(if binary {
                    self.binary(name)
                } else {
                    self.non_negative(name)
                });
            }
            grid.push(day);
        }
        grid
    }

    fn continuous_grid(&mut self, name: &str) -> Grid {
        self.grid(name, false)
    }

    fn device_grids<I>(&mut self, name: &str, devices: I) -> IndexMap<Device, Grid>
    where
        I: IntoIterator<Item = Device>,
    {
        devices
            .into_iter()
            .map(|dev| (dev, self.continuous_grid(&format!("{name}[{dev}]"))))
            .collect()
    }

    fn scalars<K, I>(&mut self, name: &str, keys: I) -> IndexMap<K, Var>
    where
        K: std::fmt::Display + std::hash::Hash + Eq,
        I: IntoIterator<Item = K>,
    {
        keys.into_iter()
            .map(|key| {
                let var = self.non_negative(format!("{name}[{key}]"));
                (key, var)
            })
            .collect()
    }

    fn binaries<K, I>(&mut self, name: &str, keys: I) -> IndexMap<K, Var>
    where
        K: std::fmt::Display + std::hash::Hash + Eq,
        I: IntoIterator<Item = K>,
    {
        keys.into_iter()
            .map(|key| {
                let var = self.binary(format!("{name}[{key}]"));
                (key, var)
            })
            .collect()
    }

    fn devices(&mut self) -> DeviceVars {
        let lin_tvl = Device::HEAT_PUMPS
            .into_iter()
            .map(|dev| {
                let grids = FlowTemperature::iter()
                    .map(|flow| (flow, self.continuous_grid(&format!("lin_tvl[{dev}][{flow}]"))))
                    .collect();
                (dev, grids)
            })
            .collect();

        DeviceVars {
            x: self.binaries("x", Device::iter()),
            y: Device::iter()
                .filter(|dev| dev.has_activation())
                .map(|dev| (dev, self.grid(&format!("y[{dev}]"), true)))
                .collect(),
            capacity: self.scalars("capacity", Device::iter()),
            heat_nom: self.device_grids("heat_nom", Device::HEATERS),
            power_nom: self.device_grids("power_nom", Device::HEAT_PUMPS),
            heat: self.device_grids("heat", HEAT_PRODUCERS),
            power: self.device_grids("power", POWER_DEVICES),
            energy: self.device_grids("energy", FUEL_CONSUMERS),
            b_tvl: self.binaries("b_tvl", FlowTemperature::iter()),
            lin_tvl,
            dsh: self.non_negative("dsh".into()),
        }
    }

    fn storage(&mut self) -> IndexMap<Device, StorageVars> {
        Device::STORAGES
            .into_iter()
            .map(|dev| {
                let vars = StorageVars {
                    soc: self.continuous_grid(&format!("soc[{dev}]")),
                    ch: self.continuous_grid(&format!("ch[{dev}]")),
                    dch: self.continuous_grid(&format!("dch[{dev}]")),
                    soc_init: (0..self.days)
                        .map(|d| self.non_negative(format!("soc_init[{dev}][{d}]")))
                        .collect(),
                    soc_nom: self.non_negative(format!("soc_nom[{dev}]")),
                };
                (dev, vars)
            })
            .collect()
    }

    fn electricity(&mut self) -> ElectricityVars {
        ElectricityVars {
            p_grid: GridConnection::iter()
                .map(|grid| (grid, self.continuous_grid(&format!("p_grid[{grid}]"))))
                .collect(),
            p_use: self.device_grids("p_use", Device::ELECTRICITY_SOURCES),
            p_sell: self.device_grids("p_sell", Device::ELECTRICITY_SOURCES),
            p_hp: self.device_grids("p_hp", Device::ELECTRICITY_SOURCES),
            eh_split: EhSplit::iter()
                .map(|split| (split, self.continuous_grid(&format!("eh_split[{split}]"))))
                .collect(),
        }
    }

    fn tariffs(&mut self, carrier: Carrier, tariffs: &TariffMap) -> TariffVars {
        let consumers: Vec<&'static str> = match carrier {
            Carrier::Gas => Device::GAS_CONSUMERS.into_iter().map(Into::into).collect(),
            Carrier::El => GridConnection::iter().map(Into::into).collect(),
        };

        let mut vars = TariffVars {
            selected: IndexMap::new(),
            tiers: IndexMap::new(),
            amounts: IndexMap::new(),
            totals: IndexMap::new(),
        };
        for (name, tariff) in tariffs {
            let selected = self.binary(format!("x_{carrier}[{name}]"));
            let tiers = (0..tariff.tiers.len())
                .map(|n| self.binary(format!("x_tariff[{carrier}][{name}][{n}]")))
                .collect();
            let amounts = consumers
                .iter()
                .map(|&consumer| {
                    let amounts = (0..tariff.tiers.len())
                        .map(|n| self.non_negative(format!("{carrier}[{name}][{consumer}][{n}]")))
                        .collect();
                    (consumer, amounts)
                })
                .collect();

            vars.selected.insert(name.clone(), selected);
            vars.tiers.insert(name.clone(), tiers);
            vars.amounts.insert(name.clone(), amounts);
        }
        vars.totals = self.scalars(&format!("{carrier}_total"), consumers);

        vars
    }

    fn envelope(&mut self, ctx: &Context) -> EnvelopeVars {
        let x_restruc = Component::iter()
            .map(|c| {
                let scenarios = RetrofitScenario::iter()
                    .map(|s| (s, self.binary(format!("x_restruc[{c}][{s}]"))))
                    .collect();
                (c, scenarios)
            })
            .collect();
        let concepts: Vec<&String> = ctx.model.heating_concepts.keys().collect();
        let b_n50 = match (ctx.options().ventilation, &ctx.model.ventilation) {
            (VentilationMode::Detailed, Some(data)) => {
                self.binaries("b_n50", data.classes.keys().cloned())
            }
            _ => IndexMap::new(),
        };

        EnvelopeVars {
            x_restruc,
            b_sub_component: self.binaries("b_sub_restruc", Component::iter()),
            b_sub_tier: self.binaries("b_sub_restruc", KfwTier::iter()),
            h_t: self.non_negative("h_t".into()),
            q_ht: self.continuous_grid("q_ht"),
            q_s: self.continuous_grid("q_s"),
            heat_mod: self.continuous_grid("heat_mod"),
            q_vent: self.continuous_grid("q_vent"),
            q_inf: self.continuous_grid("q_inf"),
            n_total: self.continuous_grid("n_total"),
            b_n50,
            q_p_din: self.non_negative("q_p_din".into()),
            b_ind_mea: self.binary("b_ind_mea".into()),
            heating_concept: self
                .binaries("heating_concept", concepts.iter().map(|n| (*n).clone())),
            lin_ht: self.scalars("lin_ht", concepts.iter().map(|n| (*n).clone())),
        }
    }

    fn costs(&mut self) -> CostVars {
        let device_names = || Device::iter().map(|dev| dev.to_string());
        let component_names = || Component::iter().map(|c| c.to_string());

        CostVars {
            c_inv: self.scalars("c_inv", device_names().chain(component_names())),
            c_om: self.scalars("c_om", device_names()),
            c_dem: self.scalars(
                "c_dem",
                [Device::Boiler, Device::Chp, Device::Pellet]
                    .into_iter()
                    .map(|dev| dev.to_string())
                    .chain(GridConnection::iter().map(|grid| grid.to_string())),
            ),
            c_fix: self.scalars("c_fix", Carrier::iter().map(|c| c.to_string())),
            revenue: self.scalars("revenue", [Device::Chp, Device::Pv].map(|dev| dev.to_string())),
            subsidy: self.scalars(
                "subsidy",
                SUBSIDISED_DEVICES
                    .into_iter()
                    .map(|dev| dev.to_string())
                    .chain(component_names())
                    .chain(KfwTier::iter().map(|tier| tier.to_string())),
            ),
            c_total: self.problem.add_free("c_total"),
            emission: self.problem.add_free("emission"),
        }
    }

    fn subsidies(&mut self, ctx: &Context) -> SubsidyVars {
        let classes = ctx.subsidies().kwkg.classes.len();
        SubsidyVars {
            b_pv_power: self.binaries("b_pv_power", PV_POWER_PROGRAMS),
            lin_pv_power: self.scalars("lin_pv_power", PV_POWER_PROGRAMS),
            sub_chp: self.scalars("sub_chp", CHP_PROGRAMS),
            p_chp_total: self.scalars("p_chp_total", CHP_OUTPUT_PARTS),
            b_kwkg: (0..classes)
                .map(|n| self.binary(format!("b_kwkg[{n}]")))
                .collect(),
            lin_kwkg_1: (0..classes)
                .map(|n| self.non_negative(format!("lin_kwkg_1[{n}]")))
                .collect(),
            lin_kwkg_2: (0..classes)
                .map(|n| self.non_negative(format!("lin_kwkg_2[{n}]")))
                .collect(),
            sub_kwkg_temp: self.non_negative("sub_kwkg_temp".into()),
        }
    }
}

impl Variables {
    /// Add every variable of the building model to the problem
    pub fn new(problem: &mut MilpProblem, ctx: &Context) -> Self {
        let mut builder = Builder {
            problem,
            days: ctx.days,
            steps: ctx.steps,
        };

        let devices = builder.devices();
        let storage = builder.storage();
        let electricity = builder.electricity();
        let tariffs = IndexMap::from([
            (Carrier::Gas, builder.tariffs(Carrier::Gas, &ctx.model.gas_tariffs)),
            (
                Carrier::El,
                builder.tariffs(Carrier::El, &ctx.model.electricity_tariffs),
            ),
        ]);
        let envelope = builder.envelope(ctx);
        let costs = builder.costs();
        let subsidies = builder.subsidies(ctx);

        Self {
            devices,
            storage,
            electricity,
            tariffs,
            envelope,
            costs,
            subsidies,
        }
    }

    /// Purchase decision of a device
    pub fn x(&self, device: Device) -> Var {
        self.devices.x[&device]
    }

    /// Capacity of a device
    pub fn capacity(&self, device: Device) -> Var {
        self.devices.capacity[&device]
    }

    /// Subsidy variable for a device, component or tier name
    pub fn subsidy(&self, key: impl std::fmt::Display) -> Var {
        self.costs.subsidy[key.to_string().as_str()]
    }

    /// Investment variable for a device or component name
    pub fn c_inv(&self, key: impl std::fmt::Display) -> Var {
        self.costs.c_inv[key.to_string().as_str()]
    }

    /// The retrofit scenario variable of a component
    pub fn x_restruc(&self, component: Component, scenario: RetrofitScenario) -> Var {
        self.envelope.x_restruc[&component][&scenario]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::ClusteredData;
    use crate::fixture::{clustered, model};
    use crate::model::Model;
    use rstest::rstest;

    #[rstest]
    fn test_variables(model: Model, clustered: ClusteredData) {
        let ctx = Context::new(&model, &clustered).unwrap();
        let mut problem = MilpProblem::default();
        let vars = Variables::new(&mut problem, &ctx);

        assert_eq!(vars.devices.x.len(), 11);
        assert_eq!(
            vars.devices.y.keys().copied().collect::<Vec<_>>(),
            [
                Device::Boiler,
                Device::Chp,
                Device::Eh,
                Device::HpAir,
                Device::HpGeo,
                Device::Pellet,
                Device::Stc
            ]
        );
        let heat = &vars.devices.heat[&Device::Boiler];
        assert_eq!(heat.len(), 2);
        assert!(heat.iter().all(|day| day.len() == 4));
        assert_eq!(problem.column_name(heat[1][2]), "heat[boiler][1][2]");

        // No infiltration classes in simple ventilation mode
        assert!(vars.envelope.b_n50.is_empty());
        assert_eq!(vars.costs.c_inv.len(), 15);
        assert_eq!(vars.costs.subsidy.len(), 16);
        assert_eq!(
            vars.tariffs[&Carrier::El].totals.keys().copied().collect::<Vec<_>>(),
            ["grid_hou", "grid_hp"]
        );
    }
}
