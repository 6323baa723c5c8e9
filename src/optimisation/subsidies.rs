//! Eligibility and value of the subsidy programs.
//!
//! Every program can be switched off in the scenario options, in which case its subsidy is fixed
//! to zero. Grants are paid once and are annualised with the capital recovery factor.
use super::context::Context;
use super::variables::Variables;
use crate::error::ModelError;
use crate::solver::{MilpProblem, Var};

mod bafa;
mod chp;
mod kfw;
mod pv;

/// Add the constraints of every subsidy program
pub fn add_subsidy_constraints(
    problem: &mut MilpProblem,
    ctx: &Context,
    vars: &Variables,
) -> Result<(), ModelError> {
    pv::add_pv_programs(problem, ctx, vars);
    chp::add_chp_programs(problem, ctx, vars);
    bafa::add_bafa_programs(problem, ctx, vars);
    kfw::add_kfw_programs(problem, ctx, vars)?;

    Ok(())
}

/// A binary variable only used inside one program
fn program_binary(problem: &mut MilpProblem, program: &str, name: &str) -> Var {
    problem.add_binary(format!("{program}[{name}]"))
}

/// A non-negative variable only used inside one program
fn program_variable(problem: &mut MilpProblem, program: &str, name: &str) -> Var {
    problem.add_non_negative(format!("{program}[{name}]"))
}
