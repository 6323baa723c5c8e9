//! A small mixed-integer linear programming layer on top of HiGHS.
//!
//! Models are assembled as a [`MilpProblem`] of named columns and rows tagged with a constraint
//! group, then handed to a [`Solver`]. Keeping our own representation (rather than building a
//! `highs::RowProblem` directly) means we can check coefficients before solving, re-solve with
//! constraint groups removed to diagnose infeasibility and verify incumbents against every row.
use crate::error::ModelError;
use crate::model::SolverOptions;
use highs::{HighsModelStatus, RowProblem, Sense};
use indexmap::{IndexMap, IndexSet};
use log::{debug, info, warn};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::time::Instant;

/// Environment variable which enables the solver's own output
pub const SOLVER_LOG_ENV_VAR: &str = "BUILDOPT_SOLVER_LOG";

/// Absolute tolerance used when checking an incumbent
const FEASIBILITY_TOLERANCE: f64 = 1e-6;

/// Upper limit on the time spent on each re-solve while diagnosing an infeasible model (s)
const DIAGNOSIS_TIME_LIMIT: f64 = 30.0;

/// Lower limit on the time given to the LP relaxation once the main solve has used its budget (s)
const MIN_BOUND_TIME_LIMIT: f64 = 1.0;

/// A decision variable, i.e. a column of a [`MilpProblem`]
///
/// This does **not** include the value of the variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Var(usize);

impl Var {
    /// Position of the column in the problem
    pub fn index(self) -> usize {
        self.0
    }
}

/// A linear expression `Σ coeff·var + constant`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinExpr {
    terms: Vec<(Var, f64)>,
    constant: f64,
}

impl LinExpr {
    /// An expression without variables
    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    /// A single weighted variable
    pub fn term(var: Var, coeff: f64) -> Self {
        Self {
            terms: vec![(var, coeff)],
            constant: 0.0,
        }
    }

    /// Add `coeff·var` to the expression
    pub fn add_term(&mut self, var: Var, coeff: f64) {
        self.terms.push((var, coeff));
    }

    /// Weighted sum of variables
    pub fn weighted_sum<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (Var, f64)>,
    {
        Self {
            terms: iter.into_iter().collect(),
            constant: 0.0,
        }
    }

    /// The variable terms (possibly with repeated variables)
    pub fn terms(&self) -> &[(Var, f64)] {
        &self.terms
    }

    /// The constant part
    pub fn constant_part(&self) -> f64 {
        self.constant
    }

    /// Value of the expression for the given column values
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.constant
            + self
                .terms
                .iter()
                .map(|&(var, coeff)| coeff * values[var.0])
                .sum::<f64>()
    }

    /// Combine repeated variables and drop zero coefficients
    fn merged_terms(&self) -> Vec<(Var, f64)> {
        let mut merged: IndexMap<Var, f64> = IndexMap::new();
        for &(var, coeff) in &self.terms {
            *merged.entry(var).or_default() += coeff;
        }
        merged.into_iter().filter(|&(_, c)| c != 0.0).collect()
    }
}

impl From<Var> for LinExpr {
    fn from(var: Var) -> Self {
        Self::term(var, 1.0)
    }
}

impl From<f64> for LinExpr {
    fn from(value: f64) -> Self {
        Self::constant(value)
    }
}

impl<T: Into<LinExpr>> AddAssign<T> for LinExpr {
    fn add_assign(&mut self, rhs: T) {
        let rhs = rhs.into();
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
    }
}

impl<T: Into<LinExpr>> SubAssign<T> for LinExpr {
    fn sub_assign(&mut self, rhs: T) {
        *self += -rhs.into();
    }
}

impl<T: Into<LinExpr>> Add<T> for LinExpr {
    type Output = LinExpr;

    fn add(mut self, rhs: T) -> LinExpr {
        self += rhs;
        self
    }
}

impl<T: Into<LinExpr>> Sub<T> for LinExpr {
    type Output = LinExpr;

    fn sub(mut self, rhs: T) -> LinExpr {
        self -= rhs;
        self
    }
}

impl<T: Into<LinExpr>> Add<T> for Var {
    type Output = LinExpr;

    fn add(self, rhs: T) -> LinExpr {
        LinExpr::from(self) + rhs
    }
}

impl<T: Into<LinExpr>> Sub<T> for Var {
    type Output = LinExpr;

    fn sub(self, rhs: T) -> LinExpr {
        LinExpr::from(self) - rhs
    }
}

impl Neg for LinExpr {
    type Output = LinExpr;

    fn neg(self) -> LinExpr {
        self * -1.0
    }
}

impl Mul<f64> for LinExpr {
    type Output = LinExpr;

    fn mul(mut self, rhs: f64) -> LinExpr {
        for (_, coeff) in &mut self.terms {
            *coeff *= rhs;
        }
        self.constant *= rhs;
        self
    }
}

impl Mul<LinExpr> for f64 {
    type Output = LinExpr;

    fn mul(self, rhs: LinExpr) -> LinExpr {
        rhs * self
    }
}

impl Mul<f64> for Var {
    type Output = LinExpr;

    fn mul(self, rhs: f64) -> LinExpr {
        LinExpr::term(self, rhs)
    }
}

impl Mul<Var> for f64 {
    type Output = LinExpr;

    fn mul(self, rhs: Var) -> LinExpr {
        LinExpr::term(rhs, self)
    }
}

impl Sum<LinExpr> for LinExpr {
    fn sum<I: Iterator<Item = LinExpr>>(iter: I) -> Self {
        iter.fold(LinExpr::default(), |acc, e| acc + e)
    }
}

impl Sum<Var> for LinExpr {
    fn sum<I: Iterator<Item = Var>>(iter: I) -> Self {
        LinExpr::weighted_sum(iter.map(|v| (v, 1.0)))
    }
}

impl<'a> Sum<&'a Var> for LinExpr {
    fn sum<I: Iterator<Item = &'a Var>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Column {
    name: String,
    lower: f64,
    upper: f64,
    integer: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct Row {
    group: usize,
    lower: f64,
    upper: f64,
    terms: Vec<(Var, f64)>,
}

/// A minimisation problem with continuous and binary variables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MilpProblem {
    columns: Vec<Column>,
    rows: Vec<Row>,
    groups: IndexSet<String>,
    objective: LinExpr,
}

impl MilpProblem {
    /// Add a continuous variable with the given bounds
    pub fn add_continuous(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> Var {
        self.add_column(name.into(), lower, upper, false)
    }

    /// Add a non-negative continuous variable without upper bound
    pub fn add_non_negative(&mut self, name: impl Into<String>) -> Var {
        self.add_continuous(name, 0.0, f64::INFINITY)
    }

    /// Add a free continuous variable
    pub fn add_free(&mut self, name: impl Into<String>) -> Var {
        self.add_continuous(name, f64::NEG_INFINITY, f64::INFINITY)
    }

    /// Add a binary variable
    pub fn add_binary(&mut self, name: impl Into<String>) -> Var {
        self.add_column(name.into(), 0.0, 1.0, true)
    }

    fn add_column(&mut self, name: String, lower: f64, upper: f64, integer: bool) -> Var {
        self.columns.push(Column {
            name,
            lower,
            upper,
            integer,
        });
        Var(self.columns.len() - 1)
    }

    /// Fix a variable to a value
    pub fn fix(&mut self, var: Var, value: f64) {
        let column = &mut self.columns[var.0];
        column.lower = value;
        column.upper = value;
    }

    /// Add the constraint `lhs ≤ rhs`
    pub fn add_le(&mut self, group: &str, lhs: impl Into<LinExpr>, rhs: impl Into<LinExpr>) {
        let expr = lhs.into() - rhs;
        self.add_row(group, f64::NEG_INFINITY, -expr.constant, &expr);
    }

    /// Add the constraint `lhs ≥ rhs`
    pub fn add_ge(&mut self, group: &str, lhs: impl Into<LinExpr>, rhs: impl Into<LinExpr>) {
        let expr = lhs.into() - rhs;
        self.add_row(group, -expr.constant, f64::INFINITY, &expr);
    }

    /// Add the constraint `lhs = rhs`
    pub fn add_eq(&mut self, group: &str, lhs: impl Into<LinExpr>, rhs: impl Into<LinExpr>) {
        let expr = lhs.into() - rhs;
        self.add_row(group, -expr.constant, -expr.constant, &expr);
    }

    fn add_row(&mut self, group: &str, lower: f64, upper: f64, expr: &LinExpr) {
        let (group, _) = self.groups.insert_full(group.to_string());
        self.rows.push(Row {
            group,
            lower,
            upper,
            terms: expr.merged_terms(),
        });
    }

    /// Set the expression to be minimised
    pub fn set_objective(&mut self, objective: impl Into<LinExpr>) {
        self.objective = objective.into();
    }

    /// The expression to be minimised
    pub fn objective(&self) -> &LinExpr {
        &self.objective
    }

    /// Number of variables
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Number of constraints
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of binary variables
    pub fn num_integer_columns(&self) -> usize {
        self.columns.iter().filter(|c| c.integer).count()
    }

    /// Name of a variable
    pub fn column_name(&self, var: Var) -> &str {
        &self.columns[var.0].name
    }

    /// Number of rows in each constraint group, in the order the groups were first used
    pub fn group_counts(&self) -> IndexMap<&str, usize> {
        let mut counts: IndexMap<&str, usize> =
            self.groups.iter().map(|g| (g.as_str(), 0)).collect();
        for row in &self.rows {
            counts[row.group] += 1;
        }
        counts
    }

    /// Objective coefficient of every column
    fn costs(&self) -> Vec<f64> {
        let mut costs = vec![0.0; self.columns.len()];
        for &(var, coeff) in self.objective.terms() {
            costs[var.0] += coeff;
        }
        costs
    }

    /// Check that every coefficient and bound is a number the solver can work with
    pub fn validate(&self) -> Result<(), ModelError> {
        for column in &self.columns {
            if column.lower.is_nan() || column.upper.is_nan() || column.lower > column.upper {
                return Err(ModelError::construction(format!(
                    "Variable {} has invalid bounds [{}, {}]",
                    column.name, column.lower, column.upper
                )));
            }
        }

        for row in &self.rows {
            let group = &self.groups[row.group];
            if row.lower.is_nan()
                || row.upper.is_nan()
                || row.lower > row.upper
                || (row.lower.is_infinite() && row.lower.is_sign_positive())
                || (row.upper.is_infinite() && row.upper.is_sign_negative())
            {
                return Err(ModelError::construction(format!(
                    "Constraint group {group} has a row with invalid bounds [{}, {}]",
                    row.lower, row.upper
                )));
            }
            if let Some(&(var, coeff)) = row.terms.iter().find(|(_, c)| !c.is_finite()) {
                return Err(ModelError::construction(format!(
                    "Constraint group {group} has non-finite coefficient {coeff} for variable {}",
                    self.columns[var.0].name
                )));
            }
        }

        if let Some(&(var, coeff)) = self.objective.terms().iter().find(|(_, c)| !c.is_finite()) {
            return Err(ModelError::construction(format!(
                "Objective has non-finite coefficient {coeff} for variable {}",
                self.columns[var.0].name
            )));
        }

        Ok(())
    }

    /// Whether the values satisfy every bound, integrality requirement and row
    pub fn is_feasible(&self, values: &[f64]) -> bool {
        if values.len() != self.columns.len() {
            return false;
        }

        let tol = |bound: f64| FEASIBILITY_TOLERANCE * bound.abs().max(1.0);
        let columns_ok = self.columns.iter().zip(values).all(|(column, &value)| {
            value.is_finite()
                && value >= column.lower - tol(column.lower)
                && value <= column.upper + tol(column.upper)
                && (!column.integer || (value - value.round()).abs() <= FEASIBILITY_TOLERANCE)
        });

        columns_ok
            && self.rows.iter().all(|row| {
                let activity: f64 = row.terms.iter().map(|&(v, c)| c * values[v.0]).sum();
                activity >= row.lower - tol(row.lower) && activity <= row.upper + tol(row.upper)
            })
    }

    /// A copy of the problem without the rows of one constraint group
    pub fn without_group(&self, group: &str) -> Self {
        let mut problem = self.clone();
        if let Some(index) = self.groups.get_index_of(group) {
            problem.rows.retain(|row| row.group != index);
        }
        problem
    }

    /// The LP relaxation of the problem
    pub fn relaxed(&self) -> Self {
        let mut problem = self.clone();
        for column in &mut problem.columns {
            column.integer = false;
        }
        problem
    }

    /// Names of the constraint groups
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(String::as_str)
    }
}

/// The raw result of a solver run
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    /// A solution within the requested gap
    Optimal(Vec<f64>),
    /// The time limit was reached, possibly with an incumbent
    TimedOut(Option<Vec<f64>>),
    /// The problem has no feasible solution
    Infeasible,
    /// Anything else
    Other(String),
}

/// Something which can solve a [`MilpProblem`]
pub trait Solver {
    /// Minimise the problem's objective within the given time limit (s) and relative gap
    fn solve(&self, problem: &MilpProblem, time_limit: f64, mip_gap: f64) -> SolveOutcome;
}

/// Solves problems with HiGHS
#[derive(Debug, Clone, Copy, Default)]
pub struct HighsSolver;

impl Solver for HighsSolver {
    fn solve(&self, problem: &MilpProblem, time_limit: f64, mip_gap: f64) -> SolveOutcome {
        let mut highs_problem = RowProblem::default();
        let cols: Vec<_> = problem
            .columns
            .iter()
            .zip(problem.costs())
            .map(|(column, cost)| {
                if column.integer {
                    highs_problem.add_integer_column(cost, column.lower..=column.upper)
                } else {
                    highs_problem.add_column(cost, column.lower..=column.upper)
                }
            })
            .collect();
        for row in &problem.rows {
            highs_problem.add_row(
                row.lower..=row.upper,
                row.terms.iter().map(|&(var, coeff)| (cols[var.0], coeff)),
            );
        }

        let mut model = highs_problem.optimise(Sense::Minimise);
        model.set_option("time_limit", time_limit);
        model.set_option("mip_rel_gap", mip_gap);
        configure_logging(&mut model);

        let solved = match model.try_solve() {
            Ok(solved) => solved,
            Err(status) => return SolveOutcome::Other(format!("{status:?}")),
        };

        match solved.status() {
            HighsModelStatus::Optimal => {
                SolveOutcome::Optimal(solved.get_solution().columns().to_vec())
            }
            HighsModelStatus::ReachedTimeLimit => {
                let values = solved.get_solution().columns().to_vec();
                SolveOutcome::TimedOut((values.len() == cols.len()).then_some(values))
            }
            HighsModelStatus::Infeasible | HighsModelStatus::UnboundedOrInfeasible => {
                SolveOutcome::Infeasible
            }
            status => SolveOutcome::Other(format!("{status:?}")),
        }
    }
}

/// Enable the solver's own output only if requested
fn configure_logging(model: &mut highs::Model) {
    let enabled = std::env::var_os(SOLVER_LOG_ENV_VAR).is_some();
    model.set_option("output_flag", enabled);
    model.set_option("log_to_console", enabled);
}

/// Whether a solution is proven optimal or the best found within the time limit
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolveStatus {
    /// Optimal within the requested gap
    Optimal,
    /// Best incumbent when the time limit was reached
    TimedOut {
        /// Relative gap to the LP relaxation bound
        gap: f64,
    },
}

/// Values of all variables after a successful solve
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    values: Vec<f64>,
    /// Objective value
    pub objective: f64,
    /// Wall-clock solve time (s)
    pub runtime: f64,
    /// Relative optimality gap.
    ///
    /// For optimal solutions this is the smaller of the requested gap and the gap to the LP
    /// relaxation bound, so it is zero whenever optimality is proven exactly.
    pub gap: f64,
    /// Solve status
    pub status: SolveStatus,
}

impl Solution {
    /// Value of a variable
    pub fn value(&self, var: Var) -> f64 {
        self.values[var.0]
    }

    /// Values of all variables
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Turn a timed-out solution into an error
    pub fn require_optimal(self) -> Result<Self, ModelError> {
        match self.status {
            SolveStatus::Optimal => Ok(self),
            SolveStatus::TimedOut { gap } => Err(ModelError::SolveTimedOut { gap: Some(gap) }),
        }
    }
}

/// Relative gap between an incumbent and the LP relaxation bound
fn relaxation_gap(
    problem: &MilpProblem,
    solver: &dyn Solver,
    objective: f64,
    time_limit: f64,
) -> f64 {
    match solver.solve(&problem.relaxed(), time_limit, 0.0) {
        SolveOutcome::Optimal(values) => {
            let bound = problem.objective.evaluate(&values);
            ((objective - bound) / objective.abs().max(1e-9)).max(0.0)
        }
        _ => f64::INFINITY,
    }
}

/// Find the constraint groups whose removal makes the problem feasible
pub fn diagnose_infeasibility(
    problem: &MilpProblem,
    solver: &dyn Solver,
    options: &SolverOptions,
) -> Vec<String> {
    let time_limit = options.time_limit.min(DIAGNOSIS_TIME_LIMIT);
    problem
        .groups()
        .filter(|group| {
            let reduced = problem.without_group(group);
            match solver.solve(&reduced, time_limit, options.mip_gap) {
                SolveOutcome::Optimal(_) => true,
                SolveOutcome::TimedOut(Some(values)) => reduced.is_feasible(&values),
                _ => false,
            }
        })
        .map(str::to_string)
        .collect()
}

/// Solve a problem, mapping the outcome onto a [`Solution`] or a [`ModelError`]
pub fn solve_problem(
    problem: &MilpProblem,
    solver: &dyn Solver,
    options: &SolverOptions,
) -> Result<Solution, ModelError> {
    problem.validate()?;
    debug!(
        "Solving problem with {} variables ({} binary) and {} constraints",
        problem.num_columns(),
        problem.num_integer_columns(),
        problem.num_rows()
    );

    let start = Instant::now();
    let outcome = solver.solve(problem, options.time_limit, options.mip_gap);
    let runtime = start.elapsed().as_secs_f64();
    let remaining_time = (options.time_limit - runtime).max(MIN_BOUND_TIME_LIMIT);

    match outcome {
        SolveOutcome::Optimal(values) => {
            let objective = problem.objective.evaluate(&values);
            let gap = if options.mip_gap <= 0.0 || problem.num_integer_columns() == 0 {
                0.0
            } else {
                relaxation_gap(problem, solver, objective, remaining_time).min(options.mip_gap)
            };
            info!("Found optimal solution with objective {objective:.4} in {runtime:.2}s");
            Ok(Solution {
                values,
                objective,
                runtime,
                gap,
                status: SolveStatus::Optimal,
            })
        }
        SolveOutcome::TimedOut(Some(values)) if problem.is_feasible(&values) => {
            let objective = problem.objective.evaluate(&values);
            let gap = relaxation_gap(problem, solver, objective, remaining_time);
            warn!(
                "Time limit reached; using incumbent with objective {objective:.4} (gap {:.2}%)",
                100.0 * gap
            );
            Ok(Solution {
                values,
                objective,
                runtime,
                gap,
                status: SolveStatus::TimedOut { gap },
            })
        }
        SolveOutcome::TimedOut(_) => {
            warn!("Time limit reached without a feasible solution");
            Err(ModelError::SolveTimedOut { gap: None })
        }
        SolveOutcome::Infeasible => {
            warn!("Model is infeasible");
            let diagnosis = if options.diagnose {
                diagnose_infeasibility(problem, solver, options)
            } else {
                Vec::new()
            };
            Err(ModelError::InfeasibleModel { diagnosis })
        }
        SolveOutcome::Other(status) => Err(ModelError::construction(format!(
            "Solver finished with unexpected status {status}"
        ))),
    }
}

/// Add `aux = var·b` for a continuous `var` in `[0, big_m]` and a binary `b`.
///
/// Uses the triple `aux ≤ M·b`, `var − aux ≥ 0`, `var − aux ≤ M·(1 − b)`.
pub fn linearise_product(
    problem: &mut MilpProblem,
    group: &str,
    aux: Var,
    var: impl Into<LinExpr>,
    binary: impl Into<LinExpr>,
    big_m: f64,
) {
    let var = var.into();
    let binary = binary.into();
    problem.add_le(group, aux, big_m * binary.clone());
    problem.add_ge(group, var.clone() - aux, 0.0);
    problem.add_le(group, var - aux, big_m * (LinExpr::constant(1.0) - binary));
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn options() -> SolverOptions {
        SolverOptions {
            time_limit: 10.0,
            mip_gap: 0.0,
            diagnose: true,
        }
    }

    #[test]
    fn test_lin_expr() {
        let mut problem = MilpProblem::default();
        let a = problem.add_non_negative("a");
        let b = problem.add_non_negative("b");

        let expr = 2.0 * a + b * 3.0 - a + 4.0;
        assert_eq!(expr.constant_part(), 4.0);
        assert_eq!(expr.evaluate(&[1.0, 2.0]), 2.0 + 6.0 - 1.0 + 4.0);
        assert_eq!(expr.merged_terms(), [(a, 1.0), (b, 3.0)]);

        let sum: LinExpr = [a, b].iter().sum();
        assert_eq!(sum.evaluate(&[1.0, 2.0]), 3.0);
        assert!((a - a).merged_terms().is_empty());
    }

    #[rstest]
    fn test_solve_lp(options: SolverOptions) {
        // max x + y s.t. x + 2y <= 4, 3x + y <= 6
        let mut problem = MilpProblem::default();
        let x = problem.add_non_negative("x");
        let y = problem.add_non_negative("y");
        problem.add_le("a", x + 2.0 * y, 4.0);
        problem.add_le("b", 3.0 * x + y, 6.0);
        problem.set_objective(-1.0 * (x + y));

        let solution = solve_problem(&problem, &HighsSolver, &options).unwrap();
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_approx_eq!(f64, solution.value(x), 1.6, epsilon = 1e-6);
        assert_approx_eq!(f64, solution.value(y), 1.2, epsilon = 1e-6);
        assert_approx_eq!(f64, solution.objective, -2.8, epsilon = 1e-6);
    }

    #[rstest]
    fn test_solve_milp(options: SolverOptions) {
        // Knapsack: values 5, 4, 3; weights 4, 3, 2; capacity 5
        let mut problem = MilpProblem::default();
        let items: Vec<_> = (0..3).map(|i| problem.add_binary(format!("b{i}"))).collect();
        problem.add_le(
            "capacity",
            LinExpr::weighted_sum(items.iter().copied().zip([4.0, 3.0, 2.0])),
            5.0,
        );
        problem.set_objective(
            -1.0 * LinExpr::weighted_sum(items.iter().copied().zip([5.0, 4.0, 3.0])),
        );

        let solution = solve_problem(&problem, &HighsSolver, &options).unwrap();
        assert_approx_eq!(f64, solution.objective, -7.0, epsilon = 1e-6);
        assert!(problem.is_feasible(solution.values()));
        assert_eq!(solution.gap, 0.0);
    }

    #[rstest]
    fn test_solve_milp_reports_achieved_gap(mut options: SolverOptions) {
        // The relaxation of min x + b s.t. x >= 2, x <= 10b is x = 2, b = 0.2
        let mut problem = MilpProblem::default();
        let x = problem.add_continuous("x", 0.0, 10.0);
        let b = problem.add_binary("b");
        problem.add_ge("demand", x, 2.0);
        problem.add_le("link", x, 10.0 * b);
        problem.set_objective(x + 1.0 * b);

        // A loose tolerance is reported as the tighter bound-based gap
        options.mip_gap = 0.5;
        let solution = solve_problem(&problem, &HighsSolver, &options).unwrap();
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_approx_eq!(f64, solution.objective, 3.0, epsilon = 1e-6);
        assert_approx_eq!(f64, solution.gap, (3.0 - 2.2) / 3.0, epsilon = 1e-6);

        // Problems without integer variables are always solved exactly
        options.mip_gap = 0.1;
        let solution = solve_problem(&problem.relaxed(), &HighsSolver, &options).unwrap();
        assert_eq!(solution.gap, 0.0);
    }

    #[rstest]
    fn test_solve_infeasible(options: SolverOptions) {
        let mut problem = MilpProblem::default();
        let x = problem.add_continuous("x", 0.0, 10.0);
        problem.add_ge("lower", x, 5.0);
        problem.add_le("upper", x, 2.0);
        problem.add_le("harmless", x, 100.0);
        problem.set_objective(x);

        let err = solve_problem(&problem, &HighsSolver, &options).unwrap_err();
        assert_eq!(
            err,
            ModelError::InfeasibleModel {
                diagnosis: vec!["lower".into(), "upper".into()]
            }
        );
    }

    #[test]
    fn test_validate() {
        let mut problem = MilpProblem::default();
        let x = problem.add_non_negative("x");
        problem.add_le("broken", f64::NAN * x, 1.0);
        assert!(matches!(
            problem.validate(),
            Err(ModelError::ModelConstruction { message }) if message.contains("broken")
        ));
    }

    #[rstest]
    #[case(5.0, 2.0)]
    #[case(f64::INFINITY, f64::INFINITY)]
    #[case(f64::NEG_INFINITY, f64::NEG_INFINITY)]
    #[case(f64::NAN, 1.0)]
    fn test_validate_row_bounds(#[case] lower: f64, #[case] upper: f64) {
        let mut problem = MilpProblem::default();
        let x = problem.add_non_negative("x");
        problem.add_row("crossed", lower, upper, &x.into());
        assert!(matches!(
            problem.validate(),
            Err(ModelError::ModelConstruction { message })
                if message.contains("crossed") && message.contains("invalid bounds")
        ));
    }

    #[test]
    fn test_validate_free_and_equality_rows() {
        let mut problem = MilpProblem::default();
        let x = problem.add_non_negative("x");
        problem.add_row("free", f64::NEG_INFINITY, f64::INFINITY, &x.into());
        problem.add_eq("equal", x, 1.0);
        assert!(problem.validate().is_ok());
    }

    #[test]
    fn test_is_feasible() {
        let mut problem = MilpProblem::default();
        let x = problem.add_continuous("x", 0.0, 10.0);
        let b = problem.add_binary("b");
        problem.add_le("link", x, 10.0 * b);

        assert!(problem.is_feasible(&[5.0, 1.0]));
        assert!(!problem.is_feasible(&[5.0, 0.0]));
        assert!(!problem.is_feasible(&[0.0, 0.5]));
        assert!(!problem.is_feasible(&[11.0, 1.0]));
        assert!(!problem.is_feasible(&[1.0]));
    }

    /// A solver which always reports a timeout with the given incumbent
    struct TimingOutSolver(Option<Vec<f64>>);

    impl Solver for TimingOutSolver {
        fn solve(&self, problem: &MilpProblem, time_limit: f64, mip_gap: f64) -> SolveOutcome {
            if problem.num_integer_columns() == 0 {
                // The relaxation is solved properly
                return HighsSolver.solve(problem, time_limit, mip_gap);
            }
            SolveOutcome::TimedOut(self.0.clone())
        }
    }

    #[rstest]
    fn test_solve_timed_out(options: SolverOptions) {
        let mut problem = MilpProblem::default();
        let x = problem.add_continuous("x", 0.0, 10.0);
        let b = problem.add_binary("b");
        problem.add_ge("demand", x, 2.5);
        problem.add_le("link", x, 10.0 * b);
        problem.set_objective(x + 1.0 * b);

        // Feasible incumbent: gap against the relaxation bound 2.5 + 0.25
        let solution =
            solve_problem(&problem, &TimingOutSolver(Some(vec![3.0, 1.0])), &options).unwrap();
        let SolveStatus::TimedOut { gap } = solution.status else {
            panic!("Expected timed out status");
        };
        assert_approx_eq!(f64, gap, (4.0 - 2.75) / 4.0, epsilon = 1e-6);
        assert!(solution.clone().require_optimal().is_err());

        // Infeasible incumbent is rejected
        assert_eq!(
            solve_problem(&problem, &TimingOutSolver(Some(vec![1.0, 1.0])), &options),
            Err(ModelError::SolveTimedOut { gap: None })
        );
        assert_eq!(
            solve_problem(&problem, &TimingOutSolver(None), &options),
            Err(ModelError::SolveTimedOut { gap: None })
        );
    }

    /// Uses up part of the time limit, then records the limit given to the relaxation
    struct SlowSolver {
        delay: std::time::Duration,
        relaxation_limit: std::cell::Cell<Option<f64>>,
    }

    impl Solver for SlowSolver {
        fn solve(&self, problem: &MilpProblem, time_limit: f64, mip_gap: f64) -> SolveOutcome {
            if problem.num_integer_columns() == 0 {
                self.relaxation_limit.set(Some(time_limit));
                return HighsSolver.solve(problem, time_limit, mip_gap);
            }
            std::thread::sleep(self.delay);
            SolveOutcome::TimedOut(Some(vec![3.0, 1.0]))
        }
    }

    #[rstest]
    fn test_relaxation_gets_remaining_time(mut options: SolverOptions) {
        let mut problem = MilpProblem::default();
        let x = problem.add_continuous("x", 0.0, 10.0);
        let b = problem.add_binary("b");
        problem.add_ge("demand", x, 2.5);
        problem.add_le("link", x, 10.0 * b);
        problem.set_objective(x + 1.0 * b);

        options.time_limit = 3.0;
        let solver = SlowSolver {
            delay: std::time::Duration::from_millis(500),
            relaxation_limit: std::cell::Cell::new(None),
        };
        solve_problem(&problem, &solver, &options).unwrap();
        let limit = solver.relaxation_limit.get().unwrap();
        assert!(limit <= 2.5 + 1e-9, "relaxation was given {limit}s");
        assert!(limit >= MIN_BOUND_TIME_LIMIT);
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(1.0, 7.5)]
    fn test_linearise_product(#[case] b_value: f64, #[case] expected: f64, options: SolverOptions) {
        let mut problem = MilpProblem::default();
        let x = problem.add_continuous("x", 0.0, 20.0);
        let b = problem.add_binary("b");
        let aux = problem.add_non_negative("aux");
        problem.fix(x, 7.5);
        problem.fix(b, b_value);
        linearise_product(&mut problem, "lin", aux, x, b, 20.0);

        // Push aux in both directions: the triple must pin it
        for sign in [1.0, -1.0] {
            problem.set_objective(sign * aux);
            let solution = solve_problem(&problem, &HighsSolver, &options).unwrap();
            assert_approx_eq!(f64, solution.value(aux), expected, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_group_counts() {
        let mut problem = MilpProblem::default();
        let x = problem.add_non_negative("x");
        problem.add_le("a", x, 1.0);
        problem.add_le("b", x, 2.0);
        problem.add_le("a", x, 3.0);
        let counts = problem.group_counts();
        assert_eq!(counts["a"], 2);
        assert_eq!(counts["b"], 1);
        assert_eq!(problem.without_group("a").num_rows(), 1);
    }
}
