// Translation of the domain model into a good_lp problem, shared by every
// back-end that good_lp drives (microlp, CBC, GLPK)

use good_lp::solvers::Solver;
use good_lp::{
    variable, Expression, ProblemVariables, ResolutionError, Solution as _, SolutionStatus,
    SolverModel, Variable as LpVariable, WithMipGap, WithTimeLimit,
};
use std::time::Instant;
use tracing::debug;

use crate::config::SolverOptions;
use crate::domain::models::{LinearExpr, OptimizationProblem, Solution, SolverStatistics};
use crate::domain::solver_service::{Result, SolverError};
use crate::domain::value_objects::{
    ConstraintType, OptimizationType, SolverStatus, TerminationCondition,
};

/// Build `problem` in good_lp, solve it with `solver` and read the values back.
///
/// The time limit and MIP gap from `options` are applied to the good_lp model;
/// back-end specific options (threads) are set on `solver` by the caller.
/// Infeasible and unbounded outcomes, and early stops on a limit, are reported
/// through the returned [`Solution`]; any other resolution error means the
/// back-end itself failed.
pub(crate) fn solve_with<S>(
    problem: &OptimizationProblem,
    solver: S,
    options: &SolverOptions,
) -> Result<Solution>
where
    S: Solver,
    S::Model: SolverModel<Error = ResolutionError> + WithTimeLimit + WithMipGap,
{
    let start_time = Instant::now();

    let mut vars = ProblemVariables::new();
    let columns: Vec<LpVariable> = problem
        .variables
        .iter()
        .map(|definition| {
            let mut column = variable().min(definition.lower_bound);
            if let Some(upper) = definition.upper_bound {
                column = column.max(upper);
            }
            if definition.is_integer() {
                column = column.integer();
            }
            vars.add(column)
        })
        .collect();

    let objective = expression(&problem.objective.expression, &columns);
    let unsolved = match problem.objective.optimization_type {
        OptimizationType::Maximize => vars.maximise(objective),
        OptimizationType::Minimize => vars.minimise(objective),
    };

    let mut model = unsolved.using(solver);
    if let Some(seconds) = options.time_limit_secs {
        model = model.with_time_limit(seconds);
    }
    if let Some(gap) = options.mip_gap {
        model = model
            .with_mip_gap(gap as f32)
            .map_err(|err| SolverError::InvalidProblem(format!("MIP gap {gap}: {err}")))?;
    }
    if options.seed.is_some() {
        debug!(problem = %problem.name, "random seed is not supported by this back-end; ignored");
    }

    for constraint in &problem.constraints {
        let lhs = expression(&constraint.expression, &columns);
        model = match constraint.constraint_type {
            ConstraintType::LessThanOrEqual => model.with(lhs.leq(constraint.bound)),
            ConstraintType::Equal => model.with(lhs.eq(constraint.bound)),
            ConstraintType::GreaterThanOrEqual => model.with(lhs.geq(constraint.bound)),
        };
    }

    let outcome = model.solve();
    let statistics = SolverStatistics {
        solve_time_ms: start_time.elapsed().as_secs_f64() * 1000.0,
        num_variables: problem.num_variables() as u32,
        num_constraints: problem.constraints.len() as u32,
        num_integer_vars: problem.num_integer_variables() as u32,
        ..SolverStatistics::default()
    };
    debug!(
        problem = %problem.name,
        elapsed_ms = statistics.solve_time_ms,
        "good_lp back-end returned"
    );

    match outcome {
        Ok(solved) => {
            let (status, termination, message) = match solved.status() {
                SolutionStatus::Optimal => (
                    SolverStatus::Ok,
                    TerminationCondition::Optimal,
                    format!("Optimal solution found for '{}'", problem.name),
                ),
                SolutionStatus::GapLimit => (
                    SolverStatus::Warning,
                    TerminationCondition::Feasible,
                    "MIP gap limit reached before optimality was proven".to_string(),
                ),
                SolutionStatus::TimeLimit => (
                    SolverStatus::Warning,
                    TerminationCondition::MaxTimeLimit,
                    "Time limit reached before optimality was proven".to_string(),
                ),
            };
            let values: Vec<f64> = columns.iter().map(|&col| solved.value(col)).collect();
            let mut solution = Solution::new(status, termination, message);
            solution.objective_value = Some(problem.objective.expression.evaluate(&values));
            solution.variable_values = values;
            Ok(solution.with_statistics(statistics))
        }
        Err(ResolutionError::Infeasible) => Ok(Solution::infeasible(
            "Problem is infeasible: no solution satisfies all constraints",
        )
        .with_statistics(statistics)),
        Err(ResolutionError::Unbounded) => Ok(Solution::new(
            SolverStatus::Ok,
            TerminationCondition::Unbounded,
            "Problem is unbounded: objective can be improved infinitely",
        )
        .with_statistics(statistics)),
        Err(ResolutionError::Other(message)) if options.time_limit_secs.is_some()
            && message.starts_with("Time limit") =>
        {
            Ok(Solution::new(
                SolverStatus::Warning,
                TerminationCondition::MaxTimeLimit,
                message,
            )
            .with_statistics(statistics))
        }
        Err(err) => Err(SolverError::ExecutionFailed(err.to_string())),
    }
}

fn expression(expr: &LinearExpr, columns: &[LpVariable]) -> Expression {
    let mut result: Expression = expr.constant.into();
    for &(var, coefficient) in &expr.terms {
        if coefficient != 0.0 {
            result += coefficient * columns[var.0];
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Constraint, ObjectiveFunction, VarId, Variable};
    use good_lp::solvers::microlp::microlp;

    fn knapsack() -> OptimizationProblem {
        let mut problem =
            OptimizationProblem::new("knapsack", ObjectiveFunction::maximize(LinearExpr::new()));
        let a = problem.add_variable(Variable::binary("a"));
        let b = problem.add_variable(Variable::binary("b"));
        let c = problem.add_variable(Variable::binary("c"));
        problem.set_objective(ObjectiveFunction::maximize(
            LinearExpr::new()
                .with_term(a, 10.0)
                .with_term(b, 7.0)
                .with_term(c, 4.0),
        ));
        problem.add_constraint(Constraint::new(
            "weight",
            LinearExpr::new()
                .with_term(a, 5.0)
                .with_term(b, 4.0)
                .with_term(c, 3.0),
            ConstraintType::LessThanOrEqual,
            8.0,
        ));
        problem
    }

    #[test]
    fn solves_small_binary_problem() {
        let solution = solve_with(&knapsack(), microlp, &SolverOptions::default()).unwrap();

        assert!(solution.is_optimal());
        assert!((solution.objective_value.unwrap() - 14.0).abs() < 1e-6);
        let picked: Vec<bool> = solution.variable_values.iter().map(|v| *v > 0.5).collect();
        assert_eq!(picked, vec![true, false, true]);
        assert_eq!(solution.statistics.num_integer_vars, 3);
    }

    /// Twenty-item binary packing where a loose gap stops branch and bound early.
    fn packing() -> OptimizationProblem {
        let items = [
            (1.87, 6.03),
            (3.22, 8.03),
            (9.91, 5.16),
            (8.31, 1.72),
            (7.00, 6.33),
            (5.15, 8.20),
            (8.01, 4.63),
            (2.22, 1.50),
            (7.04, 6.26),
            (8.99, 9.62),
            (2.13, 4.00),
            (8.02, 8.02),
            (3.07, 1.92),
            (1.98, 9.03),
            (7.23, 9.51),
            (4.08, 3.24),
            (9.65, 5.13),
            (6.53, 3.07),
            (6.76, 3.84),
            (9.63, 8.33),
        ];
        let mut problem =
            OptimizationProblem::new("packing", ObjectiveFunction::maximize(LinearExpr::new()));
        let mut value = LinearExpr::new();
        let mut weight = LinearExpr::new();
        for (i, (v, w)) in items.into_iter().enumerate() {
            let var = problem.add_variable(Variable::binary(format!("item_{i}")));
            value.add_term(var, v);
            weight.add_term(var, w);
        }
        problem.set_objective(ObjectiveFunction::maximize(value));
        problem.add_constraint(Constraint::new(
            "weight",
            weight,
            ConstraintType::LessThanOrEqual,
            25.0,
        ));
        problem
    }

    #[test]
    fn proven_optimum_without_limits() {
        let solution = solve_with(&packing(), microlp, &SolverOptions::default()).unwrap();

        assert_eq!(solution.status, SolverStatus::Ok);
        assert_eq!(solution.termination, TerminationCondition::Optimal);
    }

    #[test]
    fn gap_limited_stop_is_not_reported_as_optimal() {
        let options = SolverOptions {
            mip_gap: Some(0.5),
            ..SolverOptions::default()
        };
        let optimal = solve_with(&packing(), microlp, &SolverOptions::default()).unwrap();
        let solution = solve_with(&packing(), microlp, &options).unwrap();

        assert_eq!(solution.status, SolverStatus::Warning);
        assert_eq!(solution.termination, TerminationCondition::Feasible);
        assert!(!solution.is_optimal());
        assert!(solution.objective_value.unwrap() <= optimal.objective_value.unwrap() + 1e-9);
        assert_eq!(solution.variable_values.len(), 20);
    }

    #[test]
    fn configured_time_limit_takes_effect() {
        let options = SolverOptions {
            time_limit_secs: Some(0.0),
            ..SolverOptions::default()
        };
        let solution = solve_with(&knapsack(), microlp, &options).unwrap();

        assert_eq!(solution.status, SolverStatus::Warning);
        assert_eq!(solution.termination, TerminationCondition::MaxTimeLimit);
        assert!(solution.variable_values.is_empty());
    }

    #[test]
    fn negative_gap_is_rejected() {
        let options = SolverOptions {
            mip_gap: Some(-0.1),
            ..SolverOptions::default()
        };

        assert!(matches!(
            solve_with(&knapsack(), microlp, &options),
            Err(SolverError::InvalidProblem(_))
        ));
    }

    #[test]
    fn reports_infeasibility_as_a_solution() {
        let mut problem = knapsack();
        problem.add_constraint(Constraint::new(
            "impossible",
            LinearExpr::new().with_term(VarId(0), 1.0),
            ConstraintType::GreaterThanOrEqual,
            2.0,
        ));

        let solution = solve_with(&problem, microlp, &SolverOptions::default()).unwrap();
        assert_eq!(solution.termination, TerminationCondition::Infeasible);
        assert!(!solution.is_optimal());
    }
}
