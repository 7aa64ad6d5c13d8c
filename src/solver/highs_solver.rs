// HiGHS Solver Adapter
// Implements the SolverService interface for HiGHS linked in-process.
// Translates the domain model straight to a HiGHS row problem.

use highs::{HighsModelStatus, RowProblem, Sense};
use std::time::Instant;
use tracing::debug;

use crate::config::SolverOptions;
use crate::domain::{
    models::{OptimizationProblem, Solution, SolverStatistics},
    solver_service::{Result, SolverError, SolverService},
    value_objects::{
        ConstraintType, OptimizationType, SolverStatus, TerminationCondition, VariableType,
    },
};

#[derive(Debug, Default)]
pub struct HighsSolver {
    options: SolverOptions,
}

impl HighsSolver {
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }
}

impl SolverService for HighsSolver {
    fn solve(&self, problem: &OptimizationProblem) -> Result<Solution> {
        self.validate(problem)?;

        let start_time = Instant::now();
        let objective = &problem.objective.expression;

        let mut coefficients = vec![0.0; problem.num_variables()];
        for &(var, coefficient) in &objective.terms {
            coefficients[var.0] += coefficient;
        }

        // Columns first, then rows
        let mut pb = RowProblem::default();
        let mut cols = Vec::with_capacity(problem.num_variables());
        for (var_def, &obj_coeff) in problem.variables.iter().zip(&coefficients) {
            let lower = var_def.lower_bound;
            let upper = var_def.upper_bound.unwrap_or(f64::INFINITY);
            let col = match var_def.variable_type {
                VariableType::Integer | VariableType::Binary => {
                    pb.add_integer_column(obj_coeff, lower..upper)
                }
                VariableType::Continuous => pb.add_column(obj_coeff, lower..upper),
            };
            cols.push(col);
        }

        for constraint in &problem.constraints {
            let terms: Vec<_> = constraint
                .expression
                .terms
                .iter()
                .filter(|(_, coefficient)| *coefficient != 0.0)
                .map(|&(var, coefficient)| (cols[var.0], coefficient))
                .collect();
            let bound = constraint.bound - constraint.expression.constant;

            match constraint.constraint_type {
                ConstraintType::LessThanOrEqual => pb.add_row(..=bound, &terms),
                ConstraintType::Equal => pb.add_row(bound..=bound, &terms),
                ConstraintType::GreaterThanOrEqual => pb.add_row(bound.., &terms),
            }
        }

        let sense = match problem.objective.optimization_type {
            OptimizationType::Maximize => Sense::Maximise,
            OptimizationType::Minimize => Sense::Minimise,
        };

        let mut model = pb.optimise(sense);
        model.set_option("output_flag", false);
        if let Some(limit) = self.options.time_limit_secs {
            model.set_option("time_limit", limit);
        }
        if let Some(gap) = self.options.mip_gap {
            model.set_option("mip_rel_gap", gap);
        }
        if let Some(seed) = self.options.seed {
            model.set_option("random_seed", seed as i32);
        }
        if let Some(threads) = self.options.threads {
            model.set_option("threads", threads as i32);
        }

        let solved = model.solve();
        let statistics = SolverStatistics {
            solve_time_ms: start_time.elapsed().as_secs_f64() * 1000.0,
            num_variables: problem.num_variables() as u32,
            num_constraints: problem.constraints.len() as u32,
            num_integer_vars: problem.num_integer_variables() as u32,
            ..SolverStatistics::default()
        };
        debug!(status = ?solved.status(), problem = %problem.name, "HiGHS returned");

        let with_values = |status, termination, message: &str| {
            let values = solved.get_solution().columns().to_vec();
            let mut solution = Solution::new(status, termination, message);
            solution.objective_value = Some(objective.evaluate(&values));
            solution.variable_values = values;
            solution.with_statistics(statistics.clone())
        };

        match solved.status() {
            HighsModelStatus::Optimal => Ok(with_values(
                SolverStatus::Ok,
                TerminationCondition::Optimal,
                &format!("Optimal solution found for '{}'", problem.name),
            )),
            HighsModelStatus::ReachedTimeLimit => Ok(with_values(
                SolverStatus::Warning,
                TerminationCondition::MaxTimeLimit,
                "Time limit reached before optimality was proven",
            )),
            HighsModelStatus::Infeasible => Ok(Solution::infeasible(
                "Problem is infeasible: no solution satisfies all constraints",
            )
            .with_statistics(statistics.clone())),
            HighsModelStatus::Unbounded | HighsModelStatus::UnboundedOrInfeasible => {
                Ok(Solution::new(
                    SolverStatus::Ok,
                    TerminationCondition::Unbounded,
                    "Problem is unbounded: objective can be improved infinitely",
                )
                .with_statistics(statistics.clone()))
            }
            status => Err(SolverError::ExecutionFailed(format!(
                "HiGHS solver returned status: {status:?}"
            ))),
        }
    }

    fn name(&self) -> &str {
        "HiGHS"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}
