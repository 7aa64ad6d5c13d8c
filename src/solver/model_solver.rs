// Solver adapter for built stage models: pre-solve, invoke the configured
// back-end (with one executable fallback for external solvers) and classify
// what came back.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, info_span, warn};

use super::presolve::presolve;
use super::SolverFactory;
use crate::config::SolverOptions;
use crate::domain::models::{OptimizationProblem, Solution};
use crate::domain::solver_service::{SolverError, SolverService};
use crate::domain::value_objects::{SolverBackend, SolverStatus, TerminationCondition};
use crate::error::Stage;
use crate::model::{Solved, StageModel};

/// Why a stage model did not come back solved
#[derive(Debug, Error)]
pub enum SolveError {
    #[error("{backend} could not be invoked: {message}")]
    Invocation {
        backend: SolverBackend,
        message: String,
    },

    #[error("{stage} model is infeasible: {detail}")]
    InfeasibleModel { stage: Stage, detail: String },

    #[error("{stage} model was not solved to optimality (status {status}, termination {termination})")]
    NotOptimal {
        stage: Stage,
        status: SolverStatus,
        termination: TerminationCondition,
        /// Solver output kept for diagnostics
        solution: Box<Solution>,
    },

    #[error("{stage} model was rejected by {backend}: {message}")]
    InvalidProblem {
        stage: Stage,
        backend: SolverBackend,
        message: String,
    },
}

impl SolveError {
    /// Short machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            SolveError::Invocation { .. } => "solver_invocation",
            SolveError::InfeasibleModel { .. } => "infeasible_model",
            SolveError::NotOptimal { .. } => "not_optimal",
            SolveError::InvalidProblem { .. } => "invalid_problem",
        }
    }
}

/// Runs stage models on one configured back-end.
pub struct ModelSolver {
    backend: SolverBackend,
    primary: Arc<dyn SolverService>,
    fallback: Option<Arc<dyn SolverService>>,
}

impl ModelSolver {
    /// Solver for `backend`; `fallback_executable` is only used by external
    /// back-ends.
    pub fn new(
        backend: SolverBackend,
        options: &SolverOptions,
        fallback_executable: Option<&Path>,
    ) -> Result<Self, SolveError> {
        let invocation = |err: SolverError| SolveError::Invocation {
            backend,
            message: err.to_string(),
        };
        let primary = SolverFactory::create(backend, options, None).map_err(invocation)?;
        let fallback = match fallback_executable {
            Some(path) if backend.is_external() => {
                Some(SolverFactory::create(backend, options, Some(path)).map_err(invocation)?)
            }
            _ => None,
        };
        Ok(Self::from_services(backend, primary, fallback))
    }

    /// Solver over already constructed services.
    pub fn from_services(
        backend: SolverBackend,
        primary: Arc<dyn SolverService>,
        fallback: Option<Arc<dyn SolverService>>,
    ) -> Self {
        Self {
            backend,
            primary,
            fallback,
        }
    }

    pub fn backend(&self) -> SolverBackend {
        self.backend
    }

    /// Solve `model`; only a proven optimum yields [`Solved`].
    pub fn solve<M: StageModel>(&self, model: M) -> Result<Solved<M>, SolveError> {
        let stage = model.stage();
        let _span = info_span!("solve", %stage, solver = self.backend.key()).entered();
        let problem = model.problem();
        let start_time = Instant::now();

        let reduced = presolve(problem).map_err(|violation| {
            warn!(%violation, "pre-solve proved the model infeasible");
            SolveError::InfeasibleModel {
                stage,
                detail: violation.to_string(),
            }
        })?;
        info!(
            variables = reduced.problem.num_variables(),
            constraints = reduced.problem.constraints.len(),
            fixed = reduced.fixed_variables,
            deactivated = reduced.deactivated_constraints,
            "pre-solve completed"
        );

        let mut solution = if reduced.is_empty() {
            Solution::optimal(reduced.problem.objective.expression.constant, Vec::new())
        } else {
            self.invoke(stage, &reduced.problem)?
        };

        if !solution.variable_values.is_empty() || reduced.is_empty() {
            solution.variable_values = reduced.restore(&solution.variable_values);
        }
        if solution.objective_value.is_some() {
            solution.objective_value =
                Some(problem.objective.expression.evaluate(&solution.variable_values));
        }
        solution.statistics.num_variables = problem.num_variables() as u32;
        solution.statistics.num_constraints = problem.constraints.len() as u32;
        solution.statistics.num_integer_vars = problem.num_integer_variables() as u32;
        solution.statistics.fixed_variables = reduced.fixed_variables as u32;
        solution.statistics.deactivated_constraints = reduced.deactivated_constraints as u32;
        solution.statistics.solve_time_ms = start_time.elapsed().as_secs_f64() * 1000.0;

        classify(stage, &solution)?;
        info!(
            objective = solution.objective_value,
            elapsed_ms = solution.statistics.solve_time_ms,
            "solution is feasible and optimal"
        );
        Ok(Solved::new(model, solution))
    }

    fn invoke(&self, stage: Stage, problem: &OptimizationProblem) -> Result<Solution, SolveError> {
        match self.primary.solve(problem) {
            Ok(solution) => Ok(solution),
            Err(err) if err.is_invocation_failure() => match &self.fallback {
                Some(fallback) => {
                    warn!(error = %err, "solver invocation failed; retrying with fallback executable");
                    fallback.solve(problem).map_err(|err| self.failure(stage, err))
                }
                None => Err(self.failure(stage, err)),
            },
            Err(err) => Err(self.failure(stage, err)),
        }
    }

    fn failure(&self, stage: Stage, err: SolverError) -> SolveError {
        match err {
            SolverError::InvalidProblem(message) => SolveError::InvalidProblem {
                stage,
                backend: self.backend,
                message,
            },
            other => SolveError::Invocation {
                backend: self.backend,
                message: other.to_string(),
            },
        }
    }
}

fn classify(stage: Stage, solution: &Solution) -> Result<(), SolveError> {
    if solution.is_optimal() {
        return Ok(());
    }
    if solution.termination == TerminationCondition::Infeasible {
        warn!(%stage, "solver proved the model infeasible");
        return Err(SolveError::InfeasibleModel {
            stage,
            detail: solution.message.clone(),
        });
    }
    warn!(
        %stage,
        status = %solution.status,
        termination = %solution.termination,
        "solver did not prove optimality"
    );
    Err(SolveError::NotOptimal {
        stage,
        status: solution.status,
        termination: solution.termination,
        solution: Box::new(solution.clone()),
    })
}
