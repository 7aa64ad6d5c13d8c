// Domain service interface for solving optimization problems.
// The model builders and the pipeline only see this trait; concrete backends
// live in `crate::solver`.

use super::models::{OptimizationProblem, Solution};

/// Error types for the solver service
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    #[error("Solver not available: {0}")]
    SolverNotAvailable(String),

    #[error("Solver execution failed: {0}")]
    ExecutionFailed(String),
}

impl SolverError {
    /// Failures that may be cured by pointing at another executable.
    pub fn is_invocation_failure(&self) -> bool {
        matches!(
            self,
            SolverError::SolverNotAvailable(_) | SolverError::ExecutionFailed(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SolverError>;

/// Domain service interface for optimization solvers
///
/// A backend receives a fully built problem and reports what it proved through
/// the returned [`Solution`]'s status and termination condition. Infeasible or
/// unbounded models are `Ok` solutions; `Err` is reserved for failing to run
/// the solver at all.
pub trait SolverService: Send + Sync {
    /// Solve an optimization problem
    fn solve(&self, problem: &OptimizationProblem) -> Result<Solution>;

    /// Validate a problem without solving it
    fn validate(&self, problem: &OptimizationProblem) -> Result<()> {
        if problem.num_variables() == 0 {
            return Err(SolverError::InvalidProblem(
                "Problem must have at least one variable".to_string(),
            ));
        }

        if problem.is_mixed_integer() && !self.supports_mip() {
            return Err(SolverError::InvalidProblem(format!(
                "{} cannot solve problems with integer variables",
                self.name()
            )));
        }

        problem
            .validate()
            .map_err(|errors| SolverError::InvalidProblem(errors.join("; ")))
    }

    /// Get the name of this solver backend
    fn name(&self) -> &str;

    /// Check if this solver supports mixed-integer programming
    fn supports_mip(&self) -> bool;
}
