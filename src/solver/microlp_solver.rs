// Bundled microlp adapter; needs no executable and is what the tests run on

use good_lp::solvers::microlp::microlp;
use tracing::debug;

use super::good_lp_model::solve_with;
use crate::config::SolverOptions;
use crate::domain::{
    models::{OptimizationProblem, Solution},
    solver_service::{Result, SolverService},
};

#[derive(Debug, Default)]
pub struct MicrolpSolver {
    options: SolverOptions,
}

impl MicrolpSolver {
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }
}

impl SolverService for MicrolpSolver {
    fn solve(&self, problem: &OptimizationProblem) -> Result<Solution> {
        self.validate(problem)?;

        if self.options.threads.is_some() {
            debug!(threads = ?self.options.threads, "microlp is single-threaded; thread count ignored");
        }

        solve_with(problem, microlp, &self.options)
    }

    fn name(&self) -> &str {
        "microlp"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}
