// External solver adapter
// Drives CBC or GLPK as a separate process through good_lp's lp-solvers
// integration: the problem is written in LP format, the executable is run and
// its solution file read back.

use good_lp::solvers::lp_solvers::{CbcSolver, GlpkSolver, LpSolver, WithNbThreads};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::good_lp_model::solve_with;
use crate::config::SolverOptions;
use crate::domain::{
    models::{OptimizationProblem, Solution},
    solver_service::{Result, SolverError, SolverService},
    value_objects::SolverBackend,
};

pub struct ExternalSolver {
    backend: SolverBackend,
    executable: Option<PathBuf>,
    options: SolverOptions,
}

impl ExternalSolver {
    /// Solver found by its bare name on the search path.
    pub fn new(backend: SolverBackend, options: SolverOptions) -> Result<Self> {
        if !backend.is_external() {
            return Err(SolverError::SolverNotAvailable(format!(
                "{backend} does not run as an external executable"
            )));
        }
        Ok(Self {
            backend,
            executable: None,
            options,
        })
    }

    /// Solver run from an explicit executable location.
    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    pub fn executable(&self) -> Option<&Path> {
        self.executable.as_deref()
    }

    /// Command the back-end is started with.
    pub fn command(&self) -> String {
        match &self.executable {
            Some(path) => path.display().to_string(),
            None => match self.backend {
                SolverBackend::Glpk => "glpsol".to_string(),
                _ => "cbc".to_string(),
            },
        }
    }
}

impl SolverService for ExternalSolver {
    fn solve(&self, problem: &OptimizationProblem) -> Result<Solution> {
        self.validate(problem)?;

        let command = self.command();
        debug!(
            solver = %self.backend,
            %command,
            problem = %problem.name,
            options = ?self.options,
            "invoking external solver"
        );
        match self.backend {
            SolverBackend::Cbc => {
                let mut cbc = CbcSolver::new().command_name(command);
                if let Some(threads) = self.options.threads {
                    cbc = cbc.with_nb_threads(threads);
                }
                solve_with(problem, LpSolver(cbc), &self.options)
            }
            SolverBackend::Glpk => {
                if self.options.threads.is_some() {
                    debug!("glpsol is single-threaded; thread count ignored");
                }
                solve_with(
                    problem,
                    LpSolver(GlpkSolver::new().command_name(command)),
                    &self.options,
                )
            }
            other => Err(SolverError::SolverNotAvailable(format!(
                "{other} does not run as an external executable"
            ))),
        }
    }

    fn name(&self) -> &str {
        match self.backend {
            SolverBackend::Glpk => "GLPK",
            _ => "COIN-OR CBC",
        }
    }

    fn supports_mip(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_names_by_backend() {
        let cbc = ExternalSolver::new(SolverBackend::Cbc, SolverOptions::default()).unwrap();
        let glpk = ExternalSolver::new(SolverBackend::Glpk, SolverOptions::default()).unwrap();

        assert_eq!(cbc.command(), "cbc");
        assert_eq!(glpk.command(), "glpsol");
        assert_eq!(glpk.name(), "GLPK");
    }

    #[test]
    fn explicit_executable_replaces_bare_name() {
        let cbc = ExternalSolver::new(SolverBackend::Cbc, SolverOptions::default())
            .unwrap()
            .with_executable("/opt/coin/bin/cbc");

        assert_eq!(cbc.command(), "/opt/coin/bin/cbc");
    }

    #[test]
    fn in_process_backends_are_rejected() {
        assert!(matches!(
            ExternalSolver::new(SolverBackend::Microlp, SolverOptions::default()),
            Err(SolverError::SolverNotAvailable(_))
        ));
    }
}
