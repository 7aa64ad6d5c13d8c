use std::path::Path;
use std::sync::Arc;

use crate::config::SolverOptions;
use crate::domain::{
    solver_service::{Result, SolverService},
    value_objects::SolverBackend,
};
use crate::solver::{ExternalSolver, MicrolpSolver};

/// Factory for creating solver instances based on configuration
pub struct SolverFactory;

impl SolverFactory {
    /// Create a solver for a specific backend.
    ///
    /// `executable` only applies to external back-ends; `None` means the bare
    /// executable name is looked up on the search path.
    pub fn create(
        backend: SolverBackend,
        options: &SolverOptions,
        executable: Option<&Path>,
    ) -> Result<Arc<dyn SolverService>> {
        match backend {
            SolverBackend::Cbc | SolverBackend::Glpk => {
                let solver = ExternalSolver::new(backend, options.clone())?;
                Ok(Arc::new(match executable {
                    Some(path) => solver.with_executable(path),
                    None => solver,
                }))
            }
            SolverBackend::Microlp => Ok(Arc::new(MicrolpSolver::new(options.clone()))),
            SolverBackend::Highs => Self::highs(options),
        }
    }

    /// Back-ends this build can construct.
    pub fn available() -> Vec<SolverBackend> {
        SolverBackend::ALL
            .into_iter()
            .filter(|backend| *backend != SolverBackend::Highs || cfg!(feature = "highs"))
            .collect()
    }

    #[cfg(feature = "highs")]
    fn highs(options: &SolverOptions) -> Result<Arc<dyn SolverService>> {
        Ok(Arc::new(crate::solver::HighsSolver::new(options.clone())))
    }

    #[cfg(not(feature = "highs"))]
    fn highs(_options: &SolverOptions) -> Result<Arc<dyn SolverService>> {
        Err(crate::domain::SolverError::SolverNotAvailable(
            "HiGHS support is not compiled in; rebuild with `--features highs`".to_string(),
        ))
    }
}
