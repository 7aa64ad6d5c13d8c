// Solver adapters module
//
// `ModelSolver` is what the pipeline talks to. Everything below it implements
// the `SolverService` contract for one back-end.

pub mod external_solver;
pub mod factory;
pub(crate) mod good_lp_model;
#[cfg(feature = "highs")]
pub mod highs_solver;
pub mod microlp_solver;
pub mod model_solver;
pub mod presolve;

pub use external_solver::ExternalSolver;
pub use factory::SolverFactory;
#[cfg(feature = "highs")]
pub use highs_solver::HighsSolver;
pub use microlp_solver::MicrolpSolver;
pub use model_solver::{ModelSolver, SolveError};
pub use presolve::{presolve, Presolved, TrivialViolation};
