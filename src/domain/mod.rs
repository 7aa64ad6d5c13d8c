// Domain module: campaign records, the backend-neutral optimisation model and
// the solver service contract

pub mod models;
pub mod records;
pub mod solver_service;
pub mod value_objects;

pub use models::*;
pub use records::*;
pub use solver_service::*;
pub use value_objects::*;
