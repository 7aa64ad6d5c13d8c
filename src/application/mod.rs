// Application layer: HTTP use cases over the optimisation pipeline

pub mod mappers;
pub mod rest_service;

pub use rest_service::{router, AppState};
