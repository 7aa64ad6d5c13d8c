// Domain layer: records, formal model and solver contract
pub mod domain;

// Data preparation: tabular and payload sources into validated campaign data
pub mod data;

// Model builders for the tactical and operational stages
pub mod model;

// Solver adapters: pre-solve, back-ends, fallback and classification
pub mod solver;

// Result interpretation, export and run tracking
pub mod export;
pub mod results;
pub mod tracking;

// Orchestration of one optimisation run
pub mod error;
pub mod pipeline;

// Application layer: REST use cases
pub mod application;

// Infrastructure layer: HTTP server
pub mod infrastructure;

// Ambient: configuration and logging
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use config::AppConfig;
pub use data::{CampaignData, CampaignInput, CampaignPayload};
pub use domain::{
    CampaignTargets, OptimizationProblem, Solution, SolverBackend, SolverError, SolverService,
};
pub use error::{PipelineError, Stage};
pub use infrastructure::start_server;
pub use model::{OperationalModel, Solved, TacticalModel};
pub use pipeline::{Pipeline, RunOutcome};
pub use results::ResultBundle;
pub use solver::{ModelSolver, SolveError, SolverFactory};
