// Pipeline-level error: every failure carries the stage it happened in

use std::fmt;
use thiserror::Error;

use crate::data::{DataIntegrityError, SourceError};
use crate::export::ExportError;
use crate::model::ModelDefinitionError;
use crate::solver::SolveError;

/// Pipeline stage, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    DataPreparation,
    Tactical,
    Operational,
    Export,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::DataPreparation => write!(f, "data preparation"),
            Stage::Tactical => write!(f, "tactical"),
            Stage::Operational => write!(f, "operational"),
            Stage::Export => write!(f, "export"),
        }
    }
}

/// What went wrong, independent of the stage
#[derive(Debug, Error)]
pub enum PipelineFailure {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    ModelDefinition(#[from] ModelDefinitionError),

    #[error(transparent)]
    Solve(#[from] SolveError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<DataIntegrityError> for PipelineFailure {
    fn from(err: DataIntegrityError) -> Self {
        PipelineFailure::Source(SourceError::Integrity(err))
    }
}

/// A failed run; the message always names the stage
#[derive(Debug, Error)]
#[error("{stage} stage failed: {failure}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub failure: PipelineFailure,
}

impl PipelineError {
    pub fn new(stage: Stage, failure: impl Into<PipelineFailure>) -> Self {
        Self {
            stage,
            failure: failure.into(),
        }
    }

    /// Short machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match &self.failure {
            PipelineFailure::Source(SourceError::Integrity(_)) => "data_integrity",
            PipelineFailure::Source(_) => "data_source",
            PipelineFailure::ModelDefinition(_) => "model_definition",
            PipelineFailure::Solve(err) => err.kind(),
            PipelineFailure::Export(_) => "export",
            PipelineFailure::InvalidRequest(_) => "invalid_request",
        }
    }
}

/// Attach a stage to any stage-local error.
pub trait StageContext<T> {
    fn stage(self, stage: Stage) -> Result<T, PipelineError>;
}

impl<T, E: Into<PipelineFailure>> StageContext<T> for Result<T, E> {
    fn stage(self, stage: Stage) -> Result<T, PipelineError> {
        self.map_err(|err| PipelineError::new(stage, err))
    }
}
