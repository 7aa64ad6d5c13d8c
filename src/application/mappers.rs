// Mappers: pipeline outcomes to HTTP responses
// Keeps axum types out of the pipeline and the domain.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::value_objects::SolverBackend;
use crate::error::{PipelineError, Stage};

/// Error body returned for every failed request
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub stage: Option<Stage>,
    pub error: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SolversBody {
    pub configured: SolverBackend,
    pub available: Vec<SolverBackend>,
}

/// HTTP status for a failed run.
pub fn status_for(err: &PipelineError) -> StatusCode {
    match err.kind() {
        "data_integrity" | "data_source" | "invalid_request" => StatusCode::BAD_REQUEST,
        "infeasible_model" | "not_optimal" => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn pipeline_error_response(err: &PipelineError) -> Response {
    let body = ErrorBody {
        stage: Some(err.stage),
        error: err.kind().to_string(),
        message: err.to_string(),
    };
    (status_for(err), Json(body)).into_response()
}

/// Failure outside any pipeline stage, e.g. a panicked worker.
pub fn internal_error_response(message: impl Into<String>) -> Response {
    let body = ErrorBody {
        stage: None,
        error: "internal".to_string(),
        message: message.into(),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataIntegrityError, SourceError};
    use crate::domain::models::Solution;
    use crate::domain::value_objects::{SolverStatus, TerminationCondition};
    use crate::solver::SolveError;

    #[test]
    fn integrity_errors_are_bad_requests() {
        let err = PipelineError::new(
            Stage::DataPreparation,
            SourceError::Integrity(DataIntegrityError::EmptyTable {
                table: "cluster_data".into(),
            }),
        );
        assert_eq!(status_for(&err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unsolved_models_are_unprocessable() {
        let infeasible = PipelineError::new(
            Stage::Operational,
            SolveError::InfeasibleModel {
                stage: Stage::Operational,
                detail: "quota[k1,p1]".into(),
            },
        );
        let time_limit = PipelineError::new(
            Stage::Tactical,
            SolveError::NotOptimal {
                stage: Stage::Tactical,
                status: SolverStatus::Warning,
                termination: TerminationCondition::MaxTimeLimit,
                solution: Box::new(Solution::new(
                    SolverStatus::Warning,
                    TerminationCondition::MaxTimeLimit,
                    "time limit",
                )),
            },
        );

        assert_eq!(status_for(&infeasible), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_for(&time_limit), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn solver_invocation_is_a_server_error() {
        let err = PipelineError::new(
            Stage::Tactical,
            SolveError::Invocation {
                backend: SolverBackend::Cbc,
                message: "cbc: not found".into(),
            },
        );
        assert_eq!(status_for(&err), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
