//! REST endpoints of the optimisation service
//!
//! | Method | Path             | Response                            |
//! |--------|------------------|-------------------------------------|
//! | GET    | `/`              | welcome text                        |
//! | POST   | `/optimise/run`  | result bundle, or an error body     |
//! | GET    | `/solvers`       | configured and available back-ends  |

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, warn};

use super::mappers::{self, SolversBody};
use crate::config::{AppConfig, OutputDestination};
use crate::data::{CampaignPayload, SourceError};
use crate::error::{PipelineError, Stage};
use crate::pipeline::Pipeline;
use crate::solver::SolverFactory;

pub const WELCOME: &str = "Welcome to the campaign optimisation service";

/// Shared, immutable request state
#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
}

/// Served requests get their results in the response body; the configured
/// file or database export only applies to batch runs, whose output paths
/// concurrent requests would otherwise share.
pub fn router(config: Arc<AppConfig>) -> Router {
    let config = if config.output.destination == OutputDestination::Api {
        config
    } else {
        info!(
            configured = ?config.output.destination,
            "request results are returned to the caller, not exported"
        );
        let mut served = AppConfig::clone(&config);
        served.output.destination = OutputDestination::Api;
        Arc::new(served)
    };

    Router::new()
        .route("/", get(welcome))
        .route("/optimise/run", post(run_optimisation))
        .route("/optimise/run/", post(run_optimisation))
        .route("/solvers", get(solvers))
        .with_state(AppState { config })
}

async fn welcome() -> &'static str {
    WELCOME
}

/// POST /optimise/run - run both stages on the request payload
async fn run_optimisation(State(state): State<AppState>, body: String) -> Response {
    let payload = match CampaignPayload::from_json(&body) {
        Ok(payload) => payload,
        Err(err) => {
            let err = PipelineError::new(Stage::DataPreparation, SourceError::Payload(err));
            warn!(error = %err, "rejected optimisation request");
            return mappers::pipeline_error_response(&err);
        }
    };

    let config = Arc::clone(&state.config);
    let outcome =
        tokio::task::spawn_blocking(move || Pipeline::new(&config).run_payload(&payload)).await;

    match outcome {
        Ok(Ok(outcome)) => {
            info!(solver = outcome.solver.key(), "optimisation request served");
            (StatusCode::OK, Json(outcome.bundle)).into_response()
        }
        Ok(Err(err)) => {
            warn!(stage = %err.stage, error = %err, "optimisation request failed");
            mappers::pipeline_error_response(&err)
        }
        Err(join) => mappers::internal_error_response(join.to_string()),
    }
}

/// GET /solvers
async fn solvers(State(state): State<AppState>) -> Json<SolversBody> {
    Json(SolversBody {
        configured: state.config.optimisation.solver,
        available: SolverFactory::available(),
    })
}
