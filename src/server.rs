use crate::data::{ScheduleResult, TimetableInput};
use crate::error::TimetableError;
use crate::solver::{self, SolverSettings};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;

type ApiError = (StatusCode, String);

async fn solve_handler(
    State(settings): State<Arc<SolverSettings>>,
    Json(input): Json<TimetableInput>,
) -> Result<Json<ScheduleResult>, ApiError> {
    // HiGHS blocks; keep it off the async workers
    let outcome = tokio::task::spawn_blocking(move || solver::solve(&input, &settings))
        .await
        .map_err(|e| {
            error!("Solver task failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    match outcome {
        Ok(result) => Ok(Json(result)),
        Err(e) => Err(error_response(e)),
    }
}

fn error_response(e: TimetableError) -> ApiError {
    let status = match e {
        TimetableError::InvalidInput(_) | TimetableError::Json(_) => StatusCode::BAD_REQUEST,
        _ => {
            error!("Request failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, e.to_string())
}

async fn health_handler() -> &'static str {
    "ok"
}

pub fn router(settings: SolverSettings) -> Router {
    Router::new()
        .route("/v1/timetable/solve", post(solve_handler))
        .route("/health", get(health_handler))
        .with_state(Arc::new(settings))
}

pub async fn run_server(addr: SocketAddr, settings: SolverSettings) -> std::io::Result<()> {
    let app = router(settings);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", listener.local_addr()?);
    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_is_a_bad_request() {
        let (status, body) = error_response(TimetableError::InvalidInput("no slots".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("no slots"));
    }

    #[test]
    fn consistency_errors_are_server_errors() {
        let (status, _) = error_response(TimetableError::InternalConsistency("x".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
