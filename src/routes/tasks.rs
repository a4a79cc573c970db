//! Manual triggers for the scheduled jobs. The cron workers call the
//! same functions; these routes exist so an external scheduler (or an
//! operator) can fire a run on demand.

use axum::extract::State;
use axum::routing::post;
use axum::Router;

use crate::response::{ok, AppError};
use crate::state::AppState;
use crate::workers::{quiz_dispatch, vocabulary_sync};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dispatch", post(run_dispatch))
        .route("/sync-vocabulary", post(run_sync))
}

async fn run_dispatch(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let report = quiz_dispatch::run(state.store(), state.quiz(), state.slack()).await;
    Ok(ok(report))
}

async fn run_sync(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let report = vocabulary_sync::run(state.store(), state.notion())
        .await
        .map_err(|e| AppError::internal(&e.to_string()))?;
    Ok(ok(report))
}
