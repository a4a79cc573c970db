pub mod health;
pub mod slack;
pub mod tasks;

use axum::extract::DefaultBodyLimit;
use axum::Router;

use crate::state::AppState;

/// Maximum request body size: 1 MiB. Slack payloads are small; anything
/// bigger is noise.
const MAX_BODY_SIZE: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/health", health::router())
        .nest("/v1/tasks", tasks::router())
        .nest("/slack", slack::router())
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(state)
}
