use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn journal_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/daily-entry", post(handlers::submit_daily_entry))
        .route("/daily-entry/feedback", post(handlers::record_entry_feedback))
        .route("/get-daily-entry", get(handlers::list_entries))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
