use std::sync::Arc;

use axum::{middleware, routing::post, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn feedback_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/patient", post(handlers::submit_patient_feedback))
        .route("/doctor", post(handlers::submit_doctor_feedback))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
