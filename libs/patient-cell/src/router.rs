use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn patient_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/complete-profile", post(handlers::complete_profile))
        .route(
            "/update-patient-profile",
            patch(handlers::update_patient_profile),
        )
        .route("/get-patient-details", get(handlers::get_patient_details))
        .route("/get-patient-phone", get(handlers::get_patient_phone))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
