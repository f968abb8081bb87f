use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/get-phone-number", get(handlers::get_phone_number))
        .route(
            "/new-doctor-registration-form",
            post(handlers::register_doctor),
        )
        .route("/get-doctor-profile", get(handlers::get_doctor_profile))
        .route(
            "/update-doctor-profile",
            patch(handlers::update_doctor_profile),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
