use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn connection_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/show/doctor", get(handlers::show_doctor))
        .route("/doctor-request", post(handlers::doctor_request))
        .route("/doctor/scan", post(handlers::doctor_scan))
        .route("/patient-requests", get(handlers::patient_requests))
        .route("/patient-request/accept", put(handlers::accept_request))
        .route("/patient-request/decline", put(handlers::decline_request))
        .route("/my-patients", get(handlers::my_patients))
        .route("/my-doctor", get(handlers::my_doctor))
        .route("/patient/end", put(handlers::end_session))
        // Route spelling kept for client compatibility.
        .route("/patient/connectAgin", put(handlers::reconnect_session))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
