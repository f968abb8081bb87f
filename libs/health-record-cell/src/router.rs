use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn health_record_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/prescription", post(handlers::upload_prescription))
        .route("/prescription/{id}", delete(handlers::delete_prescription))
        .route("/patient/prescriptions", get(handlers::patient_prescriptions))
        .route("/doctor/prescriptions", get(handlers::doctor_prescriptions))
        .route("/report", post(handlers::upload_report))
        .route("/report/{id}", delete(handlers::delete_report))
        .route("/patient/reports", get(handlers::patient_reports))
        .route("/doctor/reports", get(handlers::doctor_reports))
        .route("/notes", post(handlers::create_note).get(handlers::list_notes))
        .route("/notes/{id}", put(handlers::update_note).delete(handlers::delete_note))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
