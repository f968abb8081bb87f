use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::appointment_routes;
use auth_cell::router::auth_routes;
use connection_cell::router::connection_routes;
use doctor_cell::router::doctor_routes;
use feedback_cell::router::feedback_routes;
use health_record_cell::router::health_record_routes;
use journal_cell::router::journal_routes;
use patient_cell::router::patient_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "CareBridge API is running!" }))
        .route("/health", get(|| async { "ok" }))
        .nest("/api/v1/auth", auth_routes(state.clone()))
        .nest("/api/v1/doctor", doctor_routes(state.clone()))
        .nest("/api/v1/patient", patient_routes(state.clone()))
        .nest("/api/v1/appointments", appointment_routes(state.clone()))
        .nest(
            "/api/v1/PatientDoctorConnection",
            connection_routes(state.clone()),
        )
        .nest("/api/v1/health-records", health_record_routes(state.clone()))
        .nest("/api/v1/questions", journal_routes(state.clone()))
        .nest("/api/v1/feedback", feedback_routes(state))
}
