use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/doctor/create", post(handlers::create_slot))
        .route("/doctor/resedule", post(handlers::reschedule_slot))
        .route("/doctor/cancel", post(handlers::cancel_slot))
        .route("/doctor/upcoming", get(handlers::doctor_upcoming))
        .route("/doctor/create/feedback", post(handlers::slot_feedback))
        .route("/doctor/statistic", get(handlers::location_statistics))
        .route("/doctor/month/statistics", get(handlers::monthly_statistics))
        .route("/available", get(handlers::available_slots))
        .route("/book", post(handlers::book))
        .route("/book/feedback", post(handlers::booking_feedback))
        .route("/cancel", post(handlers::cancel_booking))
        .route("/patient/upcoming", get(handlers::patient_upcoming))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
