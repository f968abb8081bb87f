use std::sync::Arc;

use axum::{middleware, routing::post, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn auth_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/generate-otp", post(handlers::generate_otp))
        .route("/verify-otp-doctor", post(handlers::verify_otp_doctor))
        .route("/verify-otp-patient", post(handlers::verify_otp_patient))
        .route("/refresh-token-doctor", post(handlers::refresh_token_doctor))
        .route("/refresh-token-patient", post(handlers::refresh_token_patient));

    let protected_routes = Router::new()
        .route("/doctor-logout", post(handlers::doctor_logout))
        .route("/patient-logout", post(handlers::patient_logout))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
