use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::Value;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{DoctorFeedbackRequest, FeedbackError, PatientFeedbackRequest};
use crate::services::FeedbackService;

fn map_feedback_error(e: FeedbackError) -> AppError {
    match e {
        FeedbackError::Validation(msg) => AppError::ValidationError(msg),
        FeedbackError::Database(msg) => AppError::Database(msg),
    }
}

fn caller_id(user: &User) -> Result<Uuid, AppError> {
    user.id
        .parse()
        .map_err(|_| AppError::Auth("Invalid account id in token".to_string()))
}

fn present(value: &Option<Value>) -> bool {
    value.as_ref().is_some_and(|v| !v.is_null())
}

#[axum::debug_handler]
pub async fn submit_patient_feedback(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<PatientFeedbackRequest>,
) -> Result<Json<Value>, AppError> {
    let patient_id = caller_id(&user)?;

    // Only the overall rating is mandatory on the patient survey.
    if !present(&request.overall_app_experience) {
        return Err(AppError::ValidationError(
            "All fields are required.".to_string(),
        ));
    }

    let row = FeedbackService::new(&config)
        .submit_patient(patient_id, request, auth.token())
        .await
        .map_err(map_feedback_error)?;

    Ok(Json(row))
}

#[axum::debug_handler]
pub async fn submit_doctor_feedback(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<DoctorFeedbackRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = caller_id(&user)?;

    let missing: Vec<&str> = [
        ("patientSymptomUsefullorNot", &request.patient_symptom_useful),
        ("patientExperience", &request.patient_experience),
        ("appointmentEase", &request.appointment_ease),
        ("recommendation", &request.recommendation),
        ("appExperience", &request.app_experience),
    ]
    .into_iter()
    .filter(|(_, value)| !present(value))
    .map(|(name, _)| name)
    .collect();

    if !missing.is_empty() {
        return Err(AppError::ValidationError(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    let row = FeedbackService::new(&config)
        .submit_doctor(doctor_id, request, auth.token())
        .await
        .map_err(map_feedback_error)?;

    Ok(Json(row))
}
