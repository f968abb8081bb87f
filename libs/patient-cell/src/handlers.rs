use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    CompleteProfileRequest, GetDetailsQuery, PatientError, UpdatePatientProfileRequest,
};
use crate::services::PatientService;

fn map_patient_error(e: PatientError) -> AppError {
    match e {
        PatientError::NotFound => AppError::NotFound("Patient not found".to_string()),
        PatientError::AccountNotFound => AppError::NotFound("Phone number not found".to_string()),
        PatientError::Validation(msg) => AppError::ValidationError(msg),
        PatientError::Upload(msg) => AppError::ExternalService(msg),
        PatientError::Database(msg) => AppError::Database(msg),
    }
}

fn caller_account_id(user: &User) -> Result<Uuid, AppError> {
    user.id
        .parse()
        .map_err(|_| AppError::Auth("Invalid account id in token".to_string()))
}

#[axum::debug_handler]
pub async fn complete_profile(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CompleteProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let account_id = caller_account_id(&user)?;
    let service = PatientService::new(&config);

    let profile = service
        .complete_profile(account_id, request, auth.token())
        .await
        .map_err(map_patient_error)?;

    Ok(Json(json!({
        "message": "registered successfully",
        "data": profile
    })))
}

#[axum::debug_handler]
pub async fn update_patient_profile(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdatePatientProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let account_id = caller_account_id(&user)?;
    let service = PatientService::new(&config);

    let profile = service
        .update_profile(account_id, request, auth.token())
        .await
        .map_err(map_patient_error)?;

    Ok(Json(json!({
        "message": "patient profile updated successfully",
        "data": profile
    })))
}

/// Serves both the patient's own view and a doctor reading a connected
/// patient via `?patientId=`.
#[axum::debug_handler]
pub async fn get_patient_details(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<GetDetailsQuery>,
) -> Result<Json<Value>, AppError> {
    let account_id = match query.patient_id {
        Some(id) => id,
        None => caller_account_id(&user)?,
    };
    let service = PatientService::new(&config);

    let profile = service
        .get_profile(account_id, auth.token())
        .await
        .map_err(map_patient_error)?;

    Ok(Json(json!({
        "message": "Patient data retrieved",
        "data": profile
    })))
}

#[axum::debug_handler]
pub async fn get_patient_phone(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let account_id = caller_account_id(&user)?;
    let service = PatientService::new(&config);

    let phone_number = service
        .get_phone_number(account_id, auth.token())
        .await
        .map_err(map_patient_error)?;

    Ok(Json(json!({ "phoneNumber": phone_number })))
}
