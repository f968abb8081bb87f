use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{DoctorError, RegisterDoctorRequest, UpdateDoctorProfileRequest};
use crate::services::DoctorService;

fn map_doctor_error(e: DoctorError) -> AppError {
    match e {
        DoctorError::NotFound => AppError::NotFound("Doctor not found".to_string()),
        DoctorError::AccountNotFound => AppError::NotFound("Phone number not found".to_string()),
        DoctorError::ProfileExists => AppError::Conflict("Doctor profile already exists".to_string()),
        DoctorError::Validation(msg) => AppError::ValidationError(msg),
        DoctorError::Upload(msg) => AppError::ExternalService(msg),
        DoctorError::Database(msg) => AppError::Database(msg),
    }
}

fn caller_account_id(user: &User) -> Result<Uuid, AppError> {
    user.id
        .parse()
        .map_err(|_| AppError::Auth("Invalid account id in token".to_string()))
}

#[axum::debug_handler]
pub async fn get_phone_number(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let account_id = caller_account_id(&user)?;
    let service = DoctorService::new(&config);

    let phone_number = service
        .get_phone_number(account_id, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({ "phoneNumber": phone_number })))
}

#[axum::debug_handler]
pub async fn register_doctor(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<RegisterDoctorRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let account_id = caller_account_id(&user)?;
    let service = DoctorService::new(&config);

    let profile = service
        .register(account_id, request, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Doctor registered successfully",
            "data": profile
        })),
    ))
}

#[axum::debug_handler]
pub async fn get_doctor_profile(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let account_id = caller_account_id(&user)?;
    let service = DoctorService::new(&config);

    let profile = service
        .get_profile(account_id, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({
        "message": "Doctor data retrieved",
        "data": profile
    })))
}

#[axum::debug_handler]
pub async fn update_doctor_profile(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateDoctorProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let account_id = caller_account_id(&user)?;
    let service = DoctorService::new(&config);

    let profile = service
        .update_profile(account_id, request, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({
        "message": "Doctor profile updated successfully",
        "data": profile
    })))
}
