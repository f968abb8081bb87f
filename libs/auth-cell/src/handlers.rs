use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;

use crate::models::{
    AuthError, GenerateOtpRequest, RefreshTokenRequest, VerifyOtpRequest, VerifyOutcome,
};
use crate::services::AuthService;

fn map_auth_error(e: AuthError) -> AppError {
    match e {
        AuthError::Validation(msg) => AppError::ValidationError(msg),
        AuthError::OtpExpired => AppError::ValidationError("OTP has expired or is invalid".to_string()),
        AuthError::OtpInvalid => AppError::ValidationError("Invalid OTP".to_string()),
        AuthError::SmsNotConfigured | AuthError::SmsDelivery(_) => {
            AppError::ExternalService("Error sending OTP".to_string())
        }
        AuthError::InvalidRefreshToken => {
            AppError::Auth("Invalid or expired refresh token".to_string())
        }
        AuthError::RefreshTokenMismatch => {
            AppError::Forbidden("Expired or invalid refresh token".to_string())
        }
        AuthError::AccountNotFound => AppError::NotFound("Account not found".to_string()),
        AuthError::Token(msg) => AppError::Internal(msg),
        AuthError::Database(msg) => AppError::Database(msg),
    }
}

fn caller_account_id(user: &User) -> Result<Uuid, AppError> {
    user.id
        .parse()
        .map_err(|_| AppError::Auth("Invalid account id in token".to_string()))
}

#[axum::debug_handler]
pub async fn generate_otp(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<GenerateOtpRequest>,
) -> Result<Json<Value>, AppError> {
    let phone_number = request
        .phone_number
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::ValidationError("Phone number is required".to_string()))?;

    let service = AuthService::new(&config);
    service
        .generate_otp(&phone_number)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "OTP sent successfully"
    })))
}

async fn verify_otp(
    config: Arc<AppConfig>,
    role: Role,
    request: VerifyOtpRequest,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let (phone_number, otp) = match (request.phone_number, request.otp) {
        (Some(phone), Some(otp)) if !phone.is_empty() && !otp.is_empty() => (phone, otp),
        _ => {
            return Err(AppError::ValidationError(
                "Phone number and OTP are required".to_string(),
            ))
        }
    };

    let service = AuthService::new(&config);
    let (outcome, tokens, account_id) = service
        .verify_otp(role, &phone_number, &otp)
        .await
        .map_err(map_auth_error)?;

    let (status, message) = match outcome {
        VerifyOutcome::NewPhone => (StatusCode::OK, "Phone number saved successfully"),
        VerifyOutcome::NoProfile => (
            StatusCode::CREATED,
            "Phone number already registered, but no user profile found",
        ),
        VerifyOutcome::ProfileExists => (StatusCode::ACCEPTED, "User profile exists"),
    };

    debug!("OTP verified for {} ({})", phone_number, message);

    Ok((
        status,
        Json(json!({
            "message": message,
            "accountId": account_id,
            "accessToken": tokens.access_token,
            "refreshToken": tokens.refresh_token,
        })),
    ))
}

#[axum::debug_handler]
pub async fn verify_otp_doctor(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    verify_otp(config, Role::Doctor, request).await
}

#[axum::debug_handler]
pub async fn verify_otp_patient(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    verify_otp(config, Role::Patient, request).await
}

async fn refresh_token(
    config: Arc<AppConfig>,
    role: Role,
    request: RefreshTokenRequest,
) -> Result<Json<Value>, AppError> {
    let refresh_token = request
        .refresh_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Auth("Unauthorized request, refresh token required".to_string()))?;

    let service = AuthService::new(&config);
    let tokens = service
        .refresh(role, &refresh_token)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(json!({
        "message": "Access token refreshed successfully",
        "accessToken": tokens.access_token,
        "refreshToken": tokens.refresh_token,
    })))
}

#[axum::debug_handler]
pub async fn refresh_token_doctor(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<Value>, AppError> {
    refresh_token(config, Role::Doctor, request).await
}

#[axum::debug_handler]
pub async fn refresh_token_patient(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<Value>, AppError> {
    refresh_token(config, Role::Patient, request).await
}

#[axum::debug_handler]
pub async fn doctor_logout(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let account_id = caller_account_id(&user)?;
    let service = AuthService::new(&config);
    service
        .logout(Role::Doctor, account_id)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(json!({ "message": "Logout successfully" })))
}

#[axum::debug_handler]
pub async fn patient_logout(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let account_id = caller_account_id(&user)?;
    let service = AuthService::new(&config);
    service
        .logout(Role::Patient, account_id)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(json!({ "message": "Logout successfully" })))
}
