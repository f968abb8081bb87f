use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
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

use crate::models::{
    ConnectionError, ConnectionRequest, ConnectionStatus, DoctorRequestBody, RequestIdBody,
    RequestOutcome, ScanBody, ScanOutcome, ShowDoctorQuery,
};
use crate::services::directory::profile_udi;
use crate::services::{ConnectionService, DirectoryService};

fn map_connection_error(e: ConnectionError) -> AppError {
    match e {
        ConnectionError::DoctorNotFound
        | ConnectionError::PatientNotFound
        | ConnectionError::UserNotFound
        | ConnectionError::RequestNotFound => AppError::NotFound(e.to_string()),
        ConnectionError::AlreadyExists => AppError::Conflict(e.to_string()),
        ConnectionError::Validation(msg) => AppError::ValidationError(msg),
        ConnectionError::Database(msg) => AppError::Database(msg),
    }
}

fn caller_id(user: &User) -> Result<Uuid, AppError> {
    user.id
        .parse()
        .map_err(|_| AppError::Auth("Invalid account id in token".to_string()))
}

async fn caller_patient_udi(
    directory: &DirectoryService,
    user: &User,
    auth_token: &str,
) -> Result<String, AppError> {
    let account_id = caller_id(user)?;
    directory
        .patient_profile_by_account(account_id, auth_token)
        .await
        .map_err(map_connection_error)?
        .as_ref()
        .and_then(profile_udi)
        .ok_or_else(|| AppError::NotFound("Patient not found".to_string()))
}

async fn caller_doctor_udi(
    directory: &DirectoryService,
    user: &User,
    auth_token: &str,
) -> Result<String, AppError> {
    let account_id = caller_id(user)?;
    directory
        .doctor_profile_by_account(account_id, auth_token)
        .await
        .map_err(map_connection_error)?
        .as_ref()
        .and_then(profile_udi)
        .ok_or_else(|| AppError::NotFound("Doctor not found".to_string()))
}

#[axum::debug_handler]
pub async fn show_doctor(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<ShowDoctorQuery>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let doctor_udi = query
        .udi_id
        .filter(|udi| !udi.is_empty())
        .ok_or_else(|| AppError::ValidationError("UDI_id is required".to_string()))?;

    let directory = DirectoryService::new(&config);
    let patient_udi = caller_patient_udi(&directory, &user, auth.token()).await?;

    let doctor_profile = directory
        .doctor_profile_by_udi(&doctor_udi, auth.token())
        .await
        .map_err(map_connection_error)?
        .ok_or_else(|| AppError::NotFound("Doctor not found".to_string()))?;

    let existing = ConnectionService::new(&config)
        .find_pair(&patient_udi, &doctor_udi, auth.token())
        .await
        .map_err(map_connection_error)?;

    if existing.is_some_and(|r| r.status == ConnectionStatus::Accepted) {
        // Non-standard status carried over from the original client contract.
        let status = StatusCode::from_u16(209).unwrap_or(StatusCode::CONFLICT);
        return Ok((status, Json(json!({ "message": "Doctor request already exists!" }))));
    }

    Ok((StatusCode::OK, Json(json!({ "doctorData": doctor_profile }))))
}

#[axum::debug_handler]
pub async fn doctor_request(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(body): Json<DoctorRequestBody>,
) -> Result<Json<Value>, AppError> {
    let doctor_udi = body
        .doctor_id
        .filter(|udi| !udi.is_empty())
        .ok_or_else(|| AppError::ValidationError("doctorId is required".to_string()))?;

    let directory = DirectoryService::new(&config);
    let patient_udi = caller_patient_udi(&directory, &user, auth.token()).await?;

    let outcome = ConnectionService::new(&config)
        .request_connection(&patient_udi, &doctor_udi, auth.token())
        .await
        .map_err(map_connection_error)?;

    let message = match outcome {
        RequestOutcome::Sent => "Doctor request sent!",
        RequestOutcome::ReopenedToPending => "Doctor request status updated to pending!",
    };
    Ok(Json(json!({ "message": message })))
}

#[axum::debug_handler]
pub async fn doctor_scan(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(body): Json<ScanBody>,
) -> Result<Json<Value>, AppError> {
    let patient_udi = body
        .patient_id
        .filter(|udi| !udi.is_empty())
        .ok_or_else(|| AppError::ValidationError("patientId is required".to_string()))?;

    let directory = DirectoryService::new(&config);
    let doctor_udi = caller_doctor_udi(&directory, &user, auth.token()).await?;

    let outcome = ConnectionService::new(&config)
        .direct_connect(&doctor_udi, &patient_udi, auth.token())
        .await
        .map_err(map_connection_error)?;

    let message = match outcome {
        ScanOutcome::Connected => "Doctor connection complete!",
        ScanOutcome::ReconnectedFromDeclined => "Doctor connection status updated to accepted!",
    };
    Ok(Json(json!({ "message": message })))
}

/// Caller role comes from the token claim, not from probing both profile
/// tables in sequence.
#[axum::debug_handler]
pub async fn patient_requests(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let directory = DirectoryService::new(&config);
    let service = ConnectionService::new(&config);

    let data = match user.role.as_deref() {
        Some("doctor") => {
            let doctor_udi = caller_doctor_udi(&directory, &user, auth.token()).await?;
            let requests = service
                .list_for_doctor(&doctor_udi, &["pending"], auth.token())
                .await
                .map_err(map_connection_error)?;
            join_with_patients(&directory, requests, auth.token()).await?
        }
        Some("patient") => {
            let patient_udi = caller_patient_udi(&directory, &user, auth.token()).await?;
            let requests = service
                .list_for_patient(&patient_udi, &["pending", "accepted"], auth.token())
                .await
                .map_err(map_connection_error)?;
            join_with_doctors(&directory, requests, auth.token()).await?
        }
        _ => {
            return Err(AppError::NotFound(
                "User not found as Doctor or Patient".to_string(),
            ))
        }
    };

    Ok(Json(json!({ "data": data })))
}

#[axum::debug_handler]
pub async fn accept_request(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(body): Json<RequestIdBody>,
) -> Result<Json<Value>, AppError> {
    let request_id = body
        .request_id
        .ok_or_else(|| AppError::ValidationError("requestId is required".to_string()))?;

    ConnectionService::new(&config)
        .accept(request_id, auth.token())
        .await
        .map_err(map_connection_error)?;

    Ok(Json(json!({ "message": "Connection request accepted" })))
}

#[axum::debug_handler]
pub async fn decline_request(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(body): Json<RequestIdBody>,
) -> Result<Json<Value>, AppError> {
    let request_id = body
        .request_id
        .ok_or_else(|| AppError::ValidationError("requestId is required".to_string()))?;

    ConnectionService::new(&config)
        .decline(request_id, auth.token())
        .await
        .map_err(map_connection_error)?;

    Ok(Json(json!({ "message": "Doctor request declined" })))
}

#[axum::debug_handler]
pub async fn my_patients(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let directory = DirectoryService::new(&config);
    let doctor_udi = caller_doctor_udi(&directory, &user, auth.token()).await?;

    let requests = ConnectionService::new(&config)
        .list_for_doctor(&doctor_udi, &["accepted"], auth.token())
        .await
        .map_err(map_connection_error)?;

    let data = join_with_patients(&directory, requests, auth.token()).await?;
    Ok(Json(json!(data)))
}

#[axum::debug_handler]
pub async fn my_doctor(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let directory = DirectoryService::new(&config);
    let patient_udi = caller_patient_udi(&directory, &user, auth.token()).await?;

    let requests = ConnectionService::new(&config)
        .list_for_patient(&patient_udi, &["accepted"], auth.token())
        .await
        .map_err(map_connection_error)?;

    let data = join_with_doctors(&directory, requests, auth.token()).await?;
    Ok(Json(json!(data)))
}

#[axum::debug_handler]
pub async fn end_session(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(body): Json<RequestIdBody>,
) -> Result<Json<Value>, AppError> {
    let request_id = body
        .request_id
        .ok_or_else(|| AppError::ValidationError("requestId is required".to_string()))?;

    ConnectionService::new(&config)
        .end_session(request_id, auth.token())
        .await
        .map_err(|e| match e {
            ConnectionError::RequestNotFound => {
                AppError::NotFound("Patient request not found".to_string())
            }
            other => map_connection_error(other),
        })?;

    Ok(Json(json!({ "message": "Patient session ended successfully" })))
}

#[axum::debug_handler]
pub async fn reconnect_session(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(body): Json<RequestIdBody>,
) -> Result<Json<Value>, AppError> {
    let request_id = body
        .request_id
        .ok_or_else(|| AppError::ValidationError("requestId is required".to_string()))?;

    ConnectionService::new(&config)
        .reconnect(request_id, auth.token())
        .await
        .map_err(|e| match e {
            ConnectionError::RequestNotFound => {
                AppError::NotFound("Patient request not found".to_string())
            }
            other => map_connection_error(other),
        })?;

    Ok(Json(json!({ "message": "Patient session reconnect successfully" })))
}

async fn join_with_patients(
    directory: &DirectoryService,
    requests: Vec<ConnectionRequest>,
    auth_token: &str,
) -> Result<Vec<Value>, AppError> {
    let udis: Vec<String> = requests.iter().map(|r| r.patient_udi.clone()).collect();
    let profiles = directory
        .patient_profiles_by_udis(&udis, auth_token)
        .await
        .map_err(map_connection_error)?;

    Ok(requests
        .into_iter()
        .map(|request| {
            let profile = profiles.get(&request.patient_udi).cloned();
            json!({
                "requestId": request.id,
                "patientId": request.patient_udi,
                "doctorId": request.doctor_udi,
                "status": request.status,
                "session": request.session,
                "patientData": profile
            })
        })
        .collect())
}

async fn join_with_doctors(
    directory: &DirectoryService,
    requests: Vec<ConnectionRequest>,
    auth_token: &str,
) -> Result<Vec<Value>, AppError> {
    let udis: Vec<String> = requests.iter().map(|r| r.doctor_udi.clone()).collect();
    let profiles = directory
        .doctor_profiles_by_udis(&udis, auth_token)
        .await
        .map_err(map_connection_error)?;

    Ok(requests
        .into_iter()
        .map(|request| {
            let profile = profiles.get(&request.doctor_udi).cloned();
            json!({
                "requestId": request.id,
                "patientId": request.patient_udi,
                "doctorId": request.doctor_udi,
                "status": request.status,
                "session": request.session,
                "doctorData": profile
            })
        })
        .collect())
}
