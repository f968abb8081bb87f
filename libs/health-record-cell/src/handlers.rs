use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
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
    CreateNoteRequest, DoctorIdQuery, NotesQuery, PatientIdQuery, RecordError, RecordKind,
    UpdateNoteRequest, UploadRecordRequest,
};
use crate::services::{NoteService, RecordService};

fn map_record_error(e: RecordError) -> AppError {
    match e {
        RecordError::NotFound(what) => AppError::NotFound(format!("{} not found", what)),
        RecordError::Validation(msg) => AppError::ValidationError(msg),
        RecordError::Upload(msg) => AppError::ExternalService(msg),
        RecordError::Database(msg) => AppError::Database(msg),
    }
}

fn caller_id(user: &User) -> Result<Uuid, AppError> {
    user.id
        .parse()
        .map_err(|_| AppError::Auth("Invalid account id in token".to_string()))
}

async fn upload_record(
    kind: RecordKind,
    config: Arc<AppConfig>,
    auth_token: &str,
    user: &User,
    request: UploadRecordRequest,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let patient_id = caller_id(user)?;
    let file = request
        .file
        .filter(|f| !f.is_empty())
        .ok_or_else(|| AppError::ValidationError("No file uploaded".to_string()))?;

    let record = RecordService::new(&config)
        .upload(kind, patient_id, request.doctor_id, &file, request.label, auth_token)
        .await
        .map_err(map_record_error)?;

    Ok((StatusCode::CREATED, Json(json!(record))))
}

#[axum::debug_handler]
pub async fn upload_prescription(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UploadRecordRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    upload_record(RecordKind::Prescription, config, auth.token(), &user, request).await
}

#[axum::debug_handler]
pub async fn upload_report(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UploadRecordRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    upload_record(RecordKind::Report, config, auth.token(), &user, request).await
}

async fn patient_records(
    kind: RecordKind,
    config: Arc<AppConfig>,
    auth_token: &str,
    user: &User,
    doctor_id: Option<Uuid>,
) -> Result<Json<Value>, AppError> {
    let patient_id = caller_id(user)?;
    let records = RecordService::new(&config)
        .list_for_patient(kind, patient_id, doctor_id, auth_token)
        .await
        .map_err(map_record_error)?;
    Ok(Json(json!(records)))
}

#[axum::debug_handler]
pub async fn patient_prescriptions(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<DoctorIdQuery>,
) -> Result<Json<Value>, AppError> {
    patient_records(RecordKind::Prescription, config, auth.token(), &user, query.doctor_id).await
}

#[axum::debug_handler]
pub async fn patient_reports(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<DoctorIdQuery>,
) -> Result<Json<Value>, AppError> {
    patient_records(RecordKind::Report, config, auth.token(), &user, query.doctor_id).await
}

async fn doctor_records(
    kind: RecordKind,
    config: Arc<AppConfig>,
    auth_token: &str,
    user: &User,
    patient_id: Option<Uuid>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = caller_id(user)?;
    let patient_id = patient_id
        .ok_or_else(|| AppError::ValidationError("patientId is required".to_string()))?;

    let records = RecordService::new(&config)
        .list_for_doctor(kind, doctor_id, patient_id, auth_token)
        .await
        .map_err(map_record_error)?;
    Ok(Json(json!(records)))
}

#[axum::debug_handler]
pub async fn doctor_prescriptions(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<PatientIdQuery>,
) -> Result<Json<Value>, AppError> {
    doctor_records(RecordKind::Prescription, config, auth.token(), &user, query.patient_id).await
}

#[axum::debug_handler]
pub async fn doctor_reports(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<PatientIdQuery>,
) -> Result<Json<Value>, AppError> {
    doctor_records(RecordKind::Report, config, auth.token(), &user, query.patient_id).await
}

async fn delete_record(
    kind: RecordKind,
    config: Arc<AppConfig>,
    auth_token: &str,
    user: &User,
    record_id: Uuid,
) -> Result<Json<Value>, AppError> {
    let patient_id = caller_id(user)?;
    RecordService::new(&config)
        .delete(kind, patient_id, record_id, auth_token)
        .await
        .map_err(map_record_error)?;

    Ok(Json(json!({
        "message": format!("{} deleted successfully", kind.display_name())
    })))
}

#[axum::debug_handler]
pub async fn delete_prescription(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(record_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    delete_record(RecordKind::Prescription, config, auth.token(), &user, record_id).await
}

#[axum::debug_handler]
pub async fn delete_report(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(record_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    delete_record(RecordKind::Report, config, auth.token(), &user, record_id).await
}

#[axum::debug_handler]
pub async fn create_note(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let doctor_id = caller_id(&user)?;
    let (patient_id, note) = match (request.patient_id, request.note) {
        (Some(p), Some(n)) if !n.trim().is_empty() => (p, n),
        _ => {
            return Err(AppError::ValidationError(
                "patientId, note are required".to_string(),
            ))
        }
    };

    let created = NoteService::new(&config)
        .create(doctor_id, patient_id, &note, auth.token())
        .await
        .map_err(map_record_error)?;

    Ok((StatusCode::CREATED, Json(json!(created))))
}

/// The pair filter falls back to the caller for whichever side the query
/// leaves out, so a doctor passes `patientId` and a patient `doctorId`.
#[axum::debug_handler]
pub async fn list_notes(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<NotesQuery>,
) -> Result<Json<Value>, AppError> {
    let caller = caller_id(&user)?;
    let doctor_id = query.doctor_id.unwrap_or(caller);
    let patient_id = query.patient_id.unwrap_or(caller);

    let notes = NoteService::new(&config)
        .list(doctor_id, patient_id, auth.token())
        .await
        .map_err(map_record_error)?;

    Ok(Json(json!(notes)))
}

#[axum::debug_handler]
pub async fn update_note(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(note_id): Path<Uuid>,
    Json(request): Json<UpdateNoteRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = caller_id(&user)?;
    let note = request
        .note
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AppError::ValidationError("note is required".to_string()))?;

    let updated = NoteService::new(&config)
        .update(doctor_id, note_id, &note, auth.token())
        .await
        .map_err(map_record_error)?;

    Ok(Json(json!(updated)))
}

#[axum::debug_handler]
pub async fn delete_note(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(note_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = caller_id(&user)?;

    NoteService::new(&config)
        .delete(doctor_id, note_id, auth.token())
        .await
        .map_err(map_record_error)?;

    Ok(Json(json!({ "message": "Note deleted successfully" })))
}
