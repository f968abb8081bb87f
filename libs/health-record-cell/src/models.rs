use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// File-backed record (prescription or report). `file_url` points at object
/// storage; the bytes are never interpreted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthRecord {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub file_url: String,
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorNote {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub note: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The two file-backed record families share one code path; only the table
/// and the default label differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Prescription,
    Report,
}

impl RecordKind {
    pub fn table(&self) -> &'static str {
        match self {
            RecordKind::Prescription => "prescriptions",
            RecordKind::Report => "reports",
        }
    }

    pub fn default_label(&self) -> &'static str {
        match self {
            RecordKind::Prescription => "No Label",
            RecordKind::Report => "Report",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            RecordKind::Prescription => "Prescription",
            RecordKind::Report => "Report",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecordRequest {
    /// Base64-encoded file content, optionally with a data-URL prefix.
    pub file: Option<String>,
    pub label: Option<String>,
    pub doctor_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorIdQuery {
    pub doctor_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientIdQuery {
    pub patient_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
    pub patient_id: Option<Uuid>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoteRequest {
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesQuery {
    pub doctor_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
}

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Database error: {0}")]
    Database(String),
}
