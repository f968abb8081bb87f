use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One logical relationship per (patient UDI, doctor UDI) pair. Both sides
/// are display identifiers; internal account ids never appear in this table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionRequest {
    pub id: Uuid,
    pub patient_udi: String,
    pub doctor_udi: String,
    pub status: ConnectionStatus,
    pub session: Option<Session>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "accepted")]
    Accepted,
    #[serde(rename = "declined")]
    Declined,
}

/// Populated once a request is accepted; toggled by end/reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Session {
    #[serde(rename = "current")]
    Current,
    #[serde(rename = "previous")]
    Previous,
}

#[derive(Debug, Deserialize)]
pub struct ShowDoctorQuery {
    #[serde(rename = "UDI_id")]
    pub udi_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorRequestBody {
    /// Doctor display identifier, not an account id.
    pub doctor_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanBody {
    /// Patient display identifier scanned by the doctor.
    pub patient_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestIdBody {
    pub request_id: Option<Uuid>,
}

#[derive(Debug)]
pub enum RequestOutcome {
    Sent,
    ReopenedToPending,
}

#[derive(Debug)]
pub enum ScanOutcome {
    Connected,
    ReconnectedFromDeclined,
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("User not found as Doctor or Patient")]
    UserNotFound,

    #[error("Request not found")]
    RequestNotFound,

    #[error("Doctor request already exists!")]
    AlreadyExists,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}
