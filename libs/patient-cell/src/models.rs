use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Patient profile row. `udi` is the display identifier handed to doctors
/// during the connection workflow; it is never used as a storage key for
/// slots or bookings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientProfile {
    pub id: Uuid,
    pub account_id: Uuid,
    pub full_name: String,
    pub gender: String,
    pub date_of_birth: NaiveDate,
    pub age: i32,
    pub nationality: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub udi: String,
    pub profile_image_url: Option<String>,
    pub device_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteProfileRequest {
    pub full_name: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatientProfileRequest {
    pub full_name: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// Base64-encoded image, optionally with a data-URL prefix.
    pub profile_image: Option<String>,
    pub device_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDetailsQuery {
    pub patient_id: Option<Uuid>,
}

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("Phone number not found")]
    AccountNotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Database error: {0}")]
    Database(String),
}
