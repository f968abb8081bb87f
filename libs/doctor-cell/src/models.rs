use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Doctor profile row. `account_id` points at the phone-verified account;
/// `udi` is the human-shareable display identifier used by the connection
/// workflow (a separate namespace from `account_id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub id: Uuid,
    pub account_id: Uuid,
    pub full_name: String,
    pub gender: String,
    pub date_of_birth: NaiveDate,
    pub age: i32,
    pub email: String,
    pub specialization: String,
    pub udi: String,
    pub profile_image_url: Option<String>,
    pub device_token: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDoctorRequest {
    pub full_name: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub email: Option<String>,
    pub specialization: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDoctorProfileRequest {
    pub full_name: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub email: Option<String>,
    pub specialization: Option<String>,
    /// Base64-encoded image, optionally with a data-URL prefix.
    pub profile_image: Option<String>,
    pub device_token: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Phone number not found")]
    AccountNotFound,

    #[error("Doctor profile already exists")]
    ProfileExists,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Database error: {0}")]
    Database(String),
}
