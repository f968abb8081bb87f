use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Row in `doctor_accounts` / `patient_accounts`. One row per verified phone
/// number; the profile cells hang off `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub phone_number: String,
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateOtpRequest {
    pub phone_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub phone_number: Option<String>,
    pub otp: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: Option<String>,
}

/// Outcome of a successful OTP verification. The HTTP status depends on how
/// far the caller has got through onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Phone number seen for the first time.
    NewPhone,
    /// Phone number known but no profile registered yet.
    NoProfile,
    /// Profile exists; caller is fully onboarded.
    ProfileExists,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("OTP has expired or is invalid")]
    OtpExpired,

    #[error("Invalid OTP")]
    OtpInvalid,

    #[error("SMS gateway is not configured")]
    SmsNotConfigured,

    #[error("Failed to deliver OTP: {0}")]
    SmsDelivery(String),

    #[error("Invalid or expired refresh token")]
    InvalidRefreshToken,

    #[error("Expired or invalid refresh token")]
    RefreshTokenMismatch,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Token error: {0}")]
    Token(String),

    #[error("Database error: {0}")]
    Database(String),
}
