use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Appointment slot authored by a doctor. `date`, `start_time` and
/// `end_time` are stored as strings, never parsed into a temporal type;
/// uniqueness of (doctor_id, date, start_time, end_time, place) is a store
/// index, not an application check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub place: String,
    pub active_status: bool,
    pub feedback_rating: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Patient reservation against a slot. Date/time/place are a snapshot taken
/// at booking time and are not re-synchronized when the slot is rescheduled;
/// the patient surface exposes a `slot_rescheduled` flag instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub place: String,
    pub booking_status: BookingStatus,
    pub feedback_rating: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// "complete" never gets written anywhere; the lifecycle only toggles
/// between these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    #[serde(rename = "booked")]
    Booked,
    #[serde(rename = "cancel")]
    Cancel,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlotRequest {
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub place: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleSlotRequest {
    pub appointment_created_id: Option<Uuid>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub place: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelSlotRequest {
    pub appointment_created_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotFeedbackRequest {
    pub appointment_created_id: Option<Uuid>,
    pub feedback_rating: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    pub appointment_created_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub place: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelBookingRequest {
    pub appointment_created_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingFeedbackRequest {
    pub appointment_created_id: Option<Uuid>,
    pub feedback_rating: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorIdQuery {
    pub doctor_id: Option<Uuid>,
}

/// Outcome of a book call: a fresh reservation responds 200, flipping a
/// previously cancelled one back responds 201 "rebooked".
#[derive(Debug)]
pub enum BookOutcome {
    Booked(Booking),
    Rebooked(Booking),
}

/// Booking decorated for the patient's upcoming list.
#[derive(Debug, Serialize)]
pub struct UpcomingBooking {
    #[serde(flatten)]
    pub booking: Booking,
    #[serde(rename = "doctorDetails", skip_serializing_if = "Option::is_none")]
    pub doctor_details: Option<serde_json::Value>,
    #[serde(rename = "slotRescheduled")]
    pub slot_rescheduled: bool,
}

/// Per-location aggregate. `cancels` counts the literal status "canceled",
/// which the booking lifecycle never writes, so it stays zero; `requests`
/// and `visited` are derived from the same counts the original reported.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationStat {
    pub location: String,
    pub appointment: u64,
    pub requests: u64,
    pub confirmed: u64,
    pub cancels: u64,
    pub visited: u64,
    pub max_patient_day: Option<String>,
}

/// Per-month aggregate. `visits`/`cancellations` read `active_status` off
/// the raw booking rows, a field only slots carry, so both stay zero.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStat {
    pub month: String,
    pub total_booked: u64,
    pub booked_per_day: f64,
    pub appointments: usize,
    pub visits: u64,
    pub cancellations: u64,
    pub max_patient_count: u64,
    pub max_patient_date: Option<u32>,
}

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}
