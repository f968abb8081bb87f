use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One self-report per (patient, calendar date). `date` is stored as an ISO
/// `YYYY-MM-DD` string after normalization at the edge; `period_day` is kept
/// lowercased.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyEntry {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub date: String,
    pub period_day: String,
    pub pain: String,
    pub pain_level: Option<i32>,
    pub side: Option<String>,
    #[serde(default)]
    pub left_locations: Vec<String>,
    #[serde(default)]
    pub right_locations: Vec<String>,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitDailyEntryRequest {
    pub date: Option<String>,
    pub selected_period_day: Option<String>,
    pub selected_pain: Option<String>,
    pub pain_level: Option<i32>,
    pub selected_side: Option<String>,
    pub selected_left_locations: Option<Vec<String>>,
    pub selected_right_locations: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryFeedbackRequest {
    pub date: Option<String>,
    pub feedback: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEntriesQuery {
    pub patient_id: Option<Uuid>,
    pub duration: Option<String>,
    pub aggregate: Option<String>,
}

/// A fresh entry answers 200 "saved" while an overwrite answers
/// 201 "updated", a swap the mobile client has relied on since the start.
#[derive(Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Saved,
    Updated,
}

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}
