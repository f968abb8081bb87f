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
    EntryFeedbackRequest, JournalError, ListEntriesQuery, SubmitDailyEntryRequest, SubmitOutcome,
};
use crate::services::journal::{
    duration_start, pain_level_counts, parse_entry_date, EntryFields,
};
use crate::services::JournalService;

fn map_journal_error(e: JournalError) -> AppError {
    match e {
        JournalError::Validation(msg) => AppError::ValidationError(msg),
        JournalError::NotFound(msg) => AppError::NotFound(msg),
        JournalError::Database(msg) => AppError::Database(msg),
    }
}

fn caller_id(user: &User) -> Result<Uuid, AppError> {
    user.id
        .parse()
        .map_err(|_| AppError::Auth("Invalid account id in token".to_string()))
}

fn normalized_date(raw: Option<&str>) -> Result<String, AppError> {
    raw.and_then(parse_entry_date)
        .ok_or_else(|| AppError::ValidationError("Invalid or missing date format".to_string()))
}

/// The pain questions cascade: a "Yes" needs a level and a side, and each
/// side needs its location list.
fn validated_fields(request: SubmitDailyEntryRequest) -> Result<EntryFields, AppError> {
    let invalid =
        || AppError::ValidationError("Invalid data format or missing required fields".to_string());

    let period_day = request
        .selected_period_day
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(invalid)?
        .to_lowercase();
    let pain = request
        .selected_pain
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(invalid)?;

    if pain == "Yes" && (request.pain_level.is_none() || request.selected_side.is_none()) {
        return Err(invalid());
    }
    match request.selected_side.as_deref() {
        Some("Left") if request.selected_left_locations.is_none() => return Err(invalid()),
        Some("Right") if request.selected_right_locations.is_none() => return Err(invalid()),
        Some("Both")
            if request.selected_left_locations.is_none()
                || request.selected_right_locations.is_none() =>
        {
            return Err(invalid())
        }
        _ => {}
    }

    Ok(EntryFields {
        period_day,
        pain,
        pain_level: request.pain_level,
        side: request.selected_side,
        left_locations: request.selected_left_locations.unwrap_or_default(),
        right_locations: request.selected_right_locations.unwrap_or_default(),
    })
}

#[axum::debug_handler]
pub async fn submit_daily_entry(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<SubmitDailyEntryRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let patient_id = caller_id(&user)?;
    let date = normalized_date(request.date.as_deref())?;
    let fields = validated_fields(request)?;

    let outcome = JournalService::new(&config)
        .submit(patient_id, &date, fields, auth.token())
        .await
        .map_err(map_journal_error)?;

    // The longstanding client contract: overwrites answer 201, fresh
    // entries answer 200.
    Ok(match outcome {
        SubmitOutcome::Updated => (
            StatusCode::CREATED,
            Json(json!({ "message": "Daily entry updated successfully" })),
        ),
        SubmitOutcome::Saved => (
            StatusCode::OK,
            Json(json!({ "message": "Daily entry saved successfully" })),
        ),
    })
}

#[axum::debug_handler]
pub async fn record_entry_feedback(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<EntryFeedbackRequest>,
) -> Result<Json<Value>, AppError> {
    let patient_id = caller_id(&user)?;
    let date = normalized_date(request.date.as_deref())?;
    let feedback = request.feedback.unwrap_or_default();

    JournalService::new(&config)
        .record_feedback(patient_id, &date, &feedback, auth.token())
        .await
        .map_err(map_journal_error)?;

    Ok(Json(json!({ "message": "Feedback updated successfully" })))
}

#[axum::debug_handler]
pub async fn list_entries(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<ListEntriesQuery>,
) -> Result<Json<Value>, AppError> {
    let patient_id = match query.patient_id {
        Some(id) => id,
        None => caller_id(&user)?,
    };
    let start = query
        .duration
        .as_deref()
        .and_then(|d| duration_start(d, chrono::Utc::now().date_naive()));

    let entries = JournalService::new(&config)
        .list(patient_id, start, auth.token())
        .await
        .map_err(map_journal_error)?;

    if query.aggregate.as_deref() == Some("painLevels") {
        return Ok(Json(json!(pain_level_counts(&entries))));
    }
    Ok(Json(json!(entries)))
}
