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
    AppointmentError, BookOutcome, BookRequest, BookingFeedbackRequest, CancelBookingRequest,
    CancelSlotRequest, CreateSlotRequest, DoctorIdQuery, RescheduleSlotRequest,
    SlotFeedbackRequest,
};
use crate::services::{BookingService, SlotService, StatsService};

fn map_appointment_error(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::Validation(msg) => AppError::ValidationError(msg),
        AppointmentError::Conflict(msg) => AppError::Conflict(msg),
        AppointmentError::NotFound(msg) => AppError::NotFound(msg),
        AppointmentError::Database(msg) => AppError::Database(msg),
    }
}

fn caller_id(user: &User) -> Result<Uuid, AppError> {
    user.id
        .parse()
        .map_err(|_| AppError::Auth("Invalid account id in token".to_string()))
}

#[axum::debug_handler]
pub async fn create_slot(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateSlotRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let doctor_id = caller_id(&user)?;
    let (date, start_time, end_time, place) = match (
        request.date,
        request.start_time,
        request.end_time,
        request.place,
    ) {
        (Some(d), Some(s), Some(e), Some(p))
            if !d.is_empty() && !s.is_empty() && !e.is_empty() && !p.is_empty() =>
        {
            (d, s, e, p)
        }
        _ => {
            return Err(AppError::ValidationError(
                "All fields (date, time, place) are required".to_string(),
            ))
        }
    };

    let slot = SlotService::new(&config)
        .create(doctor_id, date, start_time, end_time, place, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Appointment slot created",
            "appointment": slot
        })),
    ))
}

#[axum::debug_handler]
pub async fn reschedule_slot(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<RescheduleSlotRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = caller_id(&user)?;
    let (slot_id, date, start_time, end_time, place) = match (
        request.appointment_created_id,
        request.date,
        request.start_time,
        request.end_time,
        request.place,
    ) {
        (Some(id), Some(d), Some(s), Some(e), Some(p))
            if !d.is_empty() && !s.is_empty() && !e.is_empty() && !p.is_empty() =>
        {
            (id, d, s, e, p)
        }
        _ => {
            return Err(AppError::ValidationError(
                "All fields (appointmentCreatedId, date, startTime, endTime, place) are required"
                    .to_string(),
            ))
        }
    };

    let slot = SlotService::new(&config)
        .reschedule(doctor_id, slot_id, date, start_time, end_time, place, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "message": "Appointment resedule successfully",
        "appointment": slot
    })))
}

#[axum::debug_handler]
pub async fn cancel_slot(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CancelSlotRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = caller_id(&user)?;
    let slot_id = request.appointment_created_id.ok_or_else(|| {
        AppError::ValidationError("appointmentCreatedId are required".to_string())
    })?;

    let slot = SlotService::new(&config)
        .cancel(doctor_id, slot_id, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "message": "Appointment canceled successfully",
        "appointment": slot
    })))
}

#[axum::debug_handler]
pub async fn doctor_upcoming(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = caller_id(&user)?;

    let (slots, bookings) = SlotService::new(&config)
        .upcoming_for_doctor(doctor_id, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "appointments": slots,
        "bookedAppointments": bookings
    })))
}

#[axum::debug_handler]
pub async fn slot_feedback(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<SlotFeedbackRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = caller_id(&user)?;
    let (slot_id, rating) = match (request.appointment_created_id, request.feedback_rating) {
        (Some(id), Some(r)) => (id, r),
        _ => {
            return Err(AppError::ValidationError(
                "appointmentCreatedId and feedbackRating are required".to_string(),
            ))
        }
    };

    SlotService::new(&config)
        .record_feedback(doctor_id, slot_id, rating, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({ "message": "Feedback submitted successfully" })))
}

#[axum::debug_handler]
pub async fn available_slots(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<DoctorIdQuery>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = query
        .doctor_id
        .ok_or_else(|| AppError::ValidationError("Doctor ID is required".to_string()))?;

    // All slots for the doctor come back, cancelled ones included.
    let slots = SlotService::new(&config)
        .list_for_doctor(doctor_id, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(slots)))
}

#[axum::debug_handler]
pub async fn book(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let patient_id = caller_id(&user)?;
    let (slot_id, doctor_id, date, start_time, end_time, place) = match (
        request.appointment_created_id,
        request.doctor_id,
        request.date,
        request.start_time,
        request.end_time,
        request.place,
    ) {
        (Some(id), Some(doc), Some(d), Some(s), Some(e), Some(p))
            if !d.is_empty() && !s.is_empty() && !e.is_empty() && !p.is_empty() =>
        {
            (id, doc, d, s, e, p)
        }
        _ => {
            return Err(AppError::ValidationError(
                "All fields (appointmentCreatedId, doctorId, date, startTime, endTime, place) are required"
                    .to_string(),
            ))
        }
    };

    let outcome = BookingService::new(&config)
        .book(
            patient_id,
            slot_id,
            doctor_id,
            date,
            start_time,
            end_time,
            place,
            auth.token(),
        )
        .await
        .map_err(map_appointment_error)?;

    match outcome {
        BookOutcome::Booked(booking) => Ok((
            StatusCode::OK,
            Json(json!({
                "message": "Appointment booked successfully",
                "appointment": booking
            })),
        )),
        BookOutcome::Rebooked(booking) => Ok((
            StatusCode::CREATED,
            Json(json!({
                "message": "Appointment rebooked",
                "appointment": booking
            })),
        )),
    }
}

#[axum::debug_handler]
pub async fn cancel_booking(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CancelBookingRequest>,
) -> Result<Json<Value>, AppError> {
    let patient_id = caller_id(&user)?;
    let (slot_id, doctor_id) = match (request.appointment_created_id, request.doctor_id) {
        (Some(id), Some(doc)) => (id, doc),
        _ => {
            return Err(AppError::ValidationError(
                "All fields (appointmentCreatedId, doctorId) are required".to_string(),
            ))
        }
    };

    let booking = BookingService::new(&config)
        .cancel(patient_id, doctor_id, slot_id, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "message": "Appointment canceled successfully",
        "appointment": booking
    })))
}

#[axum::debug_handler]
pub async fn booking_feedback(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookingFeedbackRequest>,
) -> Result<Json<Value>, AppError> {
    let patient_id = caller_id(&user)?;
    let (slot_id, rating) = match (request.appointment_created_id, request.feedback_rating) {
        (Some(id), Some(r)) => (id, r),
        _ => {
            return Err(AppError::ValidationError(
                "appointmentCreatedId and feedbackRating are required".to_string(),
            ))
        }
    };

    BookingService::new(&config)
        .record_feedback(patient_id, slot_id, rating, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({ "message": "Feedback submitted successfully" })))
}

#[axum::debug_handler]
pub async fn patient_upcoming(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<DoctorIdQuery>,
) -> Result<Json<Value>, AppError> {
    let patient_id = caller_id(&user)?;

    let (appointments, doctor_details) = BookingService::new(&config)
        .upcoming_for_patient(patient_id, query.doctor_id, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "appointments": appointments,
        "doctorDetails": doctor_details
    })))
}

#[axum::debug_handler]
pub async fn location_statistics(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = caller_id(&user)?;

    let stats = StatsService::new(&config)
        .location_statistics(doctor_id, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(stats)))
}

#[axum::debug_handler]
pub async fn monthly_statistics(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = caller_id(&user)?;

    let stats = StatsService::new(&config)
        .monthly_statistics(doctor_id, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(stats)))
}
