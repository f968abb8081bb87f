use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{representation_headers, SupabaseClient};

use crate::models::{
    AppointmentError, BookOutcome, Booking, BookingStatus, Slot, UpcomingBooking,
};
use crate::services::PushClient;

pub struct BookingService {
    supabase: SupabaseClient,
    config: Arc<AppConfig>,
}

impl BookingService {
    pub fn new(config: &Arc<AppConfig>) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            config: config.clone(),
        }
    }

    /// At most one booking row ever exists per (slot_id, patient_id). A
    /// cancelled row flips back to booked instead of inserting a second one;
    /// the insert branch still maps a store conflict for the racing case.
    pub async fn book(
        &self,
        patient_id: Uuid,
        slot_id: Uuid,
        doctor_id: Uuid,
        date: String,
        start_time: String,
        end_time: String,
        place: String,
        auth_token: &str,
    ) -> Result<BookOutcome, AppointmentError> {
        let existing = self.find_booking(slot_id, patient_id, auth_token).await?;

        if let Some(booking) = existing {
            if booking.booking_status == BookingStatus::Cancel {
                let updated = self
                    .set_status(booking.id, BookingStatus::Booked, auth_token)
                    .await?;
                info!("Booking {} rebooked", updated.id);
                return Ok(BookOutcome::Rebooked(updated));
            }
            return Err(AppointmentError::Conflict(
                "Appointment already booked".to_string(),
            ));
        }

        let now = Utc::now();
        // Caller-supplied snapshot stored verbatim, no drift check against
        // the slot.
        let booking_data = json!({
            "slot_id": slot_id,
            "doctor_id": doctor_id,
            "patient_id": patient_id,
            "date": date,
            "start_time": start_time,
            "end_time": end_time,
            "place": place,
            "booking_status": "booked",
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let rows: Vec<Booking> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/slot_bookings",
                Some(auth_token),
                Some(booking_data),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| {
                if e.is_conflict() {
                    AppointmentError::Conflict("Appointment already booked".to_string())
                } else {
                    AppointmentError::Database(e.to_string())
                }
            })?;

        let booking = rows.into_iter().next().ok_or_else(|| {
            AppointmentError::Database("booking insert returned no row".to_string())
        })?;

        info!("Booking {} created for slot {}", booking.id, slot_id);
        self.notify_doctor(&booking, auth_token);
        Ok(BookOutcome::Booked(booking))
    }

    pub async fn cancel(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
        slot_id: Uuid,
        auth_token: &str,
    ) -> Result<Booking, AppointmentError> {
        let path = format!(
            "/rest/v1/slot_bookings?slot_id=eq.{}&patient_id=eq.{}&doctor_id=eq.{}&booking_status=eq.booked&limit=1",
            slot_id, patient_id, doctor_id
        );
        let rows: Vec<Booking> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        let booking = rows.into_iter().next().ok_or_else(|| {
            AppointmentError::NotFound("Appointment not found or already canceled".to_string())
        })?;

        self.set_status(booking.id, BookingStatus::Cancel, auth_token)
            .await
    }

    pub async fn record_feedback(
        &self,
        patient_id: Uuid,
        slot_id: Uuid,
        rating: f64,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        let booking = self
            .find_booking(slot_id, patient_id, auth_token)
            .await?
            .ok_or_else(|| AppointmentError::NotFound("Appointment not exist".to_string()))?;

        let update_data = json!({
            "feedback_rating": rating,
            "updated_at": Utc::now().to_rfc3339()
        });

        let path = format!("/rest/v1/slot_bookings?id=eq.{}", booking.id);
        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(update_data),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        Ok(())
    }

    /// Upcoming bookings for the patient. Without a doctor filter each
    /// booking is decorated with its doctor's profile, batch-fetched once
    /// per unique doctor id; with a filter the doctor's profile is returned
    /// separately. Every booking carries a flag telling whether the slot's
    /// current tuple has drifted from the booking snapshot.
    pub async fn upcoming_for_patient(
        &self,
        patient_id: Uuid,
        doctor_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<(Vec<UpcomingBooking>, Option<Value>), AppointmentError> {
        let mut path = format!(
            "/rest/v1/slot_bookings?patient_id=eq.{}&booking_status=eq.booked",
            patient_id
        );
        if let Some(doctor_id) = doctor_id {
            path.push_str(&format!("&doctor_id=eq.{}", doctor_id));
        }
        let bookings: Vec<Booking> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        let slot_map = self.fetch_slots(&bookings, auth_token).await?;

        let mut doctor_details = None;
        let mut doctor_map: HashMap<Uuid, Value> = HashMap::new();
        if let Some(doctor_id) = doctor_id {
            doctor_details = self
                .fetch_doctor_profiles(&[doctor_id], auth_token)
                .await?
                .remove(&doctor_id);
        } else {
            let doctor_ids: Vec<Uuid> = bookings
                .iter()
                .map(|b| b.doctor_id)
                .collect::<HashSet<_>>()
                .into_iter()
                .collect();
            doctor_map = self.fetch_doctor_profiles(&doctor_ids, auth_token).await?;
        }

        let upcoming = bookings
            .into_iter()
            .map(|booking| {
                let slot_rescheduled = slot_map
                    .get(&booking.slot_id)
                    .map(|slot| slot_drifted(slot, &booking))
                    .unwrap_or(false);
                let details = doctor_map.get(&booking.doctor_id).cloned();
                UpcomingBooking {
                    slot_rescheduled,
                    doctor_details: details,
                    booking,
                }
            })
            .collect();

        Ok((upcoming, doctor_details))
    }

    async fn find_booking(
        &self,
        slot_id: Uuid,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Option<Booking>, AppointmentError> {
        let path = format!(
            "/rest/v1/slot_bookings?slot_id=eq.{}&patient_id=eq.{}&limit=1",
            slot_id, patient_id
        );
        let rows: Vec<Booking> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        Ok(rows.into_iter().next())
    }

    async fn set_status(
        &self,
        booking_id: Uuid,
        status: BookingStatus,
        auth_token: &str,
    ) -> Result<Booking, AppointmentError> {
        let update_data = json!({
            "booking_status": status,
            "updated_at": Utc::now().to_rfc3339()
        });

        let path = format!("/rest/v1/slot_bookings?id=eq.{}", booking_id);
        let rows: Vec<Booking> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(update_data),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| AppointmentError::NotFound("Appointment not found".to_string()))
    }

    async fn fetch_slots(
        &self,
        bookings: &[Booking],
        auth_token: &str,
    ) -> Result<HashMap<Uuid, Slot>, AppointmentError> {
        let slot_ids: Vec<String> = bookings
            .iter()
            .map(|b| b.slot_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .map(|id| id.to_string())
            .collect();
        if slot_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let path = format!(
            "/rest/v1/appointment_slots?id=in.({})",
            slot_ids.join(",")
        );
        let slots: Vec<Slot> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        Ok(slots.into_iter().map(|s| (s.id, s)).collect())
    }

    async fn fetch_doctor_profiles(
        &self,
        doctor_ids: &[Uuid],
        auth_token: &str,
    ) -> Result<HashMap<Uuid, Value>, AppointmentError> {
        if doctor_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let ids: Vec<String> = doctor_ids.iter().map(|id| id.to_string()).collect();
        let path = format!(
            "/rest/v1/doctor_profiles?account_id=in.({})",
            ids.join(",")
        );
        let profiles: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        Ok(profiles
            .into_iter()
            .filter_map(|profile| {
                profile["account_id"]
                    .as_str()
                    .and_then(|id| id.parse().ok())
                    .map(|id: Uuid| (id, profile))
            })
            .collect())
    }

    fn notify_doctor(&self, booking: &Booking, auth_token: &str) {
        let config = self.config.clone();
        let doctor_id = booking.doctor_id;
        let date = booking.date.clone();
        let start_time = booking.start_time.clone();
        let auth_token = auth_token.to_string();

        tokio::spawn(async move {
            let supabase = SupabaseClient::new(&config);
            let path = format!(
                "/rest/v1/doctor_profiles?account_id=eq.{}&select=device_token&limit=1",
                doctor_id
            );
            let rows: Vec<Value> = match supabase
                .request(Method::GET, &path, Some(&auth_token), None)
                .await
            {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::warn!("Doctor lookup for push notification failed: {}", e);
                    return;
                }
            };

            let device_token = rows
                .into_iter()
                .next()
                .and_then(|row| row["device_token"].as_str().map(String::from));

            if let Some(token) = device_token {
                let body = format!("New appointment booked for {} at {}", date, start_time);
                PushClient::new(&config)
                    .send(&token, "New appointment", &body)
                    .await;
            }
        });
    }
}

/// True when the slot's current tuple no longer matches the booking
/// snapshot.
fn slot_drifted(slot: &Slot, booking: &Booking) -> bool {
    slot.date != booking.date
        || slot.start_time != booking.start_time
        || slot.end_time != booking.end_time
        || slot.place != booking.place
}
