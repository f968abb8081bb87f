use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{representation_headers, SupabaseClient};

use crate::models::{AppointmentError, Booking, Slot};

pub struct SlotService {
    supabase: SupabaseClient,
}

impl SlotService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Single conditional insert; the store holds a unique index on
    /// (doctor_id, date, start_time, end_time, place) and a violation
    /// surfaces as a conflict. No pre-read.
    pub async fn create(
        &self,
        doctor_id: Uuid,
        date: String,
        start_time: String,
        end_time: String,
        place: String,
        auth_token: &str,
    ) -> Result<Slot, AppointmentError> {
        let now = Utc::now();
        let slot_data = json!({
            "doctor_id": doctor_id,
            "date": date,
            "start_time": start_time,
            "end_time": end_time,
            "place": place,
            "active_status": true,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let rows: Vec<Slot> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointment_slots",
                Some(auth_token),
                Some(slot_data),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| {
                if e.is_conflict() {
                    AppointmentError::Conflict(
                        "An appointment at this date, time, and place already exists."
                            .to_string(),
                    )
                } else {
                    AppointmentError::Database(e.to_string())
                }
            })?;

        let slot = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::Database("slot insert returned no row".to_string()))?;

        info!("Appointment slot created for doctor {}", doctor_id);
        Ok(slot)
    }

    /// Overwrites the slot fields and forces it active again. Bookings keep
    /// their snapshot; the patient list surfaces the drift as a flag.
    pub async fn reschedule(
        &self,
        doctor_id: Uuid,
        slot_id: Uuid,
        date: String,
        start_time: String,
        end_time: String,
        place: String,
        auth_token: &str,
    ) -> Result<Slot, AppointmentError> {
        self.find_owned(slot_id, doctor_id, None, auth_token)
            .await?
            .ok_or_else(|| AppointmentError::NotFound("Appointment not found".to_string()))?;

        let update_data = json!({
            "date": date,
            "start_time": start_time,
            "end_time": end_time,
            "place": place,
            "active_status": true,
            "updated_at": Utc::now().to_rfc3339()
        });

        let path = format!(
            "/rest/v1/appointment_slots?id=eq.{}&doctor_id=eq.{}",
            slot_id, doctor_id
        );
        let rows: Vec<Slot> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(update_data),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| {
                if e.is_conflict() {
                    AppointmentError::Conflict(
                        "An appointment at this date, time, and place already exists."
                            .to_string(),
                    )
                } else {
                    AppointmentError::Database(e.to_string())
                }
            })?;

        rows.into_iter()
            .next()
            .ok_or_else(|| AppointmentError::NotFound("Appointment not found".to_string()))
    }

    pub async fn cancel(
        &self,
        doctor_id: Uuid,
        slot_id: Uuid,
        auth_token: &str,
    ) -> Result<Slot, AppointmentError> {
        self.find_owned(slot_id, doctor_id, Some(true), auth_token)
            .await?
            .ok_or_else(|| {
                AppointmentError::NotFound(
                    "Appointment not found or already canceled".to_string(),
                )
            })?;

        let update_data = json!({
            "active_status": false,
            "updated_at": Utc::now().to_rfc3339()
        });

        let path = format!(
            "/rest/v1/appointment_slots?id=eq.{}&doctor_id=eq.{}",
            slot_id, doctor_id
        );
        let rows: Vec<Slot> = self
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

    /// Returns every slot for the doctor regardless of `active_status`.
    pub async fn list_for_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Slot>, AppointmentError> {
        let path = format!("/rest/v1/appointment_slots?doctor_id=eq.{}", doctor_id);
        self.supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))
    }

    /// Active slots plus, separately, the bookings currently held against
    /// the doctor.
    pub async fn upcoming_for_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<(Vec<Slot>, Vec<Booking>), AppointmentError> {
        let slots_path = format!(
            "/rest/v1/appointment_slots?doctor_id=eq.{}&active_status=eq.true",
            doctor_id
        );
        let slots: Vec<Slot> = self
            .supabase
            .request(Method::GET, &slots_path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        let bookings_path = format!(
            "/rest/v1/slot_bookings?doctor_id=eq.{}&booking_status=eq.booked",
            doctor_id
        );
        let bookings: Vec<Booking> = self
            .supabase
            .request(Method::GET, &bookings_path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        Ok((slots, bookings))
    }

    pub async fn record_feedback(
        &self,
        doctor_id: Uuid,
        slot_id: Uuid,
        rating: f64,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        self.find_owned(slot_id, doctor_id, None, auth_token)
            .await?
            .ok_or_else(|| AppointmentError::NotFound("Appointment not exist".to_string()))?;

        let update_data = json!({
            "feedback_rating": rating,
            "updated_at": Utc::now().to_rfc3339()
        });

        let path = format!(
            "/rest/v1/appointment_slots?id=eq.{}&doctor_id=eq.{}",
            slot_id, doctor_id
        );
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

    async fn find_owned(
        &self,
        slot_id: Uuid,
        doctor_id: Uuid,
        active: Option<bool>,
        auth_token: &str,
    ) -> Result<Option<Slot>, AppointmentError> {
        let mut path = format!(
            "/rest/v1/appointment_slots?id=eq.{}&doctor_id=eq.{}",
            slot_id, doctor_id
        );
        if let Some(active) = active {
            path.push_str(&format!("&active_status=eq.{}", active));
        }
        path.push_str("&limit=1");

        let rows: Vec<Slot> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        Ok(rows.into_iter().next())
    }
}
