use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{representation_headers, SupabaseClient};

use crate::models::{DoctorNote, RecordError};

pub struct NoteService {
    supabase: SupabaseClient,
}

impl NoteService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create(
        &self,
        doctor_id: Uuid,
        patient_id: Uuid,
        note: &str,
        auth_token: &str,
    ) -> Result<DoctorNote, RecordError> {
        let now = Utc::now();
        let note_data = json!({
            "doctor_id": doctor_id,
            "patient_id": patient_id,
            "note": note.trim(),
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let rows: Vec<DoctorNote> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/doctor_notes",
                Some(auth_token),
                Some(note_data),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| RecordError::Database(e.to_string()))?;

        let created = rows
            .into_iter()
            .next()
            .ok_or_else(|| RecordError::Database("note insert returned no row".to_string()))?;

        info!("Note {} created for patient {}", created.id, patient_id);
        Ok(created)
    }

    /// Notes for one (doctor, patient) pair, newest first.
    pub async fn list(
        &self,
        doctor_id: Uuid,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<DoctorNote>, RecordError> {
        let path = format!(
            "/rest/v1/doctor_notes?doctor_id=eq.{}&patient_id=eq.{}&order=created_at.desc",
            doctor_id, patient_id
        );
        self.supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| RecordError::Database(e.to_string()))
    }

    pub async fn update(
        &self,
        doctor_id: Uuid,
        note_id: Uuid,
        note: &str,
        auth_token: &str,
    ) -> Result<DoctorNote, RecordError> {
        let update_data = json!({
            "note": note.trim(),
            "updated_at": Utc::now().to_rfc3339()
        });

        // Scoping the PATCH by doctor_id is the ownership check; no row
        // back means not found or not the caller's note.
        let path = format!(
            "/rest/v1/doctor_notes?id=eq.{}&doctor_id=eq.{}",
            note_id, doctor_id
        );
        let rows: Vec<DoctorNote> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(update_data),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| RecordError::Database(e.to_string()))?;

        rows.into_iter().next().ok_or(RecordError::NotFound("Note"))
    }

    pub async fn delete(
        &self,
        doctor_id: Uuid,
        note_id: Uuid,
        auth_token: &str,
    ) -> Result<(), RecordError> {
        let path = format!(
            "/rest/v1/doctor_notes?id=eq.{}&doctor_id=eq.{}",
            note_id, doctor_id
        );
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                Some(auth_token),
                None,
                Some(representation_headers()),
            )
            .await
            .map_err(|e| RecordError::Database(e.to_string()))?;

        if rows.is_empty() {
            return Err(RecordError::NotFound("Note"));
        }
        Ok(())
    }
}
