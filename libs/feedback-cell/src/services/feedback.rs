use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{representation_headers, SupabaseClient};

use crate::models::{DoctorFeedbackRequest, FeedbackError, PatientFeedbackRequest};

pub struct FeedbackService {
    supabase: SupabaseClient,
}

impl FeedbackService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn submit_patient(
        &self,
        patient_id: Uuid,
        request: PatientFeedbackRequest,
        auth_token: &str,
    ) -> Result<Value, FeedbackError> {
        let feedback_data = json!({
            "patient_id": patient_id,
            "symptom_description_satisfaction": request.symptom_description_satisfaction,
            "consultation_quality": request.consultation_quality,
            "health_info_comfort": request.health_info_comfort,
            "recommendation_likelihood": request.recommendation_likelihood,
            "overall_app_experience": request.overall_app_experience,
            "additional_suggestions": request.additional_suggestions,
            "created_at": Utc::now().to_rfc3339()
        });

        let row = self
            .insert("/rest/v1/patient_app_feedback", feedback_data, auth_token)
            .await?;
        info!("App feedback stored for patient {}", patient_id);
        Ok(row)
    }

    pub async fn submit_doctor(
        &self,
        doctor_id: Uuid,
        request: DoctorFeedbackRequest,
        auth_token: &str,
    ) -> Result<Value, FeedbackError> {
        let feedback_data = json!({
            "doctor_id": doctor_id,
            "patient_symptom_useful": request.patient_symptom_useful,
            "patient_experience": request.patient_experience,
            "appointment_ease": request.appointment_ease,
            "recommendation": request.recommendation,
            "app_experience": request.app_experience,
            "suggestions": request.suggestions,
            "created_at": Utc::now().to_rfc3339()
        });

        let row = self
            .insert("/rest/v1/doctor_app_feedback", feedback_data, auth_token)
            .await?;
        info!("App feedback stored for doctor {}", doctor_id);
        Ok(row)
    }

    async fn insert(
        &self,
        path: &str,
        feedback_data: Value,
        auth_token: &str,
    ) -> Result<Value, FeedbackError> {
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                path,
                Some(auth_token),
                Some(feedback_data),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| FeedbackError::Database(e.to_string()))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| FeedbackError::Database("feedback insert returned no row".to_string()))
    }
}
