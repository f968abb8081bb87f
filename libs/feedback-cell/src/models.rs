use serde::Deserialize;
use serde_json::Value;

/// Rating answers arrive as whatever the survey screen produced, strings or
/// numbers, and are stored untouched.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientFeedbackRequest {
    pub symptom_description_satisfaction: Option<Value>,
    pub consultation_quality: Option<Value>,
    pub health_info_comfort: Option<Value>,
    pub recommendation_likelihood: Option<Value>,
    pub overall_app_experience: Option<Value>,
    pub additional_suggestions: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorFeedbackRequest {
    #[serde(rename = "patientSymptomUsefullorNot")]
    pub patient_symptom_useful: Option<Value>,
    pub patient_experience: Option<Value>,
    pub appointment_ease: Option<Value>,
    pub recommendation: Option<Value>,
    pub app_experience: Option<Value>,
    pub suggestions: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum FeedbackError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}
