use axum::extract::{Extension, State};
use axum::Json;
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use feedback_cell::handlers::*;
use feedback_cell::models::{DoctorFeedbackRequest, PatientFeedbackRequest};
use shared_models::error::AppError;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn auth_header(user: &TestUser, config: &TestConfig) -> TypedHeader<Authorization<Bearer>> {
    let token = JwtTestUtils::create_test_token(user, &config.jwt_secret, Some(1));
    TypedHeader(Authorization::bearer(&token).unwrap())
}

#[tokio::test]
async fn patient_feedback_requires_overall_rating() {
    let config = TestConfig::default();
    let patient = TestUser::patient("353851300001");

    let request: PatientFeedbackRequest = serde_json::from_value(json!({
        "consultationQuality": 4,
        "additionalSuggestions": "More reminders"
    }))
    .unwrap();

    let result = submit_patient_feedback(
        State(config.to_arc()),
        auth_header(&patient, &config),
        Extension(patient.to_user()),
        Json(request),
    )
    .await;

    assert!(
        matches!(result, Err(AppError::ValidationError(ref msg)) if msg == "All fields are required.")
    );
}

#[tokio::test]
async fn patient_feedback_stores_row() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let patient = TestUser::patient("353851300002");

    Mock::given(method("POST"))
        .and(path("/rest/v1/patient_app_feedback"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": "f6f9f9a4-0000-0000-0000-000000000001",
            "patient_id": patient.id,
            "overall_app_experience": 5,
            "additional_suggestions": "More reminders"
        }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request: PatientFeedbackRequest = serde_json::from_value(json!({
        "overallAppExperience": 5,
        "additionalSuggestions": "More reminders"
    }))
    .unwrap();

    let Json(body) = submit_patient_feedback(
        State(config.to_arc()),
        auth_header(&patient, &config),
        Extension(patient.to_user()),
        Json(request),
    )
    .await
    .unwrap();

    assert_eq!(body["overall_app_experience"], 5);
}

#[tokio::test]
async fn doctor_feedback_lists_missing_fields() {
    let config = TestConfig::default();
    let doctor = TestUser::doctor("353851300003");

    let request: DoctorFeedbackRequest = serde_json::from_value(json!({
        "patientSymptomUsefullorNot": "Yes",
        "appointmentEase": 4
    }))
    .unwrap();

    let result = submit_doctor_feedback(
        State(config.to_arc()),
        auth_header(&doctor, &config),
        Extension(doctor.to_user()),
        Json(request),
    )
    .await;

    assert!(
        matches!(result, Err(AppError::ValidationError(ref msg))
            if msg == "Missing required fields: patientExperience, recommendation, appExperience")
    );
}

#[tokio::test]
async fn doctor_feedback_stores_row() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let doctor = TestUser::doctor("353851300004");

    Mock::given(method("POST"))
        .and(path("/rest/v1/doctor_app_feedback"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": "f6f9f9a4-0000-0000-0000-000000000002",
            "doctor_id": doctor.id,
            "app_experience": 4,
            "suggestions": null
        }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request: DoctorFeedbackRequest = serde_json::from_value(json!({
        "patientSymptomUsefullorNot": "Yes",
        "patientExperience": 5,
        "appointmentEase": 4,
        "recommendation": 5,
        "appExperience": 4
    }))
    .unwrap();

    let Json(body) = submit_doctor_feedback(
        State(config.to_arc()),
        auth_header(&doctor, &config),
        Extension(doctor.to_user()),
        Json(request),
    )
    .await
    .unwrap();

    assert_eq!(body["app_experience"], 4);
}
