use axum::extract::{Extension, Query, State};
use axum::Json;
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use patient_cell::handlers::*;
use patient_cell::models::{CompleteProfileRequest, GetDetailsQuery, UpdatePatientProfileRequest};
use shared_models::error::AppError;
use shared_utils::test_utils::{JwtTestUtils, MockStoreRows, TestConfig, TestUser};

fn auth_header(user: &TestUser, config: &TestConfig) -> TypedHeader<Authorization<Bearer>> {
    let token = JwtTestUtils::create_test_token(user, &config.jwt_secret, Some(1));
    TypedHeader(Authorization::bearer(&token).unwrap())
}

fn complete_request() -> CompleteProfileRequest {
    serde_json::from_value(json!({
        "fullName": "Niamh Kelly",
        "gender": "Female",
        "dateOfBirth": "1992-07-02"
    }))
    .unwrap()
}

#[tokio::test]
async fn complete_profile_creates_profile_on_first_submission() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let user = TestUser::patient("353851250001");

    Mock::given(method("GET"))
        .and(path("/rest/v1/patient_accounts"))
        .and(query_param("id", format!("eq.{}", user.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": user.id }])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patient_profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/patient_profiles"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([MockStoreRows::patient_profile_row(&user.id, "NKF600123")])),
        )
        .mount(&mock_server)
        .await;

    let Json(body) = complete_profile(
        State(config.to_arc()),
        auth_header(&user, &config),
        Extension(user.to_user()),
        Json(complete_request()),
    )
    .await
    .unwrap();

    assert_eq!(body["message"], "registered successfully");
    assert_eq!(body["data"]["udi"], "NKF600123");
}

#[tokio::test]
async fn complete_profile_updates_in_place_on_second_submission() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let user = TestUser::patient("353851250002");

    Mock::given(method("GET"))
        .and(path("/rest/v1/patient_accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": user.id }])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patient_profiles"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([MockStoreRows::patient_profile_row(&user.id, "NKF600123")])),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/patient_profiles"))
        .and(query_param("account_id", format!("eq.{}", user.id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([MockStoreRows::patient_profile_row(&user.id, "NKF600123")])),
        )
        .mount(&mock_server)
        .await;

    let Json(body) = complete_profile(
        State(config.to_arc()),
        auth_header(&user, &config),
        Extension(user.to_user()),
        Json(complete_request()),
    )
    .await
    .unwrap();

    assert_eq!(body["message"], "registered successfully");
}

#[tokio::test]
async fn complete_profile_rejects_missing_fields() {
    let config = TestConfig::default();
    let user = TestUser::patient("353851250003");

    let request: CompleteProfileRequest =
        serde_json::from_value(json!({ "fullName": "Niamh Kelly" })).unwrap();

    let result = complete_profile(
        State(config.to_arc()),
        auth_header(&user, &config),
        Extension(user.to_user()),
        Json(request),
    )
    .await;

    assert!(matches!(result, Err(AppError::ValidationError(_))));
}

#[tokio::test]
async fn complete_profile_404_when_account_missing() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let user = TestUser::patient("353851250004");

    Mock::given(method("GET"))
        .and(path("/rest/v1/patient_accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result = complete_profile(
        State(config.to_arc()),
        auth_header(&user, &config),
        Extension(user.to_user()),
        Json(complete_request()),
    )
    .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn get_patient_details_prefers_explicit_query_id() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let doctor = TestUser::doctor("353851250005");
    let patient_account_id = uuid::Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/patient_profiles"))
        .and(query_param("account_id", format!("eq.{}", patient_account_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::patient_profile_row(&patient_account_id.to_string(), "NKF600123")
        ])))
        .mount(&mock_server)
        .await;

    let Json(body) = get_patient_details(
        State(config.to_arc()),
        auth_header(&doctor, &config),
        Extension(doctor.to_user()),
        Query(GetDetailsQuery {
            patient_id: Some(patient_account_id),
        }),
    )
    .await
    .unwrap();

    assert_eq!(body["message"], "Patient data retrieved");
    assert_eq!(body["data"]["udi"], "NKF600123");
}

#[tokio::test]
async fn get_patient_details_404_when_unregistered() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let user = TestUser::patient("353851250006");

    Mock::given(method("GET"))
        .and(path("/rest/v1/patient_profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result = get_patient_details(
        State(config.to_arc()),
        auth_header(&user, &config),
        Extension(user.to_user()),
        Query(GetDetailsQuery { patient_id: None }),
    )
    .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn update_patient_profile_patches_fields() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let user = TestUser::patient("353851250007");

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/patient_profiles"))
        .and(query_param("account_id", format!("eq.{}", user.id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([MockStoreRows::patient_profile_row(&user.id, "NKF600123")])),
        )
        .mount(&mock_server)
        .await;

    let request = UpdatePatientProfileRequest {
        nationality: Some("Irish".to_string()),
        ..Default::default()
    };

    let Json(body) = update_patient_profile(
        State(config.to_arc()),
        auth_header(&user, &config),
        Extension(user.to_user()),
        Json(request),
    )
    .await
    .unwrap();

    assert_eq!(body["message"], "patient profile updated successfully");
}

#[tokio::test]
async fn get_patient_phone_reads_account_row() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let user = TestUser::patient("353851250008");

    Mock::given(method("GET"))
        .and(path("/rest/v1/patient_accounts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "phone_number": user.phone }])),
        )
        .mount(&mock_server)
        .await;

    let Json(body) = get_patient_phone(
        State(config.to_arc()),
        auth_header(&user, &config),
        Extension(user.to_user()),
    )
    .await
    .unwrap();

    assert_eq!(body["phoneNumber"], user.phone.as_str());
}
