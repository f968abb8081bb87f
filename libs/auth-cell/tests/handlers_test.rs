use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_cell::handlers::*;
use auth_cell::models::{GenerateOtpRequest, RefreshTokenRequest, VerifyOtpRequest};
use auth_cell::services::otp;
use shared_models::error::AppError;
use shared_utils::test_utils::{JwtTestUtils, MockStoreRows, TestConfig, TestUser};

fn verify_request(phone: &str, code: &str) -> VerifyOtpRequest {
    VerifyOtpRequest {
        phone_number: Some(phone.to_string()),
        otp: Some(code.to_string()),
    }
}

#[tokio::test]
async fn generate_otp_requires_phone_number() {
    let config = TestConfig::default().to_arc();

    let result = generate_otp(
        State(config),
        Json(GenerateOtpRequest { phone_number: None }),
    )
    .await;

    assert!(matches!(result, Err(AppError::ValidationError(_))));
}

#[tokio::test]
async fn generate_otp_fails_when_sms_gateway_unconfigured() {
    // TestConfig leaves the SMS gateway blank
    let config = TestConfig::default().to_arc();

    let result = generate_otp(
        State(config),
        Json(GenerateOtpRequest {
            phone_number: Some("353851230000".to_string()),
        }),
    )
    .await;

    assert!(matches!(result, Err(AppError::ExternalService(_))));
}

#[tokio::test]
async fn verify_otp_new_phone_creates_account_and_returns_200() {
    let mock_server = MockServer::start().await;
    let test_config = TestConfig::with_supabase_url(&mock_server.uri());
    let phone = "353851230001";
    let account_id = uuid::Uuid::new_v4().to_string();

    otp::store_code(phone, "1234", &test_config.jwt_secret).unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_accounts"))
        .and(query_param("phone_number", format!("eq.{}", phone)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/doctor_accounts"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([MockStoreRows::account_row(&account_id, phone)])),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/doctor_accounts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([MockStoreRows::account_row(&account_id, phone)])),
        )
        .mount(&mock_server)
        .await;

    let (status, Json(body)) = verify_otp_doctor(
        State(test_config.to_arc()),
        Json(verify_request(phone, "1234")),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Phone number saved successfully");
    assert!(body["accessToken"].as_str().is_some());
    assert!(body["refreshToken"].as_str().is_some());
}

#[tokio::test]
async fn verify_otp_known_phone_with_profile_returns_202() {
    let mock_server = MockServer::start().await;
    let test_config = TestConfig::with_supabase_url(&mock_server.uri());
    let phone = "353851230002";
    let account_id = uuid::Uuid::new_v4().to_string();

    otp::store_code(phone, "4321", &test_config.jwt_secret).unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/patient_accounts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([MockStoreRows::account_row(&account_id, phone)])),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patient_profiles"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "id": uuid::Uuid::new_v4() }])),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/patient_accounts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([MockStoreRows::account_row(&account_id, phone)])),
        )
        .mount(&mock_server)
        .await;

    let (status, Json(body)) = verify_otp_patient(
        State(test_config.to_arc()),
        Json(verify_request(phone, "4321")),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["message"], "User profile exists");
}

#[tokio::test]
async fn verify_otp_rejects_wrong_code() {
    let test_config = TestConfig::default();
    let phone = "353851230003";

    otp::store_code(phone, "1234", &test_config.jwt_secret).unwrap();

    let result = verify_otp_patient(
        State(test_config.to_arc()),
        Json(verify_request(phone, "0000")),
    )
    .await;

    assert!(matches!(result, Err(AppError::ValidationError(ref msg)) if msg == "Invalid OTP"));
}

#[tokio::test]
async fn verify_otp_rejects_unknown_phone() {
    let test_config = TestConfig::default();

    let result = verify_otp_patient(
        State(test_config.to_arc()),
        Json(verify_request("353851239999", "1234")),
    )
    .await;

    assert!(
        matches!(result, Err(AppError::ValidationError(ref msg)) if msg == "OTP has expired or is invalid")
    );
}

#[tokio::test]
async fn refresh_rotates_tokens_when_stored_token_matches() {
    let mock_server = MockServer::start().await;
    let test_config = TestConfig::with_supabase_url(&mock_server.uri());
    let user = TestUser::doctor("353851230004");
    let refresh = JwtTestUtils::create_test_token(&user, &test_config.jwt_secret, Some(24 * 30));

    let mut account = MockStoreRows::account_row(&user.id, &user.phone);
    account["refresh_token"] = json!(refresh.clone());

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_accounts"))
        .and(query_param("id", format!("eq.{}", user.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([account])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/doctor_accounts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([MockStoreRows::account_row(&user.id, &user.phone)])),
        )
        .mount(&mock_server)
        .await;

    let Json(body) = refresh_token_doctor(
        State(test_config.to_arc()),
        Json(RefreshTokenRequest {
            refresh_token: Some(refresh),
        }),
    )
    .await
    .unwrap();

    assert_eq!(body["message"], "Access token refreshed successfully");
    assert!(body["accessToken"].as_str().is_some());
}

#[tokio::test]
async fn refresh_rejects_token_that_does_not_match_stored_one() {
    let mock_server = MockServer::start().await;
    let test_config = TestConfig::with_supabase_url(&mock_server.uri());
    let user = TestUser::doctor("353851230005");
    let presented = JwtTestUtils::create_test_token(&user, &test_config.jwt_secret, Some(24));

    let mut account = MockStoreRows::account_row(&user.id, &user.phone);
    account["refresh_token"] = json!("some-other-token");

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([account])))
        .mount(&mock_server)
        .await;

    let result = refresh_token_doctor(
        State(test_config.to_arc()),
        Json(RefreshTokenRequest {
            refresh_token: Some(presented),
        }),
    )
    .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn refresh_rejects_garbage_token() {
    let test_config = TestConfig::default();

    let result = refresh_token_patient(
        State(test_config.to_arc()),
        Json(RefreshTokenRequest {
            refresh_token: Some(JwtTestUtils::create_malformed_token()),
        }),
    )
    .await;

    assert!(matches!(result, Err(AppError::Auth(_))));
}

#[tokio::test]
async fn logout_clears_refresh_token() {
    let mock_server = MockServer::start().await;
    let test_config = TestConfig::with_supabase_url(&mock_server.uri());
    let user = TestUser::patient("353851230006");

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/patient_accounts"))
        .and(query_param("id", format!("eq.{}", user.id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([MockStoreRows::account_row(&user.id, &user.phone)])),
        )
        .mount(&mock_server)
        .await;

    let Json(body) = patient_logout(State(test_config.to_arc()), Extension(user.to_user()))
        .await
        .unwrap();

    assert_eq!(body["message"], "Logout successfully");
}
