use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use axum::Json;
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use connection_cell::handlers::*;
use connection_cell::models::{DoctorRequestBody, RequestIdBody, ScanBody, ShowDoctorQuery};
use shared_models::error::AppError;
use shared_utils::test_utils::{JwtTestUtils, MockStoreRows, TestConfig, TestUser};

const DOCTOR_UDI: &str = "DFONC600123";
const PATIENT_UDI: &str = "NKF600123";

fn auth_header(user: &TestUser, config: &TestConfig) -> TypedHeader<Authorization<Bearer>> {
    let token = JwtTestUtils::create_test_token(user, &config.jwt_secret, Some(1));
    TypedHeader(Authorization::bearer(&token).unwrap())
}

async fn mount_patient_profile(server: &MockServer, account_id: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/patient_profiles"))
        .and(query_param("account_id", format!("eq.{}", account_id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([MockStoreRows::patient_profile_row(account_id, PATIENT_UDI)])),
        )
        .mount(server)
        .await;
}

async fn mount_doctor_profile(server: &MockServer, account_id: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_profiles"))
        .and(query_param("account_id", format!("eq.{}", account_id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([MockStoreRows::doctor_profile_row(account_id, DOCTOR_UDI)])),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn show_doctor_returns_209_when_already_connected() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let patient = TestUser::patient("353851270001");

    mount_patient_profile(&mock_server, &patient.id).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_profiles"))
        .and(query_param("udi", format!("eq.{}", DOCTOR_UDI)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::doctor_profile_row(&Uuid::new_v4().to_string(), DOCTOR_UDI)
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/connection_requests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::connection_row(
                &Uuid::new_v4().to_string(),
                PATIENT_UDI,
                DOCTOR_UDI,
                "accepted"
            )
        ])))
        .mount(&mock_server)
        .await;

    let (status, Json(body)) = show_doctor(
        State(config.to_arc()),
        auth_header(&patient, &config),
        Extension(patient.to_user()),
        Query(ShowDoctorQuery {
            udi_id: Some(DOCTOR_UDI.to_string()),
        }),
    )
    .await
    .unwrap();

    assert_eq!(status.as_u16(), 209);
    assert_eq!(body["message"], "Doctor request already exists!");
}

#[tokio::test]
async fn show_doctor_returns_profile_when_not_connected() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let patient = TestUser::patient("353851270002");

    mount_patient_profile(&mock_server, &patient.id).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_profiles"))
        .and(query_param("udi", format!("eq.{}", DOCTOR_UDI)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::doctor_profile_row(&Uuid::new_v4().to_string(), DOCTOR_UDI)
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/connection_requests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let (status, Json(body)) = show_doctor(
        State(config.to_arc()),
        auth_header(&patient, &config),
        Extension(patient.to_user()),
        Query(ShowDoctorQuery {
            udi_id: Some(DOCTOR_UDI.to_string()),
        }),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["doctorData"]["udi"], DOCTOR_UDI);
}

#[tokio::test]
async fn doctor_request_inserts_pending_request() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let patient = TestUser::patient("353851270003");

    mount_patient_profile(&mock_server, &patient.id).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/connection_requests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/connection_requests"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreRows::connection_row(
                &Uuid::new_v4().to_string(),
                PATIENT_UDI,
                DOCTOR_UDI,
                "pending"
            )
        ])))
        .mount(&mock_server)
        .await;

    let Json(body) = doctor_request(
        State(config.to_arc()),
        auth_header(&patient, &config),
        Extension(patient.to_user()),
        Json(DoctorRequestBody {
            doctor_id: Some(DOCTOR_UDI.to_string()),
        }),
    )
    .await
    .unwrap();

    assert_eq!(body["message"], "Doctor request sent!");
}

#[tokio::test]
async fn doctor_request_reopens_declined_request() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let patient = TestUser::patient("353851270004");
    let request_id = Uuid::new_v4().to_string();

    mount_patient_profile(&mock_server, &patient.id).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/connection_requests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::connection_row(&request_id, PATIENT_UDI, DOCTOR_UDI, "declined")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/connection_requests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::connection_row(&request_id, PATIENT_UDI, DOCTOR_UDI, "pending")
        ])))
        .mount(&mock_server)
        .await;

    let Json(body) = doctor_request(
        State(config.to_arc()),
        auth_header(&patient, &config),
        Extension(patient.to_user()),
        Json(DoctorRequestBody {
            doctor_id: Some(DOCTOR_UDI.to_string()),
        }),
    )
    .await
    .unwrap();

    assert_eq!(body["message"], "Doctor request status updated to pending!");
}

#[tokio::test]
async fn doctor_request_conflicts_when_pending_exists() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let patient = TestUser::patient("353851270005");

    mount_patient_profile(&mock_server, &patient.id).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/connection_requests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::connection_row(
                &Uuid::new_v4().to_string(),
                PATIENT_UDI,
                DOCTOR_UDI,
                "pending"
            )
        ])))
        .mount(&mock_server)
        .await;

    let result = doctor_request(
        State(config.to_arc()),
        auth_header(&patient, &config),
        Extension(patient.to_user()),
        Json(DoctorRequestBody {
            doctor_id: Some(DOCTOR_UDI.to_string()),
        }),
    )
    .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn doctor_scan_connects_directly_as_accepted() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let doctor = TestUser::doctor("353851270006");

    mount_doctor_profile(&mock_server, &doctor.id).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/connection_requests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/connection_requests"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreRows::connection_row(
                &Uuid::new_v4().to_string(),
                PATIENT_UDI,
                DOCTOR_UDI,
                "accepted"
            )
        ])))
        .mount(&mock_server)
        .await;

    let Json(body) = doctor_scan(
        State(config.to_arc()),
        auth_header(&doctor, &config),
        Extension(doctor.to_user()),
        Json(ScanBody {
            patient_id: Some(PATIENT_UDI.to_string()),
        }),
    )
    .await
    .unwrap();

    assert_eq!(body["message"], "Doctor connection complete!");
}

#[tokio::test]
async fn accept_request_404_when_missing() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let doctor = TestUser::doctor("353851270007");

    Mock::given(method("GET"))
        .and(path("/rest/v1/connection_requests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result = accept_request(
        State(config.to_arc()),
        auth_header(&doctor, &config),
        Json(RequestIdBody {
            request_id: Some(Uuid::new_v4()),
        }),
    )
    .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn end_session_requires_accepted_status() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let doctor = TestUser::doctor("353851270008");
    let request_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/connection_requests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::connection_row(&request_id.to_string(), PATIENT_UDI, DOCTOR_UDI, "pending")
        ])))
        .mount(&mock_server)
        .await;

    let result = end_session(
        State(config.to_arc()),
        auth_header(&doctor, &config),
        Json(RequestIdBody {
            request_id: Some(request_id),
        }),
    )
    .await;

    assert!(
        matches!(result, Err(AppError::NotFound(ref msg)) if msg == "Patient request not found")
    );
}

#[tokio::test]
async fn reconnect_requires_previous_session() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let doctor = TestUser::doctor("353851270009");
    let request_id = Uuid::new_v4();

    // Accepted but still current; reconnect only applies to ended sessions.
    Mock::given(method("GET"))
        .and(path("/rest/v1/connection_requests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::connection_row(&request_id.to_string(), PATIENT_UDI, DOCTOR_UDI, "accepted")
        ])))
        .mount(&mock_server)
        .await;

    let result = reconnect_session(
        State(config.to_arc()),
        auth_header(&doctor, &config),
        Json(RequestIdBody {
            request_id: Some(request_id),
        }),
    )
    .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn reconnect_flips_previous_back_to_current() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let doctor = TestUser::doctor("353851270010");
    let request_id = Uuid::new_v4();

    let mut ended =
        MockStoreRows::connection_row(&request_id.to_string(), PATIENT_UDI, DOCTOR_UDI, "accepted");
    ended["session"] = json!("previous");

    Mock::given(method("GET"))
        .and(path("/rest/v1/connection_requests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([ended])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/connection_requests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::connection_row(&request_id.to_string(), PATIENT_UDI, DOCTOR_UDI, "accepted")
        ])))
        .mount(&mock_server)
        .await;

    let Json(body) = reconnect_session(
        State(config.to_arc()),
        auth_header(&doctor, &config),
        Json(RequestIdBody {
            request_id: Some(request_id),
        }),
    )
    .await
    .unwrap();

    assert_eq!(body["message"], "Patient session reconnect successfully");
}

#[tokio::test]
async fn patient_requests_for_doctor_joins_patient_profiles() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let doctor = TestUser::doctor("353851270011");

    mount_doctor_profile(&mock_server, &doctor.id).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/connection_requests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::connection_row(
                &Uuid::new_v4().to_string(),
                PATIENT_UDI,
                DOCTOR_UDI,
                "pending"
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patient_profiles"))
        .and(query_param("udi", format!("in.({})", PATIENT_UDI)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::patient_profile_row(&Uuid::new_v4().to_string(), PATIENT_UDI)
        ])))
        .mount(&mock_server)
        .await;

    let Json(body) = patient_requests(
        State(config.to_arc()),
        auth_header(&doctor, &config),
        Extension(doctor.to_user()),
    )
    .await
    .unwrap();

    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["status"], "pending");
    assert_eq!(data[0]["patientData"]["udi"], PATIENT_UDI);
}

#[tokio::test]
async fn patient_requests_without_role_claim_is_404() {
    let config = TestConfig::default();
    let user = TestUser::patient("353851270012");
    let mut no_role = user.to_user();
    no_role.role = None;

    let result = patient_requests(
        State(config.to_arc()),
        auth_header(&user, &config),
        Extension(no_role),
    )
    .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}
