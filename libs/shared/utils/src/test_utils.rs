use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{JwtClaims, User};

use crate::jwt::issue_token;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    /// Points the store client at a wiremock server.
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            sms_gateway_url: String::new(),
            sms_gateway_api_key: String::new(),
            sms_sender_id: "CareBridge".to_string(),
            push_gateway_url: String::new(),
            push_gateway_api_key: String::new(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub phone: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            phone: "+353851234567".to_string(),
            role: "patient".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(phone: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            phone: phone.to_string(),
            role: role.to_string(),
        }
    }

    pub fn doctor(phone: &str) -> Self {
        Self::new(phone, "doctor")
    }

    pub fn patient(phone: &str) -> Self {
        Self::new(phone, "patient")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            role: Some(self.role.clone()),
            phone: Some(self.phone.clone()),
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let claims = JwtClaims {
            sub: user.id.clone(),
            exp: Some(exp.timestamp() as u64),
            iat: Some(now.timestamp() as u64),
            role: Some(user.role.clone()),
            phone: Some(user.phone.clone()),
        };

        issue_token(&claims, secret).expect("test token signing")
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Canned store rows shaped like the PostgREST responses the services expect.
pub struct MockStoreRows;

impl MockStoreRows {
    pub fn account_row(account_id: &str, phone: &str) -> Value {
        json!({
            "id": account_id,
            "phone_number": phone,
            "refresh_token": null,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn doctor_profile_row(account_id: &str, udi: &str) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "account_id": account_id,
            "full_name": "Aoife Byrne",
            "gender": "Female",
            "date_of_birth": "1985-03-14",
            "age": 40,
            "email": "aoife.byrne@example.com",
            "specialization": "Oncology",
            "udi": udi,
            "profile_image_url": null,
            "device_token": null,
            "is_active": true,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn patient_profile_row(account_id: &str, udi: &str) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "account_id": account_id,
            "full_name": "Niamh Kelly",
            "gender": "Female",
            "date_of_birth": "1992-07-02",
            "age": 33,
            "nationality": null,
            "email": null,
            "address": null,
            "udi": udi,
            "profile_image_url": null,
            "device_token": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn slot_row(slot_id: &str, doctor_id: &str, date: &str, place: &str) -> Value {
        json!({
            "id": slot_id,
            "doctor_id": doctor_id,
            "date": date,
            "start_time": "10:00",
            "end_time": "10:30",
            "place": place,
            "active_status": true,
            "feedback_rating": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn booking_row(
        slot_id: &str,
        doctor_id: &str,
        patient_id: &str,
        date: &str,
        status: &str,
    ) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "slot_id": slot_id,
            "doctor_id": doctor_id,
            "patient_id": patient_id,
            "date": date,
            "start_time": "10:00",
            "end_time": "10:30",
            "place": "Clinic A",
            "booking_status": status,
            "feedback_rating": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn connection_row(request_id: &str, patient_udi: &str, doctor_udi: &str, status: &str) -> Value {
        let session: Value = if status == "accepted" {
            json!("current")
        } else {
            Value::Null
        };
        json!({
            "id": request_id,
            "patient_udi": patient_udi,
            "doctor_udi": doctor_udi,
            "status": status,
            "session": session,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }
}
