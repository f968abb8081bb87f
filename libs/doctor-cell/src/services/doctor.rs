use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{representation_headers, SupabaseClient};

use crate::models::{DoctorError, DoctorProfile, RegisterDoctorRequest, UpdateDoctorProfileRequest};

const PROFILE_IMAGE_BUCKET: &str = "profile-images";

pub struct DoctorService {
    supabase: SupabaseClient,
}

/// Display identifier: "D" + gender initial + first three letters of the
/// specialization, uppercased, + the last six digits of the creation
/// timestamp in milliseconds.
pub fn generate_udi(gender: &str, specialization: &str, created_millis: i64) -> String {
    let gender_initial = gender
        .chars()
        .next()
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or('X');
    let spec_short: String = specialization
        .chars()
        .take(3)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    let millis = created_millis.to_string();
    let suffix = &millis[millis.len().saturating_sub(6)..];
    format!("D{}{}{}", gender_initial, spec_short, suffix)
}

pub fn age_from_date_of_birth(date_of_birth: NaiveDate) -> i32 {
    let today = Utc::now().date_naive();
    today.years_since(date_of_birth).unwrap_or(0) as i32
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn get_phone_number(
        &self,
        account_id: Uuid,
        auth_token: &str,
    ) -> Result<String, DoctorError> {
        let path = format!(
            "/rest/v1/doctor_accounts?id=eq.{}&select=phone_number&limit=1",
            account_id
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| DoctorError::Database(e.to_string()))?;

        rows.into_iter()
            .next()
            .and_then(|row| row["phone_number"].as_str().map(String::from))
            .ok_or(DoctorError::AccountNotFound)
    }

    /// Registers the caller's doctor profile. The store holds a unique index
    /// on `account_id` (and on `email`), so a duplicate registration comes
    /// back as a conflict instead of being re-checked here.
    pub async fn register(
        &self,
        account_id: Uuid,
        request: RegisterDoctorRequest,
        auth_token: &str,
    ) -> Result<DoctorProfile, DoctorError> {
        let (full_name, gender, date_of_birth, email, specialization) = match (
            request.full_name,
            request.gender,
            request.date_of_birth,
            request.email,
            request.specialization,
        ) {
            (Some(n), Some(g), Some(d), Some(e), Some(s))
                if !n.is_empty() && !g.is_empty() && !e.is_empty() && !s.is_empty() =>
            {
                (n, g, d, e, s)
            }
            _ => {
                return Err(DoctorError::Validation(
                    "All fields are required".to_string(),
                ))
            }
        };

        // The account row must exist before a profile can hang off it.
        let account_path = format!(
            "/rest/v1/doctor_accounts?id=eq.{}&select=id&limit=1",
            account_id
        );
        let accounts: Vec<Value> = self
            .supabase
            .request(Method::GET, &account_path, Some(auth_token), None)
            .await
            .map_err(|e| DoctorError::Database(e.to_string()))?;
        if accounts.is_empty() {
            return Err(DoctorError::AccountNotFound);
        }

        let now = Utc::now();
        let udi = generate_udi(&gender, &specialization, now.timestamp_millis());

        let profile_data = json!({
            "account_id": account_id,
            "full_name": full_name,
            "gender": gender,
            "date_of_birth": date_of_birth.format("%Y-%m-%d").to_string(),
            "age": age_from_date_of_birth(date_of_birth),
            "email": email,
            "specialization": specialization,
            "udi": udi,
            "is_active": true,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let rows: Vec<DoctorProfile> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/doctor_profiles",
                Some(auth_token),
                Some(profile_data),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| {
                if e.is_conflict() {
                    DoctorError::ProfileExists
                } else {
                    DoctorError::Database(e.to_string())
                }
            })?;

        let profile = rows
            .into_iter()
            .next()
            .ok_or_else(|| DoctorError::Database("profile insert returned no row".to_string()))?;

        info!("Doctor registered with UDI {}", profile.udi);
        Ok(profile)
    }

    pub async fn get_profile(
        &self,
        account_id: Uuid,
        auth_token: &str,
    ) -> Result<DoctorProfile, DoctorError> {
        let path = format!(
            "/rest/v1/doctor_profiles?account_id=eq.{}&limit=1",
            account_id
        );
        let rows: Vec<DoctorProfile> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| DoctorError::Database(e.to_string()))?;

        rows.into_iter().next().ok_or(DoctorError::NotFound)
    }

    pub async fn update_profile(
        &self,
        account_id: Uuid,
        request: UpdateDoctorProfileRequest,
        auth_token: &str,
    ) -> Result<DoctorProfile, DoctorError> {
        let mut update_data = serde_json::Map::new();

        if let Some(full_name) = request.full_name {
            update_data.insert("full_name".to_string(), json!(full_name));
        }
        if let Some(gender) = request.gender {
            update_data.insert("gender".to_string(), json!(gender));
        }
        if let Some(date_of_birth) = request.date_of_birth {
            update_data.insert(
                "date_of_birth".to_string(),
                json!(date_of_birth.format("%Y-%m-%d").to_string()),
            );
            update_data.insert("age".to_string(), json!(age_from_date_of_birth(date_of_birth)));
        }
        if let Some(email) = request.email {
            update_data.insert("email".to_string(), json!(email));
        }
        if let Some(specialization) = request.specialization {
            update_data.insert("specialization".to_string(), json!(specialization));
        }
        if let Some(device_token) = request.device_token {
            update_data.insert("device_token".to_string(), json!(device_token));
        }

        if let Some(image) = request.profile_image {
            let url = self.upload_profile_image(&image, auth_token).await?;
            update_data.insert("profile_image_url".to_string(), json!(url));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/doctor_profiles?account_id=eq.{}", account_id);
        let rows: Vec<DoctorProfile> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(Value::Object(update_data)),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| DoctorError::Database(e.to_string()))?;

        rows.into_iter().next().ok_or(DoctorError::NotFound)
    }

    async fn upload_profile_image(
        &self,
        base64_image: &str,
        auth_token: &str,
    ) -> Result<String, DoctorError> {
        let base64_data = if base64_image.contains(";base64,") {
            base64_image.split(";base64,").nth(1).unwrap_or(base64_image)
        } else {
            base64_image
        };

        let bytes = BASE64
            .decode(base64_data)
            .map_err(|e| DoctorError::Upload(format!("Failed to decode base64 data: {}", e)))?;

        let object_path = format!("doctors/{}.jpg", Uuid::new_v4());
        debug!("Uploading profile image to {}", object_path);

        self.supabase
            .upload_object(PROFILE_IMAGE_BUCKET, &object_path, bytes, "image/jpeg", auth_token)
            .await
            .map_err(|e| DoctorError::Upload(e.to_string()))?;

        Ok(self.supabase.public_object_url(PROFILE_IMAGE_BUCKET, &object_path))
    }
}
