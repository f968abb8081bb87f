use std::collections::HashMap;

use reqwest::Method;
use serde_json::Value;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::ConnectionError;

/// Resolves profiles across the two identifier spaces: internal account ids
/// (what the session token carries) and display UDIs (what the connection
/// table stores). The mapping happens here, once, at the workflow boundary.
pub struct DirectoryService {
    supabase: SupabaseClient,
}

impl DirectoryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn patient_profile_by_account(
        &self,
        account_id: Uuid,
        auth_token: &str,
    ) -> Result<Option<Value>, ConnectionError> {
        let path = format!(
            "/rest/v1/patient_profiles?account_id=eq.{}&limit=1",
            account_id
        );
        self.fetch_one(&path, auth_token).await
    }

    pub async fn doctor_profile_by_account(
        &self,
        account_id: Uuid,
        auth_token: &str,
    ) -> Result<Option<Value>, ConnectionError> {
        let path = format!(
            "/rest/v1/doctor_profiles?account_id=eq.{}&limit=1",
            account_id
        );
        self.fetch_one(&path, auth_token).await
    }

    pub async fn doctor_profile_by_udi(
        &self,
        udi: &str,
        auth_token: &str,
    ) -> Result<Option<Value>, ConnectionError> {
        let path = format!(
            "/rest/v1/doctor_profiles?udi=eq.{}&limit=1",
            urlencoding::encode(udi)
        );
        self.fetch_one(&path, auth_token).await
    }

    pub async fn doctor_profiles_by_udis(
        &self,
        udis: &[String],
        auth_token: &str,
    ) -> Result<HashMap<String, Value>, ConnectionError> {
        self.fetch_by_udis("doctor_profiles", udis, auth_token).await
    }

    pub async fn patient_profiles_by_udis(
        &self,
        udis: &[String],
        auth_token: &str,
    ) -> Result<HashMap<String, Value>, ConnectionError> {
        self.fetch_by_udis("patient_profiles", udis, auth_token).await
    }

    async fn fetch_one(
        &self,
        path: &str,
        auth_token: &str,
    ) -> Result<Option<Value>, ConnectionError> {
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, path, Some(auth_token), None)
            .await
            .map_err(|e| ConnectionError::Database(e.to_string()))?;
        Ok(rows.into_iter().next())
    }

    /// One batched fetch per unique UDI set; the result is keyed by UDI for
    /// joining onto request rows.
    async fn fetch_by_udis(
        &self,
        table: &str,
        udis: &[String],
        auth_token: &str,
    ) -> Result<HashMap<String, Value>, ConnectionError> {
        if udis.is_empty() {
            return Ok(HashMap::new());
        }

        let encoded: Vec<String> = udis.iter().map(|u| urlencoding::encode(u).into_owned()).collect();
        let path = format!("/rest/v1/{}?udi=in.({})", table, encoded.join(","));
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ConnectionError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .filter_map(|profile| {
                let udi = profile["udi"].as_str().map(String::from)?;
                Some((udi, profile))
            })
            .collect())
    }
}

/// Pulls the UDI off a profile row.
pub fn profile_udi(profile: &Value) -> Option<String> {
    profile["udi"].as_str().map(String::from)
}
