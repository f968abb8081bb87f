use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{representation_headers, SupabaseClient};

use crate::models::{HealthRecord, RecordError, RecordKind};

const RECORD_BUCKET: &str = "health-records";

pub struct RecordService {
    supabase: SupabaseClient,
}

impl RecordService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn upload(
        &self,
        kind: RecordKind,
        patient_id: Uuid,
        doctor_id: Option<Uuid>,
        base64_file: &str,
        label: Option<String>,
        auth_token: &str,
    ) -> Result<HealthRecord, RecordError> {
        let base64_data = if base64_file.contains(";base64,") {
            base64_file.split(";base64,").nth(1).unwrap_or(base64_file)
        } else {
            base64_file
        };
        let bytes = BASE64
            .decode(base64_data)
            .map_err(|e| RecordError::Upload(format!("Failed to decode base64 data: {}", e)))?;

        let object_path = format!("{}/{}", kind.table(), Uuid::new_v4());
        self.supabase
            .upload_object(
                RECORD_BUCKET,
                &object_path,
                bytes,
                "application/octet-stream",
                auth_token,
            )
            .await
            .map_err(|e| RecordError::Upload(e.to_string()))?;

        let file_url = self.supabase.public_object_url(RECORD_BUCKET, &object_path);
        let now = Utc::now();
        let record_data = json!({
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "file_url": file_url,
            "label": label.filter(|l| !l.is_empty()).unwrap_or_else(|| kind.default_label().to_string()),
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let path = format!("/rest/v1/{}", kind.table());
        let rows: Vec<HealthRecord> = self
            .supabase
            .request_with_headers(
                Method::POST,
                &path,
                Some(auth_token),
                Some(record_data),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| RecordError::Database(e.to_string()))?;

        let record = rows
            .into_iter()
            .next()
            .ok_or_else(|| RecordError::Database("record insert returned no row".to_string()))?;

        info!("{} {} uploaded", kind.display_name(), record.id);
        Ok(record)
    }

    pub async fn list_for_patient(
        &self,
        kind: RecordKind,
        patient_id: Uuid,
        doctor_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<Vec<HealthRecord>, RecordError> {
        let mut path = format!(
            "/rest/v1/{}?patient_id=eq.{}",
            kind.table(),
            patient_id
        );
        if let Some(doctor_id) = doctor_id {
            path.push_str(&format!("&doctor_id=eq.{}", doctor_id));
        }
        path.push_str("&order=created_at.desc");

        self.supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| RecordError::Database(e.to_string()))
    }

    pub async fn list_for_doctor(
        &self,
        kind: RecordKind,
        doctor_id: Uuid,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<HealthRecord>, RecordError> {
        let path = format!(
            "/rest/v1/{}?patient_id=eq.{}&doctor_id=eq.{}&order=created_at.desc",
            kind.table(),
            patient_id,
            doctor_id
        );
        self.supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| RecordError::Database(e.to_string()))
    }

    /// Removes the storage object first (best-effort), then the row. A
    /// failed storage delete is logged and does not block the row delete.
    pub async fn delete(
        &self,
        kind: RecordKind,
        patient_id: Uuid,
        record_id: Uuid,
        auth_token: &str,
    ) -> Result<(), RecordError> {
        let find_path = format!(
            "/rest/v1/{}?id=eq.{}&patient_id=eq.{}&limit=1",
            kind.table(),
            record_id,
            patient_id
        );
        let rows: Vec<HealthRecord> = self
            .supabase
            .request(Method::GET, &find_path, Some(auth_token), None)
            .await
            .map_err(|e| RecordError::Database(e.to_string()))?;

        let record = rows
            .into_iter()
            .next()
            .ok_or(RecordError::NotFound(kind.display_name()))?;

        if let Some(object_path) = object_path_from_url(&record.file_url, RECORD_BUCKET) {
            if let Err(e) = self
                .supabase
                .delete_object(RECORD_BUCKET, &object_path, auth_token)
                .await
            {
                warn!("Storage delete for {} failed: {}", object_path, e);
            }
        }

        let delete_path = format!("/rest/v1/{}?id=eq.{}", kind.table(), record_id);
        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &delete_path,
                Some(auth_token),
                None,
                Some(representation_headers()),
            )
            .await
            .map_err(|e| RecordError::Database(e.to_string()))?;

        info!("{} {} deleted", kind.display_name(), record_id);
        Ok(())
    }
}

/// Extracts the bucket-relative object path from a public storage URL.
fn object_path_from_url(url: &str, bucket: &str) -> Option<String> {
    let marker = format!("/storage/v1/object/public/{}/", bucket);
    url.split_once(&marker).map(|(_, path)| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_path_extraction() {
        let url = "http://localhost:54321/storage/v1/object/public/health-records/reports/abc";
        assert_eq!(
            object_path_from_url(url, "health-records").as_deref(),
            Some("reports/abc")
        );
        assert_eq!(object_path_from_url("http://elsewhere/x", "health-records"), None);
    }
}
