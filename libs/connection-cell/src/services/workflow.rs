use chrono::Utc;
use reqwest::Method;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{representation_headers, SupabaseClient};

use crate::models::{
    ConnectionError, ConnectionRequest, ConnectionStatus, RequestOutcome, ScanOutcome, Session,
};

/// The relationship state machine. Deals in UDIs only; callers resolve
/// internal ids to display ids before entering.
pub struct ConnectionService {
    supabase: SupabaseClient,
}

impl ConnectionService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn find_pair(
        &self,
        patient_udi: &str,
        doctor_udi: &str,
        auth_token: &str,
    ) -> Result<Option<ConnectionRequest>, ConnectionError> {
        let path = format!(
            "/rest/v1/connection_requests?patient_udi=eq.{}&doctor_udi=eq.{}&limit=1",
            urlencoding::encode(patient_udi),
            urlencoding::encode(doctor_udi)
        );
        let rows: Vec<ConnectionRequest> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ConnectionError::Database(e.to_string()))?;
        Ok(rows.into_iter().next())
    }

    /// Patient-initiated request. A declined pair reopens to pending on the
    /// same record; anything else already standing is a conflict.
    pub async fn request_connection(
        &self,
        patient_udi: &str,
        doctor_udi: &str,
        auth_token: &str,
    ) -> Result<RequestOutcome, ConnectionError> {
        if let Some(existing) = self.find_pair(patient_udi, doctor_udi, auth_token).await? {
            if existing.status == ConnectionStatus::Declined {
                self.update_request(
                    existing.id,
                    json!({ "status": "pending" }),
                    auth_token,
                )
                .await?;
                return Ok(RequestOutcome::ReopenedToPending);
            }
            return Err(ConnectionError::AlreadyExists);
        }

        self.insert_request(patient_udi, doctor_udi, "pending", None, auth_token)
            .await?;
        info!("Connection request {} -> {} sent", patient_udi, doctor_udi);
        Ok(RequestOutcome::Sent)
    }

    /// Doctor-initiated scan: skips pending entirely. A declined pair jumps
    /// straight to accepted/current.
    pub async fn direct_connect(
        &self,
        doctor_udi: &str,
        patient_udi: &str,
        auth_token: &str,
    ) -> Result<ScanOutcome, ConnectionError> {
        if let Some(existing) = self.find_pair(patient_udi, doctor_udi, auth_token).await? {
            if existing.status == ConnectionStatus::Declined {
                self.update_request(
                    existing.id,
                    json!({ "status": "accepted", "session": "current" }),
                    auth_token,
                )
                .await?;
                return Ok(ScanOutcome::ReconnectedFromDeclined);
            }
            return Err(ConnectionError::AlreadyExists);
        }

        self.insert_request(patient_udi, doctor_udi, "accepted", Some("current"), auth_token)
            .await?;
        info!("Direct connection {} <- {} complete", patient_udi, doctor_udi);
        Ok(ScanOutcome::Connected)
    }

    pub async fn accept(
        &self,
        request_id: Uuid,
        auth_token: &str,
    ) -> Result<ConnectionRequest, ConnectionError> {
        self.find_by_id(request_id, auth_token)
            .await?
            .ok_or(ConnectionError::RequestNotFound)?;
        self.update_request(
            request_id,
            json!({ "status": "accepted", "session": "current" }),
            auth_token,
        )
        .await
    }

    /// Session stays untouched on decline.
    pub async fn decline(
        &self,
        request_id: Uuid,
        auth_token: &str,
    ) -> Result<ConnectionRequest, ConnectionError> {
        self.find_by_id(request_id, auth_token)
            .await?
            .ok_or(ConnectionError::RequestNotFound)?;
        self.update_request(request_id, json!({ "status": "declined" }), auth_token)
            .await
    }

    pub async fn end_session(
        &self,
        request_id: Uuid,
        auth_token: &str,
    ) -> Result<ConnectionRequest, ConnectionError> {
        let request = self
            .find_by_id(request_id, auth_token)
            .await?
            .filter(|r| r.status == ConnectionStatus::Accepted)
            .ok_or(ConnectionError::RequestNotFound)?;

        self.update_request(request.id, json!({ "session": "previous" }), auth_token)
            .await
    }

    pub async fn reconnect(
        &self,
        request_id: Uuid,
        auth_token: &str,
    ) -> Result<ConnectionRequest, ConnectionError> {
        let request = self
            .find_by_id(request_id, auth_token)
            .await?
            .filter(|r| {
                r.status == ConnectionStatus::Accepted && r.session == Some(Session::Previous)
            })
            .ok_or(ConnectionError::RequestNotFound)?;

        self.update_request(request.id, json!({ "session": "current" }), auth_token)
            .await
    }

    pub async fn list_for_doctor(
        &self,
        doctor_udi: &str,
        statuses: &[&str],
        auth_token: &str,
    ) -> Result<Vec<ConnectionRequest>, ConnectionError> {
        self.list("doctor_udi", doctor_udi, statuses, auth_token).await
    }

    pub async fn list_for_patient(
        &self,
        patient_udi: &str,
        statuses: &[&str],
        auth_token: &str,
    ) -> Result<Vec<ConnectionRequest>, ConnectionError> {
        self.list("patient_udi", patient_udi, statuses, auth_token).await
    }

    async fn list(
        &self,
        column: &str,
        udi: &str,
        statuses: &[&str],
        auth_token: &str,
    ) -> Result<Vec<ConnectionRequest>, ConnectionError> {
        let path = format!(
            "/rest/v1/connection_requests?{}=eq.{}&status=in.({})",
            column,
            urlencoding::encode(udi),
            statuses.join(",")
        );
        self.supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ConnectionError::Database(e.to_string()))
    }

    async fn find_by_id(
        &self,
        request_id: Uuid,
        auth_token: &str,
    ) -> Result<Option<ConnectionRequest>, ConnectionError> {
        let path = format!(
            "/rest/v1/connection_requests?id=eq.{}&limit=1",
            request_id
        );
        let rows: Vec<ConnectionRequest> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ConnectionError::Database(e.to_string()))?;
        Ok(rows.into_iter().next())
    }

    async fn insert_request(
        &self,
        patient_udi: &str,
        doctor_udi: &str,
        status: &str,
        session: Option<&str>,
        auth_token: &str,
    ) -> Result<ConnectionRequest, ConnectionError> {
        let now = Utc::now();
        let request_data = json!({
            "patient_udi": patient_udi,
            "doctor_udi": doctor_udi,
            "status": status,
            "session": session,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let rows: Vec<ConnectionRequest> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/connection_requests",
                Some(auth_token),
                Some(request_data),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| {
                // Unique index on (patient_udi, doctor_udi) catches the race.
                if e.is_conflict() {
                    ConnectionError::AlreadyExists
                } else {
                    ConnectionError::Database(e.to_string())
                }
            })?;

        rows.into_iter().next().ok_or_else(|| {
            ConnectionError::Database("request insert returned no row".to_string())
        })
    }

    async fn update_request(
        &self,
        request_id: Uuid,
        mut update_data: serde_json::Value,
        auth_token: &str,
    ) -> Result<ConnectionRequest, ConnectionError> {
        if let Some(map) = update_data.as_object_mut() {
            map.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
        }

        let path = format!("/rest/v1/connection_requests?id=eq.{}", request_id);
        let rows: Vec<ConnectionRequest> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(update_data),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| ConnectionError::Database(e.to_string()))?;

        rows.into_iter().next().ok_or(ConnectionError::RequestNotFound)
    }
}
