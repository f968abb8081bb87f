use reqwest::Client;
use serde_json::json;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::models::AuthError;

/// Thin client for the SMS gateway that delivers OTP codes. Fire-and-forget
/// from the caller's perspective; a delivery failure surfaces as an upstream
/// fault on the generate endpoint only.
pub struct SmsClient {
    client: Client,
    gateway_url: String,
    api_key: String,
    sender_id: String,
}

impl SmsClient {
    pub fn new(config: &AppConfig) -> Result<Self, AuthError> {
        if !config.is_sms_configured() {
            return Err(AuthError::SmsNotConfigured);
        }

        Ok(Self {
            client: Client::new(),
            gateway_url: config.sms_gateway_url.clone(),
            api_key: config.sms_gateway_api_key.clone(),
            sender_id: config.sms_sender_id.clone(),
        })
    }

    pub async fn send(&self, to: &str, body: &str) -> Result<(), AuthError> {
        debug!("Sending SMS to {}", to);

        let response = self
            .client
            .post(&self.gateway_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "from": self.sender_id,
                "to": to,
                "body": body,
            }))
            .send()
            .await
            .map_err(|e| AuthError::SmsDelivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("SMS gateway error ({}): {}", status, text);
            return Err(AuthError::SmsDelivery(format!("HTTP {}: {}", status, text)));
        }

        Ok(())
    }
}
