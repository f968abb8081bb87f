use serde_json::json;
use tracing::{debug, warn};

use shared_config::AppConfig;

/// Fire-and-forget push sender. Delivery failure is logged, never surfaced
/// to the booking caller.
pub struct PushClient {
    client: reqwest::Client,
    gateway_url: String,
    api_key: String,
    enabled: bool,
}

impl PushClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            gateway_url: config.push_gateway_url.clone(),
            api_key: config.push_gateway_api_key.clone(),
            enabled: config.is_push_configured(),
        }
    }

    pub async fn send(&self, device_token: &str, title: &str, body: &str) {
        if !self.enabled {
            debug!("Push gateway not configured, skipping notification");
            return;
        }

        let payload = json!({
            "to": device_token,
            "title": title,
            "body": body
        });

        let result = self
            .client
            .post(&self.gateway_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!("Push notification delivered");
            }
            Ok(response) => {
                warn!("Push gateway returned status {}", response.status());
            }
            Err(e) => {
                warn!("Push notification failed: {}", e);
            }
        }
    }
}
