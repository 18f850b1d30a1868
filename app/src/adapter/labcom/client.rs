use std::time::{Duration, Instant};

use infrastructure::HttpClientConfig;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;

use super::incoming::{DeviceReadingData, DevicesData, MeData};
use super::{LabComError, PoolDevice};
use crate::water::Reading;

const API_TIMEOUT: Duration = Duration::from_secs(30);
//the backend rate-limits aggressively, keep a minimum gap between requests
const MIN_TIME_BETWEEN_REQUESTS: Duration = Duration::from_secs(60);
const MAX_RETRIES: u32 = 3;
const RATE_LIMIT_RETRY_WAIT: Duration = Duration::from_secs(60);
const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);

const ME_QUERY: &str = r#"
    query {
        me {
            id
            email
        }
    }
"#;

const DEVICES_QUERY: &str = r#"
    query {
        devices {
            id
            name
            serialNumber
            status
        }
    }
"#;

const LAST_READING_QUERY: &str = r#"
    query GetDeviceReading($deviceId: ID!) {
        device(id: $deviceId) {
            id
            lastReading {
                ph
                chlorine
                freeChlorine
                totalChlorine
                temperature
                alkalinity
                cya
                salt
                timestamp
            }
        }
    }
"#;

/// Client for the LabCom Cloud GraphQL backend. All requests are
/// serialized and throttled through a single lock, matching what the
/// backend tolerates.
#[derive(Debug)]
pub struct LabComClient {
    client: ClientWithMiddleware,
    base_url: String,
    last_request: Mutex<Option<Instant>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlEnvelope<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlErrorItem>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorItem {
    message: String,
}

impl LabComClient {
    pub fn new(url: &str, token: &str) -> anyhow::Result<Self> {
        let client = HttpClientConfig::new(Some(token.to_owned()))
            .with_timeout(API_TIMEOUT)
            .new_tracing_client()?;

        Ok(Self {
            client,
            base_url: url.to_owned(),
            last_request: Mutex::new(None),
        })
    }

    pub async fn verify_token(&self) -> Result<bool, LabComError> {
        match self.query::<MeData>(ME_QUERY, json!({})).await {
            Ok(data) => Ok(data.me.is_some()),
            Err(LabComError::Unauthorized) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn devices(&self) -> Result<Vec<PoolDevice>, LabComError> {
        let data = self.query::<DevicesData>(DEVICES_QUERY, json!({})).await?;
        Ok(data.devices)
    }

    /// Latest reading of a device. `Ok(None)` means the device exists but
    /// has not reported any measurement yet.
    pub async fn last_reading(&self, device_id: &str) -> Result<Option<Reading>, LabComError> {
        let data = self
            .query::<DeviceReadingData>(LAST_READING_QUERY, json!({ "deviceId": device_id }))
            .await?;

        Ok(data.device.and_then(|d| d.last_reading).map(Reading::from))
    }

    async fn query<T: serde::de::DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, LabComError> {
        let mut last_request = self.last_request.lock().await;

        if let Some(last) = *last_request {
            let elapsed = last.elapsed();
            if elapsed < MIN_TIME_BETWEEN_REQUESTS {
                let wait = MIN_TIME_BETWEEN_REQUESTS - elapsed;
                tracing::debug!("Throttling API request, waiting {:.1} seconds", wait.as_secs_f64());
                tokio::time::sleep(wait).await;
            }
        }

        let mut retry_delay = INITIAL_RETRY_DELAY;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let result = self.execute::<T>(query, &variables).await;
            *last_request = Some(Instant::now());

            match result {
                Ok(data) => return Ok(data),
                Err(LabComError::RateLimited) if attempt < MAX_RETRIES => {
                    tracing::warn!(
                        "API rate limited, retrying in {} seconds (attempt {}/{})",
                        RATE_LIMIT_RETRY_WAIT.as_secs(),
                        attempt,
                        MAX_RETRIES
                    );
                    tokio::time::sleep(RATE_LIMIT_RETRY_WAIT).await;
                }
                Err(e) if e.is_retryable() && attempt < MAX_RETRIES => {
                    tracing::warn!("API request failed ({}), retrying (attempt {}/{})", e, attempt, MAX_RETRIES);
                    tokio::time::sleep(retry_delay).await;
                    retry_delay *= 2;
                }
                Err(e) => {
                    tracing::error!("API request failed after {} attempt(s): {}", attempt, e);
                    return Err(e);
                }
            }
        }
    }

    async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        query: &str,
        variables: &serde_json::Value,
    ) -> Result<T, LabComError> {
        let payload = json!({
            "query": query,
            "variables": variables,
        });

        let response = self.client.post(&self.base_url).json(&payload).send().await?;

        match response.status().as_u16() {
            200 => {}
            401 => return Err(LabComError::Unauthorized),
            429 => return Err(LabComError::RateLimited),
            status => return Err(LabComError::Status(status)),
        }

        let envelope: GraphQlEnvelope<T> = response.json().await?;

        //a GraphQL error is a failure even on HTTP 200
        if let Some(errors) = envelope.errors.filter(|e| !e.is_empty()) {
            let message = errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(LabComError::GraphQl(message));
        }

        envelope
            .data
            .ok_or_else(|| LabComError::GraphQl("response contained no data".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_with_errors_is_a_failure() {
        let body = r#"{"data": null, "errors": [{"message": "token expired"}]}"#;
        let envelope: GraphQlEnvelope<MeData> = serde_json::from_str(body).unwrap();

        assert!(envelope.data.is_none());
        assert_eq!(envelope.errors.unwrap()[0].message, "token expired");
    }

    #[test]
    fn only_transport_level_failures_are_retryable() {
        assert!(!LabComError::Unauthorized.is_retryable());
        assert!(!LabComError::GraphQl("token expired".to_string()).is_retryable());
        assert!(LabComError::RateLimited.is_retryable());
        assert!(LabComError::Status(502).is_retryable());
    }
}
