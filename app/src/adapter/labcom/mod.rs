mod client;
mod incoming;

pub use client::LabComClient;

use derive_more::derive::{Display, Error, From};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct LabComSettings {
    #[serde(default = "default_api_url")]
    pub url: String,
    pub token: String,
}

fn default_api_url() -> String {
    "https://backend.labcom.cloud/graphql".to_string()
}

impl LabComSettings {
    pub fn new_client(&self) -> anyhow::Result<LabComClient> {
        LabComClient::new(&self.url, &self.token)
    }
}

/// A pool as reported by the account's device list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolDevice {
    pub id: String,
    pub name: Option<String>,
    pub serial_number: Option<String>,
    pub status: Option<String>,
}

impl PoolDevice {
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("Pool {}", self.id),
        }
    }
}

#[derive(Debug, Display, Error, From)]
pub enum LabComError {
    #[display("Invalid API token")]
    Unauthorized,

    #[display("API rate limit exceeded")]
    RateLimited,

    #[display("API request failed with status {_0}")]
    Status(#[error(not(source))] u16),

    #[display("GraphQL error: {_0}")]
    GraphQl(#[error(not(source))] String),

    #[display("Transport error")]
    #[from]
    Transport(reqwest_middleware::Error),

    #[display("Error decoding API response")]
    #[from]
    Decode(reqwest::Error),
}

impl LabComError {
    /// Auth failures and GraphQL-level errors are definitive, only
    /// HTTP-level and transport failures may be transient.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, LabComError::Unauthorized | LabComError::GraphQl(_))
    }
}
