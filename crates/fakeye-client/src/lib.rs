//! Fakeye HTTP client
//!
//! Talks to the verification service: one JSON POST per claim, plus a health
//! check. Implements [`VerificationBackend`] so a session can drive it.

pub mod response;

use async_trait::async_trait;
use fakeye_core::{CheckError, VerificationBackend};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;
use url::{Host, Url};

pub use response::HealthStatus;

/// Service address used when `FAKEYE_API_URL` is unset
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}")]
    Status { status: u16, detail: Option<String> },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl From<ClientError> for CheckError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Http(e) => CheckError::Network(e.to_string()),
            ClientError::Status { status, detail } => CheckError::Server {
                status,
                message: detail,
            },
            ClientError::Decode(message) => CheckError::Malformed(message),
            ClientError::InvalidUrl(url) => CheckError::Network(format!("Invalid URL: {url}")),
        }
    }
}

/// Configuration for the verification client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Service base URL
    pub base_url: String,

    /// Path of the claim-check endpoint
    pub check_path: String,

    /// Path of the health endpoint
    pub health_path: String,

    /// JSON key the claim is sent under
    pub claim_field: String,

    /// User agent string
    pub user_agent: String,

    /// Request timeout (seconds); none by default
    pub timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("FAKEYE_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            check_path: "/predict".to_string(),
            health_path: "/health".to_string(),
            claim_field: "text".to_string(),
            user_agent: concat!("Fakeye/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: None,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// Verification service client
#[derive(Debug, Clone)]
pub struct VerificationClient {
    config: ClientConfig,
    base: Url,
    client: reqwest::Client,
}

impl VerificationClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let base = parse_base(&config.base_url)?;

        let mut builder = reqwest::Client::builder().user_agent(&config.user_agent);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if is_loopback(&base) {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;

        Ok(Self {
            config,
            base,
            client,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Resolve an endpoint path against the base URL, keeping any base path
    pub fn endpoint(&self, path: &str) -> ClientResult<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidUrl(format!("{path}: {e}")))
    }

    /// Submit one claim and return the raw payload object
    pub async fn check(&self, claim: &str) -> ClientResult<Value> {
        let url = self.endpoint(&self.config.check_path)?;

        let mut body = Map::new();
        body.insert(self.config.claim_field.clone(), Value::String(claim.to_string()));

        tracing::debug!("POST {}", url);
        let response = self.client.post(url).json(&body).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let detail = response::error_detail(&bytes);
            tracing::warn!("Check request failed with {}: {:?}", status, detail);
            return Err(ClientError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        response::decode_payload(&bytes)
    }

    /// Query the service health endpoint
    pub async fn health(&self) -> ClientResult<HealthStatus> {
        let url = self.endpoint(&self.config.health_path)?;

        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                detail: response::error_detail(&bytes),
            });
        }

        response::decode_health(&bytes)
    }
}

#[async_trait]
impl VerificationBackend for VerificationClient {
    async fn verify(&self, claim: &str) -> Result<Value, CheckError> {
        self.check(claim).await.map_err(CheckError::from)
    }
}

fn parse_base(raw: &str) -> ClientResult<Url> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };

    let url = Url::parse(&with_slash).map_err(|e| ClientError::InvalidUrl(format!("{raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ClientError::InvalidUrl(format!(
            "{raw}: unsupported scheme '{scheme}'"
        ))),
    }
}

/// Local services are reached directly, never through a system proxy
fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        None => false,
    }
}
