//! Verification backend interface

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Why a check could not settle with a result
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    /// The request never completed
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx status, with the server's `detail` message when it sent one
    #[error("Server returned {status}")]
    Server { status: u16, message: Option<String> },

    /// Body was not a JSON object
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl CheckError {
    /// Short message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            CheckError::Network(message) if !message.trim().is_empty() => message.clone(),
            CheckError::Network(_) => "Network error".to_string(),
            CheckError::Server {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            CheckError::Server { status, .. } => format!("Server returned {status}"),
            CheckError::Malformed(_) => "Server returned an unreadable response".to_string(),
        }
    }
}

/// Remote service that checks one claim per call
#[async_trait]
pub trait VerificationBackend: Send + Sync {
    /// Submit a claim and return the raw JSON payload
    async fn verify(&self, claim: &str) -> Result<Value, CheckError>;
}
