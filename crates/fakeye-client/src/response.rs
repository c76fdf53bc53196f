//! Response body decoding

use crate::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of the health endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub ok: bool,
    /// Whether the service has its search API key configured
    #[serde(default)]
    pub serpapi_set: Option<bool>,
}

/// String `detail` of an error body, if the body is JSON and carries one
pub fn error_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value
        .get("detail")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|detail| !detail.is_empty())
        .map(str::to_string)
}

/// Parse a success body; anything but a JSON object is rejected
pub fn decode_payload(body: &[u8]) -> ClientResult<Value> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| ClientError::Decode(e.to_string()))?;
    if !value.is_object() {
        return Err(ClientError::Decode("expected a JSON object".to_string()));
    }
    Ok(value)
}

pub fn decode_health(body: &[u8]) -> ClientResult<HealthStatus> {
    serde_json::from_slice(body).map_err(|e| ClientError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_detail() {
        assert_eq!(
            error_detail(br#"{"detail": "SERPAPI_API_KEY not set"}"#).as_deref(),
            Some("SERPAPI_API_KEY not set")
        );
        // validation errors carry a list, not a message
        assert_eq!(error_detail(br#"{"detail": [{"loc": ["body", "text"]}]}"#), None);
        assert_eq!(error_detail(br#"{"detail": "  "}"#), None);
        assert_eq!(error_detail(b"<html>Bad Gateway</html>"), None);
        assert_eq!(error_detail(b""), None);
    }

    #[test]
    fn test_decode_payload() {
        let value = decode_payload(br#"{"verdict": "likely_real"}"#).unwrap();
        assert_eq!(value["verdict"], "likely_real");

        assert!(matches!(decode_payload(b"[1, 2]"), Err(ClientError::Decode(_))));
        assert!(matches!(decode_payload(b"null"), Err(ClientError::Decode(_))));
        assert!(matches!(decode_payload(b"{trunc"), Err(ClientError::Decode(_))));
    }

    #[test]
    fn test_decode_health() {
        let health = decode_health(br#"{"ok": true, "serpapi_set": false}"#).unwrap();
        assert!(health.ok);
        assert_eq!(health.serpapi_set, Some(false));

        let health = decode_health(br#"{"ok": true}"#).unwrap();
        assert_eq!(health.serpapi_set, None);

        assert!(decode_health(br#"{"status": "up"}"#).is_err());
    }
}
