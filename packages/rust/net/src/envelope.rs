//! Wire envelopes returned by the backend.
//!
//! Every response body is one of two JSON shapes. Both carry `status`, the
//! application status code, which may differ from the HTTP status line.

use serde::{Deserialize, Deserializer, Serialize};

/// Envelope of a successful (2xx) response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessEnvelope<T> {
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    /// Payload; `null` or absent for operations that return nothing.
    pub data: Option<T>,
    pub status: i32,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub timestamp: String,
}

/// Envelope of a failed (non-2xx) response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    pub status: i32,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub timestamp: String,
}

/// Raw HTTP exchange result handed to the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status line code.
    pub status: u16,
    /// Response body bytes; empty when the server sent none.
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status line is in the 2xx class.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the body is absent or whitespace only.
    pub fn is_body_empty(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Tokens {
        access_token: String,
        refresh_token: String,
    }

    #[test]
    fn success_envelope_fixture_parses() {
        let fixture = std::fs::read_to_string("../../../fixtures/json/auth_tokens.fixture.json")
            .expect("read fixture");
        let env: SuccessEnvelope<Tokens> = serde_json::from_str(&fixture).expect("parse");
        assert!(env.success);
        assert_eq!(env.status, 200);
        assert_eq!(env.data.expect("data").refresh_token, "eyJhbGciOiJIUzI1NiJ9.refresh");
    }

    #[test]
    fn error_envelope_fixture_parses() {
        let fixture = std::fs::read_to_string("../../../fixtures/json/jwt_expired.fixture.json")
            .expect("read fixture");
        let env: ErrorEnvelope = serde_json::from_str(&fixture).expect("parse");
        assert!(!env.success);
        assert_eq!(env.status, 4303);
        assert_eq!(env.path.as_deref(), Some("/api/v1/chats"));
    }

    #[test]
    fn minimal_envelopes_fill_defaults() {
        let env: SuccessEnvelope<Tokens> =
            serde_json::from_str(r#"{"success":true,"status":200}"#).expect("parse");
        assert!(env.data.is_none());
        assert!(env.message.is_empty());

        let env: ErrorEnvelope =
            serde_json::from_str(r#"{"success":false,"message":null,"status":4101}"#)
                .expect("parse");
        assert_eq!(env.status, 4101);
        assert!(env.error.is_none());
    }

    #[test]
    fn envelope_without_status_is_rejected() {
        let parsed = serde_json::from_str::<ErrorEnvelope>(r#"{"success":false}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn body_emptiness() {
        assert!(TransportResponse::new(200, Vec::new()).is_body_empty());
        assert!(TransportResponse::new(200, " \n").is_body_empty());
        assert!(!TransportResponse::new(200, "{}").is_body_empty());
        assert!(TransportResponse::new(204, "").is_success());
        assert!(!TransportResponse::new(302, "").is_success());
    }
}
