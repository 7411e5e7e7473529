//! Response value handed to completions.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::Value;

use crate::connector::error::ConnectorError;

/// What a completion receives.
pub type ApiResponse = Result<ApiPayload, ConnectorError>;

/// Successful response.
#[derive(Debug, Clone)]
pub struct ApiPayload {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed JSON, the raw text as a string if it isn't JSON, `Null` if empty.
    pub body: Value,
    pub elapsed: Duration,
}

/// Decode a response body.
pub fn decode_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_json_text_and_empty() {
        assert_eq!(decode_body(br#"{"ok":true}"#), json!({"ok": true}));
        assert_eq!(decode_body(b"plain text"), json!("plain text"));
        assert_eq!(decode_body(b""), Value::Null);
        assert_eq!(decode_body(b"  \n"), Value::Null);
    }
}
