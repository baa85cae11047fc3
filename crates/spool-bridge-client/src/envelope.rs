//! The bridge response envelope.
//!
//! Every bridge response body is either
//! `{"success": true, "data": {...}}` or
//! `{"success": false, "error": {"message": "..."}}`.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::BridgeError;

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    #[serde(default)]
    error: Option<EnvelopeError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnvelopeError {
    #[serde(default)]
    message: String,
}

impl<T> Envelope<T> {
    fn failure_message(&self) -> String {
        match &self.error {
            Some(e) if !e.message.is_empty() => e.message.clone(),
            _ => "success=false without error message".to_string(),
        }
    }
}

/// Parse `body` and return its `data`, requiring `success: true`.
pub(crate) fn parse_data<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T, BridgeError> {
    let envelope: Envelope<T> = parse(endpoint, body)?;
    if !envelope.success {
        return Err(protocol(endpoint, envelope.failure_message()));
    }
    envelope
        .data
        .ok_or_else(|| protocol(endpoint, "success envelope without data".to_string()))
}

/// Parse `body` and require `success: true`; `data` may be absent.
pub(crate) fn parse_ack(endpoint: &str, body: &str) -> Result<(), BridgeError> {
    let envelope: Envelope<serde_json::Value> = parse(endpoint, body)?;
    if envelope.success {
        Ok(())
    } else {
        Err(protocol(endpoint, envelope.failure_message()))
    }
}

/// Best-effort error message from a non-2xx body.
pub(crate) fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<Envelope<serde_json::Value>>(body)
        .ok()
        .and_then(|e| e.error)
        .map(|e| e.message)
        .filter(|m| !m.is_empty())
}

fn parse<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<Envelope<T>, BridgeError> {
    serde_json::from_str(body).map_err(|e| protocol(endpoint, format!("malformed envelope: {e}")))
}

fn protocol(endpoint: &str, message: String) -> BridgeError {
    BridgeError::Protocol {
        endpoint: endpoint.to_string(),
        message,
    }
}
