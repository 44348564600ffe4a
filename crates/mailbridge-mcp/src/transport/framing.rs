//! Message framing: newline-delimited JSON for stdio, single-object bodies for HTTP.

use crate::types::{GatewayError, GatewayResult, JsonRpcMessage};

/// Parse a single line of text as a JSON-RPC message.
pub fn parse_message(line: &str) -> GatewayResult<JsonRpcMessage> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(GatewayError::ParseError("Empty message".to_string()));
    }

    serde_json::from_str(trimmed).map_err(|e| GatewayError::ParseError(e.to_string()))
}

/// Decode an HTTP request body. Batches (JSON arrays) are not accepted.
pub fn decode_body(body: &[u8]) -> GatewayResult<JsonRpcMessage> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| GatewayError::ParseError(e.to_string()))?;

    if value.is_array() {
        return Err(GatewayError::InvalidRequest(
            "Batch requests are not supported".to_string(),
        ));
    }

    serde_json::from_value(value).map_err(|e| GatewayError::InvalidRequest(e.to_string()))
}

/// Serialize a value to a JSON line (with trailing newline).
pub fn frame_message(value: &serde_json::Value) -> GatewayResult<String> {
    let mut json = serde_json::to_string(value)?;
    json.push('\n');
    Ok(json)
}
