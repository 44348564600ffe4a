//! Transport layer for MCP communication.

pub mod framing;
pub mod sse;
pub mod stdio;
pub mod streamable;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

use crate::types::{GatewayError, JsonRpcErrorObject, RequestId, JSONRPC_VERSION};

pub use stdio::StdioTransport;

/// Keep-alive comment interval on every event stream.
pub const KEEP_ALIVE_SECS: u64 = 15;

/// Error body for HTTP-level rejections, serialized as
/// `{"jsonrpc":"2.0","error":{...},"id":...}` in that field order.
#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    jsonrpc: &'static str,
    error: JsonRpcErrorObject,
    id: RequestId,
}

/// Render a gateway error as a JSON-RPC error response with the given status.
pub(crate) fn error_response(status: StatusCode, err: &GatewayError) -> Response {
    let body = ErrorEnvelope {
        jsonrpc: JSONRPC_VERSION,
        error: JsonRpcErrorObject {
            code: err.code(),
            message: err.to_string(),
            data: None,
        },
        id: RequestId::Null,
    };
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_field_order() {
        let body = ErrorEnvelope {
            jsonrpc: JSONRPC_VERSION,
            error: JsonRpcErrorObject {
                code: GatewayError::BadSession.code(),
                message: GatewayError::BadSession.to_string(),
                data: None,
            },
            id: RequestId::Null,
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"jsonrpc":"2.0","error":{"code":-32000,"message":"Bad Request: No valid session ID provided"},"id":null}"#
        );
    }
}
