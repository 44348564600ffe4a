//! Gateway errors and their JSON-RPC codes.

use super::message::{JsonRpcError, RequestId};

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// Server-defined codes (JSON-RPC reserves -32000..-32099 for these).
pub mod gateway_error_codes {
    /// Missing or unusable session id on the session HTTP endpoint.
    pub const BAD_SESSION: i32 = -32000;
    /// Event-stream session unknown or already closed.
    pub const SESSION_NOT_FOUND: i32 = -32001;
}

/// Message returned verbatim when `/mcp` cannot resolve a session.
pub const BAD_SESSION_MESSAGE: &str = "Bad Request: No valid session ID provided";

/// All errors that can cross the gateway's protocol boundary.
#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Tool '{0}' not found")]
    ToolNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// A tool handler failed; the message is the handler's own.
    #[error("{0}")]
    Handler(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Bad Request: No valid session ID provided")]
    BadSession,

    #[error("No transport found for session {0}")]
    SessionNotFound(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Google error: {0}")]
    Google(#[from] mailbridge::GoogleError),
}

impl GatewayError {
    pub fn code(&self) -> i32 {
        use error_codes::*;
        use gateway_error_codes::*;
        match self {
            GatewayError::ParseError(_) | GatewayError::Json(_) => PARSE_ERROR,
            GatewayError::InvalidRequest(_) => INVALID_REQUEST,
            GatewayError::MethodNotFound(_) | GatewayError::ToolNotFound(_) => METHOD_NOT_FOUND,
            GatewayError::InvalidParams(_) => INVALID_PARAMS,
            GatewayError::Handler(_)
            | GatewayError::InternalError(_)
            | GatewayError::Transport(_)
            | GatewayError::Io(_)
            | GatewayError::Google(_) => INTERNAL_ERROR,
            GatewayError::BadSession => BAD_SESSION,
            GatewayError::SessionNotFound(_) => SESSION_NOT_FOUND,
        }
    }

    pub fn to_json_rpc_error(&self, id: RequestId) -> JsonRpcError {
        JsonRpcError::new(id, self.code(), self.to_string())
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(GatewayError::ToolNotFound("x".into()).code(), -32601);
        assert_eq!(GatewayError::Handler("boom".into()).code(), -32603);
        assert_eq!(GatewayError::InvalidParams("x".into()).code(), -32602);
        assert_eq!(GatewayError::BadSession.code(), -32000);
    }

    #[test]
    fn test_messages() {
        assert_eq!(GatewayError::Handler("boom".into()).to_string(), "boom");
        assert_eq!(
            GatewayError::ToolNotFound("nonexistent_tool".into()).to_string(),
            "Tool 'nonexistent_tool' not found"
        );
        assert_eq!(GatewayError::BadSession.to_string(), BAD_SESSION_MESSAGE);
    }
}
