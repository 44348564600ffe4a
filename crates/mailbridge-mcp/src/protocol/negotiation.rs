//! Initialization handshake.

use crate::types::{InitializeParams, InitializeResult, MCP_VERSION};

/// Answer an `initialize` request. The server always replies with its own
/// protocol version; a different client version is only logged.
pub fn negotiate(params: &InitializeParams) -> InitializeResult {
    if params.protocol_version != MCP_VERSION {
        tracing::warn!(
            "Client requested protocol version {}, server supports {}. Proceeding with server version.",
            params.protocol_version,
            MCP_VERSION
        );
    }

    tracing::debug!(
        "Initialized with client: {} v{}",
        params.client_info.name,
        params.client_info.version
    );

    InitializeResult::default_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Implementation;

    #[test]
    fn test_mismatched_version_still_answers_with_server_version() {
        let params = InitializeParams {
            protocol_version: "1999-01-01".to_string(),
            capabilities: serde_json::json!({}),
            client_info: Implementation {
                name: "client".to_string(),
                version: "0.0.1".to_string(),
            },
        };
        let result = negotiate(&params);
        assert_eq!(result.protocol_version, MCP_VERSION);
        assert!(result.capabilities.tools.is_some());
    }
}
