//! JSON-RPC message validation.

use crate::types::{GatewayError, GatewayResult, JsonRpcRequest, JSONRPC_VERSION};

/// Validate that a JSON-RPC request is well-formed.
pub fn validate_request(request: &JsonRpcRequest) -> GatewayResult<()> {
    if request.jsonrpc != JSONRPC_VERSION {
        return Err(GatewayError::InvalidRequest(format!(
            "Expected jsonrpc version \"{JSONRPC_VERSION}\", got \"{}\"",
            request.jsonrpc
        )));
    }

    if request.method.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "Method name must not be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RequestId;

    fn request(jsonrpc: &str, method: &str) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: jsonrpc.to_string(),
            id: RequestId::Number(1),
            method: method.to_string(),
            params: None,
        }
    }

    #[test]
    fn test_validate() {
        assert!(validate_request(&request("2.0", "ping")).is_ok());
        assert!(validate_request(&request("1.0", "ping")).is_err());
        assert!(validate_request(&request("2.0", "")).is_err());
    }
}
