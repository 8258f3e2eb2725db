//! JSON-RPC request validation.

use crate::types::{BridgeError, BridgeResult, JsonRpcRequest, JSONRPC_VERSION};

/// Validate that a JSON-RPC request is well-formed.
pub fn validate_request(request: &JsonRpcRequest) -> BridgeResult<()> {
    if request.jsonrpc != JSONRPC_VERSION {
        return Err(BridgeError::InvalidRequest(format!(
            "Expected jsonrpc version \"{JSONRPC_VERSION}\", got \"{}\"",
            request.jsonrpc
        )));
    }

    if request.method.is_empty() {
        return Err(BridgeError::InvalidRequest(
            "Method name must not be empty".to_string(),
        ));
    }

    Ok(())
}
