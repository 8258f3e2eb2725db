//! Request dispatcher — receives JSON-RPC messages from the host and routes
//! them to the blocks.

use std::sync::Arc;

use serde_json::Value;

use crate::blocks::{BlockRegistry, ExtensionBlocks};
use crate::types::*;

use super::validator::validate_request;

/// Dispatches host messages to one set of blocks. Requests are handled one
/// at a time, in arrival order.
pub struct ProtocolHandler {
    blocks: Arc<ExtensionBlocks>,
}

impl ProtocolHandler {
    pub fn new(blocks: Arc<ExtensionBlocks>) -> Self {
        Self { blocks }
    }

    pub async fn handle_message(&self, msg: JsonRpcMessage) -> Option<Value> {
        match msg {
            JsonRpcMessage::Request(req) => Some(self.handle_request(req).await),
            JsonRpcMessage::Notification(notif) => {
                tracing::debug!("Ignoring notification: {}", notif.method);
                None
            }
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> Value {
        if let Err(e) = validate_request(&request) {
            return serde_json::to_value(e.to_json_rpc_error(request.id)).unwrap_or_default();
        }

        let id = request.id.clone();
        match self.dispatch_request(&request).await {
            Ok(value) => serde_json::to_value(JsonRpcResponse::new(id, value)).unwrap_or_default(),
            Err(e) => serde_json::to_value(e.to_json_rpc_error(id)).unwrap_or_default(),
        }
    }

    async fn dispatch_request(&self, request: &JsonRpcRequest) -> BridgeResult<Value> {
        match request.method.as_str() {
            "extension/info" => {
                let info = self.blocks.get_info().await;
                serde_json::to_value(info).map_err(|e| BridgeError::InternalError(e.to_string()))
            }
            "extension/entry" => serde_json::to_value(self.blocks.entry())
                .map_err(|e| BridgeError::InternalError(e.to_string())),
            "blocks/call" => self.handle_blocks_call(request.params.clone()).await,
            "ping" => Ok(Value::Object(serde_json::Map::new())),
            _ => Err(BridgeError::MethodNotFound(request.method.clone())),
        }
    }

    async fn handle_blocks_call(&self, params: Option<Value>) -> BridgeResult<Value> {
        let call: BlockCallParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| BridgeError::InvalidParams(e.to_string()))?
            .ok_or_else(|| BridgeError::InvalidParams("Block call params required".to_string()))?;

        let value = BlockRegistry::call(&call.opcode, call.args, &self.blocks).await?;
        serde_json::to_value(value).map_err(|e| BridgeError::InternalError(e.to_string()))
    }
}
