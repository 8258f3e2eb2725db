//! Bridge errors and their JSON-RPC error codes.
//!
//! Block failures never become bridge errors; they degrade to empty values
//! inside the facade. Only malformed traffic reaches the host as an error.

use super::message::{JsonRpcError, RequestId};

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Unknown block opcode.
    pub const BLOCK_NOT_FOUND: i32 = -32803;
}

#[derive(thiserror::Error, Debug)]
pub enum BridgeError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Block not found: {0}")]
    BlockNotFound(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BridgeError {
    pub fn code(&self) -> i32 {
        use error_codes::*;
        match self {
            BridgeError::ParseError(_) | BridgeError::Json(_) => PARSE_ERROR,
            BridgeError::InvalidRequest(_) => INVALID_REQUEST,
            BridgeError::MethodNotFound(_) => METHOD_NOT_FOUND,
            BridgeError::InvalidParams(_) => INVALID_PARAMS,
            BridgeError::BlockNotFound(_) => BLOCK_NOT_FOUND,
            BridgeError::InternalError(_) | BridgeError::Io(_) => INTERNAL_ERROR,
        }
    }

    pub fn to_json_rpc_error(&self, id: RequestId) -> JsonRpcError {
        JsonRpcError::new(id, self.code(), self.to_string())
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;
