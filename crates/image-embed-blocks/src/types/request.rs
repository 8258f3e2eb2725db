//! Request parameter types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parameters of `blocks/call`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockCallParams {
    pub opcode: String,
    #[serde(default)]
    pub args: Option<Value>,
}
