//! Message framing for newline-delimited JSON.

use crate::types::{BridgeError, BridgeResult, JsonRpcMessage};

/// Parse a single line of text as a JSON-RPC message.
pub fn parse_message(line: &str) -> BridgeResult<JsonRpcMessage> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(BridgeError::ParseError("Empty message".to_string()));
    }

    serde_json::from_str(trimmed).map_err(|e| BridgeError::ParseError(e.to_string()))
}

/// Serialize a value to a JSON line (with trailing newline).
pub fn frame_message(value: &serde_json::Value) -> BridgeResult<String> {
    let mut json = serde_json::to_string(value)?;
    json.push('\n');
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_empty_and_garbage() {
        assert!(matches!(parse_message("  "), Err(BridgeError::ParseError(_))));
        assert!(matches!(parse_message("{nope"), Err(BridgeError::ParseError(_))));
    }

    #[test]
    fn test_frame_appends_newline() {
        let framed = frame_message(&serde_json::json!({"a": 1})).unwrap();
        assert_eq!(framed, "{\"a\":1}\n");
    }
}
