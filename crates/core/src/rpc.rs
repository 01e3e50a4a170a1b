//! Line-delimited JSON-RPC 2.0, the capability invocation protocol.
//!
//! ```text
//! → {"jsonrpc":"2.0","id":1,"method":"tools/list","params":{}}
//! ← {"jsonrpc":"2.0","id":1,"result":{"tools":[{"type":"function","function":{...}}]}}
//! → {"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"greet","arguments":{"name":"Ada"}}}
//! ← {"jsonrpc":"2.0","id":2,"result":{"content":[{"type":"text","text":"Hello, Ada!"}]}}
//! ```

use serde::{Deserialize, Serialize};
use crate::capability::CapabilitySpec;

pub const JSONRPC_VERSION: &str = "2.0";
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const METHOD_INITIALIZE: &str = "initialize";
pub const METHOD_LIST: &str = "tools/list";
pub const METHOD_CALL: &str = "tools/call";

pub const PARSE_ERROR: i64 = -32700;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

impl RpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id,
            method: method.into(),
            params,
        }
    }

    pub fn initialize(id: u64) -> Self {
        Self::new(id, METHOD_INITIALIZE, serde_json::json!({}))
    }

    pub fn list(id: u64) -> Self {
        Self::new(id, METHOD_LIST, serde_json::json!({}))
    }

    pub fn call(id: u64, name: &str, arguments: serde_json::Value) -> Self {
        Self::new(
            id,
            METHOD_CALL,
            serde_json::json!({ "name": name, "arguments": arguments }),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorBody {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorBody>,
}

impl RpcResponse {
    pub fn success(id: u64, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<u64>, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id,
            result: None,
            error: Some(RpcErrorBody {
                code,
                message: message.into(),
            }),
        }
    }

    /// The first text content item of a `tools/call` result.
    pub fn text(&self) -> Option<String> {
        self.result.as_ref().and_then(decode_text)
    }
}

/// Encode specs as a `tools/list` result.
pub fn encode_tool_list(specs: &[CapabilitySpec]) -> serde_json::Value {
    let tools: Vec<serde_json::Value> = specs
        .iter()
        .map(|s| {
            serde_json::json!({
                "type": "function",
                "function": {
                    "name": s.name,
                    "description": s.description,
                    "parameters": s.parameters,
                }
            })
        })
        .collect();
    serde_json::json!({ "tools": tools })
}

/// Decode a `tools/list` result. Entries without a function name are
/// rejected as a whole; a worker that lists garbage is not trusted.
pub fn decode_tool_list(result: &serde_json::Value) -> Result<Vec<CapabilitySpec>, String> {
    let tools = result["tools"]
        .as_array()
        .ok_or_else(|| "missing 'tools' array".to_string())?;

    tools
        .iter()
        .map(|tool| {
            let function = &tool["function"];
            let name = function["name"]
                .as_str()
                .ok_or_else(|| "tool entry without a function name".to_string())?;
            Ok(CapabilitySpec {
                name: name.to_string(),
                description: function["description"].as_str().unwrap_or_default().to_string(),
                parameters: match &function["parameters"] {
                    serde_json::Value::Null => serde_json::json!({"type": "object", "properties": {}}),
                    p => p.clone(),
                },
            })
        })
        .collect()
}

/// Encode text as a `tools/call` result.
pub fn encode_text(text: &str) -> serde_json::Value {
    serde_json::json!({ "content": [{ "type": "text", "text": text }] })
}

/// Extract the first text item from a `tools/call` result.
pub fn decode_text(result: &serde_json::Value) -> Option<String> {
    result["content"]
        .as_array()?
        .iter()
        .find(|item| item["type"].as_str().is_none_or(|t| t == "text"))
        .and_then(|item| item["text"].as_str())
        .map(str::to_string)
}
