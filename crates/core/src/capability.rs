//! Capability trait: the abstraction over what a worker can do.
//!
//! A worker is a named bundle of capabilities (search trains, search hotels,
//! greet someone...). Each capability takes named arguments and answers with
//! text. The [`CapabilitySet`] hosts a worker's capabilities and answers the
//! JSON-RPC methods of the invocation protocol.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::CapabilityError;
use crate::rpc::{self, RpcRequest, RpcResponse};

/// The advertised shape of a capability, as sent over `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilitySpec {
    pub name: String,
    pub description: String,
    /// JSON Schema object with `properties` and `required`
    pub parameters: serde_json::Value,
}

impl CapabilitySpec {
    /// Property names in declaration order.
    pub fn argument_names(&self) -> Vec<String> {
        self.parameters["properties"]
            .as_object()
            .map(|props| props.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn required_arguments(&self) -> Vec<String> {
        self.parameters["required"]
            .as_array()
            .map(|req| {
                req.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// The core Capability trait.
///
/// Built-in workers implement one of these per operation and register them
/// in a [`CapabilitySet`].
#[async_trait]
pub trait Capability: Send + Sync {
    /// The unique name of this capability within its worker.
    fn name(&self) -> &str;

    /// A description of what this capability does. Routing tags are
    /// derived from it, so it should name its domain.
    fn description(&self) -> &str;

    /// JSON Schema describing this capability's arguments.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute with the given arguments and return the text result.
    async fn execute(&self, arguments: serde_json::Value) -> Result<String, CapabilityError>;

    fn to_spec(&self) -> CapabilitySpec {
        CapabilitySpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// The capabilities hosted by one worker, in declaration order.
pub struct CapabilitySet {
    server_name: String,
    capabilities: Vec<Box<dyn Capability>>,
}

impl CapabilitySet {
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            capabilities: Vec::new(),
        }
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// Register a capability. Replaces any existing one with the same name
    /// in place, so declaration order is stable.
    pub fn register(&mut self, capability: Box<dyn Capability>) {
        match self
            .capabilities
            .iter()
            .position(|c| c.name() == capability.name())
        {
            Some(idx) => self.capabilities[idx] = capability,
            None => self.capabilities.push(capability),
        }
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, capability: Box<dyn Capability>) -> Self {
        self.register(capability);
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn Capability> {
        self.capabilities
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
    }

    pub fn specs(&self) -> Vec<CapabilitySpec> {
        self.capabilities.iter().map(|c| c.to_spec()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.capabilities.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// Invoke a capability by name.
    pub async fn invoke(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<String, CapabilityError> {
        let capability = self
            .get(name)
            .ok_or_else(|| CapabilityError::NotFound(name.to_string()))?;
        capability.execute(arguments).await
    }

    /// Answer one JSON-RPC request of the invocation protocol.
    pub async fn handle(&self, request: &RpcRequest) -> RpcResponse {
        match request.method.as_str() {
            rpc::METHOD_INITIALIZE => RpcResponse::success(
                request.id,
                serde_json::json!({
                    "protocolVersion": rpc::PROTOCOL_VERSION,
                    "capabilities": { "tools": {} },
                    "serverInfo": {
                        "name": self.server_name,
                        "version": env!("CARGO_PKG_VERSION"),
                    }
                }),
            ),
            rpc::METHOD_LIST => RpcResponse::success(request.id, rpc::encode_tool_list(&self.specs())),
            rpc::METHOD_CALL => {
                let Some(name) = request.params["name"].as_str() else {
                    return RpcResponse::failure(
                        Some(request.id),
                        rpc::INVALID_PARAMS,
                        "Missing capability name",
                    );
                };
                let arguments = match &request.params["arguments"] {
                    serde_json::Value::Null => serde_json::json!({}),
                    other => other.clone(),
                };
                match self.invoke(name, arguments).await {
                    Ok(text) => RpcResponse::success(request.id, rpc::encode_text(&text)),
                    Err(CapabilityError::NotFound(n)) => RpcResponse::failure(
                        Some(request.id),
                        rpc::METHOD_NOT_FOUND,
                        format!("Tool not found: {n}"),
                    ),
                    Err(e @ CapabilityError::InvalidArguments(_)) => {
                        RpcResponse::failure(Some(request.id), rpc::INVALID_PARAMS, e.to_string())
                    }
                    Err(e) => RpcResponse::failure(Some(request.id), rpc::INTERNAL_ERROR, e.to_string()),
                }
            }
            other => RpcResponse::failure(
                Some(request.id),
                rpc::METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple capability for unit tests.
    struct EchoCapability;

    #[async_trait]
    impl Capability for EchoCapability {
        fn name(&self) -> &str { "echo" }
        fn description(&self) -> &str { "Echoes back the input" }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" },
                    "loud": { "type": "boolean" }
                },
                "required": ["text"]
            })
        }
        async fn execute(&self, arguments: serde_json::Value) -> Result<String, CapabilityError> {
            arguments["text"]
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| CapabilityError::InvalidArguments("Missing 'text' argument".into()))
        }
    }

    #[test]
    fn spec_lists_arguments_in_declaration_order() {
        let spec = EchoCapability.to_spec();
        assert_eq!(spec.argument_names(), vec!["text", "loud"]);
        assert_eq!(spec.required_arguments(), vec!["text"]);
    }

    #[test]
    fn register_replaces_in_place() {
        let mut set = CapabilitySet::new("test");
        set.register(Box::new(EchoCapability));
        set.register(Box::new(EchoCapability));
        assert_eq!(set.len(), 1);
        assert!(set.get("echo").is_some());
        assert!(set.get("missing").is_none());
    }

    #[tokio::test]
    async fn handle_call_returns_text_content() {
        let set = CapabilitySet::new("test").with(Box::new(EchoCapability));
        let req = RpcRequest::call(7, "echo", serde_json::json!({"text": "hello world"}));
        let resp = set.handle(&req).await;
        assert_eq!(resp.id, Some(7));
        assert_eq!(resp.text().as_deref(), Some("hello world"));
    }

    #[tokio::test]
    async fn handle_unknown_tool_is_method_not_found() {
        let set = CapabilitySet::new("test");
        let resp = set.handle(&RpcRequest::call(1, "nope", serde_json::json!({}))).await;
        let err = resp.error.unwrap();
        assert_eq!(err.code, rpc::METHOD_NOT_FOUND);
        assert!(err.message.contains("nope"));
    }

    #[tokio::test]
    async fn handle_invalid_arguments() {
        let set = CapabilitySet::new("test").with(Box::new(EchoCapability));
        let resp = set.handle(&RpcRequest::call(1, "echo", serde_json::json!({}))).await;
        assert_eq!(resp.error.unwrap().code, rpc::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn handle_list_round_trips_specs() {
        let set = CapabilitySet::new("test").with(Box::new(EchoCapability));
        let resp = set.handle(&RpcRequest::list(2)).await;
        let specs = rpc::decode_tool_list(resp.result.as_ref().unwrap()).unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name, "echo");
        assert_eq!(specs[0].description, "Echoes back the input");
    }

    #[tokio::test]
    async fn handle_initialize_reports_server_name() {
        let set = CapabilitySet::new("local-greeter");
        let resp = set.handle(&RpcRequest::initialize(0)).await;
        assert_eq!(resp.result.unwrap()["serverInfo"]["name"], "local-greeter");
    }
}
