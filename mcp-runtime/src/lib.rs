use std::sync::Arc;

use clap::Subcommand;
use etsy_core::{ConfigError, CredentialConfig, Credentials, DispatchError};
use serde_json::{Map, Value, json};
use tokio::io::{self, BufReader};

pub mod dispatch;
pub mod envelope;
pub mod framing;
pub mod prompts;
pub mod registry;
pub mod resources;
pub mod tools;
pub mod transport;

#[cfg(test)]
mod testing;

pub use dispatch::{AUTHORIZATION_REQUIRED_MESSAGE, Dispatcher};
pub use envelope::ResultEnvelope;
pub use registry::{Access, OperationDescriptor, OperationRegistry};
pub use transport::{DEFAULT_API_BASE_URL, HttpTransport, Transport, TransportError};

use envelope::to_pretty_json;
use framing::{read_frame, write_frame};
use prompts::PromptError;
use resources::ResourceError;

const MCP_PROTOCOL_VERSION: &str = "2024-11-05";
const MCP_SERVER_NAME: &str = "etsy-mcp";

#[derive(Subcommand, Clone, Debug, Default, PartialEq, Eq)]
pub enum McpCommands {
    /// Run the Etsy MCP server over stdio (default)
    #[default]
    Serve,
    /// Print the operation catalog with access levels as JSON and exit
    Catalog,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub credentials: CredentialConfig,
    pub api_base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            credentials: CredentialConfig::default(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

pub async fn run(config: ServerConfig, command: McpCommands) -> i32 {
    match command {
        McpCommands::Catalog => {
            println!("{}", to_pretty_json(&catalog_payload(&OperationRegistry::etsy())));
            0
        }
        McpCommands::Serve => {
            let server = match McpServer::from_config(&config) {
                Ok(server) => server,
                Err(err) => {
                    tracing::error!(error = %err, "startup failed");
                    let payload = json!({
                        "error": "configuration_error",
                        "message": err.to_string(),
                    });
                    eprintln!("{}", to_pretty_json(&payload));
                    return 1;
                }
            };
            match server.serve_stdio().await {
                Ok(()) => 0,
                Err(err) => {
                    let payload = json!({
                        "error": "mcp_server_error",
                        "message": err,
                    });
                    eprintln!("{}", to_pretty_json(&payload));
                    1
                }
            }
        }
    }
}

/// Catalog summary for the `catalog` subcommand.
pub fn catalog_payload(registry: &OperationRegistry) -> Value {
    let operations: Vec<Value> = registry
        .iter()
        .map(|op| {
            json!({
                "name": op.name,
                "access": op.access.as_str(),
                "method": op.method.as_str(),
                "path": op.path,
                "description": op.description,
            })
        })
        .collect();
    json!({
        "server": MCP_SERVER_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "operations": operations
    })
}

/// JSON-RPC front of the dispatcher. Stateless between messages.
pub struct McpServer {
    dispatcher: Dispatcher,
}

impl McpServer {
    pub fn new(credentials: Credentials, transport: Arc<dyn Transport>) -> Self {
        Self {
            dispatcher: Dispatcher::new(credentials, transport, OperationRegistry::etsy()),
        }
    }

    /// Resolve credentials (explicit config, then environment) and bind an
    /// HTTP transport. Fails before any message is read.
    pub fn from_config(config: &ServerConfig) -> Result<Self, ConfigError> {
        Self::from_config_with(config, |name| std::env::var(name).ok())
    }

    fn from_config_with<F>(config: &ServerConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = Credentials::resolve_with(&config.credentials, lookup)?;
        let transport = HttpTransport::new(&credentials, &config.api_base_url)?;
        let server = Self::new(credentials, Arc::new(transport));
        tracing::info!(
            operations = server.dispatcher.registry().len(),
            access_token = server.dispatcher.credentials().has_access_token(),
            shop_id_configured = server.dispatcher.credentials().shop_id().is_some(),
            base_url = %config.api_base_url,
            "etsy MCP server ready"
        );
        Ok(server)
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub async fn serve_stdio(&self) -> Result<(), String> {
        let mut reader = BufReader::new(io::stdin());
        let mut stdout = io::stdout();

        loop {
            let frame = read_frame(&mut reader)
                .await
                .map_err(|e| format!("Failed to read MCP message: {e}"))?;
            let Some(frame) = frame else {
                tracing::info!("stdin closed, shutting down");
                break;
            };

            let responses = match frame.message {
                Ok(incoming) => self.handle_incoming_message(incoming).await,
                Err(err) => vec![error_response(
                    Value::Null,
                    RpcError::parse_error(format!("Invalid JSON payload: {err}")),
                )],
            };
            for response in responses {
                write_frame(&mut stdout, &response, frame.framing)
                    .await
                    .map_err(|e| format!("Failed to write MCP response: {e}"))?;
            }
        }

        Ok(())
    }

    pub async fn handle_incoming_message(&self, incoming: Value) -> Vec<Value> {
        let mut responses = Vec::new();

        if let Some(batch) = incoming.as_array() {
            if batch.is_empty() {
                responses.push(error_response(
                    Value::Null,
                    RpcError::invalid_request("Batch request must not be empty"),
                ));
                return responses;
            }
            for item in batch {
                if let Some(response) = self.handle_single_message(item.clone()).await {
                    responses.push(response);
                }
            }
            return responses;
        }

        if let Some(response) = self.handle_single_message(incoming).await {
            responses.push(response);
        }
        responses
    }

    async fn handle_single_message(&self, incoming: Value) -> Option<Value> {
        let Some(obj) = incoming.as_object() else {
            return Some(error_response(
                Value::Null,
                RpcError::invalid_request("Request must be a JSON object"),
            ));
        };

        if obj.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
            let id = obj.get("id").cloned().unwrap_or(Value::Null);
            return Some(error_response(
                id,
                RpcError::invalid_request("jsonrpc must be '2.0'"),
            ));
        }

        let Some(method) = obj.get("method").and_then(Value::as_str) else {
            // A client response; this server never sends requests.
            return None;
        };

        let params = obj.get("params").cloned().unwrap_or(Value::Null);
        match obj.get("id").cloned() {
            Some(id) => Some(match self.handle_request(method, params).await {
                Ok(payload) => success_response(id, payload),
                Err(err) => error_response(id, err),
            }),
            None => {
                tracing::debug!(method, "notification ignored");
                None
            }
        }
    }

    async fn handle_request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match method {
            "initialize" => Ok(self.initialize_payload()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.dispatcher.registry().tools_payload()),
            "tools/call" => self.handle_tools_call(params).await,
            "resources/list" => Ok(resources::list_payload()),
            "resources/read" => self.handle_resources_read(params),
            "prompts/list" => Ok(prompts::list_payload()),
            "prompts/get" => handle_prompts_get(params),
            _ => Err(RpcError::method_not_found(method)),
        }
    }

    fn initialize_payload(&self) -> Value {
        let instructions = if self.dispatcher.credentials().has_access_token() {
            "Etsy Open API v3 tools. Read tools search and inspect listings and shops; \
             write tools manage listings, inventory, images, sections and shop details. \
             Shop-scoped tools default to the configured shop when shop_id is omitted."
        } else {
            "Etsy Open API v3 tools. No OAuth access token is configured, so only read tools \
             will reach Etsy; write tools return an authorization message until \
             ETSY_ACCESS_TOKEN is set."
        };
        json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {
                "tools": { "listChanged": false },
                "resources": { "listChanged": false },
                "prompts": { "listChanged": false }
            },
            "serverInfo": {
                "name": MCP_SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            },
            "instructions": instructions
        })
    }

    async fn handle_tools_call(&self, params: Value) -> Result<Value, RpcError> {
        let params = params
            .as_object()
            .ok_or_else(|| RpcError::invalid_params("tools/call params must be an object"))?;

        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::invalid_params("tools/call requires string field 'name'"))?;

        let args = object_field(params, "arguments", "tools/call")?;
        let envelope = self.dispatcher.dispatch(name, &args).await?;
        Ok(envelope.to_value())
    }

    fn handle_resources_read(&self, params: Value) -> Result<Value, RpcError> {
        let params = params
            .as_object()
            .ok_or_else(|| RpcError::invalid_params("resources/read params must be an object"))?;
        let uri = params.get("uri").and_then(Value::as_str).ok_or_else(|| {
            RpcError::invalid_params("resources/read requires string field 'uri'")
        })?;
        Ok(resources::read(uri, self.dispatcher.registry())?)
    }
}

fn handle_prompts_get(params: Value) -> Result<Value, RpcError> {
    let params = params
        .as_object()
        .ok_or_else(|| RpcError::invalid_params("prompts/get params must be an object"))?;
    let name = params
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::invalid_params("prompts/get requires string field 'name'"))?;
    let args = object_field(params, "arguments", "prompts/get")?;
    Ok(prompts::get_prompt(name, &args)?)
}

/// Optional object-valued param; absent or null means empty.
fn object_field(
    params: &Map<String, Value>,
    key: &str,
    method: &str,
) -> Result<Map<String, Value>, RpcError> {
    match params.get(key) {
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(Value::Null) | None => Ok(Map::new()),
        Some(_) => Err(RpcError::invalid_params(format!(
            "{method} '{key}' must be an object"
        ))),
    }
}

#[derive(Debug)]
struct RpcError {
    code: i64,
    message: String,
    data: Option<Value>,
}

impl RpcError {
    fn parse_error(message: impl Into<String>) -> Self {
        Self {
            code: -32700,
            message: message.into(),
            data: None,
        }
    }

    fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: -32600,
            message: message.into(),
            data: None,
        }
    }

    fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: format!("Method not found: {method}"),
            data: None,
        }
    }

    fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: -32602,
            message: message.into(),
            data: None,
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            code: -32603,
            message: message.into(),
            data: None,
        }
    }

    fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl From<DispatchError> for RpcError {
    fn from(err: DispatchError) -> Self {
        let data = json!({ "code": err.code() });
        match &err {
            DispatchError::UnknownOperation(_) | DispatchError::InvalidArguments { .. } => {
                RpcError::invalid_params(err.to_string()).with_data(data)
            }
            DispatchError::Transport { .. } => {
                tracing::error!(error = %err, "dispatch failed");
                RpcError::internal(err.to_string()).with_data(data)
            }
        }
    }
}

impl From<PromptError> for RpcError {
    fn from(err: PromptError) -> Self {
        RpcError::invalid_params(err.to_string())
    }
}

impl From<ResourceError> for RpcError {
    fn from(err: ResourceError) -> Self {
        RpcError::invalid_params(err.to_string())
    }
}

fn success_response(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

fn error_response(id: Value, error: RpcError) -> Value {
    let mut payload = json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": error.code,
            "message": error.message
        }
    });
    if let Some(data) = error.data {
        payload["error"]["data"] = data;
    }
    payload
}
