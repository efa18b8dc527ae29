//! JSON-RPC request handling

use crate::config::ServerConfig;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use sigma::{classify, Options, Renderer, Sigma, Subject};
use std::time::Instant;

pub const PROTOCOL_VERSION: &str = "2025-11-25";
pub const SERVER_NAME: &str = "sigma";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

// MCP Protocol types
#[derive(Debug, Deserialize)]
pub struct McpRequest {
    pub jsonrpc: String,
    pub id: Option<JsonValue>,
    pub method: String,
    #[serde(default)]
    pub params: Option<JsonValue>,
}

#[derive(Debug, Serialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
}

impl McpResponse {
    pub fn parse_error(details: impl std::fmt::Display) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: None,
            result: None,
            error: Some(McpError::new(-32700, format!("Parse error: {}", details))),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct McpError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

impl McpError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(-32602, message)
    }
}

/// Shared state for the request loop
pub struct Server {
    sigma: Sigma,
    config: ServerConfig,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        let sigma = Sigma::with_standard_solvers().with_max_steps(config.max_steps);
        Self { sigma, config }
    }

    pub fn handle_request(&self, request: &McpRequest) -> McpResponse {
        let result = match request.method.as_str() {
            // Lifecycle
            "initialize" => handle_initialize(&request.params),
            "initialized" => Ok(json!({})),
            "ping" => Ok(json!({})),

            // Tools
            "tools/list" => handle_tools_list(),
            "tools/call" => self.handle_tool_call(&request.params),

            _ => Err(McpError::new(-32601, format!("Method not found: {}", request.method))),
        };

        match result {
            Ok(r) => McpResponse {
                jsonrpc: "2.0".to_string(),
                id: request.id.clone(),
                result: Some(r),
                error: None,
            },
            Err(e) => McpResponse {
                jsonrpc: "2.0".to_string(),
                id: request.id.clone(),
                result: None,
                error: Some(e),
            },
        }
    }

    fn handle_tool_call(&self, params: &Option<JsonValue>) -> Result<JsonValue, McpError> {
        let params = params
            .as_ref()
            .ok_or_else(|| McpError::invalid_params("Missing params"))?;

        let name = params
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| McpError::invalid_params("Missing tool name"))?;

        let args = params.get("arguments").cloned().unwrap_or(json!({}));

        match name {
            "solve" => self.tool_solve(&args),
            "classify" => self.tool_classify(&args),
            "list_solvers" => self.tool_list_solvers(&args),
            _ => Err(McpError::invalid_params(format!("Unknown tool: {}", name))),
        }
    }

    fn tool_solve(&self, args: &JsonValue) -> Result<JsonValue, McpError> {
        let query = self.query_arg(args)?;
        let subject = args.get("subject").and_then(|v| v.as_str()).unwrap_or("algebra");
        let mode = args.get("mode").and_then(|v| v.as_str()).unwrap_or("auto");
        let options = args.get("options").map(Options::from_json).unwrap_or_default();

        let started = Instant::now();
        let env = self.sigma.solve_named(subject, query, mode, &options);
        let env = env.with_elapsed_ms(started.elapsed().as_secs_f64() * 1000.0);
        tracing::info!(subject, mode, ok = env.ok, elapsed_ms = ?env.elapsed_ms, "solve");

        Ok(json!({
            "content": [{ "type": "text", "text": Renderer::new().render(&env) }],
            "data": env.to_json(),
            "isError": !env.ok
        }))
    }

    fn tool_classify(&self, args: &JsonValue) -> Result<JsonValue, McpError> {
        let query = self.query_arg(args)?;
        let subject = Subject::from_name(args.get("subject").and_then(|v| v.as_str()).unwrap_or("algebra"));
        let format = classify(subject, query);
        let (parsed, warnings) = self.sigma.parse(subject, query);

        Ok(json!({
            "content": [{ "type": "text", "text": format!("{} ({})", format, parsed.kind()) }],
            "data": {
                "subject": subject,
                "format": format,
                "parsed": parsed.kind(),
                "warnings": warnings,
            }
        }))
    }

    fn tool_list_solvers(&self, args: &JsonValue) -> Result<JsonValue, McpError> {
        let data = match args.get("name").and_then(|v| v.as_str()) {
            Some(name) => self.sigma.help(Some(name)),
            None => self.sigma.list_solvers(),
        };
        let text = serde_json::to_string_pretty(&data).unwrap_or_default();
        Ok(json!({ "content": [{ "type": "text", "text": text }], "data": data }))
    }

    /// The `query` argument, rejected before parsing when over the size limit
    fn query_arg<'a>(&self, args: &'a JsonValue) -> Result<&'a str, McpError> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| McpError::invalid_params("Missing query argument"))?;
        let size = query.chars().count();
        if size > self.config.max_input_size {
            tracing::warn!(size, limit = self.config.max_input_size, "query rejected");
            return Err(McpError {
                code: -32602,
                message: "Input too large".to_string(),
                data: Some(json!({ "size": size, "max_input_size": self.config.max_input_size })),
            });
        }
        Ok(query)
    }
}

fn handle_initialize(params: &Option<JsonValue>) -> Result<JsonValue, McpError> {
    let client_info = params
        .as_ref()
        .and_then(|p| p.get("clientInfo"))
        .and_then(|c| c.get("name"))
        .and_then(|n| n.as_str())
        .unwrap_or("unknown");

    // Use client's protocol version for compatibility
    let client_protocol = params
        .as_ref()
        .and_then(|p| p.get("protocolVersion"))
        .and_then(|v| v.as_str())
        .unwrap_or(PROTOCOL_VERSION);

    tracing::info!(client = client_info, protocol = client_protocol, "client connected");

    Ok(json!({
        "protocolVersion": client_protocol,
        "serverInfo": {
            "name": SERVER_NAME,
            "version": SERVER_VERSION,
            "description": "Step-by-step math solver"
        },
        "capabilities": {
            "tools": {
                "listChanged": false
            }
        },
        "instructions": "Sigma solves algebra, calculus, linear algebra and discrete math queries and shows every step. Pick the subject and mode with 'solve'; use 'list_solvers' to see which modes each subject supports."
    }))
}

fn handle_tools_list() -> Result<JsonValue, McpError> {
    let subjects: Vec<&str> = Subject::ALL.iter().map(|s| s.as_str()).collect();
    let modes: Vec<&str> = sigma::Mode::ALL.iter().map(|m| m.as_str()).collect();
    Ok(json!({
        "tools": [
            {
                "name": "solve",
                "description": "Solve a math query and return the result with every solution step.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "Plain notation, LaTeX, or a matrix literal like [[1,2],[3,4]]"
                        },
                        "subject": {
                            "type": "string",
                            "enum": subjects,
                            "default": "algebra"
                        },
                        "mode": {
                            "type": "string",
                            "enum": modes,
                            "default": "auto"
                        },
                        "options": {
                            "type": "object",
                            "description": "var, definite, lower, upper, point, dir, n, func"
                        }
                    },
                    "required": ["query"]
                }
            },
            {
                "name": "classify",
                "description": "Show how a query would be classified and parsed, without solving it.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "query": { "type": "string" },
                        "subject": { "type": "string", "enum": subjects }
                    },
                    "required": ["query"]
                }
            },
            {
                "name": "list_solvers",
                "description": "List the solvers with their subjects and modes, or describe one solver.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "name": {
                            "type": "string",
                            "description": "Solver or subject name. Omit to list all."
                        }
                    }
                }
            }
        ]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> Server {
        Server::new(ServerConfig::default())
    }

    fn call(server: &Server, tool: &str, arguments: JsonValue) -> McpResponse {
        let request = McpRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(1)),
            method: "tools/call".to_string(),
            params: Some(json!({ "name": tool, "arguments": arguments })),
        };
        server.handle_request(&request)
    }

    #[test]
    fn test_solve_tool() {
        let resp = call(&server(), "solve", json!({"query": "2x + 3x", "subject": "algebra"}));
        let result = resp.result.unwrap();
        assert_eq!(result["data"]["ok"], json!(true));
        assert_eq!(result["data"]["result_latex"], json!("5 x"));
        assert!(result["data"]["elapsed_ms"].is_number());
        assert_eq!(result["isError"], json!(false));
    }

    #[test]
    fn test_solve_with_options() {
        let args = json!({
            "query": "x^2",
            "subject": "calc1",
            "mode": "integral",
            "options": {"definite": true, "lower": 0, "upper": 3}
        });
        let result = call(&server(), "solve", args).result.unwrap();
        assert_eq!(result["data"]["result_latex"], json!("9"));
    }

    #[test]
    fn test_input_size_limit() {
        let config = ServerConfig {
            max_input_size: 5,
            ..ServerConfig::default()
        };
        let resp = call(&Server::new(config), "solve", json!({"query": "x + x + x"}));
        let err = resp.error.unwrap();
        assert_eq!(err.code, -32602);
        assert_eq!(err.message, "Input too large");
    }

    #[test]
    fn test_classify_tool() {
        let result = call(&server(), "classify", json!({"query": "[[1,2],[3,4]]", "subject": "la"}))
            .result
            .unwrap();
        assert_eq!(result["data"]["format"], json!("matrix_literal"));
        assert_eq!(result["data"]["parsed"], json!("matrix"));
    }

    #[test]
    fn test_list_solvers_tool() {
        let result = call(&server(), "list_solvers", json!({})).result.unwrap();
        assert_eq!(result["data"].as_array().map(|a| a.len()), Some(4));
        let one = call(&server(), "list_solvers", json!({"name": "discrete"})).result.unwrap();
        assert_eq!(one["data"]["name"], json!("discrete"));
    }

    #[test]
    fn test_unknown_method_and_tool() {
        let request = McpRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(7)),
            method: "resources/list".to_string(),
            params: None,
        };
        assert_eq!(server().handle_request(&request).error.unwrap().code, -32601);
        assert_eq!(call(&server(), "eval", json!({})).error.unwrap().code, -32602);
    }
}
