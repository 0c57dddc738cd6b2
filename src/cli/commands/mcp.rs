//! promptfmt mcp - MCP (Model Context Protocol) server mode
//!
//! Exposes prompt formatting, analysis and validation as MCP tools over
//! stdio, one JSON-RPC 2.0 message per line.
//!
//! # Output Safety
//!
//! **CRITICAL**: MCP responses MUST always be valid JSON. This module enforces:
//! - All output is sanitized to remove ANSI escape codes
//! - All responses are validated before sending
//! - Terminal styling is disabled for the lifetime of the server
//! - Logging goes to stderr only
//!
//! See [`sanitize_mcp_output`] and [`validate_mcp_json`] for details.

use std::io::{self, BufRead, Write};

use clap::{Args, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::analyzer::{DetectionProfile, TargetModel};
use crate::app::AppContext;
use crate::cli::output::{OutputFormat, emit_json};
use crate::error::{PromptError, Result};
use crate::formatter::FormatOptions;
use crate::templates::CustomTemplate;

/// MCP server protocol version
const PROTOCOL_VERSION: &str = "2024-11-05";
/// Server name for identification
const SERVER_NAME: &str = "promptfmt";
/// Server version (from cargo)
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// MCP Output Safety
// ============================================================================
//
// CRITICAL: MCP responses MUST be valid JSON with NO ANSI codes.
// These functions ensure output safety regardless of environment or config.

/// Check if styled output would have been enabled based on environment.
///
/// Returns Some(reason) if styling would be enabled, None otherwise.
/// Used for logging when MCP blocks styled output.
fn would_enable_rich_output() -> Option<&'static str> {
    use std::io::IsTerminal;

    if std::env::var_os("FORCE_COLOR").is_some() {
        return Some("FORCE_COLOR");
    }
    if std::env::var_os("CLICOLOR_FORCE").is_some() {
        return Some("CLICOLOR_FORCE");
    }

    if std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none() {
        return Some("terminal_default");
    }

    None
}

/// Strip ANSI escape codes from a string.
///
/// CSI, OSC and DCS sequences go through [`console::strip_ansi_codes`]. A
/// stray ESC left by a truncated sequence is dropped as well.
#[must_use]
pub fn strip_ansi(input: &str) -> String {
    console::strip_ansi_codes(input).replace('\x1b', "")
}

/// Check if a string contains ANSI escape codes.
#[must_use]
pub fn contains_ansi(s: &str) -> bool {
    s.contains('\x1b')
}

/// Strip ANSI codes from text bound for an MCP response, logging when any
/// were found.
#[must_use]
pub fn sanitize_mcp_output(s: &str) -> String {
    if contains_ansi(s) {
        warn!("MCP output contained ANSI codes - stripping");
        strip_ansi(s)
    } else {
        s.to_string()
    }
}

/// Validate that a JSON string is safe for MCP transport.
pub fn validate_mcp_json(json: &str) -> std::result::Result<(), String> {
    if contains_ansi(json) {
        Err("MCP response contains ANSI escape codes".to_string())
    } else {
        Ok(())
    }
}

/// Serialize a JSON-RPC response, stripping anything that leaked through
/// and falling back to a minimal error when serialization fails.
fn serialize_response_safe(response: &JsonRpcResponse) -> String {
    match serde_json::to_string(response) {
        Ok(json) if contains_ansi(&json) => {
            warn!("JSON-RPC response contained ANSI codes after serialization");
            strip_ansi(&json)
        }
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to serialize JSON-RPC response: {}", e);
            let fallback = JsonRpcResponse::error(
                None,
                INTERNAL_ERROR,
                format!("Failed to serialize response: {e}"),
                None,
            );
            serde_json::to_string(&fallback).unwrap_or_else(|_| {
                r#"{"jsonrpc":"2.0","error":{"code":-32603,"message":"Serialization failed"}}"#
                    .to_string()
            })
        }
    }
}

#[derive(Args, Debug)]
pub struct McpArgs {
    #[command(subcommand)]
    pub command: McpCommand,
}

#[derive(Subcommand, Debug)]
pub enum McpCommand {
    /// Start MCP server with stdio transport
    Serve(ServeArgs),
    /// List available MCP tools
    Tools,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Echo every message to stderr
    #[arg(long)]
    pub debug: bool,
}

// ============================================================================
// JSON-RPC 2.0 Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl JsonRpcResponse {
    fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Success carrying any serializable result.
    fn success_with<T: Serialize>(id: Option<Value>, result: &T) -> Self {
        match serde_json::to_value(result) {
            Ok(value) => Self::success(id, value),
            Err(e) => Self::error(id, INTERNAL_ERROR, format!("Failed to encode result: {e}"), None),
        }
    }

    fn error(id: Option<Value>, code: i32, message: String, data: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data,
            }),
        }
    }
}

// JSON-RPC 2.0 error codes
const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const INTERNAL_ERROR: i32 = -32603;

// ============================================================================
// MCP Protocol Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ServerCapabilities {
    tools: ToolsCapability,
}

#[derive(Debug, Serialize)]
struct ToolsCapability {
    #[serde(rename = "listChanged")]
    list_changed: bool,
}

#[derive(Debug, Serialize)]
struct ServerInfo {
    name: String,
    version: String,
}

#[derive(Debug, Serialize)]
struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    protocol_version: String,
    capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    server_info: ServerInfo,
}

#[derive(Debug, Serialize)]
struct Tool {
    name: String,
    description: String,
    #[serde(rename = "inputSchema")]
    input_schema: Value,
}

#[derive(Debug, Serialize)]
struct ToolsListResult {
    tools: Vec<Tool>,
}

#[derive(Debug, Serialize)]
struct ToolResult {
    content: Vec<ToolContent>,
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    is_error: Option<bool>,
}

#[derive(Debug, Serialize)]
struct ToolContent {
    #[serde(rename = "type")]
    content_type: String,
    text: String,
}

impl ToolResult {
    /// Text result with ANSI codes stripped.
    fn text(text: String) -> Self {
        Self {
            content: vec![ToolContent {
                content_type: "text".to_string(),
                text: sanitize_mcp_output(&text),
            }],
            is_error: None,
        }
    }

    /// Error result with ANSI codes stripped.
    fn error(message: String) -> Self {
        Self {
            content: vec![ToolContent {
                content_type: "text".to_string(),
                text: sanitize_mcp_output(&message),
            }],
            is_error: Some(true),
        }
    }

    fn json<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self::text(serde_json::to_string_pretty(value)?))
    }
}

// ============================================================================
// Tool Definitions
// ============================================================================

fn mode_schema() -> Value {
    serde_json::json!({
        "type": "string",
        "enum": ["standard", "enhanced"],
        "description": "Detection profile: standard (baseline patterns) or enhanced (multilingual patterns with heuristic fallback). Defaults to the configured profile."
    })
}

fn custom_fragment(description: &str) -> Value {
    serde_json::json!({ "type": "string", "description": description })
}

fn define_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: "format_prompt".to_string(),
            description: "Detect the sections of a prompt and rewrite it into a structured template (Claude XML, GPT Markdown, JSON or a custom layout)".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "prompt": {
                        "type": "string",
                        "description": "The prompt text to format"
                    },
                    "targetFormat": {
                        "type": "string",
                        "enum": [
                            "claude_xml",
                            "claude_xml_advanced",
                            "gpt_markdown",
                            "gpt_markdown_numbered",
                            "json",
                            "custom"
                        ],
                        "description": "Template to render with (default: claude_xml). Use 'custom' together with customTemplate."
                    },
                    "customTemplate": {
                        "type": "object",
                        "description": "Custom template fragments, used when targetFormat is 'custom'",
                        "properties": {
                            "introduction": custom_fragment("Introduction wrapper; must contain {{content}}"),
                            "rules_section": custom_fragment("Rules wrapper; must contain {{rules}}"),
                            "rule_item": custom_fragment("One rule; must contain {{content}}, may use {{index}}"),
                            "context_section": custom_fragment("Context wrapper; must contain {{content}}"),
                            "examples_section": custom_fragment("Examples wrapper; must contain {{examples}}"),
                            "example_item": custom_fragment("One example; must contain {{content}}, may use {{index}}, {{input}}, {{output}}"),
                            "output_section": custom_fragment("Output format wrapper; must contain {{content}}"),
                            "task_section": custom_fragment("Task wrapper; must contain {{content}}")
                        }
                    },
                    "options": {
                        "type": "object",
                        "properties": {
                            "preserveWhitespace": {
                                "type": "boolean",
                                "description": "Keep section whitespace exactly as detected"
                            },
                            "strictMode": {
                                "type": "boolean",
                                "description": "Fail when no task section is detected"
                            },
                            "includeMetadata": {
                                "type": "boolean",
                                "description": "Include length and section-count metadata"
                            }
                        }
                    },
                    "mode": mode_schema()
                },
                "required": ["prompt"]
            }),
        },
        Tool {
            name: "analyze_prompt".to_string(),
            description: "Score a prompt's clarity, completeness and structure, list issues and missing sections, and produce an optimisation brief".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "prompt": {
                        "type": "string",
                        "description": "The prompt text to analyze"
                    },
                    "targetModel": {
                        "type": "string",
                        "enum": ["claude", "gpt", "generic"],
                        "description": "Model family the optimisation brief targets (default: generic)",
                        "default": "generic"
                    },
                    "mode": mode_schema()
                },
                "required": ["prompt"]
            }),
        },
        Tool {
            name: "validate_prompt".to_string(),
            description: "Check a prompt against the writing conventions (role, rule markers, example markers, section separation, output format, task)".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "prompt": {
                        "type": "string",
                        "description": "The prompt text to validate"
                    }
                },
                "required": ["prompt"]
            }),
        },
    ]
}

// ============================================================================
// MCP Server Implementation
// ============================================================================

pub fn run(ctx: &AppContext, args: &McpArgs) -> Result<()> {
    match &args.command {
        McpCommand::Serve(serve_args) => run_serve(ctx, serve_args),
        McpCommand::Tools => run_tools(ctx),
    }
}

fn run_tools(ctx: &AppContext) -> Result<()> {
    let tools = define_tools();
    if ctx.output_format != OutputFormat::Human {
        emit_json(&serde_json::json!({
            "tools": tools,
            "count": tools.len()
        }))
    } else {
        println!("Available MCP Tools:\n");
        for tool in &tools {
            println!("  {} - {}", tool.name, tool.description);
        }
        println!("\n{} tools available.", tools.len());
        Ok(())
    }
}

fn run_serve(ctx: &AppContext, args: &ServeArgs) -> Result<()> {
    let debug = args.debug;

    if debug {
        eprintln!("[promptfmt-mcp] Starting MCP server (stdio mode)");
        eprintln!("[promptfmt-mcp] Server: {SERVER_NAME} v{SERVER_VERSION}");
        eprintln!("[promptfmt-mcp] Protocol: {PROTOCOL_VERSION}");
    }

    if let Some(reason) = would_enable_rich_output() {
        debug!(reason, "styled output would be enabled but MCP forces plain mode");
    }
    console::set_colors_enabled(false);
    console::set_colors_enabled_stderr(false);

    info!(server = SERVER_NAME, version = SERVER_VERSION, "MCP server listening on stdio");
    run_stdio_server(ctx, debug)
}

fn run_stdio_server(ctx: &AppContext, debug: bool) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!("stdin read error: {e}");
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        if debug {
            eprintln!("[promptfmt-mcp] <- {line}");
        }

        // None for notifications
        if let Some(response) = handle_request(ctx, &line) {
            let response_json = serialize_response_safe(&response);

            if let Err(e) = validate_mcp_json(&response_json) {
                warn!("MCP response validation failed after sanitization: {}", e);
            }

            if debug {
                eprintln!("[promptfmt-mcp] -> {response_json}");
            }

            if writeln!(stdout, "{response_json}").is_err() {
                break;
            }
            let _ = stdout.flush();
        } else if debug {
            eprintln!("[promptfmt-mcp] -> (no response - notification)");
        }
    }

    info!("MCP server shutting down");
    Ok(())
}

fn handle_request(ctx: &AppContext, line: &str) -> Option<JsonRpcResponse> {
    let request: JsonRpcRequest = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => {
            return Some(JsonRpcResponse::error(
                None,
                PARSE_ERROR,
                format!("Parse error: {e}"),
                None,
            ));
        }
    };

    if request.jsonrpc != "2.0" {
        return Some(JsonRpcResponse::error(
            request.id,
            INVALID_REQUEST,
            "Invalid JSON-RPC version".to_string(),
            None,
        ));
    }

    debug!(method = %request.method, "MCP request");

    match request.method.as_str() {
        "initialize" => Some(handle_initialize(request.id)),
        "initialized" | "notifications/initialized" => handle_initialized(request.id),
        "tools/list" => Some(handle_tools_list(request.id)),
        "tools/call" => Some(handle_tools_call(ctx, request.id, &request.params)),
        "ping" | "shutdown" => Some(JsonRpcResponse::success(request.id, serde_json::json!({}))),
        "resources/list" => Some(JsonRpcResponse::success(
            request.id,
            serde_json::json!({"resources": []}),
        )),
        _ => {
            // Notifications (no id) MUST NOT receive a response
            request.id.map(|id| {
                JsonRpcResponse::error(
                    Some(id),
                    METHOD_NOT_FOUND,
                    format!("Method not found: {}", request.method),
                    None,
                )
            })
        }
    }
}

fn handle_initialize(id: Option<Value>) -> JsonRpcResponse {
    let result = InitializeResult {
        protocol_version: PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities {
            tools: ToolsCapability {
                list_changed: false,
            },
        },
        server_info: ServerInfo {
            name: SERVER_NAME.to_string(),
            version: SERVER_VERSION.to_string(),
        },
    };
    JsonRpcResponse::success_with(id, &result)
}

fn handle_initialized(id: Option<Value>) -> Option<JsonRpcResponse> {
    // Respond only when an id is present (unusual but permitted)
    id.map(|id| JsonRpcResponse::success(Some(id), serde_json::json!({})))
}

fn handle_tools_list(id: Option<Value>) -> JsonRpcResponse {
    let result = ToolsListResult {
        tools: define_tools(),
    };
    JsonRpcResponse::success_with(id, &result)
}

fn handle_tools_call(ctx: &AppContext, id: Option<Value>, params: &Value) -> JsonRpcResponse {
    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return JsonRpcResponse::error(
            id,
            INVALID_PARAMS,
            "Missing required parameter: name".to_string(),
            None,
        );
    };

    let arguments = params
        .get("arguments")
        .cloned()
        .unwrap_or_else(|| serde_json::json!({}));

    debug!(tool = name, "calling tool");

    let result = match name {
        "format_prompt" => handle_tool_format(ctx, &arguments),
        "analyze_prompt" => handle_tool_analyze(ctx, &arguments),
        "validate_prompt" => handle_tool_validate(ctx, &arguments),
        _ => Err(PromptError::ValidationFailed(format!("Unknown tool: {name}"))),
    };

    let tool_result = result.unwrap_or_else(|e| {
        warn!(tool = name, error = %e, "tool call failed");
        ToolResult::error(format!("Error: {e}"))
    });
    JsonRpcResponse::success_with(id, &tool_result)
}

// ============================================================================
// Tool Handlers
// ============================================================================

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| PromptError::ValidationFailed(format!("Missing required parameter: {key}")))
}

fn optional_str<'a>(args: &'a Value, key: &str) -> Result<Option<&'a str>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(PromptError::ValidationFailed(format!(
            "Parameter {key} must be a string"
        ))),
    }
}

fn optional_object<T: serde::de::DeserializeOwned>(args: &Value, key: &str) -> Result<Option<T>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| PromptError::ValidationFailed(format!("Invalid parameter {key}: {e}"))),
    }
}

fn mode(args: &Value) -> Result<Option<DetectionProfile>> {
    optional_str(args, "mode")?.map(str::parse).transpose()
}

/// Configured format defaults with the caller's `options` layered on top.
fn format_options(ctx: &AppContext, args: &Value) -> Result<FormatOptions> {
    let mut options = serde_json::to_value(ctx.format_options())?;
    match (&mut options, args.get("options")) {
        (_, None | Some(Value::Null)) => {}
        (Value::Object(base), Some(Value::Object(patch))) => {
            base.extend(patch.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        _ => {
            return Err(PromptError::ValidationFailed(
                "Parameter options must be an object".to_string(),
            ));
        }
    }
    serde_json::from_value(options)
        .map_err(|e| PromptError::ValidationFailed(format!("Invalid parameter options: {e}")))
}

fn handle_tool_format(ctx: &AppContext, args: &Value) -> Result<ToolResult> {
    let prompt = required_str(args, "prompt")?;
    let target = optional_str(args, "targetFormat")?;
    let custom: Option<CustomTemplate> = optional_object(args, "customTemplate")?;
    let options = format_options(ctx, args)?;

    let result = ctx
        .formatter(mode(args)?)?
        .format(prompt, target, custom.as_ref(), &options)?;
    ToolResult::json(&result)
}

fn handle_tool_analyze(ctx: &AppContext, args: &Value) -> Result<ToolResult> {
    let prompt = required_str(args, "prompt")?;
    let target = optional_str(args, "targetModel")?
        .map(str::parse::<TargetModel>)
        .transpose()?
        .unwrap_or_default();

    let result = ctx.analyzer(mode(args)?)?.analyze(prompt, target);
    ToolResult::json(&result)
}

fn handle_tool_validate(ctx: &AppContext, args: &Value) -> Result<ToolResult> {
    let prompt = required_str(args, "prompt")?;
    let result = ctx.validation_engine().validate(prompt);
    ToolResult::json(&result)
}
