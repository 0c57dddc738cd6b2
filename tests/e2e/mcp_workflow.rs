//! E2E Scenario: MCP server over stdio
//!
//! Drives `promptfmt mcp serve` with a full session and checks that stdout
//! carries exactly one clean JSON-RPC response per request.

use serde_json::{Value, json};

use super::fixture::E2EFixture;

fn session(requests: &[Value]) -> String {
    let mut input: String = requests.iter().map(|r| format!("{r}\n")).collect();
    input.push_str("{broken json\n");
    input
}

#[test]
fn test_mcp_session() {
    let mut fixture = E2EFixture::new("mcp_session");

    fixture.log_step("Run a full stdio session");
    let input = session(&[
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
        json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": {
                "name": "format_prompt",
                "arguments": {
                    "prompt": "You are a translator. Rules: Keep formatting. Task: Translate this text.",
                    "targetFormat": "claude_xml"
                }
            }
        }),
        json!({
            "jsonrpc": "2.0",
            "id": 4,
            "method": "tools/call",
            "params": {"name": "validate_prompt", "arguments": {"prompt": "hello"}}
        }),
        json!({"jsonrpc": "2.0", "id": 5, "method": "prompts/get"}),
    ]);
    let output = fixture.run_with_stdin(&["mcp", "serve"], &input);
    fixture.assert_success(&output, "mcp serve");

    fixture.log_step("Check responses");
    assert!(!output.stdout.contains('\x1b'), "ANSI codes on stdout");
    let responses = output.json_lines();
    assert_eq!(responses.len(), 6, "{}", output.stdout);

    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[0]["result"]["serverInfo"]["name"], "promptfmt");

    assert_eq!(responses[1]["id"], 2);
    assert_eq!(responses[1]["result"]["tools"].as_array().unwrap().len(), 3);

    assert_eq!(responses[2]["id"], 3);
    let text = responses[2]["result"]["content"][0]["text"].as_str().unwrap();
    let formatted: Value = serde_json::from_str(text).unwrap();
    let prompt = formatted["formattedPrompt"].as_str().unwrap();
    assert!(prompt.starts_with("<introduction>\nYou are a translator."));
    assert!(prompt.contains("<task>"));

    assert_eq!(responses[3]["id"], 4);
    let text = responses[3]["result"]["content"][0]["text"].as_str().unwrap();
    let validation: Value = serde_json::from_str(text).unwrap();
    assert_eq!(validation["isValid"], false);

    assert_eq!(responses[4]["error"]["code"], -32601);
    assert_eq!(responses[5]["error"]["code"], -32700);
}

#[test]
fn test_mcp_tools_listing() {
    let mut fixture = E2EFixture::new("mcp_tools");

    fixture.log_step("List tools as JSON");
    let output = fixture.run(&["mcp", "tools", "--format", "json"]);
    fixture.assert_success(&output, "mcp tools");
    let json = output.json();
    assert_eq!(json["count"], 3);

    fixture.log_step("List tools for humans");
    let output = fixture.run(&["mcp", "tools"]);
    fixture.assert_success(&output, "mcp tools");
    fixture.assert_output_contains(&output, "format_prompt");
    fixture.assert_output_contains(&output, "3 tools available.");
}

#[test]
fn test_mcp_forced_color_stays_plain() {
    let mut fixture = E2EFixture::new("mcp_forced_color");

    fixture.log_step("Call analyze with colors forced on");
    let request = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": {
            "name": "analyze_prompt",
            "arguments": {"prompt": "Task: Write a haiku", "targetModel": "claude"}
        }
    });
    let output = fixture.run_with(
        &["mcp", "serve", "--debug"],
        Some(&format!("{request}\n")),
        &[("FORCE_COLOR", "1"), ("CLICOLOR_FORCE", "1")],
    );
    fixture.assert_success(&output, "mcp serve");

    assert!(!output.stdout.contains('\x1b'));
    let responses = output.json_lines();
    assert_eq!(responses.len(), 1);
    assert!(responses[0]["result"]["isError"].is_null());
    assert!(output.stderr.contains("[promptfmt-mcp]"));
}
