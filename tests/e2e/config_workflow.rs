//! E2E Scenario: configuration layering
//!
//! Global file, project file, explicit `--config` and environment overrides,
//! in that order.

use super::fixture::E2EFixture;

const PROMPT: &str = "You are a chef.\nMust use metric units.\nTask: Write a soup recipe.";

#[test]
fn test_config_layers() {
    let mut fixture = E2EFixture::new("config_layers");

    fixture.log_step("Global config picks gpt_markdown");
    fixture.create_file(
        ".config/promptfmt/config.toml",
        "[format]\ndefault_template = \"gpt_markdown\"\n",
    );
    let output = fixture.run(&["-q", "format", "--raw", PROMPT]);
    fixture.assert_success(&output, "format (global)");
    assert!(output.stdout.starts_with("# Role"), "{}", output.stdout);

    fixture.log_step("Project config overrides the global file");
    fixture.create_file(".promptfmt.toml", "[format]\ndefault_template = \"json\"\n");
    let output = fixture.run(&["-q", "format", "--raw", PROMPT]);
    fixture.assert_success(&output, "format (project)");
    assert_eq!(output.json()["prompt"]["task"], "Task: Write a soup recipe.");

    fixture.log_step("Explicit config overrides the project file");
    let explicit = fixture.create_file(
        "team.toml",
        "[format]\ndefault_template = \"claude_xml\"\n",
    );
    let explicit = explicit.to_string_lossy().into_owned();
    let output = fixture.run(&["-q", "--config", &explicit, "format", "--raw", PROMPT]);
    fixture.assert_success(&output, "format (explicit)");
    assert!(output.stdout.starts_with("<introduction>"));

    fixture.log_step("Environment overrides every file");
    let output = fixture.run_with_env(
        &["-q", "--config", &explicit, "format", "--raw", PROMPT],
        &[("PROMPTFMT_DEFAULT_TEMPLATE", "gpt_markdown_numbered")],
    );
    fixture.assert_success(&output, "format (env)");
    fixture.assert_output_contains(&output, "1. Must use metric units.");
}

#[test]
fn test_validation_settings_from_project() {
    let mut fixture = E2EFixture::new("validation_settings");

    fixture.log_step("Lower the pass threshold and drop a rule");
    fixture.create_file(
        ".promptfmt.toml",
        "[validation]\npass_threshold = 0.1\ndisabled_rules = [\"example-markers\"]\n",
    );
    let output = fixture.run(&["-q", "validate", PROMPT, "--format", "json"]);
    fixture.assert_success(&output, "validate");

    let json = output.json();
    assert_eq!(json["isValid"], true);
    assert_eq!(json["checks"].as_array().unwrap().len(), 5);
}

#[test]
fn test_invalid_config_is_reported() {
    let mut fixture = E2EFixture::new("invalid_config");

    fixture.log_step("Threshold out of range");
    fixture.create_file(".promptfmt.toml", "[validation]\npass_threshold = 3.0\n");
    let output = fixture.run(&["templates"]);
    assert!(!output.success);
    assert!(output.stderr.contains("pass_threshold"), "{}", output.stderr);

    fixture.log_step("Robot mode reports the error as JSON");
    let output = fixture.run(&["--robot", "templates"]);
    assert!(!output.success);
    assert_eq!(output.json()["status"]["error"]["code"], "config");
}
