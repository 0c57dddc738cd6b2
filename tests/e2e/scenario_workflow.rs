//! E2E Scenario: reference prompts through the CLI

use super::fixture::E2EFixture;

#[test]
fn test_translator_prompt() {
    let mut fixture = E2EFixture::new("translator");

    fixture.log_step("Analyze the translator prompt");
    let output = fixture.run(&[
        "-q",
        "analyze",
        "You are a translator. Rules: Keep formatting. Task: Translate this text.",
        "--format",
        "json",
    ]);
    fixture.assert_success(&output, "analyze");

    let json = output.json();
    let sections = &json["sections"];
    assert!(sections["introduction"].as_str().unwrap().starts_with("You are a translator"));
    assert!(
        sections["rules"]
            .as_array()
            .unwrap()
            .iter()
            .any(|r| r.as_str().unwrap().contains("Keep formatting"))
    );
    assert!(sections["task"].as_str().unwrap().contains("Translate this text"));
    assert!(json["quality"]["overallScore"].as_f64().unwrap() > 0.4);
}

#[test]
fn test_bare_chinese_instruction() {
    let mut fixture = E2EFixture::new("bare_chinese");

    fixture.log_step("Analyze a marker-free instruction with the standard profile");
    let output = fixture.run(&["-q", "analyze", "翻译这段话", "--profile", "standard", "--format", "json"]);
    fixture.assert_success(&output, "analyze");

    let json = output.json();
    let sections = &json["sections"];
    for key in ["introduction", "context", "outputFormat", "task"] {
        assert!(sections[key].is_null(), "{key} should be absent");
    }
    assert!(sections["rules"].as_array().unwrap().is_empty());
    assert!(sections["examples"].as_array().unwrap().is_empty());
    assert_eq!(json["missingSections"].as_array().unwrap().len(), 6);
    assert!(json["quality"]["overallScore"].as_f64().unwrap() < 0.2);
}

#[test]
fn test_colon_sections_segment() {
    let mut fixture = E2EFixture::new("colon_sections");

    fixture.log_step("List heuristic segments");
    let output = fixture.run_with_stdin(
        &["-q", "detect", "--segments", "--format", "json"],
        "规则: 必须使用中文\n举例: 输入 -> 输出",
    );
    fixture.assert_success(&output, "detect --segments");

    let json = output.json();
    let segments = json["heuristicSegments"].as_array().unwrap();
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0]["suggestedCategory"], "rules");
    assert_eq!(segments[1]["suggestedCategory"], "examples");
    for segment in segments {
        assert!((segment["confidence"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }
}

#[test]
fn test_format_every_template() {
    let mut fixture = E2EFixture::new("format_every_template");
    let prompt = fixture.create_file(
        "prompt.txt",
        "You are a travel agent.\n\nMust suggest budget options.\n\nTask: Plan a weekend in Lisbon.",
    );
    let prompt = prompt.to_string_lossy().into_owned();

    for (template, marker) in [
        ("claude_xml", "<task>"),
        ("claude_xml_advanced", "<introduction>"),
        ("gpt_markdown", "## Task"),
        ("gpt_markdown_numbered", "1. Must suggest budget options."),
        ("json", "\"task\""),
    ] {
        fixture.log_step(&format!("Format with {template}"));
        let output = fixture.run(&["-q", "format", "--raw", "-f", &prompt, "-t", template]);
        fixture.assert_success(&output, template);
        fixture.assert_output_contains(&output, marker);
    }
}
