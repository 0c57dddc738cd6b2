//! Rendered output of the built-in templates for a fixed set of sections.

use std::collections::BTreeMap;

use promptfmt::analyzer::{DetectedSections, Example};
use promptfmt::templates::{CustomTemplate, RenderOptions, TemplateEngine, render_with};

fn editor_sections() -> DetectedSections {
    DetectedSections {
        introduction: Some("You are a meticulous technical editor.".into()),
        rules: vec!["Keep the author's voice".into(), "Never invent facts".into()],
        examples: vec![Example {
            content: "Input: teh cat\nOutput: the cat".into(),
            input: Some("teh cat".into()),
            output: Some("the cat".into()),
        }],
        output_format: Some("Return the corrected text only.".into()),
        task: Some("Edit the following paragraph.".into()),
        ..DetectedSections::default()
    }
}

fn render(name: &str) -> String {
    TemplateEngine::new()
        .render(name, &editor_sections(), &RenderOptions::default())
        .unwrap()
}

#[test]
fn test_claude_xml() {
    insta::assert_snapshot!(render("claude_xml").trim_end(), @r"
    <introduction>
    You are a meticulous technical editor.
    </introduction>
    <rules>
      <rule>Keep the author's voice</rule>
      <rule>Never invent facts</rule>
    </rules>
    <examples>
      <example>
    Input: teh cat
    Output: the cat
      </example>
    </examples>
    <output_format>
    Return the corrected text only.
    </output_format>
    <task>
    Edit the following paragraph.
    </task>
    ");
}

#[test]
fn test_claude_xml_advanced() {
    insta::assert_snapshot!(render("claude_xml_advanced").trim_end(), @r"
    <introduction>
    You are a meticulous technical editor.
    </introduction>
    <rules>
      <rule>Keep the author's voice</rule>
      <rule>Never invent facts</rule>
    </rules>
    <examples>
      <example>
        <description>Input: teh cat
    Output: the cat</description>
        <input>teh cat</input>
        <output>the cat</output>
      </example>
    </examples>
    <output_format>
    Return the corrected text only.
    </output_format>
    <task>
    Edit the following paragraph.
    </task>
    ");
}

#[test]
fn test_gpt_markdown_numbered() {
    insta::assert_snapshot!(render("gpt_markdown_numbered").trim_end(), @r"
    # Role

    You are a meticulous technical editor.

    ## Rules

    1. Keep the author's voice
    2. Never invent facts

    ## Examples

    **Example 1:**

    Input: teh cat
    Output: the cat


    ## Output Format

    Return the corrected text only.

    ## Task

    Edit the following paragraph.
    ");
}

#[test]
fn test_json() {
    insta::assert_snapshot!(render("json"), @r#"
    {
      "prompt": {
        "introduction": "You are a meticulous technical editor.",
        "rules": [
          "Keep the author's voice",
          "Never invent facts"
        ],
        "examples": [
          {
            "content": "Input: teh cat\nOutput: the cat",
            "input": "teh cat",
            "output": "the cat"
          }
        ],
        "output_format": "Return the corrected text only.",
        "task": "Edit the following paragraph."
      }
    }
    "#);
}

#[test]
fn test_custom_template_with_variables() {
    let custom = CustomTemplate {
        introduction: Some("[{{team}}] {{content}}\n".into()),
        rules_section: Some("Rules:\n{{rules}}".into()),
        rule_item: Some("  {{index}}) {{content}}\n".into()),
        task_section: Some(">> {{content}}\n".into()),
        ..CustomTemplate::default()
    };
    let template = custom.to_template("user_custom").unwrap();
    let options = RenderOptions {
        custom_variables: BTreeMap::from([("team".to_string(), "docs".to_string())]),
        ..RenderOptions::default()
    };
    let sections = DetectedSections {
        examples: Vec::new(),
        output_format: None,
        ..editor_sections()
    };
    let rendered = render_with(&template, &sections, &options).unwrap();
    insta::assert_snapshot!(rendered.trim_end(), @r"
    [docs] You are a meticulous technical editor.
    Rules:
      1) Keep the author's voice
      2) Never invent facts
    >> Edit the following paragraph.
    ");
}
