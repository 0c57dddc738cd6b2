//! Isolated workspace for driving the `promptfmt` binary.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde_json::Value;
use tempfile::TempDir;

pub struct CommandOutput {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|e| panic!("stdout is not JSON ({e}):\n{}", self.stdout))
    }

    /// One JSON document per non-blank stdout line.
    pub fn json_lines(&self) -> Vec<Value> {
        self.stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line)
                    .unwrap_or_else(|e| panic!("line is not JSON ({e}): {line}"))
            })
            .collect()
    }
}

pub struct E2EFixture {
    pub scenario: String,
    temp_dir: TempDir,
    step: usize,
}

impl E2EFixture {
    pub fn new(scenario: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        println!("[E2E] Scenario: {scenario} ({})", temp_dir.path().display());
        Self {
            scenario: scenario.to_string(),
            temp_dir,
            step: 0,
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn log_step(&mut self, description: &str) {
        self.step += 1;
        println!("[E2E] [{}] Step {}: {description}", self.scenario, self.step);
    }

    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let path = self.root().join(relative_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    pub fn run(&self, args: &[&str]) -> CommandOutput {
        self.run_with(args, None, &[])
    }

    pub fn run_with_stdin(&self, args: &[&str], stdin: &str) -> CommandOutput {
        self.run_with(args, Some(stdin), &[])
    }

    pub fn run_with_env(&self, args: &[&str], env: &[(&str, &str)]) -> CommandOutput {
        self.run_with(args, None, env)
    }

    pub fn run_with(&self, args: &[&str], stdin: Option<&str>, env: &[(&str, &str)]) -> CommandOutput {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_promptfmt"));
        cmd.args(args)
            .current_dir(self.root())
            .env("HOME", self.root())
            .env("XDG_CONFIG_HOME", self.root().join(".config"))
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .env_remove("PROMPTFMT_CONFIG")
            .env_remove("PROMPTFMT_DETECTION_PROFILE")
            .env_remove("PROMPTFMT_HEURISTIC_FALLBACK")
            .env_remove("PROMPTFMT_QUALITY_GATE")
            .env_remove("PROMPTFMT_DEFAULT_TEMPLATE")
            .env_remove("PROMPTFMT_VALIDATION_THRESHOLD")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in env {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().expect("Failed to spawn promptfmt");
        {
            let mut pipe = child.stdin.take().expect("stdin pipe");
            if let Some(input) = stdin {
                pipe.write_all(input.as_bytes()).expect("Failed to write stdin");
            }
        }
        let output = child.wait_with_output().expect("Failed to wait for promptfmt");

        CommandOutput {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    pub fn assert_success(&self, output: &CommandOutput, label: &str) {
        assert!(
            output.success,
            "[{}] {label} failed with exit code {}\nstdout:\n{}\nstderr:\n{}",
            self.scenario, output.exit_code, output.stdout, output.stderr
        );
    }

    pub fn assert_output_contains(&self, output: &CommandOutput, needle: &str) {
        assert!(
            output.stdout.contains(needle),
            "[{}] stdout missing {needle:?}:\n{}",
            self.scenario,
            output.stdout
        );
    }
}
