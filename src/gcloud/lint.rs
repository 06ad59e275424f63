//! Canonical command paths from gcloud's own linter.
//!
//! `gcloud meta lint-gcloud-commands` knows every command group, including
//! alpha/beta aliases, and reports the invocation with all flags and
//! positional values removed. The policy engine only ever sees that path.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{GcloudError, GcloudResult, ProcessStage};
use crate::gcloud::executor::{GcloudCli, InvocationResult};
use crate::gcloud::normalizer::NormalizedCommand;

/// Linted subcommand path, e.g. `compute instances list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintResult {
    pub command_path: String,
}

/// Resolves the canonical command path of a normalized command
#[async_trait]
pub trait CommandLinter: Send + Sync {
    async fn lint(&self, command: &NormalizedCommand) -> GcloudResult<LintResult>;
}

/// One element of the linter's JSON array
#[derive(Debug, Deserialize)]
struct LintEntry {
    #[serde(default)]
    command_string_no_args: Option<String>,
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    error_type: Option<String>,
}

/// `gcloud <args>` with each argument shell-quoted, since the linter
/// re-tokenizes the string it is given
pub fn command_string(command: &NormalizedCommand) -> String {
    let quoted: Vec<String> = command
        .args
        .iter()
        .map(|arg| {
            // try_quote only refuses NUL bytes
            shlex::try_quote(arg)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| format!("'{}'", arg.replace('\'', "'\\''")))
        })
        .collect();
    format!("gcloud {}", quoted.join(" "))
}

/// Arguments for the linter subprocess
pub fn lint_arguments(command: &NormalizedCommand) -> Vec<String> {
    vec![
        "meta".to_string(),
        "lint-gcloud-commands".to_string(),
        "--command-string".to_string(),
        command_string(command),
    ]
}

/// Interpret a finished linter process.
///
/// A failed process is never interpreted further; partial output from a
/// crashed linter is not trusted.
pub fn parse_lint_output(output: &InvocationResult) -> GcloudResult<LintResult> {
    if !output.success() {
        let stderr = output.stderr.trim();
        let message = if stderr.is_empty() {
            match output.exit_code {
                Some(code) => format!("linter exited with status {}", code),
                None => "linter was terminated by a signal".to_string(),
            }
        } else {
            stderr.to_string()
        };
        return Err(GcloudError::LintFailed(message));
    }

    let entries: Vec<LintEntry> = serde_json::from_str(output.stdout.trim())
        .map_err(|e| GcloudError::LintFailed(format!("unparseable linter output: {}", e)))?;

    let entry = entries
        .into_iter()
        .next()
        .ok_or_else(|| GcloudError::LintFailed("linter returned no analysis".to_string()))?;

    if !entry.success {
        let message = entry
            .error_message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "command rejected by gcloud linter".to_string());
        let message = match entry.error_type {
            Some(kind) if !kind.is_empty() => format!("{} ({})", message, kind),
            _ => message,
        };
        return Err(GcloudError::InvalidArgument(message));
    }

    let full = entry.command_string_no_args.unwrap_or_default();
    let full = full.trim();
    let command_path = full
        .strip_prefix("gcloud ")
        .or_else(|| full.strip_prefix("gcloud").filter(|rest| rest.is_empty()))
        .unwrap_or(full)
        .trim()
        .to_string();

    if command_path.is_empty() {
        return Err(GcloudError::InvalidArgument(
            "gcloud linter could not resolve a command path".to_string(),
        ));
    }

    Ok(LintResult { command_path })
}

#[async_trait]
impl CommandLinter for GcloudCli {
    async fn lint(&self, command: &NormalizedCommand) -> GcloudResult<LintResult> {
        let output = self
            .invoke(&lint_arguments(command), ProcessStage::Lint, self.lint_timeout())
            .await
            .map_err(|e| match e {
                GcloudError::Spawn(io) => GcloudError::LintFailed(io.to_string()),
                other => other,
            })?;
        parse_lint_output(&output)
    }
}
