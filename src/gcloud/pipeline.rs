//! Lint-then-execute pipeline for read-only gcloud commands.
//!
//! ```text
//! Received -> Normalized -> IdentityVerified -> Linted -> PolicyApproved -> Executed -> Formatted
//!     \____________\______________\________________\___________\
//!                                                               -> Rejected
//! ```
//!
//! The order is fixed and every failure is terminal: a stage that fails
//! keeps all later stages from running.

use std::fmt;
use std::sync::Arc;

use crate::audit::AuditLogger;
use crate::error::GcloudError;
use crate::gcloud::executor::{CommandRunner, GcloudCli, InvocationResult};
use crate::gcloud::identity::{AccountSource, Identity, require_service_account_identity};
use crate::gcloud::lint::CommandLinter;
use crate::gcloud::normalizer::{NormalizedCommand, normalize};
use crate::security::check_policy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    Normalized,
    IdentityVerified,
    Linted,
    PolicyApproved,
    Executed,
    Formatted,
}

/// Step that produced a rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStep {
    Normalize,
    VerifyIdentity,
    Lint,
    EnforcePolicy,
    Execute,
}

impl fmt::Display for GateStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GateStep::Normalize => "normalize",
            GateStep::VerifyIdentity => "verify-identity",
            GateStep::Lint => "lint",
            GateStep::EnforcePolicy => "enforce-policy",
            GateStep::Execute => "execute",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct Rejection {
    pub step: GateStep,
    pub error: GcloudError,
}

impl Rejection {
    fn at(step: GateStep) -> impl FnOnce(GcloudError) -> Rejection {
        move |error| Rejection { step, error }
    }

    /// `KIND: reason`, with the violation code for policy denials
    pub fn message(&self) -> String {
        match &self.error {
            GcloudError::PolicyDenied(violation) => format!(
                "{} [{}]: {}",
                self.error.kind().code(),
                violation.code,
                violation.reason
            ),
            other => format!("{}: {}", other.kind().code(), other),
        }
    }
}

/// An approved command and what running it produced
#[derive(Debug, Clone)]
pub struct Execution {
    pub command: NormalizedCommand,
    pub identity: Identity,
    pub command_path: String,
    pub result: InvocationResult,
}

/// What the tool layer sends back to its caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResponse {
    pub content: String,
    pub is_error: bool,
}

impl ToolResponse {
    fn from_execution(execution: &Execution) -> Self {
        let result = &execution.result;
        let exit = match result.exit_code {
            Some(code) => code.to_string(),
            None => "terminated by signal".to_string(),
        };

        let mut content = format!("Command: {}\nExit code: {}\n", execution.command.display, exit);
        if !result.stdout.is_empty() {
            content.push_str("\nSTDOUT:\n");
            content.push_str(&result.stdout);
        }
        if !result.stderr.is_empty() {
            content.push_str("\nSTDERR:\n");
            content.push_str(&result.stderr);
        }
        if result.stdout.is_empty() && result.stderr.is_empty() {
            content.push_str("\n(no output)\n");
        }

        Self {
            content,
            is_error: !result.success(),
        }
    }

    fn from_rejection(rejection: &Rejection) -> Self {
        Self {
            content: rejection.message(),
            is_error: true,
        }
    }
}

/// Arguments left after removing the linted path tokens, joined by spaces.
///
/// Path tokens are consumed in order and only from non-flag arguments, so a
/// flag value that happens to equal a path token is still scanned.
pub fn remaining_arguments(args: &[String], command_path: &str) -> String {
    let path: Vec<&str> = command_path.split_whitespace().collect();
    let mut next = 0;
    let mut rest = Vec::new();

    for arg in args {
        if next < path.len() && !arg.starts_with('-') && arg.eq_ignore_ascii_case(path[next]) {
            next += 1;
            continue;
        }
        rest.push(arg.as_str());
    }

    rest.join(" ")
}

/// Gate in front of the gcloud binary
pub struct ReadOnlyGateway {
    linter: Arc<dyn CommandLinter>,
    accounts: Arc<dyn AccountSource>,
    runner: Arc<dyn CommandRunner>,
    audit: Option<AuditLogger>,
}

impl ReadOnlyGateway {
    pub fn new(
        linter: Arc<dyn CommandLinter>,
        accounts: Arc<dyn AccountSource>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            linter,
            accounts,
            runner,
            audit: None,
        }
    }

    /// Lint, identity lookup and execution all through one gcloud binary
    pub fn with_gcloud(cli: GcloudCli) -> Self {
        let cli = Arc::new(cli);
        Self::new(cli.clone(), cli.clone(), cli)
    }

    pub fn with_audit_logger(mut self, logger: AuditLogger) -> Self {
        self.audit = Some(logger);
        self
    }

    /// Run every gate stage and, if all pass, the command itself.
    pub async fn execute(&self, tokens: &[String]) -> Result<Execution, Rejection> {
        tracing::debug!(stage = ?PipelineStage::Received, tokens = tokens.len());

        let command = normalize(tokens).map_err(Rejection::at(GateStep::Normalize))?;
        tracing::debug!(stage = ?PipelineStage::Normalized, command = %command.display);

        let identity = require_service_account_identity(&command.args, self.accounts.as_ref())
            .await
            .map_err(Rejection::at(GateStep::VerifyIdentity))?;
        tracing::debug!(stage = ?PipelineStage::IdentityVerified, identity = %identity.email);

        let lint = self
            .linter
            .lint(&command)
            .await
            .map_err(Rejection::at(GateStep::Lint))?;
        tracing::debug!(stage = ?PipelineStage::Linted, path = %lint.command_path);

        let raw_args = remaining_arguments(&command.args, &lint.command_path);
        if let Some(violation) = check_policy(&lint.command_path, &raw_args) {
            return Err(Rejection {
                step: GateStep::EnforcePolicy,
                error: GcloudError::PolicyDenied(violation),
            });
        }
        tracing::debug!(stage = ?PipelineStage::PolicyApproved, path = %lint.command_path);

        let result = self
            .runner
            .run(&command.args)
            .await
            .map_err(Rejection::at(GateStep::Execute))?;
        tracing::debug!(stage = ?PipelineStage::Executed, exit_code = ?result.exit_code);

        Ok(Execution {
            command,
            identity,
            command_path: lint.command_path,
            result,
        })
    }

    /// Entry point for the tool layer: never fails, always formats.
    ///
    /// A non-zero exit of an approved command is reported with
    /// `is_error = true` but is not a rejection.
    pub async fn run_read_only_command(&self, tokens: &[String]) -> ToolResponse {
        let response = match self.execute(tokens).await {
            Ok(execution) => {
                tracing::info!(
                    command = %execution.command.display,
                    identity = %execution.identity.email,
                    exit_code = ?execution.result.exit_code,
                    "executed read-only gcloud command"
                );
                self.audit_execution(&execution);
                ToolResponse::from_execution(&execution)
            }
            Err(rejection) => {
                tracing::warn!(
                    step = %rejection.step,
                    kind = rejection.error.kind().code(),
                    reason = %rejection.error,
                    "rejected gcloud command"
                );
                self.audit_rejection(tokens, &rejection);
                ToolResponse::from_rejection(&rejection)
            }
        };
        tracing::debug!(stage = ?PipelineStage::Formatted, is_error = response.is_error);
        response
    }

    fn audit_execution(&self, execution: &Execution) {
        if let Some(audit) = &self.audit {
            if let Err(e) = audit.log_command(
                &execution.command.display,
                &execution.identity.email,
                execution.result.exit_code,
            ) {
                tracing::warn!(error = %e, "failed to write audit log");
            }
        }
    }

    fn audit_rejection(&self, tokens: &[String], rejection: &Rejection) {
        if let Some(audit) = &self.audit {
            let command = tokens.join(" ");
            if let Err(e) = audit.log_rejection(
                &command,
                &rejection.step.to_string(),
                &rejection.message(),
            ) {
                tracing::warn!(error = %e, "failed to write audit log");
            }
        }
    }
}
