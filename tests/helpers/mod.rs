#![allow(dead_code)]

use async_trait::async_trait;
use gcp_readonly::gcloud::{
    AccountSource, CommandLinter, CommandRunner, InvocationResult, LintResult, NormalizedCommand,
    ReadOnlyGateway,
};
use gcp_readonly::{GcloudError, GcloudResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const CI_ACCOUNT: &str = "ci@proj.iam.gserviceaccount.com";

/// What the fake linter answers with
#[derive(Debug, Clone)]
pub enum LintBehavior {
    /// Resolve to this path
    Path(String),
    /// Strip flags the way gcloud does: keep leading non-flag tokens
    LeadingWords,
    /// The linter process itself failed
    Broken(String),
    /// gcloud considers the command malformed
    Malformed(String),
}

pub struct FakeLinter {
    behavior: LintBehavior,
    calls: AtomicUsize,
}

impl FakeLinter {
    pub fn new(behavior: LintBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommandLinter for FakeLinter {
    async fn lint(&self, command: &NormalizedCommand) -> GcloudResult<LintResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            LintBehavior::Path(path) => Ok(LintResult {
                command_path: path.clone(),
            }),
            LintBehavior::LeadingWords => Ok(LintResult {
                command_path: command
                    .args
                    .iter()
                    .take_while(|a| !a.starts_with('-'))
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(" "),
            }),
            LintBehavior::Broken(message) => Err(GcloudError::LintFailed(message.clone())),
            LintBehavior::Malformed(message) => Err(GcloudError::InvalidArgument(message.clone())),
        }
    }
}

pub struct FakeAccounts {
    account: Option<String>,
    calls: AtomicUsize,
}

impl FakeAccounts {
    pub fn active(account: &str) -> Self {
        Self {
            account: Some(account.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn none() -> Self {
        Self {
            account: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountSource for FakeAccounts {
    async fn active_account(&self) -> GcloudResult<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.account.clone())
    }
}

/// Records every command it is asked to run
pub struct RecordingRunner {
    result: InvocationResult,
    runs: Mutex<Vec<Vec<String>>>,
}

impl RecordingRunner {
    pub fn succeeding(stdout: &str) -> Self {
        Self::with_result(InvocationResult {
            exit_code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        })
    }

    pub fn with_result(result: InvocationResult) -> Self {
        Self {
            result,
            runs: Mutex::new(Vec::new()),
        }
    }

    pub fn runs(&self) -> Vec<Vec<String>> {
        self.runs.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, args: &[String]) -> GcloudResult<InvocationResult> {
        self.runs.lock().unwrap().push(args.to_vec());
        Ok(self.result.clone())
    }
}

/// Gateway wired to fakes, plus handles to inspect them afterwards
pub struct Harness {
    pub gateway: ReadOnlyGateway,
    pub linter: Arc<FakeLinter>,
    pub accounts: Arc<FakeAccounts>,
    pub runner: Arc<RecordingRunner>,
}

pub fn harness(lint: LintBehavior, accounts: FakeAccounts, runner: RecordingRunner) -> Harness {
    let linter = Arc::new(FakeLinter::new(lint));
    let accounts = Arc::new(accounts);
    let runner = Arc::new(runner);
    let gateway = ReadOnlyGateway::new(linter.clone(), accounts.clone(), runner.clone());
    Harness {
        gateway,
        linter,
        accounts,
        runner,
    }
}

/// Default harness: CI service account, leading-words linter, runner prints "ok"
pub fn default_harness() -> Harness {
    harness(
        LintBehavior::LeadingWords,
        FakeAccounts::active(CI_ACCOUNT),
        RecordingRunner::succeeding("ok\n"),
    )
}

pub fn tokens(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
