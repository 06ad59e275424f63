use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;

use crate::config::GcloudConfig;
use crate::error::{GcloudError, GcloudResult, ProcessStage};

pub const DEFAULT_LINT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_EXECUTION_TIMEOUT: Duration = Duration::from_secs(120);

/// Result of running one gcloud process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    /// `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl InvocationResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs an already-approved gcloud command
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// `args` excludes the binary name
    async fn run(&self, args: &[String]) -> GcloudResult<InvocationResult>;
}

/// Spawns the gcloud binary with bounded waits
#[derive(Debug, Clone)]
pub struct GcloudCli {
    binary: PathBuf,
    lint_timeout: Duration,
    execution_timeout: Duration,
}

impl GcloudCli {
    pub fn new<P: AsRef<Path>>(binary: P) -> Self {
        Self {
            binary: binary.as_ref().to_path_buf(),
            lint_timeout: DEFAULT_LINT_TIMEOUT,
            execution_timeout: DEFAULT_EXECUTION_TIMEOUT,
        }
    }

    pub fn from_config(config: &GcloudConfig) -> Self {
        Self::new(&config.binary).with_timeouts(
            Duration::from_secs(config.lint_timeout_seconds),
            Duration::from_secs(config.execution_timeout_seconds),
        )
    }

    /// The lint timeout also bounds the auth lookup
    pub fn with_timeouts(mut self, lint_timeout: Duration, execution_timeout: Duration) -> Self {
        self.lint_timeout = lint_timeout;
        self.execution_timeout = execution_timeout;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn lint_timeout(&self) -> Duration {
        self.lint_timeout
    }

    /// Run the binary with `args` and wait at most `timeout`.
    ///
    /// The child is killed if the deadline expires. No shell is involved, so
    /// arguments reach gcloud exactly as given.
    pub async fn invoke(
        &self,
        args: &[String],
        stage: ProcessStage,
        timeout: Duration,
    ) -> GcloudResult<InvocationResult> {
        let child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(process_output(output)),
            Ok(Err(e)) => Err(GcloudError::Spawn(e)),
            Err(_) => {
                tracing::warn!(%stage, timeout_secs = timeout.as_secs(), "gcloud process timed out");
                Err(GcloudError::DeadlineExceeded { stage, timeout })
            }
        }
    }

    fn spawn_error(&self, error: io::Error) -> GcloudError {
        if error.kind() == io::ErrorKind::NotFound {
            GcloudError::NotFound {
                binary: self.binary.display().to_string(),
            }
        } else {
            GcloudError::Spawn(error)
        }
    }
}

impl Default for GcloudCli {
    fn default() -> Self {
        Self::new("gcloud")
    }
}

#[async_trait]
impl CommandRunner for GcloudCli {
    async fn run(&self, args: &[String]) -> GcloudResult<InvocationResult> {
        self.invoke(args, ProcessStage::Execute, self.execution_timeout)
            .await
    }
}

/// Convert process output into an InvocationResult
fn process_output(output: Output) -> InvocationResult {
    InvocationResult {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}

/// Shell script standing in for the gcloud binary
#[cfg(all(test, unix))]
pub(crate) fn fake_gcloud(dir: &Path, name: &str, body: &str, executable: bool) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mode = if executable { 0o755 } else { 0o644 };
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).unwrap();
    path
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_captures_stdout_and_exit_code() {
        let cli = GcloudCli::new("sh");
        let result = cli.run(&args(&["-c", "echo hello"])).await.unwrap();

        assert!(result.success());
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.stdout, "hello\n");
        assert!(result.stderr.is_empty());
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_not_an_error() {
        let cli = GcloudCli::new("sh");
        let result = cli
            .run(&args(&["-c", "echo boom >&2; exit 3"]))
            .await
            .unwrap();

        assert!(!result.success());
        assert_eq!(result.exit_code, Some(3));
        assert_eq!(result.stderr, "boom\n");
    }

    #[tokio::test]
    async fn test_killed_by_signal_has_no_exit_code() {
        let cli = GcloudCli::new("sh");
        let result = cli.run(&args(&["-c", "kill -9 $$"])).await.unwrap();
        assert_eq!(result.exit_code, None);
    }

    #[tokio::test]
    async fn test_missing_binary_is_not_found() {
        let cli = GcloudCli::new("gcloud-binary-that-does-not-exist");
        let err = cli.run(&args(&["projects", "list"])).await.unwrap_err();
        assert!(matches!(err, GcloudError::NotFound { .. }));
        assert!(err.to_string().contains("gcloud-binary-that-does-not-exist"));
    }

    #[tokio::test]
    async fn test_deadline_exceeded() {
        let cli = GcloudCli::new("sleep")
            .with_timeouts(Duration::from_millis(100), Duration::from_millis(100));
        let err = cli.run(&args(&["5"])).await.unwrap_err();
        assert!(matches!(
            err,
            GcloudError::DeadlineExceeded {
                stage: ProcessStage::Execute,
                ..
            }
        ));
    }

    #[test]
    fn test_from_config() {
        let config = GcloudConfig {
            binary: "/opt/google-cloud-sdk/bin/gcloud".to_string(),
            lint_timeout_seconds: 5,
            execution_timeout_seconds: 60,
        };
        let cli = GcloudCli::from_config(&config);
        assert_eq!(cli.binary(), Path::new("/opt/google-cloud-sdk/bin/gcloud"));
        assert_eq!(cli.lint_timeout(), Duration::from_secs(5));
    }
}
