use std::fmt;
use std::io;
use std::time::Duration;
use thiserror::Error;

// Import module-level errors for AppError
use crate::config::settings::ConfigError;
use crate::security::policy::PolicyViolation;
use crate::sql::classifier::QueryError;

/// Stable classification of every failure the gate can surface.
///
/// Callers switch on the kind (or its [`code`](ErrorKind::code)) rather than
/// on error text, which is meant for humans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    FailedPrecondition,
    LintFailed,
    PolicyDenied,
    UnsupportedIdentity,
    Unauthenticated,
    NotFound,
    AuthError,
    DeadlineExceeded,
    ExecFailed,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ErrorKind::FailedPrecondition => "FAILED_PRECONDITION",
            ErrorKind::LintFailed => "GCLOUD_LINT_FAILED",
            ErrorKind::PolicyDenied => "GCLOUD_POLICY_DENIED",
            ErrorKind::UnsupportedIdentity => "UNSUPPORTED_IDENTITY",
            ErrorKind::Unauthenticated => "UNAUTHENTICATED",
            ErrorKind::NotFound => "GCLOUD_NOT_FOUND",
            ErrorKind::AuthError => "GCLOUD_AUTH_ERROR",
            ErrorKind::DeadlineExceeded => "DEADLINE_EXCEEDED",
            ErrorKind::ExecFailed => "GCLOUD_EXEC_FAILED",
        }
    }

    /// HTTP status a transport layer should answer with.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::InvalidArgument | ErrorKind::FailedPrecondition => 400,
            ErrorKind::Unauthenticated => 401,
            ErrorKind::PolicyDenied | ErrorKind::UnsupportedIdentity => 403,
            ErrorKind::DeadlineExceeded => 504,
            ErrorKind::LintFailed
            | ErrorKind::NotFound
            | ErrorKind::AuthError
            | ErrorKind::ExecFailed => 500,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Subprocess that was running when a deadline expired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStage {
    Lint,
    AuthLookup,
    Execute,
}

impl fmt::Display for ProcessStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessStage::Lint => "lint",
            ProcessStage::AuthLookup => "auth lookup",
            ProcessStage::Execute => "execution",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while gating and running gcloud commands
#[derive(Debug, Error)]
pub enum GcloudError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("gcloud lint failed: {0}")]
    LintFailed(String),

    #[error("{}", .0.reason)]
    PolicyDenied(PolicyViolation),

    #[error("{0}")]
    UnsupportedIdentity(String),

    #[error("No active gcloud account. Authenticate a service account with `gcloud auth activate-service-account` first.")]
    Unauthenticated,

    #[error("gcloud executable '{binary}' was not found on PATH. Install the Google Cloud SDK or set gcloud.binary in the config file.")]
    NotFound { binary: String },

    #[error("Failed to determine the active gcloud account: {0}")]
    AuthError(String),

    #[error("gcloud {stage} did not finish within {}s", .timeout.as_secs())]
    DeadlineExceeded {
        stage: ProcessStage,
        timeout: Duration,
    },

    #[error("Failed to launch gcloud: {0}")]
    Spawn(#[source] io::Error),
}

impl GcloudError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GcloudError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            GcloudError::LintFailed(_) => ErrorKind::LintFailed,
            GcloudError::PolicyDenied(_) => ErrorKind::PolicyDenied,
            GcloudError::UnsupportedIdentity(_) => ErrorKind::UnsupportedIdentity,
            GcloudError::Unauthenticated => ErrorKind::Unauthenticated,
            GcloudError::NotFound { .. } => ErrorKind::NotFound,
            GcloudError::AuthError(_) => ErrorKind::AuthError,
            GcloudError::DeadlineExceeded { .. } => ErrorKind::DeadlineExceeded,
            GcloudError::Spawn(_) => ErrorKind::ExecFailed,
        }
    }
}

/// Top-level application error that wraps all module-specific errors
///
/// All module errors convert into AppError via `From`, so the binary can use
/// `?` across the SQL gate, the command gate and configuration loading.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Query rejected: {0}")]
    Query(#[from] QueryError),

    #[error("gcloud error: {0}")]
    Gcloud(#[from] GcloudError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl AppError {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            AppError::Query(e) => Some(e.kind()),
            AppError::Gcloud(e) => Some(e.kind()),
            AppError::Config(_) | AppError::Io(_) => None,
        }
    }
}

/// Result type for command gate operations
pub type GcloudResult<T> = std::result::Result<T, GcloudError>;

/// Result type for application-level operations
pub type AppResult<T> = std::result::Result<T, AppError>;
