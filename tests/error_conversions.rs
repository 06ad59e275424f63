use gcp_readonly::config::ConfigError;
use gcp_readonly::error::{AppError, AppResult, ErrorKind, GcloudError, ProcessStage};
use gcp_readonly::security::{PolicyViolation, ViolationCode};
use gcp_readonly::sql::QueryError;
use std::error::Error;
use std::time::Duration;

/// Test that QueryError converts to AppError::Query
#[test]
fn test_query_error_converts_to_app_error() {
    let app_err: AppError = QueryError::MultipleStatements.into();
    assert!(matches!(app_err, AppError::Query(_)));
    assert_eq!(app_err.kind(), Some(ErrorKind::FailedPrecondition));
}

/// Test that GcloudError converts to AppError::Gcloud
#[test]
fn test_gcloud_error_converts_to_app_error() {
    let app_err: AppError = GcloudError::Unauthenticated.into();
    assert!(matches!(app_err, AppError::Gcloud(_)));
    assert_eq!(app_err.kind(), Some(ErrorKind::Unauthenticated));
}

/// Test that ConfigError converts to AppError::Config
#[test]
fn test_config_error_converts_to_app_error() {
    let app_err: AppError = ConfigError::DirectoryNotFound.into();
    assert!(matches!(app_err, AppError::Config(_)));
    assert_eq!(app_err.kind(), None);
}

/// Test that std::io::Error converts to AppError::Io
#[test]
fn test_io_error_converts_to_app_error() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
    let app_err: AppError = io_err.into();
    assert!(matches!(app_err, AppError::Io(_)));
}

/// Test that ? operator works with AppResult
#[test]
fn test_question_mark_operator_with_app_result() {
    fn gate_sql(sql: &str) -> AppResult<()> {
        gcp_readonly::assert_read_only(sql)?;
        Ok(())
    }

    fn gate_command() -> AppResult<()> {
        gcp_readonly::gcloud::normalize(&["gcloud"])?;
        Ok(())
    }

    assert!(gate_sql("SELECT 1").is_ok());
    assert!(matches!(gate_sql("DROP TABLE t"), Err(AppError::Query(_))));
    assert!(matches!(gate_command(), Err(AppError::Gcloud(_))));
}

/// Test that error messages are preserved through conversion
#[test]
fn test_error_messages_preserved() {
    let app_err: AppError = QueryError::DisallowedStatement {
        keyword: "DROP".to_string(),
    }
    .into();
    let msg = app_err.to_string();
    assert!(msg.contains("Query rejected"));
    assert!(msg.contains("DROP"));
}

/// Test policy denial carries the violation reason
#[test]
fn test_policy_denied_message_is_reason() {
    let err = GcloudError::PolicyDenied(PolicyViolation {
        code: ViolationCode::UnsafeOperation,
        reason: "Arguments contain the mutating operation keyword 'delete'".to_string(),
    });
    assert_eq!(
        err.to_string(),
        "Arguments contain the mutating operation keyword 'delete'"
    );
    assert_eq!(err.kind().code(), "GCLOUD_POLICY_DENIED");
    assert_eq!(err.kind().http_status(), 403);
}

/// Test that spawn errors keep their source
#[test]
fn test_spawn_error_has_source() {
    let err = GcloudError::Spawn(std::io::Error::new(
        std::io::ErrorKind::PermissionDenied,
        "permission denied",
    ));
    assert!(err.source().is_some());
}

/// Test that every gcloud error maps to the documented code
#[test]
fn test_gcloud_error_codes() {
    let cases = vec![
        (GcloudError::InvalidArgument("x".into()), "INVALID_ARGUMENT"),
        (GcloudError::LintFailed("x".into()), "GCLOUD_LINT_FAILED"),
        (GcloudError::UnsupportedIdentity("x".into()), "UNSUPPORTED_IDENTITY"),
        (GcloudError::Unauthenticated, "UNAUTHENTICATED"),
        (
            GcloudError::NotFound {
                binary: "gcloud".into(),
            },
            "GCLOUD_NOT_FOUND",
        ),
        (GcloudError::AuthError("x".into()), "GCLOUD_AUTH_ERROR"),
        (
            GcloudError::DeadlineExceeded {
                stage: ProcessStage::Execute,
                timeout: Duration::from_secs(1),
            },
            "DEADLINE_EXCEEDED",
        ),
    ];

    for (err, code) in cases {
        assert_eq!(err.kind().code(), code, "error: {:?}", err);
    }
}

/// Test that query errors map to the documented kinds
#[test]
fn test_query_error_kinds() {
    assert_eq!(QueryError::Empty.kind(), ErrorKind::InvalidArgument);
    assert_eq!(QueryError::OnlyComments.kind(), ErrorKind::InvalidArgument);
    assert_eq!(QueryError::MultipleStatements.kind(), ErrorKind::FailedPrecondition);
    assert_eq!(
        QueryError::DestructiveStatement {
            pattern: "drop",
            description: "DROP statements are not allowed in read-only mode",
        }
        .kind(),
        ErrorKind::FailedPrecondition
    );
}
