pub mod audit;
pub mod config;
pub mod error;
pub mod gcloud;
pub mod security;
pub mod sql;

// Re-export commonly used types for convenience
pub use error::{AppError, AppResult, ErrorKind, GcloudError, GcloudResult};
pub use gcloud::{ReadOnlyGateway, ToolResponse};
pub use security::{PolicyViolation, ViolationCode, check_policy};
pub use sql::{QueryError, assert_read_only};
