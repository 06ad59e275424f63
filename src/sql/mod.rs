pub mod classifier;
pub mod sanitizer;

pub use classifier::{DESTRUCTIVE_PATTERNS, DestructivePattern, QueryError, assert_read_only};
pub use sanitizer::sanitize;

/// Keywords a query may start with
///
/// Anything else is rejected before the destructive-pattern scan runs.
pub const READ_ONLY_PREFIXES: &[&str] = &["SELECT", "WITH", "EXPLAIN", "SHOW", "DESCRIBE"];
