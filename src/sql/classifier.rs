use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::error::ErrorKind;
use crate::sql::READ_ONLY_PREFIXES;
use crate::sql::sanitizer::sanitize;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("SQL query must not be empty")]
    Empty,

    #[error("SQL query contains only comments")]
    OnlyComments,

    #[error("Multiple SQL statements are not allowed; submit a single read-only statement")]
    MultipleStatements,

    #[error("Only read-only statements ({allowed}) are permitted. Detected statement type: {keyword}", allowed = READ_ONLY_PREFIXES.join(", "))]
    DisallowedStatement { keyword: String },

    #[error("{description}")]
    DestructiveStatement {
        pattern: &'static str,
        description: &'static str,
    },
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::Empty | QueryError::OnlyComments => ErrorKind::InvalidArgument,
            QueryError::MultipleStatements
            | QueryError::DisallowedStatement { .. }
            | QueryError::DestructiveStatement { .. } => ErrorKind::FailedPrecondition,
        }
    }
}

/// Lexical signature of a statement that modifies data, schema or
/// permissions. Matched against sanitized SQL only.
pub struct DestructivePattern {
    pub name: &'static str,
    pub regex: Regex,
    pub description: &'static str,
}

macro_rules! destructive {
    ($name:literal, $re:literal, $description:literal) => {
        DestructivePattern {
            name: $name,
            regex: Regex::new(concat!("(?i)", $re))
                .expect(concat!("destructive pattern '", $name, "' should compile")),
            description: $description,
        }
    };
}

pub static DESTRUCTIVE_PATTERNS: LazyLock<Vec<DestructivePattern>> = LazyLock::new(|| {
    vec![
        destructive!(
            "insert",
            r"\binsert\s+(?:into\b|(?:`[^`]*`|[\w.-])+\s*(?:\(|values\b|select\b|with\b))",
            "INSERT statements are not allowed in read-only mode"
        ),
        destructive!(
            "update",
            r"\bupdate\s+(?:`[^`]*`|[\w.-])+(?:\s+(?:as\s+)?\w+)?\s+set\b",
            "UPDATE statements are not allowed in read-only mode"
        ),
        destructive!(
            "delete",
            r"\bdelete\s+from\b|\bdelete\s+(?:`[^`]*`|[\w.-])+(?:\s+(?:as\s+)?\w+)?\s+where\b",
            "DELETE statements are not allowed in read-only mode"
        ),
        destructive!(
            "merge",
            r"\bmerge\s+(?:into\s+)?(?:`[^`]*`|[\w.-])+(?:\s+(?:as\s+)?\w+)?\s+using\b",
            "MERGE statements are not allowed in read-only mode"
        ),
        destructive!(
            "replace",
            r"\breplace\s+into\b",
            "REPLACE INTO statements are not allowed in read-only mode"
        ),
        destructive!(
            "truncate",
            r"\btruncate\s+table\b",
            "TRUNCATE statements are not allowed in read-only mode"
        ),
        destructive!(
            "drop",
            r"\bdrop\s+(?:\w+\s+){0,3}?(?:table|view|schema|database|function|procedure|index|model|policy|policies|reservation|assignment|capacity|snapshot)\b",
            "DROP statements are not allowed in read-only mode"
        ),
        destructive!(
            "alter",
            r"\balter\s+(?:\w+\s+){0,2}?(?:table|view|schema|database|model|project|organization|capacity|reservation|column)\b",
            "ALTER statements are not allowed in read-only mode"
        ),
        destructive!(
            "create",
            r"\bcreate\s+(?:or\s+replace\s+)?(?:\w+\s+){0,3}?(?:table|view|schema|database|function|procedure|index|model|policy|reservation|assignment|capacity|snapshot)\b",
            "CREATE statements are not allowed in read-only mode"
        ),
        destructive!(
            "grant",
            r"\bgrant\s+\S+.*?\s(?:on|to)\b",
            "GRANT statements are not allowed in read-only mode"
        ),
        destructive!(
            "revoke",
            r"\brevoke\s+\S+.*?\s(?:on|from)\b",
            "REVOKE statements are not allowed in read-only mode"
        ),
        destructive!(
            "transaction",
            r"\b(?:begin|start|commit|rollback)\s+transaction\b",
            "Transaction control statements are not allowed in read-only mode"
        ),
        destructive!(
            "export-data",
            r"\bexport\s+data\b",
            "EXPORT DATA statements are not allowed in read-only mode"
        ),
        destructive!(
            "load-data",
            r"\bload\s+data\b",
            "LOAD DATA statements are not allowed in read-only mode"
        ),
        destructive!(
            "execute-immediate",
            r"\bexecute\s+immediate\b",
            "Dynamic SQL (EXECUTE IMMEDIATE) is not allowed in read-only mode"
        ),
        destructive!(
            "call",
            r"\bcall\s+(?:`[^`]*`|[\w.-])+\s*\(",
            "Procedure calls are not allowed in read-only mode"
        ),
    ]
});

/// Reject any SQL text that is not a single read-only statement.
///
/// Checks run cheapest first and stop at the first failure: emptiness,
/// statement count, leading keyword, then the destructive-pattern scan.
pub fn assert_read_only(sql: &str) -> Result<(), QueryError> {
    if sql.trim().is_empty() {
        return Err(QueryError::Empty);
    }

    let sanitized = sanitize(sql);
    if sanitized.is_empty() {
        return Err(QueryError::OnlyComments);
    }

    if has_trailing_statement(&sanitized) {
        return Err(QueryError::MultipleStatements);
    }

    let keyword = leading_keyword(&sanitized).unwrap_or_default();
    if !READ_ONLY_PREFIXES.contains(&keyword.as_str()) {
        return Err(QueryError::DisallowedStatement { keyword });
    }

    if let Some(pattern) = DESTRUCTIVE_PATTERNS
        .iter()
        .find(|p| p.regex.is_match(&sanitized))
    {
        tracing::warn!(
            pattern = pattern.name,
            description = pattern.description,
            "rejected SQL matching destructive pattern"
        );
        return Err(QueryError::DestructiveStatement {
            pattern: pattern.name,
            description: pattern.description,
        });
    }

    Ok(())
}

/// Anything but whitespace after the first unmasked `;` is a second statement.
///
/// Backtick identifiers are the only spans the sanitizer leaves intact, so a
/// `;` inside one is part of a name.
fn has_trailing_statement(sanitized: &str) -> bool {
    let mut in_identifier = false;
    for (i, c) in sanitized.char_indices() {
        match c {
            '`' => in_identifier = !in_identifier,
            ';' if !in_identifier => return !sanitized[i + 1..].trim().is_empty(),
            _ => {}
        }
    }
    false
}

/// First run of ASCII letters, uppercased
fn leading_keyword(sanitized: &str) -> Option<String> {
    let start = sanitized.find(|c: char| c.is_ascii_alphabetic())?;
    let word: String = sanitized[start..]
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    Some(word.to_ascii_uppercase())
}
