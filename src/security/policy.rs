use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::security::{
    FORBIDDEN_OPERATION_KEYWORDS, READ_ONLY_VERBS, SENSITIVE_SUBSTRINGS, STRICT_DENYLIST_PREFIXES,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationCode {
    InvalidCommand,
    UnsafeVerb,
    SensitiveCommand,
    UnsafeOperation,
}

impl ViolationCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ViolationCode::InvalidCommand => "INVALID_COMMAND",
            ViolationCode::UnsafeVerb => "UNSAFE_VERB",
            ViolationCode::SensitiveCommand => "SENSITIVE_COMMAND",
            ViolationCode::UnsafeOperation => "UNSAFE_OPERATION",
        }
    }
}

impl fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the policy engine refused a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyViolation {
    pub code: ViolationCode,
    pub reason: String,
}

impl PolicyViolation {
    fn new(code: ViolationCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }
}

// Word boundaries on both sides: `--action=delete` matches, `deleted` does not.
static FORBIDDEN_OPERATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = FORBIDDEN_OPERATION_KEYWORDS.join("|");
    Regex::new(&format!(r"(?i)\b({})\b", alternation))
        .expect("forbidden operation keywords should form a valid regex")
});

/// Classify a linted command path and its remaining arguments.
///
/// Returns `None` when the command is approved. The verb allow-list runs
/// first, then the deny-lists from most to least specific: strict prefixes,
/// sensitive substrings, forbidden operation keywords.
///
/// `raw_args` is scanned for forbidden keywords. The gateway passes the
/// arguments left after removing the linted path tokens (see
/// [`remaining_arguments`](crate::gcloud::remaining_arguments)), not the
/// whole invocation. Scanning the whole invocation would also hit the path
/// itself and deny every command under a group named like a keyword, such as
/// `gcloud run services list`. Flag values and positionals are still scanned.
pub fn check_policy(command_path: &str, raw_args: &str) -> Option<PolicyViolation> {
    let normalized = command_path
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ");

    let tokens: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();
    let Some(verb) = tokens.last() else {
        return Some(PolicyViolation::new(
            ViolationCode::InvalidCommand,
            "Command path is empty",
        ));
    };

    if !READ_ONLY_VERBS.contains(verb) {
        return Some(PolicyViolation::new(
            ViolationCode::UnsafeVerb,
            format!(
                "Only read-only gcloud verbs are permitted ({}). Detected verb: '{}'",
                READ_ONLY_VERBS.join(", "),
                verb
            ),
        ));
    }

    if let Some(prefix) = strict_denylist_match(&normalized) {
        return Some(PolicyViolation::new(
            ViolationCode::SensitiveCommand,
            format!(
                "Commands under 'gcloud {}' are blocked because they expose security-sensitive resources",
                prefix
            ),
        ));
    }

    for token in &tokens {
        if let Some(needle) = SENSITIVE_SUBSTRINGS.iter().find(|s| token.contains(*s)) {
            return Some(PolicyViolation::new(
                ViolationCode::SensitiveCommand,
                format!(
                    "Command segment '{}' touches a sensitive surface ('{}') and is blocked",
                    token, needle
                ),
            ));
        }
    }

    if let Some(keyword) = forbidden_operation(raw_args) {
        return Some(PolicyViolation::new(
            ViolationCode::UnsafeOperation,
            format!(
                "Arguments contain the mutating operation keyword '{}'",
                keyword
            ),
        ));
    }

    None
}

fn strict_denylist_match(path: &str) -> Option<&'static str> {
    STRICT_DENYLIST_PREFIXES.iter().copied().find(|prefix| {
        path == *prefix
            || path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with(' '))
    })
}

/// First forbidden keyword appearing as a whole word, lowercased
///
/// Word-boundary matching over-matches keywords inside legitimate values
/// (`--filter=name:deploy`) and misses keywords glued to other word
/// characters (`--mode=autodelete`).
fn forbidden_operation(raw_args: &str) -> Option<String> {
    FORBIDDEN_OPERATION_REGEX
        .captures(raw_args)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
}
