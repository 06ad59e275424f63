pub mod policy;

pub use policy::{PolicyViolation, ViolationCode, check_policy};

/// Verbs a linted command path may end with
///
/// This is the only allow-list in the policy engine. Every other table below
/// is a deny-list applied after a command passes this one.
///
/// Adding a new verb requires careful security review.
pub const READ_ONLY_VERBS: &[&str] = &[
    "list",
    "lists",
    "describe",
    "get",
    "read",
    "tail",
    "check",
    "diagnose",
    "inspect",
    "lookup",
    "ls",
    "print",
    "show",
    "status",
    "verify",
    "whoami",
];

/// Command groups denied even for read verbs
///
/// A path is denied when it equals an entry or starts with the entry followed
/// by a space. Reading these surfaces already exposes credentials or access
/// configuration.
pub const STRICT_DENYLIST_PREFIXES: &[&str] = &[
    // IAM
    "iam",
    "alpha iam",
    "beta iam",
    // Secret Manager
    "secrets",
    "alpha secrets",
    "beta secrets",
    // Cloud KMS
    "kms",
    "alpha kms",
    "beta kms",
    // VPC Service Controls
    "access-context-manager",
    "alpha access-context-manager",
    "beta access-context-manager",
    // Organization policy
    "org-policies",
    "alpha org-policies",
    "beta org-policies",
    "resource-manager org-policies",
    "alpha resource-manager org-policies",
    "beta resource-manager org-policies",
];

/// Substrings that mark a path token as sensitive
///
/// Matched inside every token so compound names like `get-iam-policy` or
/// `activate-service-account` are caught.
pub const SENSITIVE_SUBSTRINGS: &[&str] = &[
    "iam",
    "secret-manager",
    "secretmanager",
    "secrets",
    "kms",
    "key-management",
    "keymanagement",
    "access-context",
    "accesscontext",
    "ssh",
    "scp",
    "tunnel",
    "interactive",
    "activate",
    "inactivate",
];

/// Operation keywords that must not appear as whole words in the arguments
pub const FORBIDDEN_OPERATION_KEYWORDS: &[&str] = &[
    "create",
    "delete",
    "update",
    "patch",
    "deploy",
    "destroy",
    "enable",
    "disable",
    "set",
    "unset",
    "run",
    "export",
    "import",
    "publish",
    "add",
    "remove",
    "start",
    "stop",
    "restart",
    "reset",
    "resize",
    "attach",
    "detach",
    "apply",
    "write",
    "insert",
    "truncate",
    "drop",
    "cancel",
    "submit",
    "execute",
    "invoke",
    "rollback",
    "undelete",
    "purge",
    "upload",
];
