use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

use crate::error::{GcloudError, GcloudResult, ProcessStage};
use crate::gcloud::executor::{GcloudCli, InvocationResult};

pub const IMPERSONATION_FLAG: &str = "--impersonate-service-account";
/// Global flag that swaps the credentialed account for one invocation
pub const ACCOUNT_FLAG: &str = "--account";

static SERVICE_ACCOUNT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[^@\s]+@[^@\s]+\.gserviceaccount\.com$")
        .expect("service account pattern should compile")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    Impersonated,
    AccountOverride,
    ActiveAccount,
}

/// Service account a command will run as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub source: IdentitySource,
}

/// Looks up the account gcloud is currently authenticated as
#[async_trait]
pub trait AccountSource: Send + Sync {
    async fn active_account(&self) -> GcloudResult<Option<String>>;
}

#[derive(Debug, Deserialize)]
struct AuthAccount {
    account: String,
    #[serde(default)]
    status: String,
}

pub fn is_service_account(email: &str) -> bool {
    SERVICE_ACCOUNT_REGEX.is_match(email.trim())
}

/// Every value given to `flag`, in order.
///
/// Both `--flag=value` and `--flag value` are recognized; a flag with no
/// value yields an empty string so it can't be silently ignored.
fn flag_values<'a>(args: &'a [String], flag: &str) -> Vec<&'a str> {
    let mut values = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == flag {
            values.push(iter.next().map(String::as_str).unwrap_or(""));
        } else if let Some(value) = arg
            .strip_prefix(flag)
            .and_then(|rest| rest.strip_prefix('='))
        {
            values.push(value);
        }
    }
    values
}

/// Require that the command runs as a service account.
///
/// An explicit impersonation flag wins over `--account`, which wins over
/// the active account. Every `--account` value and every account in a
/// comma-separated delegation chain must be a service account.
pub async fn require_service_account_identity(
    args: &[String],
    accounts: &dyn AccountSource,
) -> GcloudResult<Identity> {
    let overrides = flag_values(args, ACCOUNT_FLAG);
    if let Some(bad) = overrides.iter().find(|email| !is_service_account(email)) {
        return Err(GcloudError::UnsupportedIdentity(format!(
            "{} must name a service account (*.gserviceaccount.com), got '{}'",
            ACCOUNT_FLAG, bad
        )));
    }

    let impersonated = flag_values(args, IMPERSONATION_FLAG);

    if !impersonated.is_empty() {
        let mut target = None;
        for value in impersonated {
            let chain: Vec<&str> = value.split(',').map(str::trim).collect();
            if let Some(bad) = chain.iter().find(|email| !is_service_account(email)) {
                return Err(GcloudError::UnsupportedIdentity(format!(
                    "{} must name a service account (*.gserviceaccount.com), got '{}'",
                    IMPERSONATION_FLAG, bad
                )));
            }
            target = chain.last().map(|email| email.to_string());
        }

        if let Some(email) = target {
            return Ok(Identity {
                email,
                source: IdentitySource::Impersonated,
            });
        }
    }

    if let Some(email) = overrides.last() {
        return Ok(Identity {
            email: email.trim().to_string(),
            source: IdentitySource::AccountOverride,
        });
    }

    match accounts.active_account().await? {
        None => Err(GcloudError::Unauthenticated),
        Some(email) if is_service_account(&email) => Ok(Identity {
            email: email.trim().to_string(),
            source: IdentitySource::ActiveAccount,
        }),
        Some(email) => Err(GcloudError::UnsupportedIdentity(format!(
            "Active gcloud account '{}' is not a service account. Human credentials are not allowed; \
             activate a service account or pass {}",
            email, IMPERSONATION_FLAG
        ))),
    }
}

/// Active account from `gcloud auth list --format=json` output
pub fn parse_active_account(output: &InvocationResult) -> GcloudResult<Option<String>> {
    if !output.success() {
        let stderr = output.stderr.trim();
        return Err(GcloudError::AuthError(if stderr.is_empty() {
            "gcloud auth list failed".to_string()
        } else {
            stderr.to_string()
        }));
    }

    let accounts: Vec<AuthAccount> = serde_json::from_str(output.stdout.trim())
        .map_err(|e| GcloudError::AuthError(format!("unparseable auth list output: {}", e)))?;

    Ok(accounts
        .into_iter()
        .find(|a| a.status.eq_ignore_ascii_case("ACTIVE"))
        .map(|a| a.account)
        .filter(|account| !account.trim().is_empty()))
}

pub fn auth_list_arguments() -> Vec<String> {
    ["auth", "list", "--format=json"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[async_trait]
impl AccountSource for GcloudCli {
    async fn active_account(&self) -> GcloudResult<Option<String>> {
        let output = self
            .invoke(
                &auth_list_arguments(),
                ProcessStage::AuthLookup,
                self.lint_timeout(),
            )
            .await
            .map_err(|e| match e {
                GcloudError::Spawn(io) => GcloudError::AuthError(io.to_string()),
                other => other,
            })?;
        parse_active_account(&output)
    }
}
