use crate::error::{GcloudError, GcloudResult};

/// Token list ready for identity checks, linting and execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedCommand {
    /// Never starts with the literal `gcloud`
    pub args: Vec<String>,
    /// `gcloud <args...>` for echoing back to the caller
    pub display: String,
}

/// Trim tokens, drop blank ones and strip one leading `gcloud`.
pub fn normalize<S: AsRef<str>>(tokens: &[S]) -> GcloudResult<NormalizedCommand> {
    let mut args: Vec<String> = tokens
        .iter()
        .map(|t| t.as_ref().trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();

    if args.first().is_some_and(|first| first == "gcloud") {
        args.remove(0);
    }

    if args.is_empty() {
        return Err(GcloudError::InvalidArgument(
            "A gcloud command is required, e.g. [\"projects\", \"list\"]".to_string(),
        ));
    }

    let display = format!("gcloud {}", args.join(" "));
    Ok(NormalizedCommand { args, display })
}
