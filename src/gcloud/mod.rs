pub mod executor;
pub mod identity;
pub mod lint;
pub mod normalizer;
pub mod pipeline;

// Re-export commonly used types
pub use executor::{CommandRunner, GcloudCli, InvocationResult};
pub use identity::{AccountSource, Identity, IdentitySource, is_service_account, require_service_account_identity};
pub use lint::{CommandLinter, LintResult};
pub use normalizer::{NormalizedCommand, normalize};
pub use pipeline::{
    Execution, GateStep, PipelineStage, ReadOnlyGateway, Rejection, ToolResponse, remaining_arguments,
};
