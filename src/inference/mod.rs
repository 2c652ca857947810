pub mod provider;
pub mod providers;
pub mod types;

pub use provider::{CompletionError, CompletionService, FailureKind};
pub use providers::{EndpointService, OpenRouterService, build_service};
pub use types::{ChatRequest, Completion, parse_completion};
