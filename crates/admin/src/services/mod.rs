//! Business logic services for admin.
//!
//! # Services
//!
//! - `agent` - Command orchestration, site monitor and credential edits
//! - `audit` - Operator-visible audit log
//! - `executor` - Sequential credential fallback for AI requests
//! - `interpreter` - Prompt construction
//! - `mutator` - Applies agent instructions to site state

pub mod agent;
pub mod audit;
pub mod executor;
pub mod interpreter;
pub mod mutator;

pub use agent::{
    AdminAgent, AgentError, CommandError, CommandOutcome, CommandReport, CommandStage,
    MONITOR_FAILED, MONITOR_IDLE, ResetError, SubmitError,
};
pub use audit::AuditLog;
pub use executor::{
    Completion, CompletionBackend, CompletionRequest, ExecutorError, FallbackPolicy,
    RequestExecutor,
};
pub use mutator::{MutationError, MutationOutcome, ProtectedFields};
