// Application Layer - Dispatch pipeline

pub mod coordinator;
pub mod handler;
pub mod module;
pub mod registry;
pub mod router;
pub mod staleness;
pub mod stats;
pub mod worker;

// Re-exports
pub use coordinator::{Dispatcher, PipelineState, RunningPipeline, ShutdownReport};
pub use handler::{CommandHandler, HandlerContext, HandlerError, UnknownCommandHandler};
pub use module::{build_registry, CommandRegistration, Module, ModuleError};
pub use registry::{CommandInfo, CommandRegistry, RegistryError};
pub use router::{IgnoreReason, Route, Router};
pub use staleness::{is_expired, StalenessFilter};
pub use stats::{DispatchStats, StatsSnapshot};
pub use worker::{
    shutdown_channel, termination_channel, DispatchOutcome, ExecutionOutcome, FastWorker,
    ShutdownSender, ShutdownToken, TerminationHandle, TerminationReason, TerminationWatch,
};
