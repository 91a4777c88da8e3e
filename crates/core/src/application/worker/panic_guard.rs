// Panic isolation for handler invocations
// A failing or panicking handler must never take its worker down with it.

use crate::application::handler::{CommandHandler, HandlerContext};
use crate::domain::Event;
use std::any::Any;
use std::sync::Arc;

/// Result of a guarded handler invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Handler returned `Ok`
    Completed,
    /// Handler returned an error (message)
    Failed(String),
    /// Handler panicked (panic message)
    Panicked(String),
}

/// Run `handler.execute` in its own task and wait for it.
///
/// The caller is suspended until the handler finishes, so the worker does not
/// pick up new work meanwhile. A panic surfaces through the `JoinHandle`
/// instead of unwinding the worker.
pub async fn execute_guarded(
    handler: Arc<dyn CommandHandler>,
    ctx: HandlerContext,
    event: Event,
) -> ExecutionOutcome {
    let handle = tokio::spawn(async move { handler.execute(&ctx, &event).await });

    match handle.await {
        Ok(Ok(())) => ExecutionOutcome::Completed,
        Ok(Err(e)) => ExecutionOutcome::Failed(e.to_string()),
        Err(join_err) if join_err.is_panic() => {
            ExecutionOutcome::Panicked(panic_message(join_err.into_panic()))
        }
        Err(join_err) => ExecutionOutcome::Failed(format!("handler task cancelled: {}", join_err)),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
