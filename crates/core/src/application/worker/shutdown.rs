// Shutdown Token & Termination Requests

use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// One-shot broadcast stop signal, cloned into every worker at spawn time
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    /// Check if shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for shutdown signal (returns at once if the sender is gone)
    pub async fn wait(&mut self) {
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}

/// Shutdown sender, owned by the coordinator
pub struct ShutdownSender {
    tx: watch::Sender<bool>,
}

impl ShutdownSender {
    /// Signal shutdown to all holders of the token. Repeated calls are no-ops.
    pub fn shutdown(&self) {
        self.tx.send_if_modified(|stop| !std::mem::replace(stop, true));
    }

    pub fn is_shutdown(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Create a shutdown channel
pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSender { tx }, ShutdownToken { rx })
}

/// Why the pipeline is asked to stop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    /// Operating-system signal (name)
    Signal(String),
    /// Administrative `quit` command
    Quit,
    /// Administrative `restart` command; the supervisor relaunches us
    Restart,
    /// The update source has no more events
    SourceClosed,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::Signal(name) => write!(f, "signal {}", name),
            TerminationReason::Quit => write!(f, "quit command"),
            TerminationReason::Restart => write!(f, "restart command"),
            TerminationReason::SourceClosed => write!(f, "update source closed"),
        }
    }
}

/// Handle for requesting termination from anywhere (handlers, signal listeners).
/// The first request wins; later ones are ignored.
#[derive(Clone)]
pub struct TerminationHandle {
    tx: Arc<watch::Sender<Option<TerminationReason>>>,
}

impl TerminationHandle {
    /// Returns `true` if this call was the one that triggered termination
    pub fn request(&self, reason: TerminationReason) -> bool {
        self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        })
    }

    pub fn requested(&self) -> Option<TerminationReason> {
        self.tx.borrow().clone()
    }
}

/// Receiving side of termination requests
pub struct TerminationWatch {
    rx: watch::Receiver<Option<TerminationReason>>,
}

impl TerminationWatch {
    /// Wait for the first termination request
    pub async fn wait(&mut self) -> Option<TerminationReason> {
        match self.rx.wait_for(Option::is_some).await {
            Ok(reason) => (*reason).clone(),
            Err(_) => None,
        }
    }
}

/// Create a termination channel
pub fn termination_channel() -> (TerminationHandle, TerminationWatch) {
    let (tx, rx) = watch::channel(None);
    (TerminationHandle { tx: Arc::new(tx) }, TerminationWatch { rx })
}
