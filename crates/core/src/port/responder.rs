// Outbound Response Port
// Handlers reply to the originating conversation through this; dispatch only uses it
// to report a full batch queue.

use crate::domain::ChatId;
use async_trait::async_trait;
use thiserror::Error;

/// Outbound send errors
#[derive(Error, Debug)]
pub enum ResponderError {
    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Sends text back to a conversation
#[async_trait]
pub trait Responder: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), ResponderError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Records every message instead of sending it
    #[derive(Default)]
    pub struct RecordingResponder {
        sent: Mutex<Vec<(ChatId, String)>>,
        fail: bool,
    }

    impl RecordingResponder {
        pub fn new() -> Self {
            Self::default()
        }

        /// A responder whose sends always fail (nothing is recorded)
        pub fn new_failing() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        pub fn sent(&self) -> Vec<(ChatId, String)> {
            self.sent.lock().unwrap().clone()
        }

        pub fn sent_to(&self, chat_id: ChatId) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .filter(|(id, _)| *id == chat_id)
                .map(|(_, text)| text.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Responder for RecordingResponder {
        async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), ResponderError> {
            if self.fail {
                return Err(ResponderError::SendFailed("mock failure".to_string()));
            }
            self.sent.lock().unwrap().push((chat_id, text.to_string()));
            Ok(())
        }
    }
}
