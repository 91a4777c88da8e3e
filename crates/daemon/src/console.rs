// Console adapters: JSON lines in on stdin, JSON lines out on stdout
//
// Inbound:  {"update_id"?, "chat_id", "from"?, "text"?, "date"?}
// Outbound: {"chat_id", "text"}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use herald_core::domain::{ChatId, Event, EventId, UserId};
use herald_core::port::{Responder, ResponderError, UpdateSource};
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

/// Lines buffered between the reader thread and ingestion
const LINE_BUFFER: usize = 64;

#[derive(Debug, Deserialize)]
struct InboundMessage {
    update_id: Option<EventId>,
    chat_id: ChatId,
    from: Option<UserId>,
    text: Option<String>,
    /// Unix seconds
    date: Option<i64>,
}

#[derive(Debug, Serialize)]
struct OutboundMessage<'a> {
    chat_id: ChatId,
    text: &'a str,
}

/// Reads updates line by line on a dedicated thread.
///
/// A plain thread rather than `tokio::io::stdin` so a pending read never holds
/// the runtime open at exit.
pub struct StdinSource {
    lines: mpsc::Receiver<String>,
    next_id: EventId,
}

impl StdinSource {
    pub fn spawn<R>(reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(LINE_BUFFER);
        std::thread::spawn(move || {
            for line in reader.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!(error = %e, "Input read failed, ending input");
                        break;
                    }
                };
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
            debug!("Input reader finished");
        });
        Self {
            lines: rx,
            next_id: 1,
        }
    }

    fn assign_id(&mut self, requested: Option<EventId>) -> EventId {
        let id = requested.unwrap_or(self.next_id);
        self.next_id = self.next_id.max(id.saturating_add(1));
        id
    }
}

#[async_trait]
impl UpdateSource for StdinSource {
    async fn next_event(&mut self) -> Option<Event> {
        loop {
            // mpsc::Receiver::recv is cancel-safe
            let line = self.lines.recv().await?;
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(&line) {
                Ok((message, raw)) => {
                    let id = self.assign_id(message.update_id);
                    return Some(into_event(id, message, raw, Utc::now()));
                }
                Err(e) => warn!(error = %e, "Skipping malformed input line"),
            }
        }
    }

    async fn stop(&mut self) {
        self.lines.close();
        info!("Input closed");
    }
}

fn parse_line(line: &str) -> Result<(InboundMessage, serde_json::Value), serde_json::Error> {
    let raw: serde_json::Value = serde_json::from_str(line)?;
    let message = InboundMessage::deserialize(&raw)?;
    Ok((message, raw))
}

fn into_event(
    id: EventId,
    message: InboundMessage,
    raw: serde_json::Value,
    now: DateTime<Utc>,
) -> Event {
    let arrived_at = message
        .date
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or(now);
    let event = Event::new(id, message.chat_id, arrived_at, message.text).with_raw(raw);
    match message.from {
        Some(sender) => event.with_sender(sender),
        None => event,
    }
}

/// Writes replies as JSON lines
pub struct ConsoleResponder<W> {
    out: Mutex<W>,
}

impl ConsoleResponder<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W> ConsoleResponder<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

#[async_trait]
impl<W> Responder for ConsoleResponder<W>
where
    W: AsyncWrite + Send + Unpin,
{
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), ResponderError> {
        let mut line = serde_json::to_vec(&OutboundMessage { chat_id, text })
            .map_err(|e| ResponderError::SendFailed(e.to_string()))?;
        line.push(b'\n');

        // One lock per line so concurrent replies never interleave
        let mut out = self.out.lock().await;
        out.write_all(&line).await?;
        out.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn source(input: &str) -> StdinSource {
        StdinSource::spawn(Cursor::new(input.to_string().into_bytes()))
    }

    #[tokio::test]
    async fn test_reads_events_until_eof() {
        let mut src = source(concat!(
            "{\"update_id\": 10, \"chat_id\": 1, \"from\": 7, ",
            "\"text\": \"/stat\", \"date\": 1700000000}\n",
            "\n",
            "{\"chat_id\": 2, \"text\": \"hello\"}\n",
        ));

        let first = src.next_event().await.unwrap();
        assert_eq!(first.id, 10);
        assert_eq!(first.chat_id, 1);
        assert_eq!(first.sender_id, Some(7));
        assert_eq!(first.command_name(), Some("stat"));
        assert_eq!(first.arrived_at.timestamp(), 1_700_000_000);
        assert_eq!(first.raw["update_id"], 10);

        let second = src.next_event().await.unwrap();
        assert_eq!(second.id, 11);
        assert_eq!(second.sender_id, None);
        assert!(second.command.is_none());

        assert!(src.next_event().await.is_none());
    }

    #[tokio::test]
    async fn test_malformed_lines_are_skipped() {
        let mut src = source("not json\n{\"text\": \"no chat\"}\n{\"chat_id\": 3}\n");

        let event = src.next_event().await.unwrap();
        assert_eq!(event.chat_id, 3);
        assert_eq!(event.id, 1);
        assert!(event.text.is_none());
        assert!(src.next_event().await.is_none());
    }

    #[test]
    fn test_missing_date_uses_arrival_time() {
        let (message, raw) = parse_line("{\"chat_id\": 4, \"text\": \"/help\"}").unwrap();
        let now = Utc::now();
        let event = into_event(5, message, raw, now);
        assert_eq!(event.arrived_at, now);
    }

    #[tokio::test]
    async fn test_responder_writes_json_lines() {
        let responder = ConsoleResponder::new(Vec::new());
        tokio_test::assert_ok!(responder.send_text(1, "first").await);
        tokio_test::assert_ok!(responder.send_text(2, "line\nbreak").await);

        let written = String::from_utf8(responder.into_inner()).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"chat_id":1,"text":"first"}"#);
        assert_eq!(lines[1], r#"{"chat_id":2,"text":"line\nbreak"}"#);
    }
}
