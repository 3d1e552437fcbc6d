//! Event stream subscriber.
//!
//! `POST /v1/events` answers with a long-lived body of newline-delimited
//! JSON records. [`Client::subscribe`] returns as soon as the server accepts
//! the subscription and hands back an [`EventStream`]; a background task
//! scans the body and delivers each record in wire order.
//!
//! Every item on the stream is a `Result<Event, Error>`:
//!
//! - a malformed line yields [`Error::StreamDecode`] in place and scanning
//!   continues with the next line;
//! - a failed body read yields one final [`Error::Transport`];
//! - the stream ending (`recv()` returning `None`) is the only end-of-stream
//!   signal. There is no automatic reconnect.
//!
//! # Example
//!
//! ```rust,ignore
//! use icinga_api::{Client, EventType, Subscription};
//! use tokio_util::sync::CancellationToken;
//!
//! let cancel = CancellationToken::new();
//! let sub = Subscription::new([EventType::CheckResult]).with_filter(r#"event.host == "web01""#);
//! let mut stream = client.subscribe(&sub, cancel.clone()).await?;
//!
//! while let Some(item) = stream.recv().await {
//!     match item {
//!         Ok(event) => println!("{} {} {}", event.kind, event.host, event.service),
//!         Err(e) => eprintln!("{e}"),
//!     }
//! }
//! ```

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize, Serializer};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::client::Client;
use crate::error::Error;
use crate::model::CheckResult;
use crate::model::de::{epoch_seconds, flag};
use crate::response;

const EVENTS_PATH: &str = "/events";

// At most one record in flight between the reader task and the consumer.
const EVENT_CHANNEL_CAPACITY: usize = 1;

// Longest event line accepted; anything longer is reported and skipped.
const MAX_LINE_LEN: usize = 64 * 1024;

// Leading bytes of an oversized line kept in its error.
const OVERSIZED_PREFIX: usize = 256;

// ── EventType ────────────────────────────────────────────────────────

/// Event stream type, as named by Icinga2.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
pub enum EventType {
    CheckResult,
    StateChange,
    Notification,
    AcknowledgementSet,
    AcknowledgementCleared,
    CommentAdded,
    CommentRemoved,
    DowntimeAdded,
    DowntimeRemoved,
    DowntimeStarted,
    DowntimeTriggered,
    ObjectCreated,
    ObjectModified,
    ObjectDeleted,
    /// A type this library does not know about.
    #[serde(other)]
    Unknown,
}

// ── Event ────────────────────────────────────────────────────────────

/// One record from the event stream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventType,

    /// Host the event relates to.
    #[serde(default)]
    pub host: String,

    /// Service short name; empty for host events.
    #[serde(default)]
    pub service: String,

    #[serde(default, deserialize_with = "flag")]
    pub acknowledgement: bool,

    #[serde(default)]
    pub check_result: Option<CheckResult>,

    #[serde(default, deserialize_with = "epoch_seconds")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Decode one stream line.
pub fn decode_event(line: &[u8]) -> Result<Event, Error> {
    serde_json::from_slice(line).map_err(|e| Error::StreamDecode {
        message: e.to_string(),
        line: String::from_utf8_lossy(line).into_owned(),
    })
}

// ── Subscription ─────────────────────────────────────────────────────

/// Subscription descriptor sent when opening a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subscription {
    /// Types to receive. [`EventType::Unknown`] is never sent.
    #[serde(serialize_with = "known_types")]
    pub types: Vec<EventType>,
    /// Queue name Icinga2 uses to track this client. Subscribers sharing a
    /// queue share its events.
    pub queue: String,
    /// Filter expression; empty means every event of the given types.
    pub filter: String,
}

impl Subscription {
    /// Subscribe to `types` on a fresh, uniquely named queue.
    pub fn new(types: impl IntoIterator<Item = EventType>) -> Self {
        Self {
            types: types
                .into_iter()
                .filter(|t| *t != EventType::Unknown)
                .collect(),
            queue: format!("icinga-api-{}", Uuid::new_v4()),
            filter: String::new(),
        }
    }

    #[must_use]
    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = queue.into();
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }
}

fn known_types<S: Serializer>(types: &[EventType], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(types.iter().filter(|t| **t != EventType::Unknown))
}

// ── EventStream ──────────────────────────────────────────────────────

/// Receiving end of a subscription.
///
/// Dropping it stops the background reader and closes the connection.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::Receiver<Result<Event, Error>>,
    queue: String,
}

impl EventStream {
    /// Next event or in-stream error; `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<Result<Event, Error>> {
        self.rx.recv().await
    }

    /// The queue name this stream was opened with.
    pub fn queue(&self) -> &str {
        &self.queue
    }
}

impl Client {
    /// Open an event stream.
    ///
    /// Returns once the server has accepted the subscription; a non-200
    /// answer is returned here as an error and no stream is opened.
    /// Cancelling `cancel` ends the stream without an error item.
    pub async fn subscribe(
        &self,
        subscription: &Subscription,
        cancel: CancellationToken,
    ) -> Result<EventStream, Error> {
        let queue = subscription.queue.clone();
        debug!(queue = %queue, types = ?subscription.types, "subscribing to event stream");

        let resp = self
            .transport
            .post_stream(EVENTS_PATH, subscription)
            .await
            .map_err(|e| e.context("subscribe", queue.clone()))?;
        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp
                .bytes()
                .await
                .map_err(|e| Error::from(e).context("subscribe", queue.clone()))?;
            return Err(response::failure(status, &body).context("subscribe", queue));
        }

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        tokio::spawn(read_stream(resp, tx, cancel, queue.clone()));
        Ok(EventStream { rx, queue })
    }
}

// ── Background reader ────────────────────────────────────────────────

/// Accumulates body chunks and yields complete `\n`-terminated lines.
///
/// A line longer than [`MAX_LINE_LEN`] yields one [`Error::StreamDecode`]
/// and is dropped up to its newline, so memory stays bounded when the
/// server never terminates a line.
#[derive(Debug, Default)]
struct LineBuffer {
    buf: BytesMut,
    // Dropping the tail of an oversized line until its newline arrives.
    discarding: bool,
}

impl LineBuffer {
    fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    fn next_line(&mut self) -> Option<Result<Bytes, Error>> {
        loop {
            let Some(end) = self.buf.iter().position(|&b| b == b'\n') else {
                if self.discarding {
                    self.buf.clear();
                } else if self.buf.len() > MAX_LINE_LEN {
                    let err = oversized(&self.buf);
                    self.buf.clear();
                    self.discarding = true;
                    return Some(Err(err));
                }
                return None;
            };

            let mut line = self.buf.split_to(end + 1);
            line.truncate(end);
            if std::mem::take(&mut self.discarding) {
                continue;
            }
            if line.len() > MAX_LINE_LEN {
                return Some(Err(oversized(&line)));
            }
            return Some(Ok(line.freeze()));
        }
    }

    /// Whatever is left after the body ended without a final newline.
    fn remainder(&mut self) -> Option<Bytes> {
        (!self.buf.is_empty()).then(|| self.buf.split().freeze())
    }
}

fn oversized(line: &[u8]) -> Error {
    let prefix = &line[..line.len().min(OVERSIZED_PREFIX)];
    Error::StreamDecode {
        message: format!("event line longer than {MAX_LINE_LEN} bytes"),
        line: String::from_utf8_lossy(prefix).into_owned(),
    }
}

async fn read_stream(
    mut resp: reqwest::Response,
    tx: mpsc::Sender<Result<Event, Error>>,
    cancel: CancellationToken,
    queue: String,
) {
    let mut lines = LineBuffer::default();

    loop {
        let chunk = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(queue = %queue, "event stream cancelled");
                return;
            }
            () = tx.closed() => {
                debug!(queue = %queue, "event stream receiver dropped");
                return;
            }
            chunk = resp.chunk() => chunk,
        };

        match chunk {
            Ok(Some(bytes)) => {
                lines.extend(&bytes);
                while let Some(line) = lines.next_line() {
                    let sent = match line {
                        Ok(line) => deliver(&tx, &cancel, &line).await,
                        Err(e) => {
                            warn!(queue = %queue, "event line too long, skipping it");
                            send(&tx, &cancel, Err(e)).await
                        }
                    };
                    if !sent {
                        return;
                    }
                }
            }
            Ok(None) => {
                if let Some(line) = lines.remainder() {
                    deliver(&tx, &cancel, &line).await;
                }
                info!(queue = %queue, "event stream closed by server");
                return;
            }
            Err(e) => {
                warn!(queue = %queue, error = %e, "event stream read failed");
                send(&tx, &cancel, Err(Error::Transport(e))).await;
                return;
            }
        }
    }
}

/// Decode and send one line. Returns `false` once the stream should stop.
async fn deliver(
    tx: &mpsc::Sender<Result<Event, Error>>,
    cancel: &CancellationToken,
    line: &[u8],
) -> bool {
    let line = line.trim_ascii();
    if line.is_empty() {
        return true;
    }
    trace!(line = %String::from_utf8_lossy(line), "event line");

    send(tx, cancel, decode_event(line)).await
}

/// Send one item unless cancelled first. Returns `false` once the stream
/// should stop.
async fn send(
    tx: &mpsc::Sender<Result<Event, Error>>,
    cancel: &CancellationToken,
    item: Result<Event, Error>,
) -> bool {
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        sent = tx.send(item) => sent.is_ok(),
    }
}
