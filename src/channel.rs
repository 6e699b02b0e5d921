//! Realtime channel client.
//!
//! The server pushes named events over a long-lived SSE stream at
//! `GET {base}/events`; the client fires commands at `POST {base}/cmd/{name}`
//! with a JSON body. Commands are fire-and-forget: the only acknowledgment a
//! caller ever sees is the paired response event, where one exists.
//!
//! If the stream ends or cannot be opened, the channel retries on a fixed
//! 3-second cadence. That is the channel's built-in default; callers install
//! no reconnection logic of their own.

use std::time::Duration;

use bytes::BytesMut;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::protocol::{Command, ServerEvent};
use crate::{Error, Result};

/// Fixed delay before reopening a dropped event stream.
const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// One decoded SSE message: an event name and its data payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseMessage {
    pub event: String,
    pub data: String,
}

/// Incremental decoder for an SSE byte stream.
///
/// Feed it chunks as they arrive; it yields complete messages and buffers
/// partial lines (chunks may split lines, or even UTF-8 sequences) until the
/// rest shows up. Never panics on arbitrary input.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: BytesMut,
    event: String,
    data: String,
}

impl SseDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes a chunk and returns every message completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseMessage> {
        self.buf.extend_from_slice(chunk);
        let mut out = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line = self.buf.split_to(pos + 1);
            let line = &line[..line.len() - 1];
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            let line = String::from_utf8_lossy(line).into_owned();
            self.feed_line(&line, &mut out);
        }
        out
    }

    fn feed_line(&mut self, line: &str, out: &mut Vec<SseMessage>) {
        // Blank line dispatches the accumulated message.
        if line.is_empty() {
            if !self.event.is_empty() || !self.data.is_empty() {
                out.push(SseMessage {
                    event: std::mem::take(&mut self.event),
                    data: std::mem::take(&mut self.data),
                });
            }
            return;
        }
        // Comment lines keep the connection alive and carry nothing.
        if line.starts_with(':') {
            return;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = value.to_string(),
            "data" => {
                if !self.data.is_empty() {
                    self.data.push('\n');
                }
                self.data.push_str(value);
            }
            // id and retry are part of SSE but unused by this protocol.
            _ => {}
        }
    }
}

/// Handle to an open channel. Dropping it stops the background stream task.
pub struct Channel {
    base: String,
    http: reqwest::Client,
    cancel: CancellationToken,
}

impl Channel {
    /// Opens the channel against a server base URL (e.g. `http://host:5000`).
    ///
    /// Returns the command handle and the receiver on which decoded server
    /// events arrive. The event stream is maintained by a background task
    /// that keeps reconnecting until the handle is dropped or the receiver
    /// is closed.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn connect(base_url: &str) -> Result<(Self, mpsc::UnboundedReceiver<ServerEvent>)> {
        let base = base_url.trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(Error::Http)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let task_http = http.clone();
        let task_base = base.clone();
        let task_cancel = cancel.child_token();
        tokio::spawn(async move {
            run_event_stream(&task_http, &task_base, &tx, &task_cancel).await;
        });

        Ok((Self { base, http, cancel }, rx))
    }

    /// The server base URL this channel talks to.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Emits a command, fire-and-forget.
    ///
    /// The POST happens on a spawned task; failures are logged and never
    /// surface to the caller. Whatever effect the command has shows up as a
    /// later server event, if at all.
    pub fn emit(&self, command: Command) {
        let name = command.name();
        let url = format!("{}/cmd/{name}", self.base);
        let body = command.payload();
        let http = self.http.clone();
        tokio::spawn(async move {
            match http.post(&url).json(&body).send().await {
                Ok(resp) if !resp.status().is_success() => {
                    log::warn!("{name} command rejected: HTTP {}", resp.status());
                }
                Ok(_) => {}
                Err(e) => log::warn!("{name} command failed: {e}"),
            }
        });
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Keeps the event stream open, forwarding decoded events until cancelled
/// or the receiver side goes away.
async fn run_event_stream(
    http: &reqwest::Client,
    base: &str,
    tx: &mpsc::UnboundedSender<ServerEvent>,
    cancel: &CancellationToken,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => return,
            result = stream_events(http, base, tx) => match result {
                Ok(()) => log::warn!("event stream ended, retrying in {}s", RECONNECT_DELAY.as_secs()),
                Err(e) => log::warn!("event stream error: {e}, retrying in {}s", RECONNECT_DELAY.as_secs()),
            },
        }
        if tx.is_closed() {
            return;
        }
        tokio::select! {
            () = cancel.cancelled() => return,
            () = tokio::time::sleep(RECONNECT_DELAY) => {}
        }
    }
}

/// Runs one stream until the server closes it. Returns `Ok(())` on a clean
/// close so the caller can decide whether to reopen.
async fn stream_events(
    http: &reqwest::Client,
    base: &str,
    tx: &mpsc::UnboundedSender<ServerEvent>,
) -> Result<()> {
    let resp = http
        .get(format!("{base}/events"))
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()
        .await?
        .error_for_status()?;

    log::info!("event stream connected to {base}");

    let mut stream = resp.bytes_stream();
    let mut decoder = SseDecoder::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        for msg in decoder.push(&chunk) {
            match ServerEvent::decode(&msg.event, &msg.data) {
                Ok(Some(event)) => {
                    if tx.send(event).is_err() {
                        return Ok(());
                    }
                }
                Ok(None) => log::debug!("ignoring unhandled event '{}'", msg.event),
                Err(e) => log::warn!("undecodable '{}' payload: {e}", msg.event),
            }
        }
    }
    Ok(())
}
