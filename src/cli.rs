//! One-shot command mode: submit links without opening the TUI.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::channel::Channel;
use crate::protocol::{Command, DownloadResponse, ServerEvent};
use crate::{Error, Result};

/// How long to wait for the paired response before giving up on a link.
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

/// Submits each link as a `download` command and prints the server's
/// verdict.
///
/// # Errors
///
/// Returns an error if the channel cannot be opened, a response never
/// arrives, or any link was rejected.
pub async fn run(server: &str, links: Vec<String>) -> Result<()> {
    let (channel, mut events) = Channel::connect(server)?;

    let mut rejected = 0usize;
    for link in links {
        channel.emit(Command::download(link.clone()));
        let response = wait_for_response(&mut events, RESPONSE_TIMEOUT).await?;
        if response.is_success() {
            println!("queued: {link}");
        } else {
            rejected += 1;
            eprintln!("rejected: {link}: {}", response.error_text());
        }
    }

    if rejected > 0 {
        return Err(Error::Channel(format!("{rejected} link(s) rejected")));
    }
    Ok(())
}

/// Waits for the next `download` response. Unrelated pushes (progress
/// snapshots keep arriving on the same stream) are skipped.
async fn wait_for_response(
    events: &mut mpsc::UnboundedReceiver<ServerEvent>,
    timeout: Duration,
) -> Result<DownloadResponse> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let event = tokio::time::timeout_at(deadline, events.recv())
            .await
            .map_err(|_| Error::Channel("timed out waiting for download response".to_string()))?
            .ok_or_else(|| Error::Channel("event stream closed".to_string()))?;
        if let ServerEvent::Download(response) = event {
            return Ok(response);
        }
    }
}
