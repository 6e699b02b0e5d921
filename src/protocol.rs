//! Wire contract for the server's realtime channel.
//!
//! Every message is a named event with a JSON payload. Commands flow from the
//! client to the server, server events flow back; `progress_status` carries a
//! complete snapshot that replaces whatever the client was showing before.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Inbound event: paired response to a `download` command.
pub const EVT_DOWNLOAD: &str = "download";
/// Inbound event: settings payload answering `loadSettings`.
pub const EVT_SETTINGS_LOADED: &str = "settingsLoaded";
/// Inbound event: full progress snapshot, pushed periodically.
pub const EVT_PROGRESS_STATUS: &str = "progress_status";

pub const CMD_DOWNLOAD: &str = "download";
pub const CMD_CLEAR: &str = "clear";
pub const CMD_LOAD_SETTINGS: &str = "loadSettings";
pub const CMD_UPDATE_SETTINGS: &str = "updateSettings";
pub const CMD_REMOVE_TRACK: &str = "remove_track";

/// Payload of a `download` command. The link is user-supplied text and is
/// passed through without client-side validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    #[serde(rename = "Link")]
    pub link: String,
}

/// Status field of a [`DownloadResponse`]. Anything the client does not
/// recognize is treated uniformly as failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResponseStatus {
    Success,
    Error,
    Unknown,
}

impl From<String> for ResponseStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Success" => Self::Success,
            "Error" => Self::Error,
            _ => Self::Unknown,
        }
    }
}

impl From<ResponseStatus> for String {
    fn from(status: ResponseStatus) -> Self {
        match status {
            ResponseStatus::Success => "Success",
            ResponseStatus::Error => "Error",
            ResponseStatus::Unknown => "Unknown",
        }
        .to_string()
    }
}

/// Server response to a `download` command.
///
/// `data` carries human-readable error text when the status is anything
/// other than `Success`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadResponse {
    #[serde(rename = "Status")]
    pub status: ResponseStatus,
    #[serde(rename = "Data", default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl DownloadResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }

    /// Error text to show the user, empty when the server sent none.
    #[must_use]
    pub fn error_text(&self) -> &str {
        self.data.as_deref().unwrap_or("")
    }
}

/// Settings payload, both directions (`settingsLoaded` / `updateSettings`).
///
/// All fields are string-valued form text; the server is the one that
/// interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SettingsPayload {
    #[serde(default)]
    pub spotify_client_id: String,
    #[serde(default)]
    pub spotify_client_secret: String,
    #[serde(default)]
    pub sleep_interval: String,
    #[serde(default)]
    pub ignored_keywords: String,
}

/// Per-track status vocabulary used in progress snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TrackStatus {
    Queued,
    LinkFound,
    FileAlreadyExists,
    SearchFailed,
    DownloadFailed,
    ProcessingComplete,
    NoLinkFound,
    Running,
    Stopped,
    Complete,
    Error,
    Unknown,
}

impl TrackStatus {
    /// The wire label for this status.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Queued => "Queued",
            Self::LinkFound => "Link Found",
            Self::FileAlreadyExists => "File Already Exists",
            Self::SearchFailed => "Search Failed",
            Self::DownloadFailed => "Download Failed",
            Self::ProcessingComplete => "Processing Complete",
            Self::NoLinkFound => "No Link Found",
            Self::Running => "Running",
            Self::Stopped => "Stopped",
            Self::Complete => "Complete",
            Self::Error => "Error",
            Self::Unknown => "Unknown",
        }
    }
}

impl From<String> for TrackStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Queued" => Self::Queued,
            "Link Found" => Self::LinkFound,
            "File Already Exists" => Self::FileAlreadyExists,
            "Search Failed" => Self::SearchFailed,
            "Download Failed" => Self::DownloadFailed,
            "Processing Complete" => Self::ProcessingComplete,
            "No Link Found" => Self::NoLinkFound,
            "Running" => Self::Running,
            "Stopped" => Self::Stopped,
            "Complete" => Self::Complete,
            "Error" => Self::Error,
            _ => Self::Unknown,
        }
    }
}

impl From<TrackStatus> for String {
    fn from(status: TrackStatus) -> Self {
        status.label().to_string()
    }
}

impl fmt::Display for TrackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of a progress snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackProgress {
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub title: String,
    pub status: TrackStatus,
    #[serde(default)]
    pub percent_downloaded: f64,
}

impl TrackProgress {
    /// Status cell text: the percent suffix appears only while running.
    #[must_use]
    pub fn status_text(&self) -> String {
        if self.status == TrackStatus::Running {
            format!("{} ({}%)", self.status, self.percent_downloaded)
        } else {
            self.status.to_string()
        }
    }
}

/// Overall queue status driving the aggregate progress bar styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QueueStatus {
    Running,
    Stopped,
    Idle,
    Complete,
    Unknown,
}

impl From<String> for QueueStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Running" => Self::Running,
            "Stopped" => Self::Stopped,
            "Idle" => Self::Idle,
            "Complete" => Self::Complete,
            _ => Self::Unknown,
        }
    }
}

impl From<QueueStatus> for String {
    fn from(status: QueueStatus) -> Self {
        match status {
            QueueStatus::Running => "Running",
            QueueStatus::Stopped => "Stopped",
            QueueStatus::Idle => "Idle",
            QueueStatus::Complete => "Complete",
            QueueStatus::Unknown => "Unknown",
        }
        .to_string()
    }
}

/// A complete, replace-semantics view of current download progress.
///
/// Snapshots are authoritative: the client never merges one with prior
/// state, it discards what it had and rebuilds from this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    #[serde(default)]
    pub data: Vec<TrackProgress>,
    #[serde(default)]
    pub percent_completion: f64,
    pub status: QueueStatus,
}

impl Default for ProgressSnapshot {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            percent_completion: 0.0,
            status: QueueStatus::Idle,
        }
    }
}

/// Outbound commands, fire-and-forget.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Download(DownloadRequest),
    Clear,
    LoadSettings,
    UpdateSettings(SettingsPayload),
    /// Removes one row by its position in the most recent snapshot.
    RemoveTrack(usize),
}

impl Command {
    /// Convenience constructor for the common case.
    pub fn download(link: impl Into<String>) -> Self {
        Self::Download(DownloadRequest { link: link.into() })
    }

    /// Wire event name for this command.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Download(_) => CMD_DOWNLOAD,
            Self::Clear => CMD_CLEAR,
            Self::LoadSettings => CMD_LOAD_SETTINGS,
            Self::UpdateSettings(_) => CMD_UPDATE_SETTINGS,
            Self::RemoveTrack(_) => CMD_REMOVE_TRACK,
        }
    }

    /// JSON body sent with the command. Payload-less commands send `{}`;
    /// `remove_track` sends a bare integer.
    #[must_use]
    pub fn payload(&self) -> Value {
        match self {
            Self::Download(req) => serde_json::to_value(req).unwrap_or(Value::Null),
            Self::Clear | Self::LoadSettings => Value::Object(serde_json::Map::new()),
            Self::UpdateSettings(settings) => {
                serde_json::to_value(settings).unwrap_or(Value::Null)
            }
            Self::RemoveTrack(index) => Value::from(*index),
        }
    }
}

/// Decoded inbound events.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    Download(DownloadResponse),
    SettingsLoaded(SettingsPayload),
    Progress(ProgressSnapshot),
}

impl ServerEvent {
    /// Decodes a named event's JSON payload.
    ///
    /// Returns `Ok(None)` for event names this client does not react to.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload does not match the event's shape.
    pub fn decode(event: &str, data: &str) -> serde_json::Result<Option<Self>> {
        let decoded = match event {
            EVT_DOWNLOAD => Some(Self::Download(serde_json::from_str(data)?)),
            EVT_SETTINGS_LOADED => Some(Self::SettingsLoaded(serde_json::from_str(data)?)),
            EVT_PROGRESS_STATUS => Some(Self::Progress(serde_json::from_str(data)?)),
            _ => None,
        };
        Ok(decoded)
    }
}
