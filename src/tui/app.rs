//! Application state model.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use ratatui::widgets::TableState;
use tokio::sync::mpsc;

use crate::prefs::{Prefs, Theme};
use crate::protocol::{Command, ProgressSnapshot, SettingsPayload};

/// How long rejected-download text stays in the search field.
pub const ERROR_ECHO: Duration = Duration::from_millis(3000);
/// How long the save confirmation banner stays visible.
pub const SAVE_BANNER: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Settings,
}

#[derive(Debug, Clone, Copy)]
pub enum SettingsField {
    ClientId,
    ClientSecret,
    SleepInterval,
    IgnoredKeywords,
}

impl SettingsField {
    pub const ALL: [Self; 4] = [
        Self::ClientId,
        Self::ClientSecret,
        Self::SleepInterval,
        Self::IgnoredKeywords,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::ClientId => "Spotify client id",
            Self::ClientSecret => "Spotify client secret",
            Self::SleepInterval => "Sleep interval",
            Self::IgnoredKeywords => "Ignored keywords",
        }
    }

    /// Whether the field is rendered masked.
    pub const fn masked(self) -> bool {
        matches!(self, Self::ClientSecret)
    }
}

/// Settings panel state.
///
/// `awaiting_load` arms a one-shot populate: exactly the next
/// `settingsLoaded` event fills the form, then the arm drops. Re-opening the
/// panel re-arms it, so repeated opens never stack listeners.
pub struct SettingsForm {
    pub fields: SettingsPayload,
    pub active_field: usize,
    pub awaiting_load: bool,
}

impl SettingsForm {
    pub fn new() -> Self {
        Self {
            fields: SettingsPayload::default(),
            active_field: 0,
            awaiting_load: false,
        }
    }

    pub const fn field_count() -> usize {
        SettingsField::ALL.len()
    }

    pub const fn active_value_mut(&mut self) -> &mut String {
        match self.active_field {
            0 => &mut self.fields.spotify_client_id,
            1 => &mut self.fields.spotify_client_secret,
            2 => &mut self.fields.sleep_interval,
            _ => &mut self.fields.ignored_keywords,
        }
    }
}

pub struct App {
    /// Server base URL, display only.
    pub server: String,
    pub should_quit: bool,
    pub popup: Popup,
    // Search box + busy indicator
    pub search_input: String,
    pub busy: bool,
    /// When set, the search field is showing rejected-download text and
    /// reverts to empty at this deadline. A newer rejection replaces both
    /// the text and the deadline.
    pub search_echo_until: Option<Instant>,
    // Progress (always the latest snapshot, never merged)
    pub snapshot: ProgressSnapshot,
    pub table_state: TableState,
    /// Identity (artist, title) of the selected row. Selection follows the
    /// track across snapshot rebuilds, not the on-screen position.
    pub selected_identity: Option<(String, String)>,
    // Settings panel
    pub settings: SettingsForm,
    pub save_banner_until: Option<Instant>,
    // Theme
    pub theme: Theme,
    pub switch_position: bool,
    pub prefs_path: PathBuf,
    // Outbound commands
    pub cmd_tx: mpsc::UnboundedSender<Command>,
}

impl App {
    pub fn new(
        server: String,
        cmd_tx: mpsc::UnboundedSender<Command>,
        prefs: Prefs,
        prefs_path: PathBuf,
    ) -> Self {
        Self {
            server,
            should_quit: false,
            popup: Popup::None,
            search_input: String::new(),
            busy: false,
            search_echo_until: None,
            snapshot: ProgressSnapshot::default(),
            table_state: TableState::default(),
            selected_identity: None,
            settings: SettingsForm::new(),
            save_banner_until: None,
            theme: prefs.theme,
            switch_position: prefs.switch_position,
            prefs_path,
            cmd_tx,
        }
    }

    /// Queues a command for the channel. Fire-and-forget.
    pub fn emit(&self, command: Command) {
        let _ = self.cmd_tx.send(command);
    }

    /// Submits the current search text as a download request and shows the
    /// busy indicator before any response arrives.
    pub fn submit_download(&mut self) {
        self.emit(Command::download(self.search_input.clone()));
        self.busy = true;
    }

    /// Opens the settings panel: requests the current settings and arms the
    /// one-shot populate.
    pub fn open_settings(&mut self) {
        self.popup = Popup::Settings;
        self.settings.active_field = 0;
        self.settings.awaiting_load = true;
        self.emit(Command::LoadSettings);
    }

    /// Closes the panel. An armed populate stays armed so a late
    /// `settingsLoaded` still lands (and disarms) quietly.
    pub fn close_settings(&mut self) {
        self.popup = Popup::None;
    }

    /// Persists the current form fields and shows the confirmation banner.
    /// The update is assumed to succeed; no acknowledgment is awaited.
    pub fn save_settings(&mut self, now: Instant) {
        self.emit(Command::UpdateSettings(self.settings.fields.clone()));
        self.save_banner_until = Some(now + SAVE_BANNER);
    }

    /// Replaces the visible progress with a new snapshot. Selection is
    /// re-resolved by track identity; if the track is gone the selection
    /// clamps to the new length.
    pub fn apply_snapshot(&mut self, snapshot: ProgressSnapshot) {
        self.snapshot = snapshot;

        if self.snapshot.data.is_empty() {
            self.table_state.select(None);
            self.selected_identity = None;
            return;
        }

        let resolved = self.selected_identity.as_ref().and_then(|(artist, title)| {
            self.snapshot
                .data
                .iter()
                .position(|t| t.artist == *artist && t.title == *title)
        });

        match resolved {
            Some(index) => self.table_state.select(Some(index)),
            None => {
                if let Some(selected) = self.table_state.selected() {
                    let clamped = selected.min(self.snapshot.data.len() - 1);
                    self.table_state.select(Some(clamped));
                    self.capture_identity(clamped);
                }
            }
        }
    }

    pub fn select_next(&mut self) {
        let len = self.snapshot.data.len();
        if len == 0 {
            return;
        }
        let next = self
            .table_state
            .selected()
            .map_or(0, |i| (i + 1) % len);
        self.table_state.select(Some(next));
        self.capture_identity(next);
    }

    pub fn select_prev(&mut self) {
        let len = self.snapshot.data.len();
        if len == 0 {
            return;
        }
        let prev = self
            .table_state
            .selected()
            .map_or(len - 1, |i| if i == 0 { len - 1 } else { i - 1 });
        self.table_state.select(Some(prev));
        self.capture_identity(prev);
    }

    fn capture_identity(&mut self, index: usize) {
        self.selected_identity = self
            .snapshot
            .data
            .get(index)
            .map(|t| (t.artist.clone(), t.title.clone()));
    }

    /// Emits removal of the selected row. The index sent over the wire is
    /// the row's position in the most recent snapshot, resolved at command
    /// time, so an intervening rebuild cannot retarget the removal.
    pub fn remove_selected(&mut self) {
        if let Some(index) = self.table_state.selected()
            && index < self.snapshot.data.len()
        {
            self.emit(Command::RemoveTrack(index));
        }
    }

    /// Flips the theme and the switch, persisting both so a relaunch
    /// reproduces them.
    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.flipped();
        self.switch_position = !self.switch_position;
        let prefs = Prefs {
            theme: self.theme,
            switch_position: self.switch_position,
        };
        if let Err(e) = prefs.save(&self.prefs_path) {
            log::warn!("failed to persist preferences: {e}");
        }
    }

    /// Expires deadline-driven UI state. Called once per loop iteration.
    pub fn tick(&mut self, now: Instant) {
        if self.search_echo_until.is_some_and(|t| now >= t) {
            self.search_input.clear();
            self.search_echo_until = None;
        }
        if self.save_banner_until.is_some_and(|t| now >= t) {
            self.save_banner_until = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{QueueStatus, TrackProgress, TrackStatus};
    use tokio::sync::mpsc;

    fn test_app() -> (App, mpsc::UnboundedReceiver<Command>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = App::new(
            "http://127.0.0.1:5000".to_string(),
            tx,
            Prefs::default(),
            PathBuf::from("/nonexistent/prefs.toml"),
        );
        (app, rx)
    }

    fn track(artist: &str, title: &str) -> TrackProgress {
        TrackProgress {
            artist: artist.to_string(),
            title: title.to_string(),
            status: TrackStatus::Queued,
            percent_downloaded: 0.0,
        }
    }

    fn snapshot(tracks: Vec<TrackProgress>) -> ProgressSnapshot {
        ProgressSnapshot {
            data: tracks,
            percent_completion: 0.0,
            status: QueueStatus::Running,
        }
    }

    #[test]
    fn initial_state() {
        let (app, _rx) = test_app();
        assert_eq!(app.popup, Popup::None);
        assert!(!app.should_quit);
        assert!(!app.busy);
        assert!(app.search_input.is_empty());
        assert!(app.snapshot.data.is_empty());
        assert_eq!(app.table_state.selected(), None);
    }

    #[test]
    fn submit_download_sends_link_and_sets_busy() {
        let (mut app, mut rx) = test_app();
        app.search_input = "spotify:track:1".to_string();
        app.submit_download();
        assert!(app.busy);
        assert_eq!(rx.try_recv().unwrap(), Command::download("spotify:track:1"));
    }

    #[test]
    fn open_settings_requests_load_and_arms_populate() {
        let (mut app, mut rx) = test_app();
        app.open_settings();
        assert_eq!(app.popup, Popup::Settings);
        assert!(app.settings.awaiting_load);
        assert_eq!(rx.try_recv().unwrap(), Command::LoadSettings);
    }

    #[test]
    fn save_settings_emits_fields_and_shows_banner() {
        let (mut app, mut rx) = test_app();
        app.settings.fields.spotify_client_id = "id".to_string();
        let now = Instant::now();
        app.save_settings(now);
        assert_eq!(app.save_banner_until, Some(now + SAVE_BANNER));
        match rx.try_recv().unwrap() {
            Command::UpdateSettings(fields) => assert_eq!(fields.spotify_client_id, "id"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn snapshot_replaces_rows_wholesale() {
        let (mut app, _rx) = test_app();
        app.apply_snapshot(snapshot(vec![track("A", "1"), track("B", "2")]));
        assert_eq!(app.snapshot.data.len(), 2);

        app.apply_snapshot(snapshot(vec![track("C", "3")]));
        assert_eq!(app.snapshot.data.len(), 1);
        assert_eq!(app.snapshot.data[0].artist, "C");
    }

    #[test]
    fn selection_follows_track_identity_across_rebuilds() {
        let (mut app, _rx) = test_app();
        app.apply_snapshot(snapshot(vec![track("A", "1"), track("B", "2"), track("C", "3")]));
        app.select_next(); // A
        app.select_next(); // B
        assert_eq!(app.table_state.selected(), Some(1));

        // B moves to the front in the next snapshot.
        app.apply_snapshot(snapshot(vec![track("B", "2"), track("A", "1")]));
        assert_eq!(app.table_state.selected(), Some(0));
    }

    #[test]
    fn selection_clamps_when_track_disappears() {
        let (mut app, _rx) = test_app();
        app.apply_snapshot(snapshot(vec![track("A", "1"), track("B", "2"), track("C", "3")]));
        app.select_prev(); // wraps to C (index 2)
        assert_eq!(app.table_state.selected(), Some(2));

        app.apply_snapshot(snapshot(vec![track("A", "1")]));
        assert_eq!(app.table_state.selected(), Some(0));
    }

    #[test]
    fn selection_cleared_on_empty_snapshot() {
        let (mut app, _rx) = test_app();
        app.apply_snapshot(snapshot(vec![track("A", "1")]));
        app.select_next();
        app.apply_snapshot(snapshot(vec![]));
        assert_eq!(app.table_state.selected(), None);
        assert_eq!(app.selected_identity, None);
    }

    #[test]
    fn remove_selected_emits_position_in_latest_snapshot() {
        let (mut app, mut rx) = test_app();
        app.apply_snapshot(snapshot(vec![track("A", "1"), track("B", "2")]));
        app.select_next();
        app.select_next(); // B at index 1
        app.apply_snapshot(snapshot(vec![track("B", "2"), track("A", "1")]));

        app.remove_selected();
        assert_eq!(rx.try_recv().unwrap(), Command::RemoveTrack(0));
    }

    #[test]
    fn remove_with_no_selection_is_a_no_op() {
        let (mut app, mut rx) = test_app();
        app.remove_selected();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn tick_expires_error_echo_exactly_once() {
        let (mut app, _rx) = test_app();
        let now = Instant::now();
        app.search_input = "no results found".to_string();
        app.search_echo_until = Some(now + ERROR_ECHO);

        app.tick(now + ERROR_ECHO - Duration::from_millis(1));
        assert_eq!(app.search_input, "no results found");

        app.tick(now + ERROR_ECHO);
        assert!(app.search_input.is_empty());
        assert_eq!(app.search_echo_until, None);
    }

    #[test]
    fn tick_expires_save_banner() {
        let (mut app, _rx) = test_app();
        let now = Instant::now();
        app.save_banner_until = Some(now + SAVE_BANNER);
        app.tick(now + SAVE_BANNER);
        assert_eq!(app.save_banner_until, None);
    }

    #[test]
    fn newer_error_echo_replaces_deadline() {
        let (mut app, _rx) = test_app();
        let now = Instant::now();
        app.search_input = "first error".to_string();
        app.search_echo_until = Some(now + ERROR_ECHO);

        // A second rejection lands 1s later; the field must survive past the
        // first deadline and clear at the second.
        let later = now + Duration::from_secs(1);
        app.search_input = "second error".to_string();
        app.search_echo_until = Some(later + ERROR_ECHO);

        app.tick(now + ERROR_ECHO);
        assert_eq!(app.search_input, "second error");
        app.tick(later + ERROR_ECHO);
        assert!(app.search_input.is_empty());
    }

    #[test]
    fn settings_form_field_cycling_and_editing() {
        let mut form = SettingsForm::new();
        assert_eq!(SettingsForm::field_count(), 4);

        form.active_field = 0;
        form.active_value_mut().push_str("id");
        form.active_field = 1;
        form.active_value_mut().push_str("secret");
        form.active_field = 2;
        form.active_value_mut().push_str("5");
        form.active_field = 3;
        form.active_value_mut().push_str("remix");

        assert_eq!(form.fields.spotify_client_id, "id");
        assert_eq!(form.fields.spotify_client_secret, "secret");
        assert_eq!(form.fields.sleep_interval, "5");
        assert_eq!(form.fields.ignored_keywords, "remix");
    }

    #[test]
    fn settings_field_labels_and_masking() {
        assert_eq!(SettingsField::ClientId.label(), "Spotify client id");
        assert!(SettingsField::ClientSecret.masked());
        assert!(!SettingsField::SleepInterval.masked());
    }

    #[test]
    fn toggle_theme_flips_both_keys() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("prefs.toml");
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(
            "http://localhost:5000".to_string(),
            tx,
            Prefs::default(),
            path.clone(),
        );

        app.toggle_theme();
        assert_eq!(app.theme, Theme::Dark);
        assert!(app.switch_position);

        // A fresh launch reads back what the toggle persisted.
        let reloaded = Prefs::load_or_default(&path);
        assert_eq!(reloaded.theme, Theme::Dark);
        assert!(reloaded.switch_position);

        app.toggle_theme();
        assert_eq!(Prefs::load_or_default(&path).theme, Theme::Light);
    }
}
