//! Server event handling.

use std::time::Instant;

use crate::protocol::{DownloadResponse, ServerEvent, SettingsPayload};

use super::app::{App, ERROR_ECHO};

/// Applies one inbound server event to the UI state.
pub fn handle_server_event(app: &mut App, event: ServerEvent, now: Instant) {
    match event {
        ServerEvent::Download(response) => handle_download_response(app, &response, now),
        ServerEvent::SettingsLoaded(settings) => handle_settings_loaded(app, settings),
        ServerEvent::Progress(snapshot) => app.apply_snapshot(snapshot),
    }
}

/// Paired response to a `download` command.
///
/// Success clears the search field; rejection echoes the server's error text
/// there until the fixed delay runs out. Either way the busy indicator goes
/// away.
fn handle_download_response(app: &mut App, response: &DownloadResponse, now: Instant) {
    app.busy = false;
    if response.is_success() {
        app.search_input.clear();
        app.search_echo_until = None;
    } else {
        log::warn!("download request rejected: {}", response.error_text());
        app.search_input = response.error_text().to_string();
        app.search_echo_until = Some(now + ERROR_ECHO);
    }
}

/// One-shot populate of the settings form. Events arriving while the form
/// is not armed are dropped so repeated panel opens never double-fill.
fn handle_settings_loaded(app: &mut App, settings: SettingsPayload) {
    if app.settings.awaiting_load {
        app.settings.fields = settings;
        app.settings.awaiting_load = false;
    } else {
        log::debug!("dropping settingsLoaded with no open request");
    }
}
