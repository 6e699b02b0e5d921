//! Keyboard and paste input handling.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::protocol::Command;

use super::app::{App, Popup, SettingsForm};

pub fn handle_input(app: &mut App, key: KeyEvent, now: Instant) {
    // Global quit
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.popup {
        Popup::Settings => handle_settings_input(app, key, now),
        Popup::None => handle_main_input(app, key),
    }
}

fn handle_main_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            // Sent as-is; the server is the one that validates links.
            app.submit_download();
        }
        KeyCode::Char('c') if app.search_input.is_empty() => {
            app.emit(Command::Clear);
        }
        KeyCode::Char('s') if app.search_input.is_empty() => {
            app.open_settings();
        }
        KeyCode::Char('t') if app.search_input.is_empty() => {
            app.toggle_theme();
        }
        KeyCode::Char('d') | KeyCode::Delete if app.search_input.is_empty() => {
            app.remove_selected();
        }
        KeyCode::Char('q') if app.search_input.is_empty() => {
            app.should_quit = true;
        }
        KeyCode::Up if app.search_input.is_empty() => {
            app.select_prev();
        }
        KeyCode::Down if app.search_input.is_empty() => {
            app.select_next();
        }
        KeyCode::Esc => {
            if app.search_input.is_empty() {
                app.should_quit = true;
            } else {
                app.search_input.clear();
                app.search_echo_until = None;
            }
        }
        KeyCode::Char(c) => {
            app.search_input.push(c);
        }
        KeyCode::Backspace => {
            app.search_input.pop();
        }
        _ => {}
    }
}

fn handle_settings_input(app: &mut App, key: KeyEvent, now: Instant) {
    match key.code {
        KeyCode::Tab | KeyCode::Down => {
            app.settings.active_field =
                (app.settings.active_field + 1) % SettingsForm::field_count();
        }
        KeyCode::BackTab | KeyCode::Up => {
            app.settings.active_field = if app.settings.active_field == 0 {
                SettingsForm::field_count() - 1
            } else {
                app.settings.active_field - 1
            };
        }
        KeyCode::Enter => {
            app.save_settings(now);
        }
        KeyCode::Esc => {
            app.close_settings();
        }
        KeyCode::Char(c) => {
            app.settings.active_value_mut().push(c);
        }
        KeyCode::Backspace => {
            app.settings.active_value_mut().pop();
        }
        _ => {}
    }
}

pub fn handle_paste(app: &mut App, text: &str) {
    match app.popup {
        Popup::Settings => {
            app.settings.active_value_mut().push_str(text.trim());
        }
        Popup::None => {
            // Pasted links often come with trailing newlines
            app.search_input
                .push_str(&text.replace(['\n', '\r'], " "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::Prefs;
    use crate::protocol::{ProgressSnapshot, QueueStatus, TrackProgress, TrackStatus};
    use crossterm::event::{KeyEventKind, KeyEventState};
    use std::path::PathBuf;
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

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_input(app, key(code), Instant::now());
    }

    #[test]
    fn quit_on_q_when_search_empty() {
        let (mut app, _rx) = test_app();
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn q_types_into_nonempty_search() {
        let (mut app, _rx) = test_app();
        app.search_input = "spoti".to_string();
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
        assert_eq!(app.search_input, "spotiq");
    }

    #[test]
    fn ctrl_c_always_quits() {
        let (mut app, _rx) = test_app();
        app.search_input = "typing".to_string();
        handle_input(
            &mut app,
            KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                kind: KeyEventKind::Press,
                state: KeyEventState::NONE,
            },
            Instant::now(),
        );
        assert!(app.should_quit);
    }

    #[test]
    fn enter_submits_download_and_shows_busy() {
        let (mut app, mut rx) = test_app();
        app.search_input = "https://open.spotify.com/track/x".to_string();
        press(&mut app, KeyCode::Enter);
        assert!(app.busy);
        assert_eq!(
            rx.try_recv().unwrap(),
            Command::download("https://open.spotify.com/track/x")
        );
    }

    #[test]
    fn clear_key_emits_clear_command() {
        let (mut app, mut rx) = test_app();
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(rx.try_recv().unwrap(), Command::Clear);
    }

    #[test]
    fn theme_key_flips_theme() {
        let (mut app, _rx) = test_app();
        let before = app.theme;
        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.theme, before.flipped());
    }

    #[test]
    fn delete_key_removes_selected_row() {
        let (mut app, mut rx) = test_app();
        app.apply_snapshot(ProgressSnapshot {
            data: vec![
                TrackProgress {
                    artist: "A".to_string(),
                    title: "1".to_string(),
                    status: TrackStatus::Queued,
                    percent_downloaded: 0.0,
                },
                TrackProgress {
                    artist: "B".to_string(),
                    title: "2".to_string(),
                    status: TrackStatus::Queued,
                    percent_downloaded: 0.0,
                },
            ],
            percent_completion: 0.0,
            status: QueueStatus::Running,
        });
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(rx.try_recv().unwrap(), Command::RemoveTrack(1));
    }

    #[test]
    fn esc_clears_search_before_quitting() {
        let (mut app, _rx) = test_app();
        app.search_input = "half-typed".to_string();
        press(&mut app, KeyCode::Esc);
        assert!(!app.should_quit);
        assert!(app.search_input.is_empty());

        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);
    }

    #[test]
    fn typing_and_backspace_edit_search() {
        let (mut app, _rx) = test_app();
        press(&mut app, KeyCode::Char('h'));
        press(&mut app, KeyCode::Char('i'));
        assert_eq!(app.search_input, "hi");
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.search_input, "h");
    }

    #[test]
    fn settings_tab_cycles_fields() {
        let (mut app, _rx) = test_app();
        app.open_settings();
        assert_eq!(app.settings.active_field, 0);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.settings.active_field, 1);
        press(&mut app, KeyCode::BackTab);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.settings.active_field, 3);
    }

    #[test]
    fn settings_typing_edits_active_field() {
        let (mut app, _rx) = test_app();
        app.open_settings();
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Char('b'));
        assert_eq!(app.settings.fields.spotify_client_id, "ab");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('z'));
        assert_eq!(app.settings.fields.spotify_client_secret, "z");
    }

    #[test]
    fn settings_enter_saves_and_keeps_panel_open() {
        let (mut app, mut rx) = test_app();
        app.open_settings();
        let _ = rx.try_recv(); // loadSettings
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.popup, Popup::Settings);
        assert!(app.save_banner_until.is_some());
        assert!(matches!(
            rx.try_recv().unwrap(),
            Command::UpdateSettings(_)
        ));
    }

    #[test]
    fn settings_esc_closes_panel() {
        let (mut app, _rx) = test_app();
        app.open_settings();
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.popup, Popup::None);
    }

    #[test]
    fn paste_into_search_flattens_newlines() {
        let (mut app, _rx) = test_app();
        handle_paste(&mut app, "link1\nlink2");
        assert_eq!(app.search_input, "link1 link2");
    }

    #[test]
    fn paste_into_settings_trims() {
        let (mut app, _rx) = test_app();
        app.open_settings();
        handle_paste(&mut app, "  client-id  ");
        assert_eq!(app.settings.fields.spotify_client_id, "client-id");
    }
}
