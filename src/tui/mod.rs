//! Interactive terminal UI.
//!
//! One cooperative event loop: terminal input, decoded server events and
//! deadline timers are all serviced between frames. Handlers run to
//! completion; nothing blocks.

mod app;
mod draw;
mod input;
mod update;

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::Event;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;

use crate::Result;
use crate::channel::Channel;
use crate::prefs::Prefs;

use self::app::App;
use self::draw::draw;
use self::input::{handle_input, handle_paste};
use self::update::handle_server_event;

/// RAII guard that ensures terminal cleanup on drop.
/// Restores terminal to normal mode even if a panic occurs.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        crossterm::execute!(
            io::stdout(),
            EnterAlternateScreen,
            crossterm::event::EnableBracketedPaste
        )?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = crossterm::execute!(
            io::stdout(),
            crossterm::event::DisableBracketedPaste,
            LeaveAlternateScreen
        );
    }
}

/// Runs the interactive TUI against the given server base URL.
///
/// # Errors
///
/// Returns an error if the channel cannot be set up or terminal I/O fails.
pub async fn run(server: &str) -> Result<()> {
    let (channel, mut event_rx) = Channel::connect(server)?;
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel();

    let prefs_path = Prefs::default_path();
    let prefs = Prefs::load_or_default(&prefs_path);
    let mut app = App::new(channel.base().to_string(), cmd_tx, prefs, prefs_path);

    // Initialize terminal with RAII guard for automatic cleanup
    let _terminal_guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    loop {
        terminal.draw(|f| draw(f, &mut app))?;

        // Poll for terminal events with 100ms timeout
        if crossterm::event::poll(Duration::from_millis(100))? {
            match crossterm::event::read()? {
                Event::Key(key) => handle_input(&mut app, key, Instant::now()),
                Event::Paste(text) => handle_paste(&mut app, &text),
                _ => {}
            }
        }

        // Drain server events (non-blocking)
        while let Ok(event) = event_rx.try_recv() {
            handle_server_event(&mut app, event, Instant::now());
        }

        // Forward queued commands to the channel
        while let Ok(command) = cmd_rx.try_recv() {
            channel.emit(command);
        }

        app.tick(Instant::now());

        if app.should_quit {
            break;
        }
    }

    terminal.show_cursor()?;
    Ok(())
}
