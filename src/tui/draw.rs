//! All drawing / rendering functions.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Gauge, Paragraph, Row, Table};

use crate::prefs::Theme;
use crate::protocol::QueueStatus;

use super::app::{App, Popup, SettingsField};

/// Theme-dependent base colors.
struct Palette {
    fg: Color,
    dim: Color,
    accent: Color,
}

const fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => Palette {
            fg: Color::White,
            dim: Color::DarkGray,
            accent: Color::Cyan,
        },
        Theme::Light => Palette {
            fg: Color::Black,
            dim: Color::Gray,
            accent: Color::Blue,
        },
    }
}

/// Fixed queue-status styling for the aggregate bar. `None` means no status
/// styling applies and the bar falls back to the theme default.
pub(crate) const fn gauge_color(status: QueueStatus) -> Option<Color> {
    match status {
        QueueStatus::Running => Some(Color::Green),
        QueueStatus::Stopped => Some(Color::Red),
        QueueStatus::Idle => Some(Color::Blue),
        QueueStatus::Complete => Some(Color::DarkGray),
        QueueStatus::Unknown => None,
    }
}

pub fn draw(frame: &mut ratatui::Frame, app: &mut App) {
    draw_main(frame, app);
    if app.popup == Popup::Settings {
        draw_settings_popup(frame, app);
    }
}

fn draw_main(frame: &mut ratatui::Frame, app: &mut App) {
    let colors = palette(app.theme);
    let area = frame.area();

    let outer = Block::default()
        .title(" spindl ")
        .title_alignment(Alignment::Left)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.accent));
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    // Server address in the top border, right-aligned
    let title_right = format!(" {} ", app.server);
    let right_x = area
        .x
        .saturating_add(area.width)
        .saturating_sub(u16::try_from(title_right.len()).unwrap_or(u16::MAX) + 1);
    if right_x > area.x + 1 {
        frame.render_widget(
            Paragraph::new(title_right).style(Style::default().fg(colors.dim)),
            Rect::new(
                right_x,
                area.y,
                area.width.saturating_sub(right_x - area.x),
                1,
            ),
        );
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Search / link input
            Constraint::Length(3), // Aggregate progress bar
            Constraint::Min(5),    // Progress table
            Constraint::Length(1), // Controls bar
        ])
        .split(inner);

    draw_search_bar(frame, app, &colors, chunks[0]);
    draw_progress_gauge(frame, app, &colors, chunks[1]);
    draw_progress_table(frame, app, &colors, chunks[2]);

    let controls = "enter:download  c:clear queue  s:settings  t:theme  d:remove  q:quit";
    let controls_bar = Paragraph::new(controls)
        .style(Style::default().fg(colors.dim))
        .alignment(Alignment::Center);
    frame.render_widget(controls_bar, chunks[3]);
}

fn draw_search_bar(frame: &mut ratatui::Frame, app: &App, colors: &Palette, area: Rect) {
    let title = if app.busy {
        " Add link (sending...) "
    } else {
        " Add link "
    };
    // Echoed error text is styled like an error, normal input like input.
    let text_style = if app.search_echo_until.is_some() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(colors.fg)
    };
    let border_style = if app.popup == Popup::None {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(colors.dim)
    };
    let search = Paragraph::new(app.search_input.as_str())
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(border_style),
        )
        .style(text_style);
    frame.render_widget(search, area);
}

fn draw_progress_gauge(frame: &mut ratatui::Frame, app: &App, colors: &Palette, area: Rect) {
    let pct = app.snapshot.percent_completion;
    // Gauge requires a ratio within 0..=1
    let ratio = if pct.is_finite() {
        (pct / 100.0).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let mut style = Style::default().fg(gauge_color(app.snapshot.status).unwrap_or(colors.dim));
    if app.snapshot.status == QueueStatus::Running {
        style = style.add_modifier(Modifier::BOLD);
    }

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(style)
        .ratio(ratio)
        .label(format!("{pct}%"));
    frame.render_widget(gauge, area);
}

fn draw_progress_table(frame: &mut ratatui::Frame, app: &mut App, colors: &Palette, area: Rect) {
    let header = Row::new(vec!["Artist", "Title", "Status"]).style(
        Style::default()
            .fg(colors.accent)
            .add_modifier(Modifier::BOLD),
    );

    // Rebuilt from the latest snapshot every frame; rows are never reused.
    let rows: Vec<Row> = app
        .snapshot
        .data
        .iter()
        .map(|track| {
            Row::new(vec![
                Cell::from(track.artist.clone()),
                Cell::from(track.title.clone()),
                Cell::from(track.status_text()),
            ])
            .style(Style::default().fg(colors.fg))
        })
        .collect();

    let widths = [
        Constraint::Percentage(30),
        Constraint::Percentage(45),
        Constraint::Percentage(25),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_stateful_widget(table, area, &mut app.table_state);
}

fn draw_settings_popup(frame: &mut ratatui::Frame, app: &App) {
    let colors = palette(app.theme);
    let area = centered_rect(52, 15, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Settings ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.accent));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1), // Banner / help
        ])
        .split(inner);

    let values = [
        &app.settings.fields.spotify_client_id,
        &app.settings.fields.spotify_client_secret,
        &app.settings.fields.sleep_interval,
        &app.settings.fields.ignored_keywords,
    ];

    for (i, field) in SettingsField::ALL.iter().enumerate() {
        let is_active = app.settings.active_field == i;
        let border_style = if is_active {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(colors.fg)
        };

        let display_value = if field.masked() && !values[i].is_empty() {
            "*".repeat(values[i].len())
        } else {
            values[i].clone()
        };

        let input = Paragraph::new(display_value)
            .block(
                Block::default()
                    .title(format!(" {} ", field.label()))
                    .borders(Borders::ALL)
                    .border_style(border_style),
            )
            .style(Style::default().fg(colors.fg));
        frame.render_widget(input, chunks[i]);
    }

    if app.save_banner_until.is_some() {
        let banner =
            Paragraph::new(" Settings saved").style(Style::default().fg(Color::Green));
        frame.render_widget(banner, chunks[4]);
    } else {
        let help = Paragraph::new(" Tab: next | Enter: save | Esc: close")
            .style(Style::default().fg(colors.dim));
        frame.render_widget(help, chunks[4]);
    }
}

/// Returns a centered rectangle of the given size within `area`.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gauge_colors_follow_status_map() {
        assert_eq!(gauge_color(QueueStatus::Running), Some(Color::Green));
        assert_eq!(gauge_color(QueueStatus::Stopped), Some(Color::Red));
        assert_eq!(gauge_color(QueueStatus::Idle), Some(Color::Blue));
        assert_eq!(gauge_color(QueueStatus::Complete), Some(Color::DarkGray));
        assert_eq!(gauge_color(QueueStatus::Unknown), None);
    }

    #[test]
    fn centered_rect_fits_inside_area() {
        let area = Rect::new(0, 0, 100, 40);
        let rect = centered_rect(52, 15, area);
        assert!(rect.x + rect.width <= 100);
        assert!(rect.y + rect.height <= 40);
        assert_eq!(rect.width, 52);
    }

    #[test]
    fn centered_rect_clamps_to_small_terminal() {
        let area = Rect::new(0, 0, 30, 8);
        let rect = centered_rect(52, 15, area);
        assert_eq!(rect.width, 30);
        assert_eq!(rect.height, 8);
    }
}
