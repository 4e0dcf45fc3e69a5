// TUI module for rendering the terminal interface
pub mod input;

pub use input::{
    handle_history_input, handle_key_event, synthetic_gesture, HistoryKey, KeyAction,
    PICKER_DISTANCE, SWIPE_DISTANCE,
};

use crate::domain::{classify, Decision, DecisionStatistics, HistoryAction, HistoryFilter};
use crate::session::Session;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Gauge, Paragraph, Wrap},
    Frame,
};

pub const ACCENT_PRIMARY: Color = Color::Rgb(235, 87, 87);
pub const ACCENT_SECONDARY: Color = Color::Rgb(111, 207, 151);
pub const ACCENT_HIGHLIGHT: Color = Color::Rgb(242, 201, 76);
pub const ACCENT_FAVORITE: Color = Color::Rgb(187, 107, 217);
pub const TEXT_PRIMARY: Color = Color::Rgb(230, 230, 230);
pub const TEXT_SECONDARY: Color = Color::Rgb(140, 140, 150);
pub const BORDER_COLOR: Color = Color::Rgb(80, 80, 95);
pub const BG_DARK: Color = Color::Rgb(24, 24, 32);

/// Rows of the history overlay that can be undone by number
pub const HISTORY_ROWS: usize = 9;

/// UI view state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// Main swipe view
    Browsing,
    /// Help overlay visible
    Help,
    /// Decision history with the active filter
    History(HistoryFilter),
    /// Summary screen at end
    Summary,
    /// Welcome screen shown on first launch
    Welcome,
}

pub fn decision_color(decision: &Decision) -> Color {
    match decision {
        Decision::Trash => ACCENT_PRIMARY,
        Decision::Keep => ACCENT_SECONDARY,
        Decision::Favorite => ACCENT_FAVORITE,
        Decision::Hide => TEXT_SECONDARY,
        Decision::MoveToAlbum(_) => ACCENT_HIGHLIGHT,
    }
}

pub fn filter_label(filter: HistoryFilter) -> &'static str {
    match filter {
        HistoryFilter::All => "All",
        HistoryFilter::Trash => "Trash",
        HistoryFilter::Keep => "Keep",
        HistoryFilter::Favorite => "Favorite",
        HistoryFilter::Hide => "Hide",
        HistoryFilter::MoveToAlbum => "Moved",
    }
}

/// Renders the main view; `status` is the latest one-line message
pub fn render(frame: &mut Frame, session: &Session, status: Option<&str>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Header with progress
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(frame.area());

    render_header(frame, chunks[0], session);
    render_content(frame, chunks[1], session);
    render_footer(frame, chunks[2], status);
}

/// Renders the summary screen at the end
pub fn render_summary(frame: &mut Frame, stats: &DecisionStatistics) {
    let summary_area = centered_rect(60, 60, frame.area());
    frame.render_widget(Clear, summary_area);

    let block = Block::default()
        .title(" Session Complete ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT_HIGHLIGHT))
        .style(Style::default().bg(BG_DARK));

    let inner = block.inner(summary_area);
    frame.render_widget(block, summary_area);

    let row = |symbol: &'static str, label: &'static str, count: usize, color: Color| {
        Line::from(vec![
            Span::styled(symbol, Style::default().fg(color)),
            Span::raw(label),
            Span::styled(
                format!("{}", count),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
        ])
    };

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Summary",
            Style::default()
                .fg(TEXT_PRIMARY)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        row("   ", "Eligible:   ", stats.total_eligible, ACCENT_HIGHLIGHT),
        Line::from(""),
        row("   ✓ ", "Kept:     ", stats.kept, ACCENT_SECONDARY),
        row("   ✗ ", "Trashed:  ", stats.trashed, ACCENT_PRIMARY),
        row("   ★ ", "Favorite: ", stats.favorited, ACCENT_FAVORITE),
        row("   ◌ ", "Hidden:   ", stats.hidden, TEXT_SECONDARY),
        row("   ➜ ", "Moved:    ", stats.moved, ACCENT_HIGHLIGHT),
        row("   ○ ", "Remaining:", stats.remaining, TEXT_SECONDARY),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to exit",
            Style::default().fg(TEXT_SECONDARY),
        )),
    ];

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().fg(TEXT_PRIMARY));

    frame.render_widget(paragraph, inner);
}

/// Renders the help overlay
pub fn render_help_overlay(frame: &mut Frame) {
    let help_area = centered_rect(50, 70, frame.area());
    frame.render_widget(Clear, help_area);

    let block = Block::default()
        .title(" Help ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT_HIGHLIGHT))
        .style(Style::default().bg(BG_DARK));

    let inner = block.inner(help_area);
    frame.render_widget(block, help_area);

    let key = |keys: &'static str, color: Color, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<8}", keys), Style::default().fg(color)),
            Span::raw(what),
        ])
    };

    let help_lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .fg(ACCENT_HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        key("← / t", ACCENT_PRIMARY, "Trash"),
        key("→ / k", ACCENT_SECONDARY, "Keep"),
        key("↑ / f", ACCENT_FAVORITE, "Favorite"),
        key("↓ / h", TEXT_SECONDARY, "Hide"),
        key("1-9", ACCENT_HIGHLIGHT, "Move to destination album"),
        Line::from(""),
        key("u", ACCENT_HIGHLIGHT, "Undo last decision"),
        key("l", TEXT_SECONDARY, "History"),
        key("q / Esc", TEXT_SECONDARY, "Quit"),
        key("?", TEXT_SECONDARY, "Toggle help"),
        Line::from(""),
        Line::from(Span::styled(
            "Press ? or Esc to close",
            Style::default().fg(TEXT_SECONDARY),
        )),
    ];

    let paragraph = Paragraph::new(help_lines)
        .alignment(Alignment::Left)
        .style(Style::default().fg(TEXT_PRIMARY));

    frame.render_widget(paragraph, inner);
}

/// Renders the history overlay, newest first, numbered for undo
pub fn render_history_overlay(frame: &mut Frame, session: &Session, filter: HistoryFilter) {
    let area = centered_rect(70, 80, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(format!(" History: {} ", filter_label(filter)))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT_HIGHLIGHT))
        .style(Style::default().bg(BG_DARK));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let entries = session.history_view(filter);
    let mut lines = vec![Line::from("")];
    if entries.is_empty() {
        lines.push(Line::from(Span::styled(
            "  Nothing recorded yet",
            Style::default().fg(TEXT_SECONDARY),
        )));
    }

    for (row, entry) in entries.iter().take(HISTORY_ROWS).enumerate() {
        let decision = entry.action.decision();
        let label = match &entry.action {
            HistoryAction::KeptUnchanged => "Keep".to_string(),
            HistoryAction::Applied(decision) => decision.to_string(),
        };
        let mut spans = vec![
            Span::styled(format!("  {} ", row + 1), Style::default().fg(TEXT_SECONDARY)),
            Span::styled(
                format!("{:<24}", label),
                Style::default().fg(decision_color(&decision)),
            ),
            Span::styled(
                entry.asset_id().to_string(),
                Style::default().fg(TEXT_PRIMARY),
            ),
            Span::styled(
                format!("  {}", entry.recorded_at.format("%H:%M:%S")),
                Style::default().fg(TEXT_SECONDARY),
            ),
        ];
        if !session.history().is_live(entry) {
            spans.push(Span::styled(
                "  (reset)",
                Style::default().fg(TEXT_SECONDARY).add_modifier(Modifier::ITALIC),
            ));
        }
        lines.push(Line::from(spans));
    }

    if entries.len() > HISTORY_ROWS {
        lines.push(Line::from(Span::styled(
            format!("  … {} more", entries.len() - HISTORY_ROWS),
            Style::default().fg(TEXT_SECONDARY),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  1-9 undo  │  a t k f h m filter  │  Esc close",
        Style::default().fg(TEXT_SECONDARY),
    )));

    let paragraph = Paragraph::new(lines).style(Style::default().fg(TEXT_PRIMARY));
    frame.render_widget(paragraph, inner);
}

/// Renders the welcome dialog overlay
pub fn render_welcome_overlay(frame: &mut Frame) {
    let area = centered_rect(75, 70, frame.area());
    frame.render_widget(Clear, area);

    let welcome_lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Welcome to photoswipe!",
            Style::default()
                .fg(ACCENT_HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Go through your photos one at a time and decide with a single swipe."),
        Line::from("Photos you have already decided on are remembered between runs."),
        Line::from(""),
        Line::from(vec![
            Span::styled("  ←  ", Style::default().fg(ACCENT_PRIMARY)),
            Span::raw("collect in the Trash album"),
        ]),
        Line::from(vec![
            Span::styled("  →  ", Style::default().fg(ACCENT_SECONDARY)),
            Span::raw("keep as is"),
        ]),
        Line::from(vec![
            Span::styled("  ↑  ", Style::default().fg(ACCENT_FAVORITE)),
            Span::raw("mark as favorite"),
        ]),
        Line::from(vec![
            Span::styled("  ↓  ", Style::default().fg(TEXT_SECONDARY)),
            Span::raw("hide"),
        ]),
        Line::from(vec![
            Span::styled(" 1-9 ", Style::default().fg(ACCENT_HIGHLIGHT)),
            Span::raw("move into one of your destination albums"),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::raw("Nothing is deleted. Run with "),
            Span::styled("--dry-run", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" to try it without changing anything."),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to start...",
            Style::default()
                .fg(ACCENT_HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        )),
    ];

    let welcome = Paragraph::new(welcome_lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(ACCENT_HIGHLIGHT))
                .style(Style::default().bg(BG_DARK)),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    frame.render_widget(welcome, area);
}

/// Helper to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn render_header(frame: &mut Frame, area: Rect, session: &Session) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(2)])
        .split(area);

    let total = session.queue().total_eligible();
    let (title_text, info) = match session.current() {
        Some(item) => (
            format!(" Photo {}/{} ", session.display_position(), total),
            vec![
                Span::styled(
                    item.id.to_string(),
                    Style::default()
                        .fg(TEXT_PRIMARY)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                Span::styled(
                    item.asset.created_at.format("%Y-%m-%d %H:%M").to_string(),
                    Style::default().fg(TEXT_SECONDARY),
                ),
            ],
        ),
        None => (
            " photoswipe ".to_string(),
            vec![Span::styled(
                "Nothing left to review",
                Style::default().fg(TEXT_SECONDARY),
            )],
        ),
    };

    let header = Paragraph::new(vec![
        Line::from(Span::styled(
            title_text,
            Style::default()
                .fg(ACCENT_HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(info),
    ])
    .block(
        Block::default()
            .borders(Borders::TOP | Borders::LEFT | Borders::RIGHT)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(BORDER_COLOR)),
    );
    frame.render_widget(header, chunks[0]);

    let progress = session.progress();
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::BOTTOM | Borders::LEFT | Borders::RIGHT)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_COLOR)),
        )
        .gauge_style(Style::default().fg(ACCENT_SECONDARY).bg(BG_DARK))
        .ratio(progress)
        .label(format!(
            "{}% ({}/{})",
            (progress * 100.0) as u16,
            session.display_position(),
            total
        ));
    frame.render_widget(gauge, chunks[1]);
}

fn render_content(frame: &mut Frame, area: Rect, session: &Session) {
    let block = Block::default()
        .borders(Borders::LEFT | Borders::RIGHT)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR));

    if session.access_denied() {
        let denied = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "Access to the photo library was denied",
                Style::default()
                    .fg(ACCENT_PRIMARY)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Grant access and start again.",
                Style::default().fg(TEXT_SECONDARY),
            )),
        ])
        .block(block)
        .alignment(Alignment::Center);
        frame.render_widget(denied, area);
        return;
    }

    let Some(item) = session.current() else {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "All caught up",
                Style::default()
                    .fg(ACCENT_HIGHLIGHT)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Every photo here has been decided. Undo or reset to go again.",
                Style::default().fg(TEXT_SECONDARY),
            )),
        ])
        .block(block)
        .alignment(Alignment::Center);
        frame.render_widget(empty, area);
        return;
    };

    let offset = session.offset();
    let preview = classify(
        offset,
        session.picker().hover(),
        &session.settings().thresholds,
    );

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Location: ", Style::default().fg(TEXT_SECONDARY)),
            Span::styled(item.asset.locator.clone(), Style::default().fg(TEXT_PRIMARY)),
        ]),
        Line::from(vec![
            Span::styled("  Drag:     ", Style::default().fg(TEXT_SECONDARY)),
            Span::raw(format!("{:+.0}, {:+.0}", offset.dx, offset.dy)),
        ]),
    ];

    match (&preview, session.is_locked()) {
        (_, true) => lines.push(Line::from(Span::styled(
            "  Saving…",
            Style::default().fg(ACCENT_HIGHLIGHT),
        ))),
        (Some(decision), false) => lines.push(Line::from(vec![
            Span::styled("  Release:  ", Style::default().fg(TEXT_SECONDARY)),
            Span::styled(
                decision.to_string(),
                Style::default()
                    .fg(decision_color(decision))
                    .add_modifier(Modifier::BOLD),
            ),
        ])),
        (None, false) => {}
    }

    if !session.destinations().is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  Destinations",
            Style::default().fg(TEXT_SECONDARY),
        )));
        let hover = session.picker().hover();
        for (index, album) in session.destinations().iter().enumerate() {
            let style = if hover == Some(album) {
                Style::default()
                    .fg(ACCENT_HIGHLIGHT)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                Style::default().fg(TEXT_PRIMARY)
            };
            lines.push(Line::from(Span::styled(
                format!("  {} {}", index + 1, album),
                style,
            )));
        }
    }

    let card = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(card, area);
}

fn render_footer(frame: &mut Frame, area: Rect, status: Option<&str>) {
    let line = match status {
        Some(status) => Line::from(Span::styled(
            format!(" {} ", status),
            Style::default().fg(ACCENT_HIGHLIGHT),
        )),
        None => Line::from(vec![
            Span::styled(
                " ← ",
                Style::default()
                    .fg(ACCENT_PRIMARY)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("Trash", Style::default().fg(TEXT_SECONDARY)),
            Span::raw("  │  "),
            Span::styled(
                "→ ",
                Style::default()
                    .fg(ACCENT_SECONDARY)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("Keep", Style::default().fg(TEXT_SECONDARY)),
            Span::raw("  │  "),
            Span::styled("↑↓ ", Style::default().fg(ACCENT_FAVORITE)),
            Span::styled("Fav/Hide", Style::default().fg(TEXT_SECONDARY)),
            Span::raw("  │  "),
            Span::styled("u ", Style::default().fg(ACCENT_HIGHLIGHT)),
            Span::styled("Undo", Style::default().fg(TEXT_SECONDARY)),
            Span::raw("  │  "),
            Span::styled("? ", Style::default().fg(TEXT_SECONDARY)),
            Span::styled("Help", Style::default().fg(TEXT_SECONDARY)),
            Span::raw("  │  "),
            Span::styled("q ", Style::default().fg(TEXT_SECONDARY)),
            Span::styled("Quit", Style::default().fg(TEXT_SECONDARY)),
        ]),
    };

    let footer = Paragraph::new(line)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_COLOR)),
        )
        .alignment(Alignment::Center);

    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Asset, CollectionId, GestureUpdate, MemoryStore, Translation};
    use crate::session::SessionSettings;
    use chrono::{Duration, Utc};
    use ratatui::{backend::TestBackend, Terminal};

    fn session(ids: &[&str]) -> Session {
        let now = Utc::now();
        let assets = ids
            .iter()
            .enumerate()
            .map(|(i, id)| Asset::new(*id, format!("/photos/{}.jpg", id), now - Duration::minutes(i as i64)))
            .collect();
        let mut session = Session::new(Box::new(MemoryStore::new()), SessionSettings::default()).unwrap();
        session.rebuild(Ok(assets)).unwrap();
        session
    }

    fn draw(width: u16, height: u16, f: impl FnOnce(&mut Frame)) -> String {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(f).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    mod layout_tests {
        use super::*;

        #[test]
        fn test_render_empty_state() {
            let session = session(&[]);
            let buffer_str = draw(80, 24, |frame| render(frame, &session, None));
            assert!(buffer_str.contains("All caught up"));
            assert!(buffer_str.contains("Nothing left"));
        }

        #[test]
        fn test_header_shows_current_item() {
            let session = session(&["IMG_ZZ"]);
            let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
            terminal.draw(|frame| render(frame, &session, None)).unwrap();
            let rows: Vec<String> = terminal
                .backend()
                .buffer()
                .content()
                .chunks(60)
                .map(|row| row.iter().map(|c| c.symbol()).collect())
                .collect();
            assert!(rows[1].contains("Photo 1/1"));
            assert!(rows[2].contains("IMG_ZZ"));
        }

        #[test]
        fn test_render_with_photos() {
            let session = session(&["IMG_1.jpg", "IMG_2.jpg"]);
            let buffer_str = draw(80, 24, |frame| render(frame, &session, None));
            assert!(buffer_str.contains("IMG_1.jpg"));
            assert!(buffer_str.contains("Photo 1/2"));
        }

        #[test]
        fn test_render_footer() {
            let session = session(&["a"]);
            let buffer_str = draw(80, 24, |frame| render(frame, &session, None));
            assert!(buffer_str.contains("Trash"));
            assert!(buffer_str.contains("Keep"));
            assert!(buffer_str.contains("Quit"));

            let buffer_str = draw(80, 24, |frame| render(frame, &session, Some("Kept a")));
            assert!(buffer_str.contains("Kept a"));
        }

        #[test]
        fn test_render_header_progress() {
            let mut session = session(&["p1", "p2", "p3"]);
            let pending = session.commit(Decision::Keep).unwrap();
            session.settle_commit(pending, Ok(())).unwrap();

            let buffer_str = draw(80, 24, |frame| render(frame, &session, None));
            assert!(buffer_str.contains("Photo 2/3"));
            assert!(buffer_str.contains("p2"));
        }

        #[test]
        fn test_render_picker_and_release_preview() {
            let mut session = session(&["a"]);
            session.set_destination_albums(vec![CollectionId::new("Trips"), CollectionId::new("Pets")]);
            assert!(session.gesture_start());
            session.gesture_update(GestureUpdate::new(Translation::new(50.0, 0.0), 450.0, 600.0));

            let buffer_str = draw(80, 24, |frame| render(frame, &session, None));
            assert!(buffer_str.contains("Destinations"));
            assert!(buffer_str.contains("2 Pets"));
            assert!(buffer_str.contains("Move to album Pets"));
        }

        #[test]
        fn test_render_access_denied() {
            let mut session = session(&["a"]);
            session
                .rebuild(Err(crate::repository::RepositoryError::AccessDenied))
                .unwrap();
            let buffer_str = draw(80, 24, |frame| render(frame, &session, None));
            assert!(buffer_str.contains("denied"));
        }

        #[test]
        fn test_render_help_overlay() {
            let buffer_str = draw(80, 30, render_help_overlay);
            assert!(buffer_str.contains("Help"));
            assert!(buffer_str.contains("Keep"));
            assert!(buffer_str.contains("Favorite"));
        }

        #[test]
        fn test_render_history_overlay() {
            let mut session = session(&["a", "b"]);
            for decision in [Decision::Trash, Decision::Favorite] {
                let pending = session.commit(decision).unwrap();
                session.settle_commit(pending, Ok(())).unwrap();
            }

            let buffer_str = draw(100, 30, |frame| {
                render_history_overlay(frame, &session, HistoryFilter::All)
            });
            assert!(buffer_str.contains("History: All"));
            assert!(buffer_str.contains("1 Favorite"));
            assert!(buffer_str.contains("2 Trash"));

            let buffer_str = draw(100, 30, |frame| {
                render_history_overlay(frame, &session, HistoryFilter::Hide)
            });
            assert!(buffer_str.contains("Nothing recorded"));
        }

        #[test]
        fn test_render_summary() {
            let stats = DecisionStatistics {
                total_eligible: 10,
                remaining: 1,
                kept: 6,
                trashed: 3,
                ..DecisionStatistics::default()
            };
            let buffer_str = draw(80, 30, |frame| render_summary(frame, &stats));
            assert!(buffer_str.contains("Summary") || buffer_str.contains("Complete"));
        }

        #[test]
        fn test_render_welcome_overlay() {
            let buffer_str = draw(100, 40, render_welcome_overlay);
            assert!(buffer_str.contains("Welcome"));
        }
    }
}
