//! Layout arithmetic and the chrome shared by every screen.
//!
//! Pure functions of the frame size and state; called inside `terminal.draw()` on
//! every render so each frame reflects the current terminal size.

use ratatui::{
    layout::{Constraint, Layout, Margin, Rect, Spacing},
    style::{Modifier, Style},
    symbols::merge::MergeStrategy,
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph},
    Frame,
};

use crate::app::{AppState, Mode};
use crate::theme::Theme;

/// Returns `[header, body, status_bar]` for the current frame.
pub fn compute_layout(frame: &Frame) -> [Rect; 3] {
    frame.area().layout(&Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ]))
}

/// Splits `area` into a left list column and a right detail column.
///
/// Below 100 columns the list takes a larger share so titles stay readable.
pub fn split_list_detail(area: Rect) -> [Rect; 2] {
    let list_pct = if area.width >= 100 { 35 } else { 45 };
    area.layout(
        &Layout::horizontal([
            Constraint::Percentage(list_pct),
            Constraint::Percentage(100 - list_pct),
        ])
        .spacing(Spacing::Overlap(1)),
    )
}

/// The inner `Rect` of a panel after removing the 1-cell border on each side.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin {
        vertical: 1,
        horizontal: 1,
    })
}

/// Builds a bordered `Block` for a panel.
///
/// Focused panels get a thick border in the active color. `MergeStrategy::Fuzzy`
/// joins adjacent thick and plain borders cleanly.
pub fn panel_block<'a>(title: impl Into<Line<'a>>, is_focused: bool, theme: &Theme) -> Block<'a> {
    let border_style = if is_focused {
        Style::default().fg(theme.border_active)
    } else {
        Style::default().fg(theme.border_inactive)
    };
    let border_type = if is_focused { BorderType::Thick } else { BorderType::Plain };

    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(border_style)
        .merge_borders(MergeStrategy::Fuzzy)
}

/// Renders the 1-row header: app name, screen title, and the loading indicator.
pub fn render_header(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let mut spans = vec![
        Span::styled(" SSB Prep ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
        Span::styled("│ ", Style::default().fg(theme.muted)),
        Span::styled(state.screen.title(), Style::default().fg(theme.text)),
    ];
    if state.active_session().is_some_and(|s| s.is_loading())
        || state.briefing_loading()
        || state.reports_loading()
    {
        spans.push(Span::styled("  working...", Style::default().fg(theme.muted)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Renders the 1-row status bar: mode badge, countdown, and the status message.
///
/// `HelpOverlay` and `ConfirmQuit` show `NORMAL`: they are transient layers over
/// normal mode, not editing modes.
pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let (mode_text, mode_fg) = match state.mode {
        Mode::Insert => (" INSERT ", theme.status_mode_insert),
        Mode::PathPrompt => (" ATTACH ", theme.status_mode_prompt),
        Mode::Normal | Mode::ConfirmQuit | Mode::HelpOverlay => {
            (" NORMAL ", theme.status_mode_normal)
        }
    };

    let mut spans = vec![Span::styled(
        mode_text,
        Style::default().fg(mode_fg).add_modifier(Modifier::BOLD),
    )];

    if let Some(countdown) = state.active_session().and_then(|s| s.countdown()) {
        let paused = countdown.has_started() && !countdown.is_running() && !countdown.is_expired();
        let label = if paused {
            format!(" {} (paused) ", countdown.display())
        } else {
            format!(" {} ", countdown.display())
        };
        spans.push(Span::styled(
            label,
            Style::default()
                .fg(theme.timer_color(countdown.remaining(), countdown.total()))
                .add_modifier(Modifier::BOLD),
        ));
    }

    let message = match state.mode {
        Mode::PathPrompt => format!(" file: {}▏", state.path_input),
        _ => state
            .status
            .as_deref()
            .map(|s| format!(" {s}"))
            .unwrap_or_else(|| " ? help".to_owned()),
    };
    spans.push(Span::raw(message));

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg)),
        area,
    );
}
