//! Help overlay and the small modal dialogs.
//!
//! Each modal erases its area with `Clear` before drawing, inside the same
//! `terminal.draw()` closure as the screen beneath it.

use ratatui::{
    layout::Constraint,
    style::{Modifier, Style},
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{AppState, Exit};
use crate::theme::Theme;

/// Renders the help overlay as a centred modal, scrolled by `help_scroll` rows.
///
/// Skipped on terminals narrower than 60 columns.
pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, help_scroll: u16) {
    if frame.area().width < 60 {
        return;
    }

    let overlay_area = frame
        .area()
        .centered(Constraint::Percentage(80), Constraint::Percentage(80));
    frame.render_widget(Clear, overlay_area);

    let block = Block::bordered()
        .title(" Help  (j/k scroll, ? or Esc to close) ")
        .border_style(Style::default().fg(theme.border_active));

    frame.render_widget(
        Paragraph::new(build_help_text(theme))
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((help_scroll, 0)),
        overlay_area,
    );
}

fn section(title: &'static str, theme: &Theme) -> Line<'static> {
    Line::styled(title, Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
}

fn build_help_text(theme: &Theme) -> Text<'static> {
    Text::from(vec![
        section("Everywhere", theme),
        Line::from("  j / k         Move selection or scroll"),
        Line::from("  Ctrl-d / u    Scroll half a page"),
        Line::from("  Esc           Back to menu (asks if a test is running)"),
        Line::from("  q             Quit"),
        Line::from("  ?             Open / close this help"),
        Line::from(""),
        section("Menu", theme),
        Line::from("  Enter         Open the highlighted screen"),
        Line::from("  1-6           Open a screen directly"),
        Line::from(""),
        section("Tests (GPE, Lecturette, Screening)", theme),
        Line::from("  Enter         Begin with the highlighted scenario or topic"),
        Line::from("  i             Type into the current stage (Esc to stop)"),
        Line::from("  a             Attach an audio or image file to transcribe"),
        Line::from("  s             Submit the stage"),
        Line::from("  n             Skip a skippable stage"),
        Line::from("  t             Start, pause, or resume a preparation timer"),
        Line::from("  r             Restart the test"),
        Line::from(""),
        section("Group Planning Exercise", theme),
        Line::from("  v             Have the GTO read the briefing (saved as WAV)"),
        Line::from("  p             Post your draft as a counter-point"),
        Line::from(""),
        section("OIR stages", theme),
        Line::from("  1-4           Choose an option and move on"),
        Line::from("  h / l         Previous / next question"),
        Line::from(""),
        section("Briefing and Reports", theme),
        Line::from("  R             Reload"),
        Line::from("  r             Retry the highlighted pending report"),
        Line::from("  Enter         Show / hide the report's evaluation"),
        Line::from(""),
        Line::from("Timers expire on their own: the stage moves on with whatever you"),
        Line::from("have written, even if that is nothing."),
    ])
}

/// Renders the y/n dialog for abandoning a test.
pub fn render_confirm_quit(frame: &mut Frame, state: &AppState, theme: &Theme) {
    let area = frame
        .area()
        .centered(Constraint::Length(48), Constraint::Length(5));
    frame.render_widget(Clear, area);

    let question = match state.pending_exit {
        Exit::Menu => "Abandon the test in progress?",
        Exit::App => "A test is in progress. Quit anyway?",
        Exit::Restart => "Discard this attempt and start over?",
    };
    let block = Block::bordered()
        .title(" Confirm ")
        .border_style(Style::default().fg(theme.timer_warn));
    frame.render_widget(
        Paragraph::new(vec![
            Line::from(question),
            Line::from(""),
            Line::styled("y  yes     n / Esc  no", Style::default().fg(theme.muted)),
        ])
        .block(block),
        area,
    );
}
