//! Widgets shared by the three test screens: stage bar with countdown, text
//! fields, selection lists, and the result view.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{LineGauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use ssbprep_core::evaluation::AssessmentResult;
use ssbprep_core::scoring::ScreeningStatus;
use ssbprep_core::sessions::Verdict;
use ssbprep_core::timer::Countdown;
use ssbprep_core::types::{DiscussionPoint, Speaker};

use crate::app::{AppState, Mode};
use crate::theme::Theme;
use crate::ui::layout::panel_block;

/// Splits a test screen into `[stage_bar, body]`.
pub fn split_stage(area: Rect) -> [Rect; 2] {
    area.layout(&Layout::vertical([Constraint::Length(2), Constraint::Fill(1)]))
}

/// Stage name with its step number, and a gauge of the time left below it.
pub fn render_stage_bar(
    frame: &mut Frame,
    area: Rect,
    stage: &str,
    step: (u8, u8),
    countdown: Option<&Countdown>,
    hints: &str,
    theme: &Theme,
) {
    let [title_row, gauge_row] = area.layout(&Layout::vertical([Constraint::Length(1); 2]));
    let title = Line::from(vec![
        Span::styled(
            format!(" {stage} "),
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("step {}/{}  ", step.0, step.1), Style::default().fg(theme.muted)),
        Span::styled(hints.to_owned(), Style::default().fg(theme.muted)),
    ]);
    frame.render_widget(Paragraph::new(title), title_row);

    let Some(c) = countdown else {
        return;
    };
    let ratio = if c.total() == 0 {
        0.0
    } else {
        f64::from(c.remaining()) / f64::from(c.total())
    };
    let label = if c.has_started() {
        c.display()
    } else {
        format!("{} (t to start)", c.display())
    };
    frame.render_widget(
        LineGauge::default()
            .ratio(ratio.clamp(0.0, 1.0))
            .label(label)
            .filled_style(Style::default().fg(theme.timer_color(c.remaining(), c.total())))
            .unfilled_style(Style::default().fg(theme.border_inactive)),
        gauge_row,
    );
}

/// A bordered, wrapped text field. Shows a cursor while `editing`.
pub fn render_text_field(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    text: &str,
    editing: bool,
    scroll: u16,
    theme: &Theme,
) {
    let words = text.split_whitespace().count();
    let title = format!(" {title} ({words} words) ");
    let mut body = Text::from(text.to_owned());
    if editing {
        body.push_span(Span::styled("▏", Style::default().fg(theme.status_mode_insert)));
    } else if text.is_empty() {
        body = Text::styled(
            "press i to type, a to attach a file",
            Style::default().fg(theme.muted),
        );
    }
    frame.render_widget(
        Paragraph::new(body)
            .block(panel_block(title, editing, theme))
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0)),
        area,
    );
}

/// True while insert mode is typing into the on-screen field.
pub fn editing(state: &AppState) -> bool {
    state.mode == Mode::Insert
}

/// A bordered paragraph of read-only text.
pub fn render_reading(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    text: Text<'_>,
    scroll: u16,
    theme: &Theme,
) {
    frame.render_widget(
        Paragraph::new(text)
            .block(panel_block(format!(" {title} "), false, theme))
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0)),
        area,
    );
}

/// Selectable list used on the selection stages.
pub fn render_pick_list(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    items: Vec<ListItem<'static>>,
    list: &mut ListState,
    theme: &Theme,
) {
    let widget = List::new(items)
        .block(panel_block(format!(" {title} "), true, theme))
        .highlight_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    frame.render_stateful_widget(widget, area, list);
}

pub fn speaker_style(speaker: &Speaker, theme: &Theme) -> Style {
    let color = match speaker {
        Speaker::Candidate => theme.speaker_candidate,
        Speaker::Peer(_) => theme.speaker_peer,
        Speaker::Gto => theme.speaker_gto,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Discussion lines in arrival order, one paragraph per point.
pub fn discussion_text(points: &[DiscussionPoint], loading: bool, theme: &Theme) -> Text<'static> {
    let mut lines = Vec::new();
    for point in points {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{}: ", point.speaker.label()),
                speaker_style(&point.speaker, theme),
            ),
            Span::raw(point.text.clone()),
        ]));
        lines.push(Line::from(""));
    }
    if loading {
        lines.push(Line::styled("The group is thinking...", Style::default().fg(theme.muted)));
    } else if points.is_empty() {
        lines.push(Line::styled("No points yet.", Style::default().fg(theme.muted)));
    }
    Text::from(lines)
}

fn status_color(status: ScreeningStatus, theme: &Theme) -> ratatui::style::Color {
    match status {
        ScreeningStatus::In => theme.outcome_in,
        ScreeningStatus::Borderline => theme.outcome_borderline,
        ScreeningStatus::Out => theme.outcome_out,
    }
}

/// Lines describing a finished assessment. Shared with the report browser.
pub fn assessment_lines(result: &AssessmentResult, theme: &Theme) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let heading = Style::default().fg(theme.accent).add_modifier(Modifier::BOLD);
    let eval = &result.evaluation;
    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("Score {:.1}/10", eval.score), bold),
            Span::raw("  "),
            Span::styled(eval.verdict.clone(), Style::default().fg(theme.accent)),
        ]),
        Line::from(""),
        Line::from(eval.summary.clone()),
    ];

    if let Some(decision) = &result.screening {
        lines.push(Line::from(""));
        lines.push(Line::styled("Screening outcome", heading));
        lines.push(Line::from(vec![
            Span::raw("Status: "),
            Span::styled(
                decision.status.to_string(),
                Style::default()
                    .fg(status_color(decision.status, theme))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("   final {:.2}/10", decision.final_score)),
        ]));
        lines.push(Line::from(format!(
            "OIR verbal {:.0}%  non-verbal {:.0}%  objective {:.2}  PPDT {:.1}",
            decision.oir_verbal_pct,
            decision.oir_nonverbal_pct,
            decision.objective,
            decision.subjective
        )));
        if let Some(text) = decision.override_text() {
            lines.push(Line::styled(text, Style::default().fg(theme.outcome_out)));
        }
    }

    if !eval.sub_scores.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::styled("Breakdown", heading));
        for sub in &eval.sub_scores {
            lines.push(Line::from(format!("  {:<28} {:.1}", sub.name, sub.score)));
        }
    }
    for (title, items) in [("Strengths", &eval.strengths), ("To improve", &eval.improvements)] {
        if items.is_empty() {
            continue;
        }
        lines.push(Line::from(""));
        lines.push(Line::styled(title, heading));
        lines.extend(items.iter().map(|s| Line::from(format!("  • {s}"))));
    }
    lines
}

/// Result stage: the evaluation, or why there is none.
pub fn render_verdict(
    frame: &mut Frame,
    area: Rect,
    verdict: Option<&Verdict>,
    scroll: u16,
    theme: &Theme,
) {
    let lines = match verdict {
        None => vec![Line::styled("Evaluating...", Style::default().fg(theme.muted))],
        Some(Verdict::Completed { report_id, result }) => {
            let mut lines = assessment_lines(result, theme);
            lines.push(Line::from(""));
            lines.push(Line::styled(
                format!("Saved as report {report_id}. r: try again, Esc: menu"),
                Style::default().fg(theme.muted),
            ));
            lines
        }
        Some(Verdict::Pending { report_id, error }) => vec![
            Line::styled("Evaluation unavailable", Style::default().fg(theme.error)),
            Line::from(error.clone()),
            Line::from(""),
            Line::from(format!(
                "Your answers are saved as report {report_id}. Retry it from the Reports screen."
            )),
        ],
        Some(Verdict::Failed { error }) => vec![
            Line::styled("Could not save this attempt", Style::default().fg(theme.error)),
            Line::from(error.clone()),
        ],
    };
    render_reading(frame, area, "Result", Text::from(lines), scroll, theme);
}
