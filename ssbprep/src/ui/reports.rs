use chrono::{Local, TimeZone};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::ListItem,
    Frame,
};
use ssbprep_core::evaluation::{AssessmentResult, EvaluationRequest};
use ssbprep_core::types::{Report, ReportStatus};

use crate::app::AppState;
use crate::theme::Theme;
use crate::ui::layout::split_list_detail;
use crate::ui::session::{assessment_lines, render_pick_list, render_reading};

fn when(ts: i64) -> String {
    Local
        .timestamp_opt(ts, 0)
        .single()
        .map_or_else(|| "?".to_owned(), |t| t.format("%Y-%m-%d %H:%M").to_string())
}

fn list_item(report: &Report, theme: &Theme) -> ListItem<'static> {
    let badge = match (report.status, report.score) {
        (ReportStatus::Completed, Some(score)) => {
            Span::styled(format!("{score:>4.1}"), Style::default().fg(theme.outcome_in))
        }
        (ReportStatus::Completed, None) => Span::raw("  --"),
        (ReportStatus::Pending, _) => {
            Span::styled("PEND", Style::default().fg(theme.outcome_borderline))
        }
    };
    ListItem::new(Line::from(vec![
        badge,
        Span::raw(format!("  {}  ", when(report.created_at))),
        Span::raw(report.title.clone()),
    ]))
}

pub fn render(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let [list_area, detail_area] = split_list_detail(area);
    let items: Vec<ListItem<'static>> = state.reports.iter().map(|r| list_item(r, theme)).collect();
    let empty = items.is_empty();
    render_pick_list(frame, list_area, "Reports", items, &mut state.reports_state, theme);

    let text = match state.selected_report() {
        Some(report) if state.report_detail => detail_text(report, theme),
        Some(report) => summary_text(report, theme),
        None if state.reports_loading() => Text::from("Loading reports..."),
        None if empty => Text::from("No reports yet. Finish a test to create one."),
        None => Text::default(),
    };
    render_reading(frame, detail_area, "Report", text, state.body_scroll, theme);
}

fn summary_text(report: &Report, theme: &Theme) -> Text<'static> {
    let mut lines = vec![
        Line::styled(report.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Line::from(format!("{}  |  {}", report.test_kind.display_name(), report.status.as_str())),
        Line::from(format!("Created {}", when(report.created_at))),
        Line::from(""),
    ];
    match report.status {
        ReportStatus::Pending => lines.push(Line::styled(
            "Not evaluated yet. Press r to retry the evaluation.",
            Style::default().fg(theme.outcome_borderline),
        )),
        ReportStatus::Completed => lines.push(Line::styled(
            "Press Enter to read the evaluation.",
            Style::default().fg(theme.muted),
        )),
    }
    if let Ok(request) = serde_json::from_str::<EvaluationRequest>(&report.inputs) {
        lines.push(Line::from(""));
        lines.push(Line::styled("Submitted", Style::default().fg(theme.accent)));
        lines.extend(input_lines(&request));
    }
    Text::from(lines)
}

fn input_lines(request: &EvaluationRequest) -> Vec<Line<'static>> {
    match request {
        EvaluationRequest::Gpe(g) => vec![
            Line::from(format!("Solution: {}", g.individual_solution)),
            Line::from(format!("Discussion points: {}", g.discussion.len())),
            Line::from(format!("Final plan: {}", g.final_plan)),
        ],
        EvaluationRequest::Lecturette(l) => vec![Line::from(format!("Speech: {}", l.speech))],
        EvaluationRequest::Screening(s) => vec![
            Line::from(format!(
                "OIR verbal {:.0}%, non-verbal {:.0}%",
                s.oir_verbal_pct, s.oir_nonverbal_pct
            )),
            Line::from(format!("Story: {}", s.story)),
            Line::from(format!("Narration: {}", s.narration)),
        ],
    }
}

fn detail_text(report: &Report, theme: &Theme) -> Text<'static> {
    let parsed = report
        .evaluation
        .as_deref()
        .map(serde_json::from_str::<AssessmentResult>);
    match parsed {
        Some(Ok(result)) => Text::from(assessment_lines(&result, theme)),
        Some(Err(e)) => {
            tracing::warn!(report_id = %report.id, error = %e, "stored evaluation does not parse");
            Text::styled("Stored evaluation is unreadable.", Style::default().fg(theme.error))
        }
        None => Text::from("This report has no evaluation yet."),
    }
}
