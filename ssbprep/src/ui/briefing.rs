use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    Frame,
};
use ssbprep_core::briefing::{Briefing, BriefingSource};

use crate::app::AppState;
use crate::theme::Theme;
use crate::ui::session::render_reading;

pub fn render(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let text = match &state.briefing {
        Some(b) => briefing_text(b, theme),
        None if state.briefing_loading() => {
            Text::styled("Gathering today's current affairs...", Style::default().fg(theme.muted))
        }
        None => Text::from("No briefing loaded. Press R to fetch it."),
    };
    let title = state
        .briefing
        .as_ref()
        .map_or_else(|| "Briefing".to_owned(), |b| format!("Briefing {}", b.date_key));
    render_reading(frame, area, &title, text, state.body_scroll, theme);
}

fn source_note(source: BriefingSource) -> &'static str {
    match source {
        BriefingSource::Cache => "from today's cache",
        BriefingSource::Generated { cached: true } => "freshly generated",
        BriefingSource::Generated { cached: false } => "freshly generated, too short to cache",
        BriefingSource::Fallback => "offline items; the live briefing is unavailable",
    }
}

fn briefing_text(briefing: &Briefing, theme: &Theme) -> Text<'static> {
    let mut lines = vec![
        Line::styled(source_note(briefing.source), Style::default().fg(theme.muted)),
        Line::from(""),
    ];
    for item in &briefing.items {
        lines.push(Line::from(vec![
            Span::styled(
                item.title.clone(),
                Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  [{}]", item.category), Style::default().fg(theme.muted)),
        ]));
        lines.push(Line::from(item.summary.clone()));
        if let Some(relevance) = &item.relevance {
            lines.push(Line::styled(
                format!("Why it matters: {relevance}"),
                Style::default().add_modifier(Modifier::ITALIC),
            ));
        }
        lines.push(Line::from(""));
    }
    Text::from(lines)
}
