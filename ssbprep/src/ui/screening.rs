use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    Frame,
};
use ssbprep_core::flow::Phase;
use ssbprep_core::oir::OirSheet;
use ssbprep_core::sessions::{ScreeningPhase, TimedSession};

use crate::app::AppState;
use crate::theme::Theme;
use crate::ui::layout::split_list_detail;
use crate::ui::session::{
    editing, render_reading, render_stage_bar, render_text_field, render_verdict, split_stage,
};

fn hints(phase: ScreeningPhase) -> &'static str {
    match phase {
        ScreeningPhase::Selection => "Enter begin",
        ScreeningPhase::OirVerbal | ScreeningPhase::OirNonVerbal => {
            "1-4 answer  h/l move  s next set"
        }
        ScreeningPhase::PictureObservation => "observe",
        ScreeningPhase::StoryWriting => "i type  a attach photo  s submit",
        ScreeningPhase::Narration => "i type  a attach audio  s submit",
        ScreeningPhase::Evaluating => "",
        ScreeningPhase::Completed => "r again  Esc menu",
    }
}

pub fn render(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let phase = state.screening.phase();
    let [bar, body] = split_stage(area);
    render_stage_bar(
        frame,
        bar,
        &phase.to_string(),
        (phase.ordinal() + 1, ScreeningPhase::Completed.ordinal() + 1),
        state.screening.countdown(),
        hints(phase),
        theme,
    );
    let scroll = state.body_scroll;
    let typing = editing(state);

    match phase {
        ScreeningPhase::Selection => {
            render_reading(frame, body, "Instructions", instructions(state, theme), scroll, theme);
        }
        ScreeningPhase::OirVerbal | ScreeningPhase::OirNonVerbal => {
            let text = match state.screening.active_sheet() {
                Some(sheet) => sheet_text(sheet, theme),
                None => Text::from("Loading questions..."),
            };
            render_reading(frame, body, "Question", text, 0, theme);
        }
        ScreeningPhase::PictureObservation => {
            let text = match state.screening.picture() {
                Some(p) if p.fallback => Text::from(vec![
                    Line::from(p.description.clone()),
                    Line::from(""),
                    Line::styled("(offline picture)", Style::default().fg(theme.muted)),
                ]),
                Some(p) => Text::from(p.description.clone()),
                None => Text::from("Loading picture..."),
            };
            render_reading(frame, body, "Picture", text, scroll, theme);
        }
        ScreeningPhase::StoryWriting => {
            let story = state.screening.story();
            render_text_field(frame, body, "Your story", story, typing, scroll, theme);
        }
        ScreeningPhase::Narration => {
            let [left, right] = split_list_detail(body);
            render_reading(
                frame,
                left,
                "Your story",
                Text::from(state.screening.story().to_owned()),
                0,
                theme,
            );
            render_text_field(
                frame,
                right,
                "Narration",
                state.screening.narration(),
                typing,
                scroll,
                theme,
            );
        }
        ScreeningPhase::Evaluating | ScreeningPhase::Completed => {
            render_verdict(frame, body, state.screening.verdict(), scroll, theme);
        }
    }
}

fn instructions(state: &AppState, theme: &Theme) -> Text<'static> {
    let pending = state.screening.pending_content();
    let readiness = if pending == 0 {
        Line::styled("Material ready.", Style::default().fg(theme.outcome_in))
    } else {
        Line::styled(
            format!("Preparing material ({pending} left); offline material is used if it is late."),
            Style::default().fg(theme.muted),
        )
    };
    Text::from(vec![
        Line::from("Stage I screening, in order:"),
        Line::from(""),
        Line::from("  1. OIR verbal, 10 minutes"),
        Line::from("  2. OIR non-verbal, 10 minutes"),
        Line::from("  3. PPDT picture, 30 seconds to observe"),
        Line::from("  4. Story about the picture, 4 minutes"),
        Line::from("  5. Narration of your story, 1 minute"),
        Line::from(""),
        Line::from("Timers cannot be paused. When one runs out the stage moves on."),
        Line::from("Your OIR percentages and PPDT evaluation combine into the outcome."),
        Line::from(""),
        readiness,
    ])
}

fn sheet_text(sheet: &OirSheet, theme: &Theme) -> Text<'static> {
    let Some(question) = sheet.current() else {
        return Text::from("No questions in this set.");
    };
    let index = sheet.cursor();
    let chosen = sheet.answer_for(index);
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("{} question {}/{}", sheet.set.label(), index + 1, sheet.questions.len()),
                Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("   answered {}", sheet.answered()),
                Style::default().fg(theme.muted),
            ),
        ]),
        Line::from(""),
        Line::from(question.prompt.clone()),
        Line::from(""),
    ];
    for (i, option) in question.options.iter().enumerate() {
        let style = if chosen == Some(i) {
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let marker = if chosen == Some(i) { '●' } else { ' ' };
        lines.push(Line::styled(format!("  {marker} {}. {option}", i + 1), style));
    }
    if sheet.fallback {
        lines.push(Line::from(""));
        lines.push(Line::styled("(offline question set)", Style::default().fg(theme.muted)));
    }
    Text::from(lines)
}
