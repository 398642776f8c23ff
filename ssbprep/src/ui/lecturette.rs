use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Text},
    widgets::ListItem,
    Frame,
};
use ssbprep_core::flow::Phase;
use ssbprep_core::sessions::{LecturettePhase, TimedSession};

use crate::app::AppState;
use crate::theme::Theme;
use crate::ui::layout::split_list_detail;
use crate::ui::session::{
    editing, render_pick_list, render_reading, render_stage_bar, render_text_field, render_verdict,
    split_stage,
};

fn hints(phase: LecturettePhase) -> &'static str {
    match phase {
        LecturettePhase::Selection => "j/k choose  Enter begin",
        LecturettePhase::Preparation => "t start/pause  i notes  s ready  n skip",
        LecturettePhase::Delivery => "i type  a attach audio  s finish",
        LecturettePhase::Evaluating => "",
        LecturettePhase::Completed => "r again  Esc menu",
    }
}

pub fn render(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let phase = state.lecturette.phase();
    let [bar, body] = split_stage(area);
    render_stage_bar(
        frame,
        bar,
        &phase.to_string(),
        (phase.ordinal() + 1, LecturettePhase::Completed.ordinal() + 1),
        state.lecturette.countdown(),
        hints(phase),
        theme,
    );
    let scroll = state.body_scroll;
    let typing = editing(state);
    let topic = state
        .lecturette
        .topic()
        .map_or_else(String::new, |t| t.title.clone());

    match phase {
        LecturettePhase::Selection => render_selection(frame, body, state, theme),
        LecturettePhase::Preparation => {
            let [left, right] = split_list_detail(body);
            let outline = match state.lecturette.outline() {
                Some(o) => Text::from(o.to_owned()),
                None if state.lecturette.outline_loading() => {
                    Text::styled("Drafting an outline...", Style::default().fg(theme.muted))
                }
                None => Text::styled(
                    "No outline available. Plan from your own notes.",
                    Style::default().fg(theme.muted),
                ),
            };
            render_reading(frame, left, &topic, outline, scroll, theme);
            render_text_field(frame, right, "Notes", state.lecturette.notes(), typing, 0, theme);
        }
        LecturettePhase::Delivery => {
            render_text_field(
                frame,
                body,
                &format!("Speech: {topic}"),
                state.lecturette.speech(),
                typing,
                scroll,
                theme,
            );
        }
        LecturettePhase::Evaluating | LecturettePhase::Completed => {
            render_verdict(frame, body, state.lecturette.verdict(), scroll, theme);
        }
    }
}

fn render_selection(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let [list_area, detail_area] = split_list_detail(area);
    let items: Vec<ListItem<'static>> = state
        .topics
        .iter()
        .map(|t| ListItem::new(t.title.clone()))
        .collect();
    render_pick_list(frame, list_area, "Topics", items, &mut state.pick_state, theme);

    let detail = match state.pick_state.selected().and_then(|i| state.topics.get(i)) {
        Some(t) => Text::from(vec![
            Line::styled(t.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Line::from(""),
            Line::from(format!("Category: {}", t.category)),
            Line::from(format!("Difficulty: {}", t.difficulty.as_str())),
            Line::from(""),
            Line::from("Three minutes to prepare, three minutes to speak."),
        ]),
        None if state.catalog_loading() => Text::from("Loading topics..."),
        None => Text::from("No topics available."),
    };
    render_reading(frame, detail_area, "Topic", detail, 0, theme);
}
