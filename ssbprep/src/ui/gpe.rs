use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Text},
    widgets::ListItem,
    Frame,
};
use ssbprep_core::flow::Phase;
use ssbprep_core::sessions::{GpePhase, TimedSession};

use crate::app::AppState;
use crate::theme::Theme;
use crate::ui::layout::split_list_detail;
use crate::ui::session::{
    discussion_text, editing, render_pick_list, render_reading, render_stage_bar, render_text_field,
    render_verdict, split_stage,
};

fn hints(phase: GpePhase) -> &'static str {
    match phase {
        GpePhase::Selection => "j/k choose  Enter begin",
        GpePhase::Briefing => "v narrate  s ready  n skip",
        GpePhase::IndividualSolution | GpePhase::FinalPlan => "i type  a attach  s submit",
        GpePhase::GroupDiscussion => "i draft  p post  s/n move on",
        GpePhase::Evaluating => "",
        GpePhase::Completed => "r again  Esc menu",
    }
}

pub fn render(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let phase = state.gpe.phase();
    let [bar, body] = split_stage(area);
    render_stage_bar(
        frame,
        bar,
        &phase.to_string(),
        (phase.ordinal() + 1, GpePhase::Completed.ordinal() + 1),
        state.gpe.countdown(),
        hints(phase),
        theme,
    );

    let narrative = state
        .gpe
        .scenario()
        .map(|s| Text::from(s.narrative.clone()))
        .unwrap_or_default();
    let scroll = state.body_scroll;
    let typing = editing(state);

    match phase {
        GpePhase::Selection => render_selection(frame, body, state, theme),
        GpePhase::Briefing => {
            let mut text = narrative;
            if let Some(path) = state.gpe.briefing_audio() {
                text.push_line(Line::from(""));
                text.push_line(Line::styled(
                    format!("Narration saved: {}", path.display()),
                    Style::default().fg(theme.muted),
                ));
            }
            let title = state.gpe.scenario().map_or("Scenario", |s| s.title.as_str()).to_owned();
            render_reading(frame, body, &title, text, scroll, theme);
        }
        GpePhase::IndividualSolution => {
            let [left, right] = split_list_detail(body);
            render_reading(frame, left, "Scenario", narrative, 0, theme);
            render_text_field(
                frame,
                right,
                "Your solution",
                state.gpe.individual_solution(),
                typing,
                scroll,
                theme,
            );
        }
        GpePhase::GroupDiscussion => {
            let [talk, draft] =
                body.layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(6)]));
            let text =
                discussion_text(state.gpe.discussion(), state.gpe.discussion_loading(), theme);
            render_reading(frame, talk, "Discussion", text, scroll, theme);
            render_text_field(frame, draft, "Your point", state.gpe.draft(), typing, 0, theme);
        }
        GpePhase::FinalPlan => {
            let [left, right] = split_list_detail(body);
            let text = discussion_text(state.gpe.discussion(), false, theme);
            render_reading(frame, left, "Discussion", text, 0, theme);
            render_text_field(
                frame,
                right,
                "Final group plan",
                state.gpe.final_plan(),
                typing,
                scroll,
                theme,
            );
        }
        GpePhase::Evaluating | GpePhase::Completed => {
            render_verdict(frame, body, state.gpe.verdict(), scroll, theme);
        }
    }
}

fn render_selection(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let [list_area, detail_area] = split_list_detail(area);
    let items: Vec<ListItem<'static>> = state
        .scenarios
        .iter()
        .map(|s| ListItem::new(format!("{} [{}]", s.title, s.difficulty.as_str())))
        .collect();
    render_pick_list(frame, list_area, "Scenarios", items, &mut state.pick_state, theme);

    let detail = match state.pick_state.selected().and_then(|i| state.scenarios.get(i)) {
        Some(s) => Text::from(vec![
            Line::styled(s.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Line::from(""),
            Line::from(s.narrative.clone()),
        ]),
        None if state.catalog_loading() => Text::from("Loading scenarios..."),
        None => Text::from("No scenarios available."),
    };
    render_reading(frame, detail_area, "Scenario", detail, state.body_scroll, theme);
}
