use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Text},
    widgets::ListItem,
    Frame,
};
use ssbprep_core::catalog::LIBRARY;

use crate::app::AppState;
use crate::theme::Theme;
use crate::ui::layout::split_list_detail;
use crate::ui::session::{render_pick_list, render_reading};

pub fn render(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let [list_area, detail_area] = split_list_detail(area);
    let items: Vec<ListItem<'static>> = LIBRARY
        .iter()
        .map(|r| ListItem::new(format!("{:<9} {}", r.kind.label(), r.title)))
        .collect();
    render_pick_list(frame, list_area, "Library", items, &mut state.library_state, theme);

    let text = match state.library_state.selected().and_then(|i| LIBRARY.get(i)) {
        Some(r) => {
            let mut lines = vec![
                Line::styled(
                    r.title,
                    Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
                ),
                Line::styled(r.summary, Style::default().fg(theme.muted)),
                Line::from(""),
            ];
            lines.extend(r.body.split('\n').map(Line::from));
            Text::from(lines)
        }
        None => Text::from("Nothing selected."),
    };
    render_reading(frame, detail_area, "Read", text, state.body_scroll, theme);
}
