use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{AppState, MENU};
use crate::theme::Theme;
use crate::ui::layout::panel_block;

pub fn render(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let [list_area, footer] =
        area.layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(4)]));

    let items: Vec<ListItem> = MENU
        .iter()
        .enumerate()
        .map(|(i, (screen, blurb))| {
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(format!("{} ", i + 1), Style::default().fg(theme.muted)),
                    Span::styled(screen.title(), Style::default().add_modifier(Modifier::BOLD)),
                ]),
                Line::styled(format!("    {blurb}"), Style::default().fg(theme.muted)),
            ])
        })
        .collect();
    let list = List::new(items)
        .block(panel_block(" Practice ", true, theme))
        .highlight_style(Style::default().fg(theme.accent))
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, list_area, &mut state.menu_state);

    let tip = if state.catalog_loading() {
        "Loading scenarios and topics..."
    } else {
        "Enter or 1-6 to open, ? for keys, q to quit."
    };
    frame.render_widget(
        Paragraph::new(vec![Line::from(""), Line::styled(tip, Style::default().fg(theme.muted))])
            .wrap(Wrap { trim: true }),
        footer,
    );
}
