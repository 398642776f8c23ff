//! UI rendering for ssbprep.
//!
//! `render()` is the single entry point called by the event loop's `terminal.draw()`
//! closure. Layout arithmetic and the header/status chrome live in `layout.rs`; each
//! screen has its own module; modals are drawn last so they sit on top.

mod briefing;
mod gpe;
pub mod help;
pub mod keybindings;
mod layout;
mod lecturette;
mod library;
mod menu;
mod reports;
mod screening;
mod session;

use ratatui::Frame;

use crate::app::{AppState, Mode, Screen};
use crate::theme::Theme;
use layout::{compute_layout, render_header, render_status_bar};

/// Renders one complete frame: header, the current screen, status bar, and any modal.
///
/// Called exactly once per `AppEvent::Render`.
pub fn render(frame: &mut Frame, state: &mut AppState, theme: &Theme) {
    let [header, body, status_bar] = compute_layout(frame);

    render_header(frame, header, state, theme);

    match state.screen {
        Screen::Menu => menu::render(frame, body, state, theme),
        Screen::Briefing => briefing::render(frame, body, state, theme),
        Screen::Gpe => gpe::render(frame, body, state, theme),
        Screen::Lecturette => lecturette::render(frame, body, state, theme),
        Screen::Screening => screening::render(frame, body, state, theme),
        Screen::Library => library::render(frame, body, state, theme),
        Screen::Reports => reports::render(frame, body, state, theme),
    }

    render_status_bar(frame, status_bar, state, theme);

    match state.mode {
        Mode::HelpOverlay => help::render_help_overlay(frame, theme, state.help_scroll),
        Mode::ConfirmQuit => help::render_confirm_quit(frame, state, theme),
        Mode::Normal | Mode::Insert | Mode::PathPrompt => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use ssbprep_core::catalog::{default_scenarios, default_topics};

    fn draw(state: &mut AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        let theme = Theme::dark();
        terminal.draw(|f| render(f, state, &theme)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn every_screen_renders() {
        let mut state = AppState::default();
        state.scenarios = default_scenarios();
        state.topics = default_topics();
        for screen in [
            Screen::Menu,
            Screen::Briefing,
            Screen::Gpe,
            Screen::Lecturette,
            Screen::Screening,
            Screen::Library,
            Screen::Reports,
        ] {
            state.open_screen(screen);
            let screen_text = draw(&mut state);
            assert!(screen_text.contains(screen.title()), "{screen:?} header missing");
        }
    }

    #[test]
    fn oir_stage_shows_question_and_timer() {
        let mut state = AppState::default();
        state.open_screen(Screen::Screening);
        state.begin_session();
        let screen_text = draw(&mut state);
        assert!(screen_text.contains("question 1/10"));
        assert!(screen_text.contains("10:00"));
    }

    #[test]
    fn confirm_dialog_is_drawn_on_top() {
        let mut state = AppState::default();
        state.scenarios = default_scenarios();
        state.open_screen(Screen::Gpe);
        state.begin_session();
        state.leave_screen();
        assert!(draw(&mut state).contains("Abandon the test in progress?"));
    }
}
