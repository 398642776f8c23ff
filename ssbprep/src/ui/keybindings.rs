//! Keybinding dispatcher for ssbprep.
//!
//! Translates crossterm `KeyEvent`s into `AppState` calls and returns a `KeyAction`
//! telling the event loop whether to continue or quit. Branches first on
//! `state.mode`, then on `state.screen`.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::ListState;
use ssbprep_core::catalog::LIBRARY;
use ssbprep_core::sessions::ScreeningPhase;

use crate::app::{AppState, Mode, Screen, MENU};

/// Control-flow signal returned from the key dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Quit,
}

/// Dispatches a key event to the handler for the current mode.
pub fn handle_key(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return if state.request_quit() { KeyAction::Quit } else { KeyAction::Continue };
    }
    match state.mode {
        Mode::HelpOverlay => handle_help(key, state),
        Mode::ConfirmQuit => handle_confirm_quit(key, state),
        Mode::Insert => handle_insert(key, state),
        Mode::PathPrompt => handle_path_prompt(key, state),
        Mode::Normal => {
            state.status = None;
            handle_normal(key, state)
        }
    }
}

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

fn handle_normal(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::HelpOverlay;
            return KeyAction::Continue;
        }
        KeyCode::Char('q') => {
            return if state.request_quit() { KeyAction::Quit } else { KeyAction::Continue };
        }
        KeyCode::Esc => {
            if state.screen == Screen::Menu {
                return KeyAction::Quit;
            }
            state.leave_screen();
            return KeyAction::Continue;
        }
        _ => {}
    }

    match state.screen {
        Screen::Menu => handle_menu(key, state),
        Screen::Briefing => handle_briefing(key, state),
        Screen::Library => handle_library(key, state),
        Screen::Reports => handle_reports(key, state),
        Screen::Gpe | Screen::Lecturette | Screen::Screening => handle_session(key, state),
    }
    KeyAction::Continue
}

/// Moves a list selection by `delta` rows, clamped to `len`.
fn step_list(list: &mut ListState, len: usize, delta: isize) {
    if len == 0 {
        list.select(None);
        return;
    }
    let current = list.selected().unwrap_or(0) as isize;
    let next = (current + delta).clamp(0, len as isize - 1);
    list.select(Some(next as usize));
}

/// j/k style list movement. Returns `true` when the key was consumed.
fn list_key(key: KeyEvent, list: &mut ListState, len: usize) -> bool {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => step_list(list, len, 1),
        KeyCode::Char('k') | KeyCode::Up => step_list(list, len, -1),
        KeyCode::Char('g') | KeyCode::Home => step_list(list, len, -(len as isize)),
        KeyCode::Char('G') | KeyCode::End => step_list(list, len, len as isize),
        _ => return false,
    }
    true
}

/// Scroll keys for the main text panel. Returns `true` when consumed.
fn scroll_key(key: KeyEvent, state: &mut AppState) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('d') if ctrl => state.body_scroll = state.body_scroll.saturating_add(10),
        KeyCode::Char('u') if ctrl => state.body_scroll = state.body_scroll.saturating_sub(10),
        KeyCode::Char('j') | KeyCode::Down => {
            state.body_scroll = state.body_scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => state.body_scroll = state.body_scroll.saturating_sub(1),
        KeyCode::Char('g') => state.body_scroll = 0,
        _ => return false,
    }
    true
}

fn handle_menu(key: KeyEvent, state: &mut AppState) {
    if list_key(key, &mut state.menu_state, MENU.len()) {
        return;
    }
    match key.code {
        KeyCode::Enter | KeyCode::Char('l') => state.open_selected_menu_entry(),
        KeyCode::Char(c @ '1'..='9') => {
            let index = c as usize - '1' as usize;
            if let Some((screen, _)) = MENU.get(index) {
                state.menu_state.select(Some(index));
                state.open_screen(*screen);
            }
        }
        _ => {}
    }
}

fn handle_briefing(key: KeyEvent, state: &mut AppState) {
    if scroll_key(key, state) {
        return;
    }
    if key.code == KeyCode::Char('R') {
        state.request_briefing();
    }
}

fn handle_library(key: KeyEvent, state: &mut AppState) {
    let before = state.library_state.selected();
    if list_key(key, &mut state.library_state, LIBRARY.len()) {
        if state.library_state.selected() != before {
            state.body_scroll = 0;
        }
        return;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('d') if ctrl => state.body_scroll = state.body_scroll.saturating_add(10),
        KeyCode::Char('u') if ctrl => state.body_scroll = state.body_scroll.saturating_sub(10),
        _ => {}
    }
}

fn handle_reports(key: KeyEvent, state: &mut AppState) {
    if state.report_detail && scroll_key(key, state) {
        return;
    }
    if list_key(key, &mut state.reports_state, state.reports.len()) {
        return;
    }
    match key.code {
        KeyCode::Enter => {
            state.report_detail = !state.report_detail && state.selected_report().is_some();
            state.body_scroll = 0;
        }
        KeyCode::Char('r') => state.retry_selected_report(),
        KeyCode::Char('R') => state.request_reports(),
        _ => {}
    }
}

fn handle_session(key: KeyEvent, state: &mut AppState) {
    if state.at_selection() {
        let len = state.pick_len();
        if len > 0 && list_key(key, &mut state.pick_state, len) {
            return;
        }
        if key.code == KeyCode::Enter {
            state.begin_session();
            return;
        }
    }

    let in_oir = state.screen == Screen::Screening
        && matches!(
            state.screening.phase(),
            ScreeningPhase::OirVerbal | ScreeningPhase::OirNonVerbal
        );
    if in_oir {
        match key.code {
            KeyCode::Char(c @ '1'..='9') => {
                state.oir_choose(c as usize - '1' as usize);
                return;
            }
            KeyCode::Char('h') | KeyCode::Left => {
                state.oir_step(false);
                return;
            }
            KeyCode::Char('l') | KeyCode::Right => {
                state.oir_step(true);
                return;
            }
            _ => {}
        }
    }

    if scroll_key(key, state) {
        return;
    }

    match key.code {
        KeyCode::Char('i') => state.enter_insert(),
        KeyCode::Char('a') => state.enter_path_prompt(),
        KeyCode::Char('s') => state.submit_stage(),
        KeyCode::Char('n') => state.skip_stage(),
        KeyCode::Char('t') => state.toggle_timer(),
        KeyCode::Char('r') => state.restart_session(),
        KeyCode::Char('v') => state.speak_briefing(),
        KeyCode::Char('p') => state.post_counter_point(),
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Insert and PathPrompt modes
// ---------------------------------------------------------------------------

/// Typing into the current stage. `Esc` returns to Normal mode.
fn handle_insert(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Esc => state.mode = Mode::Normal,
        KeyCode::Enter => state.insert_char('\n'),
        KeyCode::Backspace => state.delete_char(),
        KeyCode::Tab => state.insert_char(' '),
        KeyCode::Char(c) => state.insert_char(c),
        _ => {}
    }
    KeyAction::Continue
}

fn handle_path_prompt(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Esc => {
            state.path_input.clear();
            state.mode = Mode::Normal;
        }
        KeyCode::Enter => state.submit_path(),
        KeyCode::Backspace => {
            state.path_input.pop();
        }
        KeyCode::Char(c) => state.path_input.push(c),
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// HelpOverlay and ConfirmQuit modes
// ---------------------------------------------------------------------------

fn handle_help(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            state.help_scroll = state.help_scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => state.help_scroll = state.help_scroll.saturating_sub(1),
        KeyCode::Char('g') => state.help_scroll = 0,
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

/// `y` carries out the pending exit; `n` or `Esc` cancels.
fn handle_confirm_quit(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            if state.confirm_exit() {
                return KeyAction::Quit;
            }
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssbprep_core::catalog::{default_scenarios, default_topics};
    use ssbprep_core::sessions::{GpePhase, TimedSession};

    use crate::app::Exit;

    fn press(state: &mut AppState, code: KeyCode) -> KeyAction {
        handle_key(KeyEvent::new(code, KeyModifiers::NONE), state)
    }

    fn type_str(state: &mut AppState, text: &str) {
        for c in text.chars() {
            press(state, KeyCode::Char(c));
        }
    }

    fn loaded() -> AppState {
        let mut state = AppState::default();
        state.scenarios = default_scenarios();
        state.topics = default_topics();
        state
    }

    #[test]
    fn menu_digit_opens_screen() {
        let mut state = loaded();
        press(&mut state, KeyCode::Char('2'));
        assert_eq!(state.screen, Screen::Gpe);
        assert_eq!(press(&mut state, KeyCode::Esc), KeyAction::Continue);
        assert_eq!(state.screen, Screen::Menu);
        assert_eq!(press(&mut state, KeyCode::Esc), KeyAction::Quit);
    }

    #[test]
    fn gpe_flow_by_keys() {
        let mut state = loaded();
        press(&mut state, KeyCode::Char('2'));
        press(&mut state, KeyCode::Char('j'));
        press(&mut state, KeyCode::Enter);
        assert_eq!(state.gpe.phase(), GpePhase::Briefing);

        press(&mut state, KeyCode::Char('n'));
        assert_eq!(state.gpe.phase(), GpePhase::IndividualSolution);

        press(&mut state, KeyCode::Char('i'));
        type_str(&mut state, "Split team; s and q are plain text here");
        press(&mut state, KeyCode::Backspace);
        press(&mut state, KeyCode::Esc);
        assert_eq!(state.mode, Mode::Normal);
        assert_eq!(
            state.gpe.individual_solution(),
            "Split team; s and q are plain text her"
        );

        press(&mut state, KeyCode::Char('s'));
        assert_eq!(state.gpe.phase(), GpePhase::GroupDiscussion);

        press(&mut state, KeyCode::Char('i'));
        type_str(&mut state, "Boats first.");
        press(&mut state, KeyCode::Esc);
        press(&mut state, KeyCode::Char('p'));
        assert_eq!(state.gpe.discussion().len(), 1);
        assert_eq!(state.gpe.draft(), "");
    }

    #[test]
    fn q_during_test_asks_then_n_cancels() {
        let mut state = loaded();
        press(&mut state, KeyCode::Char('3'));
        press(&mut state, KeyCode::Enter);
        assert_eq!(press(&mut state, KeyCode::Char('q')), KeyAction::Continue);
        assert_eq!(state.mode, Mode::ConfirmQuit);
        press(&mut state, KeyCode::Char('n'));
        assert_eq!(state.mode, Mode::Normal);
        press(&mut state, KeyCode::Char('q'));
        assert_eq!(press(&mut state, KeyCode::Char('y')), KeyAction::Quit);
    }

    #[test]
    fn r_mid_test_asks_before_restarting() {
        let mut state = loaded();
        press(&mut state, KeyCode::Char('2'));
        press(&mut state, KeyCode::Enter);
        press(&mut state, KeyCode::Char('n'));
        assert_eq!(state.gpe.phase(), GpePhase::IndividualSolution);
        let running = state.gpe.session_id();

        press(&mut state, KeyCode::Char('r'));
        assert_eq!(state.mode, Mode::ConfirmQuit);
        assert_eq!(state.pending_exit, Exit::Restart);
        press(&mut state, KeyCode::Esc);
        assert_eq!(state.mode, Mode::Normal);
        assert_eq!(state.gpe.phase(), GpePhase::IndividualSolution);
        assert_eq!(state.gpe.session_id(), running);

        press(&mut state, KeyCode::Char('r'));
        assert_eq!(press(&mut state, KeyCode::Char('y')), KeyAction::Continue);
        assert_eq!(state.screen, Screen::Gpe);
        assert_eq!(state.gpe.phase(), GpePhase::Selection);
        assert_ne!(state.gpe.session_id(), running);
    }

    #[test]
    fn oir_digits_answer_questions() {
        let mut state = loaded();
        press(&mut state, KeyCode::Char('4'));
        press(&mut state, KeyCode::Enter);
        press(&mut state, KeyCode::Char('2'));
        press(&mut state, KeyCode::Char('h'));
        let sheet = state.screening.active_sheet().unwrap();
        assert_eq!(sheet.cursor(), 0);
        assert_eq!(sheet.answer_for(0), Some(1));
    }

    #[test]
    fn oir_digit_past_the_options_is_ignored() {
        let mut state = loaded();
        press(&mut state, KeyCode::Char('4'));
        press(&mut state, KeyCode::Enter);
        press(&mut state, KeyCode::Char('5'));
        let sheet = state.screening.active_sheet().unwrap();
        assert_eq!(sheet.cursor(), 0);
        assert_eq!(sheet.answer_for(0), None);
    }

    #[test]
    fn path_prompt_collects_and_cancels() {
        let mut state = loaded();
        press(&mut state, KeyCode::Char('3'));
        press(&mut state, KeyCode::Enter);
        press(&mut state, KeyCode::Char('n'));
        press(&mut state, KeyCode::Char('a'));
        assert_eq!(state.mode, Mode::PathPrompt);
        type_str(&mut state, "talk.wav");
        assert_eq!(state.path_input, "talk.wav");
        press(&mut state, KeyCode::Esc);
        assert_eq!(state.mode, Mode::Normal);
        assert!(state.path_input.is_empty());
    }

    #[test]
    fn list_steps_clamp() {
        let mut list = ListState::default();
        step_list(&mut list, 3, -1);
        assert_eq!(list.selected(), Some(0));
        step_list(&mut list, 3, 10);
        assert_eq!(list.selected(), Some(2));
        step_list(&mut list, 0, 1);
        assert_eq!(list.selected(), None);
    }
}
