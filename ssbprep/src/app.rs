//! Central application state for ssbprep.
//!
//! This module owns everything the render pass reads: which screen is up, the
//! current mode, the three test sessions, the loaded catalog, briefing, and reports,
//! and the last status message. No ratatui drawing lives here; the keybinding
//! dispatcher mutates `AppState` and the render module reads it.
//!
//! Background work leaves through [`AppState::dispatch`] and comes back through
//! [`AppState::on_job_done`]. Completions are routed by the ticket's session id: the
//! app's own requests (catalog, briefing, reports) carry `jobs.session`, and each
//! test session carries its own id, which changes on restart. Anything else is a
//! result for a session that no longer exists and is dropped.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use ratatui::widgets::ListState;
use ssbprep_core::briefing::Briefing;
use ssbprep_core::error::FlowError;
use ssbprep_core::evaluation::Settled;
use ssbprep_core::jobs::{Completion, Dispatch, Job, JobOutput, SessionId, Ticket};
use ssbprep_core::sessions::{
    GpePhase, GpeSession, LecturettePhase, LecturetteSession, ScreeningPhase, ScreeningSession,
    TimedSession,
};
use ssbprep_core::timer::Ticker;
use ssbprep_core::types::{Report, ReportStatus, Scenario, Topic};
use tokio::sync::mpsc::UnboundedSender;

use crate::event::AppEvent;
use crate::worker::JobSender;

/// How many reports the browser loads.
pub const REPORT_PAGE: usize = 50;

/// Editor mode controlling which keybinding set is active.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    /// Typing into the current stage's text field.
    Insert,
    /// Typing the path of an audio or image file to transcribe.
    PathPrompt,
    /// Full-screen help overlay is shown above the current screen.
    HelpOverlay,
    /// Confirmation before abandoning a test in progress.
    ConfirmQuit,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    #[default]
    Menu,
    Briefing,
    Gpe,
    Lecturette,
    Screening,
    Library,
    Reports,
}

impl Screen {
    pub fn title(self) -> &'static str {
        match self {
            Screen::Menu => "Menu",
            Screen::Briefing => "Daily Briefing",
            Screen::Gpe => "Group Planning Exercise",
            Screen::Lecturette => "Lecturette",
            Screen::Screening => "Screening Test",
            Screen::Library => "Resource Library",
            Screen::Reports => "Reports",
        }
    }
}

/// Menu entries in display order.
pub const MENU: &[(Screen, &str)] = &[
    (Screen::Briefing, "Current affairs for today, cached per day"),
    (Screen::Gpe, "Scenario, individual solution, group discussion, final plan"),
    (Screen::Lecturette, "Pick a topic, prepare with an outline, deliver"),
    (Screen::Screening, "OIR verbal and non-verbal, then PPDT"),
    (Screen::Library, "Guides, checklists, and references"),
    (Screen::Reports, "Past assessments; retry pending ones"),
];

/// What the confirmation prompt carries out when answered `y`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    #[default]
    Menu,
    App,
    /// Throw away the running attempt and start the same test over.
    Restart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppRequest {
    Catalog,
    Briefing,
    Reports,
    Retry,
}

/// Requests issued by the app itself rather than a test session.
#[derive(Debug)]
struct AppJobs {
    session: SessionId,
    next_seq: u64,
    outstanding: HashMap<u64, AppRequest>,
}

impl AppJobs {
    fn new() -> Self {
        Self {
            session: SessionId::next(),
            next_seq: 0,
            outstanding: HashMap::new(),
        }
    }

    fn issue(&mut self, kind: AppRequest, job: Job) -> Dispatch {
        self.next_seq += 1;
        self.outstanding.insert(self.next_seq, kind);
        Dispatch {
            ticket: Ticket {
                session: self.session,
                seq: self.next_seq,
            },
            job,
        }
    }

    fn redeem(&mut self, ticket: Ticket) -> Option<AppRequest> {
        self.outstanding.remove(&ticket.seq)
    }

    fn awaiting(&self, kind: AppRequest) -> bool {
        self.outstanding.values().any(|k| *k == kind)
    }
}

/// All mutable UI state passed through every render cycle.
pub struct AppState {
    pub mode: Mode,
    pub screen: Screen,
    /// Exit target while `mode == ConfirmQuit`.
    pub pending_exit: Exit,

    pub menu_state: ListState,
    /// Scenario or topic list on a session's selection stage.
    pub pick_state: ListState,
    pub library_state: ListState,
    pub reports_state: ListState,

    /// Scroll offset of the main text panel on the current screen.
    pub body_scroll: u16,
    pub help_scroll: u16,

    /// One-line message for the status bar; cleared on the next key press.
    pub status: Option<String>,
    /// Buffer for `Mode::PathPrompt`.
    pub path_input: String,
    /// Reports screen shows the selected report's evaluation instead of the list detail.
    pub report_detail: bool,

    pub scenarios: Vec<Scenario>,
    pub topics: Vec<Topic>,
    pub briefing: Option<Briefing>,
    pub reports: Vec<Report>,

    pub gpe: GpeSession,
    pub lecturette: LecturetteSession,
    pub screening: ScreeningSession,

    jobs: AppJobs,
    job_tx: Option<JobSender>,
    timer_tx: Option<UnboundedSender<AppEvent>>,
    /// Countdown task for the on-screen session, tagged with that session's id.
    ticker: Option<(SessionId, Ticker)>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl AppState {
    /// Builds the state. Without `job_tx` jobs are dropped; without `timer_tx` no
    /// countdown task is spawned.
    pub fn new(job_tx: Option<JobSender>, timer_tx: Option<UnboundedSender<AppEvent>>) -> Self {
        let mut menu_state = ListState::default();
        menu_state.select(Some(0));
        Self {
            mode: Mode::default(),
            screen: Screen::default(),
            pending_exit: Exit::default(),
            menu_state,
            pick_state: ListState::default(),
            library_state: ListState::default(),
            reports_state: ListState::default(),
            body_scroll: 0,
            help_scroll: 0,
            status: None,
            path_input: String::new(),
            report_detail: false,
            scenarios: Vec::new(),
            topics: Vec::new(),
            briefing: None,
            reports: Vec::new(),
            gpe: GpeSession::new(),
            lecturette: LecturetteSession::new(),
            screening: ScreeningSession::new(),
            jobs: AppJobs::new(),
            job_tx,
            timer_tx,
            ticker: None,
        }
    }

    /// Requests the scenario and topic catalog.
    pub fn start(&mut self) {
        let d = self.jobs.issue(AppRequest::Catalog, Job::LoadCatalog);
        self.dispatch(vec![d]);
    }

    // -----------------------------------------------------------------------
    // Background work
    // -----------------------------------------------------------------------

    /// Hands dispatches to the job worker.
    pub fn dispatch(&mut self, dispatches: Vec<Dispatch>) {
        for d in dispatches {
            match &self.job_tx {
                Some(tx) => {
                    if tx.send(d).is_err() {
                        tracing::error!("job worker is gone");
                        self.status = Some("Background worker stopped; restart the app".into());
                    }
                }
                None => {
                    tracing::debug!(
                        ticket = %d.ticket,
                        job = d.job.name(),
                        "no worker; job dropped"
                    );
                }
            }
        }
    }

    pub fn briefing_loading(&self) -> bool {
        self.jobs.awaiting(AppRequest::Briefing)
    }

    pub fn reports_loading(&self) -> bool {
        self.jobs.awaiting(AppRequest::Reports) || self.jobs.awaiting(AppRequest::Retry)
    }

    pub fn catalog_loading(&self) -> bool {
        self.jobs.awaiting(AppRequest::Catalog)
    }

    /// Routes a finished job to its owner.
    pub fn on_job_done(&mut self, completion: Completion) {
        let session = completion.ticket.session;
        let follow_up = if session == self.jobs.session {
            self.on_app_job(completion);
            Vec::new()
        } else if session == self.gpe.session_id() {
            self.gpe.on_job(completion)
        } else if session == self.lecturette.session_id() {
            self.lecturette.on_job(completion)
        } else if session == self.screening.session_id() {
            self.screening.on_job(completion)
        } else {
            tracing::debug!(ticket = %completion.ticket, "dropping result for a finished session");
            return;
        };
        self.dispatch(follow_up);
        self.after_session_change();
    }

    fn on_app_job(&mut self, completion: Completion) {
        let Some(kind) = self.jobs.redeem(completion.ticket) else {
            return;
        };
        match (kind, completion.result) {
            (AppRequest::Catalog, Ok(JobOutput::Catalog { scenarios, topics })) => {
                tracing::info!(
                    scenarios = scenarios.len(),
                    topics = topics.len(),
                    "catalog loaded"
                );
                self.scenarios = scenarios;
                self.topics = topics;
                if !self.scenarios.is_empty() || !self.topics.is_empty() {
                    self.pick_state.select(Some(0));
                }
            }
            (AppRequest::Briefing, Ok(JobOutput::Briefing(briefing))) => {
                if briefing.is_fallback() {
                    self.status = Some("Live briefing unavailable; showing offline items".into());
                }
                self.briefing = Some(briefing);
            }
            (AppRequest::Reports, Ok(JobOutput::Reports(reports))) => {
                self.reports = reports;
                let selected = self.reports_state.selected().unwrap_or(0);
                let last = self.reports.len().checked_sub(1);
                self.reports_state.select(last.map(|last| selected.min(last)));
            }
            (AppRequest::Retry, Ok(JobOutput::Evaluation(settled))) => {
                self.status = Some(match settled {
                    Settled::Completed { result, .. } => {
                        format!("Report evaluated: {:.1}/10", result.headline_score())
                    }
                    Settled::Pending { error, .. } => format!("Still pending: {error}"),
                });
                self.request_reports();
            }
            (kind, Err(e)) => {
                tracing::warn!(?kind, error = %e, "app request failed");
                self.status = Some(format!("Request failed: {e}"));
            }
            (kind, Ok(other)) => {
                tracing::warn!(?kind, ?other, "unexpected job output");
            }
        }
    }

    pub fn request_briefing(&mut self) {
        if self.briefing_loading() {
            return;
        }
        let date = chrono::Local::now().date_naive();
        let d = self.jobs.issue(AppRequest::Briefing, Job::DailyBriefing { date });
        self.dispatch(vec![d]);
    }

    pub fn request_reports(&mut self) {
        if self.jobs.awaiting(AppRequest::Reports) {
            return;
        }
        let d = self.jobs.issue(AppRequest::Reports, Job::ListReports { limit: REPORT_PAGE });
        self.dispatch(vec![d]);
    }

    /// Re-runs the evaluation of the selected report if it is still pending.
    pub fn retry_selected_report(&mut self) {
        let Some(report) = self.selected_report() else {
            return;
        };
        if report.status != ReportStatus::Pending {
            self.status = Some("Report already evaluated".into());
            return;
        }
        let report_id = report.id.clone();
        tracing::info!(%report_id, "retry requested");
        let d = self.jobs.issue(AppRequest::Retry, Job::RetryReport { report_id });
        self.dispatch(vec![d]);
        self.status = Some("Retrying evaluation...".into());
    }

    pub fn selected_report(&self) -> Option<&Report> {
        self.reports_state.selected().and_then(|i| self.reports.get(i))
    }

    // -----------------------------------------------------------------------
    // Timer slot
    // -----------------------------------------------------------------------

    /// Applies one countdown tick if it belongs to the on-screen session.
    pub fn on_timer_tick(&mut self, session: SessionId, epoch: u64) {
        let Some(active) = self.active_session_mut() else {
            return;
        };
        if active.session_id() != session {
            return;
        }
        let dispatches = active.tick(epoch);
        self.dispatch(dispatches);
        self.after_session_change();
    }

    /// Arms, re-arms, or drops the countdown task to match the on-screen session.
    ///
    /// A ticker is tied to one (session, epoch) pair; any phase change, start, or
    /// pause bumps the epoch and so replaces the ticker.
    fn sync_timer(&mut self) {
        let wanted = self
            .active_session()
            .filter(|s| s.wants_ticks())
            .map(|s| (s.session_id(), s.epoch()));
        let armed = self.ticker.as_ref().map(|(session, t)| (*session, t.epoch()));
        match wanted {
            Some(w) if armed == Some(w) => {}
            Some((session, epoch)) => {
                self.ticker = self.timer_tx.clone().map(|tx| {
                    let ticker = Ticker::spawn(tx, epoch, Duration::from_secs(1), move |epoch| {
                        AppEvent::TimerTick { session, epoch }
                    });
                    (session, ticker)
                });
            }
            None => self.ticker = None,
        }
    }

    pub fn timer_armed(&self) -> bool {
        self.ticker.is_some()
    }

    /// Pulls notices out of every session, leaves Insert mode if the stage no longer
    /// takes text, and re-syncs the timer.
    fn after_session_change(&mut self) {
        let notices = [
            self.gpe.take_notice(),
            self.lecturette.take_notice(),
            self.screening.take_notice(),
        ];
        if let Some(notice) = notices.into_iter().flatten().last() {
            self.status = Some(notice);
        }
        if self.mode == Mode::Insert && !self.stage_takes_text() {
            self.mode = Mode::Normal;
        }
        if self.mode == Mode::PathPrompt
            && self.active_session().and_then(|s| s.accepts_attachment()).is_none()
        {
            self.mode = Mode::Normal;
            self.path_input.clear();
        }
        self.sync_timer();
    }

    // -----------------------------------------------------------------------
    // Screens
    // -----------------------------------------------------------------------

    pub fn active_session(&self) -> Option<&dyn TimedSession> {
        match self.screen {
            Screen::Gpe => Some(&self.gpe),
            Screen::Lecturette => Some(&self.lecturette),
            Screen::Screening => Some(&self.screening),
            _ => None,
        }
    }

    pub fn active_session_mut(&mut self) -> Option<&mut dyn TimedSession> {
        match self.screen {
            Screen::Gpe => Some(&mut self.gpe),
            Screen::Lecturette => Some(&mut self.lecturette),
            Screen::Screening => Some(&mut self.screening),
            _ => None,
        }
    }

    /// True when the on-screen test has started and not finished.
    pub fn test_in_progress(&self) -> bool {
        match self.screen {
            Screen::Gpe => !matches!(self.gpe.phase(), GpePhase::Selection | GpePhase::Completed),
            Screen::Lecturette => !matches!(
                self.lecturette.phase(),
                LecturettePhase::Selection | LecturettePhase::Completed
            ),
            Screen::Screening => !matches!(
                self.screening.phase(),
                ScreeningPhase::Selection | ScreeningPhase::Completed
            ),
            _ => false,
        }
    }

    /// True when the on-screen session sits on its selection stage.
    pub fn at_selection(&self) -> bool {
        match self.screen {
            Screen::Gpe => self.gpe.phase() == GpePhase::Selection,
            Screen::Lecturette => self.lecturette.phase() == LecturettePhase::Selection,
            Screen::Screening => self.screening.phase() == ScreeningPhase::Selection,
            _ => false,
        }
    }

    pub fn open_screen(&mut self, screen: Screen) {
        tracing::debug!(screen = screen.title(), "open screen");
        self.screen = screen;
        self.body_scroll = 0;
        self.report_detail = false;
        match screen {
            Screen::Briefing => {
                if self.briefing.is_none() {
                    self.request_briefing();
                }
            }
            Screen::Gpe | Screen::Lecturette => {
                let len = self.pick_len();
                self.pick_state.select((len > 0).then_some(0));
            }
            Screen::Screening => {
                let prefetch = self.screening.open();
                self.dispatch(prefetch);
            }
            Screen::Library => {
                if self.library_state.selected().is_none() {
                    self.library_state.select(Some(0));
                }
            }
            Screen::Reports => self.request_reports(),
            Screen::Menu => {}
        }
        self.after_session_change();
    }

    pub fn open_selected_menu_entry(&mut self) {
        let index = self.menu_state.selected().unwrap_or(0).min(MENU.len() - 1);
        self.open_screen(MENU[index].0);
    }

    /// Leaves the current screen for the menu, asking first if a test is running.
    pub fn leave_screen(&mut self) {
        if self.test_in_progress() {
            self.pending_exit = Exit::Menu;
            self.mode = Mode::ConfirmQuit;
            return;
        }
        self.finish_leaving();
    }

    /// Asks before quitting if a test is running. Returns `true` to quit now.
    pub fn request_quit(&mut self) -> bool {
        if self.test_in_progress() {
            self.pending_exit = Exit::App;
            self.mode = Mode::ConfirmQuit;
            return false;
        }
        true
    }

    /// Carries out the confirmed exit. Returns `true` when the app should quit.
    pub fn confirm_exit(&mut self) -> bool {
        self.mode = Mode::Normal;
        match self.pending_exit {
            Exit::App => true,
            Exit::Menu => {
                self.finish_leaving();
                false
            }
            Exit::Restart => {
                self.finish_restart();
                false
            }
        }
    }

    fn finish_leaving(&mut self) {
        if !self.at_selection() {
            if let Some(session) = self.active_session_mut() {
                session.restart();
            }
        }
        self.screen = Screen::Menu;
        self.mode = Mode::Normal;
        self.after_session_change();
    }

    pub fn pick_len(&self) -> usize {
        match self.screen {
            Screen::Gpe => self.scenarios.len(),
            Screen::Lecturette => self.topics.len(),
            _ => 0,
        }
    }

    // -----------------------------------------------------------------------
    // Session actions
    // -----------------------------------------------------------------------

    fn report_flow(&mut self, result: Result<Vec<Dispatch>, FlowError>) {
        match result {
            Ok(dispatches) => self.dispatch(dispatches),
            Err(e) => self.status = Some(e.to_string()),
        }
        self.body_scroll = 0;
        self.after_session_change();
    }

    /// Enter on a selection stage: choose the highlighted item and begin.
    pub fn begin_session(&mut self) {
        let picked = self.pick_state.selected();
        let selected = match self.screen {
            Screen::Gpe => picked
                .and_then(|i| self.scenarios.get(i).cloned())
                .is_some_and(|s| self.gpe.select(s)),
            Screen::Lecturette => picked
                .and_then(|i| self.topics.get(i).cloned())
                .is_some_and(|t| self.lecturette.select(t)),
            Screen::Screening => true,
            _ => return,
        };
        if !selected && self.catalog_loading() {
            self.status = Some("Catalog still loading".into());
            return;
        }
        let Some(session) = self.active_session_mut() else {
            return;
        };
        let result = session.begin();
        if result.is_ok() {
            tracing::info!(screen = self.screen.title(), "test started");
        }
        self.report_flow(result);
    }

    pub fn submit_stage(&mut self) {
        if let Some(session) = self.active_session_mut() {
            let result = session.submit();
            self.report_flow(result);
        }
    }

    pub fn skip_stage(&mut self) {
        if let Some(session) = self.active_session_mut() {
            let result = session.skip();
            self.report_flow(result);
        }
    }

    /// Starts a stopped countdown, otherwise pauses or resumes it.
    pub fn toggle_timer(&mut self) {
        let Some(session) = self.active_session_mut() else {
            return;
        };
        let Some(started) = session.countdown().map(|c| c.has_started()) else {
            self.status = Some("No timer on this stage".into());
            return;
        };
        if started {
            if let Err(e) = session.toggle_timer() {
                self.status = Some(e.to_string());
            }
        } else {
            session.start_timer();
        }
        self.after_session_change();
    }

    /// Restarts the on-screen test, asking first if an attempt is running.
    pub fn restart_session(&mut self) {
        if self.test_in_progress() {
            self.pending_exit = Exit::Restart;
            self.mode = Mode::ConfirmQuit;
            return;
        }
        self.finish_restart();
    }

    fn finish_restart(&mut self) {
        let Some(session) = self.active_session_mut() else {
            return;
        };
        session.restart();
        let prefetch = session.open();
        tracing::info!(screen = self.screen.title(), "test restarted");
        self.dispatch(prefetch);
        self.body_scroll = 0;
        self.mode = Mode::Normal;
        let len = self.pick_len();
        self.pick_state.select((len > 0).then_some(0));
        self.after_session_change();
    }

    pub fn post_counter_point(&mut self) {
        if self.screen != Screen::Gpe {
            return;
        }
        if let Err(e) = self.gpe.post_counter_point() {
            self.status = Some(e.to_string());
        }
    }

    pub fn speak_briefing(&mut self) {
        if self.screen != Screen::Gpe {
            return;
        }
        match self.gpe.speak_briefing() {
            Ok(d) => {
                self.dispatch(vec![d]);
                self.status = Some("Synthesizing briefing audio...".into());
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    pub fn oir_choose(&mut self, option: usize) {
        if self.screen != Screen::Screening {
            return;
        }
        if let Some(sheet) = self.screening.active_sheet_mut() {
            if sheet.choose(option) {
                sheet.next();
            }
        }
    }

    pub fn oir_step(&mut self, forward: bool) {
        if self.screen != Screen::Screening {
            return;
        }
        if let Some(sheet) = self.screening.active_sheet_mut() {
            if forward {
                sheet.next();
            } else {
                sheet.prev();
            }
        }
    }

    // -----------------------------------------------------------------------
    // Text capture
    // -----------------------------------------------------------------------

    fn stage_takes_text(&mut self) -> bool {
        self.active_session_mut()
            .is_some_and(|s| s.input_mut().is_some())
    }

    pub fn enter_insert(&mut self) {
        if self.stage_takes_text() {
            self.mode = Mode::Insert;
        } else {
            self.status = Some("This stage takes no typing".into());
        }
    }

    pub fn insert_char(&mut self, c: char) {
        if let Some(field) = self.active_session_mut().and_then(|s| s.input_mut()) {
            field.push(c);
        }
    }

    pub fn delete_char(&mut self) {
        if let Some(field) = self.active_session_mut().and_then(|s| s.input_mut()) {
            field.pop();
        }
    }

    pub fn enter_path_prompt(&mut self) {
        match self.active_session().and_then(|s| s.accepts_attachment()) {
            Some(_) => {
                self.path_input.clear();
                self.mode = Mode::PathPrompt;
            }
            None => self.status = Some("This stage takes no attachment".into()),
        }
    }

    /// Sends the typed path for transcription into the current stage.
    pub fn submit_path(&mut self) {
        self.mode = Mode::Normal;
        let raw = std::mem::take(&mut self.path_input);
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return;
        }
        let path = PathBuf::from(trimmed);
        let Some(session) = self.active_session_mut() else {
            return;
        };
        match session.attach(path) {
            Ok(d) => {
                tracing::info!(ticket = %d.ticket, "transcription requested");
                self.dispatch(vec![d]);
                self.status = Some("Transcribing...".into());
            }
            Err(e) => self.status = Some(e.to_string()),
        }
        self.after_session_change();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssbprep_core::catalog::{default_scenarios, default_topics};
    use ssbprep_core::error::CoreError;

    fn loaded() -> AppState {
        let mut state = AppState::default();
        state.scenarios = default_scenarios();
        state.topics = default_topics();
        state
    }

    fn fill(state: &mut AppState, text: &str) {
        for c in text.chars() {
            state.insert_char(c);
        }
    }

    #[test]
    fn gpe_begins_with_highlighted_scenario() {
        let mut state = loaded();
        state.open_screen(Screen::Gpe);
        state.pick_state.select(Some(1));
        state.begin_session();
        assert_eq!(state.gpe.phase(), GpePhase::Briefing);
        assert_eq!(
            state.gpe.scenario().map(|s| s.id.as_str()),
            Some(default_scenarios()[1].id.as_str())
        );
        assert!(state.test_in_progress());
    }

    #[test]
    fn blank_submit_shows_guard_message() {
        let mut state = loaded();
        state.open_screen(Screen::Gpe);
        state.begin_session();
        state.skip_stage();
        assert_eq!(state.gpe.phase(), GpePhase::IndividualSolution);
        state.submit_stage();
        assert_eq!(state.gpe.phase(), GpePhase::IndividualSolution);
        assert_eq!(state.status.as_deref(), Some("write something before submitting"));

        state.enter_insert();
        assert_eq!(state.mode, Mode::Insert);
        fill(&mut state, "Evacuate the school first.");
        assert_eq!(state.gpe.individual_solution(), "Evacuate the school first.");
    }

    #[test]
    fn leaving_a_running_test_asks_first() {
        let mut state = loaded();
        state.open_screen(Screen::Lecturette);
        state.begin_session();
        assert_eq!(state.lecturette.phase(), LecturettePhase::Preparation);

        state.leave_screen();
        assert_eq!(state.mode, Mode::ConfirmQuit);
        assert_eq!(state.screen, Screen::Lecturette);

        assert!(!state.confirm_exit());
        assert_eq!(state.screen, Screen::Menu);
        assert_eq!(state.lecturette.phase(), LecturettePhase::Selection);
    }

    #[test]
    fn quitting_from_menu_needs_no_confirmation() {
        let mut state = loaded();
        assert!(state.request_quit());
        state.open_screen(Screen::Gpe);
        state.begin_session();
        assert!(!state.request_quit());
        assert_eq!(state.pending_exit, Exit::App);
        assert!(state.confirm_exit());
    }

    #[test]
    fn result_for_restarted_session_is_dropped() {
        let mut state = loaded();
        state.open_screen(Screen::Gpe);
        let old = state.gpe.session_id();
        state.begin_session();
        state.restart_session();
        assert_eq!(state.mode, Mode::ConfirmQuit);
        assert!(!state.confirm_exit());
        assert_ne!(state.gpe.session_id(), old);

        state.on_job_done(Completion {
            ticket: Ticket { session: old, seq: 1 },
            result: Err(CoreError::Config("late".into())),
        });
        assert_eq!(state.status, None);
        assert_eq!(state.gpe.phase(), GpePhase::Selection);
    }

    #[test]
    fn catalog_result_fills_lists() {
        let mut state = AppState::default();
        state.start();
        assert!(state.catalog_loading());
        let ticket = Ticket {
            session: state.jobs.session,
            seq: 1,
        };
        state.on_job_done(Completion {
            ticket,
            result: Ok(JobOutput::Catalog {
                scenarios: default_scenarios(),
                topics: default_topics(),
            }),
        });
        assert!(!state.catalog_loading());
        assert_eq!(state.scenarios.len(), default_scenarios().len());
        assert_eq!(state.pick_state.selected(), Some(0));
    }

    #[test]
    fn insert_mode_ends_when_stage_changes() {
        let mut state = loaded();
        state.open_screen(Screen::Screening);
        state.begin_session();
        assert_eq!(state.screening.phase(), ScreeningPhase::OirVerbal);
        state.enter_insert();
        assert_eq!(state.mode, Mode::Normal, "OIR stages take no typing");

        state.oir_choose(1);
        assert_eq!(state.screening.active_sheet().map(|s| s.answered()), Some(1));
        assert_eq!(state.screening.active_sheet().map(|s| s.cursor()), Some(1));
    }

    #[test]
    fn path_prompt_only_on_attachment_stages() {
        let mut state = loaded();
        state.open_screen(Screen::Lecturette);
        state.enter_path_prompt();
        assert_eq!(state.mode, Mode::Normal);
        state.begin_session();
        state.skip_stage();
        assert_eq!(state.lecturette.phase(), LecturettePhase::Delivery);
        state.enter_path_prompt();
        assert_eq!(state.mode, Mode::PathPrompt);
        state.path_input = "  ".into();
        state.submit_path();
        assert_eq!(state.mode, Mode::Normal);
    }
}
