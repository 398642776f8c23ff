//! Per-feature test sessions.
//!
//! Each session owns a [`PhaseMachine`], the content it was started with, the text
//! captured so far, and a [`TicketBook`] of outstanding background requests. Every
//! operation is synchronous and returns the [`Dispatch`]es it wants run; results come
//! back through `on_job`. Results for a ticket the book no longer expects, or for a
//! phase the machine has already left, are dropped.

pub mod gpe;
pub mod lecturette;
pub mod screening;

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{CoreError, FlowError};
use crate::evaluation::{AssessmentResult, Settled};
use crate::flow::Phase;
use crate::jobs::{
    Completion, Dispatch, Job, JobOutput, JobResult, SessionId, Ticket, TranscriptionSource,
};
use crate::timer::Countdown;

pub use gpe::{GpePhase, GpeSession};
pub use lecturette::{LecturettePhase, LecturetteSession};
pub use screening::{ScreeningPhase, ScreeningSession};

/// What an outstanding ticket was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Expectation<P, K> {
    /// Result is only wanted while the machine is still in this phase.
    pub bound_to: Option<P>,
    pub kind: K,
}

/// Outstanding requests of one session lifetime.
#[derive(Debug, Clone)]
pub(crate) struct TicketBook<P, K> {
    session: SessionId,
    next_seq: u64,
    outstanding: HashMap<u64, Expectation<P, K>>,
}

impl<P: Phase, K: Copy> TicketBook<P, K> {
    pub fn new() -> Self {
        Self {
            session: SessionId::next(),
            next_seq: 0,
            outstanding: HashMap::new(),
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn issue(&mut self, kind: K, bound_to: Option<P>, job: Job) -> Dispatch {
        self.next_seq += 1;
        let ticket = Ticket {
            session: self.session,
            seq: self.next_seq,
        };
        self.outstanding.insert(ticket.seq, Expectation { bound_to, kind });
        Dispatch { ticket, job }
    }

    /// Removes and returns the expectation for `ticket` if it is still wanted in
    /// `current`. A result for a left phase is consumed and dropped.
    pub fn redeem(&mut self, ticket: Ticket, current: P) -> Option<K> {
        if ticket.session != self.session {
            return None;
        }
        let exp = self.outstanding.remove(&ticket.seq)?;
        match exp.bound_to {
            Some(phase) if phase != current => {
                tracing::debug!(
                    %ticket,
                    bound_to = %phase,
                    now = %current,
                    "dropping stale result"
                );
                None
            }
            _ => Some(exp.kind),
        }
    }

    /// True while a request of `kind` is outstanding.
    pub fn awaiting(&self, pred: impl Fn(K) -> bool) -> bool {
        self.outstanding.values().any(|e| pred(e.kind))
    }
}

/// Which kind of file a stage accepts for transcription.
pub type AttachKind = TranscriptionSource;

/// How the final evaluation of a session ended, as shown on the result screen.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Completed {
        report_id: String,
        result: AssessmentResult,
    },
    /// Report saved but not evaluated; can be retried from the report list.
    Pending { report_id: String, error: String },
    /// The report could not even be stored.
    Failed { error: String },
}

impl Verdict {
    fn from_completion(result: Result<Settled, CoreError>) -> Self {
        match result {
            Ok(Settled::Completed { report_id, result }) => {
                Verdict::Completed { report_id, result }
            }
            Ok(Settled::Pending { report_id, error }) => Verdict::Pending {
                report_id,
                error: error.to_string(),
            },
            Err(e) => Verdict::Failed { error: e.to_string() },
        }
    }

    /// Reads the result of an evaluation ticket.
    pub(crate) fn from_job(result: JobResult) -> Self {
        Self::from_completion(result.and_then(|out| match out {
            JobOutput::Evaluation(settled) => Ok(settled),
            other => Err(CoreError::UnexpectedOutput {
                output: other.name(),
            }),
        }))
    }
}

/// Object-safe surface the app drives for whichever session is on screen.
pub trait TimedSession {
    fn session_id(&self) -> SessionId;

    fn countdown(&self) -> Option<&Countdown>;

    /// Timer generation of the current phase.
    fn epoch(&self) -> u64;

    fn wants_ticks(&self) -> bool;

    /// Applies one timer tick; returns work triggered by an expiry transition.
    fn tick(&mut self, epoch: u64) -> Vec<Dispatch>;

    fn on_job(&mut self, completion: Completion) -> Vec<Dispatch>;

    /// Work to start when the session is shown or restarted (prefetching content).
    fn open(&mut self) -> Vec<Dispatch> {
        Vec::new()
    }

    /// Moves past the selection stage.
    ///
    /// # Errors
    ///
    /// [`FlowError::NoSession`] when nothing has been selected yet.
    fn begin(&mut self) -> Result<Vec<Dispatch>, FlowError>;

    /// Manual "submit / ready / next" for the current stage.
    ///
    /// # Errors
    ///
    /// Guard failures from the phase machine.
    fn submit(&mut self) -> Result<Vec<Dispatch>, FlowError>;

    /// # Errors
    ///
    /// [`FlowError::NotSkippable`] outside skippable stages.
    fn skip(&mut self) -> Result<Vec<Dispatch>, FlowError>;

    /// Discards everything and returns to selection.
    fn restart(&mut self);

    /// Starts a manually-started countdown.
    fn start_timer(&mut self);

    /// # Errors
    ///
    /// [`FlowError::NotPausable`] for exam timers.
    fn toggle_timer(&mut self) -> Result<(), FlowError>;

    /// Text field the current stage captures into, if any.
    fn input_mut(&mut self) -> Option<&mut String>;

    /// File kind the current stage accepts for transcription, if any.
    fn accepts_attachment(&self) -> Option<AttachKind>;

    /// Requests transcription of `path` into the current stage's field.
    ///
    /// # Errors
    ///
    /// [`FlowError::NoTransition`] when the stage takes no attachment.
    fn attach(&mut self, path: PathBuf) -> Result<Dispatch, FlowError>;

    /// True while any background request is outstanding.
    fn is_loading(&self) -> bool;

    /// Last non-fatal error to show in the status bar.
    fn take_notice(&mut self) -> Option<String>;
}

/// Appends a transcript to a field, separated by a blank line when non-empty.
pub(crate) fn merge_transcript(field: &mut String, transcript: &str) {
    let transcript = transcript.trim();
    if transcript.is_empty() {
        return;
    }
    if !field.trim().is_empty() {
        field.push_str("\n\n");
    }
    field.push_str(transcript);
}

pub(crate) fn no_attachment(phase: impl std::fmt::Display) -> FlowError {
    FlowError::NoTransition {
        phase: phase.to_string(),
        trigger: "attach".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{PhaseSpec, Trigger};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Two {
        A,
        B,
    }

    impl std::fmt::Display for Two {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    impl Phase for Two {
        const INITIAL: Self = Two::A;
        const TRANSITIONS: &'static [(Self, Trigger, Self)] = &[(Two::A, Trigger::Begin, Two::B)];
        fn ordinal(self) -> u8 {
            self as u8
        }
        fn spec(self) -> PhaseSpec {
            PhaseSpec::untimed()
        }
    }

    #[test]
    fn phase_bound_ticket_is_dropped_after_leaving() {
        let mut book: TicketBook<Two, u8> = TicketBook::new();
        let d = book.issue(1, Some(Two::A), Job::LoadCatalog);
        assert!(book.awaiting(|k| k == 1));
        assert_eq!(book.redeem(d.ticket, Two::B), None);
        assert!(!book.awaiting(|k| k == 1));
    }

    #[test]
    fn foreign_session_ticket_is_ignored() {
        let mut book: TicketBook<Two, u8> = TicketBook::new();
        let mine = book.issue(7, None, Job::LoadCatalog);
        let other: TicketBook<Two, u8> = TicketBook::new();
        let foreign = Ticket {
            session: other.session(),
            seq: mine.ticket.seq,
        };
        assert_eq!(book.redeem(foreign, Two::A), None);
        assert_eq!(book.redeem(mine.ticket, Two::B), Some(7));
    }

    #[test]
    fn transcripts_merge_with_separator() {
        let mut field = String::new();
        merge_transcript(&mut field, "  first  ");
        merge_transcript(&mut field, "second");
        merge_transcript(&mut field, "   ");
        assert_eq!(field, "first\n\nsecond");
    }
}
