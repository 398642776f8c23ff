//! Lecturette: pick a topic, prepare for three minutes, speak for three minutes.
//!
//! The preparation timer is the one user-driven clock in the app: it starts only when
//! the candidate asks for it and may be paused. The talk itself is typed or
//! transcribed from a recording.

use std::fmt;
use std::path::PathBuf;

use crate::error::FlowError;
use crate::evaluation::{EvaluationRequest, LecturetteSubmission};
use crate::flow::{Phase, PhaseMachine, PhaseSpec, Trigger};
use crate::jobs::{Completion, Dispatch, Job, JobOutput, SessionId, TranscriptionSource};
use crate::timer::Countdown;
use crate::types::Topic;

use super::{merge_transcript, no_attachment, AttachKind, TicketBook, TimedSession, Verdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LecturettePhase {
    Selection,
    Preparation,
    Delivery,
    Evaluating,
    Completed,
}

impl fmt::Display for LecturettePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LecturettePhase::Selection => "Select Topic",
            LecturettePhase::Preparation => "Preparation",
            LecturettePhase::Delivery => "Delivery",
            LecturettePhase::Evaluating => "Evaluating",
            LecturettePhase::Completed => "Completed",
        })
    }
}

impl Phase for LecturettePhase {
    const INITIAL: Self = LecturettePhase::Selection;
    const TRANSITIONS: &'static [(Self, Trigger, Self)] = &[
        (LecturettePhase::Selection, Trigger::Begin, LecturettePhase::Preparation),
        (LecturettePhase::Preparation, Trigger::Submit, LecturettePhase::Delivery),
        (LecturettePhase::Preparation, Trigger::Skip, LecturettePhase::Delivery),
        (LecturettePhase::Preparation, Trigger::TimerExpired, LecturettePhase::Delivery),
        (LecturettePhase::Delivery, Trigger::Submit, LecturettePhase::Evaluating),
        (LecturettePhase::Delivery, Trigger::TimerExpired, LecturettePhase::Evaluating),
        (LecturettePhase::Evaluating, Trigger::EvaluationSettled, LecturettePhase::Completed),
    ];

    fn ordinal(self) -> u8 {
        self as u8
    }

    fn spec(self) -> PhaseSpec {
        match self {
            LecturettePhase::Selection
            | LecturettePhase::Evaluating
            | LecturettePhase::Completed => {
                PhaseSpec::untimed()
            }
            LecturettePhase::Preparation => PhaseSpec::timed(180).skippable().manual_pausable(),
            LecturettePhase::Delivery => PhaseSpec::timed(180).requires_text(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Awaiting {
    Outline,
    Transcript,
    Evaluation,
}

#[derive(Debug, Clone)]
pub struct LecturetteSession {
    machine: PhaseMachine<LecturettePhase>,
    book: TicketBook<LecturettePhase, Awaiting>,
    topic: Option<Topic>,
    outline: Option<String>,
    notes: String,
    speech: String,
    verdict: Option<Verdict>,
    notice: Option<String>,
}

impl Default for LecturetteSession {
    fn default() -> Self {
        Self::new()
    }
}

impl LecturetteSession {
    pub fn new() -> Self {
        Self {
            machine: PhaseMachine::new(),
            book: TicketBook::new(),
            topic: None,
            outline: None,
            notes: String::new(),
            speech: String::new(),
            verdict: None,
            notice: None,
        }
    }

    pub fn phase(&self) -> LecturettePhase {
        self.machine.phase()
    }

    pub fn topic(&self) -> Option<&Topic> {
        self.topic.as_ref()
    }

    pub fn outline(&self) -> Option<&str> {
        self.outline.as_deref()
    }

    pub fn outline_loading(&self) -> bool {
        self.book.awaiting(|k| k == Awaiting::Outline)
    }

    /// Candidate's own preparation notes.
    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn speech(&self) -> &str {
        &self.speech
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        self.verdict.as_ref()
    }

    pub fn select(&mut self, topic: Topic) -> bool {
        if self.phase() != LecturettePhase::Selection {
            return false;
        }
        self.topic = Some(topic);
        true
    }

    fn captured_text(&self) -> &str {
        match self.phase() {
            LecturettePhase::Delivery => &self.speech,
            _ => "",
        }
    }

    fn advance(&mut self, trigger: Trigger) -> Result<Vec<Dispatch>, FlowError> {
        let text = self.captured_text().to_owned();
        let next = self.machine.fire(trigger, &text)?;
        Ok(self.entered(next))
    }

    fn entered(&mut self, phase: LecturettePhase) -> Vec<Dispatch> {
        let Some(topic) = self.topic.clone() else {
            return Vec::new();
        };
        match phase {
            LecturettePhase::Preparation => vec![self.book.issue(
                Awaiting::Outline,
                Some(LecturettePhase::Preparation),
                Job::LecturetteOutline { topic },
            )],
            LecturettePhase::Evaluating => {
                let outline = match (self.outline.as_deref(), self.notes.trim()) {
                    (Some(o), "") => Some(o.to_owned()),
                    (Some(o), notes) => Some(format!("{o}\n\nCandidate notes:\n{notes}")),
                    (None, "") => None,
                    (None, notes) => Some(notes.to_owned()),
                };
                let request = EvaluationRequest::Lecturette(LecturetteSubmission {
                    topic_title: topic.title,
                    outline,
                    speech: self.speech.clone(),
                });
                vec![self.book.issue(
                    Awaiting::Evaluation,
                    Some(LecturettePhase::Evaluating),
                    Job::Evaluate(request),
                )]
            }
            _ => Vec::new(),
        }
    }
}

impl TimedSession for LecturetteSession {
    fn session_id(&self) -> SessionId {
        self.book.session()
    }

    fn countdown(&self) -> Option<&Countdown> {
        self.machine.countdown()
    }

    fn epoch(&self) -> u64 {
        self.machine.epoch()
    }

    fn wants_ticks(&self) -> bool {
        self.machine.wants_ticks()
    }

    fn tick(&mut self, epoch: u64) -> Vec<Dispatch> {
        match self.machine.tick(epoch) {
            Some(next) => self.entered(next),
            None => Vec::new(),
        }
    }

    fn on_job(&mut self, completion: Completion) -> Vec<Dispatch> {
        let Some(kind) = self.book.redeem(completion.ticket, self.phase()) else {
            return Vec::new();
        };
        match (kind, completion.result) {
            (Awaiting::Outline, Ok(JobOutput::Outline(text))) => self.outline = Some(text),
            (Awaiting::Outline, Err(e)) => {
                self.notice =
                    Some(format!("Outline unavailable, prepare from your own notes: {e}"));
            }
            (Awaiting::Transcript, Ok(JobOutput::Transcript(text))) => {
                if self.phase().ordinal() < LecturettePhase::Evaluating.ordinal() {
                    merge_transcript(&mut self.speech, &text);
                }
            }
            (Awaiting::Transcript, Err(e)) => {
                self.notice = Some(format!("Transcription failed: {e}"));
            }
            (Awaiting::Evaluation, result) => {
                self.verdict = Some(Verdict::from_job(result));
                if let Err(e) = self.machine.fire(Trigger::EvaluationSettled, "") {
                    tracing::warn!(error = %e, "evaluation settled outside evaluating phase");
                }
            }
            (kind, Ok(other)) => {
                tracing::warn!(?kind, ?other, "unexpected job output for lecturette session");
            }
        }
        Vec::new()
    }

    fn begin(&mut self) -> Result<Vec<Dispatch>, FlowError> {
        if self.topic.is_none() {
            return Err(FlowError::NoSession);
        }
        self.advance(Trigger::Begin)
    }

    fn submit(&mut self) -> Result<Vec<Dispatch>, FlowError> {
        self.advance(Trigger::Submit)
    }

    fn skip(&mut self) -> Result<Vec<Dispatch>, FlowError> {
        self.advance(Trigger::Skip)
    }

    fn restart(&mut self) {
        *self = Self::new();
    }

    fn start_timer(&mut self) {
        self.machine.start_timer();
    }

    fn toggle_timer(&mut self) -> Result<(), FlowError> {
        self.machine.toggle_timer()
    }

    fn input_mut(&mut self) -> Option<&mut String> {
        match self.phase() {
            LecturettePhase::Preparation => Some(&mut self.notes),
            LecturettePhase::Delivery => Some(&mut self.speech),
            _ => None,
        }
    }

    fn accepts_attachment(&self) -> Option<AttachKind> {
        (self.phase() == LecturettePhase::Delivery).then_some(TranscriptionSource::Audio)
    }

    fn attach(&mut self, path: PathBuf) -> Result<Dispatch, FlowError> {
        if self.phase() != LecturettePhase::Delivery {
            return Err(no_attachment(self.phase()));
        }
        let job = Job::Transcribe {
            path,
            source: TranscriptionSource::Audio,
        };
        Ok(self.book.issue(Awaiting::Transcript, None, job))
    }

    fn is_loading(&self) -> bool {
        self.book.awaiting(|_| true)
    }

    fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_topics;
    use crate::flow::backward_row;

    fn preparing() -> (LecturetteSession, Dispatch) {
        let mut s = LecturetteSession::new();
        s.select(default_topics().remove(0));
        let mut d = s.begin().unwrap();
        assert_eq!(s.phase(), LecturettePhase::Preparation);
        (s, d.remove(0))
    }

    #[test]
    fn table_is_forward_only() {
        assert_eq!(backward_row::<LecturettePhase>(), None);
    }

    #[test]
    fn prep_timer_waits_for_the_candidate() {
        let (mut s, d) = preparing();
        assert!(matches!(d.job, Job::LecturetteOutline { .. }));
        assert!(!s.wants_ticks());
        assert_eq!(s.countdown().map(Countdown::remaining), Some(180));

        s.start_timer();
        assert!(s.wants_ticks());
        let epoch = s.epoch();
        s.tick(epoch);
        s.toggle_timer().unwrap();
        assert!(!s.wants_ticks());
        assert!(s.tick(s.epoch()).is_empty());
        assert_eq!(s.countdown().map(Countdown::remaining), Some(179));
        s.toggle_timer().unwrap();
        assert!(s.wants_ticks());
    }

    #[test]
    fn delivery_timer_cannot_be_paused() {
        let (mut s, _) = preparing();
        s.skip().unwrap();
        assert_eq!(s.phase(), LecturettePhase::Delivery);
        assert!(s.wants_ticks());
        assert_eq!(s.toggle_timer(), Err(FlowError::NotPausable));
    }

    #[test]
    fn outline_arriving_after_prep_is_dropped() {
        let (mut s, d) = preparing();
        s.submit().unwrap();
        s.on_job(Completion {
            ticket: d.ticket,
            result: Ok(JobOutput::Outline("late outline".into())),
        });
        assert_eq!(s.outline(), None);
    }

    #[test]
    fn transcript_merges_into_speech() {
        let (mut s, _) = preparing();
        s.skip().unwrap();
        s.input_mut().unwrap().push_str("Good morning.");
        let d = s.attach(PathBuf::from("talk.wav")).unwrap();
        s.on_job(Completion {
            ticket: d.ticket,
            result: Ok(JobOutput::Transcript("Today I will speak on cyber warfare.".into())),
        });
        assert_eq!(s.speech(), "Good morning.\n\nToday I will speak on cyber warfare.");

        let evaluate = s.submit().unwrap().remove(0);
        let Job::Evaluate(EvaluationRequest::Lecturette(sub)) = evaluate.job else {
            panic!("expected lecturette evaluation");
        };
        assert!(sub.speech.contains("cyber warfare"));
    }

    #[test]
    fn attach_outside_delivery_is_refused() {
        let (mut s, _) = preparing();
        assert!(s.accepts_attachment().is_none());
        assert!(s.attach(PathBuf::from("x.wav")).is_err());
    }

    #[test]
    fn mismatched_evaluation_output_fails_the_verdict() {
        let (mut s, _) = preparing();
        s.skip().unwrap();
        s.input_mut().unwrap().push_str("Good morning. Cyber warfare is here to stay.");
        let evaluate = s.submit().unwrap().remove(0);
        assert_eq!(s.phase(), LecturettePhase::Evaluating);

        s.on_job(Completion {
            ticket: evaluate.ticket,
            result: Ok(JobOutput::Outline("not an evaluation".into())),
        });
        assert_eq!(s.phase(), LecturettePhase::Completed);
        let Some(Verdict::Failed { error }) = s.verdict() else {
            panic!("expected a failed verdict, got {:?}", s.verdict());
        };
        assert!(error.contains("unexpected outline output"), "{error}");
    }
}
