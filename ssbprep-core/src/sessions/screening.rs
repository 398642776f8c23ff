//! Screening battery: two OIR sets followed by the PPDT.
//!
//! Selection → OIR verbal (10 min) → OIR non-verbal (10 min) → picture observation
//! (30 s) → story writing (4 min) → narration (1 min) → Evaluating → Completed.
//!
//! Question sets and the picture are prefetched when the session is opened. A stage
//! whose content has not arrived by the time it is entered uses the built-in
//! fallback, and the late answer is ignored.

use std::fmt;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::content::fallback_picture;
use crate::error::FlowError;
use crate::evaluation::{EvaluationRequest, ScreeningSubmission};
use crate::flow::{Phase, PhaseMachine, PhaseSpec, Trigger};
use crate::jobs::{Completion, Dispatch, Job, JobOutput, SessionId, TranscriptionSource};
use crate::oir::{OirSet, OirSheet};
use crate::timer::Countdown;

use super::{merge_transcript, no_attachment, AttachKind, TicketBook, TimedSession, Verdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreeningPhase {
    Selection,
    OirVerbal,
    OirNonVerbal,
    PictureObservation,
    StoryWriting,
    Narration,
    Evaluating,
    Completed,
}

impl fmt::Display for ScreeningPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScreeningPhase::Selection => "Instructions",
            ScreeningPhase::OirVerbal => "OIR: Verbal",
            ScreeningPhase::OirNonVerbal => "OIR: Non-verbal",
            ScreeningPhase::PictureObservation => "PPDT: Observe Picture",
            ScreeningPhase::StoryWriting => "PPDT: Write Story",
            ScreeningPhase::Narration => "PPDT: Narration",
            ScreeningPhase::Evaluating => "Evaluating",
            ScreeningPhase::Completed => "Completed",
        })
    }
}

impl Phase for ScreeningPhase {
    const INITIAL: Self = ScreeningPhase::Selection;
    const TRANSITIONS: &'static [(Self, Trigger, Self)] = &[
        (ScreeningPhase::Selection, Trigger::Begin, ScreeningPhase::OirVerbal),
        (ScreeningPhase::OirVerbal, Trigger::Submit, ScreeningPhase::OirNonVerbal),
        (ScreeningPhase::OirVerbal, Trigger::TimerExpired, ScreeningPhase::OirNonVerbal),
        (ScreeningPhase::OirNonVerbal, Trigger::Submit, ScreeningPhase::PictureObservation),
        (ScreeningPhase::OirNonVerbal, Trigger::TimerExpired, ScreeningPhase::PictureObservation),
        (ScreeningPhase::PictureObservation, Trigger::TimerExpired, ScreeningPhase::StoryWriting),
        (ScreeningPhase::StoryWriting, Trigger::Submit, ScreeningPhase::Narration),
        (ScreeningPhase::StoryWriting, Trigger::TimerExpired, ScreeningPhase::Narration),
        (ScreeningPhase::Narration, Trigger::Submit, ScreeningPhase::Evaluating),
        (ScreeningPhase::Narration, Trigger::TimerExpired, ScreeningPhase::Evaluating),
        (ScreeningPhase::Evaluating, Trigger::EvaluationSettled, ScreeningPhase::Completed),
    ];

    fn ordinal(self) -> u8 {
        self as u8
    }

    fn spec(self) -> PhaseSpec {
        match self {
            ScreeningPhase::Selection | ScreeningPhase::Evaluating | ScreeningPhase::Completed => {
                PhaseSpec::untimed()
            }
            ScreeningPhase::OirVerbal | ScreeningPhase::OirNonVerbal => PhaseSpec::timed(600),
            ScreeningPhase::PictureObservation => PhaseSpec::timed(30),
            ScreeningPhase::StoryWriting => PhaseSpec::timed(240).requires_text(),
            ScreeningPhase::Narration => PhaseSpec::timed(60).requires_text(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Story,
    Narration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Awaiting {
    Questions(OirSet),
    Picture,
    Transcript(Field),
    Evaluation,
}

/// The PPDT stimulus, described in words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picture {
    pub description: String,
    pub fallback: bool,
}

#[derive(Debug, Clone)]
pub struct ScreeningSession {
    machine: PhaseMachine<ScreeningPhase>,
    book: TicketBook<ScreeningPhase, Awaiting>,
    verbal: Option<OirSheet>,
    non_verbal: Option<OirSheet>,
    picture: Option<Picture>,
    story: String,
    narration: String,
    verdict: Option<Verdict>,
    notice: Option<String>,
}

impl Default for ScreeningSession {
    fn default() -> Self {
        Self::new()
    }
}

fn seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl ScreeningSession {
    pub fn new() -> Self {
        Self {
            machine: PhaseMachine::new(),
            book: TicketBook::new(),
            verbal: None,
            non_verbal: None,
            picture: None,
            story: String::new(),
            narration: String::new(),
            verdict: None,
            notice: None,
        }
    }

    pub fn phase(&self) -> ScreeningPhase {
        self.machine.phase()
    }

    pub fn picture(&self) -> Option<&Picture> {
        self.picture.as_ref()
    }

    pub fn story(&self) -> &str {
        &self.story
    }

    pub fn narration(&self) -> &str {
        &self.narration
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        self.verdict.as_ref()
    }

    pub fn sheet(&self, set: OirSet) -> Option<&OirSheet> {
        match set {
            OirSet::Verbal => self.verbal.as_ref(),
            OirSet::NonVerbal => self.non_verbal.as_ref(),
        }
    }

    /// The sheet being answered in the current stage.
    pub fn active_sheet(&self) -> Option<&OirSheet> {
        self.active_set().and_then(|set| self.sheet(set))
    }

    pub fn active_sheet_mut(&mut self) -> Option<&mut OirSheet> {
        match self.active_set()? {
            OirSet::Verbal => self.verbal.as_mut(),
            OirSet::NonVerbal => self.non_verbal.as_mut(),
        }
    }

    /// Number of prefetches still outstanding (question sets plus picture).
    pub fn pending_content(&self) -> usize {
        [
            self.book.awaiting(|k| k == Awaiting::Questions(OirSet::Verbal)),
            self.book.awaiting(|k| k == Awaiting::Questions(OirSet::NonVerbal)),
            self.book.awaiting(|k| k == Awaiting::Picture),
        ]
        .into_iter()
        .filter(|b| *b)
        .count()
    }

    fn active_set(&self) -> Option<OirSet> {
        match self.phase() {
            ScreeningPhase::OirVerbal => Some(OirSet::Verbal),
            ScreeningPhase::OirNonVerbal => Some(OirSet::NonVerbal),
            _ => None,
        }
    }

    fn percentage(&self, set: OirSet) -> f32 {
        self.sheet(set).map_or(0.0, OirSheet::percentage)
    }

    fn captured_text(&self) -> &str {
        match self.phase() {
            ScreeningPhase::StoryWriting => &self.story,
            ScreeningPhase::Narration => &self.narration,
            _ => "",
        }
    }

    fn advance(&mut self, trigger: Trigger) -> Result<Vec<Dispatch>, FlowError> {
        let text = self.captured_text().to_owned();
        let next = self.machine.fire(trigger, &text)?;
        Ok(self.entered(next))
    }

    fn entered(&mut self, phase: ScreeningPhase) -> Vec<Dispatch> {
        match phase {
            ScreeningPhase::OirVerbal => {
                self.verbal.get_or_insert_with(|| OirSheet::fallback(OirSet::Verbal));
                Vec::new()
            }
            ScreeningPhase::OirNonVerbal => {
                self.non_verbal.get_or_insert_with(|| OirSheet::fallback(OirSet::NonVerbal));
                Vec::new()
            }
            ScreeningPhase::PictureObservation => {
                self.picture.get_or_insert_with(|| Picture {
                    description: fallback_picture(seed()).to_owned(),
                    fallback: true,
                });
                Vec::new()
            }
            ScreeningPhase::Evaluating => {
                let request = EvaluationRequest::Screening(ScreeningSubmission {
                    picture: self
                        .picture
                        .as_ref()
                        .map(|p| p.description.clone())
                        .unwrap_or_default(),
                    story: self.story.clone(),
                    narration: self.narration.clone(),
                    oir_verbal_pct: self.percentage(OirSet::Verbal),
                    oir_nonverbal_pct: self.percentage(OirSet::NonVerbal),
                });
                vec![self.book.issue(
                    Awaiting::Evaluation,
                    Some(ScreeningPhase::Evaluating),
                    Job::Evaluate(request),
                )]
            }
            _ => Vec::new(),
        }
    }
}

impl TimedSession for ScreeningSession {
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

    fn open(&mut self) -> Vec<Dispatch> {
        if self.phase() != ScreeningPhase::Selection || self.pending_content() > 0 {
            return Vec::new();
        }
        let mut out = Vec::new();
        for set in [OirSet::Verbal, OirSet::NonVerbal] {
            if self.sheet(set).is_none() {
                out.push(self.book.issue(
                    Awaiting::Questions(set),
                    None,
                    Job::OirQuestions { set },
                ));
            }
        }
        if self.picture.is_none() {
            out.push(self.book.issue(Awaiting::Picture, None, Job::PpdtPicture { seed: seed() }));
        }
        out
    }

    fn on_job(&mut self, completion: Completion) -> Vec<Dispatch> {
        let Some(kind) = self.book.redeem(completion.ticket, self.phase()) else {
            return Vec::new();
        };
        match (kind, completion.result) {
            (
                Awaiting::Questions(_),
                Ok(JobOutput::OirQuestions {
                    set,
                    questions,
                    fallback,
                }),
            ) => {
                let slot = match set {
                    OirSet::Verbal => &mut self.verbal,
                    OirSet::NonVerbal => &mut self.non_verbal,
                };
                if slot.is_none() {
                    *slot = Some(OirSheet::new(set, questions, fallback));
                } else {
                    tracing::debug!(?set, "question set arrived after its stage began; ignored");
                }
            }
            (Awaiting::Picture, Ok(JobOutput::PpdtPicture { description, fallback })) => {
                if self.picture.is_none() {
                    self.picture = Some(Picture {
                        description,
                        fallback,
                    });
                }
            }
            (Awaiting::Questions(_) | Awaiting::Picture, Err(e)) => {
                tracing::warn!(
                    error = %e,
                    "screening prefetch failed; built-in content will be used"
                );
            }
            (Awaiting::Transcript(field), Ok(JobOutput::Transcript(text))) => {
                if self.phase().ordinal() < ScreeningPhase::Evaluating.ordinal() {
                    let target = match field {
                        Field::Story => &mut self.story,
                        Field::Narration => &mut self.narration,
                    };
                    merge_transcript(target, &text);
                }
            }
            (Awaiting::Transcript(_), Err(e)) => {
                self.notice = Some(format!("Transcription failed: {e}"));
            }
            (Awaiting::Evaluation, result) => {
                self.verdict = Some(Verdict::from_job(result));
                if let Err(e) = self.machine.fire(Trigger::EvaluationSettled, "") {
                    tracing::warn!(error = %e, "evaluation settled outside evaluating phase");
                }
            }
            (kind, Ok(other)) => {
                tracing::warn!(?kind, ?other, "unexpected job output for screening session");
            }
        }
        Vec::new()
    }

    fn begin(&mut self) -> Result<Vec<Dispatch>, FlowError> {
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
            ScreeningPhase::StoryWriting => Some(&mut self.story),
            ScreeningPhase::Narration => Some(&mut self.narration),
            _ => None,
        }
    }

    fn accepts_attachment(&self) -> Option<AttachKind> {
        match self.phase() {
            ScreeningPhase::StoryWriting => Some(TranscriptionSource::Image),
            ScreeningPhase::Narration => Some(TranscriptionSource::Audio),
            _ => None,
        }
    }

    fn attach(&mut self, path: PathBuf) -> Result<Dispatch, FlowError> {
        let (field, source) = match self.phase() {
            ScreeningPhase::StoryWriting => (Field::Story, TranscriptionSource::Image),
            ScreeningPhase::Narration => (Field::Narration, TranscriptionSource::Audio),
            other => return Err(no_attachment(other)),
        };
        Ok(self
            .book
            .issue(Awaiting::Transcript(field), None, Job::Transcribe { path, source }))
    }

    fn is_loading(&self) -> bool {
        self.book.awaiting(|_| true)
    }

    fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }
}
