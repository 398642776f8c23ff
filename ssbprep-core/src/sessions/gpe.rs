//! Group Planning Exercise.
//!
//! Selection → Briefing (5 min, skippable) → Individual Solution (10 min) →
//! Group Discussion (10 min, skippable) → Final Plan (5 min) → Evaluating → Completed.
//!
//! Entering the discussion requests simulated points from the other candidates; the
//! user adds counter-points to the same list in arrival order. The briefing narrative
//! can be spoken by the GTO persona and saved as a WAV file.

use std::fmt;
use std::path::PathBuf;

use crate::error::FlowError;
use crate::evaluation::{EvaluationRequest, GpeSubmission};
use crate::flow::{Phase, PhaseMachine, PhaseSpec, Trigger};
use crate::jobs::{Completion, Dispatch, Job, JobOutput, SessionId, TranscriptionSource};
use crate::timer::Countdown;
use crate::types::{DiscussionPoint, Scenario, Speaker};

use super::{merge_transcript, no_attachment, AttachKind, TicketBook, TimedSession, Verdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpePhase {
    Selection,
    Briefing,
    IndividualSolution,
    GroupDiscussion,
    FinalPlan,
    Evaluating,
    Completed,
}

impl fmt::Display for GpePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GpePhase::Selection => "Select Scenario",
            GpePhase::Briefing => "Briefing",
            GpePhase::IndividualSolution => "Individual Solution",
            GpePhase::GroupDiscussion => "Group Discussion",
            GpePhase::FinalPlan => "Final Plan",
            GpePhase::Evaluating => "Evaluating",
            GpePhase::Completed => "Completed",
        })
    }
}

impl Phase for GpePhase {
    const INITIAL: Self = GpePhase::Selection;
    const TRANSITIONS: &'static [(Self, Trigger, Self)] = &[
        (GpePhase::Selection, Trigger::Begin, GpePhase::Briefing),
        (GpePhase::Briefing, Trigger::Submit, GpePhase::IndividualSolution),
        (GpePhase::Briefing, Trigger::Skip, GpePhase::IndividualSolution),
        (GpePhase::Briefing, Trigger::TimerExpired, GpePhase::IndividualSolution),
        (GpePhase::IndividualSolution, Trigger::Submit, GpePhase::GroupDiscussion),
        (GpePhase::IndividualSolution, Trigger::TimerExpired, GpePhase::GroupDiscussion),
        (GpePhase::GroupDiscussion, Trigger::Submit, GpePhase::FinalPlan),
        (GpePhase::GroupDiscussion, Trigger::Skip, GpePhase::FinalPlan),
        (GpePhase::GroupDiscussion, Trigger::TimerExpired, GpePhase::FinalPlan),
        (GpePhase::FinalPlan, Trigger::Submit, GpePhase::Evaluating),
        (GpePhase::FinalPlan, Trigger::TimerExpired, GpePhase::Evaluating),
        (GpePhase::Evaluating, Trigger::EvaluationSettled, GpePhase::Completed),
    ];

    fn ordinal(self) -> u8 {
        self as u8
    }

    fn spec(self) -> PhaseSpec {
        match self {
            GpePhase::Selection | GpePhase::Evaluating | GpePhase::Completed => {
                PhaseSpec::untimed()
            }
            GpePhase::Briefing => PhaseSpec::timed(300).skippable(),
            GpePhase::IndividualSolution => PhaseSpec::timed(600).requires_text(),
            GpePhase::GroupDiscussion => PhaseSpec::timed(600).skippable(),
            GpePhase::FinalPlan => PhaseSpec::timed(300).requires_text(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    IndividualSolution,
    FinalPlan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Awaiting {
    Discussion,
    Transcript(Field),
    Speech,
    Evaluation,
}

#[derive(Debug, Clone)]
pub struct GpeSession {
    machine: PhaseMachine<GpePhase>,
    book: TicketBook<GpePhase, Awaiting>,
    scenario: Option<Scenario>,
    individual_solution: String,
    discussion: Vec<DiscussionPoint>,
    draft: String,
    final_plan: String,
    briefing_audio: Option<PathBuf>,
    verdict: Option<Verdict>,
    notice: Option<String>,
}

impl Default for GpeSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GpeSession {
    pub fn new() -> Self {
        Self {
            machine: PhaseMachine::new(),
            book: TicketBook::new(),
            scenario: None,
            individual_solution: String::new(),
            discussion: Vec::new(),
            draft: String::new(),
            final_plan: String::new(),
            briefing_audio: None,
            verdict: None,
            notice: None,
        }
    }

    pub fn phase(&self) -> GpePhase {
        self.machine.phase()
    }

    pub fn scenario(&self) -> Option<&Scenario> {
        self.scenario.as_ref()
    }

    pub fn individual_solution(&self) -> &str {
        &self.individual_solution
    }

    pub fn discussion(&self) -> &[DiscussionPoint] {
        &self.discussion
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn final_plan(&self) -> &str {
        &self.final_plan
    }

    pub fn briefing_audio(&self) -> Option<&PathBuf> {
        self.briefing_audio.as_ref()
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        self.verdict.as_ref()
    }

    /// Chooses the scenario. Only allowed during selection.
    pub fn select(&mut self, scenario: Scenario) -> bool {
        if self.phase() != GpePhase::Selection {
            return false;
        }
        self.scenario = Some(scenario);
        true
    }

    /// True while simulated discussion points are still on their way.
    pub fn discussion_loading(&self) -> bool {
        self.book.awaiting(|k| k == Awaiting::Discussion)
    }

    /// Appends the draft as the candidate's counter-point.
    ///
    /// # Errors
    ///
    /// [`FlowError::EmptySubmission`] for a blank draft; [`FlowError::NoTransition`]
    /// outside the discussion.
    pub fn post_counter_point(&mut self) -> Result<(), FlowError> {
        if self.phase() != GpePhase::GroupDiscussion {
            return Err(FlowError::NoTransition {
                phase: self.phase().to_string(),
                trigger: "post".into(),
            });
        }
        let text = self.draft.trim();
        if text.is_empty() {
            return Err(FlowError::EmptySubmission);
        }
        self.discussion.push(DiscussionPoint {
            speaker: Speaker::Candidate,
            text: text.to_owned(),
        });
        self.draft.clear();
        Ok(())
    }

    /// Requests the scenario narrative as GTO speech.
    ///
    /// # Errors
    ///
    /// [`FlowError::NoSession`] before a scenario is chosen.
    pub fn speak_briefing(&mut self) -> Result<Dispatch, FlowError> {
        let scenario = self.scenario.as_ref().ok_or(FlowError::NoSession)?;
        let job = Job::Speak {
            text: format!(
                "Candidates, here is your Group Planning Exercise. {}",
                scenario.narrative
            ),
            stem: format!("gpe-{}", scenario.id),
        };
        Ok(self.book.issue(Awaiting::Speech, None, job))
    }

    fn captured_text(&self) -> &str {
        match self.phase() {
            GpePhase::IndividualSolution => &self.individual_solution,
            GpePhase::FinalPlan => &self.final_plan,
            _ => "",
        }
    }

    fn advance(&mut self, trigger: Trigger) -> Result<Vec<Dispatch>, FlowError> {
        let text = self.captured_text().to_owned();
        let next = self.machine.fire(trigger, &text)?;
        Ok(self.entered(next))
    }

    fn entered(&mut self, phase: GpePhase) -> Vec<Dispatch> {
        let Some(scenario) = self.scenario.clone() else {
            return Vec::new();
        };
        match phase {
            GpePhase::GroupDiscussion => vec![self.book.issue(
                Awaiting::Discussion,
                Some(GpePhase::GroupDiscussion),
                Job::DiscussionPoints {
                    scenario,
                    individual_solution: self.individual_solution.clone(),
                },
            )],
            GpePhase::Evaluating => {
                let request = EvaluationRequest::Gpe(GpeSubmission {
                    scenario_title: scenario.title,
                    narrative: scenario.narrative,
                    individual_solution: self.individual_solution.clone(),
                    discussion: self.discussion.clone(),
                    final_plan: self.final_plan.clone(),
                });
                vec![self.book.issue(
                    Awaiting::Evaluation,
                    Some(GpePhase::Evaluating),
                    Job::Evaluate(request),
                )]
            }
            _ => Vec::new(),
        }
    }
}

impl TimedSession for GpeSession {
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
            (Awaiting::Discussion, Ok(JobOutput::DiscussionPoints(points))) => {
                self.discussion.extend(points);
            }
            (Awaiting::Discussion, Err(e)) => {
                self.notice = Some(format!("Discussion simulation unavailable: {e}"));
            }
            (Awaiting::Transcript(field), Ok(JobOutput::Transcript(text))) => {
                if self.phase().ordinal() < GpePhase::Evaluating.ordinal() {
                    let target = match field {
                        Field::IndividualSolution => &mut self.individual_solution,
                        Field::FinalPlan => &mut self.final_plan,
                    };
                    merge_transcript(target, &text);
                }
            }
            (Awaiting::Transcript(_), Err(e)) => {
                self.notice = Some(format!("Transcription failed: {e}"));
            }
            (Awaiting::Speech, Ok(JobOutput::Speech(path))) => {
                self.notice = Some(format!("Briefing audio saved to {}", path.display()));
                self.briefing_audio = Some(path);
            }
            (Awaiting::Speech, Err(e)) => {
                self.notice = Some(format!("Narration unavailable: {e}"));
            }
            (Awaiting::Evaluation, result) => {
                self.verdict = Some(Verdict::from_job(result));
                if let Err(e) = self.machine.fire(Trigger::EvaluationSettled, "") {
                    tracing::warn!(error = %e, "evaluation settled outside evaluating phase");
                }
            }
            (kind, Ok(other)) => {
                tracing::warn!(?kind, ?other, "unexpected job output for GPE session");
            }
        }
        Vec::new()
    }

    fn begin(&mut self) -> Result<Vec<Dispatch>, FlowError> {
        if self.scenario.is_none() {
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

    fn input_mut(&mut self) -> Option<&mut String> {
        match self.phase() {
            GpePhase::IndividualSolution => Some(&mut self.individual_solution),
            GpePhase::GroupDiscussion => Some(&mut self.draft),
            GpePhase::FinalPlan => Some(&mut self.final_plan),
            _ => None,
        }
    }

    fn accepts_attachment(&self) -> Option<AttachKind> {
        match self.phase() {
            GpePhase::IndividualSolution | GpePhase::FinalPlan => Some(TranscriptionSource::Image),
            _ => None,
        }
    }

    fn attach(&mut self, path: PathBuf) -> Result<Dispatch, FlowError> {
        let field = match self.phase() {
            GpePhase::IndividualSolution => Field::IndividualSolution,
            GpePhase::FinalPlan => Field::FinalPlan,
            other => return Err(no_attachment(other)),
        };
        let job = Job::Transcribe {
            path,
            source: TranscriptionSource::Image,
        };
        Ok(self.book.issue(Awaiting::Transcript(field), None, job))
    }

    fn is_loading(&self) -> bool {
        self.book.awaiting(|_| true)
    }

    fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    fn start_timer(&mut self) {
        self.machine.start_timer();
    }

    fn toggle_timer(&mut self) -> Result<(), FlowError> {
        self.machine.toggle_timer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_scenarios;
    use crate::evaluation::{AssessmentResult, Settled};
    use crate::flow::backward_row;
    use crate::types::Evaluation;

    fn started() -> GpeSession {
        let mut s = GpeSession::new();
        assert!(s.select(default_scenarios().remove(0)));
        assert!(s.begin().unwrap().is_empty());
        s
    }

    fn expire(s: &mut GpeSession) -> Vec<Dispatch> {
        let epoch = s.epoch();
        let total = s.countdown().map(Countdown::remaining).unwrap_or(0);
        let mut out = Vec::new();
        for _ in 0..total {
            out.extend(s.tick(epoch));
        }
        out
    }

    #[test]
    fn table_is_forward_only() {
        assert_eq!(backward_row::<GpePhase>(), None);
        assert!(GpePhase::Completed.is_terminal());
    }

    #[test]
    fn begin_needs_a_scenario() {
        let mut s = GpeSession::new();
        assert_eq!(s.begin().unwrap_err(), FlowError::NoSession);
    }

    #[test]
    fn individual_solution_advances_by_submit_or_timer() {
        let mut s = started();
        s.skip().unwrap();
        assert_eq!(s.phase(), GpePhase::IndividualSolution);
        assert_eq!(s.submit().unwrap_err(), FlowError::EmptySubmission);

        let mut by_submit = s.clone();
        by_submit.input_mut().unwrap().push_str("Send jeep to hospital");
        let d = by_submit.submit().unwrap();
        assert_eq!(by_submit.phase(), GpePhase::GroupDiscussion);
        assert!(matches!(d[0].job, Job::DiscussionPoints { .. }));

        let d = expire(&mut s);
        assert_eq!(s.phase(), GpePhase::GroupDiscussion);
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn late_discussion_points_are_dropped() {
        let mut s = started();
        s.skip().unwrap();
        let d = expire(&mut s).remove(0);
        s.skip().unwrap();
        assert_eq!(s.phase(), GpePhase::FinalPlan);
        s.on_job(Completion {
            ticket: d.ticket,
            result: Ok(JobOutput::DiscussionPoints(vec![DiscussionPoint {
                speaker: Speaker::Peer("Candidate 2".into()),
                text: "late".into(),
            }])),
        });
        assert!(s.discussion().is_empty());
    }

    #[test]
    fn counter_points_keep_arrival_order() {
        let mut s = started();
        s.skip().unwrap();
        let d = expire(&mut s).remove(0);
        s.input_mut().unwrap().push_str("I disagree");
        s.post_counter_point().unwrap();
        s.on_job(Completion {
            ticket: d.ticket,
            result: Ok(JobOutput::DiscussionPoints(vec![DiscussionPoint {
                speaker: Speaker::Gto,
                text: "Time check".into(),
            }])),
        });
        let speakers: Vec<&Speaker> = s.discussion().iter().map(|p| &p.speaker).collect();
        assert_eq!(speakers, vec![&Speaker::Candidate, &Speaker::Gto]);
        assert_eq!(s.post_counter_point(), Err(FlowError::EmptySubmission));
    }

    #[test]
    fn evaluation_result_completes_session() {
        let mut s = started();
        s.skip().unwrap();
        expire(&mut s);
        s.skip().unwrap();
        s.input_mut().unwrap().push_str("Final plan");
        let d = s.submit().unwrap().remove(0);
        assert_eq!(s.phase(), GpePhase::Evaluating);
        let Job::Evaluate(EvaluationRequest::Gpe(sub)) = &d.job else {
            panic!("expected GPE evaluation, got {:?}", d.job);
        };
        assert_eq!(sub.final_plan, "Final plan");
        assert!(sub.individual_solution.is_empty());

        let result = AssessmentResult {
            evaluation: Evaluation {
                score: 7.0,
                verdict: "Good".into(),
                summary: "Sound plan".into(),
                strengths: vec![],
                improvements: vec![],
                sub_scores: vec![],
            },
            screening: None,
        };
        s.on_job(Completion {
            ticket: d.ticket,
            result: Ok(JobOutput::Evaluation(Settled::Completed {
                report_id: "r1".into(),
                result,
            })),
        });
        assert_eq!(s.phase(), GpePhase::Completed);
        assert!(matches!(s.verdict(), Some(Verdict::Completed { .. })));
    }

    #[test]
    fn restart_discards_state_and_in_flight_results() {
        let mut s = started();
        let old = s.session_id();
        s.restart();
        assert_eq!(s.phase(), GpePhase::Selection);
        assert!(s.scenario().is_none());
        assert_ne!(s.session_id(), old);
        assert!(!s.wants_ticks());
    }
}
