//! Table-driven phase machine shared by every timed test.
//!
//! A feature declares its stages as an enum implementing [`Phase`]: a static
//! `(from, trigger, to)` transition table plus a [`PhaseSpec`] per stage (time budget,
//! skippable, requires text, pausable, auto-start). [`PhaseMachine`] walks that table,
//! applies the guards, and owns the [`Countdown`] for the current stage.
//!
//! Guards:
//! - `Submit` on a stage that `requires_text` fails on blank text.
//! - `Skip` is accepted only on stages marked `skippable`.
//! - `TimerExpired` bypasses the text guard; the clock always wins.
//!
//! Every stage change (and every timer arm/pause/resume) bumps the machine's timer
//! epoch. Tick events carry the epoch they were produced for, and [`PhaseMachine::tick`]
//! ignores anything else, so a stage can never be advanced twice by its own timer.

use std::fmt;

use crate::error::FlowError;
use crate::timer::{Countdown, TickOutcome};

/// Events that may move a session from one stage to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// Leave the selection stage once content has been chosen.
    Begin,
    /// User finished the stage ("Submit", "Ready", "Next set").
    Submit,
    /// User abandoned a skippable stage early.
    Skip,
    /// The stage's countdown reached zero.
    TimerExpired,
    /// The final evaluation call resolved, successfully or not.
    EvaluationSettled,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Trigger::Begin => "begin",
            Trigger::Submit => "submit",
            Trigger::Skip => "skip",
            Trigger::TimerExpired => "timer-expired",
            Trigger::EvaluationSettled => "evaluation-settled",
        };
        f.write_str(s)
    }
}

/// Static per-stage contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhaseSpec {
    /// Time budget in seconds; `None` for untimed stages.
    pub duration_secs: Option<u32>,
    pub skippable: bool,
    /// Manual submit is refused while captured text is blank.
    pub requires_text: bool,
    /// Countdown may be paused and resumed by the user.
    pub pausable: bool,
    /// Countdown starts on stage entry instead of on an explicit user action.
    pub auto_start: bool,
}

impl PhaseSpec {
    /// An untimed stage with no guards.
    pub const fn untimed() -> Self {
        Self {
            duration_secs: None,
            skippable: false,
            requires_text: false,
            pausable: false,
            auto_start: false,
        }
    }

    /// An exam stage: fixed budget, starts on entry, cannot be paused.
    pub const fn timed(seconds: u32) -> Self {
        Self {
            duration_secs: Some(seconds),
            skippable: false,
            requires_text: false,
            pausable: false,
            auto_start: true,
        }
    }

    pub const fn skippable(mut self) -> Self {
        self.skippable = true;
        self
    }

    pub const fn requires_text(mut self) -> Self {
        self.requires_text = true;
        self
    }

    /// Preparation-style timer: the user starts it and may pause it.
    pub const fn manual_pausable(mut self) -> Self {
        self.pausable = true;
        self.auto_start = false;
        self
    }
}

/// A stage enum driven by a static transition table.
pub trait Phase: Copy + Eq + fmt::Debug + fmt::Display + 'static {
    /// The selection stage every session starts in and returns to on restart.
    const INITIAL: Self;
    /// `(from, trigger, to)` rows. Every row must move to a higher ordinal.
    const TRANSITIONS: &'static [(Self, Trigger, Self)];

    /// Position in the fixed stage order; used for the forward-only invariant.
    fn ordinal(self) -> u8;

    fn spec(self) -> PhaseSpec;

    /// True for the terminal stage.
    fn is_terminal(self) -> bool {
        !Self::TRANSITIONS.iter().any(|(from, _, _)| *from == self)
    }
}

/// Looks up the successor of `from` on `trigger` in the static table.
pub fn next_phase<P: Phase>(from: P, trigger: Trigger) -> Option<P> {
    P::TRANSITIONS
        .iter()
        .find(|(f, t, _)| *f == from && *t == trigger)
        .map(|(_, _, to)| *to)
}

/// Returns the first table row that does not move strictly forward, if any.
pub fn backward_row<P: Phase>() -> Option<(P, Trigger, P)> {
    P::TRANSITIONS
        .iter()
        .copied()
        .find(|(from, _, to)| to.ordinal() <= from.ordinal())
}

/// Current stage plus its countdown.
#[derive(Debug, Clone)]
pub struct PhaseMachine<P: Phase> {
    phase: P,
    countdown: Option<Countdown>,
    epoch: u64,
}

impl<P: Phase> Default for PhaseMachine<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Phase> PhaseMachine<P> {
    pub fn new() -> Self {
        let mut machine = Self {
            phase: P::INITIAL,
            countdown: None,
            epoch: 0,
        };
        machine.enter(P::INITIAL);
        machine
    }

    pub fn phase(&self) -> P {
        self.phase
    }

    pub fn countdown(&self) -> Option<&Countdown> {
        self.countdown.as_ref()
    }

    /// Timer generation. Ticks tagged with any other value are stale.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// True when a ticker should be feeding this machine right now.
    pub fn wants_ticks(&self) -> bool {
        self.countdown.as_ref().is_some_and(Countdown::is_running)
    }

    /// Applies `trigger` with the stage's currently captured text.
    ///
    /// # Errors
    ///
    /// - [`FlowError::EmptySubmission`] for a manual submit of blank text on a
    ///   `requires_text` stage.
    /// - [`FlowError::NotSkippable`] for a skip on a stage not marked skippable.
    /// - [`FlowError::NoTransition`] when the table has no matching row.
    pub fn fire(&mut self, trigger: Trigger, captured_text: &str) -> Result<P, FlowError> {
        let spec = self.phase.spec();
        match trigger {
            Trigger::Submit if spec.requires_text && captured_text.trim().is_empty() => {
                return Err(FlowError::EmptySubmission);
            }
            Trigger::Skip if !spec.skippable => return Err(FlowError::NotSkippable),
            _ => {}
        }
        let next = next_phase(self.phase, trigger).ok_or_else(|| FlowError::NoTransition {
            phase: self.phase.to_string(),
            trigger: trigger.to_string(),
        })?;
        tracing::debug!(from = %self.phase, to = %next, %trigger, "phase transition");
        self.enter(next);
        Ok(next)
    }

    /// Applies one timer tick produced for `epoch`.
    ///
    /// Returns the new stage when the tick expired the countdown and advanced the
    /// machine; `None` otherwise (stale epoch, paused, or still counting).
    pub fn tick(&mut self, epoch: u64) -> Option<P> {
        if epoch != self.epoch {
            return None;
        }
        let outcome = self.countdown.as_mut().map(Countdown::tick)?;
        match outcome {
            TickOutcome::Expired => self.fire(Trigger::TimerExpired, "").ok(),
            TickOutcome::Idle | TickOutcome::Running(_) => None,
        }
    }

    /// Starts a manually-started countdown (e.g. "Start Prep Timer").
    pub fn start_timer(&mut self) {
        if let Some(c) = self.countdown.as_mut() {
            if !c.is_running() && !c.is_expired() {
                c.start();
                self.epoch += 1;
            }
        }
    }

    /// Pauses or resumes the countdown.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::NotPausable`] for exam timers and untimed stages.
    pub fn toggle_timer(&mut self) -> Result<(), FlowError> {
        let c = self.countdown.as_mut().ok_or(FlowError::NotPausable)?;
        if !c.toggle() {
            return Err(FlowError::NotPausable);
        }
        self.epoch += 1;
        Ok(())
    }

    /// Discards the current stage and returns to [`Phase::INITIAL`].
    pub fn restart(&mut self) {
        self.enter(P::INITIAL);
    }

    fn enter(&mut self, next: P) {
        let spec = next.spec();
        self.phase = next;
        self.epoch += 1;
        self.countdown = spec.duration_secs.map(|secs| {
            let mut c = Countdown::new(secs, spec.pausable);
            if spec.auto_start {
                c.start();
            }
            c
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Drill {
        Pick,
        Read,
        Write,
        Done,
    }

    impl fmt::Display for Drill {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    impl Phase for Drill {
        const INITIAL: Self = Drill::Pick;
        const TRANSITIONS: &'static [(Self, Trigger, Self)] = &[
            (Drill::Pick, Trigger::Begin, Drill::Read),
            (Drill::Read, Trigger::Skip, Drill::Write),
            (Drill::Read, Trigger::TimerExpired, Drill::Write),
            (Drill::Write, Trigger::Submit, Drill::Done),
            (Drill::Write, Trigger::TimerExpired, Drill::Done),
        ];

        fn ordinal(self) -> u8 {
            self as u8
        }

        fn spec(self) -> PhaseSpec {
            match self {
                Drill::Pick | Drill::Done => PhaseSpec::untimed(),
                Drill::Read => PhaseSpec::timed(3).skippable(),
                Drill::Write => PhaseSpec::timed(2).requires_text(),
            }
        }
    }

    #[test]
    fn table_is_forward_only() {
        assert_eq!(backward_row::<Drill>(), None);
        assert!(Drill::Done.is_terminal());
        assert!(!Drill::Write.is_terminal());
    }

    #[test]
    fn timer_advances_without_text_but_submit_does_not() {
        let mut m = PhaseMachine::<Drill>::new();
        m.fire(Trigger::Begin, "").unwrap();
        m.fire(Trigger::Skip, "").unwrap();
        assert_eq!(m.phase(), Drill::Write);
        assert_eq!(m.fire(Trigger::Submit, "   "), Err(FlowError::EmptySubmission));

        let epoch = m.epoch();
        assert_eq!(m.tick(epoch), None);
        assert_eq!(m.tick(epoch), Some(Drill::Done));
    }

    #[test]
    fn stale_ticks_are_ignored() {
        let mut m = PhaseMachine::<Drill>::new();
        m.fire(Trigger::Begin, "").unwrap();
        let read_epoch = m.epoch();
        m.fire(Trigger::Skip, "").unwrap();
        for _ in 0..10 {
            assert_eq!(m.tick(read_epoch), None);
        }
        assert_eq!(m.phase(), Drill::Write);
        assert_eq!(m.countdown().map(Countdown::remaining), Some(2));
    }

    #[test]
    fn skip_requires_skippable_stage() {
        let mut m = PhaseMachine::<Drill>::new();
        m.fire(Trigger::Begin, "").unwrap();
        m.fire(Trigger::Skip, "").unwrap();
        assert_eq!(m.fire(Trigger::Skip, "text"), Err(FlowError::NotSkippable));
    }

    #[test]
    fn restart_returns_to_initial() {
        let mut m = PhaseMachine::<Drill>::new();
        m.fire(Trigger::Begin, "").unwrap();
        m.restart();
        assert_eq!(m.phase(), Drill::Pick);
        assert!(m.countdown().is_none());
        assert!(!m.wants_ticks());
    }

    #[test]
    fn unknown_trigger_is_rejected() {
        let mut m = PhaseMachine::<Drill>::new();
        let err = m.fire(Trigger::EvaluationSettled, "").unwrap_err();
        assert!(matches!(err, FlowError::NoTransition { .. }));
        assert_eq!(m.phase(), Drill::Pick);
    }
}
