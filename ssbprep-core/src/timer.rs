//! One-tick-per-second countdown and the task guard that drives it.
//!
//! [`Countdown`] is plain data: it only changes when somebody calls [`Countdown::tick`].
//! [`Ticker`] is the resource that produces those calls: a tokio interval task that
//! sends one event per second into the app's event channel. The task lives exactly as
//! long as the `Ticker` value: dropping it aborts the task, so replacing or clearing the
//! slot that holds it is all it takes to stop a timer on phase change, restart, or quit.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// Result of a single [`Countdown::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Timer is not running (never started, paused, or already expired).
    Idle,
    /// Timer decremented; carries the seconds left.
    Running(u32),
    /// Timer just reached zero. Returned exactly once per countdown.
    Expired,
}

/// Seconds-remaining counter bound to one phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    total: u32,
    running: bool,
    pausable: bool,
    expired: bool,
}

impl Countdown {
    /// Creates a stopped countdown of `seconds`.
    pub fn new(seconds: u32, pausable: bool) -> Self {
        Self {
            remaining: seconds,
            total: seconds,
            running: false,
            pausable,
            expired: false,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_pausable(&self) -> bool {
        self.pausable
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// True once started and before expiry, whether or not currently paused.
    pub fn has_started(&self) -> bool {
        self.running || self.remaining < self.total || self.expired
    }

    /// Starts the countdown. No-op once expired.
    pub fn start(&mut self) {
        if !self.expired {
            self.running = true;
        }
    }

    /// Pauses a pausable countdown. Returns `false` if the timer is not pausable.
    pub fn pause(&mut self) -> bool {
        if !self.pausable {
            return false;
        }
        self.running = false;
        true
    }

    /// Flips between running and paused. Returns `false` if not pausable.
    pub fn toggle(&mut self) -> bool {
        if !self.pausable || self.expired {
            return false;
        }
        self.running = !self.running;
        true
    }

    /// Advances by one second.
    ///
    /// At zero the countdown stops itself and reports [`TickOutcome::Expired`];
    /// any later tick reports [`TickOutcome::Idle`].
    pub fn tick(&mut self) -> TickOutcome {
        if !self.running || self.expired {
            return TickOutcome::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            self.expired = true;
            TickOutcome::Expired
        } else {
            TickOutcome::Running(self.remaining)
        }
    }

    /// Formats the remaining time as `MM:SS`.
    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.remaining / 60, self.remaining % 60)
    }
}

/// Owns the interval task that feeds one countdown.
///
/// Each tick sends `make(epoch)` into `tx`. The epoch is the phase-machine epoch the
/// ticker was armed for; consumers drop ticks whose epoch no longer matches, which
/// covers ticks that were already queued when the task was aborted.
#[derive(Debug)]
pub struct Ticker {
    epoch: u64,
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Spawns the interval task on the current tokio runtime.
    ///
    /// The first tick fires one `period` after spawning, not immediately.
    pub fn spawn<T, F>(tx: UnboundedSender<T>, epoch: u64, period: Duration, make: F) -> Self
    where
        T: Send + 'static,
        F: Fn(u64) -> T + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                interval.tick().await;
                if tx.send(make(epoch)).is_err() {
                    break;
                }
            }
        });
        Self { epoch, handle }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_hundred_ticks_expire_exactly_once() {
        let mut c = Countdown::new(300, false);
        c.start();
        let mut expired = 0;
        for _ in 0..300 {
            if c.tick() == TickOutcome::Expired {
                expired += 1;
            }
        }
        assert_eq!(c.remaining(), 0);
        assert_eq!(expired, 1);
        // Extra ticks after expiry never fire again.
        for _ in 0..5 {
            assert_eq!(c.tick(), TickOutcome::Idle);
        }
    }

    #[test]
    fn stopped_timer_does_not_move() {
        let mut c = Countdown::new(10, true);
        assert_eq!(c.tick(), TickOutcome::Idle);
        assert_eq!(c.remaining(), 10);
    }

    #[test]
    fn pause_only_when_pausable() {
        let mut exam = Countdown::new(60, false);
        exam.start();
        assert!(!exam.pause());
        assert!(exam.is_running());

        let mut prep = Countdown::new(60, true);
        prep.start();
        prep.tick();
        assert!(prep.toggle());
        assert_eq!(prep.tick(), TickOutcome::Idle);
        assert_eq!(prep.remaining(), 59);
        assert!(prep.toggle());
        assert_eq!(prep.tick(), TickOutcome::Running(58));
    }

    #[test]
    fn display_is_minutes_and_seconds() {
        assert_eq!(Countdown::new(185, false).display(), "03:05");
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_ticker_stops_events() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let ticker = Ticker::spawn(tx, 7, Duration::from_secs(1), |e| e);
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(rx.recv().await, Some(7));
        assert_eq!(rx.recv().await, Some(7));
        drop(ticker);
        tokio::time::sleep(Duration::from_secs(5)).await;
        // Sender was moved into the aborted task, so the channel closes.
        assert_eq!(rx.recv().await, None);
    }
}
