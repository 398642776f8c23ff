//! Event bus for ssbprep.
//!
//! All user input, render ticks, countdown ticks, and background job results are
//! normalised into a single `AppEvent` enum and sent over a tokio unbounded MPSC
//! channel. The main loop receives from this channel and dispatches accordingly.
//!
//! The render interval (33 ms, about 30 FPS) runs independently of the one-second
//! countdown ticks, which come from a [`ssbprep_core::timer::Ticker`] armed only while
//! the on-screen session has a running timer.

use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind};
use futures::{Stream, StreamExt};
use ssbprep_core::jobs::{Completion, SessionId};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

/// All events the application can receive from any source.
#[derive(Debug)]
pub enum AppEvent {
    /// A key press from the terminal (`KeyEventKind::Press` only).
    ///
    /// Release and repeat events are filtered in the input task to avoid
    /// double-firing on Windows, which synthesises both press and release for
    /// every keystroke.
    Key(KeyEvent),
    /// Terminal was resized to (columns, rows).
    Resize(u16, u16),
    /// Render tick: triggers a `terminal.draw()` call.
    Render,
    /// One second of countdown for the session that armed the ticker.
    TimerTick { session: SessionId, epoch: u64 },
    /// A background job finished.
    JobDone(Box<Completion>),
}

/// Holds the sender and receiver ends of the unified event channel.
///
/// The sender (`tx`) is cloned and distributed to background tasks;
/// the receiver (`rx`) is owned by the main event loop.
pub struct EventHandler {
    pub tx: mpsc::UnboundedSender<AppEvent>,
    pub rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the background tokio task that feeds terminal input and render ticks
/// into the event channel.
pub fn spawn_event_task(tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(pump_events(EventStream::new(), tx));
}

/// Forwards `input` and a 33 ms render tick into `tx` until the receiver is gone.
///
/// Once `input` ends it is no longer polled and only render ticks are sent.
async fn pump_events<S>(mut input: S, tx: mpsc::UnboundedSender<AppEvent>)
where
    S: Stream<Item = io::Result<Event>> + Unpin,
{
    let mut render_interval = interval(Duration::from_millis(33));
    let mut input_open = true;

    loop {
        let sent = tokio::select! {
            _ = render_interval.tick() => tx.send(AppEvent::Render),
            maybe_event = input.next(), if input_open => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    tx.send(AppEvent::Key(key))
                }
                Some(Ok(Event::Resize(w, h))) => tx.send(AppEvent::Resize(w, h)),
                Some(Ok(_)) => Ok(()),
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "terminal input error");
                    Ok(())
                }
                None => {
                    tracing::warn!("terminal input stream ended");
                    input_open = false;
                    Ok(())
                }
            },
        };
        if sent.is_err() {
            break;
        }
    }
}
