//! Background thread that runs jobs requested by sessions and screens.
//!
//! The UI thread never awaits a job. It sends [`Dispatch`]es over a crossbeam channel;
//! this thread hands each one to the tokio runtime and the finished job comes back
//! as `AppEvent::JobDone`. Jobs run concurrently, so completions may arrive in any
//! order; owners match them by ticket.

use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use ssbprep_core::jobs::{run_job, Completion, Dispatch, JobContext};
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;

use crate::event::AppEvent;

/// Sending half kept by the app; dropping it ends the worker thread.
pub type JobSender = Sender<Dispatch>;

/// Spawns the worker thread. Returns the request sender and the thread handle.
///
/// # Errors
///
/// Returns the I/O error if the OS refuses to spawn the thread.
pub fn spawn(
    ctx: JobContext,
    runtime: Handle,
    event_tx: UnboundedSender<AppEvent>,
) -> std::io::Result<(JobSender, JoinHandle<()>)> {
    let (tx, rx) = crossbeam_channel::unbounded();
    let handle = std::thread::Builder::new()
        .name("ssbprep-jobs".into())
        .spawn(move || job_worker_loop(ctx, runtime, rx, event_tx))?;
    Ok((tx, handle))
}

/// Loops until every sender is dropped.
fn job_worker_loop(
    ctx: JobContext,
    runtime: Handle,
    rx: Receiver<Dispatch>,
    event_tx: UnboundedSender<AppEvent>,
) {
    for Dispatch { ticket, job } in rx {
        let ctx = ctx.clone();
        let event_tx = event_tx.clone();
        let name = job.name();
        tracing::debug!(%ticket, job = name, "job started");
        runtime.spawn(async move {
            let result = run_job(&ctx, job).await;
            match &result {
                Ok(_) => tracing::debug!(%ticket, job = name, "job finished"),
                Err(e) => tracing::warn!(%ticket, job = name, error = %e, "job failed"),
            }
            let _ = event_tx.send(AppEvent::JobDone(Box::new(Completion { ticket, result })));
        });
    }
    tracing::debug!("job worker exiting");
}
