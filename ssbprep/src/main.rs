//! ssbprep: SSB interview practice in the terminal.
//!
//! # Startup sequence
//!
//! 1. Load config (read-only, safe before terminal init) and start file logging.
//! 2. `install_panic_hook()` so a panic restores the terminal before printing.
//! 3. `register_sigterm()`: flag polled by the event loop heartbeat.
//! 4. Open the WAL-mode database and build the AI gateway. Both happen before the
//!    alternate screen so a failure prints a readable error.
//! 5. `init_tui()`, then the event task and the job worker.
//!
//! The loop exits only via `break`, so `restore_tui()` is always reached. A panic is
//! covered by the hook.

mod app;
mod event;
mod logging;
mod theme;
mod tui;
mod ui;
mod worker;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use ssbprep_core::config::Config;
use ssbprep_core::gateway::{AiGateway, Unconfigured};
use ssbprep_core::gemini::GeminiGateway;
use ssbprep_core::jobs::JobContext;

use crate::ui::keybindings::{handle_key, KeyAction};

fn io_err(e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(e.to_string())
}

fn build_gateway(config: &Config) -> Arc<dyn AiGateway> {
    match GeminiGateway::from_config(&config.gateway) {
        Ok(Some(gateway)) => {
            tracing::info!(model = %config.gateway.model, "AI gateway ready");
            Arc::new(gateway)
        }
        Ok(None) => {
            tracing::warn!("no API key configured; AI features use offline fallbacks");
            Arc::new(Unconfigured)
        }
        Err(e) => {
            tracing::error!(error = %e, "AI gateway could not be built");
            Arc::new(Unconfigured)
        }
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let (config, config_warning) = Config::load();
    let storage = &config.storage;
    std::fs::create_dir_all(&storage.data_dir)?;
    logging::init(&storage.log_path())?;
    tracing::info!(data_dir = %storage.data_dir.display(), "starting");
    if let Some(warning) = config_warning {
        tracing::warn!("{warning}");
    }
    let theme = theme::Theme::from_name(&config.ui.theme);

    tui::install_panic_hook();
    let term_flag = tui::register_sigterm();

    let conn = ssbprep_core::db::open_db(&storage.db_path().to_string_lossy())
        .await
        .map_err(io_err)?;
    let ctx = JobContext {
        gateway: build_gateway(&config),
        conn,
        audio_dir: storage.audio_dir(),
    };

    let handler = event::EventHandler::new();
    let (job_tx, worker) =
        worker::spawn(ctx, tokio::runtime::Handle::current(), handler.tx.clone())?;
    let mut state = app::AppState::new(Some(job_tx), Some(handler.tx.clone()));
    state.start();

    let mut terminal = tui::init_tui()?;
    event::spawn_event_task(handler.tx.clone());
    let mut rx = handler.rx;

    // Event loop: exits only via `break`, never via `?` outside the Render arm.
    'event_loop: loop {
        tokio::select! {
            // Heartbeat so SIGTERM is seen even when no events arrive.
            _ = tokio::time::sleep(std::time::Duration::from_millis(50)) => {
                if term_flag.load(Ordering::Relaxed) {
                    tracing::info!("SIGTERM received");
                    break 'event_loop;
                }
            }
            maybe_event = rx.recv() => {
                match maybe_event {
                    Some(event::AppEvent::Render) => {
                        let drawn = terminal.draw(|frame| ui::render(frame, &mut state, &theme));
                        if let Err(e) = drawn {
                            tracing::error!(error = %e, "draw failed");
                            break 'event_loop;
                        }
                    }
                    Some(event::AppEvent::Key(key)) => {
                        if handle_key(key, &mut state) == KeyAction::Quit {
                            break 'event_loop;
                        }
                    }
                    Some(event::AppEvent::TimerTick { session, epoch }) => {
                        state.on_timer_tick(session, epoch);
                    }
                    Some(event::AppEvent::JobDone(completion)) => {
                        state.on_job_done(*completion);
                    }
                    // ratatui picks up the new size on the next Render.
                    Some(event::AppEvent::Resize(_, _)) => {}
                    None => break 'event_loop,
                }
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
        }
    }

    tui::restore_tui()?;

    // Dropping the state drops the job sender and any countdown task; the worker
    // thread then drains and exits. Jobs already on the runtime are abandoned.
    drop(state);
    if worker.join().is_err() {
        tracing::warn!("job worker panicked");
    }
    tracing::info!("exiting");
    Ok(())
}
