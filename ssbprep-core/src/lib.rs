//! Domain core for the SSB preparation terminal app.
//!
//! No terminal code lives here. The binary crate drives [`sessions`] with key events
//! and timer ticks, runs the [`jobs`] they request on a background worker, and renders
//! whatever state results.

pub mod briefing;
pub mod catalog;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod evaluation;
pub mod flow;
pub mod gateway;
pub mod gemini;
pub mod jobs;
pub mod oir;
pub mod protocol;
pub mod schema;
pub mod scoring;
pub mod sessions;
pub mod timer;
pub mod types;
pub mod wav;
