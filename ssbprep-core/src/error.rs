//! Error types for ssbprep-core.
//!
//! Three families, kept apart so callers can match on what actually went wrong:
//!
//! - [`GatewayError`]: anything between us and the generative-AI provider.
//! - [`FlowError`]: a phase-machine trigger that the current phase refuses.
//! - [`CoreError`]: the umbrella returned by services that touch both the
//!   gateway and the SQLite store.
//!
//! None of these are fatal to the process. Every path that produces one ends in a
//! visible UI state (error banner, pending report, retry hint).

use thiserror::Error;

/// Failure while talking to the AI provider or decoding its answer.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No API key was configured; every call short-circuits to this.
    #[error("AI gateway is not configured (set GEMINI_API_KEY or gateway.api_key)")]
    NotConfigured,

    /// Transport-level failure (DNS, TLS, connect, timeout).
    #[error("AI request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-2xx status.
    #[error("AI provider returned {code}: {message}")]
    Status { code: u16, message: String },

    /// Provider answered 2xx but with no usable candidate.
    #[error("AI provider returned an empty response")]
    EmptyResponse,

    /// Provider text could not be decoded into the expected shape.
    ///
    /// `raw` keeps the offending text so it can be logged for diagnosis.
    #[error("malformed AI response: {reason}")]
    Malformed { reason: String, raw: String },

    /// Reading an attachment from disk failed.
    #[error("attachment I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// Builds a `Malformed` error from a reason and the raw provider text.
    pub fn malformed(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
            raw: raw.into(),
        }
    }
}

/// A trigger the phase machine would not accept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// The transition table has no row for `(phase, trigger)`.
    #[error("no transition from {phase} on {trigger}")]
    NoTransition { phase: String, trigger: String },

    /// Manual submit on a writing phase with blank text.
    #[error("write something before submitting")]
    EmptySubmission,

    /// Manual skip on a phase not marked skippable.
    #[error("this stage cannot be skipped")]
    NotSkippable,

    /// Pause/resume on a timer that is not pausable.
    #[error("this timer cannot be paused")]
    NotPausable,

    /// Action needs content (scenario, topic, picture) that has not been chosen yet.
    #[error("nothing selected yet")]
    NoSession,
}

/// Umbrella error for services spanning the store and the gateway.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("storage error: {0}")]
    Storage(#[from] tokio_rusqlite::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("configuration error: {0}")]
    Config(String),

    /// A job finished with an output of a different kind than its ticket asked for.
    #[error("unexpected {output} output for this request")]
    UnexpectedOutput { output: &'static str },

    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Creates a `NotFound` error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
