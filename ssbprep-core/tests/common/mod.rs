//! Shared helpers for ssbprep-core integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use ssbprep_core::db;
use ssbprep_core::error::GatewayError;
use ssbprep_core::gateway::{AiGateway, Attachment};
use tokio_rusqlite::Connection;

/// One canned provider answer.
pub enum Reply {
    Text(String),
    Json(Value),
    Audio(Vec<u8>),
    Fail,
}

/// Gateway double that answers from a queue and counts calls.
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next(&self) -> Option<Reply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies.lock().unwrap().pop_front()
    }
}

fn unavailable() -> GatewayError {
    GatewayError::Status {
        code: 503,
        message: "scripted failure".into(),
    }
}

#[async_trait]
impl AiGateway for ScriptedGateway {
    async fn generate_text(&self, _prompt: &str) -> Result<String, GatewayError> {
        match self.next() {
            Some(Reply::Text(t)) => Ok(t),
            _ => Err(unavailable()),
        }
    }

    async fn generate_json(&self, _prompt: &str, _schema: &Value) -> Result<Value, GatewayError> {
        match self.next() {
            Some(Reply::Json(v)) => Ok(v),
            Some(Reply::Text(t)) => ssbprep_core::gateway::parse_json_text(&t),
            _ => Err(unavailable()),
        }
    }

    async fn generate_with_attachment(
        &self,
        _prompt: &str,
        _attachment: &Attachment,
    ) -> Result<String, GatewayError> {
        match self.next() {
            Some(Reply::Text(t)) => Ok(t),
            _ => Err(unavailable()),
        }
    }

    async fn synthesize_speech(&self, _text: &str) -> Result<Vec<u8>, GatewayError> {
        match self.next() {
            Some(Reply::Audio(bytes)) => Ok(bytes),
            _ => Err(unavailable()),
        }
    }
}

/// Opens a fresh database in a temporary directory that outlives the test.
pub async fn temp_db() -> (Connection, std::path::PathBuf) {
    let dir = tempfile::TempDir::new().unwrap().keep();
    let path = dir.join("test.db");
    let conn = db::open_db(&path.to_string_lossy()).await.unwrap();
    (conn, dir)
}

/// A briefing answer with `n` valid blocks.
pub fn briefing_text(n: usize) -> String {
    (0..n)
        .map(|i| {
            format!(
                "TITLE: Item {i}\nCATEGORY: Defence\n\
                 SUMMARY: Detailed factual summary number {i} about events.\n\
                 RELEVANCE: Interview\n"
            )
        })
        .collect::<Vec<_>>()
        .join("---\n")
}
