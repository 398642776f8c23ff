//! The seam between the app and the generative-AI provider.
//!
//! [`AiGateway`] is the only way the rest of the crate reaches the provider. Every
//! call is fire-and-await (no streaming, no automatic retries) and returns a
//! `Result`: callers decide what fallback to substitute, so a failed parse can never
//! masquerade as valid empty data.
//!
//! Implementations provide three primitives (text, structured JSON, text over one
//! inline attachment) plus speech synthesis. Audio and handwriting transcription are
//! provided methods built on the attachment primitive.

use std::path::Path;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::GatewayError;
use crate::protocol::strip_code_fence;

/// Binary payload sent inline with a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Reads a file and guesses its MIME type from the extension.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the file cannot be read.
    pub async fn from_path(path: &Path) -> Result<Self, GatewayError> {
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(mime_for_path(path), bytes))
    }
}

/// Maps common audio and image extensions to MIME types.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "wav" => "audio/wav",
        "mp3" => "audio/mp3",
        "ogg" | "oga" => "audio/ogg",
        "webm" => "audio/webm",
        "m4a" | "aac" => "audio/aac",
        "flac" => "audio/flac",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

const AUDIO_TRANSCRIPTION_PROMPT: &str = "Transcribe this spoken answer verbatim in English. \
    Return only the transcript text without commentary or timestamps.";

const IMAGE_TRANSCRIPTION_PROMPT: &str = "This image is a photograph of a handwritten answer \
    sheet. Transcribe the handwriting exactly as written. Return only the text.";

/// Typed access to the generative-AI provider.
#[async_trait]
pub trait AiGateway: Send + Sync {
    /// Free-text generation.
    async fn generate_text(&self, prompt: &str) -> Result<String, GatewayError>;

    /// Structured generation constrained by a JSON schema.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Malformed`] if the provider's text is not valid JSON.
    async fn generate_json(&self, prompt: &str, schema: &Value) -> Result<Value, GatewayError>;

    /// Free-text generation over one inline attachment.
    async fn generate_with_attachment(
        &self,
        prompt: &str,
        attachment: &Attachment,
    ) -> Result<String, GatewayError>;

    /// Text-to-speech. Returns a complete WAV file.
    async fn synthesize_speech(&self, text: &str) -> Result<Vec<u8>, GatewayError>;

    /// Speech-to-text for a recorded answer.
    async fn transcribe_audio(&self, audio: &Attachment) -> Result<String, GatewayError> {
        let text = self
            .generate_with_attachment(AUDIO_TRANSCRIPTION_PROMPT, audio)
            .await?;
        non_empty(text)
    }

    /// Handwriting-to-text for a photographed answer sheet.
    async fn transcribe_image(&self, image: &Attachment) -> Result<String, GatewayError> {
        let text = self
            .generate_with_attachment(IMAGE_TRANSCRIPTION_PROMPT, image)
            .await?;
        non_empty(text)
    }
}

fn non_empty(text: String) -> Result<String, GatewayError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(GatewayError::EmptyResponse)
    } else {
        Ok(trimmed.to_owned())
    }
}

/// Parses provider text as JSON, tolerating a surrounding markdown code fence.
///
/// # Errors
///
/// [`GatewayError::Malformed`] with the raw text attached.
pub fn parse_json_text(raw: &str) -> Result<Value, GatewayError> {
    serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| GatewayError::malformed(format!("invalid JSON: {e}"), raw))
}

/// Decodes a JSON value into `T`.
///
/// # Errors
///
/// [`GatewayError::Malformed`] when the value does not match `T`.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, GatewayError> {
    let raw = value.to_string();
    serde_json::from_value(value)
        .map_err(|e| GatewayError::malformed(format!("unexpected JSON shape: {e}"), raw))
}

/// Logs a gateway failure, including the raw text for malformed answers.
pub fn log_failure(context: &str, err: &GatewayError) {
    match err {
        GatewayError::Malformed { reason, raw } => {
            tracing::warn!(context, %reason, raw = %raw, "discarding malformed AI response");
        }
        GatewayError::NotConfigured => {
            tracing::debug!(context, "AI gateway not configured");
        }
        other => tracing::warn!(context, error = %other, "AI call failed"),
    }
}

/// Gateway used when no API key is configured: every call fails fast.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured;

#[async_trait]
impl AiGateway for Unconfigured {
    async fn generate_text(&self, _prompt: &str) -> Result<String, GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    async fn generate_json(&self, _prompt: &str, _schema: &Value) -> Result<Value, GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    async fn generate_with_attachment(
        &self,
        _prompt: &str,
        _attachment: &Attachment,
    ) -> Result<String, GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    async fn synthesize_speech(&self, _text: &str) -> Result<Vec<u8>, GatewayError> {
        Err(GatewayError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_json_parses() {
        let v = parse_json_text("```json\n{\"score\": 7}\n```").unwrap();
        assert_eq!(v["score"], 7);
    }

    #[test]
    fn broken_json_keeps_raw_text() {
        match parse_json_text("{score: seven") {
            Err(GatewayError::Malformed { raw, .. }) => assert_eq!(raw, "{score: seven"),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn mime_from_extension() {
        assert_eq!(mime_for_path(Path::new("answer.JPG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("speech.wav")), "audio/wav");
        assert_eq!(mime_for_path(Path::new("notes")), "application/octet-stream");
    }
}
