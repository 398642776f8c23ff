//! [`AiGateway`] over the Gemini `generateContent` REST endpoint.
//!
//! One POST per call. Structured output uses `responseMimeType: application/json`
//! with a `responseSchema`; speech uses the `AUDIO` response modality and comes back
//! as base64 PCM, which is wrapped into a WAV file before returning.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::gateway::{parse_json_text, AiGateway, Attachment};
use crate::wav::{pcm16_to_wav, TTS_CHANNELS, TTS_SAMPLE_RATE};

const TTS_VOICE: &str = "Charon";

/// Gateway implementation that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiGateway {
    client: Client,
    api_key: String,
    model: String,
    tts_model: String,
    base_url: String,
}

impl std::fmt::Debug for GeminiGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiGateway")
            .field("model", &self.model)
            .field("tts_model", &self.tts_model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiGateway {
    /// Builds a gateway from config. Returns `None` when no API key is set.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Http`] if the HTTP client cannot be constructed.
    pub fn from_config(cfg: &GatewayConfig) -> Result<Option<Self>, GatewayError> {
        let Some(api_key) = cfg.api_key.as_ref().filter(|k| !k.trim().is_empty()) else {
            return Ok(None);
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Some(Self {
            client,
            api_key: api_key.clone(),
            model: cfg.model.clone(),
            tts_model: cfg.tts_model.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_owned(),
        }))
    }

    async fn send(
        &self,
        model: &str,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GatewayError> {
        let url = format!("{}/{model}:generateContent", self.base_url);
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(map_http_error(status, &body_text));
        }

        Ok(response.json::<GenerateContentResponse>().await?)
    }

    async fn text_request(
        &self,
        parts: Vec<Part>,
        generation_config: Option<GenerationConfig>,
    ) -> Result<String, GatewayError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".into(),
                parts,
            }],
            generation_config,
        };
        let response = self.send(&self.model, &request).await?;
        extract_text(response)
    }
}

#[async_trait]
impl AiGateway for GeminiGateway {
    async fn generate_text(&self, prompt: &str) -> Result<String, GatewayError> {
        self.text_request(vec![Part::text(prompt)], None).await
    }

    async fn generate_json(&self, prompt: &str, schema: &Value) -> Result<Value, GatewayError> {
        let config = GenerationConfig {
            response_mime_type: Some("application/json".into()),
            response_schema: Some(schema.clone()),
            ..GenerationConfig::default()
        };
        let text = self.text_request(vec![Part::text(prompt)], Some(config)).await?;
        parse_json_text(&text)
    }

    async fn generate_with_attachment(
        &self,
        prompt: &str,
        attachment: &Attachment,
    ) -> Result<String, GatewayError> {
        let parts = vec![
            Part::text(prompt),
            Part::InlineData {
                inline_data: InlineDataPayload {
                    mime_type: attachment.mime_type.clone(),
                    data: BASE64_STANDARD.encode(&attachment.bytes),
                },
            },
        ];
        self.text_request(parts, None).await
    }

    async fn synthesize_speech(&self, text: &str) -> Result<Vec<u8>, GatewayError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".into(),
                parts: vec![Part::text(text)],
            }],
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["AUDIO".into()]),
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: TTS_VOICE.into(),
                        },
                    },
                }),
                ..GenerationConfig::default()
            }),
        };
        let response = self.send(&self.tts_model, &request).await?;
        let data = response
            .candidates
            .into_iter()
            .flatten()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.inline_data)
            .ok_or(GatewayError::EmptyResponse)?;
        let pcm = BASE64_STANDARD
            .decode(data.data.as_bytes())
            .map_err(|e| GatewayError::malformed(format!("invalid base64 audio: {e}"), ""))?;
        Ok(pcm16_to_wav(&pcm, TTS_SAMPLE_RATE, TTS_CHANNELS))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

impl Part {
    fn text(text: &str) -> Self {
        Part::Text { text: text.to_owned() }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    voice_config: VoiceConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartResponse {
    text: Option<String>,
    inline_data: Option<InlineDataPayload>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn extract_text(response: GenerateContentResponse) -> Result<String, GatewayError> {
    let text: String = response
        .candidates
        .into_iter()
        .flatten()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .filter_map(|p| p.text)
        .collect();
    if text.trim().is_empty() {
        Err(GatewayError::EmptyResponse)
    } else {
        Ok(text)
    }
}

fn map_http_error(status: StatusCode, body: &str) -> GatewayError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_owned());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.to_owned());
    GatewayError::Status {
        code: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_request_uses_camel_case_fields() {
        let req = GenerateContentRequest {
            contents: vec![Content {
                role: "user".into(),
                parts: vec![Part::text("hi")],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".into()),
                ..GenerationConfig::default()
            }),
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(v["generationConfig"]["responseMimeType"], "application/json");
        assert!(v["generationConfig"].get("responseSchema").is_none());
    }

    #[test]
    fn text_parts_are_concatenated() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"world"}]}}]}"#;
        let resp: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(extract_text(resp).unwrap(), "Hello world");
    }

    #[test]
    fn empty_candidates_are_an_error() {
        let resp: GenerateContentResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(matches!(extract_text(resp), Err(GatewayError::EmptyResponse)));
    }

    #[test]
    fn provider_error_body_is_unwrapped() {
        let body = r#"{"error":{"code":429,"message":"quota","status":"RESOURCE_EXHAUSTED"}}"#;
        match map_http_error(StatusCode::TOO_MANY_REQUESTS, body) {
            GatewayError::Status { code, message } => {
                assert_eq!(code, 429);
                assert_eq!(message, "RESOURCE_EXHAUSTED: quota");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_key_yields_no_gateway() {
        let cfg = GatewayConfig::default();
        assert!(GeminiGateway::from_config(&cfg).unwrap().is_none());
    }
}
