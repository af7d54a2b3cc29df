use super::types::*;
use crate::{Error, Result, config::LlmConfig};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use tracing::{debug, warn};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Sends the whole conversation, newest user turn last.
    async fn generate(&self, contents: Vec<Content>) -> Result<ModelReply>;
}

/// Builds the client for the configured provider.
pub fn create_llm_client(
    config: &LlmConfig,
    system_instruction: impl Into<String>,
) -> Result<Arc<dyn LlmClient>> {
    match config.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiClient::new(config, system_instruction)?)),
        other => Err(Error::config(format!("Unsupported LLM provider: {}", other))),
    }
}

pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    system_instruction: String,
    generation: GenerationSettings,
    safety_settings: Vec<SafetySetting>,
}

impl GeminiClient {
    pub fn new(config: &LlmConfig, system_instruction: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            system_instruction: system_instruction.into(),
            generation: GenerationSettings::from(config),
            safety_settings: default_safety_settings(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn api_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_request<'a>(&'a self, contents: &[Content]) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            system_instruction: WireContent {
                role: None,
                parts: vec![WirePart::Text {
                    text: self.system_instruction.clone(),
                }],
            },
            contents: contents.iter().map(WireContent::from).collect(),
            generation_config: WireGenerationConfig::from(&self.generation),
            safety_settings: &self.safety_settings,
        }
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, contents: Vec<Content>) -> Result<ModelReply> {
        debug!(
            "Sending {} turns to Gemini model {}",
            contents.len(),
            self.model()
        );

        let request = self.build_request(&contents);

        let response = self
            .http
            .post(self.api_url())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::llm(format!(
                "Gemini API error {}: {}",
                status, error_text
            )));
        }

        let body: GenerateContentResponse = response.json().await?;
        let reply = body.into_reply();

        if let ModelReply::Blocked { reason } = &reply {
            warn!("Gemini returned no text, block reason: {}", reason);
        }

        Ok(reply)
    }
}

// Gemini REST wire format

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: WireContent,
    contents: Vec<WireContent>,
    generation_config: WireGenerationConfig,
    safety_settings: &'a [SafetySetting],
}

#[derive(Debug, Serialize)]
struct WireContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
    parts: Vec<WirePart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WirePart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: WireBlob,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireBlob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
    response_mime_type: String,
}

impl From<&Content> for WireContent {
    fn from(content: &Content) -> Self {
        let parts = content
            .parts
            .iter()
            .map(|part| match part {
                Part::Text(text) => WirePart::Text { text: text.clone() },
                Part::Image(image) => WirePart::InlineData {
                    inline_data: WireBlob {
                        mime_type: image.mime_type.clone(),
                        data: STANDARD.encode(&image.data),
                    },
                },
            })
            .collect();

        Self {
            role: Some(content.role),
            parts,
        }
    }
}

impl From<&GenerationSettings> for WireGenerationConfig {
    fn from(settings: &GenerationSettings) -> Self {
        Self {
            temperature: settings.temperature,
            top_p: settings.top_p,
            top_k: settings.top_k,
            max_output_tokens: settings.max_output_tokens,
            response_mime_type: settings.response_mime_type.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn into_reply(self) -> ModelReply {
        let candidate = self.candidates.into_iter().next();

        let text = candidate
            .as_ref()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter(|part| !part.thought)
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default();

        if !text.is_empty() {
            return ModelReply::Answer(text);
        }

        let reason = self
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .or_else(|| {
                candidate
                    .and_then(|c| c.finish_reason)
                    .filter(|reason| reason != "STOP")
            })
            .unwrap_or_else(|| "UNKNOWN_REASON".to_string());

        ModelReply::Blocked { reason }
    }
}
