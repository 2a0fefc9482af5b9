// SYNOID Pitch Script Writer
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Turns product facts into a short localized sales pitch by calling a
// text-generation endpoint. Providers disagree on where the generated text
// lives in the response, so extraction walks a fixed list of known shapes.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::str::FromStr;
use tracing::{error, info, warn};
use url::Url;

use crate::agent::product::{LanguageCatalog, ProductSpec};
use crate::config::Config;
use crate::error::{PitchError, PitchResult};

/// Generated pitch text. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptResult {
    text: String,
}

impl ScriptResult {
    pub fn new(text: impl Into<String>) -> PitchResult<Self> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return Err(PitchError::script(None, "", "generated script is empty"));
        }
        Ok(Self { text })
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    async fn generate(&self, spec: &ProductSpec) -> PitchResult<ScriptResult>;
}

/// Body shape sent to the generation endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStyle {
    /// `{"prompt": ..., "max_tokens": ...}`
    Prompt,
    /// OpenAI-compatible `{"messages": [...], "max_tokens": ...}`
    Chat,
}

impl FromStr for RequestStyle {
    type Err = PitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "prompt" | "completion" => Ok(Self::Prompt),
            "chat" | "messages" => Ok(Self::Chat),
            _ => Err(PitchError::Configuration(format!(
                "request style must be 'prompt' or 'chat', got '{s}'"
            ))),
        }
    }
}

/// One place the generated text may live in a response body.
#[derive(Debug, Clone, Copy)]
pub enum Extraction {
    Pointer(&'static str),
    /// `content` of the last `assistant` entry in a top-level `messages` list.
    LastAssistantMessage,
}

/// Tried in order; the first non-empty string wins.
pub const EXTRACTION_ORDER: &[Extraction] = &[
    Extraction::Pointer("/text"),
    Extraction::Pointer("/output"),
    Extraction::Pointer("/output/choices/0/text"),
    Extraction::Pointer("/generated_text"),
    Extraction::Pointer("/0/generated_text"),
    Extraction::Pointer("/choices/0/text"),
    Extraction::Pointer("/choices/0/message/content"),
    Extraction::LastAssistantMessage,
];

impl Extraction {
    fn apply<'a>(&self, body: &'a Value) -> Option<&'a str> {
        match self {
            Self::Pointer(path) => body.pointer(path)?.as_str(),
            Self::LastAssistantMessage => body
                .get("messages")?
                .as_array()?
                .iter()
                .rev()
                .find(|m| m.get("role").and_then(Value::as_str) == Some("assistant"))?
                .get("content")?
                .as_str(),
        }
    }
}

pub fn extract_script(body: &Value) -> Option<String> {
    EXTRACTION_ORDER
        .iter()
        .filter_map(|strategy| strategy.apply(body))
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

pub fn build_prompt(spec: &ProductSpec, language_name: &str) -> String {
    let mut prompt = format!(
        "Write a 2-sentence sales pitch in {} for this product:\n• Name: {}\n",
        language_name,
        spec.name()
    );
    if !spec.features().is_empty() {
        prompt.push_str(&format!("• Features: {}\n", spec.features().join(", ")));
    }
    prompt.push_str(&format!(
        "Tone: friendly, festive. Context: {}.\n",
        spec.context()
    ));
    prompt
}

/// HTTP-backed script generator.
pub struct LlmScriptWriter {
    client: Client,
    endpoint: Url,
    api_key: String,
    style: RequestStyle,
    model: Option<String>,
    max_tokens: u32,
    languages: LanguageCatalog,
}

impl LlmScriptWriter {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.llm_url.clone(),
            api_key: config.api_key.clone(),
            style: config.llm_style,
            model: config.llm_model.clone(),
            max_tokens: config.max_tokens,
            languages: config.languages.clone(),
        }
    }

    pub fn request_body(&self, prompt: &str) -> Value {
        let mut body = match self.style {
            RequestStyle::Prompt => json!({
                "prompt": prompt,
                "max_tokens": self.max_tokens,
            }),
            RequestStyle::Chat => json!({
                "messages": [
                    {
                        "role": "user",
                        "content": prompt
                    }
                ],
                "max_tokens": self.max_tokens,
            }),
        };
        if let Some(model) = &self.model {
            body["model"] = json!(model);
        }
        body
    }
}

#[async_trait]
impl ScriptGenerator for LlmScriptWriter {
    async fn generate(&self, spec: &ProductSpec) -> PitchResult<ScriptResult> {
        let language_name = self
            .languages
            .display_name(spec.language_code())
            .ok_or_else(|| {
                PitchError::InvalidInput(format!(
                    "language '{}' is not in the catalog",
                    spec.language_code()
                ))
            })?;

        let prompt = build_prompt(spec, language_name);
        info!(
            "[SCRIPT] Requesting {} pitch for '{}' from {}",
            language_name,
            spec.name(),
            self.endpoint
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&self.request_body(&prompt))
            .send()
            .await
            .map_err(|e| {
                error!("[SCRIPT] Generation request failed: {}", e);
                PitchError::script(None, "", format!("request failed: {e}"))
            })?;

        let status = response.status();
        let raw = response.text().await.map_err(|e| {
            PitchError::script(
                Some(status.as_u16()),
                "",
                format!("failed to read response body: {e}"),
            )
        })?;

        if !status.is_success() {
            error!("[SCRIPT] ❌ API error {}: {}", status, raw);
            return Err(PitchError::script(
                Some(status.as_u16()),
                raw,
                "non-success status",
            ));
        }

        let body: Value = match serde_json::from_str(&raw) {
            Ok(body) => body,
            Err(e) => {
                warn!("[SCRIPT] Response is not JSON: {}", e);
                return Err(PitchError::script(
                    Some(status.as_u16()),
                    raw,
                    format!("unparseable response body: {e}"),
                ));
            }
        };

        let text = extract_script(&body).ok_or_else(|| {
            warn!("[SCRIPT] No generated text in response: {}", raw);
            PitchError::script(Some(status.as_u16()), raw.clone(), "no generated text in response")
        })?;

        info!("[SCRIPT] ✅ Script generated ({} chars)", text.chars().count());
        ScriptResult::new(text)
    }
}
