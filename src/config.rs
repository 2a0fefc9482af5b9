// SYNOID Pitch Configuration
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Everything here is read once at process start and handed to the
// components by reference. Nothing downstream touches the environment.

use std::path::PathBuf;
use url::Url;

use crate::agent::product::LanguageCatalog;
use crate::agent::script_writer::RequestStyle;
use crate::agent::voice::TtsEngineKind;
use crate::error::{PitchError, PitchResult};

pub const DEFAULT_LLM_URL: &str = "https://api.togetherkey.ai/v1/deepseek";
pub const DEFAULT_TTS_URL: &str = "https://translate.google.com/translate_tts";
pub const DEFAULT_MAX_TOKENS: u32 = 150;

#[derive(Debug, Clone)]
pub struct Config {
    /// Bearer credential for the text-generation service.
    pub api_key: String,
    pub llm_url: Url,
    pub llm_style: RequestStyle,
    pub llm_model: Option<String>,
    pub max_tokens: u32,
    pub tts_engine: TtsEngineKind,
    pub tts_url: Url,
    /// Explicit caption font. When unset the composer probes well-known paths.
    pub caption_font: Option<PathBuf>,
    pub languages: LanguageCatalog,
}

impl Config {
    /// Build from the process environment (call `dotenv().ok()` first).
    pub fn from_env() -> PitchResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> PitchResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get("TOGETHER_API_KEY").ok_or_else(|| {
            PitchError::Configuration(
                "TOGETHER_API_KEY is not set (add it to the environment or .env)".to_string(),
            )
        })?;

        let llm_url = parse_url("PITCH_LLM_URL", get("PITCH_LLM_URL"), DEFAULT_LLM_URL)?;
        let tts_url = parse_url("PITCH_TTS_URL", get("PITCH_TTS_URL"), DEFAULT_TTS_URL)?;

        let llm_style = match get("PITCH_LLM_STYLE") {
            Some(raw) => raw.parse::<RequestStyle>().map_err(|_| {
                PitchError::Configuration(format!(
                    "PITCH_LLM_STYLE must be 'prompt' or 'chat', got '{raw}'"
                ))
            })?,
            None => RequestStyle::Prompt,
        };

        let max_tokens = match get("PITCH_MAX_TOKENS") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(PitchError::Configuration(format!(
                        "PITCH_MAX_TOKENS must be a positive integer, got '{raw}'"
                    )))
                }
            },
            None => DEFAULT_MAX_TOKENS,
        };

        let tts_engine = match get("PITCH_TTS_ENGINE") {
            Some(raw) => raw.parse::<TtsEngineKind>().map_err(|_| {
                PitchError::Configuration(format!(
                    "PITCH_TTS_ENGINE must be 'google' or 'espeak', got '{raw}'"
                ))
            })?,
            None => TtsEngineKind::Google,
        };

        let languages = match get("PITCH_LANGUAGES") {
            Some(raw) => LanguageCatalog::parse(&raw)?,
            None => LanguageCatalog::default(),
        };

        Ok(Self {
            api_key,
            llm_url,
            llm_style,
            llm_model: get("PITCH_LLM_MODEL"),
            max_tokens,
            tts_engine,
            tts_url,
            caption_font: get("PITCH_CAPTION_FONT").map(PathBuf::from),
            languages,
        })
    }
}

fn parse_url(key: &str, value: Option<String>, default: &str) -> PitchResult<Url> {
    let raw = value.unwrap_or_else(|| default.to_string());
    let url = Url::parse(&raw)
        .map_err(|e| PitchError::Configuration(format!("{key} is not a valid URL ('{raw}'): {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(PitchError::Configuration(format!(
            "{key} must use http or https, got '{other}'"
        ))),
    }
}
