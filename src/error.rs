// SYNOID Pitch Error Types
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use crate::agent::pipeline::PipelineStage;
use thiserror::Error;

pub type PitchResult<T> = Result<T, PitchError>;

#[derive(Debug, Error)]
pub enum PitchError {
    /// Startup-time problem (missing credential, malformed setting). The
    /// pipeline never starts when this is raised.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Raw user input rejected at the CLI boundary.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("script generation failed{}: {reason}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    ScriptGeneration {
        status: Option<u16>,
        body: String,
        reason: String,
    },

    #[error("speech synthesis failed: {0}")]
    SpeechSynthesis(String),

    #[error("video assembly failed: {0}")]
    VideoAssembly(String),
}

impl PitchError {
    pub fn script(status: Option<u16>, body: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ScriptGeneration {
            status,
            body: body.into(),
            reason: reason.into(),
        }
    }
}

/// Terminal failure of one pipeline run, tagged with the stage that broke.
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct PipelineFailure {
    pub stage: PipelineStage,
    #[source]
    pub source: PitchError,
}
