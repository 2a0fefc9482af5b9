// SYNOID Pitch Voice Stage
// Copyright (c) 2026 Xing_The_Creator | SYNOID

pub mod audio_probe;
pub mod tts;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use crate::agent::script_writer::ScriptResult;
use crate::config::Config;
use crate::error::{PitchError, PitchResult};

pub use audio_probe::measure_duration;
pub use tts::{EspeakTts, GoogleTts};

/// Narration written to a run's workspace, with its measured length.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrack {
    path: PathBuf,
    duration_seconds: f64,
}

impl AudioTrack {
    /// Rejects zero, negative and non-finite durations.
    pub fn new(path: impl Into<PathBuf>, duration_seconds: f64) -> PitchResult<Self> {
        if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
            return Err(PitchError::SpeechSynthesis(format!(
                "audio track has invalid duration {duration_seconds}s"
            )));
        }
        Ok(Self {
            path: path.into(),
            duration_seconds,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Render `script` as speech inside `workspace`. The returned duration is
    /// read back from the written file.
    async fn synthesize(
        &self,
        script: &ScriptResult,
        language_code: &str,
        workspace: &Path,
    ) -> PitchResult<AudioTrack>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtsEngineKind {
    Google,
    Espeak,
}

impl FromStr for TtsEngineKind {
    type Err = PitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "google" | "gtts" => Ok(Self::Google),
            "espeak" | "espeak-ng" => Ok(Self::Espeak),
            _ => Err(PitchError::Configuration(format!(
                "TTS engine must be 'google' or 'espeak', got '{s}'"
            ))),
        }
    }
}

pub fn build_synthesizer(config: &Config) -> Arc<dyn SpeechSynthesizer> {
    match config.tts_engine {
        TtsEngineKind::Google => Arc::new(GoogleTts::new(config.tts_url.clone())),
        TtsEngineKind::Espeak => Arc::new(EspeakTts::new("espeak-ng")),
    }
}

/// Reserve a fresh, uniquely named file inside the workspace. The file is
/// left on disk; the workspace owns its cleanup.
pub(crate) fn reserve_path(workspace: &Path, prefix: &str, suffix: &str) -> PitchResult<PathBuf> {
    tempfile::Builder::new()
        .prefix(prefix)
        .suffix(suffix)
        .tempfile_in(workspace)
        .and_then(|f| f.into_temp_path().keep().map_err(|e| e.error))
        .map_err(|e| {
            PitchError::SpeechSynthesis(format!(
                "cannot create audio file in {}: {e}",
                workspace.display()
            ))
        })
}
