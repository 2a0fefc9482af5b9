// SYNOID Pitch TTS Backends
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{error, info};
use url::Url;

use super::{measure_duration, reserve_path, AudioTrack, SpeechSynthesizer};
use crate::agent::script_writer::ScriptResult;
use crate::agent::text::wrap_words;
use crate::error::{PitchError, PitchResult};

/// Longest text the translate TTS endpoint accepts per request.
pub const MAX_CHUNK_CHARS: usize = 100;

const BROWSER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Google Translate speech endpoint, the same one gTTS talks to.
pub struct GoogleTts {
    client: Client,
    endpoint: Url,
}

impl GoogleTts {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }

    async fn fetch_chunk(
        &self,
        chunk: &str,
        language_code: &str,
        idx: usize,
        total: usize,
    ) -> PitchResult<Vec<u8>> {
        let total_param = total.to_string();
        let idx_param = idx.to_string();
        let textlen_param = chunk.chars().count().to_string();
        let response = self
            .client
            .get(self.endpoint.clone())
            .header(USER_AGENT, BROWSER_AGENT)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", language_code),
                ("q", chunk),
                ("total", total_param.as_str()),
                ("idx", idx_param.as_str()),
                ("textlen", textlen_param.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PitchError::SpeechSynthesis(format!("TTS request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("[TTS] ❌ Backend returned {} for chunk {}/{}", status, idx + 1, total);
            return Err(PitchError::SpeechSynthesis(format!(
                "TTS backend returned {status} for language '{language_code}': {body}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PitchError::SpeechSynthesis(format!("failed to read TTS audio: {e}")))?;
        if bytes.is_empty() {
            return Err(PitchError::SpeechSynthesis(format!(
                "TTS backend returned no audio for chunk {}/{}",
                idx + 1,
                total
            )));
        }
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    async fn synthesize(
        &self,
        script: &ScriptResult,
        language_code: &str,
        workspace: &Path,
    ) -> PitchResult<AudioTrack> {
        let chunks = wrap_words(script.text(), MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(PitchError::SpeechSynthesis("no text to speak".to_string()));
        }
        info!(
            "[TTS] Synthesizing {} chunk(s) in '{}'",
            chunks.len(),
            language_code
        );

        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            audio.extend(
                self.fetch_chunk(chunk, language_code, idx, chunks.len())
                    .await?,
            );
        }

        let path = reserve_path(workspace, "narration-", ".mp3")?;
        tokio::fs::write(&path, &audio).await.map_err(|e| {
            PitchError::SpeechSynthesis(format!("cannot write {}: {e}", path.display()))
        })?;

        finish_track(path).await
    }
}

/// Local `espeak-ng` subprocess. Writes WAV.
pub struct EspeakTts {
    binary: String,
}

impl EspeakTts {
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for EspeakTts {
    async fn synthesize(
        &self,
        script: &ScriptResult,
        language_code: &str,
        workspace: &Path,
    ) -> PitchResult<AudioTrack> {
        let path = reserve_path(workspace, "narration-", ".wav")?;
        info!("[TTS] Generating audio with {}: {:?}", self.binary, path);

        let output = Command::new(&self.binary)
            .args(espeak_args(language_code, &path, script.text()))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                PitchError::SpeechSynthesis(format!("failed to execute {}: {e}", self.binary))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PitchError::SpeechSynthesis(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        finish_track(path).await
    }
}

/// `--` ends option parsing so a script starting with '-' is still spoken.
fn espeak_args(language_code: &str, path: &Path, text: &str) -> Vec<OsString> {
    vec![
        "-v".into(),
        language_code.into(),
        "-w".into(),
        path.as_os_str().to_os_string(),
        "--".into(),
        text.into(),
    ]
}

async fn finish_track(path: PathBuf) -> PitchResult<AudioTrack> {
    let duration = measure_duration(&path).await?;
    info!("[TTS] ✅ Narration ready: {:.2}s", duration);
    AudioTrack::new(path, duration)
}
