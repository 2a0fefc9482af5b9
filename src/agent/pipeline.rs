// SYNOID Pitch Pipeline - Script → Voice → Video Orchestrator
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Runs the three stages strictly in order inside a private temporary
// workspace. The narration's measured duration is handed to the composer
// untouched; the first failing stage ends the run.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::agent::product::ProductSpec;
use crate::agent::script_writer::{LlmScriptWriter, ScriptGenerator};
use crate::agent::video_composer::{FfmpegComposer, RenderSettings, VideoAsset, VideoComposer};
use crate::agent::voice::{build_synthesizer, SpeechSynthesizer};
use crate::config::Config;
use crate::error::{PipelineFailure, PitchError};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    GeneratingScript,
    SynthesizingSpeech,
    AssemblingVideo,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GeneratingScript => "script generation",
            Self::SynthesizingSpeech => "speech synthesis",
            Self::AssemblingVideo => "video assembly",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    Idle,
    GeneratingScript,
    SynthesizingSpeech,
    AssemblingVideo,
    Complete,
    Failed { stage: PipelineStage, reason: String },
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed { .. })
    }
}

impl From<PipelineStage> for PipelineState {
    fn from(stage: PipelineStage) -> Self {
        match stage {
            PipelineStage::GeneratingScript => Self::GeneratingScript,
            PipelineStage::SynthesizingSpeech => Self::SynthesizingSpeech,
            PipelineStage::AssemblingVideo => Self::AssemblingVideo,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::GeneratingScript => f.write_str("generating script"),
            Self::SynthesizingSpeech => f.write_str("synthesizing speech"),
            Self::AssemblingVideo => f.write_str("assembling video"),
            Self::Complete => f.write_str("complete"),
            Self::Failed { stage, reason } => write!(f, "failed during {stage}: {reason}"),
        }
    }
}

pub type ProgressCallback = Arc<dyn Fn(&PipelineState) + Send + Sync>;

/// Configuration for pipeline execution
#[derive(Clone, Default)]
pub struct PipelineConfig {
    pub render: RenderSettings,
    /// Called on every state transition, including the initial `Idle`.
    pub progress_callback: Option<ProgressCallback>,
}

/// One request: product facts, the still image, and where the finished
/// video should be delivered.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub spec: ProductSpec,
    pub image_path: PathBuf,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub video: VideoAsset,
    pub script: String,
}

struct RunTracker<'a> {
    state: PipelineState,
    callback: Option<&'a ProgressCallback>,
}

impl<'a> RunTracker<'a> {
    fn start(callback: Option<&'a ProgressCallback>) -> Self {
        let tracker = Self {
            state: PipelineState::Idle,
            callback,
        };
        tracker.report();
        tracker
    }

    fn report(&self) {
        if let Some(callback) = self.callback {
            callback(&self.state);
        }
    }

    fn transition(&mut self, next: PipelineState) {
        info!("[PIPELINE] {} -> {}", self.state, next);
        self.state = next;
        self.report();
    }

    fn fail(&mut self, stage: PipelineStage, source: PitchError) -> PipelineFailure {
        error!("[PIPELINE] ❌ {} failed: {}", stage, source);
        self.transition(PipelineState::Failed {
            stage,
            reason: source.to_string(),
        });
        PipelineFailure { stage, source }
    }
}

pub struct PitchPipeline {
    script_writer: Arc<dyn ScriptGenerator>,
    voice: Arc<dyn SpeechSynthesizer>,
    composer: Arc<dyn VideoComposer>,
    config: PipelineConfig,
}

impl PitchPipeline {
    pub fn new(
        script_writer: Arc<dyn ScriptGenerator>,
        voice: Arc<dyn SpeechSynthesizer>,
        composer: Arc<dyn VideoComposer>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            script_writer,
            voice,
            composer,
            config,
        }
    }

    /// Pipeline wired to the real HTTP, TTS and ffmpeg backends.
    pub fn from_config(config: &Config, pipeline: PipelineConfig) -> Self {
        Self::new(
            Arc::new(LlmScriptWriter::new(config)),
            build_synthesizer(config),
            Arc::new(FfmpegComposer::new(config.caption_font.clone())),
            pipeline,
        )
    }

    /// Execute the full pipeline
    pub async fn run(&self, request: &PipelineRequest) -> Result<PipelineOutput, PipelineFailure> {
        let mut run = RunTracker::start(self.config.progress_callback.as_ref());
        let spec = &request.spec;

        // Render settings are checked before any stage runs.
        self.config
            .render
            .validate()
            .map_err(|e| run.fail(PipelineStage::AssemblingVideo, e))?;

        // 1) Script
        let stage = PipelineStage::GeneratingScript;
        run.transition(stage.into());
        let script = self
            .script_writer
            .generate(spec)
            .await
            .map_err(|e| run.fail(stage, e))?;
        info!("[PIPELINE] Script: {}", script.text());

        // 2) Voice
        let stage = PipelineStage::SynthesizingSpeech;
        run.transition(stage.into());
        let workspace = tempfile::Builder::new()
            .prefix("synoid-pitch-")
            .tempdir()
            .map_err(|e| {
                run.fail(
                    stage,
                    PitchError::SpeechSynthesis(format!("cannot create workspace: {e}")),
                )
            })?;
        let audio = self
            .voice
            .synthesize(&script, spec.language_code(), workspace.path())
            .await
            .map_err(|e| run.fail(stage, e))?;

        // 3) Video
        let stage = PipelineStage::AssemblingVideo;
        run.transition(stage.into());
        let staging = workspace.path().join("render.mp4");
        let video = self
            .composer
            .compose(
                &request.image_path,
                &script,
                &audio,
                self.config.render,
                &staging,
            )
            .await
            .map_err(|e| run.fail(stage, e))?;

        if video.duration_seconds() != audio.duration_seconds() {
            return Err(run.fail(
                stage,
                PitchError::VideoAssembly(format!(
                    "video is {}s but narration is {}s",
                    video.duration_seconds(),
                    audio.duration_seconds()
                )),
            ));
        }

        let destination = request.output_dir.join(spec.suggested_filename());
        deliver(video.path(), &request.output_dir, &destination)
            .await
            .map_err(|e| run.fail(stage, e))?;

        run.transition(PipelineState::Complete);
        info!(
            "[PIPELINE] ✅ {:?} ({:.2}s)",
            destination,
            video.duration_seconds()
        );

        Ok(PipelineOutput {
            video: video.relocated(destination),
            script: script.text().to_string(),
        })
        // `workspace` drops here and removes the narration and staging files.
    }
}

/// Move the rendered file out of the workspace. Falls back to copy when the
/// destination is on another filesystem.
async fn deliver(staging: &Path, output_dir: &Path, destination: &Path) -> Result<(), PitchError> {
    tokio::fs::create_dir_all(output_dir).await.map_err(|e| {
        PitchError::VideoAssembly(format!("cannot create {}: {e}", output_dir.display()))
    })?;

    if tokio::fs::rename(staging, destination).await.is_ok() {
        return Ok(());
    }

    warn!("[PIPELINE] Rename failed, copying {:?} -> {:?}", staging, destination);
    if let Err(e) = tokio::fs::copy(staging, destination).await {
        let _ = tokio::fs::remove_file(destination).await;
        return Err(PitchError::VideoAssembly(format!(
            "cannot deliver video to {}: {e}",
            destination.display()
        )));
    }
    Ok(())
}
