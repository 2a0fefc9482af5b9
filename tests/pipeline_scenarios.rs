use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use synoid_pitch::agent::pipeline::{PipelineStage, PipelineState, ProgressCallback};
use synoid_pitch::agent::product::{LanguageCatalog, ProductSpec};
use synoid_pitch::agent::script_writer::{build_prompt, ScriptGenerator, ScriptResult};
use synoid_pitch::agent::video_composer::{RenderSettings, VideoAsset, VideoComposer};
use synoid_pitch::agent::voice::{AudioTrack, SpeechSynthesizer};
use synoid_pitch::{PipelineConfig, PipelineRequest, PitchError, PitchPipeline, PitchResult};

const HINDI_SCRIPT: &str = "यह दीपक बहुत सुंदर है।";

struct StubWriter {
    reply: Result<String, u16>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl StubWriter {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(status),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ScriptGenerator for StubWriter {
    async fn generate(&self, spec: &ProductSpec) -> PitchResult<ScriptResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap()
            .push(build_prompt(spec, "Hindi"));
        match &self.reply {
            Ok(text) => ScriptResult::new(text.clone()),
            Err(status) => Err(PitchError::script(Some(*status), "stub failure", "non-success status")),
        }
    }
}

struct StubVoice {
    duration: f64,
    fail: bool,
    calls: AtomicUsize,
    workspaces: Mutex<Vec<PathBuf>>,
}

impl StubVoice {
    fn with_duration(duration: f64) -> Arc<Self> {
        Arc::new(Self {
            duration,
            fail: false,
            calls: AtomicUsize::new(0),
            workspaces: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            duration: 3.0,
            fail: true,
            calls: AtomicUsize::new(0),
            workspaces: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for StubVoice {
    async fn synthesize(
        &self,
        _script: &ScriptResult,
        language_code: &str,
        workspace: &Path,
    ) -> PitchResult<AudioTrack> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.workspaces.lock().unwrap().push(workspace.to_path_buf());
        if self.fail {
            return Err(PitchError::SpeechSynthesis(format!(
                "backend rejected language '{language_code}'"
            )));
        }
        let path = workspace.join("narration.mp3");
        std::fs::write(&path, b"fake mp3").unwrap();
        AudioTrack::new(path, self.duration)
    }
}

#[derive(Default)]
struct StubComposer {
    fail: bool,
    /// Report a different duration than the narration.
    skew: f64,
    calls: AtomicUsize,
    durations: Mutex<Vec<f64>>,
}

#[async_trait]
impl VideoComposer for StubComposer {
    async fn compose(
        &self,
        _image_path: &Path,
        _script: &ScriptResult,
        audio: &AudioTrack,
        _settings: RenderSettings,
        output_path: &Path,
    ) -> PitchResult<VideoAsset> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.durations.lock().unwrap().push(audio.duration_seconds());
        if self.fail {
            return Err(PitchError::VideoAssembly("encoder crashed".to_string()));
        }
        std::fs::write(output_path, b"fake mp4").unwrap();
        Ok(VideoAsset::new(output_path, audio.duration_seconds() + self.skew))
    }
}

fn lamp_spec(features: &str) -> ProductSpec {
    ProductSpec::from_raw(
        "Brass Lamp",
        features,
        "Diwali gifting",
        "hi",
        &LanguageCatalog::default(),
    )
    .unwrap()
}

fn request(spec: ProductSpec, output_dir: &Path) -> PipelineRequest {
    PipelineRequest {
        spec,
        image_path: PathBuf::from("product.png"),
        output_dir: output_dir.to_path_buf(),
    }
}

fn recording_config() -> (PipelineConfig, Arc<Mutex<Vec<PipelineState>>>) {
    let states = Arc::new(Mutex::new(Vec::new()));
    let sink = states.clone();
    let callback: ProgressCallback = Arc::new(move |state: &PipelineState| {
        sink.lock().unwrap().push(state.clone());
    });
    (
        PipelineConfig {
            render: RenderSettings::default(),
            progress_callback: Some(callback),
        },
        states,
    )
}

#[tokio::test]
async fn test_brass_lamp_hindi_uses_narration_duration() {
    let out = tempfile::tempdir().unwrap();
    let writer = StubWriter::replying(HINDI_SCRIPT);
    let voice = StubVoice::with_duration(3.2);
    let composer = Arc::new(StubComposer::default());
    let (config, states) = recording_config();

    let pipeline = PitchPipeline::new(writer.clone(), voice.clone(), composer.clone(), config);
    let output = pipeline
        .run(&request(lamp_spec("eco-friendly, long-lasting"), out.path()))
        .await
        .unwrap();

    assert_eq!(*composer.durations.lock().unwrap(), vec![3.2]);
    assert_eq!(output.video.duration_seconds(), 3.2);
    assert_eq!(output.script, HINDI_SCRIPT);
    assert_eq!(output.video.path(), out.path().join("Brass_Lamp.mp4"));
    assert!(output.video.path().exists());

    assert_eq!(
        *states.lock().unwrap(),
        vec![
            PipelineState::Idle,
            PipelineState::GeneratingScript,
            PipelineState::SynthesizingSpeech,
            PipelineState::AssemblingVideo,
            PipelineState::Complete,
        ]
    );

    // The run's workspace is gone once the video has been delivered.
    let workspaces = voice.workspaces.lock().unwrap();
    assert_eq!(workspaces.len(), 1);
    assert!(!workspaces[0].exists());
}

#[tokio::test]
async fn test_generation_failure_stops_before_speech() {
    let out = tempfile::tempdir().unwrap();
    let writer = StubWriter::failing(500);
    let voice = StubVoice::with_duration(3.2);
    let composer = Arc::new(StubComposer::default());
    let (config, states) = recording_config();

    let pipeline = PitchPipeline::new(writer.clone(), voice.clone(), composer.clone(), config);
    let failure = pipeline
        .run(&request(lamp_spec("eco-friendly"), out.path()))
        .await
        .unwrap_err();

    assert_eq!(failure.stage, PipelineStage::GeneratingScript);
    assert!(matches!(
        failure.source,
        PitchError::ScriptGeneration { status: Some(500), .. }
    ));
    assert_eq!(voice.calls.load(Ordering::SeqCst), 0);
    assert_eq!(composer.calls.load(Ordering::SeqCst), 0);
    assert!(matches!(
        states.lock().unwrap().last(),
        Some(PipelineState::Failed {
            stage: PipelineStage::GeneratingScript,
            ..
        })
    ));
}

#[tokio::test]
async fn test_speech_failure_never_reaches_composer() {
    let out = tempfile::tempdir().unwrap();
    let writer = StubWriter::replying(HINDI_SCRIPT);
    let voice = StubVoice::failing();
    let composer = Arc::new(StubComposer::default());
    let (config, states) = recording_config();

    let pipeline = PitchPipeline::new(writer, voice.clone(), composer.clone(), config);
    let failure = pipeline
        .run(&request(lamp_spec("eco-friendly"), out.path()))
        .await
        .unwrap_err();

    assert_eq!(failure.stage, PipelineStage::SynthesizingSpeech);
    assert_eq!(voice.calls.load(Ordering::SeqCst), 1);
    assert_eq!(composer.calls.load(Ordering::SeqCst), 0);
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);

    let states = states.lock().unwrap();
    assert_eq!(states.len(), 4);
    assert!(!states.contains(&PipelineState::AssemblingVideo));
    assert!(states.last().unwrap().is_terminal());
}

#[tokio::test]
async fn test_zero_length_narration_is_rejected_before_composer() {
    for bad in [0.0, -2.0] {
        let out = tempfile::tempdir().unwrap();
        let composer = Arc::new(StubComposer::default());
        let pipeline = PitchPipeline::new(
            StubWriter::replying(HINDI_SCRIPT),
            StubVoice::with_duration(bad),
            composer.clone(),
            PipelineConfig::default(),
        );

        let failure = pipeline
            .run(&request(lamp_spec("eco-friendly"), out.path()))
            .await
            .unwrap_err();
        assert_eq!(failure.stage, PipelineStage::SynthesizingSpeech);
        assert_eq!(composer.calls.load(Ordering::SeqCst), 0);
    }
}

#[tokio::test]
async fn test_video_duration_matches_audio_across_range() {
    for seconds in [1.0, 2.5, 3.2, 17.75, 42.125, 59.999, 60.0] {
        let out = tempfile::tempdir().unwrap();
        let pipeline = PitchPipeline::new(
            StubWriter::replying(HINDI_SCRIPT),
            StubVoice::with_duration(seconds),
            Arc::new(StubComposer::default()),
            PipelineConfig::default(),
        );
        let output = pipeline
            .run(&request(lamp_spec("eco-friendly"), out.path()))
            .await
            .unwrap();
        assert_eq!(output.video.duration_seconds(), seconds);
    }
}

#[tokio::test]
async fn test_repeat_runs_give_identical_durations() {
    let pipeline = PitchPipeline::new(
        StubWriter::replying(HINDI_SCRIPT),
        StubVoice::with_duration(4.6),
        Arc::new(StubComposer::default()),
        PipelineConfig::default(),
    );

    let first_dir = tempfile::tempdir().unwrap();
    let second_dir = tempfile::tempdir().unwrap();
    let first = pipeline
        .run(&request(lamp_spec("eco-friendly"), first_dir.path()))
        .await
        .unwrap();
    let second = pipeline
        .run(&request(lamp_spec("eco-friendly"), second_dir.path()))
        .await
        .unwrap();

    assert_eq!(first.video.duration_seconds(), second.video.duration_seconds());
}

#[tokio::test]
async fn test_empty_features_still_produce_video() {
    let out = tempfile::tempdir().unwrap();
    let writer = StubWriter::replying("A lamp for every home.");
    let pipeline = PitchPipeline::new(
        writer.clone(),
        StubVoice::with_duration(2.0),
        Arc::new(StubComposer::default()),
        PipelineConfig::default(),
    );

    let spec = lamp_spec("");
    assert!(spec.features().is_empty());
    let output = pipeline.run(&request(spec, out.path())).await.unwrap();

    let prompts = writer.prompts.lock().unwrap();
    assert!(!prompts[0].contains("Features"));
    assert!(prompts[0].contains("Brass Lamp"));
    assert_eq!(output.video.duration_seconds(), 2.0);
}

#[tokio::test]
async fn test_composer_failure_leaves_no_video() {
    let out = tempfile::tempdir().unwrap();
    let voice = StubVoice::with_duration(3.2);
    let composer = Arc::new(StubComposer {
        fail: true,
        ..Default::default()
    });
    let pipeline = PitchPipeline::new(
        StubWriter::replying(HINDI_SCRIPT),
        voice.clone(),
        composer.clone(),
        PipelineConfig::default(),
    );

    let failure = pipeline
        .run(&request(lamp_spec("eco-friendly"), out.path()))
        .await
        .unwrap_err();
    assert_eq!(failure.stage, PipelineStage::AssemblingVideo);
    assert!(matches!(failure.source, PitchError::VideoAssembly(_)));
    assert!(!out.path().join("Brass_Lamp.mp4").exists());
    assert!(!voice.workspaces.lock().unwrap()[0].exists());
}

#[tokio::test]
async fn test_composer_reporting_other_duration_is_rejected() {
    let out = tempfile::tempdir().unwrap();
    let composer = Arc::new(StubComposer {
        skew: 8.0 - 3.2,
        ..Default::default()
    });
    let pipeline = PitchPipeline::new(
        StubWriter::replying(HINDI_SCRIPT),
        StubVoice::with_duration(3.2),
        composer,
        PipelineConfig::default(),
    );

    let failure = pipeline
        .run(&request(lamp_spec("eco-friendly"), out.path()))
        .await
        .unwrap_err();
    assert_eq!(failure.stage, PipelineStage::AssemblingVideo);
    assert!(!out.path().join("Brass_Lamp.mp4").exists());
}

#[tokio::test]
async fn test_concurrent_runs_use_separate_workspaces() {
    let voice = StubVoice::with_duration(3.2);
    let pipeline = Arc::new(PitchPipeline::new(
        StubWriter::replying(HINDI_SCRIPT),
        voice.clone(),
        Arc::new(StubComposer::default()),
        PipelineConfig::default(),
    ));

    let a_dir = tempfile::tempdir().unwrap();
    let b_dir = tempfile::tempdir().unwrap();
    let a_req = request(lamp_spec("eco-friendly"), a_dir.path());
    let b_req = request(lamp_spec("long-lasting"), b_dir.path());

    let (a, b) = tokio::join!(pipeline.run(&a_req), pipeline.run(&b_req));
    assert!(a.is_ok() && b.is_ok());

    let workspaces = voice.workspaces.lock().unwrap();
    assert_eq!(workspaces.len(), 2);
    assert_ne!(workspaces[0], workspaces[1]);
}

#[tokio::test]
async fn test_invalid_render_settings_fail_before_any_stage() {
    let out = tempfile::tempdir().unwrap();
    let writer = StubWriter::replying(HINDI_SCRIPT);
    let voice = StubVoice::with_duration(3.2);
    let composer = Arc::new(StubComposer::default());

    for render in [
        RenderSettings { target_width: 1281, fps: 24 },
        RenderSettings { target_width: 1280, fps: 0 },
    ] {
        let pipeline = PitchPipeline::new(
            writer.clone(),
            voice.clone(),
            composer.clone(),
            PipelineConfig {
                render,
                progress_callback: None,
            },
        );
        let failure = pipeline
            .run(&request(lamp_spec("eco-friendly"), out.path()))
            .await
            .unwrap_err();
        assert_eq!(failure.stage, PipelineStage::AssemblingVideo);
        assert!(matches!(failure.source, PitchError::VideoAssembly(_)));
    }

    assert_eq!(writer.calls.load(Ordering::SeqCst), 0);
    assert_eq!(voice.calls.load(Ordering::SeqCst), 0);
    assert_eq!(composer.calls.load(Ordering::SeqCst), 0);
}
