// SYNOID Pitch Video Composer
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Still image + narration + caption -> one MP4. The narration's measured
// duration is the only hold time for both the image and the caption.

use async_trait::async_trait;
use image::GenericImageView;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::agent::script_writer::ScriptResult;
use crate::agent::source_tools::get_media_duration;
use crate::agent::text::wrap_words;
use crate::agent::validation_gate::ValidationGate;
use crate::agent::voice::AudioTrack;
use crate::error::{PitchError, PitchResult};

pub const DEFAULT_WIDTH: u32 = 1280;
pub const DEFAULT_FPS: u32 = 24;

/// Probed in order when no caption font is configured.
pub const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/noto/NotoSans-Bold.ttf",
    "/usr/share/fonts/noto/NotoSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/Library/Fonts/Arial Unicode.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "C:/Windows/Fonts/arialbd.ttf",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSettings {
    pub target_width: u32,
    pub fps: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            target_width: DEFAULT_WIDTH,
            fps: DEFAULT_FPS,
        }
    }
}

impl RenderSettings {
    pub fn validate(&self) -> PitchResult<()> {
        // libx264 with yuv420p needs even dimensions.
        if self.target_width < 2 || self.target_width % 2 != 0 {
            return Err(PitchError::VideoAssembly(format!(
                "target width must be a positive even number, got {}",
                self.target_width
            )));
        }
        if self.fps == 0 || self.fps > 120 {
            return Err(PitchError::VideoAssembly(format!(
                "frame rate must be between 1 and 120, got {}",
                self.fps
            )));
        }
        Ok(())
    }

    /// Height for a `width x height` image scaled to `target_width`,
    /// rounded to the nearest even number.
    pub fn scaled_height(&self, width: u32, height: u32) -> u32 {
        let exact = height as f64 * self.target_width as f64 / width.max(1) as f64;
        let even = ((exact / 2.0).round() as u32) * 2;
        even.max(2)
    }
}

/// The finished video. Its duration is the narration's duration.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoAsset {
    path: PathBuf,
    duration_seconds: f64,
}

impl VideoAsset {
    pub fn new(path: impl Into<PathBuf>, duration_seconds: f64) -> Self {
        Self {
            path: path.into(),
            duration_seconds,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    /// Same asset at a new location (after the file has been moved).
    pub fn relocated(self, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..self
        }
    }
}

#[async_trait]
pub trait VideoComposer: Send + Sync {
    /// Render to `output_path`. On error nothing is left at `output_path`.
    async fn compose(
        &self,
        image_path: &Path,
        script: &ScriptResult,
        audio: &AudioTrack,
        settings: RenderSettings,
        output_path: &Path,
    ) -> PitchResult<VideoAsset>;
}

#[derive(Debug, Clone)]
pub struct CaptionStyle {
    pub font_size: u32,
    pub bottom_margin: u32,
    pub line_spacing: u32,
    pub box_border: u32,
    /// Fraction of the frame width the caption block may use.
    pub width_ratio: f64,
    /// Average glyph advance as a fraction of the font size.
    pub glyph_ratio: f64,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_size: 50,
            bottom_margin: 40,
            line_spacing: 8,
            box_border: 16,
            width_ratio: 0.9,
            glyph_ratio: 0.55,
        }
    }
}

impl CaptionStyle {
    pub fn chars_per_line(&self, frame_width: u32) -> usize {
        let usable = frame_width as f64 * self.width_ratio;
        let glyph = (self.font_size as f64 * self.glyph_ratio).max(1.0);
        ((usable / glyph) as usize).max(1)
    }

    /// Caption text wrapped to the frame ("caption" layout).
    pub fn layout(&self, text: &str, frame_width: u32) -> String {
        wrap_words(text, self.chars_per_line(frame_width)).join("\n")
    }
}

/// Escape a value for a filter option inside `-filter_complex`: once for
/// the option parser, once for the filtergraph parser.
pub fn escape_filter_value(value: &str) -> String {
    let mut option_level = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '\'' | ':') {
            option_level.push('\\');
        }
        option_level.push(c);
    }
    let mut graph_level = String::with_capacity(option_level.len());
    for c in option_level.chars() {
        if matches!(c, '\\' | '\'' | '[' | ']' | ',' | ';') {
            graph_level.push('\\');
        }
        graph_level.push(c);
    }
    graph_level
}

/// Everything one ffmpeg invocation needs.
#[derive(Debug, Clone)]
pub struct RenderPlan {
    pub image: PathBuf,
    pub audio: PathBuf,
    pub caption_file: PathBuf,
    pub font: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub duration_seconds: f64,
}

impl RenderPlan {
    /// Image layer scaled, caption drawn over it, bottom-center.
    pub fn filter_graph(&self, style: &CaptionStyle) -> String {
        format!(
            "[0:v]scale={w}:{h},setsar=1,\
             drawtext=fontfile={font}:textfile={caption}:expansion=none:fontsize={fs}:fontcolor=white:\
             line_spacing={ls}:box=1:boxcolor=black@0.5:boxborderw={bb}:\
             x=(w-text_w)/2:y=h-text_h-{margin},format=yuv420p[v]",
            w = self.width,
            h = self.height,
            font = escape_filter_value(&self.font.to_string_lossy()),
            caption = escape_filter_value(&self.caption_file.to_string_lossy()),
            fs = style.font_size,
            ls = style.line_spacing,
            bb = style.box_border,
            margin = style.bottom_margin,
        )
    }

    pub fn ffmpeg_args(&self, style: &CaptionStyle) -> Vec<String> {
        let fps = self.fps.to_string();
        let duration = format!("{:.3}", self.duration_seconds);
        let mut args: Vec<String> = vec![
            "-y".into(),
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            // Image layer: one still frame looped for the whole narration.
            "-loop".into(),
            "1".into(),
            "-framerate".into(),
            fps.clone(),
            "-t".into(),
            duration.clone(),
            "-i".into(),
            self.image.to_string_lossy().into_owned(),
            "-i".into(),
            self.audio.to_string_lossy().into_owned(),
            "-filter_complex".into(),
            self.filter_graph(style),
            "-map".into(),
            "[v]".into(),
            "-map".into(),
            "1:a:0".into(),
        ];
        args.extend(
            [
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "-r",
                fps.as_str(),
                "-c:a",
                "aac",
                "-b:a",
                "128k",
                "-t",
                duration.as_str(),
                "-movflags",
                "+faststart",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        args.push(self.output.to_string_lossy().into_owned());
        args
    }
}

/// Composer backed by the `ffmpeg` binary.
pub struct FfmpegComposer {
    ffmpeg: String,
    font: Option<PathBuf>,
    style: CaptionStyle,
    verify_output: bool,
}

impl FfmpegComposer {
    pub fn new(font: Option<PathBuf>) -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            font,
            style: CaptionStyle::default(),
            verify_output: true,
        }
    }

    pub fn with_style(mut self, style: CaptionStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify_output = verify;
        self
    }

    /// Configured font if it exists, otherwise the first installed candidate.
    pub fn resolve_font(&self) -> PitchResult<PathBuf> {
        resolve_font(self.font.as_deref())
    }

    async fn render(&self, plan: &RenderPlan) -> PitchResult<()> {
        let args = plan.ffmpeg_args(&self.style);
        debug!("[COMPOSER] ffmpeg {}", args.join(" "));

        let output = Command::new(&self.ffmpeg)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| PitchError::VideoAssembly(format!("failed to run {}: {e}", self.ffmpeg)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("[COMPOSER] ❌ FFmpeg render failed: {}", stderr.trim());
            return Err(PitchError::VideoAssembly(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        if self.verify_output {
            ValidationGate::verify(&self.ffmpeg, &plan.output).await?;
        }
        Ok(())
    }
}

pub fn resolve_font(configured: Option<&Path>) -> PitchResult<PathBuf> {
    if let Some(font) = configured {
        if font.is_file() {
            return Ok(font.to_path_buf());
        }
        return Err(PitchError::VideoAssembly(format!(
            "caption font not found: {}",
            font.display()
        )));
    }
    FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
        .ok_or_else(|| {
            PitchError::VideoAssembly(
                "no caption font available (set PITCH_CAPTION_FONT)".to_string(),
            )
        })
}

/// Decode the whole image, returning its pixel dimensions.
pub async fn image_dimensions(path: &Path) -> PitchResult<(u32, u32)> {
    let owned = path.to_path_buf();
    let decoded = tokio::task::spawn_blocking(move || image::open(&owned))
        .await
        .map_err(|e| PitchError::VideoAssembly(format!("image decode task failed: {e}")))?
        .map_err(|e| {
            PitchError::VideoAssembly(format!("unreadable image {}: {e}", path.display()))
        })?;
    let (w, h) = decoded.dimensions();
    if w == 0 || h == 0 {
        return Err(PitchError::VideoAssembly(format!(
            "image {} has no pixels",
            path.display()
        )));
    }
    Ok((w, h))
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("[COMPOSER] Could not remove partial output {:?}: {}", path, e);
        }
    }
}

#[async_trait]
impl VideoComposer for FfmpegComposer {
    async fn compose(
        &self,
        image_path: &Path,
        script: &ScriptResult,
        audio: &AudioTrack,
        settings: RenderSettings,
        output_path: &Path,
    ) -> PitchResult<VideoAsset> {
        settings.validate()?;
        let duration = audio.duration_seconds();
        if !duration.is_finite() || duration <= 0.0 {
            return Err(PitchError::VideoAssembly(format!(
                "audio duration must be positive, got {duration}"
            )));
        }

        let (img_w, img_h) = image_dimensions(image_path).await?;
        let font = self.resolve_font()?;
        let height = settings.scaled_height(img_w, img_h);

        let caption_file = output_path.with_extension("caption.txt");
        let caption = self.style.layout(script.text(), settings.target_width);
        tokio::fs::write(&caption_file, &caption).await.map_err(|e| {
            PitchError::VideoAssembly(format!("cannot write caption file: {e}"))
        })?;

        let plan = RenderPlan {
            image: image_path.to_path_buf(),
            audio: audio.path().to_path_buf(),
            caption_file: caption_file.clone(),
            font,
            output: output_path.to_path_buf(),
            width: settings.target_width,
            height,
            fps: settings.fps,
            duration_seconds: duration,
        };

        info!(
            "[COMPOSER] Rendering {}x{} @ {}fps for {:.3}s -> {:?}",
            plan.width, plan.height, plan.fps, duration, output_path
        );

        let result = self.render(&plan).await;
        discard(&caption_file).await;
        if let Err(e) = result {
            discard(output_path).await;
            return Err(e);
        }

        match get_media_duration(output_path).await {
            Ok(container) if (container - duration).abs() > 0.1 => warn!(
                "[COMPOSER] Container reports {:.3}s for a {:.3}s narration",
                container, duration
            ),
            Ok(_) => {}
            Err(e) => debug!("[COMPOSER] Skipping container duration report: {}", e),
        }

        info!("[COMPOSER] ✅ Video ready: {:?}", output_path);
        Ok(VideoAsset::new(output_path, duration))
    }
}
