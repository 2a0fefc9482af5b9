// SYNOID Pitch Health Check
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Verifies the external tools the pipeline shells out to before a run is
// attempted, so a missing binary shows up as a report instead of a
// half-finished render.

use tokio::process::Command;
use tracing::{info, warn};

use crate::agent::video_composer::resolve_font;
use crate::agent::voice::TtsEngineKind;
use crate::config::Config;

/// Health status of a subsystem
#[derive(Debug, Clone, PartialEq)]
pub enum SubsystemStatus {
    Healthy,
    Down(String),
}

#[derive(Debug, Clone)]
pub struct HealthEntry {
    pub name: &'static str,
    pub status: SubsystemStatus,
}

/// `true` if `program <version_flag>` runs and exits cleanly.
async fn tool_runs(program: &str, version_flag: &str) -> Result<(), String> {
    match Command::new(program).arg(version_flag).output().await {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => Err(format!(
            "'{program} {version_flag}' exited with {}",
            out.status
        )),
        Err(e) => Err(format!("cannot execute '{program}': {e}")),
    }
}

/// `drawtext` needs an ffmpeg built with libfreetype.
async fn ffmpeg_has_drawtext() -> Result<(), String> {
    let out = Command::new("ffmpeg")
        .args(["-hide_banner", "-filters"])
        .output()
        .await
        .map_err(|e| format!("cannot execute 'ffmpeg': {e}"))?;
    if String::from_utf8_lossy(&out.stdout).contains("drawtext") {
        Ok(())
    } else {
        Err("ffmpeg was built without the drawtext filter (libfreetype)".to_string())
    }
}

fn entry(name: &'static str, result: Result<(), String>) -> HealthEntry {
    let status = match result {
        Ok(()) => SubsystemStatus::Healthy,
        Err(reason) => SubsystemStatus::Down(reason),
    };
    HealthEntry { name, status }
}

/// Check every external dependency the configured pipeline needs.
pub async fn check_dependencies(config: &Config) -> Vec<HealthEntry> {
    let mut report = vec![
        entry("ffmpeg", tool_runs("ffmpeg", "-version").await),
        entry("ffprobe", tool_runs("ffprobe", "-version").await),
        entry("drawtext filter", ffmpeg_has_drawtext().await),
        entry(
            "caption font",
            resolve_font(config.caption_font.as_deref())
                .map(|_| ())
                .map_err(|e| e.to_string()),
        ),
    ];
    if config.tts_engine == TtsEngineKind::Espeak {
        report.push(entry("espeak-ng", tool_runs("espeak-ng", "--version").await));
    }

    for item in &report {
        match &item.status {
            SubsystemStatus::Healthy => info!("[HEALTH] ✅ {}", item.name),
            SubsystemStatus::Down(reason) => warn!("[HEALTH] ⚠️ {}: {}", item.name, reason),
        }
    }
    report
}

/// Names of the failing entries.
pub fn missing(report: &[HealthEntry]) -> Vec<&'static str> {
    report
        .iter()
        .filter(|e| e.status != SubsystemStatus::Healthy)
        .map(|e| e.name)
        .collect()
}
