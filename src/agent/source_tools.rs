// SYNOID Pitch Source Tools - Media Inspection
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use std::path::Path;
use tokio::process::Command;

use crate::error::{PitchError, PitchResult};

/// Container duration as reported by ffprobe. Used for post-render
/// reporting only; hold times always come from the measured narration.
pub async fn get_media_duration(path: &Path) -> PitchResult<f64> {
    // Getting duration from header is usually instant.
    let output = tokio::time::timeout(
        tokio::time::Duration::from_secs(10),
        Command::new("ffprobe")
            .kill_on_drop(true)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .output(),
    )
    .await
    .map_err(|_| PitchError::VideoAssembly("ffprobe duration check timed out".to_string()))?
    .map_err(|e| PitchError::VideoAssembly(format!("failed to run ffprobe: {e}")))?;

    String::from_utf8_lossy(&output.stdout)
        .trim()
        .parse()
        .map_err(|_| {
            PitchError::VideoAssembly(format!(
                "failed to parse duration of {} from ffprobe output",
                path.display()
            ))
        })
}
