// SYNOID Pitch Validation Gate - Null-Decode Integrity Checker
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Performs a "Null Decode" pass on a rendered video: FFmpeg reads and decodes
// every packet but writes nothing. Any bitstream corruption surfaces as
// text on stderr, and the file is never handed to the caller.

use std::path::Path;
use tokio::process::Command;
use tracing::{error, info};

use crate::error::{PitchError, PitchResult};

pub struct ValidationGate;

impl ValidationGate {
    /// Deep-stream integrity check. Succeeds only if FFmpeg fully decodes
    /// the file with zero errors.
    pub async fn verify(ffmpeg: &str, path: &Path) -> PitchResult<()> {
        let output = Command::new(ffmpeg)
            .args(["-v", "error", "-i"])
            .arg(path)
            .args(["-f", "null", "-"])
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                error!("[VALIDATION] Failed to spawn ffmpeg for verification: {}", e);
                PitchError::VideoAssembly(format!("failed to run {ffmpeg} for verification: {e}"))
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if output.status.success() && stderr.trim().is_empty() {
            info!(
                "[VALIDATION] ✅ Output verified: {:?}",
                path.file_name().unwrap_or_default()
            );
            Ok(())
        } else {
            error!("[VALIDATION] ❌ Corruption in {:?}: {}", path, stderr.trim());
            Err(PitchError::VideoAssembly(format!(
                "rendered file failed decode check: {}",
                stderr.trim()
            )))
        }
    }
}
