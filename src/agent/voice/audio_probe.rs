// SYNOID Pitch Audio Probe
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Track length is measured by demuxing the file and summing packet
// durations in the track's time base. Nothing is estimated from text.

use std::fs::File;
use std::path::{Path, PathBuf};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::TimeBase;
use tracing::debug;

use crate::error::{PitchError, PitchResult};

/// Measure the real-time length of an encoded audio file, in seconds.
pub async fn measure_duration(path: &Path) -> PitchResult<f64> {
    let path: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || measure_duration_blocking(&path))
        .await
        .map_err(|e| PitchError::SpeechSynthesis(format!("duration probe task failed: {e}")))?
}

pub fn measure_duration_blocking(path: &Path) -> PitchResult<f64> {
    let fail = |reason: String| {
        PitchError::SpeechSynthesis(format!("cannot measure {}: {reason}", path.display()))
    };

    let file = File::open(path).map_err(|e| fail(e.to_string()))?;
    let stream = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| fail(format!("unrecognized audio: {e}")))?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| fail("no audio track".to_string()))?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    let time_base = params
        .time_base
        .or_else(|| params.sample_rate.map(|rate| TimeBase::new(1, rate)))
        .ok_or_else(|| fail("track has neither time base nor sample rate".to_string()))?;

    let mut ticks: u64 = 0;
    loop {
        match format.next_packet() {
            Ok(packet) => {
                if packet.track_id() == track_id {
                    ticks += packet.dur();
                }
            }
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(e) => return Err(fail(format!("demux error: {e}"))),
        }
    }

    // Containers that expose a frame count without per-packet durations.
    if ticks == 0 {
        ticks = params.n_frames.unwrap_or(0);
    }

    let time = time_base.calc_time(ticks);
    let seconds = time.seconds as f64 + time.frac;
    debug!("[TTS] Measured {:?}: {:.3}s", path.file_name().unwrap_or_default(), seconds);
    Ok(seconds)
}
