// SYNOID Pitch Library Root
// Copyright (c) 2026 Xing_The_Creator | SYNOID

pub mod agent;
pub mod config;
pub mod error;

pub use agent::pipeline::{PitchPipeline, PipelineConfig, PipelineOutput, PipelineRequest};
pub use config::Config;
pub use error::{PipelineFailure, PitchError, PitchResult};
