// SYNOID Pitch Agent Modules
// Copyright (c) 2026 Xing_The_Creator | SYNOID

pub mod health;
pub mod pipeline;
pub mod product;
pub mod script_writer;
pub mod source_tools;
pub mod text;
pub mod validation_gate;
pub mod video_composer;
pub mod voice;
