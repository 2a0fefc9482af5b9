// SYNOID Pitch Main Entry Point
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use synoid_pitch::agent::health;
use synoid_pitch::agent::pipeline::{PipelineState, ProgressCallback};
use synoid_pitch::agent::product::ProductSpec;
use synoid_pitch::agent::video_composer::{RenderSettings, DEFAULT_FPS, DEFAULT_WIDTH};
use synoid_pitch::{Config, PipelineConfig, PipelineRequest, PitchPipeline};

#[derive(Parser)]
#[command(name = "synoid-pitch")]
#[command(about = "Localized product pitch videos: script, voice, captions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a narrated product video
    Generate {
        /// Product image (jpg/png)
        #[arg(short, long)]
        image: PathBuf,

        /// Product name
        #[arg(short, long)]
        name: String,

        /// Features, comma-separated
        #[arg(short, long, default_value = "")]
        features: String,

        /// Selling context (e.g. "Diwali gifting")
        #[arg(short, long, default_value = "")]
        context: String,

        /// Language code (see `languages`)
        #[arg(short, long, default_value = "hi")]
        language: String,

        /// Directory the finished video is written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Output frame width in pixels
        #[arg(long, default_value_t = DEFAULT_WIDTH)]
        width: u32,

        /// Output frame rate
        #[arg(long, default_value_t = DEFAULT_FPS)]
        fps: u32,
    },

    /// List supported languages
    Languages,

    /// Check external tools (ffmpeg, fonts, TTS)
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Default log level unless explicitly overridden by the user.
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info,symphonia=error");
    }
    tracing_subscriber::fmt::init();

    info!("--- SYNOID PITCH v{} ---", env!("CARGO_PKG_VERSION"));

    let args = Cli::parse();

    // Credential and endpoints are validated once, before any work starts.
    let config = Config::from_env().context("startup configuration")?;

    match args.command {
        Commands::Languages => {
            for (code, name) in config.languages.iter() {
                println!("{code}\t{name}");
            }
        }

        Commands::Check => {
            let report = health::check_dependencies(&config).await;
            let missing = health::missing(&report);
            if missing.is_empty() {
                println!("✅ All dependencies available");
            } else {
                anyhow::bail!("missing dependencies: {}", missing.join(", "));
            }
        }

        Commands::Generate {
            image,
            name,
            features,
            context,
            language,
            output_dir,
            width,
            fps,
        } => {
            let spec = ProductSpec::from_raw(&name, &features, &context, &language, &config.languages)?;
            if !image.is_file() {
                anyhow::bail!("product image not found: {}", image.display());
            }

            let render = RenderSettings {
                target_width: width,
                fps,
            };
            render.validate().context("invalid --width/--fps")?;

            let progress: ProgressCallback = Arc::new(|state: &PipelineState| match state {
                PipelineState::Idle | PipelineState::Complete => {}
                PipelineState::Failed { stage, reason } => {
                    eprintln!("❌ {stage} failed: {reason}")
                }
                other => println!("⏳ {other}..."),
            });

            let pipeline = PitchPipeline::from_config(
                &config,
                PipelineConfig {
                    render,
                    progress_callback: Some(progress),
                },
            );

            let request = PipelineRequest {
                spec,
                image_path: image,
                output_dir,
            };

            match pipeline.run(&request).await {
                Ok(output) => {
                    println!("Script: {}", output.script);
                    println!(
                        "🎬 Video: {} ({:.2}s)",
                        output.video.path().display(),
                        output.video.duration_seconds()
                    );
                }
                Err(failure) => {
                    error!("Pipeline stopped during {}: {}", failure.stage, failure.source);
                    return Err(failure.into());
                }
            }
        }
    }

    Ok(())
}
