use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};

use image_optimizer_core::{
    logging, Config, ImageFormat, ImageOptimizer, ItemState, Strategy,
};

#[derive(Parser)]
#[command(name = "image-optimizer")]
#[command(about = "Resize, re-encode and compress images in bulk")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize a set of image files
    Optimize {
        /// Image files to optimize
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Target format: jpeg, png or webp
        #[arg(short, long)]
        format: Option<String>,

        /// Encoding quality, 0-100
        #[arg(short, long)]
        quality: Option<f32>,

        /// Maximum output width in pixels
        #[arg(long)]
        max_width: Option<u32>,

        /// Maximum output height in pixels
        #[arg(long)]
        max_height: Option<u32>,

        /// Try the AI enhancement service, falling back to the
        /// deterministic path on failure (requires GEMINI_API_KEY)
        #[arg(long)]
        ai: bool,

        /// Directory for the optimized output
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Worker threads (1 = sequential, 0 = one per CPU)
        #[arg(long)]
        threads: Option<usize>,

        /// Deadline in seconds for decoding and re-encoding one image
        /// (0 disables the deadline)
        #[arg(long)]
        codec_timeout: Option<u64>,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Generate default configuration file
    GenerateConfig {
        /// Path to save configuration file
        #[arg(default_value = "image-optimizer.json")]
        path: PathBuf,
    },
}

fn main() -> Result<(), anyhow::Error> {
    // Pick up GEMINI_API_KEY from a .env file if present
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Optimize {
            files,
            format,
            quality,
            max_width,
            max_height,
            ai,
            output_dir,
            threads,
            codec_timeout,
            config,
        } => {
            // Set up configuration
            let mut config = if let Some(config_path) = config {
                Config::from_file(&config_path)?
            } else {
                Config::default()
            };

            // Override config with command line arguments
            if let Some(format) = format {
                config.options.format = ImageFormat::from_extension(&format)?;
            }
            if let Some(quality) = quality {
                // CLI speaks 0-100; the engine speaks 0.0-1.0
                config.options = config.options.with_quality_percent(quality);
            }
            if let Some(max_width) = max_width {
                config.options.max_width = Some(max_width);
            }
            if let Some(max_height) = max_height {
                config.options.max_height = Some(max_height);
            }
            if let Some(output_dir) = output_dir {
                config.output_dir = output_dir;
            }
            if let Some(threads) = threads {
                config.threads = threads;
            }
            if let Some(codec_timeout) = codec_timeout {
                // 0 on the command line means "no deadline"
                config.options.codec_timeout_secs =
                    (codec_timeout > 0).then_some(codec_timeout);
            }
            if ai {
                config.strategy = Strategy::AiWithFallback;
                if config.api_key.is_none() {
                    config.api_key = std::env::var("GEMINI_API_KEY").ok();
                }
            }

            // File-based logging keeps the progress bar clean; fall back to
            // env_logger when the log directory is not writable
            if logging::init_logger("logs", config.log_level).is_err() {
                env_logger::init();
            }

            let optimizer = ImageOptimizer::new(config)?;

            info!("loading {} files", files.len());
            let images = optimizer.load_images(&files)?;

            // Ctrl-C finishes the current item and leaves the rest pending
            let cancel = Arc::new(AtomicBool::new(false));
            let cancel_handler = cancel.clone();
            ctrlc::set_handler(move || {
                warn!("interrupt received, cancelling after current item");
                cancel_handler.store(true, Ordering::SeqCst);
            })?;

            let progress = ProgressBar::new(images.len() as u64);
            progress.set_style(
                ProgressStyle::default_bar()
                    .template("{wide_bar} {pos}/{len} ({percent}%) | {msg}")
                    .unwrap()
                    .progress_chars("█▓▒░ "),
            );
            progress.set_message("Optimizing...");

            let processed = optimizer.run(images, &cancel, |event| {
                progress.set_position(event.completed as u64);
            })?;
            progress.finish_and_clear();

            // Per-item report
            let mut succeeded = 0;
            let mut failed = 0;
            for item in &processed {
                match item.state {
                    ItemState::Succeeded => {
                        succeeded += 1;
                        let result = item.result.as_ref().unwrap();
                        println!(
                            "{}: {} -> {} bytes ({:.1}% reduction){}",
                            item.source.file_name,
                            result.original_size,
                            result.optimized_size,
                            result.compression_ratio(),
                            if item.ai_optimized { " [ai]" } else { "" }
                        );
                    }
                    ItemState::Failed => {
                        failed += 1;
                        println!(
                            "{}: FAILED ({})",
                            item.source.file_name,
                            item.error.as_deref().unwrap_or("unknown error")
                        );
                    }
                    _ => println!("{}: skipped (cancelled)", item.source.file_name),
                }
            }

            let written = optimizer.export(&processed)?;
            println!(
                "\n{} optimized, {} failed; {} files written to {}",
                succeeded,
                failed,
                written.len(),
                optimizer.config().output_dir.display()
            );

            Ok(())
        }

        Commands::GenerateConfig { path } => {
            let config = Config::default();
            config.save_to_file(&path)?;
            println!("Configuration file generated at: {}", path.display());
            Ok(())
        }
    }
}
