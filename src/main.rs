//! # Labelstation CLI
//!
//! Command-line interface for the label print service.
//!
//! ## Usage
//!
//! ```bash
//! # Run the HTTP API
//! labelstation serve --listen 0.0.0.0:5000 --config config.json
//!
//! # List configured printers
//! labelstation printers
//!
//! # Installation diagnostics
//! labelstation check
//!
//! # Render a label to PNG without printing
//! labelstation render --text "Hello" --rotate 90 --png label.png
//! ```

use clap::{Parser, Subcommand};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use labelstation::{
    config::{ConfigStore, DEFAULT_CONFIG_PATH},
    dispatch::{self, DriverSet},
    error::{ConfigError, ServerError},
    job::PrintOptions,
    printer::{self, BackendFamily},
    render::{self, RenderError},
    server::{self, ServerConfig},
    transform::{self, LabelTooLarge},
};

/// Labelstation - Brother QL/PT label print service
#[derive(Parser, Debug)]
#[command(name = "labelstation")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:5000")]
        listen: String,

        /// Configuration file (created if missing)
        #[arg(long, env = "CONFIG_FILE", default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Seconds before a stuck driver send is abandoned (0 disables)
        #[arg(long, env = "DISPATCH_TIMEOUT_SECS", default_value = "30")]
        dispatch_timeout: u64,

        /// Largest accepted request body in megabytes
        #[arg(long, default_value = "50")]
        max_body_mb: usize,
    },

    /// List configured printers
    Printers {
        #[arg(long, env = "CONFIG_FILE", default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },

    /// Check fonts, document support, drivers and configuration
    Check {
        #[arg(long, env = "CONFIG_FILE", default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },

    /// Render a label to PNG without printing
    Render {
        /// Text to render
        #[arg(long, conflicts_with = "image")]
        text: Option<String>,

        /// Image file to render
        #[arg(long, value_name = "FILE")]
        image: Option<PathBuf>,

        /// Output PNG file
        #[arg(long, value_name = "FILE")]
        png: PathBuf,

        /// Rotation in degrees (0, 90, 180, 270)
        #[arg(long, default_value = "0")]
        rotate: i32,

        /// White border in pixels
        #[arg(long, default_value = "10")]
        margin: i32,

        /// Font size in pixels
        #[arg(long, default_value = "24")]
        font_size: i32,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    TooLarge(#[from] LabelTooLarge),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Usage(String),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            listen,
            config,
            dispatch_timeout,
            max_body_mb,
        } => {
            let server_config = ServerConfig {
                listen_addr: listen,
                config_path: config,
                dispatch_timeout: (dispatch_timeout > 0).then(|| Duration::from_secs(dispatch_timeout)),
                max_body_bytes: max_body_mb.saturating_mul(1024 * 1024),
            };
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(server_config))?;
        }

        Commands::Printers { config } => {
            let store = ConfigStore::load(&config)?;
            if store.printers().is_empty() {
                println!("No printers configured in {}", store.path().display());
                return Ok(());
            }
            for p in store.printers() {
                println!(
                    "{:<16} {:<20} {:<12} {}  [{}]",
                    p.id,
                    p.name,
                    p.model,
                    p.connection(),
                    p.family()
                );
            }
        }

        Commands::Check { config } => check(&config)?,

        Commands::Render {
            text,
            image,
            png,
            rotate,
            margin,
            font_size,
        } => {
            let options = PrintOptions {
                font_size,
                rotate,
                margin,
                ..Default::default()
            };
            options.validate().map_err(CliError::Usage)?;

            let mono = match (text, image) {
                (Some(text), _) => {
                    let canvas = render::text::render_text(&text, options.font_size_px(), options.margin_px())?;
                    transform::apply(DynamicImage::ImageRgb8(canvas), options.rotation(), 0)?
                }
                (None, Some(path)) => {
                    let bytes = std::fs::read(&path)?;
                    let decoded = render::image::decode_image(&bytes)?;
                    let canvas = render::image::flatten_on_white(&decoded);
                    transform::apply(DynamicImage::ImageRgb8(canvas), options.rotation(), options.margin_px())?
                }
                (None, None) => return Err(CliError::Usage("either --text or --image is required".to_string())),
            };

            mono.as_gray().save(&png).map_err(RenderError::from)?;
            println!(
                "Wrote {}x{} label ({} black pixels) to {}",
                mono.width(),
                mono.height(),
                mono.black_pixel_count(),
                png.display()
            );
        }
    }

    Ok(())
}

/// Print installation diagnostics.
fn check(config: &Path) -> Result<(), CliError> {
    println!("Text font:      {}", render::text::text_font().describe());

    match render::document::system_rasterizer() {
        Some(rasterizer) => println!("Documents:      available ({})", rasterizer.name()),
        None => println!("Documents:      unavailable (document jobs report pdf_support_missing)"),
    }

    let drivers = DriverSet::default();
    for (family, model) in [(BackendFamily::Ql, "QL-820NWB"), (BackendFamily::Pt, "PT-P710BT")] {
        let backend = dispatch::select(&drivers, model);
        println!("Driver {:<8} {}", format!("{}:", family), backend.name());
    }

    let store = ConfigStore::load(config)?;
    println!("Config:         {}", store.path().display());
    println!("API keys:       {}", store.api_key_count());
    if store.uses_placeholder_key() {
        println!("                placeholder key present, replace it before exposing the API");
    }
    println!("Printers:       {}", store.printers().len());
    for p in store.printers() {
        let known = if printer::is_known_model(&p.model) { "" } else { " (unknown model)" };
        println!("  {} -> {} via {}{}", p.id, p.model, p.connection(), known);
    }

    Ok(())
}
