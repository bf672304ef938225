//! cvintel CLI - command-line interface for the résumé-to-match pipeline.
//!
//! # Commands
//!
//! - `extract`: run structured extraction (and OCR, if compiled in) against a local file
//! - `config`: print the effective configuration after file/env overrides
//! - `serve`: start the REST API server (requires the `api` feature)
//!
//! # Configuration
//!
//! Config files are TOML or JSON, loaded explicitly with `--config` or
//! auto-discovered as `cvintel.toml`/`cvintel.json` in the current and
//! parent directories, then overridden by `CVINTEL_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cvintel::config::PipelineConfig;
use tracing_subscriber::EnvFilter;

/// cvintel résumé-to-match pipeline CLI.
#[derive(Parser)]
#[command(name = "cvintel")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a structured candidate profile from a local document.
    Extract {
        /// Path to the document (PDF or image).
        path: PathBuf,

        /// Path to config file (TOML or JSON). If not specified, searches
        /// for cvintel.toml/cvintel.json in current and parent directories.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Declared file type (pdf, png, jpeg, tiff, bmp, gif, webp).
        /// Inferred from the file extension if not provided.
        #[arg(short = 't', long)]
        file_type: Option<String>,

        /// Output format.
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Print the effective configuration (defaults + file + env overrides).
    Config {
        /// Path to config file (TOML or JSON).
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Start the REST API server.
    #[cfg(feature = "api")]
    Serve {
        /// Host to bind to (overrides config file).
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config file).
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to config file (TOML or JSON).
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("invalid format: {s}. Use 'text' or 'json'")),
        }
    }
}

fn validate_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file not found: '{}'", path.display());
    }
    if !path.is_file() {
        anyhow::bail!("path is not a file: '{}'", path.display());
    }
    Ok(())
}

fn file_type_from_path(path: &Path, explicit: Option<String>) -> Result<String> {
    if let Some(explicit) = explicit {
        return Ok(explicit);
    }
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .ok_or_else(|| anyhow::anyhow!("cannot infer file type from '{}', pass --file-type explicitly", path.display()))
}

/// Loads pipeline configuration from an explicit path, auto-discovery, or
/// defaults, then applies `CVINTEL_*` environment overrides.
fn load_config(config_path: Option<PathBuf>) -> Result<PipelineConfig> {
    let mut config = match config_path {
        Some(path) => PipelineConfig::from_file(&path)
            .with_context(|| format!("failed to load configuration from '{}'", path.display()))?,
        None => discover_config()?.unwrap_or_default(),
    };
    config.apply_env_overrides().context("failed to apply CVINTEL_* environment overrides")?;
    Ok(config)
}

/// Searches `cvintel.toml` then `cvintel.json` in the current directory and
/// each ancestor, the same shallow discovery the teacher library performs.
fn discover_config() -> Result<Option<PipelineConfig>> {
    let mut dir = std::env::current_dir().context("failed to get current directory")?;
    loop {
        for name in ["cvintel.toml", "cvintel.json"] {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Ok(Some(PipelineConfig::from_file(&candidate)?));
            }
        }
        if !dir.pop() {
            return Ok(None);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract { path, config, file_type, format } => {
            validate_file_exists(&path)?;
            let _config = load_config(config)?;
            let kind_str = file_type_from_path(&path, file_type)?;

            let bytes = std::fs::read(&path).with_context(|| format!("failed to read '{}'", path.display()))?;

            if let Ok(kind) = document_kind(&kind_str) {
                let registry = cvintel::ocr::registry::OcrBackendRegistry::new_empty();
                let (_, candidate) = cvintel::pipeline::extract_structured_document(bytes, kind, &registry)
                    .await
                    .with_context(|| format!("failed to extract '{}'", path.display()))?;
                print_candidate(&candidate, format)?;
            } else {
                let text = String::from_utf8(bytes).context("input is neither a recognised document type nor UTF-8 text")?;
                let candidate = cvintel::pipeline::structured_candidate_from_text(&text)
                    .with_context(|| format!("failed to extract '{}'", path.display()))?;
                print_candidate(&candidate, format)?;
            }
        }

        Commands::Config { config } => {
            let config = load_config(config)?;
            let json = serde_json::to_string_pretty(&config).context("failed to serialize configuration to JSON")?;
            println!("{json}");
        }

        #[cfg(feature = "api")]
        Commands::Serve { host, port, config } => {
            let mut config = load_config(config)?;
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }

            println!("starting cvintel API server on http://{}:{}...", config.host, config.port);
            cvintel::api::serve(config).await.context("failed to start API server")?;
        }
    }

    Ok(())
}

fn document_kind(file_type: &str) -> Result<cvintel::image::DocumentKind> {
    use cvintel::image::DocumentKind;
    match file_type {
        "pdf" => Ok(DocumentKind::Pdf),
        "png" => Ok(DocumentKind::Png),
        "jpeg" | "jpg" => Ok(DocumentKind::Jpeg),
        "tiff" | "tif" => Ok(DocumentKind::Tiff),
        "bmp" => Ok(DocumentKind::Bmp),
        "gif" => Ok(DocumentKind::Gif),
        "webp" => Ok(DocumentKind::Webp),
        other => anyhow::bail!("unsupported file type: {other}"),
    }
}

fn print_candidate(candidate: &cvintel::types::StructuredCandidate, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(candidate).context("failed to serialize structured candidate to JSON")?);
        }
        OutputFormat::Text => {
            println!("overall confidence: {:.1}", candidate.overall_confidence);
            if let (Some(first), Some(last)) = (&candidate.tier1.first_name, &candidate.tier1.last_name) {
                println!("name: {} {}", first.value, last.value);
            }
            if let Some(email) = &candidate.tier1.email {
                println!("email: {}", email.value);
            }
            println!("work history entries: {}", candidate.work_history.len());
            println!("education entries: {}", candidate.education.len());
            println!("skills: {}", candidate.skills.len());
        }
    }
    Ok(())
}
