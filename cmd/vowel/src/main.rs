//! vowel - HTTP service that classifies recorded vowels.

mod config;
mod server;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use vocal_audio::trim::TrimConfig;
use vocal_vowel::ClassificationService;

use crate::config::{ConfigFile, Settings};

/// Vowel detection service.
#[derive(Parser, Debug)]
#[command(name = "vowel")]
#[command(about = "HTTP service that classifies recorded vowels")]
struct Args {
    /// Listen address (e.g. :5000, 127.0.0.1:8080)
    #[arg(long)]
    addr: Option<String>,

    /// Scaler parameters (JSON)
    #[arg(long)]
    scaler: Option<PathBuf>,

    /// Classifier parameters (JSON)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Directory holding index.html and assets
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Silence threshold in dB below the loudest frame
    #[arg(long)]
    top_db: Option<f64>,

    /// YAML config file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Args {
    fn overrides(&self) -> ConfigFile {
        ConfigFile {
            addr: self.addr.clone(),
            scaler: self.scaler.clone(),
            model: self.model.clone(),
            static_dir: self.static_dir.clone(),
            top_db: self.top_db,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let file = match &args.config {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };
    let settings = Settings::from(file.merge(args.overrides()));
    tracing::debug!(?settings, "resolved settings");

    let service = match ClassificationService::load_files(&settings.scaler, &settings.model) {
        Ok(service) => service,
        Err(e) => {
            tracing::warn!(
                scaler = %settings.scaler.display(),
                model = %settings.model.display(),
                "model not loaded: {e}"
            );
            ClassificationService::untrained()
        }
    };
    tracing::info!(state = %service.state(), labels = ?service.labels(), "classifier");

    let state = server::AppState {
        service: Arc::new(service),
        trim: TrimConfig {
            top_db: settings.top_db,
            ..TrimConfig::default()
        },
    };
    server::serve(&settings.addr, state, settings.static_dir).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse() {
        let args =
            Args::try_parse_from(["vowel", "--addr", ":8080", "--top-db", "45", "-v"]).unwrap();
        assert_eq!(args.addr.as_deref(), Some(":8080"));
        assert_eq!(args.top_db, Some(45.0));
        assert!(args.verbose);
        assert_eq!(args.model, None);
    }

    #[test]
    fn test_overrides_only_set_flags() {
        let args = Args::try_parse_from(["vowel", "--model", "m.json"]).unwrap();
        let o = args.overrides();
        assert_eq!(o.model, Some(PathBuf::from("m.json")));
        assert_eq!(o.addr, None);
        assert_eq!(o.top_db, None);
    }
}
