//! Server configuration.
//!
//! Settings come from three layers, later ones winning: built-in defaults,
//! an optional YAML file, and command-line flags.
//!
//! ```yaml
//! addr: ":5000"
//! scaler: models/vocal_scaler.json
//! model: models/vocal_model.json
//! static_dir: web
//! top_db: 60
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_ADDR: &str = ":5000";
pub const DEFAULT_SCALER: &str = "vocal_scaler.json";
pub const DEFAULT_MODEL: &str = "vocal_model.json";
pub const DEFAULT_TOP_DB: f64 = 60.0;

/// One configuration layer. Unset fields defer to the layer below.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub addr: Option<String>,
    pub scaler: Option<PathBuf>,
    pub model: Option<PathBuf>,
    pub static_dir: Option<PathBuf>,
    pub top_db: Option<f64>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&data).with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn parse(data: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(data)?)
    }

    /// Returns `self` with every field set in `over` replaced.
    pub fn merge(self, over: ConfigFile) -> Self {
        Self {
            addr: over.addr.or(self.addr),
            scaler: over.scaler.or(self.scaler),
            model: over.model.or(self.model),
            static_dir: over.static_dir.or(self.static_dir),
            top_db: over.top_db.or(self.top_db),
        }
    }
}

/// Fully resolved server settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub addr: String,
    pub scaler: PathBuf,
    pub model: PathBuf,
    pub static_dir: Option<PathBuf>,
    pub top_db: f64,
}

impl From<ConfigFile> for Settings {
    fn from(c: ConfigFile) -> Self {
        Self {
            addr: c.addr.unwrap_or_else(|| DEFAULT_ADDR.to_string()),
            scaler: c.scaler.unwrap_or_else(|| PathBuf::from(DEFAULT_SCALER)),
            model: c.model.unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL)),
            static_dir: c.static_dir,
            top_db: c.top_db.unwrap_or(DEFAULT_TOP_DB),
        }
    }
}
