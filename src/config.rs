//! Settings for the Gemini client and the download location.
//!
//! Values come from an optional `studio.toml`, then environment variables.

use crate::error::{Result, StudioError};
use crate::image::GeminiModel;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Settings file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "studio.toml";

/// Runtime settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Google API key. `GOOGLE_API_KEY` overrides it.
    pub api_key: Option<String>,
    /// Image model to call.
    pub model: GeminiModel,
    /// Replacement for the built-in studio instruction.
    pub prompt: Option<String>,
    /// Replacement for the Gemini endpoint.
    pub base_url: Option<String>,
    /// Directory downloads are written to.
    pub output_dir: PathBuf,
    /// Transport timeout in seconds. Unset means none.
    pub timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: GeminiModel::default(),
            prompt: None,
            base_url: None,
            output_dir: PathBuf::from("."),
            timeout_secs: None,
        }
    }
}

impl Settings {
    /// Loads settings from the file named by `STUDIO_CONFIG` (or `studio.toml`)
    /// and the process environment.
    pub fn load() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Same as [`Settings::load`] with a custom variable lookup.
    pub fn load_with(env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = match env("STUDIO_CONFIG") {
            // An explicitly named file must exist.
            Some(path) => Self::from_file(Path::new(&path))?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        settings.apply_env(env)?;
        Ok(settings)
    }

    /// Reads a TOML settings file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            StudioError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let settings = Self::from_toml_str(&raw)?;
        tracing::debug!(path = %path.display(), "loaded settings file");
        Ok(settings)
    }

    /// Parses settings from TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| StudioError::Config(e.to_string()))
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = env("GOOGLE_API_KEY").filter(|v| !v.trim().is_empty()) {
            self.api_key = Some(v);
        }
        if let Some(v) = env("STUDIO_MODEL") {
            self.model = v
                .parse()
                .map_err(|e: StudioError| StudioError::Config(e.to_string()))?;
        }
        if let Some(v) = env("STUDIO_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = env("STUDIO_BASE_URL") {
            self.base_url = Some(v);
        }
        Ok(())
    }
}
