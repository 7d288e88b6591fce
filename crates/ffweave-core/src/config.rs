//! Configuration types.
//!
//! The top-level [`Config`] is deserialized from TOML. Every section defaults
//! sensibly so a completely empty file is valid.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ffmpeg: FfmpegConfig,
    pub progress: ProgressConfig,
}

impl Config {
    /// Deserialize a `Config` from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| Error::Config(format!("config parse error: {e}")))
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.ffmpeg.program.trim().is_empty() {
            warnings.push("ffmpeg.program is empty; commands will render without a program name".into());
        }

        if let Some(ref url) = self.ffmpeg.progress_url {
            if url.trim().is_empty() {
                warnings.push("ffmpeg.progress_url is set but empty".into());
            }
        }

        if let Some(ref level) = self.ffmpeg.loglevel {
            let valid = [
                "quiet", "panic", "fatal", "error", "warning", "info", "verbose", "debug", "trace",
            ];
            if !valid.contains(&level.as_str()) {
                warnings.push(format!(
                    "ffmpeg.loglevel '{}' is not a recognized level (valid: {})",
                    level,
                    valid.join(", ")
                ));
            }
        }

        if self.progress.log_capacity == Some(0) {
            warnings.push("progress.log_capacity is 0; no log lines will be kept".into());
        }

        warnings
    }
}

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read config file {}: {e}", path.display())))?;

    let config = Config::from_toml(&content)?;

    for warning in config.validate() {
        tracing::warn!("{}: {}", path.display(), warning);
    }

    Ok(config)
}

/// Load config from an explicit path or the default locations, falling back
/// to defaults when no file exists.
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./ffweave.toml",
        "~/.config/ffweave/config.toml",
        "/etc/ffweave/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    tracing::debug!("No config file found; using defaults");
    Ok(Config::default())
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// How rendered commands start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FfmpegConfig {
    /// Program name placed in front of the rendered command string.
    pub program: String,
    /// Add `-y` to the global options.
    pub overwrite: bool,
    /// Add `-hide_banner` to the global options.
    pub hide_banner: bool,
    /// Add `-progress <url> -nostats` to the global options.
    pub progress_url: Option<String>,
    /// Add `-loglevel <level>` to the global options.
    pub loglevel: Option<String>,
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            program: "ffmpeg".into(),
            overwrite: false,
            hide_banner: false,
            progress_url: None,
            loglevel: None,
        }
    }
}

/// Progress parser settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Maximum number of log lines kept; oldest are dropped first.
    pub log_capacity: Option<usize>,
    /// Media time attributed to log lines before the first record completes.
    #[serde(default = "default_time")]
    pub default_time: String,
}

fn default_time() -> String {
    "0".into()
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            log_capacity: None,
            default_time: default_time(),
        }
    }
}
