//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration is read from a TOML file once at startup. Every
//! table and every key is optional; anything missing falls back to the
//! built-in defaults below.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (`--root-folder`, `--config`)
//! 2. Environment variables (`MASHUP_ROOT_FOLDER`, `MASHUP_CONFIG`)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the working root folder
pub const ROOT_FOLDER_ENV: &str = "MASHUP_ROOT_FOLDER";

/// Environment variable naming the TOML config file
pub const CONFIG_PATH_ENV: &str = "MASHUP_CONFIG";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Working root folder holding the four stage directories
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Selection and pacing knobs
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// External tool locations
    #[serde(default)]
    pub tools: ToolPaths,

    /// Downloader options
    #[serde(default)]
    pub download: DownloadSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Web front-end configuration
    #[serde(default)]
    pub web: WebSettings,
}

/// Candidate selection thresholds and stage pacing
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Tier-1 duration bound (seconds)
    pub preferred_max_duration_secs: f64,
    /// Tier-2 duration bound (seconds)
    pub relaxed_max_duration_secs: f64,
    /// Search results requested per wanted clip
    pub search_multiplier: usize,
    /// Minimum number of search results requested
    pub search_floor: usize,
    /// Pause between successful conversions (milliseconds)
    pub conversion_pause_ms: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            preferred_max_duration_secs: 600.0,
            relaxed_max_duration_secs: 1800.0,
            search_multiplier: 3,
            search_floor: 30,
            conversion_pause_ms: 200,
        }
    }
}

impl PipelineSettings {
    /// Number of search results to request for `clip_count` wanted clips
    pub fn search_count(&self, clip_count: usize) -> usize {
        clip_count
            .saturating_mul(self.search_multiplier)
            .max(self.search_floor)
    }
}

/// Paths of the external tools the backends shell out to
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    /// Derived from `ffmpeg` when not set
    pub ffprobe: Option<PathBuf>,
    pub yt_dlp: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: None,
            yt_dlp: PathBuf::from("yt-dlp"),
        }
    }
}

impl ToolPaths {
    /// Resolve the ffprobe binary
    ///
    /// An explicit setting wins. Otherwise, when `ffmpeg` points into a
    /// directory, ffprobe is expected next to it (keeping the same
    /// extension, e.g. `ffprobe.exe`); a bare `ffmpeg` maps to a bare
    /// `ffprobe` looked up on PATH.
    pub fn ffprobe(&self) -> PathBuf {
        if let Some(explicit) = &self.ffprobe {
            return explicit.clone();
        }

        let file_name = match self.ffmpeg.extension() {
            Some(ext) => format!("ffprobe.{}", ext.to_string_lossy()),
            None => "ffprobe".to_string(),
        };

        match self.ffmpeg.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.join(file_name),
            _ => PathBuf::from(file_name),
        }
    }
}

/// Downloader options passed through to the download backend
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    /// Format selector
    pub format: String,
    /// Per-request retry count
    pub retries: u32,
    /// Network socket timeout in seconds
    pub socket_timeout_secs: u64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            format: "best[ext=mp4]/best".to_string(),
            retries: 3,
            socket_timeout_secs: 10,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Web front-end configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebSettings {
    /// Socket address to listen on
    pub bind: String,
    /// Outbox directory for delivered mashups (relative to the root folder)
    pub outbox: PathBuf,
}

impl Default for WebSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
            outbox: PathBuf::from("outbox"),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load configuration from an explicit file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Load configuration following the priority order
    ///
    /// A missing file is not fatal: a warning is logged and defaults are
    /// used. A file that exists but does not parse is a `Config` error.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let path = match cli_path {
            Some(path) => Some(path.to_path_buf()),
            None => std::env::var(CONFIG_PATH_ENV)
                .ok()
                .map(PathBuf::from)
                .or_else(default_config_path),
        };

        match path {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                Self::from_file(&path)
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using built-in defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }
}

/// Get default configuration file path for the platform
fn default_config_path() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("mashup").join("config.toml");
    path.exists().then_some(path)
}

/// Root folder resolution:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. Current directory (fallback)
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    // Priority 4: current working directory
    PathBuf::from(".")
}
