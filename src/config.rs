// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the audio fetch bot.
//!
//! Everything is read from environment variables at startup. A `.env` file
//! in the working directory is loaded first when present.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Value shipped in example deployments; treated the same as an unset token.
pub const PLACEHOLDER_TOKEN: &str = "YOUR_TELEGRAM_BOT_TOKEN";

/// Bytes in one of the megabytes `MAX_FILE_SIZE_MB` is counted in.
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Startup configuration errors. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BOT_TOKEN is not set; export your real bot token before starting")]
    MissingToken,

    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("Required dependency unavailable: {0}")]
    MissingDependency(String),
}

/// Configuration for the bot process.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Bot API token
    pub bot_token: String,

    /// Health responder bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_health_addr")]
    pub health_addr: String,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Media resolution and download configuration
    #[serde(default)]
    pub media: MediaConfig,

    /// Bot API configuration
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Log output configuration
    #[serde(default)]
    pub logging: LogConfig,
}

/// Per-user rate limiting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Minimum seconds between two accepted requests of one user (default: 10)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

/// Media resolution and download limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Largest audio file sent back, in megabytes (default: 50)
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,

    /// Credentials file handed to the extractor, if it exists on disk
    #[serde(default)]
    pub cookies_file: Option<PathBuf>,

    /// Extractor executable (default: yt-dlp)
    #[serde(default = "default_yt_dlp_path")]
    pub yt_dlp_path: String,

    /// Total timeout of the media download in seconds (default: 60)
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Timeout of the extractor call in seconds (default: fetch timeout)
    #[serde(default = "default_fetch_timeout_secs")]
    pub resolve_timeout_secs: u64,
}

/// Bot API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API base URL (default: https://api.telegram.org)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Long-poll timeout for getUpdates in seconds (default: 30)
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(()),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Directory holding bot.log (default: logs)
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_health_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_window_secs() -> u64 {
    10
}

fn default_max_file_size_mb() -> u64 {
    50 // Bot API upload cap
}

fn default_yt_dlp_path() -> String {
    "yt-dlp".to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    60
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            cookies_file: None,
            yt_dlp_path: default_yt_dlp_path(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            resolve_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            poll_timeout_secs: default_poll_timeout_secs(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            format: LogFormat::default(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bot_token", &"<redacted>")
            .field("health_addr", &self.health_addr)
            .field("rate_limit", &self.rate_limit)
            .field("media", &self.media)
            .field("telegram", &self.telegram)
            .field("logging", &self.logging)
            .finish()
    }
}

impl Config {
    /// Load configuration from `.env` (if any) and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = lookup("BOT_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty() && t != PLACEHOLDER_TOKEN)
            .ok_or(ConfigError::MissingToken)?;

        let max_file_size_mb = parse_var(&lookup, "MAX_FILE_SIZE_MB", default_max_file_size_mb())?;
        // The byte limit must be representable
        if max_file_size_mb == 0 || max_file_size_mb.checked_mul(BYTES_PER_MB).is_none() {
            return Err(ConfigError::Invalid {
                var: "MAX_FILE_SIZE_MB",
                value: max_file_size_mb.to_string(),
            });
        }

        let fetch_timeout_secs = parse_var(&lookup, "FETCH_TIMEOUT_SECS", default_fetch_timeout_secs())?;
        let resolve_timeout_secs = parse_var(&lookup, "RESOLVE_TIMEOUT_SECS", fetch_timeout_secs)?;

        let cookies_file = lookup("COOKIES_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("cookies.txt"));
        let cookies_file = cookies_file.is_file().then_some(cookies_file);

        let format = match lookup("LOG_FORMAT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                var: "LOG_FORMAT",
                value: raw.clone(),
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            bot_token,
            health_addr: lookup("HEALTH_ADDR").unwrap_or_else(default_health_addr),
            rate_limit: RateLimitConfig {
                window_secs: parse_var(&lookup, "RATE_LIMIT_SECONDS", default_window_secs())?,
            },
            media: MediaConfig {
                max_file_size_mb,
                cookies_file,
                yt_dlp_path: lookup("YT_DLP_PATH").unwrap_or_else(default_yt_dlp_path),
                fetch_timeout_secs,
                resolve_timeout_secs,
            },
            telegram: TelegramConfig {
                api_url: lookup("TELEGRAM_API_URL").unwrap_or_else(default_api_url),
                poll_timeout_secs: parse_var(&lookup, "POLL_TIMEOUT_SECS", default_poll_timeout_secs())?,
            },
            logging: LogConfig {
                dir: lookup("LOG_DIR").map(PathBuf::from).unwrap_or_else(default_log_dir),
                format,
            },
        })
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { var, value: raw }),
        None => Ok(default),
    }
}

impl RateLimitConfig {
    /// Get the rate window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl MediaConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_secs)
    }
}

impl TelegramConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}
