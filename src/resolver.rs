// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Source URL resolution through the `yt-dlp` executable.
//!
//! yt-dlp is asked for the metadata of the best audio-only format without
//! downloading anything. The direct stream URL and title are taken from the
//! JSON it prints.

use crate::config::MediaConfig;
use crate::media::{ResolvedMedia, Resolver};
use serde::Deserialize;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

const FORMAT_SELECTOR: &str = "bestaudio[ext=mp3]/bestaudio/best";

/// Resolution failures.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("extractor timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("{0}")]
    Failed(String),

    #[error("unreadable extractor output: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Fields of yt-dlp's info JSON that the bot uses.
#[derive(Debug, Deserialize)]
struct ExtractInfo {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Resolver backed by a local yt-dlp install.
#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    program: String,
    cookies_file: Option<PathBuf>,
    timeout: Duration,
}

impl YtDlpResolver {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            program: config.yt_dlp_path.clone(),
            cookies_file: config.cookies_file.clone(),
            timeout: config.resolve_timeout(),
        }
    }

    /// Command line arguments for resolving `url`.
    pub fn args(&self, url: &str) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "--dump-single-json",
            "--no-playlist",
            "--no-warnings",
            "--no-check-certificates",
            "--format",
            FORMAT_SELECTOR,
        ]
        .iter()
        .map(OsString::from)
        .collect();

        if let Some(cookies) = &self.cookies_file {
            args.push("--cookies".into());
            args.push(cookies.into());
        }

        args.push("--".into());
        args.push(url.into());
        args
    }

    /// Run `--version` to make sure the executable is installed.
    pub async fn check_available(&self) -> Result<String, ResolveError> {
        let output = Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ResolveError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ResolveError::Failed(failure_message(&output)));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Resolver for YtDlpResolver {
    async fn resolve(&self, url: &str) -> Result<ResolvedMedia, ResolveError> {
        debug!(url, program = %self.program, "Resolving media URL");

        let mut command = Command::new(&self.program);
        command
            .args(self.args(url))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| ResolveError::Timeout(self.timeout))?
            .map_err(|source| ResolveError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ResolveError::Failed(failure_message(&output)));
        }

        parse_info(&output.stdout)
    }
}

/// Parse yt-dlp's info JSON.
pub fn parse_info(json: &[u8]) -> Result<ResolvedMedia, ResolveError> {
    let info: ExtractInfo = serde_json::from_slice(json)?;
    Ok(ResolvedMedia {
        title: info.title.filter(|t| !t.trim().is_empty()),
        stream_url: info.url.filter(|u| !u.trim().is_empty()),
    })
}

/// Last non-empty stderr line, which is where yt-dlp puts its ERROR line.
fn failure_message(output: &std::process::Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("extractor exited with {}", output.status))
}
