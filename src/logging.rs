// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Log setup: the same lines go to stdout and to `<dir>/bot.log`.

use crate::config::{LogConfig, LogFormat};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_FILE_NAME: &str = "bot.log";

/// Install the global subscriber. Returns the log file path.
pub fn init(config: &LogConfig) -> std::io::Result<PathBuf> {
    fs::create_dir_all(&config.dir)?;
    let path = config.dir.join(LOG_FILE_NAME);
    let file = Arc::new(OpenOptions::new().create(true).append(true).open(&path)?);

    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    let registry = tracing_subscriber::registry().with(filter);
    match config.format {
        LogFormat::Text => registry
            .with(fmt::layer())
            .with(fmt::layer().with_ansi(false).with_writer(file))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json())
            .with(fmt::layer().json().with_writer(file))
            .init(),
    }

    Ok(path)
}
