// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Audio Fetch Bot Service
//!
//! Polls the Telegram Bot API for messages, resolves media links with
//! yt-dlp and answers with the audio file.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables or a `.env` file:
//!
//! - `BOT_TOKEN`: Bot API token (required)
//! - `RATE_LIMIT_SECONDS`: Minimum spacing of requests per user (default: 10)
//! - `MAX_FILE_SIZE_MB`: Largest audio file sent back (default: 50)
//! - `COOKIES_FILE`: Extractor credentials, used if present (default: cookies.txt)
//! - `HEALTH_ADDR`: Health endpoint bind address (default: 0.0.0.0:8080)
//! - `LOG_DIR`, `LOG_FORMAT`: Log file directory and `text`/`json` lines

use anyhow::Context;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use audio_fetch_bot::{
    bot::Bot,
    config::{Config, ConfigError},
    fetcher::HttpFetcher,
    health,
    limiter::RateLimiter,
    logging,
    pipeline::Pipeline,
    resolver::YtDlpResolver,
    telegram::TelegramClient,
};

const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let log_path = logging::init(&config.logging)
        .with_context(|| format!("cannot open log directory {}", config.logging.dir.display()))?;

    info!(
        log_file = %log_path.display(),
        health_addr = %config.health_addr,
        window_secs = config.rate_limit.window_secs,
        max_file_size_mb = config.media.max_file_size_mb,
        cookies = ?config.media.cookies_file,
        "Starting audio fetch bot"
    );

    let resolver = YtDlpResolver::new(&config.media);
    let version = resolver.check_available().await.map_err(|e| {
        ConfigError::MissingDependency(format!("{} ({e})", config.media.yt_dlp_path))
    })?;
    info!(version = %version, "Found yt-dlp");

    let fetcher = HttpFetcher::new(&config.media)?;
    let client = TelegramClient::new(&config.bot_token, &config.telegram)?;
    let me = client.get_me().await.context("Bot API rejected the token")?;
    info!(bot = ?me.username, id = me.id, "Authenticated with Bot API");

    let listener = TcpListener::bind(&config.health_addr)
        .await
        .with_context(|| format!("cannot bind health endpoint to {}", config.health_addr))?;
    tokio::spawn(async move {
        if let Err(e) = health::serve(listener).await {
            error!(error = %e, "Health endpoint stopped");
        }
    });

    let limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));
    let cleanup_limiter = limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            cleanup_limiter.cleanup(Instant::now()).await;
        }
    });

    let pipeline = Pipeline::new(limiter, resolver, fetcher, config.media.max_file_size_mb);
    let bot = Bot::new(client, pipeline, me.username);

    info!("Bot started successfully");
    tokio::select! {
        result = bot.run() => {
            result.context("Bot API polling stopped")?;
        }
        _ = shutdown_signal() => {
            info!("Bot shutting down gracefully");
        }
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
