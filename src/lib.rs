// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Audio Fetch Bot
//!
//! A Telegram bot that takes a media page link, resolves it to a direct
//! audio stream with yt-dlp, downloads it and sends the audio back:
//!
//! - Per-user request spacing (10 s default)
//! - Size cap on downloads (50 MB default)
//! - Liveness endpoint for orchestration probes

pub mod bot;
pub mod config;
pub mod fetcher;
pub mod health;
pub mod limiter;
pub mod logging;
pub mod media;
pub mod pipeline;
pub mod resolver;
pub mod telegram;

pub use bot::Bot;
pub use config::Config;
pub use limiter::{RateLimitResult, RateLimiter};
pub use pipeline::{Pipeline, PipelineError, Request};
