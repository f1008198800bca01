// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Per-user request spacing.
//!
//! Each user may have one accepted request per window. The limiter only
//! remembers when a user's last accepted request arrived; callers pass the
//! current instant in, so tests can drive it with simulated time.
//!
//! `check` and `record` are separate calls and the pipeline awaits network
//! I/O between them. Two requests from the same user handled concurrently
//! can therefore both pass `check`. The dispatch loop handles updates one at
//! a time, which keeps this from happening in practice.

use crate::config::RateLimitConfig;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Platform-assigned sender identity.
pub type UserId = i64;

/// Result of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed,
    /// Request arrived inside the user's window
    Limited {
        /// Time until the window ends
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Thread-safe map of last accepted request per user.
pub struct RateLimiter {
    window: Duration,
    last_request: RwLock<HashMap<UserId, Instant>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            window: config.window_duration(),
            last_request: RwLock::new(HashMap::new()),
        }
    }

    /// Check whether `user` may make a request arriving at `now`.
    ///
    /// Users without an entry are always allowed. Does not modify state.
    pub async fn check(&self, user: UserId, now: Instant) -> RateLimitResult {
        let entries = self.last_request.read().await;
        let Some(last) = entries.get(&user) else {
            return RateLimitResult::Allowed;
        };

        let elapsed = now.saturating_duration_since(*last);
        if elapsed >= self.window {
            RateLimitResult::Allowed
        } else {
            let retry_after = self.window - elapsed;
            debug!(user, ?retry_after, "User inside rate limit window");
            RateLimitResult::Limited { retry_after }
        }
    }

    /// Shorthand for `check(..).is_allowed()`.
    pub async fn allow(&self, user: UserId, now: Instant) -> bool {
        self.check(user, now).await.is_allowed()
    }

    /// Record an accepted request, overwriting any previous entry.
    pub async fn record(&self, user: UserId, now: Instant) {
        self.last_request.write().await.insert(user, now);
    }

    /// Drop entries whose window has fully elapsed at `now`.
    ///
    /// An expired entry answers exactly like a missing one, so this only
    /// bounds memory.
    pub async fn cleanup(&self, now: Instant) -> usize {
        let mut entries = self.last_request.write().await;
        let before = entries.len();
        let window = self.window;
        entries.retain(|_, last| now.saturating_duration_since(*last) < window);
        before - entries.len()
    }

    /// Number of users currently tracked.
    pub async fn len(&self) -> usize {
        self.last_request.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.last_request.read().await.is_empty()
    }
}
