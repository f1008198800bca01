// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Request pipeline: one inbound text message in, one reply out.
//!
//! Gates run in order and the first failing one decides the reply:
//!
//! 1. per-user rate limit
//! 2. URL validation
//! 3. resolution to a direct stream URL
//! 4. size check against the declared `content-length`
//! 5. download into memory
//!
//! After a successful audio reply the user's rate limit entry is recorded.
//! Nothing that goes wrong here propagates past [`Pipeline::handle`].

use crate::config::BYTES_PER_MB;
use crate::fetcher::FetchError;
use crate::limiter::{RateLimitResult, RateLimiter, UserId};
use crate::media::{AudioPayload, Fetcher, MediaResponse, Replier, Resolver, DEFAULT_TITLE};
use crate::resolver::ResolveError;
use crate::telegram::TelegramError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info};
use url::Url;

/// One inbound message.
#[derive(Debug, Clone)]
pub struct Request {
    pub user_id: UserId,
    pub text: String,
    pub received_at: Instant,
}

impl Request {
    pub fn new(user_id: UserId, text: impl Into<String>, received_at: Instant) -> Self {
        Self {
            user_id,
            text: text.into(),
            received_at,
        }
    }
}

/// Why a request did not produce audio.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("rate limited for another {}s", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    #[error("not an http(s) URL")]
    InvalidUrl,

    #[error("resolver returned no stream URL")]
    NoStream,

    #[error("resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    #[error("file exceeds {max_mb}MB")]
    TooLarge { max_mb: u64 },

    #[error("download failed: {0}")]
    Fetch(#[source] FetchError),

    #[error("reply failed: {0}")]
    Reply(#[from] TelegramError),
}

impl PipelineError {
    /// Text sent back to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::RateLimited { .. } => "⏳ Please wait before making another request.".to_string(),
            Self::InvalidUrl => "❌ Please send a valid URL.".to_string(),
            Self::NoStream => "❌ Could not fetch audio.".to_string(),
            Self::Resolve(e) => format!("❌ Could not fetch audio: {e}"),
            Self::TooLarge { max_mb } => format!("❌ File too large (> {max_mb}MB)."),
            Self::Fetch(e) => format!("❌ Error: {e}"),
            Self::Reply(e) => format!("❌ Error: {e}"),
        }
    }

    /// Rejections caused by the request itself rather than by a collaborator.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::InvalidUrl | Self::TooLarge { .. }
        )
    }
}

/// Check that `text` is an absolute http(s) URL with a host.
pub fn validate_url(text: &str) -> Result<Url, PipelineError> {
    let text = text.trim();
    let has_scheme = ["http://", "https://"].iter().any(|scheme| {
        text.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    });
    if !has_scheme {
        return Err(PipelineError::InvalidUrl);
    }

    match Url::parse(text) {
        Ok(url) if url.host_str().is_some() => Ok(url),
        _ => Err(PipelineError::InvalidUrl),
    }
}

/// Orchestrates limiter, resolver and fetcher for each request.
pub struct Pipeline<R, F> {
    limiter: Arc<RateLimiter>,
    resolver: R,
    fetcher: F,
    max_file_size_mb: u64,
}

impl<R: Resolver, F: Fetcher> Pipeline<R, F> {
    pub fn new(limiter: Arc<RateLimiter>, resolver: R, fetcher: F, max_file_size_mb: u64) -> Self {
        Self {
            limiter,
            resolver,
            fetcher,
            max_file_size_mb,
        }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Byte limit; saturates for sizes `Config` would have refused.
    fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(BYTES_PER_MB)
    }

    /// Run every gate up to and including the download.
    pub async fn process(&self, request: &Request) -> Result<AudioPayload, PipelineError> {
        if let RateLimitResult::Limited { retry_after } =
            self.limiter.check(request.user_id, request.received_at).await
        {
            return Err(PipelineError::RateLimited { retry_after });
        }

        let url = validate_url(&request.text)?;

        let media = self.resolver.resolve(url.as_str()).await?;
        let stream_url = media.stream_url.ok_or(PipelineError::NoStream)?;
        let title = media
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_TITLE);

        let limit = self.max_file_size_bytes();
        let response = self
            .fetcher
            .fetch(&stream_url)
            .await
            .map_err(PipelineError::Fetch)?;
        if response.content_length().is_some_and(|len| len > limit) {
            return Err(PipelineError::TooLarge {
                max_mb: self.max_file_size_mb,
            });
        }

        let data = response.read_to_end(limit).await.map_err(|e| match e {
            FetchError::LimitExceeded { .. } => PipelineError::TooLarge {
                max_mb: self.max_file_size_mb,
            },
            other => PipelineError::Fetch(other),
        })?;

        Ok(AudioPayload::new(title, data))
    }

    /// Process `request` and send exactly one reply through `replier`.
    ///
    /// Returns the filename of the delivered audio.
    pub async fn handle<P: Replier>(
        &self,
        request: &Request,
        replier: &P,
    ) -> Result<String, PipelineError> {
        let user = request.user_id;

        let err = match self.process(request).await {
            Ok(audio) => {
                let title = audio.title.clone();
                let filename = audio.filename.clone();
                let bytes = audio.data.len();
                match replier.send_audio(audio).await {
                    Ok(()) => {
                        self.limiter.record(user, request.received_at).await;
                        info!(user, %title, bytes, "Sent audio");
                        return Ok(filename);
                    }
                    Err(e) => PipelineError::Reply(e),
                }
            }
            Err(err) => err,
        };

        let delivery = replier.send_text(&err.user_message()).await;
        let reply_error = delivery.err().map(|e| e.to_string());
        if err.is_rejection() {
            info!(user, error = %err, ?reply_error, "Request rejected");
        } else {
            error!(user, error = %err, ?reply_error, "Request failed");
        }
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://kukufm.com/episode/1").is_ok());
        assert!(validate_url("  http://example.com  ").is_ok());
        assert!(validate_url("HTTPS://Example.com/x").is_ok());

        for bad in ["", "hello", "ftp://example.com", "httpx://a", "https://", "www.example.com"] {
            assert!(
                matches!(validate_url(bad), Err(PipelineError::InvalidUrl)),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            PipelineError::RateLimited { retry_after: Duration::from_secs(3) }.user_message(),
            "⏳ Please wait before making another request."
        );
        assert_eq!(
            PipelineError::TooLarge { max_mb: 50 }.user_message(),
            "❌ File too large (> 50MB)."
        );
        assert_eq!(
            PipelineError::Resolve(ResolveError::Failed("ERROR: Unsupported URL".into())).user_message(),
            "❌ Could not fetch audio: ERROR: Unsupported URL"
        );
        assert!(PipelineError::InvalidUrl.is_rejection());
        assert!(!PipelineError::NoStream.is_rejection());
    }
}
