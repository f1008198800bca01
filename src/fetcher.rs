// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP download of resolved stream URLs.

use crate::config::MediaConfig;
use crate::media::{Fetcher, MediaResponse};
use reqwest::header::CONTENT_LENGTH;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;

/// Download failures.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("media host returned {0}")]
    Status(StatusCode),

    #[error("body exceeds {limit} bytes")]
    LimitExceeded { limit: u64 },
}

/// Streaming GET client with a fixed total timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &MediaConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout())
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    type Response = HttpMedia;

    async fn fetch(&self, url: &str) -> Result<HttpMedia, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        debug!(%status, content_length = ?response.headers().get(CONTENT_LENGTH), "Media response headers received");
        Ok(HttpMedia { response })
    }
}

/// A media response with an unread body.
#[derive(Debug)]
pub struct HttpMedia {
    response: reqwest::Response,
}

impl MediaResponse for HttpMedia {
    fn content_length(&self) -> Option<u64> {
        self.response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
    }

    async fn read_to_end(mut self, limit: u64) -> Result<Vec<u8>, FetchError> {
        let mut body = Vec::with_capacity(self.content_length().unwrap_or(0).min(limit) as usize);
        while let Some(chunk) = self.response.chunk().await? {
            if (body.len() + chunk.len()) as u64 > limit {
                return Err(FetchError::LimitExceeded { limit });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}
