// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Scripted collaborators.

use audio_fetch_bot::fetcher::FetchError;
use audio_fetch_bot::media::{AudioPayload, Fetcher, MediaResponse, Replier, ResolvedMedia, Resolver};
use audio_fetch_bot::resolver::ResolveError;
use audio_fetch_bot::telegram::TelegramError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// What the scripted resolver answers.
#[derive(Debug, Clone)]
pub enum ResolveScript {
    Media(ResolvedMedia),
    Fail(String),
}

/// Resolver returning the same scripted answer for every URL.
#[derive(Debug)]
pub struct ScriptedResolver {
    script: ResolveScript,
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

impl ScriptedResolver {
    pub fn new(script: ResolveScript) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
        }
    }

    /// Resolves to a stream URL with the given title.
    pub fn found(title: &str) -> Self {
        Self::new(ResolveScript::Media(ResolvedMedia {
            title: Some(title.to_string()),
            stream_url: Some("https://cdn.example.com/stream.mp3".to_string()),
        }))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

impl Resolver for ScriptedResolver {
    async fn resolve(&self, url: &str) -> Result<ResolvedMedia, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());
        match &self.script {
            ResolveScript::Media(media) => Ok(media.clone()),
            ResolveScript::Fail(message) => Err(ResolveError::Failed(message.clone())),
        }
    }
}

/// Fetcher serving one in-memory body.
#[derive(Debug)]
pub struct ScriptedFetcher {
    body: Vec<u8>,
    content_length: Option<u64>,
    fail_status: Option<reqwest::StatusCode>,
    calls: AtomicUsize,
    body_reads: Arc<AtomicUsize>,
}

impl ScriptedFetcher {
    /// Serve `body` with an accurate `content-length`.
    pub fn serving(body: Vec<u8>) -> Self {
        let len = body.len() as u64;
        Self::with_length(body, Some(len))
    }

    /// Serve `body` while declaring an arbitrary (or no) `content-length`.
    pub fn with_length(body: Vec<u8>, content_length: Option<u64>) -> Self {
        Self {
            body,
            content_length,
            fail_status: None,
            calls: AtomicUsize::new(0),
            body_reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(status: reqwest::StatusCode) -> Self {
        Self {
            fail_status: Some(status),
            ..Self::serving(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn body_reads(&self) -> usize {
        self.body_reads.load(Ordering::SeqCst)
    }
}

impl Fetcher for ScriptedFetcher {
    type Response = ScriptedResponse;

    async fn fetch(&self, _url: &str) -> Result<ScriptedResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.fail_status {
            return Err(FetchError::Status(status));
        }
        Ok(ScriptedResponse {
            body: self.body.clone(),
            content_length: self.content_length,
            reads: self.body_reads.clone(),
        })
    }
}

#[derive(Debug)]
pub struct ScriptedResponse {
    body: Vec<u8>,
    content_length: Option<u64>,
    reads: Arc<AtomicUsize>,
}

impl MediaResponse for ScriptedResponse {
    fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    async fn read_to_end(self, limit: u64) -> Result<Vec<u8>, FetchError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.body.len() as u64 > limit {
            return Err(FetchError::LimitExceeded { limit });
        }
        Ok(self.body)
    }
}

/// Reply channel that keeps everything sent through it.
#[derive(Debug, Default)]
pub struct RecordingReplier {
    texts: Mutex<Vec<String>>,
    audio: Mutex<Vec<AudioPayload>>,
    fail_audio: bool,
}

impl RecordingReplier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A replier whose audio uploads are rejected by the platform.
    pub fn rejecting_audio() -> Self {
        Self {
            fail_audio: true,
            ..Self::default()
        }
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }

    pub fn audio(&self) -> Vec<AudioPayload> {
        self.audio.lock().unwrap().clone()
    }

    /// Total replies of any kind.
    pub fn reply_count(&self) -> usize {
        self.texts.lock().unwrap().len() + self.audio.lock().unwrap().len()
    }
}

impl Replier for RecordingReplier {
    async fn send_text(&self, text: &str) -> Result<(), TelegramError> {
        self.texts.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn send_audio(&self, audio: AudioPayload) -> Result<(), TelegramError> {
        if self.fail_audio {
            return Err(TelegramError::Api {
                code: 413,
                description: "Request Entity Too Large".to_string(),
            });
        }
        self.audio.lock().unwrap().push(audio);
        Ok(())
    }
}
