// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Media types shared by the pipeline and its collaborators.
//!
//! The resolver, fetcher and reply channel are external systems; the
//! pipeline only sees them through the traits below so tests can script
//! them.

use crate::fetcher::FetchError;
use crate::resolver::ResolveError;
use crate::telegram::TelegramError;

/// Longest filename stem produced by [`sanitize_filename`], in characters.
pub const MAX_FILENAME_CHARS: usize = 100;

/// Extension given to every audio reply.
pub const AUDIO_EXTENSION: &str = "mp3";

/// Title used when the resolver reports none.
pub const DEFAULT_TITLE: &str = "audio";

const FORBIDDEN_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Metadata returned by the resolver for one source URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedMedia {
    pub title: Option<String>,
    /// Direct audio stream URL, if the extractor found one
    pub stream_url: Option<String>,
}

/// Downloaded audio ready to be sent back.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioPayload {
    pub title: String,
    pub filename: String,
    pub data: Vec<u8>,
}

impl std::fmt::Debug for AudioPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioPayload")
            .field("title", &self.title)
            .field("filename", &self.filename)
            .field("len", &self.data.len())
            .finish()
    }
}

impl AudioPayload {
    /// Build a payload, deriving the filename from the title.
    pub fn new(title: &str, data: Vec<u8>) -> Self {
        Self {
            title: title.to_string(),
            filename: audio_filename(title),
            data,
        }
    }
}

/// Replace characters that are unsafe in filenames with `_` and cap the
/// result at [`MAX_FILENAME_CHARS`] characters.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if FORBIDDEN_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .take(MAX_FILENAME_CHARS)
        .collect()
}

/// Filename for an audio reply with the given title.
pub fn audio_filename(title: &str) -> String {
    format!("{}.{}", sanitize_filename(title), AUDIO_EXTENSION)
}

/// Turns a page URL into a direct stream URL.
#[trait_variant::make(Resolver: Send)]
pub trait LocalResolver {
    async fn resolve(&self, url: &str) -> Result<ResolvedMedia, ResolveError>;
}

/// An HTTP response whose headers have arrived but whose body is unread.
#[trait_variant::make(MediaResponse: Send)]
pub trait LocalMediaResponse {
    /// Declared body size, if the server sent one.
    fn content_length(&self) -> Option<u64>;

    /// Read the whole body, failing once more than `limit` bytes arrive.
    async fn read_to_end(self, limit: u64) -> Result<Vec<u8>, FetchError>;
}

/// Opens a download of a direct stream URL.
#[trait_variant::make(Fetcher: Send)]
pub trait LocalFetcher {
    type Response: MediaResponse;

    async fn fetch(&self, url: &str) -> Result<Self::Response, FetchError>;
}

/// Reply channel back to the user who sent a request.
#[trait_variant::make(Replier: Send)]
pub trait LocalReplier {
    async fn send_text(&self, text: &str) -> Result<(), TelegramError>;

    async fn send_audio(&self, audio: AudioPayload) -> Result<(), TelegramError>;
}
