// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test data generators.

use std::time::Duration;

/// Valid source URLs.
pub fn generate_urls(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("https://kukufm.example.com/show/{}/episode/{}", i / 10, i % 10))
        .collect()
}

/// Texts that must fail URL validation.
pub fn invalid_texts() -> Vec<&'static str> {
    vec![
        "",
        "   ",
        "hello there",
        "kukufm.com/show/1",
        "ftp://example.com/file.mp3",
        "javascript:alert(1)",
        "file:///etc/passwd",
        "https://",
    ]
}

/// Titles mixing forbidden filename characters, unicode and long runs.
pub fn titles() -> Vec<String> {
    vec![
        "Plain title".to_string(),
        r#"What? Why: "Because" <now> / \ | *"#.to_string(),
        "Épisode 3 – Ünïcödé ✨".to_string(),
        "/".repeat(250),
        "a".repeat(99),
        "b".repeat(100),
        "c".repeat(101),
    ]
}

/// Deterministic, irregular arrival offsets (seconds) for simulated traffic.
pub fn arrival_offsets(count: usize) -> Vec<Duration> {
    let mut t = 0.0f64;
    (0..count)
        .map(|i| {
            // golden-ratio stepping gives gaps between 0 and ~6.5s
            t += ((i as f64 * 0.618033988749895) % 1.0) * 6.5;
            Duration::from_secs_f64(t)
        })
        .collect()
}
