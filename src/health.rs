// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Liveness endpoint for orchestration probes.

use axum::{http::StatusCode, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

pub const HEALTH_BODY: &str = "Bot is running";

/// Answers every request.
pub async fn health() -> (StatusCode, &'static str) {
    (StatusCode::OK, HEALTH_BODY)
}

/// Router answering any method on any path.
pub fn router() -> Router {
    Router::new()
        .fallback(health)
        .layer(TraceLayer::new_for_http())
}

/// Serve the health router until the process exits.
pub async fn serve(listener: TcpListener) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(addr = %addr, "Health endpoint listening");
    }
    axum::serve(listener, router()).await
}
