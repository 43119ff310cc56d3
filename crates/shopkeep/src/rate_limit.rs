//! Fixed-window request counter keyed by client address.
//!
//! Counters live in process memory and are cleared together at every window
//! boundary by [`RateLimiter::spawn_reset_task`]. Counts are not shared across
//! processes and are lost on restart.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::{task::JoinHandle, time};

use crate::error::ApiError;

#[derive(Debug)]
pub struct RateLimiter {
    counters: Mutex<HashMap<String, u32>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            counters: Mutex::new(HashMap::new()),
            max_requests,
            window,
        }
    }

    /// Counts one request from `client`. Returns false once the client is
    /// over its allowance for the current window.
    pub fn check_and_increment(&self, client: &str) -> bool {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        let count = counters.entry(client.to_string()).or_insert(0);

        if *count >= self.max_requests {
            return false;
        }

        *count += 1;
        true
    }

    /// Clears every counter.
    pub fn reset(&self) {
        self.counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Spawns the task clearing all counters at each window boundary.
    pub fn spawn_reset_task(self: &Arc<Self>) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + limiter.window, limiter.window);
            loop {
                ticker.tick().await;
                limiter.reset();
                tracing::trace!("Rate limit window reset");
            }
        })
    }
}

/// Client address: the peer socket when known, else the first
/// `X-Forwarded-For` entry.
pub fn client_address(peer: Option<SocketAddr>, headers: &HeaderMap) -> String {
    if let Some(addr) = peer {
        return addr.ip().to_string();
    }

    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware rejecting clients over their allowance with 429.
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_address(peer, request.headers());

    if !limiter.check_and_increment(&client) {
        tracing::warn!(client = %client, "Rate limit exceeded");
        return ApiError::RateLimited.into_response();
    }

    next.run(request).await
}
