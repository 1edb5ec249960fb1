// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Middleware module for HTTP request processing
//!
//! This module provides IP based rate limiting, the server-wide request
//! timeout and per-route request metrics.

use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    Json,
    body::Body,
    extract::{ConnectInfo, MatchedPath, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use serde_json::json;
use tracing::{debug, warn};

use crate::{config::RateLimitingConfig, error::ServerError, metrics};

const RATE_LIMIT_WINDOW_SECONDS: u64 = 60;
const MAX_RATE_LIMIT_ENTRIES: usize = 10_000;

/// Rate limiting middleware state
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitingConfig,
    requests: Arc<DashMap<IpAddr, RequestCounter>>,
}

#[derive(Debug, Clone)]
struct RequestCounter {
    count: u32,
    window_start: Instant,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration
    pub fn new(config: RateLimitingConfig) -> Self {
        Self {
            config,
            requests: Arc::new(DashMap::new()),
        }
    }

    /// Check if rate limiting is enabled
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Check if a request from the given IP should be rate limited
    pub fn is_rate_limited(&self, ip: IpAddr) -> bool {
        if !self.config.enabled {
            return false;
        }

        let now = Instant::now();
        let window_duration = Duration::from_secs(RATE_LIMIT_WINDOW_SECONDS);

        if self.requests.len() > MAX_RATE_LIMIT_ENTRIES {
            self.cleanup_expired_entries(now, window_duration);
        }

        let current_count = self
            .requests
            .entry(ip)
            .and_modify(|counter| {
                if now.duration_since(counter.window_start) > window_duration {
                    counter.count = 1;
                    counter.window_start = now;
                } else {
                    counter.count += 1;
                }
            })
            .or_insert_with(|| RequestCounter {
                count: 1,
                window_start: now,
            })
            .count;

        if current_count > self.config.requests_per_minute {
            debug!(%ip, current_count, "rate limiting client");
            true
        } else {
            false
        }
    }

    fn cleanup_expired_entries(&self, now: Instant, window_duration: Duration) {
        let entries_before = self.requests.len();

        self.requests
            .retain(|_, counter| now.duration_since(counter.window_start) <= window_duration);

        let entries_after = self.requests.len();
        let cleaned_up = entries_before.saturating_sub(entries_after);
        if cleaned_up > 0 {
            debug!(cleaned_up, "cleaned up expired rate limiter entries");
        }

        if entries_after > MAX_RATE_LIMIT_ENTRIES {
            warn!(
                entries_after,
                "rate limiter still over capacity after cleanup, removing oldest"
            );

            let mut oldest_entries: Vec<_> = self
                .requests
                .iter()
                .map(|entry| (*entry.key(), entry.value().window_start))
                .collect();
            oldest_entries.sort_by_key(|(_, window_start)| *window_start);

            let entries_to_remove = entries_after - MAX_RATE_LIMIT_ENTRIES / 2;
            for (ip, _) in oldest_entries.into_iter().take(entries_to_remove) {
                self.requests.remove(&ip);
            }
        }
    }
}

/// Rate limiting middleware function
pub async fn rate_limiting_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(rate_limiter): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let client_ip = addr.ip();

    if rate_limiter.is_rate_limited(client_ip) {
        warn!(%client_ip, "rate limit exceeded");
        let status = StatusCode::TOO_MANY_REQUESTS;
        return (
            status,
            Json(json!({"error": "Too many requests", "status": status.as_u16()})),
        )
            .into_response();
    }

    next.run(req).await
}

/// Bound the time until response headers are produced
///
/// An elapsed request answers with the JSON error envelope. Streamed bodies
/// are not covered once their headers are sent.
pub async fn request_timeout(
    State(timeout): State<Duration>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    match tokio::time::timeout(timeout, next.run(req)).await {
        Ok(response) => response,
        Err(_) => {
            warn!(path, timeout = ?timeout, "request timed out");
            ServerError::RequestTimeout {
                timeout_seconds: timeout.as_secs(),
            }
            .into_response()
        }
    }
}

/// Count every request by matched route template and response status
pub async fn track_requests(req: Request<Body>, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |path| path.as_str().to_string());

    let response = next.run(req).await;
    metrics::inc_requests_by_route(&route, response.status());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limiter_creation() {
        let config = RateLimitingConfig {
            enabled: true,
            requests_per_minute: 10,
        };
        let limiter = RateLimiter::new(config);
        assert!(limiter.is_enabled());
        assert_eq!(limiter.config.requests_per_minute, 10);
    }

    #[test]
    fn rate_limiter_disabled() {
        let config = RateLimitingConfig {
            enabled: false,
            requests_per_minute: 1,
        };
        let limiter = RateLimiter::new(config);

        let ip = "127.0.0.1".parse().unwrap();
        for _ in 0..10 {
            assert!(!limiter.is_rate_limited(ip));
        }
    }

    #[test]
    fn rate_limiter_exceeds_limits() {
        let config = RateLimitingConfig {
            enabled: true,
            requests_per_minute: 3,
        };
        let limiter = RateLimiter::new(config);

        let ip = "127.0.0.1".parse().unwrap();

        for _ in 0..3 {
            assert!(!limiter.is_rate_limited(ip));
        }

        assert!(limiter.is_rate_limited(ip));
        assert!(limiter.is_rate_limited(ip));
    }

    #[test]
    fn rate_limiter_different_ips() {
        let config = RateLimitingConfig {
            enabled: true,
            requests_per_minute: 2,
        };
        let limiter = RateLimiter::new(config);

        let ip1 = "127.0.0.1".parse().unwrap();
        let ip2 = "192.168.1.1".parse().unwrap();

        // Each IP has its own window
        assert!(!limiter.is_rate_limited(ip1));
        assert!(!limiter.is_rate_limited(ip2));
        assert!(!limiter.is_rate_limited(ip1));
        assert!(!limiter.is_rate_limited(ip2));

        assert!(limiter.is_rate_limited(ip1));
        assert!(limiter.is_rate_limited(ip2));
    }
}
