//! Per-IP sliding window rate limiting.
//!
//! Every client IP gets a token budget per tier. Budgets refill gradually as
//! time passes and fully once a window has elapsed.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::error::ApiError;
use crate::config::RateLimitConfig;
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitTier {
    /// Reads and admin calls
    Api,
    /// Order and contact submissions
    Forms,
    /// The chat proxy
    Chat,
}

#[derive(Debug, Clone)]
struct RateLimitEntry {
    tokens: u32,
    window_start: Instant,
    last_request: Instant,
}

impl RateLimitEntry {
    fn new(max_tokens: u32) -> Self {
        let now = Instant::now();
        Self {
            tokens: max_tokens,
            window_start: now,
            last_request: now,
        }
    }
}

#[derive(Debug)]
pub struct RateLimiter {
    entries: DashMap<(IpAddr, RateLimitTier), RateLimitEntry>,
    config: RateLimitConfig,
    window_duration: Duration,
}

#[derive(Debug, Clone)]
pub struct RateLimitInfo {
    pub remaining: u32,
    pub limit: u32,
    /// Seconds until the window resets
    pub reset_after: u64,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            entries: DashMap::new(),
            window_duration: Duration::from_secs(config.window_seconds.max(1)),
            config,
        }
    }

    /// Take one token for `ip` in `tier`. Returns the seconds to wait when none is left.
    pub fn check_rate_limit(&self, ip: IpAddr, tier: RateLimitTier) -> Result<RateLimitInfo, u64> {
        if !self.config.enabled {
            return Ok(RateLimitInfo {
                remaining: u32::MAX,
                limit: u32::MAX,
                reset_after: 0,
            });
        }

        let max_tokens = self.limit(tier);
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry((ip, tier))
            .or_insert_with(|| RateLimitEntry::new(max_tokens));

        let elapsed = now.duration_since(entry.window_start);
        if elapsed >= self.window_duration {
            entry.tokens = max_tokens;
            entry.window_start = now;
        } else {
            let since_last = now.duration_since(entry.last_request);
            let per_second = max_tokens as f64 / self.window_duration.as_secs_f64();
            let replenished = (since_last.as_secs_f64() * per_second) as u32;
            entry.tokens = entry.tokens.saturating_add(replenished).min(max_tokens);
        }
        entry.last_request = now;

        let reset_after = self
            .window_duration
            .saturating_sub(now.duration_since(entry.window_start))
            .as_secs();
        if entry.tokens > 0 {
            entry.tokens -= 1;
            Ok(RateLimitInfo {
                remaining: entry.tokens,
                limit: max_tokens,
                reset_after,
            })
        } else {
            Err(reset_after.max(1))
        }
    }

    pub fn limit(&self, tier: RateLimitTier) -> u32 {
        match tier {
            RateLimitTier::Api => self.config.api_requests_per_window,
            RateLimitTier::Forms => self.config.form_requests_per_window,
            RateLimitTier::Chat => self.config.chat_requests_per_window,
        }
    }

    /// Drop entries idle for two windows
    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        let expiry = self.window_duration * 2;
        self.entries
            .retain(|_, entry| now.duration_since(entry.last_request) < expiry);
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

/// Client IP: first `X-Forwarded-For` hop, then `X-Real-IP`, then the socket peer
fn client_ip(request: &Request<Body>) -> IpAddr {
    let header_ip = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    };

    header_ip("x-forwarded-for")
        .or_else(|| header_ip("x-real-ip"))
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

pub async fn rate_limit_api(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    rate_limit_with_tier(state, request, next, RateLimitTier::Api).await
}

pub async fn rate_limit_forms(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    rate_limit_with_tier(state, request, next, RateLimitTier::Forms).await
}

pub async fn rate_limit_chat(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    rate_limit_with_tier(state, request, next, RateLimitTier::Chat).await
}

async fn rate_limit_with_tier(
    state: Arc<AppState>,
    request: Request<Body>,
    next: Next,
    tier: RateLimitTier,
) -> Response {
    let ip = client_ip(&request);

    match state.rate_limiter.check_rate_limit(ip, tier) {
        Ok(info) => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert("x-ratelimit-limit", HeaderValue::from(info.limit));
            headers.insert("x-ratelimit-remaining", HeaderValue::from(info.remaining));
            headers.insert("x-ratelimit-reset", HeaderValue::from(info.reset_after));
            response
        }
        Err(retry_after) => {
            tracing::warn!(%ip, ?tier, retry_after, "Rate limit exceeded");
            let mut response = ApiError::rate_limited(format!(
                "Rate limit exceeded. Try again in {} seconds.",
                retry_after
            ))
            .into_response();
            let headers = response.headers_mut();
            headers.insert("retry-after", HeaderValue::from(retry_after));
            headers.insert(
                "x-ratelimit-limit",
                HeaderValue::from(state.rate_limiter.limit(tier)),
            );
            headers.insert("x-ratelimit-remaining", HeaderValue::from(0u32));
            response
        }
    }
}

/// Periodically sweep idle entries
pub fn spawn_cleanup_task(rate_limiter: Arc<RateLimiter>, cleanup_interval_secs: u64) {
    tokio::spawn(async move {
        let interval = Duration::from_secs(cleanup_interval_secs.max(1));
        loop {
            tokio::time::sleep(interval).await;
            rate_limiter.cleanup_expired();
            tracing::debug!(
                entries = rate_limiter.entry_count(),
                "Rate limiter cleanup complete"
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> RateLimitConfig {
        RateLimitConfig {
            enabled: true,
            api_requests_per_window: 10,
            form_requests_per_window: 3,
            chat_requests_per_window: 5,
            window_seconds: 60,
            cleanup_interval: 300,
        }
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_allows_requests_under_limit() {
        let limiter = RateLimiter::new(test_config());
        for i in 0..10 {
            assert!(
                limiter.check_rate_limit(ip("10.0.0.1"), RateLimitTier::Api).is_ok(),
                "request {} should be allowed",
                i
            );
        }
    }

    #[test]
    fn test_blocks_after_limit() {
        let limiter = RateLimiter::new(test_config());
        for _ in 0..3 {
            limiter.check_rate_limit(ip("10.0.0.1"), RateLimitTier::Forms).unwrap();
        }
        let retry_after = limiter
            .check_rate_limit(ip("10.0.0.1"), RateLimitTier::Forms)
            .unwrap_err();
        assert!(retry_after >= 1);
    }

    #[test]
    fn test_ips_and_tiers_are_independent() {
        let limiter = RateLimiter::new(test_config());
        for _ in 0..3 {
            let _ = limiter.check_rate_limit(ip("10.0.0.1"), RateLimitTier::Forms);
        }
        assert!(limiter.check_rate_limit(ip("10.0.0.1"), RateLimitTier::Forms).is_err());
        assert!(limiter.check_rate_limit(ip("10.0.0.2"), RateLimitTier::Forms).is_ok());
        assert!(limiter.check_rate_limit(ip("10.0.0.1"), RateLimitTier::Chat).is_ok());
        assert_eq!(limiter.entry_count(), 3);
    }

    #[test]
    fn test_disabled_rate_limiting() {
        let mut config = test_config();
        config.enabled = false;
        let limiter = RateLimiter::new(config);
        for _ in 0..100 {
            assert!(limiter.check_rate_limit(ip("10.0.0.1"), RateLimitTier::Forms).is_ok());
        }
    }

    #[test]
    fn test_cleanup_keeps_recent_entries() {
        let limiter = RateLimiter::new(test_config());
        let _ = limiter.check_rate_limit(ip("10.0.0.1"), RateLimitTier::Api);
        limiter.cleanup_expired();
        assert_eq!(limiter.entry_count(), 1);
    }

    #[test]
    fn test_client_ip_prefers_forwarded_header() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&request), ip("203.0.113.7"));

        let request = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_ip(&request), ip("127.0.0.1"));
    }
}
