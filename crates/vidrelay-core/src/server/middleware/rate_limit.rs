//! Fixed-window, per-client-IP request limiter.
//!
//! Runs in front of the download handler, so excess requests are refused
//! before the validator or any upstream call.

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;
use crate::server::error::ApiError;

/// Expired windows are swept once the map holds this many clients.
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<DashMap<IpAddr, Window>>,
    window: Duration,
    max_requests: u32,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
            window,
            max_requests,
        }
    }

    pub fn from_config(cfg: &RateLimitConfig) -> Self {
        Self::new(Duration::from_secs(cfg.window_secs), cfg.max_requests)
    }

    pub fn is_enabled(&self) -> bool {
        self.max_requests > 0
    }

    /// Counts one request from `ip` at `now`.
    pub fn check(&self, ip: IpAddr, now: Instant) -> RateDecision {
        if !self.is_enabled() {
            return RateDecision::Allowed {
                remaining: u32::MAX,
            };
        }
        if self.windows.len() >= PRUNE_THRESHOLD {
            self.prune(now);
        }

        let mut entry = self.windows.entry(ip).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        if entry.count >= self.max_requests {
            let elapsed = now.duration_since(entry.started);
            return RateDecision::Limited {
                retry_after: self.window.saturating_sub(elapsed),
            };
        }
        entry.count += 1;
        RateDecision::Allowed {
            remaining: self.max_requests - entry.count,
        }
    }

    /// Drops windows that have expired.
    pub fn prune(&self, now: Instant) {
        let window = self.window;
        self.windows
            .retain(|_, w| now.duration_since(w.started) < window);
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Middleware function enforcing the limiter.
pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&request);
    match limiter.check(ip, Instant::now()) {
        RateDecision::Allowed { remaining } => {
            tracing::trace!(client = %ip, remaining, "request admitted");
            next.run(request).await
        }
        RateDecision::Limited { retry_after } => {
            tracing::info!(client = %ip, "rate limit exceeded");
            let mut response = ApiError::too_many_requests().into_response();
            let secs = retry_after.as_secs().max(1);
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn allows_up_to_max_then_limits() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 3);
        let now = Instant::now();
        assert_eq!(limiter.check(ip(1), now), RateDecision::Allowed { remaining: 2 });
        assert_eq!(limiter.check(ip(1), now), RateDecision::Allowed { remaining: 1 });
        assert_eq!(limiter.check(ip(1), now), RateDecision::Allowed { remaining: 0 });
        assert!(matches!(
            limiter.check(ip(1), now + Duration::from_secs(10)),
            RateDecision::Limited { retry_after } if retry_after == Duration::from_secs(50)
        ));
    }

    #[test]
    fn clients_are_independent() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1);
        let now = Instant::now();
        assert!(matches!(limiter.check(ip(1), now), RateDecision::Allowed { .. }));
        assert!(matches!(limiter.check(ip(2), now), RateDecision::Allowed { .. }));
        assert!(matches!(limiter.check(ip(1), now), RateDecision::Limited { .. }));
    }

    #[test]
    fn window_resets() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1);
        let now = Instant::now();
        assert!(matches!(limiter.check(ip(1), now), RateDecision::Allowed { .. }));
        assert!(matches!(limiter.check(ip(1), now), RateDecision::Limited { .. }));
        let later = now + Duration::from_secs(60);
        assert!(matches!(limiter.check(ip(1), later), RateDecision::Allowed { .. }));
    }

    #[test]
    fn zero_max_disables() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 0);
        let now = Instant::now();
        for _ in 0..1000 {
            assert!(matches!(limiter.check(ip(1), now), RateDecision::Allowed { .. }));
        }
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn prune_drops_expired() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 5);
        let now = Instant::now();
        limiter.check(ip(1), now);
        limiter.check(ip(2), now + Duration::from_secs(30));
        limiter.prune(now + Duration::from_secs(61));
        assert_eq!(limiter.tracked_clients(), 1);
    }
}
