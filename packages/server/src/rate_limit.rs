//! Per-client request limiting.
//!
//! [`enforce`] runs as middleware on the `/api` scope and rejects
//! over-limit requests with `429 Too Many Requests` before any handler
//! runs. The counters live behind the [`RateLimiter`] trait so the
//! in-memory [`FixedWindowRateLimiter`] can be replaced by a shared
//! store.
//!
//! Clients are keyed by the socket peer IP. `Forwarded` and
//! `X-Forwarded-For` are client-controlled and only consulted when
//! [`AppState::trust_forwarded_for`] is set, i.e. behind a reverse proxy
//! that overwrites them.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header;
use actix_web::middleware::Next;
use actix_web::{Error, HttpResponse, web};
use city_dashboard_server_models::ApiError;

use crate::AppState;

/// Default bound on the number of clients tracked at once.
pub const DEFAULT_MAX_CLIENTS: usize = 10_000;

/// Outcome of [`RateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// The request may proceed.
    Allowed {
        /// Requests left in the current window.
        remaining: u32,
    },
    /// The client is over its limit.
    Limited {
        /// Time until the window resets.
        retry_after: Duration,
    },
}

/// Counts requests per client key.
pub trait RateLimiter: Send + Sync {
    /// Records one request from `key` and decides whether it may proceed.
    fn check(&self, key: &str) -> RateDecision;

    /// Length of one counting window.
    fn window(&self) -> Duration;
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// In-memory fixed-window limiter: each client may make `max_requests`
/// requests per `window`, counted from its first request in that window.
///
/// At most `max_clients` windows are held. When a new client arrives at
/// a full table, expired windows are dropped first; if none have
/// expired, the oldest window is evicted.
#[derive(Debug)]
pub struct FixedWindowRateLimiter {
    max_requests: u32,
    window: Duration,
    max_clients: usize,
    clients: Mutex<HashMap<String, Window>>,
}

impl FixedWindowRateLimiter {
    /// Creates a limiter allowing `max_requests` per `window`.
    #[must_use]
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self::with_max_clients(max_requests, window, DEFAULT_MAX_CLIENTS)
    }

    /// Creates a limiter tracking at most `max_clients` clients.
    #[must_use]
    pub fn with_max_clients(max_requests: u32, window: Duration, max_clients: usize) -> Self {
        Self {
            max_requests,
            window,
            max_clients: max_clients.max(1),
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Number of clients currently tracked.
    #[must_use]
    pub fn tracked_clients(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// [`RateLimiter::check`] at an explicit instant.
    pub fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);

        if !clients.contains_key(key) && clients.len() >= self.max_clients {
            let window = self.window;
            clients.retain(|_, w| now.saturating_duration_since(w.started) < window);

            if clients.len() >= self.max_clients {
                let oldest = clients
                    .iter()
                    .min_by_key(|(_, w)| w.started)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    log::debug!("Rate limit table full, evicting {oldest}");
                    clients.remove(&oldest);
                }
            }
        }

        let entry = clients.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        let elapsed = now.saturating_duration_since(entry.started);
        if elapsed >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        if entry.count >= self.max_requests {
            return RateDecision::Limited {
                retry_after: self
                    .window
                    .saturating_sub(now.saturating_duration_since(entry.started)),
            };
        }

        entry.count += 1;
        RateDecision::Allowed {
            remaining: self.max_requests - entry.count,
        }
    }
}

impl RateLimiter for FixedWindowRateLimiter {
    fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }

    fn window(&self) -> Duration {
        self.window
    }
}

/// Body of every 429 response.
#[must_use]
pub fn rejection_message(window: Duration) -> String {
    let minutes = window.as_secs().div_ceil(60).max(1);
    let unit = if minutes == 1 { "minute" } else { "minutes" };
    format!("Too many requests from this IP, please try again after {minutes} {unit}.")
}

/// Middleware applying the [`RateLimiter`] in [`AppState`] to each
/// request, keyed by client IP.
///
/// # Errors
///
/// Propagates errors from the wrapped service.
pub async fn enforce<B: MessageBody + 'static>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, Error> {
    let limiter = req
        .app_data::<web::Data<AppState>>()
        .map(|state| (state.rate_limiter.clone(), state.trust_forwarded_for));

    if let Some((limiter, trust_forwarded_for)) = limiter {
        let key = client_key(&req, trust_forwarded_for);

        if let RateDecision::Limited { retry_after } = limiter.check(&key) {
            log::debug!("Rate limit exceeded for {key} on {}", req.path());

            let response = HttpResponse::TooManyRequests()
                .insert_header((header::RETRY_AFTER, retry_after.as_secs().max(1)))
                .json(ApiError::new(rejection_message(limiter.window())));
            return Ok(req.into_response(response).map_into_right_body());
        }
    }

    next.call(req).await.map(ServiceResponse::map_into_left_body)
}

fn client_key(req: &ServiceRequest, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        if let Some(addr) = req.connection_info().realip_remote_addr() {
            return strip_port(addr);
        }
    }

    req.peer_addr()
        .map_or_else(|| "unknown".to_string(), |peer| peer.ip().to_string())
}

/// Forwarded addresses may carry a port; clients are keyed by host
/// alone.
fn strip_port(addr: &str) -> String {
    addr.parse::<std::net::SocketAddr>()
        .map_or_else(|_| addr.to_string(), |socket| socket.ip().to_string())
}
