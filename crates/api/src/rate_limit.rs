//! In-memory per-IP rate limiting for authentication endpoints.
//!
//! Two named token buckets per IP: `login` (5 attempts / minute) and
//! `register` (3 attempts / 10 minutes) by default. A bucket refills to
//! full capacity when its window elapses. Buckets are created lazily and
//! live for the process lifetime; losing them on restart is acceptable.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use finagent_shared::config::RateLimitConfig;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    tokens: u32,
    window_started: Instant,
}

impl Bucket {
    fn try_consume(&mut self, capacity: u32, window: Duration, now: Instant) -> bool {
        if now.duration_since(self.window_started) >= window {
            self.tokens = capacity;
            self.window_started = now;
        }
        if self.tokens == 0 {
            return false;
        }
        self.tokens -= 1;
        true
    }
}

/// Per-IP rate limiter with separate login and register buckets.
///
/// Single-process only; cross-replica limiting is out of scope.
pub struct AuthRateLimiter {
    login: Mutex<HashMap<String, Bucket>>,
    register: Mutex<HashMap<String, Bucket>>,
    login_capacity: u32,
    login_window: Duration,
    register_capacity: u32,
    register_window: Duration,
}

impl AuthRateLimiter {
    /// Creates a limiter from configuration.
    #[must_use]
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            login: Mutex::new(HashMap::new()),
            register: Mutex::new(HashMap::new()),
            login_capacity: config.login_max_attempts,
            login_window: Duration::from_secs(config.login_window_secs),
            register_capacity: config.register_max_attempts,
            register_window: Duration::from_secs(config.register_window_secs),
        }
    }

    /// Consumes one login attempt for this IP. False means rate-limited.
    pub fn try_consume_login(&self, ip: &str) -> bool {
        Self::try_consume(
            &self.login,
            ip,
            self.login_capacity,
            self.login_window,
            Instant::now(),
        )
    }

    /// Consumes one registration attempt for this IP. False means
    /// rate-limited.
    pub fn try_consume_register(&self, ip: &str) -> bool {
        Self::try_consume(
            &self.register,
            ip,
            self.register_capacity,
            self.register_window,
            Instant::now(),
        )
    }

    fn try_consume(
        buckets: &Mutex<HashMap<String, Bucket>>,
        ip: &str,
        capacity: u32,
        window: Duration,
        now: Instant,
    ) -> bool {
        let mut buckets = match buckets.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let bucket = buckets.entry(ip.to_string()).or_insert(Bucket {
            tokens: capacity,
            window_started: now,
        });
        bucket.try_consume(capacity, window, now)
    }
}
