use std::sync::Mutex;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tokio::time::{sleep, Duration};
use reqwest::Response;

const MINUTE: Duration = Duration::from_secs(60);

pub struct RateLimiter {
    state: Mutex<RateLimitState>,
    requests_per_minute: u32,
}

struct RateLimitState {
    remaining: u32,
    reset_at: Option<Instant>,
    requests_this_minute: u32,
    minute_start: Instant,
}

impl RateLimitState {
    /// Books one request and returns how long the caller must wait first.
    fn reserve(&mut self, now: Instant, requests_per_minute: u32) -> Duration {
        let mut wait = Duration::ZERO;

        if self.remaining == 0 {
            if let Some(reset_at) = self.reset_at.take() {
                if reset_at > now {
                    wait = reset_at - now;
                }
            }
        }

        let minute_elapsed = now.saturating_duration_since(self.minute_start);
        if minute_elapsed >= MINUTE {
            self.requests_this_minute = 0;
            self.minute_start = now;
        } else if self.requests_this_minute >= requests_per_minute {
            wait = wait.max(MINUTE - minute_elapsed);
            self.requests_this_minute = 0;
            self.minute_start = now + wait;
        }

        self.requests_this_minute += 1;
        wait
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_requests_per_minute(30)
    }

    pub fn with_requests_per_minute(requests_per_minute: u32) -> Self {
        Self {
            state: Mutex::new(RateLimitState {
                remaining: 5000,
                reset_at: None,
                requests_this_minute: 0,
                minute_start: Instant::now(),
            }),
            requests_per_minute: requests_per_minute.max(1),
        }
    }

    pub async fn wait(&self) {
        let wait = match self.state.lock() {
            Ok(mut state) => state.reserve(Instant::now(), self.requests_per_minute),
            Err(_) => Duration::ZERO,
        };

        if !wait.is_zero() {
            tracing::info!("Rate limited, waiting {:?}", wait);
            sleep(wait).await;
        }
    }

    pub fn update_from_response(&self, response: &Response) {
        let remaining = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let reset = response
            .headers()
            .get("x-ratelimit-reset")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        if let Some(remaining) = remaining {
            self.record(remaining, reset);
        }
    }

    fn record(&self, remaining: u32, reset_timestamp: Option<u64>) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        state.remaining = remaining;

        let now_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        if let Some(reset_timestamp) = reset_timestamp {
            if reset_timestamp > now_secs {
                state.reset_at =
                    Some(Instant::now() + Duration::from_secs(reset_timestamp - now_secs));
            }
        }
    }

    pub fn remaining(&self) -> Option<u32> {
        self.state.lock().ok().map(|s| s.remaining)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
