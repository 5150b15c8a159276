//! Sliding-window rate limiter for provider requests and tokens

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const WINDOW: Duration = Duration::from_secs(60);

/// Per-provider limiter: requests and tokens in the last minute
pub struct RateLimiter {
    requests_per_minute: u32,
    tokens_per_minute: u32,
    window: Duration,
    last_requests: Mutex<VecDeque<Instant>>,
    token_usage: Mutex<VecDeque<(Instant, u32)>>,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32, tokens_per_minute: u32) -> Self {
        Self::with_window(requests_per_minute, tokens_per_minute, WINDOW)
    }

    /// Limiter over a custom window length
    pub fn with_window(requests_per_minute: u32, tokens_per_minute: u32, window: Duration) -> Self {
        Self {
            requests_per_minute: requests_per_minute.max(1),
            tokens_per_minute,
            window,
            last_requests: Mutex::new(VecDeque::new()),
            token_usage: Mutex::new(VecDeque::new()),
        }
    }

    /// Wait until a request fits in the window, then record it
    pub async fn acquire(&self) -> RateLimitGuard {
        loop {
            let wait = {
                let mut last = self.last_requests.lock().await;
                let now = Instant::now();
                prune(&mut last, now, self.window, |t| *t);

                if last.len() < self.requests_per_minute as usize {
                    last.push_back(now);
                    None
                } else {
                    last.front()
                        .map(|&oldest| self.window.saturating_sub(now.duration_since(oldest)))
                }
            };

            match wait {
                None => return RateLimitGuard { _private: () },
                Some(wait) => {
                    tracing::debug!("Rate limit reached, waiting {}ms", wait.as_millis());
                    tokio::time::sleep(wait + Duration::from_millis(10)).await;
                }
            }
        }
    }

    /// Requests recorded in the current window
    pub async fn requests_in_window(&self) -> usize {
        let mut last = self.last_requests.lock().await;
        prune(&mut last, Instant::now(), self.window, |t| *t);
        last.len()
    }

    /// Record token usage for rate limiting
    pub async fn record_tokens(&self, tokens: u32) {
        let mut usage = self.token_usage.lock().await;
        let now = Instant::now();
        prune(&mut usage, now, self.window, |(t, _)| *t);
        usage.push_back((now, tokens));
    }

    /// Tokens used in the current window
    pub async fn current_token_usage(&self) -> u32 {
        let mut usage = self.token_usage.lock().await;
        prune(&mut usage, Instant::now(), self.window, |(t, _)| *t);
        usage.iter().map(|(_, t)| t).sum()
    }

    pub async fn has_token_capacity(&self, needed: u32) -> bool {
        self.current_token_usage().await.saturating_add(needed) <= self.tokens_per_minute
    }
}

/// Drop entries older than `window`
fn prune<T>(entries: &mut VecDeque<T>, now: Instant, window: Duration, at: impl Fn(&T) -> Instant) {
    while let Some(front) = entries.front() {
        if now.duration_since(at(front)) > window {
            entries.pop_front();
        } else {
            break;
        }
    }
}

/// Guard returned when rate limit permission is acquired
pub struct RateLimitGuard {
    _private: (),
}
