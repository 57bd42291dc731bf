use std::time::{Duration, Instant};

const MIN_PAUSE: Duration = Duration::from_millis(10);
const MAX_PAUSE: Duration = Duration::from_secs(5);

/// Per-transfer token bucket. Capacity is one second worth of bytes.
#[derive(Debug)]
pub struct TokenBucket {
    rate: f64,
    tokens: f64,
    last: Instant,
}

impl TokenBucket {
    /// `None` when `max_kbps` is 0 (unlimited).
    pub fn new(max_kbps: u64) -> Option<Self> {
        if max_kbps == 0 {
            return None;
        }
        let rate = (max_kbps * 1024) as f64;
        Some(Self {
            rate,
            tokens: rate,
            last: Instant::now(),
        })
    }

    /// Take `bytes` tokens at `now`; returns how long to pause, if at all.
    pub fn consume_at(&mut self, bytes: u64, now: Instant) -> Option<Duration> {
        let elapsed = now.saturating_duration_since(self.last).as_secs_f64();
        self.last = now;
        self.tokens = (self.tokens + elapsed * self.rate).min(self.rate);
        self.tokens -= bytes as f64;

        if self.tokens >= 0.0 {
            return None;
        }
        let wait = Duration::from_secs_f64(-self.tokens / self.rate);
        Some(wait.clamp(MIN_PAUSE, MAX_PAUSE))
    }

    pub async fn throttle(&mut self, bytes: u64) {
        if let Some(pause) = self.consume_at(bytes, Instant::now()) {
            tokio::time::sleep(pause).await;
        }
    }
}
