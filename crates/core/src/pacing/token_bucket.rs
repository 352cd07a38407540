//! Token bucket pacing.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};
use tracing::debug;

use super::Pacer;
use crate::metrics;

/// Token bucket: `capacity` tokens per `window`, refilled continuously.
///
/// The bucket starts full, so a burst of up to `capacity` units is allowed
/// before any waiting happens.
pub struct TokenBucket {
    /// Max tokens (= requests per window).
    capacity: f32,
    /// Current available tokens.
    tokens: f32,
    /// Tokens added per second.
    refill_rate: f32,
    /// Last refill time.
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(requests_per_window: u32, window: Duration) -> Self {
        let capacity = requests_per_window.max(1) as f32;
        let window_secs = window.as_secs_f32().max(f32::EPSILON);
        Self {
            capacity,
            tokens: capacity,
            refill_rate: capacity / window_secs,
            last_refill: Instant::now(),
        }
    }

    /// Try to take a token.
    ///
    /// Returns `Err(wait)` with the time until one token is available.
    pub fn try_acquire(&mut self) -> Result<(), Duration> {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let tokens_needed = 1.0 - self.tokens;
            Err(Duration::from_secs_f32(tokens_needed / self.refill_rate))
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f32();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }
}

/// Pacer that sleeps whenever its token bucket is empty.
pub struct TokenBucketPacer {
    bucket: Mutex<TokenBucket>,
}

impl TokenBucketPacer {
    pub fn new(requests_per_window: u32, window: Duration) -> Self {
        Self {
            bucket: Mutex::new(TokenBucket::new(requests_per_window, window)),
        }
    }
}

#[async_trait]
impl Pacer for TokenBucketPacer {
    async fn pace(&self) {
        loop {
            let wait = match self.bucket.lock().await.try_acquire() {
                Ok(()) => return,
                Err(wait) => wait,
            };

            debug!("Pacing: waiting {:?}", wait);
            metrics::PACING_WAIT.observe(wait.as_secs_f64());
            sleep(wait).await;
        }
    }
}
