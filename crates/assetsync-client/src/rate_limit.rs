//! Pacing of mutation calls.
//!
//! The asset API is protected from bursts by pausing between processed
//! records. The default is a fixed pause; a token bucket can replace it when
//! configured with an equal or lower steady-state rate. Neither reorders calls.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::trace;

/// Token bucket rate limiter.
pub struct TokenBucket {
    /// Maximum tokens in the bucket.
    capacity: u64,
    /// Current number of tokens.
    tokens: AtomicU64,
    /// Tokens to add per refill.
    refill_rate: u64,
    /// Refill interval.
    refill_interval: Duration,
    /// Last refill time.
    last_refill: Mutex<Instant>,
}

impl TokenBucket {
    /// Create a new token bucket.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum tokens in the bucket
    /// * `refill_rate` - Tokens to add per refill
    /// * `refill_interval` - How often to refill
    #[must_use]
    pub fn new(capacity: u64, refill_rate: u64, refill_interval: Duration) -> Self {
        Self {
            capacity,
            tokens: AtomicU64::new(capacity),
            refill_rate,
            refill_interval,
            last_refill: Mutex::new(Instant::now()),
        }
    }

    /// N tokens per minute, refilled one at a time, with a burst of one.
    ///
    /// A burst of one keeps the steady-state rate at or below the configured
    /// rate from the very first call.
    #[must_use]
    pub fn per_minute(requests_per_minute: u64) -> Self {
        let per_minute = requests_per_minute.max(1);
        let interval = Duration::from_secs_f64(60.0 / per_minute as f64);
        Self::new(1, 1, interval)
    }

    /// Try to take one token without waiting.
    pub async fn try_acquire(&self) -> bool {
        self.refill().await;

        loop {
            let current = self.tokens.load(Ordering::Relaxed);
            if current == 0 {
                return false;
            }
            if self
                .tokens
                .compare_exchange(current, current - 1, Ordering::SeqCst, Ordering::Relaxed)
                .is_ok()
            {
                return true;
            }
        }
    }

    /// Take one token, waiting if necessary.
    pub async fn acquire(&self) {
        while !self.try_acquire().await {
            tokio::time::sleep(self.refill_interval / 10).await;
        }
    }

    /// Currently available tokens.
    pub fn available(&self) -> u64 {
        self.tokens.load(Ordering::Relaxed)
    }

    async fn refill(&self) {
        let mut last_refill = self.last_refill.lock().await;
        let now = Instant::now();
        let elapsed = now.duration_since(*last_refill);

        if elapsed >= self.refill_interval {
            let intervals = elapsed.as_secs_f64() / self.refill_interval.as_secs_f64();
            let new_tokens = (intervals as u64) * self.refill_rate;

            if new_tokens > 0 {
                loop {
                    let current = self.tokens.load(Ordering::Relaxed);
                    let new_count = (current + new_tokens).min(self.capacity);
                    if self
                        .tokens
                        .compare_exchange(current, new_count, Ordering::SeqCst, Ordering::Relaxed)
                        .is_ok()
                    {
                        break;
                    }
                }
                *last_refill = now;
            }
        }
    }
}

/// Backpressure applied before each processed record.
pub enum Pacer {
    /// No pacing (dry runs, tests).
    Unpaced,
    /// At least `pause` between consecutive records.
    FixedPause {
        pause: Duration,
        last: Mutex<Option<Instant>>,
    },
    /// Token bucket limiter.
    Bucket(TokenBucket),
}

impl Pacer {
    #[must_use]
    pub fn fixed(pause: Duration) -> Self {
        if pause.is_zero() {
            return Self::Unpaced;
        }
        Self::FixedPause {
            pause,
            last: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn per_minute(requests_per_minute: u64) -> Self {
        Self::Bucket(TokenBucket::per_minute(requests_per_minute))
    }

    /// Wait until the next record may be processed.
    ///
    /// The first call returns immediately.
    pub async fn pace(&self) {
        match self {
            Self::Unpaced => {}
            Self::FixedPause { pause, last } => {
                let mut last = last.lock().await;
                if let Some(previous) = *last {
                    let ready_at = previous + *pause;
                    let now = Instant::now();
                    if ready_at > now {
                        trace!(wait_ms = (ready_at - now).as_millis(), "Pacing");
                        tokio::time::sleep(ready_at - now).await;
                    }
                }
                *last = Some(Instant::now());
            }
            Self::Bucket(bucket) => bucket.acquire().await,
        }
    }
}

impl std::fmt::Debug for Pacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unpaced => f.write_str("Unpaced"),
            Self::FixedPause { pause, .. } => {
                f.debug_struct("FixedPause").field("pause", pause).finish()
            }
            Self::Bucket(bucket) => f
                .debug_struct("Bucket")
                .field("refill_interval", &bucket.refill_interval)
                .finish(),
        }
    }
}
