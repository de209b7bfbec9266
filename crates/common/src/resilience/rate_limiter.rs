//! Rate limiting for controlling operation throughput
//!
//! - [`TokenBucket`]: non-blocking token bucket, generic over [`Clock`]
//! - [`RateLimiter`]: async gate built on a token bucket; callers wait for a
//!   permit instead of being rejected
//!
//! Refill is phase-preserving: the refill mark advances by whole intervals,
//! so permits are released on a fixed cadence regardless of when callers
//! happen to look at the bucket.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::testing::{Clock, SystemClock, TokioClock};

/// Interval over which a [`RateLimiter`] releases its permits.
pub const RATE_LIMIT_INTERVAL: Duration = Duration::from_millis(1000);

/// Smallest sleep used while waiting for a permit.
const MIN_WAIT: Duration = Duration::from_millis(1);

/// Configuration for token bucket rate limiter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBucketConfig {
    /// Maximum number of tokens the bucket can hold
    pub capacity: u64,
    /// Number of tokens to refill per interval
    pub refill_amount: u64,
    /// Time interval for token refill
    pub refill_interval: Duration,
}

impl Default for TokenBucketConfig {
    fn default() -> Self {
        Self { capacity: 1000, refill_amount: 1000, refill_interval: RATE_LIMIT_INTERVAL }
    }
}

impl TokenBucketConfig {
    /// `permits` tokens available at once and restored every `interval`.
    #[must_use]
    pub const fn per_interval(permits: u64, interval: Duration) -> Self {
        Self { capacity: permits, refill_amount: permits, refill_interval: interval }
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("capacity must be greater than 0".to_string());
        }
        if self.refill_amount == 0 {
            return Err("refill_amount must be greater than 0".to_string());
        }
        if self.refill_interval.is_zero() {
            return Err("refill_interval must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Token bucket rate limiter
///
/// Allows bursts up to the capacity, then refills a fixed amount per
/// interval. Clones share the same bucket.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
///
/// use groupderef_common::resilience::TokenBucket;
///
/// # fn example() -> Result<(), String> {
/// let bucket = TokenBucket::new(10, 10, Duration::from_secs(1))?;
///
/// if bucket.try_acquire(3) {
///     println!("three operations allowed");
/// }
/// # Ok(())
/// # }
/// ```
pub struct TokenBucket<C: Clock = SystemClock> {
    config: TokenBucketConfig,
    tokens: Arc<AtomicU64>,
    last_refill: Arc<Mutex<Instant>>,
    clock: Arc<C>,
}

impl<C: Clock> TokenBucket<C> {
    /// Create a new token bucket with custom clock. The bucket starts full.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn with_clock(
        capacity: u64,
        refill_amount: u64,
        refill_interval: Duration,
        clock: C,
    ) -> Result<Self, String> {
        Self::from_config(TokenBucketConfig { capacity, refill_amount, refill_interval }, clock)
    }

    /// Create a token bucket from a prepared configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: TokenBucketConfig, clock: C) -> Result<Self, String> {
        config.validate()?;

        Ok(Self {
            tokens: Arc::new(AtomicU64::new(config.capacity)),
            last_refill: Arc::new(Mutex::new(clock.now())),
            clock: Arc::new(clock),
            config,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &TokenBucketConfig {
        &self.config
    }

    /// Add tokens for every whole interval elapsed since the last refill.
    fn refill(&self) {
        let now = self.clock.now();
        let mut last_refill = self.last_refill.lock();

        let elapsed = now.saturating_duration_since(*last_refill);
        let interval_nanos = self.config.refill_interval.as_nanos();
        let refills = elapsed.as_nanos() / interval_nanos;
        if refills == 0 {
            return;
        }

        let refills = u64::try_from(refills).unwrap_or(u64::MAX);
        let tokens_to_add = refills.saturating_mul(self.config.refill_amount);
        let capacity = self.config.capacity;
        let _ = self.tokens.fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
            Some(current.saturating_add(tokens_to_add).min(capacity))
        });

        // Keep the partial interval so the cadence does not drift.
        let remainder = u64::try_from(elapsed.as_nanos() % interval_nanos).unwrap_or(0);
        *last_refill = now - Duration::from_nanos(remainder);

        trace!(tokens_added = tokens_to_add, "token bucket refilled");
    }

    /// Try to acquire the specified number of tokens
    ///
    /// Returns `true` if tokens were acquired, `false` if not enough tokens
    /// are available. Never waits.
    pub fn try_acquire(&self, tokens: u64) -> bool {
        self.refill();

        let mut current = self.tokens.load(Ordering::Acquire);
        loop {
            if current < tokens {
                return false;
            }

            match self.tokens.compare_exchange_weak(
                current,
                current - tokens,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Get the current number of available tokens
    pub fn available_tokens(&self) -> u64 {
        self.refill();
        self.tokens.load(Ordering::Acquire)
    }

    /// Time left until the next refill. Zero if a refill is already due.
    pub fn time_until_refill(&self) -> Duration {
        let now = self.clock.now();
        let last_refill = *self.last_refill.lock();
        let elapsed = now.saturating_duration_since(last_refill);
        self.config.refill_interval.saturating_sub(elapsed)
    }

    /// Reset the limiter to full capacity
    pub fn reset(&self) {
        self.tokens.store(self.config.capacity, Ordering::Release);
        *self.last_refill.lock() = self.clock.now();
    }
}

impl TokenBucket<SystemClock> {
    /// Create a new token bucket with system clock
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(
        capacity: u64,
        refill_amount: u64,
        refill_interval: Duration,
    ) -> Result<Self, String> {
        Self::with_clock(capacity, refill_amount, refill_interval, SystemClock)
    }
}

impl<C: Clock> Clone for TokenBucket<C> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            tokens: Arc::clone(&self.tokens),
            last_refill: Arc::clone(&self.last_refill),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C: Clock> std::fmt::Debug for TokenBucket<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenBucket")
            .field("config", &self.config)
            .field("tokens", &self.tokens.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Shared async gate bounding aggregate throughput.
///
/// Every caller of [`acquire`](Self::acquire) draws from the same bucket, so
/// the ceiling holds across all workers combined. Uses [`TokioClock`] by
/// default so waiting follows tokio's timer, including a paused test clock.
#[derive(Debug, Clone)]
pub struct RateLimiter<C: Clock = TokioClock> {
    bucket: TokenBucket<C>,
}

impl RateLimiter<TokioClock> {
    /// Limiter releasing `permits` operations per second.
    ///
    /// # Errors
    /// Returns an error if `permits` is zero.
    pub fn per_second(permits: u32) -> Result<Self, String> {
        Self::with_clock(permits, RATE_LIMIT_INTERVAL, TokioClock)
    }
}

impl<C: Clock> RateLimiter<C> {
    /// Limiter releasing `permits` operations every `interval`.
    ///
    /// # Errors
    /// Returns an error if `permits` is zero or `interval` is zero.
    pub fn with_clock(permits: u32, interval: Duration, clock: C) -> Result<Self, String> {
        let config = TokenBucketConfig::per_interval(u64::from(permits), interval);
        Ok(Self { bucket: TokenBucket::from_config(config, clock)? })
    }

    /// Wait until a permit is available, then take it.
    pub async fn acquire(&self) {
        loop {
            if self.bucket.try_acquire(1) {
                return;
            }
            let wait = self.bucket.time_until_refill().max(MIN_WAIT);
            debug!(wait_ms = whole_millis(wait), "rate limit reached, waiting for permits");
            tokio::time::sleep(wait).await;
        }
    }

    /// Take a permit without waiting.
    pub fn try_acquire(&self) -> bool {
        self.bucket.try_acquire(1)
    }

    /// Permits released per interval.
    #[must_use]
    pub const fn permits_per_interval(&self) -> u64 {
        self.bucket.config().refill_amount
    }

    pub fn available_permits(&self) -> u64 {
        self.bucket.available_tokens()
    }
}

/// Milliseconds in `duration`, saturating at `u64::MAX`.
fn whole_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
