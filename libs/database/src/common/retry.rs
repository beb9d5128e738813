use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry policy for database connection attempts
///
/// Delays double after each failed attempt, capped at `max_delay_ms`.
/// Jitter spreads the delays out so API replicas restarting together do
/// not hammer PostgreSQL in lockstep.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first failed attempt
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds
    pub initial_delay_ms: u64,

    /// Upper bound for the doubled delay in milliseconds
    pub max_delay_ms: u64,

    /// Randomize each delay to between 50% and 100% of its value
    pub use_jitter: bool,
}

impl RetryConfig {
    /// Default policy: 3 retries starting at 100ms, capped at 5s, with jitter
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_delay(mut self, delay_ms: u64) -> Self {
        self.initial_delay_ms = delay_ms;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.use_jitter = false;
        self
    }

    /// Delay before retry number `attempt` (1-based), before jitter
    fn delay_for(&self, attempt: u32) -> u64 {
        let doubled = self
            .initial_delay_ms
            .saturating_mul(1u64 << (attempt - 1).min(32));
        doubled.min(self.max_delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 100,
            max_delay_ms: 5000,
            use_jitter: true,
        }
    }
}

/// Retry an async operation under the given policy
///
/// # Example
/// ```ignore
/// use database::common::{RetryConfig, retry_with_backoff};
/// use database::postgres::connect_from_config;
///
/// let policy = RetryConfig::new().with_max_retries(5);
/// let db = retry_with_backoff(|| connect_from_config(config.clone()), policy).await?;
/// ```
pub async fn retry_with_backoff<F, Fut, T, E>(mut operation: F, config: RetryConfig) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!("Operation succeeded after {} retries", attempt);
                }
                return Ok(result);
            }
            Err(e) => {
                attempt += 1;

                if attempt > config.max_retries {
                    warn!(
                        "Operation failed after {} attempts: {}",
                        config.max_retries, e
                    );
                    return Err(e);
                }

                let mut delay = config.delay_for(attempt);
                if config.use_jitter {
                    delay = apply_jitter(delay);
                }

                debug!(
                    "Operation failed (attempt {}/{}): {}. Retrying in {}ms...",
                    attempt, config.max_retries, e, delay
                );

                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }
    }
}

/// Randomize a delay to between 50% and 100% of its value
fn apply_jitter(delay: u64) -> u64 {
    use std::collections::hash_map::RandomState;
    use std::hash::BuildHasher;

    // Hashing the current time is random enough here; no need to pull in a
    // full RNG for connection backoff
    let random_factor =
        (RandomState::new().hash_one(std::time::SystemTime::now()) % 50) as f64 / 100.0 + 0.5;

    (delay as f64 * random_factor) as u64
}

/// Retry with the default policy (3 retries starting at 100ms)
///
/// # Example
/// ```ignore
/// use database::common::retry;
/// use database::postgres::connect_from_config;
///
/// let db = retry(|| connect_from_config(config.clone())).await?;
/// ```
pub async fn retry<F, Fut, T, E>(operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    retry_with_backoff(operation, RetryConfig::default()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn attempt_counter() -> (Arc<AtomicU32>, Arc<AtomicU32>) {
        let counter = Arc::new(AtomicU32::new(0));
        (counter.clone(), counter)
    }

    #[tokio::test]
    async fn test_retry_returns_immediately_on_success() {
        let (counter, probe) = attempt_counter();

        let result = retry(|| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>("connected")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "connected");
        assert_eq!(probe.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failures() {
        let (counter, probe) = attempt_counter();
        let policy = RetryConfig::new().with_initial_delay(10).without_jitter();

        let result = retry_with_backoff(
            || {
                let counter = counter.clone();
                async move {
                    let attempt = counter.fetch_add(1, Ordering::SeqCst);
                    if attempt < 2 {
                        Err(format!("connection refused (attempt {})", attempt + 1))
                    } else {
                        Ok("connected")
                    }
                }
            },
            policy,
        )
        .await;

        assert_eq!(result.unwrap(), "connected");
        assert_eq!(probe.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_retries() {
        let (counter, probe) = attempt_counter();
        let policy = RetryConfig::new()
            .with_max_retries(2)
            .with_initial_delay(10)
            .without_jitter();

        let result = retry_with_backoff(
            || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<String, _>("database unreachable")
                }
            },
            policy,
        )
        .await;

        assert_eq!(result.unwrap_err(), "database unreachable");
        // 1 initial attempt + 2 retries
        assert_eq!(probe.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_delay_doubles_up_to_the_cap() {
        let policy = RetryConfig {
            max_retries: 10,
            initial_delay_ms: 100,
            max_delay_ms: 500,
            use_jitter: false,
        };

        assert_eq!(policy.delay_for(1), 100);
        assert_eq!(policy.delay_for(2), 200);
        assert_eq!(policy.delay_for(3), 400);
        assert_eq!(policy.delay_for(4), 500);
        assert_eq!(policy.delay_for(10), 500);
    }

    #[test]
    fn test_apply_jitter_stays_within_bounds() {
        for _ in 0..10 {
            let jittered = apply_jitter(1000);
            assert!((500..=1000).contains(&jittered));
        }
    }
}
