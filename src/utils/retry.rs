//! 远程调用的超时与重试
//!
//! 每次尝试都受 `timeout` 限制，超时视为瞬时错误。只有
//! [`StoreError::is_retryable`] 为真的错误才会重试，退避时间按
//! `base_delay * 2^n` 增长并截断到 `max_delay`，再叠加随机抖动。

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

use crate::config::StoreConfig;
use crate::errors::{Result, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&StoreConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &StoreConfig) -> Self {
        Self {
            max_attempts: config.retry.max_attempts.max(1),
            base_delay: Duration::from_millis(config.retry.base_delay_ms),
            max_delay: Duration::from_millis(config.retry.max_delay_ms),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// 不重试，仅保留超时
    pub fn no_retry(timeout: Duration) -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            timeout,
        }
    }

    /// 第 `retry` 次重试前的退避上限（不含抖动），从 0 开始计数
    pub fn backoff(&self, retry: u32) -> Duration {
        let multiplier = 2_u32.saturating_pow(retry);
        self.base_delay
            .saturating_mul(multiplier)
            .min(self.max_delay)
    }

    /// 在 [backoff/2, backoff] 区间内取随机值
    fn jittered_backoff(&self, retry: u32) -> Duration {
        let ceiling = self.backoff(retry);
        let half = ceiling / 2;
        let spread = (ceiling - half).as_millis() as u64;
        if spread == 0 {
            return ceiling;
        }
        half + Duration::from_millis(rand::rng().random_range(0..=spread))
    }
}

/// 按策略执行一次远程操作
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, operation: &str, mut f: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let outcome = match tokio::time::timeout(policy.timeout, f()).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::timeout(format!(
                "{operation} did not finish within {} ms",
                policy.timeout.as_millis()
            ))),
        };

        match outcome {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = policy.jittered_backoff(attempt - 1);
                warn!(
                    "{} failed (attempt {}/{}): {}; retrying in {} ms",
                    operation,
                    attempt,
                    max_attempts,
                    e,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                if e.is_retryable() {
                    error!(
                        "{} failed after {} attempt(s): {}",
                        operation, attempt, e
                    );
                }
                return Err(e);
            }
        }
    }
}
