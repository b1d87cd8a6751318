//! 有限次数的重试包装
//!
//! 失败后固定间隔重试，次数用完返回最后一次的错误

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// 重试策略 (固定退避)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 首次失败后最多再试几次
    pub retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    /// 不重试
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// 所有错误都重试
pub async fn with_retry<T, E, F, Fut>(label: &str, policy: RetryPolicy, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    with_retry_if(label, policy, |_| true, operation).await
}

/// 只有 `should_retry` 返回 true 的错误才重试，其余立即返回
pub async fn with_retry_if<T, E, F, Fut, P>(
    label: &str,
    policy: RetryPolicy,
    should_retry: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let mut remaining = policy.retries;
    let mut attempt: u32 = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(target: "retry", label, attempt, "重试后成功");
                }
                return Ok(value);
            }
            Err(err) if remaining > 0 && should_retry(&err) => {
                warn!(
                    target: "retry",
                    label,
                    attempt,
                    remaining,
                    delay_ms = policy.delay.as_millis() as u64,
                    error = %err,
                    "调用失败, 准备重试"
                );
                tokio::time::sleep(policy.delay).await;
                remaining -= 1;
                attempt += 1;
            }
            Err(err) => {
                if remaining == 0 && policy.retries > 0 {
                    warn!(target: "retry", label, attempts = attempt, error = %err, "重试次数已用完");
                }
                return Err(err);
            }
        }
    }
}
