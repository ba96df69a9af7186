//! ============================================================================
//! Rate-Limit Handling - Fixed Wait & Failure Classification
//! ============================================================================
//! Maps classified API failures to what the block loop does next:
//! - Rate limited: wait a fixed period, retry the same call (no cap)
//! - Account locked: stop everything
//! - Anything else: report and move on
//! ============================================================================

use chrono::{DateTime, Local};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use crate::config::DEFAULT_RATE_LIMIT_WAIT;
use crate::error::ApiError;

/// What the executor does after a failed block call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    /// Sleep the rate-limit period, then retry the same ID
    WaitAndRetry,
    /// Abort the whole session
    Halt,
    /// Report, leave the ID unblocked, continue with the next one
    Skip,
}

pub fn failure_action(error: &ApiError) -> FailureAction {
    match error {
        ApiError::RateLimited => FailureAction::WaitAndRetry,
        ApiError::AccountLocked(_) => FailureAction::Halt,
        _ => FailureAction::Skip,
    }
}

/// Fixed-period wait applied on every rate-limit response
#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicy {
    pub wait: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            wait: DEFAULT_RATE_LIMIT_WAIT,
        }
    }
}

impl RateLimitPolicy {
    pub fn new(wait: Duration) -> Self {
        Self { wait }
    }

    /// Wall-clock time at which a wait starting `now` ends
    pub fn resume_at(&self, now: DateTime<Local>) -> DateTime<Local> {
        now + chrono::Duration::from_std(self.wait).unwrap_or_else(|_| chrono::Duration::zero())
    }

    pub async fn wait(&self) {
        warn!("Rate limited, waiting {:?}", self.wait);
        sleep(self.wait).await;
    }

    /// Run `call` until it returns something other than a rate-limit error,
    /// waiting between attempts. `on_wait` receives the resume time.
    pub async fn retry_rate_limited<T, F, Fut>(
        &self,
        mut call: F,
        mut on_wait: impl FnMut(DateTime<Local>),
    ) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        loop {
            match call().await {
                Err(ApiError::RateLimited) => {
                    on_wait(self.resume_at(Local::now()));
                    self.wait().await;
                }
                other => return other,
            }
        }
    }
}
