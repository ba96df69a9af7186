//! ============================================================================
//! Core Types for the Follower Blocker
//! ============================================================================
//! Credentials, block batches, per-batch reports and the explicit session
//! termination signal returned by the executor loop.
//! ============================================================================

use serde::{Deserialize, Serialize};

/// Platform user ID
pub type UserId = u64;

/// Application (consumer) credential pair issued by the developer portal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerKeys {
    pub key: String,
    pub secret: String,
}

impl ConsumerKeys {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

/// Per-user OAuth 1.0a access token pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokens {
    pub token: String,
    pub secret: String,
}

impl AccessTokens {
    pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            secret: secret.into(),
        }
    }
}

/// Followers of one target that are not yet blocked, in listing order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockBatch {
    pub target: String,
    pub ids: Vec<UserId>,
    /// Followers skipped because the operator already blocks them
    pub already_blocked: usize,
}

impl BlockBatch {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Outcome of executing one batch to completion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub blocked: Vec<UserId>,
    /// IDs that failed with a non-fatal error, with the error text
    pub skipped: Vec<(UserId, String)>,
    pub rate_limit_waits: u32,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.blocked.len() + self.skipped.len()
    }
}

/// How the interactive session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionExit {
    /// Operator chose not to process another batch
    Finished,
    /// Operator declined a confirmation (batch or logged-in identity)
    Declined,
    /// Platform locked the account while blocking `user_id`
    AccountLocked { user_id: UserId, remaining: usize },
}

impl SessionExit {
    /// Process exit status for this outcome
    pub fn exit_code(&self) -> u8 {
        match self {
            SessionExit::Finished | SessionExit::Declined => 0,
            SessionExit::AccountLocked { .. } => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(SessionExit::Finished.exit_code(), 0);
        assert_eq!(SessionExit::Declined.exit_code(), 0);
        assert_eq!(
            SessionExit::AccountLocked {
                user_id: 7,
                remaining: 3
            }
            .exit_code(),
            1
        );
    }

    #[test]
    fn test_report_processed_counts_both_outcomes() {
        let report = BatchReport {
            blocked: vec![1, 4],
            skipped: vec![(3, "nope".into())],
            rate_limit_waits: 0,
        };
        assert_eq!(report.processed(), 3);
    }
}
