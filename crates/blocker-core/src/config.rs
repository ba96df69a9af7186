//! ============================================================================
//! Runtime Configuration
//! ============================================================================
//! Defaults come from the environment (a `.env` file is honoured by the CLI),
//! command-line flags override individual fields afterwards.
//! ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use crate::types::ConsumerKeys;

/// Platform REST API root
pub const DEFAULT_API_BASE: &str = "https://api.twitter.com";

/// How long to wait after a rate-limit response before retrying
pub const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(15 * 60);

const DEFAULT_KEYS_PATH: &str = "./keys";
const DEFAULT_TOKENS_PATH: &str = "./tokens.pkl";

#[derive(Debug, Clone)]
pub struct BlockerConfig {
    pub keys_path: PathBuf,
    pub tokens_path: PathBuf,
    pub api_base: String,
    pub rate_limit_wait: Duration,
    /// Consumer credentials supplied through the environment, if both are set
    pub env_consumer_keys: Option<ConsumerKeys>,
}

impl Default for BlockerConfig {
    fn default() -> Self {
        let env_consumer_keys = match (
            std::env::var("TWITTER_CONSUMER_KEY"),
            std::env::var("TWITTER_CONSUMER_SECRET"),
        ) {
            (Ok(key), Ok(secret)) if !key.is_empty() && !secret.is_empty() => {
                Some(ConsumerKeys::new(key, secret))
            }
            _ => None,
        };

        Self {
            keys_path: std::env::var("BLOCKER_KEYS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_KEYS_PATH)),
            tokens_path: std::env::var("BLOCKER_TOKENS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_TOKENS_PATH)),
            api_base: std::env::var("BLOCKER_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            rate_limit_wait: DEFAULT_RATE_LIMIT_WAIT,
            env_consumer_keys,
        }
    }
}
