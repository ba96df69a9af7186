//! ============================================================================
//! BLOCKER-CORE: Follower Blocking Engine
//! ============================================================================
//! All logic behind the `block-followers` CLI:
//! - OAuth 1.0a PIN authorization and local credential storage
//! - Platform client (blocks, followers, verify credentials)
//! - Block batches with rate-limit waits and account-lock detection
//! ============================================================================

pub mod auth;
pub mod bootstrap;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod operator;
pub mod progress;
pub mod retry;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use auth::TwitterOAuth;
pub use bootstrap::{bootstrap, Authenticated, Bootstrap};
pub use client::{PlatformApi, TwitterClient};
pub use config::BlockerConfig;
pub use error::{ApiError, BlockerError};
pub use executor::{run_session, Session};
pub use operator::{Notice, Operator};
pub use retry::RateLimitPolicy;
pub use store::SecretStore;
pub use types::*;
