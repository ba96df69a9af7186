//! ============================================================================
//! Client Module - Platform API Interface
//! ============================================================================
//! The executor only sees `PlatformApi`. Implementations own request signing,
//! cursor pagination and the classification of failures into `ApiError`.
//! ============================================================================

mod twitter;

#[cfg(test)]
pub(crate) mod mock;

pub use twitter::TwitterClient;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::types::UserId;

#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Screen name of the authenticated user
    async fn screen_name(&self) -> Result<String, ApiError>;

    /// Every ID the authenticated user currently blocks
    async fn list_blocked_ids(&self) -> Result<Vec<UserId>, ApiError>;

    /// Every follower ID of `screen_name`, in listing order
    async fn list_follower_ids(&self, screen_name: &str) -> Result<Vec<UserId>, ApiError>;

    async fn block(&self, user_id: UserId) -> Result<(), ApiError>;
}
