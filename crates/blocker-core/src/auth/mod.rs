//! ============================================================================
//! Auth Module - OAuth 1.0a for the Platform API
//! ============================================================================
//! - Request signing (HMAC-SHA1)
//! - PIN-based authorization handshake
//! ============================================================================

mod signing;
mod twitter_oauth;

pub use signing::Signer;
pub use twitter_oauth::TwitterOAuth;

use async_trait::async_trait;

use crate::client::PlatformApi;
use crate::error::ApiError;
use crate::types::AccessTokens;

/// Request token awaiting the operator's verifier
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    pub request_token: String,
    pub request_secret: String,
    /// Page the operator visits to approve access and read the PIN
    pub authorize_url: String,
}

/// Obtains user access tokens and builds authenticated API handles
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn request_authorization(&self) -> Result<PendingAuthorization, ApiError>;

    async fn exchange_verifier(
        &self,
        pending: &PendingAuthorization,
        verifier: &str,
    ) -> Result<AccessTokens, ApiError>;

    /// Bind an access token to this application's credentials
    fn connect(&self, tokens: AccessTokens) -> Box<dyn PlatformApi>;
}
