//! ============================================================================
//! Twitter OAuth 1.0a PIN-Based Authorization
//! ============================================================================
//! Three-legged flow with `oauth_callback=oob`: fetch a request token, send
//! the operator to the authorize page, exchange the displayed PIN for a
//! long-lived access token pair.
//! ============================================================================

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client};
use std::collections::HashMap;
use tracing::{debug, error, info};
use url::Url;

use super::signing::Signer;
use super::{Authorizer, PendingAuthorization};
use crate::client::{PlatformApi, TwitterClient};
use crate::error::ApiError;
use crate::types::{AccessTokens, ConsumerKeys};

const REQUEST_TOKEN_PATH: &str = "/oauth/request_token";
const AUTHORIZE_PATH: &str = "/oauth/authorize";
const ACCESS_TOKEN_PATH: &str = "/oauth/access_token";

/// Out-of-band callback: the platform shows the verifier PIN to the user
const CALLBACK_OOB: &str = "oob";

/// OAuth 1.0a handler bound to one application's consumer keys
pub struct TwitterOAuth {
    consumer: ConsumerKeys,
    api_base: String,
    client: Client,
}

impl TwitterOAuth {
    pub fn new(consumer: ConsumerKeys, api_base: impl Into<String>) -> Self {
        Self {
            consumer,
            api_base: api_base.into(),
            client: Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Url::parse(&format!("{}{}", self.api_base, path))
            .map_err(|e| ApiError::Decode(format!("bad endpoint {}: {}", path, e)))
    }

    /// Signed POST to a token endpoint, returning the form-encoded body fields
    async fn token_request(
        &self,
        path: &str,
        token: Option<(&str, &str)>,
        extra: &[(&str, &str)],
    ) -> Result<HashMap<String, String>, ApiError> {
        let url = self.endpoint(path)?;
        let header = Signer::new(&self.consumer, token).authorization_header("POST", &url, extra)?;

        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, header)
            .body("")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!("Token request to {} failed: {} - {}", path, status, body);
            return Err(ApiError::from_response(status.as_u16(), &body));
        }

        Ok(parse_token_response(&body))
    }

    /// Authorize page for a request token
    pub fn authorize_url(&self, request_token: &str) -> String {
        format!(
            "{}{}?oauth_token={}",
            self.api_base,
            AUTHORIZE_PATH,
            urlencoding::encode(request_token)
        )
    }
}

#[async_trait]
impl Authorizer for TwitterOAuth {
    async fn request_authorization(&self) -> Result<PendingAuthorization, ApiError> {
        info!("Requesting OAuth request token");

        let fields = self
            .token_request(REQUEST_TOKEN_PATH, None, &[("oauth_callback", CALLBACK_OOB)])
            .await?;
        let (token, secret) = token_pair(&fields)?;

        let authorize_url = self.authorize_url(&token);
        debug!("Authorize URL: {}", authorize_url);

        Ok(PendingAuthorization {
            request_token: token,
            request_secret: secret,
            authorize_url,
        })
    }

    async fn exchange_verifier(
        &self,
        pending: &PendingAuthorization,
        verifier: &str,
    ) -> Result<AccessTokens, ApiError> {
        info!("Exchanging verifier for access token");

        let fields = self
            .token_request(
                ACCESS_TOKEN_PATH,
                Some((
                    pending.request_token.as_str(),
                    pending.request_secret.as_str(),
                )),
                &[("oauth_verifier", verifier)],
            )
            .await?;
        let (token, secret) = token_pair(&fields)?;

        if let Some(name) = fields.get("screen_name") {
            info!("Access token issued for @{}", name);
        }
        Ok(AccessTokens::new(token, secret))
    }

    fn connect(&self, tokens: AccessTokens) -> Box<dyn PlatformApi> {
        Box::new(TwitterClient::new(
            self.consumer.clone(),
            tokens,
            self.api_base.clone(),
        ))
    }
}

fn parse_token_response(body: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(body.trim().as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn token_pair(fields: &HashMap<String, String>) -> Result<(String, String), ApiError> {
    match (fields.get("oauth_token"), fields.get("oauth_token_secret")) {
        (Some(token), Some(secret)) if !token.is_empty() && !secret.is_empty() => {
            Ok((token.clone(), secret.clone()))
        }
        _ => Err(ApiError::Decode(
            "token response is missing oauth_token / oauth_token_secret".into(),
        )),
    }
}
