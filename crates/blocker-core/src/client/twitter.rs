//! ============================================================================
//! Twitter Client - Blocks and Followers via Twitter API v1.1
//! ============================================================================
//! Every request is signed with OAuth 1.0a user context:
//! - List blocked IDs and follower IDs (cursor paginated)
//! - Create blocks
//! - Verify credentials for the logged-in screen name
//! ============================================================================

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, info, warn};
use url::Url;

use super::PlatformApi;
use crate::auth::Signer;
use crate::error::ApiError;
use crate::types::{AccessTokens, ConsumerKeys, UserId};

const VERIFY_CREDENTIALS_PATH: &str = "/1.1/account/verify_credentials.json";
const BLOCKS_IDS_PATH: &str = "/1.1/blocks/ids.json";
const FOLLOWERS_IDS_PATH: &str = "/1.1/followers/ids.json";
const BLOCKS_CREATE_PATH: &str = "/1.1/blocks/create.json";

/// Largest page the follower listing accepts
const FOLLOWERS_PAGE_SIZE: &str = "5000";

/// Cursor value that requests the first page
const FIRST_CURSOR: i64 = -1;

/// Authenticated client for one user
pub struct TwitterClient {
    client: reqwest::Client,
    consumer: ConsumerKeys,
    tokens: AccessTokens,
    api_base: String,
}

impl TwitterClient {
    pub fn new(consumer: ConsumerKeys, tokens: AccessTokens, api_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            consumer,
            tokens,
            api_base: api_base.into(),
        }
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&format!("{}{}", self.api_base, path))
            .map_err(|e| ApiError::Decode(format!("bad endpoint {}: {}", path, e)))?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn signer(&self) -> Signer<'_> {
        Signer::new(
            &self.consumer,
            Some((self.tokens.token.as_str(), self.tokens.secret.as_str())),
        )
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(path, params)?;
        let header = self.signer().authorization_header(method.as_str(), &url, &[])?;

        let mut request = self
            .client
            .request(method.clone(), url)
            .header(AUTHORIZATION, header);
        if method == reqwest::Method::POST {
            request = request.body("");
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = ApiError::from_response(status.as_u16(), &body);
            warn!("{} {} failed: {}", method, path, error);
            return Err(error);
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(format!("failed to parse {} response: {}", path, e)))
    }

    /// Walk a cursored ID listing until the platform reports the last page
    async fn collect_ids(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<UserId>, ApiError> {
        let mut ids = Vec::new();
        let mut cursor = FIRST_CURSOR;

        loop {
            let mut page_params = params.to_vec();
            page_params.push(("cursor", cursor.to_string()));

            let page: IdsPage = self.send(reqwest::Method::GET, path, &page_params).await?;
            debug!("{}: page with {} ids, next cursor {}", path, page.ids.len(), page.next_cursor);
            ids.extend(page.ids);

            if page.next_cursor == 0 {
                break;
            }
            cursor = page.next_cursor;
        }

        Ok(ids)
    }
}

#[async_trait]
impl PlatformApi for TwitterClient {
    async fn screen_name(&self) -> Result<String, ApiError> {
        let user: VerifiedUser = self
            .send(
                reqwest::Method::GET,
                VERIFY_CREDENTIALS_PATH,
                &[
                    ("skip_status", "true".into()),
                    ("include_entities", "false".into()),
                ],
            )
            .await?;
        Ok(user.screen_name)
    }

    async fn list_blocked_ids(&self) -> Result<Vec<UserId>, ApiError> {
        let ids = self.collect_ids(BLOCKS_IDS_PATH, &[]).await?;
        info!("Fetched {} blocked ids", ids.len());
        Ok(ids)
    }

    async fn list_follower_ids(&self, screen_name: &str) -> Result<Vec<UserId>, ApiError> {
        let ids = self
            .collect_ids(
                FOLLOWERS_IDS_PATH,
                &[
                    ("screen_name", screen_name.to_string()),
                    ("count", FOLLOWERS_PAGE_SIZE.to_string()),
                ],
            )
            .await?;
        info!("Fetched {} follower ids of @{}", ids.len(), screen_name);
        Ok(ids)
    }

    async fn block(&self, user_id: UserId) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .send(
                reqwest::Method::POST,
                BLOCKS_CREATE_PATH,
                &[
                    ("user_id", user_id.to_string()),
                    ("skip_status", "true".into()),
                ],
            )
            .await?;
        debug!("Blocked {}", user_id);
        Ok(())
    }
}

// ============================================================================
// Twitter API Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct IdsPage {
    ids: Vec<UserId>,
    #[serde(default)]
    next_cursor: i64,
}

#[derive(Debug, Deserialize)]
struct VerifiedUser {
    screen_name: String,
}
