//! ============================================================================
//! Error Types
//! ============================================================================
//! `ApiError` is the structured classification produced by the platform
//! client. `BlockerError` covers the fatal conditions that end a run.
//! ============================================================================

use serde::Deserialize;
use thiserror::Error;

/// Classified failure of a single platform API call
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("rate limit exceeded")]
    RateLimited,

    #[error("account locked: {0}")]
    AccountLocked(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("not authorized: {0}")]
    Unauthorized(String),

    #[error("platform error {status}: {message}")]
    Other { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Platform error codes with a dedicated meaning
const CODE_RATE_LIMITED: u32 = 88;
const CODE_ACCOUNT_LOCKED: u32 = 326;
const CODE_PAGE_NOT_FOUND: u32 = 34;
const CODE_USER_NOT_FOUND: u32 = 50;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    #[serde(default)]
    code: u32,
    #[serde(default)]
    message: String,
}

impl ApiError {
    /// Classify a non-success response by HTTP status and platform error code
    pub fn from_response(status: u16, body: &str) -> Self {
        let entries = serde_json::from_str::<ErrorBody>(body)
            .map(|b| b.errors)
            .unwrap_or_default();
        let has_code = |code: u32| entries.iter().any(|e| e.code == code);
        let message = entries
            .first()
            .map(|e| e.message.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| body.trim().to_string());

        if status == 429 || has_code(CODE_RATE_LIMITED) {
            ApiError::RateLimited
        } else if has_code(CODE_ACCOUNT_LOCKED) || (status == 403 && mentions_lock(&message)) {
            ApiError::AccountLocked(message)
        } else if status == 404 || has_code(CODE_PAGE_NOT_FOUND) || has_code(CODE_USER_NOT_FOUND) {
            ApiError::NotFound(message)
        } else if status == 401 {
            ApiError::Unauthorized(message)
        } else {
            ApiError::Other { status, message }
        }
    }
}

/// Some lock responses arrive as a bare 403 without code 326. Matches the
/// word "locked" (so "blocked" does not count) unless preceded by "not".
fn mentions_lock(message: &str) -> bool {
    let words: Vec<String> = message
        .split(|c: char| !c.is_ascii_alphabetic())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_ascii_lowercase())
        .collect();
    words
        .iter()
        .enumerate()
        .any(|(i, w)| w == "locked" && (i == 0 || words[i - 1] != "not"))
}

/// Fatal conditions that stop the session
#[derive(Debug, Error)]
pub enum BlockerError {
    #[error("failed to get request token: {0}")]
    AuthRequest(#[source] ApiError),

    #[error("verification failed: {0}")]
    Verification(#[source] ApiError),

    #[error("could not fetch the authenticated user: {0}")]
    Identity(#[source] ApiError),

    #[error("could not fetch followers of @{screen_name}: {source}")]
    Lookup {
        screen_name: String,
        #[source]
        source: ApiError,
    },

    #[error("could not fetch your block list: {0}")]
    BlockList(#[source] ApiError),

    #[error("prompt failed: {0}")]
    Prompt(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type Result<T, E = BlockerError> = std::result::Result<T, E>;
