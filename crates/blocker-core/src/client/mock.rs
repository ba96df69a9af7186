//! In-memory `PlatformApi` with scripted failures, plus a canned HTTP
//! server for exercising the real client. Tests only.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use super::PlatformApi;
use crate::error::ApiError;
use crate::types::UserId;

/// Failure to hand out on a future call
#[derive(Debug, Clone)]
pub(crate) enum Failure {
    RateLimited,
    Locked,
    NotFound,
    Unauthorized,
    Other(&'static str),
}

impl Failure {
    fn into_error(self) -> ApiError {
        match self {
            Failure::RateLimited => ApiError::RateLimited,
            Failure::Locked => ApiError::AccountLocked("account is temporarily locked".into()),
            Failure::NotFound => ApiError::NotFound("User not found.".into()),
            Failure::Unauthorized => ApiError::Unauthorized("Invalid or expired token.".into()),
            Failure::Other(msg) => ApiError::Other {
                status: 403,
                message: msg.to_string(),
            },
        }
    }
}

#[derive(Default)]
struct State {
    blocked: Vec<UserId>,
    block_attempts: Vec<UserId>,
    block_failures: HashMap<UserId, VecDeque<Failure>>,
    follower_failures: VecDeque<Failure>,
    blocks_list_failures: VecDeque<Failure>,
    follower_lookups: Vec<String>,
    identity_failures: VecDeque<Failure>,
}

pub(crate) struct MockPlatform {
    screen_name: String,
    followers: HashMap<String, Vec<UserId>>,
    state: Mutex<State>,
}

impl MockPlatform {
    pub(crate) fn new(screen_name: &str) -> Self {
        Self {
            screen_name: screen_name.to_string(),
            followers: HashMap::new(),
            state: Mutex::new(State::default()),
        }
    }

    pub(crate) fn with_followers(mut self, target: &str, ids: &[UserId]) -> Self {
        self.followers.insert(target.to_string(), ids.to_vec());
        self
    }

    pub(crate) fn with_blocked(self, ids: &[UserId]) -> Self {
        self.state.lock().unwrap().blocked = ids.to_vec();
        self
    }

    /// Queue failures for successive block attempts on `user_id`
    pub(crate) fn fail_block(self, user_id: UserId, failures: &[Failure]) -> Self {
        self.state
            .lock()
            .unwrap()
            .block_failures
            .entry(user_id)
            .or_default()
            .extend(failures.iter().cloned());
        self
    }

    pub(crate) fn fail_followers(self, failures: &[Failure]) -> Self {
        self.state
            .lock()
            .unwrap()
            .follower_failures
            .extend(failures.iter().cloned());
        self
    }

    pub(crate) fn fail_block_list(self, failures: &[Failure]) -> Self {
        self.state
            .lock()
            .unwrap()
            .blocks_list_failures
            .extend(failures.iter().cloned());
        self
    }

    pub(crate) fn fail_screen_name(self, failures: &[Failure]) -> Self {
        self.state
            .lock()
            .unwrap()
            .identity_failures
            .extend(failures.iter().cloned());
        self
    }

    pub(crate) fn block_attempts(&self) -> Vec<UserId> {
        self.state.lock().unwrap().block_attempts.clone()
    }

    pub(crate) fn blocked(&self) -> Vec<UserId> {
        self.state.lock().unwrap().blocked.clone()
    }

    pub(crate) fn follower_lookups(&self) -> Vec<String> {
        self.state.lock().unwrap().follower_lookups.clone()
    }
}

#[async_trait]
impl PlatformApi for MockPlatform {
    async fn screen_name(&self) -> Result<String, ApiError> {
        let failure = self.state.lock().unwrap().identity_failures.pop_front();
        if let Some(failure) = failure {
            return Err(failure.into_error());
        }
        Ok(self.screen_name.clone())
    }

    async fn list_blocked_ids(&self) -> Result<Vec<UserId>, ApiError> {
        let mut state = self.state.lock().unwrap();
        if let Some(failure) = state.blocks_list_failures.pop_front() {
            return Err(failure.into_error());
        }
        Ok(state.blocked.clone())
    }

    async fn list_follower_ids(&self, screen_name: &str) -> Result<Vec<UserId>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.follower_lookups.push(screen_name.to_string());
        if let Some(failure) = state.follower_failures.pop_front() {
            return Err(failure.into_error());
        }
        self.followers
            .get(screen_name)
            .cloned()
            .ok_or_else(|| Failure::NotFound.into_error())
    }

    async fn block(&self, user_id: UserId) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.block_attempts.push(user_id);
        let failure = state
            .block_failures
            .get_mut(&user_id)
            .and_then(|queue| queue.pop_front());
        if let Some(failure) = failure {
            return Err(failure.into_error());
        }
        if !state.blocked.contains(&user_id) {
            state.blocked.push(user_id);
        }
        Ok(())
    }
}

// ============================================================================
// Canned HTTP Server
// ============================================================================

/// Requests seen by `serve_canned`, raw head text in arrival order
pub(crate) type SeenRequests = Arc<Mutex<Vec<String>>>;

/// Answer one connection per `(status, body)` pair, in order, on a local
/// port. Returns the base URL to point a client at.
pub(crate) async fn serve_canned(responses: Vec<(u16, &'static str)>) -> (String, SeenRequests) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let seen = SeenRequests::default();
    let log = Arc::clone(&seen);

    tokio::spawn(async move {
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();

            let mut head = Vec::new();
            let mut chunk = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&chunk[..n]);
            }
            log.lock()
                .unwrap()
                .push(String::from_utf8_lossy(&head).into_owned());

            let response = format!(
                "HTTP/1.1 {} Canned\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        }
    });

    (base, seen)
}
