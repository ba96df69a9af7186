//! ============================================================================
//! Session Bootstrapper
//! ============================================================================
//! Loads or asks for the consumer keys, loads or negotiates the user's access
//! token, then confirms the logged-in identity with the operator.
//! A failed verifier exchange aborts without storing anything.
//! ============================================================================

use tracing::{info, warn};

use crate::auth::Authorizer;
use crate::client::PlatformApi;
use crate::error::{ApiError, BlockerError, Result};
use crate::operator::{Notice, Operator};
use crate::store::SecretStore;
use crate::types::{AccessTokens, ConsumerKeys};

/// An API handle together with the identity it acts as
pub struct Authenticated {
    pub api: Box<dyn PlatformApi>,
    pub screen_name: String,
}

pub enum Bootstrap {
    Ready(Authenticated),
    /// Operator did not want to continue as the logged-in user
    Declined,
}

/// Stored keys win over environment keys; prompted keys are persisted
pub fn resolve_consumer_keys(
    store: &SecretStore,
    env_keys: Option<ConsumerKeys>,
    operator: &mut dyn Operator,
) -> Result<ConsumerKeys> {
    if let Some(keys) = store.load_keys()? {
        return Ok(keys);
    }
    if let Some(keys) = env_keys {
        info!("Using consumer keys from the environment");
        return Ok(keys);
    }

    let key = ask_non_empty(operator, "Consumer key:")?;
    let secret = ask_non_empty(operator, "Consumer secret:")?;
    let keys = ConsumerKeys::new(key, secret);
    store.save_keys(&keys)?;
    Ok(keys)
}

fn ask_non_empty(operator: &mut dyn Operator, prompt: &str) -> Result<String> {
    loop {
        let answer = operator.ask(prompt)?;
        if !answer.is_empty() {
            return Ok(answer);
        }
    }
}

/// PIN-based handshake; stores the token only after a successful exchange
async fn negotiate_tokens<A: Authorizer + ?Sized>(
    authorizer: &A,
    store: &SecretStore,
    operator: &mut dyn Operator,
) -> Result<AccessTokens> {
    let pending = authorizer
        .request_authorization()
        .await
        .map_err(BlockerError::AuthRequest)?;

    if !operator.open_url(&pending.authorize_url) {
        warn!("Could not open a browser for {}", pending.authorize_url);
    }
    operator.notify(Notice::AuthorizeAt(pending.authorize_url.clone()));

    let verifier = operator.ask("Verifier:")?;
    let tokens = authorizer
        .exchange_verifier(&pending, &verifier)
        .await
        .map_err(BlockerError::Verification)?;

    store.save_tokens(&tokens)?;
    Ok(tokens)
}

pub async fn bootstrap<A, F>(
    store: &SecretStore,
    env_keys: Option<ConsumerKeys>,
    operator: &mut dyn Operator,
    make_authorizer: F,
) -> Result<Bootstrap>
where
    A: Authorizer,
    F: FnOnce(ConsumerKeys) -> A,
{
    let keys = resolve_consumer_keys(store, env_keys, operator)?;
    let authorizer = make_authorizer(keys);

    let (tokens, stored) = match store.load_tokens()? {
        Some(tokens) => (tokens, true),
        None => (negotiate_tokens(&authorizer, store, operator).await?, false),
    };

    let api = authorizer.connect(tokens);
    let screen_name = match api.screen_name().await {
        Ok(name) => name,
        Err(e @ ApiError::Unauthorized(_)) if stored => {
            // revoked or expired token: forget it so the next run re-authorizes
            warn!("Stored access token was rejected, removing it");
            store.delete_tokens()?;
            return Err(BlockerError::Identity(e));
        }
        Err(e) => return Err(BlockerError::Identity(e)),
    };

    if !operator.confirm(&format!("Logged in as: {}. Continue?", screen_name))? {
        store.delete_tokens()?;
        info!("Operator declined to continue as @{}", screen_name);
        return Ok(Bootstrap::Declined);
    }

    info!("Authenticated as @{}", screen_name);
    Ok(Bootstrap::Ready(Authenticated { api, screen_name }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::PendingAuthorization;
    use crate::client::mock::{Failure, MockPlatform};
    use crate::operator::scripted::ScriptedOperator;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeAuthorizer {
        reject_request: bool,
        reject_verifier: bool,
        identity_failure: Option<Failure>,
        requests: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Authorizer for FakeAuthorizer {
        async fn request_authorization(&self) -> Result<PendingAuthorization, ApiError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            if self.reject_request {
                return Err(ApiError::Unauthorized("Invalid consumer key".into()));
            }
            Ok(PendingAuthorization {
                request_token: "rt".into(),
                request_secret: "rs".into(),
                authorize_url: "https://example.test/oauth/authorize?oauth_token=rt".into(),
            })
        }

        async fn exchange_verifier(
            &self,
            pending: &PendingAuthorization,
            verifier: &str,
        ) -> Result<AccessTokens, ApiError> {
            assert_eq!(pending.request_token, "rt");
            if self.reject_verifier {
                return Err(ApiError::Unauthorized("Invalid oauth_verifier".into()));
            }
            Ok(AccessTokens::new(format!("at-{}", verifier), "as"))
        }

        fn connect(&self, _tokens: AccessTokens) -> Box<dyn PlatformApi> {
            let failures: Vec<Failure> = self.identity_failure.iter().cloned().collect();
            Box::new(MockPlatform::new("operator").fail_screen_name(&failures))
        }
    }

    fn store_in(dir: &tempfile::TempDir) -> SecretStore {
        SecretStore::new(dir.path().join("keys"), dir.path().join("tokens"))
    }

    #[tokio::test]
    async fn test_first_run_prompts_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut operator = ScriptedOperator::new(&["ck", "cs", "1234567", "y"]);

        let outcome = bootstrap(&store, None, &mut operator, |keys| {
            assert_eq!(keys, ConsumerKeys::new("ck", "cs"));
            FakeAuthorizer::default()
        })
        .await
        .unwrap();

        match outcome {
            Bootstrap::Ready(auth) => assert_eq!(auth.screen_name, "operator"),
            Bootstrap::Declined => panic!("expected ready"),
        }
        assert_eq!(store.load_keys().unwrap(), Some(ConsumerKeys::new("ck", "cs")));
        assert_eq!(
            store.load_tokens().unwrap(),
            Some(AccessTokens::new("at-1234567", "as"))
        );
        assert_eq!(
            operator.opened,
            vec!["https://example.test/oauth/authorize?oauth_token=rt"]
        );
        assert!(operator
            .prompts
            .contains(&"Logged in as: operator. Continue? Y/N:".to_string()));
    }

    #[tokio::test]
    async fn test_stored_credentials_skip_handshake() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save_keys(&ConsumerKeys::new("ck", "cs")).unwrap();
        store.save_tokens(&AccessTokens::new("at", "as")).unwrap();
        let mut operator = ScriptedOperator::new(&["y"]);

        let requests = Arc::new(AtomicUsize::new(0));
        let outcome = bootstrap(&store, None, &mut operator, |_| FakeAuthorizer {
            requests: Arc::clone(&requests),
            ..FakeAuthorizer::default()
        })
        .await
        .unwrap();

        assert!(matches!(outcome, Bootstrap::Ready(_)));
        assert_eq!(operator.prompts.len(), 1);
        assert!(operator.opened.is_empty());
        assert_eq!(requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_env_keys_are_used_without_prompting() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save_tokens(&AccessTokens::new("at", "as")).unwrap();
        let mut operator = ScriptedOperator::new(&["y"]);

        bootstrap(
            &store,
            Some(ConsumerKeys::new("env-key", "env-secret")),
            &mut operator,
            |keys| {
                assert_eq!(keys.key, "env-key");
                FakeAuthorizer::default()
            },
        )
        .await
        .unwrap();

        // environment keys are not written to disk
        assert!(store.load_keys().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_request_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save_keys(&ConsumerKeys::new("ck", "cs")).unwrap();
        let mut operator = ScriptedOperator::new(&[]);

        let result = bootstrap(&store, None, &mut operator, |_| FakeAuthorizer {
            reject_request: true,
            ..FakeAuthorizer::default()
        })
        .await;

        assert!(matches!(result, Err(BlockerError::AuthRequest(_))));
        assert!(operator.opened.is_empty());
    }

    #[tokio::test]
    async fn test_verification_failure_fails_closed() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save_keys(&ConsumerKeys::new("ck", "cs")).unwrap();
        let mut operator = ScriptedOperator::new(&["wrong-pin", "y"]);

        let result = bootstrap(&store, None, &mut operator, |_| FakeAuthorizer {
            reject_verifier: true,
            ..FakeAuthorizer::default()
        })
        .await;

        assert!(matches!(result, Err(BlockerError::Verification(_))));
        assert!(store.load_tokens().unwrap().is_none());
        // never got as far as the identity question
        assert_eq!(operator.unanswered(), 1);
    }

    #[tokio::test]
    async fn test_declining_identity_removes_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save_keys(&ConsumerKeys::new("ck", "cs")).unwrap();
        store.save_tokens(&AccessTokens::new("at", "as")).unwrap();
        let mut operator = ScriptedOperator::new(&["N"]);

        let outcome = bootstrap(&store, None, &mut operator, |_| FakeAuthorizer::default())
            .await
            .unwrap();

        assert!(matches!(outcome, Bootstrap::Declined));
        assert!(store.load_tokens().unwrap().is_none());
        assert!(store.load_keys().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rejected_stored_token_is_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save_keys(&ConsumerKeys::new("ck", "cs")).unwrap();
        store.save_tokens(&AccessTokens::new("revoked", "as")).unwrap();
        let mut operator = ScriptedOperator::new(&[]);

        let result = bootstrap(&store, None, &mut operator, |_| FakeAuthorizer {
            identity_failure: Some(Failure::Unauthorized),
            ..FakeAuthorizer::default()
        })
        .await;

        assert!(matches!(
            result,
            Err(BlockerError::Identity(ApiError::Unauthorized(_)))
        ));
        assert!(!store.tokens_path().exists());
        assert!(store.load_keys().unwrap().is_some());
        assert!(operator.prompts.is_empty());
    }

    #[tokio::test]
    async fn test_transient_identity_failure_keeps_stored_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save_keys(&ConsumerKeys::new("ck", "cs")).unwrap();
        store.save_tokens(&AccessTokens::new("at", "as")).unwrap();
        let mut operator = ScriptedOperator::new(&[]);

        let result = bootstrap(&store, None, &mut operator, |_| FakeAuthorizer {
            identity_failure: Some(Failure::Other("over capacity")),
            ..FakeAuthorizer::default()
        })
        .await;

        assert!(matches!(result, Err(BlockerError::Identity(ApiError::Other { .. }))));
        assert_eq!(
            store.load_tokens().unwrap(),
            Some(AccessTokens::new("at", "as"))
        );
    }

    #[tokio::test]
    async fn test_blank_consumer_key_is_asked_again() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut operator = ScriptedOperator::new(&["", "ck", "cs"]);

        let keys = resolve_consumer_keys(&store, None, &mut operator).unwrap();
        assert_eq!(keys, ConsumerKeys::new("ck", "cs"));
        assert_eq!(
            operator.prompts,
            vec!["Consumer key:", "Consumer key:", "Consumer secret:"]
        );
    }
}
