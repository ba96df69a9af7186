//! ============================================================================
//! Block Executor - Resolve, Confirm, Block, Repeat
//! ============================================================================
//! One loop iteration per target account:
//! 1. ask for the target's screen name
//! 2. followers minus already-blocked IDs, in listing order
//! 3. confirm the batch size with the operator
//! 4. block each ID, waiting out rate limits and stopping on account lock
//! 5. ask whether to go again
//! ============================================================================

use std::collections::HashSet;
use tracing::{debug, error, info, warn};

use crate::bootstrap::Authenticated;
use crate::client::PlatformApi;
use crate::error::{BlockerError, Result};
use crate::operator::{Notice, Operator};
use crate::progress::ProgressTracker;
use crate::retry::{failure_action, FailureAction, RateLimitPolicy};
use crate::types::{BatchReport, BlockBatch, SessionExit, UserId};

/// Everything the block loop needs, passed explicitly
pub struct Session {
    api: Box<dyn PlatformApi>,
    screen_name: String,
    policy: RateLimitPolicy,
}

impl Session {
    pub fn new(auth: Authenticated, policy: RateLimitPolicy) -> Self {
        Self {
            api: auth.api,
            screen_name: auth.screen_name,
            policy,
        }
    }

    /// Screen name the session acts as
    pub fn screen_name(&self) -> &str {
        &self.screen_name
    }

    pub fn api(&self) -> &dyn PlatformApi {
        self.api.as_ref()
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }
}

/// How a batch run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    Completed(BatchReport),
    /// Platform locked the account on `user_id`; `remaining` IDs never tried
    Locked {
        user_id: UserId,
        remaining: usize,
        report: BatchReport,
    },
}

/// Strip whitespace and a leading `@`; `None` when nothing is left
pub fn normalize_screen_name(input: &str) -> Option<String> {
    let name = input.trim().trim_start_matches('@').trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Followers minus blocked IDs, keeping follower order and dropping repeats
pub fn compute_batch(target: &str, followers: &[UserId], blocked: &[UserId]) -> BlockBatch {
    let blocked: HashSet<UserId> = blocked.iter().copied().collect();
    let mut seen = HashSet::with_capacity(followers.len());
    let mut ids = Vec::with_capacity(followers.len());
    let mut already_blocked = 0;

    for &id in followers {
        if !seen.insert(id) {
            continue;
        }
        if blocked.contains(&id) {
            already_blocked += 1;
        } else {
            ids.push(id);
        }
    }

    BlockBatch {
        target: target.to_string(),
        ids,
        already_blocked,
    }
}

/// Fetch both ID sets and compute the batch for `target`
pub async fn resolve_batch(
    session: &Session,
    target: &str,
    operator: &mut dyn Operator,
) -> Result<BlockBatch> {
    let api = session.api();
    let policy = session.policy();

    let blocked = policy
        .retry_rate_limited(
            move || api.list_blocked_ids(),
            |resume_at| operator.notify(Notice::RateLimited { resume_at }),
        )
        .await
        .map_err(BlockerError::BlockList)?;

    let followers = policy
        .retry_rate_limited(
            move || api.list_follower_ids(target),
            |resume_at| operator.notify(Notice::RateLimited { resume_at }),
        )
        .await
        .map_err(|source| {
            error!("Follower lookup for @{} failed: {}", target, source);
            BlockerError::Lookup {
                screen_name: target.to_string(),
                source,
            }
        })?;

    let batch = compute_batch(target, &followers, &blocked);
    info!(
        "@{}: {} followers, {} already blocked, {} to block",
        target,
        followers.len(),
        batch.already_blocked,
        batch.len()
    );
    if batch.already_blocked > 0 {
        operator.notify(Notice::AlreadyBlocked {
            count: batch.already_blocked,
        });
    }
    Ok(batch)
}

/// Block every ID in order. Rate limits retry the same ID after the wait,
/// an account lock stops at once, any other failure skips the ID.
pub async fn execute_batch(
    session: &Session,
    batch: &BlockBatch,
    operator: &mut dyn Operator,
) -> BatchOutcome {
    let api = session.api();
    let policy = session.policy();
    let mut report = BatchReport::default();
    let mut progress = ProgressTracker::new(batch.len());

    for (index, &user_id) in batch.ids.iter().enumerate() {
        loop {
            match api.block(user_id).await {
                Ok(()) => {
                    report.blocked.push(user_id);
                    break;
                }
                Err(e) => match failure_action(&e) {
                    FailureAction::WaitAndRetry => {
                        report.rate_limit_waits += 1;
                        operator.notify(Notice::RateLimited {
                            resume_at: policy.resume_at(chrono::Local::now()),
                        });
                        policy.wait().await;
                        debug!("Retrying block of {}", user_id);
                    }
                    FailureAction::Halt => {
                        let remaining = batch.len() - index - 1;
                        error!(
                            "Account locked while blocking {}: {} ({} left unprocessed)",
                            user_id, e, remaining
                        );
                        operator.notify(Notice::AccountLocked { user_id });
                        return BatchOutcome::Locked {
                            user_id,
                            remaining,
                            report,
                        };
                    }
                    FailureAction::Skip => {
                        warn!("Error blocking {}: {}", user_id, e);
                        operator.notify(Notice::BlockFailed {
                            user_id,
                            error: e.to_string(),
                        });
                        report.skipped.push((user_id, e.to_string()));
                        break;
                    }
                },
            }
        }

        if let Some(p) = progress.advance() {
            operator.notify(Notice::Progress(p));
        }
    }

    info!(
        "Batch for @{} done: {} blocked, {} skipped, {} rate-limit waits",
        batch.target,
        report.blocked.len(),
        report.skipped.len(),
        report.rate_limit_waits
    );
    operator.notify(Notice::BatchComplete {
        blocked: report.blocked.len(),
        skipped: report.skipped.len(),
    });
    BatchOutcome::Completed(report)
}

fn ask_target(operator: &mut dyn Operator) -> Result<String> {
    loop {
        let answer = operator.ask(
            "Enter screen name of user to block all followers of that user. Do not include @:",
        )?;
        if let Some(name) = normalize_screen_name(&answer) {
            return Ok(name);
        }
    }
}

/// Outer loop: one batch per target until the operator stops or the
/// platform locks the account
pub async fn run_session(session: &Session, operator: &mut dyn Operator) -> Result<SessionExit> {
    info!("Starting block session as @{}", session.screen_name());

    loop {
        let target = ask_target(operator)?;
        let batch = resolve_batch(session, &target, operator).await?;

        if batch.is_empty() && batch.already_blocked == 0 {
            operator.notify(Notice::NoFollowers { target });
        } else if batch.is_empty() {
            operator.notify(Notice::NothingToBlock { target });
        } else {
            if !operator.confirm(&format!("Proceed to block {} users?", batch.len()))? {
                info!("Operator declined batch for @{}", batch.target);
                return Ok(SessionExit::Declined);
            }

            if let BatchOutcome::Locked {
                user_id, remaining, ..
            } = execute_batch(session, &batch, operator).await
            {
                return Ok(SessionExit::AccountLocked { user_id, remaining });
            }
        }

        if !operator.confirm("Block another batch?")? {
            return Ok(SessionExit::Finished);
        }
    }
}
