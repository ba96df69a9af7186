//! ============================================================================
//! Operator - The Human at the Terminal
//! ============================================================================
//! Bootstrapper and executor ask questions and report events through this
//! trait, so the whole interactive flow runs against a script in tests.
//! ============================================================================

use chrono::{DateTime, Local};
use std::io;

use crate::progress::Progress;
use crate::types::UserId;

/// Something the operator should be told about
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// Visit this page to authorize the application
    AuthorizeAt(String),
    /// Some followers are already blocked and were left out of the batch
    AlreadyBlocked { count: usize },
    /// Every follower of `target` is already blocked
    NothingToBlock { target: String },
    /// `target` has no followers at all
    NoFollowers { target: String },
    Progress(Progress),
    RateLimited { resume_at: DateTime<Local> },
    BlockFailed { user_id: UserId, error: String },
    AccountLocked { user_id: UserId },
    BatchComplete { blocked: usize, skipped: usize },
}

pub trait Operator {
    /// Free-form answer, trimmed
    fn ask(&mut self, prompt: &str) -> io::Result<String>;

    /// Yes/no question; only an explicit "n"/"no" declines
    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        let answer = self.ask(&format!("{} Y/N:", prompt))?;
        Ok(!is_decline(&answer))
    }

    /// Try to open a URL in the browser; false if that failed
    fn open_url(&mut self, url: &str) -> bool;

    fn notify(&mut self, notice: Notice);
}

pub fn is_decline(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "n" | "no")
}
