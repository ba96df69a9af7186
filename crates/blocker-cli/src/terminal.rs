// ============================================================================
// TerminalOperator: stdin/stdout implementation of the Operator trait
// ============================================================================

use std::io::{self, BufRead, Write};

use blocker_core::progress::Progress;
use blocker_core::{Notice, Operator};

pub struct TerminalOperator {
    /// A `\r` progress line is on screen and needs a newline before other output
    progress_open: bool,
}

impl TerminalOperator {
    pub fn new() -> Self {
        Self {
            progress_open: false,
        }
    }

    fn close_progress(&mut self) {
        if self.progress_open {
            println!();
            self.progress_open = false;
        }
    }
}

fn progress_line(p: &Progress) -> String {
    format!("{:5.1}% of {} users blocked", p.percent(), p.total)
}

impl Operator for TerminalOperator {
    fn ask(&mut self, prompt: &str) -> io::Result<String> {
        self.close_progress();
        print!("{} ", prompt);
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().lock().read_line(&mut input)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stdin closed while waiting for an answer",
            ));
        }
        Ok(input.trim().to_string())
    }

    fn open_url(&mut self, url: &str) -> bool {
        open::that(url).is_ok()
    }

    fn notify(&mut self, notice: Notice) {
        if let Notice::Progress(p) = notice {
            print!("\r{}", progress_line(&p));
            let _ = io::stdout().flush();
            self.progress_open = true;
            return;
        }

        self.close_progress();
        match notice {
            Notice::AuthorizeAt(url) => println!(
                "If it doesn't open automatically, please go here and get the auth code: {}",
                url
            ),
            Notice::AlreadyBlocked { count } => {
                println!("You were already blocking {} of them! Nice!", count)
            }
            Notice::NothingToBlock { target } => {
                println!("You already block every follower of @{}.", target)
            }
            Notice::NoFollowers { target } => println!("@{} has no followers.", target),
            Notice::RateLimited { resume_at } => println!(
                "\n[{}] Rate limiting detected. Waiting until {} before resuming...\n",
                chrono::Local::now().format("%H:%M"),
                resume_at.format("%H:%M")
            ),
            Notice::BlockFailed { user_id, error } => {
                println!("\nError blocking {}.\n\tError: {}\n", user_id, error)
            }
            Notice::AccountLocked { user_id } => println!(
                "WARNING: the account may have been locked while blocking {}. \
                 Log in on the website to unlock it. Exiting.",
                user_id
            ),
            Notice::BatchComplete { blocked, skipped } => {
                println!("Done: {} blocked, {} skipped.", blocked, skipped)
            }
            Notice::Progress(_) => {}
        }
    }
}
