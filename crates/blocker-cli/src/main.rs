// ============================================================================
// block-followers: block every follower of a named account
// ============================================================================
// Usage:
//   block-followers                        Interactive session (keys in ./keys)
//   block-followers --keys PATH            Use another consumer key file
//   block-followers --tokens PATH          Use another access token file
//   block-followers --rate-limit-wait 60   Wait 60s instead of 15m on rate limits
//
// Exit status: 0 finished or declined, 1 account locked, 2 any other error.
// ============================================================================

mod terminal;

use anyhow::Result;
use blocker_core::{
    bootstrap, run_session, Bootstrap, BlockerConfig, RateLimitPolicy, SecretStore, Session,
    SessionExit, TwitterOAuth,
};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use terminal::TerminalOperator;

const EXIT_FATAL: u8 = 2;

/// Block every follower of an account, skipping those already blocked
#[derive(Parser)]
#[command(name = "block-followers", version, about = "Block all followers of an account")]
struct Cli {
    /// Consumer key file (default: ./keys, or BLOCKER_KEYS_PATH)
    #[arg(long)]
    keys: Option<PathBuf>,

    /// Access token file (default: ./tokens.pkl, or BLOCKER_TOKENS_PATH)
    #[arg(long)]
    tokens: Option<PathBuf>,

    /// Seconds to wait after a rate-limit response (default: 900)
    #[arg(long, value_name = "SECS")]
    rate_limit_wait: Option<u64>,

    /// Debug logging on stderr (info by default)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> BlockerConfig {
        let mut config = BlockerConfig::default();
        if let Some(path) = &self.keys {
            config.keys_path = path.clone();
        }
        if let Some(path) = &self.tokens {
            config.tokens_path = path.clone();
        }
        if let Some(secs) = self.rate_limit_wait {
            config.rate_limit_wait = Duration::from_secs(secs);
        }
        config
    }
}

/// Filter used when `RUST_LOG` is not set
fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "blocker_core=debug,block_followers=debug"
    } else {
        "blocker_core=info,block_followers=info"
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let dotenv = dotenvy::dotenv();
    init_tracing(cli.verbose);
    if let Err(e) = dotenv {
        debug!("No .env loaded: {}", e);
    }

    match run(&cli).await {
        Ok(exit) => {
            info!("Session ended: {:?}", exit);
            ExitCode::from(exit.exit_code())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

async fn run(cli: &Cli) -> Result<SessionExit> {
    let config = cli.config();
    let store = SecretStore::new(&config.keys_path, &config.tokens_path);
    let mut operator = TerminalOperator::new();

    let api_base = config.api_base.clone();
    let outcome = bootstrap(
        &store,
        config.env_consumer_keys.clone(),
        &mut operator,
        |keys| TwitterOAuth::new(keys, api_base),
    )
    .await?;

    let auth = match outcome {
        Bootstrap::Ready(auth) => auth,
        Bootstrap::Declined => return Ok(SessionExit::Declined),
    };

    let session = Session::new(auth, RateLimitPolicy::new(config.rate_limit_wait));
    Ok(run_session(&session, &mut operator).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "block-followers",
            "--keys",
            "/tmp/k",
            "--tokens",
            "/tmp/t",
            "--rate-limit-wait",
            "60",
        ]);
        let config = cli.config();
        assert_eq!(config.keys_path, PathBuf::from("/tmp/k"));
        assert_eq!(config.tokens_path, PathBuf::from("/tmp/t"));
        assert_eq!(config.rate_limit_wait, Duration::from_secs(60));
    }

    #[test]
    fn test_log_directives_follow_verbosity() {
        assert_eq!(default_directives(false), "blocker_core=info,block_followers=info");
        assert_eq!(default_directives(true), "blocker_core=debug,block_followers=debug");
        assert!(default_directives(false).parse::<EnvFilter>().is_ok());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
