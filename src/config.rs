//! Runner Configuration
//!
//! Explicit configuration structures for the batch runner, the solver client
//! and the mailbox watcher. There are no process-wide singletons: a config is
//! built once (env-driven defaults, overridable from the CLI) and threaded
//! down through the runner context.

use serde::{Deserialize, Serialize};

/// Configuration for the registration batch runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Form page to drive
    pub target_url: String,
    /// Substring the post-submission location must contain
    pub success_marker: String,
    /// Concurrent attempts per group
    pub concurrency: usize,
    /// Timeout for navigation and post-submission waits
    pub navigation_timeout_ms: u64,
    /// CSV file successful records are appended to
    pub output_file: String,
    /// Email list file (generated fallback when absent)
    pub email_list_file: String,
    /// Directory failure snapshots are written to
    pub snapshot_dir: String,
    /// Solver client configuration
    pub solver: SolverConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            target_url: std::env::var("TARGET_URL")
                .unwrap_or_else(|_| "https://www.google.com/recaptcha/api2/demo".to_string()),
            success_marker: std::env::var("SUCCESS_MARKER")
                .unwrap_or_else(|_| "recaptcha-demo-results".to_string()),
            concurrency: 3,
            navigation_timeout_ms: 30_000,
            output_file: "demo_output.csv".to_string(),
            email_list_file: "demo_create_list.csv".to_string(),
            snapshot_dir: ".".to_string(),
            solver: SolverConfig::default(),
        }
    }
}

impl RunnerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.concurrency == 0 {
            anyhow::bail!("concurrency must be positive");
        }
        if self.solver.max_poll_attempts == 0 {
            anyhow::bail!("max_poll_attempts must be positive");
        }
        Ok(())
    }
}

/// Configuration for the external challenge-solver service.
///
/// A missing `api_key` is not an error: it switches the client into the
/// offline degraded mode that produces a synthetic token without any
/// network call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    pub request_timeout_secs: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            api_base: std::env::var("SOLVER_API_BASE")
                .unwrap_or_else(|_| "http://2captcha.com".to_string()),
            api_key: std::env::var("SOLVER_API_KEY").ok().filter(|k| !k.is_empty()),
            poll_interval_ms: 5_000,
            max_poll_attempts: 24,
            request_timeout_secs: 30,
        }
    }
}

/// Configuration for the mailbox-confirmation watcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailboxConfig {
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: String,
    /// Subject line identifying confirmation messages
    pub subject: String,
    pub poll_interval_secs: u64,
    pub navigation_timeout_ms: u64,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            user: std::env::var("IMAP_USER").ok().filter(|v| !v.is_empty()),
            password: std::env::var("IMAP_PASSWORD").ok().filter(|v| !v.is_empty()),
            host: std::env::var("IMAP_HOST").unwrap_or_else(|_| "imap.gmail.com".to_string()),
            subject: std::env::var("MAIL_SUBJECT")
                .unwrap_or_else(|_| "Demo system confirmation".to_string()),
            poll_interval_secs: 300,
            navigation_timeout_ms: 30_000,
        }
    }
}

impl MailboxConfig {
    /// Credentials present; a pass that finds none is skipped, not failed.
    pub fn is_configured(&self) -> bool {
        self.user.is_some() && self.password.is_some()
    }
}
