//! Mailbox-confirmation watcher
//!
//! The second workflow: on a fixed interval, search a mail store for unread
//! confirmation messages, pull the first link out of each body, and visit it
//! through an actuation session. The mail transport itself is an external
//! collaborator behind [`MailFetcher`]; a directory-drop implementation is
//! provided for offline use.

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::MailboxConfig;
use crate::session::ActuationAgent;

/// Searches the mail store for unread messages with the given subject and
/// returns their bodies. Implementations mark returned messages as seen.
#[async_trait]
pub trait MailFetcher: Send + Sync {
    async fn fetch_unread(&self, subject: &str) -> Result<Vec<String>>;

    /// Whether this transport needs the configured mailbox credentials.
    fn requires_credentials(&self) -> bool {
        true
    }
}

fn url_regex() -> &'static Regex {
    static URL_RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    URL_RE.get_or_init(|| Regex::new(r#"https?://[^\s"'<>]+"#).unwrap())
}

/// First link in a message body.
pub fn extract_url(body: &str) -> Option<String> {
    url_regex().find(body).map(|m| m.as_str().to_string())
}

pub struct MailboxWatcher {
    fetcher: Arc<dyn MailFetcher>,
    agent: Arc<dyn ActuationAgent>,
    config: MailboxConfig,
}

impl MailboxWatcher {
    pub fn new(
        fetcher: Arc<dyn MailFetcher>,
        agent: Arc<dyn ActuationAgent>,
        config: MailboxConfig,
    ) -> Self {
        Self {
            fetcher,
            agent,
            config,
        }
    }

    /// Immediate first pass, then one pass per interval. Runs until the
    /// process stops; every pass failure is logged and the loop continues.
    pub async fn run(&self) {
        let mut interval =
            tokio::time::interval(Duration::from_secs(self.config.poll_interval_secs));
        loop {
            interval.tick().await;
            match self.check_once().await {
                Ok(visited) if visited > 0 => {
                    info!("confirmation pass complete: {} links visited", visited)
                }
                Ok(_) => {}
                Err(e) => error!("confirmation pass failed: {:#}", e),
            }
        }
    }

    /// One search/extract/visit pass. Returns the number of links visited.
    pub async fn check_once(&self) -> Result<usize> {
        if self.fetcher.requires_credentials() && !self.config.is_configured() {
            info!("mailbox credentials not configured, skipping pass");
            return Ok(0);
        }

        let bodies = self.fetcher.fetch_unread(&self.config.subject).await?;
        if bodies.is_empty() {
            debug!("no unread confirmation mail for \"{}\"", self.config.subject);
            return Ok(0);
        }

        info!("found {} confirmation messages", bodies.len());
        let mut visited = 0;
        for body in bodies {
            match extract_url(&body) {
                Some(url) => {
                    if self.visit(&url).await {
                        visited += 1;
                    }
                }
                None => warn!("no link found in message body"),
            }
        }
        Ok(visited)
    }

    async fn visit(&self, url: &str) -> bool {
        let timeout = Duration::from_millis(self.config.navigation_timeout_ms);
        let mut session = match self.agent.new_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!("could not open session for {}: {}", url, e);
                return false;
            }
        };

        let ok = match session.navigate(url, timeout).await {
            Ok(()) => {
                info!("visited confirmation link {}", url);
                true
            }
            Err(e) => {
                warn!("failed to visit {}: {}", url, e);
                false
            }
        };

        if let Err(e) = session.close().await {
            warn!("failed to close session after {}: {}", url, e);
        }
        ok
    }
}

/// Offline mail transport: each file in the directory is one message
/// (optional `Subject:` header block, blank line, body). Matching messages
/// are deleted once returned, which is this transport's "mark seen".
pub struct DropDirFetcher {
    dir: PathBuf,
}

impl DropDirFetcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl MailFetcher for DropDirFetcher {
    async fn fetch_unread(&self, subject: &str) -> Result<Vec<String>> {
        let mut bodies = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(bodies),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read {}", self.dir.display()))
            }
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let raw = match tokio::fs::read_to_string(&path).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("skipping unreadable message {}: {}", path.display(), e);
                    continue;
                }
            };

            let (message_subject, body) = split_message(&raw);
            if message_subject.as_deref() == Some(subject) {
                bodies.push(body);
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    warn!("could not mark {} as seen: {}", path.display(), e);
                }
            }
        }
        Ok(bodies)
    }

    fn requires_credentials(&self) -> bool {
        false
    }
}

fn split_message(raw: &str) -> (Option<String>, String) {
    if let Some((head, body)) = raw.split_once("\n\n") {
        let subject = head
            .lines()
            .find_map(|line| line.strip_prefix("Subject:"))
            .map(|s| s.trim().to_string());
        if subject.is_some() {
            return (subject, body.to_string());
        }
    }
    (None, raw.to_string())
}
