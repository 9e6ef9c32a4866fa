//! Actuation-agent seam
//!
//! The page-rendering capability is an external collaborator behind a narrow
//! interface: an agent spawns isolated per-task sessions, and a session
//! exposes exactly the operations the executor needs. A scripted in-memory
//! implementation backs the offline demo and the tests; a real browser
//! backend would implement the same pair of traits.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::error::TaskError;

/// Spawns isolated actuation sessions. The agent itself may be a shared
/// capability provider; each spawned session is task-local.
#[async_trait]
pub trait ActuationAgent: Send + Sync {
    async fn new_session(&self) -> Result<Box<dyn Session>, TaskError>;
}

/// One isolated page session.
#[async_trait]
pub trait Session: Send {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), TaskError>;

    async fn fill(&mut self, selector: &str, value: &str) -> Result<(), TaskError>;

    /// Read an attribute off the first element matching `selector`;
    /// `None` when the element or attribute is absent.
    async fn read_attribute(
        &mut self,
        selector: &str,
        attr: &str,
    ) -> Result<Option<String>, TaskError>;

    /// Trigger form submission and wait for the resulting navigation.
    async fn submit_and_wait_for_navigation(&mut self, timeout: Duration)
        -> Result<(), TaskError>;

    fn current_location(&self) -> String;

    async fn capture_snapshot(&mut self, path: &str) -> Result<(), TaskError>;

    async fn close(&mut self) -> Result<(), TaskError>;
}

/// Canned behavior for a [`ScriptedSession`].
#[derive(Debug, Clone)]
pub struct SessionScript {
    /// Site key returned for the challenge marker; `None` means the page
    /// carries no challenge.
    pub site_key: Option<String>,
    /// Location the session lands on after submission.
    pub post_submit_location: String,
}

impl Default for SessionScript {
    fn default() -> Self {
        Self {
            site_key: Some("demo-site-key".to_string()),
            post_submit_location: "https://www.google.com/recaptcha/api2/demo/recaptcha-demo-results"
                .to_string(),
        }
    }
}

/// In-memory actuation agent that replays a [`SessionScript`] per session.
/// Used by the offline demo binary and by tests; performs no I/O.
pub struct ScriptedAgent {
    script: SessionScript,
}

impl ScriptedAgent {
    pub fn new(script: SessionScript) -> Self {
        Self { script }
    }
}

#[async_trait]
impl ActuationAgent for ScriptedAgent {
    async fn new_session(&self) -> Result<Box<dyn Session>, TaskError> {
        Ok(Box::new(ScriptedSession {
            script: self.script.clone(),
            location: String::new(),
            filled: Vec::new(),
        }))
    }
}

struct ScriptedSession {
    script: SessionScript,
    location: String,
    filled: Vec<(String, String)>,
}

#[async_trait]
impl Session for ScriptedSession {
    async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<(), TaskError> {
        debug!("scripted session navigating to {}", url);
        self.location = url.to_string();
        Ok(())
    }

    async fn fill(&mut self, selector: &str, value: &str) -> Result<(), TaskError> {
        self.filled.push((selector.to_string(), value.to_string()));
        Ok(())
    }

    async fn read_attribute(
        &mut self,
        _selector: &str,
        _attr: &str,
    ) -> Result<Option<String>, TaskError> {
        Ok(self.script.site_key.clone())
    }

    async fn submit_and_wait_for_navigation(
        &mut self,
        _timeout: Duration,
    ) -> Result<(), TaskError> {
        self.location = self.script.post_submit_location.clone();
        Ok(())
    }

    fn current_location(&self) -> String {
        self.location.clone()
    }

    async fn capture_snapshot(&mut self, path: &str) -> Result<(), TaskError> {
        debug!("scripted session skipping snapshot to {}", path);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TaskError> {
        debug!("closing scripted session ({} fields filled)", self.filled.len());
        self.filled.clear();
        Ok(())
    }
}
