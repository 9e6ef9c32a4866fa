//! Task Executor
//!
//! Drives exactly one registration attempt from start to a terminal outcome:
//! acquire an isolated session, fill the form, resolve the challenge gate if
//! one is present, submit, verify the destination, and record the result.
//! Every error is caught here and converted into the task's `Failure`; the
//! session is released on every exit path.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::RunnerConfig;
use crate::error::TaskError;
use crate::session::{ActuationAgent, Session};
use crate::sink::ResultSink;
use crate::solver::SolverClient;
use crate::task::{Outcome, ProfileRecord, Task};

const NAME_SELECTOR: &str = "#recaptcha-demo-form [type=\"text\"]";
const EMAIL_SELECTOR: &str = "#recaptcha-demo-form [type=\"email\"]";
const CHALLENGE_SELECTOR: &str = "div.g-recaptcha";
const SITE_KEY_ATTR: &str = "data-sitekey";
const CHALLENGE_RESPONSE_SELECTOR: &str = "textarea[name='g-recaptcha-response']";

/// Everything an executor needs, threaded down from the binary. No
/// process-wide singletons.
pub struct RunnerContext {
    pub config: RunnerConfig,
    pub agent: Arc<dyn ActuationAgent>,
    pub solver: Arc<SolverClient>,
    pub sink: Arc<dyn ResultSink>,
}

/// Run one task to a terminal outcome. Never returns an error: every
/// failure is recorded on the task itself.
pub async fn run_task(ctx: &RunnerContext, task: &mut Task) {
    info!("starting registration attempt for {}", task.email);

    let mut session = match ctx.agent.new_session().await {
        Ok(session) => session,
        Err(e) => {
            // Agents report acquisition failures as TaskError::Session.
            let reason = match e {
                TaskError::Session(_) => e.to_string(),
                other => TaskError::Session(other.to_string()).to_string(),
            };
            error!("attempt failed for {}: {}", task.email, reason);
            task.outcome = Outcome::Failure(reason);
            return;
        }
    };

    let outcome = match drive(ctx, session.as_mut(), task).await {
        // An attempt only counts once its record is durably appended.
        Ok(record) => match ctx.sink.append(&record).await {
            Ok(()) => {
                info!("attempt succeeded for {}", task.email);
                Outcome::Success(record)
            }
            Err(e) => {
                let reason = format!("result persistence failed: {:#}", e);
                error!("attempt failed for {}: {}", task.email, reason);
                capture_failure_snapshot(ctx, session.as_mut(), &task.email).await;
                Outcome::Failure(reason)
            }
        },
        Err(err) => {
            error!("attempt failed for {}: {}", task.email, err);
            capture_failure_snapshot(ctx, session.as_mut(), &task.email).await;
            Outcome::Failure(err.to_string())
        }
    };

    if let Err(e) = session.close().await {
        warn!("failed to close session for {}: {}", task.email, e);
    }
    task.outcome = outcome;
}

async fn drive(
    ctx: &RunnerContext,
    session: &mut dyn Session,
    task: &Task,
) -> Result<ProfileRecord, TaskError> {
    let cfg = &ctx.config;
    let nav_timeout = Duration::from_millis(cfg.navigation_timeout_ms);

    session.navigate(&cfg.target_url, nav_timeout).await?;
    session.fill(NAME_SELECTOR, &task.profile.name).await?;
    session.fill(EMAIL_SELECTOR, &task.email).await?;

    match session.read_attribute(CHALLENGE_SELECTOR, SITE_KEY_ATTR).await? {
        Some(site_key) => {
            debug!("challenge detected for {}", task.email);
            let token = ctx.solver.solve(&site_key, &cfg.target_url).await?;
            session.fill(CHALLENGE_RESPONSE_SELECTOR, &token).await?;
        }
        None => {
            debug!("no challenge present for {}, submitting directly", task.email);
        }
    }

    session.submit_and_wait_for_navigation(nav_timeout).await?;

    let location = session.current_location();
    if !location.contains(&cfg.success_marker) {
        debug!("post-submission location for {}: {}", task.email, location);
        return Err(TaskError::Verification {
            destination: location,
        });
    }

    Ok(task.record())
}

/// Best-effort diagnostic snapshot after a failure. Its own failure is
/// logged and never replaces the primary reason.
async fn capture_failure_snapshot(ctx: &RunnerContext, session: &mut dyn Session, email: &str) {
    let safe: String = email
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let path = format!("{}/error_demo_{}.png", ctx.config.snapshot_dir, safe);
    if let Err(e) = session.capture_snapshot(&path).await {
        warn!("snapshot capture failed for {}: {}", email, e);
    }
}
