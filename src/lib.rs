//! Parallel web-form registration demo
//!
//! Two workflows:
//! - a batch runner that drives registration attempts through a
//!   challenge-guarded form with bounded concurrency, resolving each
//!   challenge through an external asynchronous solver service, and
//! - a mailbox watcher that polls for confirmation messages and visits the
//!   links they contain.
//!
//! ## Module Structure
//!
//! - `config`: explicit configuration structures
//! - `error`: task-level error taxonomy
//! - `task`: task, profile and outcome types
//! - `solver`: external challenge-solver client (submit + poll)
//! - `session`: actuation-agent seam and scripted implementation
//! - `executor`: per-task state machine
//! - `scheduler`: bounded-concurrency batch runner
//! - `sink`: append-only CSV result sink
//! - `roster`: email-list source and sharding helper
//! - `mailbox`: confirmation-mail watcher

pub mod config;
pub mod error;
pub mod executor;
pub mod mailbox;
pub mod roster;
pub mod scheduler;
pub mod session;
pub mod sink;
pub mod solver;
pub mod task;

pub use config::{MailboxConfig, RunnerConfig, SolverConfig};
pub use error::TaskError;
pub use executor::RunnerContext;
pub use mailbox::{extract_url, DropDirFetcher, MailFetcher, MailboxWatcher};
pub use roster::{demo_emails, load_emails, split_into_parts};
pub use scheduler::run_batch;
pub use session::{ActuationAgent, ScriptedAgent, Session, SessionScript};
pub use sink::{CsvSink, ResultSink};
pub use solver::{SolveRequest, SolverClient};
pub use task::{Outcome, Profile, ProfileRecord, Task};
