//! Task-level error taxonomy
//!
//! Every variant is caught at the executor boundary and converted into a
//! task `Failure`; nothing here propagates past a single attempt.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("session acquisition failed: {0}")]
    Session(String),
    #[error("interaction failed: {0}")]
    Interaction(String),
    #[error("solver rejected submission: {0}")]
    Submission(String),
    #[error("solver error: {0}")]
    Solve(String),
    #[error("solver timed out after {attempts} polls")]
    SolveTimeout { attempts: u32 },
    #[error("outcome verification failed: unexpected destination")]
    Verification { destination: String },
}
