//! Task definitions for the registration batch
//!
//! A `Task` is one registration attempt: the target email, the synthetic
//! profile to fill in, and the terminal outcome once an executor has driven
//! it. Tasks are created when the scheduler partitions the input list and
//! are mutated only by their own executor.

use serde::Serialize;

/// Synthetic profile data filled into the form. Opaque to the core;
/// deterministic demo values, no generated personal data.
#[derive(Debug, Clone)]
pub struct Profile {
    pub name: String,
    pub birth_date: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: "Demo User".to_string(),
            birth_date: "1990-01-01".to_string(),
        }
    }
}

/// The row persisted by the result sink for a successful attempt.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProfileRecord {
    pub name: String,
    pub email: String,
    pub birth_date: String,
}

/// Terminal state of one attempt.
#[derive(Debug, Clone)]
pub enum Outcome {
    Pending,
    Success(ProfileRecord),
    Failure(String),
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Pending)
    }
}

/// One registration attempt.
#[derive(Debug, Clone)]
pub struct Task {
    pub email: String,
    pub profile: Profile,
    pub outcome: Outcome,
}

impl Task {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            profile: Profile::default(),
            outcome: Outcome::Pending,
        }
    }

    /// A task that settled without its executor finishing normally.
    pub fn failed(email: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            profile: Profile::default(),
            outcome: Outcome::Failure(reason.into()),
        }
    }

    pub fn record(&self) -> ProfileRecord {
        ProfileRecord {
            name: self.profile.name.clone(),
            email: self.email.clone(),
            birth_date: self.profile.birth_date.clone(),
        }
    }
}

/// Build the ordered task list from an ordered email list.
pub fn from_emails(emails: Vec<String>) -> Vec<Task> {
    emails.into_iter().map(Task::new).collect()
}
