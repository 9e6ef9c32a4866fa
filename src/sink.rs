//! Result Sink
//!
//! Durable, human-inspectable record of successful attempts: an append-only
//! CSV with the header written once on first append. Appends from concurrent
//! tasks are serialized through a mutex so rows never interleave.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::task::ProfileRecord;

const CSV_HEADER: &str = "\"name\",\"email\",\"birth_date\"\n";

#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn append(&self, record: &ProfileRecord) -> Result<()>;
}

pub struct CsvSink {
    path: PathBuf,
    guard: Mutex<()>,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }
}

#[async_trait]
impl ResultSink for CsvSink {
    async fn append(&self, record: &ProfileRecord) -> Result<()> {
        let _lock = self.guard.lock().await;

        let write_header = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("failed to open {}", self.path.display()))?;

        if write_header {
            file.write_all(CSV_HEADER.as_bytes()).await?;
        }

        let line = format!(
            "\"{}\",\"{}\",\"{}\"\n",
            escape(&record.name),
            escape(&record.email),
            escape(&record.birth_date)
        );
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!("recorded {} in {}", record.email, self.path.display());
        Ok(())
    }
}

fn escape(field: &str) -> String {
    field.replace('"', "\"\"")
}
