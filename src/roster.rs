//! Task-id source
//!
//! Loads the ordered email list the batch is driven from. A missing file is
//! not an error in a demo configuration: a small generated list is returned
//! instead, mirroring the solver's offline mode. Also carries the sharding
//! helper used to split one input list across parallel workers.

use anyhow::{Context, Result};
use tracing::info;

/// Ordered email list from `path`, one address per line, trimmed, blanks
/// dropped. Falls back to a generated demo list when the file is absent.
pub async fn load_emails(path: &str) -> Result<Vec<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => Ok(raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("{} not found, using generated demo list", path);
            Ok(demo_emails())
        }
        Err(e) => Err(e).with_context(|| format!("failed to read {}", path)),
    }
}

pub fn demo_emails() -> Vec<String> {
    vec![
        "demo1@example.com".to_string(),
        "demo2@example.com".to_string(),
        "demo3@example.com".to_string(),
    ]
}

/// Split `rows` into at most `parts` consecutive shards of near-equal size
/// (ceil division, last shard may be shorter).
pub fn split_into_parts<T: Clone>(rows: &[T], parts: usize) -> Vec<Vec<T>> {
    if rows.is_empty() || parts == 0 {
        return Vec::new();
    }
    let per_part = rows.len().div_ceil(parts);
    rows.chunks(per_part).map(|chunk| chunk.to_vec()).collect()
}
