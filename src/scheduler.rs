//! Batch Scheduler
//!
//! Partitions the ordered task list into consecutive groups of `concurrency`
//! tasks and runs each group concurrently, waiting for every member to
//! settle before the next group starts. Peak concurrency is capped per
//! group, not globally pipelined: a slow task delays the next group even if
//! other slots are idle. That is a deliberate simplicity trade-off.

use anyhow::Result;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{error, info};

use crate::executor::{self, RunnerContext};
use crate::task::Task;

/// Drive every task to a terminal outcome, `concurrency` at a time.
/// Individual failures never abort siblings or the batch; the settled tasks
/// are returned in completion-group order.
pub async fn run_batch(ctx: Arc<RunnerContext>, tasks: Vec<Task>) -> Result<Vec<Task>> {
    if ctx.config.concurrency == 0 {
        anyhow::bail!("concurrency must be positive");
    }

    let total = tasks.len();
    let concurrency = ctx.config.concurrency;
    let mut remaining = tasks;
    let mut settled: Vec<Task> = Vec::with_capacity(total);

    while !remaining.is_empty() {
        let take = concurrency.min(remaining.len());
        let group: Vec<Task> = remaining.drain(..take).collect();
        info!(
            "starting group: tasks {}..{} of {}",
            settled.len() + 1,
            settled.len() + group.len(),
            total
        );

        let handles: Vec<(String, tokio::task::JoinHandle<Task>)> = group
            .into_iter()
            .map(|mut task| {
                let email = task.email.clone();
                let ctx = ctx.clone();
                let handle = tokio::spawn(async move {
                    executor::run_task(&ctx, &mut task).await;
                    task
                });
                (email, handle)
            })
            .collect();

        let (emails, joins): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        for (email, joined) in emails.into_iter().zip(join_all(joins).await) {
            match joined {
                Ok(task) => settled.push(task),
                Err(e) => {
                    // A panicked executor still settles its task.
                    error!("executor for {} aborted: {}", email, e);
                    settled.push(Task::failed(email, format!("executor aborted: {}", e)));
                }
            }
        }
    }

    info!("batch complete: {} tasks settled", settled.len());
    Ok(settled)
}
