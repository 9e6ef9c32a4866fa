//! Form Runner CLI
//!
//! `register` drives the batch registration workflow; `verify-mail` runs the
//! mailbox-confirmation watcher.

use anyhow::Result;
use clap::{Parser, Subcommand};
use form_runner::{
    mailbox::MailboxWatcher, roster, scheduler, task, CsvSink, DropDirFetcher, MailboxConfig,
    Outcome, RunnerConfig, RunnerContext, ScriptedAgent, SessionScript, SolverClient,
};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "form-runner")]
#[command(about = "Parallel form-registration demo driver")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the batch registration workflow
    Register {
        /// Concurrent attempts per group
        #[arg(short, long, default_value = "3", env = "CONCURRENCY")]
        concurrency: usize,

        /// Email list file (generated demo list when absent)
        #[arg(long, default_value = "demo_create_list.csv", env = "EMAIL_LIST_FILE")]
        email_list: String,

        /// CSV file successful records are appended to
        #[arg(long, default_value = "demo_output.csv", env = "OUTPUT_FILE")]
        output: String,
    },
    /// Poll for confirmation messages and visit the links they contain
    VerifyMail {
        /// Directory watched for dropped message files
        #[arg(long, default_value = "demo_mail_drop", env = "MAIL_DROP_DIR")]
        drop_dir: String,

        /// Run a single pass instead of looping
        #[arg(long)]
        once: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("form_runner=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .init();

    let args = Args::parse();
    match args.command {
        Command::Register {
            concurrency,
            email_list,
            output,
        } => register(concurrency, email_list, output).await,
        Command::VerifyMail { drop_dir, once } => verify_mail(drop_dir, once).await,
    }
}

async fn register(concurrency: usize, email_list: String, output: String) -> Result<()> {
    let config = RunnerConfig {
        concurrency,
        email_list_file: email_list,
        output_file: output,
        ..RunnerConfig::default()
    };
    config.validate()?;

    info!("Starting registration batch");
    info!("  Target: {}", config.target_url);
    info!("  Concurrency: {}", config.concurrency);
    if config.solver.api_key.is_none() {
        info!("  Solver: offline mode (no credential configured)");
    }

    let emails = roster::load_emails(&config.email_list_file).await?;
    if emails.is_empty() {
        info!("no emails to process");
        return Ok(());
    }

    let solver = SolverClient::new(config.solver.clone())?;
    let sink = CsvSink::new(&config.output_file);
    let ctx = Arc::new(RunnerContext {
        agent: Arc::new(ScriptedAgent::new(SessionScript::default())),
        solver: Arc::new(solver),
        sink: Arc::new(sink),
        config,
    });

    let settled = scheduler::run_batch(ctx, task::from_emails(emails)).await?;
    let succeeded = settled
        .iter()
        .filter(|t| matches!(t.outcome, Outcome::Success(_)))
        .count();
    info!(
        "batch complete: {}/{} attempts succeeded",
        succeeded,
        settled.len()
    );
    Ok(())
}

async fn verify_mail(drop_dir: String, once: bool) -> Result<()> {
    let config = MailboxConfig::default();
    info!("Starting mailbox watcher");
    info!("  Subject: {}", config.subject);
    info!("  Drop dir: {}", drop_dir);

    let watcher = MailboxWatcher::new(
        Arc::new(DropDirFetcher::new(drop_dir)),
        Arc::new(ScriptedAgent::new(SessionScript::default())),
        config,
    );

    if once {
        let visited = watcher.check_once().await?;
        info!("pass complete: {} links visited", visited);
        return Ok(());
    }

    watcher.run().await;
    Ok(())
}
