//! OTOS process entry point.
//!
//! Wires configuration, logging and storage into an [`Engine`] and drives the
//! daily digest. The chat transport plugs in through [`Messenger`]; until one
//! is attached, outbound messages are written to the log.

mod config;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::info;
use otos_core::{
    default_log_level, init_logging, open_db, rank_of, DeliveryError, DigestJob, Engine,
    ExternalId, Messenger, Store, SystemClock,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Parser)]
#[command(name = "otos", version, about = "Task tracking and scoring engine")]
struct Cli {
    /// Path to otos.toml (defaults to $OTOS_CONFIG, then ./otos.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the daily digest scheduler until Ctrl-C.
    Run,
    /// Send one digest pass now.
    Digest {
        /// Day to report (YYYY-MM-DD). Defaults to today in the configured zone.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Print the rank for a score.
    Rank { score: i64 },
}

/// Messenger used until a chat transport is attached.
struct LogMessenger;

#[async_trait]
impl Messenger for LogMessenger {
    async fn send(&self, recipient: ExternalId, text: &str) -> Result<(), DeliveryError> {
        info!(
            "event=push_message module=cli status=ok recipient={recipient} chars={}",
            text.chars().count()
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Rank { score } => println!("{}", rank_of(score)),
        Command::Digest { date } => {
            let (engine, job) = bootstrap(cli.config)?;
            let date = date.unwrap_or_else(|| engine.today());
            let report = job.run_for(date).await?;
            println!(
                "digest {date}: sent={} skipped={} failed={}",
                report.sent, report.skipped, report.failed
            );
        }
        Command::Run => {
            let (_engine, job) = bootstrap(cli.config)?;
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let handle = job.spawn(shutdown_rx);
            info!("event=daemon_start module=cli status=ok");

            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl-C")?;
            let _ = shutdown_tx.send(true);
            handle.await.context("Digest task panicked")?;
            info!("event=daemon_stop module=cli status=ok");
        }
    }

    Ok(())
}

fn bootstrap(config_flag: Option<PathBuf>) -> Result<(Arc<Engine>, DigestJob)> {
    let config = config::load_config(&config::config_path(config_flag.as_deref()))?;
    if let Some(log_dir) = &config.log_dir {
        let level = config.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, &log_dir.to_string_lossy())?;
    }

    let conn = open_db(&config.database_path).with_context(|| {
        format!("Failed to open database {}", config.database_path.display())
    })?;
    let engine = Arc::new(Engine::new(
        Arc::new(Store::new(conn)),
        Arc::new(SystemClock),
        config.engine,
    )?);
    let job = DigestJob::new(engine.clone(), Arc::new(LogMessenger))?;
    Ok((engine, job))
}
