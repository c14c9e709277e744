use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use syncvisor::{logs, Config, LogWriter, RsyncRunner, Supervisor, DEFAULT_MAX_WORKERS};

/// Mirrors the configured repository modules and reports each completed
/// item to a local listener.
#[derive(Parser, Debug)]
#[command(name = "syncvisor", version, about)]
struct Cli {
    /// Path to the KEY=value config file (DIRS, RSYNC, REPOSITORY, LOGS).
    #[arg(short, long)]
    config: PathBuf,

    /// TCP port of the local listener receiving completion notifications.
    #[arg(short, long)]
    port: u16,

    /// Maximum number of concurrent sync workers.
    #[arg(short = 't', long = "workers", default_value_t = DEFAULT_MAX_WORKERS)]
    workers: usize,

    /// Write a debug log and prepend it to the aggregated run log.
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(if cli.debug { "debug" } else { "info" })
            }),
        )
        .with_target(false)
        .init();

    let cfg = match Config::load(&cli.config, cli.port, cli.workers, cli.debug) {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(label = err.as_label(), "{err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = logs::prepare_run(&cfg) {
        error!(label = err.as_label(), "{err}");
        return ExitCode::FAILURE;
    }

    info!(
        modules = cfg.modules.len(),
        workers = cfg.max_workers,
        port = cfg.listener_port,
        "starting run"
    );

    let sup = Supervisor::new(cfg, LogWriter::new());
    let runner = Arc::new(RsyncRunner::new(sup.cfg.clone()));
    match sup.run(runner).await {
        Ok(summary) => {
            info!(
                modules = summary.modules,
                synced = summary.synced,
                failed = summary.failed(),
                "run complete"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(label = err.as_label(), "{err}");
            ExitCode::FAILURE
        }
    }
}
