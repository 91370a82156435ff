mod config;
mod controller;
mod input;
mod render;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::HttpLedgerService;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    config::{Overrides, Settings},
    controller::ConsoleController,
};

/// Operator console for a permissioned ledger node.
#[derive(Parser, Debug)]
#[command(name = "ledger-console")]
struct Args {
    /// Base url of the ledger service, e.g. http://127.0.0.1:8000
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    poll_interval_ms: Option<u64>,
    /// Ask the service for at most this many recent blocks.
    #[arg(long)]
    blocks_limit: Option<u32>,
    #[arg(long, default_value = "console.toml")]
    config: PathBuf,
    #[arg(long)]
    log_filter: Option<String>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            server_url: self.server_url.clone(),
            poll_interval_ms: self.poll_interval_ms,
            blocks_limit: self.blocks_limit,
            log_filter: self.log_filter.clone(),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let (mut settings, mut warnings) = config::load_settings(&args.config);
    settings.apply_overrides(&args.overrides());

    let filter = match EnvFilter::try_new(&settings.log_filter) {
        Ok(filter) => filter,
        Err(err) => {
            warnings.push(format!(
                "ignoring log filter {:?}: {err}",
                settings.log_filter
            ));
            EnvFilter::new("info")
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    for warning in &warnings {
        warn!("{warning}");
    }
    settings.validate().context("invalid console settings")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build console runtime")?;
    let result = runtime.block_on(run_console(settings));
    // The stdin reader blocks on a thread that cannot be cancelled; do not
    // wait for the operator to press enter once the console has exited.
    runtime.shutdown_background();
    result
}

async fn run_console(settings: Settings) -> Result<()> {
    let service = HttpLedgerService::new(&settings.server_url, settings.request_timeout())
        .with_context(|| format!("cannot use ledger at {}", settings.server_url))?
        .with_blocks_limit(settings.blocks_limit);
    info!(
        server = %service.base_url(),
        poll_interval_ms = settings.poll_interval_ms,
        "ledger console starting"
    );
    println!("ledger console connected to {}", service.base_url());

    let mut controller = ConsoleController::new(Arc::new(service), settings.poll_interval());
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    controller
        .run(BufReader::new(tokio::io::stdin()), &mut out)
        .await
        .context("console i/o failed")?;
    info!("ledger console stopped");
    Ok(())
}
