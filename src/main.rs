//! # Gamestore Console

use anyhow::Context;
use clap::Parser;
use gamestore::cli::Args;
use gamestore::console;
use gamestore::constants::ExitCode;
use gamestore::errors::ApplicationError;
use gamestore::log_and_stderr;
use gamestore::storage::{MemoryStore, Storage};
use log::{error, info};
use std::process::exit;
use tokio::io::{stdin, stdout, BufReader};

#[tokio::main]
async fn main() -> Result<(), ApplicationError> {
    env_logger::init();
    let args = Args::parse();
    info!("Starting the store with {args:?}...");

    let store =
        MemoryStore::connected(args.store_config()).context("Couldn't open the store")?;
    match store.config().sweep_interval {
        Some(interval) => info!("Sweeping expired keys every {interval:?}"),
        None => {
            log_and_stderr!(warn, "Active expiry is off; expired keys are purged on access");
        }
    }

    log_and_stderr!(info, "Console ready, type HELP for the list of commands");
    let result = tokio::select! {
        result = console::run(&store, BufReader::new(stdin()), stdout()) => result,
        _ = shutdown() => {
            // The stdin reader holds a blocking thread that would keep the runtime alive.
            store.disconnect()?;
            exit(ExitCode::Ok as i32);
        }
    };

    store.disconnect().context("Couldn't close the store")?;
    log_and_stderr!(info, "Store disconnected, bye");
    result
}

/// Await the shutdown signal
async fn shutdown() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("CTRL+C received. Shutting down...");
        }
        Err(err) => {
            // We also shut down in case of error.
            error!("Unable to listen for the shutdown signal: {}", err);
            error!("Terminating the app ({})...", ExitCode::Shutdown as i32);
            exit(ExitCode::Shutdown as i32)
        }
    }
}
