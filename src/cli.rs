//! # The Command-Line Arguments

use crate::constants::HZ_MS;
use crate::storage::StoreConfig;
use clap::Parser;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "Gamestore")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Period of the active expiry sweep, in milliseconds
    #[arg(long, default_value_t = HZ_MS as u64)]
    pub sweep_interval_ms: u64,

    /// Disable the active expiry sweep; expired keys are then only purged on access
    #[arg(long)]
    pub no_sweep: bool,
}

impl Args {
    pub fn store_config(&self) -> StoreConfig {
        if self.no_sweep || self.sweep_interval_ms == 0 {
            StoreConfig::ephemeral()
        } else {
            StoreConfig::with_sweep_interval(Duration::from_millis(self.sweep_interval_ms))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::parse_from(["gamestore"]);
        assert_eq!(HZ_MS as u64, args.sweep_interval_ms);
        assert!(!args.no_sweep);
        assert_eq!(
            Some(Duration::from_millis(HZ_MS as u64)),
            args.store_config().sweep_interval
        );
    }

    #[test]
    fn custom_interval() {
        let args = Args::parse_from(["gamestore", "--sweep-interval-ms", "250"]);
        assert_eq!(
            Some(Duration::from_millis(250)),
            args.store_config().sweep_interval
        );
    }

    #[test]
    fn no_sweep() {
        let args = Args::parse_from(["gamestore", "--no-sweep"]);
        assert_eq!(None, args.store_config().sweep_interval);
    }
}
