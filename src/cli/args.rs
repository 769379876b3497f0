use crate::strategy::{BatchConfig, LedgerConfig};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::Level;

/// Apply prepaid wallet transfers to a set of accounts
#[derive(Parser, Debug)]
#[command(name = "wallet-ledger")]
#[command(about = "Apply prepaid wallet transfers to food, meal and cash balances", long_about = None)]
pub struct CliArgs {
    /// Transfers CSV file path
    #[arg(value_name = "TRANSFERS", help = "Path to the transfers CSV file")]
    pub transfers_file: PathBuf,

    /// Accounts CSV file path with opening balances
    #[arg(
        long = "accounts",
        value_name = "PATH",
        help = "Path to the accounts CSV file with opening balances"
    )]
    pub accounts_file: PathBuf,

    /// Processing strategy to use
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Processing strategy: 'sync' for one transfer at a time or 'async' for batched parallel groups"
    )]
    pub strategy: StrategyType,

    /// Number of transfers per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of transfers per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Maximum number of concurrent account groups (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Maximum number of account groups processing concurrently (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    /// Account lock wait limit in milliseconds
    #[arg(
        long = "lock-timeout-ms",
        value_name = "MILLIS",
        default_value_t = 5000,
        help = "How long a transfer waits for an account lock before failing"
    )]
    pub lock_timeout_ms: u64,

    /// Optional transaction ledger output
    #[arg(
        long = "ledger",
        value_name = "PATH",
        help = "Write every recorded transaction to this CSV file"
    )]
    pub ledger_file: Option<PathBuf>,

    /// Log verbosity on stderr
    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        default_value = "warn",
        help = "Log level: error, warn, info, debug or trace"
    )]
    pub log_level: Level,
}

/// Available processing strategies
#[derive(Clone, Debug, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Uses the provided values where given and defaults otherwise. Zero values
    /// fall back to the defaults with a warning.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }

    pub fn to_ledger_config(&self) -> LedgerConfig {
        LedgerConfig::from_millis(self.lock_timeout_ms)
    }
}
