//! Processing strategy module for ledger runs
//!
//! This module defines the Strategy pattern for complete processing pipelines:
//! loading the accounts CSV, feeding the transfers CSV through the ledger engine
//! and writing the resulting balances. Different implementations (synchronous,
//! asynchronous batch) can be selected at runtime and produce identical results.

use crate::cli::StrategyType;
use crate::core::{AccountStore, DEFAULT_LOCK_TIMEOUT};
use crate::io::csv_format::AccountCsvRecord;
use crate::io::sync_reader::SyncReader;
use crate::types::{Transaction, TransferError};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Processing strategy trait for complete ledger runs
pub trait ProcessingStrategy: Send + Sync {
    /// Process transfers against the given accounts and write final balances
    ///
    /// # Arguments
    ///
    /// * `accounts_path` - CSV file with the opening accounts
    /// * `transfers_path` - CSV file with the transfers to apply, in order
    /// * `output` - Writer receiving the final accounts CSV
    ///
    /// # Returns
    ///
    /// * `Ok(ProcessingReport)` once every transfer has been attempted
    /// * `Err(String)` if a fatal error occurred (file not found, I/O error,
    ///   runtime failure)
    ///
    /// Invalid rows and rejected transfers are logged and skipped; they never
    /// abort the run.
    fn process(
        &self,
        accounts_path: &Path,
        transfers_path: &Path,
        output: &mut dyn Write,
    ) -> Result<ProcessingReport, String>;
}

/// Summary of a processing run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessingReport {
    /// Transfers recorded as authorized
    pub authorized: usize,
    /// Transfers recorded as denied for insufficient funds
    pub denied: usize,
    /// Transfers that produced no record (validation, lookup or store failures)
    pub rejected: usize,
    /// Recorded transactions, in transfer file order
    pub transactions: Vec<Transaction>,
}

impl ProcessingReport {
    /// Account for the outcome of the transfer at `position` in the input
    pub fn record(&mut self, position: usize, outcome: Result<Transaction, TransferError>) {
        match outcome {
            Ok(transaction) => {
                if transaction.is_authorized() {
                    self.authorized += 1;
                } else {
                    self.denied += 1;
                }
                self.transactions.push(transaction);
            }
            Err(e) => {
                self.rejected += 1;
                tracing::warn!(position, kind = ?e.kind(), error = %e, "Transfer rejected");
            }
        }
    }
}

/// Ledger settings shared by every strategy
#[derive(Clone, Debug, PartialEq)]
pub struct LedgerConfig {
    /// How long a transfer waits for an account lock before failing
    pub lock_timeout: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }
}

impl LedgerConfig {
    /// Create a LedgerConfig from a lock timeout in milliseconds
    ///
    /// A zero timeout falls back to the default.
    pub fn from_millis(lock_timeout_ms: u64) -> Self {
        if lock_timeout_ms == 0 {
            let default = Self::default();
            tracing::warn!(
                "Invalid lock_timeout_ms (0), using default ({}ms)",
                default.lock_timeout.as_millis()
            );
            return default;
        }

        Self {
            lock_timeout: Duration::from_millis(lock_timeout_ms),
        }
    }
}

/// Load the accounts CSV into an Account Store
///
/// Rows that fail to parse, convert or insert are logged and skipped.
///
/// # Returns
///
/// * `Ok(usize)` - Number of accounts loaded
/// * `Err(String)` - The file could not be opened
pub fn load_accounts<A: AccountStore>(path: &Path, store: &A) -> Result<usize, String> {
    let reader = SyncReader::<AccountCsvRecord>::new(path)?;
    let mut loaded = 0;

    for result in reader {
        let inserted = result.and_then(|account| store.insert(account).map_err(|e| e.to_string()));
        match inserted {
            Ok(()) => loaded += 1,
            Err(e) => tracing::warn!(error = %e, "Skipping account"),
        }
    }

    tracing::debug!(loaded, path = %path.display(), "Accounts loaded");
    Ok(loaded)
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create (Sync or Async)
/// * `batch` - Optional configuration for async batch processing (ignored for sync)
/// * `ledger` - Ledger settings used by both strategies
pub fn create_strategy(
    strategy_type: StrategyType,
    batch: Option<BatchConfig>,
    ledger: LedgerConfig,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(ledger)),
        StrategyType::Async => {
            let batch = batch.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(batch, ledger))
        }
    }
}
