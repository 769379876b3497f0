//! Asynchronous batch processing strategy
//!
//! This module provides a multi-threaded implementation of the
//! ProcessingStrategy trait. Transfers are read in batches; within a batch,
//! transfers that share no account run in parallel.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncReader (batch CSV reading)
//!     └── BatchProcessor (account-group partitioning + blocking tasks)
//!         └── LedgerEngine
//!             ├── InMemoryAccountStore (per-account locks)
//!             └── InMemoryTransactionStore (append-only log)
//! ```
//!
//! # Ordering
//!
//! - Batches are processed one after another
//! - Transfers sharing an account, directly or through a chain of transfers,
//!   land in the same group and run in file order
//!
//! The final balances and recorded outcomes therefore match the sync strategy.

use crate::core::{AccountStore, BatchProcessor, InMemoryAccountStore, InMemoryTransactionStore, LedgerEngine};
use crate::io::async_reader::AsyncReader;
use crate::io::csv_format::{write_accounts_csv, TransferCsvRecord};
use crate::strategy::{load_accounts, LedgerConfig, ProcessingReport, ProcessingStrategy};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Configuration for batch processing
///
/// Controls how transfers are batched and the number of worker threads
/// for parallel processing within each batch.
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Number of transfers per batch
    pub batch_size: usize,
    /// Maximum number of account groups processing concurrently
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig with custom values
    ///
    /// Zero values fall back to the defaults with a warning.
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            tracing::warn!(
                "Invalid batch_size ({}), using default ({})",
                batch_size,
                default.batch_size
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            tracing::warn!(
                "Invalid max_concurrent_batches ({}), using default ({})",
                max_concurrent_batches,
                default.max_concurrent_batches
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Asynchronous batch processing strategy
///
/// # Configuration
///
/// - `batch_size`: Number of transfers per batch (default: 1000)
/// - `max_concurrent_batches`: Number of worker threads (default: CPU cores)
/// - `lock_timeout`: Wait limit for account locks (default: 5s)
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
    ledger: LedgerConfig,
}

impl AsyncProcessingStrategy {
    pub fn new(config: BatchConfig, ledger: LedgerConfig) -> Self {
        Self { config, ledger }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    /// Process transfers in batches and write the final balances
    ///
    /// 1. Creates a tokio multi-threaded runtime
    /// 2. Loads the accounts CSV into a fresh Account Store
    /// 3. Reads transfers in batches from CSV using AsyncReader
    /// 4. Processes each batch through the BatchProcessor, waiting for it to
    ///    complete before reading the next
    /// 5. Writes the final balances using `write_accounts_csv`
    fn process(
        &self,
        accounts_path: &Path,
        transfers_path: &Path,
        output: &mut dyn Write,
    ) -> Result<ProcessingReport, String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .max_blocking_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        runtime.block_on(async {
            let accounts = Arc::new(InMemoryAccountStore::with_lock_timeout(
                self.ledger.lock_timeout,
            ));
            let transactions = Arc::new(InMemoryTransactionStore::new());
            let engine = LedgerEngine::new(Arc::clone(&accounts), transactions);
            let processor = BatchProcessor::new(engine);

            load_accounts(accounts_path, accounts.as_ref())?;

            let file = tokio::fs::File::open(transfers_path).await.map_err(|e| {
                format!("Failed to open file '{}': {}", transfers_path.display(), e)
            })?;

            // Wrap tokio file in a compatibility layer for csv-async
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::<_, TransferCsvRecord>::new(compat_file);

            let mut report = ProcessingReport::default();
            let mut offset = 0;
            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                let batch_len = batch.len();
                for result in processor.process_batch(batch).await {
                    report.record(offset + result.sequence, result.result);
                }
                offset += batch_len;
            }

            write_accounts_csv(&accounts.all(), output)?;

            Ok(report)
        })
    }
}
