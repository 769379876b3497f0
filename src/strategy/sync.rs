//! Synchronous processing strategy
//!
//! This module provides a synchronous, single-threaded implementation of the
//! ProcessingStrategy trait. It applies transfers strictly one at a time, in
//! file order.
//!
//! # Design
//!
//! The SyncProcessingStrategy focuses on orchestration, delegating:
//! - Account loading to `load_accounts`
//! - CSV parsing to `SyncReader` (iterator interface)
//! - Transfer execution to `LedgerEngine`
//! - CSV output to `csv_format::write_accounts_csv`
//!
//! Transfers are streamed; only the accounts and the recorded transactions are
//! held in memory.

use crate::core::{AccountStore, InMemoryAccountStore, InMemoryTransactionStore, LedgerEngine};
use crate::io::csv_format::{write_accounts_csv, TransferCsvRecord};
use crate::io::sync_reader::SyncReader;
use crate::strategy::{load_accounts, LedgerConfig, ProcessingReport, ProcessingStrategy};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Synchronous processing strategy
///
/// # Examples
///
/// ```no_run
/// use wallet_ledger::strategy::{LedgerConfig, ProcessingStrategy, SyncProcessingStrategy};
/// use std::path::Path;
/// use std::io;
///
/// let strategy = SyncProcessingStrategy::new(LedgerConfig::default());
/// let mut output = io::stdout();
///
/// strategy
///     .process(Path::new("accounts.csv"), Path::new("transfers.csv"), &mut output)
///     .expect("Processing failed");
/// ```
#[derive(Debug, Clone)]
pub struct SyncProcessingStrategy {
    ledger: LedgerConfig,
}

impl SyncProcessingStrategy {
    pub fn new(ledger: LedgerConfig) -> Self {
        Self { ledger }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    /// Process transfers one at a time and write the final balances
    ///
    /// 1. Loads the accounts CSV into a fresh Account Store
    /// 2. Streams transfer instructions through `SyncReader`
    /// 3. Submits each one to the engine and records its outcome
    /// 4. Writes the final balances using `write_accounts_csv`
    fn process(
        &self,
        accounts_path: &Path,
        transfers_path: &Path,
        output: &mut dyn Write,
    ) -> Result<ProcessingReport, String> {
        let accounts = Arc::new(InMemoryAccountStore::with_lock_timeout(self.ledger.lock_timeout));
        let transactions = Arc::new(InMemoryTransactionStore::new());
        let engine = LedgerEngine::new(Arc::clone(&accounts), transactions);

        load_accounts(accounts_path, accounts.as_ref())?;
        let reader = SyncReader::<TransferCsvRecord>::new(transfers_path)?;

        let mut report = ProcessingReport::default();
        let mut position = 0;
        for result in reader {
            match result {
                Ok(instruction) => {
                    report.record(position, engine.submit(instruction));
                    position += 1;
                }
                Err(e) => tracing::warn!(error = %e, "Skipping transfer row"),
            }
        }

        write_accounts_csv(&accounts.all(), output)?;

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::test_support::{create_temp_csv, ACCOUNTS};

    const HEADER: &str = "origin,origin_cpf,destination,amount,mcc,merchant\n";

    fn run(transfers: &str) -> (ProcessingReport, String) {
        let accounts = create_temp_csv(ACCOUNTS);
        let transfers = create_temp_csv(&format!("{}{}", HEADER, transfers));
        let strategy = SyncProcessingStrategy::new(LedgerConfig::default());
        let mut output = Vec::new();

        let report = strategy
            .process(accounts.path(), transfers.path(), &mut output)
            .unwrap();
        (report, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_sync_strategy_applies_transfers_in_order() {
        // The third transfer only succeeds because the second refilled account 2.
        let (report, output) = run(
            "1,,2,30.00,6011,ATM\n\
             1,,2,20.00,6011,ATM\n\
             2,,3,50.00,6011,ATM\n",
        );

        assert_eq!(report.authorized, 3);
        assert!(output.contains("1,11111111111,100.00,20.00,0.00\n"));
        assert!(output.contains("2,22222222222,0.00,0.00,0.00\n"));
        assert!(output.contains("3,33333333333,10.00,10.00,60.00\n"));
    }

    #[test]
    fn test_sync_strategy_records_denials() {
        let (report, _) = run("1,,2,20.01,5811,RESTAURANTE\n");

        assert_eq!(report.denied, 1);
        assert_eq!(
            report.transactions[0].message,
            "transaction denied: insufficient funds in meal balance"
        );
    }

    #[test]
    fn test_sync_strategy_continues_on_malformed_record() {
        let (report, output) = run(
            "1,,2,oops,5411,MERCADO\n\
             1,,9,1.00,5411,MERCADO\n\
             1,,2,1.00,5411,MERCADO\n",
        );

        assert_eq!((report.authorized, report.denied, report.rejected), (1, 0, 1));
        assert!(output.contains("1,11111111111,99.00,20.00,50.00\n"));
    }

    #[test]
    fn test_sync_strategy_handles_missing_file() {
        let strategy = SyncProcessingStrategy::new(LedgerConfig::default());
        let accounts = create_temp_csv(ACCOUNTS);
        let mut output = Vec::new();

        let result = strategy.process(accounts.path(), Path::new("nonexistent.csv"), &mut output);
        assert!(result.unwrap_err().contains("Failed to open file"));
    }

    #[test]
    fn test_sync_strategy_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SyncProcessingStrategy>();
    }
}
