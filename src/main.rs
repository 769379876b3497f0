//! Wallet Ledger CLI
//!
//! Applies prepaid wallet transfers to accounts loaded from CSV.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --accounts accounts.csv transfers.csv > balances.csv
//! cargo run -- --strategy sync --accounts accounts.csv transfers.csv > balances.csv
//! cargo run -- --accounts accounts.csv --ledger ledger.csv --log-level info transfers.csv > balances.csv
//! cargo run -- --batch-size 2000 --max-concurrent 8 --accounts accounts.csv transfers.csv > balances.csv
//! ```
//!
//! Final balances go to stdout; logs go to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (file not found, file not readable, output failure, etc.)

use std::fs::File;
use std::process;
use wallet_ledger::cli;
use wallet_ledger::io::write_transactions_csv;
use wallet_ledger::strategy;

fn main() {
    let args = cli::parse_args();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(args.log_level)
        .init();

    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy.clone(), config, args.to_ledger_config())
    };

    let mut output = std::io::stdout();
    let report = match strategy.process(&args.accounts_file, &args.transfers_file, &mut output) {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("{}", e);
            process::exit(1);
        }
    };

    if let Some(path) = &args.ledger_file {
        let written = File::create(path)
            .map_err(|e| format!("Failed to create ledger file '{}': {}", path.display(), e))
            .and_then(|mut file| write_transactions_csv(&report.transactions, &mut file));
        if let Err(e) = written {
            tracing::error!("{}", e);
            process::exit(1);
        }
    }

    tracing::info!(
        authorized = report.authorized,
        denied = report.denied,
        rejected = report.rejected,
        "Processing complete"
    );
}
