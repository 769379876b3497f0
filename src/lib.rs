//! Wallet Ledger Library
//! # Overview
//!
//! This library implements the ledger of a prepaid benefits wallet: accounts
//! hold three segregated balances, and transfers between accounts draw from the
//! balance selected by the merchant category code (MCC). Transfers are applied
//! atomically and every attempt that reaches the ledger leaves an immutable
//! transaction record, authorized or denied.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Account, Balances, Transaction, errors)
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Business logic components:
//!   - [`core::classifier`] - MCC to balance-category mapping
//!   - [`core::validator`] - Structural checks on a transfer request
//!   - [`core::engine`] - Atomic transfer execution
//!   - [`core::account_store`] - Account Store with per-account locking
//!   - [`core::transaction_store`] - Append-only transaction log
//!   - [`core::batch_processor`] - Parallel execution of transfer batches
//! - [`io`] - CSV input and output
//! - [`strategy`] - Sync and async processing pipelines
//!
//! # Balance Categories
//!
//! - **food**: MCC 5411, 5412
//! - **meal**: MCC 5811, 5812
//! - **cash**: every other MCC
//!
//! A transfer is authorized only when the origin's balance in its category
//! covers the full amount; the other categories never make up a shortfall.

pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{
    classify, AccountStore, InMemoryAccountStore, InMemoryTransactionStore, LedgerEngine,
    TransactionStore,
};
pub use io::{write_accounts_csv, write_transactions_csv};
pub use types::{
    Account, AccountId, Balances, Category, StatusCode, Transaction, TransactionId, TransferError,
    TransferRequest, ValidationError,
};
