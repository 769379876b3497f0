//! Core business logic module
//!
//! This module contains the ledger components:
//! - `traits` - Account Store and Transaction Store abstractions
//! - `classifier` - MCC to balance-category mapping
//! - `validator` - Structural checks before any mutation
//! - `engine` - Atomic transfer execution
//! - `account_store` - In-memory Account Store with per-account locking
//! - `transaction_store` - In-memory append-only transaction log
//! - `batch_processor` - Concurrent execution of transfer batches

pub mod account_store;
pub mod batch_processor;
pub mod classifier;
pub mod engine;
pub mod traits;
pub mod transaction_store;
pub mod validator;

pub use account_store::{InMemoryAccountStore, DEFAULT_LOCK_TIMEOUT};
pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use classifier::classify;
pub use engine::{total_holdings, LedgerEngine};
pub use traits::{AccountStore, TransactionStore};
pub use transaction_store::InMemoryTransactionStore;
pub use validator::{validate, ValidatedTransfer};
