//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account, balances and credential types
//! - `transaction`: Categories, outcomes, transfer requests and records
//! - `error`: Error types for the ledger

pub mod account;
pub mod error;
pub mod transaction;

pub use account::{Account, AccountId, Balances, CredentialHash, CPF_LEN, MONEY_SCALE};
pub use error::{FailureKind, PersistenceError, TransferError, ValidationError};
pub use transaction::{
    Category, OriginRef, StatusCode, Transaction, TransactionId, TransferInstruction,
    TransferRequest,
};
