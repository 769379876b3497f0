//! Transaction-related types for the wallet ledger
//!
//! This module defines balance categories, authorization outcomes, the transfer
//! request consumed by the engine, and the persisted transaction record it produces.

use super::account::AccountId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;
use uuid::Uuid;

/// Transaction identifier
pub type TransactionId = Uuid;

/// Segregated balance category an MCC draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Food,
    Meal,
    Cash,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Food, Category::Meal, Category::Cash];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Meal => "meal",
            Category::Cash => "cash",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Business outcome of a transfer attempt
///
/// Both variants are successfully recorded results, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Authorized,
    Denied,
}

impl StatusCode {
    /// Legacy status code string ("200" authorized, "500" denied)
    pub fn code(&self) -> &'static str {
        match self {
            StatusCode::Authorized => "200",
            StatusCode::Denied => "500",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCode::Authorized => "AUTHORIZED",
            StatusCode::Denied => "DENIED",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Proposed transfer between two accounts
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    /// Account debited when authorized
    pub origin: AccountId,

    /// Account credited when authorized
    pub destination: AccountId,

    /// Positive amount moved between the two accounts
    pub amount: Decimal,

    /// Merchant category code selecting the balance category
    pub mcc: String,

    /// Free-text merchant label
    pub merchant: String,
}

/// How a transfer names its origin account
#[derive(Debug, Clone, PartialEq)]
pub enum OriginRef {
    /// Account id
    Id(AccountId),
    /// National identifier (CPF) of the account holder
    Identifier(String),
}

/// Transfer as submitted by a caller, before the origin is resolved
#[derive(Debug, Clone, PartialEq)]
pub struct TransferInstruction {
    pub origin: OriginRef,
    pub destination: AccountId,
    pub amount: Decimal,
    pub mcc: String,
    pub merchant: String,
}

/// Persisted record of one transfer attempt
///
/// Written exactly once per attempt that reaches the engine's atomic scope,
/// whether authorized or denied, and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: TransactionId,
    pub origin: AccountId,
    pub destination: AccountId,
    pub amount: Decimal,
    pub mcc: String,
    pub merchant: String,

    /// Category the MCC was classified into
    pub category: Category,

    pub status: StatusCode,

    /// Human-readable outcome description
    pub message: String,

    /// Set when the record is persisted
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_authorized(&self) -> bool {
        self.status == StatusCode::Authorized
    }

    /// Whether the given account took part in this transaction
    pub fn involves(&self, account: AccountId) -> bool {
        self.origin == account || self.destination == account
    }
}
