//! Error types for the wallet ledger
//!
//! Errors are split by who has to act on them:
//!
//! - **ValidationError**: the request is structurally invalid; never retried.
//! - **PersistenceError**: an Account Store or Transaction Store failure (lock
//!   timeout, constraint violation, unavailable backend); the caller may retry.
//! - **TransferError**: everything the engine can return, wrapping the two above.
//!
//! An insufficient-funds denial is not an error. It is a recorded transaction
//! with `StatusCode::Denied`.

use crate::types::{AccountId, Category, TransactionId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Structural problems with a transfer request
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Origin and destination are the same account
    #[error("Origin and destination must differ (account {account})")]
    SameAccount {
        /// The account used on both sides
        account: AccountId,
    },

    /// Amount is zero or negative
    #[error("Transfer amount must be positive, got {amount}")]
    NonPositiveAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// Amount carries fractions of a cent
    #[error("Transfer amount must be in whole cents, got {amount}")]
    SubCentAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// Destination account does not exist
    #[error("Destination account {account} not found")]
    DestinationNotFound {
        /// The missing account
        account: AccountId,
    },
}

/// Store-level failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PersistenceError {
    /// An account lock could not be acquired in time
    ///
    /// Nothing was applied; the attempt can be retried.
    #[error("Timed out after {timeout_ms}ms waiting for account {account}")]
    LockTimeout {
        /// The account whose lock was contended
        account: AccountId,
        /// The configured lock timeout
        timeout_ms: u64,
    },

    /// An account with this id already exists
    #[error("Account {account} already exists")]
    DuplicateAccount {
        /// The duplicated id
        account: AccountId,
    },

    /// An account with this national identifier already exists
    #[error("An account with identifier {cpf} already exists")]
    DuplicateIdentifier {
        /// The duplicated identifier
        cpf: String,
    },

    /// The account violates a store constraint
    #[error("Account {account} rejected: {reason}")]
    InvalidAccount {
        /// The rejected account
        account: AccountId,
        /// Which constraint was violated
        reason: String,
    },

    /// A transaction with this id was already appended
    #[error("Transaction {id} already recorded")]
    DuplicateTransaction {
        /// The duplicated transaction id
        id: TransactionId,
    },

    /// The same account was named twice in one atomic scope
    #[error("Account {account} appears more than once in an atomic update")]
    ConflictingScope {
        /// The repeated account
        account: AccountId,
    },

    /// The backing store could not serve the request
    #[error("Store unavailable: {message}")]
    Unavailable {
        /// Description of the failure
        message: String,
    },
}

/// How a caller should react to a failed transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request itself was bad; do not retry it unchanged
    Rejected,
    /// The system could not process the request; try again
    Unavailable,
}

/// Failures returned by the ledger engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransferError {
    /// The request failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The origin account vanished before execution
    #[error("Origin account {account} not found")]
    OriginNotFound {
        /// The missing account
        account: AccountId,
    },

    /// No account carries the given national identifier
    #[error("No origin account with identifier {cpf}")]
    UnknownOriginIdentifier {
        /// The identifier that was looked up
        cpf: String,
    },

    /// Crediting the destination would overflow the decimal range
    #[error("Arithmetic overflow crediting {category} balance of account {account}")]
    ArithmeticOverflow {
        /// The account being credited
        account: AccountId,
        /// The category being credited
        category: Category,
    },

    /// Account Store or Transaction Store failure
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl TransferError {
    /// Create an OriginNotFound error
    pub fn origin_not_found(account: AccountId) -> Self {
        TransferError::OriginNotFound { account }
    }

    /// Create a DestinationNotFound validation error
    pub fn destination_not_found(account: AccountId) -> Self {
        TransferError::Validation(ValidationError::DestinationNotFound { account })
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(account: AccountId, category: Category) -> Self {
        TransferError::ArithmeticOverflow { account, category }
    }

    /// Whether the caller made a bad request or the system failed
    pub fn kind(&self) -> FailureKind {
        match self {
            TransferError::Persistence(_) => FailureKind::Unavailable,
            TransferError::Validation(_)
            | TransferError::OriginNotFound { .. }
            | TransferError::UnknownOriginIdentifier { .. }
            | TransferError::ArithmeticOverflow { .. } => FailureKind::Rejected,
        }
    }
}

impl PersistenceError {
    /// Create a LockTimeout error
    pub fn lock_timeout(account: AccountId, timeout_ms: u64) -> Self {
        PersistenceError::LockTimeout {
            account,
            timeout_ms,
        }
    }

    /// Create an InvalidAccount error
    pub fn invalid_account(account: AccountId, reason: &str) -> Self {
        PersistenceError::InvalidAccount {
            account,
            reason: reason.to_string(),
        }
    }

    /// Create an Unavailable error
    pub fn unavailable(message: &str) -> Self {
        PersistenceError::Unavailable {
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::same_account(
        TransferError::Validation(ValidationError::SameAccount { account: 7 }),
        "Origin and destination must differ (account 7)"
    )]
    #[case::non_positive_amount(
        TransferError::Validation(ValidationError::NonPositiveAmount { amount: Decimal::new(-150, 2) }),
        "Transfer amount must be positive, got -1.50"
    )]
    #[case::sub_cent_amount(
        TransferError::Validation(ValidationError::SubCentAmount { amount: Decimal::new(4, 3) }),
        "Transfer amount must be in whole cents, got 0.004"
    )]
    #[case::destination_not_found(
        TransferError::destination_not_found(42),
        "Destination account 42 not found"
    )]
    #[case::origin_not_found(
        TransferError::origin_not_found(3),
        "Origin account 3 not found"
    )]
    #[case::unknown_identifier(
        TransferError::UnknownOriginIdentifier { cpf: "00000000000".to_string() },
        "No origin account with identifier 00000000000"
    )]
    #[case::overflow(
        TransferError::arithmetic_overflow(2, Category::Meal),
        "Arithmetic overflow crediting meal balance of account 2"
    )]
    #[case::lock_timeout(
        TransferError::Persistence(PersistenceError::lock_timeout(1, 250)),
        "Timed out after 250ms waiting for account 1"
    )]
    #[case::unavailable(
        TransferError::Persistence(PersistenceError::unavailable("disk full")),
        "Store unavailable: disk full"
    )]
    fn test_error_display(#[case] error: TransferError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::validation(TransferError::Validation(ValidationError::SameAccount { account: 1 }), FailureKind::Rejected)]
    #[case::origin(TransferError::origin_not_found(1), FailureKind::Rejected)]
    #[case::overflow(TransferError::arithmetic_overflow(1, Category::Cash), FailureKind::Rejected)]
    #[case::timeout(TransferError::Persistence(PersistenceError::lock_timeout(1, 10)), FailureKind::Unavailable)]
    #[case::duplicate(
        TransferError::Persistence(PersistenceError::DuplicateTransaction { id: uuid::Uuid::nil() }),
        FailureKind::Unavailable
    )]
    fn test_failure_kind(#[case] error: TransferError, #[case] expected: FailureKind) {
        assert_eq!(error.kind(), expected);
    }

    #[test]
    fn test_conversions() {
        let error: TransferError = ValidationError::DestinationNotFound { account: 9 }.into();
        assert_eq!(error, TransferError::destination_not_found(9));

        let error: TransferError = PersistenceError::unavailable("down").into();
        assert!(matches!(error, TransferError::Persistence(PersistenceError::Unavailable { .. })));
    }
}
