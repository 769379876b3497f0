//! Ledger transaction engine
//!
//! This module provides `LedgerEngine`, which turns a validated transfer into a
//! persisted transaction record.
//!
//! # Protocol
//!
//! Everything below runs inside one `AccountStore::atomic_update` scope over
//! the origin and destination accounts:
//!
//! 1. Re-read the origin (it may have vanished since validation)
//! 2. Classify the MCC into a balance category
//! 3. Authorize when the origin's category balance covers the amount,
//!    otherwise deny with an insufficient-funds message
//! 4. When authorized, debit the origin and credit the destination in that
//!    category, exactly once
//! 5. Append the transaction record, authorized or denied
//!
//! The store writes balances back only when the scope returns `Ok`, so a failed
//! append or a lock timeout leaves neither a record nor a balance change.
//!
//! # Thread Safety
//!
//! The engine is cloneable and can be shared across threads and tasks. Both
//! stores are held in `Arc`s; serialization of transfers that share an account
//! is the store's job.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::classifier::classify;
use super::traits::{AccountStore, TransactionStore};
use super::validator::{validate, ValidatedTransfer};
use crate::types::{
    Account, AccountId, OriginRef, PersistenceError, StatusCode, Transaction, TransferError,
    TransferInstruction, TransferRequest, ValidationError,
};

const AUTHORIZED_MESSAGE: &str = "transaction authorized";

/// Transfer orchestrator
///
/// Takes its Account Store and Transaction Store at construction; there is no
/// process-wide state.
#[derive(Debug)]
pub struct LedgerEngine<A, T>
where
    A: AccountStore,
    T: TransactionStore,
{
    accounts: Arc<A>,
    transactions: Arc<T>,
}

impl<A, T> Clone for LedgerEngine<A, T>
where
    A: AccountStore,
    T: TransactionStore,
{
    fn clone(&self) -> Self {
        Self {
            accounts: Arc::clone(&self.accounts),
            transactions: Arc::clone(&self.transactions),
        }
    }
}

impl<A, T> LedgerEngine<A, T>
where
    A: AccountStore,
    T: TransactionStore,
{
    pub fn new(accounts: Arc<A>, transactions: Arc<T>) -> Self {
        Self {
            accounts,
            transactions,
        }
    }

    pub fn accounts(&self) -> &A {
        &self.accounts
    }

    pub fn transactions(&self) -> &T {
        &self.transactions
    }

    /// Validate a request against this engine's Account Store
    pub fn validate(&self, request: TransferRequest) -> Result<ValidatedTransfer, ValidationError> {
        validate(self.accounts.as_ref(), request)
    }

    /// Validate and execute a transfer
    pub fn transfer(&self, request: TransferRequest) -> Result<Transaction, TransferError> {
        let validated = self.validate(request)?;
        self.execute_transfer(validated)
    }

    /// Resolve the origin account id from a national identifier
    pub fn resolve_origin(&self, cpf: &str) -> Result<AccountId, TransferError> {
        self.accounts
            .id_by_identifier(cpf)
            .ok_or_else(|| TransferError::UnknownOriginIdentifier {
                cpf: cpf.to_string(),
            })
    }

    /// Turn a submitted instruction into a transfer request
    pub fn resolve(&self, instruction: TransferInstruction) -> Result<TransferRequest, TransferError> {
        let origin = match &instruction.origin {
            OriginRef::Id(id) => *id,
            OriginRef::Identifier(cpf) => self.resolve_origin(cpf)?,
        };

        Ok(TransferRequest {
            origin,
            destination: instruction.destination,
            amount: instruction.amount,
            mcc: instruction.mcc,
            merchant: instruction.merchant,
        })
    }

    /// Resolve, validate and execute an instruction
    pub fn submit(&self, instruction: TransferInstruction) -> Result<Transaction, TransferError> {
        let request = self.resolve(instruction)?;
        self.transfer(request)
    }

    /// Execute a validated transfer atomically
    ///
    /// # Returns
    ///
    /// * `Ok(Transaction)` - The persisted record; its `status` tells whether
    ///   the transfer was authorized or denied for insufficient funds
    /// * `Err(TransferError::OriginNotFound)` - The origin no longer exists
    /// * `Err(TransferError::Validation(DestinationNotFound))` - The destination
    ///   vanished after validation
    /// * `Err(TransferError::ArithmeticOverflow)` - The credit would overflow
    /// * `Err(TransferError::Persistence)` - Lock timeout or store failure
    ///
    /// Every `Err` leaves the stores exactly as they were.
    pub fn execute_transfer(
        &self,
        transfer: ValidatedTransfer,
    ) -> Result<Transaction, TransferError> {
        let request = transfer.request();
        let category = classify(&request.mcc);

        let transaction = self.accounts.atomic_update(
            &[request.origin, request.destination],
            |slots| -> Result<Transaction, TransferError> {
                let [origin, destination] = slots else {
                    return Err(PersistenceError::unavailable("malformed atomic scope").into());
                };
                let origin = origin
                    .as_mut()
                    .ok_or_else(|| TransferError::origin_not_found(request.origin))?;
                let destination = destination
                    .as_mut()
                    .ok_or_else(|| TransferError::destination_not_found(request.destination))?;

                let available = origin.balances.get(category);
                let (status, message) = if available < request.amount {
                    (
                        StatusCode::Denied,
                        format!("transaction denied: insufficient funds in {} balance", category),
                    )
                } else {
                    (StatusCode::Authorized, AUTHORIZED_MESSAGE.to_string())
                };

                if status == StatusCode::Authorized {
                    let credited = destination
                        .balances
                        .get(category)
                        .checked_add(request.amount)
                        .ok_or_else(|| TransferError::arithmetic_overflow(destination.id, category))?;
                    *origin.balances.get_mut(category) = available - request.amount;
                    *destination.balances.get_mut(category) = credited;
                }

                // The record must only be appended for balances the store will accept.
                ensure_non_negative(origin)?;
                ensure_non_negative(destination)?;

                let transaction = Transaction {
                    id: Uuid::new_v4(),
                    origin: request.origin,
                    destination: request.destination,
                    amount: request.amount,
                    mcc: request.mcc.clone(),
                    merchant: request.merchant.clone(),
                    category,
                    status,
                    message,
                    created_at: Utc::now(),
                };
                self.transactions.append(transaction.clone())?;

                Ok(transaction)
            },
        )?;

        match transaction.status {
            StatusCode::Authorized => tracing::debug!(
                transaction = %transaction.id,
                origin = transaction.origin,
                destination = transaction.destination,
                amount = %transaction.amount,
                category = %category,
                "Transfer authorized"
            ),
            StatusCode::Denied => tracing::info!(
                transaction = %transaction.id,
                origin = transaction.origin,
                amount = %transaction.amount,
                category = %category,
                "Transfer denied: insufficient funds"
            ),
        }

        Ok(transaction)
    }
}

fn ensure_non_negative(account: &Account) -> Result<(), TransferError> {
    if account.balances.is_non_negative() {
        Ok(())
    } else {
        Err(PersistenceError::invalid_account(account.id, "balances must not be negative").into())
    }
}

/// Sum of every balance across all accounts in a store
///
/// Transfers only move value, so this total is invariant under any sequence
/// of committed transfers.
pub fn total_holdings<A: AccountStore>(accounts: &A) -> Decimal {
    accounts
        .all()
        .iter()
        .map(|account| account.balances.food + account.balances.meal + account.balances.cash)
        .sum()
}
