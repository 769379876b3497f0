//! Append-only in-memory transaction log
//!
//! Records are kept in append order behind a `parking_lot::RwLock`, with a
//! `DashMap` index from transaction id to log position. Records are never
//! mutated or removed once appended.

use dashmap::DashMap;
use parking_lot::RwLock;

use super::traits::TransactionStore;
use crate::types::{AccountId, PersistenceError, Transaction, TransactionId};

/// In-memory `TransactionStore`
#[derive(Debug, Default)]
pub struct InMemoryTransactionStore {
    /// Records in append order
    log: RwLock<Vec<Transaction>>,

    /// Log position by transaction id
    index: DashMap<TransactionId, usize>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.log.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.read().is_empty()
    }
}

impl TransactionStore for InMemoryTransactionStore {
    fn append(&self, transaction: Transaction) -> Result<(), PersistenceError> {
        let mut log = self.log.write();
        if self.index.contains_key(&transaction.id) {
            return Err(PersistenceError::DuplicateTransaction { id: transaction.id });
        }

        self.index.insert(transaction.id, log.len());
        log.push(transaction);
        Ok(())
    }

    fn get(&self, id: TransactionId) -> Option<Transaction> {
        let position = *self.index.get(&id)?;
        self.log.read().get(position).cloned()
    }

    fn by_account(&self, account: AccountId) -> Vec<Transaction> {
        self.log
            .read()
            .iter()
            .filter(|transaction| transaction.involves(account))
            .cloned()
            .collect()
    }

    fn all(&self) -> Vec<Transaction> {
        self.log.read().clone()
    }
}
