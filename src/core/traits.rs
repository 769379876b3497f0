//! Core traits for account and transaction persistence
//!
//! The ledger engine only talks to storage through these traits, so the
//! in-memory stores shipped with the crate can be swapped for a database-backed
//! implementation without touching the engine.

use crate::types::{Account, AccountId, PersistenceError, Transaction, TransactionId};

/// Durable access to Account records
///
/// Implementations must make `atomic_update` run with exclusive access to the
/// named accounts: two updates sharing an account are linearized, updates on
/// disjoint accounts may run in parallel.
pub trait AccountStore: Send + Sync {
    /// Get a snapshot of an account by id
    ///
    /// May wait for an update in progress on that account to finish.
    fn get(&self, id: AccountId) -> Option<Account>;

    /// Get a snapshot of an account by its national identifier (CPF)
    fn get_by_identifier(&self, cpf: &str) -> Option<Account>;

    /// Whether the account exists; never waits on an account lock
    fn contains(&self, id: AccountId) -> bool;

    /// Id of the account registered under a CPF; never waits on an account lock
    fn id_by_identifier(&self, cpf: &str) -> Option<AccountId>;

    /// Register a new account
    ///
    /// Fails when the id or the identifier is already taken, or when any
    /// opening balance is negative.
    fn insert(&self, account: Account) -> Result<(), PersistenceError>;

    /// Run `f` with exclusive access to the named accounts
    ///
    /// `f` receives one slot per id, in the order given; a slot is `None` when
    /// the account does not exist. Changes made to the slots are written back
    /// only if `f` returns `Ok`. On `Err`, or if the locks cannot be acquired
    /// in time, the store is left untouched.
    ///
    /// The store may still refuse an `Ok` result that breaks an account
    /// invariant. Anything `f` does outside the slots is not undone then, so
    /// `f` must check the invariants itself before any such side effect.
    fn atomic_update<T, E, F>(&self, ids: &[AccountId], f: F) -> Result<T, E>
    where
        F: FnOnce(&mut [Option<Account>]) -> Result<T, E>,
        E: From<PersistenceError>;

    /// Snapshot of every account
    fn all(&self) -> Vec<Account>;
}

/// Append-only storage for transaction records
pub trait TransactionStore: Send + Sync {
    /// Durably append a transaction record
    fn append(&self, transaction: Transaction) -> Result<(), PersistenceError>;

    /// Get a transaction by id
    fn get(&self, id: TransactionId) -> Option<Transaction>;

    /// Every transaction the account took part in, oldest first
    fn by_account(&self, account: AccountId) -> Vec<Transaction>;

    /// Every transaction, in append order
    fn all(&self) -> Vec<Transaction>;
}
