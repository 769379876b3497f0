//! Thread-safe in-memory Account Store
//!
//! This module provides `InMemoryAccountStore`, the `AccountStore` used by the
//! CLI and the tests.
//!
//! # Design
//!
//! Accounts live in a `DashMap` keyed by id. Each account sits behind its own
//! `parking_lot::Mutex`, so an atomic update can hold several accounts at once
//! without holding any DashMap shard lock. A second `DashMap` indexes accounts
//! by CPF.
//!
//! # Locking
//!
//! `atomic_update` locks exactly the accounts it names, in ascending id order,
//! so two scopes that overlap can never deadlock. Each lock is acquired with
//! `try_lock_for`; when the configured timeout elapses the update fails with
//! `PersistenceError::LockTimeout` and nothing is applied.
//!
//! The closure works on copies. Balances are written back only after it
//! returns `Ok` and the new balances pass the non-negative check, which is what
//! makes the read-modify-write all-or-nothing.

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;

use super::traits::AccountStore;
use crate::types::{Account, AccountId, PersistenceError};

/// Lock timeout used when none is configured
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// In-memory `AccountStore` with per-account locking
#[derive(Debug)]
pub struct InMemoryAccountStore {
    /// Accounts by id, each behind its own lock
    accounts: DashMap<AccountId, Arc<Mutex<Account>>>,

    /// Account ids by CPF
    identifiers: DashMap<String, AccountId>,

    /// How long `atomic_update` waits for each account lock
    lock_timeout: Duration,
}

impl InMemoryAccountStore {
    /// Create an empty store with the default lock timeout
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    /// Create an empty store with a custom lock timeout
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            accounts: DashMap::new(),
            identifiers: DashMap::new(),
            lock_timeout,
        }
    }

    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn handle(&self, id: AccountId) -> Option<Arc<Mutex<Account>>> {
        self.accounts.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.lock_timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for InMemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountStore for InMemoryAccountStore {
    fn get(&self, id: AccountId) -> Option<Account> {
        self.handle(id).map(|handle| handle.lock().clone())
    }

    fn get_by_identifier(&self, cpf: &str) -> Option<Account> {
        self.get(self.id_by_identifier(cpf)?)
    }

    fn contains(&self, id: AccountId) -> bool {
        self.accounts.contains_key(&id)
    }

    fn id_by_identifier(&self, cpf: &str) -> Option<AccountId> {
        self.identifiers.get(cpf).map(|entry| *entry.value())
    }

    fn insert(&self, account: Account) -> Result<(), PersistenceError> {
        if !account.balances.is_non_negative() {
            return Err(PersistenceError::invalid_account(
                account.id,
                "opening balances must not be negative",
            ));
        }

        // Identifier entry first, then account entry; nothing else takes both.
        match self.identifiers.entry(account.cpf.clone()) {
            Entry::Occupied(_) => Err(PersistenceError::DuplicateIdentifier {
                cpf: account.cpf.clone(),
            }),
            Entry::Vacant(identifier_slot) => match self.accounts.entry(account.id) {
                Entry::Occupied(_) => Err(PersistenceError::DuplicateAccount {
                    account: account.id,
                }),
                Entry::Vacant(account_slot) => {
                    identifier_slot.insert(account.id);
                    account_slot.insert(Arc::new(Mutex::new(account)));
                    Ok(())
                }
            },
        }
    }

    fn atomic_update<T, E, F>(&self, ids: &[AccountId], f: F) -> Result<T, E>
    where
        F: FnOnce(&mut [Option<Account>]) -> Result<T, E>,
        E: From<PersistenceError>,
    {
        let mut scope = ids.to_vec();
        scope.sort_unstable();
        if let Some(pair) = scope.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(PersistenceError::ConflictingScope { account: pair[0] }.into());
        }

        let handles: Vec<(AccountId, Arc<Mutex<Account>>)> = scope
            .iter()
            .filter_map(|id| self.handle(*id).map(|handle| (*id, handle)))
            .collect();

        // Ascending id order
        let mut guards = Vec::with_capacity(handles.len());
        for (id, handle) in &handles {
            let guard = handle
                .try_lock_for(self.lock_timeout)
                .ok_or_else(|| PersistenceError::lock_timeout(*id, self.timeout_ms()))?;
            guards.push((*id, guard));
        }

        let mut slots: Vec<Option<Account>> = ids
            .iter()
            .map(|id| {
                guards
                    .iter()
                    .find(|(locked, _)| locked == id)
                    .map(|(_, guard)| (**guard).clone())
            })
            .collect();

        let result = f(&mut slots)?;

        for updated in slots.iter().flatten() {
            if !updated.balances.is_non_negative() {
                return Err(PersistenceError::invalid_account(
                    updated.id,
                    "balances must not be negative",
                )
                .into());
            }
        }

        // Only balances are mutable after creation.
        for (id, slot) in ids.iter().zip(slots) {
            if let (Some(updated), Some((_, guard))) =
                (slot, guards.iter_mut().find(|(locked, _)| locked == id))
            {
                guard.balances = updated.balances;
            }
        }

        Ok(result)
    }

    fn all(&self) -> Vec<Account> {
        let handles: Vec<Arc<Mutex<Account>>> = self
            .accounts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut accounts: Vec<Account> = handles.iter().map(|handle| handle.lock().clone()).collect();
        accounts.sort_by_key(|account| account.id);
        accounts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Balances;
    use rust_decimal::Decimal;
    use std::sync::mpsc;
    use std::thread;

    fn account(id: AccountId, cpf: &str, cash: i64) -> Account {
        Account::new(
            id,
            cpf,
            Balances::new(Decimal::ZERO, Decimal::ZERO, Decimal::new(cash, 2)),
        )
    }

    fn seeded_store() -> InMemoryAccountStore {
        let store = InMemoryAccountStore::new();
        store.insert(account(1, "11111111111", 10000)).unwrap();
        store.insert(account(2, "22222222222", 0)).unwrap();
        store
    }

    #[test]
    fn test_insert_and_get() {
        let store = seeded_store();

        let account = store.get(1).unwrap();
        assert_eq!(account.cpf, "11111111111");
        assert_eq!(account.balances.cash, Decimal::new(10000, 2));
        assert!(store.get(3).is_none());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_get_by_identifier() {
        let store = seeded_store();

        assert_eq!(store.get_by_identifier("22222222222").unwrap().id, 2);
        assert!(store.get_by_identifier("99999999999").is_none());
    }

    #[test]
    fn test_lookups_do_not_wait_on_held_lock() {
        let store = Arc::new(seeded_store());
        let (locked_tx, locked_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let holder = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let result: Result<(), PersistenceError> = store.atomic_update(&[1, 2], |_| {
                    locked_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                    Ok(())
                });
                result.unwrap();
            })
        };

        locked_rx.recv().unwrap();
        let found = (
            store.contains(1),
            store.contains(3),
            store.id_by_identifier("22222222222"),
            store.id_by_identifier("99999999999"),
        );
        release_tx.send(()).unwrap();
        holder.join().unwrap();

        assert_eq!(found, (true, false, Some(2), None));
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let store = seeded_store();

        let result = store.insert(account(1, "33333333333", 0));
        assert_eq!(result, Err(PersistenceError::DuplicateAccount { account: 1 }));
        assert!(store.get_by_identifier("33333333333").is_none());
    }

    #[test]
    fn test_insert_rejects_duplicate_identifier() {
        let store = seeded_store();

        let result = store.insert(account(3, "11111111111", 0));
        assert_eq!(
            result,
            Err(PersistenceError::DuplicateIdentifier {
                cpf: "11111111111".to_string()
            })
        );
        assert!(store.get(3).is_none());
    }

    #[test]
    fn test_insert_rejects_negative_balance() {
        let store = InMemoryAccountStore::new();

        let result = store.insert(account(1, "11111111111", -1));
        assert!(matches!(
            result,
            Err(PersistenceError::InvalidAccount { account: 1, .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_atomic_update_commits_balances() {
        let store = seeded_store();

        let result: Result<(), PersistenceError> = store.atomic_update(&[1, 2], |slots| {
            slots[0].as_mut().unwrap().balances.cash -= Decimal::new(2500, 2);
            slots[1].as_mut().unwrap().balances.cash += Decimal::new(2500, 2);
            Ok(())
        });

        assert!(result.is_ok());
        assert_eq!(store.get(1).unwrap().balances.cash, Decimal::new(7500, 2));
        assert_eq!(store.get(2).unwrap().balances.cash, Decimal::new(2500, 2));
    }

    #[test]
    fn test_atomic_update_slots_follow_requested_order() {
        let store = seeded_store();

        let ids: Result<Vec<AccountId>, PersistenceError> = store.atomic_update(&[2, 1], |slots| {
            Ok(slots.iter().flatten().map(|account| account.id).collect())
        });

        assert_eq!(ids.unwrap(), vec![2, 1]);
    }

    #[test]
    fn test_atomic_update_rolls_back_on_error() {
        let store = seeded_store();

        let result: Result<(), PersistenceError> = store.atomic_update(&[1, 2], |slots| {
            slots[0].as_mut().unwrap().balances.cash = Decimal::ZERO;
            Err(PersistenceError::unavailable("write failed"))
        });

        assert!(result.is_err());
        assert_eq!(store.get(1).unwrap().balances.cash, Decimal::new(10000, 2));
    }

    #[test]
    fn test_atomic_update_rejects_negative_result() {
        let store = seeded_store();

        let result: Result<(), PersistenceError> = store.atomic_update(&[2], |slots| {
            slots[0].as_mut().unwrap().balances.cash -= Decimal::ONE;
            Ok(())
        });

        assert!(matches!(
            result,
            Err(PersistenceError::InvalidAccount { account: 2, .. })
        ));
        assert_eq!(store.get(2).unwrap().balances.cash, Decimal::ZERO);
    }

    #[test]
    fn test_atomic_update_missing_account_is_none() {
        let store = seeded_store();

        let result: Result<bool, PersistenceError> =
            store.atomic_update(&[1, 99], |slots| Ok(slots[1].is_none()));

        assert!(result.unwrap());
        assert!(store.get(99).is_none());
    }

    #[test]
    fn test_atomic_update_keeps_identity_fields() {
        let store = seeded_store();

        let result: Result<(), PersistenceError> = store.atomic_update(&[1], |slots| {
            let account = slots[0].as_mut().unwrap();
            account.cpf = "00000000000".to_string();
            account.balances.food = Decimal::ONE;
            Ok(())
        });

        assert!(result.is_ok());
        let account = store.get(1).unwrap();
        assert_eq!(account.cpf, "11111111111");
        assert_eq!(account.balances.food, Decimal::ONE);
    }

    #[test]
    fn test_atomic_update_rejects_repeated_account() {
        let store = seeded_store();

        let result: Result<(), PersistenceError> = store.atomic_update(&[1, 1], |_| Ok(()));
        assert_eq!(result, Err(PersistenceError::ConflictingScope { account: 1 }));
    }

    #[test]
    fn test_atomic_update_times_out_on_held_lock() {
        let store = Arc::new(InMemoryAccountStore::with_lock_timeout(Duration::from_millis(20)));
        store.insert(account(1, "11111111111", 100)).unwrap();

        let (locked_tx, locked_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let holder = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let result: Result<(), PersistenceError> = store.atomic_update(&[1], |_| {
                    locked_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                    Ok(())
                });
                result.unwrap();
            })
        };

        locked_rx.recv().unwrap();
        let result: Result<(), PersistenceError> = store.atomic_update(&[1], |slots| {
            slots[0].as_mut().unwrap().balances.cash = Decimal::ZERO;
            Ok(())
        });
        release_tx.send(()).unwrap();
        holder.join().unwrap();

        assert_eq!(
            result,
            Err(PersistenceError::LockTimeout {
                account: 1,
                timeout_ms: 20
            })
        );
        assert_eq!(store.get(1).unwrap().balances.cash, Decimal::new(100, 2));
    }

    #[test]
    fn test_atomic_update_concurrent_crossing_scopes() {
        let store = Arc::new(seeded_store());
        let mut handles = vec![];

        // Opposite acquisition requests on the same pair must not deadlock.
        for i in 0..20 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                let ids = if i % 2 == 0 { [1, 2] } else { [2, 1] };
                let result: Result<(), PersistenceError> = store.atomic_update(&ids, |slots| {
                    let (from, to) = slots.split_at_mut(1);
                    let from = from[0].as_mut().unwrap();
                    let to = to[0].as_mut().unwrap();
                    if from.balances.cash >= Decimal::ONE {
                        from.balances.cash -= Decimal::ONE;
                        to.balances.cash += Decimal::ONE;
                    }
                    Ok(())
                });
                result.unwrap();
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let total = store.get(1).unwrap().balances.cash + store.get(2).unwrap().balances.cash;
        assert_eq!(total, Decimal::new(10000, 2));
    }

    #[test]
    fn test_all_is_sorted_by_id() {
        let store = InMemoryAccountStore::new();
        store.insert(account(3, "33333333333", 0)).unwrap();
        store.insert(account(1, "11111111111", 0)).unwrap();
        store.insert(account(2, "22222222222", 0)).unwrap();

        let ids: Vec<AccountId> = store.all().iter().map(|account| account.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
