//! Account-related types for the wallet ledger
//!
//! This module defines the Account structure, its three segregated balances,
//! and the opaque credential hash carried alongside it.

use super::transaction::Category;
use rust_decimal::Decimal;
use std::fmt;

/// Account identifier
pub type AccountId = u32;

/// Length of a CPF (national identifier) string
pub const CPF_LEN: usize = 11;

/// Decimal places of every amount and balance (whole cents)
pub const MONEY_SCALE: u32 = 2;

/// Opaque hashed secret
///
/// Produced by the account-management collaborator. The ledger only carries it;
/// it is never printed, logged, or written to any CSV output.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialHash(String);

impl CredentialHash {
    pub fn new(hash: impl Into<String>) -> Self {
        CredentialHash(hash.into())
    }

    /// Whether the account was created with a credential at all
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for CredentialHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialHash(<redacted>)")
    }
}

/// The three segregated balances of an account
///
/// Every balance is an exact decimal and must stay non-negative after any
/// committed transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Balances {
    pub food: Decimal,
    pub meal: Decimal,
    pub cash: Decimal,
}

impl Balances {
    pub fn new(food: Decimal, meal: Decimal, cash: Decimal) -> Self {
        Balances { food, meal, cash }
    }

    /// Balance held in the given category
    pub fn get(&self, category: Category) -> Decimal {
        match category {
            Category::Food => self.food,
            Category::Meal => self.meal,
            Category::Cash => self.cash,
        }
    }

    /// Mutable access to the balance held in the given category
    pub fn get_mut(&mut self, category: Category) -> &mut Decimal {
        match category {
            Category::Food => &mut self.food,
            Category::Meal => &mut self.meal,
            Category::Cash => &mut self.cash,
        }
    }

    /// True when every category is zero or positive
    pub fn is_non_negative(&self) -> bool {
        Category::ALL
            .iter()
            .all(|category| !self.get(*category).is_sign_negative())
    }
}

/// Wallet account
///
/// Created once by account management and afterwards mutated only by the
/// ledger engine. The transaction history is not owned by the account; it is
/// looked up through `TransactionStore::by_account`.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// Unique, immutable identifier
    pub id: AccountId,

    /// Unique 11-character national identifier
    pub cpf: String,

    /// Hashed secret, never serialized
    pub credential_hash: CredentialHash,

    /// Food, meal and cash balances
    pub balances: Balances,
}

impl Account {
    /// Create an account with the given opening balances and no credential
    pub fn new(id: AccountId, cpf: impl Into<String>, balances: Balances) -> Self {
        Account {
            id,
            cpf: cpf.into(),
            credential_hash: CredentialHash::new(""),
            balances,
        }
    }

    pub fn with_credential(mut self, credential_hash: CredentialHash) -> Self {
        self.credential_hash = credential_hash;
        self
    }
}
