//! CSV format handling for accounts, transfers and ledger output
//!
//! This module centralizes all CSV format concerns, providing:
//! - `AccountCsvRecord` and `TransferCsvRecord` structures for deserialization
//! - The `CsvRow` trait converting a raw record into its domain type
//! - Account snapshot and transaction ledger serialization
//!
//! All functions are pure (no file I/O) for easy testing.

use crate::types::{
    Account, AccountId, Balances, CredentialHash, OriginRef, Transaction, TransferInstruction,
    CPF_LEN, MONEY_SCALE,
};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// A deserializable CSV row that converts into a domain value
pub trait CsvRow: DeserializeOwned {
    type Output;

    fn convert(self) -> Result<Self::Output, String>;
}

/// Accounts input row: `id,cpf,food,meal,cash[,credential_hash]`
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AccountCsvRecord {
    pub id: AccountId,
    pub cpf: String,
    pub food: String,
    pub meal: String,
    pub cash: String,
    #[serde(default)]
    pub credential_hash: Option<String>,
}

/// Transfers input row: `origin,origin_cpf,destination,amount,mcc,merchant`
///
/// Exactly one of `origin` and `origin_cpf` must be filled in.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TransferCsvRecord {
    pub origin: Option<AccountId>,
    pub origin_cpf: Option<String>,
    pub destination: AccountId,
    pub amount: String,
    pub mcc: String,
    #[serde(default)]
    pub merchant: String,
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal, String> {
    Decimal::from_str(value.trim()).map_err(|_| format!("Invalid {} '{}'", field, value))
}

fn parse_balance(account: AccountId, field: &str, value: &str) -> Result<Decimal, String> {
    let balance =
        parse_decimal(field, value).map_err(|e| format!("{} for account {}", e, account))?;
    if balance.is_sign_negative() && !balance.is_zero() {
        return Err(format!(
            "Negative {} balance {} for account {}",
            field, balance, account
        ));
    }
    if balance.normalize().scale() > MONEY_SCALE {
        return Err(format!(
            "Sub-cent {} balance {} for account {}",
            field, balance, account
        ));
    }
    Ok(balance)
}

/// Convert an AccountCsvRecord to an Account
///
/// # Returns
///
/// * `Ok(Account)` - Account with its opening balances
/// * `Err(String)` - Malformed, negative or sub-cent balance, or a CPF that
///   is not exactly 11 characters
pub fn convert_account_record(record: AccountCsvRecord) -> Result<Account, String> {
    if record.cpf.chars().count() != CPF_LEN {
        return Err(format!(
            "CPF '{}' for account {} must have {} characters",
            record.cpf, record.id, CPF_LEN
        ));
    }

    let balances = Balances::new(
        parse_balance(record.id, "food", &record.food)?,
        parse_balance(record.id, "meal", &record.meal)?,
        parse_balance(record.id, "cash", &record.cash)?,
    );

    let account = Account::new(record.id, record.cpf, balances);
    Ok(match record.credential_hash {
        Some(hash) if !hash.is_empty() => account.with_credential(CredentialHash::new(hash)),
        _ => account,
    })
}

/// Convert a TransferCsvRecord to a TransferInstruction
///
/// The amount is only parsed here; its sign is checked by the validator so
/// that a non-positive amount is reported like any other rejected transfer.
pub fn convert_transfer_record(record: TransferCsvRecord) -> Result<TransferInstruction, String> {
    let origin = match (record.origin, record.origin_cpf) {
        (Some(id), None) => OriginRef::Id(id),
        (None, Some(cpf)) => OriginRef::Identifier(cpf),
        (Some(_), Some(_)) => {
            return Err(format!(
                "Transfer to {} sets both origin and origin_cpf",
                record.destination
            ))
        }
        (None, None) => {
            return Err(format!(
                "Transfer to {} has no origin or origin_cpf",
                record.destination
            ))
        }
    };

    let amount = parse_decimal("amount", &record.amount)
        .map_err(|e| format!("{} for transfer to {}", e, record.destination))?;

    Ok(TransferInstruction {
        origin,
        destination: record.destination,
        amount,
        mcc: record.mcc,
        merchant: record.merchant,
    })
}

impl CsvRow for AccountCsvRecord {
    type Output = Account;

    fn convert(self) -> Result<Account, String> {
        convert_account_record(self)
    }
}

impl CsvRow for TransferCsvRecord {
    type Output = TransferInstruction;

    fn convert(self) -> Result<TransferInstruction, String> {
        convert_transfer_record(self)
    }
}

/// Write account balances to CSV format
///
/// Writes accounts with columns: id, cpf, food, meal, cash.
/// Accounts are sorted by id for deterministic output; credential hashes are
/// never written.
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_accounts_csv(accounts: &[Account], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["id", "cpf", "food", "meal", "cash"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted_accounts = accounts.to_vec();
    sorted_accounts.sort_by_key(|account| account.id);

    for account in sorted_accounts {
        writer
            .write_record(&[
                account.id.to_string(),
                account.cpf.clone(),
                format!("{:.2}", account.balances.food),
                format!("{:.2}", account.balances.meal),
                format!("{:.2}", account.balances.cash),
            ])
            .map_err(|e| format!("Failed to write account record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

/// Write transaction records to CSV format, in the given order
pub fn write_transactions_csv(
    transactions: &[Transaction],
    output: &mut dyn Write,
) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record([
            "id",
            "origin",
            "destination",
            "amount",
            "mcc",
            "merchant",
            "category",
            "status",
            "code",
            "message",
            "created_at",
        ])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    for tx in transactions {
        writer
            .write_record(&[
                tx.id.to_string(),
                tx.origin.to_string(),
                tx.destination.to_string(),
                format!("{:.2}", tx.amount),
                tx.mcc.clone(),
                tx.merchant.clone(),
                tx.category.to_string(),
                tx.status.to_string(),
                tx.status.code().to_string(),
                tx.message.clone(),
                tx.created_at.to_rfc3339(),
            ])
            .map_err(|e| format!("Failed to write transaction record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}
