//! Structural validation of transfer requests
//!
//! Runs before the engine opens its atomic scope. Checks short-circuit in
//! order:
//!
//! 1. origin and destination differ (no lookup)
//! 2. the amount is positive and in whole cents (no lookup)
//! 3. the destination account exists (lock-free lookup)

use super::traits::AccountStore;
use crate::types::{TransferRequest, ValidationError, MONEY_SCALE};
use rust_decimal::Decimal;

/// A transfer request that passed validation
///
/// Only `validate` can build one, so the engine never executes an unchecked
/// request.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTransfer {
    request: TransferRequest,
}

impl ValidatedTransfer {
    pub fn request(&self) -> &TransferRequest {
        &self.request
    }
}

/// Validate a transfer request against the Account Store
pub fn validate<A: AccountStore>(
    accounts: &A,
    request: TransferRequest,
) -> Result<ValidatedTransfer, ValidationError> {
    if request.origin == request.destination {
        return Err(ValidationError::SameAccount {
            account: request.origin,
        });
    }

    if request.amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount {
            amount: request.amount,
        });
    }

    if request.amount.normalize().scale() > MONEY_SCALE {
        return Err(ValidationError::SubCentAmount {
            amount: request.amount,
        });
    }

    if !accounts.contains(request.destination) {
        return Err(ValidationError::DestinationNotFound {
            account: request.destination,
        });
    }

    Ok(ValidatedTransfer { request })
}
