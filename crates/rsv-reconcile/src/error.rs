use thiserror::Error;

use crate::{AccountId, ObligationCategory};

/// Precondition failures recognised by the reconciliation core.
///
/// Every variant means the input cannot be represented exactly. The core
/// refuses to produce a report from it rather than emit a wrong sign or a
/// truncated amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// Summing records for one account exceeded the 128-bit amount range.
    #[error("amount overflow for account {account} while summing {context}")]
    AmountOverflow { account: AccountId, context: String },
}

impl ReconcileError {
    pub(crate) fn overflow_in(account: AccountId, category: ObligationCategory) -> Self {
        Self::AmountOverflow {
            account,
            context: category.as_str().to_string(),
        }
    }
}
