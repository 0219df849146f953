use std::collections::BTreeMap;

use crate::{AccountAmounts, AccountId, Amount, ObligationCategory, ObligationSet, ReconcileError};

/// Total expected-reserved amount per account, summed over all five
/// obligation categories.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpectedReserved {
    totals: AccountAmounts,
}

impl ExpectedReserved {
    /// 0 for accounts with no obligation in any category.
    pub fn expected_for(&self, account: &AccountId) -> Amount {
        self.totals.get_or_zero(account)
    }

    pub fn totals(&self) -> &AccountAmounts {
        &self.totals
    }
}

/// Merge the five obligation sources into one expected-reserved mapping.
///
/// Categories are additive and independent: an account absent from a
/// category contributes 0 for it. Fails only if an account's total does not
/// fit in an [`Amount`].
pub fn aggregate(set: &ObligationSet) -> Result<ExpectedReserved, ReconcileError> {
    let mut totals = AccountAmounts::new();
    for source in set.sources() {
        for (account, amount) in source.amounts().iter() {
            totals
                .accumulate(*account, amount)
                .map_err(|_| ReconcileError::AmountOverflow {
                    account: *account,
                    context: "expected reserved".to_string(),
                })?;
        }
    }
    Ok(ExpectedReserved { totals })
}

/// Non-zero per-category contributions to an account's expected amount.
pub(crate) fn breakdown(
    set: &ObligationSet,
    account: &AccountId,
) -> BTreeMap<ObligationCategory, Amount> {
    ObligationCategory::ALL
        .iter()
        .map(|c| (*c, set.source(*c).amount_for(account)))
        .filter(|(_, amount)| *amount > 0)
        .collect()
}
