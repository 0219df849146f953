use std::collections::BTreeSet;

use tracing::debug;

use crate::aggregate::{aggregate, breakdown};
use crate::{
    AccountId, ActualReservedIndex, Amount, Discrepancy, ObligationSet, ReconcileError,
    ReconcileReport, SignedAmount,
};

/// Union of every account referenced by any obligation source or by the
/// actual-reserved index.
///
/// Order: each obligation source in [`ObligationCategory::ALL`] order, then
/// the actual-reserved index, each in its own iteration order, deduplicated
/// on first occurrence.
///
/// [`ObligationCategory::ALL`]: crate::ObligationCategory::ALL
pub fn account_union(obligations: &ObligationSet, actual: &ActualReservedIndex) -> Vec<AccountId> {
    let mut seen: BTreeSet<AccountId> = BTreeSet::new();
    let mut union: Vec<AccountId> = Vec::new();

    let from_sources = obligations.sources().flat_map(|s| s.amounts().accounts());
    for account in from_sources.chain(actual.amounts().accounts()) {
        if seen.insert(*account) {
            union.push(*account);
        }
    }
    union
}

/// Running sum that turns into `None` once it leaves the [`Amount`] range.
fn add_to_total(total: Option<Amount>, add: Amount) -> Option<Amount> {
    total.and_then(|t| t.checked_add(add))
}

/// Deterministic reconciliation of one snapshot:
/// - every account in the union is considered, missing sides read as 0
/// - `delta = actual - expected`; zero deltas are dropped
/// - any negative delta sets `requires_corrective_transaction`
///
/// Pure: no IO, no on-chain action. Same inputs always produce the same
/// report. The only failure is an account whose expected total does not fit
/// in an [`Amount`]; report-wide totals never fail the run.
pub fn reconcile(
    obligations: &ObligationSet,
    actual: &ActualReservedIndex,
) -> Result<ReconcileReport, ReconcileError> {
    let expected = aggregate(obligations)?;
    let union = account_union(obligations, actual);

    let mut discrepancies: Vec<Discrepancy> = Vec::new();
    let mut requires_corrective_transaction = false;
    let mut total_excess: Option<Amount> = Some(0);
    let mut total_deficit: Option<Amount> = Some(0);

    for account in &union {
        let actual_reserved = actual.reserved_for(account);
        let expected_reserved = expected.expected_for(account);
        let delta = SignedAmount::difference(actual_reserved, expected_reserved);

        if delta.is_zero() {
            continue;
        }

        if delta.is_negative() {
            requires_corrective_transaction = true;
            total_deficit = add_to_total(total_deficit, delta.magnitude());
        } else {
            total_excess = add_to_total(total_excess, delta.magnitude());
        }

        debug!(
            account = %account,
            actual = %actual_reserved,
            expected = %expected_reserved,
            delta = %delta,
            "reserved balance mismatch"
        );

        discrepancies.push(Discrepancy {
            account: *account,
            actual: actual_reserved,
            expected: expected_reserved,
            delta,
            expected_by_category: breakdown(obligations, account),
        });
    }

    Ok(ReconcileReport {
        discrepancies,
        requires_corrective_transaction,
        accounts_considered: union.len(),
        total_excess,
        total_deficit,
    })
}
