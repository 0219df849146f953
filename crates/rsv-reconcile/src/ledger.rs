use std::collections::BTreeMap;

use tracing::warn;

use crate::{
    AccountId, ActualReservedRecord, Amount, ObligationCategory, ObligationRecord, ReconcileError,
};

// ---------------------------------------------------------------------------
// Insertion-ordered account index
// ---------------------------------------------------------------------------

/// `AccountId -> Amount` map that iterates in first-insertion order.
///
/// Lookups are total: [`get_or_zero`][AccountAmounts::get_or_zero] returns 0
/// for accounts that were never inserted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountAmounts {
    order: Vec<AccountId>,
    amounts: BTreeMap<AccountId, Amount>,
}

impl AccountAmounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to the account's running total (inserting it at 0 first
    /// if absent). Fails if the total would exceed the amount range.
    pub fn accumulate(&mut self, account: AccountId, amount: Amount) -> Result<Amount, Amount> {
        match self.amounts.get_mut(&account) {
            Some(total) => {
                *total = total.checked_add(amount).ok_or(*total)?;
                Ok(*total)
            }
            None => {
                self.order.push(account);
                self.amounts.insert(account, amount);
                Ok(amount)
            }
        }
    }

    /// Insert only if the account is not present yet. Returns `true` when
    /// the value was stored.
    pub fn insert_if_absent(&mut self, account: AccountId, amount: Amount) -> bool {
        if self.amounts.contains_key(&account) {
            return false;
        }
        self.order.push(account);
        self.amounts.insert(account, amount);
        true
    }

    pub fn get(&self, account: &AccountId) -> Option<Amount> {
        self.amounts.get(account).copied()
    }

    pub fn get_or_zero(&self, account: &AccountId) -> Amount {
        self.get(account).unwrap_or(0)
    }

    pub fn contains(&self, account: &AccountId) -> bool {
        self.amounts.contains_key(account)
    }

    /// Accounts in first-insertion order.
    pub fn accounts(&self) -> impl Iterator<Item = &AccountId> {
        self.order.iter()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, Amount)> {
        self.order
            .iter()
            .map(move |a| (a, self.amounts.get(a).copied().unwrap_or(0)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Obligation sources
// ---------------------------------------------------------------------------

/// Per-account amounts owed for a single [`ObligationCategory`].
///
/// Several records for the same account are summed, never overwritten.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObligationSource {
    category: ObligationCategory,
    amounts: AccountAmounts,
}

impl ObligationSource {
    pub fn empty(category: ObligationCategory) -> Self {
        Self {
            category,
            amounts: AccountAmounts::new(),
        }
    }

    pub fn from_records<I>(category: ObligationCategory, records: I) -> Result<Self, ReconcileError>
    where
        I: IntoIterator<Item = ObligationRecord>,
    {
        let mut amounts = AccountAmounts::new();
        for r in records {
            amounts
                .accumulate(r.account, r.amount)
                .map_err(|_| ReconcileError::overflow_in(r.account, category))?;
        }
        Ok(Self { category, amounts })
    }

    pub fn category(&self) -> ObligationCategory {
        self.category
    }

    pub fn amount_for(&self, account: &AccountId) -> Amount {
        self.amounts.get_or_zero(account)
    }

    pub fn amounts(&self) -> &AccountAmounts {
        &self.amounts
    }
}

/// All five obligation sources of one snapshot.
///
/// A category that was never inserted behaves as an empty source. A
/// category inserted more than once accumulates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObligationSet {
    sources: [ObligationSource; 5],
}

impl Default for ObligationSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ObligationSet {
    pub fn new() -> Self {
        Self {
            sources: ObligationCategory::ALL.map(ObligationSource::empty),
        }
    }

    /// Build a set from any number of sources, merging repeated categories.
    pub fn from_sources<I>(sources: I) -> Result<Self, ReconcileError>
    where
        I: IntoIterator<Item = ObligationSource>,
    {
        let mut set = Self::new();
        for source in sources {
            set.insert(source)?;
        }
        Ok(set)
    }

    /// Merge `source` into the set. Inserting a category twice sums the
    /// amounts per account; nothing is replaced.
    pub fn insert(&mut self, source: ObligationSource) -> Result<(), ReconcileError> {
        let category = source.category();
        let slot = &mut self.sources[category.index()];
        for (account, amount) in source.amounts().iter() {
            slot.amounts
                .accumulate(*account, amount)
                .map_err(|_| ReconcileError::overflow_in(*account, category))?;
        }
        Ok(())
    }

    pub fn source(&self, category: ObligationCategory) -> &ObligationSource {
        &self.sources[category.index()]
    }

    /// Sources in account-union enumeration order.
    pub fn sources(&self) -> impl Iterator<Item = &ObligationSource> {
        self.sources.iter()
    }
}

// ---------------------------------------------------------------------------
// Actual reserved
// ---------------------------------------------------------------------------

/// Reserved amounts recorded in the ledger's native balance records.
///
/// The first record for an account wins; later duplicates are ignored
/// (never summed).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActualReservedIndex {
    amounts: AccountAmounts,
    duplicates_ignored: usize,
}

impl ActualReservedIndex {
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = ActualReservedRecord>,
    {
        let mut amounts = AccountAmounts::new();
        let mut duplicates_ignored = 0;
        for r in records {
            if !amounts.insert_if_absent(r.account, r.reserved) {
                duplicates_ignored += 1;
                warn!(
                    account = %r.account,
                    ignored_reserved = %r.reserved,
                    kept_reserved = %amounts.get_or_zero(&r.account),
                    "duplicate balance record ignored"
                );
            }
        }
        Self {
            amounts,
            duplicates_ignored,
        }
    }

    pub fn reserved_for(&self, account: &AccountId) -> Amount {
        self.amounts.get_or_zero(account)
    }

    pub fn amounts(&self) -> &AccountAmounts {
        &self.amounts
    }

    pub fn duplicates_ignored(&self) -> usize {
        self.duplicates_ignored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acct(n: u8) -> AccountId {
        let mut b = [0u8; 20];
        b[19] = n;
        AccountId::from_bytes(b)
    }

    #[test]
    fn accumulate_sums_and_keeps_first_insertion_order() {
        let mut m = AccountAmounts::new();
        m.accumulate(acct(2), 5).unwrap();
        m.accumulate(acct(1), 7).unwrap();
        m.accumulate(acct(2), 10).unwrap();

        let got: Vec<(AccountId, Amount)> = m.iter().map(|(a, v)| (*a, v)).collect();
        assert_eq!(got, vec![(acct(2), 15), (acct(1), 7)]);
    }

    #[test]
    fn accumulate_overflow_leaves_total_untouched() {
        let mut m = AccountAmounts::new();
        m.accumulate(acct(1), Amount::MAX).unwrap();
        assert_eq!(m.accumulate(acct(1), 1), Err(Amount::MAX));
        assert_eq!(m.get_or_zero(&acct(1)), Amount::MAX);
    }

    #[test]
    fn missing_account_reads_as_zero() {
        let m = AccountAmounts::new();
        assert_eq!(m.get(&acct(9)), None);
        assert_eq!(m.get_or_zero(&acct(9)), 0);
    }

    #[test]
    fn obligation_source_sums_duplicate_records() {
        let src = ObligationSource::from_records(
            ObligationCategory::Proxy,
            vec![
                ObligationRecord::new(acct(1), 10),
                ObligationRecord::new(acct(1), 15),
            ],
        )
        .unwrap();
        assert_eq!(src.amount_for(&acct(1)), 25);
        assert_eq!(src.amounts().len(), 1);
    }

    #[test]
    fn obligation_source_overflow_names_category() {
        let err = ObligationSource::from_records(
            ObligationCategory::Treasury,
            vec![
                ObligationRecord::new(acct(1), Amount::MAX),
                ObligationRecord::new(acct(1), 1),
            ],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ReconcileError::AmountOverflow {
                account: acct(1),
                context: "treasury".to_string(),
            }
        );
    }

    #[test]
    fn actual_reserved_first_occurrence_wins() {
        let idx = ActualReservedIndex::from_records(vec![
            ActualReservedRecord::new(acct(1), 100),
            ActualReservedRecord::new(acct(1), 999),
        ]);
        assert_eq!(idx.reserved_for(&acct(1)), 100);
        assert_eq!(idx.duplicates_ignored(), 1);
    }

    #[test]
    fn obligation_set_defaults_to_empty_sources() {
        let set = ObligationSet::new();
        for c in ObligationCategory::ALL {
            assert_eq!(set.source(c).category(), c);
            assert!(set.source(c).amounts().is_empty());
        }
    }

    #[test]
    fn repeated_category_accumulates_instead_of_replacing() {
        let first = ObligationSource::from_records(
            ObligationCategory::CandidateBond,
            vec![ObligationRecord::new(acct(1), 40), ObligationRecord::new(acct(2), 5)],
        )
        .unwrap();
        let second = ObligationSource::from_records(
            ObligationCategory::CandidateBond,
            vec![ObligationRecord::new(acct(3), 7), ObligationRecord::new(acct(1), 2)],
        )
        .unwrap();

        let set = ObligationSet::from_sources(vec![first, second]).unwrap();
        let bonds = set.source(ObligationCategory::CandidateBond);
        assert_eq!(bonds.amount_for(&acct(1)), 42);
        assert_eq!(bonds.amount_for(&acct(2)), 5);
        assert_eq!(bonds.amount_for(&acct(3)), 7);

        let order: Vec<AccountId> = bonds.amounts().accounts().copied().collect();
        assert_eq!(order, vec![acct(1), acct(2), acct(3)]);
    }

    #[test]
    fn repeated_category_overflow_is_an_error() {
        let big = || {
            ObligationSource::from_records(
                ObligationCategory::Proxy,
                vec![ObligationRecord::new(acct(1), Amount::MAX)],
            )
            .unwrap()
        };
        let mut set = ObligationSet::new();
        set.insert(big()).unwrap();

        let err = set.insert(big()).unwrap_err();
        assert_eq!(
            err,
            ReconcileError::AmountOverflow {
                account: acct(1),
                context: "proxy".to_string(),
            }
        );
        assert_eq!(set.source(ObligationCategory::Proxy).amount_for(&acct(1)), Amount::MAX);
    }
}
