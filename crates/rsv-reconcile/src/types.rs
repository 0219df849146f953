use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Byte width of an account identifier.
pub const ACCOUNT_ID_LEN: usize = 20;

/// Balance amount. 128-bit unsigned, never floating point.
pub type Amount = u128;

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// Fixed-width opaque account identifier.
///
/// Canonical text form is `0x` followed by 40 lowercase hex digits.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountId([u8; ACCOUNT_ID_LEN]);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountIdParseError {
    #[error("account id '{raw}' must start with 0x")]
    MissingPrefix { raw: String },
    #[error("account id '{raw}' must be {expected} hex digits, got {got}")]
    WrongLength {
        raw: String,
        expected: usize,
        got: usize,
    },
    #[error("account id '{raw}' is not valid hex")]
    InvalidHex { raw: String },
}

impl AccountId {
    pub const fn from_bytes(bytes: [u8; ACCOUNT_ID_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ACCOUNT_ID_LEN] {
        &self.0
    }
}

impl FromStr for AccountId {
    type Err = AccountIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let digits = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .ok_or_else(|| AccountIdParseError::MissingPrefix {
                raw: raw.to_string(),
            })?;

        if digits.len() != ACCOUNT_ID_LEN * 2 {
            return Err(AccountIdParseError::WrongLength {
                raw: raw.to_string(),
                expected: ACCOUNT_ID_LEN * 2,
                got: digits.len(),
            });
        }

        let mut bytes = [0u8; ACCOUNT_ID_LEN];
        hex::decode_to_slice(digits, &mut bytes).map_err(|_| AccountIdParseError::InvalidHex {
            raw: raw.to_string(),
        })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({self})")
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// SignedAmount
// ---------------------------------------------------------------------------

/// Exact signed difference between two [`Amount`]s.
///
/// Sign and magnitude are stored separately so `actual - expected` never
/// overflows. A zero magnitude is never negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SignedAmount {
    negative: bool,
    magnitude: Amount,
}

impl SignedAmount {
    pub const ZERO: SignedAmount = SignedAmount {
        negative: false,
        magnitude: 0,
    };

    /// `lhs - rhs`, exactly.
    pub fn difference(lhs: Amount, rhs: Amount) -> Self {
        if lhs >= rhs {
            Self {
                negative: false,
                magnitude: lhs - rhs,
            }
        } else {
            Self {
                negative: true,
                magnitude: rhs - lhs,
            }
        }
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude == 0
    }

    pub fn is_positive(&self) -> bool {
        !self.negative && self.magnitude > 0
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn magnitude(&self) -> Amount {
        self.magnitude
    }
}

impl Ord for SignedAmount {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, false) => self.magnitude.cmp(&other.magnitude),
            (true, true) => other.magnitude.cmp(&self.magnitude),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
        }
    }
}

impl PartialOrd for SignedAmount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SignedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            write!(f, "0")
        } else if self.negative {
            write!(f, "-{}", self.magnitude)
        } else {
            write!(f, "+{}", self.magnitude)
        }
    }
}

impl Serialize for SignedAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Obligation categories + records
// ---------------------------------------------------------------------------

/// One ledger subsystem that independently reserves funds for an account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObligationCategory {
    /// Author/identity mapping registration deposit.
    AuthorMapping,
    /// Staking candidate self-bond.
    CandidateBond,
    /// Staking delegator total.
    DelegatorTotal,
    /// Treasury proposal bond.
    Treasury,
    /// Proxy deposit.
    Proxy,
}

impl ObligationCategory {
    /// All categories, in account-union enumeration order.
    pub const ALL: [ObligationCategory; 5] = [
        ObligationCategory::AuthorMapping,
        ObligationCategory::CandidateBond,
        ObligationCategory::DelegatorTotal,
        ObligationCategory::Treasury,
        ObligationCategory::Proxy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObligationCategory::AuthorMapping => "author_mapping",
            ObligationCategory::CandidateBond => "candidate_bond",
            ObligationCategory::DelegatorTotal => "delegator_total",
            ObligationCategory::Treasury => "treasury",
            ObligationCategory::Proxy => "proxy",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            ObligationCategory::AuthorMapping => 0,
            ObligationCategory::CandidateBond => 1,
            ObligationCategory::DelegatorTotal => 2,
            ObligationCategory::Treasury => 3,
            ObligationCategory::Proxy => 4,
        }
    }
}

impl fmt::Display for ObligationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One amount owed by `account` for a single obligation category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObligationRecord {
    pub account: AccountId,
    pub amount: Amount,
}

impl ObligationRecord {
    pub fn new(account: AccountId, amount: Amount) -> Self {
        Self { account, amount }
    }
}

/// Reserved amount recorded in the account's native balance record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActualReservedRecord {
    pub account: AccountId,
    pub reserved: Amount,
}

impl ActualReservedRecord {
    pub fn new(account: AccountId, reserved: Amount) -> Self {
        Self { account, reserved }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscrepancyKind {
    /// More reserved than owed. Safe to unreserve.
    Excess,
    /// Less reserved than owed. Needs a corrective transaction.
    Deficit,
}

impl DiscrepancyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscrepancyKind::Excess => "EXCESS",
            DiscrepancyKind::Deficit => "DEFICIT",
        }
    }
}

/// One account whose actual reserved balance differs from what it owes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Discrepancy {
    pub account: AccountId,
    #[serde(serialize_with = "amount_as_str")]
    pub actual: Amount,
    #[serde(serialize_with = "amount_as_str")]
    pub expected: Amount,
    /// `actual - expected`.
    pub delta: SignedAmount,
    /// Non-zero contributions to `expected`, by category.
    #[serde(serialize_with = "amount_map_as_str")]
    pub expected_by_category: BTreeMap<ObligationCategory, Amount>,
}

impl Discrepancy {
    pub fn kind(&self) -> DiscrepancyKind {
        if self.delta.is_negative() {
            DiscrepancyKind::Deficit
        } else {
            DiscrepancyKind::Excess
        }
    }

    pub fn is_deficit(&self) -> bool {
        self.delta.is_negative()
    }

    pub fn is_excess(&self) -> bool {
        self.delta.is_positive()
    }
}

/// Full reconciliation result for one snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Accounts with `delta != 0`, in first-encountered union order.
    pub discrepancies: Vec<Discrepancy>,
    /// `true` iff at least one discrepancy is a deficit.
    pub requires_corrective_transaction: bool,
    /// Size of the account union (including consistent accounts).
    pub accounts_considered: usize,
    /// Sum of all excess magnitudes. `None` when the sum does not fit in an
    /// [`Amount`]; per-account figures are unaffected.
    #[serde(serialize_with = "opt_amount_as_str")]
    pub total_excess: Option<Amount>,
    /// Sum of all deficit magnitudes, `None` on overflow.
    #[serde(serialize_with = "opt_amount_as_str")]
    pub total_deficit: Option<Amount>,
}

impl ReconcileReport {
    pub fn is_consistent(&self) -> bool {
        self.discrepancies.is_empty()
    }

    pub fn deficits(&self) -> impl Iterator<Item = &Discrepancy> {
        self.discrepancies.iter().filter(|d| d.is_deficit())
    }

    pub fn excesses(&self) -> impl Iterator<Item = &Discrepancy> {
        self.discrepancies.iter().filter(|d| d.is_excess())
    }
}

pub(crate) fn amount_as_str<S: Serializer>(v: &Amount, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(v)
}

fn opt_amount_as_str<S: Serializer>(v: &Option<Amount>, s: S) -> Result<S::Ok, S::Error> {
    match v {
        Some(v) => s.collect_str(v),
        None => s.serialize_none(),
    }
}

fn amount_map_as_str<S: Serializer>(
    m: &BTreeMap<ObligationCategory, Amount>,
    s: S,
) -> Result<S::Ok, S::Error> {
    s.collect_map(m.iter().map(|(k, v)| (k.as_str(), v.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_canonical_form_is_lowercase() {
        let id: AccountId = "0xABCDEFabcdef0000000000000000000000000001".parse().unwrap();
        assert_eq!(id.to_string(), "0xabcdefabcdef0000000000000000000000000001");
    }

    #[test]
    fn account_id_rejects_bad_input() {
        assert!(matches!(
            "abcdefabcdef0000000000000000000000000001".parse::<AccountId>(),
            Err(AccountIdParseError::MissingPrefix { .. })
        ));
        assert!(matches!(
            "0x1234".parse::<AccountId>(),
            Err(AccountIdParseError::WrongLength { got: 4, .. })
        ));
        assert!(matches!(
            "0xzz00000000000000000000000000000000000001".parse::<AccountId>(),
            Err(AccountIdParseError::InvalidHex { .. })
        ));
    }

    #[test]
    fn signed_difference_is_exact_at_extremes() {
        let d = SignedAmount::difference(0, Amount::MAX);
        assert!(d.is_negative());
        assert_eq!(d.magnitude(), Amount::MAX);
        assert_eq!(d.to_string(), format!("-{}", Amount::MAX));

        let d = SignedAmount::difference(Amount::MAX, 0);
        assert!(d.is_positive());
        assert_eq!(d.magnitude(), Amount::MAX);
    }

    #[test]
    fn signed_amount_display_and_order() {
        let plus = SignedAmount::difference(100, 70);
        let minus = SignedAmount::difference(50, 60);
        let zero = SignedAmount::difference(5, 5);

        assert_eq!(plus.to_string(), "+30");
        assert_eq!(minus.to_string(), "-10");
        assert_eq!(zero.to_string(), "0");
        assert_eq!(zero, SignedAmount::ZERO);
        assert!(minus < zero && zero < plus);
    }
}
