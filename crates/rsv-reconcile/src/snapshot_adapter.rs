//! Snapshot adapter: validate materialized snapshot files and normalize to
//! internal types.
//!
//! # Purpose
//! Decoding chain storage happens outside this crate. Whatever does it writes
//! one JSON document per source with already-decoded `(account, amount)`
//! entries. This module defines the *raw* structs mirroring those documents
//! and converts them into [`ObligationSource`] / [`ActualReservedIndex`].
//!
//! # Amounts
//! An amount may be a JSON unsigned integer, a decimal string or a `0x` hex
//! string. Balances above `u64::MAX` must be strings: JSON numbers that large
//! lose precision in transit and are rejected as inexact.
//!
//! # Design constraints
//! - Pure, deterministic conversion. No IO, no async.
//! - Fail fast: the first malformed entry aborts normalization. A partially
//!   normalized source would silently shift the deficit/excess split.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::{
    AccountId, AccountIdParseError, ActualReservedIndex, ActualReservedRecord, Amount,
    ObligationCategory, ObligationRecord, ObligationSource, ReconcileError,
};

// ---------------------------------------------------------------------------
// Source kinds
// ---------------------------------------------------------------------------

/// One of the six materialized inputs of a snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceKind {
    /// Native balance records (actual reserved).
    SystemAccount,
    Obligation(ObligationCategory),
}

impl SourceKind {
    /// All six inputs: the five obligation categories, then balances.
    pub const ALL: [SourceKind; 6] = [
        SourceKind::Obligation(ObligationCategory::AuthorMapping),
        SourceKind::Obligation(ObligationCategory::CandidateBond),
        SourceKind::Obligation(ObligationCategory::DelegatorTotal),
        SourceKind::Obligation(ObligationCategory::Treasury),
        SourceKind::Obligation(ObligationCategory::Proxy),
        SourceKind::SystemAccount,
    ];

    /// File name of this input inside a snapshot directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            SourceKind::SystemAccount => "system_account.json",
            SourceKind::Obligation(ObligationCategory::AuthorMapping) => "author_mapping.json",
            SourceKind::Obligation(ObligationCategory::CandidateBond) => "candidate_info.json",
            SourceKind::Obligation(ObligationCategory::DelegatorTotal) => "delegator_state.json",
            SourceKind::Obligation(ObligationCategory::Treasury) => "treasury_proposals.json",
            SourceKind::Obligation(ObligationCategory::Proxy) => "proxy.json",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::SystemAccount => f.write_str("system_account"),
            SourceKind::Obligation(c) => f.write_str(c.as_str()),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why an amount value was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountIssue {
    Negative,
    /// Fractional, exponent or float-typed value.
    Inexact,
    /// Exceeds 128 bits.
    OutOfRange,
    Malformed,
}

impl fmt::Display for AmountIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountIssue::Negative => f.write_str("negative amount"),
            AmountIssue::Inexact => {
                f.write_str("amount is not an exact integer (use a decimal or 0x string)")
            }
            AmountIssue::OutOfRange => f.write_str("amount exceeds 128 bits"),
            AmountIssue::Malformed => f.write_str("amount is not a number"),
        }
    }
}

/// All errors that can occur during snapshot normalization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotAdapterError {
    #[error("{kind}: invalid json: {message}")]
    InvalidJson { kind: SourceKind, message: String },

    #[error("{kind}: entry {index}: {error}")]
    InvalidAccount {
        kind: SourceKind,
        index: usize,
        #[source]
        error: AccountIdParseError,
    },

    #[error("{kind}: entry {index} ({account}): {issue}: {raw}")]
    InvalidAmount {
        kind: SourceKind,
        index: usize,
        account: AccountId,
        issue: AmountIssue,
        raw: String,
    },

    #[error("{kind}: {error}")]
    Overflow {
        kind: SourceKind,
        #[source]
        error: ReconcileError,
    },
}

// ---------------------------------------------------------------------------
// Raw file structs
// ---------------------------------------------------------------------------

/// One decoded entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEntry {
    /// `0x`-prefixed 20-byte hex account id.
    pub account: String,
    /// Balance files usually spell this `reserved`.
    #[serde(alias = "reserved")]
    pub amount: Value,
}

/// One materialized snapshot input file.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSnapshotFile {
    pub network: String,
    pub block_number: u64,
    pub block_hash: String,
    #[serde(default)]
    pub entries: Vec<RawEntry>,
}

pub fn parse_file(kind: SourceKind, json: &str) -> Result<RawSnapshotFile, SnapshotAdapterError> {
    serde_json::from_str(json).map_err(|e| SnapshotAdapterError::InvalidJson {
        kind,
        message: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Amount parsing
// ---------------------------------------------------------------------------

/// Parse a JSON amount value exactly.
pub fn parse_amount(v: &Value) -> Result<Amount, AmountIssue> {
    match v {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Ok(Amount::from(u))
            } else if n.as_i64().is_some() {
                Err(AmountIssue::Negative)
            } else if n.as_f64().is_some_and(|f| f < 0.0) {
                Err(AmountIssue::Negative)
            } else {
                Err(AmountIssue::Inexact)
            }
        }
        Value::String(s) => parse_amount_str(s),
        _ => Err(AmountIssue::Malformed),
    }
}

fn parse_amount_str(s: &str) -> Result<Amount, AmountIssue> {
    let t = s.trim();

    if let Some(rest) = t.strip_prefix('-') {
        // "-0" is still zero.
        return match parse_amount_str(rest)? {
            0 => Ok(0),
            _ => Err(AmountIssue::Negative),
        };
    }

    if let Some(hex_digits) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        if hex_digits.is_empty() || !hex_digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AmountIssue::Malformed);
        }
        let significant = hex_digits.trim_start_matches('0');
        if significant.len() > 32 {
            return Err(AmountIssue::OutOfRange);
        }
        if significant.is_empty() {
            return Ok(0);
        }
        return Amount::from_str_radix(significant, 16).map_err(|_| AmountIssue::Malformed);
    }

    if t.is_empty() {
        return Err(AmountIssue::Malformed);
    }
    if t.chars().all(|c| c.is_ascii_digit()) {
        // All digits: the only possible failure is overflow.
        return t.parse::<Amount>().map_err(|_| AmountIssue::OutOfRange);
    }
    if t.parse::<f64>().is_ok() {
        return Err(AmountIssue::Inexact);
    }
    Err(AmountIssue::Malformed)
}

fn parse_entry(
    kind: SourceKind,
    index: usize,
    entry: &RawEntry,
) -> Result<(AccountId, Amount), SnapshotAdapterError> {
    let account: AccountId = entry
        .account
        .parse()
        .map_err(|error| SnapshotAdapterError::InvalidAccount { kind, index, error })?;

    let amount = parse_amount(&entry.amount).map_err(|issue| SnapshotAdapterError::InvalidAmount {
        kind,
        index,
        account,
        issue,
        raw: entry.amount.to_string(),
    })?;

    Ok((account, amount))
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Normalize an obligation file into an [`ObligationSource`].
///
/// Duplicate accounts are summed.
pub fn normalize_obligations(
    category: ObligationCategory,
    raw: &RawSnapshotFile,
) -> Result<ObligationSource, SnapshotAdapterError> {
    let kind = SourceKind::Obligation(category);
    let records = raw
        .entries
        .iter()
        .enumerate()
        .map(|(i, e)| parse_entry(kind, i, e).map(|(a, v)| ObligationRecord::new(a, v)))
        .collect::<Result<Vec<_>, _>>()?;

    ObligationSource::from_records(category, records)
        .map_err(|error| SnapshotAdapterError::Overflow { kind, error })
}

/// Normalize the balance file into an [`ActualReservedIndex`].
///
/// Duplicate accounts keep their first record.
pub fn normalize_actual_reserved(
    raw: &RawSnapshotFile,
) -> Result<ActualReservedIndex, SnapshotAdapterError> {
    let kind = SourceKind::SystemAccount;
    let records = raw
        .entries
        .iter()
        .enumerate()
        .map(|(i, e)| parse_entry(kind, i, e).map(|(a, v)| ActualReservedRecord::new(a, v)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ActualReservedIndex::from_records(records))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
