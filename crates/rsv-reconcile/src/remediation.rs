//! Remediation plan
//!
//! Turns a [`ReconcileReport`] into the action an operator has to take:
//!
//! 1. **Consistent**: nothing to do.
//! 2. **Unreserve**: only excess was found; every listed amount can be
//!    released back to its account.
//! 3. **HotfixRequired**: at least one account is under-reserved. A single
//!    privileged corrective transaction must credit the missing reservations
//!    before any account is treated as consistent. Releasable excess is still
//!    listed so it can be bundled into the same transaction.
//!
//! Pure. Nothing here submits or signs anything.

use serde::Serialize;

use crate::types::amount_as_str;
use crate::{AccountId, Amount, ReconcileReport};

/// Excess reserved amount that can be released.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Release {
    pub account: AccountId,
    #[serde(serialize_with = "amount_as_str")]
    pub amount: Amount,
}

/// Reservation missing from an account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Correction {
    pub account: AccountId,
    #[serde(serialize_with = "amount_as_str")]
    pub missing: Amount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Remediation {
    Consistent,
    Unreserve {
        releases: Vec<Release>,
    },
    HotfixRequired {
        corrections: Vec<Correction>,
        releases: Vec<Release>,
    },
}

impl Remediation {
    /// `true` when a privileged corrective transaction is needed.
    pub fn requires_hotfix(&self) -> bool {
        matches!(self, Remediation::HotfixRequired { .. })
    }

    pub fn releases(&self) -> &[Release] {
        match self {
            Remediation::Consistent => &[],
            Remediation::Unreserve { releases } => releases,
            Remediation::HotfixRequired { releases, .. } => releases,
        }
    }

    pub fn corrections(&self) -> &[Correction] {
        match self {
            Remediation::HotfixRequired { corrections, .. } => corrections,
            _ => &[],
        }
    }
}

/// Derive the remediation plan for a report. Order follows the report.
pub fn plan_remediation(report: &ReconcileReport) -> Remediation {
    let releases: Vec<Release> = report
        .excesses()
        .map(|d| Release {
            account: d.account,
            amount: d.delta.magnitude(),
        })
        .collect();

    if report.requires_corrective_transaction {
        let corrections = report
            .deficits()
            .map(|d| Correction {
                account: d.account,
                missing: d.delta.magnitude(),
            })
            .collect();
        return Remediation::HotfixRequired {
            corrections,
            releases,
        };
    }

    if releases.is_empty() {
        Remediation::Consistent
    } else {
        Remediation::Unreserve { releases }
    }
}
