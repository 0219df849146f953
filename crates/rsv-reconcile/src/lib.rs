//! rsv-reconcile
//!
//! Reserved-balance reconciliation over a single ledger snapshot.
//!
//! - Five obligation sources (author mapping, candidate bond, delegator
//!   total, treasury bond, proxy deposit) are summed per account into one
//!   expected-reserved figure.
//! - The expected figure is diffed against the reserved balance actually
//!   recorded for the account.
//! - Excess is releasable. Any deficit escalates the whole run to a
//!   corrective (hotfix) transaction.
//!
//! Deterministic, pure logic. No IO. No chain calls.

mod aggregate;
mod engine;
mod error;
mod ledger;
mod remediation;
mod types;

pub mod report;
pub mod snapshot_adapter;
pub mod snapshot_pin;

pub use aggregate::{aggregate, ExpectedReserved};
pub use engine::{account_union, reconcile};
pub use error::ReconcileError;
pub use ledger::{AccountAmounts, ActualReservedIndex, ObligationSet, ObligationSource};
pub use remediation::{plan_remediation, Correction, Release, Remediation};
pub use types::*;
