//! Snapshot pin
//!
//! # Purpose
//!
//! The six inputs are fetched independently (and usually concurrently). They
//! are only comparable if every one of them was read at the same block. This
//! module pins `(network, block_number, block_hash)` from the first accepted
//! input and rejects any later input read elsewhere.
//!
//! # Invariants
//!
//! - **First accept pins**: the first accepted file sets the pin; it never
//!   moves afterwards.
//! - **Exact match**: network, block number and block hash must all match.
//!   Block hashes compare case-insensitively.
//! - **Expectations are checked up front**: an expected network or block
//!   number (from config or `--at`) is enforced on every file, including the
//!   first.
//! - **Pure, no IO**.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::snapshot_adapter::{RawSnapshotFile, SourceKind};

/// Block reference every input of one snapshot must share.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SnapshotRef {
    pub network: String,
    pub block_number: u64,
    pub block_hash: String,
}

impl SnapshotRef {
    pub fn of(file: &RawSnapshotFile) -> Self {
        Self {
            network: file.network.trim().to_string(),
            block_number: file.block_number,
            block_hash: file.block_hash.trim().to_ascii_lowercase(),
        }
    }
}

impl fmt::Display for SnapshotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} ({})",
            self.network, self.block_number, self.block_hash
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotPinError {
    /// Input was read at a different block (or network) than the pin.
    #[error("{kind} was read at {got}, but the snapshot is pinned to {pinned}")]
    Mismatch {
        kind: SourceKind,
        pinned: SnapshotRef,
        got: SnapshotRef,
    },

    #[error("{kind} is from network '{got}', expected '{expected}'")]
    WrongNetwork {
        kind: SourceKind,
        expected: String,
        got: String,
    },

    #[error("{kind} is at block {got}, expected block {expected}")]
    WrongBlock {
        kind: SourceKind,
        expected: u64,
        got: u64,
    },

    #[error("{kind} has an empty block hash")]
    MissingBlockHash { kind: SourceKind },

    #[error("no snapshot input was accepted")]
    Empty,
}

/// Pins the block reference shared by all inputs of one reconciliation run.
#[derive(Clone, Debug, Default)]
pub struct SnapshotPin {
    expected_network: Option<String>,
    expected_block: Option<u64>,
    pinned: Option<SnapshotRef>,
}

impl SnapshotPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_network(mut self, network: impl Into<String>) -> Self {
        self.expected_network = Some(network.into());
        self
    }

    pub fn expect_block(mut self, block_number: u64) -> Self {
        self.expected_block = Some(block_number);
        self
    }

    /// Check a file **without** pinning it.
    pub fn check(&self, kind: SourceKind, file: &RawSnapshotFile) -> Result<(), SnapshotPinError> {
        let got = SnapshotRef::of(file);

        if got.block_hash.is_empty() {
            return Err(SnapshotPinError::MissingBlockHash { kind });
        }
        if let Some(expected) = &self.expected_network {
            if expected.trim() != got.network {
                return Err(SnapshotPinError::WrongNetwork {
                    kind,
                    expected: expected.clone(),
                    got: got.network,
                });
            }
        }
        if let Some(expected) = self.expected_block {
            if expected != got.block_number {
                return Err(SnapshotPinError::WrongBlock {
                    kind,
                    expected,
                    got: got.block_number,
                });
            }
        }
        if let Some(pinned) = &self.pinned {
            if *pinned != got {
                return Err(SnapshotPinError::Mismatch {
                    kind,
                    pinned: pinned.clone(),
                    got,
                });
            }
        }
        Ok(())
    }

    /// Check a file **and pin** its block reference if nothing is pinned yet.
    pub fn accept(
        &mut self,
        kind: SourceKind,
        file: &RawSnapshotFile,
    ) -> Result<(), SnapshotPinError> {
        self.check(kind, file)?;
        if self.pinned.is_none() {
            self.pinned = Some(SnapshotRef::of(file));
        }
        Ok(())
    }

    pub fn pinned(&self) -> Option<&SnapshotRef> {
        self.pinned.as_ref()
    }

    /// The pinned reference, or [`SnapshotPinError::Empty`] when nothing
    /// was accepted.
    pub fn finish(self) -> Result<SnapshotRef, SnapshotPinError> {
        self.pinned.ok_or(SnapshotPinError::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ObligationCategory;

    fn raw(network: &str, block_number: u64, block_hash: &str) -> RawSnapshotFile {
        RawSnapshotFile {
            network: network.to_string(),
            block_number,
            block_hash: block_hash.to_string(),
            entries: vec![],
        }
    }

    const PROXY: SourceKind = SourceKind::Obligation(ObligationCategory::Proxy);

    #[test]
    fn first_accept_pins_and_matching_files_pass() {
        let mut pin = SnapshotPin::new();
        pin.accept(SourceKind::SystemAccount, &raw("moonbase", 7, "0xAB"))
            .unwrap();
        pin.accept(PROXY, &raw("moonbase", 7, "0xab")).unwrap();

        let r = pin.finish().unwrap();
        assert_eq!(r.block_number, 7);
        assert_eq!(r.block_hash, "0xab");
    }

    #[test]
    fn different_block_hash_is_rejected() {
        let mut pin = SnapshotPin::new();
        pin.accept(SourceKind::SystemAccount, &raw("moonbase", 7, "0xab"))
            .unwrap();
        let err = pin.accept(PROXY, &raw("moonbase", 7, "0xcd")).unwrap_err();
        assert!(matches!(err, SnapshotPinError::Mismatch { kind, .. } if kind == PROXY));
    }

    #[test]
    fn rejection_does_not_move_the_pin() {
        let mut pin = SnapshotPin::new();
        pin.accept(SourceKind::SystemAccount, &raw("moonbase", 7, "0xab"))
            .unwrap();
        assert!(pin.accept(PROXY, &raw("moonbase", 8, "0xcd")).is_err());
        assert_eq!(pin.pinned().unwrap().block_number, 7);
    }

    #[test]
    fn expected_block_applies_to_first_file() {
        let mut pin = SnapshotPin::new().expect_block(100);
        let err = pin
            .accept(SourceKind::SystemAccount, &raw("moonbase", 99, "0xab"))
            .unwrap_err();
        assert_eq!(
            err,
            SnapshotPinError::WrongBlock {
                kind: SourceKind::SystemAccount,
                expected: 100,
                got: 99,
            }
        );
        assert!(pin.pinned().is_none());
    }

    #[test]
    fn expected_network_is_enforced() {
        let mut pin = SnapshotPin::new().expect_network("moonriver");
        let err = pin
            .accept(SourceKind::SystemAccount, &raw("moonbase", 1, "0xab"))
            .unwrap_err();
        assert!(matches!(err, SnapshotPinError::WrongNetwork { .. }));
    }

    #[test]
    fn empty_hash_is_rejected() {
        let pin = SnapshotPin::new();
        assert_eq!(
            pin.check(PROXY, &raw("moonbase", 1, "  ")),
            Err(SnapshotPinError::MissingBlockHash { kind: PROXY })
        );
    }

    #[test]
    fn finish_without_accept_is_empty() {
        assert_eq!(SnapshotPin::new().finish(), Err(SnapshotPinError::Empty));
    }
}
