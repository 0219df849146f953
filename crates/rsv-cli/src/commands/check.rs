//! `rsv check`: load a snapshot directory, reconcile, render.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use futures_util::future::try_join_all;
use rsv_reconcile::report::ReportBuilder;
use rsv_reconcile::snapshot_adapter::{
    normalize_actual_reserved, normalize_obligations, parse_file, RawSnapshotFile, SourceKind,
};
use rsv_reconcile::snapshot_pin::SnapshotPin;
use rsv_reconcile::{reconcile, ActualReservedIndex, ObligationSet};
use tracing::info;

use super::{load_settings, parse_report_format};

pub struct CheckArgs {
    pub config_paths: Vec<String>,
    pub snapshot: Option<String>,
    pub network: Option<String>,
    pub at: Option<u64>,
    pub format: Option<String>,
    pub allow_deficit: bool,
}

pub struct CheckOutcome {
    pub rendered: String,
    pub requires_corrective_transaction: bool,
    pub fail_on_deficit: bool,
}

pub async fn run_check(args: CheckArgs) -> Result<CheckOutcome> {
    let (settings, loaded) = load_settings(&args.config_paths)?;

    // CLI flags override config.
    let dir = args
        .snapshot
        .or(settings.snapshot_dir)
        .context("no snapshot directory: pass --snapshot or set /snapshot/dir in config")?;
    let network = args.network.or(settings.network);
    let at = args.at.or(settings.at);
    let format = match args.format.or(settings.format) {
        Some(f) => parse_report_format(&f)?,
        None => Default::default(),
    };
    let fail_on_deficit = !args.allow_deficit && settings.fail_on_deficit.unwrap_or(true);

    let files = load_snapshot_dir(Path::new(&dir)).await?;

    let mut pin = SnapshotPin::new();
    if let Some(n) = network {
        pin = pin.expect_network(n);
    }
    if let Some(b) = at {
        pin = pin.expect_block(b);
    }
    for (kind, file) in &files {
        pin.accept(*kind, file)?;
    }
    let snapshot = pin.finish()?;
    info!(snapshot = %snapshot, "snapshot inputs pinned");

    let (obligations, actual) = normalize_all(&files)?;
    info!(
        accounts_with_balance = actual.amounts().len(),
        duplicates_ignored = actual.duplicates_ignored(),
        "snapshot inputs normalized"
    );

    let report = reconcile(&obligations, &actual)?;
    info!(
        accounts_considered = report.accounts_considered,
        discrepancies = report.discrepancies.len(),
        requires_corrective_transaction = report.requires_corrective_transaction,
        "reconcile complete"
    );

    let requires_corrective_transaction = report.requires_corrective_transaction;
    let mut builder = ReportBuilder::new(report).snapshot(snapshot);
    if let Some(l) = &loaded {
        builder = builder.config_hash(l.config_hash.clone());
    }
    let rendered = builder
        .build()
        .render(format)
        .context("report render failed")?;

    Ok(CheckOutcome {
        rendered,
        requires_corrective_transaction,
        fail_on_deficit,
    })
}

async fn read_source(dir: PathBuf, kind: SourceKind) -> Result<(SourceKind, RawSnapshotFile)> {
    let path = dir.join(kind.file_name());
    let raw = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("read snapshot input failed: {}", path.display()))?;
    let file = parse_file(kind, &raw)?;
    Ok((kind, file))
}

/// Read and parse all six inputs concurrently. Result order follows
/// [`SourceKind::ALL`] regardless of completion order.
pub async fn load_snapshot_dir(dir: &Path) -> Result<Vec<(SourceKind, RawSnapshotFile)>> {
    try_join_all(
        SourceKind::ALL
            .iter()
            .map(|kind| read_source(dir.to_path_buf(), *kind)),
    )
    .await
}

fn normalize_all(
    files: &[(SourceKind, RawSnapshotFile)],
) -> Result<(ObligationSet, ActualReservedIndex)> {
    let mut obligations = ObligationSet::new();
    let mut actual = None;

    for (kind, file) in files {
        match kind {
            SourceKind::Obligation(category) => {
                obligations.insert(normalize_obligations(*category, file)?)?;
            }
            SourceKind::SystemAccount => {
                actual = Some(normalize_actual_reserved(file)?);
            }
        }
    }

    let actual = actual.context("snapshot is missing the system_account input")?;
    Ok((obligations, actual))
}
