//! Report rendering.
//!
//! Text output is `key=value` lines, stable across runs: one line per
//! discrepancy, then the remediation lines, then the escalation flag last.
//! JSON output carries the same data with amounts as decimal strings.

use std::fmt::Write as _;
use std::str::FromStr;

use serde::Serialize;

use crate::snapshot_pin::SnapshotRef;
use crate::{plan_remediation, Amount, Discrepancy, ReconcileReport, Remediation};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Text => "text",
            ReportFormat::Json => "json",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!(
                "invalid report format '{other}'. expected one of: text | json"
            )),
        }
    }
}

/// Everything the operator needs from one run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SnapshotRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
    #[serde(flatten)]
    pub reconcile: ReconcileReport,
    pub remediation: Remediation,
}

#[derive(Clone, Debug)]
pub struct ReportBuilder {
    report: ReconcileReport,
    snapshot: Option<SnapshotRef>,
    config_hash: Option<String>,
}

impl ReportBuilder {
    pub fn new(report: ReconcileReport) -> Self {
        Self {
            report,
            snapshot: None,
            config_hash: None,
        }
    }

    pub fn snapshot(mut self, snapshot: SnapshotRef) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    pub fn build(self) -> AuditReport {
        let remediation = plan_remediation(&self.report);
        AuditReport {
            snapshot: self.snapshot,
            config_hash: self.config_hash,
            reconcile: self.report,
            remediation,
        }
    }
}

impl AuditReport {
    pub fn render(&self, format: ReportFormat) -> Result<String, serde_json::Error> {
        match format {
            ReportFormat::Text => Ok(self.render_text()),
            ReportFormat::Json => self.render_json(),
        }
    }

    pub fn render_json(&self) -> Result<String, serde_json::Error> {
        let mut s = serde_json::to_string_pretty(self)?;
        s.push('\n');
        Ok(s)
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let r = &self.reconcile;

        // Writing into a String cannot fail.
        if let Some(snap) = &self.snapshot {
            let _ = writeln!(
                out,
                "network={} block_number={} block_hash={}",
                snap.network, snap.block_number, snap.block_hash
            );
        }
        if let Some(h) = &self.config_hash {
            let _ = writeln!(out, "config_hash={h}");
        }
        let _ = writeln!(
            out,
            "accounts_considered={} discrepancies={}",
            r.accounts_considered,
            r.discrepancies.len()
        );

        for d in &r.discrepancies {
            let _ = writeln!(out, "{}", discrepancy_line(d));
        }

        for rel in self.remediation.releases() {
            let _ = writeln!(out, "unreserve account={} amount={}", rel.account, rel.amount);
        }
        for c in self.remediation.corrections() {
            let _ = writeln!(
                out,
                "hotfix_correction account={} missing={}",
                c.account, c.missing
            );
        }

        let _ = writeln!(
            out,
            "total_excess={} total_deficit={}",
            total_text(r.total_excess),
            total_text(r.total_deficit)
        );
        let _ = writeln!(
            out,
            "requires_corrective_transaction={}",
            r.requires_corrective_transaction
        );
        out
    }
}

fn total_text(total: Option<Amount>) -> String {
    match total {
        Some(v) => v.to_string(),
        None => "overflow".to_string(),
    }
}

fn discrepancy_line(d: &Discrepancy) -> String {
    let breakdown = d
        .expected_by_category
        .iter()
        .map(|(c, v)| format!("{}:{}", c.as_str(), v))
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "discrepancy account={} kind={} actual={} expected={} delta={} breakdown={}",
        d.account,
        d.kind().as_str(),
        d.actual,
        d.expected,
        d.delta,
        if breakdown.is_empty() { "-" } else { &breakdown }
    )
}
