//! The audit report handed to renderers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Outcome, ResultRecord, Result};
use crate::registry::Section;

/// Totals shown in the report footer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub skipped: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub elapsed_ms: u64,
    /// Passed checks over non-skipped checks, 0.0 when nothing was scored.
    pub pass_rate: f64,
}

impl ReportSummary {
    pub fn from_records(records: &[ResultRecord], elapsed_ms: u64) -> Self {
        let mut summary = ReportSummary {
            total: records.len(),
            elapsed_ms,
            ..Self::default()
        };
        for record in records {
            if record.is_skipped() {
                summary.skipped += 1;
                continue;
            }
            match record.outcome {
                Some(Outcome::Pass) => summary.passed += 1,
                Some(Outcome::Fail) => summary.failed += 1,
                Some(Outcome::Error) => summary.errored += 1,
                None => summary.skipped += 1,
            }
        }
        let evaluated = summary.total - summary.skipped;
        if evaluated > 0 {
            summary.pass_rate = summary.passed as f64 / evaluated as f64;
        }
        summary
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn has_errors(&self) -> bool {
        self.errored > 0
    }
}

/// Outcome of one audit run: sorted records plus the visible section banners.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub run_id: String,
    pub benchmark: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sections: Vec<Section>,
    pub records: Vec<ResultRecord>,
    pub summary: ReportSummary,
}

impl AuditReport {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
