//! Structured observability hooks for audit run lifecycle events.
//!
//! This module provides:
//! - A run-scoped tracing span, attached to the run future with `Instrument`
//! - Emission functions for key lifecycle events: run start, check start,
//!   check finish, filtered check, run finish
//!
//! Check-level events are emitted at `debug!`, run-level events at `info!`.
//! Filter with `RUST_LOG`; pass `--json` for JSON log lines.

use tracing::{debug, info, trace, warn};

use crate::domain::{CheckId, ResultRecord};
use crate::report::ReportSummary;

/// Span tagged with the run id; everything logged during the run carries it.
///
/// Attach it with `tracing::Instrument`: an entered span must not be held
/// across `.await`.
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("osaudit.run", run_id = %run_id)
}

/// Emit event: run started against a benchmark.
pub fn emit_run_started(run_id: &str, benchmark: &str, catalog_size: usize, max_concurrency: usize) {
    info!(
        event = "run.started",
        run_id = %run_id,
        benchmark = %benchmark,
        catalog_size = catalog_size,
        max_concurrency = max_concurrency,
    );
}

/// Emit event: a check was rejected by the filter.
pub fn emit_check_filtered(check_id: &CheckId) {
    trace!(event = "check.filtered", check_id = %check_id);
}

/// Emit event: a check began executing.
pub fn emit_check_started(check_id: &CheckId) {
    debug!(event = "check.started", check_id = %check_id);
}

/// Emit event: a check produced its record.
pub fn emit_check_finished(record: &ResultRecord) {
    debug!(
        event = "check.finished",
        check_id = %record.id,
        status = record.status_label(),
        duration_ms = record.duration_ms,
    );
}

/// Emit event: a check could not reach a verdict (warning level).
pub fn emit_check_errored(check_id: &CheckId, error: &dyn std::fmt::Display) {
    warn!(event = "check.errored", check_id = %check_id, error = %error);
}

/// Emit event: run finished with its summary counts.
pub fn emit_run_finished(run_id: &str, summary: &ReportSummary) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        total = summary.total,
        passed = summary.passed,
        failed = summary.failed,
        errored = summary.errored,
        skipped = summary.skipped,
        elapsed_ms = summary.elapsed_ms,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_span_create() {
        let span = run_span("test-run-id");
        let _entered = span.enter();
    }

    #[test]
    fn test_emitters_without_subscriber() {
        let id = CheckId::parse("1.1.1").unwrap();
        emit_check_filtered(&id);
        emit_check_started(&id);
        emit_check_errored(&id, &"boom");
        emit_run_started("run", "bench", 3, 2);
        emit_run_finished("run", &ReportSummary::default());
    }
}
