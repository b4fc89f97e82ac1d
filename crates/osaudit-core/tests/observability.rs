//! Observability tests for audit run lifecycle tracing.
//!
//! Emitters must be callable with or without an installed subscriber, and a
//! run must still complete when JSON tracing is active.

use std::sync::Arc;

use osaudit_core::{
    emit_check_errored, emit_check_filtered, emit_check_finished, emit_check_started,
    emit_run_finished, emit_run_started, init_tracing, run_benchmark, run_span, Benchmark, CheckId,
    CheckSpec, Finding, Level, ProgressTracker, ReportSummary, ResultRecord, RunRequest,
    ScoringClass,
};

fn record() -> ResultRecord {
    let spec = CheckSpec::new(
        CheckId::parse("5.2.1").unwrap(),
        Level::One,
        ScoringClass::Scored,
        "Ensure permissions on /etc/ssh/sshd_config are configured",
    );
    ResultRecord::from_finding(&spec, Finding::pass(), 4)
}

#[test]
fn test_lifecycle_emitters_do_not_panic() {
    let span = run_span("run-123");
    let _entered = span.enter();
    let id = CheckId::parse("5.2.1").unwrap();
    emit_run_started("run-123", "CIS Distribution Independent Linux", 120, 8);
    emit_check_filtered(&id);
    emit_check_started(&id);
    emit_check_finished(&record());
    emit_check_errored(&id, &"permission denied");
    emit_run_finished("run-123", &ReportSummary::default());
}

#[tokio::test]
async fn test_run_with_json_tracing_installed() {
    init_tracing(true, tracing::Level::TRACE);
    let bench = Benchmark::new("empty");
    let report = run_benchmark(&bench, RunRequest::default(), Arc::new(ProgressTracker::new()))
        .await
        .unwrap();
    assert!(report.records.is_empty());
    assert_eq!(report.summary.total, 0);
    assert!(!report.run_id.is_empty());
}
