//! One audit run from catalog to report.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::Instrument;
use uuid::Uuid;

use crate::aggregator::sort_records;
use crate::domain::{Result, RunRequest};
use crate::filter::IdFilter;
use crate::obs;
use crate::progress::ProgressTracker;
use crate::registry::Benchmark;
use crate::report::{AuditReport, ReportSummary};
use crate::scheduler::Scheduler;

/// Run every check of `benchmark` selected by `request`.
///
/// `tracker` is shared with the caller so a progress observer can watch the
/// run. Per-check failures end up in the report; only infrastructure errors
/// are returned as `Err`.
pub async fn run_benchmark(
    benchmark: &Benchmark,
    request: RunRequest,
    tracker: Arc<ProgressTracker>,
) -> Result<AuditReport> {
    let run_id = Uuid::new_v4().to_string();
    let span = obs::run_span(&run_id);
    run_inner(benchmark, request, tracker, run_id)
        .instrument(span)
        .await
}

async fn run_inner(
    benchmark: &Benchmark,
    request: RunRequest,
    tracker: Arc<ProgressTracker>,
    run_id: String,
) -> Result<AuditReport> {
    let started_at = Utc::now();
    let clock = Instant::now();
    obs::emit_run_started(
        &run_id,
        benchmark.name(),
        benchmark.len(),
        request.max_concurrency.get(),
    );

    let sections = benchmark.visible_sections(&IdFilter::from_request(&request));

    let mut scheduler = Scheduler::new(request, tracker);
    for check in benchmark.checks() {
        scheduler.submit(Arc::clone(check)).await?;
    }
    let drained = scheduler.finish().await?;

    let mut records = drained.records;
    sort_records(&mut records);
    let summary = ReportSummary::from_records(&records, clock.elapsed().as_millis() as u64);
    obs::emit_run_finished(&run_id, &summary);

    Ok(AuditReport {
        run_id,
        benchmark: benchmark.name().to_string(),
        started_at,
        finished_at: Utc::now(),
        sections,
        records,
        summary,
    })
}
