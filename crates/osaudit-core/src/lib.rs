//! osaudit Core Library
//!
//! The check orchestration engine: identifier filtering, bounded concurrent
//! scheduling with failure isolation, live progress counters and result
//! aggregation. Concrete checks live in `osaudit-checks`.

pub mod aggregator;
pub mod config;
pub mod domain;
pub mod engine;
pub mod filter;
pub mod obs;
pub mod progress;
pub mod registry;
pub mod report;
pub mod scheduler;
pub mod telemetry;

pub use aggregator::{sort_records, ResultAggregator};
pub use config::AuditConfig;
pub use domain::{
    AuditError, CheckError, CheckId, CheckSpec, ExecutionMode, Finding, Level, Outcome,
    RequestedLevel, Result, ResultRecord, RunRequest, ScoringClass,
};
pub use engine::run_benchmark;
pub use filter::IdFilter;
pub use obs::{
    emit_check_errored, emit_check_filtered, emit_check_finished, emit_check_started,
    emit_run_finished, emit_run_started, run_span,
};
pub use progress::{ProgressSnapshot, ProgressTracker, RunPhase, StartToken};
pub use registry::{Benchmark, Check, Section};
pub use report::{AuditReport, ReportSummary};
pub use scheduler::{DrainedRun, Scheduler, Submission};
pub use telemetry::{init_tracing, level_for};
