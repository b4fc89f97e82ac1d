//! Bounded, failure-isolated execution of checks.
//!
//! The scheduler owns a counting semaphore with `max_concurrency` permits and
//! a [`JoinSet`] holding every task it launched. [`Scheduler::submit`] only
//! suspends the caller until a permit is free; [`Scheduler::finish`] joins
//! every task before the results become readable.
//!
//! Each check is wrapped so that `on_start` precedes inspection, `on_finish`
//! precedes record creation, and exactly one record is appended whatever the
//! check does: return a verdict, return an error, panic, or time out.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::aggregator::ResultAggregator;
use crate::domain::{AuditError, CheckError, Finding, ResultRecord, Result, RunRequest};
use crate::filter::IdFilter;
use crate::obs;
use crate::progress::{ProgressTracker, RunPhase, StartToken};
use crate::registry::Check;

/// What `submit` did with a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Rejected by the filter; no work, no counters touched.
    Filtered,
    /// Accepted and launched (or, in sequential mode, already executed).
    Dispatched,
}

/// Records collected after every accepted check has completed.
#[derive(Debug)]
pub struct DrainedRun {
    pub accepted: usize,
    pub records: Vec<ResultRecord>,
}

pub struct Scheduler {
    request: RunRequest,
    filter: IdFilter,
    tracker: Arc<ProgressTracker>,
    aggregator: ResultAggregator,
    slots: Arc<Semaphore>,
    tasks: JoinSet<()>,
    accepted: usize,
}

impl Scheduler {
    pub fn new(request: RunRequest, tracker: Arc<ProgressTracker>) -> Self {
        let filter = IdFilter::from_request(&request);
        let slots = Arc::new(Semaphore::new(request.max_concurrency.get()));
        tracker.set_phase(RunPhase::Running);
        Self {
            request,
            filter,
            tracker,
            aggregator: ResultAggregator::new(),
            slots,
            tasks: JoinSet::new(),
            accepted: 0,
        }
    }

    /// Offer one catalog entry to the scheduler.
    pub async fn submit(&mut self, check: Arc<dyn Check>) -> Result<Submission> {
        let spec = check.spec();
        if !self.filter.should_run(&spec.id, spec.level) {
            obs::emit_check_filtered(&spec.id);
            return Ok(Submission::Filtered);
        }
        self.accepted += 1;

        let timeout = self.request.check_timeout;
        if self.request.is_sequential() {
            let token = start(check.as_ref(), &self.tracker);
            complete(check, token, &self.tracker, &self.aggregator, timeout).await;
            return Ok(Submission::Dispatched);
        }

        let permit = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|_| AuditError::SchedulerClosed)?;
        let tracker = Arc::clone(&self.tracker);
        let aggregator = self.aggregator.clone();

        self.tasks.spawn(async move {
            let _permit = permit;
            let token = start(check.as_ref(), &tracker);
            complete(check, token, &tracker, &aggregator, timeout).await;
        });

        Ok(Submission::Dispatched)
    }

    /// Close submission, wait for every launched check, and take the records.
    pub async fn finish(self) -> Result<DrainedRun> {
        let Scheduler {
            tracker,
            aggregator,
            mut tasks,
            accepted,
            ..
        } = self;

        tracker.set_phase(RunPhase::Draining);
        while let Some(joined) = tasks.join_next().await {
            joined?;
        }
        tracker.set_phase(RunPhase::Finished);

        let records = aggregator.into_records()?;
        debug_assert_eq!(records.len(), accepted);
        Ok(DrainedRun { accepted, records })
    }
}

fn start(check: &dyn Check, tracker: &ProgressTracker) -> StartToken {
    let id = &check.spec().id;
    obs::emit_check_started(id);
    tracker.on_start(id)
}

async fn complete(
    check: Arc<dyn Check>,
    token: StartToken,
    tracker: &ProgressTracker,
    aggregator: &ResultAggregator,
    timeout: Option<Duration>,
) {
    let spec = check.spec();
    let verdict = inspect_isolated(check.as_ref(), timeout).await;

    let duration_ms = tracker.on_finish(token);
    let record = match verdict {
        Ok(finding) => ResultRecord::from_finding(spec, finding, duration_ms),
        Err(err) => {
            obs::emit_check_errored(&spec.id, &err);
            ResultRecord::errored(spec, err.to_string(), duration_ms)
        }
    };
    obs::emit_check_finished(&record);
    aggregator.append(record).await;
}

async fn inspect_isolated(
    check: &dyn Check,
    timeout: Option<Duration>,
) -> std::result::Result<Finding, CheckError> {
    let guarded = AssertUnwindSafe(check.inspect()).catch_unwind();
    let caught = match timeout {
        Some(limit) => match tokio::time::timeout(limit, guarded).await {
            Ok(caught) => caught,
            Err(_) => return Err(CheckError::TimedOut(limit)),
        },
        None => guarded.await,
    };
    caught.unwrap_or_else(|payload| Err(CheckError::Panicked(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
