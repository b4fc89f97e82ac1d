//! Orchestration properties: exactly-once recording, bounded concurrency,
//! counter monotonicity, isolation and filtering end to end.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use osaudit_core::{
    run_benchmark, Benchmark, Check, CheckError, CheckId, CheckSpec, Finding, Level, Outcome,
    ProgressTracker, RunPhase, RunRequest, ScoringClass,
};

/// Tracks how many synthetic checks are inside `inspect` at once.
#[derive(Default)]
struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

enum Behaviour {
    Pass,
    Silent,
    Error,
    Panic,
}

struct Synthetic {
    spec: CheckSpec,
    delay: Duration,
    behaviour: Behaviour,
    gauge: Arc<Gauge>,
}

#[async_trait]
impl Check for Synthetic {
    fn spec(&self) -> &CheckSpec {
        &self.spec
    }

    async fn inspect(&self) -> Result<Finding, CheckError> {
        self.gauge.enter();
        tokio::time::sleep(self.delay).await;
        self.gauge.leave();
        match self.behaviour {
            Behaviour::Pass => Ok(Finding::pass()),
            Behaviour::Silent => Ok(Finding::default()),
            Behaviour::Error => Err(CheckError::malformed("/etc/passwd", "short line")),
            Behaviour::Panic => panic!("synthetic panic"),
        }
    }
}

fn spec(id: &str, level: Level) -> CheckSpec {
    CheckSpec::new(
        CheckId::parse(id).unwrap(),
        level,
        ScoringClass::Scored,
        format!("synthetic {id}"),
    )
}

/// Deterministic pseudo-random delay in 0..=12 ms.
fn jitter(i: usize) -> Duration {
    Duration::from_millis(((i * 7919 + 13) % 13) as u64)
}

fn synthetic_benchmark(n: usize, gauge: &Arc<Gauge>) -> Benchmark {
    let mut bench = Benchmark::new("synthetic");
    for i in 0..n {
        let id = format!("{}.{}", i / 10 + 1, i % 10 + 1);
        bench
            .register(Arc::new(Synthetic {
                spec: spec(&id, Level::One),
                delay: jitter(i),
                behaviour: Behaviour::Pass,
                gauge: Arc::clone(gauge),
            }))
            .unwrap();
    }
    bench
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_accepted_check_recorded_exactly_once() {
    let gauge = Arc::new(Gauge::default());
    let bench = synthetic_benchmark(60, &gauge);
    let request = RunRequest::default().with_max_concurrency(5).unwrap();
    let tracker = Arc::new(ProgressTracker::new());

    let report = run_benchmark(&bench, request, Arc::clone(&tracker))
        .await
        .unwrap();

    assert_eq!(report.records.len(), 60);
    let unique: HashSet<_> = report.records.iter().map(|r| r.id.clone()).collect();
    assert_eq!(unique.len(), 60);
    assert!(report.records.iter().all(|r| r.outcome == Some(Outcome::Pass)));

    let snap = tracker.snapshot();
    assert_eq!((snap.started, snap.finished), (60, 60));
    assert_eq!(snap.phase, RunPhase::Finished);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_bound_never_exceeded() {
    let gauge = Arc::new(Gauge::default());
    let bench = synthetic_benchmark(40, &gauge);
    let request = RunRequest::default().with_max_concurrency(3).unwrap();

    run_benchmark(&bench, request, Arc::new(ProgressTracker::new()))
        .await
        .unwrap();

    let peak = gauge.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak in-flight {peak} exceeded bound 3");
    assert!(peak >= 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_counters_monotonic_while_running() {
    let gauge = Arc::new(Gauge::default());
    let bench = synthetic_benchmark(50, &gauge);
    let request = RunRequest::default().with_max_concurrency(4).unwrap();
    let tracker = Arc::new(ProgressTracker::new());

    let sampler = {
        let tracker = Arc::clone(&tracker);
        tokio::spawn(async move {
            let mut samples = Vec::new();
            loop {
                let snap = tracker.snapshot();
                samples.push(snap);
                if snap.phase == RunPhase::Finished {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            samples
        })
    };

    run_benchmark(&bench, request, Arc::clone(&tracker))
        .await
        .unwrap();
    let samples = sampler.await.unwrap();

    for pair in samples.windows(2) {
        assert!(pair[1].started >= pair[0].started);
        assert!(pair[1].finished >= pair[0].finished);
    }
    for snap in &samples {
        assert!(snap.finished <= snap.started);
    }
    let last = samples.last().unwrap();
    assert_eq!((last.started, last.finished), (50, 50));
}

#[tokio::test]
async fn test_failure_isolation_and_fail_closed_default() {
    let gauge = Arc::new(Gauge::default());
    let mut bench = Benchmark::new("isolation");
    for (id, behaviour) in [
        ("1.1", Behaviour::Pass),
        ("1.2", Behaviour::Error),
        ("1.3", Behaviour::Silent),
        ("1.4", Behaviour::Panic),
        ("1.5", Behaviour::Pass),
    ] {
        bench
            .register(Arc::new(Synthetic {
                spec: spec(id, Level::One),
                delay: Duration::from_millis(2),
                behaviour,
                gauge: Arc::clone(&gauge),
            }))
            .unwrap();
    }

    let report = run_benchmark(
        &bench,
        RunRequest::default().with_max_concurrency(2).unwrap(),
        Arc::new(ProgressTracker::new()),
    )
    .await
    .unwrap();

    let outcomes: Vec<_> = report.records.iter().map(|r| r.outcome).collect();
    assert_eq!(
        outcomes,
        vec![
            Some(Outcome::Pass),
            Some(Outcome::Error),
            Some(Outcome::Fail),
            Some(Outcome::Error),
            Some(Outcome::Pass),
        ]
    );
    assert_eq!(report.summary.total, 5);
    assert_eq!(report.summary.errored, 2);
    assert_eq!(report.summary.failed, 1);
}

#[tokio::test]
async fn test_include_exclude_end_to_end() {
    let gauge = Arc::new(Gauge::default());
    let mut bench = Benchmark::new("filtering");
    for id in ["1.1", "1.1.1", "1.1.2", "2.1", "2.2"] {
        bench
            .register(Arc::new(Synthetic {
                spec: spec(id, Level::One),
                delay: Duration::from_millis(1),
                behaviour: Behaviour::Pass,
                gauge: Arc::clone(&gauge),
            }))
            .unwrap();
    }
    bench.add_section(CheckId::parse("1").unwrap(), "One");
    bench.add_section(CheckId::parse("2").unwrap(), "Two");

    let request = RunRequest::default()
        .with_level(0)
        .unwrap()
        .with_include(["1.1"])
        .unwrap()
        .with_exclude(["1.1.2"])
        .unwrap()
        .with_max_concurrency(2)
        .unwrap();
    let tracker = Arc::new(ProgressTracker::new());

    let report = run_benchmark(&bench, request, Arc::clone(&tracker))
        .await
        .unwrap();

    let ids: Vec<String> = report.records.iter().map(|r| r.id.to_string()).collect();
    assert_eq!(ids, vec!["1.1", "1.1.1"]);
    assert_eq!(tracker.snapshot().started, 2);

    let shown: Vec<String> = report.sections.iter().map(|s| s.id.to_string()).collect();
    assert_eq!(shown, vec!["1"]);
}

#[tokio::test]
async fn test_level_two_request_skips_level_one_checks() {
    let gauge = Arc::new(Gauge::default());
    let mut bench = Benchmark::new("levels");
    for (id, level) in [
        ("3.1", Level::One),
        ("3.4.1", Level::Two),
        ("3.4.2", Level::Two),
        ("5.1.1", Level::One),
    ] {
        bench
            .register(Arc::new(Synthetic {
                spec: spec(id, level),
                delay: Duration::ZERO,
                behaviour: Behaviour::Pass,
                gauge: Arc::clone(&gauge),
            }))
            .unwrap();
    }
    for (id, title) in [("3", "Network"), ("3.4", "Protocols"), ("5", "Access"), ("5.1", "cron")] {
        bench.add_section(CheckId::parse(id).unwrap(), title);
    }

    let report = run_benchmark(
        &bench,
        RunRequest::default().with_level(2).unwrap(),
        Arc::new(ProgressTracker::new()),
    )
    .await
    .unwrap();

    assert!(report.records.iter().all(|r| r.level == Level::Two));
    assert_eq!(report.records.len(), 2);

    // Banners with no level 2 check beneath them are hidden.
    let shown: Vec<String> = report.sections.iter().map(|s| s.id.to_string()).collect();
    assert_eq!(shown, vec!["3", "3.4"]);
}
