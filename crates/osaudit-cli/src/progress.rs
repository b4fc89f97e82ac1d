//! Live progress line on stderr.

use std::io::{IsTerminal, Write};
use std::sync::Arc;
use std::time::Duration;

use osaudit_core::{ProgressSnapshot, ProgressTracker, RunPhase};
use tokio::task::JoinHandle;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const BAR_WIDTH: usize = 30;

/// Off in verbose mode and when stderr is not a terminal.
pub fn enabled(verbose: bool, no_progress: bool) -> bool {
    !(verbose || no_progress) && std::io::stderr().is_terminal()
}

/// Poll `tracker` every 100 ms until the run has drained.
pub fn spawn_observer(tracker: Arc<ProgressTracker>, total: usize) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        let mut stderr = std::io::stderr();
        loop {
            ticker.tick().await;
            let snap = tracker.snapshot();
            let _ = write!(stderr, "\r{}", progress_line(&snap, total));
            let _ = stderr.flush();
            if snap.is_drained() {
                break;
            }
        }
        let _ = write!(stderr, "\r{:width$}\r", "", width = BAR_WIDTH + 40);
        let _ = stderr.flush();
    })
}

pub fn progress_line(snap: &ProgressSnapshot, total: usize) -> String {
    let filled = if total == 0 {
        BAR_WIDTH
    } else {
        (snap.finished.min(total) * BAR_WIDTH) / total
    };
    let phase = match snap.phase {
        RunPhase::Loading => "loading",
        RunPhase::Running => "running",
        RunPhase::Draining => "draining",
        RunPhase::Finished => "done",
    };
    format!(
        "[{}{}] {:>4}/{:<4} {:>2} in flight  {phase}",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        snap.finished,
        total,
        snap.in_flight(),
    )
}
