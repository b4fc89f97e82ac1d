//! Append-only collection of check results.
//!
//! Many tasks append concurrently through a shared handle; the records can
//! only be taken once every other handle is gone, i.e. after the scheduler
//! has joined all of its tasks.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{AuditError, ResultRecord, Result};

/// Cloneable handle to the shared result list.
#[derive(Debug, Clone, Default)]
pub struct ResultAggregator {
    records: Arc<Mutex<Vec<ResultRecord>>>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record. The whole record becomes visible at once.
    pub async fn append(&self, record: ResultRecord) {
        self.records.lock().await.push(record);
    }

    /// Number of records appended so far.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Take the records in append order.
    ///
    /// Fails with [`AuditError::ResultsStillShared`] while any clone of this
    /// handle is still alive, so a read can never observe a partial run.
    pub fn into_records(self) -> Result<Vec<ResultRecord>> {
        match Arc::try_unwrap(self.records) {
            Ok(mutex) => Ok(mutex.into_inner()),
            Err(shared) => Err(AuditError::ResultsStillShared {
                holders: Arc::strong_count(&shared) - 1,
            }),
        }
    }
}

/// Sort records by id, component-wise numeric. Stable and idempotent.
pub fn sort_records(records: &mut [ResultRecord]) {
    records.sort_by(|a, b| a.id.cmp(&b.id));
}
