//! The check capability and the benchmark catalog that holds checks.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{AuditError, CheckError, CheckId, CheckSpec, Finding, Result};
use crate::filter::IdFilter;

/// A read-only inspection of host state.
///
/// Implementations return `Ok(Finding)` when they could reach a verdict and
/// `Err(CheckError)` when they could not; the scheduler records the latter as
/// an `Error` outcome. Implementations must not modify the system.
#[async_trait]
pub trait Check: Send + Sync {
    fn spec(&self) -> &CheckSpec;

    async fn inspect(&self) -> std::result::Result<Finding, CheckError>;
}

/// A heading row of the report (`1`, `1.1`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub id: CheckId,
    pub title: String,
}

/// A named benchmark: section headings plus checks in catalog order.
#[derive(Clone, Default)]
pub struct Benchmark {
    name: String,
    sections: Vec<Section>,
    checks: Vec<Arc<dyn Check>>,
    ids: HashSet<CheckId>,
}

impl Benchmark {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_section(&mut self, id: CheckId, title: impl Into<String>) -> &mut Self {
        self.sections.push(Section {
            id,
            title: title.into(),
        });
        self
    }

    /// Register a check. Ids must be unique within the benchmark.
    pub fn register(&mut self, check: Arc<dyn Check>) -> Result<&mut Self> {
        let id = check.spec().id.clone();
        if !self.ids.insert(id.clone()) {
            return Err(AuditError::DuplicateCheck(id.to_string()));
        }
        self.checks.push(check);
        Ok(self)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Checks in catalog order.
    pub fn checks(&self) -> &[Arc<dyn Check>] {
        &self.checks
    }

    /// Checks `filter` accepts, in catalog order.
    pub fn selected<'a>(&'a self, filter: &'a IdFilter) -> impl Iterator<Item = &'a Arc<dyn Check>> {
        self.checks
            .iter()
            .filter(move |c| filter.should_run(&c.spec().id, c.spec().level))
    }

    /// Section banners with at least one accepted check beneath them.
    pub fn visible_sections(&self, filter: &IdFilter) -> Vec<Section> {
        self.sections
            .iter()
            .filter(|section| {
                self.selected(filter)
                    .any(|check| section.id.is_ancestor_of(&check.spec().id))
            })
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl std::fmt::Debug for Benchmark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Benchmark")
            .field("name", &self.name)
            .field("sections", &self.sections.len())
            .field("checks", &self.checks.len())
            .finish()
    }
}
