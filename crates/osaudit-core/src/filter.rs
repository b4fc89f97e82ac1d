//! Inclusion / exclusion filtering over hierarchical check ids.
//!
//! Matching works on dot boundaries only: an include entry `4.1` selects
//! `4.1` itself, its descendants (`4.1.2`) and its ancestors (`4`), but
//! never `4.10`. Exclusion removes an entry and all of its descendants and
//! always wins over inclusion.

use crate::domain::{CheckId, Level, RequestedLevel, RunRequest};

/// Decides which checks of the catalog a run executes.
#[derive(Debug, Clone, Default)]
pub struct IdFilter {
    requested_level: RequestedLevel,
    include: Vec<CheckId>,
    exclude: Vec<CheckId>,
}

impl IdFilter {
    pub fn new(requested_level: RequestedLevel, include: Vec<CheckId>, exclude: Vec<CheckId>) -> Self {
        Self {
            requested_level,
            include,
            exclude,
        }
    }

    pub fn from_request(request: &RunRequest) -> Self {
        Self::new(
            request.requested_level,
            request.include.clone(),
            request.exclude.clone(),
        )
    }

    /// Whether the check `(id, level)` is executed in this run.
    ///
    /// A non-matching include list rejects the check whatever level was
    /// requested.
    pub fn should_run(&self, id: &CheckId, level: Level) -> bool {
        if !self.requested_level.admits(level) {
            return false;
        }
        self.id_selected(id)
    }

    fn id_selected(&self, id: &CheckId) -> bool {
        if !self.include.is_empty() && !self.include.iter().any(|entry| related(id, entry)) {
            return false;
        }
        !self
            .exclude
            .iter()
            .any(|entry| id == entry || id.is_descendant_of(entry))
    }
}

fn related(id: &CheckId, entry: &CheckId) -> bool {
    id == entry || id.is_ancestor_of(entry) || id.is_descendant_of(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> CheckId {
        CheckId::parse(s).unwrap()
    }

    fn ids(list: &[&str]) -> Vec<CheckId> {
        list.iter().map(|s| id(s)).collect()
    }

    #[test]
    fn test_empty_filter_accepts_everything() {
        let filter = IdFilter::default();
        assert!(filter.should_run(&id("9.9.9"), Level::Two));
    }

    #[test]
    fn test_include_and_exclude_example() {
        let filter = IdFilter::new(RequestedLevel::Any, ids(&["4.1"]), ids(&["4.1.1"]));
        assert!(filter.should_run(&id("4.1.2"), Level::One));
        assert!(!filter.should_run(&id("4.1.1.2"), Level::One));
        assert!(filter.should_run(&id("4"), Level::One));
        assert!(!filter.should_run(&id("5"), Level::One));
        assert!(!filter.should_run(&id("4.1.1"), Level::One));
    }

    #[test]
    fn test_prefix_matching_respects_dot_boundaries() {
        let filter = IdFilter::new(RequestedLevel::Any, ids(&["4.1"]), vec![]);
        assert!(!filter.should_run(&id("4.10"), Level::One));
        assert!(!filter.should_run(&id("4.10.1"), Level::One));
        assert!(filter.should_run(&id("4.1.10"), Level::One));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let filter = IdFilter::new(RequestedLevel::Any, ids(&["1.1.2"]), ids(&["1.1"]));
        assert!(!filter.should_run(&id("1.1.2"), Level::One));
        // The ancestor is excluded too.
        assert!(!filter.should_run(&id("1.1"), Level::One));
        // Ancestors above the excluded entry stay visible.
        assert!(filter.should_run(&id("1"), Level::One));
    }

    #[test]
    fn test_level_filter() {
        let filter = IdFilter::new(RequestedLevel::Only(Level::One), vec![], vec![]);
        assert!(filter.should_run(&id("3.4.1"), Level::One));
        assert!(!filter.should_run(&id("3.4.1"), Level::Two));
    }

    #[test]
    fn test_include_rejects_at_every_level() {
        for level in [RequestedLevel::Any, RequestedLevel::Only(Level::Two)] {
            let filter = IdFilter::new(level, ids(&["2"]), vec![]);
            assert!(!filter.should_run(&id("3.1"), Level::Two));
        }
    }
}
