//! Hierarchical dotted check identifiers.
//!
//! A [`CheckId`] is a sequence of components separated by `.`, e.g. `5.3.10`.
//! Ordering compares component by component, numerically where both sides
//! are numeric, so `1.1.10` sorts after `1.1.9`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::AuditError;

/// A validated hierarchical check identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CheckId(String);

impl CheckId {
    /// Parse and validate an identifier.
    pub fn parse(raw: &str) -> Result<Self, AuditError> {
        let trimmed = raw.trim();
        let invalid = |reason: &str| AuditError::InvalidCheckId {
            id: raw.to_string(),
            reason: reason.to_string(),
        };

        if trimmed.is_empty() {
            return Err(invalid("identifier is empty"));
        }
        for component in trimmed.split('.') {
            if component.is_empty() {
                return Err(invalid("empty component"));
            }
            if component.chars().any(char::is_whitespace) {
                return Err(invalid("component contains whitespace"));
            }
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Number of dotted components (`4.1.2` has depth 3).
    pub fn depth(&self) -> usize {
        self.components().count()
    }

    /// True when `self` is a strict ancestor of `other` on a dot boundary.
    ///
    /// `4.1` is an ancestor of `4.1.2` but not of `4.10` or of itself.
    pub fn is_ancestor_of(&self, other: &CheckId) -> bool {
        other.0.len() > self.0.len()
            && other.0.starts_with(&self.0)
            && other.0.as_bytes()[self.0.len()] == b'.'
    }

    /// True when `self` is a strict descendant of `other` on a dot boundary.
    pub fn is_descendant_of(&self, other: &CheckId) -> bool {
        other.is_ancestor_of(self)
    }

    /// Top-level section component (`4` for `4.1.2`).
    pub fn section(&self) -> &str {
        self.components().next().unwrap_or_default()
    }

    /// Immediate parent identifier, `None` for a top-level id.
    pub fn parent(&self) -> Option<CheckId> {
        self.0.rsplit_once('.').map(|(head, _)| CheckId(head.to_string()))
    }
}

fn compare_component(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

impl Ord for CheckId {
    fn cmp(&self, other: &Self) -> Ordering {
        let mut left = self.components();
        let mut right = other.components();
        loop {
            match (left.next(), right.next()) {
                (Some(a), Some(b)) => match compare_component(a, b) {
                    Ordering::Equal => continue,
                    unequal => return unequal,
                },
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (None, None) => return Ordering::Equal,
            }
        }
    }
}

impl PartialOrd for CheckId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for CheckId {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CheckId {
    type Error = AuditError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CheckId> for String {
    fn from(id: CheckId) -> Self {
        id.0
    }
}

impl AsRef<str> for CheckId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}
