//! Check metadata, verdicts and result records.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::AuditError;
use super::id::CheckId;

/// Benchmark profile level a check belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Level {
    One,
    Two,
}

impl Level {
    pub fn as_u8(self) -> u8 {
        match self {
            Level::One => 1,
            Level::Two => 2,
        }
    }
}

impl TryFrom<u8> for Level {
    type Error = AuditError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Level::One),
            2 => Ok(Level::Two),
            other => Err(AuditError::InvalidLevel(other)),
        }
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.as_u8()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Level selection for a run: `0` on the command line means any level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestedLevel {
    #[default]
    Any,
    Only(Level),
}

impl RequestedLevel {
    pub fn admits(self, level: Level) -> bool {
        match self {
            RequestedLevel::Any => true,
            RequestedLevel::Only(wanted) => wanted == level,
        }
    }
}

impl TryFrom<u8> for RequestedLevel {
    type Error = AuditError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RequestedLevel::Any),
            other => Level::try_from(other).map(RequestedLevel::Only),
        }
    }
}

impl fmt::Display for RequestedLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestedLevel::Any => f.write_str("any"),
            RequestedLevel::Only(level) => write!(f, "{level}"),
        }
    }
}

/// How a check contributes to the benchmark score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringClass {
    Scored,
    NotScored,
    Skipped,
}

impl fmt::Display for ScoringClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScoringClass::Scored => "Scored",
            ScoringClass::NotScored => "Not Scored",
            ScoringClass::Skipped => "Skipped",
        };
        f.pad(s)
    }
}

/// Verdict of an executed check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Fail,
    Error,
}

/// Static catalog metadata for one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSpec {
    pub id: CheckId,
    pub level: Level,
    pub scoring_class: ScoringClass,
    pub description: String,
}

impl CheckSpec {
    pub fn new(
        id: CheckId,
        level: Level,
        scoring_class: ScoringClass,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            level,
            scoring_class,
            description: description.into(),
        }
    }
}

/// What a check procedure concluded.
///
/// A fresh `Finding` is a failure: a check has to prove compliance
/// explicitly via [`Finding::mark_pass`] or [`Finding::pass`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    verdict: Verdict,
    detail: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Pass,
    Fail,
    Skipped,
}

impl Default for Finding {
    fn default() -> Self {
        Self {
            verdict: Verdict::Fail,
            detail: None,
        }
    }
}

impl Finding {
    pub fn pass() -> Self {
        Self {
            verdict: Verdict::Pass,
            detail: None,
        }
    }

    pub fn fail(detail: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Fail,
            detail: Some(detail.into()),
        }
    }

    /// The check does not apply to this host.
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Skipped,
            detail: Some(reason.into()),
        }
    }

    pub fn mark_pass(&mut self) {
        self.verdict = Verdict::Pass;
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn is_pass(&self) -> bool {
        self.verdict == Verdict::Pass
    }

    pub fn is_skipped(&self) -> bool {
        self.verdict == Verdict::Skipped
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Scoring class and outcome this finding produces for `spec`.
    pub fn classify(&self, spec: &CheckSpec) -> (ScoringClass, Option<Outcome>) {
        match self.verdict {
            Verdict::Pass => (spec.scoring_class, Some(Outcome::Pass)),
            Verdict::Fail => (spec.scoring_class, Some(Outcome::Fail)),
            Verdict::Skipped => (ScoringClass::Skipped, None),
        }
    }
}

/// One line of the final report. Created once per executed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: CheckId,
    pub description: String,
    pub scoring_class: ScoringClass,
    pub level: Level,
    pub outcome: Option<Outcome>,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ResultRecord {
    pub fn from_finding(spec: &CheckSpec, finding: Finding, duration_ms: u64) -> Self {
        let (scoring_class, outcome) = finding.classify(spec);
        Self {
            id: spec.id.clone(),
            description: spec.description.clone(),
            scoring_class,
            level: spec.level,
            outcome,
            duration_ms,
            detail: finding.detail,
        }
    }

    pub fn errored(spec: &CheckSpec, detail: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            id: spec.id.clone(),
            description: spec.description.clone(),
            scoring_class: spec.scoring_class,
            level: spec.level,
            outcome: Some(Outcome::Error),
            duration_ms,
            detail: Some(detail.into()),
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.scoring_class == ScoringClass::Skipped
    }

    /// Short status label used by renderers.
    pub fn status_label(&self) -> &'static str {
        if self.is_skipped() {
            return "SKIP";
        }
        match self.outcome {
            Some(Outcome::Pass) => "PASS",
            Some(Outcome::Fail) => "FAIL",
            Some(Outcome::Error) => "ERROR",
            None => "SKIP",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(class: ScoringClass) -> CheckSpec {
        CheckSpec::new(
            CheckId::parse("1.1.1").unwrap(),
            Level::One,
            class,
            "Ensure mounting of cramfs is disabled",
        )
    }

    #[test]
    fn test_finding_is_fail_closed() {
        let finding = Finding::default();
        assert!(!finding.is_pass());
        let record = ResultRecord::from_finding(&spec(ScoringClass::Scored), finding, 3);
        assert_eq!(record.outcome, Some(Outcome::Fail));
        assert_eq!(record.status_label(), "FAIL");
    }

    #[test]
    fn test_mark_pass() {
        let mut finding = Finding::default();
        finding.mark_pass();
        let record = ResultRecord::from_finding(&spec(ScoringClass::Scored), finding, 0);
        assert_eq!(record.outcome, Some(Outcome::Pass));
    }

    #[test]
    fn test_skipped_finding_clears_outcome() {
        let record = ResultRecord::from_finding(
            &spec(ScoringClass::Scored),
            Finding::skipped("package not installed"),
            1,
        );
        assert_eq!(record.scoring_class, ScoringClass::Skipped);
        assert_eq!(record.outcome, None);
        assert_eq!(record.detail.as_deref(), Some("package not installed"));
        assert_eq!(record.status_label(), "SKIP");
    }

    #[test]
    fn test_not_scored_keeps_outcome() {
        let record =
            ResultRecord::from_finding(&spec(ScoringClass::NotScored), Finding::pass(), 0);
        assert_eq!(record.scoring_class, ScoringClass::NotScored);
        assert_eq!(record.outcome, Some(Outcome::Pass));
    }

    #[test]
    fn test_requested_level_parsing() {
        assert_eq!(RequestedLevel::try_from(0).unwrap(), RequestedLevel::Any);
        assert_eq!(
            RequestedLevel::try_from(2).unwrap(),
            RequestedLevel::Only(Level::Two)
        );
        assert!(RequestedLevel::try_from(3).is_err());
        assert!(RequestedLevel::Any.admits(Level::Two));
        assert!(!RequestedLevel::Only(Level::One).admits(Level::Two));
    }
}
