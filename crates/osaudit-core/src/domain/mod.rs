//! Domain models for osaudit.
//!
//! - `CheckId`: hierarchical dotted identifier with version-aware ordering
//! - `CheckSpec` / `Finding` / `ResultRecord`: what a check is, what it
//!   concluded, and what ends up in the report
//! - `RunRequest`: immutable parameters of one run

pub mod check;
pub mod error;
pub mod id;
pub mod request;

pub use check::{CheckSpec, Finding, Level, Outcome, RequestedLevel, ResultRecord, ScoringClass};
pub use error::{AuditError, CheckError, Result};
pub use id::CheckId;
pub use request::{default_concurrency, parse_ids, ExecutionMode, RunRequest};
