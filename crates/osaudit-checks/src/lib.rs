//! osaudit checks - the concrete benchmark behind the orchestration engine
//!
//! Provides:
//! - A read-only [`Host`] abstraction over files, metadata and commands
//! - Probes for kernel parameters, kernel modules, packages and services
//! - Declarative [`Rule`]s evaluated fail-closed
//! - The built-in CIS-style catalog, [`cis_benchmark`]

pub mod catalog;
pub mod probe;
pub mod rule;

// Re-export key types
pub use catalog::{cis_benchmark, CatalogCheck, Entry, BENCHMARK_NAME, ENTRIES, SECTIONS};
pub use probe::{fakes::FakeHost, CommandOutput, FileStat, Host, LocalHost, ProbeError};
pub use rule::{Bound, Rule};
