//! Declarative check rules and their evaluation against a [`Host`].
//!
//! Every rule starts from a failing [`Finding`] and only marks it passed once
//! the compliant state has been observed.

use regex::{Regex, RegexBuilder};

use osaudit_core::{CheckError, Finding};

use crate::probe::system::{
    any_package_installed, kernel_module, package_installed, service_enabled, sysctl,
};
use crate::probe::Host;

const SHADOW_FILE: &str = "/etc/shadow";
const PASSWD_FILE: &str = "/etc/passwd";

/// Numeric comparison for configuration values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    AtMost(i64),
    AtLeast(i64),
}

impl Bound {
    fn admits(self, value: i64) -> bool {
        match self {
            Bound::AtMost(max) => value <= max,
            Bound::AtLeast(min) => value >= min,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Module is not loaded and `modprobe` will not load it.
    ModuleDisabled { module: &'static str },
    /// Every kernel parameter has the expected value.
    SysctlEquals {
        settings: &'static [(&'static str, &'static str)],
    },
    /// None of the packages is installed.
    PackagesAbsent { packages: &'static [&'static str] },
    /// At least one of the packages is installed.
    PackageInstalled { any_of: &'static [&'static str] },
    /// Unit is not enabled. Skipped when `package` is not installed.
    ServiceDisabled {
        unit: &'static str,
        package: &'static str,
    },
    /// Package is installed and unit is enabled.
    ServiceEnabled {
        unit: &'static str,
        package: &'static str,
    },
    /// Mode is no more permissive than `max_mode`, owner and group allowed.
    FilePermissions {
        path: &'static str,
        max_mode: u32,
        uid: u32,
        gids: &'static [u32],
    },
    /// Some existing file among `paths` has a line matching `pattern`.
    FileMatches {
        paths: &'static [&'static str],
        pattern: &'static str,
    },
    /// No line of `path` matches `pattern`.
    FileLacks {
        path: &'static str,
        pattern: &'static str,
    },
    /// First capture of `pattern` in `path` is a number within `bound`.
    NumericSetting {
        path: &'static str,
        pattern: &'static str,
        bound: Bound,
    },
    /// No account in `/etc/shadow` has an empty password field.
    NoEmptyPasswords,
    /// `root` is the only account with UID 0.
    SoleRootUid,
    /// Requires a human; never decided automatically.
    Manual { reason: &'static str },
}

impl Rule {
    /// Regex patterns the rule uses, for catalog validation.
    pub fn pattern(&self) -> Option<&'static str> {
        match *self {
            Rule::FileMatches { pattern, .. }
            | Rule::FileLacks { pattern, .. }
            | Rule::NumericSetting { pattern, .. } => Some(pattern),
            _ => None,
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, Rule::Manual { .. })
    }

    pub async fn evaluate(&self, host: &dyn Host) -> Result<Finding, CheckError> {
        match *self {
            Rule::ModuleDisabled { module } => module_disabled(host, module).await,
            Rule::SysctlEquals { settings } => sysctl_equals(host, settings).await,
            Rule::PackagesAbsent { packages } => packages_absent(host, packages).await,
            Rule::PackageInstalled { any_of } => {
                Ok(match any_package_installed(host, any_of).await? {
                    Some(found) => Finding::pass().with_detail(format!("{found} is installed")),
                    None => Finding::fail(format!("none of {} is installed", any_of.join(", "))),
                })
            }
            Rule::ServiceDisabled { unit, package } => {
                if !package_installed(host, package).await? {
                    return Ok(Finding::skipped(format!("{package} is not installed")));
                }
                let mut finding = Finding::fail(format!("{unit} is enabled"));
                if !service_enabled(host, unit).await? {
                    finding = Finding::pass();
                }
                Ok(finding)
            }
            Rule::ServiceEnabled { unit, package } => {
                if !package_installed(host, package).await? {
                    return Ok(Finding::fail(format!("{package} is not installed")));
                }
                let mut finding = Finding::fail(format!("{unit} is not enabled"));
                if service_enabled(host, unit).await? {
                    finding.mark_pass();
                }
                Ok(finding)
            }
            Rule::FilePermissions {
                path,
                max_mode,
                uid,
                gids,
            } => file_permissions(host, path, max_mode, uid, gids).await,
            Rule::FileMatches { paths, pattern } => file_matches(host, paths, pattern).await,
            Rule::FileLacks { path, pattern } => file_lacks(host, path, pattern).await,
            Rule::NumericSetting {
                path,
                pattern,
                bound,
            } => numeric_setting(host, path, pattern, bound).await,
            Rule::NoEmptyPasswords => no_empty_passwords(host).await,
            Rule::SoleRootUid => sole_root_uid(host).await,
            Rule::Manual { reason } => Ok(Finding::skipped(reason)),
        }
    }
}

fn compile(pattern: &str) -> Result<Regex, CheckError> {
    RegexBuilder::new(pattern)
        .multi_line(true)
        .build()
        .map_err(|e| CheckError::malformed("rule pattern", e.to_string()))
}

async fn module_disabled(host: &dyn Host, module: &str) -> Result<Finding, CheckError> {
    let state = kernel_module(host, module).await?;
    if state.loaded {
        return Ok(Finding::fail(format!("{module} is currently loaded")));
    }
    if !state.install_disabled {
        return Ok(Finding::fail(format!("modprobe for {module} is not disabled")));
    }
    Ok(Finding::pass())
}

async fn sysctl_equals(
    host: &dyn Host,
    settings: &[(&str, &str)],
) -> Result<Finding, CheckError> {
    let mut mismatches = Vec::new();
    for (key, expected) in settings {
        match sysctl(host, key).await? {
            Some(actual) if actual == *expected => {}
            Some(actual) => mismatches.push(format!("{key} = {actual} (expected {expected})")),
            None => mismatches.push(format!("{key} is not available")),
        }
    }
    if mismatches.is_empty() {
        Ok(Finding::pass())
    } else {
        Ok(Finding::fail(mismatches.join("; ")))
    }
}

async fn packages_absent(host: &dyn Host, packages: &[&str]) -> Result<Finding, CheckError> {
    let mut installed = Vec::new();
    for package in packages {
        if package_installed(host, package).await? {
            installed.push(*package);
        }
    }
    if installed.is_empty() {
        Ok(Finding::pass())
    } else {
        Ok(Finding::fail(format!("installed: {}", installed.join(", "))))
    }
}

async fn file_permissions(
    host: &dyn Host,
    path: &str,
    max_mode: u32,
    uid: u32,
    gids: &[u32],
) -> Result<Finding, CheckError> {
    let Some(stat) = host.stat(path).await? else {
        return Ok(Finding::skipped(format!("{path} does not exist")));
    };

    let mut problems = Vec::new();
    if stat.mode & !max_mode != 0 {
        problems.push(format!(
            "mode {:04o} is more permissive than {:04o}",
            stat.mode, max_mode
        ));
    }
    if stat.uid != uid {
        problems.push(format!("owner uid {} (expected {uid})", stat.uid));
    }
    if !gids.contains(&stat.gid) {
        problems.push(format!("group gid {} not in {gids:?}", stat.gid));
    }

    if problems.is_empty() {
        Ok(Finding::pass())
    } else {
        Ok(Finding::fail(format!("{path}: {}", problems.join("; "))))
    }
}

async fn file_matches(
    host: &dyn Host,
    paths: &[&str],
    pattern: &str,
) -> Result<Finding, CheckError> {
    let re = compile(pattern)?;
    let mut seen_any = false;
    for path in paths {
        let Some(text) = host.read_file(path).await? else {
            continue;
        };
        seen_any = true;
        if re.is_match(&text) {
            return Ok(Finding::pass());
        }
    }
    if !seen_any {
        return Ok(Finding::skipped(format!("{} not present", paths.join(", "))));
    }
    Ok(Finding::fail(format!("no line matching {pattern:?}")))
}

async fn file_lacks(host: &dyn Host, path: &str, pattern: &str) -> Result<Finding, CheckError> {
    let re = compile(pattern)?;
    let Some(text) = host.read_file(path).await? else {
        return Ok(Finding::skipped(format!("{path} does not exist")));
    };
    match text.lines().find(|line| re.is_match(line)) {
        Some(line) => Ok(Finding::fail(format!("{path}: found {:?}", line.trim()))),
        None => Ok(Finding::pass()),
    }
}

async fn numeric_setting(
    host: &dyn Host,
    path: &str,
    pattern: &str,
    bound: Bound,
) -> Result<Finding, CheckError> {
    let re = compile(pattern)?;
    let Some(text) = host.read_file(path).await? else {
        return Ok(Finding::skipped(format!("{path} does not exist")));
    };
    let Some(captures) = re.captures(&text) else {
        return Ok(Finding::fail(format!("{path}: setting not configured")));
    };
    let raw = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
    let value: i64 = raw
        .parse()
        .map_err(|_| CheckError::malformed(path, format!("expected a number, got {raw:?}")))?;

    let mut finding = Finding::fail(format!("{path}: value {value} outside {bound:?}"));
    if bound.admits(value) {
        finding = Finding::pass().with_detail(format!("value {value}"));
    }
    Ok(finding)
}

async fn no_empty_passwords(host: &dyn Host) -> Result<Finding, CheckError> {
    let text = host
        .read_file(SHADOW_FILE)
        .await?
        .ok_or_else(|| CheckError::malformed(SHADOW_FILE, "file does not exist"))?;

    let mut empty = Vec::new();
    for (idx, line) in account_lines(&text) {
        let fields: Vec<&str> = line.split(':').collect();
        if fields.len() < 2 {
            return Err(CheckError::malformed(
                SHADOW_FILE,
                format!("line {} has {} field(s)", idx + 1, fields.len()),
            ));
        }
        if fields[1].is_empty() {
            empty.push(fields[0]);
        }
    }

    if empty.is_empty() {
        Ok(Finding::pass())
    } else {
        Ok(Finding::fail(format!("empty password for: {}", empty.join(", "))))
    }
}

async fn sole_root_uid(host: &dyn Host) -> Result<Finding, CheckError> {
    let text = host
        .read_file(PASSWD_FILE)
        .await?
        .ok_or_else(|| CheckError::malformed(PASSWD_FILE, "file does not exist"))?;

    let mut uid_zero = Vec::new();
    for (idx, line) in account_lines(&text) {
        let fields: Vec<&str> = line.split(':').collect();
        if fields.len() < 3 {
            return Err(CheckError::malformed(
                PASSWD_FILE,
                format!("line {} has {} field(s)", idx + 1, fields.len()),
            ));
        }
        let uid: u32 = fields[2].parse().map_err(|_| {
            CheckError::malformed(
                PASSWD_FILE,
                format!("line {}: uid {:?} is not a number", idx + 1, fields[2]),
            )
        })?;
        if uid == 0 {
            uid_zero.push(fields[0]);
        }
    }

    let mut finding = Finding::fail(format!("uid 0 accounts: {}", uid_zero.join(", ")));
    if uid_zero == ["root"] {
        finding.mark_pass();
    }
    Ok(finding)
}

/// Non-blank, non-comment lines with their zero-based index. NIS `+`/`-`
/// entries are left to the legacy-entry checks.
fn account_lines(text: &str) -> impl Iterator<Item = (usize, &str)> + '_ {
    text.lines().enumerate().filter(|(_, line)| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with('#') && !line.starts_with('+') && !line.starts_with('-')
    })
}
