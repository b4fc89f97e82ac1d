//! The built-in CIS-style Linux benchmark.

use std::sync::Arc;

use async_trait::async_trait;
use osaudit_core::{
    Benchmark, Check, CheckError, CheckId, CheckSpec, Finding, Level, Result, ScoringClass,
};

use crate::probe::Host;
use crate::rule::{Bound, Rule};

pub const BENCHMARK_NAME: &str = "CIS Distribution Independent Linux Benchmark (osaudit profile)";

/// A catalog entry bound to the host it inspects.
pub struct CatalogCheck {
    spec: CheckSpec,
    rule: Rule,
    host: Arc<dyn Host>,
}

impl CatalogCheck {
    pub fn new(spec: CheckSpec, rule: Rule, host: Arc<dyn Host>) -> Self {
        Self { spec, rule, host }
    }
}

#[async_trait]
impl Check for CatalogCheck {
    fn spec(&self) -> &CheckSpec {
        &self.spec
    }

    async fn inspect(&self) -> std::result::Result<Finding, CheckError> {
        self.rule.evaluate(self.host.as_ref()).await
    }
}

/// One static row of the catalog.
#[derive(Debug, Clone, Copy)]
pub struct Entry {
    pub id: &'static str,
    pub level: Level,
    pub scored: bool,
    pub title: &'static str,
    pub rule: Rule,
}

const fn entry(id: &'static str, level: u8, scored: bool, title: &'static str, rule: Rule) -> Entry {
    Entry {
        id,
        level: if level == 2 { Level::Two } else { Level::One },
        scored,
        title,
        rule,
    }
}

const fn module(module: &'static str) -> Rule {
    Rule::ModuleDisabled { module }
}

const fn absent(packages: &'static [&'static str]) -> Rule {
    Rule::PackagesAbsent { packages }
}

const fn disabled(unit: &'static str, package: &'static str) -> Rule {
    Rule::ServiceDisabled { unit, package }
}

const fn perms(path: &'static str, max_mode: u32) -> Rule {
    Rule::FilePermissions {
        path,
        max_mode,
        uid: 0,
        gids: ROOT_GID,
    }
}

const fn sshd(pattern: &'static str) -> Rule {
    Rule::FileMatches {
        paths: SSHD_PATHS,
        pattern,
    }
}

const SSHD_CONFIG: &str = "/etc/ssh/sshd_config";
const SSHD_PATHS: &[&str] = &[SSHD_CONFIG];
const ROOT_GID: &[u32] = &[0];
const LOGIN_DEFS: &str = "/etc/login.defs";
const SHADOW_GIDS: &[u32] = &[0, 42];

/// Section banners: `(id, title)`.
pub const SECTIONS: &[(&str, &str)] = &[
    ("1", "Initial Setup"),
    ("1.1", "Filesystem Configuration"),
    ("1.1.1", "Disable unused filesystems"),
    ("1.3", "Filesystem Integrity Checking"),
    ("1.4", "Secure Boot Settings"),
    ("1.5", "Additional Process Hardening"),
    ("1.7", "Warning Banners"),
    ("2", "Services"),
    ("2.1", "inetd Services"),
    ("2.2", "Special Purpose Services"),
    ("2.3", "Service Clients"),
    ("3", "Network Configuration"),
    ("3.1", "Network Parameters (Host Only)"),
    ("3.2", "Network Parameters (Host and Router)"),
    ("3.4", "Uncommon Network Protocols"),
    ("4", "Logging and Auditing"),
    ("4.1", "Configure System Accounting (auditd)"),
    ("4.2", "Configure Logging"),
    ("5", "Access, Authentication and Authorization"),
    ("5.1", "Configure cron"),
    ("5.2", "SSH Server Configuration"),
    ("5.4", "User Accounts and Environment"),
    ("6", "System Maintenance"),
    ("6.1", "System File Permissions"),
    ("6.2", "User and Group Settings"),
];

pub const ENTRIES: &[Entry] = &[
    // 1 Initial Setup
    entry("1.1.1.1", 1, true, "Ensure mounting of cramfs filesystems is disabled", module("cramfs")),
    entry("1.1.1.2", 1, true, "Ensure mounting of freevxfs filesystems is disabled", module("freevxfs")),
    entry("1.1.1.3", 1, true, "Ensure mounting of jffs2 filesystems is disabled", module("jffs2")),
    entry("1.1.1.4", 1, true, "Ensure mounting of hfs filesystems is disabled", module("hfs")),
    entry("1.1.1.5", 1, true, "Ensure mounting of hfsplus filesystems is disabled", module("hfsplus")),
    entry("1.1.1.6", 2, true, "Ensure mounting of squashfs filesystems is disabled", module("squashfs")),
    entry("1.1.1.7", 1, true, "Ensure mounting of udf filesystems is disabled", module("udf")),
    entry("1.1.2", 1, false, "Ensure /tmp is configured", Rule::FileMatches {
        paths: &["/proc/mounts"],
        pattern: r"^\S+\s+/tmp\s",
    }),
    entry("1.1.23", 1, true, "Disable USB Storage", module("usb-storage")),
    entry("1.3.1", 1, true, "Ensure AIDE is installed", Rule::PackageInstalled { any_of: &["aide"] }),
    entry("1.4.1", 1, true, "Ensure permissions on bootloader config are configured", perms("/boot/grub/grub.cfg", 0o400)),
    entry("1.5.1", 1, true, "Ensure core dumps are restricted", Rule::SysctlEquals {
        settings: &[("fs.suid_dumpable", "0")],
    }),
    entry("1.5.2", 1, false, "Ensure XD/NX support is enabled", Rule::Manual {
        reason: "inspect kernel boot log for NX protection",
    }),
    entry("1.5.3", 1, true, "Ensure address space layout randomization (ASLR) is enabled", Rule::SysctlEquals {
        settings: &[("kernel.randomize_va_space", "2")],
    }),
    entry("1.5.4", 1, true, "Ensure prelink is disabled", absent(&["prelink"])),
    entry("1.7.1.1", 1, true, "Ensure message of the day is configured properly", Rule::FileLacks {
        path: "/etc/motd",
        pattern: r"\\[mrsv]",
    }),
    entry("1.7.1.4", 1, true, "Ensure permissions on /etc/motd are configured", perms("/etc/motd", 0o644)),
    // 2 Services
    entry("2.1.1", 1, true, "Ensure xinetd is not installed", absent(&["xinetd"])),
    entry("2.2.1.1", 1, false, "Ensure time synchronization is in use", Rule::PackageInstalled {
        any_of: &["chrony", "ntp", "systemd-timesyncd"],
    }),
    entry("2.2.2", 1, true, "Ensure X Window System is not installed", absent(&["xserver-xorg", "xorg-x11-server-Xorg"])),
    entry("2.2.3", 1, true, "Ensure Avahi Server is not enabled", disabled("avahi-daemon", "avahi-daemon")),
    entry("2.2.4", 1, true, "Ensure CUPS is not enabled", disabled("cups", "cups")),
    entry("2.2.5", 1, true, "Ensure DHCP Server is not enabled", disabled("isc-dhcp-server", "isc-dhcp-server")),
    entry("2.2.6", 1, true, "Ensure LDAP server is not enabled", disabled("slapd", "slapd")),
    entry("2.2.7", 1, true, "Ensure NFS is not enabled", disabled("nfs-server", "nfs-kernel-server")),
    entry("2.2.9", 1, true, "Ensure FTP Server is not enabled", disabled("vsftpd", "vsftpd")),
    entry("2.2.10", 1, true, "Ensure HTTP server is not enabled", disabled("apache2", "apache2")),
    entry("2.2.14", 1, true, "Ensure SNMP Server is not enabled", disabled("snmpd", "snmpd")),
    entry("2.2.15", 1, true, "Ensure mail transfer agent is configured for local-only mode", Rule::FileMatches {
        paths: &["/etc/postfix/main.cf"],
        pattern: r"^\s*inet_interfaces\s*=\s*(loopback-only|localhost)\s*$",
    }),
    entry("2.2.16", 1, true, "Ensure rsync service is not enabled", disabled("rsync", "rsync")),
    entry("2.3.1", 1, true, "Ensure NIS Client is not installed", absent(&["nis", "ypbind"])),
    entry("2.3.2", 1, true, "Ensure rsh client is not installed", absent(&["rsh-client", "rsh"])),
    entry("2.3.3", 1, true, "Ensure talk client is not installed", absent(&["talk"])),
    entry("2.3.4", 1, true, "Ensure telnet client is not installed", absent(&["telnet"])),
    entry("2.3.5", 1, true, "Ensure LDAP client is not installed", absent(&["ldap-utils", "openldap-clients"])),
    // 3 Network Configuration
    entry("3.1.1", 1, true, "Ensure IP forwarding is disabled", Rule::SysctlEquals {
        settings: &[("net.ipv4.ip_forward", "0")],
    }),
    entry("3.1.2", 1, true, "Ensure packet redirect sending is disabled", Rule::SysctlEquals {
        settings: &[
            ("net.ipv4.conf.all.send_redirects", "0"),
            ("net.ipv4.conf.default.send_redirects", "0"),
        ],
    }),
    entry("3.2.1", 1, true, "Ensure source routed packets are not accepted", Rule::SysctlEquals {
        settings: &[
            ("net.ipv4.conf.all.accept_source_route", "0"),
            ("net.ipv4.conf.default.accept_source_route", "0"),
        ],
    }),
    entry("3.2.2", 1, true, "Ensure ICMP redirects are not accepted", Rule::SysctlEquals {
        settings: &[
            ("net.ipv4.conf.all.accept_redirects", "0"),
            ("net.ipv4.conf.default.accept_redirects", "0"),
        ],
    }),
    entry("3.2.4", 1, true, "Ensure suspicious packets are logged", Rule::SysctlEquals {
        settings: &[
            ("net.ipv4.conf.all.log_martians", "1"),
            ("net.ipv4.conf.default.log_martians", "1"),
        ],
    }),
    entry("3.2.5", 1, true, "Ensure broadcast ICMP requests are ignored", Rule::SysctlEquals {
        settings: &[("net.ipv4.icmp_echo_ignore_broadcasts", "1")],
    }),
    entry("3.2.7", 1, true, "Ensure Reverse Path Filtering is enabled", Rule::SysctlEquals {
        settings: &[
            ("net.ipv4.conf.all.rp_filter", "1"),
            ("net.ipv4.conf.default.rp_filter", "1"),
        ],
    }),
    entry("3.2.8", 1, true, "Ensure TCP SYN Cookies is enabled", Rule::SysctlEquals {
        settings: &[("net.ipv4.tcp_syncookies", "1")],
    }),
    entry("3.4.1", 2, true, "Ensure DCCP is disabled", module("dccp")),
    entry("3.4.2", 2, true, "Ensure SCTP is disabled", module("sctp")),
    entry("3.4.3", 2, true, "Ensure RDS is disabled", module("rds")),
    entry("3.4.4", 2, true, "Ensure TIPC is disabled", module("tipc")),
    // 4 Logging and Auditing
    entry("4.1.1.1", 2, true, "Ensure auditd is installed", Rule::PackageInstalled {
        any_of: &["auditd", "audit"],
    }),
    entry("4.1.1.2", 2, true, "Ensure auditd service is enabled", Rule::ServiceEnabled {
        unit: "auditd",
        package: "auditd",
    }),
    entry("4.1.2.1", 2, false, "Ensure audit log storage size is configured", Rule::NumericSetting {
        path: "/etc/audit/auditd.conf",
        pattern: r"^\s*max_log_file\s*=\s*(\S+)",
        bound: Bound::AtLeast(1),
    }),
    entry("4.2.1.1", 1, true, "Ensure rsyslog is installed", Rule::PackageInstalled { any_of: &["rsyslog"] }),
    entry("4.2.1.2", 1, true, "Ensure rsyslog Service is enabled", Rule::ServiceEnabled {
        unit: "rsyslog",
        package: "rsyslog",
    }),
    entry("4.2.1.3", 1, true, "Ensure rsyslog default file permissions configured", Rule::FileMatches {
        paths: &["/etc/rsyslog.conf", "/etc/rsyslog.d/50-default.conf"],
        pattern: r"^\s*\$FileCreateMode\s+0[0-6][04]0\b",
    }),
    entry("4.2.4", 1, true, "Ensure permissions on all logfiles are configured", Rule::Manual {
        reason: "walks /var/log; review with find /var/log -type f -perm /g+wx,o+rwx",
    }),
    // 5 Access, Authentication and Authorization
    entry("5.1.1", 1, true, "Ensure cron daemon is enabled", Rule::ServiceEnabled {
        unit: "cron",
        package: "cron",
    }),
    entry("5.1.2", 1, true, "Ensure permissions on /etc/crontab are configured", perms("/etc/crontab", 0o600)),
    entry("5.1.3", 1, true, "Ensure permissions on /etc/cron.hourly are configured", perms("/etc/cron.hourly", 0o700)),
    entry("5.1.4", 1, true, "Ensure permissions on /etc/cron.daily are configured", perms("/etc/cron.daily", 0o700)),
    entry("5.1.5", 1, true, "Ensure permissions on /etc/cron.weekly are configured", perms("/etc/cron.weekly", 0o700)),
    entry("5.1.6", 1, true, "Ensure permissions on /etc/cron.monthly are configured", perms("/etc/cron.monthly", 0o700)),
    entry("5.1.7", 1, true, "Ensure permissions on /etc/cron.d are configured", perms("/etc/cron.d", 0o700)),
    entry("5.2.1", 1, true, "Ensure permissions on /etc/ssh/sshd_config are configured", perms(SSHD_CONFIG, 0o600)),
    entry("5.2.5", 1, true, "Ensure SSH LogLevel is appropriate", sshd(r"^\s*LogLevel\s+(INFO|VERBOSE)\s*$")),
    entry("5.2.6", 2, true, "Ensure SSH X11 forwarding is disabled", sshd(r"^\s*X11Forwarding\s+no\s*$")),
    entry("5.2.7", 1, true, "Ensure SSH MaxAuthTries is set to 4 or less", Rule::NumericSetting {
        path: SSHD_CONFIG,
        pattern: r"^\s*MaxAuthTries\s+(\S+)",
        bound: Bound::AtMost(4),
    }),
    entry("5.2.8", 1, true, "Ensure SSH IgnoreRhosts is enabled", sshd(r"^\s*IgnoreRhosts\s+yes\s*$")),
    entry("5.2.9", 1, true, "Ensure SSH HostbasedAuthentication is disabled", sshd(r"^\s*HostbasedAuthentication\s+no\s*$")),
    entry("5.2.10", 1, true, "Ensure SSH root login is disabled", sshd(r"^\s*PermitRootLogin\s+no\s*$")),
    entry("5.2.11", 1, true, "Ensure SSH PermitEmptyPasswords is disabled", sshd(r"^\s*PermitEmptyPasswords\s+no\s*$")),
    entry("5.2.14", 1, true, "Ensure SSH LoginGraceTime is set to one minute or less", Rule::NumericSetting {
        path: SSHD_CONFIG,
        pattern: r"^\s*LoginGraceTime\s+(\d+)\s*$",
        bound: Bound::AtMost(60),
    }),
    entry("5.4.1.1", 1, true, "Ensure password expiration is 365 days or less", Rule::NumericSetting {
        path: LOGIN_DEFS,
        pattern: r"^\s*PASS_MAX_DAYS\s+(\S+)",
        bound: Bound::AtMost(365),
    }),
    entry("5.4.1.2", 1, true, "Ensure minimum days between password changes is configured", Rule::NumericSetting {
        path: LOGIN_DEFS,
        pattern: r"^\s*PASS_MIN_DAYS\s+(\S+)",
        bound: Bound::AtLeast(1),
    }),
    entry("5.4.1.3", 1, true, "Ensure password expiration warning days is 7 or more", Rule::NumericSetting {
        path: LOGIN_DEFS,
        pattern: r"^\s*PASS_WARN_AGE\s+(\S+)",
        bound: Bound::AtLeast(7),
    }),
    // 6 System Maintenance
    entry("6.1.1", 2, false, "Audit system file permissions", Rule::Manual {
        reason: "compare package manager verification output by hand",
    }),
    entry("6.1.2", 1, true, "Ensure permissions on /etc/passwd are configured", perms("/etc/passwd", 0o644)),
    entry("6.1.3", 1, true, "Ensure permissions on /etc/shadow are configured", Rule::FilePermissions {
        path: "/etc/shadow",
        max_mode: 0o640,
        uid: 0,
        gids: SHADOW_GIDS,
    }),
    entry("6.1.4", 1, true, "Ensure permissions on /etc/group are configured", perms("/etc/group", 0o644)),
    entry("6.1.5", 1, true, "Ensure permissions on /etc/gshadow are configured", Rule::FilePermissions {
        path: "/etc/gshadow",
        max_mode: 0o640,
        uid: 0,
        gids: SHADOW_GIDS,
    }),
    entry("6.2.1", 1, true, "Ensure password fields are not empty", Rule::NoEmptyPasswords),
    entry("6.2.2", 1, true, "Ensure no legacy \"+\" entries exist in /etc/passwd", Rule::FileLacks {
        path: "/etc/passwd",
        pattern: r"^\+:",
    }),
    entry("6.2.3", 1, true, "Ensure no legacy \"+\" entries exist in /etc/shadow", Rule::FileLacks {
        path: "/etc/shadow",
        pattern: r"^\+:",
    }),
    entry("6.2.4", 1, true, "Ensure no legacy \"+\" entries exist in /etc/group", Rule::FileLacks {
        path: "/etc/group",
        pattern: r"^\+:",
    }),
    entry("6.2.5", 1, true, "Ensure root is the only UID 0 account", Rule::SoleRootUid),
];

/// Build the benchmark with every check bound to `host`.
pub fn cis_benchmark(host: Arc<dyn Host>) -> Result<Benchmark> {
    let mut benchmark = Benchmark::new(BENCHMARK_NAME);
    for (id, title) in SECTIONS {
        benchmark.add_section(CheckId::parse(id)?, *title);
    }
    for entry in ENTRIES {
        let scoring_class = if entry.scored {
            ScoringClass::Scored
        } else {
            ScoringClass::NotScored
        };
        let spec = CheckSpec::new(CheckId::parse(entry.id)?, entry.level, scoring_class, entry.title);
        benchmark.register(Arc::new(CatalogCheck::new(spec, entry.rule, Arc::clone(&host))))?;
    }
    Ok(benchmark)
}
