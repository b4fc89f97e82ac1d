//! Higher-level queries built on [`Host`]: kernel parameters, kernel
//! modules, packages and services.

use super::{Host, ProbeError};

const PROC_SYS_DIR: &str = "/proc/sys";
const PROC_MODULES_FILE: &str = "/proc/modules";
const MODPROBE_CMD: &str = "modprobe";
const SYSTEMCTL_CMD: &str = "systemctl";
const DPKG_QUERY_CMD: &str = "dpkg-query";
const RPM_CMD: &str = "rpm";

const DPKG_QUERY_PATHS: &[&str] = &["/usr/bin/dpkg-query", "/bin/dpkg-query"];
const RPM_PATHS: &[&str] = &["/usr/bin/rpm", "/bin/rpm"];

/// Current value of a kernel parameter (`net.ipv4.ip_forward`), read from
/// `/proc/sys`. `None` when the kernel does not expose it.
pub async fn sysctl(host: &dyn Host, key: &str) -> Result<Option<String>, ProbeError> {
    let path = format!("{PROC_SYS_DIR}/{}", key.replace('.', "/"));
    Ok(host
        .read_file(&path)
        .await?
        .map(|value| value.split_whitespace().collect::<Vec<_>>().join(" ")))
}

/// Load and install state of a kernel module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleState {
    pub loaded: bool,
    /// `modprobe` would not load it (`install /bin/true`) or it does not exist.
    pub install_disabled: bool,
}

pub async fn kernel_module(host: &dyn Host, module: &str) -> Result<ModuleState, ProbeError> {
    let loaded = match host.read_file(PROC_MODULES_FILE).await? {
        Some(modules) => modules
            .lines()
            .any(|line| line.split_whitespace().next() == Some(module)),
        None => false,
    };

    let dry_run = host.run(MODPROBE_CMD, &["-n", "-v", module]).await?;
    let install_disabled = dry_run.stdout.lines().any(|line| {
        let line = line.trim();
        line.starts_with("install /bin/true") || line.starts_with("install /bin/false")
    }) || (!dry_run.success() && dry_run.stderr.contains("not found"));

    Ok(ModuleState {
        loaded,
        install_disabled,
    })
}

/// Package database present on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Dpkg,
    Rpm,
}

pub async fn package_manager(host: &dyn Host) -> Result<PackageManager, ProbeError> {
    for path in DPKG_QUERY_PATHS {
        if host.stat(path).await?.is_some() {
            return Ok(PackageManager::Dpkg);
        }
    }
    for path in RPM_PATHS {
        if host.stat(path).await?.is_some() {
            return Ok(PackageManager::Rpm);
        }
    }
    Err(ProbeError::NoPackageManager)
}

pub async fn package_installed(host: &dyn Host, package: &str) -> Result<bool, ProbeError> {
    match package_manager(host).await? {
        PackageManager::Dpkg => {
            let out = host
                .run(DPKG_QUERY_CMD, &["-W", "-f=${Status}", package])
                .await?;
            Ok(out.success() && out.stdout.contains("install ok installed"))
        }
        PackageManager::Rpm => Ok(host.run(RPM_CMD, &["-q", package]).await?.success()),
    }
}

/// First of `packages` that is installed, if any.
pub async fn any_package_installed<'a>(
    host: &dyn Host,
    packages: &[&'a str],
) -> Result<Option<&'a str>, ProbeError> {
    for &package in packages {
        if package_installed(host, package).await? {
            return Ok(Some(package));
        }
    }
    Ok(None)
}

/// Whether systemd reports `unit` as enabled.
pub async fn service_enabled(host: &dyn Host, unit: &str) -> Result<bool, ProbeError> {
    let out = host.run(SYSTEMCTL_CMD, &["is-enabled", unit]).await?;
    Ok(out.stdout.trim() == "enabled")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::fakes::FakeHost;

    #[tokio::test]
    async fn test_sysctl_reads_proc_sys() {
        let host = FakeHost::new().with_file("/proc/sys/net/ipv4/ip_forward", "0\n");
        assert_eq!(
            sysctl(&host, "net.ipv4.ip_forward").await.unwrap().as_deref(),
            Some("0")
        );
        assert!(sysctl(&host, "net.ipv6.conf.all.forwarding")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_kernel_module_states() {
        let host = FakeHost::new()
            .with_file("/proc/modules", "udf 94208 0 - Live 0x0\ncrc_itu_t 16384 1 udf, Live 0x0\n")
            .with_command("modprobe", &["-n", "-v", "udf"], 0, "insmod /lib/modules/udf.ko\n")
            .with_command("modprobe", &["-n", "-v", "cramfs"], 0, "install /bin/true \n")
            .with_command_stderr(
                "modprobe",
                &["-n", "-v", "hfs"],
                1,
                "modprobe: FATAL: Module hfs not found in directory /lib/modules\n",
            );

        let udf = kernel_module(&host, "udf").await.unwrap();
        assert!(udf.loaded && !udf.install_disabled);

        let cramfs = kernel_module(&host, "cramfs").await.unwrap();
        assert!(!cramfs.loaded && cramfs.install_disabled);

        let hfs = kernel_module(&host, "hfs").await.unwrap();
        assert!(hfs.install_disabled);
    }

    #[tokio::test]
    async fn test_package_queries_dpkg() {
        let host = FakeHost::new()
            .with_stat("/usr/bin/dpkg-query", 0o755, 0, 0)
            .with_command("dpkg-query", &["-W", "-f=${Status}", "aide"], 0, "install ok installed")
            .with_command("dpkg-query", &["-W", "-f=${Status}", "telnet"], 1, "");

        assert!(package_installed(&host, "aide").await.unwrap());
        assert!(!package_installed(&host, "telnet").await.unwrap());
        assert_eq!(
            any_package_installed(&host, &["telnet", "aide"]).await.unwrap(),
            Some("aide")
        );
    }

    #[tokio::test]
    async fn test_package_queries_rpm() {
        let host = FakeHost::new()
            .with_stat("/usr/bin/rpm", 0o755, 0, 0)
            .with_command("rpm", &["-q", "chrony"], 0, "chrony-4.2-1.el9.x86_64\n")
            .with_command("rpm", &["-q", "ntp"], 1, "package ntp is not installed\n");
        assert_eq!(package_manager(&host).await.unwrap(), PackageManager::Rpm);
        assert_eq!(
            any_package_installed(&host, &["ntp", "chrony"]).await.unwrap(),
            Some("chrony")
        );
    }

    #[tokio::test]
    async fn test_no_package_manager() {
        let err = package_installed(&FakeHost::new(), "aide").await.unwrap_err();
        assert!(matches!(err, ProbeError::NoPackageManager));
    }

    #[tokio::test]
    async fn test_service_enabled() {
        let host = FakeHost::new()
            .with_command("systemctl", &["is-enabled", "rsyslog"], 0, "enabled\n")
            .with_command("systemctl", &["is-enabled", "avahi-daemon"], 1, "disabled\n");
        assert!(service_enabled(&host, "rsyslog").await.unwrap());
        assert!(!service_enabled(&host, "avahi-daemon").await.unwrap());
    }
}
