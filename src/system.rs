//! System capability - package installs, service control, commands.
//!
//! The [`SystemProvider`] trait is the seam between resources and the host
//! platform; the real implementation shells out to the platform's package
//! manager and systemctl, tests substitute a recording mock.

use crate::config::PlatformFamily;
use anyhow::{Context, Result, bail};
use std::fmt;
use std::process::{Command, Stdio};

/// Capability contract for host-level operations
pub trait SystemProvider: Send + Sync + fmt::Debug {
    /// Check whether a package is installed
    fn package_installed(&self, package: &str) -> Result<bool>;

    /// Install a package
    fn install_package(&self, package: &str) -> Result<()>;

    /// Check whether a service is enabled
    fn service_enabled(&self, service: &str) -> Result<bool>;

    /// Enable a service at boot
    fn enable_service(&self, service: &str) -> Result<()>;

    /// Restart a service
    fn restart_service(&self, service: &str) -> Result<()>;

    /// Run an arbitrary command, failing on non-zero exit
    fn run(&self, cmd: &str, args: &[&str]) -> Result<()>;
}

/// Real implementation shelling out to the host's tooling
#[derive(Debug, Clone, Copy)]
pub struct ShellSystem {
    platform: PlatformFamily,
}

impl ShellSystem {
    pub fn new(platform: PlatformFamily) -> Self {
        Self { platform }
    }
}

impl SystemProvider for ShellSystem {
    fn package_installed(&self, package: &str) -> Result<bool> {
        match self.platform {
            PlatformFamily::Debian => Ok(run_quiet(
                "dpkg-query",
                &["-W", "-f", "${Status}", package],
            )),
            PlatformFamily::Suse => Ok(run_quiet("rpm", &["-q", package])),
        }
    }

    fn install_package(&self, package: &str) -> Result<()> {
        log::info!("installing package {package}");
        match self.platform {
            PlatformFamily::Debian => run_checked("apt-get", &["install", "-y", package]),
            PlatformFamily::Suse => {
                run_checked("zypper", &["--non-interactive", "install", package])
            }
        }
    }

    fn service_enabled(&self, service: &str) -> Result<bool> {
        Ok(run_quiet("systemctl", &["is-enabled", "--quiet", service]))
    }

    fn enable_service(&self, service: &str) -> Result<()> {
        log::info!("enabling service {service}");
        run_checked("systemctl", &["enable", service])
    }

    fn restart_service(&self, service: &str) -> Result<()> {
        log::info!("restarting service {service}");
        run_checked("systemctl", &["restart", service])
    }

    fn run(&self, cmd: &str, args: &[&str]) -> Result<()> {
        run_checked(cmd, args)
    }
}

/// Run a command and fail with its stderr on non-zero exit
fn run_checked(cmd: &str, args: &[&str]) -> Result<()> {
    let output = Command::new(cmd)
        .args(args)
        .output()
        .with_context(|| format!("Failed to execute: {} {}", cmd, args.join(" ")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("{cmd} failed: {}", stderr.trim());
    }
    Ok(())
}

/// Run a command silently, returning success/failure
fn run_quiet(cmd: &str, args: &[&str]) -> bool {
    Command::new(cmd)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Run a command and capture stdout, failing with stderr on non-zero exit
pub fn run_capture(cmd: &str, args: &[&str], envs: &[(&str, &str)]) -> Result<String> {
    let mut command = Command::new(cmd);
    command.args(args);
    for (key, value) in envs {
        command.env(key, value);
    }
    let output = command
        .output()
        .with_context(|| format!("Failed to execute: {} {}", cmd, args.join(" ")))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("{cmd} failed: {}", stderr.trim())
    }
}
