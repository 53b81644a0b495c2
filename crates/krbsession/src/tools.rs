//! Kerberos client tools.
//!
//! [`KerberosTools`] is the seam between session management and the system's
//! Kerberos installation. [`KrbCommands`] runs the MIT client programs.

use crate::error::{Error, Result};
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};

/// Operations on credential caches.
pub trait KerberosTools: Send + Sync {
    /// Obtain a ticket for `principal` with a password into `ccache`.
    fn kinit_password(&self, principal: &str, password: &str, ccache: &str) -> Result<()>;

    /// Obtain a ticket for `principal` from a keytab into `ccache`.
    fn kinit_keytab(&self, principal: &str, keytab: &Path, ccache: &str) -> Result<()>;

    /// Destroy the tickets in `ccache`.
    fn kdestroy(&self, ccache: &str) -> Result<()>;

    /// Whether `ccache` (or the default cache for `None`) holds a
    /// non-expired ticket.
    fn is_valid(&self, ccache: Option<&str>) -> bool;

    /// Principal owning `ccache` (or the default cache for `None`).
    fn default_principal(&self, ccache: Option<&str>) -> Option<String>;
}

/// Runs `kinit`, `klist` and `kdestroy`.
#[derive(Debug, Clone)]
pub struct KrbCommands {
    kinit: String,
    klist: String,
    kdestroy: String,
}

impl Default for KrbCommands {
    fn default() -> Self {
        Self {
            kinit: "kinit".to_string(),
            klist: "klist".to_string(),
            kdestroy: "kdestroy".to_string(),
        }
    }
}

impl KrbCommands {
    fn klist(&self, ccache: Option<&str>, extra: &[&str]) -> Option<std::process::Output> {
        let mut cmd = Command::new(&self.klist);
        cmd.args(extra);
        if let Some(ccache) = ccache {
            cmd.args(["-c", ccache]);
        }
        cmd.output().ok()
    }
}

impl KerberosTools for KrbCommands {
    fn kinit_password(&self, principal: &str, password: &str, ccache: &str) -> Result<()> {
        let mut child = Command::new(&self.kinit)
            .args(["-c", ccache, principal])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Tool {
                tool: "kinit",
                message: e.to_string(),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            feed_password(&mut stdin, password).map_err(|e| Error::Tool {
                tool: "kinit",
                message: e.to_string(),
            })?;
        }

        let output = child.wait_with_output().map_err(|e| Error::Tool {
            tool: "kinit",
            message: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(Error::Authentication {
                principal: principal.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    fn kinit_keytab(&self, principal: &str, keytab: &Path, ccache: &str) -> Result<()> {
        let output = Command::new(&self.kinit)
            .args(["-c", ccache, "-k", "-t"])
            .arg(keytab)
            .arg(principal)
            .output()
            .map_err(|e| Error::Tool {
                tool: "kinit",
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(Error::Authentication {
                principal: principal.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    fn kdestroy(&self, ccache: &str) -> Result<()> {
        let status = Command::new(&self.kdestroy)
            .args(["-c", ccache])
            .status()
            .map_err(|e| Error::Tool {
                tool: "kdestroy",
                message: e.to_string(),
            })?;

        if !status.success() {
            return Err(Error::Tool {
                tool: "kdestroy",
                message: format!("exited with {status}"),
            });
        }
        Ok(())
    }

    fn is_valid(&self, ccache: Option<&str>) -> bool {
        self.klist(ccache, &["-s"])
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn default_principal(&self, ccache: Option<&str>) -> Option<String> {
        let output = self.klist(ccache, &[])?;
        if !output.status.success() {
            return None;
        }
        parse_default_principal(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Extract the principal from `klist` output.
fn parse_default_principal(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .find_map(|l| l.trim().strip_prefix("Default principal:"))
        .map(|p| p.trim().to_string())
}

/// Write the password line to kinit's stdin.
///
/// kinit exits without reading stdin when it rejects the principal up
/// front. The closed pipe is ignored so the exit status and stderr decide.
fn feed_password(stdin: &mut impl Write, password: &str) -> io::Result<()> {
    match stdin.write_all(format!("{password}\n").as_bytes()) {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            log::debug!("kinit closed stdin before reading the password");
            Ok(())
        }
        other => other,
    }
}
