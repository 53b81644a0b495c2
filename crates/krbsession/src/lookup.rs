//! Ambient credential lookup.
//!
//! Where an existing session might come from is injected rather than read
//! from the process environment directly, so callers and tests can decide
//! what "the environment" is.

use std::path::PathBuf;

/// Environment variable naming the caller's credential cache.
pub const ENV_CCACHE: &str = "KRB5CCNAME";

/// Environment variable naming a client keytab.
pub const ENV_CLIENT_KEYTAB: &str = "KRB5_CLIENT_KTNAME";

/// Source of credential material that already exists around the run.
pub trait AmbientLookup: Send + Sync {
    /// Credential cache the caller has pointed us at, if any.
    fn ccache(&self) -> Option<String>;

    /// Client keytab the caller has pointed us at, if any.
    fn keytab(&self) -> Option<PathBuf>;
}

/// Reads `KRB5CCNAME` and `KRB5_CLIENT_KTNAME` from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvLookup;

impl AmbientLookup for EnvLookup {
    fn ccache(&self) -> Option<String> {
        std::env::var(ENV_CCACHE).ok().filter(|v| !v.is_empty())
    }

    fn keytab(&self) -> Option<PathBuf> {
        std::env::var_os(ENV_CLIENT_KEYTAB)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }
}

/// Fixed lookup results.
#[derive(Debug, Clone, Default)]
pub struct StaticLookup {
    /// Credential cache to report
    pub ccache: Option<String>,
    /// Keytab to report
    pub keytab: Option<PathBuf>,
}

impl AmbientLookup for StaticLookup {
    fn ccache(&self) -> Option<String> {
        self.ccache.clone()
    }

    fn keytab(&self) -> Option<PathBuf> {
        self.keytab.clone()
    }
}
