//! Scoped credential sessions.
//!
//! A session is either borrowed from the environment or created privately:
//! 1. An existing valid ticket (caller's `KRB5CCNAME`, or a default cache
//!    already holding the principal) is reused and never destroyed.
//! 2. Otherwise a fresh store is made (temporary directory + one ccache file),
//!    authenticated from a keytab or a password, and torn down on release.
//!
//! Teardown runs exactly once, from [`CredentialSession::release`] or from
//! `Drop`, whichever comes first.

use crate::error::{Error, Result};
use crate::lookup::{AmbientLookup, ENV_CCACHE, EnvLookup};
use crate::tools::{KerberosTools, KrbCommands};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Principal used when none is given.
pub const DEFAULT_PRINCIPAL: &str = "admin";

/// Acquires credential sessions.
pub struct SessionManager {
    tools: Arc<dyn KerberosTools>,
    lookup: Box<dyn AmbientLookup>,
}

impl SessionManager {
    /// Manager using the system Kerberos tools and the process environment.
    pub fn new() -> Self {
        Self::with_parts(Arc::new(KrbCommands::default()), EnvLookup)
    }

    /// Manager with explicit tools and ambient lookup.
    pub fn with_parts(tools: Arc<dyn KerberosTools>, lookup: impl AmbientLookup + 'static) -> Self {
        Self {
            tools,
            lookup: Box::new(lookup),
        }
    }

    /// Acquire a session for `principal`.
    ///
    /// Reuses an existing valid session when one is found; otherwise creates
    /// a private one from the client keytab or `password`.
    pub fn acquire(&self, principal: &str, password: Option<&str>) -> Result<CredentialSession> {
        let principal = if principal.is_empty() {
            DEFAULT_PRINCIPAL
        } else {
            principal
        };

        if let Some(ccache) = self.lookup.ccache() {
            if self.tools.is_valid(Some(&ccache)) {
                log::debug!("{ENV_CCACHE} set to {ccache}, reusing it");
                return Ok(self.borrowed(Some(ccache)));
            }
            log::debug!("{ENV_CCACHE} set to {ccache} but it holds no valid ticket");
        }

        if let Some(keytab) = self.lookup.keytab() {
            log::debug!("Authenticating {principal} from keytab {}", keytab.display());
            return self.create(principal, |tools, ccache| {
                tools.kinit_keytab(principal, &keytab, ccache)
            });
        }

        if self.tools.is_valid(None)
            && self
                .tools
                .default_principal(None)
                .is_some_and(|p| principal_matches(&p, principal))
        {
            log::debug!("Default credential cache holds {principal}, reusing it");
            return Ok(self.borrowed(None));
        }

        let password = password
            .filter(|p| !p.is_empty())
            .ok_or(Error::PasswordNotSet)?;
        self.create(principal, |tools, ccache| {
            tools.kinit_password(principal, password, ccache)
        })
    }

    fn borrowed(&self, ccache: Option<String>) -> CredentialSession {
        CredentialSession {
            ccache,
            store: None,
            owned: false,
            released: false,
            tools: Arc::clone(&self.tools),
        }
    }

    fn create(
        &self,
        principal: &str,
        kinit: impl FnOnce(&dyn KerberosTools, &str) -> Result<()>,
    ) -> Result<CredentialSession> {
        let store = tempfile::Builder::new().prefix("krbcc").tempdir()?;
        let ccache = format!("FILE:{}", store.path().join("ccache").display());

        // the store is removed on drop if kinit fails
        kinit(self.tools.as_ref(), &ccache)?;
        log::info!("Obtained ticket for {principal} in {ccache}");

        Ok(CredentialSession {
            ccache: Some(ccache),
            store: Some(store),
            owned: true,
            released: false,
            tools: Arc::clone(&self.tools),
        })
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

fn principal_matches(cached: &str, principal: &str) -> bool {
    cached == principal || cached.starts_with(&format!("{principal}@"))
}

/// An authenticated context for backend commands.
pub struct CredentialSession {
    /// Cache name to hand to clients; `None` is the caller's default cache
    ccache: Option<String>,
    store: Option<TempDir>,
    owned: bool,
    released: bool,
    tools: Arc<dyn KerberosTools>,
}

impl CredentialSession {
    /// Credential cache name, or `None` for the default cache.
    pub fn ccache(&self) -> Option<&str> {
        self.ccache.as_deref()
    }

    /// Whether this session was created by us (and will be destroyed).
    pub fn is_owned(&self) -> bool {
        self.owned
    }

    /// Directory of the private store, for owned sessions.
    pub fn store_path(&self) -> Option<&Path> {
        self.store.as_ref().map(TempDir::path)
    }

    /// Release the session now.
    pub fn release(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if !self.owned {
            return;
        }

        if let Some(ccache) = &self.ccache
            && let Err(e) = self.tools.kdestroy(ccache)
        {
            log::warn!("Failed to destroy ticket in {ccache}: {e}");
        }

        if let Some(store) = self.store.take() {
            let path = store.path().to_path_buf();
            if let Err(e) = store.close() {
                log::warn!("Failed to remove credential store {}: {e}", path.display());
            }
        }
    }
}

impl Drop for CredentialSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for CredentialSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSession")
            .field("ccache", &self.ccache)
            .field("store", &self.store_path())
            .field("owned", &self.owned)
            .field("released", &self.released)
            .finish()
    }
}
