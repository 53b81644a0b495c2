//! # krbsession
//!
//! Scoped Kerberos credential sessions.
//!
//! A run that talks to a Kerberos-protected service needs a ticket. If the
//! caller already has one, it is reused and left alone. If not, a private
//! credential cache is created in a fresh temporary directory, filled from a
//! keytab or password, and destroyed when the session is released or dropped.
//!
//! ## Example
//!
//! ```no_run
//! use krbsession::SessionManager;
//!
//! let manager = SessionManager::new();
//! let session = manager.acquire("admin", Some("Secret123")).expect("kinit failed");
//!
//! // hand session.ccache() to the client as KRB5CCNAME
//! println!("using {:?}", session.ccache());
//!
//! session.release();
//! ```
//!
//! ## Provider Traits
//!
//! - [`KerberosTools`]: runs `kinit`/`klist`/`kdestroy`
//! - [`AmbientLookup`]: reports credential material already around the run

#![warn(missing_docs)]

pub mod error;
pub mod lookup;
pub mod session;
pub mod tools;

pub use error::{Error, Result};
pub use lookup::{AmbientLookup, EnvLookup, StaticLookup};
pub use session::{CredentialSession, DEFAULT_PRINCIPAL, SessionManager};
pub use tools::{KerberosTools, KrbCommands};
