//! Error types for credential sessions.

use thiserror::Error;

/// Errors that can occur while acquiring a credential session.
#[derive(Debug, Error)]
pub enum Error {
    /// No reusable session exists and no password was supplied
    #[error("The password is not set")]
    PasswordNotSet,

    /// The KDC rejected the principal or its secret
    #[error("Kerberos authentication failed: {message}")]
    Authentication {
        /// Principal that failed to authenticate
        principal: String,
        /// Message reported by kinit
        message: String,
    },

    /// A Kerberos tool could not be run
    #[error("failed to run {tool}: {message}")]
    Tool {
        /// Tool name (`kinit`, `kdestroy`, `klist`)
        tool: &'static str,
        /// What went wrong
        message: String,
    },

    /// The private credential store could not be created
    #[error("failed to create credential store: {0}")]
    Store(#[from] std::io::Error),
}

/// Result type for credential session operations.
pub type Result<T> = std::result::Result<T, Error>;
