//! Error types for backend operations.
//!
//! Errors are categorized from the backend's own messages so callers can
//! tell a missing entry from a rejected ticket or an unreachable server.

use thiserror::Error;

/// Categories of backend errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The named entry does not exist
    NotFound,
    /// The entry already exists
    AlreadyExists,
    /// The backend found nothing to modify
    NoChange,
    /// Missing, expired or rejected Kerberos credentials
    Authentication,
    /// Server unreachable or connection dropped
    Network,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NotFound => "Entry not found",
            Self::AlreadyExists => "Entry already exists",
            Self::NoChange => "No modifications to be performed",
            Self::Authentication => "Authentication failed",
            Self::Network => "Server unreachable",
            Self::Other => "Unexpected error",
        }
    }
}

/// Errors that can occur while talking to the directory backend.
#[derive(Debug, Error)]
pub enum Error {
    /// The named entry does not exist
    #[error("{name}: not found")]
    NotFound {
        /// Name of the missing entry
        name: String,
    },

    /// The entry already exists
    #[error("{name}: already exists")]
    AlreadyExists {
        /// Name of the existing entry
        name: String,
    },

    /// The backend refused a modification that changes nothing
    #[error("no modifications to be performed")]
    NoChange,

    /// Credentials were missing, expired or rejected
    #[error("authentication failed: {message}")]
    Authentication {
        /// Message reported by the backend
        message: String,
    },

    /// The server could not be reached
    #[error("network error: {message}")]
    Network {
        /// Message reported by the transport
        message: String,
    },

    /// The `ipa` client is not installed
    #[error("ipa client not found. Install the freeipa-client package")]
    ClientNotFound,

    /// Command execution failed
    #[error("{command} failed: {stderr}")]
    CommandFailed {
        /// Backend command that failed
        command: String,
        /// Error output from the failed command
        stderr: String,
    },

    /// Query output could not be parsed
    #[error("unexpected output at line {line}: {message}")]
    Parse {
        /// Line number of the offending output (1-indexed)
        line: usize,
        /// What was wrong with it
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::AlreadyExists { .. } => ErrorCategory::AlreadyExists,
            Error::NoChange => ErrorCategory::NoChange,
            Error::Authentication { .. } => ErrorCategory::Authentication,
            Error::Network { .. } => ErrorCategory::Network,
            _ => ErrorCategory::Other,
        }
    }

    /// Create an error from `ipa` command output.
    ///
    /// The client prints `ipa: ERROR: <message>` on stderr; the message is
    /// matched against the wording the server uses for each category.
    pub fn from_ipa_output(command: &str, stderr: &str, name: &str) -> Self {
        let message = stderr
            .trim()
            .strip_prefix("ipa: ERROR:")
            .unwrap_or(stderr.trim())
            .trim();
        let lower = message.to_lowercase();

        if lower.contains("not found") {
            return Error::NotFound {
                name: name.to_string(),
            };
        }

        if lower.contains("already exists") {
            return Error::AlreadyExists {
                name: name.to_string(),
            };
        }

        if lower.contains("no modifications to be performed") {
            return Error::NoChange;
        }

        if lower.contains("kerberos")
            || lower.contains("credentials")
            || lower.contains("ticket expired")
            || lower.contains("unauthorized")
            || lower.contains("insufficient access")
        {
            return Error::Authentication {
                message: message.to_string(),
            };
        }

        if lower.contains("cannot connect")
            || lower.contains("connection refused")
            || lower.contains("timed out")
            || lower.contains("network")
            || lower.contains("name or service not known")
        {
            return Error::Network {
                message: message.to_string(),
            };
        }

        Error::CommandFailed {
            command: command.to_string(),
            stderr: message.to_string(),
        }
    }
}

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, Error>;
