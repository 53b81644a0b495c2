//! Error types for reconciliation runs.

use crate::types::CommandKind;
use thiserror::Error;

/// Errors that abort a reconciliation run.
///
/// Every variant is fatal for the invocation. Operations already applied
/// before a [`Error::CommandExecution`] stay applied.
#[derive(Debug, Error)]
pub enum Error {
    /// Conflicting or missing parameters, detected before contacting the backend
    #[error("{0}")]
    Validation(String),

    /// No usable credentials could be obtained
    #[error("{0}")]
    Authentication(#[from] krbsession::Error),

    /// The backend returned more than one entry for a name
    #[error("There is more than one group '{name}'")]
    AmbiguousEntity {
        /// Name that matched several entries
        name: String,
    },

    /// A member-level action named a group that does not exist
    #[error("No group '{name}'")]
    TargetNotFound {
        /// Missing group
        name: String,
    },

    /// The backend rejected a planned operation
    #[error("{}: {target}: {detail}", .kind.command_name())]
    CommandExecution {
        /// Group the operation targeted
        target: String,
        /// Operation kind
        kind: CommandKind,
        /// Backend error detail
        detail: String,
    },

    /// Querying or connecting to the backend failed
    #[error("{0}")]
    Backend(#[from] ipakit::Error),
}

/// Result type for reconciliation.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_execution_message() {
        let err = Error::CommandExecution {
            target: "ops".into(),
            kind: CommandKind::AddMember,
            detail: "insufficient access".into(),
        };
        assert_eq!(err.to_string(), "group_add_member: ops: insufficient access");
    }

    #[test]
    fn test_authentication_message() {
        let err = Error::from(krbsession::Error::PasswordNotSet);
        assert_eq!(err.to_string(), "The password is not set");
    }
}
