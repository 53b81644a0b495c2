//! Reconciliation requests and their validation

use crate::diff::Relation;
use crate::error::{Error, Result};
use crate::types::{Action, State};
use ipakit::{AttributeMap, Value};
use serde::{Deserialize, Serialize};

/// Scalar attributes of a group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupAttributes {
    pub description: Option<String>,
    #[serde(alias = "gidnumber")]
    pub gid: Option<u32>,
    /// Create as a non-POSIX group
    pub nonposix: Option<bool>,
    /// Allow external members from trusted domains
    pub external: Option<bool>,
    /// Suppress membership processing when the group is created
    pub nomembers: Option<bool>,
}

impl GroupAttributes {
    /// Backend arguments for the attributes that are set
    pub fn to_args(&self) -> AttributeMap {
        let mut args = AttributeMap::new();
        if let Some(description) = &self.description {
            args.insert("description".to_string(), Value::from(description.as_str()));
        }
        if let Some(gid) = self.gid {
            args.insert("gidnumber".to_string(), Value::from(gid.to_string()));
        }
        if let Some(nonposix) = self.nonposix {
            args.insert("nonposix".to_string(), Value::Bool(nonposix));
        }
        if let Some(external) = self.external {
            args.insert("external".to_string(), Value::Bool(external));
        }
        if let Some(nomembers) = self.nomembers {
            args.insert("nomembers".to_string(), Value::Bool(nomembers));
        }
        args
    }

    /// Arguments compared against and sent to an existing group.
    ///
    /// `nomembers` only affects creation and is never stored on the entry.
    pub fn modify_args(&self) -> AttributeMap {
        let mut args = self.to_args();
        args.remove("nomembers");
        args
    }

    /// Parameter names that are set
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.description.is_some() {
            names.push("description");
        }
        if self.gid.is_some() {
            names.push("gid");
        }
        if self.nonposix.is_some() {
            names.push("nonposix");
        }
        if self.external.is_some() {
            names.push("external");
        }
        if self.nomembers.is_some() {
            names.push("nomembers");
        }
        names
    }

    pub fn is_empty(&self) -> bool {
        self.names().is_empty()
    }
}

/// Desired membership, per relation
///
/// `Some(vec![])` means "no members". When every relation is `None`,
/// membership is left alone; otherwise a `None` relation counts as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Members {
    pub user: Option<Vec<String>>,
    pub group: Option<Vec<String>>,
    pub service: Option<Vec<String>>,
}

impl Members {
    pub fn get(&self, relation: Relation) -> Option<&[String]> {
        match relation {
            Relation::User => self.user.as_deref(),
            Relation::Group => self.group.as_deref(),
            Relation::Service => self.service.as_deref(),
        }
    }

    /// Parameter names that are set
    pub fn names(&self) -> Vec<&'static str> {
        Relation::ALL
            .into_iter()
            .filter(|r| self.get(*r).is_some())
            .map(Relation::arg_name)
            .collect()
    }
}

fn default_principal() -> String {
    krbsession::DEFAULT_PRINCIPAL.to_string()
}

/// Everything a single reconciliation run needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationRequest {
    #[serde(default = "default_principal")]
    pub principal: String,
    /// Never read from or written to files
    #[serde(skip)]
    pub password: Option<String>,
    /// Groups to reconcile, in order
    #[serde(alias = "name", default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub state: State,
    #[serde(default)]
    pub action: Action,
    #[serde(flatten)]
    pub attributes: GroupAttributes,
    #[serde(flatten)]
    pub members: Members,
}

impl Default for ReconciliationRequest {
    fn default() -> Self {
        Self {
            principal: default_principal(),
            password: None,
            names: Vec::new(),
            state: State::default(),
            action: Action::default(),
            attributes: GroupAttributes::default(),
            members: Members::default(),
        }
    }
}

impl ReconciliationRequest {
    /// Check parameter combinations. Runs before any backend contact.
    pub fn validate(&self) -> Result<()> {
        if self.names.iter().any(|n| n.trim().is_empty()) {
            return Err(Error::Validation("Group name can not be empty.".into()));
        }

        match self.state {
            State::Present => {
                if self.names.len() != 1 {
                    return Err(Error::Validation(
                        "Only one group can be added at a time.".into(),
                    ));
                }
                if self.action == Action::Member
                    && let Some(arg) = self.attributes.names().first()
                {
                    return Err(Error::Validation(format!(
                        "Argument '{arg}' can not be used with action '{}'",
                        self.action
                    )));
                }
            }
            State::Absent => {
                if self.names.is_empty() {
                    return Err(Error::Validation("No name given.".into()));
                }
                let mut invalid = self.attributes.names();
                if self.action == Action::Group {
                    invalid.extend(self.members.names());
                }
                if let Some(arg) = invalid.first() {
                    return Err(Error::Validation(format!(
                        "Argument '{arg}' can not be used with state '{}'",
                        self.state
                    )));
                }
            }
        }

        Ok(())
    }
}
