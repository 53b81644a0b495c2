//! Core types for group reconciliation

use ipakit::AttributeMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// State to ensure for the named groups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    /// Group (or its members) must exist
    #[default]
    Present,
    /// Group (or the listed members) must not exist
    Absent,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Present => write!(f, "present"),
            State::Absent => write!(f, "absent"),
        }
    }
}

/// Level the request works on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// The group itself: attributes and full membership
    #[default]
    Group,
    /// Only the listed members, relative to what is there
    Member,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Group => write!(f, "group"),
            Action::Member => write!(f, "member"),
        }
    }
}

/// Kind of backend command an operation runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Create,
    Modify,
    Delete,
    AddMember,
    RemoveMember,
}

impl CommandKind {
    /// Backend command name
    pub fn command_name(&self) -> &'static str {
        match self {
            CommandKind::Create => "group_add",
            CommandKind::Modify => "group_mod",
            CommandKind::Delete => "group_del",
            CommandKind::AddMember => "group_add_member",
            CommandKind::RemoveMember => "group_remove_member",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command_name())
    }
}

/// A single planned backend command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Group the command runs against
    pub target: String,
    pub kind: CommandKind,
    pub args: AttributeMap,
}

impl Operation {
    pub fn new(target: impl Into<String>, kind: CommandKind, args: AttributeMap) -> Self {
        Self {
            target: target.into(),
            kind,
            args,
        }
    }
}

/// Options for execution
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Don't make changes, just report what would happen
    pub dry_run: bool,
}

/// Counts of applied operations by kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub created: usize,
    pub modified: usize,
    pub deleted: usize,
    pub member_additions: usize,
    pub member_removals: usize,
}

impl ExecuteSummary {
    /// Total number of operations counted
    pub fn total_changes(&self) -> usize {
        self.created + self.modified + self.deleted + self.member_additions + self.member_removals
    }

    /// Count one operation
    pub fn add(&mut self, kind: CommandKind) {
        match kind {
            CommandKind::Create => self.created += 1,
            CommandKind::Modify => self.modified += 1,
            CommandKind::Delete => self.deleted += 1,
            CommandKind::AddMember => self.member_additions += 1,
            CommandKind::RemoveMember => self.member_removals += 1,
        }
    }
}

/// Outcome of a reconciliation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    /// Whether the backend was (or, in a dry run, would be) changed
    pub changed: bool,
    pub dry_run: bool,
    /// Operations applied, or planned for a dry run
    pub operations: Vec<Operation>,
    pub summary: ExecuteSummary,
}

impl ReconciliationResult {
    /// Record an operation that took effect
    pub fn record(&mut self, operation: Operation) {
        self.summary.add(operation.kind);
        self.operations.push(operation);
        self.changed = true;
    }
}
