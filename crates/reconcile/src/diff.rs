//! Diff computation for group attributes and memberships

use crate::request::Members;
use ipakit::{AttributeMap, Value};
use std::collections::BTreeSet;

/// Check whether every desired attribute already holds on the remote entry.
///
/// Queries report most attributes as sequences even when a single value is
/// set, so a bare desired value is compared against a one-element sequence
/// when the remote side is a sequence. The reverse is not done.
pub fn attributes_match(desired: &AttributeMap, remote: &AttributeMap) -> bool {
    desired.iter().all(|(key, value)| match remote.get(key) {
        None => false,
        Some(current) if current.is_sequence() && !value.is_sequence() => {
            value.clone().into_sequence() == *current
        }
        Some(current) => value == current,
    })
}

/// Membership relation of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    User,
    Group,
    Service,
}

impl Relation {
    pub const ALL: [Relation; 3] = [Relation::User, Relation::Group, Relation::Service];

    /// Argument name used by the member commands
    pub fn arg_name(self) -> &'static str {
        match self {
            Relation::User => "user",
            Relation::Group => "group",
            Relation::Service => "service",
        }
    }

    /// Attribute name reported by queries
    pub fn remote_attribute(self) -> &'static str {
        match self {
            Relation::User => "member_user",
            Relation::Group => "member_group",
            Relation::Service => "member_service",
        }
    }
}

/// How desired members relate to current ones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipMode {
    /// Converge to exactly the desired members
    Replace,
    /// Add missing desired members, remove nothing
    AddOnly,
    /// Remove desired members that are present, add nothing
    RemoveOnly,
}

/// Additions and removals for one relation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationDelta {
    pub add: BTreeSet<String>,
    pub remove: BTreeSet<String>,
}

/// Additions and removals for every relation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipDelta {
    pub user: RelationDelta,
    pub group: RelationDelta,
    pub service: RelationDelta,
}

impl MembershipDelta {
    /// Compute the delta between desired members and a remote entry.
    ///
    /// When no relation has a desired list, nothing changes. Otherwise a
    /// missing list counts as empty, so in replace mode the members of a
    /// relation that was left out are removed.
    pub fn compute(desired: &Members, remote: &AttributeMap, mode: MembershipMode) -> Self {
        let mut delta = Self::default();
        if desired.names().is_empty() {
            return delta;
        }

        for relation in Relation::ALL {
            let wanted: BTreeSet<String> = desired
                .get(relation)
                .unwrap_or_default()
                .iter()
                .cloned()
                .collect();
            let current = current_members(remote, relation);
            let slot = delta.relation_mut(relation);

            match mode {
                MembershipMode::Replace => {
                    slot.add = wanted.difference(&current).cloned().collect();
                    slot.remove = current.difference(&wanted).cloned().collect();
                }
                MembershipMode::AddOnly => {
                    slot.add = wanted.difference(&current).cloned().collect();
                }
                MembershipMode::RemoveOnly => {
                    slot.remove = wanted.intersection(&current).cloned().collect();
                }
            }
        }

        delta
    }

    pub fn relation(&self, relation: Relation) -> &RelationDelta {
        match relation {
            Relation::User => &self.user,
            Relation::Group => &self.group,
            Relation::Service => &self.service,
        }
    }

    fn relation_mut(&mut self, relation: Relation) -> &mut RelationDelta {
        match relation {
            Relation::User => &mut self.user,
            Relation::Group => &mut self.group,
            Relation::Service => &mut self.service,
        }
    }

    pub fn has_additions(&self) -> bool {
        Relation::ALL
            .iter()
            .any(|r| !self.relation(*r).add.is_empty())
    }

    pub fn has_removals(&self) -> bool {
        Relation::ALL
            .iter()
            .any(|r| !self.relation(*r).remove.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        !self.has_additions() && !self.has_removals()
    }

    /// Arguments for the add-member command
    pub fn addition_args(&self) -> AttributeMap {
        self.args(|d| &d.add)
    }

    /// Arguments for the remove-member command
    pub fn removal_args(&self) -> AttributeMap {
        self.args(|d| &d.remove)
    }

    fn args(&self, side: impl Fn(&RelationDelta) -> &BTreeSet<String>) -> AttributeMap {
        Relation::ALL
            .into_iter()
            .filter_map(|r| {
                let names = side(self.relation(r));
                (!names.is_empty()).then(|| {
                    (
                        r.arg_name().to_string(),
                        Value::Sequence(names.iter().cloned().collect()),
                    )
                })
            })
            .collect()
    }
}

fn current_members(remote: &AttributeMap, relation: Relation) -> BTreeSet<String> {
    remote
        .get(relation.remote_attribute())
        .map(|v| v.items().into_iter().collect())
        .unwrap_or_default()
}
