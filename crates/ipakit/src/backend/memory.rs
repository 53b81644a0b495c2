//! In-process backend holding groups in memory.
//!
//! Behaves like the group commands of a real server closely enough to drive
//! the reconciler end to end: entries come back from queries with every
//! attribute multi-valued, modifying an entry to its current values is
//! refused, and failures can be injected per command and target.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::{AttributeMap, Response, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

/// Membership attributes as reported by queries, keyed by argument name.
const RELATIONS: [(&str, &str); 3] = [
    ("user", "member_user"),
    ("group", "member_group"),
    ("service", "member_service"),
];

/// A recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Command name, e.g. `group_add`
    pub command: String,
    /// Target the command ran against
    pub target: String,
    /// Arguments passed
    pub args: AttributeMap,
}

impl Call {
    /// Whether this call was a query.
    pub fn is_query(&self) -> bool {
        self.command.ends_with("_find")
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    groups: BTreeMap<String, AttributeMap>,
    calls: Vec<Call>,
    failures: Vec<(String, String, String)>,
    duplicates: BTreeSet<String>,
}

/// Backend storing groups in a map.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a group with the given attributes (builder style).
    pub fn with_group(self, name: &str, attrs: AttributeMap) -> Self {
        self.insert_group(name, attrs);
        self
    }

    /// Add or replace a group.
    ///
    /// Attributes are stored the way a query would return them.
    pub fn insert_group(&self, name: &str, attrs: AttributeMap) {
        let mut entry = new_entry(name);
        for (key, value) in attrs {
            entry.insert(key, stored(value));
        }
        self.state().groups.insert(name.to_string(), entry);
    }

    /// Current entry for a group, if it exists.
    pub fn group(&self, name: &str) -> Option<AttributeMap> {
        self.state().groups.get(name).cloned()
    }

    /// Make queries for `name` report two matches.
    pub fn duplicate(&self, name: &str) {
        self.state().duplicates.insert(name.to_string());
    }

    /// Make `command` against `target` fail with `message`.
    pub fn fail_on(&self, command: &str, target: &str, message: &str) {
        self.state().failures.push((
            command.to_string(),
            target.to_string(),
            message.to_string(),
        ));
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Calls that were not queries.
    pub fn mutations(&self) -> Vec<Call> {
        self.state()
            .calls
            .iter()
            .filter(|c| !c.is_query())
            .cloned()
            .collect()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Backend for MemoryBackend {
    fn invoke(&self, command: &str, target: &str, args: &AttributeMap) -> Result<Response> {
        let mut state = self.state();
        state.calls.push(Call {
            command: command.to_string(),
            target: target.to_string(),
            args: args.clone(),
        });

        if let Some((_, _, message)) = state
            .failures
            .iter()
            .find(|(c, t, _)| c == command && t == target)
        {
            return Err(Error::CommandFailed {
                command: command.to_string(),
                stderr: message.clone(),
            });
        }

        let groups = &mut state.groups;
        match command {
            "group_add" => {
                if groups.contains_key(target) {
                    return Err(Error::AlreadyExists {
                        name: target.to_string(),
                    });
                }
                let mut entry = new_entry(target);
                // processing flag, not an attribute of the entry
                for (key, value) in args.iter().filter(|(k, _)| *k != "nomembers") {
                    entry.insert(key.clone(), stored(value.clone()));
                }
                groups.insert(target.to_string(), entry);
                Ok(Response::with_summary(format!("Added group \"{target}\"")))
            }
            "group_mod" => {
                let entry = existing(groups, target)?;
                let mut modified = false;
                for (key, value) in args {
                    let value = stored(value.clone());
                    if entry.get(key) != Some(&value) {
                        entry.insert(key.clone(), value);
                        modified = true;
                    }
                }
                if !modified {
                    return Err(Error::NoChange);
                }
                Ok(Response::with_summary(format!("Modified group \"{target}\"")))
            }
            "group_del" => {
                existing(groups, target)?;
                groups.remove(target);
                Ok(Response::with_summary(format!("Deleted group \"{target}\"")))
            }
            "group_add_member" => {
                let entry = existing(groups, target)?;
                let mut added = 0;
                for (arg, attr) in RELATIONS {
                    let Some(value) = args.get(arg) else { continue };
                    let mut current = members(entry, attr);
                    for name in value.items() {
                        if current.insert(name) {
                            added += 1;
                        }
                    }
                    set_members(entry, attr, current);
                }
                Ok(Response::with_summary(format!("Number of members added {added}")))
            }
            "group_remove_member" => {
                let entry = existing(groups, target)?;
                let mut removed = 0;
                for (arg, attr) in RELATIONS {
                    let Some(value) = args.get(arg) else { continue };
                    let mut current = members(entry, attr);
                    for name in value.items() {
                        if current.remove(&name) {
                            removed += 1;
                        }
                    }
                    set_members(entry, attr, current);
                }
                Ok(Response::with_summary(format!(
                    "Number of members removed {removed}"
                )))
            }
            other => Err(Error::Other(format!("unknown command: {other}"))),
        }
    }

    fn find(&self, command: &str, target: &str, args: &AttributeMap) -> Result<Vec<AttributeMap>> {
        let mut state = self.state();
        state.calls.push(Call {
            command: command.to_string(),
            target: target.to_string(),
            args: args.clone(),
        });

        if command != "group_find" {
            return Err(Error::Other(format!("unknown command: {command}")));
        }

        let name = args.get("cn").and_then(Value::as_str).unwrap_or(target);
        let Some(entry) = state.groups.get(name) else {
            return Ok(Vec::new());
        };

        let mut found = vec![entry.clone()];
        if state.duplicates.contains(name) {
            found.push(entry.clone());
        }
        Ok(found)
    }
}

fn new_entry(name: &str) -> AttributeMap {
    let mut entry = AttributeMap::new();
    entry.insert("cn".to_string(), Value::Sequence(vec![name.to_string()]));
    entry.insert("nonposix".to_string(), Value::Bool(false));
    entry.insert("external".to_string(), Value::Bool(false));
    entry
}

/// Shape a value the way queries report it: flags stay flags, everything
/// else becomes multi-valued.
fn stored(value: Value) -> Value {
    match value {
        Value::Bool(_) => value,
        other => other.into_sequence(),
    }
}

fn existing<'a>(
    groups: &'a mut BTreeMap<String, AttributeMap>,
    name: &str,
) -> Result<&'a mut AttributeMap> {
    groups.get_mut(name).ok_or_else(|| Error::NotFound {
        name: name.to_string(),
    })
}

fn members(entry: &AttributeMap, attr: &str) -> BTreeSet<String> {
    entry
        .get(attr)
        .map(|v| v.items().into_iter().collect())
        .unwrap_or_default()
}

fn set_members(entry: &mut AttributeMap, attr: &str, members: BTreeSet<String>) {
    if members.is_empty() {
        entry.remove(attr);
    } else {
        entry.insert(attr.to_string(), Value::Sequence(members.into_iter().collect()));
    }
}
