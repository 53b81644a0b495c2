//! Execution planner - turns desired state and remote snapshots into operations

use crate::diff::{MembershipDelta, MembershipMode, attributes_match};
use crate::error::{Error, Result};
use crate::fetch::fetch;
use crate::request::ReconciliationRequest;
use crate::types::{Action, CommandKind, Operation, State};
use ipakit::{AttributeMap, Backend};
use serde::Serialize;

/// Ordered list of operations for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionPlan {
    pub operations: Vec<Operation>,
}

impl ExecutionPlan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Operations planned for one target
    pub fn for_target<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a Operation> + 'a {
        self.operations.iter().filter(move |op| op.target == target)
    }
}

/// Plan every target of the request, in input order.
///
/// Stops at the first target that cannot be planned; nothing has been
/// changed at that point.
pub fn plan<B: Backend + ?Sized>(
    backend: &B,
    request: &ReconciliationRequest,
) -> Result<ExecutionPlan> {
    let mut plan = ExecutionPlan::new();
    for name in &request.names {
        for operation in plan_target(backend, request, name)? {
            plan.push(operation);
        }
    }
    log::debug!(
        "Planned {} operation(s) for {} group(s)",
        plan.len(),
        request.names.len()
    );
    Ok(plan)
}

/// Plan the operations needed to bring one group to the desired state
pub fn plan_target<B: Backend + ?Sized>(
    backend: &B,
    request: &ReconciliationRequest,
    name: &str,
) -> Result<Vec<Operation>> {
    let snapshot = fetch(backend, name)?;

    let operations = match (request.state, request.action) {
        (State::Present, Action::Group) => plan_present_group(request, name, snapshot.as_ref()),
        (State::Present, Action::Member) => {
            let remote = require_existing(name, snapshot.as_ref())?;
            member_operations(request, name, remote, MembershipMode::AddOnly)
        }
        (State::Absent, Action::Group) => match snapshot {
            Some(_) => vec![Operation::new(name, CommandKind::Delete, AttributeMap::new())],
            None => Vec::new(),
        },
        (State::Absent, Action::Member) => {
            let remote = require_existing(name, snapshot.as_ref())?;
            member_operations(request, name, remote, MembershipMode::RemoveOnly)
        }
    };

    if operations.is_empty() {
        log::debug!("Group {name} is up to date");
    }
    Ok(operations)
}

fn plan_present_group(
    request: &ReconciliationRequest,
    name: &str,
    snapshot: Option<&AttributeMap>,
) -> Vec<Operation> {
    let mut operations = Vec::new();

    let empty = AttributeMap::new();
    let remote = match snapshot {
        None => {
            let args = request.attributes.to_args();
            operations.push(Operation::new(name, CommandKind::Create, args));
            &empty
        }
        Some(remote) => {
            let desired = request.attributes.modify_args();
            if !desired.is_empty() && !attributes_match(&desired, remote) {
                operations.push(Operation::new(name, CommandKind::Modify, desired));
            }
            remote
        }
    };

    operations.extend(member_operations(
        request,
        name,
        remote,
        MembershipMode::Replace,
    ));
    operations
}

/// Member operations for one target; additions always come first
fn member_operations(
    request: &ReconciliationRequest,
    name: &str,
    remote: &AttributeMap,
    mode: MembershipMode,
) -> Vec<Operation> {
    let delta = MembershipDelta::compute(&request.members, remote, mode);
    let mut operations = Vec::new();

    if delta.has_additions() {
        operations.push(Operation::new(
            name,
            CommandKind::AddMember,
            delta.addition_args(),
        ));
    }
    if delta.has_removals() {
        operations.push(Operation::new(
            name,
            CommandKind::RemoveMember,
            delta.removal_args(),
        ));
    }
    operations
}

fn require_existing<'a>(name: &str, snapshot: Option<&'a AttributeMap>) -> Result<&'a AttributeMap> {
    snapshot.ok_or_else(|| Error::TargetNotFound {
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipakit::{MemoryBackend, Value};

    fn request(state: State, action: Action, names: &[&str]) -> ReconciliationRequest {
        ReconciliationRequest {
            names: names.iter().map(|n| n.to_string()).collect(),
            state,
            action,
            ..Default::default()
        }
    }

    fn attrs(pairs: &[(&str, Value)]) -> AttributeMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn kinds(ops: &[Operation]) -> Vec<CommandKind> {
        ops.iter().map(|op| op.kind).collect()
    }

    #[test]
    fn test_create_then_add_members() {
        let backend = MemoryBackend::new();
        let mut req = request(State::Present, Action::Group, &["ops"]);
        req.attributes.description = Some("Operations".into());
        req.members.user = Some(vec!["alice".into()]);

        let ops = plan_target(&backend, &req, "ops").unwrap();
        assert_eq!(kinds(&ops), vec![CommandKind::Create, CommandKind::AddMember]);
        assert_eq!(ops[0].args["description"], Value::from("Operations"));
        assert_eq!(ops[1].args["user"], Value::from(vec!["alice"]));
    }

    #[test]
    fn test_create_without_attributes() {
        let backend = MemoryBackend::new();
        let req = request(State::Present, Action::Group, &["ops"]);
        let ops = plan_target(&backend, &req, "ops").unwrap();
        assert_eq!(kinds(&ops), vec![CommandKind::Create]);
        assert!(ops[0].args.is_empty());
    }

    #[test]
    fn test_modify_only_when_attributes_differ() {
        let backend = MemoryBackend::new()
            .with_group("ops", attrs(&[("gidnumber", Value::from("1234"))]));

        let mut req = request(State::Present, Action::Group, &["ops"]);
        req.attributes.gid = Some(1234);
        assert!(plan_target(&backend, &req, "ops").unwrap().is_empty());

        req.attributes.gid = Some(1235);
        let ops = plan_target(&backend, &req, "ops").unwrap();
        assert_eq!(kinds(&ops), vec![CommandKind::Modify]);
        assert_eq!(ops[0].args["gidnumber"], Value::from("1235"));
    }

    #[test]
    fn test_nomembers_sent_on_create_only() {
        let mut req = request(State::Present, Action::Group, &["ops"]);
        req.attributes.nomembers = Some(true);

        let ops = plan_target(&MemoryBackend::new(), &req, "ops").unwrap();
        assert_eq!(kinds(&ops), vec![CommandKind::Create]);
        assert_eq!(ops[0].args["nomembers"], Value::Bool(true));

        let backend = MemoryBackend::new().with_group("ops", AttributeMap::new());
        assert!(plan_target(&backend, &req, "ops").unwrap().is_empty());
    }

    #[test]
    fn test_replace_membership_adds_before_removes() {
        let backend = MemoryBackend::new().with_group(
            "ops",
            attrs(&[("member_user", Value::from(vec!["bob", "carol"]))]),
        );
        let mut req = request(State::Present, Action::Group, &["ops"]);
        req.members.user = Some(vec!["alice".into(), "bob".into()]);

        let ops = plan_target(&backend, &req, "ops").unwrap();
        assert_eq!(
            kinds(&ops),
            vec![CommandKind::AddMember, CommandKind::RemoveMember]
        );
        assert_eq!(ops[0].args["user"], Value::from(vec!["alice"]));
        assert_eq!(ops[1].args["user"], Value::from(vec!["carol"]));
    }

    #[test]
    fn test_member_action_adds_only() {
        let backend = MemoryBackend::new().with_group(
            "ops",
            attrs(&[("member_user", Value::from(vec!["bob", "carol"]))]),
        );
        let mut req = request(State::Present, Action::Member, &["ops"]);
        req.members.user = Some(vec!["alice".into(), "bob".into()]);

        let ops = plan_target(&backend, &req, "ops").unwrap();
        assert_eq!(kinds(&ops), vec![CommandKind::AddMember]);
        assert_eq!(ops[0].args["user"], Value::from(vec!["alice"]));
    }

    #[test]
    fn test_member_action_on_missing_group() {
        let backend = MemoryBackend::new();
        let mut req = request(State::Absent, Action::Member, &["ops"]);
        req.members.user = Some(vec!["alice".into()]);

        let err = plan_target(&backend, &req, "ops").unwrap_err();
        assert!(matches!(err, Error::TargetNotFound { ref name } if name == "ops"));
        assert!(backend.mutations().is_empty());
    }

    #[test]
    fn test_absent_member_removes_present_only() {
        let backend = MemoryBackend::new().with_group(
            "ops",
            attrs(&[("member_group", Value::from(vec!["admins"]))]),
        );
        let mut req = request(State::Absent, Action::Member, &["ops"]);
        req.members.group = Some(vec!["admins".into(), "nobody".into()]);

        let ops = plan_target(&backend, &req, "ops").unwrap();
        assert_eq!(kinds(&ops), vec![CommandKind::RemoveMember]);
        assert_eq!(ops[0].args["group"], Value::from(vec!["admins"]));
    }

    #[test]
    fn test_absent_group() {
        let backend = MemoryBackend::new().with_group("ops", AttributeMap::new());
        let req = request(State::Absent, Action::Group, &["ops", "dev"]);

        let plan = plan(&backend, &req).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.operations[0].kind, CommandKind::Delete);
        assert_eq!(plan.for_target("dev").count(), 0);
    }

    #[test]
    fn test_plan_keeps_target_order() {
        let backend = MemoryBackend::new()
            .with_group("b", AttributeMap::new())
            .with_group("a", AttributeMap::new());
        let req = request(State::Absent, Action::Group, &["b", "a"]);

        let plan = plan(&backend, &req).unwrap();
        let targets: Vec<_> = plan.operations.iter().map(|op| op.target.as_str()).collect();
        assert_eq!(targets, vec!["b", "a"]);
    }
}
