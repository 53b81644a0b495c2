//! End-to-end runs against the in-memory backend with fake Kerberos tools.

use ipakit::{AttributeMap, MemoryBackend, Value};
use krbsession::{KerberosTools, SessionManager, StaticLookup};
use reconcile::{
    Action, CommandKind, Error, ExecuteOptions, NoProgress, ReconciliationRequest,
    ReconciliationResult, State, reconcile,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const PASSWORD: &str = "Secret123";

#[derive(Default)]
struct FakeKrb {
    valid: Mutex<BTreeSet<String>>,
    kinits: Mutex<usize>,
    destroyed: Mutex<Vec<String>>,
    fail_destroy: bool,
}

impl FakeKrb {
    fn with_valid(ccache: &str) -> Arc<Self> {
        let krb = Self::default();
        krb.valid.lock().unwrap().insert(ccache.to_string());
        Arc::new(krb)
    }

    fn failing_destroy() -> Arc<Self> {
        Arc::new(Self {
            fail_destroy: true,
            ..Default::default()
        })
    }

    fn kinits(&self) -> usize {
        *self.kinits.lock().unwrap()
    }

    fn destroyed(&self) -> Vec<String> {
        self.destroyed.lock().unwrap().clone()
    }
}

impl KerberosTools for FakeKrb {
    fn kinit_password(&self, principal: &str, password: &str, ccache: &str) -> krbsession::Result<()> {
        *self.kinits.lock().unwrap() += 1;
        if password != PASSWORD {
            return Err(krbsession::Error::Authentication {
                principal: principal.to_string(),
                message: "Password incorrect".into(),
            });
        }
        std::fs::write(ccache.trim_start_matches("FILE:"), b"ticket")?;
        self.valid.lock().unwrap().insert(ccache.to_string());
        Ok(())
    }

    fn kinit_keytab(&self, principal: &str, _keytab: &Path, ccache: &str) -> krbsession::Result<()> {
        self.kinit_password(principal, PASSWORD, ccache)
    }

    fn kdestroy(&self, ccache: &str) -> krbsession::Result<()> {
        self.destroyed.lock().unwrap().push(ccache.to_string());
        if self.fail_destroy {
            return Err(krbsession::Error::Tool {
                tool: "kdestroy",
                message: "Permission denied".into(),
            });
        }
        self.valid.lock().unwrap().remove(ccache);
        Ok(())
    }

    fn is_valid(&self, ccache: Option<&str>) -> bool {
        ccache.is_some_and(|c| self.valid.lock().unwrap().contains(c))
    }

    fn default_principal(&self, _ccache: Option<&str>) -> Option<String> {
        None
    }
}

fn manager(krb: &Arc<FakeKrb>, lookup: StaticLookup) -> SessionManager {
    SessionManager::with_parts(Arc::clone(krb) as Arc<dyn KerberosTools>, lookup)
}

fn request(state: State, action: Action, names: &[&str]) -> ReconciliationRequest {
    ReconciliationRequest {
        names: names.iter().map(|n| n.to_string()).collect(),
        password: Some(PASSWORD.into()),
        state,
        action,
        ..Default::default()
    }
}

fn users(names: &[&str]) -> Option<Vec<String>> {
    Some(names.iter().map(|n| n.to_string()).collect())
}

fn run(
    backend: &MemoryBackend,
    manager: &SessionManager,
    request: &ReconciliationRequest,
    opts: &ExecuteOptions,
) -> reconcile::Result<ReconciliationResult> {
    reconcile(
        request,
        opts,
        |principal, password| manager.acquire(principal, password),
        |_session| Ok(backend),
        &mut NoProgress,
    )
}

fn run_default(
    backend: &MemoryBackend,
    request: &ReconciliationRequest,
) -> reconcile::Result<ReconciliationResult> {
    let krb = Arc::new(FakeKrb::default());
    run(
        backend,
        &manager(&krb, StaticLookup::default()),
        request,
        &ExecuteOptions::default(),
    )
}

#[test]
fn second_identical_run_changes_nothing() {
    let backend = MemoryBackend::new();
    let mut req = request(State::Present, Action::Group, &["ops"]);
    req.attributes.description = Some("Operations".into());
    req.attributes.gid = Some(1234);
    req.members.user = users(&["alice", "bob"]);
    req.members.group = users(&["admins"]);

    let first = run_default(&backend, &req).unwrap();
    assert!(first.changed);
    assert_eq!(first.summary.created, 1);
    assert_eq!(first.summary.member_additions, 1);

    let entry = backend.group("ops").unwrap();
    assert_eq!(entry["gidnumber"], Value::from(vec!["1234"]));
    assert_eq!(entry["member_user"], Value::from(vec!["alice", "bob"]));

    let mutations = backend.mutations().len();
    let second = run_default(&backend, &req).unwrap();
    assert!(!second.changed);
    assert!(second.operations.is_empty());
    assert_eq!(backend.mutations().len(), mutations);
}

#[test]
fn additions_run_before_removals() {
    let mut attrs = AttributeMap::new();
    attrs.insert("member_user".into(), Value::from(vec!["bob", "carol"]));
    let backend = MemoryBackend::new().with_group("ops", attrs);

    let mut req = request(State::Present, Action::Group, &["ops"]);
    req.members.user = users(&["alice", "bob"]);

    let result = run_default(&backend, &req).unwrap();
    let kinds: Vec<_> = result.operations.iter().map(|op| op.kind).collect();
    assert_eq!(kinds, vec![CommandKind::AddMember, CommandKind::RemoveMember]);

    let commands: Vec<_> = backend.mutations().into_iter().map(|c| c.command).collect();
    assert_eq!(commands, vec!["group_add_member", "group_remove_member"]);
    assert_eq!(
        backend.group("ops").unwrap()["member_user"],
        Value::from(vec!["alice", "bob"])
    );
}

#[test]
fn absent_group_that_does_not_exist_is_a_no_op() {
    let backend = MemoryBackend::new();
    let req = request(State::Absent, Action::Group, &["ops"]);

    let result = run_default(&backend, &req).unwrap();
    assert!(!result.changed);
    assert!(result.operations.is_empty());
    assert!(backend.mutations().is_empty());
}

#[test]
fn member_action_on_missing_group_fails_without_changes() {
    let backend = MemoryBackend::new();
    let mut req = request(State::Present, Action::Member, &["ops"]);
    req.members.user = users(&["alice"]);

    let err = run_default(&backend, &req).unwrap_err();
    assert!(matches!(err, Error::TargetNotFound { ref name } if name == "ops"));
    assert_eq!(err.to_string(), "No group 'ops'");
    assert!(backend.mutations().is_empty());
}

#[test]
fn reused_session_is_left_valid() {
    let ccache = "FILE:/tmp/krb5cc_caller";
    let krb = FakeKrb::with_valid(ccache);
    let lookup = StaticLookup {
        ccache: Some(ccache.into()),
        keytab: None,
    };
    let backend = MemoryBackend::new();
    let mut req = request(State::Present, Action::Group, &["ops"]);
    req.password = None;

    run(&backend, &manager(&krb, lookup), &req, &ExecuteOptions::default()).unwrap();

    assert!(krb.is_valid(Some(ccache)));
    assert!(krb.destroyed().is_empty());
    assert_eq!(krb.kinits(), 0);
}

#[test]
fn created_store_is_removed_after_the_run() {
    let krb = Arc::new(FakeKrb::default());
    let manager = manager(&krb, StaticLookup::default());
    let backend = MemoryBackend::new();
    let req = request(State::Present, Action::Group, &["ops"]);

    let seen: Mutex<Option<(String, PathBuf)>> = Mutex::new(None);
    reconcile(
        &req,
        &ExecuteOptions::default(),
        |principal, password| manager.acquire(principal, password),
        |session| {
            let ccache = session.ccache().unwrap_or_default().to_string();
            let store = session.store_path().map(Path::to_path_buf).unwrap_or_default();
            assert!(store.join("ccache").exists());
            *seen.lock().unwrap() = Some((ccache, store));
            Ok(&backend)
        },
        &mut NoProgress,
    )
    .unwrap();

    let (ccache, store) = seen.lock().unwrap().take().unwrap();
    assert!(!store.exists());
    assert_eq!(krb.destroyed(), vec![ccache]);
}

#[test]
fn created_store_is_removed_when_the_run_fails() {
    let krb = Arc::new(FakeKrb::default());
    let manager = manager(&krb, StaticLookup::default());
    let backend = MemoryBackend::new();
    backend.fail_on("group_add", "ops", "insufficient access");
    let req = request(State::Present, Action::Group, &["ops"]);

    let store: Mutex<Option<PathBuf>> = Mutex::new(None);
    let err = reconcile(
        &req,
        &ExecuteOptions::default(),
        |principal, password| manager.acquire(principal, password),
        |session| {
            *store.lock().unwrap() = session.store_path().map(Path::to_path_buf);
            Ok(&backend)
        },
        &mut NoProgress,
    )
    .unwrap_err();

    assert!(matches!(err, Error::CommandExecution { .. }));
    let store = store.lock().unwrap().take().unwrap();
    assert!(!store.exists());
    assert_eq!(krb.destroyed().len(), 1);
}

#[test]
fn failed_teardown_keeps_the_run_error() {
    let krb = FakeKrb::failing_destroy();
    let manager = manager(&krb, StaticLookup::default());
    let backend = MemoryBackend::new();
    backend.fail_on("group_add", "ops", "insufficient access");
    let req = request(State::Present, Action::Group, &["ops"]);

    let store: Mutex<Option<PathBuf>> = Mutex::new(None);
    let err = reconcile(
        &req,
        &ExecuteOptions::default(),
        |principal, password| manager.acquire(principal, password),
        |session| {
            *store.lock().unwrap() = session.store_path().map(Path::to_path_buf);
            Ok(&backend)
        },
        &mut NoProgress,
    )
    .unwrap_err();

    match &err {
        Error::CommandExecution { target, kind, detail } => {
            assert_eq!(target, "ops");
            assert_eq!(*kind, CommandKind::Create);
            assert!(detail.contains("insufficient access"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(krb.destroyed().len(), 1);
    assert!(!store.lock().unwrap().take().unwrap().exists());
}

#[test]
fn failed_teardown_keeps_a_successful_result() {
    let krb = FakeKrb::failing_destroy();
    let backend = MemoryBackend::new();
    let req = request(State::Present, Action::Group, &["ops"]);

    let result = run(
        &backend,
        &manager(&krb, StaticLookup::default()),
        &req,
        &ExecuteOptions::default(),
    )
    .unwrap();

    assert!(result.changed);
    assert_eq!(result.summary.created, 1);
    assert_eq!(krb.destroyed().len(), 1);
    assert!(backend.group("ops").is_some());
}

#[test]
fn replace_clears_relations_left_out_of_the_request() {
    let mut attrs = AttributeMap::new();
    attrs.insert("member_group".into(), Value::from(vec!["admins"]));
    attrs.insert("member_user".into(), Value::from(vec!["bob"]));
    let backend = MemoryBackend::new().with_group("ops", attrs);

    let mut req = request(State::Present, Action::Group, &["ops"]);
    req.members.user = users(&["alice", "bob"]);

    let result = run_default(&backend, &req).unwrap();
    assert_eq!(result.operations.len(), 2);
    assert_eq!(result.operations[0].args["user"], Value::from(vec!["alice"]));
    assert_eq!(result.operations[1].args["group"], Value::from(vec!["admins"]));

    let entry = backend.group("ops").unwrap();
    assert_eq!(entry["member_user"], Value::from(vec!["alice", "bob"]));
    assert!(!entry.contains_key("member_group"));

    // no lists at all leaves membership alone
    let bare = request(State::Present, Action::Group, &["ops"]);
    assert!(!run_default(&backend, &bare).unwrap().changed);
}

#[test]
fn batch_stops_at_the_failing_operation() {
    let mut attrs = AttributeMap::new();
    attrs.insert("description".into(), Value::from("Old"));
    attrs.insert("member_user".into(), Value::from(vec!["carol"]));
    let backend = MemoryBackend::new().with_group("ops", attrs);
    backend.fail_on("group_add_member", "ops", "insufficient access");

    let mut req = request(State::Present, Action::Group, &["ops"]);
    req.attributes.description = Some("New".into());
    req.members.user = users(&["alice"]);

    let err = run_default(&backend, &req).unwrap_err();
    match &err {
        Error::CommandExecution { target, kind, .. } => {
            assert_eq!(target, "ops");
            assert_eq!(*kind, CommandKind::AddMember);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().starts_with("group_add_member: ops:"));

    let commands: Vec<_> = backend.mutations().into_iter().map(|c| c.command).collect();
    assert_eq!(commands, vec!["group_mod", "group_add_member"]);

    // first operation stays applied, third never ran
    let entry = backend.group("ops").unwrap();
    assert_eq!(entry["description"], Value::from(vec!["New"]));
    assert_eq!(entry["member_user"], Value::from(vec!["carol"]));
}

#[test]
fn check_mode_reports_without_mutating() {
    let backend = MemoryBackend::new().with_group("dev", AttributeMap::new());
    let req = request(State::Absent, Action::Group, &["dev", "ops"]);
    let krb = Arc::new(FakeKrb::default());

    let result = run(
        &backend,
        &manager(&krb, StaticLookup::default()),
        &req,
        &ExecuteOptions { dry_run: true },
    )
    .unwrap();

    assert!(result.changed);
    assert!(result.dry_run);
    assert_eq!(result.operations.len(), 1);
    assert_eq!(result.operations[0].kind, CommandKind::Delete);
    assert!(backend.mutations().is_empty());
    assert!(backend.group("dev").is_some());
}

#[test]
fn validation_happens_before_authentication_and_backend() {
    let krb = Arc::new(FakeKrb::default());
    let manager = manager(&krb, StaticLookup::default());
    let backend = MemoryBackend::new();
    let req = request(State::Present, Action::Group, &["ops", "dev"]);

    let err = run(&backend, &manager, &req, &ExecuteOptions::default()).unwrap_err();
    assert_eq!(err.to_string(), "Only one group can be added at a time.");
    assert_eq!(krb.kinits(), 0);
    assert!(backend.calls().is_empty());
}

#[test]
fn missing_password_is_an_authentication_error() {
    let backend = MemoryBackend::new();
    let mut req = request(State::Present, Action::Group, &["ops"]);
    req.password = None;

    let err = run_default(&backend, &req).unwrap_err();
    assert!(matches!(err, Error::Authentication(_)));
    assert_eq!(err.to_string(), "The password is not set");
    assert!(backend.calls().is_empty());
}

#[test]
fn ambiguous_group_is_reported() {
    let backend = MemoryBackend::new().with_group("ops", AttributeMap::new());
    backend.duplicate("ops");
    let req = request(State::Absent, Action::Group, &["ops"]);

    let err = run_default(&backend, &req).unwrap_err();
    assert_eq!(err.to_string(), "There is more than one group 'ops'");
    assert!(backend.mutations().is_empty());
}

#[test]
fn remove_members_only_touches_listed_present_members() {
    let mut attrs = AttributeMap::new();
    attrs.insert("member_user".into(), Value::from(vec!["alice", "bob"]));
    attrs.insert("member_service".into(), Value::from(vec!["HTTP/www.example.com"]));
    let backend = MemoryBackend::new().with_group("ops", attrs);

    let mut req = request(State::Absent, Action::Member, &["ops"]);
    req.members.user = users(&["bob", "nobody"]);

    let result = run_default(&backend, &req).unwrap();
    assert_eq!(result.summary.member_removals, 1);

    let entry = backend.group("ops").unwrap();
    assert_eq!(entry["member_user"], Value::from(vec!["alice"]));
    assert_eq!(entry["member_service"], Value::from(vec!["HTTP/www.example.com"]));

    let again = run_default(&backend, &req).unwrap();
    assert!(!again.changed);
}
