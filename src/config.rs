use anyhow::{Context, Result, bail};
use reconcile::{Action, ReconciliationRequest, State};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::{ActionArg, GroupArgs, StateArg};

/// Keys a desired-state file may contain
const FILE_KEYS: &[&str] = &[
    "principal",
    "name",
    "names",
    "state",
    "action",
    "description",
    "gid",
    "gidnumber",
    "nonposix",
    "external",
    "nomembers",
    "user",
    "group",
    "service",
];

/// Expand `~` in a user-supplied path
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&raw).as_ref())
}

/// Load a desired-state file
///
/// The file holds the same keys as the command-line flags:
///
/// ```toml
/// name = ["ops"]
/// state = "present"
/// description = "Operations"
/// gid = 1234
/// user = ["alice", "bob"]
/// ```
///
/// Passwords are never read from files, and unknown keys are rejected.
pub fn load_request(path: &Path) -> Result<ReconciliationRequest> {
    let path = expand_path(path);
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    let invalid = || format!("Invalid desired state in {}", path.display());

    let table: toml::Table = toml::from_str(&content).with_context(invalid)?;
    if let Some(key) = table.keys().find(|k| !FILE_KEYS.contains(&k.as_str())) {
        bail!("{}: unknown key '{key}'", invalid());
    }
    toml::from_str(&content).with_context(invalid)
}

/// Build the request for a run: the file (if any), then flags on top
pub fn build_request(args: GroupArgs) -> Result<ReconciliationRequest> {
    let mut request = match &args.file {
        Some(path) => load_request(path)?,
        None => ReconciliationRequest::default(),
    };
    merge_args(&mut request, args);
    Ok(request)
}

fn merge_args(request: &mut ReconciliationRequest, args: GroupArgs) {
    if !args.names.is_empty() {
        request.names = args.names;
    }
    if let Some(state) = args.state {
        request.state = match state {
            StateArg::Present => State::Present,
            StateArg::Absent => State::Absent,
        };
    }
    if let Some(action) = args.action {
        request.action = match action {
            ActionArg::Group => Action::Group,
            ActionArg::Member => Action::Member,
        };
    }

    let attributes = &mut request.attributes;
    if args.description.is_some() {
        attributes.description = args.description;
    }
    if args.gid.is_some() {
        attributes.gid = args.gid;
    }
    if args.nonposix {
        attributes.nonposix = Some(true);
    } else if args.posix {
        attributes.nonposix = Some(false);
    }
    if args.external {
        attributes.external = Some(true);
    }
    if args.nomembers {
        attributes.nomembers = Some(true);
    }

    let members = &mut request.members;
    if args.users.is_some() {
        members.user = args.users;
    }
    if args.groups.is_some() {
        members.group = args.groups;
    }
    if args.services.is_some() {
        members.service = args.services;
    }

    if let Some(principal) = args.principal {
        request.principal = principal;
    }
    if args.password.is_some() {
        request.password = args.password;
    }
}

// ============================================================================
// Tests
// ============================================================================
