//! Backend that drives the `ipa` command-line client.
//!
//! Mutations map one-to-one onto `ipa <command> --option=value -- <target>`.
//! Queries run with `--all --raw` so every attribute comes back under its
//! LDAP name, one `name: value` line per value.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::{AttributeMap, Response, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Environment variable overriding the location of the `ipa` client.
pub const ENV_IPA_CLI: &str = "IPA_CLI";

/// Backend that executes real `ipa` commands.
pub struct IpaCli {
    /// Path to the ipa executable
    ipa_path: PathBuf,
    /// Credential cache handed to the client via `KRB5CCNAME`
    ccache: Option<String>,
}

impl IpaCli {
    /// Create a backend bound to a credential cache.
    ///
    /// `None` leaves the client on the caller's default cache.
    /// Returns an error if the `ipa` client is not installed.
    pub fn new(ccache: Option<&str>) -> Result<Self> {
        let ipa_path = find_ipa()?;
        Ok(Self::with_path(ipa_path, ccache))
    }

    /// Create a backend using an explicit client path.
    pub fn with_path(ipa_path: impl Into<PathBuf>, ccache: Option<&str>) -> Self {
        Self {
            ipa_path: ipa_path.into(),
            ccache: ccache.map(str::to_string),
        }
    }

    fn run_ipa(&self, args: &[String]) -> Result<Output> {
        log::debug!("Running ipa {}", args.join(" "));

        let mut cmd = Command::new(&self.ipa_path);
        cmd.args(args);
        if let Some(ccache) = &self.ccache {
            cmd.env("KRB5CCNAME", ccache);
        }

        cmd.output().map_err(|e| Error::CommandFailed {
            command: args.first().cloned().unwrap_or_default(),
            stderr: format!("failed to execute {}: {e}", self.ipa_path.display()),
        })
    }
}

impl Backend for IpaCli {
    fn invoke(&self, command: &str, target: &str, args: &AttributeMap) -> Result<Response> {
        let argv = command_args(command, Some(target), args);
        let output = self.run_ipa(&argv)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::from_ipa_output(command, &stderr, target));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(Response {
            summary: summary_line(&stdout),
        })
    }

    fn find(&self, command: &str, target: &str, args: &AttributeMap) -> Result<Vec<AttributeMap>> {
        let mut argv = command_args(command, None, args);
        argv.push("--raw".to_string());
        argv.push("--sizelimit=0".to_string());

        let output = self.run_ipa(&argv)?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        if !output.status.success() {
            // find exits non-zero when nothing matched
            if no_matches(&stdout) {
                return Ok(Vec::new());
            }
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::from_ipa_output(command, &stderr, target));
        }

        parse_entries(&stdout)
    }
}

/// Build the argument vector for a command.
///
/// `group_add_member` becomes `group-add-member`; each argument becomes a long
/// option. Sequences repeat the option once per item, `true` flags are bare,
/// `false` flags are dropped except `nonposix` on a modify, which the client
/// spells `--posix`. The target goes last, after `--`, so a name starting with
/// a dash is never read as an option.
pub fn command_args(command: &str, target: Option<&str>, args: &AttributeMap) -> Vec<String> {
    let mut argv = vec![command.replace('_', "-")];

    for (key, value) in args {
        let option = option_name(key);
        match value {
            Value::Bool(true) => argv.push(format!("--{option}")),
            Value::Bool(false) => {
                if key == "nonposix" && command.ends_with("_mod") {
                    argv.push("--posix".to_string());
                }
            }
            Value::Int(n) => argv.push(format!("--{option}={n}")),
            Value::Scalar(s) => argv.push(format!("--{option}={s}")),
            Value::Sequence(items) => {
                for item in items {
                    argv.push(format!("--{option}={item}"));
                }
            }
        }
    }

    if let Some(target) = target {
        argv.push("--".to_string());
        argv.push(target.to_string());
    }

    argv
}

/// Map an API parameter name onto the client's option name.
fn option_name(key: &str) -> String {
    match key {
        "description" => "desc".to_string(),
        "gidnumber" => "gid".to_string(),
        "cn" => "group-name".to_string(),
        "nomembers" => "no-members".to_string(),
        "user" => "users".to_string(),
        "group" => "groups".to_string(),
        "service" => "services".to_string(),
        other => other.replace('_', "-"),
    }
}

/// Parse `--raw` query output into entries.
///
/// Entries are separated by blank lines or a new `dn:` line. Banner lines
/// (`----`, `1 group matched`, `Number of entries returned 1`) are skipped.
pub fn parse_entries(output: &str) -> Result<Vec<AttributeMap>> {
    let mut entries = Vec::new();
    let mut current: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for (idx, line) in output.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_banner(trimmed) {
            flush(&mut current, &mut entries);
            continue;
        }

        let Some((key, value)) = trimmed.split_once(':') else {
            return Err(Error::Parse {
                line: idx + 1,
                message: format!("expected 'attribute: value', got '{trimmed}'"),
            });
        };

        let key = key.trim().to_lowercase();
        if key == "dn" {
            flush(&mut current, &mut entries);
        }
        current
            .entry(key)
            .or_default()
            .push(value.trim().to_string());
    }
    flush(&mut current, &mut entries);

    Ok(entries)
}

fn flush(current: &mut BTreeMap<String, Vec<String>>, entries: &mut Vec<AttributeMap>) {
    if !current.is_empty() {
        entries.push(into_entry(std::mem::take(current)));
    }
}

/// Separator and count lines. Attribute lines always contain a colon, so a
/// value that happens to end in "matched" is never mistaken for a banner.
fn is_banner(line: &str) -> bool {
    if line.contains(':') {
        return false;
    }
    if line.chars().all(|c| c == '-') {
        return true;
    }
    if let Some(count) = line.strip_prefix("Number of entries returned ") {
        return is_count(count);
    }
    let mut words = line.split_whitespace();
    matches!(
        (words.next(), words.next(), words.next(), words.next()),
        (Some(count), Some(_), Some("matched"), None) if is_count(count)
    )
}

fn is_count(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_ascii_digit())
}

fn no_matches(stdout: &str) -> bool {
    stdout
        .lines()
        .map(str::trim)
        .any(|l| l.starts_with("0 ") && is_banner(l))
}

/// Turn raw attribute lines into an entry.
///
/// `member` DNs are split per relation into `member_user`, `member_group` and
/// `member_service`, and the group flags are derived from `objectclass`.
fn into_entry(raw: BTreeMap<String, Vec<String>>) -> AttributeMap {
    let mut entry = AttributeMap::new();
    let mut members: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();
    let mut objectclasses: Vec<String> = Vec::new();

    for (key, values) in raw {
        match key.as_str() {
            "member" => {
                for dn in &values {
                    if let Some((relation, name)) = classify_member(dn) {
                        members.entry(relation).or_default().push(name);
                    }
                }
            }
            "objectclass" => {
                objectclasses = values.iter().map(|v| v.to_lowercase()).collect();
                entry.insert(key, Value::Sequence(values));
            }
            _ => {
                entry.insert(key, Value::Sequence(values));
            }
        }
    }

    for (relation, names) in members {
        entry.insert(relation.to_string(), Value::Sequence(names));
    }

    if !objectclasses.is_empty() {
        let has = |class: &str| objectclasses.iter().any(|c| c == class);
        entry.insert("nonposix".to_string(), Value::Bool(!has("posixgroup")));
        entry.insert("external".to_string(), Value::Bool(has("ipaexternalgroup")));
    }

    entry
}

/// Classify a member DN into its relation attribute and member name.
fn classify_member(dn: &str) -> Option<(&'static str, String)> {
    let (rdn, container) = dn.split_once(',')?;
    let (attr, value) = rdn.split_once('=')?;
    let container = container.trim().to_lowercase();

    match attr.trim().to_lowercase().as_str() {
        "uid" => Some(("member_user", value.to_string())),
        "krbprincipalname" => Some(("member_service", value.to_string())),
        "cn" if container.starts_with("cn=groups") => Some(("member_group", value.to_string())),
        _ => None,
    }
}

/// First meaningful line of a mutation's output, e.g. `Added group "ops"`.
fn summary_line(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.chars().all(|c| c == '-'))
        .map(str::to_string)
}

/// Locate the `ipa` executable.
fn find_ipa() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(ENV_IPA_CLI) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(path);
        }
        log::warn!("{ENV_IPA_CLI} points at missing file {}", path.display());
    }

    for path in ["/usr/bin/ipa", "/usr/local/bin/ipa"] {
        if Path::new(path).exists() {
            return Ok(PathBuf::from(path));
        }
    }

    std::env::var_os("PATH")
        .and_then(|paths| {
            std::env::split_paths(&paths)
                .map(|dir| dir.join("ipa"))
                .find(|candidate| candidate.is_file())
        })
        .ok_or(Error::ClientNotFound)
}
