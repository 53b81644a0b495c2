//! # ipakit
//!
//! Client library for the FreeIPA command interface.
//!
//! This crate provides:
//! - A typed [`Value`] model for command arguments and query results
//! - The [`Backend`] trait: `invoke` a named command, `find` entries
//! - [`IpaCli`], a backend driving the `ipa` command-line client
//! - [`MemoryBackend`], an in-process backend for tests
//! - Errors categorized from the server's messages
//!
//! ## Example
//!
//! ```no_run
//! use ipakit::{AttributeMap, Backend, IpaCli, Value};
//!
//! let backend = IpaCli::new(None).expect("ipa client not available");
//!
//! let mut query = AttributeMap::new();
//! query.insert("all".into(), Value::Bool(true));
//! query.insert("cn".into(), Value::from("ops"));
//! let found = backend.find("group_find", "ops", &query).expect("query failed");
//!
//! if found.is_empty() {
//!     let mut args = AttributeMap::new();
//!     args.insert("gidnumber".into(), Value::from("1234"));
//!     backend.invoke("group_add", "ops", &args).expect("add failed");
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod types;

pub use backend::Backend;
pub use backend::cli::IpaCli;
pub use backend::memory::{Call, MemoryBackend};
pub use error::{Error, ErrorCategory, Result};
pub use types::{AttributeMap, Response, Value};
