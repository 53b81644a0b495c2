//! Backend abstraction for directory operations.
//!
//! The [`Backend`] trait is the whole remote surface the reconciler needs:
//! one call to run a named command against a target and one to query for
//! entries. Two implementations ship with the crate:
//! - [`cli::IpaCli`] drives the `ipa` command-line client
//! - [`memory::MemoryBackend`] keeps groups in process, for tests and dry runs

pub mod cli;
pub mod memory;

use crate::error::Result;
use crate::types::{AttributeMap, Response};

/// Backend trait for directory commands.
pub trait Backend: Send + Sync {
    /// Run a mutating command (e.g. `group_add`) against `target`.
    fn invoke(&self, command: &str, target: &str, args: &AttributeMap) -> Result<Response>;

    /// Run a query command (e.g. `group_find`) and return every matching entry.
    fn find(&self, command: &str, target: &str, args: &AttributeMap) -> Result<Vec<AttributeMap>>;
}

impl<B: Backend + ?Sized> Backend for &B {
    fn invoke(&self, command: &str, target: &str, args: &AttributeMap) -> Result<Response> {
        (**self).invoke(command, target, args)
    }

    fn find(&self, command: &str, target: &str, args: &AttributeMap) -> Result<Vec<AttributeMap>> {
        (**self).find(command, target, args)
    }
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn invoke(&self, command: &str, target: &str, args: &AttributeMap) -> Result<Response> {
        (**self).invoke(command, target, args)
    }

    fn find(&self, command: &str, target: &str, args: &AttributeMap) -> Result<Vec<AttributeMap>> {
        (**self).find(command, target, args)
    }
}
