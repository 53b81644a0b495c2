//! Remote state fetching

use crate::error::{Error, Result};
use ipakit::{AttributeMap, Backend, Value};

/// Query command used to look groups up
pub const FIND_COMMAND: &str = "group_find";

/// Fetch the current entry for a group, or `None` if it does not exist.
///
/// Name uniqueness is expected but not enforced by the backend, so more
/// than one match is reported instead of picking one.
pub fn fetch<B: Backend + ?Sized>(backend: &B, name: &str) -> Result<Option<AttributeMap>> {
    let mut args = AttributeMap::new();
    args.insert("all".to_string(), Value::Bool(true));
    args.insert("cn".to_string(), Value::from(name));

    let mut found = backend.find(FIND_COMMAND, name, &args)?;
    match found.len() {
        0 => {
            log::debug!("Group {name} does not exist");
            Ok(None)
        }
        1 => Ok(found.pop()),
        n => {
            log::debug!("Group {name} matched {n} entries");
            Err(Error::AmbiguousEntity {
                name: name.to_string(),
            })
        }
    }
}
