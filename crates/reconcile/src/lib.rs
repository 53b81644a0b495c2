//! # reconcile
//!
//! Declarative reconciliation of directory groups.
//!
//! Given the desired state of one or more groups, this crate fetches what
//! the backend currently holds, works out the smallest set of commands that
//! closes the gap, and runs them in order.
//!
//! ## Core Concepts
//!
//! - **ReconciliationRequest**: Desired state (`present`/`absent`) at group or member level
//! - **MembershipDelta**: Per-relation additions and removals
//! - **ExecutionPlan**: Ordered operations for every target
//! - **Executor**: Applies operations, stopping at the first failure
//!
//! ## Example
//!
//! ```no_run
//! use ipakit::IpaCli;
//! use krbsession::SessionManager;
//! use reconcile::{ExecuteOptions, NoProgress, ReconciliationRequest, reconcile};
//!
//! let request = ReconciliationRequest {
//!     names: vec!["ops".into()],
//!     password: Some("Secret123".into()),
//!     ..Default::default()
//! };
//!
//! let manager = SessionManager::new();
//! let result = reconcile(
//!     &request,
//!     &ExecuteOptions::default(),
//!     |principal, password| manager.acquire(principal, password),
//!     |session| IpaCli::new(session.ccache()),
//!     &mut NoProgress,
//! )?;
//! println!("changed: {}", result.changed);
//! # Ok::<(), reconcile::Error>(())
//! ```
//!
//! ## Provider Traits
//!
//! - [`ipakit::Backend`]: runs commands and queries
//! - [`ProgressCallback`]: receives progress updates

pub mod context;
pub mod diff;
pub mod engine;
pub mod error;
pub mod executor;
pub mod fetch;
pub mod planner;
pub mod request;
pub mod types;

// Re-export main types at crate root
pub use context::{NoProgress, ProgressCallback};
pub use diff::{MembershipDelta, MembershipMode, Relation, RelationDelta, attributes_match};
pub use engine::{apply, reconcile};
pub use error::{Error, Result};
pub use executor::execute;
pub use fetch::fetch;
pub use planner::{ExecutionPlan, plan, plan_target};
pub use request::{GroupAttributes, Members, ReconciliationRequest};
pub use types::{
    Action, CommandKind, ExecuteOptions, ExecuteSummary, Operation, ReconciliationResult, State,
};
