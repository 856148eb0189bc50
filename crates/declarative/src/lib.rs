//! # Declarative
//!
//! Declarative reconciliation of hosted spaces.
//!
//! This crate compares a desired space configuration with the last recorded
//! snapshot, plans the minimal ordered list of remote mutations, and applies
//! them one at a time, stopping at the first failure.
//!
//! ## Core Concepts
//!
//! - **SpaceSpec**: The desired configuration of one space
//! - **SpaceState**: The snapshot recorded after the last reconciliation
//! - **ExecutionPlan**: An ordered list of [`MutationStep`]s
//! - **Executor**: Applies a plan, returning the partial snapshot on failure
//! - **Reconciler**: Create / read / update / delete / import entry points
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{Reconciler, SpaceSpec};
//! use declarative::mock::MockClient;
//!
//! let reconciler = Reconciler::new(MockClient::new());
//!
//! let mut spec = SpaceSpec::new("demo");
//! spec.private = Some(true);
//! spec.variables.insert("MODE".into(), "prod".into());
//!
//! let state = reconciler.create(&spec)?;
//!
//! spec.variables.insert("MODE".into(), "staging".into());
//! let state = match reconciler.update(&spec, state) {
//!     Ok(state) => state,
//!     // Persist the partial snapshot; the next update resumes from it.
//!     Err(e) => e.into_state(),
//! };
//! ```
//!
//! ## Provider Traits
//!
//! - [`SpaceClient`]: The remote management API
//! - [`ProgressCallback`]: Receives progress updates
//!
//! This allows the crate to be used without hard dependencies on a
//! specific HTTP client or terminal UI.

pub mod client;
pub mod context;
pub mod diff;
pub mod error;
pub mod executor;
pub mod lifecycle;
pub mod mock;
pub mod planner;
pub mod types;

// Re-export main types at crate root
pub use client::{SpaceClient, SpaceClientExt};
pub use context::{NoProgress, ProgressCallback, StepLog};
pub use diff::{FieldChange, KeyDiff, diff_keys, immutable_changes};
pub use error::{ApplyError, Error, ErrorCategory, Result, StepKind};
pub use executor::apply;
pub use lifecycle::{Preview, Reconciler};
pub use planner::{ExecutionPlan, MutationStep, plan};
pub use types::{
    Collection, KeyedValues, SpaceId, SpaceRecord, SpaceSpec, SpaceState, UNKNOWN_FINGERPRINT,
};
