//! Placer: policy-driven placement subsystem for a task-parallel runtime.
//!
//! # Overview
//!
//! A task-based runtime delegates its placement decisions (which processor
//! runs a task, which memory backs a region, how an index launch slices
//! across the machine) to pluggable, application-supplied policy objects
//! ("mappers"). Placer is the infrastructure around those policies:
//!
//! - **Call dispatch** ([`dispatch`]): every policy invocation flows through
//!   a dispatcher enforcing the policy's concurrency discipline. Blocking
//!   runtime services bracket themselves with explicit pause/resume
//!   checkpoints; control never leaves a policy method anywhere else.
//! - **Constraint algebra** ([`constraint`]): entailment and conflict
//!   relations over layout and execution constraints validate candidate
//!   placements structurally, without physical search.
//!
//! # Core Guarantees
//!
//! - **Serialized by default**: the serializing discipline admits one call
//!   at a time; reentrance is an explicit opt-in.
//! - **Cooperative preemption only**: calls suspend at declared blocking
//!   checkpoints, never involuntarily, and never get cancelled.
//! - **No hidden state**: everything a call may touch travels through its
//!   [`CallHandle`](dispatch::CallHandle); there are no ambient globals.
//! - **Pinned resources**: instances referenced during a call are protected
//!   by the context's ledger until released or the call finishes.
//! - **Structural validation**: constraint relations are pure case tables;
//!   they never throw and never search.
//!
//! # Module Structure
//!
//! - [`types`]: identifiers and kind enumerations
//! - [`constraint`]: constraint types, sets, and their relations
//! - [`policy`]: the policy trait and per-call input/output records
//! - [`dispatch`]: dispatcher, call contexts, and both disciplines
//! - [`runtime`]: the downward interface to the surrounding runtime
//! - [`wire`]: ordered byte-stream serialization boundary
//! - [`config`]: dispatcher configuration and env overrides
//! - [`error`]: error types

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

pub mod config;
pub mod constraint;
pub mod dispatch;
pub mod error;
pub mod policy;
pub mod runtime;
pub mod tracing_compat;
pub mod types;
pub mod wire;

#[cfg(test)]
pub mod test_utils;

pub use config::{ConfigError, DispatcherConfig};
pub use constraint::{
    ConstraintKind, ConstraintRef, ExecutionConstraintSet, LayoutConstraintSet,
};
pub use dispatch::{CallHandle, Dispatcher, DispatcherStats};
pub use error::{Error, ErrorCategory, Result};
pub use policy::PlacementPolicy;
pub use runtime::{ResumeReason, RuntimeInterface};
pub use types::{CallKind, SyncModel};
