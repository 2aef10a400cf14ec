//! # dockapi Common Utilities (`common`)
//!
//! File: gateway/src/common/mod.rs
//!
//! ## Overview
//!
//! Shared plumbing used by the HTTP layer:
//!
//! - **`deadline`**: Bounded-duration scopes every engine call runs inside.
//! - **`engine`**: The `Engine` adapter trait, its failure type and the
//!   bollard-backed implementation.
//!
//! ```rust
//! use dockapi::common::deadline::{DeadlineManager, DeadlinePolicy, OperationClass};
//!
//! let deadlines = DeadlineManager::new(DeadlinePolicy::default());
//! let scope = deadlines.open(OperationClass::Control);
//! assert!(!scope.is_expired());
//! ```
//!

/// Per-call deadline scopes and their ledger.
pub mod deadline;
/// The engine client adapter (`Engine` trait, `DockerEngine`, failures).
pub mod engine;
