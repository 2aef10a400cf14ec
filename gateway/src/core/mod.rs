//! # dockapi Core Infrastructure
//!
//! File: gateway/src/core/mod.rs
//!
//! ## Overview
//!
//! Foundational pieces shared by the rest of the gateway:
//! - `config`: Configuration loading, merging, and validation
//! - `error`: The request failure taxonomy and startup error types
//!
//! ```rust
//! use dockapi::core::config; // For loading configuration
//! use dockapi::core::error::{ApiError, Result}; // For error handling
//! ```
//!
pub mod config;
pub mod error;
