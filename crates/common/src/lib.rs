//! Common types and utilities for fairval
//!
//! This crate provides the shared domain model that flows through the
//! valuation pipeline, the fatal error type, the recoverable issue type,
//! and the JSON wire shapes exchanged with the remote scoring service.
//!
//! # Modules
//!
//! - [`error`] - Fatal error type
//! - [`types`] - Domain types (Ticker, RawRecord, MergedRecord, ConsensusRecord, ...)
//! - [`issue`] - Recoverable per-adapter/strategy/ticker/sink issues
//! - [`fields`] - Canonical fundamental field names
//! - [`protocol`] - Remote scoring request/response shapes

pub mod error;
pub mod fields;
pub mod issue;
pub mod protocol;
pub mod types;

pub use error::{Error, Result};
pub use issue::{Issue, IssueKind};
pub use types::*;
