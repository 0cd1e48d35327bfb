//! Wire types for the accessibility scan service.
//!
//! This crate contains the serde-serializable shapes exchanged with callers of
//! the scanner: the inbound [`ScanRequest`], the [`ScanReport`] returned on
//! success and the [`ErrorPayload`] returned on failure.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization and small derivations
//! * camelCase on the wire: Consumed directly by a browser UI
//! * Stable: Changes only when the report schema changes
//!
//! Scan orchestration, browser control and enrichment live in `a11y-runtime`
//! and `a11y-cli`.

pub mod error;
pub mod finding;
pub mod report;

pub use error::*;
pub use finding::*;
pub use report::*;
