//! # vintagedb
//!
//! A reference in-memory time-series provider with revision/vintage
//! semantics and optimistic-concurrency editing.
//!
//! Given a series name, vintagedb returns a time series (values plus typed
//! metadata), optionally at a point-in-time vintage, as the n-th
//! historical release, or as its complete revision history. It also exposes
//! a hierarchical browse tree, free-text search over series descriptions,
//! and create/replace/delete protected by last-modified timestamps.
//!
//! ## Architecture
//!
//! - **Store**: one in-memory store owns all mutable state (records,
//!   revision ledgers, browse tree, listings) behind a single exclusive
//!   lock; every operation is one critical section
//! - **Revision ledger**: two independent views over one history, vintages
//!   ("what did we know as of time T") and releases ("the k-th published
//!   update"), distinguished by explicit type tags in response metadata
//! - **API**: a thin axum adapter that maps HTTP to store operations and
//!   converts typed metadata to JSON at the boundary
//!
//! The store is volatile: seeded at startup, gone at process exit.

pub mod api;
pub mod capabilities;
pub mod clock;
pub mod config;
pub mod model;
pub mod store;
pub mod telemetry;

mod error;

pub use error::{Error, Result};
