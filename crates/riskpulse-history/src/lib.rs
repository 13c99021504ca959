//! Durable, append-only score history backed by SQLite.
//!
//! Every scoring run appends one row per file. The most recent rows per
//! file drive the consecutive-critical alert rule.

pub mod store;
