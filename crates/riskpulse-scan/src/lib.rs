//! Scan orchestration: fetch commits, score files, record history.
//!
//! Provides the GitHub commit fetcher, the single-pass scan pipeline,
//! and an offline sample data set for demos.

pub mod demo;
pub mod github;
pub mod pipeline;
