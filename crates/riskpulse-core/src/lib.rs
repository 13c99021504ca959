//! Core types, configuration, and error handling for riskpulse.
//!
//! This crate provides the shared foundation used by all other riskpulse crates:
//! - [`RiskError`] — unified error type using `thiserror`
//! - [`RiskConfig`] — configuration loaded from `.riskpulse.toml`
//! - Shared types: [`CommitRecord`], [`FileChange`], [`AuthorId`],
//!   [`FileStats`], [`Band`], [`ScoreResult`], [`HistoryEntry`], [`RepoId`],
//!   [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{FetchConfig, OutputConfig, PolicyConfig, RiskConfig};
pub use error::RiskError;
pub use types::{
    AuthorId, Band, CommitRecord, FileChange, FileStats, HistoryEntry, OutputFormat, RepoId,
    ScoreResult, MAX_SCORE,
};

/// A convenience `Result` type for riskpulse operations.
pub type Result<T> = std::result::Result<T, RiskError>;
