//! Commit history analysis: churn aggregation and heuristic risk scoring.
//!
//! Folds fetched commits into per-file churn, commit counts, and author
//! sets, then applies a fixed rule set to score each file and assign a
//! risk band.

pub mod churn;
pub mod scoring;
