//! Per-file churn aggregation.
//!
//! Reduces a commit list into one [`FileStats`] per distinct path, skipping
//! paths matched by the exclusion policy.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use riskpulse_core::{CommitRecord, FileStats, PolicyConfig};

/// Width of the spike-detection window.
pub const SPIKE_WINDOW_HOURS: i64 = 24;

/// Aggregate churn, commit counts, and author sets per file.
///
/// Files are returned in order of first appearance in `commits`. That
/// order is what the top-churn ranking falls back on for equal churn.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use riskpulse_core::{AuthorId, CommitRecord, FileChange, PolicyConfig};
/// use riskpulse_gitpulse::churn::aggregate_churn;
///
/// let commits = vec![CommitRecord {
///     id: "abc123".into(),
///     author: AuthorId::login("alice"),
///     timestamp: Utc::now(),
///     files: vec![
///         FileChange { path: "src/lib.rs".into(), lines_added: 10, lines_removed: 2 },
///         FileChange { path: "README.md".into(), lines_added: 5, lines_removed: 0 },
///     ],
/// }];
/// let stats = aggregate_churn(&commits, &PolicyConfig::default());
/// assert_eq!(stats.len(), 1);
/// assert_eq!(stats[0].churn, 12);
/// ```
pub fn aggregate_churn(commits: &[CommitRecord], policy: &PolicyConfig) -> Vec<FileStats> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut stats: Vec<FileStats> = Vec::new();

    for commit in commits {
        for file in &commit.files {
            if policy.is_excluded(&file.path) {
                continue;
            }
            let slot = *index.entry(file.path.clone()).or_insert_with(|| {
                stats.push(FileStats::new(file.path.clone()));
                stats.len() - 1
            });
            let entry = &mut stats[slot];
            entry.churn += file.churn();
            entry.commit_count += 1;
            entry.distinct_authors.insert(commit.author.clone());
        }
    }

    tracing::debug!(
        commits = commits.len(),
        files = stats.len(),
        "aggregated churn"
    );
    stats
}

/// Count distinct commits per path within the spike window ending at `now`.
///
/// A commit counts when its timestamp is strictly after `now - 24h`.
pub fn recent_touches(commits: &[CommitRecord], now: DateTime<Utc>) -> HashMap<String, usize> {
    let cutoff = now - Duration::hours(SPIKE_WINDOW_HOURS);
    let mut touched: HashMap<String, HashSet<&str>> = HashMap::new();

    for commit in commits.iter().filter(|c| c.timestamp > cutoff) {
        for file in &commit.files {
            touched
                .entry(file.path.clone())
                .or_default()
                .insert(commit.id.as_str());
        }
    }

    touched
        .into_iter()
        .map(|(path, ids)| (path, ids.len()))
        .collect()
}
