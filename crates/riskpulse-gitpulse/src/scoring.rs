//! Heuristic risk scoring.
//!
//! Six independent rules each add one or two points and a reason:
//!
//! | Rule | Points | Reason |
//! |---|---|---|
//! | churn above the mean | 2 | `High churn` |
//! | in the top 20% by churn | 1 | `Top 20% churn` |
//! | more than 5 commits | 1 | `Active (>5 commits)` |
//! | 2+ commits in the last 24 h | 1 | `24 h spike` |
//! | path under a core location | 1 | `Core system` |
//! | exactly one author | 1 | `Single author` |

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use riskpulse_core::{Band, CommitRecord, FileStats, PolicyConfig, ScoreResult};

use crate::churn::recent_touches;

const ACTIVE_COMMIT_THRESHOLD: u32 = 5;
const SPIKE_COMMIT_THRESHOLD: usize = 2;

/// Global aggregates every file is scored against.
pub struct ScoringContext<'a> {
    /// Mean churn across all scored files.
    pub mean_churn: f64,
    /// Paths in the top 20% by churn.
    pub top_churn: HashSet<String>,
    /// Distinct commits per path within the trailing 24 hours.
    pub recent_touches: HashMap<String, usize>,
    /// Core-system path policy.
    pub policy: &'a PolicyConfig,
}

impl<'a> ScoringContext<'a> {
    /// Derive the global aggregates from the full file set and commit list.
    pub fn build(
        stats: &[FileStats],
        commits: &[CommitRecord],
        now: DateTime<Utc>,
        policy: &'a PolicyConfig,
    ) -> Self {
        Self {
            mean_churn: mean_churn(stats),
            top_churn: top_churn(stats),
            recent_touches: recent_touches(commits, now),
            policy,
        }
    }
}

/// Arithmetic mean of churn, or `0.0` for no files.
pub fn mean_churn(stats: &[FileStats]) -> f64 {
    if stats.is_empty() {
        return 0.0;
    }
    let total: u64 = stats.iter().map(|s| s.churn).sum();
    total as f64 / stats.len() as f64
}

/// Number of files in the top-churn set for `file_count` files.
///
/// # Examples
///
/// ```
/// use riskpulse_gitpulse::scoring::top_churn_size;
///
/// assert_eq!(top_churn_size(1), 1);
/// assert_eq!(top_churn_size(4), 1);
/// assert_eq!(top_churn_size(10), 2);
/// assert_eq!(top_churn_size(14), 2);
/// ```
pub fn top_churn_size(file_count: usize) -> usize {
    (file_count / 5).max(1)
}

/// Paths of the highest-churn files.
///
/// Sorting is stable, so equal churn keeps the input order.
pub fn top_churn(stats: &[FileStats]) -> HashSet<String> {
    if stats.is_empty() {
        return HashSet::new();
    }
    let mut ranked: Vec<&FileStats> = stats.iter().collect();
    ranked.sort_by(|a, b| b.churn.cmp(&a.churn));
    ranked
        .into_iter()
        .take(top_churn_size(stats.len()))
        .map(|s| s.path.clone())
        .collect()
}

/// Score one file.
///
/// # Examples
///
/// ```
/// use std::collections::{BTreeSet, HashMap, HashSet};
/// use riskpulse_core::{AuthorId, Band, FileStats, PolicyConfig};
/// use riskpulse_gitpulse::scoring::{score_file, ScoringContext};
///
/// let policy = PolicyConfig::default();
/// let ctx = ScoringContext {
///     mean_churn: 10.0,
///     top_churn: HashSet::new(),
///     recent_touches: HashMap::new(),
///     policy: &policy,
/// };
/// let stats = FileStats {
///     path: "src/auth/session.rs".into(),
///     churn: 50,
///     commit_count: 2,
///     distinct_authors: BTreeSet::from([AuthorId::login("a"), AuthorId::login("b")]),
/// };
/// let result = score_file(&stats, &ctx);
/// assert_eq!(result.score, 3);
/// assert_eq!(result.band, Band::Watch);
/// assert_eq!(result.reasons, vec!["High churn", "Core system"]);
/// ```
pub fn score_file(stats: &FileStats, ctx: &ScoringContext<'_>) -> ScoreResult {
    let mut score = 0;
    let mut reasons = Vec::new();
    let mut hit = |points: u32, reason: &str| {
        score += points;
        reasons.push(reason.to_string());
    };

    if stats.churn as f64 > ctx.mean_churn {
        hit(2, "High churn");
    }
    if ctx.top_churn.contains(&stats.path) {
        hit(1, "Top 20% churn");
    }

    if stats.commit_count > ACTIVE_COMMIT_THRESHOLD {
        hit(1, "Active (>5 commits)");
    }
    let recent = ctx.recent_touches.get(&stats.path).copied().unwrap_or(0);
    if recent >= SPIKE_COMMIT_THRESHOLD {
        hit(1, "24 h spike");
    }

    if ctx.policy.is_core(&stats.path) {
        hit(1, "Core system");
    }

    if stats.is_single_author() {
        hit(1, "Single author");
    }

    ScoreResult {
        path: stats.path.clone(),
        score,
        band: Band::from_score(score),
        reasons,
    }
}

/// Score every file, preserving input order.
pub fn score_all(stats: &[FileStats], ctx: &ScoringContext<'_>) -> Vec<ScoreResult> {
    stats.iter().map(|s| score_file(s, ctx)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use riskpulse_core::{AuthorId, FileChange};
    use std::collections::BTreeSet;

    fn stats(path: &str, churn: u64, commits: u32, single_author: bool) -> FileStats {
        let authors = if single_author {
            BTreeSet::from([AuthorId::login("alice")])
        } else {
            BTreeSet::from([AuthorId::login("alice"), AuthorId::login("bob")])
        };
        FileStats {
            path: path.into(),
            churn,
            commit_count: commits,
            distinct_authors: authors,
        }
    }

    fn no_core() -> PolicyConfig {
        PolicyConfig {
            exclude: vec![],
            core_paths: vec![],
        }
    }

    #[test]
    fn five_file_example_flags_the_hot_file_critical() {
        let files = vec![
            stats("a.rs", 50, 4, true),
            stats("b.rs", 40, 3, false),
            stats("c.rs", 10, 2, true),
            stats("d.rs", 5, 1, false),
            stats("e.rs", 100, 6, true),
        ];
        let policy = no_core();
        let ctx = ScoringContext::build(&files, &[], Utc::now(), &policy);
        assert_eq!(ctx.mean_churn, 41.0);
        assert_eq!(ctx.top_churn, HashSet::from(["e.rs".to_string()]));

        let results = score_all(&files, &ctx);
        let hot = &results[4];
        assert_eq!(hot.score, 5);
        assert_eq!(hot.band, Band::Critical);
        assert_eq!(
            hot.reasons,
            vec!["High churn", "Top 20% churn", "Active (>5 commits)", "Single author"]
        );

        // 50 > 41: high churn plus single author.
        assert_eq!(results[0].score, 3);
        assert_eq!(results[0].band, Band::Watch);
        // 40 < 41 and two authors: nothing fires.
        assert_eq!(results[1].score, 0);
        assert_eq!(results[1].band, Band::Normal);
    }

    #[test]
    fn above_mean_always_contributes_two_points() {
        let files = vec![stats("x.rs", 11, 1, false), stats("y.rs", 9, 1, false)];
        let policy = no_core();
        let mut ctx = ScoringContext::build(&files, &[], Utc::now(), &policy);
        ctx.top_churn.clear();
        let result = score_file(&files[0], &ctx);
        assert_eq!(result.score, 2);
        assert_eq!(result.reasons, vec!["High churn"]);
    }

    #[test]
    fn churn_equal_to_mean_is_not_high() {
        let files = vec![stats("x.rs", 10, 1, false), stats("y.rs", 10, 1, false)];
        let policy = no_core();
        let ctx = ScoringContext::build(&files, &[], Utc::now(), &policy);
        let result = score_file(&files[1], &ctx);
        assert!(!result.reasons.iter().any(|r| r == "High churn"));
    }

    #[test]
    fn top_churn_set_size_follows_file_count() {
        for n in 1..=4 {
            let files: Vec<_> = (0..n).map(|i| stats(&format!("f{i}"), i as u64, 1, true)).collect();
            assert_eq!(top_churn(&files).len(), 1, "n = {n}");
        }
        let files: Vec<_> = (0..12).map(|i| stats(&format!("f{i}"), i as u64, 1, true)).collect();
        assert_eq!(top_churn(&files).len(), 2);
        assert!(top_churn(&[]).is_empty());
    }

    #[test]
    fn top_churn_ties_keep_first_seen_order() {
        let files = vec![
            stats("first.rs", 30, 1, true),
            stats("second.rs", 30, 1, true),
            stats("third.rs", 30, 1, true),
        ];
        assert_eq!(top_churn(&files), HashSet::from(["first.rs".to_string()]));
    }

    #[test]
    fn spike_requires_two_recent_commits() {
        let now = Utc::now();
        let commit = |id: &str, hours: i64| CommitRecord {
            id: id.into(),
            author: AuthorId::login("alice"),
            timestamp: now - Duration::hours(hours),
            files: vec![FileChange {
                path: "src/hot.rs".into(),
                lines_added: 1,
                lines_removed: 0,
            }],
        };
        let files = vec![stats("src/hot.rs", 2, 2, false)];
        let policy = no_core();

        let one = ScoringContext::build(&files, &[commit("a", 1), commit("b", 48)], now, &policy);
        assert!(!score_file(&files[0], &one).reasons.contains(&"24 h spike".to_string()));

        let two = ScoringContext::build(&files, &[commit("a", 1), commit("b", 5)], now, &policy);
        assert!(score_file(&files[0], &two).reasons.contains(&"24 h spike".to_string()));
    }

    #[test]
    fn every_rule_firing_scores_seven() {
        let policy = PolicyConfig::default();
        let file = stats("src/api/routes.rs", 500, 9, true);
        let ctx = ScoringContext {
            mean_churn: 1.0,
            top_churn: HashSet::from([file.path.clone()]),
            recent_touches: HashMap::from([(file.path.clone(), 3)]),
            policy: &policy,
        };
        let result = score_file(&file, &ctx);
        assert_eq!(result.score, 7);
        assert_eq!(result.band, Band::Critical);
        assert_eq!(result.reasons.len(), 6);
    }

    #[test]
    fn scoring_is_deterministic() {
        let files = vec![stats("a.rs", 5, 7, true), stats("middleware/x.rs", 1, 1, false)];
        let policy = PolicyConfig::default();
        let now = Utc::now();
        let first = score_all(&files, &ScoringContext::build(&files, &[], now, &policy));
        let second = score_all(&files, &ScoringContext::build(&files, &[], now, &policy));
        assert_eq!(first, second);
    }
}
