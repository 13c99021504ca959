//! Built-in sample history for offline demos.
//!
//! Produces a fixed set of commits relative to a reference time so the
//! whole pipeline can run without network access. With the default
//! policy the sample yields one critical, one high, and three watch files;
//! the test and README changes are filtered out.

use chrono::{DateTime, Duration, Utc};
use riskpulse_core::{AuthorId, CommitRecord, FileChange, RepoId};

use crate::github::CommitSource;

/// Repository label used for demo runs.
pub const DEMO_REPO: &str = "demo/sample";

// (hours ago, author, [(path, added, removed)])
type SampleCommit = (i64, Option<&'static str>, &'static [(&'static str, u64, u64)]);

const SAMPLE: &[SampleCommit] = &[
    (2, Some("alice"), &[("utils/helpers.py", 120, 30), ("src/auth/login.py", 80, 20)]),
    (5, Some("alice"), &[("utils/helpers.py", 90, 10), ("src/auth/login.py", 60, 15)]),
    (30, Some("alice"), &[("utils/helpers.py", 40, 10), ("tests/test_login.py", 200, 0)]),
    (50, Some("bob"), &[("src/api/endpoints.py", 30, 10), ("middleware/cache.py", 10, 5)]),
    (70, Some("alice"), &[("utils/helpers.py", 30, 5), ("src/api/endpoints.py", 20, 5)]),
    (96, None, &[("src/api/endpoints.py", 15, 5), ("README.md", 40, 2)]),
    (120, Some("alice"), &[("utils/helpers.py", 25, 5), ("src/api/endpoints.py", 10, 10)]),
    (150, Some("bob"), &[("src/api/endpoints.py", 12, 3), ("middleware/cache.py", 8, 2)]),
    (200, Some("alice"), &[("utils/helpers.py", 20, 0), ("src/api/endpoints.py", 10, 0)]),
    (240, Some("alice"), &[("utils/helpers.py", 15, 5)]),
    (300, Some("carol"), &[("services/user.py", 6, 2), ("src/auth/login.py", 40, 10)]),
    (400, Some("alice"), &[("utils/helpers.py", 10, 0)]),
];

/// A [`CommitSource`] that serves the built-in sample.
pub struct DemoSource {
    anchor: DateTime<Utc>,
}

impl DemoSource {
    /// Sample commits are dated relative to `anchor`.
    pub fn new(anchor: DateTime<Utc>) -> Self {
        Self { anchor }
    }

    /// The demo repository identifier.
    pub fn repo() -> RepoId {
        RepoId {
            owner: "demo".into(),
            name: "sample".into(),
        }
    }

    fn commits(&self) -> Vec<CommitRecord> {
        SAMPLE
            .iter()
            .enumerate()
            .map(|(i, (hours_ago, author, files))| CommitRecord {
                id: format!("demo{i:04}"),
                author: author.map_or(AuthorId::Unknown, AuthorId::login),
                timestamp: self.anchor - Duration::hours(*hours_ago),
                files: files
                    .iter()
                    .map(|(path, added, removed)| FileChange {
                        path: (*path).to_string(),
                        lines_added: *added,
                        lines_removed: *removed,
                    })
                    .collect(),
            })
            .collect()
    }
}

impl CommitSource for DemoSource {
    fn fetch_commits(&self, _repo: &RepoId, since: DateTime<Utc>) -> Vec<CommitRecord> {
        self.commits()
            .into_iter()
            .filter(|c| c.timestamp >= since)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskpulse_core::{Band, PolicyConfig};
    use riskpulse_gitpulse::churn::aggregate_churn;
    use riskpulse_gitpulse::scoring::{score_all, ScoringContext};

    #[test]
    fn demo_repo_matches_label() {
        assert_eq!(DemoSource::repo().to_string(), DEMO_REPO);
    }

    #[test]
    fn sample_scores_cover_several_bands() {
        let now = Utc::now();
        let source = DemoSource::new(now);
        let commits = source.fetch_commits(&DemoSource::repo(), now - Duration::days(30));
        assert_eq!(commits.len(), SAMPLE.len());

        let policy = PolicyConfig::default();
        let stats = aggregate_churn(&commits, &policy);
        let paths: Vec<_> = stats.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "utils/helpers.py",
                "src/auth/login.py",
                "src/api/endpoints.py",
                "middleware/cache.py",
                "services/user.py",
            ]
        );

        let ctx = ScoringContext::build(&stats, &commits, now, &policy);
        let rows = score_all(&stats, &ctx);
        let bands: Vec<_> = rows.iter().map(|r| (r.score, r.band)).collect();
        assert_eq!(
            bands,
            vec![
                (6, Band::Critical),
                (4, Band::High),
                (2, Band::Watch),
                (2, Band::Watch),
                (2, Band::Watch),
            ]
        );
    }

    #[test]
    fn short_window_trims_sample() {
        let now = Utc::now();
        let commits = DemoSource::new(now).fetch_commits(&DemoSource::repo(), now - Duration::days(1));
        assert_eq!(commits.len(), 2);
    }
}
