//! Single-pass scan: fetch → aggregate → score → persist.
//!
//! Rendering is left to the caller so the same outcome can be written as
//! HTML, printed as JSON, or both.

use chrono::{DateTime, Duration, Utc};
use riskpulse_core::{Band, HistoryEntry, PolicyConfig, RepoId, RiskError, ScoreResult};
use riskpulse_gitpulse::churn::aggregate_churn;
use riskpulse_gitpulse::scoring::{score_all, ScoringContext};
use riskpulse_history::store::HistoryStore;
use serde::Serialize;

use crate::github::CommitSource;

/// Consecutive runs in the critical band needed to raise an alert.
pub const ALERT_STREAK: usize = 2;

/// Inputs for one scan.
pub struct ScanRequest<'a> {
    pub repo: &'a RepoId,
    pub window_days: u32,
    pub policy: &'a PolicyConfig,
    /// Run timestamp; every history row of the run carries it.
    pub now: DateTime<Utc>,
}

/// Result of a completed scan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    /// Repository label, `owner/name`.
    pub repo: String,
    pub generated_at: DateTime<Utc>,
    /// Commits returned by the fetcher.
    pub commits_analyzed: usize,
    /// One row per qualifying file, in first-seen order.
    pub rows: Vec<ScoreResult>,
    /// Files critical in this run and the one before it.
    pub alerts: Vec<String>,
}

/// What a scan produced.
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    /// No file survived exclusion filtering. Nothing was recorded.
    NoActivity {
        /// Commits returned by the fetcher.
        commits: usize,
    },
    /// Files were scored and recorded.
    Scored(ScanReport),
}

/// Run the full pipeline against `source`, recording into `store`.
///
/// All history writes happen in one batch committed at the end; an error
/// part-way leaves the store untouched.
///
/// # Errors
///
/// Returns [`RiskError::Database`] if history cannot be written. Remote
/// failures are not errors; they surface as [`ScanOutcome::NoActivity`]
/// or as missing file changes.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use riskpulse_core::{PolicyConfig, RepoId};
/// use riskpulse_history::store::HistoryStore;
/// use riskpulse_scan::demo::DemoSource;
/// use riskpulse_scan::pipeline::{run_scan, ScanOutcome, ScanRequest};
///
/// let mut store = HistoryStore::in_memory().unwrap();
/// let repo: RepoId = "demo/sample".parse().unwrap();
/// let policy = PolicyConfig::default();
/// let now = Utc::now();
/// let request = ScanRequest { repo: &repo, window_days: 30, policy: &policy, now };
/// let outcome = run_scan(&DemoSource::new(now), &mut store, &request).unwrap();
/// assert!(matches!(outcome, ScanOutcome::Scored(_)));
/// ```
pub fn run_scan(
    source: &dyn CommitSource,
    store: &mut HistoryStore,
    request: &ScanRequest<'_>,
) -> Result<ScanOutcome, RiskError> {
    let since = request.now - Duration::days(i64::from(request.window_days));
    let commits = source.fetch_commits(request.repo, since);

    let stats = aggregate_churn(&commits, request.policy);
    if stats.is_empty() {
        tracing::info!(repo = %request.repo, commits = commits.len(), "no qualifying files");
        return Ok(ScanOutcome::NoActivity {
            commits: commits.len(),
        });
    }

    let ctx = ScoringContext::build(&stats, &commits, request.now, request.policy);
    let rows = score_all(&stats, &ctx);
    let alerts = record_and_alert(store, &rows, request.now)?;

    tracing::info!(
        repo = %request.repo,
        files = rows.len(),
        alerts = alerts.len(),
        "scan complete"
    );

    Ok(ScanOutcome::Scored(ScanReport {
        repo: request.repo.to_string(),
        generated_at: request.now,
        commits_analyzed: commits.len(),
        rows,
        alerts,
    }))
}

/// Append one history row per result and collect repeat-critical paths.
///
/// Each row is written before its streak is read, so the current run
/// counts as one of the two most recent entries.
///
/// # Errors
///
/// Returns [`RiskError::Database`] on any write or query failure; the
/// batch is rolled back.
pub fn record_and_alert(
    store: &mut HistoryStore,
    rows: &[ScoreResult],
    now: DateTime<Utc>,
) -> Result<Vec<String>, RiskError> {
    let mut batch = store.begin()?;
    let mut alerts = Vec::new();

    for row in rows {
        batch.record(&HistoryEntry::from_score(row, now))?;
        if row.band == Band::Critical && batch.streak(&row.path, Band::Critical)? >= ALERT_STREAK {
            alerts.push(row.path.clone());
        }
    }

    batch.commit()?;
    Ok(alerts)
}
