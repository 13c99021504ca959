use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::RiskError;

/// Denominator shown next to every score in reports.
///
/// The rule set can sum to 7; the displayed scale and the band table are
/// kept as-is for consumers that already depend on them.
pub const MAX_SCORE: u32 = 6;

/// A repository identifier of the form `owner/name`.
///
/// # Examples
///
/// ```
/// use riskpulse_core::RepoId;
///
/// let repo: RepoId = "rust-lang/cargo".parse().unwrap();
/// assert_eq!(repo.owner, "rust-lang");
/// assert_eq!(repo.name, "cargo");
/// assert_eq!(repo.to_string(), "rust-lang/cargo");
///
/// assert!("cargo".parse::<RepoId>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    /// Account or organization that owns the repository.
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl FromStr for RepoId {
    type Err = RiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let Some((owner, name)) = trimmed.split_once('/') else {
            return Err(RiskError::InvalidRepo(s.to_string()));
        };
        let valid = |part: &str| !part.is_empty() && !part.contains(char::is_whitespace);
        if !valid(owner) || !valid(name) || name.contains('/') {
            return Err(RiskError::InvalidRepo(s.to_string()));
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Identity of a commit author.
///
/// Commits with no attributable account still count as one distinct
/// identity, [`AuthorId::Unknown`]. It never compares equal to a real
/// account, even one whose login is literally `"unknown"`.
///
/// # Examples
///
/// ```
/// use riskpulse_core::AuthorId;
///
/// let alice = AuthorId::login("alice");
/// assert_eq!(alice.to_string(), "alice");
/// assert_eq!(AuthorId::Unknown.to_string(), "unknown");
/// assert_ne!(AuthorId::login("unknown"), AuthorId::Unknown);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AuthorId {
    /// An account login on the hosting service.
    Login(String),
    /// No account could be attributed to the commit.
    Unknown,
}

impl AuthorId {
    /// Build an identity from an account login.
    pub fn login(name: impl Into<String>) -> Self {
        AuthorId::Login(name.into())
    }

    /// Display form; the sentinel renders as `"unknown"`.
    pub fn as_str(&self) -> &str {
        match self {
            AuthorId::Login(name) => name,
            AuthorId::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AuthorId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A single file change within a commit.
///
/// # Examples
///
/// ```
/// use riskpulse_core::FileChange;
///
/// let change = FileChange {
///     path: "src/main.rs".into(),
///     lines_added: 10,
///     lines_removed: 3,
/// };
/// assert_eq!(change.churn(), 13);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    /// File path relative to the repository root.
    pub path: String,
    /// Lines added in this commit.
    pub lines_added: u64,
    /// Lines removed in this commit.
    pub lines_removed: u64,
}

impl FileChange {
    /// Lines added plus lines removed.
    pub fn churn(&self) -> u64 {
        self.lines_added + self.lines_removed
    }
}

/// A commit as fetched from the remote API, with its per-file changes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    /// Opaque commit identifier (the SHA).
    pub id: String,
    /// Attributed author.
    pub author: AuthorId,
    /// Author timestamp.
    pub timestamp: DateTime<Utc>,
    /// Files touched by the commit, in API order.
    pub files: Vec<FileChange>,
}

/// Aggregated activity for one file across the window.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeSet;
/// use riskpulse_core::{AuthorId, FileStats};
///
/// let stats = FileStats {
///     path: "src/lib.rs".into(),
///     churn: 120,
///     commit_count: 3,
///     distinct_authors: BTreeSet::from([AuthorId::login("alice")]),
/// };
/// assert!(stats.is_single_author());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStats {
    /// File path relative to the repository root.
    pub path: String,
    /// Sum of lines added and removed.
    pub churn: u64,
    /// Number of qualifying commits touching the file.
    pub commit_count: u32,
    /// Every identity that touched the file.
    pub distinct_authors: BTreeSet<AuthorId>,
}

impl FileStats {
    /// Empty stats for `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            churn: 0,
            commit_count: 0,
            distinct_authors: BTreeSet::new(),
        }
    }

    /// Exactly one identity touched the file.
    pub fn is_single_author(&self) -> bool {
        self.distinct_authors.len() == 1
    }
}

/// Coarse risk bucket derived from a score.
///
/// # Examples
///
/// ```
/// use riskpulse_core::Band;
///
/// assert_eq!(Band::from_score(0), Band::Normal);
/// assert_eq!(Band::from_score(3), Band::Watch);
/// assert_eq!(Band::from_score(4), Band::High);
/// assert_eq!(Band::from_score(5), Band::Critical);
/// assert_eq!("critical".parse::<Band>().unwrap(), Band::Critical);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    /// Score 0–1.
    Normal,
    /// Score 2–3.
    Watch,
    /// Score 4.
    High,
    /// Score 5 and above.
    Critical,
}

impl Band {
    /// All bands, lowest first.
    pub const ALL: [Band; 4] = [Band::Normal, Band::Watch, Band::High, Band::Critical];

    /// Map a score onto its band.
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=1 => Band::Normal,
            2..=3 => Band::Watch,
            4 => Band::High,
            _ => Band::Critical,
        }
    }

    /// Lowercase name, as stored in the history table.
    pub fn as_str(self) -> &'static str {
        match self {
            Band::Normal => "normal",
            Band::Watch => "watch",
            Band::High => "high",
            Band::Critical => "critical",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Band {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(Band::Normal),
            "watch" => Ok(Band::Watch),
            "high" => Ok(Band::High),
            "critical" => Ok(Band::Critical),
            other => Err(format!("unknown band: {other}")),
        }
    }
}

/// Scored risk for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    /// File path relative to the repository root.
    pub path: String,
    /// Sum of triggered rule points.
    pub score: u32,
    /// Band derived from `score`.
    pub band: Band,
    /// One reason per triggered rule, in rule order.
    pub reasons: Vec<String>,
}

/// One persisted scoring run for a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub path: String,
    pub score: u32,
    pub band: Band,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    /// Snapshot a score at `timestamp`.
    pub fn from_score(result: &ScoreResult, timestamp: DateTime<Utc>) -> Self {
        Self {
            path: result.path.clone(),
            score: result.score,
            band: result.band,
            timestamp,
        }
    }
}

/// Output format for stdout summaries.
///
/// # Examples
///
/// ```
/// use riskpulse_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable summary lines.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
