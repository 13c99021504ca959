use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use riskpulse_core::{AuthorId, CommitRecord, FetchConfig, FileChange, RepoId, RiskError};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Anything that can list recent commits with their file changes.
///
/// The pipeline only sees this trait, so tests and demos can run
/// without the network.
pub trait CommitSource {
    /// Commits authored at or after `since`, each with its per-file changes.
    ///
    /// An empty result means "unknown", not "no activity": failed
    /// requests are indistinguishable from a quiet repository.
    fn fetch_commits(&self, repo: &RepoId, since: DateTime<Utc>) -> Vec<CommitRecord>;
}

/// Read a token from `GITHUB_TOKEN`, falling back to `GH_TOKEN`.
///
/// Empty values are treated as absent.
pub fn token_from_env() -> Option<String> {
    ["GITHUB_TOKEN", "GH_TOKEN"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.trim().is_empty())
}

/// GitHub REST client for commit listings and commit details.
///
/// Every request is a single blocking call with no retry. Transport
/// errors, non-success statuses, and undecodable bodies are logged and
/// treated as empty responses.
///
/// # Examples
///
/// ```no_run
/// use chrono::{Duration, Utc};
/// use riskpulse_core::{FetchConfig, RepoId};
/// use riskpulse_scan::github::{CommitSource, GitHubClient};
///
/// let client = GitHubClient::new(&FetchConfig::default(), None).unwrap();
/// let repo: RepoId = "rust-lang/cargo".parse().unwrap();
/// let commits = client.fetch_commits(&repo, Utc::now() - Duration::days(30));
/// println!("{} commits", commits.len());
/// ```
pub struct GitHubClient {
    http: Client,
    api_base: String,
    per_page: u32,
    token: Option<String>,
}

impl GitHubClient {
    /// Build a client from fetch configuration and an optional bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::Github`] if the HTTP client cannot be built.
    pub fn new(config: &FetchConfig, token: Option<String>) -> Result<Self, RiskError> {
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| RiskError::Github(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            per_page: config.per_page,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Option<T> {
        let mut request = self
            .http
            .get(url)
            .query(query)
            .header(ACCEPT, "application/vnd.github.v3+json");
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        tracing::debug!(url, "GET");
        let response = match request.send() {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url, error = %e, "request failed, treating as empty");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url, %status, "GitHub API returned non-success, treating as empty");
            return None;
        }

        match response.json::<T>() {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::warn!(url, error = %e, "undecodable response, treating as empty");
                None
            }
        }
    }

    fn list_commits(&self, repo: &RepoId, since: DateTime<Utc>) -> Vec<CommitSummary> {
        let url = format!("{}/repos/{}/{}/commits", self.api_base, repo.owner, repo.name);
        let query = [
            ("since", since.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("per_page", self.per_page.to_string()),
        ];
        self.get_json(&url, &query).unwrap_or_default()
    }

    fn commit_files(&self, repo: &RepoId, sha: &str) -> Vec<FileEntry> {
        let url = format!(
            "{}/repos/{}/{}/commits/{sha}",
            self.api_base, repo.owner, repo.name
        );
        self.get_json::<CommitDetail>(&url, &[])
            .map(|detail| detail.files)
            .unwrap_or_default()
    }
}

impl CommitSource for GitHubClient {
    fn fetch_commits(&self, repo: &RepoId, since: DateTime<Utc>) -> Vec<CommitRecord> {
        let summaries: Vec<CommitSummary> = self
            .list_commits(repo, since)
            .into_iter()
            .filter(|summary| match summary.authored_at() {
                Some(at) => at >= since,
                None => {
                    tracing::debug!(sha = %summary.sha, "commit has no author date, skipping");
                    false
                }
            })
            .collect();
        tracing::info!(repo = %repo, commits = summaries.len(), "listed commits");

        summaries
            .into_iter()
            .filter_map(|summary| {
                let files = self.commit_files(repo, &summary.sha);
                summary.into_record(files)
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct CommitSummary {
    sha: String,
    commit: CommitMeta,
    #[serde(default)]
    author: Option<Account>,
}

#[derive(Debug, Deserialize)]
struct CommitMeta {
    #[serde(default)]
    author: Option<Signature>,
}

#[derive(Debug, Deserialize)]
struct Signature {
    date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct Account {
    login: String,
}

#[derive(Debug, Default, Deserialize)]
struct CommitDetail {
    #[serde(default)]
    files: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    filename: String,
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
}

impl CommitSummary {
    fn authored_at(&self) -> Option<DateTime<Utc>> {
        self.commit.author.as_ref().map(|signature| signature.date)
    }

    fn into_record(self, files: Vec<FileEntry>) -> Option<CommitRecord> {
        let signature = self.commit.author?;
        let author = self
            .author
            .map_or(AuthorId::Unknown, |account| AuthorId::Login(account.login));

        Some(CommitRecord {
            id: self.sha,
            author,
            timestamp: signature.date,
            files: files
                .into_iter()
                .map(|f| FileChange {
                    path: f.filename,
                    lines_added: f.additions,
                    lines_removed: f.deletions,
                })
                .collect(),
        })
    }
}
