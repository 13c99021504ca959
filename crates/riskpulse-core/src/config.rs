use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RiskError;

/// Top-level configuration loaded from `.riskpulse.toml`.
///
/// Supports layered resolution: CLI flags > env vars > local config > defaults.
///
/// # Examples
///
/// ```
/// use riskpulse_core::RiskConfig;
///
/// let config = RiskConfig::default();
/// assert_eq!(config.fetch.window_days, 30);
/// assert!(config.policy.exclude.contains(&"vendor".to_string()));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Remote API settings.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Path matching policy for exclusion and core-system detection.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Where reports and history are written.
    #[serde(default)]
    pub output: OutputConfig,
}

impl RiskConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::Io`] if the file cannot be read, or
    /// [`RiskError::Toml`] if the content is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, RiskError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::Toml`] if parsing fails, or [`RiskError::Config`]
    /// if a value is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use riskpulse_core::RiskConfig;
    ///
    /// let toml = r#"
    /// [fetch]
    /// window_days = 14
    /// "#;
    /// let config = RiskConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.fetch.window_days, 14);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, RiskError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), RiskError> {
        if self.fetch.window_days == 0 {
            return Err(RiskError::Config(
                "fetch.window_days must be at least 1".into(),
            ));
        }
        if self.fetch.per_page == 0 || self.fetch.per_page > 100 {
            return Err(RiskError::Config(format!(
                "fetch.per_page must be between 1 and 100, got {}",
                self.fetch.per_page
            )));
        }
        Ok(())
    }
}

/// Remote API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Base URL of the REST API (default: `https://api.github.com`).
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Trailing window of commit history in days (default: 30).
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    /// Commits requested from the single listing page (default: 100).
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// `User-Agent` header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_api_base() -> String {
    "https://api.github.com".into()
}

fn default_window_days() -> u32 {
    30
}

fn default_per_page() -> u32 {
    100
}

fn default_user_agent() -> String {
    "riskpulse".into()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            window_days: default_window_days(),
            per_page: default_per_page(),
            user_agent: default_user_agent(),
        }
    }
}

/// Substring policies applied to file paths.
///
/// Both lists are ordered and matched with plain substring containment.
///
/// # Examples
///
/// ```
/// use riskpulse_core::PolicyConfig;
///
/// let policy = PolicyConfig::default();
/// assert!(policy.is_excluded("tests/login_test.py"));
/// assert!(policy.is_excluded("README.md"));
/// assert!(!policy.is_excluded("src/auth/login.py"));
/// assert!(policy.is_core("src/auth/login.py"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Paths containing any of these substrings are ignored entirely.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
    /// Paths containing any of these substrings count as core system code.
    #[serde(default = "default_core_paths")]
    pub core_paths: Vec<String>,
}

fn default_exclude() -> Vec<String> {
    ["test", "vendor", "node_modules", ".md", ".json", ".lock"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_core_paths() -> Vec<String> {
    ["src/auth", "src/api", "middleware", "services"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl PolicyConfig {
    /// Whether `path` matches any exclusion substring.
    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclude.iter().any(|pat| path.contains(pat.as_str()))
    }

    /// Whether `path` lives under a configured core system location.
    pub fn is_core(&self, path: &str) -> bool {
        self.core_paths.iter().any(|pat| path.contains(pat.as_str()))
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            exclude: default_exclude(),
            core_paths: default_core_paths(),
        }
    }
}

/// Output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// HTML report path, overwritten on every run (default: `risk_report.html`).
    #[serde(default = "default_report_path")]
    pub report_path: PathBuf,
    /// SQLite history database (default: `.github/risk_scoring.db`).
    #[serde(default = "default_history_db")]
    pub history_db: PathBuf,
}

fn default_report_path() -> PathBuf {
    PathBuf::from("risk_report.html")
}

fn default_history_db() -> PathBuf {
    PathBuf::from(".github/risk_scoring.db")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_path: default_report_path(),
            history_db: default_history_db(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = RiskConfig::default();
        assert_eq!(config.fetch.api_base, "https://api.github.com");
        assert_eq!(config.fetch.window_days, 30);
        assert_eq!(config.fetch.per_page, 100);
        assert_eq!(config.fetch.user_agent, "riskpulse");
        assert_eq!(config.policy.exclude.len(), 6);
        assert_eq!(
            config.policy.core_paths,
            vec!["src/auth", "src/api", "middleware", "services"]
        );
        assert_eq!(config.output.report_path, PathBuf::from("risk_report.html"));
        assert_eq!(
            config.output.history_db,
            PathBuf::from(".github/risk_scoring.db")
        );
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = RiskConfig::from_toml("").unwrap();
        assert_eq!(config.fetch.window_days, 30);
        assert_eq!(config.policy.core_paths.len(), 4);
    }

    #[test]
    fn parse_policy_overrides() {
        let toml = r#"
[policy]
exclude = ["fixtures/", ".snap"]
core_paths = ["kernel/"]

[output]
report_path = "out/report.html"
"#;
        let config = RiskConfig::from_toml(toml).unwrap();
        assert_eq!(config.policy.exclude, vec!["fixtures/", ".snap"]);
        assert!(config.policy.is_core("kernel/sched.c"));
        assert!(!config.policy.is_core("src/auth/login.py"));
        assert!(!config.policy.is_excluded("tests/unit.rs"));
        assert_eq!(config.output.report_path, PathBuf::from("out/report.html"));
        assert_eq!(config.fetch.per_page, 100);
    }

    #[test]
    fn zero_window_is_rejected() {
        let result = RiskConfig::from_toml("[fetch]\nwindow_days = 0\n");
        assert!(matches!(result, Err(RiskError::Config(_))));
    }

    #[test]
    fn oversized_page_is_rejected() {
        let result = RiskConfig::from_toml("[fetch]\nper_page = 250\n");
        assert!(matches!(result, Err(RiskError::Config(_))));
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = RiskConfig::from_toml("{{invalid}}");
        assert!(matches!(result, Err(RiskError::Toml(_))));
    }

    #[test]
    fn exclusion_is_substring_based() {
        let policy = PolicyConfig::default();
        assert!(policy.is_excluded("src/latest_results.py"));
        assert!(policy.is_excluded("package.json"));
        assert!(policy.is_excluded("Cargo.lock"));
        assert!(policy.is_excluded("third_party/vendor/lib.c"));
        assert!(!policy.is_excluded("src/main.rs"));
    }
}
