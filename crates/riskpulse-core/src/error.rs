/// Errors that can occur across riskpulse.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary crate converts to `miette` diagnostics at the boundary.
///
/// Remote API failures are deliberately absent from most code paths: the
/// fetcher degrades them to empty results and only logs them.
///
/// # Examples
///
/// ```
/// use riskpulse_core::RiskError;
///
/// let err = RiskError::InvalidRepo("octocat".into());
/// assert!(err.to_string().contains("octocat"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum RiskError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Repository identifier is not of the form `owner/name`.
    #[error("invalid repository '{0}', expected owner/name")]
    #[diagnostic(
        code(riskpulse::invalid_repo),
        help("pass the repository as owner/name, e.g. rust-lang/cargo")
    )]
    InvalidRepo(String),

    /// Remote API client could not be constructed.
    #[error("GitHub error: {0}")]
    Github(String),

    /// History database failure.
    #[error("database error: {0}")]
    #[diagnostic(code(riskpulse::database))]
    Database(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: RiskError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn config_error_displays_message() {
        let err = RiskError::Config("bad value".into());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn invalid_repo_shows_input() {
        let err = RiskError::InvalidRepo("just-a-name".into());
        assert_eq!(
            err.to_string(),
            "invalid repository 'just-a-name', expected owner/name"
        );
    }
}
