use std::env;
use std::time::Duration;

use prep_core::model::CategoryKind;
use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_AUTH_HEADER: &str = "token";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid backend url {raw}: {source}")]
    InvalidUrl {
        raw: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid PREP_HTTP_TIMEOUT_SECS value: {0}")]
    InvalidTimeout(String),
}

/// Route used to generate questions for one category kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryEndpoint {
    pub kind: CategoryKind,
    pub path: String,
}

/// Relative paths of every backend operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub generate: Vec<CategoryEndpoint>,
    pub validate: String,
    pub attempt: String,
    pub interview_answer: String,
    pub interview_finish: String,
    pub chat: String,
    pub report: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            generate: CategoryKind::ALL
                .into_iter()
                .map(|kind| CategoryEndpoint {
                    kind,
                    path: format!("/v1/ai/{kind}"),
                })
                .collect(),
            validate: "/v1/quiz/validate".into(),
            attempt: "/v1/quiz/attempt".into(),
            interview_answer: "/v1/interview/answer".into(),
            interview_finish: "/v1/interview/finish".into(),
            chat: "/v1/vectordb/chat".into(),
            report: "/v1/report/personalized".into(),
        }
    }
}

impl Endpoints {
    #[must_use]
    pub fn generate_path(&self, kind: CategoryKind) -> Option<&str> {
        self.generate
            .iter()
            .find(|endpoint| endpoint.kind == kind)
            .map(|endpoint| endpoint.path.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: Url,
    pub auth_header: String,
    pub timeout: Duration,
    pub endpoints: Endpoints,
}

impl BackendConfig {
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if `base_url` does not parse.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url).map_err(|source| ConfigError::InvalidUrl {
            raw: base_url.to_owned(),
            source,
        })?;
        Ok(Self {
            base_url,
            auth_header: DEFAULT_AUTH_HEADER.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            endpoints: Endpoints::default(),
        })
    }

    /// Reads `PREP_BACKEND_URL`, `PREP_AUTH_HEADER` and `PREP_HTTP_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for an unparsable url or timeout.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = env::var("PREP_BACKEND_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let mut config = Self::new(&base_url)?;

        if let Ok(header) = env::var("PREP_AUTH_HEADER") {
            if !header.trim().is_empty() {
                config.auth_header = header.trim().to_owned();
            }
        }
        if let Ok(raw) = env::var("PREP_HTTP_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_auth_header(mut self, header: impl Into<String>) -> Self {
        self.auth_header = header.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Absolute url for a relative endpoint path, keeping any base path prefix.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
