//! Client configuration and credential loading.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default catalog service address.
pub const DEFAULT_BASE_URL: &str = "https://www.space-track.org";

/// Default credentials file, read relative to the working directory.
pub const DEFAULT_CREDENTIALS_PATH: &str = "STCredentials.toml";

/// Section of the credentials file holding `username` and `password`.
pub const CREDENTIALS_SECTION: &str = "configuration";

/// Connection settings for [`SpaceTrackClient`](crate::session::SpaceTrackClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Scheme and host of the catalog service, without a trailing slash.
    pub base_url: String,
    /// Path of the form-login endpoint.
    pub login_path: String,
    /// Upper bound for each HTTP request, including reading the body.
    pub request_timeout: Duration,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            login_path: "/ajaxauth/login".to_string(),
            request_timeout: Duration::from_secs(30),
            user_agent: concat!("spacetrack-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Config pointing at another service address, e.g. a local mock.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Absolute URL of the login endpoint.
    #[must_use]
    pub fn login_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.login_path)
    }

    /// Absolute URL for a compiled query path.
    ///
    /// Spaces and `<`/`>` in the path are percent-encoded here.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if the result is not a valid
    /// absolute URL.
    pub fn query_url(&self, path: &str) -> Result<reqwest::Url, ConfigError> {
        let raw = format!("{}{path}", self.base_url.trim_end_matches('/'));
        reqwest::Url::parse(&raw).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Configuration errors. Always raised before a session is opened.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid service address {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("cannot build HTTP client: {reason}")]
    HttpClient { reason: String },
    #[error("cannot read credentials file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse credentials file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("credentials file {path} has no [{section}] section")]
    MissingSection { path: PathBuf, section: String },
    #[error("credentials file {path} has no string `{key}` in [{section}]")]
    MissingKey {
        path: PathBuf,
        section: String,
        key: &'static str,
    },
}

/// Account used for the form login.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Source of login credentials, consulted once per query.
pub trait CredentialSource: Send + Sync {
    /// Loads the current credentials.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the credentials are missing or unreadable.
    fn load_credentials(&self) -> Result<Credentials, ConfigError>;
}

/// Credentials held in memory (environment variables, tests).
#[derive(Debug, Clone)]
pub struct StaticCredentials(pub Credentials);

impl CredentialSource for StaticCredentials {
    fn load_credentials(&self) -> Result<Credentials, ConfigError> {
        Ok(self.0.clone())
    }
}

/// Credentials read from a TOML file on every load:
///
/// ```toml
/// [configuration]
/// username = "user@example.com"
/// password = "secret"
/// ```
#[derive(Debug, Clone)]
pub struct FileCredentials {
    path: PathBuf,
    section: String,
}

impl FileCredentials {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            section: CREDENTIALS_SECTION.to_string(),
        }
    }

    /// Reads from `section` instead of `[configuration]`.
    #[must_use]
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileCredentials {
    fn default() -> Self {
        Self::new(DEFAULT_CREDENTIALS_PATH)
    }
}

impl CredentialSource for FileCredentials {
    fn load_credentials(&self) -> Result<Credentials, ConfigError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;
        let doc: toml::Table = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })?;

        let section = doc
            .get(&self.section)
            .and_then(toml::Value::as_table)
            .ok_or_else(|| ConfigError::MissingSection {
                path: self.path.clone(),
                section: self.section.clone(),
            })?;
        let key = |key: &'static str| {
            section
                .get(key)
                .and_then(toml::Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| ConfigError::MissingKey {
                    path: self.path.clone(),
                    section: self.section.clone(),
                    key,
                })
        };

        Ok(Credentials {
            username: key("username")?,
            password: key("password")?,
        })
    }
}
