//! Authenticated catalog sessions.
//!
//! Every call to [`SpaceTrackClient::execute`] opens its own [`Session`]: a
//! fresh cookie-carrying HTTP client that logs in, issues exactly one query,
//! and is dropped on every exit path. Nothing is shared between calls, so
//! concurrent queries each hold their own session.

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::{ClientConfig, ConfigError, Credentials};
use crate::error::QueryError;

/// Catalog client. Construct one per caller; it holds configuration only.
#[derive(Debug)]
pub struct SpaceTrackClient {
    config: ClientConfig,
    sessions_opened: AtomicU64,
}

impl SpaceTrackClient {
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            sessions_opened: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Number of sessions opened so far.
    #[must_use]
    pub fn sessions_opened(&self) -> u64 {
        self.sessions_opened.load(Ordering::Relaxed)
    }

    /// Logs in with `credentials`, then fetches the compiled query `path`.
    ///
    /// The login must succeed before the query is sent. A failed login
    /// returns [`QueryError::Authentication`] without issuing the query,
    /// whether the server rejected it or could not be reached.
    ///
    /// # Errors
    ///
    /// - [`QueryError::Configuration`] if the service address is invalid
    /// - [`QueryError::Authentication`] if the login does not succeed
    /// - [`QueryError::Retrieval`] if the query does not succeed
    /// - [`QueryError::InvalidResponse`] if the query body is not JSON
    pub async fn execute(&self, path: &str, credentials: &Credentials) -> Result<Value, QueryError> {
        let url = self.config.query_url(path)?;
        let session_id = self.sessions_opened.fetch_add(1, Ordering::Relaxed) + 1;
        let span = info_span!("spacetrack_session", session_id, path = %path);

        async move {
            let session = Session::open(&self.config, session_id)?;
            session.login(credentials).await?;
            session.fetch(path, url).await
        }
        .instrument(span)
        .await
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One login-then-query scope. Connections are released when it drops.
struct Session<'a> {
    http: reqwest::Client,
    config: &'a ClientConfig,
    id: u64,
}

impl<'a> Session<'a> {
    fn open(config: &'a ClientConfig, id: u64) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ConfigError::HttpClient {
                reason: e.to_string(),
            })?;
        debug!(session_id = id, "session opened");
        Ok(Self { http, config, id })
    }

    async fn login(&self, credentials: &Credentials) -> Result<(), QueryError> {
        let form = [
            ("identity", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
        ];
        let response = match self.http.post(self.config.login_url()).form(&form).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "login request failed");
                return Err(QueryError::Authentication { status: e.status() });
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "login rejected");
            return Err(QueryError::Authentication {
                status: Some(status),
            });
        }

        // The service answers a bad password with 200 and {"Login": "Failed"}.
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "login response unreadable");
                return Err(QueryError::Authentication {
                    status: Some(status),
                });
            }
        };
        if login_body_failed(&body) {
            warn!(%status, "login rejected by response body");
            return Err(QueryError::Authentication {
                status: Some(status),
            });
        }

        info!("logged in");
        Ok(())
    }

    async fn fetch(&self, path: &str, url: reqwest::Url) -> Result<Value, QueryError> {
        let retrieval = |status, source| QueryError::Retrieval {
            path: path.to_string(),
            status,
            source,
        };

        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "query request failed");
                return Err(retrieval(e.status(), Some(e)));
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "query rejected");
            return Err(retrieval(Some(status), None));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| retrieval(Some(status), Some(e)))?;
        let document: Value =
            serde_json::from_slice(&body).map_err(|source| QueryError::InvalidResponse {
                path: path.to_string(),
                source,
            })?;

        info!(
            records = document.as_array().map_or(0, Vec::len),
            bytes = body.len(),
            "query returned"
        );
        Ok(document)
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        debug!(session_id = self.id, "session closed");
    }
}

fn login_body_failed(body: &[u8]) -> bool {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("Login").and_then(Value::as_str).map(str::to_string))
        .is_some_and(|login| login.eq_ignore_ascii_case("failed"))
}
