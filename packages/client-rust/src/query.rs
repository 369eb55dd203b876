//! End-to-end query pipeline: compile, authenticate, retrieve, save.

use std::path::PathBuf;

use serde_json::Value;
use spacetrack_core::QueryRequest;
use tracing::{info_span, warn, Instrument};

use crate::config::CredentialSource;
use crate::error::QueryError;
use crate::persist::{persist, PersistError};
use crate::session::SpaceTrackClient;

/// What happened to the retrieved document after the query.
#[derive(Debug)]
pub enum Persistence {
    /// The request had `save_data` disabled.
    Skipped,
    /// The document was written to this path.
    Written(PathBuf),
    /// Writing failed; the document is still available in memory.
    Failed(PersistError),
}

/// Result of a successful retrieval.
#[derive(Debug)]
pub struct QueryOutcome {
    /// The catalog's response, unchanged.
    pub document: Value,
    pub persistence: Persistence,
}

impl QueryOutcome {
    /// Number of records in the document; zero when it is not an array.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.document.as_array().map_or(0, Vec::len)
    }

    /// Saved file path, if the document was written.
    #[must_use]
    pub fn saved_path(&self) -> Option<&PathBuf> {
        match &self.persistence {
            Persistence::Written(path) => Some(path),
            _ => None,
        }
    }

    /// Treats a persistence failure as fatal.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Persistence`] if writing the document failed.
    pub fn into_saved(self) -> Result<(Value, Option<PathBuf>), QueryError> {
        match self.persistence {
            Persistence::Skipped => Ok((self.document, None)),
            Persistence::Written(path) => Ok((self.document, Some(path))),
            Persistence::Failed(e) => Err(e.into()),
        }
    }
}

/// Runs [`QueryRequest`]s against the catalog with credentials from `C`.
pub struct SpaceTrackQuery<C> {
    client: SpaceTrackClient,
    credentials: C,
}

impl<C: CredentialSource> SpaceTrackQuery<C> {
    #[must_use]
    pub fn new(client: SpaceTrackClient, credentials: C) -> Self {
        Self {
            client,
            credentials,
        }
    }

    #[must_use]
    pub fn client(&self) -> &SpaceTrackClient {
        &self.client
    }

    /// Compiles `request`, loads credentials, logs in, retrieves the result
    /// and, when `save_data` is set, writes it to the request's file name.
    ///
    /// Constraint and configuration errors are raised before any network
    /// call. A failed write does not fail the query: it is reported through
    /// [`QueryOutcome::persistence`].
    ///
    /// # Errors
    ///
    /// Returns the first [`QueryError`] raised by compilation, credential
    /// loading, login, or retrieval.
    pub async fn run(&self, request: &QueryRequest) -> Result<QueryOutcome, QueryError> {
        let path = request.path()?;
        let span = info_span!("spacetrack_query", dataset = %request.dataset, file = %request.file_name);

        async {
            let credentials = self.credentials.load_credentials()?;
            let document = self.client.execute(&path, &credentials).await?;

            let persistence = if request.save_data {
                match persist(&document, &request.file_name) {
                    Ok(saved) => Persistence::Written(saved),
                    Err(e) => {
                        warn!(error = %e, "result document not saved");
                        Persistence::Failed(e)
                    }
                }
            } else {
                Persistence::Skipped
            };

            Ok::<_, QueryError>(QueryOutcome {
                document,
                persistence,
            })
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use reqwest::StatusCode;
    use spacetrack_core::{Constraint, Dataset, Field, Operator, OrbitalElements};

    use super::*;
    use crate::config::{ClientConfig, ConfigError, Credentials, FileCredentials, StaticCredentials};
    use crate::persist::load_elements;
    use crate::test_support::{MockCatalog, MockOptions};

    fn pipeline(mock: &MockCatalog) -> SpaceTrackQuery<StaticCredentials> {
        SpaceTrackQuery::new(
            SpaceTrackClient::new(ClientConfig::with_base_url(&mock.base_url)),
            StaticCredentials(Credentials::new(MockCatalog::USERNAME, MockCatalog::PASSWORD)),
        )
    }

    fn iss_request(file_name: impl Into<String>) -> QueryRequest {
        QueryRequest::new(Dataset::HistoricalRecords, file_name)
            .constraint(Constraint::equal(Field::NoradCatId, [25544]))
            .constraint(Constraint::range(Field::Epoch, "2010-01-01", "2010-12-01"))
    }

    #[tokio::test]
    async fn run_saves_and_returns_document() {
        let mock = MockCatalog::start(MockOptions::default()).await;
        let dir = tempfile::tempdir().unwrap();
        let request = iss_request(dir.path().join("ISS_data.json").to_string_lossy());

        let outcome = pipeline(&mock).run(&request).await.unwrap();

        assert_eq!(outcome.document, mock.options.body);
        assert_eq!(outcome.record_count(), 2);
        assert_eq!(outcome.saved_path(), Some(&dir.path().join("ISS_data.json")));
        assert_eq!(
            mock.last_query().as_deref(),
            Some(
                "/basicspacedata/query/class/gp_history/NORAD_CAT_ID/25544\
                 /EPOCH/2010-01-01--2010-12-01/orderby/EPOCH asc"
            )
        );
    }

    #[tokio::test]
    async fn saved_entry_matches_retrieved_record() {
        let mock = MockCatalog::start(MockOptions::default()).await;
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("ISS_data.csv");
        let request = iss_request(file.to_string_lossy());

        let outcome = pipeline(&mock).run(&request).await.unwrap();

        let from_disk = load_elements(&file, 0).unwrap();
        let from_memory = OrbitalElements::from_record(&outcome.document[0]).unwrap();
        assert_eq!(from_disk, from_memory);
        assert_eq!(from_disk.epoch, "2010-01-01T05:52:41.000000");
        assert!((from_disk.semimajor_axis_km - 6724.437).abs() < 1e-9);
    }

    #[tokio::test]
    async fn save_disabled_writes_nothing() {
        let mock = MockCatalog::start(MockOptions::default()).await;
        let dir = tempfile::tempdir().unwrap();
        let request = iss_request(dir.path().join("unsaved").to_string_lossy()).save_data(false);

        let outcome = pipeline(&mock).run(&request).await.unwrap();

        assert!(matches!(outcome.persistence, Persistence::Skipped));
        assert_eq!(outcome.document, mock.options.body);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn odd_range_fails_before_network() {
        let mock = MockCatalog::start(MockOptions::default()).await;
        let request = QueryRequest::new(Dataset::HistoricalRecords, "never").constraint(
            Constraint::new(
                Field::Epoch,
                Operator::Range,
                vec!["2010-01-01".into(), "2010-06-01".into(), "2010-12-01".into()],
            ),
        );

        let err = pipeline(&mock).run(&request).await.unwrap_err();

        assert!(matches!(err, QueryError::Constraint(_)));
        assert_eq!(mock.logins.load(Ordering::SeqCst), 0);
        assert_eq!(mock.queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_credentials_fail_before_session() {
        let mock = MockCatalog::start(MockOptions::default()).await;
        let query = SpaceTrackQuery::new(
            SpaceTrackClient::new(ClientConfig::with_base_url(&mock.base_url)),
            FileCredentials::new("/nonexistent/STCredentials.toml"),
        );

        let err = query.run(&iss_request("never")).await.unwrap_err();

        assert!(matches!(err, QueryError::Configuration(ConfigError::Read { .. })));
        assert_eq!(query.client().sessions_opened(), 0);
        assert_eq!(mock.logins.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_login_leaves_no_output_file() {
        let mock = MockCatalog::start(MockOptions {
            login_status: StatusCode::FORBIDDEN,
            ..MockOptions::default()
        })
        .await;
        let dir = tempfile::tempdir().unwrap();
        let request = iss_request(dir.path().join("ISS_data").to_string_lossy());

        let err = pipeline(&mock).run(&request).await.unwrap_err();

        assert!(matches!(err, QueryError::Authentication { .. }));
        assert_eq!(mock.queries.load(Ordering::SeqCst), 0);
        assert!(!dir.path().join("ISS_data.json").exists());
    }

    #[tokio::test]
    async fn failed_query_leaves_no_output_file() {
        let mock = MockCatalog::start(MockOptions {
            query_status: StatusCode::BAD_REQUEST,
            ..MockOptions::default()
        })
        .await;
        let dir = tempfile::tempdir().unwrap();
        let request = iss_request(dir.path().join("ISS_data").to_string_lossy());

        let err = pipeline(&mock).run(&request).await.unwrap_err();

        assert!(matches!(err, QueryError::Retrieval { .. }));
        assert!(!dir.path().join("ISS_data.json").exists());
    }

    #[test]
    fn non_array_document_counts_no_records() {
        let outcome = QueryOutcome {
            document: serde_json::json!({"error": "You must be logged in"}),
            persistence: Persistence::Skipped,
        };
        assert_eq!(outcome.record_count(), 0);
    }

    #[tokio::test]
    async fn persistence_failure_still_returns_document() {
        let mock = MockCatalog::start(MockOptions::default()).await;
        let dir = tempfile::tempdir().unwrap();
        let request = iss_request(dir.path().join("missing").join("ISS_data").to_string_lossy());

        let outcome = pipeline(&mock).run(&request).await.unwrap();

        assert!(matches!(outcome.persistence, Persistence::Failed(PersistError::Write { .. })));
        assert_eq!(outcome.record_count(), 2);
        assert!(matches!(outcome.into_saved(), Err(QueryError::Persistence(_))));
    }
}
