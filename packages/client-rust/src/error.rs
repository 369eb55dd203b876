//! Failure kinds of a catalog query, one variant per stage.

use reqwest::StatusCode;
use spacetrack_core::ConstraintError;

use crate::config::ConfigError;
use crate::persist::PersistError;

/// Errors returned by [`SpaceTrackClient`](crate::session::SpaceTrackClient)
/// and [`SpaceTrackQuery`](crate::query::SpaceTrackQuery).
///
/// None of these are retried internally.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Malformed constraint, detected before any network call.
    #[error("invalid constraint: {0}")]
    Constraint(#[from] ConstraintError),
    /// Credentials or service address unusable, detected before the session opens.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),
    /// The login request did not succeed. No query was issued.
    #[error("login failed{}", status_suffix(.status))]
    Authentication { status: Option<StatusCode> },
    /// The query request did not succeed after a successful login.
    #[error("query {path} failed{}", status_suffix(.status))]
    Retrieval {
        path: String,
        status: Option<StatusCode>,
        #[source]
        source: Option<reqwest::Error>,
    },
    /// The query succeeded but its body is not JSON.
    #[error("query {path} returned a malformed document: {source}")]
    InvalidResponse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// Saving the retrieved document failed.
    #[error(transparent)]
    Persistence(#[from] PersistError),
}

fn status_suffix(status: &Option<StatusCode>) -> String {
    status.map(|s| format!(" with status {s}")).unwrap_or_default()
}

impl QueryError {
    /// HTTP status of a failed login or query, if the server answered.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            QueryError::Authentication { status } | QueryError::Retrieval { status, .. } => *status,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_message_includes_status() {
        let err = QueryError::Authentication {
            status: Some(StatusCode::UNAUTHORIZED),
        };
        assert_eq!(err.to_string(), "login failed with status 401 Unauthorized");
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn authentication_without_response_hides_cause() {
        let err = QueryError::Authentication { status: None };
        assert_eq!(err.to_string(), "login failed");
    }

    #[test]
    fn retrieval_message_names_path() {
        let err = QueryError::Retrieval {
            path: "/basicspacedata/query/class/gp/orderby/EPOCH asc".to_string(),
            status: Some(StatusCode::INTERNAL_SERVER_ERROR),
            source: None,
        };
        let message = err.to_string();
        assert!(message.contains("/basicspacedata/query/class/gp/orderby/EPOCH asc"));
        assert!(message.contains("500"));
    }
}
