//! In-process mock of the catalog service for tests.
//!
//! Serves the form-login and query endpoints on an OS-assigned local port
//! and counts calls, so tests can assert which requests were issued.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde_json::{json, Value};
use spacetrack_core::QUERY_PREFIX;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const SESSION_COOKIE: &str = "chocolatechip=mock-session";

/// Behaviour knobs for [`MockCatalog`].
#[derive(Debug, Clone)]
pub(crate) struct MockOptions {
    pub login_status: StatusCode,
    pub query_status: StatusCode,
    /// Document returned by a successful query.
    pub body: Value,
    /// Served verbatim instead of `body` when set.
    pub raw_body: Option<String>,
    /// Reject queries that do not carry the login cookie.
    pub require_cookie: bool,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            login_status: StatusCode::OK,
            query_status: StatusCode::OK,
            body: sample_records(),
            raw_body: None,
            require_cookie: false,
        }
    }
}

/// Two ISS element sets in the shape the `gp_history` class returns.
pub(crate) fn sample_records() -> Value {
    json!([
        {
            "CCSDS_OMM_VERS": "2.0",
            "OBJECT_NAME": "ISS (ZARYA)",
            "OBJECT_ID": "1998-067A",
            "NORAD_CAT_ID": "25544",
            "EPOCH": "2010-01-01T05:52:41.000000",
            "MEAN_MOTION": "15.74624740",
            "ECCENTRICITY": "0.0007035",
            "INCLINATION": "51.6418",
            "RA_OF_ASC_NODE": "293.5311",
            "ARG_OF_PERICENTER": "92.2311",
            "MEAN_ANOMALY": "267.9541",
            "SEMIMAJOR_AXIS": "6724.437",
            "COUNTRY_CODE": "ISS",
            "DECAY_DATE": null
        },
        {
            "CCSDS_OMM_VERS": "2.0",
            "OBJECT_NAME": "ISS (ZARYA)",
            "OBJECT_ID": "1998-067A",
            "NORAD_CAT_ID": "25544",
            "EPOCH": "2010-01-02T01:33:12.000000",
            "MEAN_MOTION": "15.74627521",
            "ECCENTRICITY": "0.0006912",
            "INCLINATION": "51.6420",
            "RA_OF_ASC_NODE": "289.3005",
            "ARG_OF_PERICENTER": "93.4110",
            "MEAN_ANOMALY": "266.7702",
            "SEMIMAJOR_AXIS": "6724.429",
            "COUNTRY_CODE": "ISS",
            "DECAY_DATE": null
        }
    ])
}

struct MockState {
    options: MockOptions,
    logins: Arc<AtomicUsize>,
    queries: Arc<AtomicUsize>,
    last_query: Arc<Mutex<Option<String>>>,
}

/// A running mock catalog service.
pub(crate) struct MockCatalog {
    pub base_url: String,
    pub options: MockOptions,
    pub logins: Arc<AtomicUsize>,
    pub queries: Arc<AtomicUsize>,
    last_query: Arc<Mutex<Option<String>>>,
    server: JoinHandle<()>,
}

impl MockCatalog {
    pub const USERNAME: &'static str = "observer@example.com";
    pub const PASSWORD: &'static str = "correct horse";

    /// Binds `127.0.0.1:0` and serves until dropped or shut down.
    pub async fn start(options: MockOptions) -> Self {
        let logins = Arc::new(AtomicUsize::new(0));
        let queries = Arc::new(AtomicUsize::new(0));
        let last_query = Arc::new(Mutex::new(None));

        let state = Arc::new(MockState {
            options: options.clone(),
            logins: Arc::clone(&logins),
            queries: Arc::clone(&queries),
            last_query: Arc::clone(&last_query),
        });

        let router = Router::new()
            .route("/ajaxauth/login", post(login_handler))
            .route("/basicspacedata/query/class/{*rest}", get(query_handler))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url: format!("http://127.0.0.1:{port}"),
            options,
            logins,
            queries,
            last_query,
            server,
        }
    }

    /// Decoded path of the most recent query, including the class prefix.
    pub fn last_query(&self) -> Option<String> {
        self.last_query.lock().unwrap().clone()
    }

    /// Stops the server and waits for the listener to close.
    pub async fn shutdown(&mut self) {
        self.server.abort();
        let _ = (&mut self.server).await;
    }
}

impl Drop for MockCatalog {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn login_handler(
    State(state): State<Arc<MockState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    state.logins.fetch_add(1, Ordering::SeqCst);

    if state.options.login_status != StatusCode::OK {
        return state.options.login_status.into_response();
    }

    let accepted = form.get("identity").map(String::as_str) == Some(MockCatalog::USERNAME)
        && form.get("password").map(String::as_str) == Some(MockCatalog::PASSWORD);
    if !accepted {
        // The real service reports bad credentials in a 200 body.
        return axum::Json(json!({"Login": "Failed"})).into_response();
    }

    (
        [(header::SET_COOKIE, format!("{SESSION_COOKIE}; Path=/"))],
        "\"\"",
    )
        .into_response()
}

async fn query_handler(
    State(state): State<Arc<MockState>>,
    Path(rest): Path<String>,
    headers: HeaderMap,
) -> Response {
    state.queries.fetch_add(1, Ordering::SeqCst);
    *state.last_query.lock().unwrap() = Some(format!("{QUERY_PREFIX}{rest}"));

    if state.options.require_cookie {
        let has_cookie = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|v| v.contains(SESSION_COOKIE));
        if !has_cookie {
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    if state.options.query_status != StatusCode::OK {
        return state.options.query_status.into_response();
    }

    match &state.options.raw_body {
        Some(raw) => raw.clone().into_response(),
        None => axum::Json(state.options.body.clone()).into_response(),
    }
}
