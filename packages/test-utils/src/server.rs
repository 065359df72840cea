use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;

use crate::verify::{verify_request, Verification};

/// Allowed distance between the request `Date` and the server clock
pub const CLOCK_TOLERANCE_SECS: i64 = 300;

/// A request as the mock server saw it on the wire
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Raw request target: path plus query, undecoded
    pub path_with_query: String,
    /// Header names lowercased
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub verification: Verification,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Clone)]
struct CannedResponse {
    status: StatusCode,
    body: String,
}

struct MockState {
    marketplace_id: i64,
    private_key: Vec<u8>,
    requests: Mutex<Vec<RecordedRequest>>,
    responses: Mutex<HashMap<String, CannedResponse>>,
}

/// Handle to a running mock TourCMS API
///
/// Every request is recorded and its signature checked against the
/// configured credentials. Valid requests get the canned body registered
/// for their path (or a default `<response>` document); invalid ones get
/// a 401 with a TourCMS-style error document.
pub struct MockTourCms {
    pub base_url: String,
    state: Arc<MockState>,
    _shutdown_tx: tokio::sync::oneshot::Sender<()>,
}

impl MockTourCms {
    /// Start the mock server on a random available port
    ///
    /// The server runs in the background and shuts down when dropped.
    pub async fn start(marketplace_id: i64, private_key: &str) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            marketplace_id,
            private_key: private_key.as_bytes().to_vec(),
            requests: Mutex::new(Vec::new()),
            responses: Mutex::new(HashMap::new()),
        });

        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind mock server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let base_url = format!("http://{}", addr);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Mock server failed to start");
        });

        Ok(Self {
            base_url,
            state,
            _shutdown_tx: shutdown_tx,
        })
    }

    /// Build full HTTP URL for a path
    ///
    /// # Example
    /// ```no_run
    /// # async fn run() -> anyhow::Result<()> {
    /// let server = tourcms_test_utils::MockTourCms::start(126, "key").await?;
    /// let response = reqwest::get(server.url("/p/channels/list.xml")).await?;
    /// assert_eq!(response.status(), 401);
    /// # Ok(())
    /// # }
    /// ```
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Serve `body` with `status` for every signed request to `path`
    /// (query string ignored when matching).
    pub fn respond_with(&self, path: &str, status: u16, body: impl Into<String>) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self.state.responses.lock().unwrap().insert(
            path.to_string(),
            CannedResponse {
                status,
                body: body.into(),
            },
        );
    }

    /// All requests received so far, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.state.requests.lock().unwrap().last().cloned()
    }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path_with_query = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    let header_str = |name: header::HeaderName| headers.get(name).and_then(|v| v.to_str().ok());
    let verification = verify_request(
        state.marketplace_id,
        &state.private_key,
        method.as_str(),
        &path_with_query,
        header_str(header::AUTHORIZATION),
        header_str(header::DATE),
        chrono::Utc::now().timestamp(),
        CLOCK_TOLERANCE_SECS,
    );

    let recorded_headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path_with_query: path_with_query.clone(),
        headers: recorded_headers,
        body: body.to_vec(),
        verification: verification.clone(),
    });

    let request_line = format!("{} {}", method, path_with_query);
    let (status, body) = match verification {
        Verification::Rejected(reason) => (
            StatusCode::UNAUTHORIZED,
            format!(
                "<?xml version=\"1.0\" encoding=\"utf-8\"?><response><request>{}</request><error>NOTAUTHORIZED: {}</error></response>",
                request_line, reason
            ),
        ),
        Verification::Valid => {
            let canned = state.responses.lock().unwrap().get(uri.path()).cloned();
            match canned {
                Some(canned) => (canned.status, canned.body),
                None => (
                    StatusCode::OK,
                    format!(
                        "<?xml version=\"1.0\" encoding=\"utf-8\"?><response><request>{}</request><error>OK</error></response>",
                        request_line
                    ),
                ),
            }
        }
    };

    (status, [(header::CONTENT_TYPE, "text/xml; charset=utf-8")], body).into_response()
}

/// Base URL of a port nothing is listening on, for transport failure tests
pub async fn unreachable_base_url() -> anyhow::Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{}", addr))
}
