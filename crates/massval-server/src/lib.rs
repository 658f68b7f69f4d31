//! HTTP API for massval.
//!
//! Routes:
//! - `GET /health`
//! - `POST /validate[?check_sirets=1]`: body is the workbook, answers a `ValidationReport`
//! - `POST /export[?check_sirets=1]`: answers both CSV documents, or `422` with the report
//! - `GET /siret/{siret}`: directory lookup of a single SIRET
//!
//! Errors are JSON objects `{"error": "..."}`. The [`TestServer`] helper starts a
//! server on a random port for integration testing.

use massval_core::{CoreError, Validator};
use massval_schema::Siret;
use massval_search::SiretDirectory;
use std::io::Read;
use std::sync::Arc;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tracing::{debug, error, info, warn};

/// Upload limit for workbooks.
pub const MAX_BODY_BYTES: u64 = 20 * 1024 * 1024;

/// Shared request-handling state.
#[derive(Clone, Default)]
pub struct AppState {
    directory: Option<Arc<dyn SiretDirectory>>,
}

impl AppState {
    pub fn new(directory: Option<Arc<dyn SiretDirectory>>) -> Self {
        Self { directory }
    }

    pub fn has_directory(&self) -> bool {
        self.directory.is_some()
    }

    fn validator(&self, check_sirets: bool) -> Result<Validator, ApiError> {
        if !check_sirets {
            return Ok(Validator::new());
        }
        match self.directory {
            Some(ref d) => Ok(Validator::with_directory(Arc::clone(d))),
            None => Err(ApiError::no_directory()),
        }
    }
}

/// An error answered to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

impl ApiError {
    fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn no_directory() -> Self {
        Self::new(503, "no SIRET directory configured")
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        let status = match e {
            CoreError::Schema(_) => 400,
            CoreError::Search(_) => 502,
            CoreError::InvalidSubmission { .. } => 422,
            CoreError::Io(_) | CoreError::Serialization(_) => 500,
        };
        Self::new(status, e.to_string())
    }
}

/// A parsed request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route<'a> {
    Health,
    Validate,
    Export,
    Siret(&'a str),
    NotFound,
}

/// Split `url` into its route and whether `check_sirets` was requested.
pub fn parse_route(url: &str) -> (Route<'_>, bool) {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    let route = match path {
        "/health" => Route::Health,
        "/validate" => Route::Validate,
        "/export" => Route::Export,
        other => match other.strip_prefix("/siret/") {
            Some(siret) if !siret.is_empty() && !siret.contains('/') => Route::Siret(siret),
            _ => Route::NotFound,
        },
    };
    (route, wants_siret_check(query))
}

fn wants_siret_check(query: &str) -> bool {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .any(|(k, v)| k == "check_sirets" && matches!(v, "1" | "true" | "yes"))
}

fn json_header() -> Header {
    Header::from_bytes("Content-Type", "application/json").expect("valid header")
}

fn respond_json(req: Request, code: u16, value: &serde_json::Value) {
    let body = serde_json::to_vec(value).unwrap_or_else(|_| b"{}".to_vec());
    let response = Response::from_data(body)
        .with_status_code(StatusCode(code))
        .with_header(json_header());
    let _ = req.respond(response);
}

fn respond_err(req: Request, err: &ApiError) {
    if err.status >= 500 {
        error!("{} {}", err.status, err.message);
    } else {
        debug!("{} {}", err.status, err.message);
    }
    respond_json(req, err.status, &serde_json::json!({ "error": err.message }));
}

fn read_body(req: &mut Request) -> Result<Vec<u8>, ApiError> {
    let mut body = Vec::new();
    req.as_reader()
        .take(MAX_BODY_BYTES + 1)
        .read_to_end(&mut body)
        .map_err(|e| ApiError::new(500, format!("read error: {e}")))?;
    if body.len() as u64 > MAX_BODY_BYTES {
        return Err(ApiError::new(413, "workbook too large"));
    }
    if body.is_empty() {
        return Err(ApiError::new(400, "empty request body, expected a workbook"));
    }
    Ok(body)
}

fn validate(
    state: &AppState,
    req: &mut Request,
    check_sirets: bool,
) -> Result<serde_json::Value, ApiError> {
    let validator = state.validator(check_sirets)?;
    let body = read_body(req)?;
    let submission = validator.validate_bytes(body)?;
    let report = submission.report()?;
    info!(
        "POST /validate: valid={} errors={}",
        report.is_valid, report.error_count
    );
    serde_json::to_value(&report).map_err(|e| ApiError::new(500, e.to_string()))
}

/// `Ok((200, csv documents))` for a valid workbook, `Ok((422, report))` otherwise.
fn export(
    state: &AppState,
    req: &mut Request,
    check_sirets: bool,
) -> Result<(u16, serde_json::Value), ApiError> {
    let validator = state.validator(check_sirets)?;
    let body = read_body(req)?;
    let submission = validator.validate_bytes(body)?;
    if !submission.is_valid() {
        let report = submission.report()?;
        info!("POST /export: rejected, {} error(s)", report.error_count);
        let value = serde_json::to_value(&report).map_err(|e| ApiError::new(500, e.to_string()))?;
        return Ok((422, value));
    }
    let docs = submission.to_csv()?;
    info!(
        "POST /export: {} establishments, {} roles",
        submission.etablissements.len(),
        submission.roles.len()
    );
    Ok((
        200,
        serde_json::json!({
            "etablissements": docs.etablissements,
            "roles": docs.roles,
        }),
    ))
}

fn lookup_siret(state: &AppState, raw: &str) -> Result<serde_json::Value, ApiError> {
    let directory = state.directory.as_ref().ok_or_else(ApiError::no_directory)?;
    let siret = Siret::from(raw);
    if !siret.is_well_formed() {
        return Err(ApiError::new(
            400,
            format!("malformed SIRET '{raw}': expected 14 characters"),
        ));
    }
    let active = directory
        .is_active(&siret)
        .map_err(|e| ApiError::new(502, e.to_string()))?;
    Ok(serde_json::json!({ "siret": siret, "active": active }))
}

/// Handle a single HTTP request, dispatching to the appropriate route handler.
pub fn handle_request(state: &AppState, mut req: Request) {
    let method = req.method().clone();
    let url = req.url().to_owned();
    debug!("{method} {url}");

    let (route, check_sirets) = parse_route(&url);
    let result = match (route, &method) {
        (Route::Health, Method::Get) => Ok((
            200,
            serde_json::json!({
                "status": "ok",
                "directory": state.has_directory(),
            }),
        )),
        (Route::Validate, Method::Post) => validate(state, &mut req, check_sirets).map(|v| (200, v)),
        (Route::Export, Method::Post) => export(state, &mut req, check_sirets),
        (Route::Siret(siret), Method::Get) => lookup_siret(state, siret).map(|v| (200, v)),
        (Route::NotFound, _) => Err(ApiError::new(404, "not found")),
        _ => Err(ApiError::new(405, "method not allowed")),
    };

    match result {
        Ok((code, value)) => respond_json(req, code, &value),
        Err(e) => respond_err(req, &e),
    }
}

/// Start the server loop, blocking the current thread.
pub fn run_server(
    state: &AppState,
    addr: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let server = Server::http(addr)?;
    if !state.has_directory() {
        warn!("no SIRET directory configured: check_sirets and /siret/ will answer 503");
    }
    for request in server.incoming_requests() {
        handle_request(state, request);
    }
    Ok(())
}

/// A test helper that starts a massval-server on a random port in a background thread.
///
/// The server listens on `127.0.0.1:{port}`. Dropping the `TestServer` does not
/// stop the listener thread; it ends with the test process.
pub struct TestServer {
    pub url: String,
    pub port: u16,
    _server: Arc<Server>,
    _handle: std::thread::JoinHandle<()>,
}

impl TestServer {
    /// Start a test server. Binds to `127.0.0.1:0` (random port).
    pub fn start(state: AppState) -> Self {
        let server =
            Arc::new(Server::http("127.0.0.1:0").expect("failed to bind test HTTP server"));
        let port = server.server_addr().to_ip().expect("not an IP addr").port();
        let url = format!("http://127.0.0.1:{port}");

        let srv = Arc::clone(&server);
        let handle = std::thread::spawn(move || {
            for request in srv.incoming_requests() {
                handle_request(&state, request);
            }
        });

        Self {
            url,
            port,
            _server: server,
            _handle: handle,
        }
    }
}
