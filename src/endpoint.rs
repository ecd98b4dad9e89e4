/// HTTP endpoint for querying climate observations
///
/// Read-only JSON API over the measurement table, plus a static landing
/// page. Each request is handled on a worker thread with its own read-only
/// connection, opened when the request arrives and dropped once the
/// response body is built.
///
/// Endpoints:
/// - GET / - HTML index of the routes below
/// - GET /api/v1.0/precipitation - date → precipitation for the last 12 months
/// - GET /api/v1.0/stations - station identifiers with measurements
/// - GET /api/v1.0/tobs - [date, tobs] pairs for the last 12 months
/// - GET /api/v1.0/{start} - [date, min, avg, max] from start onwards
/// - GET /api/v1.0/{start}/{end} - [date, min, avg, max] from start to end inclusive
/// - GET /health - Service health check

use crate::config::ServiceConfig;
use crate::db;
use crate::error::{ApiError, Result};
use crate::query;
use rusqlite::Connection;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use threadpool::ThreadPool;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

pub const API_PREFIX: &str = "/api/v1.0/";

const AVAILABLE_ENDPOINTS: &[&str] = &[
    "/",
    "/health",
    "/api/v1.0/precipitation",
    "/api/v1.0/stations",
    "/api/v1.0/tobs",
    "/api/v1.0/{start}",
    "/api/v1.0/{start}/{end}",
];

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Honolulu, HI climate API</title></head>
<body>
<h1>Available Honolulu, HI API routes</h1>
<ul>
  <li>
    Precipitation for the last 12 months of data, keyed by date:<br>
    <a href="/api/v1.0/precipitation">/api/v1.0/precipitation</a>
  </li>
  <li>
    Stations that have reported measurements:<br>
    <a href="/api/v1.0/stations">/api/v1.0/stations</a>
  </li>
  <li>
    Temperature observations (tobs) for the last 12 months of data:<br>
    <a href="/api/v1.0/tobs">/api/v1.0/tobs</a>
  </li>
  <li>
    Daily minimum, average and maximum temperature from a start date onwards.
    Replace &lt;start&gt; with a date in YYYY-MM-DD format:<br>
    <a href="/api/v1.0/2017-01-01">/api/v1.0/&lt;start&gt;</a>
  </li>
  <li>
    Daily minimum, average and maximum temperature between two dates, inclusive.
    Replace &lt;start&gt; and &lt;end&gt; with dates in YYYY-MM-DD format:<br>
    <a href="/api/v1.0/2017-01-01/2017-01-07">/api/v1.0/&lt;start&gt;/&lt;end&gt;</a>
  </li>
</ul>
</body>
</html>
"#;

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// A request path resolved to the operation that answers it
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Index,
    Health,
    Precipitation,
    Stations,
    Tobs,
    /// Per-date temperature summary; `end` is inclusive when present
    Summary { start: String, end: Option<String> },
    NotFound,
}

/// Resolve a request URL. Any query string is ignored and path parameters
/// are percent-decoded but otherwise passed through untouched.
pub fn route(url: &str) -> Route {
    let path = url.split('?').next().unwrap_or_default();

    if path == "/" {
        return Route::Index;
    }
    if path == "/health" {
        return Route::Health;
    }

    let Some(rest) = path.strip_prefix(API_PREFIX) else {
        return Route::NotFound;
    };

    let segments: Vec<&str> = rest.split('/').collect();
    match segments.as_slice() {
        ["precipitation"] => Route::Precipitation,
        ["stations"] => Route::Stations,
        ["tobs"] => Route::Tobs,
        [start] if !start.is_empty() => Route::Summary {
            start: decode_segment(start),
            end: None,
        },
        [start, end] if !start.is_empty() && !end.is_empty() => Route::Summary {
            start: decode_segment(start),
            end: Some(decode_segment(end)),
        },
        _ => Route::NotFound,
    }
}

fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

// ---------------------------------------------------------------------------
// Response Bodies
// ---------------------------------------------------------------------------

/// Last 12 months of precipitation as a date → value object.
///
/// Several stations report on the same date, and the object keeps one value
/// per date: the last row in storage order wins.
pub fn precipitation_json(conn: &Connection) -> Result<String> {
    let mut by_date: BTreeMap<String, Option<f64>> = BTreeMap::new();

    if let Some(latest) = query::latest_date(conn)? {
        let cutoff = query::window_cutoff(&latest)?;
        for (date, prcp) in query::precipitation_since(conn, cutoff)? {
            by_date.insert(date, prcp);
        }
    }

    Ok(serde_json::to_string_pretty(&by_date)?)
}

/// Distinct station identifiers as a flat array
pub fn stations_json(conn: &Connection) -> Result<String> {
    let ids = query::station_ids(conn)?;
    Ok(serde_json::to_string_pretty(&ids)?)
}

/// Last 12 months of `[date, tobs]` pairs, one per row
pub fn tobs_json(conn: &Connection) -> Result<String> {
    let pairs = match query::latest_date(conn)? {
        Some(latest) => {
            let cutoff = query::window_cutoff(&latest)?;
            query::temperature_since(conn, cutoff)?
        }
        None => Vec::new(),
    };

    Ok(serde_json::to_string_pretty(&pairs)?)
}

/// `[date, min, avg, max]` rows for the requested range
pub fn summary_json(conn: &Connection, start: &str, end: Option<&str>) -> Result<String> {
    let rows = query::temperature_summary(conn, start, end)?;
    Ok(serde_json::to_string_pretty(&rows)?)
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// State shared by all worker threads
#[derive(Debug)]
pub struct EndpointState {
    pub database_path: PathBuf,
    /// Size of the station registry loaded at startup
    pub station_count: usize,
}

/// A response before it is handed to the HTTP server
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Reply {
    fn json(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: "application/json",
            body,
        }
    }

    fn html(body: &str) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body: body.to_string(),
        }
    }

    fn into_response(self) -> Response<std::io::Cursor<Vec<u8>>> {
        let response = Response::from_data(self.body.into_bytes())
            .with_status_code(StatusCode::from(self.status));

        match Header::from_bytes(&b"Content-Type"[..], self.content_type.as_bytes()) {
            Ok(header) => response.with_header(header),
            Err(()) => response,
        }
    }
}

/// Answer a single request
pub fn dispatch(method: &Method, url: &str, state: &EndpointState) -> Reply {
    if *method != Method::Get {
        return Reply::json(
            405,
            serde_json::json!({ "error": "Method not allowed", "allowed": ["GET"] }).to_string(),
        );
    }

    match route(url) {
        Route::Index => Reply::html(INDEX_HTML),
        Route::Health => handle_health(state),
        Route::Precipitation => with_connection(state, precipitation_json),
        Route::Stations => with_connection(state, stations_json),
        Route::Tobs => with_connection(state, tobs_json),
        Route::Summary { start, end } => {
            with_connection(state, |conn| summary_json(conn, &start, end.as_deref()))
        }
        Route::NotFound => Reply::json(
            404,
            serde_json::json!({
                "error": "Not found",
                "available_endpoints": AVAILABLE_ENDPOINTS,
            })
            .to_string(),
        ),
    }
}

/// Run `handler` against a connection scoped to this request
fn with_connection<F>(state: &EndpointState, handler: F) -> Reply
where
    F: FnOnce(&Connection) -> Result<String>,
{
    let result = db::open_read_only(&state.database_path)
        .map_err(ApiError::from)
        .and_then(|conn| handler(&conn));

    match result {
        Ok(body) => Reply::json(200, body),
        Err(e) => {
            log::error!("Request failed: {}", e);
            Reply::json(500, serde_json::json!({ "error": e.to_string() }).to_string())
        }
    }
}

/// Handle /health endpoint
fn handle_health(state: &EndpointState) -> Reply {
    Reply::json(
        200,
        serde_json::json!({
            "status": "ok",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "stations": state.station_count,
        })
        .to_string(),
    )
}

fn handle_request(request: Request, state: &EndpointState) {
    let method = request.method().clone();
    let url = request.url().to_string();

    let reply = dispatch(&method, &url, state);
    log::info!("{} {} -> {}", method, url, reply.status);

    if let Err(e) = request.respond(reply.into_response()) {
        log::warn!("Failed to send response for {}: {}", url, e);
    }
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

/// Listening socket plus the worker pool that answers its requests
pub struct EndpointServer {
    server: Server,
    bind_address: String,
    pool: ThreadPool,
    state: Arc<EndpointState>,
}

impl EndpointServer {
    /// Bind the listen address from `config`. Port 0 picks a free port.
    pub fn bind(
        config: &ServiceConfig,
        station_count: usize,
    ) -> std::result::Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let server = Server::http(config.bind_address.as_str())
            .map_err(|e| format!("Failed to start HTTP server on {}: {}", config.bind_address, e))?;

        let state = EndpointState {
            database_path: config.database_path.clone(),
            station_count,
        };

        Ok(Self {
            server,
            bind_address: config.bind_address.clone(),
            pool: ThreadPool::with_name("climate-api-worker".to_string(), config.workers),
            state: Arc::new(state),
        })
    }

    /// Address actually bound, useful when the configured port was 0
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Accept requests until the listener is closed
    pub fn run(self) {
        log::info!("HTTP endpoint listening on http://{}", self.describe_addr());
        for path in AVAILABLE_ENDPOINTS {
            log::info!("   GET {}", path);
        }

        for request in self.server.incoming_requests() {
            let state = Arc::clone(&self.state);
            self.pool.execute(move || handle_request(request, &state));
        }

        self.pool.join();
    }

    fn describe_addr(&self) -> String {
        self.local_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| self.bind_address.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
