//! Local dashboard server.
//!
//! A lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - `/analyze/{resource_type}`: the rendered dashboard page
//! - the mutation endpoints the page posts to, proxied to the backend
//! - a few JSON endpoints for the view, export, config and health
//!
//! Launched via `plansight serve` (default: `http://127.0.0.1:8710`).

mod api;

use std::io::{Cursor, Read};
use std::time::Duration;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::analytics::EventLog;
use crate::client::{BackendClient, DataSource};
use crate::config::schema::PlansightConfig;

type HttpResponse = Response<Cursor<Vec<u8>>>;

/// Shared state for request handlers.
pub(crate) struct App {
    config: PlansightConfig,
    backend: BackendClient,
    log: EventLog,
}

impl App {
    fn new(config: PlansightConfig) -> Self {
        Self {
            backend: BackendClient::from_config(&config),
            log: EventLog::from_config(&config),
            config,
        }
    }

    fn reload_delay(&self) -> Duration {
        Duration::from_millis(self.config.dashboard.reload_delay_ms)
    }
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the dashboard server.
///
/// Blocks the current thread. Requests are handled sequentially, which is
/// enough for a local single-user dashboard. A failing request gets a 500
/// and never takes the server down.
pub fn serve(config: PlansightConfig) -> Result<()> {
    let addr = config.web.addr.clone();
    let server = Server::http(&addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    let home = format!(
        "http://{addr}/analyze/{}",
        config.dashboard.resource_type
    );
    println!("plansight dashboard running at {home}");
    println!("Backend: {}", config.backend.base_url);
    println!("Press Ctrl+C to stop.\n");

    if config.web.open_browser {
        let _ = open_browser(&home);
    }

    let app = App::new(config);

    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();
        let content_type = request
            .headers()
            .iter()
            .find(|h| h.field.equiv("Content-Type"))
            .map(|h| h.value.as_str().to_string());

        let result = match read_body(&method, request.as_reader()) {
            Ok(body) => dispatch(&app, &method, &url, content_type.as_deref(), &body),
            Err(e) => Ok(json_error(400, &format!("Failed to read request body: {e}"))),
        };
        let status = match result {
            Ok(resp) => {
                let status = resp.status_code().0;
                let _ = request.respond(resp);
                status
            }
            Err(e) => {
                let _ = request.respond(json_error(500, &e.to_string()));
                500
            }
        };

        // Brief access log
        println!(
            "{} {} {} {}",
            method,
            url,
            status,
            chrono::Local::now().format("%H:%M:%S")
        );
    }

    Ok(())
}

/// Read the whole request body as bytes; multipart uploads are binary.
///
/// A body that cannot be read in full is an error so a truncated upload is
/// never forwarded.
fn read_body(method: &Method, reader: &mut dyn Read) -> std::io::Result<Vec<u8>> {
    let mut body = Vec::new();
    if matches!(method, Method::Post | Method::Put) {
        reader.read_to_end(&mut body)?;
    }
    Ok(body)
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// A parsed request target.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Route {
    Home,
    Analyze { resource_type: String, source: DataSource },
    View { resource_type: String, source: DataSource },
    Upload { resource_type: String },
    DeleteUploads { resource_type: String },
    Export,
    Config,
    Health,
    NotFound,
}

/// Resource type path segments are forwarded to the backend; only plain
/// slugs are accepted.
fn is_resource_slug(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Read a query parameter from a URL.
fn query_param<'a>(url: &'a str, name: &str) -> Option<&'a str> {
    url.split_once('?')?.1.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == name).then_some(v)
    })
}

fn route(method: &Method, url: &str) -> Route {
    // Strip query string for path matching
    let path = url.split('?').next().unwrap_or(url);
    let source = query_param(url, "source")
        .and_then(DataSource::parse)
        .unwrap_or_default();

    let with_slug = |rest: &str, build: &dyn Fn(String) -> Route| {
        let rest = rest.trim_end_matches('/');
        if is_resource_slug(rest) {
            build(rest.to_string())
        } else {
            Route::NotFound
        }
    };

    match (method, path) {
        (&Method::Get, "/") | (&Method::Get, "/index.html") => Route::Home,
        (&Method::Get, "/api/export/recommendations") => Route::Export,
        (&Method::Get, "/api/config") => Route::Config,
        (&Method::Get, "/api/health") => Route::Health,
        (&Method::Get, p) if p.starts_with("/analyze/") => {
            with_slug(&p["/analyze/".len()..], &|resource_type| Route::Analyze {
                resource_type,
                source,
            })
        }
        (&Method::Get, p) if p.starts_with("/api/view/") => {
            with_slug(&p["/api/view/".len()..], &|resource_type| Route::View {
                resource_type,
                source,
            })
        }
        (&Method::Post, p) if p.starts_with("/upload/") => {
            with_slug(&p["/upload/".len()..], &|resource_type| Route::Upload {
                resource_type,
            })
        }
        (&Method::Post, p) if p.starts_with("/delete-uploads/") => {
            with_slug(&p["/delete-uploads/".len()..], &|resource_type| {
                Route::DeleteUploads { resource_type }
            })
        }
        _ => Route::NotFound,
    }
}

/// Dispatch an incoming request to the appropriate handler.
fn dispatch(
    app: &App,
    method: &Method,
    url: &str,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<HttpResponse> {
    match route(method, url) {
        Route::Home => redirect(&format!(
            "/analyze/{}",
            app.config.dashboard.resource_type
        )),
        Route::Analyze {
            resource_type,
            source,
        } => Ok(api::analyze_page(app, &resource_type, source)),
        Route::View {
            resource_type,
            source,
        } => api::get_view(app, &resource_type, source),
        Route::Upload { resource_type } => {
            Ok(api::post_upload(app, &resource_type, content_type, body))
        }
        Route::DeleteUploads { resource_type } => Ok(api::post_delete(app, &resource_type)),
        Route::Export => api::get_export(app),
        Route::Config => api::get_config(),
        Route::Health => api::get_health(app),
        Route::NotFound => Ok(json_error(404, "not found")),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// JSON error body with the given status.
fn json_error(status: u16, message: &str) -> HttpResponse {
    let body = serde_json::json!({ "error": message }).to_string();
    Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(status))
}

fn redirect(location: &str) -> Result<HttpResponse> {
    let header = Header::from_bytes("Location", location)
        .map_err(|_| anyhow::anyhow!("invalid redirect location: {location}"))?;
    Ok(Response::from_data(Vec::new())
        .with_header(header)
        .with_status_code(StatusCode(302)))
}

/// JSON content type header.
pub(crate) fn content_type_json() -> Header {
    Header::from_bytes("Content-Type", "application/json; charset=utf-8").unwrap()
}

/// HTML content type header.
pub(crate) fn content_type_html() -> Header {
    Header::from_bytes("Content-Type", "text/html; charset=utf-8").unwrap()
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenReader;

    impl Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "client went away",
            ))
        }
    }

    #[test]
    fn post_body_is_read_as_bytes() {
        let mut reader = Cursor::new(vec![0u8, 159, 146, 150]);
        assert_eq!(
            read_body(&Method::Post, &mut reader).unwrap(),
            vec![0u8, 159, 146, 150]
        );
        assert!(read_body(&Method::Get, &mut BrokenReader).unwrap().is_empty());
    }

    #[test]
    fn unreadable_post_body_is_an_error() {
        let err = read_body(&Method::Post, &mut BrokenReader).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::ConnectionReset);
    }

    #[test]
    fn analyze_route_reads_source_query() {
        assert_eq!(
            route(&Method::Get, "/analyze/app-service"),
            Route::Analyze {
                resource_type: "app-service".to_string(),
                source: DataSource::Csv,
            }
        );
        assert_eq!(
            route(&Method::Get, "/analyze/app-service?source=json"),
            Route::Analyze {
                resource_type: "app-service".to_string(),
                source: DataSource::Json,
            }
        );
    }

    #[test]
    fn unknown_source_falls_back_to_csv() {
        assert_eq!(
            route(&Method::Get, "/api/view/functions?source=xml"),
            Route::View {
                resource_type: "functions".to_string(),
                source: DataSource::Csv,
            }
        );
    }

    #[test]
    fn mutation_routes_require_post() {
        assert_eq!(
            route(&Method::Post, "/upload/app-service"),
            Route::Upload {
                resource_type: "app-service".to_string()
            }
        );
        assert_eq!(route(&Method::Get, "/upload/app-service"), Route::NotFound);
        assert_eq!(
            route(&Method::Post, "/delete-uploads/app-service/"),
            Route::DeleteUploads {
                resource_type: "app-service".to_string()
            }
        );
    }

    #[test]
    fn resource_type_must_be_a_slug() {
        assert_eq!(route(&Method::Get, "/analyze/"), Route::NotFound);
        assert_eq!(route(&Method::Get, "/analyze/../etc"), Route::NotFound);
        assert_eq!(route(&Method::Post, "/upload/a%2Fb"), Route::NotFound);
    }

    #[test]
    fn fixed_routes() {
        assert_eq!(route(&Method::Get, "/"), Route::Home);
        assert_eq!(route(&Method::Get, "/api/health"), Route::Health);
        assert_eq!(
            route(&Method::Get, "/api/export/recommendations"),
            Route::Export
        );
        assert_eq!(route(&Method::Delete, "/api/health"), Route::NotFound);
    }

    #[test]
    fn query_param_extracts_value() {
        assert_eq!(query_param("/x?source=json", "source"), Some("json"));
        assert_eq!(query_param("/x?a=1&source=csv", "source"), Some("csv"));
        assert_eq!(query_param("/x", "source"), None);
    }
}
