//! Request handlers for the dashboard server.
//!
//! Page and view handlers run one full render cycle through a
//! [`DashboardViewController`]. Upload and delete are proxied to the
//! backend byte-for-byte so the browser sees the backend's own reply.

use std::io::Cursor;

use anyhow::{Context, Result};
use serde::Serialize;
use tiny_http::{Header, Response, StatusCode};

use crate::analytics::{CycleEvent, EventKind, Outcome};
use crate::client::{ActionReply, BackendClient, DataSource};
use crate::config;
use crate::controller::DashboardViewController;
use crate::render::{PageContext, render_page};

use super::{App, content_type_html, content_type_json, json_error};

// ---------------------------------------------------------------------------
// JSON response types
// ---------------------------------------------------------------------------

/// Config API response: the effective config plus its TOML rendering.
#[derive(Serialize)]
struct ConfigResponse {
    config: config::schema::PlansightConfig,
    toml_text: String,
}

/// Health API response.
#[derive(Serialize)]
struct HealthResponse {
    version: &'static str,
    backend_url: String,
    backend_reachable: bool,
    config_exists: bool,
    log_exists: bool,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a JSON success response.
fn json_response<T: Serialize>(data: &T) -> Result<Response<Cursor<Vec<u8>>>> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(200)))
}

fn controller(
    app: &App,
    resource_type: &str,
    source: DataSource,
) -> DashboardViewController<BackendClient> {
    DashboardViewController::new(app.backend.clone(), resource_type, source)
        .with_reload_delay(app.reload_delay())
        .with_log(app.log.clone())
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// `GET /analyze/{resource_type}[?source=json]`: the rendered dashboard.
///
/// Failed cycles still render a page; the error panel is the content.
pub fn analyze_page(
    app: &App,
    resource_type: &str,
    source: DataSource,
) -> Response<Cursor<Vec<u8>>> {
    let mut controller = controller(app, resource_type, source);
    controller.load();

    let ctx = PageContext {
        resource_type: resource_type.to_string(),
        source,
        reload_delay_ms: app.config.dashboard.reload_delay_ms,
        interactive: true,
    };
    let html = render_page(controller.state(), controller.charts(), &ctx);
    Response::from_data(html.into_bytes())
        .with_header(content_type_html())
        .with_status_code(StatusCode(200))
}

/// `GET /api/view/{resource_type}[?source=json]`: the composed view as JSON.
pub fn get_view(
    app: &App,
    resource_type: &str,
    source: DataSource,
) -> Result<Response<Cursor<Vec<u8>>>> {
    let mut controller = controller(app, resource_type, source);
    controller.load();

    json_response(&controller.snapshot())
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// `POST /upload/{resource_type}`: forward the multipart body unchanged.
pub fn post_upload(
    app: &App,
    resource_type: &str,
    content_type: Option<&str>,
    body: &[u8],
) -> Response<Cursor<Vec<u8>>> {
    proxy_action(
        app,
        EventKind::Upload,
        resource_type,
        &format!("/upload/{resource_type}"),
        content_type,
        body,
    )
}

/// `POST /delete-uploads/{resource_type}`.
pub fn post_delete(app: &App, resource_type: &str) -> Response<Cursor<Vec<u8>>> {
    proxy_action(
        app,
        EventKind::Delete,
        resource_type,
        &format!("/delete-uploads/{resource_type}"),
        None,
        &[],
    )
}

fn proxy_action(
    app: &App,
    kind: EventKind,
    resource_type: &str,
    path: &str,
    content_type: Option<&str>,
    body: &[u8],
) -> Response<Cursor<Vec<u8>>> {
    let source = app.config.dashboard.source.as_str();
    match app.backend.forward("POST", path, content_type, body) {
        Ok(raw) => {
            let accepted = raw.status < 400
                && serde_json::from_slice::<ActionReply>(&raw.body)
                    .map(|reply| reply.success)
                    .unwrap_or(false);
            let outcome = if accepted {
                Outcome::Ready
            } else {
                Outcome::Rejected
            };
            app.log.record(
                &CycleEvent::now(kind, resource_type, source, outcome)
                    .with_detail(format!("HTTP {}", raw.status)),
            );

            let mut resp = Response::from_data(raw.body).with_status_code(StatusCode(raw.status));
            if let Ok(header) = Header::from_bytes("Content-Type", raw.content_type.as_bytes()) {
                resp = resp.with_header(header);
            }
            resp
        }
        Err(e) => {
            app.log.record(
                &CycleEvent::now(kind, resource_type, source, Outcome::Error)
                    .with_detail(e.to_string()),
            );
            let reply = ActionReply::failed(e.to_string());
            let body = serde_json::to_vec(&reply).unwrap_or_default();
            Response::from_data(body)
                .with_header(content_type_json())
                .with_status_code(StatusCode(502))
        }
    }
}

/// `GET /api/export/recommendations`: the backend's export document.
pub fn get_export(app: &App) -> Result<Response<Cursor<Vec<u8>>>> {
    let controller = controller(
        app,
        &app.config.dashboard.resource_type,
        app.config.dashboard.source,
    );
    match controller.export() {
        Ok(doc) => json_response(&doc),
        Err(e) => Ok(json_error(502, &e.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Config and health
// ---------------------------------------------------------------------------

/// `GET /api/config`: current effective configuration.
pub fn get_config() -> Result<Response<Cursor<Vec<u8>>>> {
    let cfg = config::load();
    let toml_text = toml::to_string_pretty(&cfg).unwrap_or_default();
    json_response(&ConfigResponse {
        config: cfg,
        toml_text,
    })
}

/// `GET /api/health`: backend reachability and local file status.
pub fn get_health(app: &App) -> Result<Response<Cursor<Vec<u8>>>> {
    let config_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let log_exists = app.log.path().map(|p| p.exists()).unwrap_or(false);

    json_response(&HealthResponse {
        version: env!("CARGO_PKG_VERSION"),
        backend_url: app.backend.base_url().to_string(),
        backend_reachable: app.backend.is_reachable(),
        config_exists,
        log_exists,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serializes() {
        let resp = HealthResponse {
            version: "0.1.0",
            backend_url: "http://127.0.0.1:5000".to_string(),
            backend_reachable: false,
            config_exists: true,
            log_exists: false,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"backend_reachable\":false"));
        assert!(json.contains("\"backend_url\":\"http://127.0.0.1:5000\""));
    }

    #[test]
    fn unreachable_backend_renders_error_page() {
        let mut config = config::schema::PlansightConfig::default();
        // Reserved port; nothing listens here.
        config.backend.base_url = "http://127.0.0.1:9".to_string();
        config.backend.timeout_ms = 500;
        config.logging.enabled = false;
        let app = App::new(config);

        let resp = analyze_page(&app, "app-service", DataSource::Json);
        // The error panel is the page content, not an HTTP failure.
        assert_eq!(resp.status_code().0, 200);
    }

    #[test]
    fn delete_against_unreachable_backend_is_bad_gateway() {
        let mut config = config::schema::PlansightConfig::default();
        config.backend.base_url = "http://127.0.0.1:9".to_string();
        config.backend.timeout_ms = 500;
        config.logging.enabled = false;
        let app = App::new(config);

        let resp = post_delete(&app, "app-service");
        assert_eq!(resp.status_code().0, 502);
    }
}
