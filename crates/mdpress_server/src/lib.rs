//! HTTP API of mdpress: markdown conversion and PDF export.

mod error;

pub use self::error::ApiError;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use mdpress_core::{MarkdownRenderer, RenderOptions, TextRenderer};
use pdf_export::{catalog, ExportRequest, Exporter, ThemeSummary};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// RFC 5987 `attr-char`s are left as is.
const FILENAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub exporter: Arc<Exporter>,
    pub renderer: MarkdownRenderer,
}

impl AppState {
    pub fn new(exporter: Arc<Exporter>) -> Self {
        Self {
            exporter,
            renderer: MarkdownRenderer::new(RenderOptions::gfm()),
        }
    }
}

/// Builds the router, request bodies larger than `body_limit` bytes are rejected.
pub fn router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/convert", post(convert))
        .route("/api/pdf-themes", get(pdf_themes))
        .route("/api/generate-pdf", post(generate_pdf))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves until SIGINT/SIGTERM, then closes the headless browser.
pub async fn run(
    listener: tokio::net::TcpListener,
    state: AppState,
    body_limit: usize,
) -> std::io::Result<()> {
    let engine = state.exporter.engine().clone();
    let app = router(state, body_limit);

    tracing::info!("Listening on {:?}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if engine.shutdown().await {
        tracing::info!("Render engine shut down");
    }

    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(?err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(?err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

fn reject_json(rejection: JsonRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(rejection.body_text())
    } else {
        ApiError::Validation(rejection.body_text())
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "mdpress server is running",
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConvertStats {
    markdown_length: usize,
    html_length: usize,
}

#[derive(Debug, Serialize)]
struct ConvertResponse {
    success: bool,
    html: String,
    stats: ConvertStats,
}

/// Length in UTF-16 code units, what the browser side reports as string length.
fn js_length(s: &str) -> usize {
    s.encode_utf16().count()
}

async fn convert(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ConvertResponse>, ApiError> {
    let Json(mut value) = payload.map_err(reject_json)?;

    let Some(Value::String(markdown)) = value.get_mut("markdown").map(Value::take) else {
        return Err(ApiError::Validation(
            "Markdown content is required and must be a string".to_string(),
        ));
    };

    let renderer = state.renderer;
    let (markdown, html) = tokio::task::spawn_blocking(move || {
        let html = renderer.render_text(&markdown);
        (markdown, html)
    })
    .await
    .map_err(|err| {
        tracing::error!(?err, "Markdown conversion panicked");
        ApiError::Render {
            what: "Failed to convert markdown",
            message: "Conversion failed".to_string(),
        }
    })?;

    Ok(Json(ConvertResponse {
        success: true,
        stats: ConvertStats {
            markdown_length: js_length(&markdown),
            html_length: js_length(&html),
        },
        html,
    }))
}

#[derive(Serialize)]
struct ThemesResponse {
    success: bool,
    themes: Vec<ThemeSummary>,
    default: &'static str,
}

async fn pdf_themes(State(state): State<AppState>) -> Json<ThemesResponse> {
    Json(ThemesResponse {
        success: true,
        themes: catalog::list().iter().map(|theme| theme.summary()).collect(),
        default: state.exporter.default_theme().id,
    })
}

/// `Content-Disposition` value with an ASCII fallback and the UTF-8 name.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        utf8_percent_encode(filename, FILENAME_ENCODE_SET)
    )
}

async fn generate_pdf(
    State(state): State<AppState>,
    payload: Result<Json<ExportRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.map_err(reject_json)?;

    let artifact = state.exporter.export(request).await?;

    let disposition = HeaderValue::from_str(&content_disposition(&artifact.filename)).map_err(
        |err| {
            tracing::error!(?err, filename = %artifact.filename, "Invalid Content-Disposition");
            ApiError::Render {
                what: "Failed to generate PDF",
                message: "Invalid filename".to_string(),
            }
        },
    )?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, HeaderValue::from(artifact.bytes.len())),
        ],
        artifact.bytes,
    )
        .into_response())
}

async fn not_found() -> ApiError {
    ApiError::NotFound("No such resource".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use pdf_export::testing::{FakeLauncher, FAIL_MARKER};
    use pdf_export::{ExportSettings, RenderEngine};
    use std::time::Duration;
    use tower::ServiceExt;

    const BODY_LIMIT: usize = 1024;

    fn app() -> Router {
        let engine = RenderEngine::new(FakeLauncher::default(), Duration::from_secs(5));
        let exporter = Exporter::new(Arc::new(engine), ExportSettings::default());
        router(AppState::new(Arc::new(exporter)), BODY_LIMIT)
    }

    fn post_json(uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_convert_bold() {
        let response = app()
            .oneshot(post_json("/api/convert", r#"{"markdown":"**bold**"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({
                "success": true,
                "html": "<p><strong>bold</strong></p>\n",
                "stats": { "markdownLength": 8, "htmlLength": 29 }
            })
        );
    }

    #[tokio::test]
    async fn test_convert_lengths_are_utf16() {
        let response = app()
            .oneshot(post_json("/api/convert", r#"{"markdown":"😀"}"#))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["stats"]["markdownLength"], 2);
    }

    #[tokio::test]
    async fn test_convert_rejects_invalid_markdown() {
        for body in [r#"{}"#, r#"{"markdown":42}"#, r#"not json"#] {
            let response = app().oneshot(post_json("/api/convert", body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        }
    }

    #[tokio::test]
    async fn test_pdf_themes() {
        let response = app()
            .oneshot(Request::get("/api/pdf-themes").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["default"], "solarized-light");
        let ids: Vec<_> = body["themes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|theme| theme["id"].as_str().unwrap().to_string())
            .collect();
        for id in ["printer", "solarized-light", "solarized-dark"] {
            assert!(ids.iter().any(|i| i == id), "missing {id}");
        }
        assert!(body["themes"][0]["name"].is_string());
        assert!(body["themes"][0]["description"].is_string());
    }

    #[tokio::test]
    async fn test_generate_pdf() {
        let response = app()
            .oneshot(post_json(
                "/api/generate-pdf",
                r##"{"markdown":"# Plan","filename":"Ünïcode plan.md","theme":"printer"}"##,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"_n_code plan.pdf\"; filename*=UTF-8''%C3%9Cn%C3%AFcode%20plan.pdf"
        );
        let length: usize = headers[header::CONTENT_LENGTH].to_str().unwrap().parse().unwrap();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert_eq!(bytes.len(), length);
    }

    #[tokio::test]
    async fn test_generate_pdf_empty_markdown() {
        for body in [r#"{"markdown":"   "}"#, r#"{"title":"x"}"#, r#"{"markdown":["a"]}"#] {
            let response = app()
                .oneshot(post_json("/api/generate-pdf", body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
            let body = json_body(response).await;
            assert_eq!(body["error"], "Invalid markdown content");
            assert!(body["message"].is_string());
        }
    }

    #[tokio::test]
    async fn test_generate_pdf_ignores_non_string_options() {
        let response = app()
            .oneshot(post_json(
                "/api/generate-pdf",
                r##"{"markdown":"# Title","theme":7,"title":{"text":"x"}}"##,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"document.pdf\"; filename*=UTF-8''document.pdf"
        );
    }

    #[tokio::test]
    async fn test_generate_pdf_render_failure() {
        let markdown = serde_json::json!({ "markdown": format!("text\n\n{FAIL_MARKER}\n") });
        let response = app()
            .oneshot(post_json("/api/generate-pdf", markdown.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Failed to generate PDF");
        assert_eq!(body["message"], "PDF rendering failed");
    }

    #[tokio::test]
    async fn test_oversize_body() {
        let markdown = serde_json::json!({ "markdown": "a".repeat(BODY_LIMIT * 2) });
        let response = app()
            .oneshot(post_json("/api/generate-pdf", markdown.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = app()
            .oneshot(Request::get("/api/files/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"], "Not found");
    }

    #[test]
    fn test_content_disposition() {
        assert_eq!(
            content_disposition("report.pdf"),
            "attachment; filename=\"report.pdf\"; filename*=UTF-8''report.pdf"
        );
    }
}
