//! Static file server for the browser front-end.
//!
//! `/` serves `index.html`; every other path is looked up under the root
//! directory. Paths that escape the root answer 404, like missing files.

use std::path::PathBuf;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware;
use axum::response::Response;
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Router serving the files under `root`.
pub fn router(root: PathBuf) -> Router {
    let index = ServeFile::new(root.join("index.html"));
    Router::new()
        .route_service("/", index)
        .fallback_service(ServeDir::new(root))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(middleware::map_response(plain_error_body)),
        )
}

/// Give bare error statuses a short plain-text body.
async fn plain_error_body(response: Response) -> Response {
    let message = match response.status() {
        StatusCode::NOT_FOUND => "404 - File Not Found",
        StatusCode::METHOD_NOT_ALLOWED => "405 - Method Not Allowed",
        StatusCode::INTERNAL_SERVER_ERROR => "500 - Server Error",
        _ => return response,
    };
    let (mut parts, _) = response.into_parts();
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(message))
}

/// Bind `127.0.0.1:port` and serve `root` until interrupted.
pub async fn serve(root: PathBuf, port: u16) -> Result<()> {
    anyhow::ensure!(root.is_dir(), "server root is not a directory: {}", root.display());
    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;
    let addr = listener.local_addr()?;
    println!("Serving {} at http://{addr}/", root.display());
    println!("Press Ctrl+C to stop the server");
    tracing::info!("server listening on http://{addr}");

    axum::serve(listener, router(root))
        .await
        .context("server stopped unexpectedly")?;
    Ok(())
}
