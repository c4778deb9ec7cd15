//! File routes: upload initiation through the mediator plus raw proxying
//! of presigned object-store URLs through the gateway.

use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::Response;
use axum::routing::{get, post, put};
use axum::Router;

use tutorlink_proto::file::InitUploadRequest;

use crate::mediator::{error_response, handle, CachePolicy};
use crate::AppState;

/// Hard per-upstream-call timeout on the proxy path.
pub const PROXY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/files/init-upload",
        post(handle(
            |s: AppState, m, req: InitUploadRequest| async move {
                s.file_client.init_upload(&m, req).await
            },
            None,
            true,
            CachePolicy::None,
        )),
    )
}

/// The presigned upload/download paths carry their own signatures; they
/// bypass the auth front-door like any presigned URL would.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/files/upload/{*path}", put(proxy_upload))
        .route("/files/download/{*path}", get(proxy_download))
}

async fn proxy_upload(
    State(state): State<AppState>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    proxy(&state, Method::PUT, "upload", &path, query, &headers, body).await
}

async fn proxy_download(
    State(state): State<AppState>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    proxy(
        &state,
        Method::GET,
        "download",
        &path,
        query,
        &headers,
        Bytes::new(),
    )
    .await
}

async fn proxy(
    state: &AppState,
    method: Method,
    segment: &str,
    path: &str,
    query: Option<String>,
    headers: &HeaderMap,
    body: Bytes,
) -> Response {
    let mut target = format!(
        "{}/files/{}/{}",
        state.minio_url.trim_end_matches('/'),
        segment,
        path
    );
    if let Some(query) = query {
        target.push('?');
        target.push_str(&query);
    }

    let mut request = state
        .http_client
        .request(method, &target)
        .timeout(PROXY_TIMEOUT);
    if let Some(content_type) = headers.get("content-type") {
        request = request.header("content-type", content_type);
    }
    if !body.is_empty() {
        request = request.body(body);
    }

    let upstream = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(target, error = %e, "failed to proxy request");
            return error_response(StatusCode::BAD_GATEWAY, "Bad Gateway");
        }
    };

    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = upstream
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let bytes = match upstream.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(target, error = %e, "failed to proxy response body");
            return error_response(StatusCode::BAD_GATEWAY, "Bad Gateway");
        }
    };

    let mut builder = Response::builder().status(status);
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    builder.body(axum::body::Body::from(bytes)).unwrap()
}
