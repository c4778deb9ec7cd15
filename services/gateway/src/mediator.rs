//! The generic HTTP↔RPC bridge every endpoint registers through.
//!
//! A handler is built from four pieces: the typed downstream call, an
//! optional path-and-query parser, a flag saying whether the body carries
//! a JSON request, and a cache policy. The per-request pipeline:
//!
//! 1. copy `X-User-Id` / `X-User-Role` / `X-Trace-Id` into RPC metadata;
//! 2. cached endpoints probe the cache first (a key-build failure skips
//!    caching entirely, it never fails the request);
//! 3. parse body and path/query into the request message;
//! 4. invoke the call, mapping RPC statuses to HTTP statuses through the
//!    shared error table;
//! 5. serialize the response, store it on cached endpoints, and fire the
//!    invalidation deletes of write endpoints after the response is built.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use serde::de::DeserializeOwned;
use serde::Serialize;

use tutorlink_common::error::http_status_for;
use tutorlink_rpc::{metadata as md, Metadata, Status};

use crate::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Everything a path/query parser or cache key builder may look at.
pub struct RequestParts {
    pub headers: HeaderMap,
    pub params: HashMap<String, String>,
    pub query: Vec<(String, String)>,
}

impl RequestParts {
    pub fn path_param(&self, name: &str) -> Result<&str, MediateError> {
        self.params
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| MediateError::BadRequest(format!("missing path param: {name}")))
    }

    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    pub fn query_all(&self, name: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Debug)]
pub enum MediateError {
    BadRequest(String),
    Internal(String),
}

pub type ParseFn<Req> = fn(&RequestParts, &mut Req) -> Result<(), MediateError>;
pub type KeyFn = fn(&RequestParts) -> Result<String, MediateError>;

#[derive(Clone, Copy)]
pub enum CachePolicy {
    None,
    /// Read-through: probe before dispatch, store after a successful call.
    Read { key: KeyFn, ttl: Duration },
    /// Write-invalidate: delete each key after the response is produced.
    Invalidate { keys: &'static [KeyFn] },
}

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Metadata for the downstream call, copied from the inbound headers.
/// Absent headers stay absent.
pub fn metadata_from_headers(headers: &HeaderMap) -> Metadata {
    let mut metadata = Metadata::new();
    for (header, key) in [
        (USER_ID_HEADER, md::USER_ID_KEY),
        (USER_ROLE_HEADER, md::USER_ROLE_KEY),
        (TRACE_ID_HEADER, md::TRACE_ID_KEY),
    ] {
        if let Some(value) = headers.get(header).and_then(|v| v.to_str().ok()) {
            if !value.is_empty() {
                metadata.insert(key, value);
            }
        }
    }
    metadata
}

pub fn error_response(status: StatusCode, message: &str) -> Response {
    let body = serde_json::json!({ "error": message }).to_string();
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(body))
        .unwrap()
}

/// Map a downstream RPC failure onto the HTTP surface via the shared table.
pub fn rpc_error_response(status: &Status) -> Response {
    let code = StatusCode::from_u16(http_status_for(status.code))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    error_response(code, code.canonical_reason().unwrap_or("error"))
}

pub fn json_bytes_response(bytes: Vec<u8>) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(bytes))
        .unwrap()
}

fn mediate_error_response(err: MediateError) -> Response {
    match err {
        MediateError::BadRequest(reason) => {
            tracing::debug!(%reason, "rejecting request parameters");
            error_response(StatusCode::BAD_REQUEST, "invalid request parameters")
        }
        MediateError::Internal(reason) => {
            tracing::error!(%reason, "request parsing failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
            )
        }
    }
}

/// Serialize a successful downstream response the way every endpoint does.
pub fn respond<Resp: Serialize>(resp: &Resp) -> Result<Vec<u8>, Response> {
    serde_json::to_vec(resp).map_err(|e| {
        tracing::error!(error = %e, "failed to serialize response");
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "failed to serialize response",
        )
    })
}

type HandlerFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Build an axum handler for one endpoint.
///
/// `call` is the typed downstream operation; `parser` populates request
/// fields from URL template parameters and the query string (`None` when
/// the request has no such fields); `parse_body` says whether the body
/// carries a JSON-encoded request.
pub fn handle<Req, Resp, C, Fut>(
    call: C,
    parser: Option<ParseFn<Req>>,
    parse_body: bool,
    cache: CachePolicy,
) -> impl Fn(
    State<AppState>,
    Option<Path<HashMap<String, String>>>,
    RawQuery,
    HeaderMap,
    Bytes,
) -> HandlerFuture
       + Clone
       + Send
       + Sync
       + 'static
where
    Req: DeserializeOwned + Default + Send + 'static,
    Resp: Serialize + Send + 'static,
    C: Fn(AppState, Metadata, Req) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<Resp, Status>> + Send + 'static,
{
    move |State(state): State<AppState>,
          params: Option<Path<HashMap<String, String>>>,
          RawQuery(query): RawQuery,
          headers: HeaderMap,
          body: Bytes| {
        let call = call.clone();
        Box::pin(async move {
            let parts = RequestParts {
                params: params.map(|Path(p)| p).unwrap_or_default(),
                query: query
                    .as_deref()
                    .map(|q| serde_urlencoded::from_str(q).unwrap_or_default())
                    .unwrap_or_default(),
                headers,
            };

            let metadata = metadata_from_headers(&parts.headers);

            let read_key = match cache {
                CachePolicy::Read { key, ttl } => match key(&parts) {
                    Ok(key) => {
                        if let Some(data) = state.cache.get(&key).await {
                            return json_bytes_response(data);
                        }
                        Some((key, ttl))
                    }
                    // No key, no caching; the request still proceeds.
                    Err(_) => None,
                },
                _ => None,
            };

            let mut request = Req::default();

            if parse_body {
                request = match serde_json::from_slice(&body) {
                    Ok(request) => request,
                    Err(e) => {
                        tracing::debug!(error = %e, "failed to parse request body");
                        return error_response(StatusCode::BAD_REQUEST, "invalid request body");
                    }
                };
            }

            if let Some(parser) = parser {
                if let Err(e) = parser(&parts, &mut request) {
                    return mediate_error_response(e);
                }
            }

            let response = match call(state.clone(), metadata, request).await {
                Ok(response) => response,
                Err(status) => {
                    tracing::debug!(code = ?status.code, message = %status.message, "rpc call failed");
                    return rpc_error_response(&status);
                }
            };

            let data = match respond(&response) {
                Ok(data) => data,
                Err(response) => return response,
            };

            if let Some((key, ttl)) = read_key {
                state.cache.set(&key, data.clone(), ttl).await;
            }

            let http_response = json_bytes_response(data);

            if let CachePolicy::Invalidate { keys } = cache {
                // Built now, deleted after the response path is done.
                let built: Vec<String> = keys.iter().filter_map(|k| k(&parts).ok()).collect();
                let cache = state.cache.clone();
                tokio::spawn(async move {
                    for key in built {
                        cache.delete(&key).await;
                    }
                });
            }

            http_response
        })
    }
}
