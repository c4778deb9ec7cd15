//! Edge middleware: request logging with trace ids, and the auth
//! front-door that turns an `Authorization` header into propagated
//! identity headers.

use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use tutorlink_proto::user::AuthorizeByAuthHeaderRequest;
use tutorlink_rpc::Code;

use crate::mediator::{error_response, metadata_from_headers, TRACE_ID_HEADER, USER_ID_HEADER, USER_ROLE_HEADER};
use crate::AppState;

/// Assigns a fresh time-ordered trace id to every request, mirrors it on
/// the response, and logs the request outcome.
pub async fn logging(mut request: Request, next: Next) -> Response {
    let trace_id = Uuid::now_v7().to_string();
    let trace_value =
        HeaderValue::from_str(&trace_id).unwrap_or_else(|_| HeaderValue::from_static("-"));
    request.headers_mut().insert(TRACE_ID_HEADER, trace_value.clone());

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let mut response = next.run(request).await;
    response.headers_mut().insert(TRACE_ID_HEADER, trace_value);

    tracing::info!(
        trace_id = %trace_id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        duration_ms = started.elapsed().as_millis() as u64,
        "request completed"
    );
    response
}

/// Rejects unauthenticated requests and injects the resolved identity.
///
/// The middleware never inspects the token itself; the user backend owns
/// all credential semantics.
pub async fn auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(header) = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
    else {
        tracing::info!(path = request.uri().path(), "no authorization header");
        return error_response(StatusCode::UNAUTHORIZED, "Unauthorized");
    };

    let metadata = metadata_from_headers(request.headers());
    let user = match state
        .user_client
        .authorize_by_auth_header(
            &metadata,
            AuthorizeByAuthHeaderRequest {
                authorization_header: header,
            },
        )
        .await
    {
        Ok(user) => user,
        Err(status) if matches!(status.code, Code::PermissionDenied | Code::Unauthenticated) => {
            tracing::info!(path = request.uri().path(), "authorization denied");
            return error_response(StatusCode::UNAUTHORIZED, "Unauthorized");
        }
        Err(status) => {
            tracing::error!(
                path = request.uri().path(),
                code = ?status.code,
                message = %status.message,
                "auth request failed"
            );
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        }
    };

    // Overwrite, never trust caller-supplied identity headers.
    if let Ok(id) = HeaderValue::from_str(&user.id) {
        request.headers_mut().insert(USER_ID_HEADER, id);
    }
    if let Ok(role) = HeaderValue::from_str(&user.role) {
        request.headers_mut().insert(USER_ROLE_HEADER, role);
    }

    next.run(request).await
}
