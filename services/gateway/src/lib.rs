//! The HTTP edge: authenticates callers, bridges HTTP/JSON to the backend
//! RPC protocol, and caches idempotent reads.

pub mod cache;
pub mod config;
pub mod handlers;
pub mod mediator;
pub mod middleware;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use tutorlink_proto::file::FileClient;
use tutorlink_proto::homework::HomeworkClient;
use tutorlink_proto::payment::PaymentClient;
use tutorlink_proto::schedule::ScheduleClient;
use tutorlink_proto::user::UserClient;

use crate::cache::Cache;

/// Inbound bodies above this are rejected with 413 before any parsing.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub user_client: UserClient,
    pub schedule_client: ScheduleClient,
    pub payment_client: PaymentClient,
    pub homework_client: HomeworkClient,
    pub file_client: FileClient,
    pub cache: Arc<dyn Cache>,
    pub http_client: reqwest::Client,
    pub minio_url: String,
}

async fn health() -> axum::response::Response {
    axum::response::Response::builder()
        .header("Content-Type", "application/json")
        .body(axum::body::Body::from(r#"{"status":"ok"}"#))
        .unwrap()
}

pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .merge(handlers::users::public_routes())
        .merge(handlers::files::public_routes());

    let authed = Router::new()
        .merge(handlers::users::routes())
        .merge(handlers::schedule::routes())
        .merge(handlers::payment::routes())
        .merge(handlers::homework::routes())
        .merge(handlers::files::routes())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth,
        ));

    Router::new()
        .merge(public)
        .merge(authed)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(axum::middleware::from_fn(middleware::logging))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
