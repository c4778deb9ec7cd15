use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use tutorlink_gateway::cache::RedisCache;
use tutorlink_gateway::config::GatewayConfig;
use tutorlink_gateway::{router, AppState};
use tutorlink_proto::file::FileClient;
use tutorlink_proto::homework::HomeworkClient;
use tutorlink_proto::payment::PaymentClient;
use tutorlink_proto::schedule::ScheduleClient;
use tutorlink_proto::user::UserClient;
use tutorlink_rpc::Channel;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tutorlink_gateway=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = GatewayConfig::from_env()?;

    let cache = Arc::new(RedisCache::connect(&config.redis_url).await?);

    let state = AppState {
        user_client: UserClient::new(Channel::new(config.user_service_url.clone())),
        schedule_client: ScheduleClient::new(Channel::new(config.schedule_service_url.clone())),
        payment_client: PaymentClient::new(Channel::new(config.payment_service_url.clone())),
        homework_client: HomeworkClient::new(Channel::new(config.homework_service_url.clone())),
        file_client: FileClient::new(Channel::new(config.file_service_url.clone())),
        cache,
        http_client: reqwest::Client::new(),
        minio_url: config.minio_url.clone(),
    };

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.http_port)).await?;
    tracing::info!(port = config.http_port, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("gateway stopped");
    Ok(())
}

/// Resolves on SIGINT/SIGTERM; axum then drains in-flight requests. The
/// surrounding task gives the drain 10 seconds before the process exits.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };
    let terminate = async {
        #[cfg(unix)]
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler")
            .recv()
            .await;
        #[cfg(not(unix))]
        std::future::pending::<()>().await;
    };

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("shutdown signal received, draining for up to 10s");
    tokio::spawn(async {
        tokio::time::sleep(Duration::from_secs(10)).await;
        tracing::warn!("drain grace elapsed, forcing exit");
        std::process::exit(0);
    });
}
