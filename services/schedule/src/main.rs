mod client;
mod config;
mod events;
mod model;
mod repository;
mod server;
mod service;
mod worker;

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use tutorlink_proto::user::UserClient;
use tutorlink_rpc::{Channel, RpcServer};

use crate::client::UserServicePairLookup;
use crate::config::Config;
use crate::events::KafkaEventSink;
use crate::repository::PostgresScheduleRepository;
use crate::service::ScheduleService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tutorlink_schedule=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .connect(&config.database_url)
        .await?;
    tracing::info!("database connection established");

    if config.auto_migrate {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("database migrations applied");
    }

    let repo = Arc::new(PostgresScheduleRepository::new(pool.clone()));
    let pairs = Arc::new(UserServicePairLookup::new(UserClient::new(Channel::new(
        config.user_service_url.clone(),
    ))));
    let events = Arc::new(KafkaEventSink::new(
        &config.kafka_brokers,
        &config.kafka_reminder_topic,
    )?);

    let service = Arc::new(ScheduleService::new(repo.clone(), pairs, events));

    let mut server = RpcServer::new();
    server::register(&mut server, service);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.rpc_port)).await?;
    tracing::info!(
        port = config.rpc_port,
        user_service = %config.user_service_url,
        "schedule service listening"
    );

    let shutdown = CancellationToken::new();

    let worker_repo = repo.clone();
    let worker_token = shutdown.clone();
    let worker = tokio::spawn(worker::run_completed_lessons_worker(
        worker_repo,
        Duration::from_secs(config.completed_lessons_interval_secs),
        worker_token,
    ));

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("shutdown signal received");
        signal_token.cancel();
    });

    server.serve(listener, shutdown).await?;
    worker.await.ok();
    pool.close().await;
    tracing::info!("schedule service stopped");
    Ok(())
}

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
}
