mod authorization;
mod config;
mod model;
mod repository;
mod server;
mod service;

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use tutorlink_rpc::RpcServer;

use crate::config::Config;
use crate::repository::{PostgresTutorStudentRepository, PostgresUserRepository};
use crate::service::UserService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tutorlink_user=debug".into()),
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

    let service = Arc::new(UserService::new(
        Arc::new(PostgresUserRepository::new(pool.clone())),
        Arc::new(PostgresTutorStudentRepository::new(pool.clone())),
        config.telegram_auth_secret.clone(),
    ));

    let mut server = RpcServer::new();
    server::register(&mut server, service);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.rpc_port)).await?;
    tracing::info!(port = config.rpc_port, "user service listening");

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("shutdown signal received");
        signal_token.cancel();
    });

    server.serve(listener, shutdown).await?;
    pool.close().await;
    tracing::info!("user service stopped");
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
