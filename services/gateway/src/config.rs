//! Gateway configuration from environment variables.

use tutorlink_common::config::{env_or, env_parse, ConfigError};

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub http_port: u16,
    pub user_service_url: String,
    pub schedule_service_url: String,
    pub payment_service_url: String,
    pub homework_service_url: String,
    pub file_service_url: String,
    pub redis_url: String,
    pub minio_url: String,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            http_port: env_parse("HTTP_PORT", 8080)?,
            user_service_url: env_or("USER_SERVICE_URL", "127.0.0.1:50051"),
            schedule_service_url: env_or("SCHEDULE_SERVICE_URL", "127.0.0.1:50052"),
            payment_service_url: env_or("PAYMENT_SERVICE_URL", "127.0.0.1:50053"),
            homework_service_url: env_or("HOMEWORK_SERVICE_URL", "127.0.0.1:50054"),
            file_service_url: env_or("FILE_SERVICE_URL", "127.0.0.1:50055"),
            redis_url: env_or("REDIS_URL", "redis://127.0.0.1:6379"),
            minio_url: env_or("MINIO_URL", "http://127.0.0.1:9000"),
        })
    }
}
