//! Peer-backend gateways used by the payment flows. Each RPC-backed
//! gateway guards its peer with a process-wide circuit breaker; transport
//! failures keep their `Unavailable` status so the saga's retry loop can
//! tell them apart from application errors.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use tutorlink_common::{CircuitBreaker, DomainError, RequestContext};
use tutorlink_proto::file::{FileClient, GenerateDownloadUrlRequest};
use tutorlink_proto::schedule::{GetLessonRequest, MarkAsPaidRequest, ScheduleClient};

use crate::model::LessonView;

pub const BREAKER_FAILURE_THRESHOLD: u32 = 5;
pub const BREAKER_RESET_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait ScheduleGateway: Send + Sync {
    async fn get_lesson(
        &self,
        ctx: &RequestContext,
        lesson_id: Uuid,
    ) -> Result<LessonView, DomainError>;
    async fn mark_as_paid(&self, ctx: &RequestContext, lesson_id: Uuid)
        -> Result<(), DomainError>;
}

#[async_trait]
pub trait FileGateway: Send + Sync {
    async fn download_url(&self, ctx: &RequestContext, file_id: Uuid)
        -> Result<String, DomainError>;
}

pub struct RpcScheduleGateway {
    client: ScheduleClient,
    breaker: Arc<CircuitBreaker>,
}

impl RpcScheduleGateway {
    pub fn new(client: ScheduleClient) -> Self {
        Self {
            client,
            breaker: Arc::new(CircuitBreaker::new(
                BREAKER_FAILURE_THRESHOLD,
                BREAKER_RESET_TIMEOUT,
            )),
        }
    }
}

#[async_trait]
impl ScheduleGateway for RpcScheduleGateway {
    async fn get_lesson(
        &self,
        ctx: &RequestContext,
        lesson_id: Uuid,
    ) -> Result<LessonView, DomainError> {
        let metadata = ctx.to_metadata();
        let lesson = self
            .breaker
            .execute(async {
                self.client
                    .get_lesson(
                        &metadata,
                        GetLessonRequest {
                            id: lesson_id.to_string(),
                        },
                    )
                    .await
                    .map_err(DomainError::from)
            })
            .await?;

        Ok(LessonView {
            id: lesson_id,
            is_paid: lesson.is_paid,
            price_rub: lesson.price_rub,
            payment_info: lesson.payment_info,
        })
    }

    async fn mark_as_paid(
        &self,
        ctx: &RequestContext,
        lesson_id: Uuid,
    ) -> Result<(), DomainError> {
        let metadata = ctx.to_metadata();
        self.breaker
            .execute(async {
                self.client
                    .mark_as_paid(
                        &metadata,
                        MarkAsPaidRequest {
                            id: lesson_id.to_string(),
                        },
                    )
                    .await
                    .map_err(DomainError::from)
            })
            .await?;
        Ok(())
    }
}

pub struct RpcFileGateway {
    client: FileClient,
    breaker: Arc<CircuitBreaker>,
}

impl RpcFileGateway {
    pub fn new(client: FileClient) -> Self {
        Self {
            client,
            breaker: Arc::new(CircuitBreaker::new(
                BREAKER_FAILURE_THRESHOLD,
                BREAKER_RESET_TIMEOUT,
            )),
        }
    }
}

#[async_trait]
impl FileGateway for RpcFileGateway {
    async fn download_url(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
    ) -> Result<String, DomainError> {
        let metadata = ctx.to_metadata();
        let url = self
            .breaker
            .execute(async {
                self.client
                    .generate_download_url(
                        &metadata,
                        GenerateDownloadUrlRequest {
                            file_id: file_id.to_string(),
                        },
                    )
                    .await
                    .map_err(DomainError::from)
            })
            .await?;
        Ok(url.url)
    }
}
