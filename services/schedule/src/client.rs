//! The schedule backend's view of the user backend: pair lookups for
//! cross-backend authorization.

use async_trait::async_trait;
use uuid::Uuid;

use tutorlink_common::{DomainError, RequestContext};
use tutorlink_proto::user::{GetTutorStudentRequest, UserClient};
use tutorlink_rpc::Code;

#[async_trait]
pub trait PairLookup: Send + Sync {
    /// The pair's relationship status, or `None` when no pair exists.
    async fn pair_status(
        &self,
        ctx: &RequestContext,
        tutor_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<String>, DomainError>;
}

pub struct UserServicePairLookup {
    client: UserClient,
}

impl UserServicePairLookup {
    pub fn new(client: UserClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PairLookup for UserServicePairLookup {
    async fn pair_status(
        &self,
        ctx: &RequestContext,
        tutor_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<String>, DomainError> {
        let metadata = ctx.to_metadata();
        match self
            .client
            .get_tutor_student(
                &metadata,
                GetTutorStudentRequest {
                    tutor_id: tutor_id.to_string(),
                    student_id: student_id.to_string(),
                },
            )
            .await
        {
            Ok(ts) => Ok(Some(ts.status)),
            Err(status) if status.code == Code::NotFound => Ok(None),
            Err(status) => Err(DomainError::internal(format!(
                "failed to verify tutor-student pair: {status}"
            ))),
        }
    }
}
