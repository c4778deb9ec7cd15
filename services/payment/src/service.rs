//! The payment-submission saga and the other receipt flows.
//!
//! Saga ordering: load lesson (paid guard) → create receipt → mark the
//! lesson paid. A crash after step 2 leaves a receipt without the paid
//! flip; the guard in step 1 plus the unique receipt-per-lesson key make
//! a client retry safe to re-drive.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use tutorlink_common::{retry_with_backoff, DomainError, RequestContext};

use crate::clients::{FileGateway, ScheduleGateway};
use crate::model::{PaymentInfo, PaymentReceipt};
use crate::repository::ReceiptRepository;

const MAX_RETRIES: u32 = 6;
const RETRY_DELAY: Duration = Duration::from_millis(100);

const ROLE_STUDENT: &str = "student";
const ROLE_TUTOR: &str = "tutor";

pub struct PaymentService {
    repo: Arc<dyn ReceiptRepository>,
    schedule: Arc<dyn ScheduleGateway>,
    files: Arc<dyn FileGateway>,
}

impl PaymentService {
    pub fn new(
        repo: Arc<dyn ReceiptRepository>,
        schedule: Arc<dyn ScheduleGateway>,
        files: Arc<dyn FileGateway>,
    ) -> Self {
        Self {
            repo,
            schedule,
            files,
        }
    }

    pub async fn submit_payment_receipt(
        &self,
        ctx: &RequestContext,
        lesson_id: Uuid,
        file_id: Uuid,
    ) -> Result<PaymentReceipt, DomainError> {
        ctx.require_role(ROLE_STUDENT)?;
        if lesson_id.is_nil() || file_id.is_nil() {
            return Err(DomainError::Validation(
                "lesson id and file id are required".to_string(),
            ));
        }

        let lesson = retry_with_backoff(MAX_RETRIES, RETRY_DELAY, || {
            self.schedule.get_lesson(ctx, lesson_id)
        })
        .await?;

        if lesson.is_paid {
            return Err(DomainError::AlreadyExists(
                "lesson is already paid".to_string(),
            ));
        }

        let now = Utc::now();
        let receipt = PaymentReceipt {
            id: Uuid::now_v7(),
            lesson_id,
            file_id,
            is_verified: false,
            created_at: now,
            edited_at: now,
        };
        retry_with_backoff(MAX_RETRIES, RETRY_DELAY, || self.repo.create(&receipt)).await?;

        // On failure here the receipt stays; the paid-flip can be
        // re-driven because step 1 guards and the flip is idempotent.
        retry_with_backoff(MAX_RETRIES, RETRY_DELAY, || {
            self.schedule.mark_as_paid(ctx, lesson_id)
        })
        .await?;

        Ok(receipt)
    }

    pub async fn get_payment_info(
        &self,
        ctx: &RequestContext,
        lesson_id: Uuid,
    ) -> Result<PaymentInfo, DomainError> {
        if lesson_id.is_nil() {
            return Err(DomainError::Validation("lesson id is required".to_string()));
        }

        let lesson = retry_with_backoff(MAX_RETRIES, RETRY_DELAY, || {
            self.schedule.get_lesson(ctx, lesson_id)
        })
        .await?;

        Ok(PaymentInfo {
            lesson_id,
            price_rub: lesson.price_rub,
            payment_details: lesson.payment_info,
        })
    }

    pub async fn get_receipt(
        &self,
        _ctx: &RequestContext,
        receipt_id: Uuid,
    ) -> Result<PaymentReceipt, DomainError> {
        if receipt_id.is_nil() {
            return Err(DomainError::Validation(
                "receipt id is required".to_string(),
            ));
        }
        self.repo.get(receipt_id).await
    }

    /// Tutor-only one-way flip; verifying twice equals verifying once.
    pub async fn verify_receipt(
        &self,
        ctx: &RequestContext,
        receipt_id: Uuid,
    ) -> Result<PaymentReceipt, DomainError> {
        ctx.require_role(ROLE_TUTOR)?;
        if receipt_id.is_nil() {
            return Err(DomainError::Validation(
                "receipt id is required".to_string(),
            ));
        }
        self.repo.set_verified(receipt_id, true).await
    }

    pub async fn get_receipt_file(
        &self,
        ctx: &RequestContext,
        receipt_id: Uuid,
    ) -> Result<String, DomainError> {
        if receipt_id.is_nil() {
            return Err(DomainError::Validation(
                "receipt id is required".to_string(),
            ));
        }
        let receipt = self.repo.get(receipt_id).await?;
        self.files.download_url(ctx, receipt.file_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tutorlink_rpc::Status;

    use crate::model::LessonView;

    #[derive(Default)]
    struct MemoryReceipts {
        receipts: Mutex<HashMap<Uuid, PaymentReceipt>>,
        by_lesson: Mutex<HashMap<Uuid, Uuid>>,
        create_calls: AtomicU32,
    }

    #[async_trait]
    impl ReceiptRepository for MemoryReceipts {
        async fn create(&self, receipt: &PaymentReceipt) -> Result<(), DomainError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            let mut by_lesson = self.by_lesson.lock().unwrap();
            if by_lesson.contains_key(&receipt.lesson_id) {
                return Err(DomainError::AlreadyExists("receipt exists".to_string()));
            }
            by_lesson.insert(receipt.lesson_id, receipt.id);
            self.receipts
                .lock()
                .unwrap()
                .insert(receipt.id, receipt.clone());
            Ok(())
        }

        async fn get(&self, id: Uuid) -> Result<PaymentReceipt, DomainError> {
            self.receipts
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .ok_or_else(|| DomainError::NotFound("receipt not found".to_string()))
        }

        async fn set_verified(
            &self,
            id: Uuid,
            verified: bool,
        ) -> Result<PaymentReceipt, DomainError> {
            let mut receipts = self.receipts.lock().unwrap();
            let receipt = receipts
                .get_mut(&id)
                .ok_or_else(|| DomainError::NotFound("receipt not found".to_string()))?;
            receipt.is_verified = verified;
            Ok(receipt.clone())
        }
    }

    /// Scripted schedule peer: optionally fails the first N get-lesson
    /// calls with Unavailable, then serves the configured lesson.
    struct ScriptedSchedule {
        lesson: Mutex<LessonView>,
        get_failures: AtomicU32,
        get_calls: AtomicU32,
        mark_calls: AtomicU32,
    }

    impl ScriptedSchedule {
        fn new(is_paid: bool) -> Self {
            Self {
                lesson: Mutex::new(LessonView {
                    id: Uuid::now_v7(),
                    is_paid,
                    price_rub: Some(1500),
                    payment_info: Some("card 1234".to_string()),
                }),
                get_failures: AtomicU32::new(0),
                get_calls: AtomicU32::new(0),
                mark_calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ScheduleGateway for ScriptedSchedule {
        async fn get_lesson(
            &self,
            _ctx: &RequestContext,
            lesson_id: Uuid,
        ) -> Result<LessonView, DomainError> {
            let call = self.get_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.get_failures.load(Ordering::SeqCst) {
                return Err(DomainError::Status(Status::unavailable("schedule down")));
            }
            let mut lesson = self.lesson.lock().unwrap().clone();
            lesson.id = lesson_id;
            Ok(lesson)
        }

        async fn mark_as_paid(
            &self,
            _ctx: &RequestContext,
            _lesson_id: Uuid,
        ) -> Result<(), DomainError> {
            self.mark_calls.fetch_add(1, Ordering::SeqCst);
            self.lesson.lock().unwrap().is_paid = true;
            Ok(())
        }
    }

    struct StaticFiles;

    #[async_trait]
    impl FileGateway for StaticFiles {
        async fn download_url(
            &self,
            _ctx: &RequestContext,
            file_id: Uuid,
        ) -> Result<String, DomainError> {
            Ok(format!("https://files.example/{file_id}"))
        }
    }

    fn student_ctx() -> RequestContext {
        RequestContext {
            user_id: Some(Uuid::now_v7().to_string()),
            user_role: Some(ROLE_STUDENT.to_string()),
            trace_id: None,
        }
    }

    fn tutor_ctx() -> RequestContext {
        RequestContext {
            user_id: Some(Uuid::now_v7().to_string()),
            user_role: Some(ROLE_TUTOR.to_string()),
            trace_id: None,
        }
    }

    fn service(
        schedule: Arc<ScriptedSchedule>,
    ) -> (PaymentService, Arc<MemoryReceipts>) {
        let repo = Arc::new(MemoryReceipts::default());
        (
            PaymentService::new(repo.clone(), schedule, Arc::new(StaticFiles)),
            repo,
        )
    }

    #[tokio::test]
    async fn saga_creates_receipt_and_marks_the_lesson_paid() {
        let schedule = Arc::new(ScriptedSchedule::new(false));
        let (service, repo) = service(schedule.clone());

        let receipt = service
            .submit_payment_receipt(&student_ctx(), Uuid::now_v7(), Uuid::now_v7())
            .await
            .unwrap();

        assert!(!receipt.is_verified);
        assert_eq!(repo.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(schedule.mark_calls.load(Ordering::SeqCst), 1);
        assert!(schedule.lesson.lock().unwrap().is_paid);
    }

    #[tokio::test]
    async fn paid_lesson_aborts_the_saga_without_side_effects() {
        let schedule = Arc::new(ScriptedSchedule::new(true));
        let (service, repo) = service(schedule.clone());

        let err = service
            .submit_payment_receipt(&student_ctx(), Uuid::now_v7(), Uuid::now_v7())
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::AlreadyExists(_)));
        assert_eq!(repo.create_calls.load(Ordering::SeqCst), 0);
        assert_eq!(schedule.mark_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn transient_schedule_failures_are_retried_then_succeed() {
        let schedule = Arc::new(ScriptedSchedule::new(false));
        schedule.get_failures.store(4, Ordering::SeqCst);
        let (service, _repo) = service(schedule.clone());

        let receipt = service
            .submit_payment_receipt(&student_ctx(), Uuid::now_v7(), Uuid::now_v7())
            .await
            .unwrap();

        assert!(!receipt.is_verified);
        // Four Unavailable responses plus the success.
        assert_eq!(schedule.get_calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn persistent_unavailability_exhausts_the_retries() {
        let schedule = Arc::new(ScriptedSchedule::new(false));
        schedule.get_failures.store(100, Ordering::SeqCst);
        let (service, repo) = service(schedule.clone());

        let err = service
            .submit_payment_receipt(&student_ctx(), Uuid::now_v7(), Uuid::now_v7())
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Internal(_)));
        assert_eq!(schedule.get_calls.load(Ordering::SeqCst), 6);
        assert_eq!(repo.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn submission_requires_the_student_role_and_real_ids() {
        let schedule = Arc::new(ScriptedSchedule::new(false));
        let (service, _repo) = service(schedule);

        let err = service
            .submit_payment_receipt(&tutor_ctx(), Uuid::now_v7(), Uuid::now_v7())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));

        let err = service
            .submit_payment_receipt(&student_ctx(), Uuid::nil(), Uuid::now_v7())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn verify_receipt_is_tutor_only_and_idempotent() {
        let schedule = Arc::new(ScriptedSchedule::new(false));
        let (service, _repo) = service(schedule);

        let receipt = service
            .submit_payment_receipt(&student_ctx(), Uuid::now_v7(), Uuid::now_v7())
            .await
            .unwrap();

        let err = service
            .verify_receipt(&student_ctx(), receipt.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));

        let once = service.verify_receipt(&tutor_ctx(), receipt.id).await.unwrap();
        assert!(once.is_verified);
        let twice = service.verify_receipt(&tutor_ctx(), receipt.id).await.unwrap();
        assert!(twice.is_verified);
    }

    #[tokio::test]
    async fn payment_info_is_a_pure_read_through() {
        let schedule = Arc::new(ScriptedSchedule::new(false));
        let (service, repo) = service(schedule.clone());

        let info = service
            .get_payment_info(&student_ctx(), Uuid::now_v7())
            .await
            .unwrap();
        assert_eq!(info.price_rub, Some(1500));
        assert_eq!(info.payment_details.as_deref(), Some("card 1234"));
        assert_eq!(repo.create_calls.load(Ordering::SeqCst), 0);
        assert_eq!(schedule.mark_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn receipt_file_url_comes_from_the_file_backend() {
        let schedule = Arc::new(ScriptedSchedule::new(false));
        let (service, _repo) = service(schedule);

        let file_id = Uuid::now_v7();
        let receipt = service
            .submit_payment_receipt(&student_ctx(), Uuid::now_v7(), file_id)
            .await
            .unwrap();

        let url = service
            .get_receipt_file(&student_ctx(), receipt.id)
            .await
            .unwrap();
        assert_eq!(url, format!("https://files.example/{file_id}"));
    }
}
