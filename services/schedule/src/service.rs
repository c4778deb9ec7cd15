//! The booking engine: slot and lesson state machines with their
//! authorization gates and the reminder events that follow bookings.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use tutorlink_common::{DomainError, RequestContext};
use tutorlink_rpc::Status;

use crate::client::PairLookup;
use crate::events::{EventSink, ReminderEvent};
use crate::model::{Lesson, LessonStatus, Slot};
use crate::repository::ScheduleRepository;

const PAIR_STATUS_ACTIVE: &str = "active";

#[derive(Debug, Clone)]
pub struct CreateSlotInput {
    pub tutor_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateLessonInput {
    pub slot_id: Uuid,
    pub student_id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateLessonInput {
    pub connection_link: Option<String>,
    pub price_rub: Option<i32>,
    pub payment_info: Option<String>,
}

pub struct ScheduleService {
    repo: Arc<dyn ScheduleRepository>,
    pairs: Arc<dyn PairLookup>,
    events: Arc<dyn EventSink>,
}

impl ScheduleService {
    pub fn new(
        repo: Arc<dyn ScheduleRepository>,
        pairs: Arc<dyn PairLookup>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            repo,
            pairs,
            events,
        }
    }

    /// Cross-backend pair check: the pair must exist with status `active`
    /// and the caller must be the side their role claims.
    async fn is_valid_pair(
        &self,
        ctx: &RequestContext,
        tutor_id: Uuid,
        student_id: Uuid,
    ) -> Result<bool, DomainError> {
        let caller = ctx.user_id()?;
        let role = ctx.user_role()?.to_string();

        let status = self.pairs.pair_status(ctx, tutor_id, student_id).await?;
        if status.as_deref() != Some(PAIR_STATUS_ACTIVE) {
            return Ok(false);
        }

        Ok(match role.as_str() {
            "tutor" => caller == tutor_id,
            "student" => caller == student_id,
            _ => false,
        })
    }

    fn is_tutor(ctx: &RequestContext, user_id: Uuid) -> Result<bool, DomainError> {
        let caller = ctx.user_id()?;
        if caller != user_id {
            return Ok(false);
        }
        Ok(ctx.user_role()? == "tutor")
    }

    fn validate_time_range(
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if starts_at >= ends_at {
            return Err(DomainError::Validation("invalid time range".to_string()));
        }
        if starts_at <= Utc::now() {
            return Err(DomainError::Validation(
                "slot must be scheduled in the future".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn get_slot(&self, ctx: &RequestContext, id: Uuid) -> Result<Slot, DomainError> {
        let caller = ctx.user_id()?;
        let slot = self.repo.get_slot(id).await?;

        if slot.tutor_id != caller
            && !self
                .is_valid_pair(ctx, slot.tutor_id, caller)
                .await
                .unwrap_or(false)
        {
            return Err(DomainError::PermissionDenied(
                "permission denied".to_string(),
            ));
        }
        Ok(slot)
    }

    pub async fn create_slot(
        &self,
        ctx: &RequestContext,
        input: CreateSlotInput,
    ) -> Result<Slot, DomainError> {
        let caller = ctx.user_id()?;
        if !Self::is_tutor(ctx, caller)? {
            return Err(DomainError::PermissionDenied(
                "only tutors can create slots".to_string(),
            ));
        }
        if input.tutor_id != caller {
            return Err(DomainError::PermissionDenied(
                "cannot create slots for another tutor".to_string(),
            ));
        }
        Self::validate_time_range(input.starts_at, input.ends_at)?;

        let slot = Slot {
            id: Uuid::now_v7(),
            tutor_id: input.tutor_id,
            starts_at: input.starts_at,
            ends_at: input.ends_at,
            is_booked: false,
            created_at: Utc::now(),
            edited_at: None,
        };
        self.repo.create_slot(&slot).await?;
        Ok(slot)
    }

    pub async fn update_slot(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Result<Slot, DomainError> {
        let caller = ctx.user_id()?;
        let mut slot = self.repo.get_slot(id).await?;

        if slot.tutor_id != caller {
            return Err(DomainError::PermissionDenied(
                "permission denied".to_string(),
            ));
        }
        if slot.is_booked {
            return Err(DomainError::Status(Status::failed_precondition(
                "cannot update a booked slot",
            )));
        }
        Self::validate_time_range(starts_at, ends_at)?;

        slot.starts_at = starts_at;
        slot.ends_at = ends_at;
        slot.edited_at = Some(Utc::now());
        self.repo.update_slot(&slot).await?;
        Ok(slot)
    }

    pub async fn delete_slot(&self, ctx: &RequestContext, id: Uuid) -> Result<(), DomainError> {
        let caller = ctx.user_id()?;
        let slot = self.repo.get_slot(id).await?;

        if slot.tutor_id != caller {
            return Err(DomainError::PermissionDenied(
                "permission denied".to_string(),
            ));
        }
        if slot.is_booked {
            return Err(DomainError::Status(Status::failed_precondition(
                "cannot delete a booked slot",
            )));
        }
        self.repo.delete_slot(id).await
    }

    pub async fn list_slots_by_tutor(
        &self,
        ctx: &RequestContext,
        tutor_id: Uuid,
        only_available: bool,
    ) -> Result<Vec<Slot>, DomainError> {
        let caller = ctx.user_id()?;
        if tutor_id != caller
            && !self
                .is_valid_pair(ctx, tutor_id, caller)
                .await
                .unwrap_or(false)
        {
            return Err(DomainError::PermissionDenied(
                "permission denied".to_string(),
            ));
        }
        self.repo.list_slots_by_tutor(tutor_id, only_available).await
    }

    pub async fn get_lesson(&self, ctx: &RequestContext, id: Uuid) -> Result<Lesson, DomainError> {
        let caller = ctx.user_id()?;
        let lesson = self.repo.get_lesson(id).await?;
        let slot = self.repo.get_slot(lesson.slot_id).await?;

        if caller != slot.tutor_id && caller != lesson.student_id {
            return Err(DomainError::PermissionDenied(
                "permission denied".to_string(),
            ));
        }
        Ok(lesson)
    }

    /// Atomic book: the repository re-checks the slot under a row lock, so
    /// of two concurrent bookings exactly one wins.
    pub async fn create_lesson(
        &self,
        ctx: &RequestContext,
        input: CreateLessonInput,
    ) -> Result<Lesson, DomainError> {
        let caller = ctx.user_id()?;
        let slot = self.repo.get_slot(input.slot_id).await?;

        if slot.is_booked {
            return Err(DomainError::AlreadyExists(
                "slot is already booked".to_string(),
            ));
        }

        let (tutor_id, student_id) = if caller == slot.tutor_id {
            (caller, input.student_id)
        } else if caller == input.student_id {
            (slot.tutor_id, caller)
        } else {
            return Err(DomainError::PermissionDenied(
                "permission denied".to_string(),
            ));
        };

        if !self.is_valid_pair(ctx, tutor_id, student_id).await? {
            return Err(DomainError::Status(Status::failed_precondition(
                "tutor and student are not connected",
            )));
        }

        let now = Utc::now();
        let lesson = Lesson {
            id: Uuid::now_v7(),
            slot_id: input.slot_id,
            student_id,
            status: LessonStatus::Booked,
            is_paid: false,
            connection_link: None,
            price_rub: None,
            payment_info: None,
            created_at: now,
            edited_at: now,
        };
        self.repo.create_lesson_and_book_slot(&lesson).await?;

        self.emit(&lesson, &slot, "booked").await;
        Ok(lesson)
    }

    pub async fn update_lesson(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        input: UpdateLessonInput,
    ) -> Result<Lesson, DomainError> {
        let caller = ctx.user_id()?;
        let mut lesson = self.repo.get_lesson(id).await?;
        let slot = self.repo.get_slot(lesson.slot_id).await?;

        if caller != slot.tutor_id {
            return Err(DomainError::PermissionDenied(
                "only tutors can update lesson details".to_string(),
            ));
        }

        let mut updated = false;
        if let Some(link) = input.connection_link {
            lesson.connection_link = Some(link);
            updated = true;
        }
        if let Some(price) = input.price_rub {
            lesson.price_rub = Some(price);
            updated = true;
        }
        if let Some(info) = input.payment_info {
            lesson.payment_info = Some(info);
            updated = true;
        }

        if updated {
            lesson.edited_at = Utc::now();
            self.repo.update_lesson(&lesson).await?;
        }
        Ok(lesson)
    }

    pub async fn cancel_lesson(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> Result<Lesson, DomainError> {
        let caller = ctx.user_id()?;
        let mut lesson = self.repo.get_lesson(id).await?;
        let slot = self.repo.get_slot(lesson.slot_id).await?;

        if caller != slot.tutor_id && caller != lesson.student_id {
            return Err(DomainError::PermissionDenied(
                "permission denied".to_string(),
            ));
        }

        lesson.status = LessonStatus::Cancelled;
        lesson.edited_at = Utc::now();
        self.repo
            .cancel_lesson_and_free_slot(lesson.id, lesson.slot_id, lesson.edited_at)
            .await?;

        self.emit(&lesson, &slot, "cancelled").await;
        Ok(lesson)
    }

    pub async fn list_lessons_by_tutor(
        &self,
        ctx: &RequestContext,
        tutor_id: Uuid,
        statuses: &[LessonStatus],
    ) -> Result<Vec<Lesson>, DomainError> {
        let caller = ctx.user_id()?;
        if tutor_id != caller {
            return Err(DomainError::PermissionDenied(
                "permission denied".to_string(),
            ));
        }
        self.repo.list_lessons_by_tutor(tutor_id, statuses).await
    }

    pub async fn list_lessons_by_student(
        &self,
        ctx: &RequestContext,
        student_id: Uuid,
        statuses: &[LessonStatus],
    ) -> Result<Vec<Lesson>, DomainError> {
        let caller = ctx.user_id()?;
        if student_id != caller {
            return Err(DomainError::PermissionDenied(
                "permission denied".to_string(),
            ));
        }
        self.repo.list_lessons_by_student(student_id, statuses).await
    }

    pub async fn list_lessons_by_pair(
        &self,
        ctx: &RequestContext,
        tutor_id: Uuid,
        student_id: Uuid,
        statuses: &[LessonStatus],
    ) -> Result<Vec<Lesson>, DomainError> {
        let caller = ctx.user_id()?;
        if tutor_id != caller && student_id != caller {
            return Err(DomainError::PermissionDenied(
                "permission denied".to_string(),
            ));
        }
        if !self.is_valid_pair(ctx, tutor_id, student_id).await? {
            return Err(DomainError::PermissionDenied(
                "tutor and student are not connected".to_string(),
            ));
        }
        self.repo
            .list_lessons_by_pair(tutor_id, student_id, statuses)
            .await
    }

    pub async fn list_completed_unpaid_lessons(
        &self,
        ctx: &RequestContext,
        after: Option<DateTime<Utc>>,
    ) -> Result<Vec<Lesson>, DomainError> {
        let caller = ctx.user_id()?;
        if !Self::is_tutor(ctx, caller)? {
            return Err(DomainError::PermissionDenied(
                "permission denied".to_string(),
            ));
        }
        self.repo.list_completed_unpaid_lessons(after).await
    }

    /// Monotonic paid flip; marking twice is the same as marking once.
    pub async fn mark_as_paid(&self, ctx: &RequestContext, id: Uuid) -> Result<Lesson, DomainError> {
        ctx.user_id()?;
        let mut lesson = self.repo.get_lesson(id).await?;
        self.repo.mark_as_paid(lesson.id).await?;
        lesson.is_paid = true;
        Ok(lesson)
    }

    async fn emit(&self, lesson: &Lesson, slot: &Slot, event_type: &str) {
        let event = ReminderEvent {
            lesson_id: lesson.id.to_string(),
            slot_id: slot.id.to_string(),
            tutor_id: slot.tutor_id.to_string(),
            student_id: lesson.student_id.to_string(),
            starts_at: slot.starts_at,
            ends_at: slot.ends_at,
            event_type: event_type.to_string(),
            connection_link: lesson.connection_link.clone(),
        };
        // A reminder is best-effort; losing one never fails the booking.
        if let Err(e) = self.events.send(&event).await {
            tracing::error!(lesson_id = %lesson.id, error = %e, "failed to publish reminder event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tutorlink_rpc::Code;

    #[derive(Default)]
    struct MemoryRepo {
        slots: Mutex<HashMap<Uuid, Slot>>,
        lessons: Mutex<HashMap<Uuid, Lesson>>,
    }

    #[async_trait]
    impl ScheduleRepository for MemoryRepo {
        async fn get_slot(&self, id: Uuid) -> Result<Slot, DomainError> {
            self.slots
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .ok_or_else(|| DomainError::NotFound("slot not found".to_string()))
        }

        async fn create_slot(&self, slot: &Slot) -> Result<(), DomainError> {
            self.slots.lock().unwrap().insert(slot.id, slot.clone());
            Ok(())
        }

        async fn update_slot(&self, slot: &Slot) -> Result<(), DomainError> {
            self.slots.lock().unwrap().insert(slot.id, slot.clone());
            Ok(())
        }

        async fn delete_slot(&self, id: Uuid) -> Result<(), DomainError> {
            self.slots
                .lock()
                .unwrap()
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| DomainError::NotFound("slot not found".to_string()))
        }

        async fn list_slots_by_tutor(
            &self,
            tutor_id: Uuid,
            only_available: bool,
        ) -> Result<Vec<Slot>, DomainError> {
            Ok(self
                .slots
                .lock()
                .unwrap()
                .values()
                .filter(|s| s.tutor_id == tutor_id && (!only_available || !s.is_booked))
                .cloned()
                .collect())
        }

        async fn get_lesson(&self, id: Uuid) -> Result<Lesson, DomainError> {
            self.lessons
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .ok_or_else(|| DomainError::NotFound("lesson not found".to_string()))
        }

        async fn create_lesson_and_book_slot(&self, lesson: &Lesson) -> Result<(), DomainError> {
            // One mutex guards both maps, which makes the check-and-book
            // atomic just like the row lock does in Postgres.
            let mut slots = self.slots.lock().unwrap();
            let slot = slots
                .get_mut(&lesson.slot_id)
                .ok_or_else(|| DomainError::NotFound("slot not found".to_string()))?;
            if slot.is_booked {
                return Err(DomainError::AlreadyExists(
                    "slot is already booked".to_string(),
                ));
            }
            slot.is_booked = true;
            self.lessons
                .lock()
                .unwrap()
                .insert(lesson.id, lesson.clone());
            Ok(())
        }

        async fn update_lesson(&self, lesson: &Lesson) -> Result<(), DomainError> {
            self.lessons
                .lock()
                .unwrap()
                .insert(lesson.id, lesson.clone());
            Ok(())
        }

        async fn cancel_lesson_and_free_slot(
            &self,
            lesson_id: Uuid,
            slot_id: Uuid,
            edited_at: DateTime<Utc>,
        ) -> Result<(), DomainError> {
            let mut slots = self.slots.lock().unwrap();
            let mut lessons = self.lessons.lock().unwrap();
            if let Some(lesson) = lessons.get_mut(&lesson_id) {
                lesson.status = LessonStatus::Cancelled;
                lesson.edited_at = edited_at;
            }
            if let Some(slot) = slots.get_mut(&slot_id) {
                slot.is_booked = false;
            }
            Ok(())
        }

        async fn list_lessons_by_tutor(
            &self,
            tutor_id: Uuid,
            statuses: &[LessonStatus],
        ) -> Result<Vec<Lesson>, DomainError> {
            let slots = self.slots.lock().unwrap();
            Ok(self
                .lessons
                .lock()
                .unwrap()
                .values()
                .filter(|l| {
                    slots
                        .get(&l.slot_id)
                        .is_some_and(|s| s.tutor_id == tutor_id)
                        && (statuses.is_empty() || statuses.contains(&l.status))
                })
                .cloned()
                .collect())
        }

        async fn list_lessons_by_student(
            &self,
            student_id: Uuid,
            statuses: &[LessonStatus],
        ) -> Result<Vec<Lesson>, DomainError> {
            Ok(self
                .lessons
                .lock()
                .unwrap()
                .values()
                .filter(|l| {
                    l.student_id == student_id
                        && (statuses.is_empty() || statuses.contains(&l.status))
                })
                .cloned()
                .collect())
        }

        async fn list_lessons_by_pair(
            &self,
            tutor_id: Uuid,
            student_id: Uuid,
            statuses: &[LessonStatus],
        ) -> Result<Vec<Lesson>, DomainError> {
            let slots = self.slots.lock().unwrap();
            Ok(self
                .lessons
                .lock()
                .unwrap()
                .values()
                .filter(|l| {
                    l.student_id == student_id
                        && slots
                            .get(&l.slot_id)
                            .is_some_and(|s| s.tutor_id == tutor_id)
                        && (statuses.is_empty() || statuses.contains(&l.status))
                })
                .cloned()
                .collect())
        }

        async fn list_completed_unpaid_lessons(
            &self,
            _after: Option<DateTime<Utc>>,
        ) -> Result<Vec<Lesson>, DomainError> {
            Ok(self
                .lessons
                .lock()
                .unwrap()
                .values()
                .filter(|l| l.status == LessonStatus::Completed && !l.is_paid)
                .cloned()
                .collect())
        }

        async fn update_completed_lessons(&self) -> Result<u64, DomainError> {
            let now = Utc::now();
            let slots = self.slots.lock().unwrap();
            let mut lessons = self.lessons.lock().unwrap();
            let mut touched = 0;
            for lesson in lessons.values_mut() {
                if lesson.status == LessonStatus::Booked
                    && slots
                        .get(&lesson.slot_id)
                        .is_some_and(|s| s.ends_at < now)
                {
                    lesson.status = LessonStatus::Completed;
                    touched += 1;
                }
            }
            Ok(touched)
        }

        async fn mark_as_paid(&self, lesson_id: Uuid) -> Result<(), DomainError> {
            self.lessons
                .lock()
                .unwrap()
                .get_mut(&lesson_id)
                .map(|l| l.is_paid = true)
                .ok_or_else(|| DomainError::NotFound("lesson not found".to_string()))
        }
    }

    struct StaticPairs {
        pairs: HashMap<(Uuid, Uuid), String>,
    }

    #[async_trait]
    impl PairLookup for StaticPairs {
        async fn pair_status(
            &self,
            _ctx: &RequestContext,
            tutor_id: Uuid,
            student_id: Uuid,
        ) -> Result<Option<String>, DomainError> {
            Ok(self.pairs.get(&(tutor_id, student_id)).cloned())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<ReminderEvent>>,
    }

    #[async_trait]
    impl EventSink for RecordingSink {
        async fn send(&self, event: &ReminderEvent) -> Result<(), DomainError> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    struct Fixture {
        service: Arc<ScheduleService>,
        repo: Arc<MemoryRepo>,
        sink: Arc<RecordingSink>,
        tutor: Uuid,
        student: Uuid,
    }

    fn fixture() -> Fixture {
        let tutor = Uuid::now_v7();
        let student = Uuid::now_v7();
        let repo = Arc::new(MemoryRepo::default());
        let sink = Arc::new(RecordingSink::default());
        let mut pairs = HashMap::new();
        pairs.insert((tutor, student), PAIR_STATUS_ACTIVE.to_string());
        let service = Arc::new(ScheduleService::new(
            repo.clone(),
            Arc::new(StaticPairs { pairs }),
            sink.clone(),
        ));
        Fixture {
            service,
            repo,
            sink,
            tutor,
            student,
        }
    }

    fn ctx(id: Uuid, role: &str) -> RequestContext {
        RequestContext {
            user_id: Some(id.to_string()),
            user_role: Some(role.to_string()),
            trace_id: None,
        }
    }

    fn future_slot_input(tutor: Uuid) -> CreateSlotInput {
        let starts = Utc::now() + chrono::Duration::hours(1);
        CreateSlotInput {
            tutor_id: tutor,
            starts_at: starts,
            ends_at: starts + chrono::Duration::hours(1),
        }
    }

    async fn booked_lesson(f: &Fixture) -> (Slot, Lesson) {
        let slot = f
            .service
            .create_slot(&ctx(f.tutor, "tutor"), future_slot_input(f.tutor))
            .await
            .unwrap();
        let lesson = f
            .service
            .create_lesson(
                &ctx(f.student, "student"),
                CreateLessonInput {
                    slot_id: slot.id,
                    student_id: f.student,
                },
            )
            .await
            .unwrap();
        (slot, lesson)
    }

    #[tokio::test]
    async fn slot_creation_validates_owner_role_and_time_range() {
        let f = fixture();

        let err = f
            .service
            .create_slot(&ctx(f.student, "student"), future_slot_input(f.student))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));

        let err = f
            .service
            .create_slot(&ctx(f.tutor, "tutor"), future_slot_input(f.student))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));

        let mut inverted = future_slot_input(f.tutor);
        std::mem::swap(&mut inverted.starts_at, &mut inverted.ends_at);
        let err = f
            .service
            .create_slot(&ctx(f.tutor, "tutor"), inverted)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let mut past = future_slot_input(f.tutor);
        past.starts_at = Utc::now() - chrono::Duration::hours(2);
        past.ends_at = Utc::now() - chrono::Duration::hours(1);
        let err = f
            .service
            .create_slot(&ctx(f.tutor, "tutor"), past)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn booking_emits_a_reminder_event() {
        let f = fixture();
        let (slot, lesson) = booked_lesson(&f).await;

        let events = f.sink.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "booked");
        assert_eq!(events[0].lesson_id, lesson.id.to_string());
        assert_eq!(events[0].slot_id, slot.id.to_string());
        assert_eq!(events[0].tutor_id, f.tutor.to_string());
    }

    #[tokio::test]
    async fn concurrent_bookings_have_exactly_one_winner() {
        let f = fixture();
        let second_student = Uuid::now_v7();
        // Both students are active pairs of the tutor.
        let mut pairs = HashMap::new();
        pairs.insert((f.tutor, f.student), PAIR_STATUS_ACTIVE.to_string());
        pairs.insert((f.tutor, second_student), PAIR_STATUS_ACTIVE.to_string());
        let service = Arc::new(ScheduleService::new(
            f.repo.clone(),
            Arc::new(StaticPairs { pairs }),
            f.sink.clone(),
        ));

        let slot = service
            .create_slot(&ctx(f.tutor, "tutor"), future_slot_input(f.tutor))
            .await
            .unwrap();

        let ctx_a = ctx(f.student, "student");
        let ctx_b = ctx(second_student, "student");
        let (a, b) = tokio::join!(
            service.create_lesson(
                &ctx_a,
                CreateLessonInput {
                    slot_id: slot.id,
                    student_id: f.student,
                },
            ),
            service.create_lesson(
                &ctx_b,
                CreateLessonInput {
                    slot_id: slot.id,
                    student_id: second_student,
                },
            )
        );

        let winners = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        let loser = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
        assert!(matches!(loser, DomainError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn booking_requires_an_active_pair() {
        let f = fixture();
        let outsider = Uuid::now_v7();
        let slot = f
            .service
            .create_slot(&ctx(f.tutor, "tutor"), future_slot_input(f.tutor))
            .await
            .unwrap();

        let err = f
            .service
            .create_lesson(
                &ctx(outsider, "student"),
                CreateLessonInput {
                    slot_id: slot.id,
                    student_id: outsider,
                },
            )
            .await
            .unwrap_err();
        match err {
            DomainError::Status(status) => assert_eq!(status.code, Code::FailedPrecondition),
            other => panic!("expected failed precondition, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancel_releases_the_slot_and_emits_an_event() {
        let f = fixture();
        let (slot, lesson) = booked_lesson(&f).await;

        let cancelled = f
            .service
            .cancel_lesson(&ctx(f.student, "student"), lesson.id)
            .await
            .unwrap();
        assert_eq!(cancelled.status, LessonStatus::Cancelled);

        let slot = f.repo.get_slot(slot.id).await.unwrap();
        assert!(!slot.is_booked);

        let events = f.sink.events.lock().unwrap();
        assert_eq!(events.last().unwrap().event_type, "cancelled");
    }

    #[tokio::test]
    async fn booked_slot_rejects_update_and_delete() {
        let f = fixture();
        let (slot, _lesson) = booked_lesson(&f).await;

        let starts = Utc::now() + chrono::Duration::hours(3);
        let err = f
            .service
            .update_slot(
                &ctx(f.tutor, "tutor"),
                slot.id,
                starts,
                starts + chrono::Duration::hours(1),
            )
            .await
            .unwrap_err();
        match err {
            DomainError::Status(status) => assert_eq!(status.code, Code::FailedPrecondition),
            other => panic!("expected failed precondition, got {other:?}"),
        }

        let err = f
            .service
            .delete_slot(&ctx(f.tutor, "tutor"), slot.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Status(_)));
    }

    #[tokio::test]
    async fn mark_as_paid_is_idempotent() {
        let f = fixture();
        let (_slot, lesson) = booked_lesson(&f).await;

        let once = f
            .service
            .mark_as_paid(&ctx(f.tutor, "tutor"), lesson.id)
            .await
            .unwrap();
        assert!(once.is_paid);

        let twice = f
            .service
            .mark_as_paid(&ctx(f.tutor, "tutor"), lesson.id)
            .await
            .unwrap();
        assert!(twice.is_paid);
    }

    #[tokio::test]
    async fn completed_derivation_is_idempotent_and_feeds_listings() {
        let f = fixture();
        let (slot, lesson) = booked_lesson(&f).await;

        // Force the slot into the past, as if the lesson had run.
        {
            let mut slots = f.repo.slots.lock().unwrap();
            let stored = slots.get_mut(&slot.id).unwrap();
            stored.starts_at = Utc::now() - chrono::Duration::hours(2);
            stored.ends_at = Utc::now() - chrono::Duration::hours(1);
        }

        assert_eq!(f.repo.update_completed_lessons().await.unwrap(), 1);
        assert_eq!(f.repo.update_completed_lessons().await.unwrap(), 0);

        let completed = f
            .service
            .list_lessons_by_tutor(&ctx(f.tutor, "tutor"), f.tutor, &[LessonStatus::Completed])
            .await
            .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, lesson.id);

        let booked = f
            .service
            .list_lessons_by_tutor(&ctx(f.tutor, "tutor"), f.tutor, &[LessonStatus::Booked])
            .await
            .unwrap();
        assert!(booked.is_empty());
    }

    #[tokio::test]
    async fn listings_are_scoped_to_the_caller() {
        let f = fixture();
        let (_slot, _lesson) = booked_lesson(&f).await;

        let err = f
            .service
            .list_lessons_by_tutor(&ctx(f.student, "student"), f.tutor, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));

        let err = f
            .service
            .list_completed_unpaid_lessons(&ctx(f.student, "student"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn lesson_detail_updates_are_tutor_only() {
        let f = fixture();
        let (_slot, lesson) = booked_lesson(&f).await;

        let err = f
            .service
            .update_lesson(
                &ctx(f.student, "student"),
                lesson.id,
                UpdateLessonInput {
                    price_rub: Some(1200),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));

        let updated = f
            .service
            .update_lesson(
                &ctx(f.tutor, "tutor"),
                lesson.id,
                UpdateLessonInput {
                    price_rub: Some(1200),
                    connection_link: Some("https://meet.example/l".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price_rub, Some(1200));
    }
}
