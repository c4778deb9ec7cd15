//! Postgres persistence for slots and lessons.
//!
//! Booking and cancellation are transactional: booking re-reads the slot
//! under a row-level exclusive lock so concurrent books on the same slot
//! serialize and exactly one wins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use tutorlink_common::{map_db_error, DomainError};

use crate::model::{Lesson, LessonStatus, Slot};

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn get_slot(&self, id: Uuid) -> Result<Slot, DomainError>;
    async fn create_slot(&self, slot: &Slot) -> Result<(), DomainError>;
    async fn update_slot(&self, slot: &Slot) -> Result<(), DomainError>;
    async fn delete_slot(&self, id: Uuid) -> Result<(), DomainError>;
    async fn list_slots_by_tutor(
        &self,
        tutor_id: Uuid,
        only_available: bool,
    ) -> Result<Vec<Slot>, DomainError>;

    async fn get_lesson(&self, id: Uuid) -> Result<Lesson, DomainError>;
    /// Atomic book: fails with `AlreadyExists` when the slot is taken.
    async fn create_lesson_and_book_slot(&self, lesson: &Lesson) -> Result<(), DomainError>;
    async fn update_lesson(&self, lesson: &Lesson) -> Result<(), DomainError>;
    /// Atomic release: cancels the lesson and frees its slot together.
    async fn cancel_lesson_and_free_slot(
        &self,
        lesson_id: Uuid,
        slot_id: Uuid,
        edited_at: DateTime<Utc>,
    ) -> Result<(), DomainError>;

    async fn list_lessons_by_tutor(
        &self,
        tutor_id: Uuid,
        statuses: &[LessonStatus],
    ) -> Result<Vec<Lesson>, DomainError>;
    async fn list_lessons_by_student(
        &self,
        student_id: Uuid,
        statuses: &[LessonStatus],
    ) -> Result<Vec<Lesson>, DomainError>;
    async fn list_lessons_by_pair(
        &self,
        tutor_id: Uuid,
        student_id: Uuid,
        statuses: &[LessonStatus],
    ) -> Result<Vec<Lesson>, DomainError>;
    async fn list_completed_unpaid_lessons(
        &self,
        after: Option<DateTime<Utc>>,
    ) -> Result<Vec<Lesson>, DomainError>;

    /// Flip `booked` lessons whose slot has ended to `completed`.
    /// Idempotent; returns the number of rows touched.
    async fn update_completed_lessons(&self) -> Result<u64, DomainError>;

    async fn mark_as_paid(&self, lesson_id: Uuid) -> Result<(), DomainError>;
}

pub struct PostgresScheduleRepository {
    pool: PgPool,
}

impl PostgresScheduleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn query_lessons(
        &self,
        query: String,
        binds: Vec<Uuid>,
        statuses: &[LessonStatus],
    ) -> Result<Vec<Lesson>, DomainError> {
        let mut q = sqlx::query(&query);
        for bind in &binds {
            q = q.bind(bind);
        }
        if !statuses.is_empty() {
            let statuses: Vec<String> =
                statuses.iter().map(|s| s.as_str().to_string()).collect();
            q = q.bind(statuses);
        }
        let rows = q.fetch_all(&self.pool).await.map_err(map_db_error)?;
        rows.into_iter().map(lesson_from_row).collect()
    }
}

fn slot_from_row(row: PgRow) -> Result<Slot, DomainError> {
    Ok(Slot {
        id: row.try_get("id").map_err(map_db_error)?,
        tutor_id: row.try_get("tutor_id").map_err(map_db_error)?,
        starts_at: row.try_get("starts_at").map_err(map_db_error)?,
        ends_at: row.try_get("ends_at").map_err(map_db_error)?,
        is_booked: row.try_get("is_booked").map_err(map_db_error)?,
        created_at: row.try_get("created_at").map_err(map_db_error)?,
        edited_at: row.try_get("edited_at").map_err(map_db_error)?,
    })
}

fn lesson_from_row(row: PgRow) -> Result<Lesson, DomainError> {
    let status: String = row.try_get("status").map_err(map_db_error)?;
    Ok(Lesson {
        id: row.try_get("id").map_err(map_db_error)?,
        slot_id: row.try_get("slot_id").map_err(map_db_error)?,
        student_id: row.try_get("student_id").map_err(map_db_error)?,
        status: LessonStatus::parse(&status)
            .ok_or_else(|| DomainError::internal(format!("unknown status in store: {status}")))?,
        is_paid: row.try_get("is_paid").map_err(map_db_error)?,
        connection_link: row.try_get("connection_link").map_err(map_db_error)?,
        price_rub: row.try_get("price_rub").map_err(map_db_error)?,
        payment_info: row.try_get("payment_info").map_err(map_db_error)?,
        created_at: row.try_get("created_at").map_err(map_db_error)?,
        edited_at: row.try_get("edited_at").map_err(map_db_error)?,
    })
}

const SLOT_COLUMNS: &str = "id, tutor_id, starts_at, ends_at, is_booked, created_at, edited_at";
const LESSON_COLUMNS: &str = "l.id, l.slot_id, l.student_id, l.status, l.is_paid, l.connection_link, l.price_rub, l.payment_info, l.created_at, l.edited_at";

#[async_trait]
impl ScheduleRepository for PostgresScheduleRepository {
    async fn get_slot(&self, id: Uuid) -> Result<Slot, DomainError> {
        let row = sqlx::query(&format!("SELECT {SLOT_COLUMNS} FROM slots WHERE id = $1"))
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;
        slot_from_row(row)
    }

    async fn create_slot(&self, slot: &Slot) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO slots (id, tutor_id, starts_at, ends_at, is_booked, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(slot.id)
        .bind(slot.tutor_id)
        .bind(slot.starts_at)
        .bind(slot.ends_at)
        .bind(slot.is_booked)
        .bind(slot.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    async fn update_slot(&self, slot: &Slot) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE slots SET starts_at = $1, ends_at = $2, edited_at = $3 WHERE id = $4",
        )
        .bind(slot.starts_at)
        .bind(slot.ends_at)
        .bind(slot.edited_at)
        .bind(slot.id)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("slot not found".to_string()));
        }
        Ok(())
    }

    async fn delete_slot(&self, id: Uuid) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM slots WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("slot not found".to_string()));
        }
        Ok(())
    }

    async fn list_slots_by_tutor(
        &self,
        tutor_id: Uuid,
        only_available: bool,
    ) -> Result<Vec<Slot>, DomainError> {
        let query = if only_available {
            format!(
                "SELECT {SLOT_COLUMNS} FROM slots
                 WHERE tutor_id = $1 AND is_booked = FALSE ORDER BY starts_at ASC"
            )
        } else {
            format!("SELECT {SLOT_COLUMNS} FROM slots WHERE tutor_id = $1 ORDER BY starts_at ASC")
        };
        let rows = sqlx::query(&query)
            .bind(tutor_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;
        rows.into_iter().map(slot_from_row).collect()
    }

    async fn get_lesson(&self, id: Uuid) -> Result<Lesson, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {LESSON_COLUMNS} FROM lessons l WHERE l.id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match map_db_error(e) {
            DomainError::NotFound(_) => DomainError::NotFound("lesson not found".to_string()),
            other => other,
        })?;
        lesson_from_row(row)
    }

    async fn create_lesson_and_book_slot(&self, lesson: &Lesson) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let is_booked: bool =
            sqlx::query_scalar("SELECT is_booked FROM slots WHERE id = $1 FOR UPDATE")
                .bind(lesson.slot_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| match map_db_error(e) {
                    DomainError::NotFound(_) => {
                        DomainError::NotFound("slot not found".to_string())
                    }
                    other => other,
                })?;

        if is_booked {
            return Err(DomainError::AlreadyExists(
                "slot is already booked".to_string(),
            ));
        }

        sqlx::query("UPDATE slots SET is_booked = TRUE WHERE id = $1")
            .bind(lesson.slot_id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        sqlx::query(
            "INSERT INTO lessons (id, slot_id, student_id, status, is_paid, created_at, edited_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(lesson.id)
        .bind(lesson.slot_id)
        .bind(lesson.student_id)
        .bind(lesson.status.as_str())
        .bind(lesson.is_paid)
        .bind(lesson.created_at)
        .bind(lesson.edited_at)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)
    }

    async fn update_lesson(&self, lesson: &Lesson) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE lessons
             SET status = $1, is_paid = $2, connection_link = $3, price_rub = $4,
                 payment_info = $5, edited_at = $6
             WHERE id = $7",
        )
        .bind(lesson.status.as_str())
        .bind(lesson.is_paid)
        .bind(&lesson.connection_link)
        .bind(lesson.price_rub)
        .bind(&lesson.payment_info)
        .bind(lesson.edited_at)
        .bind(lesson.id)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("lesson not found".to_string()));
        }
        Ok(())
    }

    async fn cancel_lesson_and_free_slot(
        &self,
        lesson_id: Uuid,
        slot_id: Uuid,
        edited_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query("UPDATE lessons SET status = 'cancelled', edited_at = $1 WHERE id = $2")
            .bind(edited_at)
            .bind(lesson_id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        sqlx::query("UPDATE slots SET is_booked = FALSE WHERE id = $1")
            .bind(slot_id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)
    }

    async fn list_lessons_by_tutor(
        &self,
        tutor_id: Uuid,
        statuses: &[LessonStatus],
    ) -> Result<Vec<Lesson>, DomainError> {
        let mut query = format!(
            "SELECT {LESSON_COLUMNS} FROM lessons l JOIN slots s ON l.slot_id = s.id
             WHERE s.tutor_id = $1"
        );
        if !statuses.is_empty() {
            query.push_str(" AND l.status = ANY($2)");
        }
        query.push_str(" ORDER BY s.starts_at ASC");
        self.query_lessons(query, vec![tutor_id], statuses).await
    }

    async fn list_lessons_by_student(
        &self,
        student_id: Uuid,
        statuses: &[LessonStatus],
    ) -> Result<Vec<Lesson>, DomainError> {
        let mut query = format!(
            "SELECT {LESSON_COLUMNS} FROM lessons l JOIN slots s ON l.slot_id = s.id
             WHERE l.student_id = $1"
        );
        if !statuses.is_empty() {
            query.push_str(" AND l.status = ANY($2)");
        }
        query.push_str(" ORDER BY s.starts_at ASC");
        self.query_lessons(query, vec![student_id], statuses).await
    }

    async fn list_lessons_by_pair(
        &self,
        tutor_id: Uuid,
        student_id: Uuid,
        statuses: &[LessonStatus],
    ) -> Result<Vec<Lesson>, DomainError> {
        let mut query = format!(
            "SELECT {LESSON_COLUMNS} FROM lessons l JOIN slots s ON l.slot_id = s.id
             WHERE s.tutor_id = $1 AND l.student_id = $2"
        );
        if !statuses.is_empty() {
            query.push_str(" AND l.status = ANY($3)");
        }
        query.push_str(" ORDER BY s.starts_at ASC");
        self.query_lessons(query, vec![tutor_id, student_id], statuses)
            .await
    }

    async fn list_completed_unpaid_lessons(
        &self,
        after: Option<DateTime<Utc>>,
    ) -> Result<Vec<Lesson>, DomainError> {
        let rows = if let Some(after) = after {
            sqlx::query(&format!(
                "SELECT {LESSON_COLUMNS} FROM lessons l JOIN slots s ON l.slot_id = s.id
                 WHERE l.status = 'completed' AND l.is_paid = FALSE AND s.ends_at > $1
                 ORDER BY s.ends_at ASC"
            ))
            .bind(after)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query(&format!(
                "SELECT {LESSON_COLUMNS} FROM lessons l JOIN slots s ON l.slot_id = s.id
                 WHERE l.status = 'completed' AND l.is_paid = FALSE
                 ORDER BY s.ends_at ASC"
            ))
            .fetch_all(&self.pool)
            .await
        }
        .map_err(map_db_error)?;
        rows.into_iter().map(lesson_from_row).collect()
    }

    async fn update_completed_lessons(&self) -> Result<u64, DomainError> {
        let result = sqlx::query(
            "UPDATE lessons SET status = 'completed', edited_at = NOW()
             FROM slots
             WHERE lessons.slot_id = slots.id
               AND lessons.status = 'booked'
               AND slots.ends_at < NOW()",
        )
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(result.rows_affected())
    }

    async fn mark_as_paid(&self, lesson_id: Uuid) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE lessons SET is_paid = TRUE WHERE id = $1")
            .bind(lesson_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("lesson not found".to_string()));
        }
        Ok(())
    }
}
