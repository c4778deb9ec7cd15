//! Postgres persistence for assignments, submissions and feedback.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use tutorlink_common::{map_db_error, DomainError};

use crate::model::{Assignment, Feedback, Submission, UpdateAssignmentInput};

/// Which assignments a listing selects.
#[derive(Debug, Clone, Copy)]
pub enum AssignmentScope {
    ByTutor(Uuid),
    ByStudent(Uuid),
    ByPair { tutor_id: Uuid, student_id: Uuid },
}

#[async_trait]
pub trait HomeworkRepository: Send + Sync {
    async fn create_assignment(&self, assignment: &Assignment) -> Result<(), DomainError>;
    async fn get_assignment(&self, id: Uuid) -> Result<Assignment, DomainError>;
    async fn update_assignment(
        &self,
        id: Uuid,
        input: &UpdateAssignmentInput,
    ) -> Result<Assignment, DomainError>;
    async fn delete_assignment(&self, id: Uuid) -> Result<(), DomainError>;
    async fn list_assignments(
        &self,
        scope: AssignmentScope,
    ) -> Result<Vec<Assignment>, DomainError>;

    async fn create_submission(&self, submission: &Submission) -> Result<(), DomainError>;
    async fn list_submissions(&self, assignment_id: Uuid)
        -> Result<Vec<Submission>, DomainError>;
    async fn get_submission(&self, id: Uuid) -> Result<Submission, DomainError>;
    /// The latest submission for the assignment and whether it already
    /// has feedback; `None` when nothing was submitted yet.
    async fn latest_submission_state(
        &self,
        assignment_id: Uuid,
    ) -> Result<Option<(Submission, bool)>, DomainError>;

    async fn create_feedback(&self, feedback: &Feedback) -> Result<(), DomainError>;
}

pub struct PostgresHomeworkRepository {
    pool: PgPool,
}

impl PostgresHomeworkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn assignment_from_row(row: PgRow) -> Result<Assignment, DomainError> {
    Ok(Assignment {
        id: row.try_get("id").map_err(map_db_error)?,
        tutor_id: row.try_get("tutor_id").map_err(map_db_error)?,
        student_id: row.try_get("student_id").map_err(map_db_error)?,
        title: row.try_get("title").map_err(map_db_error)?,
        description: row.try_get("description").map_err(map_db_error)?,
        file_id: row.try_get("file_id").map_err(map_db_error)?,
        due_date: row.try_get("due_date").map_err(map_db_error)?,
        created_at: row.try_get("created_at").map_err(map_db_error)?,
        edited_at: row.try_get("edited_at").map_err(map_db_error)?,
    })
}

fn submission_from_row(row: PgRow) -> Result<Submission, DomainError> {
    Ok(Submission {
        id: row.try_get("id").map_err(map_db_error)?,
        assignment_id: row.try_get("assignment_id").map_err(map_db_error)?,
        comment: row.try_get("comment").map_err(map_db_error)?,
        file_id: row.try_get("file_id").map_err(map_db_error)?,
        created_at: row.try_get("created_at").map_err(map_db_error)?,
    })
}

const ASSIGNMENT_COLUMNS: &str =
    "id, tutor_id, student_id, title, description, file_id, due_date, created_at, edited_at";
const SUBMISSION_COLUMNS: &str = "id, assignment_id, comment, file_id, created_at";

#[async_trait]
impl HomeworkRepository for PostgresHomeworkRepository {
    async fn create_assignment(&self, assignment: &Assignment) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO assignments (id, tutor_id, student_id, title, description, file_id, due_date, created_at, edited_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(assignment.id)
        .bind(assignment.tutor_id)
        .bind(assignment.student_id)
        .bind(&assignment.title)
        .bind(&assignment.description)
        .bind(assignment.file_id)
        .bind(assignment.due_date)
        .bind(assignment.created_at)
        .bind(assignment.edited_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    async fn get_assignment(&self, id: Uuid) -> Result<Assignment, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match map_db_error(e) {
            DomainError::NotFound(_) => DomainError::NotFound("assignment not found".to_string()),
            other => other,
        })?;
        assignment_from_row(row)
    }

    async fn update_assignment(
        &self,
        id: Uuid,
        input: &UpdateAssignmentInput,
    ) -> Result<Assignment, DomainError> {
        let row = sqlx::query(&format!(
            "UPDATE assignments
             SET title = COALESCE($2, title),
                 description = COALESCE($3, description),
                 file_id = COALESCE($4, file_id),
                 due_date = COALESCE($5, due_date),
                 edited_at = NOW()
             WHERE id = $1
             RETURNING {ASSIGNMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.file_id)
        .bind(input.due_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match map_db_error(e) {
            DomainError::NotFound(_) => DomainError::NotFound("assignment not found".to_string()),
            other => other,
        })?;
        assignment_from_row(row)
    }

    async fn delete_assignment(&self, id: Uuid) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM assignments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("assignment not found".to_string()));
        }
        Ok(())
    }

    async fn list_assignments(
        &self,
        scope: AssignmentScope,
    ) -> Result<Vec<Assignment>, DomainError> {
        let rows = match scope {
            AssignmentScope::ByTutor(tutor_id) => {
                sqlx::query(&format!(
                    "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE tutor_id = $1 ORDER BY created_at ASC"
                ))
                .bind(tutor_id)
                .fetch_all(&self.pool)
                .await
            }
            AssignmentScope::ByStudent(student_id) => {
                sqlx::query(&format!(
                    "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE student_id = $1 ORDER BY created_at ASC"
                ))
                .bind(student_id)
                .fetch_all(&self.pool)
                .await
            }
            AssignmentScope::ByPair {
                tutor_id,
                student_id,
            } => {
                sqlx::query(&format!(
                    "SELECT {ASSIGNMENT_COLUMNS} FROM assignments
                     WHERE tutor_id = $1 AND student_id = $2 ORDER BY created_at ASC"
                ))
                .bind(tutor_id)
                .bind(student_id)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(map_db_error)?;
        rows.into_iter().map(assignment_from_row).collect()
    }

    async fn create_submission(&self, submission: &Submission) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO submissions (id, assignment_id, comment, file_id, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(submission.id)
        .bind(submission.assignment_id)
        .bind(&submission.comment)
        .bind(submission.file_id)
        .bind(submission.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    async fn list_submissions(
        &self,
        assignment_id: Uuid,
    ) -> Result<Vec<Submission>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions
             WHERE assignment_id = $1 ORDER BY created_at ASC"
        ))
        .bind(assignment_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;
        rows.into_iter().map(submission_from_row).collect()
    }

    async fn get_submission(&self, id: Uuid) -> Result<Submission, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match map_db_error(e) {
            DomainError::NotFound(_) => DomainError::NotFound("submission not found".to_string()),
            other => other,
        })?;
        submission_from_row(row)
    }

    async fn latest_submission_state(
        &self,
        assignment_id: Uuid,
    ) -> Result<Option<(Submission, bool)>, DomainError> {
        let row = sqlx::query(
            "SELECT s.id, s.assignment_id, s.comment, s.file_id, s.created_at,
                    EXISTS (SELECT 1 FROM feedback f WHERE f.submission_id = s.id) AS has_feedback
             FROM submissions s
             WHERE s.assignment_id = $1
             ORDER BY s.created_at DESC
             LIMIT 1",
        )
        .bind(assignment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        match row {
            None => Ok(None),
            Some(row) => {
                let has_feedback: bool = row.try_get("has_feedback").map_err(map_db_error)?;
                Ok(Some((submission_from_row(row)?, has_feedback)))
            }
        }
    }

    async fn create_feedback(&self, feedback: &Feedback) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO feedback (id, submission_id, comment, file_id, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(feedback.id)
        .bind(feedback.submission_id)
        .bind(&feedback.comment)
        .bind(feedback.file_id)
        .bind(feedback.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }
}
