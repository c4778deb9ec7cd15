//! Homework flows: assignment lifecycle with derived status, submissions
//! and feedback, each behind its role and pair gates.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use tutorlink_common::{DomainError, RequestContext};

use crate::client::PairLookup;
use crate::model::{
    derive_status, Assignment, AssignmentStatus, Feedback, Submission, UpdateAssignmentInput,
};
use crate::repository::{AssignmentScope, HomeworkRepository};

const PAIR_STATUS_ACTIVE: &str = "active";
const ROLE_TUTOR: &str = "tutor";
const ROLE_STUDENT: &str = "student";

#[derive(Debug, Clone)]
pub struct CreateAssignmentInput {
    pub tutor_id: Uuid,
    pub student_id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    pub file_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct CreateSubmissionInput {
    pub assignment_id: Uuid,
    pub comment: Option<String>,
    pub file_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct CreateFeedbackInput {
    pub submission_id: Uuid,
    pub comment: Option<String>,
    pub file_id: Option<Uuid>,
}

pub struct HomeworkService {
    repo: Arc<dyn HomeworkRepository>,
    pairs: Arc<dyn PairLookup>,
}

impl HomeworkService {
    pub fn new(repo: Arc<dyn HomeworkRepository>, pairs: Arc<dyn PairLookup>) -> Self {
        Self { repo, pairs }
    }

    async fn require_active_pair(
        &self,
        ctx: &RequestContext,
        tutor_id: Uuid,
        student_id: Uuid,
    ) -> Result<(), DomainError> {
        let status = self.pairs.pair_status(ctx, tutor_id, student_id).await?;
        if status.as_deref() != Some(PAIR_STATUS_ACTIVE) {
            return Err(DomainError::PermissionDenied(
                "tutor and student are not connected".to_string(),
            ));
        }
        Ok(())
    }

    async fn status_of(&self, assignment: &Assignment) -> Result<AssignmentStatus, DomainError> {
        let latest = self.repo.latest_submission_state(assignment.id).await?;
        Ok(derive_status(
            assignment.due_date,
            latest.is_some(),
            latest.map(|(_, has_feedback)| has_feedback).unwrap_or(false),
            Utc::now(),
        ))
    }

    pub async fn create_assignment(
        &self,
        ctx: &RequestContext,
        input: CreateAssignmentInput,
    ) -> Result<(Assignment, AssignmentStatus), DomainError> {
        ctx.require_user_among(&[input.tutor_id])?;
        ctx.require_role(ROLE_TUTOR)?;
        self.require_active_pair(ctx, input.tutor_id, input.student_id)
            .await?;

        let now = Utc::now();
        let assignment = Assignment {
            id: Uuid::now_v7(),
            tutor_id: input.tutor_id,
            student_id: input.student_id,
            title: input.title,
            description: input.description,
            file_id: input.file_id,
            due_date: input.due_date,
            created_at: now,
            edited_at: now,
        };
        self.repo.create_assignment(&assignment).await?;
        let status = self.status_of(&assignment).await?;
        Ok((assignment, status))
    }

    pub async fn get_assignment(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> Result<(Assignment, AssignmentStatus), DomainError> {
        let assignment = self.repo.get_assignment(id).await?;
        ctx.require_user_among(&[assignment.tutor_id, assignment.student_id])?;
        let status = self.status_of(&assignment).await?;
        Ok((assignment, status))
    }

    pub async fn update_assignment(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        input: UpdateAssignmentInput,
    ) -> Result<(Assignment, AssignmentStatus), DomainError> {
        let assignment = self.repo.get_assignment(id).await?;
        ctx.require_user_among(&[assignment.tutor_id])?;
        ctx.require_role(ROLE_TUTOR)?;

        let updated = self.repo.update_assignment(id, &input).await?;
        let status = self.status_of(&updated).await?;
        Ok((updated, status))
    }

    pub async fn delete_assignment(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> Result<(), DomainError> {
        let assignment = self.repo.get_assignment(id).await?;
        ctx.require_user_among(&[assignment.tutor_id])?;
        ctx.require_role(ROLE_TUTOR)?;
        self.repo.delete_assignment(id).await
    }

    /// Listing derives statuses first, then filters on the requested set.
    pub async fn list_assignments(
        &self,
        ctx: &RequestContext,
        scope: AssignmentScope,
        statuses: &[AssignmentStatus],
    ) -> Result<Vec<(Assignment, AssignmentStatus)>, DomainError> {
        match scope {
            AssignmentScope::ByTutor(tutor_id) => {
                ctx.require_user_among(&[tutor_id])?;
            }
            AssignmentScope::ByStudent(student_id) => {
                ctx.require_user_among(&[student_id])?;
            }
            AssignmentScope::ByPair {
                tutor_id,
                student_id,
            } => {
                ctx.require_user_among(&[tutor_id, student_id])?;
                self.require_active_pair(ctx, tutor_id, student_id).await?;
            }
        }

        let assignments = self.repo.list_assignments(scope).await?;
        let mut result = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let status = self.status_of(&assignment).await?;
            if statuses.is_empty() || statuses.contains(&status) {
                result.push((assignment, status));
            }
        }
        Ok(result)
    }

    pub async fn create_submission(
        &self,
        ctx: &RequestContext,
        input: CreateSubmissionInput,
    ) -> Result<Submission, DomainError> {
        let assignment = self.repo.get_assignment(input.assignment_id).await?;
        ctx.require_user_among(&[assignment.student_id])?;
        ctx.require_role(ROLE_STUDENT)?;

        let submission = Submission {
            id: Uuid::now_v7(),
            assignment_id: assignment.id,
            comment: input.comment,
            file_id: input.file_id,
            created_at: Utc::now(),
        };
        self.repo.create_submission(&submission).await?;
        Ok(submission)
    }

    pub async fn list_submissions(
        &self,
        ctx: &RequestContext,
        assignment_id: Uuid,
    ) -> Result<Vec<Submission>, DomainError> {
        let assignment = self.repo.get_assignment(assignment_id).await?;
        ctx.require_user_among(&[assignment.tutor_id, assignment.student_id])?;
        self.repo.list_submissions(assignment_id).await
    }

    pub async fn create_feedback(
        &self,
        ctx: &RequestContext,
        input: CreateFeedbackInput,
    ) -> Result<Feedback, DomainError> {
        let submission = self.repo.get_submission(input.submission_id).await?;
        let assignment = self.repo.get_assignment(submission.assignment_id).await?;
        ctx.require_user_among(&[assignment.tutor_id])?;
        ctx.require_role(ROLE_TUTOR)?;

        let feedback = Feedback {
            id: Uuid::now_v7(),
            submission_id: submission.id,
            comment: input.comment,
            file_id: input.file_id,
            created_at: Utc::now(),
        };
        self.repo.create_feedback(&feedback).await?;
        Ok(feedback)
    }
}
