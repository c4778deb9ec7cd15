//! Domain types owned by the homework backend.
//!
//! An assignment's status is never stored: it is derived from the due
//! date, the latest submission and whether that submission has feedback.

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentStatus {
    Unsent,
    Overdue,
    Unreviewed,
    Reviewed,
}

impl AssignmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentStatus::Unsent => "UNSENT",
            AssignmentStatus::Overdue => "OVERDUE",
            AssignmentStatus::Unreviewed => "UNREVIEWED",
            AssignmentStatus::Reviewed => "REVIEWED",
        }
    }

    pub fn parse(s: &str) -> Option<AssignmentStatus> {
        match s {
            "UNSENT" => Some(AssignmentStatus::Unsent),
            "OVERDUE" => Some(AssignmentStatus::Overdue),
            "UNREVIEWED" => Some(AssignmentStatus::Unreviewed),
            "REVIEWED" => Some(AssignmentStatus::Reviewed),
            _ => None,
        }
    }
}

/// No submission: unsent until the due date passes, overdue after.
/// Submitted: unreviewed until the latest submission has feedback.
pub fn derive_status(
    due_date: Option<DateTime<Utc>>,
    has_submission: bool,
    latest_has_feedback: bool,
    now: DateTime<Utc>,
) -> AssignmentStatus {
    if !has_submission {
        return match due_date {
            Some(due) if due <= now => AssignmentStatus::Overdue,
            _ => AssignmentStatus::Unsent,
        };
    }
    if latest_has_feedback {
        AssignmentStatus::Reviewed
    } else {
        AssignmentStatus::Unreviewed
    }
}

#[derive(Debug, Clone)]
pub struct Assignment {
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub student_id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    pub file_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub edited_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub comment: Option<String>,
    pub file_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Feedback {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub comment: Option<String>,
    pub file_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateAssignmentInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub file_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn status_derivation_matrix() {
        let now = Utc::now();
        let future = Some(now + Duration::days(1));
        let past = Some(now - Duration::days(1));

        assert_eq!(derive_status(future, false, false, now), AssignmentStatus::Unsent);
        assert_eq!(derive_status(None, false, false, now), AssignmentStatus::Unsent);
        assert_eq!(derive_status(past, false, false, now), AssignmentStatus::Overdue);
        // A due date exactly at `now` is already overdue.
        assert_eq!(
            derive_status(Some(now), false, false, now),
            AssignmentStatus::Overdue
        );
        // Once submitted, the due date no longer matters.
        assert_eq!(
            derive_status(past, true, false, now),
            AssignmentStatus::Unreviewed
        );
        assert_eq!(derive_status(past, true, true, now), AssignmentStatus::Reviewed);
        assert_eq!(
            derive_status(future, true, true, now),
            AssignmentStatus::Reviewed
        );
    }
}
