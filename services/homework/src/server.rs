//! RPC boundary of the homework backend.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use tutorlink_common::{map_domain_error, ErrorKind, RequestContext};
use tutorlink_proto::homework as pb;
use tutorlink_proto::Empty;
use tutorlink_rpc::{Metadata, RpcServer, Status};

use crate::model::{Assignment, AssignmentStatus, Feedback, Submission, UpdateAssignmentInput};
use crate::repository::AssignmentScope;
use crate::service::{
    CreateAssignmentInput, CreateFeedbackInput, CreateSubmissionInput, HomeworkService,
};

const READ_KINDS: &[ErrorKind] = &[
    ErrorKind::NotFound,
    ErrorKind::PermissionDenied,
    ErrorKind::Authentication,
];
const WRITE_KINDS: &[ErrorKind] = &[
    ErrorKind::NotFound,
    ErrorKind::PermissionDenied,
    ErrorKind::Validation,
    ErrorKind::Authentication,
];

fn parse_uuid(field: &str, value: &str) -> Result<Uuid, Status> {
    Uuid::parse_str(value)
        .map_err(|e| Status::invalid_argument(format!("invalid {field}: {e}")))
}

fn parse_opt_uuid(field: &str, value: Option<String>) -> Result<Option<Uuid>, Status> {
    value.map(|v| parse_uuid(field, &v)).transpose()
}

fn parse_opt_timestamp(value: Option<i64>) -> Result<Option<DateTime<Utc>>, Status> {
    value
        .map(|secs| {
            DateTime::<Utc>::from_timestamp(secs, 0)
                .ok_or_else(|| Status::invalid_argument(format!("invalid timestamp: {secs}")))
        })
        .transpose()
}

fn parse_statuses(raw: &[String]) -> Vec<AssignmentStatus> {
    raw.iter().filter_map(|s| AssignmentStatus::parse(s)).collect()
}

fn assignment_to_proto(assignment: &Assignment, status: AssignmentStatus) -> pb::Assignment {
    pb::Assignment {
        id: assignment.id.to_string(),
        tutor_id: assignment.tutor_id.to_string(),
        student_id: assignment.student_id.to_string(),
        title: assignment.title.clone(),
        description: assignment.description.clone(),
        file_id: assignment.file_id.map(|id| id.to_string()),
        due_date: assignment.due_date.map(|d| d.timestamp()),
        status: status.as_str().to_string(),
        created_at: assignment.created_at.timestamp(),
        edited_at: assignment.edited_at.timestamp(),
    }
}

fn submission_to_proto(submission: &Submission) -> pb::Submission {
    pb::Submission {
        id: submission.id.to_string(),
        assignment_id: submission.assignment_id.to_string(),
        comment: submission.comment.clone(),
        file_id: submission.file_id.map(|id| id.to_string()),
        created_at: submission.created_at.timestamp(),
    }
}

fn feedback_to_proto(feedback: &Feedback) -> pb::Feedback {
    pb::Feedback {
        id: feedback.id.to_string(),
        submission_id: feedback.submission_id.to_string(),
        comment: feedback.comment.clone(),
        file_id: feedback.file_id.map(|id| id.to_string()),
        created_at: feedback.created_at.timestamp(),
    }
}

fn assignments_response(items: &[(Assignment, AssignmentStatus)]) -> pb::ListAssignmentsResponse {
    pb::ListAssignmentsResponse {
        assignments: items
            .iter()
            .map(|(assignment, status)| assignment_to_proto(assignment, *status))
            .collect(),
    }
}

pub fn register(server: &mut RpcServer, service: Arc<HomeworkService>) {
    let svc = service.clone();
    server.add_method(
        pb::methods::CREATE_ASSIGNMENT,
        move |m: Metadata, req: pb::CreateAssignmentRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let input = CreateAssignmentInput {
                    tutor_id: parse_uuid("tutor id", &req.tutor_id)?,
                    student_id: parse_uuid("student id", &req.student_id)?,
                    title: req.title,
                    description: req.description,
                    file_id: parse_opt_uuid("file id", req.file_id)?,
                    due_date: parse_opt_timestamp(req.due_date)?,
                };
                let (assignment, status) = svc
                    .create_assignment(&ctx, input)
                    .await
                    .map_err(|e| map_domain_error(e, WRITE_KINDS))?;
                Ok(assignment_to_proto(&assignment, status))
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::GET_ASSIGNMENT,
        move |m: Metadata, req: pb::GetAssignmentRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let (assignment, status) = svc
                    .get_assignment(&ctx, parse_uuid("id", &req.id)?)
                    .await
                    .map_err(|e| map_domain_error(e, READ_KINDS))?;
                Ok(assignment_to_proto(&assignment, status))
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::UPDATE_ASSIGNMENT,
        move |m: Metadata, req: pb::UpdateAssignmentRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let input = UpdateAssignmentInput {
                    title: req.title,
                    description: req.description,
                    file_id: parse_opt_uuid("file id", req.file_id)?,
                    due_date: parse_opt_timestamp(req.due_date)?,
                };
                let (assignment, status) = svc
                    .update_assignment(&ctx, parse_uuid("id", &req.id)?, input)
                    .await
                    .map_err(|e| map_domain_error(e, WRITE_KINDS))?;
                Ok(assignment_to_proto(&assignment, status))
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::DELETE_ASSIGNMENT,
        move |m: Metadata, req: pb::DeleteAssignmentRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                svc.delete_assignment(&ctx, parse_uuid("id", &req.id)?)
                    .await
                    .map_err(|e| map_domain_error(e, WRITE_KINDS))?;
                Ok(Empty {})
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::LIST_ASSIGNMENTS_BY_TUTOR,
        move |m: Metadata, req: pb::ListAssignmentsByTutorRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let items = svc
                    .list_assignments(
                        &ctx,
                        AssignmentScope::ByTutor(parse_uuid("tutor id", &req.tutor_id)?),
                        &parse_statuses(&req.status_filter),
                    )
                    .await
                    .map_err(|e| map_domain_error(e, READ_KINDS))?;
                Ok(assignments_response(&items))
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::LIST_ASSIGNMENTS_BY_STUDENT,
        move |m: Metadata, req: pb::ListAssignmentsByStudentRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let items = svc
                    .list_assignments(
                        &ctx,
                        AssignmentScope::ByStudent(parse_uuid("student id", &req.student_id)?),
                        &parse_statuses(&req.status_filter),
                    )
                    .await
                    .map_err(|e| map_domain_error(e, READ_KINDS))?;
                Ok(assignments_response(&items))
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::LIST_ASSIGNMENTS_BY_PAIR,
        move |m: Metadata, req: pb::ListAssignmentsByPairRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let items = svc
                    .list_assignments(
                        &ctx,
                        AssignmentScope::ByPair {
                            tutor_id: parse_uuid("tutor id", &req.tutor_id)?,
                            student_id: parse_uuid("student id", &req.student_id)?,
                        },
                        &parse_statuses(&req.status_filter),
                    )
                    .await
                    .map_err(|e| map_domain_error(e, READ_KINDS))?;
                Ok(assignments_response(&items))
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::CREATE_SUBMISSION,
        move |m: Metadata, req: pb::CreateSubmissionRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let submission = svc
                    .create_submission(
                        &ctx,
                        CreateSubmissionInput {
                            assignment_id: parse_uuid("assignment id", &req.assignment_id)?,
                            comment: req.comment,
                            file_id: parse_opt_uuid("file id", req.file_id)?,
                        },
                    )
                    .await
                    .map_err(|e| map_domain_error(e, WRITE_KINDS))?;
                Ok(submission_to_proto(&submission))
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::LIST_SUBMISSIONS,
        move |m: Metadata, req: pb::ListSubmissionsRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let submissions = svc
                    .list_submissions(&ctx, parse_uuid("assignment id", &req.assignment_id)?)
                    .await
                    .map_err(|e| map_domain_error(e, READ_KINDS))?;
                Ok(pb::ListSubmissionsResponse {
                    submissions: submissions.iter().map(submission_to_proto).collect(),
                })
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::CREATE_FEEDBACK,
        move |m: Metadata, req: pb::CreateFeedbackRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let feedback = svc
                    .create_feedback(
                        &ctx,
                        CreateFeedbackInput {
                            submission_id: parse_uuid("submission id", &req.submission_id)?,
                            comment: req.comment,
                            file_id: parse_opt_uuid("file id", req.file_id)?,
                        },
                    )
                    .await
                    .map_err(|e| map_domain_error(e, WRITE_KINDS))?;
                Ok(feedback_to_proto(&feedback))
            }
        },
    );
}
