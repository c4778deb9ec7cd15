//! Assignment, submission and feedback routes. The assignments listing
//! dispatches over the same by-tutor / by-student / by-pair selectors as
//! lessons.

use axum::extract::{RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;

use tutorlink_proto::homework::*;

use crate::mediator::{
    error_response, handle, json_bytes_response, metadata_from_headers, respond,
    rpc_error_response, CachePolicy, MediateError, RequestParts,
};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/homework/assignments",
            get(list_assignments).post(handle(
                |s: AppState, m, req: CreateAssignmentRequest| async move {
                    s.homework_client.create_assignment(&m, req).await
                },
                None,
                true,
                CachePolicy::None,
            )),
        )
        .route(
            "/homework/assignments/{id}",
            get(handle(
                |s: AppState, m, req: GetAssignmentRequest| async move {
                    s.homework_client.get_assignment(&m, req).await
                },
                Some(parse_get_assignment),
                false,
                CachePolicy::None,
            ))
            .patch(handle(
                |s: AppState, m, req: UpdateAssignmentRequest| async move {
                    s.homework_client.update_assignment(&m, req).await
                },
                Some(parse_update_assignment),
                true,
                CachePolicy::None,
            ))
            .delete(handle(
                |s: AppState, m, req: DeleteAssignmentRequest| async move {
                    s.homework_client.delete_assignment(&m, req).await
                },
                Some(parse_delete_assignment),
                false,
                CachePolicy::None,
            )),
        )
        .route(
            "/homework/submissions",
            post(handle(
                |s: AppState, m, req: CreateSubmissionRequest| async move {
                    s.homework_client.create_submission(&m, req).await
                },
                None,
                true,
                CachePolicy::None,
            )),
        )
        .route(
            "/homework/submissions/{assignment_id}",
            get(handle(
                |s: AppState, m, req: ListSubmissionsRequest| async move {
                    s.homework_client.list_submissions(&m, req).await
                },
                Some(parse_list_submissions),
                false,
                CachePolicy::None,
            )),
        )
        .route(
            "/homework/feedback",
            post(handle(
                |s: AppState, m, req: CreateFeedbackRequest| async move {
                    s.homework_client.create_feedback(&m, req).await
                },
                None,
                true,
                CachePolicy::None,
            )),
        )
}

fn parse_get_assignment(
    parts: &RequestParts,
    req: &mut GetAssignmentRequest,
) -> Result<(), MediateError> {
    req.id = parts.path_param("id")?.to_string();
    Ok(())
}

fn parse_update_assignment(
    parts: &RequestParts,
    req: &mut UpdateAssignmentRequest,
) -> Result<(), MediateError> {
    req.id = parts.path_param("id")?.to_string();
    Ok(())
}

fn parse_delete_assignment(
    parts: &RequestParts,
    req: &mut DeleteAssignmentRequest,
) -> Result<(), MediateError> {
    req.id = parts.path_param("id")?.to_string();
    Ok(())
}

fn parse_list_submissions(
    parts: &RequestParts,
    req: &mut ListSubmissionsRequest,
) -> Result<(), MediateError> {
    req.assignment_id = parts.path_param("assignment_id")?.to_string();
    Ok(())
}

fn parse_status_filter(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_ascii_uppercase()).collect()
}

async fn list_assignments(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let parts = RequestParts {
        params: Default::default(),
        query: query
            .as_deref()
            .map(|q| serde_urlencoded::from_str(q).unwrap_or_default())
            .unwrap_or_default(),
        headers,
    };
    let metadata = metadata_from_headers(&parts.headers);

    let tutor_id = parts.query_value("tutor_id").map(str::to_string);
    let student_id = parts.query_value("student_id").map(str::to_string);
    let status_filter = parse_status_filter(&parts.query_all("status_filter"));

    let result = match (tutor_id, student_id) {
        (Some(tutor_id), Some(student_id)) => {
            state
                .homework_client
                .list_assignments_by_pair(
                    &metadata,
                    ListAssignmentsByPairRequest {
                        tutor_id,
                        student_id,
                        status_filter,
                    },
                )
                .await
        }
        (Some(tutor_id), None) => {
            state
                .homework_client
                .list_assignments_by_tutor(
                    &metadata,
                    ListAssignmentsByTutorRequest {
                        tutor_id,
                        status_filter,
                    },
                )
                .await
        }
        (None, Some(student_id)) => {
            state
                .homework_client
                .list_assignments_by_student(
                    &metadata,
                    ListAssignmentsByStudentRequest {
                        student_id,
                        status_filter,
                    },
                )
                .await
        }
        (None, None) => {
            return error_response(StatusCode::BAD_REQUEST, "invalid query parameters");
        }
    };

    match result {
        Ok(response) => match respond(&response) {
            Ok(data) => json_bytes_response(data),
            Err(response) => response,
        },
        Err(status) => rpc_error_response(&status),
    }
}
