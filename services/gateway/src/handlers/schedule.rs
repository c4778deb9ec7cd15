//! Slot and lesson routes, including the lessons listing dispatch.

use axum::extract::{RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;

use tutorlink_proto::schedule::*;

use crate::mediator::{
    error_response, handle, json_bytes_response, metadata_from_headers, respond,
    rpc_error_response, CachePolicy, MediateError, RequestParts,
};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/schedule/slots",
            post(handle(
                |s: AppState, m, req: CreateSlotRequest| async move {
                    s.schedule_client.create_slot(&m, req).await
                },
                None,
                true,
                CachePolicy::None,
            )),
        )
        .route(
            "/schedule/slots/by-tutor/{tutor_id}",
            get(handle(
                |s: AppState, m, req: ListSlotsByTutorRequest| async move {
                    s.schedule_client.list_slots_by_tutor(&m, req).await
                },
                Some(parse_list_slots),
                false,
                CachePolicy::None,
            )),
        )
        .route(
            "/schedule/slots/{id}",
            get(handle(
                |s: AppState, m, req: GetSlotRequest| async move {
                    s.schedule_client.get_slot(&m, req).await
                },
                Some(parse_get_slot),
                false,
                CachePolicy::None,
            ))
            .patch(handle(
                |s: AppState, m, req: UpdateSlotRequest| async move {
                    s.schedule_client.update_slot(&m, req).await
                },
                Some(parse_update_slot),
                true,
                CachePolicy::None,
            ))
            .delete(handle(
                |s: AppState, m, req: DeleteSlotRequest| async move {
                    s.schedule_client.delete_slot(&m, req).await
                },
                Some(parse_delete_slot),
                false,
                CachePolicy::None,
            )),
        )
        .route("/schedule/lessons", get(list_lessons).post(handle(
            |s: AppState, m, req: CreateLessonRequest| async move {
                s.schedule_client.create_lesson(&m, req).await
            },
            None,
            true,
            CachePolicy::None,
        )))
        .route(
            "/schedule/lessons/{id}",
            get(handle(
                |s: AppState, m, req: GetLessonRequest| async move {
                    s.schedule_client.get_lesson(&m, req).await
                },
                Some(parse_get_lesson),
                false,
                CachePolicy::None,
            ))
            .patch(handle(
                |s: AppState, m, req: UpdateLessonRequest| async move {
                    s.schedule_client.update_lesson(&m, req).await
                },
                Some(parse_update_lesson),
                true,
                CachePolicy::None,
            )),
        )
        .route(
            "/schedule/lessons/{id}/cancel",
            post(handle(
                |s: AppState, m, req: CancelLessonRequest| async move {
                    s.schedule_client.cancel_lesson(&m, req).await
                },
                Some(parse_cancel_lesson),
                false,
                CachePolicy::None,
            )),
        )
}

fn parse_get_slot(parts: &RequestParts, req: &mut GetSlotRequest) -> Result<(), MediateError> {
    req.id = parts.path_param("id")?.to_string();
    Ok(())
}

fn parse_update_slot(parts: &RequestParts, req: &mut UpdateSlotRequest) -> Result<(), MediateError> {
    req.id = parts.path_param("id")?.to_string();
    Ok(())
}

fn parse_delete_slot(parts: &RequestParts, req: &mut DeleteSlotRequest) -> Result<(), MediateError> {
    req.id = parts.path_param("id")?.to_string();
    Ok(())
}

fn parse_list_slots(
    parts: &RequestParts,
    req: &mut ListSlotsByTutorRequest,
) -> Result<(), MediateError> {
    req.tutor_id = parts.path_param("tutor_id")?.to_string();
    if parts.query_value("only_available") == Some("true") {
        req.only_available = Some(true);
    }
    Ok(())
}

fn parse_get_lesson(parts: &RequestParts, req: &mut GetLessonRequest) -> Result<(), MediateError> {
    req.id = parts.path_param("id")?.to_string();
    Ok(())
}

fn parse_update_lesson(
    parts: &RequestParts,
    req: &mut UpdateLessonRequest,
) -> Result<(), MediateError> {
    req.id = parts.path_param("id")?.to_string();
    Ok(())
}

fn parse_cancel_lesson(
    parts: &RequestParts,
    req: &mut CancelLessonRequest,
) -> Result<(), MediateError> {
    req.id = parts.path_param("id")?.to_string();
    Ok(())
}

pub fn parse_status_filter(raw: &[&str]) -> Vec<String> {
    raw.iter()
        .map(|s| match s.to_ascii_uppercase().as_str() {
            "CANCELLED" => "cancelled".to_string(),
            "COMPLETED" => "completed".to_string(),
            _ => "booked".to_string(),
        })
        .collect()
}

/// The listing request shape depends on which selectors are present, so
/// this endpoint dispatches to one of three typed calls. A query that
/// selects none of them is a bad request.
async fn list_lessons(
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
                .schedule_client
                .list_lessons_by_pair(
                    &metadata,
                    ListLessonsByPairRequest {
                        tutor_id,
                        student_id,
                        status_filter,
                    },
                )
                .await
        }
        (Some(tutor_id), None) => {
            state
                .schedule_client
                .list_lessons_by_tutor(
                    &metadata,
                    ListLessonsByTutorRequest {
                        tutor_id,
                        status_filter,
                    },
                )
                .await
        }
        (None, Some(student_id)) => {
            state
                .schedule_client
                .list_lessons_by_student(
                    &metadata,
                    ListLessonsByStudentRequest {
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
