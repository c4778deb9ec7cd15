//! User, tutor-profile and tutor-student routes.

use axum::routing::{delete, get, patch, post};
use axum::Router;

use tutorlink_proto::user::*;
use tutorlink_proto::Empty;

use crate::mediator::{
    handle, CachePolicy, KeyFn, MediateError, RequestParts, DEFAULT_TTL, USER_ID_HEADER,
};
use crate::AppState;

pub fn public_routes() -> Router<AppState> {
    Router::new().route(
        "/users/sign-up/telegram",
        post(handle(
            |s: AppState, m, req: RegisterViaTelegramRequest| async move {
                s.user_client.register_via_telegram(&m, req).await
            },
            None,
            true,
            CachePolicy::None,
        )),
    )
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/me",
            get(handle(
                |s: AppState, m, req: Empty| async move { s.user_client.get_me(&m, req).await },
                None,
                false,
                CachePolicy::Read {
                    key: build_me_key,
                    ttl: DEFAULT_TTL,
                },
            )),
        )
        .route(
            "/users/{id}",
            get(handle(
                |s: AppState, m, req: GetUserRequest| async move {
                    s.user_client.get_user(&m, req).await
                },
                Some(parse_user_id),
                false,
                CachePolicy::Read {
                    key: build_user_public_key,
                    ttl: DEFAULT_TTL,
                },
            ))
            .patch(handle(
                |s: AppState, m, req: UpdateUserRequest| async move {
                    s.user_client.update_user(&m, req).await
                },
                Some(parse_update_user),
                true,
                CachePolicy::Invalidate {
                    keys: USER_WRITE_KEYS,
                },
            )),
        )
        .route(
            "/tutor-profiles/{id}",
            get(handle(
                |s: AppState, m, req: GetTutorProfileRequest| async move {
                    s.user_client.get_tutor_profile(&m, req).await
                },
                Some(parse_tutor_profile_id),
                false,
                CachePolicy::Read {
                    key: build_tutor_profile_key,
                    ttl: DEFAULT_TTL,
                },
            ))
            .patch(handle(
                |s: AppState, m, req: UpdateTutorProfileRequest| async move {
                    s.user_client.update_tutor_profile(&m, req).await
                },
                Some(parse_update_tutor_profile),
                true,
                CachePolicy::Invalidate {
                    keys: TUTOR_PROFILE_WRITE_KEYS,
                },
            )),
        )
        .route(
            "/tutor-students",
            post(handle(
                |s: AppState, m, req: CreateTutorStudentRequest| async move {
                    s.user_client.create_tutor_student(&m, req).await
                },
                None,
                true,
                CachePolicy::None,
            )),
        )
        .route(
            "/tutor-students/by-tutor/{id}",
            get(handle(
                |s: AppState, m, req: ListTutorStudentsRequest| async move {
                    s.user_client.list_tutor_students(&m, req).await
                },
                Some(parse_list_by_tutor),
                false,
                CachePolicy::None,
            )),
        )
        .route(
            "/tutor-students/by-student/{id}",
            get(handle(
                |s: AppState, m, req: ListTutorsForStudentRequest| async move {
                    s.user_client.list_tutors_for_student(&m, req).await
                },
                Some(parse_list_by_student),
                false,
                CachePolicy::None,
            )),
        )
        .route(
            "/tutor-students/{tutor_id}/accept",
            post(handle(
                |s: AppState, m, req: AcceptInvitationRequest| async move {
                    s.user_client.accept_invitation(&m, req).await
                },
                Some(parse_accept_invitation),
                false,
                CachePolicy::Invalidate {
                    keys: TUTOR_STUDENT_ACCEPT_KEYS,
                },
            )),
        )
        .route(
            "/tutor-students/{tutor_id}/{student_id}",
            get(handle(
                |s: AppState, m, req: GetTutorStudentRequest| async move {
                    s.user_client.get_tutor_student(&m, req).await
                },
                Some(parse_tutor_student_pair_get),
                false,
                CachePolicy::Read {
                    key: build_tutor_student_key,
                    ttl: DEFAULT_TTL,
                },
            ))
            .patch(handle(
                |s: AppState, m, req: UpdateTutorStudentRequest| async move {
                    s.user_client.update_tutor_student(&m, req).await
                },
                Some(parse_tutor_student_pair_update),
                true,
                CachePolicy::Invalidate {
                    keys: TUTOR_STUDENT_WRITE_KEYS,
                },
            ))
            .delete(handle(
                |s: AppState, m, req: DeleteTutorStudentRequest| async move {
                    s.user_client.delete_tutor_student(&m, req).await
                },
                Some(parse_tutor_student_pair_delete),
                false,
                CachePolicy::Invalidate {
                    keys: TUTOR_STUDENT_WRITE_KEYS,
                },
            )),
        )
}

fn parse_user_id(parts: &RequestParts, req: &mut GetUserRequest) -> Result<(), MediateError> {
    req.id = parts.path_param("id")?.to_string();
    Ok(())
}

fn parse_update_user(parts: &RequestParts, req: &mut UpdateUserRequest) -> Result<(), MediateError> {
    req.id = parts.path_param("id")?.to_string();
    Ok(())
}

fn parse_tutor_profile_id(
    parts: &RequestParts,
    req: &mut GetTutorProfileRequest,
) -> Result<(), MediateError> {
    req.user_id = parts.path_param("id")?.to_string();
    Ok(())
}

fn parse_update_tutor_profile(
    parts: &RequestParts,
    req: &mut UpdateTutorProfileRequest,
) -> Result<(), MediateError> {
    req.user_id = parts.path_param("id")?.to_string();
    Ok(())
}

fn parse_list_by_tutor(
    parts: &RequestParts,
    req: &mut ListTutorStudentsRequest,
) -> Result<(), MediateError> {
    req.tutor_id = parts.path_param("id")?.to_string();
    Ok(())
}

fn parse_list_by_student(
    parts: &RequestParts,
    req: &mut ListTutorsForStudentRequest,
) -> Result<(), MediateError> {
    req.student_id = parts.path_param("id")?.to_string();
    Ok(())
}

fn parse_accept_invitation(
    parts: &RequestParts,
    req: &mut AcceptInvitationRequest,
) -> Result<(), MediateError> {
    req.tutor_id = parts.path_param("tutor_id")?.to_string();
    Ok(())
}

fn parse_tutor_student_pair_get(
    parts: &RequestParts,
    req: &mut GetTutorStudentRequest,
) -> Result<(), MediateError> {
    req.tutor_id = parts.path_param("tutor_id")?.to_string();
    req.student_id = parts.path_param("student_id")?.to_string();
    Ok(())
}

fn parse_tutor_student_pair_update(
    parts: &RequestParts,
    req: &mut UpdateTutorStudentRequest,
) -> Result<(), MediateError> {
    req.tutor_id = parts.path_param("tutor_id")?.to_string();
    req.student_id = parts.path_param("student_id")?.to_string();
    Ok(())
}

fn parse_tutor_student_pair_delete(
    parts: &RequestParts,
    req: &mut DeleteTutorStudentRequest,
) -> Result<(), MediateError> {
    req.tutor_id = parts.path_param("tutor_id")?.to_string();
    req.student_id = parts.path_param("student_id")?.to_string();
    Ok(())
}

// Cache keys. `user:` entries are keyed by the resolved identity header
// for /users/me and by the path id for public reads.

pub fn build_me_key(parts: &RequestParts) -> Result<String, MediateError> {
    let id = parts
        .header(USER_ID_HEADER)
        .ok_or_else(|| MediateError::BadRequest("missing header: X-User-Id".to_string()))?;
    Ok(format!("user:{id}"))
}

pub fn build_user_key(parts: &RequestParts) -> Result<String, MediateError> {
    Ok(format!("user:{}", parts.path_param("id")?))
}

pub fn build_user_public_key(parts: &RequestParts) -> Result<String, MediateError> {
    Ok(format!("user-public:{}", parts.path_param("id")?))
}

pub fn build_tutor_profile_key(parts: &RequestParts) -> Result<String, MediateError> {
    Ok(format!("tutor-profile:{}", parts.path_param("id")?))
}

pub fn build_tutor_student_key(parts: &RequestParts) -> Result<String, MediateError> {
    Ok(format!(
        "tutor-student:{}:{}",
        parts.path_param("tutor_id")?,
        parts.path_param("student_id")?
    ))
}

fn build_tutor_student_accept_key(parts: &RequestParts) -> Result<String, MediateError> {
    let tutor = parts.path_param("tutor_id")?;
    let student = parts
        .header(USER_ID_HEADER)
        .ok_or_else(|| MediateError::BadRequest("missing header: X-User-Id".to_string()))?;
    Ok(format!("tutor-student:{tutor}:{student}"))
}

const USER_WRITE_KEYS: &[KeyFn] = &[build_user_key, build_user_public_key];
const TUTOR_PROFILE_WRITE_KEYS: &[KeyFn] = &[build_tutor_profile_key];
const TUTOR_STUDENT_WRITE_KEYS: &[KeyFn] = &[build_tutor_student_key];
const TUTOR_STUDENT_ACCEPT_KEYS: &[KeyFn] = &[build_tutor_student_accept_key];
