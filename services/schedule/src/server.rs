//! RPC boundary of the schedule backend.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use tutorlink_common::{DomainError, RequestContext};
use tutorlink_proto::schedule as pb;
use tutorlink_proto::Empty;
use tutorlink_rpc::{Metadata, RpcServer, Status};

use crate::model::{Lesson, LessonStatus, Slot};
use crate::service::{CreateLessonInput, CreateSlotInput, ScheduleService, UpdateLessonInput};

fn parse_uuid(value: &str) -> Result<Uuid, Status> {
    Uuid::parse_str(value).map_err(|e| Status::invalid_argument(format!("invalid id: {e}")))
}

fn parse_timestamp(value: i64) -> Result<DateTime<Utc>, Status> {
    DateTime::<Utc>::from_timestamp(value, 0)
        .ok_or_else(|| Status::invalid_argument(format!("invalid timestamp: {value}")))
}

fn parse_statuses(raw: &[String]) -> Vec<LessonStatus> {
    raw.iter().filter_map(|s| LessonStatus::parse(s)).collect()
}

/// The schedule backend reports its full error vocabulary directly; peer
/// statuses pass through untouched.
fn to_status(err: DomainError) -> Status {
    match err {
        DomainError::Status(status) => status,
        other => match other.kind() {
            Some(kind) => Status::new(kind.rpc_code(), other.to_string()),
            None => {
                tracing::error!(error = %other, "internal error");
                Status::internal("internal error")
            }
        },
    }
}

fn slot_to_proto(slot: &Slot) -> pb::Slot {
    pb::Slot {
        id: slot.id.to_string(),
        tutor_id: slot.tutor_id.to_string(),
        starts_at: slot.starts_at.timestamp(),
        ends_at: slot.ends_at.timestamp(),
        is_booked: slot.is_booked,
        created_at: slot.created_at.timestamp(),
        edited_at: slot.edited_at.unwrap_or(slot.created_at).timestamp(),
    }
}

fn lesson_to_proto(lesson: &Lesson) -> pb::Lesson {
    pb::Lesson {
        id: lesson.id.to_string(),
        slot_id: lesson.slot_id.to_string(),
        student_id: lesson.student_id.to_string(),
        status: lesson.status.as_str().to_string(),
        is_paid: lesson.is_paid,
        connection_link: lesson.connection_link.clone(),
        price_rub: lesson.price_rub,
        payment_info: lesson.payment_info.clone(),
        created_at: lesson.created_at.timestamp(),
        edited_at: lesson.edited_at.timestamp(),
    }
}

fn lessons_response(lessons: &[Lesson]) -> pb::ListLessonsResponse {
    pb::ListLessonsResponse {
        lessons: lessons.iter().map(lesson_to_proto).collect(),
    }
}

pub fn register(server: &mut RpcServer, service: Arc<ScheduleService>) {
    let svc = service.clone();
    server.add_method(
        pb::methods::CREATE_SLOT,
        move |m: Metadata, req: pb::CreateSlotRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let input = CreateSlotInput {
                    tutor_id: parse_uuid(&req.tutor_id)?,
                    starts_at: parse_timestamp(req.starts_at)?,
                    ends_at: parse_timestamp(req.ends_at)?,
                };
                let slot = svc.create_slot(&ctx, input).await.map_err(to_status)?;
                Ok(slot_to_proto(&slot))
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::GET_SLOT,
        move |m: Metadata, req: pb::GetSlotRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let slot = svc
                    .get_slot(&ctx, parse_uuid(&req.id)?)
                    .await
                    .map_err(to_status)?;
                Ok(slot_to_proto(&slot))
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::UPDATE_SLOT,
        move |m: Metadata, req: pb::UpdateSlotRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let slot = svc
                    .update_slot(
                        &ctx,
                        parse_uuid(&req.id)?,
                        parse_timestamp(req.starts_at)?,
                        parse_timestamp(req.ends_at)?,
                    )
                    .await
                    .map_err(to_status)?;
                Ok(slot_to_proto(&slot))
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::DELETE_SLOT,
        move |m: Metadata, req: pb::DeleteSlotRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                svc.delete_slot(&ctx, parse_uuid(&req.id)?)
                    .await
                    .map_err(to_status)?;
                Ok(Empty {})
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::LIST_SLOTS_BY_TUTOR,
        move |m: Metadata, req: pb::ListSlotsByTutorRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let slots = svc
                    .list_slots_by_tutor(
                        &ctx,
                        parse_uuid(&req.tutor_id)?,
                        req.only_available.unwrap_or(false),
                    )
                    .await
                    .map_err(to_status)?;
                Ok(pb::ListSlotsResponse {
                    slots: slots.iter().map(slot_to_proto).collect(),
                })
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::CREATE_LESSON,
        move |m: Metadata, req: pb::CreateLessonRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let input = CreateLessonInput {
                    slot_id: parse_uuid(&req.slot_id)?,
                    student_id: parse_uuid(&req.student_id)?,
                };
                let lesson = svc.create_lesson(&ctx, input).await.map_err(to_status)?;
                Ok(lesson_to_proto(&lesson))
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::GET_LESSON,
        move |m: Metadata, req: pb::GetLessonRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let lesson = svc
                    .get_lesson(&ctx, parse_uuid(&req.id)?)
                    .await
                    .map_err(to_status)?;
                Ok(lesson_to_proto(&lesson))
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::UPDATE_LESSON,
        move |m: Metadata, req: pb::UpdateLessonRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let lesson = svc
                    .update_lesson(
                        &ctx,
                        parse_uuid(&req.id)?,
                        UpdateLessonInput {
                            connection_link: req.connection_link,
                            price_rub: req.price_rub,
                            payment_info: req.payment_info,
                        },
                    )
                    .await
                    .map_err(to_status)?;
                Ok(lesson_to_proto(&lesson))
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::CANCEL_LESSON,
        move |m: Metadata, req: pb::CancelLessonRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let lesson = svc
                    .cancel_lesson(&ctx, parse_uuid(&req.id)?)
                    .await
                    .map_err(to_status)?;
                Ok(lesson_to_proto(&lesson))
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::LIST_LESSONS_BY_TUTOR,
        move |m: Metadata, req: pb::ListLessonsByTutorRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let lessons = svc
                    .list_lessons_by_tutor(
                        &ctx,
                        parse_uuid(&req.tutor_id)?,
                        &parse_statuses(&req.status_filter),
                    )
                    .await
                    .map_err(to_status)?;
                Ok(lessons_response(&lessons))
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::LIST_LESSONS_BY_STUDENT,
        move |m: Metadata, req: pb::ListLessonsByStudentRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let lessons = svc
                    .list_lessons_by_student(
                        &ctx,
                        parse_uuid(&req.student_id)?,
                        &parse_statuses(&req.status_filter),
                    )
                    .await
                    .map_err(to_status)?;
                Ok(lessons_response(&lessons))
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::LIST_LESSONS_BY_PAIR,
        move |m: Metadata, req: pb::ListLessonsByPairRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let lessons = svc
                    .list_lessons_by_pair(
                        &ctx,
                        parse_uuid(&req.tutor_id)?,
                        parse_uuid(&req.student_id)?,
                        &parse_statuses(&req.status_filter),
                    )
                    .await
                    .map_err(to_status)?;
                Ok(lessons_response(&lessons))
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::LIST_COMPLETED_UNPAID_LESSONS,
        move |m: Metadata, req: pb::ListCompletedUnpaidLessonsRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let after = match req.after {
                    Some(secs) => Some(parse_timestamp(secs)?),
                    None => None,
                };
                let lessons = svc
                    .list_completed_unpaid_lessons(&ctx, after)
                    .await
                    .map_err(to_status)?;
                Ok(lessons_response(&lessons))
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::MARK_AS_PAID,
        move |m: Metadata, req: pb::MarkAsPaidRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let lesson = svc
                    .mark_as_paid(&ctx, parse_uuid(&req.id)?)
                    .await
                    .map_err(to_status)?;
                Ok(lesson_to_proto(&lesson))
            }
        },
    );
}
