//! RPC boundary: method registration, id parsing, and the translation of
//! domain errors into wire statuses with per-operation allowed kinds.

use std::sync::Arc;

use uuid::Uuid;

use tutorlink_common::{map_domain_error, ErrorKind, RequestContext};
use tutorlink_proto::user as pb;
use tutorlink_proto::Empty;
use tutorlink_rpc::{Metadata, RpcServer, Status};

use crate::model::{
    CreateTutorStudentInput, Role, TutorProfile, TutorStudent, TutorStudentContext,
    TutorStudentStatus, UpdateTutorProfileInput, UpdateTutorStudentInput, UpdateUserInput, User,
};
use crate::service::UserService;

fn parse_uuid(value: &str) -> Result<Uuid, Status> {
    Uuid::parse_str(value).map_err(|e| Status::invalid_argument(format!("invalid id: {e}")))
}

fn user_to_proto(user: &User) -> pb::User {
    pb::User {
        id: user.id.to_string(),
        role: user.role.as_str().to_string(),
        auth_provider: user.auth_provider.clone(),
        status: user.status.as_str().to_string(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        timezone: user.timezone.clone(),
        created_at: user.created_at.timestamp(),
        edited_at: user.edited_at.timestamp(),
    }
}

fn profile_to_proto(profile: &TutorProfile) -> pb::TutorProfile {
    pb::TutorProfile {
        id: profile.id.to_string(),
        user_id: profile.user_id.to_string(),
        payment_info: profile.payment_info.clone(),
        lesson_price_rub: profile.lesson_price_rub,
        lesson_connection_link: profile.lesson_connection_link.clone(),
        created_at: profile.created_at.timestamp(),
        edited_at: profile.edited_at.timestamp(),
    }
}

fn tutor_student_to_proto(ts: &TutorStudent) -> pb::TutorStudent {
    pb::TutorStudent {
        id: ts.id.to_string(),
        tutor_id: ts.tutor_id.to_string(),
        student_id: ts.student_id.to_string(),
        status: ts.status.as_str().to_string(),
        lesson_price_rub: ts.lesson_price_rub,
        lesson_connection_link: ts.lesson_connection_link.clone(),
        created_at: ts.created_at.timestamp(),
        edited_at: ts.edited_at.timestamp(),
    }
}

fn context_to_proto(ctx: &TutorStudentContext) -> pb::TutorStudentContext {
    pb::TutorStudentContext {
        relationship_status: ctx.relationship_status.as_str().to_string(),
        lesson_price_rub: ctx.lesson_price_rub,
        lesson_connection_link: ctx.lesson_connection_link.clone(),
        payment_info: ctx.payment_info.clone(),
    }
}

pub fn register(server: &mut RpcServer, service: Arc<UserService>) {
    let svc = service.clone();
    server.add_method(
        pb::methods::REGISTER_VIA_TELEGRAM,
        move |_m: Metadata, req: pb::RegisterViaTelegramRequest| {
            let svc = svc.clone();
            async move {
                let role = Role::parse(&req.role)
                    .ok_or_else(|| Status::invalid_argument(format!("invalid role: {}", req.role)))?;
                let user = svc
                    .register_via_telegram(crate::model::RegisterViaTelegramInput {
                        telegram_id: req.telegram_id,
                        role,
                        username: req.username,
                        first_name: req.first_name,
                        last_name: req.last_name,
                        timezone: req.timezone,
                    })
                    .await
                    .map_err(|e| {
                        map_domain_error(e, &[ErrorKind::AlreadyExists, ErrorKind::Validation])
                    })?;
                Ok(user_to_proto(&user))
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::AUTHORIZE_BY_AUTH_HEADER,
        move |_m: Metadata, req: pb::AuthorizeByAuthHeaderRequest| {
            let svc = svc.clone();
            async move {
                let user = svc
                    .authorize(&req.authorization_header)
                    .await
                    .map_err(|e| {
                        map_domain_error(e, &[ErrorKind::Validation, ErrorKind::Authentication])
                    })?;
                Ok(user_to_proto(&user))
            }
        },
    );

    let svc = service.clone();
    server.add_method(pb::methods::GET_ME, move |m: Metadata, _req: Empty| {
        let svc = svc.clone();
        async move {
            let ctx = RequestContext::from_metadata(&m);
            let user = svc
                .get_me(&ctx)
                .await
                .map_err(|e| map_domain_error(e, &[ErrorKind::NotFound, ErrorKind::Authentication]))?;
            Ok(user_to_proto(&user))
        }
    });

    let svc = service.clone();
    server.add_method(
        pb::methods::GET_USER,
        move |_m: Metadata, req: pb::GetUserRequest| {
            let svc = svc.clone();
            async move {
                let id = parse_uuid(&req.id)?;
                let user = svc
                    .get_user_public(id)
                    .await
                    .map_err(|e| map_domain_error(e, &[ErrorKind::NotFound]))?;
                Ok(pb::UserPublic {
                    id: user.id.to_string(),
                    role: user.role.as_str().to_string(),
                    first_name: user.first_name.clone(),
                    last_name: user.last_name.clone(),
                })
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::UPDATE_USER,
        move |m: Metadata, req: pb::UpdateUserRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let id = parse_uuid(&req.id)?;
                let user = svc
                    .update_user(
                        &ctx,
                        id,
                        UpdateUserInput {
                            first_name: req.first_name,
                            last_name: req.last_name,
                            timezone: req.timezone,
                        },
                    )
                    .await
                    .map_err(|e| {
                        map_domain_error(
                            e,
                            &[
                                ErrorKind::NotFound,
                                ErrorKind::Validation,
                                ErrorKind::PermissionDenied,
                                ErrorKind::Authentication,
                            ],
                        )
                    })?;
                Ok(user_to_proto(&user))
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::GET_TUTOR_PROFILE,
        move |m: Metadata, req: pb::GetTutorProfileRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let id = parse_uuid(&req.user_id)?;
                let profile = svc.get_tutor_profile(&ctx, id).await.map_err(|e| {
                    map_domain_error(
                        e,
                        &[
                            ErrorKind::NotFound,
                            ErrorKind::PermissionDenied,
                            ErrorKind::Authentication,
                        ],
                    )
                })?;
                Ok(profile_to_proto(&profile))
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::UPDATE_TUTOR_PROFILE,
        move |m: Metadata, req: pb::UpdateTutorProfileRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let id = parse_uuid(&req.user_id)?;
                let profile = svc
                    .update_tutor_profile(
                        &ctx,
                        id,
                        UpdateTutorProfileInput {
                            payment_info: req.payment_info,
                            lesson_price_rub: req.lesson_price_rub,
                            lesson_connection_link: req.lesson_connection_link,
                        },
                    )
                    .await
                    .map_err(|e| {
                        map_domain_error(
                            e,
                            &[
                                ErrorKind::NotFound,
                                ErrorKind::Validation,
                                ErrorKind::PermissionDenied,
                                ErrorKind::Authentication,
                            ],
                        )
                    })?;
                Ok(profile_to_proto(&profile))
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::CREATE_TUTOR_STUDENT,
        move |m: Metadata, req: pb::CreateTutorStudentRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let tutor_id = parse_uuid(&req.tutor_id)?;
                let student_id = parse_uuid(&req.student_id)?;
                let ts = svc
                    .create_tutor_student(
                        &ctx,
                        CreateTutorStudentInput {
                            tutor_id,
                            student_id,
                            lesson_price_rub: req.lesson_price_rub,
                            lesson_connection_link: req.lesson_connection_link,
                        },
                    )
                    .await
                    .map_err(|e| {
                        map_domain_error(
                            e,
                            &[
                                ErrorKind::AlreadyExists,
                                ErrorKind::Validation,
                                ErrorKind::PermissionDenied,
                                ErrorKind::Authentication,
                            ],
                        )
                    })?;
                Ok(tutor_student_to_proto(&ts))
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::GET_TUTOR_STUDENT,
        move |m: Metadata, req: pb::GetTutorStudentRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let tutor_id = parse_uuid(&req.tutor_id)?;
                let student_id = parse_uuid(&req.student_id)?;
                let ts = svc
                    .get_tutor_student(&ctx, tutor_id, student_id)
                    .await
                    .map_err(|e| {
                        map_domain_error(
                            e,
                            &[
                                ErrorKind::NotFound,
                                ErrorKind::PermissionDenied,
                                ErrorKind::Authentication,
                            ],
                        )
                    })?;
                Ok(tutor_student_to_proto(&ts))
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::UPDATE_TUTOR_STUDENT,
        move |m: Metadata, req: pb::UpdateTutorStudentRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let tutor_id = parse_uuid(&req.tutor_id)?;
                let student_id = parse_uuid(&req.student_id)?;
                let status = match req.status.as_deref() {
                    Some(raw) => Some(
                        TutorStudentStatus::parse(raw)
                            .ok_or_else(|| Status::invalid_argument("invalid status"))?,
                    ),
                    None => None,
                };
                let ts = svc
                    .update_tutor_student(
                        &ctx,
                        tutor_id,
                        student_id,
                        UpdateTutorStudentInput {
                            lesson_price_rub: req.lesson_price_rub,
                            lesson_connection_link: req.lesson_connection_link,
                            status,
                        },
                    )
                    .await
                    .map_err(|e| {
                        map_domain_error(
                            e,
                            &[
                                ErrorKind::NotFound,
                                ErrorKind::PermissionDenied,
                                ErrorKind::Authentication,
                            ],
                        )
                    })?;
                Ok(tutor_student_to_proto(&ts))
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::DELETE_TUTOR_STUDENT,
        move |m: Metadata, req: pb::DeleteTutorStudentRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let tutor_id = parse_uuid(&req.tutor_id)?;
                let student_id = parse_uuid(&req.student_id)?;
                svc.delete_tutor_student(&ctx, tutor_id, student_id)
                    .await
                    .map_err(|e| {
                        map_domain_error(
                            e,
                            &[
                                ErrorKind::NotFound,
                                ErrorKind::PermissionDenied,
                                ErrorKind::Authentication,
                            ],
                        )
                    })?;
                Ok(Empty {})
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::LIST_TUTOR_STUDENTS,
        move |m: Metadata, req: pb::ListTutorStudentsRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let tutor_id = parse_uuid(&req.tutor_id)?;
                let students = svc.list_tutor_students(&ctx, tutor_id).await.map_err(|e| {
                    map_domain_error(
                        e,
                        &[
                            ErrorKind::NotFound,
                            ErrorKind::PermissionDenied,
                            ErrorKind::Authentication,
                        ],
                    )
                })?;
                Ok(pb::ListTutorStudentsResponse {
                    students: students.iter().map(tutor_student_to_proto).collect(),
                })
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::LIST_TUTORS_FOR_STUDENT,
        move |m: Metadata, req: pb::ListTutorsForStudentRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let student_id = parse_uuid(&req.student_id)?;
                let tutors = svc
                    .list_tutors_for_student(&ctx, student_id)
                    .await
                    .map_err(|e| {
                        map_domain_error(
                            e,
                            &[
                                ErrorKind::NotFound,
                                ErrorKind::PermissionDenied,
                                ErrorKind::Authentication,
                            ],
                        )
                    })?;
                Ok(pb::ListTutorStudentsResponse {
                    students: tutors.iter().map(tutor_student_to_proto).collect(),
                })
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::RESOLVE_TUTOR_STUDENT_CONTEXT,
        move |m: Metadata, req: pb::ResolveTutorStudentContextRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let tutor_id = parse_uuid(&req.tutor_id)?;
                let student_id = parse_uuid(&req.student_id)?;
                let resolved = svc
                    .resolve_tutor_student_context(&ctx, tutor_id, student_id)
                    .await
                    .map_err(|e| {
                        map_domain_error(
                            e,
                            &[
                                ErrorKind::NotFound,
                                ErrorKind::PermissionDenied,
                                ErrorKind::Authentication,
                            ],
                        )
                    })?;
                Ok(context_to_proto(&resolved))
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::ACCEPT_INVITATION,
        move |m: Metadata, req: pb::AcceptInvitationRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let tutor_id = parse_uuid(&req.tutor_id)?;
                svc.accept_invitation(&ctx, tutor_id).await.map_err(|e| {
                    map_domain_error(
                        e,
                        &[
                            ErrorKind::PermissionDenied,
                            ErrorKind::NotFound,
                            ErrorKind::Authentication,
                        ],
                    )
                })?;
                Ok(Empty {})
            }
        },
    );
}
