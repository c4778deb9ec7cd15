//! RPC boundary of the payment backend.

use std::sync::Arc;

use uuid::Uuid;

use tutorlink_common::{map_domain_error, ErrorKind, RequestContext};
use tutorlink_proto::payment as pb;
use tutorlink_rpc::{Metadata, RpcServer, Status};

use crate::model::PaymentReceipt;
use crate::service::PaymentService;

fn parse_uuid(field: &str, value: &str) -> Result<Uuid, Status> {
    Uuid::parse_str(value)
        .map_err(|e| Status::invalid_argument(format!("invalid {field}: {e}")))
}

fn receipt_to_proto(receipt: &PaymentReceipt) -> pb::Receipt {
    pb::Receipt {
        id: receipt.id.to_string(),
        lesson_id: receipt.lesson_id.to_string(),
        file_id: receipt.file_id.to_string(),
        is_verified: receipt.is_verified,
        created_at: receipt.created_at.timestamp(),
        edited_at: receipt.edited_at.timestamp(),
    }
}

pub fn register(server: &mut RpcServer, service: Arc<PaymentService>) {
    let svc = service.clone();
    server.add_method(
        pb::methods::SUBMIT_PAYMENT_RECEIPT,
        move |m: Metadata, req: pb::SubmitPaymentReceiptRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let lesson_id = parse_uuid("lesson id", &req.lesson_id)?;
                let file_id = parse_uuid("file id", &req.file_id)?;
                let receipt = svc
                    .submit_payment_receipt(&ctx, lesson_id, file_id)
                    .await
                    .map_err(|e| {
                        map_domain_error(
                            e,
                            &[
                                ErrorKind::NotFound,
                                ErrorKind::PermissionDenied,
                                ErrorKind::Validation,
                                ErrorKind::AlreadyExists,
                                ErrorKind::Authentication,
                            ],
                        )
                    })?;
                Ok(receipt_to_proto(&receipt))
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::GET_PAYMENT_INFO,
        move |m: Metadata, req: pb::GetPaymentInfoRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let lesson_id = parse_uuid("lesson id", &req.lesson_id)?;
                let info = svc.get_payment_info(&ctx, lesson_id).await.map_err(|e| {
                    map_domain_error(
                        e,
                        &[
                            ErrorKind::NotFound,
                            ErrorKind::Validation,
                            ErrorKind::Authentication,
                        ],
                    )
                })?;
                Ok(pb::PaymentInfo {
                    lesson_id: info.lesson_id.to_string(),
                    price_rub: info.price_rub,
                    payment_details: info.payment_details,
                })
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::GET_RECEIPT,
        move |m: Metadata, req: pb::GetReceiptRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let receipt_id = parse_uuid("receipt id", &req.receipt_id)?;
                let receipt = svc.get_receipt(&ctx, receipt_id).await.map_err(|e| {
                    map_domain_error(
                        e,
                        &[
                            ErrorKind::NotFound,
                            ErrorKind::PermissionDenied,
                            ErrorKind::Validation,
                        ],
                    )
                })?;
                Ok(receipt_to_proto(&receipt))
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::VERIFY_RECEIPT,
        move |m: Metadata, req: pb::VerifyReceiptRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let receipt_id = parse_uuid("receipt id", &req.receipt_id)?;
                let receipt = svc.verify_receipt(&ctx, receipt_id).await.map_err(|e| {
                    map_domain_error(
                        e,
                        &[
                            ErrorKind::NotFound,
                            ErrorKind::PermissionDenied,
                            ErrorKind::InvalidPayment,
                            ErrorKind::Validation,
                            ErrorKind::Authentication,
                        ],
                    )
                })?;
                Ok(receipt_to_proto(&receipt))
            }
        },
    );

    let svc = service.clone();
    server.add_method(
        pb::methods::GET_RECEIPT_FILE,
        move |m: Metadata, req: pb::GetReceiptFileRequest| {
            let svc = svc.clone();
            async move {
                let ctx = RequestContext::from_metadata(&m);
                let receipt_id = parse_uuid("receipt id", &req.receipt_id)?;
                let url = svc.get_receipt_file(&ctx, receipt_id).await.map_err(|e| {
                    map_domain_error(
                        e,
                        &[
                            ErrorKind::NotFound,
                            ErrorKind::Validation,
                            ErrorKind::PermissionDenied,
                        ],
                    )
                })?;
                Ok(pb::ReceiptFileUrl { url })
            }
        },
    );
}
