//! Payment routes: receipt submission, verification, and payment info.

use axum::routing::{get, post};
use axum::Router;

use tutorlink_proto::payment::*;

use crate::mediator::{handle, CachePolicy, MediateError, RequestParts};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/payment/info/{lesson_id}",
            get(handle(
                |s: AppState, m, req: GetPaymentInfoRequest| async move {
                    s.payment_client.get_payment_info(&m, req).await
                },
                Some(parse_payment_info),
                false,
                CachePolicy::None,
            )),
        )
        .route(
            "/payment/receipts",
            post(handle(
                |s: AppState, m, req: SubmitPaymentReceiptRequest| async move {
                    s.payment_client.submit_payment_receipt(&m, req).await
                },
                None,
                true,
                CachePolicy::None,
            )),
        )
        .route(
            "/payment/receipts/{id}",
            get(handle(
                |s: AppState, m, req: GetReceiptRequest| async move {
                    s.payment_client.get_receipt(&m, req).await
                },
                Some(parse_get_receipt),
                false,
                CachePolicy::None,
            )),
        )
        .route(
            "/payment/receipts/{id}/verify",
            post(handle(
                |s: AppState, m, req: VerifyReceiptRequest| async move {
                    s.payment_client.verify_receipt(&m, req).await
                },
                Some(parse_verify_receipt),
                false,
                CachePolicy::None,
            )),
        )
        .route(
            "/payment/receipts/{id}/file-url",
            get(handle(
                |s: AppState, m, req: GetReceiptFileRequest| async move {
                    s.payment_client.get_receipt_file(&m, req).await
                },
                Some(parse_receipt_file),
                false,
                CachePolicy::None,
            )),
        )
}

fn parse_payment_info(
    parts: &RequestParts,
    req: &mut GetPaymentInfoRequest,
) -> Result<(), MediateError> {
    req.lesson_id = parts.path_param("lesson_id")?.to_string();
    Ok(())
}

fn parse_get_receipt(
    parts: &RequestParts,
    req: &mut GetReceiptRequest,
) -> Result<(), MediateError> {
    req.receipt_id = parts.path_param("id")?.to_string();
    Ok(())
}

fn parse_verify_receipt(
    parts: &RequestParts,
    req: &mut VerifyReceiptRequest,
) -> Result<(), MediateError> {
    req.receipt_id = parts.path_param("id")?.to_string();
    Ok(())
}

fn parse_receipt_file(
    parts: &RequestParts,
    req: &mut GetReceiptFileRequest,
) -> Result<(), MediateError> {
    req.receipt_id = parts.path_param("id")?.to_string();
    Ok(())
}
