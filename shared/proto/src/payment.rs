//! Payment backend: receipts and payment-info reads.

use serde::{Deserialize, Serialize};
use tutorlink_rpc::{Channel, Metadata, Status};

pub mod methods {
    pub const SUBMIT_PAYMENT_RECEIPT: &str = "payment.SubmitPaymentReceipt";
    pub const GET_PAYMENT_INFO: &str = "payment.GetPaymentInfo";
    pub const GET_RECEIPT: &str = "payment.GetReceipt";
    pub const VERIFY_RECEIPT: &str = "payment.VerifyReceipt";
    pub const GET_RECEIPT_FILE: &str = "payment.GetReceiptFile";
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Receipt {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub lesson_id: String,
    #[prost(string, tag = "3")]
    pub file_id: String,
    #[prost(bool, tag = "4")]
    pub is_verified: bool,
    #[prost(int64, tag = "5")]
    pub created_at: i64,
    #[prost(int64, tag = "6")]
    pub edited_at: i64,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmitPaymentReceiptRequest {
    #[prost(string, tag = "1")]
    pub lesson_id: String,
    #[prost(string, tag = "2")]
    pub file_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetPaymentInfoRequest {
    #[prost(string, tag = "1")]
    pub lesson_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentInfo {
    #[prost(string, tag = "1")]
    pub lesson_id: String,
    #[prost(int32, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_rub: Option<i32>,
    #[prost(string, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_details: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetReceiptRequest {
    #[prost(string, tag = "1")]
    pub receipt_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifyReceiptRequest {
    #[prost(string, tag = "1")]
    pub receipt_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetReceiptFileRequest {
    #[prost(string, tag = "1")]
    pub receipt_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReceiptFileUrl {
    #[prost(string, tag = "1")]
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct PaymentClient {
    channel: Channel,
}

impl PaymentClient {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }

    pub async fn submit_payment_receipt(
        &self,
        metadata: &Metadata,
        req: SubmitPaymentReceiptRequest,
    ) -> Result<Receipt, Status> {
        self.channel
            .call(methods::SUBMIT_PAYMENT_RECEIPT, metadata, &req)
            .await
    }

    pub async fn get_payment_info(
        &self,
        metadata: &Metadata,
        req: GetPaymentInfoRequest,
    ) -> Result<PaymentInfo, Status> {
        self.channel
            .call(methods::GET_PAYMENT_INFO, metadata, &req)
            .await
    }

    pub async fn get_receipt(
        &self,
        metadata: &Metadata,
        req: GetReceiptRequest,
    ) -> Result<Receipt, Status> {
        self.channel.call(methods::GET_RECEIPT, metadata, &req).await
    }

    pub async fn verify_receipt(
        &self,
        metadata: &Metadata,
        req: VerifyReceiptRequest,
    ) -> Result<Receipt, Status> {
        self.channel
            .call(methods::VERIFY_RECEIPT, metadata, &req)
            .await
    }

    pub async fn get_receipt_file(
        &self,
        metadata: &Metadata,
        req: GetReceiptFileRequest,
    ) -> Result<ReceiptFileUrl, Status> {
        self.channel
            .call(methods::GET_RECEIPT_FILE, metadata, &req)
            .await
    }
}
