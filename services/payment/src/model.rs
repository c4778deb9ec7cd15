//! Domain types owned by the payment backend.

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub file_id: Uuid,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub edited_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PaymentInfo {
    pub lesson_id: Uuid,
    pub price_rub: Option<i32>,
    pub payment_details: Option<String>,
}

/// The slice of a lesson the payment flow needs from the schedule backend.
#[derive(Debug, Clone)]
pub struct LessonView {
    pub id: Uuid,
    pub is_paid: bool,
    pub price_rub: Option<i32>,
    pub payment_info: Option<String>,
}
