//! Domain types owned by the schedule backend.

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonStatus {
    Booked,
    Cancelled,
    Completed,
}

impl LessonStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LessonStatus::Booked => "booked",
            LessonStatus::Cancelled => "cancelled",
            LessonStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<LessonStatus> {
        match s {
            "booked" => Some(LessonStatus::Booked),
            "cancelled" => Some(LessonStatus::Cancelled),
            "completed" => Some(LessonStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Slot {
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_booked: bool,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct Lesson {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub student_id: Uuid,
    pub status: LessonStatus,
    pub is_paid: bool,
    pub connection_link: Option<String>,
    pub price_rub: Option<i32>,
    pub payment_info: Option<String>,
    pub created_at: DateTime<Utc>,
    pub edited_at: DateTime<Utc>,
}
