//! Domain types owned by the user backend.

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Tutor,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Tutor => "tutor",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "student" => Some(Role::Student),
            "tutor" => Some(Role::Tutor),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStatus {
    Active,
    Deleted,
}

impl UserStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Deleted => "deleted",
        }
    }

    pub fn parse(s: &str) -> Option<UserStatus> {
        match s {
            "active" => Some(UserStatus::Active),
            "deleted" => Some(UserStatus::Deleted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TutorStudentStatus {
    Invited,
    Active,
}

impl TutorStudentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TutorStudentStatus::Invited => "invited",
            TutorStudentStatus::Active => "active",
        }
    }

    pub fn parse(s: &str) -> Option<TutorStudentStatus> {
        match s {
            "invited" => Some(TutorStudentStatus::Invited),
            "active" => Some(TutorStudentStatus::Active),
            _ => None,
        }
    }
}

pub const AUTH_PROVIDER_TELEGRAM: &str = "telegram";

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub role: Role,
    pub auth_provider: String,
    pub status: UserStatus,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub timezone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub edited_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TelegramAccount {
    pub id: Uuid,
    pub user_id: Uuid,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TutorProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub payment_info: Option<String>,
    pub lesson_price_rub: Option<i32>,
    pub lesson_connection_link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub edited_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TutorStudent {
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub student_id: Uuid,
    pub status: TutorStudentStatus,
    pub lesson_price_rub: Option<i32>,
    pub lesson_connection_link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub edited_at: DateTime<Utc>,
}

/// Resolved pair context: per-pair overrides over tutor-profile defaults.
#[derive(Debug, Clone)]
pub struct TutorStudentContext {
    pub relationship_status: TutorStudentStatus,
    pub lesson_price_rub: Option<i32>,
    pub lesson_connection_link: Option<String>,
    pub payment_info: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RegisterViaTelegramInput {
    pub telegram_id: i64,
    pub role: Role,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTutorProfileInput {
    pub payment_info: Option<String>,
    pub lesson_price_rub: Option<i32>,
    pub lesson_connection_link: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateTutorStudentInput {
    pub tutor_id: Uuid,
    pub student_id: Uuid,
    pub lesson_price_rub: Option<i32>,
    pub lesson_connection_link: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTutorStudentInput {
    pub lesson_price_rub: Option<i32>,
    pub lesson_connection_link: Option<String>,
    pub status: Option<TutorStudentStatus>,
}
