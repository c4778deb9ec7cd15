//! RPC message schemas and typed clients for every backend.
//!
//! Messages are hand-written prost structs that double as the gateway's
//! HTTP JSON schema through mirrored serde derives (camelCase, optional
//! fields omitted when absent). Timestamps travel as unix seconds.

pub mod file;
pub mod homework;
pub mod payment;
pub mod schedule;
pub mod user;

use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
pub struct Empty {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_messages_round_trip_through_json() {
        let user = user::User {
            id: "0191aa00-0000-7000-8000-000000000001".into(),
            role: "tutor".into(),
            auth_provider: "telegram".into(),
            status: "active".into(),
            first_name: Some("Alice".into()),
            last_name: None,
            timezone: Some("Europe/Berlin".into()),
            created_at: 1_700_000_000,
            edited_at: 1_700_000_100,
        };
        let json = serde_json::to_vec(&user).unwrap();
        let back: user::User = serde_json::from_slice(&json).unwrap();
        assert_eq!(user, back);

        let lesson = schedule::Lesson {
            id: "l1".into(),
            slot_id: "s1".into(),
            student_id: "st1".into(),
            status: "booked".into(),
            is_paid: false,
            connection_link: Some("https://meet.example/x".into()),
            price_rub: Some(1500),
            payment_info: None,
            created_at: 1_700_000_000,
            edited_at: 1_700_000_000,
        };
        let json = serde_json::to_vec(&lesson).unwrap();
        let back: schedule::Lesson = serde_json::from_slice(&json).unwrap();
        assert_eq!(lesson, back);
    }

    #[test]
    fn absent_optionals_are_omitted_from_json() {
        let public = user::UserPublic {
            id: "u1".into(),
            role: "student".into(),
            first_name: None,
            last_name: None,
        };
        let json = serde_json::to_string(&public).unwrap();
        assert!(!json.contains("firstName"));
        assert!(!json.contains("lastName"));
    }

    #[test]
    fn request_fields_use_camel_case() {
        let body = r#"{"role":"student","telegramId":42,"firstName":"Bob"}"#;
        let req: user::RegisterViaTelegramRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.role, "student");
        assert_eq!(req.telegram_id, 42);
        assert_eq!(req.first_name.as_deref(), Some("Bob"));
        assert_eq!(req.username, None);
    }
}
