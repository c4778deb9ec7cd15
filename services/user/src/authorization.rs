//! Telegram credential validation.
//!
//! A token is `<telegram-id>:<unix-seconds>:<hex-hmac-sha256>` where the
//! MAC covers `<telegram-id>:<unix-seconds>`. The timestamp window is
//! five minutes either way with closed boundaries, so an exactly-expired
//! timestamp fails.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use tutorlink_common::DomainError;

type HmacSha256 = Hmac<Sha256>;

const WINDOW_SECONDS: i64 = 5 * 60;

pub fn telegram_id_from_token(secret: &str, token: &str) -> Result<i64, DomainError> {
    let fields: Vec<&str> = token.split(':').collect();
    if fields.len() != 3 {
        return Err(DomainError::Authentication(format!(
            "token field count mismatch, got {}",
            fields.len()
        )));
    }

    let telegram_id: i64 = fields[0]
        .parse()
        .map_err(|_| DomainError::Authentication("cannot parse telegram id".to_string()))?;

    let timestamp: i64 = fields[1]
        .parse()
        .map_err(|_| DomainError::Authentication("cannot parse timestamp".to_string()))?;

    let now = Utc::now().timestamp();
    if now - WINDOW_SECONDS >= timestamp || timestamp >= now + WINDOW_SECONDS {
        return Err(DomainError::Authentication(
            "timestamp outside the allowed window".to_string(),
        ));
    }

    let message = format!("{}:{}", fields[0], fields[1]);
    verify_mac(secret, &message, fields[2])?;

    Ok(telegram_id)
}

fn verify_mac(secret: &str, message: &str, mac_hex: &str) -> Result<(), DomainError> {
    let presented = hex::decode(mac_hex)
        .map_err(|_| DomainError::Authentication("mac is not valid hex".to_string()))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| DomainError::internal(format!("hmac key: {e}")))?;
    mac.update(message.as_bytes());
    // verify_slice compares in constant time.
    mac.verify_slice(&presented)
        .map_err(|_| DomainError::Authentication("invalid mac".to_string()))
}

/// Produce a valid token, used by tests and local tooling.
pub fn sign_token(secret: &str, telegram_id: i64, timestamp: i64) -> String {
    let message = format!("{telegram_id}:{timestamp}");
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key size");
    mac.update(message.as_bytes());
    let digest = hex::encode(mac.finalize().into_bytes());
    format!("{message}:{digest}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn valid_token_resolves_the_telegram_id() {
        let now = Utc::now().timestamp();
        let token = sign_token(SECRET, 42, now);
        assert_eq!(telegram_id_from_token(SECRET, &token).unwrap(), 42);
    }

    #[test]
    fn wrong_field_count_is_rejected() {
        for token in ["42", "42:100", "42:100:aa:bb"] {
            assert!(matches!(
                telegram_id_from_token(SECRET, token),
                Err(DomainError::Authentication(_))
            ));
        }
    }

    #[test]
    fn non_numeric_fields_are_rejected() {
        let now = Utc::now().timestamp();
        let good = sign_token(SECRET, 42, now);
        let mac = good.rsplit(':').next().unwrap();
        for token in [
            format!("abc:{now}:{mac}"),
            format!("42:notatime:{mac}"),
        ] {
            assert!(matches!(
                telegram_id_from_token(SECRET, &token),
                Err(DomainError::Authentication(_))
            ));
        }
    }

    #[test]
    fn boundary_timestamps_are_rejected() {
        let now = Utc::now().timestamp();
        for timestamp in [now - 300, now + 300] {
            let token = sign_token(SECRET, 42, timestamp);
            assert!(matches!(
                telegram_id_from_token(SECRET, &token),
                Err(DomainError::Authentication(_))
            ));
        }
    }

    #[test]
    fn timestamps_inside_the_window_pass() {
        let now = Utc::now().timestamp();
        for timestamp in [now - 299, now, now + 298] {
            let token = sign_token(SECRET, 42, timestamp);
            assert!(telegram_id_from_token(SECRET, &token).is_ok());
        }
    }

    #[test]
    fn tampered_mac_is_rejected() {
        let now = Utc::now().timestamp();
        let token = sign_token(SECRET, 42, now);
        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == '0' { '1' } else { '0' });
        assert!(matches!(
            telegram_id_from_token(SECRET, &tampered),
            Err(DomainError::Authentication(_))
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let now = Utc::now().timestamp();
        let token = sign_token("other-secret", 42, now);
        assert!(matches!(
            telegram_id_from_token(SECRET, &token),
            Err(DomainError::Authentication(_))
        ));
    }
}
