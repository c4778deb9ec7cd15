//! Environment-variable helpers used by every service's `Config::from_env`.
//! Recognized options carry defaults; secrets do not, and a missing secret
//! refuses to start the process.

use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

pub fn env_or(name: &'static str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

pub fn env_required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::Missing(name))
}

pub fn env_parse<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value.parse().map_err(|_| ConfigError::Invalid {
            name,
            value,
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        assert_eq!(env_or("TUTORLINK_TEST_UNSET", "fallback"), "fallback");
        assert_eq!(env_parse("TUTORLINK_TEST_UNSET_NUM", 42u16).unwrap(), 42);
    }

    #[test]
    fn required_secrets_fail_loudly() {
        assert!(matches!(
            env_required("TUTORLINK_TEST_SECRET_UNSET"),
            Err(ConfigError::Missing(_))
        ));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        std::env::set_var("TUTORLINK_TEST_BAD_NUM", "not-a-number");
        assert!(matches!(
            env_parse("TUTORLINK_TEST_BAD_NUM", 1u16),
            Err(ConfigError::Invalid { .. })
        ));
        std::env::remove_var("TUTORLINK_TEST_BAD_NUM");
    }
}
