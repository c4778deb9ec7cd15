//! The domain-error taxonomy shared by every backend, and its mapping into
//! RPC status codes and HTTP status codes.
//!
//! The mapping lives in one declarative table so the encode path (backend
//! reporting a failure over RPC) and the decode path (gateway turning an RPC
//! failure into an HTTP response, peers recovering the kind) cannot drift
//! apart.

use thiserror::Error;
use tutorlink_rpc::{Code, Status};

/// Canonical failure kinds a backend may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AlreadyExists,
    Validation,
    Authentication,
    NotFound,
    PermissionDenied,
    InvalidPayment,
}

/// kind ↔ RPC code ↔ HTTP status. Order matters for the reverse lookup:
/// the first row matching a code wins.
const MAPPING: &[(ErrorKind, Code, u16)] = &[
    (ErrorKind::AlreadyExists, Code::AlreadyExists, 409),
    (ErrorKind::Validation, Code::InvalidArgument, 400),
    (ErrorKind::Authentication, Code::Unauthenticated, 401),
    (ErrorKind::NotFound, Code::NotFound, 404),
    (ErrorKind::PermissionDenied, Code::PermissionDenied, 403),
    (ErrorKind::InvalidPayment, Code::Unauthenticated, 401),
];

impl ErrorKind {
    pub fn rpc_code(self) -> Code {
        MAPPING
            .iter()
            .find(|(kind, _, _)| *kind == self)
            .map(|(_, code, _)| *code)
            .unwrap_or(Code::Internal)
    }

    pub fn from_rpc_code(code: Code) -> Option<ErrorKind> {
        MAPPING
            .iter()
            .find(|(_, c, _)| *c == code)
            .map(|(kind, _, _)| *kind)
    }
}

/// HTTP status for an RPC code, from the same table. Codes without a row
/// collapse to 500.
pub fn http_status_for(code: Code) -> u16 {
    MAPPING
        .iter()
        .find(|(_, c, _)| *c == code)
        .map(|(_, _, status)| *status)
        .unwrap_or(500)
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("authentication error: {0}")]
    Authentication(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("invalid payment: {0}")]
    InvalidPayment(String),

    /// A peer reported this status over RPC.
    #[error(transparent)]
    Status(#[from] Status),

    /// Refused by an open circuit breaker. Deliberately not retriable.
    #[error("circuit breaker is open")]
    CircuitOpen,

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// The taxonomy kind, when this error carries one. Peer statuses are
    /// folded back through the table so a `NotFound` stays a `NotFound`
    /// across backend hops.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            DomainError::AlreadyExists(_) => Some(ErrorKind::AlreadyExists),
            DomainError::Validation(_) => Some(ErrorKind::Validation),
            DomainError::Authentication(_) => Some(ErrorKind::Authentication),
            DomainError::NotFound(_) => Some(ErrorKind::NotFound),
            DomainError::PermissionDenied(_) => Some(ErrorKind::PermissionDenied),
            DomainError::InvalidPayment(_) => Some(ErrorKind::InvalidPayment),
            DomainError::Status(status) => ErrorKind::from_rpc_code(status.code),
            DomainError::CircuitOpen | DomainError::Internal(_) => None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        DomainError::Internal(message.into())
    }
}

/// Translate a domain error at the RPC boundary.
///
/// Only kinds the call site lists as possible for the operation are
/// surfaced; anything else degrades to `Internal` and the cause stays in
/// the server log rather than on the wire.
pub fn map_domain_error(err: DomainError, possible: &[ErrorKind]) -> Status {
    match err.kind() {
        Some(kind) if possible.contains(&kind) => Status::new(kind.rpc_code(), err.to_string()),
        _ => {
            tracing::error!(error = %err, "unexpected domain error");
            Status::internal("internal server error")
        }
    }
}

/// Translate database failures into the taxonomy: missing rows are
/// `NotFound`, unique-key collisions are `AlreadyExists`, the rest is
/// internal.
pub fn map_db_error(err: sqlx::Error) -> DomainError {
    match &err {
        sqlx::Error::RowNotFound => DomainError::NotFound("row not found".to_string()),
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            DomainError::AlreadyExists(db.message().to_string())
        }
        _ => DomainError::Internal(format!("database error: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_bidirectional() {
        for (kind, code, _) in MAPPING {
            assert_eq!(kind.rpc_code(), *code);
        }
        assert_eq!(
            ErrorKind::from_rpc_code(Code::NotFound),
            Some(ErrorKind::NotFound)
        );
        // Unauthenticated appears twice; the first row (Authentication) wins.
        assert_eq!(
            ErrorKind::from_rpc_code(Code::Unauthenticated),
            Some(ErrorKind::Authentication)
        );
        assert_eq!(ErrorKind::from_rpc_code(Code::Internal), None);
    }

    #[test]
    fn http_statuses_follow_the_table() {
        assert_eq!(http_status_for(Code::AlreadyExists), 409);
        assert_eq!(http_status_for(Code::InvalidArgument), 400);
        assert_eq!(http_status_for(Code::Unauthenticated), 401);
        assert_eq!(http_status_for(Code::NotFound), 404);
        assert_eq!(http_status_for(Code::PermissionDenied), 403);
        assert_eq!(http_status_for(Code::Internal), 500);
        assert_eq!(http_status_for(Code::FailedPrecondition), 500);
        assert_eq!(http_status_for(Code::Unavailable), 500);
    }

    #[test]
    fn listed_kinds_are_surfaced() {
        let status = map_domain_error(
            DomainError::NotFound("user".into()),
            &[ErrorKind::NotFound, ErrorKind::PermissionDenied],
        );
        assert_eq!(status.code, Code::NotFound);
    }

    #[test]
    fn unlisted_kinds_degrade_to_internal() {
        let status = map_domain_error(
            DomainError::AlreadyExists("user".into()),
            &[ErrorKind::NotFound],
        );
        assert_eq!(status.code, Code::Internal);
        assert_eq!(status.message, "internal server error");
    }

    #[test]
    fn peer_status_recovers_its_kind() {
        let err = DomainError::Status(Status::already_exists("slot booked"));
        assert_eq!(err.kind(), Some(ErrorKind::AlreadyExists));
        let status = map_domain_error(err, &[ErrorKind::AlreadyExists]);
        assert_eq!(status.code, Code::AlreadyExists);
    }

    #[test]
    fn invalid_payment_maps_to_unauthenticated() {
        let status = map_domain_error(
            DomainError::InvalidPayment("rejected".into()),
            &[ErrorKind::InvalidPayment],
        );
        assert_eq!(status.code, Code::Unauthenticated);
        assert_eq!(http_status_for(status.code), 401);
    }

    #[test]
    fn db_errors_map_into_the_taxonomy() {
        assert!(matches!(
            map_db_error(sqlx::Error::RowNotFound),
            DomainError::NotFound(_)
        ));
        assert!(matches!(
            map_db_error(sqlx::Error::PoolClosed),
            DomainError::Internal(_)
        ));
    }
}
