//! RPC status codes and the error type carried on the wire.

use thiserror::Error;

/// Status codes understood by every peer. The numeric values follow the
/// conventional gRPC code space so that dashboards and logs read familiarly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Code {
    Ok = 0,
    InvalidArgument = 3,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    FailedPrecondition = 9,
    Internal = 13,
    Unavailable = 14,
    Unauthenticated = 16,
}

impl Code {
    pub fn from_i32(value: i32) -> Code {
        match value {
            0 => Code::Ok,
            3 => Code::InvalidArgument,
            5 => Code::NotFound,
            6 => Code::AlreadyExists,
            7 => Code::PermissionDenied,
            9 => Code::FailedPrecondition,
            14 => Code::Unavailable,
            16 => Code::Unauthenticated,
            _ => Code::Internal,
        }
    }
}

/// A failed RPC. Servers encode it into an error frame; clients decode it
/// back so both sides see the same code and message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("rpc status {code:?}: {message}")]
pub struct Status {
    pub code: Code,
    pub message: String,
}

impl Status {
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(Code::InvalidArgument, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Code::NotFound, message)
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(Code::AlreadyExists, message)
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(Code::PermissionDenied, message)
    }

    pub fn failed_precondition(message: impl Into<String>) -> Self {
        Self::new(Code::FailedPrecondition, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Code::Internal, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(Code::Unavailable, message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(Code::Unauthenticated, message)
    }

    /// The retry layer treats exactly this code as transient.
    pub fn is_unavailable(&self) -> bool {
        self.code == Code::Unavailable
    }
}

/// Wire form of [`Status`], carried in error frames.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StatusProto {
    #[prost(int32, tag = "1")]
    pub code: i32,
    #[prost(string, tag = "2")]
    pub message: String,
}

impl From<&Status> for StatusProto {
    fn from(status: &Status) -> Self {
        StatusProto {
            code: status.code as i32,
            message: status.message.clone(),
        }
    }
}

impl From<StatusProto> for Status {
    fn from(proto: StatusProto) -> Self {
        Status {
            code: Code::from_i32(proto.code),
            message: proto.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_round_trip() {
        for code in [
            Code::Ok,
            Code::InvalidArgument,
            Code::NotFound,
            Code::AlreadyExists,
            Code::PermissionDenied,
            Code::FailedPrecondition,
            Code::Internal,
            Code::Unavailable,
            Code::Unauthenticated,
        ] {
            assert_eq!(code, Code::from_i32(code as i32));
        }
    }

    #[test]
    fn unknown_code_collapses_to_internal() {
        assert_eq!(Code::from_i32(99), Code::Internal);
    }

    #[test]
    fn only_unavailable_is_retriable() {
        assert!(Status::unavailable("conn refused").is_unavailable());
        for status in [
            Status::invalid_argument("x"),
            Status::not_found("x"),
            Status::internal("x"),
            Status::unauthenticated("x"),
        ] {
            assert!(!status.is_unavailable());
        }
    }
}
