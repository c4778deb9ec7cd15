//! Per-request caller identity, parsed from RPC metadata by the server
//! side and consulted by the authorization gates in every backend.

use uuid::Uuid;

use crate::error::DomainError;
use tutorlink_rpc::Metadata;

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub user_id: Option<String>,
    pub user_role: Option<String>,
    pub trace_id: Option<String>,
}

impl RequestContext {
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            user_id: metadata.user_id().map(str::to_string),
            user_role: metadata.user_role().map(str::to_string),
            trace_id: metadata.trace_id().map(str::to_string),
        }
    }

    /// The caller's id as a UUID. Missing or malformed identity is an
    /// authentication failure, never a default.
    pub fn user_id(&self) -> Result<Uuid, DomainError> {
        let raw = self
            .user_id
            .as_deref()
            .ok_or_else(|| DomainError::Authentication("missing user id".to_string()))?;
        Uuid::parse_str(raw)
            .map_err(|_| DomainError::Authentication(format!("malformed user id: {raw}")))
    }

    pub fn user_role(&self) -> Result<&str, DomainError> {
        self.user_role
            .as_deref()
            .ok_or_else(|| DomainError::Authentication("missing user role".to_string()))
    }

    /// The caller must be one of the given identities.
    pub fn require_user_among(&self, ids: &[Uuid]) -> Result<Uuid, DomainError> {
        let caller = self.user_id()?;
        if ids.contains(&caller) {
            Ok(caller)
        } else {
            Err(DomainError::PermissionDenied(
                "caller is not a participant".to_string(),
            ))
        }
    }

    /// The caller must hold exactly this role.
    pub fn require_role(&self, role: &str) -> Result<(), DomainError> {
        if self.user_role()? == role {
            Ok(())
        } else {
            Err(DomainError::PermissionDenied(format!(
                "operation requires role {role}"
            )))
        }
    }

    /// Metadata for an onward RPC made on behalf of this caller.
    pub fn to_metadata(&self) -> Metadata {
        let mut metadata = Metadata::new();
        if let Some(id) = &self.user_id {
            metadata.insert(tutorlink_rpc::metadata::USER_ID_KEY, id.clone());
        }
        if let Some(role) = &self.user_role {
            metadata.insert(tutorlink_rpc::metadata::USER_ROLE_KEY, role.clone());
        }
        if let Some(trace) = &self.trace_id {
            metadata.insert(tutorlink_rpc::metadata::TRACE_ID_KEY, trace.clone());
        }
        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(user: Option<&str>, role: Option<&str>) -> RequestContext {
        RequestContext {
            user_id: user.map(str::to_string),
            user_role: role.map(str::to_string),
            trace_id: None,
        }
    }

    #[test]
    fn missing_identity_is_authentication_not_a_default() {
        let err = ctx(None, None).user_id().unwrap_err();
        assert!(matches!(err, DomainError::Authentication(_)));
    }

    #[test]
    fn require_user_among_accepts_any_listed_identity() {
        let tutor = Uuid::now_v7();
        let student = Uuid::now_v7();
        let context = ctx(Some(&student.to_string()), Some("student"));
        assert_eq!(
            context.require_user_among(&[tutor, student]).unwrap(),
            student
        );
    }

    #[test]
    fn require_user_among_rejects_outsiders() {
        let outsider = Uuid::now_v7();
        let context = ctx(Some(&outsider.to_string()), Some("student"));
        let err = context
            .require_user_among(&[Uuid::now_v7(), Uuid::now_v7()])
            .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));
    }

    #[test]
    fn require_role_is_exact() {
        let id = Uuid::now_v7().to_string();
        assert!(ctx(Some(&id), Some("tutor")).require_role("tutor").is_ok());
        assert!(matches!(
            ctx(Some(&id), Some("student")).require_role("tutor"),
            Err(DomainError::PermissionDenied(_))
        ));
        assert!(matches!(
            ctx(Some(&id), None).require_role("tutor"),
            Err(DomainError::Authentication(_))
        ));
    }

    #[test]
    fn metadata_round_trip_preserves_absence() {
        let context = ctx(Some("abc"), None);
        let metadata = context.to_metadata();
        assert_eq!(metadata.user_id(), Some("abc"));
        assert_eq!(metadata.user_role(), None);
        let back = RequestContext::from_metadata(&metadata);
        assert_eq!(back.user_id.as_deref(), Some("abc"));
        assert_eq!(back.user_role, None);
    }
}
