//! JWT claim structures for principals.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use scolaguard_core::AppError;
use scolaguard_models::{
    Principal,
    ids::{TenantId, UserId},
};

/// JWT claims carried by access tokens.
///
/// Roles are carried by name; their permissions are resolved per request
/// through the role catalogue.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// User ID (subject claim)
    pub sub: String,
    pub email: String,
    /// Tenant the user belongs to (None for platform accounts)
    pub tenant_id: Option<Uuid>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub super_admin: bool,
    /// Token expiration timestamp (Unix timestamp)
    pub exp: usize,
    /// Token issued-at timestamp (Unix timestamp)
    pub iat: usize,
}

impl Claims {
    /// Rehydrate the caller from verified claims.
    pub fn principal(&self) -> Result<Principal, AppError> {
        let user_id: UserId = self
            .sub
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid subject in token".to_string()))?;

        Ok(Principal {
            user_id,
            tenant_id: self.tenant_id.map(TenantId::from_uuid),
            roles: self.roles.clone(),
            is_super_admin: self.super_admin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str) -> Claims {
        Claims {
            sub: sub.to_string(),
            email: "teacher@school.test".to_string(),
            tenant_id: Some(Uuid::new_v4()),
            roles: vec!["teacher".to_string()],
            super_admin: false,
            exp: 1234567890,
            iat: 1234567800,
        }
    }

    #[test]
    fn test_claims_deserialize_without_optional_fields() {
        let json = r#"{"sub":"u","email":"e@test.com","tenant_id":null,"exp":9999999999,"iat":9999999900}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert!(claims.roles.is_empty());
        assert!(!claims.super_admin);
    }

    #[test]
    fn test_principal_from_claims() {
        let user_id = Uuid::new_v4();
        let claims = claims(&user_id.to_string());

        let principal = claims.principal().unwrap();
        assert_eq!(principal.user_id.into_inner(), user_id);
        assert_eq!(
            principal.tenant_id.map(|t| t.into_inner()),
            claims.tenant_id
        );
        assert!(principal.has_role("teacher"));
        assert!(!principal.is_super_admin);
    }

    #[test]
    fn test_principal_rejects_non_uuid_subject() {
        let err = claims("not-a-uuid").principal().unwrap_err();
        assert_eq!(err.status.as_u16(), 401);
    }
}
