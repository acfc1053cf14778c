//! JWT creation and verification.
//!
//! The engine never issues tokens for users: verification happens on every
//! request, issuance is limited to the CLI and tests.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use scolaguard_config::JwtConfig;
use scolaguard_core::AppError;

use crate::claims::Claims;

/// Creates an access token for a principal.
///
/// # Errors
///
/// Returns an internal error if token encoding fails.
pub fn create_access_token(
    user_id: Uuid,
    email: &str,
    tenant_id: Option<Uuid>,
    roles: Vec<String>,
    super_admin: bool,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + jwt_config.access_token_expiry as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        tenant_id,
        roles,
        super_admin,
        exp,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create token: {}", e)))
}

/// Verifies an access token and returns the embedded claims.
///
/// # Errors
///
/// Returns an unauthorized error if the signature is invalid, the token has
/// expired or it is malformed.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_test_jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 3600,
        }
    }

    #[test]
    fn test_verify_token_success() {
        let config = get_test_jwt_config();
        let user_id = Uuid::new_v4();
        let tenant_id = Uuid::new_v4();

        let token = create_access_token(
            user_id,
            "teacher@school.test",
            Some(tenant_id),
            vec!["teacher".to_string()],
            false,
            &config,
        )
        .unwrap();

        let claims = verify_token(&token, &config).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.tenant_id, Some(tenant_id));
        assert_eq!(claims.roles, vec!["teacher".to_string()]);
        assert!(!claims.super_admin);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_verify_token_invalid() {
        let config = get_test_jwt_config();
        let result = verify_token("invalid-token", &config);
        assert_eq!(result.unwrap_err().status.as_u16(), 401);
    }

    #[test]
    fn test_verify_token_wrong_secret() {
        let config = get_test_jwt_config();
        let token =
            create_access_token(Uuid::new_v4(), "a@test.com", None, vec![], true, &config)
                .unwrap();

        let wrong_config = JwtConfig {
            secret: "different-secret-key-at-least-32-characters".to_string(),
            access_token_expiry: 3600,
        };

        assert!(verify_token(&token, &wrong_config).is_err());
    }

    #[test]
    fn test_super_admin_token_has_no_tenant() {
        let config = get_test_jwt_config();
        let token = create_access_token(
            Uuid::new_v4(),
            "root@platform.test",
            None,
            vec!["super_admin".to_string()],
            true,
            &config,
        )
        .unwrap();

        let principal = verify_token(&token, &config).unwrap().principal().unwrap();
        assert!(principal.is_super_admin);
        assert!(principal.tenant_id.is_none());
    }
}
