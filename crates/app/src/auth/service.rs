//! Auth service.

use std::fmt::{Debug, Formatter, Result as FmtResult};

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use mockall::automock;

use crate::auth::{AuthServiceError, Claims, Principal, Role};

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
}

impl Debug for JwtConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// Verifies HS256 access tokens issued by the auth service.
#[derive(Clone)]
pub struct JwtAuthService {
    key: DecodingKey,
    validation: Validation,
}

impl JwtAuthService {
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);

        validation.set_issuer(&[&config.issuer]);

        Self {
            key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }
}

impl Debug for JwtAuthService {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("JwtAuthService")
            .field("validation", &self.validation)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthService for JwtAuthService {
    async fn authenticate_bearer(&self, bearer_token: &str) -> Result<Principal, AuthServiceError> {
        let claims = decode::<Claims>(bearer_token, &self.key, &self.validation)?.claims;

        if !claims.is_active {
            return Err(AuthServiceError::Inactive);
        }

        if !claims.is_verified {
            return Err(AuthServiceError::NotVerified);
        }

        Ok(Principal {
            user_id: claims.user_id,
            email: claims.email,
            role: Role::from(claims.role),
        })
    }
}

#[automock]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Resolve a bearer token to the caller it was issued to.
    async fn authenticate_bearer(&self, bearer_token: &str) -> Result<Principal, AuthServiceError>;
}
