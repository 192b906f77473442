//! Auth service errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthServiceError {
    #[error("invalid token")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),

    #[error("account is not active")]
    Inactive,

    #[error("account is not verified")]
    NotVerified,
}

impl From<jsonwebtoken::errors::Error> for AuthServiceError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        Self::InvalidToken(error)
    }
}
