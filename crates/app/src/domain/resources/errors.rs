//! Resource catalog errors.

use thiserror::Error;

use crate::resilience::{CircuitOpen, Transient};

#[derive(Debug, Error)]
pub enum ResourceCatalogError {
    #[error("resource not found")]
    NotFound,

    #[error("resource catalog request failed")]
    Http(#[from] reqwest::Error),

    #[error("resource catalog responded with status {status}: {body}")]
    UnexpectedResponse { status: u16, body: String },

    #[error("resource catalog unavailable")]
    CircuitOpen,
}

impl From<CircuitOpen> for ResourceCatalogError {
    fn from(_: CircuitOpen) -> Self {
        Self::CircuitOpen
    }
}

impl Transient for ResourceCatalogError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Http(source) => source.is_timeout() || source.is_connect() || source.is_request(),
            Self::UnexpectedResponse { status, .. } => *status >= 500,
            Self::NotFound | Self::CircuitOpen => false,
        }
    }
}
