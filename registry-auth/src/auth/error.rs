use registry_core::error::AppError;
use thiserror::Error;

use crate::services::ServiceError;

#[derive(Error, Debug)]
pub enum AuthError {
    /// Not even the unauthenticated fallback resolved. The access-control
    /// configuration is unusable and the request must not proceed.
    #[error("No authentication method resolved for the request")]
    NoAuthMethodResolved,

    #[error("Permission store error: {0}")]
    Store(#[from] ServiceError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NoAuthMethodResolved => AppError::ServiceUnavailable(anyhow::anyhow!(
                "Access control is misconfigured: no authentication method resolved"
            )),
            AuthError::Store(e) => e.into(),
        }
    }
}
