use atlas_http::AppError;
use thiserror::Error;

/// Authentication and authorization failures.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authentication token is missing")]
    MissingCredential,

    #[error("authentication token is invalid: {0}")]
    InvalidCredential(String),

    #[error("you are not authorized to modify this resource")]
    NotOwner,

    #[error("failed to issue token: {0}")]
    Issue(String),

    #[error("failed to hash password: {0}")]
    Hashing(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredential => {
                AppError::unauthorized(err.to_string()).with_code("missing_token")
            }
            AuthError::InvalidCredential(_) => {
                AppError::unauthorized(err.to_string()).with_code("invalid_token")
            }
            AuthError::NotOwner => AppError::forbidden(err.to_string()),
            AuthError::Issue(_) | AuthError::Hashing(_) => AppError::Internal(err.into()),
        }
    }
}
