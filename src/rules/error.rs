use atlas_authz::AuthError;
use atlas_db::DbError;
use atlas_http::AppError;
use thiserror::Error;

pub type RuleResult<T> = Result<T, RuleError>;

/// Why a rules operation refused or failed.
///
/// Client-facing variants carry the message returned to the caller.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    InvalidDate(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl RuleError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

impl From<DbError> for RuleError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UniqueViolation { index, .. } => Self::Conflict(conflict_message(index)),
            other => Self::Internal(other.into()),
        }
    }
}

/// Message for a unique index caught at write time.
fn conflict_message(index: &str) -> String {
    match index {
        "book_title_unique" => "This title is already in use for a book. Try another one.",
        "book_isbn_unique" => "This ISBN is already in use for a book. Try another one.",
        "user_phone_unique" | "user_email_unique" => "Email or phone number already exists.",
        _ => "Record already exists.",
    }
    .to_string()
}

impl From<AuthError> for RuleError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NotOwner => Self::Forbidden(err.to_string()),
            // Credentials are checked by the extractor before any rule runs.
            AuthError::MissingCredential
            | AuthError::InvalidCredential(_)
            | AuthError::Issue(_)
            | AuthError::Hashing(_) => Self::Internal(err.into()),
        }
    }
}

impl From<RuleError> for AppError {
    fn from(err: RuleError) -> Self {
        match err {
            RuleError::InvalidInput(message) => AppError::validation(Vec::new(), message),
            RuleError::InvalidDate(message) => {
                AppError::validation(Vec::new(), message).with_code("invalid_date")
            }
            RuleError::Conflict(message) => AppError::conflict(Vec::new(), message),
            RuleError::NotFound(message) => AppError::not_found(message),
            RuleError::Forbidden(message) => AppError::forbidden(message),
            RuleError::Internal(err) => AppError::Internal(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn unique_violation_becomes_conflict() {
        let err: RuleError = DbError::UniqueViolation {
            collection: "bookshelf/core/books".to_string(),
            index: "book_isbn_unique",
        }
        .into();

        assert!(matches!(&err, RuleError::Conflict(m) if m.contains("ISBN")));
        assert_eq!(AppError::from(err).status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn other_store_errors_are_internal() {
        let err: RuleError = DbError::UnsupportedEndpoint("ws://db".to_string()).into();
        assert!(matches!(err, RuleError::Internal(_)));
        assert_eq!(
            AppError::from(err).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn status_codes() {
        let cases = [
            (RuleError::invalid("bad"), StatusCode::BAD_REQUEST),
            (RuleError::InvalidDate("bad".into()), StatusCode::BAD_REQUEST),
            (RuleError::Conflict("dup".into()), StatusCode::BAD_REQUEST),
            (RuleError::not_found("gone"), StatusCode::NOT_FOUND),
            (RuleError::Forbidden("no".into()), StatusCode::FORBIDDEN),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status_code(), status);
        }
    }

    #[test]
    fn invalid_date_has_own_code() {
        match AppError::from(RuleError::InvalidDate("bad date".into())) {
            AppError::Validation { code, message, .. } => {
                assert_eq!(code, "invalid_date");
                assert_eq!(message, "bad date");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn not_owner_is_forbidden() {
        assert!(matches!(
            RuleError::from(AuthError::NotOwner),
            RuleError::Forbidden(_)
        ));
    }

    #[test]
    fn credential_errors_inside_rules_are_internal() {
        let err = RuleError::from(AuthError::MissingCredential);
        assert!(matches!(err, RuleError::Internal(_)));
        assert_eq!(
            AppError::from(err).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
