use thiserror::Error;

pub type DbResult<T> = Result<T, DbError>;

/// Errors raised by the document store.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("unsupported database endpoint '{0}', expected mem://")]
    UnsupportedEndpoint(String),

    #[error("unique index '{index}' violated in collection '{collection}'")]
    UniqueViolation {
        collection: String,
        index: &'static str,
    },

    #[error("document '{id}' already exists in collection '{collection}'")]
    DuplicateId { collection: String, id: String },

    #[error("update changed the id of document '{id}' in collection '{collection}'")]
    ImmutableId { collection: String, id: String },
}
