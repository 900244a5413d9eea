//! Document store access for ATLAS services.
//!
//! The only backend currently shipped is the in-process `mem://` store:
//! typed [`Collection`]s guarded by an async `RwLock`, queried with
//! predicate filters and mutated with update closures. Collections can
//! declare unique indexes, which are enforced inside the write lock so a
//! read-then-write race in calling code can never produce duplicates.

pub mod collection;
pub mod error;

pub use collection::{Collection, Document};
pub use error::{DbError, DbResult};

use atlas_kernel::settings::DatabaseSettings;

const MEMORY_SCHEME: &str = "mem://";

/// Handle to an opened database.
#[derive(Debug, Clone)]
pub struct Database {
    namespace: String,
    database: String,
}

impl Database {
    /// Open the database described by `settings`.
    pub fn open(settings: &DatabaseSettings) -> DbResult<Self> {
        if !settings.endpoint.starts_with(MEMORY_SCHEME) {
            return Err(DbError::UnsupportedEndpoint(settings.endpoint.clone()));
        }

        tracing::info!(
            target: "atlas-db",
            endpoint = %settings.endpoint,
            namespace = %settings.namespace,
            database = %settings.database,
            "database opened"
        );

        Ok(Self {
            namespace: settings.namespace.clone(),
            database: settings.database.clone(),
        })
    }

    /// Create an empty collection qualified by this database's namespace.
    pub fn collection<D: Document>(&self, name: &str) -> Collection<D> {
        Collection::new(format!("{}/{}/{}", self.namespace, self.database, name))
    }
}
