use std::sync::Arc;

use anyhow::Context;
use atlas_authz::TokenIssuer;
use atlas_db::Database;
use atlas_kernel::settings::Settings;
use axum::extract::FromRef;

use crate::rules::Rules;

/// Shared state handed to every module's router.
#[derive(Clone)]
pub struct AppState {
    pub rules: Arc<Rules>,
    pub tokens: Arc<TokenIssuer>,
}

impl AppState {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let db = Database::open(&settings.database).context("failed to open database")?;
        let tokens = Arc::new(TokenIssuer::from_settings(&settings.auth));

        Ok(Self::with_database(&db, tokens))
    }

    pub fn with_database(db: &Database, tokens: Arc<TokenIssuer>) -> Self {
        Self {
            rules: Arc::new(Rules::in_memory(db, tokens.clone())),
            tokens,
        }
    }
}

impl FromRef<AppState> for Arc<TokenIssuer> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}
