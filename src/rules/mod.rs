//! Consistency rules for every mutation and read of users, books and
//! reviews.
//!
//! Each operation validates its input, checks cross-entity consistency
//! against the stores, performs the primary write and then any best-effort
//! follow-up writes. Follow-up failures are logged and never undo the
//! primary write.

mod books;
mod error;
mod reviews;
mod users;

pub use error::{RuleError, RuleResult};

use std::sync::Arc;

use atlas_authz::TokenIssuer;
use atlas_db::Database;

use crate::modules::books::models::Book;
use crate::store::{
    BookStore, MemoryBookStore, MemoryReviewStore, MemoryUserStore, ReviewStore, UserStore,
};
use crate::utils::validation::{is_valid_id, non_blank};

const EMPTY_BODY: &str = "Invalid request, body can't be empty.";
const NO_UPDATABLE_FIELD: &str = "At least one field is required.";

pub struct Rules {
    users: Arc<dyn UserStore>,
    books: Arc<dyn BookStore>,
    reviews: Arc<dyn ReviewStore>,
    tokens: Arc<TokenIssuer>,
}

impl Rules {
    pub fn new(
        users: Arc<dyn UserStore>,
        books: Arc<dyn BookStore>,
        reviews: Arc<dyn ReviewStore>,
        tokens: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            users,
            books,
            reviews,
            tokens,
        }
    }

    /// Rules over fresh collections of `db`.
    pub fn in_memory(db: &Database, tokens: Arc<TokenIssuer>) -> Self {
        Self::new(
            Arc::new(MemoryUserStore::new(db)),
            Arc::new(MemoryBookStore::new(db)),
            Arc::new(MemoryReviewStore::new(db)),
            tokens,
        )
    }

    /// The live book `book_id`, or `NotFound` with `missing`.
    async fn live_book(&self, book_id: &str, missing: &str) -> RuleResult<Book> {
        self.books
            .find_live(book_id)
            .await?
            .ok_or_else(|| RuleError::not_found(missing))
    }
}

/// The trimmed value of a field that must be present and non-blank.
fn required<'a>(value: Option<&'a str>, message: &str) -> RuleResult<&'a str> {
    non_blank(value).ok_or_else(|| RuleError::invalid(message))
}

/// Like [`required`], but hands back the value untrimmed.
fn required_as_sent(value: Option<String>, message: &str) -> RuleResult<String> {
    match value {
        Some(v) if non_blank(Some(v.as_str())).is_some() => Ok(v),
        _ => Err(RuleError::invalid(message)),
    }
}

fn valid_id<'a>(id: &'a str, message: &str) -> RuleResult<&'a str> {
    let id = id.trim();
    if is_valid_id(id) {
        Ok(id)
    } else {
        Err(RuleError::invalid(message))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use atlas_kernel::settings::DatabaseSettings;

    use crate::modules::books::models::CreateBook;
    use crate::modules::users::models::{RegisterUser, User};

    pub fn rules() -> Rules {
        let db = Database::open(&DatabaseSettings::default()).unwrap();
        Rules::in_memory(&db, Arc::new(TokenIssuer::new("test-secret", 3600)))
    }

    pub fn registration(phone: &str, email: &str) -> RegisterUser {
        RegisterUser {
            title: Some("Miss".to_string()),
            name: Some("Ada Lovelace".to_string()),
            phone: Some(phone.to_string()),
            email: Some(email.to_string()),
            password: Some("secret123".to_string()),
            ..Default::default()
        }
    }

    pub async fn user(rules: &Rules, phone: &str, email: &str) -> User {
        rules.create_user(registration(phone, email)).await.unwrap()
    }

    pub fn new_book(title: &str, isbn: &str, owner: &str) -> CreateBook {
        CreateBook {
            title: Some(title.to_string()),
            excerpt: Some("An excerpt".to_string()),
            isbn: Some(isbn.to_string()),
            category: Some("Fiction".to_string()),
            subcategory: Some("Classic".to_string()),
            released_at: Some("2021-06-15".to_string()),
            user_id: Some(owner.to_string()),
        }
    }
}
