//! Entity stores.
//!
//! The rules engine talks to persistence only through these traits. Reads
//! named `*_live` never return soft-deleted records.

mod memory;

pub use memory::{MemoryBookStore, MemoryReviewStore, MemoryUserStore};

use async_trait::async_trait;
use atlas_db::DbError;
use time::OffsetDateTime;

use crate::modules::books::models::{Book, BookChanges};
use crate::modules::reviews::models::{Review, ReviewChanges};
use crate::modules::users::models::User;

pub type StoreResult<T> = Result<T, DbError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: User) -> StoreResult<User>;

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Any user holding either the phone number or the email address.
    async fn find_by_phone_or_email(&self, phone: &str, email: &str)
        -> StoreResult<Option<User>>;
}

/// Equality filters for listing books; `None` matches everything.
#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    pub user_id: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
}

impl BookFilter {
    fn matches(&self, book: &Book) -> bool {
        let eq = |wanted: &Option<String>, actual: &str| wanted.as_deref().map_or(true, |w| w == actual);

        eq(&self.user_id, &book.user_id)
            && eq(&self.category, &book.category)
            && eq(&self.subcategory, &book.subcategory)
    }
}

#[async_trait]
pub trait BookStore: Send + Sync {
    async fn insert(&self, book: Book) -> StoreResult<Book>;

    async fn find_live(&self, id: &str) -> StoreResult<Option<Book>>;

    /// Any book, deleted or not, other than `excluding`, whose title or ISBN
    /// matches one of the given values.
    async fn find_by_title_or_isbn(
        &self,
        title: Option<&str>,
        isbn: Option<&str>,
        excluding: Option<&str>,
    ) -> StoreResult<Option<Book>>;

    /// Live books matching `filter`, ordered by title ascending.
    async fn list_live(&self, filter: &BookFilter) -> StoreResult<Vec<Book>>;

    async fn update_live(
        &self,
        id: &str,
        changes: &BookChanges,
        at: OffsetDateTime,
    ) -> StoreResult<Option<Book>>;

    /// Marks a live book deleted; `None` if it was missing or already deleted.
    async fn soft_delete(&self, id: &str, at: OffsetDateTime) -> StoreResult<Option<Book>>;

    /// Add `delta` to the cached review count, never going below zero.
    async fn adjust_review_count(&self, id: &str, delta: i64) -> StoreResult<()>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn insert(&self, review: Review) -> StoreResult<Review>;

    async fn find_live(&self, id: &str) -> StoreResult<Option<Review>>;

    async fn list_live_for_book(&self, book_id: &str) -> StoreResult<Vec<Review>>;

    /// Applies `changes` and stamps `reviewed_at`.
    async fn update_live(
        &self,
        id: &str,
        changes: &ReviewChanges,
        at: OffsetDateTime,
    ) -> StoreResult<Option<Review>>;

    async fn soft_delete(&self, id: &str) -> StoreResult<Option<Review>>;

    /// Soft-deletes every live review of a book; returns how many changed.
    async fn soft_delete_for_book(&self, book_id: &str) -> StoreResult<u64>;
}
