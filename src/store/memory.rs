//! Stores backed by in-process `atlas-db` collections.

use async_trait::async_trait;
use atlas_db::{Collection, Database, Document};
use time::OffsetDateTime;

use super::{BookFilter, BookStore, ReviewStore, StoreResult, UserStore};
use crate::modules::books::models::{Book, BookChanges};
use crate::modules::reviews::models::{Review, ReviewChanges};
use crate::modules::users::models::User;

impl Document for User {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Document for Book {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Document for Review {
    fn id(&self) -> &str {
        &self.id
    }
}

pub struct MemoryUserStore {
    users: Collection<User>,
}

impl MemoryUserStore {
    pub fn new(db: &Database) -> Self {
        Self {
            users: db
                .collection("users")
                .with_unique_index("user_phone_unique", |u: &User| u.phone.clone())
                .with_unique_index("user_email_unique", |u: &User| u.email.clone()),
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: User) -> StoreResult<User> {
        self.users.insert(user).await
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        self.users.find_one(|u| u.id == id).await
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.users.find_one(|u| u.email == email).await
    }

    async fn find_by_phone_or_email(
        &self,
        phone: &str,
        email: &str,
    ) -> StoreResult<Option<User>> {
        self.users
            .find_one(|u| u.phone == phone || u.email == email)
            .await
    }
}

pub struct MemoryBookStore {
    books: Collection<Book>,
}

impl MemoryBookStore {
    pub fn new(db: &Database) -> Self {
        Self {
            books: db
                .collection("books")
                .with_unique_index("book_title_unique", |b: &Book| b.title.clone())
                .with_unique_index("book_isbn_unique", |b: &Book| b.isbn.clone()),
        }
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn insert(&self, book: Book) -> StoreResult<Book> {
        self.books.insert(book).await
    }

    async fn find_live(&self, id: &str) -> StoreResult<Option<Book>> {
        self.books.find_one(|b| b.id == id && !b.is_deleted).await
    }

    async fn find_by_title_or_isbn(
        &self,
        title: Option<&str>,
        isbn: Option<&str>,
        excluding: Option<&str>,
    ) -> StoreResult<Option<Book>> {
        self.books
            .find_one(|b| {
                excluding != Some(b.id.as_str())
                    && (title == Some(b.title.as_str()) || isbn == Some(b.isbn.as_str()))
            })
            .await
    }

    async fn list_live(&self, filter: &BookFilter) -> StoreResult<Vec<Book>> {
        let mut books = self
            .books
            .find_many(|b| !b.is_deleted && filter.matches(b))
            .await?;
        books.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(books)
    }

    async fn update_live(
        &self,
        id: &str,
        changes: &BookChanges,
        at: OffsetDateTime,
    ) -> StoreResult<Option<Book>> {
        let changes = changes.clone();
        self.books
            .update_one(
                |b| b.id == id && !b.is_deleted,
                move |b| {
                    if let Some(title) = changes.title {
                        b.title = title;
                    }
                    if let Some(excerpt) = changes.excerpt {
                        b.excerpt = excerpt;
                    }
                    if let Some(isbn) = changes.isbn {
                        b.isbn = isbn;
                    }
                    if let Some(released_at) = changes.released_at {
                        b.released_at = released_at;
                    }
                    b.updated_at = at;
                },
            )
            .await
    }

    async fn soft_delete(&self, id: &str, at: OffsetDateTime) -> StoreResult<Option<Book>> {
        self.books
            .update_one(
                |b| b.id == id && !b.is_deleted,
                |b| {
                    b.is_deleted = true;
                    b.deleted_at = Some(at);
                    b.updated_at = at;
                },
            )
            .await
    }

    async fn adjust_review_count(&self, id: &str, delta: i64) -> StoreResult<()> {
        self.books
            .update_one(
                |b| b.id == id,
                |b| b.review_count = (b.review_count + delta).max(0),
            )
            .await?;
        Ok(())
    }
}

pub struct MemoryReviewStore {
    reviews: Collection<Review>,
}

impl MemoryReviewStore {
    pub fn new(db: &Database) -> Self {
        Self {
            reviews: db.collection("reviews"),
        }
    }
}

#[async_trait]
impl ReviewStore for MemoryReviewStore {
    async fn insert(&self, review: Review) -> StoreResult<Review> {
        self.reviews.insert(review).await
    }

    async fn find_live(&self, id: &str) -> StoreResult<Option<Review>> {
        self.reviews.find_one(|r| r.id == id && !r.is_deleted).await
    }

    async fn list_live_for_book(&self, book_id: &str) -> StoreResult<Vec<Review>> {
        self.reviews
            .find_many(|r| r.book_id == book_id && !r.is_deleted)
            .await
    }

    async fn update_live(
        &self,
        id: &str,
        changes: &ReviewChanges,
        at: OffsetDateTime,
    ) -> StoreResult<Option<Review>> {
        let changes = changes.clone();
        self.reviews
            .update_one(
                |r| r.id == id && !r.is_deleted,
                move |r| {
                    if let Some(reviewed_by) = changes.reviewed_by {
                        r.reviewed_by = reviewed_by;
                    }
                    if let Some(rating) = changes.rating {
                        r.rating = rating;
                    }
                    if let Some(review) = changes.review {
                        r.review = review;
                    }
                    r.reviewed_at = at;
                },
            )
            .await
    }

    async fn soft_delete(&self, id: &str) -> StoreResult<Option<Review>> {
        self.reviews
            .update_one(|r| r.id == id && !r.is_deleted, |r| r.is_deleted = true)
            .await
    }

    async fn soft_delete_for_book(&self, book_id: &str) -> StoreResult<u64> {
        self.reviews
            .update_many(
                |r| r.book_id == book_id && !r.is_deleted,
                |r| r.is_deleted = true,
            )
            .await
    }
}
