use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::modules::reviews::models::ReviewView;

/// A catalogue entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    #[serde(rename = "ISBN")]
    pub isbn: String,
    pub category: String,
    pub subcategory: String,
    /// Canonical `YYYY-MM-DD`.
    pub released_at: String,
    /// Owner; the user who created the book.
    pub user_id: String,
    /// Live reviews, maintained incrementally. Advisory only.
    pub review_count: i64,
    pub is_deleted: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub deleted_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Listing projection: no ISBN, subcategory, deletion state or timestamps.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSummary {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub user_id: String,
    pub category: String,
    pub released_at: String,
    pub review_count: i64,
}

impl From<Book> for BookSummary {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            excerpt: book.excerpt,
            user_id: book.user_id,
            category: book.category,
            released_at: book.released_at,
            review_count: book.review_count,
        }
    }
}

/// A book with its live reviews, counted at read time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDetail {
    #[serde(flatten)]
    pub book: Book,
    pub reviews: usize,
    pub reviews_data: Vec<ReviewView>,
}

/// `POST /books` body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBook {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    #[serde(rename = "ISBN")]
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub released_at: Option<String>,
    pub user_id: Option<String>,
}

impl CreateBook {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.excerpt.is_none()
            && self.isbn.is_none()
            && self.category.is_none()
            && self.subcategory.is_none()
            && self.released_at.is_none()
            && self.user_id.is_none()
    }
}

/// `PUT /books/{book_id}` body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    #[serde(rename = "ISBN")]
    pub isbn: Option<String>,
    pub released_at: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl BookPatch {
    /// No fields at all, recognised or not.
    pub fn is_empty(&self) -> bool {
        !self.has_updatable_field() && self.other.is_empty()
    }

    pub fn has_updatable_field(&self) -> bool {
        self.title.is_some()
            || self.excerpt.is_some()
            || self.isbn.is_some()
            || self.released_at.is_some()
    }
}

/// Validated book changes; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookChanges {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub isbn: Option<String>,
    pub released_at: Option<String>,
}

/// `GET /books` query string.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBooksQuery {
    pub user_id: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
}
