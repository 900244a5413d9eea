use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

/// Reviewer name used when none is given.
pub const DEFAULT_REVIEWER: &str = "Guest";

/// A review attached to exactly one book.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub book_id: String,
    pub reviewed_by: String,
    #[serde(with = "time::serde::rfc3339")]
    pub reviewed_at: OffsetDateTime,
    pub rating: u8,
    pub review: String,
    pub is_deleted: bool,
}

/// Public projection of a review.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub id: String,
    pub book_id: String,
    pub reviewed_by: String,
    #[serde(with = "time::serde::rfc3339")]
    pub reviewed_at: OffsetDateTime,
    pub rating: u8,
    pub review: String,
}

impl From<Review> for ReviewView {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            book_id: review.book_id,
            reviewed_by: review.reviewed_by,
            reviewed_at: review.reviewed_at,
            rating: review.rating,
            review: review.review,
        }
    }
}

/// Body of both `POST` and `PUT` on reviews.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    pub reviewed_by: Option<String>,
    pub rating: Option<i64>,
    pub review: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl ReviewInput {
    pub fn is_empty(&self) -> bool {
        !self.has_updatable_field() && self.other.is_empty()
    }

    pub fn has_updatable_field(&self) -> bool {
        self.reviewed_by.is_some() || self.rating.is_some() || self.review.is_some()
    }
}

/// Validated review changes; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewChanges {
    pub reviewed_by: Option<String>,
    pub rating: Option<u8>,
    pub review: Option<String>,
}
