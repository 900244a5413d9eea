use time::OffsetDateTime;

use super::{required, valid_id, RuleError, RuleResult, Rules, EMPTY_BODY, NO_UPDATABLE_FIELD};
use crate::modules::books::models::Book;
use crate::modules::reviews::models::{Review, ReviewChanges, ReviewInput, DEFAULT_REVIEWER};
use crate::utils::new_id;
use crate::utils::validation::{is_valid_id, is_valid_rating};

const NO_SUCH_BOOK: &str = "This book ID does not exist or might be deleted.";
const NO_SUCH_REVIEW: &str = "This review ID does not exist or might be deleted.";
const INVALID_IDS: &str = "Invalid book ID or invalid review ID.";
const UNRELATED_REVIEW: &str = "Book ID not relevant to Review Id.";

impl Rules {
    /// Attach a review to a live book.
    pub async fn create_review(&self, book_id: &str, input: ReviewInput) -> RuleResult<Review> {
        let book_id = valid_id(book_id, "Invalid book id.")?;
        let book = self.live_book(book_id, NO_SUCH_BOOK).await?;

        let rating = match input.rating {
            Some(rating) => rating_of(rating)?,
            None => {
                return Err(RuleError::invalid(
                    "Please provide a rating. It must be 1 to 5.",
                ))
            }
        };
        let review = required(input.review.as_deref(), "Review can't be empty.")?;
        let reviewed_by = match input.reviewed_by.as_deref() {
            Some(name) => required(Some(name), "reviewedBy is not valid.")?,
            None => DEFAULT_REVIEWER,
        };

        let review = self
            .reviews
            .insert(Review {
                id: new_id(),
                book_id: book.id.clone(),
                reviewed_by: reviewed_by.to_string(),
                reviewed_at: OffsetDateTime::now_utc(),
                rating,
                review: review.to_string(),
                is_deleted: false,
            })
            .await?;
        tracing::info!(book_id = %book.id, review_id = %review.id, "review created");

        self.bump_review_count(&book.id, 1).await;
        Ok(review)
    }

    /// Change a live review of a live book; `reviewedAt` is refreshed.
    pub async fn update_review(
        &self,
        book_id: &str,
        review_id: &str,
        input: ReviewInput,
    ) -> RuleResult<Review> {
        let (book_id, review_id) = review_ids(book_id, review_id)?;
        if input.is_empty() {
            return Err(RuleError::invalid(EMPTY_BODY));
        }
        self.related_review(book_id, review_id).await?;

        if !input.has_updatable_field() {
            return Err(RuleError::invalid(NO_UPDATABLE_FIELD));
        }
        let changes = validate_changes(&input)?;

        let review = self
            .reviews
            .update_live(review_id, &changes, OffsetDateTime::now_utc())
            .await?
            .ok_or_else(|| RuleError::not_found(NO_SUCH_REVIEW))?;

        tracing::info!(book_id, review_id, "review updated");
        Ok(review)
    }

    /// Soft-delete a live review of a live book.
    pub async fn delete_review(&self, book_id: &str, review_id: &str) -> RuleResult<()> {
        let (book_id, review_id) = review_ids(book_id, review_id)?;
        let (book, _) = self.related_review(book_id, review_id).await?;

        self.reviews
            .soft_delete(review_id)
            .await?
            .ok_or_else(|| RuleError::not_found(NO_SUCH_REVIEW))?;
        tracing::info!(book_id, review_id, "review deleted");

        self.bump_review_count(&book.id, -1).await;
        Ok(())
    }

    /// The live book and its live review, which must belong to it.
    async fn related_review(&self, book_id: &str, review_id: &str) -> RuleResult<(Book, Review)> {
        let book = self.live_book(book_id, NO_SUCH_BOOK).await?;
        let review = self
            .reviews
            .find_live(review_id)
            .await?
            .ok_or_else(|| RuleError::not_found(NO_SUCH_REVIEW))?;

        if review.book_id != book.id {
            return Err(RuleError::invalid(UNRELATED_REVIEW));
        }
        Ok((book, review))
    }

    /// Follow-up counter write; failures are only logged.
    async fn bump_review_count(&self, book_id: &str, delta: i64) {
        if let Err(e) = self.books.adjust_review_count(book_id, delta).await {
            tracing::warn!(book_id, delta, error = %e, "failed to update review count");
        }
    }
}

fn review_ids<'a>(book_id: &'a str, review_id: &'a str) -> RuleResult<(&'a str, &'a str)> {
    let (book_id, review_id) = (book_id.trim(), review_id.trim());
    if is_valid_id(book_id) && is_valid_id(review_id) {
        Ok((book_id, review_id))
    } else {
        Err(RuleError::invalid(INVALID_IDS))
    }
}

fn rating_of(rating: i64) -> RuleResult<u8> {
    if !is_valid_rating(rating) {
        return Err(RuleError::invalid("Rating is invalid. It must be 1 to 5."));
    }
    u8::try_from(rating).map_err(|_| RuleError::invalid("Rating is invalid. It must be 1 to 5."))
}

fn validate_changes(input: &ReviewInput) -> RuleResult<ReviewChanges> {
    let reviewed_by = input
        .reviewed_by
        .as_deref()
        .map(|name| required(Some(name), "reviewedBy is not valid."))
        .transpose()?;
    let rating = input.rating.map(rating_of).transpose()?;
    let review = input
        .review
        .as_deref()
        .map(|text| required(Some(text), "Review is not valid."))
        .transpose()?;

    Ok(ReviewChanges {
        reviewed_by: reviewed_by.map(str::to_string),
        rating,
        review: review.map(str::to_string),
    })
}
