use atlas_authz::ensure_owner;
use time::OffsetDateTime;

use super::{required, required_as_sent, valid_id, RuleError, RuleResult, Rules, EMPTY_BODY, NO_UPDATABLE_FIELD};
use crate::modules::books::models::{
    Book, BookChanges, BookDetail, BookPatch, BookSummary, CreateBook, ListBooksQuery,
};
use crate::modules::reviews::models::ReviewView;
use crate::store::BookFilter;
use crate::utils::new_id;
use crate::utils::validation::{canonical_date, is_valid_id, is_valid_isbn, non_blank};

const INVALID_ISBN: &str = "Invalid ISBN number, it should contain only 13 digits.";
const INVALID_DATE: &str = "Please enter the date in the format of YYYY-MM-DD.";
const NO_SUCH_BOOK: &str = "No book exists with this ID or it might be deleted.";
const ALREADY_DELETED: &str = "Book is already deleted.";
const NO_DATA: &str = "Data not found or data already deleted.";
const UNKNOWN_USER: &str = "Data not found with this User ID. Please enter a valid User ID.";

impl Rules {
    /// Add a book to the catalogue on behalf of the `userId` in the payload.
    pub async fn create_book(&self, payload: CreateBook) -> RuleResult<Book> {
        if payload.is_empty() {
            return Err(RuleError::invalid(EMPTY_BODY));
        }

        let title = required_as_sent(payload.title.clone(), "Title is required.")?;
        let excerpt = required_as_sent(payload.excerpt.clone(), "Excerpt is required.")?;
        let isbn = required_as_sent(payload.isbn.clone(), "ISBN is required.")?;
        let category = required_as_sent(payload.category.clone(), "Category is required.")?;
        let subcategory =
            required_as_sent(payload.subcategory.clone(), "Subcategory is required.")?;
        let released_at = required(payload.released_at.as_deref(), "releasedAt is required.")?;
        let user_id = required(payload.user_id.as_deref(), "userId is required.")?;

        if !is_valid_isbn(&isbn) {
            return Err(RuleError::invalid(INVALID_ISBN));
        }
        let released_at =
            canonical_date(released_at).ok_or_else(|| RuleError::InvalidDate(INVALID_DATE.into()))?;
        if !is_valid_id(user_id) {
            return Err(RuleError::invalid("Invalid User ID."));
        }
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(RuleError::invalid(UNKNOWN_USER));
        }

        self.ensure_unique(Some(&title), Some(&isbn), None).await?;

        let now = OffsetDateTime::now_utc();
        let book = self
            .books
            .insert(Book {
                id: new_id(),
                title,
                excerpt,
                isbn,
                category,
                subcategory,
                released_at: released_at.to_string(),
                user_id: user_id.to_string(),
                review_count: 0,
                is_deleted: false,
                deleted_at: None,
                created_at: now,
                updated_at: now,
            })
            .await?;

        tracing::info!(book_id = %book.id, owner = %book.user_id, "book created");
        Ok(book)
    }

    /// Change title, excerpt, ISBN or release date of a live book the
    /// caller owns.
    pub async fn update_book(
        &self,
        book_id: &str,
        patch: BookPatch,
        caller_id: &str,
    ) -> RuleResult<Book> {
        let book_id = valid_id(book_id, "Invalid book id.")?;
        if patch.is_empty() {
            return Err(RuleError::invalid(EMPTY_BODY));
        }

        let book = self.live_book(book_id, NO_SUCH_BOOK).await?;
        ensure_owner(caller_id, &book.user_id)?;

        if !patch.has_updatable_field() {
            return Err(RuleError::invalid(NO_UPDATABLE_FIELD));
        }
        let changes = validate_patch(&patch)?;

        self.ensure_unique(
            changes.title.as_deref(),
            changes.isbn.as_deref(),
            Some(book_id),
        )
        .await?;

        let updated = self
            .books
            .update_live(book_id, &changes, OffsetDateTime::now_utc())
            .await?
            .ok_or_else(|| RuleError::not_found(NO_SUCH_BOOK))?;

        tracing::info!(book_id = %updated.id, "book updated");
        Ok(updated)
    }

    /// Soft-delete a live book the caller owns, then its reviews.
    pub async fn delete_book(&self, book_id: &str, caller_id: &str) -> RuleResult<()> {
        let book_id = book_id.trim();
        if !is_valid_id(book_id) {
            return Err(RuleError::not_found(ALREADY_DELETED));
        }

        let book = self.live_book(book_id, ALREADY_DELETED).await?;
        ensure_owner(caller_id, &book.user_id)?;

        self.books
            .soft_delete(book_id, OffsetDateTime::now_utc())
            .await?
            .ok_or_else(|| RuleError::not_found(ALREADY_DELETED))?;
        tracing::info!(book_id, "book deleted");

        match self.reviews.soft_delete_for_book(book_id).await {
            Ok(count) => tracing::info!(book_id, reviews = count, "reviews of deleted book removed"),
            Err(e) => tracing::warn!(book_id, error = %e, "failed to cascade book deletion to reviews"),
        }
        Ok(())
    }

    /// Live books matching the query, ordered by title.
    pub async fn list_books(&self, query: ListBooksQuery) -> RuleResult<Vec<BookSummary>> {
        let user_id = non_blank(query.user_id.as_deref());
        if let Some(user_id) = user_id {
            if !is_valid_id(user_id) {
                return Err(RuleError::invalid("Invalid User ID."));
            }
            if self.users.find_by_id(user_id).await?.is_none() {
                return Err(RuleError::not_found(UNKNOWN_USER));
            }
        }

        let filter = BookFilter {
            user_id: user_id.map(str::to_string),
            category: non_blank(query.category.as_deref()).map(str::to_string),
            subcategory: non_blank(query.subcategory.as_deref()).map(str::to_string),
        };

        let books = self.books.list_live(&filter).await?;
        if books.is_empty() {
            return Err(RuleError::not_found(NO_DATA));
        }
        Ok(books.into_iter().map(BookSummary::from).collect())
    }

    /// A live book with its live reviews.
    pub async fn get_book_detail(&self, book_id: &str) -> RuleResult<BookDetail> {
        let book_id = valid_id(book_id, "Please provide a valid book ID.")?;
        let book = self.live_book(book_id, NO_SUCH_BOOK).await?;

        let reviews_data: Vec<ReviewView> = self
            .reviews
            .list_live_for_book(book_id)
            .await?
            .into_iter()
            .map(ReviewView::from)
            .collect();

        Ok(BookDetail {
            book,
            reviews: reviews_data.len(),
            reviews_data,
        })
    }

    /// Conflict if another book, deleted or not, already uses the title or ISBN.
    async fn ensure_unique(
        &self,
        title: Option<&str>,
        isbn: Option<&str>,
        excluding: Option<&str>,
    ) -> RuleResult<()> {
        if title.is_none() && isbn.is_none() {
            return Ok(());
        }

        let Some(existing) = self
            .books
            .find_by_title_or_isbn(title, isbn, excluding)
            .await?
        else {
            return Ok(());
        };

        let message = if title == Some(existing.title.as_str()) {
            format!("The title {} is already in use for a book. Try another one.", existing.title)
        } else {
            format!("The ISBN {} is already in use for a book. Try another one.", existing.isbn)
        };
        Err(RuleError::Conflict(message))
    }
}

fn validate_patch(patch: &BookPatch) -> RuleResult<BookChanges> {
    let title = patch
        .title
        .clone()
        .map(|t| required_as_sent(Some(t), "Title is not valid."))
        .transpose()?;
    let excerpt = patch
        .excerpt
        .clone()
        .map(|e| required_as_sent(Some(e), "Excerpt is not valid."))
        .transpose()?;
    let isbn = patch
        .isbn
        .clone()
        .map(|i| {
            if is_valid_isbn(&i) {
                Ok(i)
            } else {
                Err(RuleError::invalid(INVALID_ISBN))
            }
        })
        .transpose()?;
    let released_at = patch
        .released_at
        .as_deref()
        .map(|d| canonical_date(d).ok_or_else(|| RuleError::InvalidDate(INVALID_DATE.into())))
        .transpose()?;

    Ok(BookChanges {
        title,
        excerpt,
        isbn,
        released_at: released_at.map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::reviews::models::ReviewInput;
    use crate::rules::test_support::{new_book, rules, user};

    fn review(rating: i64) -> ReviewInput {
        ReviewInput {
            rating: Some(rating),
            review: Some("Worth reading".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn creates_live_book_with_zero_reviews() {
        let rules = rules();
        let owner = user(&rules, "9876543210", "owner@example.com").await;

        let mut payload = new_book("Dune", "9780441172719", &owner.id);
        payload.released_at = Some(" 1965-08-01 ".to_string());
        let book = rules.create_book(payload).await.unwrap();

        assert!(!book.is_deleted);
        assert!(book.deleted_at.is_none());
        assert_eq!(book.review_count, 0);
        assert_eq!(book.released_at, "1965-08-01");
        assert_eq!(book.user_id, owner.id);
    }

    #[tokio::test]
    async fn detail_returns_fields_as_created() {
        let rules = rules();
        let owner = user(&rules, "9876543210", "owner@example.com").await;

        let mut payload = new_book("  Dune  ", "9780441172719", &owner.id);
        payload.excerpt = Some(" Spice ".to_string());
        payload.category = Some(" SF ".to_string());
        payload.subcategory = Some("Space opera ".to_string());
        payload.released_at = Some("1965-08-01".to_string());
        let book = rules.create_book(payload).await.unwrap();

        let detail = rules.get_book_detail(&book.id).await.unwrap();
        assert_eq!(detail.book.title, "  Dune  ");
        assert_eq!(detail.book.excerpt, " Spice ");
        assert_eq!(detail.book.isbn, "9780441172719");
        assert_eq!(detail.book.category, " SF ");
        assert_eq!(detail.book.subcategory, "Space opera ");
        assert_eq!(detail.book.released_at, "1965-08-01");
        assert_eq!(detail.book.user_id, owner.id);
        assert_eq!(detail.reviews, 0);
    }

    #[tokio::test]
    async fn create_rejects_bad_fields() {
        let rules = rules();
        let owner = user(&rules, "9876543210", "owner@example.com").await;

        let short_isbn = new_book("Dune", "97804411727", &owner.id);
        let padded_isbn = new_book("Dune", " 9780441172719 ", &owner.id);
        let mut blank_excerpt = new_book("Dune", "9780441172719", &owner.id);
        blank_excerpt.excerpt = Some("  ".to_string());
        let unknown_owner = new_book("Dune", "9780441172719", &crate::utils::new_id());
        let malformed_owner = new_book("Dune", "9780441172719", "not-an-id");

        for payload in [short_isbn, padded_isbn, blank_excerpt, unknown_owner, malformed_owner] {
            assert!(matches!(
                rules.create_book(payload).await,
                Err(RuleError::InvalidInput(_))
            ));
        }
        assert!(matches!(
            rules.create_book(CreateBook::default()).await,
            Err(RuleError::InvalidInput(m)) if m == EMPTY_BODY
        ));
    }

    #[tokio::test]
    async fn create_rejects_non_calendar_dates() {
        let rules = rules();
        let owner = user(&rules, "9876543210", "owner@example.com").await;

        for date in ["2023-02-30", "2023-2-28", "15-06-2021"] {
            let mut payload = new_book("Dune", "9780441172719", &owner.id);
            payload.released_at = Some(date.to_string());
            assert!(matches!(
                rules.create_book(payload).await,
                Err(RuleError::InvalidDate(_))
            ));
        }
    }

    #[tokio::test]
    async fn title_and_isbn_stay_unique_even_after_delete() {
        let rules = rules();
        let owner = user(&rules, "9876543210", "owner@example.com").await;
        let book = rules
            .create_book(new_book("Dune", "9780441172719", &owner.id))
            .await
            .unwrap();

        let same_title = rules
            .create_book(new_book("Dune", "9780000000000", &owner.id))
            .await;
        assert!(matches!(same_title, Err(RuleError::Conflict(m)) if m.contains("title")));

        rules.delete_book(&book.id, &owner.id).await.unwrap();
        let same_isbn = rules
            .create_book(new_book("Dune Messiah", "9780441172719", &owner.id))
            .await;
        assert!(matches!(same_isbn, Err(RuleError::Conflict(m)) if m.contains("ISBN")));
    }

    #[tokio::test]
    async fn owner_updates_selected_fields() {
        let rules = rules();
        let owner = user(&rules, "9876543210", "owner@example.com").await;
        let book = rules
            .create_book(new_book("Dune", "9780441172719", &owner.id))
            .await
            .unwrap();

        let updated = rules
            .update_book(
                &book.id,
                BookPatch {
                    title: Some("Dune".to_string()),
                    excerpt: Some("Spice".to_string()),
                    ..Default::default()
                },
                &owner.id,
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Dune");
        assert_eq!(updated.excerpt, "Spice");
        assert_eq!(updated.isbn, book.isbn);
        assert_eq!(updated.category, book.category);
        assert!(updated.updated_at >= book.updated_at);
    }

    #[tokio::test]
    async fn update_guards() {
        let rules = rules();
        let owner = user(&rules, "9876543210", "owner@example.com").await;
        let other = user(&rules, "9123456789", "other@example.com").await;
        let book = rules
            .create_book(new_book("Dune", "9780441172719", &owner.id))
            .await
            .unwrap();
        rules
            .create_book(new_book("Emma", "9780141439587", &owner.id))
            .await
            .unwrap();

        let title_patch = || BookPatch {
            title: Some("Dune II".to_string()),
            ..Default::default()
        };

        assert!(matches!(
            rules.update_book(&book.id, title_patch(), &other.id).await,
            Err(RuleError::Forbidden(_))
        ));
        assert!(matches!(
            rules.update_book("nope", title_patch(), &owner.id).await,
            Err(RuleError::InvalidInput(_))
        ));
        assert!(matches!(
            rules
                .update_book(&crate::utils::new_id(), title_patch(), &owner.id)
                .await,
            Err(RuleError::NotFound(_))
        ));
        assert!(matches!(
            rules.update_book(&book.id, BookPatch::default(), &owner.id).await,
            Err(RuleError::InvalidInput(m)) if m == EMPTY_BODY
        ));

        let mut unrelated = BookPatch::default();
        unrelated
            .other
            .insert("category".to_string(), serde_json::json!("Horror"));
        assert!(matches!(
            rules.update_book(&book.id, unrelated, &owner.id).await,
            Err(RuleError::InvalidInput(m)) if m == NO_UPDATABLE_FIELD
        ));

        let taken = BookPatch {
            isbn: Some("9780141439587".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            rules.update_book(&book.id, taken, &owner.id).await,
            Err(RuleError::Conflict(_))
        ));

        let bad_date = BookPatch {
            released_at: Some("2021-13-01".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            rules.update_book(&book.id, bad_date, &owner.id).await,
            Err(RuleError::InvalidDate(_))
        ));
    }

    #[tokio::test]
    async fn delete_cascades_to_reviews() {
        let rules = rules();
        let owner = user(&rules, "9876543210", "owner@example.com").await;
        let book = rules
            .create_book(new_book("Dune", "9780441172719", &owner.id))
            .await
            .unwrap();
        rules.create_review(&book.id, review(5)).await.unwrap();
        rules.create_review(&book.id, review(3)).await.unwrap();

        rules.delete_book(&book.id, &owner.id).await.unwrap();

        assert!(rules.reviews.list_live_for_book(&book.id).await.unwrap().is_empty());
        assert!(matches!(
            rules.get_book_detail(&book.id).await,
            Err(RuleError::NotFound(_))
        ));
        assert!(matches!(
            rules.delete_book(&book.id, &owner.id).await,
            Err(RuleError::NotFound(m)) if m == ALREADY_DELETED
        ));
        assert!(matches!(
            rules.create_review(&book.id, review(4)).await,
            Err(RuleError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn only_owner_deletes() {
        let rules = rules();
        let owner = user(&rules, "9876543210", "owner@example.com").await;
        let other = user(&rules, "9123456789", "other@example.com").await;
        let book = rules
            .create_book(new_book("Dune", "9780441172719", &owner.id))
            .await
            .unwrap();

        assert!(matches!(
            rules.delete_book(&book.id, &other.id).await,
            Err(RuleError::Forbidden(_))
        ));
        assert!(rules.get_book_detail(&book.id).await.is_ok());
    }

    #[tokio::test]
    async fn listing_filters_and_sorts() {
        let rules = rules();
        let owner = user(&rules, "9876543210", "owner@example.com").await;
        let other = user(&rules, "9123456789", "other@example.com").await;

        rules
            .create_book(new_book("Zorba", "9780000000001", &owner.id))
            .await
            .unwrap();
        rules
            .create_book(new_book("Anna Karenina", "9780000000002", &owner.id))
            .await
            .unwrap();
        let deleted = rules
            .create_book(new_book("Middlemarch", "9780000000003", &owner.id))
            .await
            .unwrap();
        rules.delete_book(&deleted.id, &owner.id).await.unwrap();

        let titles: Vec<_> = rules
            .list_books(ListBooksQuery::default())
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, ["Anna Karenina", "Zorba"]);

        let none_for_other = rules
            .list_books(ListBooksQuery {
                user_id: Some(other.id.clone()),
                ..Default::default()
            })
            .await;
        assert!(matches!(none_for_other, Err(RuleError::NotFound(m)) if m == NO_DATA));

        let unknown_user = rules
            .list_books(ListBooksQuery {
                user_id: Some(crate::utils::new_id()),
                ..Default::default()
            })
            .await;
        assert!(matches!(unknown_user, Err(RuleError::NotFound(m)) if m == UNKNOWN_USER));

        let malformed = rules
            .list_books(ListBooksQuery {
                user_id: Some("42".to_string()),
                ..Default::default()
            })
            .await;
        assert!(matches!(malformed, Err(RuleError::InvalidInput(_))));

        let by_category = rules
            .list_books(ListBooksQuery {
                category: Some("Poetry".to_string()),
                ..Default::default()
            })
            .await;
        assert!(matches!(by_category, Err(RuleError::NotFound(_))));
    }

    #[tokio::test]
    async fn detail_counts_live_reviews() {
        let rules = rules();
        let owner = user(&rules, "9876543210", "owner@example.com").await;
        let book = rules
            .create_book(new_book("Dune", "9780441172719", &owner.id))
            .await
            .unwrap();
        let first = rules.create_review(&book.id, review(5)).await.unwrap();
        rules.create_review(&book.id, review(2)).await.unwrap();
        rules.delete_review(&book.id, &first.id).await.unwrap();

        let detail = rules.get_book_detail(&book.id).await.unwrap();
        assert_eq!(detail.reviews, 1);
        assert_eq!(detail.reviews_data.len(), 1);
        assert_eq!(detail.reviews_data[0].rating, 2);
        assert_eq!(detail.book.review_count, 1);

        assert!(matches!(
            rules.get_book_detail("bad-id").await,
            Err(RuleError::InvalidInput(_))
        ));
    }
}
