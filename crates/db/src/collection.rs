use tokio::sync::RwLock;

use crate::error::{DbError, DbResult};

/// A record that can be stored in a [`Collection`].
pub trait Document: Clone + Send + Sync + 'static {
    /// Stable identifier of the document. Must not change across updates.
    fn id(&self) -> &str;
}

/// Extracts the indexed key of a document.
pub type IndexKey<D> = fn(&D) -> String;

struct UniqueIndex<D> {
    name: &'static str,
    key: IndexKey<D>,
}

/// Typed collection of documents kept in insertion order.
pub struct Collection<D> {
    name: String,
    docs: RwLock<Vec<D>>,
    indexes: Vec<UniqueIndex<D>>,
}

impl<D: Document> Collection<D> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            docs: RwLock::new(Vec::new()),
            indexes: Vec::new(),
        }
    }

    /// Declare a unique index. Every document must produce a distinct key.
    pub fn with_unique_index(mut self, name: &'static str, key: IndexKey<D>) -> Self {
        self.indexes.push(UniqueIndex { name, key });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Checks `candidate` against every other document in `docs`.
    fn check_unique(&self, docs: &[D], candidate: &D) -> DbResult<()> {
        for index in &self.indexes {
            let key = (index.key)(candidate);
            let taken = docs
                .iter()
                .any(|doc| doc.id() != candidate.id() && (index.key)(doc) == key);
            if taken {
                return Err(DbError::UniqueViolation {
                    collection: self.name.clone(),
                    index: index.name,
                });
            }
        }
        Ok(())
    }

    /// Insert a new document and return it.
    pub async fn insert(&self, doc: D) -> DbResult<D> {
        let mut docs = self.docs.write().await;

        if docs.iter().any(|existing| existing.id() == doc.id()) {
            return Err(DbError::DuplicateId {
                collection: self.name.clone(),
                id: doc.id().to_string(),
            });
        }
        self.check_unique(&docs, &doc)?;

        docs.push(doc.clone());
        tracing::trace!(target: "atlas-db", collection = %self.name, id = doc.id(), "insert");
        Ok(doc)
    }

    /// First document matching `filter`, in insertion order.
    pub async fn find_one<F>(&self, filter: F) -> DbResult<Option<D>>
    where
        F: Fn(&D) -> bool + Send,
    {
        let docs = self.docs.read().await;
        Ok(docs.iter().find(|doc| filter(doc)).cloned())
    }

    /// All documents matching `filter`, in insertion order.
    pub async fn find_many<F>(&self, filter: F) -> DbResult<Vec<D>>
    where
        F: Fn(&D) -> bool + Send,
    {
        let docs = self.docs.read().await;
        Ok(docs.iter().filter(|doc| filter(doc)).cloned().collect())
    }

    pub async fn count<F>(&self, filter: F) -> DbResult<usize>
    where
        F: Fn(&D) -> bool + Send,
    {
        let docs = self.docs.read().await;
        Ok(docs.iter().filter(|doc| filter(doc)).count())
    }

    /// Apply `update` to the first document matching `filter` and return the
    /// updated document, or `None` when nothing matched.
    ///
    /// The update is staged on a copy; if it breaks a unique index or the id,
    /// the stored document is left untouched.
    pub async fn update_one<F, U>(&self, filter: F, update: U) -> DbResult<Option<D>>
    where
        F: Fn(&D) -> bool + Send,
        U: FnOnce(&mut D) + Send,
    {
        let mut docs = self.docs.write().await;

        let Some(position) = docs.iter().position(|doc| filter(doc)) else {
            return Ok(None);
        };

        let mut staged = docs[position].clone();
        update(&mut staged);
        self.ensure_same_id(&docs[position], &staged)?;
        self.check_unique(&docs, &staged)?;

        docs[position] = staged.clone();
        tracing::trace!(target: "atlas-db", collection = %self.name, id = staged.id(), "update");
        Ok(Some(staged))
    }

    /// Apply `update` to every document matching `filter`; returns how many
    /// documents changed. Either all matches are updated or none are.
    pub async fn update_many<F, U>(&self, filter: F, mut update: U) -> DbResult<u64>
    where
        F: Fn(&D) -> bool + Send,
        U: FnMut(&mut D) + Send,
    {
        let mut docs = self.docs.write().await;

        let mut staged = docs.clone();
        let mut touched = Vec::new();
        for (position, doc) in staged.iter_mut().enumerate() {
            if filter(doc) {
                update(doc);
                touched.push(position);
            }
        }

        for &position in &touched {
            self.ensure_same_id(&docs[position], &staged[position])?;
            self.check_unique(&staged, &staged[position])?;
        }

        *docs = staged;
        tracing::trace!(
            target: "atlas-db",
            collection = %self.name,
            matched = touched.len(),
            "update_many"
        );
        Ok(touched.len() as u64)
    }

    fn ensure_same_id(&self, before: &D, after: &D) -> DbResult<()> {
        if before.id() != after.id() {
            return Err(DbError::ImmutableId {
                collection: self.name.clone(),
                id: before.id().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: String,
        slug: String,
        hidden: bool,
    }

    impl Document for Note {
        fn id(&self) -> &str {
            &self.id
        }
    }

    fn note(id: &str, slug: &str) -> Note {
        Note {
            id: id.to_string(),
            slug: slug.to_string(),
            hidden: false,
        }
    }

    fn notes() -> Collection<Note> {
        Collection::new("test/notes")
            .with_unique_index("note_slug_unique", |n: &Note| n.slug.clone())
    }

    #[tokio::test]
    async fn insert_then_find() {
        let notes = notes();
        notes.insert(note("1", "first")).await.unwrap();
        notes.insert(note("2", "second")).await.unwrap();

        let found = notes.find_one(|n| n.slug == "second").await.unwrap();
        assert_eq!(found.unwrap().id, "2");
        assert_eq!(notes.count(|_| true).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn find_many_keeps_insertion_order() {
        let notes = notes();
        for (id, slug) in [("1", "c"), ("2", "a"), ("3", "b")] {
            notes.insert(note(id, slug)).await.unwrap();
        }

        let ids: Vec<_> = notes
            .find_many(|_| true)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[tokio::test]
    async fn unique_index_rejects_duplicate_insert() {
        let notes = notes();
        notes.insert(note("1", "same")).await.unwrap();

        let err = notes.insert(note("2", "same")).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::UniqueViolation {
                index: "note_slug_unique",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected() {
        let notes = notes();
        notes.insert(note("1", "a")).await.unwrap();
        assert!(matches!(
            notes.insert(note("1", "b")).await,
            Err(DbError::DuplicateId { .. })
        ));
    }

    #[tokio::test]
    async fn update_one_allows_keeping_own_key() {
        let notes = notes();
        notes.insert(note("1", "a")).await.unwrap();

        let updated = notes
            .update_one(|n| n.id == "1", |n| n.hidden = true)
            .await
            .unwrap()
            .unwrap();
        assert!(updated.hidden);
        assert_eq!(updated.slug, "a");
    }

    #[tokio::test]
    async fn update_one_rolls_back_on_index_violation() {
        let notes = notes();
        notes.insert(note("1", "a")).await.unwrap();
        notes.insert(note("2", "b")).await.unwrap();

        let result = notes
            .update_one(|n| n.id == "2", |n| n.slug = "a".to_string())
            .await;
        assert!(result.is_err());

        let stored = notes.find_one(|n| n.id == "2").await.unwrap().unwrap();
        assert_eq!(stored.slug, "b");
    }

    #[tokio::test]
    async fn update_one_without_match_returns_none() {
        let notes = notes();
        let result = notes
            .update_one(|n| n.id == "missing", |n| n.hidden = true)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn update_one_cannot_change_id() {
        let notes = notes();
        notes.insert(note("1", "a")).await.unwrap();
        let result = notes
            .update_one(|n| n.id == "1", |n| n.id = "9".to_string())
            .await;
        assert!(matches!(result, Err(DbError::ImmutableId { .. })));
    }

    #[tokio::test]
    async fn update_many_counts_matches() {
        let notes = notes();
        notes.insert(note("1", "a")).await.unwrap();
        notes.insert(note("2", "b")).await.unwrap();
        notes.insert(note("3", "c")).await.unwrap();

        let changed = notes
            .update_many(|n| n.id != "2", |n| n.hidden = true)
            .await
            .unwrap();
        assert_eq!(changed, 2);
        assert_eq!(notes.count(|n| n.hidden).await.unwrap(), 2);

        let again = notes
            .update_many(|n| n.hidden && n.id == "missing", |n| n.hidden = false)
            .await
            .unwrap();
        assert_eq!(again, 0);
    }
}
