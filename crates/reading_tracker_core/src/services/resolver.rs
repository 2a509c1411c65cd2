//! crates/reading_tracker_core/src/services/resolver.rs
//!
//! Resolves the (reading type, document id) pair of a reading to the document's
//! display name. Each reading type knows its own lookup scope: books and manga live
//! in top-level collections, custom documents only inside the caller's own user.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::ReadingType;
use crate::ports::{BookRepository, CustomDocumentRepository, MangaRepository, PortResult};

#[derive(Clone)]
pub struct DocumentResolver {
    books: Arc<dyn BookRepository>,
    manga: Arc<dyn MangaRepository>,
    custom_documents: Arc<dyn CustomDocumentRepository>,
}

impl DocumentResolver {
    pub fn new(
        books: Arc<dyn BookRepository>,
        manga: Arc<dyn MangaRepository>,
        custom_documents: Arc<dyn CustomDocumentRepository>,
    ) -> Self {
        Self {
            books,
            manga,
            custom_documents,
        }
    }

    /// Returns the display name of the document, or `NotFound` if it does not
    /// exist in the scope its type implies.
    pub async fn resolve(
        &self,
        reading_type: ReadingType,
        document_id: Uuid,
        caller: Uuid,
    ) -> PortResult<String> {
        match reading_type {
            ReadingType::Book => Ok(self.books.get_book(document_id).await?.name),
            ReadingType::Manga => Ok(self.manga.get_manga(document_id).await?.title),
            ReadingType::CustomDocument => Ok(self
                .custom_documents
                .get_custom_document(caller, document_id)
                .await?
                .title),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::ports::PortError;
    use crate::test_support::{seed_book, seed_custom_document, seed_manga, seed_user};

    fn resolver(store: &Arc<InMemoryStore>) -> DocumentResolver {
        DocumentResolver::new(store.clone(), store.clone(), store.clone())
    }

    #[tokio::test]
    async fn resolves_each_type_in_its_own_scope() {
        let store = Arc::new(InMemoryStore::new());
        let user = seed_user(&store, "ana").await;
        let book = seed_book(&store, "Dune").await;
        let manga = seed_manga(&store, "Berserk").await;
        let doc = seed_custom_document(&store, user, "Thesis draft").await;
        let resolver = resolver(&store);

        assert_eq!(resolver.resolve(ReadingType::Book, book, user).await.unwrap(), "Dune");
        assert_eq!(resolver.resolve(ReadingType::Manga, manga, user).await.unwrap(), "Berserk");
        assert_eq!(
            resolver.resolve(ReadingType::CustomDocument, doc, user).await.unwrap(),
            "Thesis draft"
        );

        // A book id is not a manga id.
        let err = resolver.resolve(ReadingType::Manga, book, user).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn custom_documents_only_resolve_for_their_owner() {
        let store = Arc::new(InMemoryStore::new());
        let owner = seed_user(&store, "owner").await;
        let other = seed_user(&store, "other").await;
        let doc = seed_custom_document(&store, owner, "Notes").await;

        let err = resolver(&store)
            .resolve(ReadingType::CustomDocument, doc, other)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }
}
