//! crates/reading_tracker_core/src/services/catalog.rs
//!
//! The document catalog: shared books and manga, plus the custom documents each
//! user keeps inside their own account.

use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::domain::{
    Book, BookFilter, BookInsert, CustomDocument, CustomDocumentInsert, CustomDocumentPatch,
    Manga, MangaFilter, MangaInsert, Page, PageRequest,
};
use crate::ports::{
    BookRepository, CustomDocumentRepository, MangaRepository, PortError, PortResult,
};

#[derive(Clone)]
pub struct CatalogService {
    books: Arc<dyn BookRepository>,
    manga: Arc<dyn MangaRepository>,
}

impl CatalogService {
    pub fn new(books: Arc<dyn BookRepository>, manga: Arc<dyn MangaRepository>) -> Self {
        Self { books, manga }
    }

    // --- Books ---

    pub async fn create_book(&self, insert: BookInsert) -> PortResult<Book> {
        let now = Utc::now();
        let book = Book {
            id: Uuid::new_v4(),
            name: insert.name,
            author: insert.author,
            isbn: insert.isbn,
            edition: insert.edition,
            pages: insert.pages,
            language: insert.language,
            publisher: insert.publisher,
            description: insert.description,
            genres: insert.genres,
            cover_image_url: insert.cover_image_url,
            publication_date: insert.publication_date,
            created_at: now,
            updated_at: now,
        };
        self.books.insert_book(book.clone()).await?;
        info!(book_id = %book.id, "book created");
        Ok(book)
    }

    pub async fn get_book(&self, id: Uuid) -> PortResult<Book> {
        self.books.get_book(id).await
    }

    pub async fn list_books(&self, page: PageRequest) -> PortResult<Page<Book>> {
        self.books.list_books(page).await
    }

    /// Lookup by name prefix, author or genre. No match is an empty page.
    pub async fn find_books(&self, filter: BookFilter, page: PageRequest) -> PortResult<Page<Book>> {
        self.books.find_books_by(&filter, page).await
    }

    /// The book with this exact ISBN.
    pub async fn get_book_by_isbn(&self, isbn: &str) -> PortResult<Book> {
        let filter = BookFilter::Isbn(isbn.to_string());
        self.books
            .find_books_by(&filter, PageRequest::new(Some(1), Some(1), true))
            .await?
            .items
            .into_iter()
            .next()
            .ok_or_else(|| PortError::NotFound(format!("Book with ISBN {} not found", isbn)))
    }

    /// Replaces every descriptive field; id and creation time are kept.
    pub async fn update_book(&self, id: Uuid, insert: BookInsert) -> PortResult<Book> {
        let current = self.books.get_book(id).await?;
        let book = Book {
            id,
            name: insert.name,
            author: insert.author,
            isbn: insert.isbn,
            edition: insert.edition,
            pages: insert.pages,
            language: insert.language,
            publisher: insert.publisher,
            description: insert.description,
            genres: insert.genres,
            cover_image_url: insert.cover_image_url,
            publication_date: insert.publication_date,
            created_at: current.created_at,
            updated_at: Utc::now(),
        };
        self.books.replace_book(book.clone()).await?;
        Ok(book)
    }

    pub async fn delete_book(&self, id: Uuid) -> PortResult<()> {
        self.books.delete_book(id).await
    }

    // --- Manga ---

    pub async fn create_manga(&self, insert: MangaInsert) -> PortResult<Manga> {
        let now = Utc::now();
        let manga = Manga {
            id: Uuid::new_v4(),
            title: insert.title,
            author: insert.author,
            volume: insert.volume,
            chapters: insert.chapters,
            demography: insert.demography,
            genres: insert.genres,
            publisher: insert.publisher,
            description: insert.description,
            cover_image_url: insert.cover_image_url,
            publication_date: insert.publication_date,
            created_at: now,
            updated_at: now,
        };
        self.manga.insert_manga(manga.clone()).await?;
        info!(manga_id = %manga.id, "manga created");
        Ok(manga)
    }

    pub async fn get_manga(&self, id: Uuid) -> PortResult<Manga> {
        self.manga.get_manga(id).await
    }

    pub async fn list_manga(&self, page: PageRequest) -> PortResult<Page<Manga>> {
        self.manga.list_manga(page).await
    }

    pub async fn find_manga(
        &self,
        filter: MangaFilter,
        page: PageRequest,
    ) -> PortResult<Page<Manga>> {
        self.manga.find_manga_by(&filter, page).await
    }

    pub async fn update_manga(&self, id: Uuid, insert: MangaInsert) -> PortResult<Manga> {
        let current = self.manga.get_manga(id).await?;
        let manga = Manga {
            id,
            title: insert.title,
            author: insert.author,
            volume: insert.volume,
            chapters: insert.chapters,
            demography: insert.demography,
            genres: insert.genres,
            publisher: insert.publisher,
            description: insert.description,
            cover_image_url: insert.cover_image_url,
            publication_date: insert.publication_date,
            created_at: current.created_at,
            updated_at: Utc::now(),
        };
        self.manga.replace_manga(manga.clone()).await?;
        Ok(manga)
    }

    pub async fn delete_manga(&self, id: Uuid) -> PortResult<()> {
        self.manga.delete_manga(id).await
    }
}

#[derive(Clone)]
pub struct CustomDocumentService {
    documents: Arc<dyn CustomDocumentRepository>,
}

impl CustomDocumentService {
    pub fn new(documents: Arc<dyn CustomDocumentRepository>) -> Self {
        Self { documents }
    }

    pub async fn list_documents(&self, user_id: Uuid) -> PortResult<Vec<CustomDocument>> {
        self.documents.list_custom_documents(user_id).await
    }

    pub async fn get_document(&self, user_id: Uuid, document_id: Uuid) -> PortResult<CustomDocument> {
        self.documents.get_custom_document(user_id, document_id).await
    }

    pub async fn create_document(
        &self,
        user_id: Uuid,
        insert: CustomDocumentInsert,
    ) -> PortResult<CustomDocument> {
        let now = Utc::now();
        let document = CustomDocument {
            id: Uuid::new_v4(),
            title: insert.title,
            author: insert.author,
            description: insert.description,
            url: insert.url,
            tags: insert.tags,
            category: insert.category,
            status: insert.status,
            created_at: now,
            updated_at: now,
        };
        self.documents
            .push_custom_document(user_id, document.clone())
            .await?;
        Ok(document)
    }

    /// Applies only the provided fields; `updated_at` is always bumped.
    pub async fn update_document(
        &self,
        user_id: Uuid,
        document_id: Uuid,
        patch: CustomDocumentPatch,
    ) -> PortResult<()> {
        self.documents
            .patch_custom_document(user_id, document_id, patch, Utc::now())
            .await
    }

    pub async fn delete_document(&self, user_id: Uuid, document_id: Uuid) -> PortResult<()> {
        self.documents.pull_custom_document(user_id, document_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::test_support::seed_user;

    #[tokio::test]
    async fn books_are_listed_by_name() {
        let store = Arc::new(InMemoryStore::new());
        let catalog = CatalogService::new(store.clone(), store.clone());
        for name in ["Neuromancer", "Dune", "Solaris"] {
            catalog
                .create_book(BookInsert {
                    name: name.to_string(),
                    author: "someone".to_string(),
                    pages: 300,
                    language: "en".to_string(),
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        let page = catalog
            .list_books(PageRequest::new(Some(1), Some(2), true))
            .await
            .unwrap();
        let names: Vec<&str> = page.items.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Dune", "Neuromancer"]);
        assert_eq!(page.total, 3);
    }

    #[tokio::test]
    async fn updating_a_book_keeps_its_identity() {
        let store = Arc::new(InMemoryStore::new());
        let catalog = CatalogService::new(store.clone(), store.clone());
        let book = catalog
            .create_book(BookInsert {
                name: "Dune".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let updated = catalog
            .update_book(
                book.id,
                BookInsert {
                    name: "Dune Messiah".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.id, book.id);
        assert_eq!(updated.created_at, book.created_at);
        assert_eq!(catalog.get_book(book.id).await.unwrap().name, "Dune Messiah");

        catalog.delete_book(book.id).await.unwrap();
        let err = catalog.get_book(book.id).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn books_are_found_by_name_author_genre_and_isbn() {
        let store = Arc::new(InMemoryStore::new());
        let catalog = CatalogService::new(store.clone(), store.clone());
        for (name, author, genre, isbn) in [
            ("Dune", "Frank Herbert", "Science Fiction", "978-0441013593"),
            ("Dune Messiah", "Frank Herbert", "Science Fiction", "978-0593098233"),
            ("Solaris", "Stanislaw Lem", "Philosophical", "978-0156027601"),
        ] {
            catalog
                .create_book(BookInsert {
                    name: name.to_string(),
                    author: author.to_string(),
                    genres: vec![genre.to_string()],
                    isbn: isbn.to_string(),
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        let names = |page: Page<Book>| -> Vec<String> {
            page.items.into_iter().map(|b| b.name).collect()
        };
        let by_name = catalog
            .find_books(BookFilter::NamePrefix("dune".to_string()), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(names(by_name), vec!["Dune", "Dune Messiah"]);

        let by_author = catalog
            .find_books(BookFilter::Author("lem".to_string()), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(names(by_author), vec!["Solaris"]);

        let by_genre = catalog
            .find_books(
                BookFilter::Genre("science fiction".to_string()),
                PageRequest::new(Some(2), Some(1), true),
            )
            .await
            .unwrap();
        assert_eq!(by_genre.total, 2);
        assert_eq!(names(by_genre), vec!["Dune Messiah"]);

        let book = catalog.get_book_by_isbn("978-0156027601").await.unwrap();
        assert_eq!(book.name, "Solaris");
        let err = catalog.get_book_by_isbn("000").await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn manga_are_found_by_demography() {
        let store = Arc::new(InMemoryStore::new());
        let catalog = CatalogService::new(store.clone(), store.clone());
        for (title, demography) in [("Berserk", "Seinen"), ("Naruto", "Shonen"), ("Vagabond", "seinen")] {
            catalog
                .create_manga(MangaInsert {
                    title: title.to_string(),
                    author: "someone".to_string(),
                    demography: demography.to_string(),
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        let seinen = catalog
            .find_manga(MangaFilter::Demography("SEINEN".to_string()), PageRequest::default())
            .await
            .unwrap();
        let titles: Vec<&str> = seinen.items.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Berserk", "Vagabond"]);

        let none = catalog
            .find_manga(MangaFilter::Genre("horror".to_string()), PageRequest::default())
            .await
            .unwrap();
        assert!(none.items.is_empty());
        assert_eq!(none.total, 0);
    }

    #[tokio::test]
    async fn custom_document_patch_only_changes_given_fields() {
        let store = Arc::new(InMemoryStore::new());
        let user = seed_user(&store, "ana").await;
        let documents = CustomDocumentService::new(store.clone());
        let doc = documents
            .create_document(
                user,
                CustomDocumentInsert {
                    title: "Draft".to_string(),
                    author: "Ana".to_string(),
                    category: "essay".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        documents
            .update_document(
                user,
                doc.id,
                CustomDocumentPatch {
                    title: Some("Final".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let stored = documents.get_document(user, doc.id).await.unwrap();
        assert_eq!(stored.title, "Final");
        assert_eq!(stored.author, "Ana");
        assert_eq!(stored.category, "essay");

        let err = documents
            .update_document(user, Uuid::new_v4(), CustomDocumentPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }
}
