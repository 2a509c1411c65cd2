//! Fixtures shared by the unit tests of the services.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{
    Book, CustomDocument, Manga, PageRequest, ReadingInsert, ReadingStatus, ReadingType, User,
};
use crate::memory::InMemoryStore;
use crate::ports::{
    BookRepository, CredentialHasher, CustomDocumentRepository, MangaRepository, PortResult,
    UserRepository,
};
use crate::services::{DocumentResolver, ReadingService};

/// Stores passwords as-is. Only for tests.
pub struct PlainHasher;

impl CredentialHasher for PlainHasher {
    fn hash(&self, password: &str) -> PortResult<String> {
        Ok(format!("plain:{}", password))
    }

    fn verify(&self, password: &str, hash: &str) -> PortResult<bool> {
        Ok(hash == format!("plain:{}", password))
    }
}

pub async fn seed_user(store: &InMemoryStore, username: &str) -> Uuid {
    let user = User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: format!("{}@example.com", username),
        last_login: None,
        created_at: Utc::now(),
    };
    let id = user.id;
    store.insert_user(user, "plain:secret").await.unwrap();
    id
}

pub async fn seed_book(store: &InMemoryStore, name: &str) -> Uuid {
    let now = Utc::now();
    let book = Book {
        id: Uuid::new_v4(),
        name: name.to_string(),
        author: "Frank Herbert".to_string(),
        isbn: String::new(),
        edition: String::new(),
        pages: 412,
        language: "en".to_string(),
        publisher: String::new(),
        description: String::new(),
        genres: vec!["sci-fi".to_string()],
        cover_image_url: String::new(),
        publication_date: None,
        created_at: now,
        updated_at: now,
    };
    let id = book.id;
    store.insert_book(book).await.unwrap();
    id
}

pub async fn seed_manga(store: &InMemoryStore, title: &str) -> Uuid {
    let now = Utc::now();
    let manga = Manga {
        id: Uuid::new_v4(),
        title: title.to_string(),
        author: "Kentaro Miura".to_string(),
        volume: 1,
        chapters: 10,
        demography: "seinen".to_string(),
        genres: vec!["fantasy".to_string()],
        publisher: String::new(),
        description: String::new(),
        cover_image_url: String::new(),
        publication_date: None,
        created_at: now,
        updated_at: now,
    };
    let id = manga.id;
    store.insert_manga(manga).await.unwrap();
    id
}

pub async fn seed_custom_document(store: &InMemoryStore, user_id: Uuid, title: &str) -> Uuid {
    let now = Utc::now();
    let doc = CustomDocument {
        id: Uuid::new_v4(),
        title: title.to_string(),
        author: String::new(),
        description: String::new(),
        url: String::new(),
        tags: Vec::new(),
        category: String::new(),
        status: String::new(),
        created_at: now,
        updated_at: now,
    };
    let id = doc.id;
    store.push_custom_document(user_id, doc).await.unwrap();
    id
}

pub fn reading_service(store: &Arc<InMemoryStore>) -> ReadingService {
    let resolver = DocumentResolver::new(store.clone(), store.clone(), store.clone());
    ReadingService::new(store.clone(), store.clone(), resolver)
}

/// Starts an ongoing reading and returns its id.
pub async fn start(
    service: &ReadingService,
    user_id: Uuid,
    document_id: Uuid,
    reading_type: ReadingType,
) -> Uuid {
    service
        .start_reading(
            ReadingInsert {
                document_id,
                reading_type,
                status: ReadingStatus::Ongoing,
                notes: String::new(),
            },
            user_id,
        )
        .await
        .unwrap();
    service
        .list_by_user(user_id, PageRequest::new(Some(1), Some(i64::MAX), true))
        .await
        .unwrap()
        .items
        .into_iter()
        .find(|r| r.document_id == document_id)
        .map(|r| r.id)
        .unwrap()
}
