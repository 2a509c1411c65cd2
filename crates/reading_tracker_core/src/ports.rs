//! crates/reading_tracker_core/src/ports.rs
//!
//! Defines the persistence and credential contracts (traits) the core services
//! depend on. These traits form the boundary of the hexagonal architecture, so the
//! services never know whether they talk to PostgreSQL or to the in-memory store.
//!
//! Embedded arrays (records inside a reading, custom documents and reading lists
//! inside a user) are only ever mutated through targeted operations that name the
//! parent and the element. Implementations must apply each of them as a single
//! atomic write on the parent so that concurrent mutations never lose each other.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Book, BookFilter, CustomDocument, CustomDocumentPatch, Manga, MangaFilter, Page, PageRequest,
    Reading, ReadingList, ReadingQuery, Record, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error kinds every core operation reports.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Duplicate: {0}")]
    Duplicate(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Storage error: {0}")]
    Storage(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Catalog Ports
//=========================================================================================

#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn insert_book(&self, book: Book) -> PortResult<()>;
    async fn get_book(&self, id: Uuid) -> PortResult<Book>;
    /// Books ordered by name, then author.
    async fn list_books(&self, page: PageRequest) -> PortResult<Page<Book>>;
    /// Books matching `filter`, in the same order as [`list_books`](Self::list_books).
    async fn find_books_by(&self, filter: &BookFilter, page: PageRequest) -> PortResult<Page<Book>>;
    async fn replace_book(&self, book: Book) -> PortResult<()>;
    async fn delete_book(&self, id: Uuid) -> PortResult<()>;
}

#[async_trait]
pub trait MangaRepository: Send + Sync {
    async fn insert_manga(&self, manga: Manga) -> PortResult<()>;
    async fn get_manga(&self, id: Uuid) -> PortResult<Manga>;
    /// Manga ordered by title, then author.
    async fn list_manga(&self, page: PageRequest) -> PortResult<Page<Manga>>;
    async fn find_manga_by(&self, filter: &MangaFilter, page: PageRequest)
        -> PortResult<Page<Manga>>;
    async fn replace_manga(&self, manga: Manga) -> PortResult<()>;
    async fn delete_manga(&self, id: Uuid) -> PortResult<()>;
}

/// Custom documents embedded in their owning user.
#[async_trait]
pub trait CustomDocumentRepository: Send + Sync {
    async fn list_custom_documents(&self, user_id: Uuid) -> PortResult<Vec<CustomDocument>>;
    async fn get_custom_document(&self, user_id: Uuid, document_id: Uuid)
        -> PortResult<CustomDocument>;
    /// Appends to the user's array. `NotFound` if the user does not exist.
    async fn push_custom_document(&self, user_id: Uuid, document: CustomDocument)
        -> PortResult<()>;
    /// Patches the matching element in place. `NotFound` if no element matches.
    async fn patch_custom_document(
        &self,
        user_id: Uuid,
        document_id: Uuid,
        patch: CustomDocumentPatch,
        at: DateTime<Utc>,
    ) -> PortResult<()>;
    async fn pull_custom_document(&self, user_id: Uuid, document_id: Uuid) -> PortResult<()>;
}

//=========================================================================================
// User and Credential Ports
//=========================================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert_user(&self, user: User, password_hash: &str) -> PortResult<()>;
    async fn get_user(&self, user_id: Uuid) -> PortResult<User>;
    async fn find_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials>;
    async fn find_credentials_by_username(&self, username: &str) -> PortResult<UserCredentials>;
    async fn update_last_login(&self, user_id: Uuid, at: DateTime<Utc>) -> PortResult<()>;

    // --- Auth Sessions ---
    async fn create_auth_session(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;
    /// Returns the owning user of an unexpired session, `Unauthorized` otherwise.
    async fn validate_auth_session(&self, token: &str) -> PortResult<Uuid>;
    async fn delete_auth_session(&self, token: &str) -> PortResult<()>;
}

/// Password hashing, kept outside the core so the algorithm can be swapped.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, password: &str) -> PortResult<String>;
    fn verify(&self, password: &str, hash: &str) -> PortResult<bool>;
}

//=========================================================================================
// Reading Ports
//=========================================================================================

#[async_trait]
pub trait ReadingRepository: Send + Sync {
    async fn insert_reading(&self, reading: Reading) -> PortResult<()>;
    async fn get_reading(&self, id: Uuid) -> PortResult<Reading>;
    async fn reading_exists_for_user(&self, user_id: Uuid, document_id: Uuid) -> PortResult<bool>;
    /// Filtered, sorted window. Ties on the sort key are broken by id.
    async fn find_readings(&self, query: &ReadingQuery) -> PortResult<Page<Reading>>;
    /// Overwrites the scalar fields of a reading, leaving its records untouched.
    async fn update_reading_fields(&self, reading: &Reading) -> PortResult<()>;
    async fn delete_reading(&self, id: Uuid) -> PortResult<()>;

    // --- Records embedded in a reading ---

    /// Appends under the (reading id, user id) filter. `NotFound` if it matches nothing.
    async fn push_record(&self, reading_id: Uuid, user_id: Uuid, record: Record) -> PortResult<()>;
    /// Overwrites progress and notes of the record with `record_id`. When `owner`
    /// is set it is folded into the parent filter. `NotFound` if nothing matches.
    async fn set_record(
        &self,
        reading_id: Uuid,
        owner: Option<Uuid>,
        record_id: Uuid,
        progress: &str,
        notes: &str,
        at: DateTime<Utc>,
    ) -> PortResult<()>;
    /// Removes the record with `record_id`. `NotFound` if the reading does not match
    /// the (reading id, user id) filter or holds no such record.
    async fn pull_record(&self, reading_id: Uuid, user_id: Uuid, record_id: Uuid) -> PortResult<()>;
}

/// Reading lists embedded in their owning user.
#[async_trait]
pub trait ReadingListRepository: Send + Sync {
    async fn list_reading_lists(&self, user_id: Uuid) -> PortResult<Vec<ReadingList>>;
    async fn push_reading_list(&self, user_id: Uuid, list: ReadingList) -> PortResult<()>;
    /// Set-union into the list's ids. Returns how many ids were actually added.
    async fn add_reading_ids(
        &self,
        user_id: Uuid,
        list_id: Uuid,
        reading_ids: &[Uuid],
        at: DateTime<Utc>,
    ) -> PortResult<usize>;
    /// Returns how many ids were actually removed.
    async fn remove_reading_ids(
        &self,
        user_id: Uuid,
        list_id: Uuid,
        reading_ids: &[Uuid],
        at: DateTime<Utc>,
    ) -> PortResult<usize>;
    /// Drops `reading_id` from every list the user owns.
    async fn purge_reading_id(&self, user_id: Uuid, reading_id: Uuid) -> PortResult<()>;
    async fn rename_reading_list(
        &self,
        user_id: Uuid,
        list_id: Uuid,
        name: &str,
        description: &str,
        at: DateTime<Utc>,
    ) -> PortResult<()>;
    async fn pull_reading_list(&self, user_id: Uuid, list_id: Uuid) -> PortResult<()>;
}
