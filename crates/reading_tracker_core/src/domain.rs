//! crates/reading_tracker_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::ports::PortError;

//=========================================================================================
// Catalog Documents
//=========================================================================================

/// A book in the shared catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub id: Uuid,
    pub name: String,
    pub author: String,
    pub isbn: String,
    pub edition: String,
    pub pages: i32,
    pub language: String,
    pub publisher: String,
    pub description: String,
    pub genres: Vec<String>,
    pub cover_image_url: String,
    pub publication_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A manga series volume in the shared catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Manga {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub volume: i32,
    pub chapters: i32,
    pub demography: String,
    pub genres: Vec<String>,
    pub publisher: String,
    pub description: String,
    pub cover_image_url: String,
    pub publication_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A document authored by a user. Only reachable through its owner.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomDocument {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub description: String,
    pub url: String,
    pub tags: Vec<String>,
    pub category: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating or replacing a book.
#[derive(Debug, Clone, Default)]
pub struct BookInsert {
    pub name: String,
    pub author: String,
    pub isbn: String,
    pub edition: String,
    pub pages: i32,
    pub language: String,
    pub publisher: String,
    pub description: String,
    pub genres: Vec<String>,
    pub cover_image_url: String,
    pub publication_date: Option<DateTime<Utc>>,
}

/// Fields accepted when creating or replacing a manga.
#[derive(Debug, Clone, Default)]
pub struct MangaInsert {
    pub title: String,
    pub author: String,
    pub volume: i32,
    pub chapters: i32,
    pub demography: String,
    pub genres: Vec<String>,
    pub publisher: String,
    pub description: String,
    pub cover_image_url: String,
    pub publication_date: Option<DateTime<Utc>>,
}

/// Catalog lookups over books. Text comparisons ignore case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookFilter {
    /// Name starts with the given text.
    NamePrefix(String),
    /// Author contains the given text.
    Author(String),
    /// One of the genres equals the given text.
    Genre(String),
    /// Exact ISBN.
    Isbn(String),
}

impl BookFilter {
    pub fn matches(&self, book: &Book) -> bool {
        match self {
            BookFilter::NamePrefix(prefix) => {
                book.name.to_lowercase().starts_with(&prefix.to_lowercase())
            }
            BookFilter::Author(author) => {
                book.author.to_lowercase().contains(&author.to_lowercase())
            }
            BookFilter::Genre(genre) => {
                let genre = genre.to_lowercase();
                book.genres.iter().any(|g| g.to_lowercase() == genre)
            }
            BookFilter::Isbn(isbn) => book.isbn == *isbn,
        }
    }
}

/// Catalog lookups over manga. Text comparisons ignore case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MangaFilter {
    /// Title starts with the given text.
    TitlePrefix(String),
    /// Author contains the given text.
    Author(String),
    /// One of the genres equals the given text.
    Genre(String),
    /// Target demography, e.g. "seinen".
    Demography(String),
}

impl MangaFilter {
    pub fn matches(&self, manga: &Manga) -> bool {
        match self {
            MangaFilter::TitlePrefix(prefix) => {
                manga.title.to_lowercase().starts_with(&prefix.to_lowercase())
            }
            MangaFilter::Author(author) => {
                manga.author.to_lowercase().contains(&author.to_lowercase())
            }
            MangaFilter::Genre(genre) => {
                let genre = genre.to_lowercase();
                manga.genres.iter().any(|g| g.to_lowercase() == genre)
            }
            MangaFilter::Demography(demography) => {
                manga.demography.to_lowercase() == demography.to_lowercase()
            }
        }
    }
}

/// Fields accepted when creating a custom document.
#[derive(Debug, Clone, Default)]
pub struct CustomDocumentInsert {
    pub title: String,
    pub author: String,
    pub description: String,
    pub url: String,
    pub tags: Vec<String>,
    pub category: String,
    pub status: String,
}

/// A partial update of a custom document; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct CustomDocumentPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub category: Option<String>,
    pub status: Option<String>,
}

impl CustomDocumentPatch {
    /// Applies the provided fields to `doc` and bumps its update timestamp.
    pub fn apply(&self, doc: &mut CustomDocument, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            doc.title = title.clone();
        }
        if let Some(author) = &self.author {
            doc.author = author.clone();
        }
        if let Some(description) = &self.description {
            doc.description = description.clone();
        }
        if let Some(url) = &self.url {
            doc.url = url.clone();
        }
        if let Some(tags) = &self.tags {
            doc.tags = tags.clone();
        }
        if let Some(category) = &self.category {
            doc.category = category.clone();
        }
        if let Some(status) = &self.status {
            doc.status = status.clone();
        }
        doc.updated_at = now;
    }
}

//=========================================================================================
// Users and Credentials
//=========================================================================================

// Represents a user - used throughout app
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// The data needed to register a new account. The password is still in clear text.
#[derive(Debug, Clone)]
pub struct Signup {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// A bearer token handed back after signup or login.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthToken {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

//=========================================================================================
// Readings and Records
//=========================================================================================

/// The kind of document a reading points at. Each kind lives in its own scope,
/// so a document id is only meaningful together with its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadingType {
    Book,
    Manga,
    CustomDocument,
}

impl ReadingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingType::Book => "book",
            ReadingType::Manga => "manga",
            ReadingType::CustomDocument => "custom_document",
        }
    }
}

impl fmt::Display for ReadingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadingType {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "book" => Ok(ReadingType::Book),
            "manga" => Ok(ReadingType::Manga),
            "custom_document" => Ok(ReadingType::CustomDocument),
            _ => Err(PortError::InvalidArgument("invalid reading type".to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadingStatus {
    Ongoing,
    Paused,
    Completed,
}

impl ReadingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::Ongoing => "ongoing",
            ReadingStatus::Paused => "paused",
            ReadingStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadingStatus {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ongoing" => Ok(ReadingStatus::Ongoing),
            "paused" => Ok(ReadingStatus::Paused),
            "completed" => Ok(ReadingStatus::Completed),
            _ => Err(PortError::InvalidArgument(format!(
                "invalid reading status '{}'",
                s
            ))),
        }
    }
}

/// A single timestamped progress entry. Has no identity outside its reading.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: Uuid,
    pub progress: String,
    pub notes: String,
    pub recorded_at: DateTime<Utc>,
}

/// A user's engagement with one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub id: Uuid,
    pub user_id: Uuid,
    pub document_id: Uuid,
    pub reading_type: ReadingType,
    /// Display name of the document. Reads refresh it from the live document and
    /// keep this stored value once the document is gone.
    pub document_name: String,
    pub status: ReadingStatus,
    pub notes: String,
    pub records: Vec<Record>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set to `created_at` on creation and bumped when a record is added or edited.
    pub last_record_update: DateTime<Utc>,
}

/// Fields accepted when starting or updating a reading.
#[derive(Debug, Clone)]
pub struct ReadingInsert {
    pub document_id: Uuid,
    pub reading_type: ReadingType,
    pub status: ReadingStatus,
    pub notes: String,
}

#[derive(Debug, Clone, Default)]
pub struct RecordInsert {
    pub progress: String,
    pub notes: String,
}

//=========================================================================================
// Reading Lists
//=========================================================================================

/// A named, user-owned set of reading references.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingList {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub reading_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ReadingListInsert {
    pub name: String,
    pub description: String,
}

/// Outcome of adding or removing ids from a list's id set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListChange {
    /// This many ids were added or removed.
    Changed(usize),
    /// The list matched but its id set was left as it was.
    Unchanged,
}

impl ListChange {
    pub fn from_count(count: usize) -> Self {
        if count == 0 {
            ListChange::Unchanged
        } else {
            ListChange::Changed(count)
        }
    }
}

//=========================================================================================
// Queries and Pagination
//=========================================================================================

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

/// A 1-indexed page request. No upper bound is placed on `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
    pub ascending: bool,
}

impl PageRequest {
    /// Builds a page request, replacing absent or non-positive values with the defaults.
    pub fn new(page: Option<i64>, limit: Option<i64>, ascending: bool) -> Self {
        let page = page.filter(|p| *p > 0).map(|p| p as u64).unwrap_or(DEFAULT_PAGE);
        let limit = limit.filter(|l| *l > 0).map(|l| l as u64).unwrap_or(DEFAULT_LIMIT);
        Self {
            page,
            limit,
            ascending,
        }
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None, true)
    }
}

/// The timestamp a reading query is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingSort {
    CreatedAt,
    UpdatedAt,
    LastRecordUpdate,
}

impl ReadingSort {
    pub fn column(&self) -> &'static str {
        match self {
            ReadingSort::CreatedAt => "created_at",
            ReadingSort::UpdatedAt => "updated_at",
            ReadingSort::LastRecordUpdate => "last_record_update",
        }
    }

    pub fn key(&self, reading: &Reading) -> DateTime<Utc> {
        match self {
            ReadingSort::CreatedAt => reading.created_at,
            ReadingSort::UpdatedAt => reading.updated_at,
            ReadingSort::LastRecordUpdate => reading.last_record_update,
        }
    }
}

impl FromStr for ReadingSort {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(ReadingSort::CreatedAt),
            "updated_at" => Ok(ReadingSort::UpdatedAt),
            "last_record_update" => Ok(ReadingSort::LastRecordUpdate),
            _ => Err(PortError::InvalidArgument(format!("invalid sort field '{}'", s))),
        }
    }
}

/// Filter, order and window for listing one user's readings.
#[derive(Debug, Clone)]
pub struct ReadingQuery {
    pub user_id: Uuid,
    pub reading_type: Option<ReadingType>,
    pub status: Option<ReadingStatus>,
    pub sort: ReadingSort,
    pub page: PageRequest,
}

impl ReadingQuery {
    pub fn matches(&self, reading: &Reading) -> bool {
        reading.user_id == self.user_id
            && self.reading_type.map_or(true, |t| reading.reading_type == t)
            && self.status.map_or(true, |s| reading.status == s)
    }
}

/// One window of a larger result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_falls_back_to_defaults() {
        let page = PageRequest::new(Some(0), Some(-4), true);
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 10);
        assert_eq!(page.skip(), 0);

        let page = PageRequest::new(Some(3), Some(25), false);
        assert_eq!(page.skip(), 50);
    }

    #[test]
    fn catalog_filters_ignore_case() {
        let now = Utc::now();
        let book = Book {
            id: Uuid::new_v4(),
            name: "Dune Messiah".to_string(),
            author: "Frank Herbert".to_string(),
            isbn: "978-0593098233".to_string(),
            edition: String::new(),
            pages: 256,
            language: "en".to_string(),
            publisher: String::new(),
            description: String::new(),
            genres: vec!["Science Fiction".to_string()],
            cover_image_url: String::new(),
            publication_date: None,
            created_at: now,
            updated_at: now,
        };
        assert!(BookFilter::NamePrefix("dune".to_string()).matches(&book));
        assert!(!BookFilter::NamePrefix("messiah".to_string()).matches(&book));
        assert!(BookFilter::Author("herb".to_string()).matches(&book));
        assert!(BookFilter::Genre("science fiction".to_string()).matches(&book));
        assert!(!BookFilter::Genre("science".to_string()).matches(&book));
        assert!(BookFilter::Isbn("978-0593098233".to_string()).matches(&book));
    }

    #[test]
    fn unknown_reading_type_is_invalid_argument() {
        assert_eq!("manga".parse::<ReadingType>().unwrap(), ReadingType::Manga);
        let err = "article".parse::<ReadingType>().unwrap_err();
        assert!(matches!(err, PortError::InvalidArgument(_)));
    }
}
