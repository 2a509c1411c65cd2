//! services/api/src/adapters/db.rs
//!
//! The PostgreSQL adapter, the concrete implementation of every persistence port
//! from the core crate. It handles all interactions with the database using `sqlx`.
//!
//! Embedded arrays are stored as JSONB columns: the records of a reading live in
//! `readings.records`, custom documents and reading lists in `users`. Element
//! mutations are written as one `UPDATE` filtered on the parent and on an element
//! predicate, so a concurrent writer never sees or overwrites a half-applied change.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reading_tracker_core::domain::{
    Book, BookFilter, CustomDocument, CustomDocumentPatch, Manga, MangaFilter, Page, PageRequest,
    Reading, ReadingList, ReadingQuery, ReadingStatus, ReadingType, Record, User,
    UserCredentials,
};
use reading_tracker_core::ports::{
    BookRepository, CustomDocumentRepository, MangaRepository, PortError, PortResult,
    ReadingListRepository, ReadingRepository, UserRepository,
};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements all repository ports on one connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// Locks the user's row, hands its reading lists to `f` and writes them back
    /// in the same transaction.
    async fn with_locked_lists<T, F>(&self, user_id: Uuid, f: F) -> PortResult<T>
    where
        F: FnOnce(&mut Vec<ReadingListDoc>) -> PortResult<T> + Send,
        T: Send,
    {
        let mut tx = self.pool.begin().await.map_err(storage)?;
        let Json(mut lists) = sqlx::query_scalar::<_, Json<Vec<ReadingListDoc>>>(
            "SELECT reading_lists FROM users WHERE id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage)?
        .ok_or_else(|| user_not_found(user_id))?;

        let outcome = f(&mut lists)?;

        sqlx::query("UPDATE users SET reading_lists = $2, updated_at = now() WHERE id = $1")
            .bind(user_id)
            .bind(Json(&lists))
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        tx.commit().await.map_err(storage)?;
        Ok(outcome)
    }
}

/// Maps a driver error onto the port error kinds. Unique violations surface as
/// `Duplicate`; everything else is a storage failure.
fn storage(e: sqlx::Error) -> PortError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            PortError::Duplicate(db.message().to_string())
        }
        _ => PortError::Storage(e.to_string()),
    }
}

fn user_not_found(user_id: Uuid) -> PortError {
    PortError::NotFound(format!("User {} not found", user_id))
}

fn reading_not_found(reading_id: Uuid) -> PortError {
    PortError::NotFound(format!("Reading {} not found", reading_id))
}

fn sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn direction(ascending: bool) -> &'static str {
    if ascending {
        "ASC"
    } else {
        "DESC"
    }
}

/// Escapes the `LIKE` wildcards so user input only ever matches literally.
fn like_escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// The `WHERE` predicate for a book lookup and the value bound to `$1`.
fn book_predicate(filter: &BookFilter) -> (&'static str, String) {
    match filter {
        BookFilter::NamePrefix(prefix) => ("name ILIKE $1", format!("{}%", like_escape(prefix))),
        BookFilter::Author(author) => ("author ILIKE $1", format!("%{}%", like_escape(author))),
        BookFilter::Genre(genre) => (
            "EXISTS (SELECT 1 FROM unnest(genres) AS g WHERE lower(g) = lower($1))",
            genre.clone(),
        ),
        BookFilter::Isbn(isbn) => ("isbn = $1", isbn.clone()),
    }
}

fn manga_predicate(filter: &MangaFilter) -> (&'static str, String) {
    match filter {
        MangaFilter::TitlePrefix(prefix) => ("title ILIKE $1", format!("{}%", like_escape(prefix))),
        MangaFilter::Author(author) => ("author ILIKE $1", format!("%{}%", like_escape(author))),
        MangaFilter::Genre(genre) => (
            "EXISTS (SELECT 1 FROM unnest(genres) AS g WHERE lower(g) = lower($1))",
            genre.clone(),
        ),
        MangaFilter::Demography(demography) => {
            ("lower(demography) = lower($1)", demography.clone())
        }
    }
}

fn page_of<R, T>(rows: Vec<R>, total: i64, page: PageRequest, f: impl FnMut(R) -> T) -> Page<T> {
    Page {
        items: rows.into_iter().map(f).collect(),
        total: total.max(0) as u64,
        page: page.page,
        limit: page.limit,
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct BookRow {
    id: Uuid,
    name: String,
    author: String,
    isbn: String,
    edition: String,
    pages: i32,
    language: String,
    publisher: String,
    description: String,
    genres: Vec<String>,
    cover_image_url: String,
    publication_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl BookRow {
    fn to_domain(self) -> Book {
        Book {
            id: self.id,
            name: self.name,
            author: self.author,
            isbn: self.isbn,
            edition: self.edition,
            pages: self.pages,
            language: self.language,
            publisher: self.publisher,
            description: self.description,
            genres: self.genres,
            cover_image_url: self.cover_image_url,
            publication_date: self.publication_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct MangaRow {
    id: Uuid,
    title: String,
    author: String,
    volume: i32,
    chapters: i32,
    demography: String,
    genres: Vec<String>,
    publisher: String,
    description: String,
    cover_image_url: String,
    publication_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl MangaRow {
    fn to_domain(self) -> Manga {
        Manga {
            id: self.id,
            title: self.title,
            author: self.author,
            volume: self.volume,
            chapters: self.chapters,
            demography: self.demography,
            genres: self.genres,
            publisher: self.publisher,
            description: self.description,
            cover_image_url: self.cover_image_url,
            publication_date: self.publication_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    last_login: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}
impl UserRow {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            last_login: self.last_login,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}
impl CredentialsRow {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user: self.user.to_domain(),
            password_hash: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct ReadingRow {
    id: Uuid,
    user_id: Uuid,
    document_id: Uuid,
    reading_type: String,
    document_name: String,
    status: String,
    notes: String,
    records: Json<Vec<RecordDoc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_record_update: DateTime<Utc>,
}
impl ReadingRow {
    fn to_domain(self) -> PortResult<Reading> {
        let corrupt = |e: PortError| PortError::Storage(format!("reading {}: {}", self.id, e));
        let reading_type = self.reading_type.parse::<ReadingType>().map_err(corrupt)?;
        let status = self.status.parse::<ReadingStatus>().map_err(corrupt)?;
        Ok(Reading {
            id: self.id,
            user_id: self.user_id,
            document_id: self.document_id,
            reading_type,
            document_name: self.document_name,
            status,
            notes: self.notes,
            records: self.records.0.into_iter().map(RecordDoc::to_domain).collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_record_update: self.last_record_update,
        })
    }
}

const READING_COLUMNS: &str = "id, user_id, document_id, reading_type, document_name, status, \
     notes, records, created_at, updated_at, last_record_update";

//=========================================================================================
// Embedded JSONB Documents
//=========================================================================================

#[derive(Serialize, Deserialize)]
struct RecordDoc {
    id: Uuid,
    progress: String,
    notes: String,
    recorded_at: DateTime<Utc>,
}
impl RecordDoc {
    fn from_domain(record: Record) -> Self {
        Self {
            id: record.id,
            progress: record.progress,
            notes: record.notes,
            recorded_at: record.recorded_at,
        }
    }

    fn to_domain(self) -> Record {
        Record {
            id: self.id,
            progress: self.progress,
            notes: self.notes,
            recorded_at: self.recorded_at,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct CustomDocumentDoc {
    id: Uuid,
    title: String,
    author: String,
    description: String,
    url: String,
    tags: Vec<String>,
    category: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl CustomDocumentDoc {
    fn from_domain(doc: CustomDocument) -> Self {
        Self {
            id: doc.id,
            title: doc.title,
            author: doc.author,
            description: doc.description,
            url: doc.url,
            tags: doc.tags,
            category: doc.category,
            status: doc.status,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }

    fn to_domain(self) -> CustomDocument {
        CustomDocument {
            id: self.id,
            title: self.title,
            author: self.author,
            description: self.description,
            url: self.url,
            tags: self.tags,
            category: self.category,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Only the provided fields are serialized, so merging it into the stored
/// element with `||` leaves the others alone.
#[derive(Serialize)]
struct CustomDocumentPatchDoc<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'a str>,
    updated_at: DateTime<Utc>,
}
impl<'a> CustomDocumentPatchDoc<'a> {
    fn new(patch: &'a CustomDocumentPatch, at: DateTime<Utc>) -> Self {
        Self {
            title: patch.title.as_deref(),
            author: patch.author.as_deref(),
            description: patch.description.as_deref(),
            url: patch.url.as_deref(),
            tags: patch.tags.as_deref(),
            category: patch.category.as_deref(),
            status: patch.status.as_deref(),
            updated_at: at,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ReadingListDoc {
    id: Uuid,
    name: String,
    description: String,
    reading_ids: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl ReadingListDoc {
    fn from_domain(list: ReadingList) -> Self {
        Self {
            id: list.id,
            name: list.name,
            description: list.description,
            reading_ids: list.reading_ids,
            created_at: list.created_at,
            updated_at: list.updated_at,
        }
    }

    fn to_domain(self) -> ReadingList {
        ReadingList {
            id: self.id,
            name: self.name,
            description: self.description,
            reading_ids: self.reading_ids,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn list_mut(lists: &mut [ReadingListDoc], list_id: Uuid) -> PortResult<&mut ReadingListDoc> {
    lists
        .iter_mut()
        .find(|l| l.id == list_id)
        .ok_or_else(|| PortError::NotFound(format!("Reading list {} not found", list_id)))
}

//=========================================================================================
// Catalog Ports
//=========================================================================================

#[async_trait]
impl BookRepository for PgStore {
    async fn insert_book(&self, book: Book) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO books (id, name, author, isbn, edition, pages, language, publisher, \
             description, genres, cover_image_url, publication_date, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(book.id)
        .bind(book.name)
        .bind(book.author)
        .bind(book.isbn)
        .bind(book.edition)
        .bind(book.pages)
        .bind(book.language)
        .bind(book.publisher)
        .bind(book.description)
        .bind(book.genres)
        .bind(book.cover_image_url)
        .bind(book.publication_date)
        .bind(book.created_at)
        .bind(book.updated_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn get_book(&self, id: Uuid) -> PortResult<Book> {
        sqlx::query_as::<_, BookRow>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?
            .map(BookRow::to_domain)
            .ok_or_else(|| PortError::NotFound(format!("Book {} not found", id)))
    }

    async fn list_books(&self, page: PageRequest) -> PortResult<Page<Book>> {
        let dir = direction(page.ascending);
        let sql = format!(
            "SELECT * FROM books ORDER BY name {dir}, author {dir}, id {dir} LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, BookRow>(&sql)
            .bind(sql_int(page.limit))
            .bind(sql_int(page.skip()))
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await
            .map_err(storage)?;
        Ok(page_of(rows, total, page, BookRow::to_domain))
    }

    async fn find_books_by(&self, filter: &BookFilter, page: PageRequest) -> PortResult<Page<Book>> {
        let (predicate, value) = book_predicate(filter);
        let dir = direction(page.ascending);
        let sql = format!(
            "SELECT * FROM books WHERE {predicate} \
             ORDER BY name {dir}, author {dir}, id {dir} LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, BookRow>(&sql)
            .bind(&value)
            .bind(sql_int(page.limit))
            .bind(sql_int(page.skip()))
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
        let count_sql = format!("SELECT COUNT(*) FROM books WHERE {predicate}");
        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(&value)
            .fetch_one(&self.pool)
            .await
            .map_err(storage)?;
        Ok(page_of(rows, total, page, BookRow::to_domain))
    }

    async fn replace_book(&self, book: Book) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE books SET name = $2, author = $3, isbn = $4, edition = $5, pages = $6, \
             language = $7, publisher = $8, description = $9, genres = $10, \
             cover_image_url = $11, publication_date = $12, updated_at = $13 WHERE id = $1",
        )
        .bind(book.id)
        .bind(book.name)
        .bind(book.author)
        .bind(book.isbn)
        .bind(book.edition)
        .bind(book.pages)
        .bind(book.language)
        .bind(book.publisher)
        .bind(book.description)
        .bind(book.genres)
        .bind(book.cover_image_url)
        .bind(book.publication_date)
        .bind(book.updated_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Book {} not found", book.id)));
        }
        Ok(())
    }

    async fn delete_book(&self, id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Book {} not found", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl MangaRepository for PgStore {
    async fn insert_manga(&self, manga: Manga) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO manga (id, title, author, volume, chapters, demography, genres, \
             publisher, description, cover_image_url, publication_date, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(manga.id)
        .bind(manga.title)
        .bind(manga.author)
        .bind(manga.volume)
        .bind(manga.chapters)
        .bind(manga.demography)
        .bind(manga.genres)
        .bind(manga.publisher)
        .bind(manga.description)
        .bind(manga.cover_image_url)
        .bind(manga.publication_date)
        .bind(manga.created_at)
        .bind(manga.updated_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn get_manga(&self, id: Uuid) -> PortResult<Manga> {
        sqlx::query_as::<_, MangaRow>("SELECT * FROM manga WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?
            .map(MangaRow::to_domain)
            .ok_or_else(|| PortError::NotFound(format!("Manga {} not found", id)))
    }

    async fn list_manga(&self, page: PageRequest) -> PortResult<Page<Manga>> {
        let dir = direction(page.ascending);
        let sql = format!(
            "SELECT * FROM manga ORDER BY title {dir}, author {dir}, id {dir} LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, MangaRow>(&sql)
            .bind(sql_int(page.limit))
            .bind(sql_int(page.skip()))
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM manga")
            .fetch_one(&self.pool)
            .await
            .map_err(storage)?;
        Ok(page_of(rows, total, page, MangaRow::to_domain))
    }

    async fn find_manga_by(
        &self,
        filter: &MangaFilter,
        page: PageRequest,
    ) -> PortResult<Page<Manga>> {
        let (predicate, value) = manga_predicate(filter);
        let dir = direction(page.ascending);
        let sql = format!(
            "SELECT * FROM manga WHERE {predicate} \
             ORDER BY title {dir}, author {dir}, id {dir} LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, MangaRow>(&sql)
            .bind(&value)
            .bind(sql_int(page.limit))
            .bind(sql_int(page.skip()))
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
        let count_sql = format!("SELECT COUNT(*) FROM manga WHERE {predicate}");
        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(&value)
            .fetch_one(&self.pool)
            .await
            .map_err(storage)?;
        Ok(page_of(rows, total, page, MangaRow::to_domain))
    }

    async fn replace_manga(&self, manga: Manga) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE manga SET title = $2, author = $3, volume = $4, chapters = $5, \
             demography = $6, genres = $7, publisher = $8, description = $9, \
             cover_image_url = $10, publication_date = $11, updated_at = $12 WHERE id = $1",
        )
        .bind(manga.id)
        .bind(manga.title)
        .bind(manga.author)
        .bind(manga.volume)
        .bind(manga.chapters)
        .bind(manga.demography)
        .bind(manga.genres)
        .bind(manga.publisher)
        .bind(manga.description)
        .bind(manga.cover_image_url)
        .bind(manga.publication_date)
        .bind(manga.updated_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Manga {} not found", manga.id)));
        }
        Ok(())
    }

    async fn delete_manga(&self, id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM manga WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Manga {} not found", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl CustomDocumentRepository for PgStore {
    async fn list_custom_documents(&self, user_id: Uuid) -> PortResult<Vec<CustomDocument>> {
        let Json(docs) = sqlx::query_scalar::<_, Json<Vec<CustomDocumentDoc>>>(
            "SELECT custom_documents FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?
        .ok_or_else(|| user_not_found(user_id))?;
        Ok(docs.into_iter().map(CustomDocumentDoc::to_domain).collect())
    }

    async fn get_custom_document(
        &self,
        user_id: Uuid,
        document_id: Uuid,
    ) -> PortResult<CustomDocument> {
        sqlx::query_scalar::<_, Json<CustomDocumentDoc>>(
            "SELECT elem FROM users u \
             CROSS JOIN LATERAL jsonb_array_elements(u.custom_documents) AS elem \
             WHERE u.id = $1 AND elem->>'id' = $2",
        )
        .bind(user_id)
        .bind(document_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?
        .map(|Json(doc)| doc.to_domain())
        .ok_or_else(|| PortError::NotFound(format!("Custom document {} not found", document_id)))
    }

    async fn push_custom_document(
        &self,
        user_id: Uuid,
        document: CustomDocument,
    ) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE users SET custom_documents = custom_documents || $2::jsonb, \
             updated_at = now() WHERE id = $1",
        )
        .bind(user_id)
        .bind(Json(vec![CustomDocumentDoc::from_domain(document)]))
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        if result.rows_affected() == 0 {
            return Err(user_not_found(user_id));
        }
        Ok(())
    }

    async fn patch_custom_document(
        &self,
        user_id: Uuid,
        document_id: Uuid,
        patch: CustomDocumentPatch,
        at: DateTime<Utc>,
    ) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE users SET custom_documents = ( \
                 SELECT jsonb_agg(CASE WHEN elem->>'id' = $2 THEN elem || $3::jsonb ELSE elem END \
                                  ORDER BY pos) \
                 FROM jsonb_array_elements(custom_documents) WITH ORDINALITY AS t(elem, pos) \
             ), updated_at = $4 \
             WHERE id = $1 \
               AND custom_documents @> jsonb_build_array(jsonb_build_object('id', $2::text))",
        )
        .bind(user_id)
        .bind(document_id.to_string())
        .bind(Json(CustomDocumentPatchDoc::new(&patch, at)))
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Custom document {} not found",
                document_id
            )));
        }
        Ok(())
    }

    async fn pull_custom_document(&self, user_id: Uuid, document_id: Uuid) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE users SET custom_documents = COALESCE(( \
                 SELECT jsonb_agg(elem ORDER BY pos) \
                 FROM jsonb_array_elements(custom_documents) WITH ORDINALITY AS t(elem, pos) \
                 WHERE elem->>'id' <> $2 \
             ), '[]'::jsonb), updated_at = now() \
             WHERE id = $1 \
               AND custom_documents @> jsonb_build_array(jsonb_build_object('id', $2::text))",
        )
        .bind(user_id)
        .bind(document_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Custom document {} not found",
                document_id
            )));
        }
        Ok(())
    }
}

//=========================================================================================
// User and Credential Ports
//=========================================================================================

#[async_trait]
impl UserRepository for PgStore {
    async fn insert_user(&self, user: User, password_hash: &str) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, last_login, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $6)",
        )
        .bind(user.id)
        .bind(user.username)
        .bind(user.email)
        .bind(password_hash)
        .bind(user.last_login)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, last_login, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?
        .map(UserRow::to_domain)
        .ok_or_else(|| user_not_found(user_id))
    }

    async fn find_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        sqlx::query_as::<_, CredentialsRow>(
            "SELECT id, username, email, last_login, created_at, password_hash \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?
        .map(CredentialsRow::to_domain)
        .ok_or_else(|| PortError::NotFound(format!("User with email {} not found", email)))
    }

    async fn find_credentials_by_username(&self, username: &str) -> PortResult<UserCredentials> {
        sqlx::query_as::<_, CredentialsRow>(
            "SELECT id, username, email, last_login, created_at, password_hash \
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?
        .map(CredentialsRow::to_domain)
        .ok_or_else(|| PortError::NotFound(format!("User with username {} not found", username)))
    }

    async fn update_last_login(&self, user_id: Uuid, at: DateTime<Utc>) -> PortResult<()> {
        let result = sqlx::query("UPDATE users SET last_login = $2 WHERE id = $1")
            .bind(user_id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        if result.rows_affected() == 0 {
            return Err(user_not_found(user_id));
        }
        Ok(())
    }

    async fn create_auth_session(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(token)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(())
    }

    async fn validate_auth_session(&self, token: &str) -> PortResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?
        .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, token: &str) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        if result.rows_affected() == 0 {
            return Err(PortError::Unauthorized);
        }
        Ok(())
    }
}

//=========================================================================================
// Reading Ports
//=========================================================================================

#[async_trait]
impl ReadingRepository for PgStore {
    async fn insert_reading(&self, reading: Reading) -> PortResult<()> {
        let records: Vec<RecordDoc> = reading.records.into_iter().map(RecordDoc::from_domain).collect();
        sqlx::query(
            "INSERT INTO readings (id, user_id, document_id, reading_type, document_name, status, \
             notes, records, created_at, updated_at, last_record_update) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(reading.id)
        .bind(reading.user_id)
        .bind(reading.document_id)
        .bind(reading.reading_type.as_str())
        .bind(reading.document_name)
        .bind(reading.status.as_str())
        .bind(reading.notes)
        .bind(Json(records))
        .bind(reading.created_at)
        .bind(reading.updated_at)
        .bind(reading.last_record_update)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn get_reading(&self, id: Uuid) -> PortResult<Reading> {
        let sql = format!("SELECT {READING_COLUMNS} FROM readings WHERE id = $1");
        sqlx::query_as::<_, ReadingRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?
            .ok_or_else(|| reading_not_found(id))?
            .to_domain()
    }

    async fn reading_exists_for_user(&self, user_id: Uuid, document_id: Uuid) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM readings WHERE user_id = $1 AND document_id = $2)",
        )
        .bind(user_id)
        .bind(document_id)
        .fetch_one(&self.pool)
        .await
        .map_err(storage)
    }

    async fn find_readings(&self, query: &ReadingQuery) -> PortResult<Page<Reading>> {
        const FILTER: &str = "user_id = $1 \
             AND ($2::text IS NULL OR reading_type = $2) \
             AND ($3::text IS NULL OR status = $3)";
        let dir = direction(query.page.ascending);
        let sql = format!(
            "SELECT {READING_COLUMNS} FROM readings WHERE {FILTER} \
             ORDER BY {col} {dir}, id {dir} LIMIT $4 OFFSET $5",
            col = query.sort.column(),
        );
        let reading_type = query.reading_type.map(|t| t.as_str());
        let status = query.status.map(|s| s.as_str());

        let rows = sqlx::query_as::<_, ReadingRow>(&sql)
            .bind(query.user_id)
            .bind(reading_type)
            .bind(status)
            .bind(sql_int(query.page.limit))
            .bind(sql_int(query.page.skip()))
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM readings WHERE {FILTER}"
        ))
        .bind(query.user_id)
        .bind(reading_type)
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(storage)?;

        let items = rows
            .into_iter()
            .map(ReadingRow::to_domain)
            .collect::<PortResult<Vec<_>>>()?;
        Ok(page_of(items, total, query.page, |r| r))
    }

    async fn update_reading_fields(&self, reading: &Reading) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE readings SET document_id = $2, reading_type = $3, document_name = $4, \
             status = $5, notes = $6, updated_at = $7 WHERE id = $1",
        )
        .bind(reading.id)
        .bind(reading.document_id)
        .bind(reading.reading_type.as_str())
        .bind(&reading.document_name)
        .bind(reading.status.as_str())
        .bind(&reading.notes)
        .bind(reading.updated_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        if result.rows_affected() == 0 {
            return Err(reading_not_found(reading.id));
        }
        Ok(())
    }

    async fn delete_reading(&self, id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM readings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        if result.rows_affected() == 0 {
            return Err(reading_not_found(id));
        }
        Ok(())
    }

    async fn push_record(&self, reading_id: Uuid, user_id: Uuid, record: Record) -> PortResult<()> {
        let recorded_at = record.recorded_at;
        let result = sqlx::query(
            "UPDATE readings SET records = records || $3::jsonb, last_record_update = $4 \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(reading_id)
        .bind(user_id)
        .bind(Json(vec![RecordDoc::from_domain(record)]))
        .bind(recorded_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        if result.rows_affected() == 0 {
            return Err(reading_not_found(reading_id));
        }
        Ok(())
    }

    async fn set_record(
        &self,
        reading_id: Uuid,
        owner: Option<Uuid>,
        record_id: Uuid,
        progress: &str,
        notes: &str,
        at: DateTime<Utc>,
    ) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE readings SET records = ( \
                 SELECT jsonb_agg(CASE WHEN elem->>'id' = $3 \
                                       THEN elem || jsonb_build_object('progress', $4::text, 'notes', $5::text) \
                                       ELSE elem END \
                                  ORDER BY pos) \
                 FROM jsonb_array_elements(records) WITH ORDINALITY AS t(elem, pos) \
             ), last_record_update = $6 \
             WHERE id = $1 AND ($2::uuid IS NULL OR user_id = $2) \
               AND records @> jsonb_build_array(jsonb_build_object('id', $3::text))",
        )
        .bind(reading_id)
        .bind(owner)
        .bind(record_id.to_string())
        .bind(progress)
        .bind(notes)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Record {} not found in reading {}",
                record_id, reading_id
            )));
        }
        Ok(())
    }

    async fn pull_record(&self, reading_id: Uuid, user_id: Uuid, record_id: Uuid) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE readings SET records = COALESCE(( \
                 SELECT jsonb_agg(elem ORDER BY pos) \
                 FROM jsonb_array_elements(records) WITH ORDINALITY AS t(elem, pos) \
                 WHERE elem->>'id' <> $3 \
             ), '[]'::jsonb) \
             WHERE id = $1 AND user_id = $2 \
               AND records @> jsonb_build_array(jsonb_build_object('id', $3::text))",
        )
        .bind(reading_id)
        .bind(user_id)
        .bind(record_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Record {} not found in reading {}",
                record_id, reading_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ReadingListRepository for PgStore {
    async fn list_reading_lists(&self, user_id: Uuid) -> PortResult<Vec<ReadingList>> {
        let Json(lists) = sqlx::query_scalar::<_, Json<Vec<ReadingListDoc>>>(
            "SELECT reading_lists FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?
        .ok_or_else(|| user_not_found(user_id))?;
        Ok(lists.into_iter().map(ReadingListDoc::to_domain).collect())
    }

    async fn push_reading_list(&self, user_id: Uuid, list: ReadingList) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE users SET reading_lists = reading_lists || $2::jsonb, updated_at = now() \
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(Json(vec![ReadingListDoc::from_domain(list)]))
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        if result.rows_affected() == 0 {
            return Err(user_not_found(user_id));
        }
        Ok(())
    }

    async fn add_reading_ids(
        &self,
        user_id: Uuid,
        list_id: Uuid,
        reading_ids: &[Uuid],
        at: DateTime<Utc>,
    ) -> PortResult<usize> {
        self.with_locked_lists(user_id, |lists| {
            let list = list_mut(lists, list_id)?;
            let mut added = 0;
            for id in reading_ids {
                if !list.reading_ids.contains(id) {
                    list.reading_ids.push(*id);
                    added += 1;
                }
            }
            if added > 0 {
                list.updated_at = at;
            }
            Ok(added)
        })
        .await
    }

    async fn remove_reading_ids(
        &self,
        user_id: Uuid,
        list_id: Uuid,
        reading_ids: &[Uuid],
        at: DateTime<Utc>,
    ) -> PortResult<usize> {
        self.with_locked_lists(user_id, |lists| {
            let list = list_mut(lists, list_id)?;
            let before = list.reading_ids.len();
            list.reading_ids.retain(|id| !reading_ids.contains(id));
            let removed = before - list.reading_ids.len();
            if removed > 0 {
                list.updated_at = at;
            }
            Ok(removed)
        })
        .await
    }

    async fn purge_reading_id(&self, user_id: Uuid, reading_id: Uuid) -> PortResult<()> {
        self.with_locked_lists(user_id, |lists| {
            for list in lists.iter_mut() {
                list.reading_ids.retain(|id| *id != reading_id);
            }
            Ok(())
        })
        .await
    }

    async fn rename_reading_list(
        &self,
        user_id: Uuid,
        list_id: Uuid,
        name: &str,
        description: &str,
        at: DateTime<Utc>,
    ) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE users SET reading_lists = ( \
                 SELECT jsonb_agg(CASE WHEN elem->>'id' = $2 \
                                       THEN elem || jsonb_build_object('name', $3::text, \
                                                                       'description', $4::text, \
                                                                       'updated_at', $5::timestamptz) \
                                       ELSE elem END \
                                  ORDER BY pos) \
                 FROM jsonb_array_elements(reading_lists) WITH ORDINALITY AS t(elem, pos) \
             ), updated_at = now() \
             WHERE id = $1 \
               AND reading_lists @> jsonb_build_array(jsonb_build_object('id', $2::text))",
        )
        .bind(user_id)
        .bind(list_id.to_string())
        .bind(name)
        .bind(description)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Reading list {} not found", list_id)));
        }
        Ok(())
    }

    async fn pull_reading_list(&self, user_id: Uuid, list_id: Uuid) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE users SET reading_lists = COALESCE(( \
                 SELECT jsonb_agg(elem ORDER BY pos) \
                 FROM jsonb_array_elements(reading_lists) WITH ORDINALITY AS t(elem, pos) \
                 WHERE elem->>'id' <> $2 \
             ), '[]'::jsonb), updated_at = now() \
             WHERE id = $1 \
               AND reading_lists @> jsonb_build_array(jsonb_build_object('id', $2::text))",
        )
        .bind(user_id)
        .bind(list_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Reading list {} not found", list_id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_doc_serializes_only_provided_fields() {
        let at = Utc::now();
        let patch = CustomDocumentPatch {
            title: Some("Final".to_string()),
            tags: Some(vec!["essay".to_string()]),
            ..Default::default()
        };
        let value = serde_json::to_value(CustomDocumentPatchDoc::new(&patch, at)).unwrap();
        let object = value.as_object().unwrap();
        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["tags", "title", "updated_at"]);
    }

    #[test]
    fn record_ids_are_stored_as_hyphenated_strings() {
        let id = Uuid::new_v4();
        let doc = RecordDoc {
            id,
            progress: "ch.3".to_string(),
            notes: String::new(),
            recorded_at: Utc::now(),
        };
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["id"], serde_json::Value::String(id.to_string()));
    }

    #[test]
    fn lookups_match_wildcards_literally() {
        let (predicate, value) = book_predicate(&BookFilter::NamePrefix("100%_pure".to_string()));
        assert_eq!(predicate, "name ILIKE $1");
        assert_eq!(value, "100\\%\\_pure%");

        let (_, value) = manga_predicate(&MangaFilter::Author("Miura".to_string()));
        assert_eq!(value, "%Miura%");

        let (predicate, value) = book_predicate(&BookFilter::Isbn("978-0441013593".to_string()));
        assert_eq!(predicate, "isbn = $1");
        assert_eq!(value, "978-0441013593");
    }

    #[test]
    fn corrupt_reading_rows_are_storage_errors() {
        let now = Utc::now();
        let row = ReadingRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            reading_type: "scroll".to_string(),
            document_name: "Dune".to_string(),
            status: "ongoing".to_string(),
            notes: String::new(),
            records: Json(Vec::new()),
            created_at: now,
            updated_at: now,
            last_record_update: now,
        };
        assert!(matches!(row.to_domain(), Err(PortError::Storage(_))));
    }
}
