//! services/api/src/web/catalog.rs
//!
//! Book and manga catalog endpoints, plus the custom documents every user keeps
//! for themselves. Catalog reads are public; everything else needs a bearer token.

use axum::{extract::State, Extension};
use chrono::{DateTime, Utc};
use reading_tracker_core::domain::{
    Book, BookFilter, BookInsert, CustomDocument, CustomDocumentInsert, CustomDocumentPatch,
    Manga, MangaFilter, MangaInsert,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::envelope::ApiResponse;
use crate::web::extract::{AppJson, AppPath, AppQuery};
use crate::web::middleware::AuthUser;
use crate::web::paging::{PageParams, PageResponse};
use crate::web::state::AppState;
use crate::web::validate::{self, Validate};

//=========================================================================================
// Books
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct BookRequest {
    pub name: String,
    pub author: String,
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub edition: String,
    #[serde(default)]
    pub pages: i32,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub cover_image_url: String,
    pub publication_date: Option<DateTime<Utc>>,
}

impl Validate for BookRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate::required("name", &self.name)?;
        validate::required("author", &self.author)?;
        validate::non_negative("pages", self.pages)
    }
}

impl From<BookRequest> for BookInsert {
    fn from(req: BookRequest) -> Self {
        Self {
            name: req.name,
            author: req.author,
            isbn: req.isbn,
            edition: req.edition,
            pages: req.pages,
            language: req.language,
            publisher: req.publisher,
            description: req.description,
            genres: req.genres,
            cover_image_url: req.cover_image_url,
            publication_date: req.publication_date,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct BookResponse {
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

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            name: book.name,
            author: book.author,
            isbn: book.isbn,
            edition: book.edition,
            pages: book.pages,
            language: book.language,
            publisher: book.publisher,
            description: book.description,
            genres: book.genres,
            cover_image_url: book.cover_image_url,
            publication_date: book.publication_date,
            created_at: book.created_at,
            updated_at: book.updated_at,
        }
    }
}

/// GET /books - Books sorted by name
#[utoipa::path(
    get,
    path = "/v1/api/books",
    tag = "Catalog",
    params(PageParams),
    responses((status = 200, description = "One page of books", body = [BookResponse]))
)]
pub async fn list_books_handler(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<PageParams>,
) -> Result<ApiResponse<PageResponse<BookResponse>>, ApiError> {
    let page = state.catalog.list_books(params.to_request()).await?;
    Ok(ApiResponse::found(PageResponse::from_page(page, BookResponse::from), "Books"))
}

#[utoipa::path(
    get,
    path = "/v1/api/books/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "Book id")),
    responses(
        (status = 200, description = "The book", body = BookResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book_handler(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<ApiResponse<BookResponse>, ApiError> {
    let book = state.catalog.get_book(id).await?;
    Ok(ApiResponse::found(book.into(), "Book"))
}

async fn find_books(
    state: &AppState,
    filter: BookFilter,
    params: PageParams,
) -> Result<ApiResponse<PageResponse<BookResponse>>, ApiError> {
    let page = state.catalog.find_books(filter, params.to_request()).await?;
    Ok(ApiResponse::found(PageResponse::from_page(page, BookResponse::from), "Books"))
}

/// GET /books/by-name/{name} - Books whose name starts with `name`
#[utoipa::path(
    get,
    path = "/v1/api/books/by-name/{name}",
    tag = "Catalog",
    params(("name" = String, Path, description = "Name prefix, case-insensitive"), PageParams),
    responses((status = 200, description = "One page of matching books", body = [BookResponse]))
)]
pub async fn books_by_name_handler(
    State(state): State<Arc<AppState>>,
    AppPath(name): AppPath<String>,
    AppQuery(params): AppQuery<PageParams>,
) -> Result<ApiResponse<PageResponse<BookResponse>>, ApiError> {
    find_books(&state, BookFilter::NamePrefix(name), params).await
}

#[utoipa::path(
    get,
    path = "/v1/api/books/by-author/{author}",
    tag = "Catalog",
    params(("author" = String, Path, description = "Part of the author's name"), PageParams),
    responses((status = 200, description = "One page of matching books", body = [BookResponse]))
)]
pub async fn books_by_author_handler(
    State(state): State<Arc<AppState>>,
    AppPath(author): AppPath<String>,
    AppQuery(params): AppQuery<PageParams>,
) -> Result<ApiResponse<PageResponse<BookResponse>>, ApiError> {
    find_books(&state, BookFilter::Author(author), params).await
}

#[utoipa::path(
    get,
    path = "/v1/api/books/by-genre/{genre}",
    tag = "Catalog",
    params(("genre" = String, Path, description = "Genre, case-insensitive"), PageParams),
    responses((status = 200, description = "One page of matching books", body = [BookResponse]))
)]
pub async fn books_by_genre_handler(
    State(state): State<Arc<AppState>>,
    AppPath(genre): AppPath<String>,
    AppQuery(params): AppQuery<PageParams>,
) -> Result<ApiResponse<PageResponse<BookResponse>>, ApiError> {
    find_books(&state, BookFilter::Genre(genre), params).await
}

#[utoipa::path(
    get,
    path = "/v1/api/books/by-isbn/{isbn}",
    tag = "Catalog",
    params(("isbn" = String, Path, description = "Exact ISBN")),
    responses(
        (status = 200, description = "The book", body = BookResponse),
        (status = 404, description = "No book has this ISBN")
    )
)]
pub async fn book_by_isbn_handler(
    State(state): State<Arc<AppState>>,
    AppPath(isbn): AppPath<String>,
) -> Result<ApiResponse<BookResponse>, ApiError> {
    let book = state.catalog.get_book_by_isbn(&isbn).await?;
    Ok(ApiResponse::found(book.into(), "Book"))
}

#[utoipa::path(
    post,
    path = "/v1/api/books",
    tag = "Catalog",
    request_body = BookRequest,
    responses(
        (status = 201, description = "Book created", body = BookResponse),
        (status = 400, description = "Invalid request")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_book_handler(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<BookRequest>,
) -> Result<ApiResponse<BookResponse>, ApiError> {
    req.validate()?;
    let book = state.catalog.create_book(req.into()).await?;
    Ok(ApiResponse::created(book.into(), "Book"))
}

#[utoipa::path(
    put,
    path = "/v1/api/books/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "Book id")),
    request_body = BookRequest,
    responses(
        (status = 200, description = "Book updated", body = BookResponse),
        (status = 404, description = "Book not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_book_handler(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<BookRequest>,
) -> Result<ApiResponse<BookResponse>, ApiError> {
    req.validate()?;
    let book = state.catalog.update_book(id, req.into()).await?;
    Ok(ApiResponse::ok(book.into(), "Book Successfully Updated"))
}

#[utoipa::path(
    delete,
    path = "/v1/api/books/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book deleted"),
        (status = 404, description = "Book not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_book_handler(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    state.catalog.delete_book(id).await?;
    Ok(ApiResponse::deleted("Book"))
}

//=========================================================================================
// Manga
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct MangaRequest {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub volume: i32,
    #[serde(default)]
    pub chapters: i32,
    #[serde(default)]
    pub demography: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover_image_url: String,
    pub publication_date: Option<DateTime<Utc>>,
}

impl Validate for MangaRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate::required("title", &self.title)?;
        validate::required("author", &self.author)?;
        validate::non_negative("volume", self.volume)?;
        validate::non_negative("chapters", self.chapters)
    }
}

impl From<MangaRequest> for MangaInsert {
    fn from(req: MangaRequest) -> Self {
        Self {
            title: req.title,
            author: req.author,
            volume: req.volume,
            chapters: req.chapters,
            demography: req.demography,
            genres: req.genres,
            publisher: req.publisher,
            description: req.description,
            cover_image_url: req.cover_image_url,
            publication_date: req.publication_date,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct MangaResponse {
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

impl From<Manga> for MangaResponse {
    fn from(manga: Manga) -> Self {
        Self {
            id: manga.id,
            title: manga.title,
            author: manga.author,
            volume: manga.volume,
            chapters: manga.chapters,
            demography: manga.demography,
            genres: manga.genres,
            publisher: manga.publisher,
            description: manga.description,
            cover_image_url: manga.cover_image_url,
            publication_date: manga.publication_date,
            created_at: manga.created_at,
            updated_at: manga.updated_at,
        }
    }
}

/// GET /mangas - Manga sorted by title
#[utoipa::path(
    get,
    path = "/v1/api/mangas",
    tag = "Catalog",
    params(PageParams),
    responses((status = 200, description = "One page of manga", body = [MangaResponse]))
)]
pub async fn list_manga_handler(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<PageParams>,
) -> Result<ApiResponse<PageResponse<MangaResponse>>, ApiError> {
    let page = state.catalog.list_manga(params.to_request()).await?;
    Ok(ApiResponse::found(PageResponse::from_page(page, MangaResponse::from), "Mangas"))
}

#[utoipa::path(
    get,
    path = "/v1/api/mangas/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "Manga id")),
    responses(
        (status = 200, description = "The manga", body = MangaResponse),
        (status = 404, description = "Manga not found")
    )
)]
pub async fn get_manga_handler(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<ApiResponse<MangaResponse>, ApiError> {
    let manga = state.catalog.get_manga(id).await?;
    Ok(ApiResponse::found(manga.into(), "Manga"))
}

async fn find_manga(
    state: &AppState,
    filter: MangaFilter,
    params: PageParams,
) -> Result<ApiResponse<PageResponse<MangaResponse>>, ApiError> {
    let page = state.catalog.find_manga(filter, params.to_request()).await?;
    Ok(ApiResponse::found(PageResponse::from_page(page, MangaResponse::from), "Mangas"))
}

/// GET /mangas/by-name/{name} - Manga whose title starts with `name`
#[utoipa::path(
    get,
    path = "/v1/api/mangas/by-name/{name}",
    tag = "Catalog",
    params(("name" = String, Path, description = "Title prefix, case-insensitive"), PageParams),
    responses((status = 200, description = "One page of matching manga", body = [MangaResponse]))
)]
pub async fn manga_by_name_handler(
    State(state): State<Arc<AppState>>,
    AppPath(name): AppPath<String>,
    AppQuery(params): AppQuery<PageParams>,
) -> Result<ApiResponse<PageResponse<MangaResponse>>, ApiError> {
    find_manga(&state, MangaFilter::TitlePrefix(name), params).await
}

#[utoipa::path(
    get,
    path = "/v1/api/mangas/by-author/{author}",
    tag = "Catalog",
    params(("author" = String, Path, description = "Part of the author's name"), PageParams),
    responses((status = 200, description = "One page of matching manga", body = [MangaResponse]))
)]
pub async fn manga_by_author_handler(
    State(state): State<Arc<AppState>>,
    AppPath(author): AppPath<String>,
    AppQuery(params): AppQuery<PageParams>,
) -> Result<ApiResponse<PageResponse<MangaResponse>>, ApiError> {
    find_manga(&state, MangaFilter::Author(author), params).await
}

#[utoipa::path(
    get,
    path = "/v1/api/mangas/by-genre/{genre}",
    tag = "Catalog",
    params(("genre" = String, Path, description = "Genre, case-insensitive"), PageParams),
    responses((status = 200, description = "One page of matching manga", body = [MangaResponse]))
)]
pub async fn manga_by_genre_handler(
    State(state): State<Arc<AppState>>,
    AppPath(genre): AppPath<String>,
    AppQuery(params): AppQuery<PageParams>,
) -> Result<ApiResponse<PageResponse<MangaResponse>>, ApiError> {
    find_manga(&state, MangaFilter::Genre(genre), params).await
}

#[utoipa::path(
    get,
    path = "/v1/api/mangas/by-demography/{demography}",
    tag = "Catalog",
    params(("demography" = String, Path, description = "e.g. shonen or seinen"), PageParams),
    responses((status = 200, description = "One page of matching manga", body = [MangaResponse]))
)]
pub async fn manga_by_demography_handler(
    State(state): State<Arc<AppState>>,
    AppPath(demography): AppPath<String>,
    AppQuery(params): AppQuery<PageParams>,
) -> Result<ApiResponse<PageResponse<MangaResponse>>, ApiError> {
    find_manga(&state, MangaFilter::Demography(demography), params).await
}

#[utoipa::path(
    post,
    path = "/v1/api/mangas",
    tag = "Catalog",
    request_body = MangaRequest,
    responses(
        (status = 201, description = "Manga created", body = MangaResponse),
        (status = 400, description = "Invalid request")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_manga_handler(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<MangaRequest>,
) -> Result<ApiResponse<MangaResponse>, ApiError> {
    req.validate()?;
    let manga = state.catalog.create_manga(req.into()).await?;
    Ok(ApiResponse::created(manga.into(), "Manga"))
}

#[utoipa::path(
    put,
    path = "/v1/api/mangas/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "Manga id")),
    request_body = MangaRequest,
    responses(
        (status = 200, description = "Manga updated", body = MangaResponse),
        (status = 404, description = "Manga not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_manga_handler(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<MangaRequest>,
) -> Result<ApiResponse<MangaResponse>, ApiError> {
    req.validate()?;
    let manga = state.catalog.update_manga(id, req.into()).await?;
    Ok(ApiResponse::ok(manga.into(), "Manga Successfully Updated"))
}

#[utoipa::path(
    delete,
    path = "/v1/api/mangas/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "Manga id")),
    responses(
        (status = 200, description = "Manga deleted"),
        (status = 404, description = "Manga not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_manga_handler(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    state.catalog.delete_manga(id).await?;
    Ok(ApiResponse::deleted("Manga"))
}

//=========================================================================================
// Custom Documents
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CustomDocumentRequest {
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub status: String,
}

impl Validate for CustomDocumentRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate::required("title", &self.title)
    }
}

impl From<CustomDocumentRequest> for CustomDocumentInsert {
    fn from(req: CustomDocumentRequest) -> Self {
        Self {
            title: req.title,
            author: req.author,
            description: req.description,
            url: req.url,
            tags: req.tags,
            category: req.category,
            status: req.status,
        }
    }
}

/// Every field is optional; only the ones present are changed.
#[derive(Deserialize, ToSchema)]
pub struct CustomDocumentPatchRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub category: Option<String>,
    pub status: Option<String>,
}

impl Validate for CustomDocumentPatchRequest {
    fn validate(&self) -> Result<(), ApiError> {
        match &self.title {
            Some(title) => validate::required("title", title),
            None => Ok(()),
        }
    }
}

impl From<CustomDocumentPatchRequest> for CustomDocumentPatch {
    fn from(req: CustomDocumentPatchRequest) -> Self {
        Self {
            title: req.title,
            author: req.author,
            description: req.description,
            url: req.url,
            tags: req.tags,
            category: req.category,
            status: req.status,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct CustomDocumentResponse {
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

impl From<CustomDocument> for CustomDocumentResponse {
    fn from(doc: CustomDocument) -> Self {
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
}

#[utoipa::path(
    get,
    path = "/v1/api/custom-documents",
    tag = "Custom Documents",
    responses((status = 200, description = "The caller's documents", body = [CustomDocumentResponse])),
    security(("bearer_auth" = []))
)]
pub async fn list_custom_documents_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<ApiResponse<Vec<CustomDocumentResponse>>, ApiError> {
    let docs = state.custom_documents.list_documents(user_id).await?;
    Ok(ApiResponse::found(
        docs.into_iter().map(CustomDocumentResponse::from).collect(),
        "Custom Documents",
    ))
}

#[utoipa::path(
    get,
    path = "/v1/api/custom-documents/{id}",
    tag = "Custom Documents",
    params(("id" = Uuid, Path, description = "Custom document id")),
    responses(
        (status = 200, description = "The document", body = CustomDocumentResponse),
        (status = 404, description = "Not one of the caller's documents")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_custom_document_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    AppPath(id): AppPath<Uuid>,
) -> Result<ApiResponse<CustomDocumentResponse>, ApiError> {
    let doc = state.custom_documents.get_document(user_id, id).await?;
    Ok(ApiResponse::found(doc.into(), "Custom Document"))
}

#[utoipa::path(
    post,
    path = "/v1/api/custom-documents",
    tag = "Custom Documents",
    request_body = CustomDocumentRequest,
    responses(
        (status = 201, description = "Document created", body = CustomDocumentResponse),
        (status = 400, description = "Invalid request")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_custom_document_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    AppJson(req): AppJson<CustomDocumentRequest>,
) -> Result<ApiResponse<CustomDocumentResponse>, ApiError> {
    req.validate()?;
    let doc = state
        .custom_documents
        .create_document(user_id, req.into())
        .await?;
    Ok(ApiResponse::created(doc.into(), "Custom Document"))
}

#[utoipa::path(
    patch,
    path = "/v1/api/custom-documents/{id}",
    tag = "Custom Documents",
    params(("id" = Uuid, Path, description = "Custom document id")),
    request_body = CustomDocumentPatchRequest,
    responses(
        (status = 200, description = "Document updated"),
        (status = 404, description = "Not one of the caller's documents")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_custom_document_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<CustomDocumentPatchRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    req.validate()?;
    state
        .custom_documents
        .update_document(user_id, id, req.into())
        .await?;
    Ok(ApiResponse::updated("Custom Document"))
}

#[utoipa::path(
    delete,
    path = "/v1/api/custom-documents/{id}",
    tag = "Custom Documents",
    params(("id" = Uuid, Path, description = "Custom document id")),
    responses(
        (status = 200, description = "Document deleted"),
        (status = 404, description = "Not one of the caller's documents")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_custom_document_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    AppPath(id): AppPath<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    state.custom_documents.delete_document(user_id, id).await?;
    Ok(ApiResponse::deleted("Custom Document"))
}
