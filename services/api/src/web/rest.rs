//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification.

use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use crate::web::{auth, catalog, reading_lists, readings, records};

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
        catalog::list_books_handler,
        catalog::get_book_handler,
        catalog::books_by_name_handler,
        catalog::books_by_author_handler,
        catalog::books_by_genre_handler,
        catalog::book_by_isbn_handler,
        catalog::create_book_handler,
        catalog::update_book_handler,
        catalog::delete_book_handler,
        catalog::list_manga_handler,
        catalog::get_manga_handler,
        catalog::manga_by_name_handler,
        catalog::manga_by_author_handler,
        catalog::manga_by_genre_handler,
        catalog::manga_by_demography_handler,
        catalog::create_manga_handler,
        catalog::update_manga_handler,
        catalog::delete_manga_handler,
        catalog::list_custom_documents_handler,
        catalog::get_custom_document_handler,
        catalog::create_custom_document_handler,
        catalog::update_custom_document_handler,
        catalog::delete_custom_document_handler,
        readings::start_reading_handler,
        readings::list_readings_handler,
        readings::list_readings_by_type_handler,
        readings::list_readings_by_status_handler,
        readings::get_reading_handler,
        readings::update_reading_handler,
        readings::delete_reading_handler,
        records::list_records_handler,
        records::add_record_handler,
        records::update_record_handler,
        records::delete_record_handler,
        reading_lists::list_reading_lists_handler,
        reading_lists::get_reading_list_handler,
        reading_lists::create_reading_list_handler,
        reading_lists::update_reading_list_handler,
        reading_lists::delete_reading_list_handler,
        reading_lists::add_readings_handler,
        reading_lists::remove_readings_handler,
    ),
    components(
        schemas(
            auth::SignupRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            auth::UserResponse,
            catalog::BookRequest,
            catalog::BookResponse,
            catalog::MangaRequest,
            catalog::MangaResponse,
            catalog::CustomDocumentRequest,
            catalog::CustomDocumentPatchRequest,
            catalog::CustomDocumentResponse,
            readings::ReadingRequest,
            readings::ReadingResponse,
            readings::RecordResponse,
            records::RecordRequest,
            reading_lists::ReadingListRequest,
            reading_lists::ReadingIdsRequest,
            reading_lists::ReadingListResponse,
            reading_lists::CreatedListResponse,
            reading_lists::ListChangeResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Reading Tracker API", description = "Track readings of books, manga and custom documents.")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by the protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protected_paths_reference_a_registered_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components are generated");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(doc.paths.paths.contains_key("/v1/api/readings/{id}/records"));
    }
}
