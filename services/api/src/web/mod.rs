//! services/api/src/web/mod.rs
//!
//! HTTP surface of the service. [`router`] wires every handler under `/v1/api`.

pub mod auth;
pub mod catalog;
pub mod envelope;
pub mod extract;
pub mod middleware;
pub mod paging;
pub mod reading_lists;
pub mod readings;
pub mod records;
pub mod rest;
pub mod state;
pub mod validate;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use middleware::require_auth;
pub use state::AppState;

/// Builds the API router. Catalog reads and the auth endpoints are public; every
/// other route requires a bearer token.
pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/books", get(catalog::list_books_handler))
        .route("/books/{id}", get(catalog::get_book_handler))
        .route("/mangas", get(catalog::list_manga_handler))
        .route("/mangas/{id}", get(catalog::get_manga_handler))
        .route("/books/by-name/{name}", get(catalog::books_by_name_handler))
        .route("/books/by-author/{author}", get(catalog::books_by_author_handler))
        .route("/books/by-genre/{genre}", get(catalog::books_by_genre_handler))
        .route("/books/by-isbn/{isbn}", get(catalog::book_by_isbn_handler))
        .route("/mangas/by-name/{name}", get(catalog::manga_by_name_handler))
        .route("/mangas/by-author/{author}", get(catalog::manga_by_author_handler))
        .route("/mangas/by-genre/{genre}", get(catalog::manga_by_genre_handler))
        .route(
            "/mangas/by-demography/{demography}",
            get(catalog::manga_by_demography_handler),
        );

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/users/me", get(auth::me_handler))
        .route("/books", post(catalog::create_book_handler))
        .route(
            "/books/{id}",
            put(catalog::update_book_handler).delete(catalog::delete_book_handler),
        )
        .route("/mangas", post(catalog::create_manga_handler))
        .route(
            "/mangas/{id}",
            put(catalog::update_manga_handler).delete(catalog::delete_manga_handler),
        )
        .route(
            "/custom-documents",
            get(catalog::list_custom_documents_handler)
                .post(catalog::create_custom_document_handler),
        )
        .route(
            "/custom-documents/{id}",
            get(catalog::get_custom_document_handler)
                .patch(catalog::update_custom_document_handler)
                .delete(catalog::delete_custom_document_handler),
        )
        .route(
            "/readings",
            get(readings::list_readings_handler).post(readings::start_reading_handler),
        )
        .route("/readings/by-type", get(readings::list_readings_by_type_handler))
        .route("/readings/by-status", get(readings::list_readings_by_status_handler))
        .route(
            "/readings/{id}",
            get(readings::get_reading_handler)
                .put(readings::update_reading_handler)
                .delete(readings::delete_reading_handler),
        )
        .route(
            "/readings/{id}/records",
            get(records::list_records_handler).post(records::add_record_handler),
        )
        .route(
            "/readings/{id}/records/{record_id}",
            put(records::update_record_handler).delete(records::delete_record_handler),
        )
        .route(
            "/reading-lists",
            get(reading_lists::list_reading_lists_handler)
                .post(reading_lists::create_reading_list_handler),
        )
        .route(
            "/reading-lists/{id}",
            get(reading_lists::get_reading_list_handler)
                .put(reading_lists::update_reading_list_handler)
                .delete(reading_lists::delete_reading_list_handler),
        )
        .route(
            "/reading-lists/{id}/add-readings",
            put(reading_lists::add_readings_handler),
        )
        .route(
            "/reading-lists/{id}/remove-readings",
            put(reading_lists::remove_readings_handler),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state);

    Router::new()
        .nest("/v1/api", api_router)
        .layer(TraceLayer::new_for_http())
}
