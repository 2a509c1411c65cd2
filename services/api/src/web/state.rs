//! services/api/src/web/state.rs
//!
//! Defines the application state shared by every handler.

use chrono::Duration;
use reading_tracker_core::ports::{
    BookRepository, CredentialHasher, CustomDocumentRepository, MangaRepository,
    ReadingListRepository, ReadingRepository, UserRepository,
};
use reading_tracker_core::services::{
    AuthService, CatalogService, CustomDocumentService, DocumentResolver, ReadingListService,
    ReadingService, RecordService,
};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub catalog: CatalogService,
    pub custom_documents: CustomDocumentService,
    pub readings: ReadingService,
    pub records: RecordService,
    pub reading_lists: ReadingListService,
}

impl AppState {
    /// Wires every service to one store that implements all persistence ports.
    pub fn from_store<S>(
        store: Arc<S>,
        hasher: Arc<dyn CredentialHasher>,
        session_ttl: Duration,
    ) -> Self
    where
        S: BookRepository
            + MangaRepository
            + CustomDocumentRepository
            + UserRepository
            + ReadingRepository
            + ReadingListRepository
            + 'static,
    {
        let resolver = DocumentResolver::new(store.clone(), store.clone(), store.clone());
        Self {
            auth: AuthService::new(store.clone(), hasher, session_ttl),
            catalog: CatalogService::new(store.clone(), store.clone()),
            custom_documents: CustomDocumentService::new(store.clone()),
            readings: ReadingService::new(store.clone(), store.clone(), resolver),
            records: RecordService::new(store.clone()),
            reading_lists: ReadingListService::new(store.clone(), store),
        }
    }
}
