//! crates/reading_tracker_core/src/services/mod.rs
//!
//! Application services. Each one owns the rules of one component and talks to
//! storage only through the ports.

pub mod auth;
pub mod catalog;
pub mod reading_lists;
pub mod readings;
pub mod records;
pub mod resolver;

pub use auth::AuthService;
pub use catalog::{CatalogService, CustomDocumentService};
pub use reading_lists::ReadingListService;
pub use readings::ReadingService;
pub use records::RecordService;
pub use resolver::DocumentResolver;
