pub mod domain;
pub mod memory;
pub mod ports;
pub mod services;

#[cfg(test)]
pub(crate) mod test_support;

pub use domain::{
    AuthToken, Book, BookFilter, BookInsert, CustomDocument, CustomDocumentInsert,
    CustomDocumentPatch, ListChange, Manga, MangaFilter, MangaInsert, Page, PageRequest, Reading, ReadingInsert, ReadingList,
    ReadingListInsert, ReadingQuery, ReadingSort, ReadingStatus, ReadingType, Record,
    RecordInsert, Signup, User, UserCredentials,
};
pub use memory::InMemoryStore;
pub use ports::{
    BookRepository, CredentialHasher, CustomDocumentRepository, MangaRepository, PortError,
    PortResult, ReadingListRepository, ReadingRepository, UserRepository,
};
pub use services::{
    AuthService, CatalogService, CustomDocumentService, DocumentResolver, ReadingListService,
    ReadingService, RecordService,
};
