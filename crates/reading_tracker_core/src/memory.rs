//! crates/reading_tracker_core/src/memory.rs
//!
//! An in-memory implementation of every persistence port. Each operation takes the
//! single store lock once, which gives it the same all-or-nothing behavior as one
//! document write in a real store. Used by the test suites of both crates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::domain::{
    Book, BookFilter, CustomDocument, CustomDocumentPatch, Manga, MangaFilter, Page, PageRequest,
    Reading, ReadingList, ReadingQuery, Record, User, UserCredentials,
};
use crate::ports::{
    BookRepository, CustomDocumentRepository, MangaRepository, PortError, PortResult,
    ReadingListRepository, ReadingRepository, UserRepository,
};

struct UserEntry {
    user: User,
    password_hash: String,
    custom_documents: Vec<CustomDocument>,
    reading_lists: Vec<ReadingList>,
}

struct AuthSessionEntry {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    books: HashMap<Uuid, Book>,
    manga: HashMap<Uuid, Manga>,
    users: HashMap<Uuid, UserEntry>,
    sessions: HashMap<String, AuthSessionEntry>,
    readings: HashMap<Uuid, Reading>,
}

impl State {
    fn user_mut(&mut self, user_id: Uuid) -> PortResult<&mut UserEntry> {
        self.users
            .get_mut(&user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    fn user(&self, user_id: Uuid) -> PortResult<&UserEntry> {
        self.users
            .get(&user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    fn reading_list_mut(&mut self, user_id: Uuid, list_id: Uuid) -> PortResult<&mut ReadingList> {
        self.user_mut(user_id)?
            .reading_lists
            .iter_mut()
            .find(|l| l.id == list_id)
            .ok_or_else(|| PortError::NotFound(format!("Reading list {} not found", list_id)))
    }
}

/// A process-local store, handy for tests and local experiments.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> PortResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| PortError::Storage("in-memory store lock poisoned".to_string()))
    }
}

fn window<T>(mut items: Vec<T>, page: PageRequest) -> Page<T> {
    let total = items.len() as u64;
    let skip = page.skip().min(total) as usize;
    let items: Vec<T> = items
        .drain(skip..)
        .take(page.limit as usize)
        .collect();
    Page {
        items,
        total,
        page: page.page,
        limit: page.limit,
    }
}

fn sort_books(mut books: Vec<Book>, ascending: bool) -> Vec<Book> {
    books.sort_by(|a, b| (&a.name, &a.author, a.id).cmp(&(&b.name, &b.author, b.id)));
    if !ascending {
        books.reverse();
    }
    books
}

fn sort_manga(mut manga: Vec<Manga>, ascending: bool) -> Vec<Manga> {
    manga.sort_by(|a, b| (&a.title, &a.author, a.id).cmp(&(&b.title, &b.author, b.id)));
    if !ascending {
        manga.reverse();
    }
    manga
}

//=========================================================================================
// Catalog
//=========================================================================================

#[async_trait]
impl BookRepository for InMemoryStore {
    async fn insert_book(&self, book: Book) -> PortResult<()> {
        self.state()?.books.insert(book.id, book);
        Ok(())
    }

    async fn get_book(&self, id: Uuid) -> PortResult<Book> {
        self.state()?
            .books
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Book {} not found", id)))
    }

    async fn list_books(&self, page: PageRequest) -> PortResult<Page<Book>> {
        let books: Vec<Book> = self.state()?.books.values().cloned().collect();
        Ok(window(sort_books(books, page.ascending), page))
    }

    async fn find_books_by(&self, filter: &BookFilter, page: PageRequest) -> PortResult<Page<Book>> {
        let books: Vec<Book> = self
            .state()?
            .books
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        Ok(window(sort_books(books, page.ascending), page))
    }

    async fn replace_book(&self, book: Book) -> PortResult<()> {
        let mut state = self.state()?;
        match state.books.get_mut(&book.id) {
            Some(existing) => {
                *existing = book;
                Ok(())
            }
            None => Err(PortError::NotFound(format!("Book {} not found", book.id))),
        }
    }

    async fn delete_book(&self, id: Uuid) -> PortResult<()> {
        self.state()?
            .books
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| PortError::NotFound(format!("Book {} not found", id)))
    }
}

#[async_trait]
impl MangaRepository for InMemoryStore {
    async fn insert_manga(&self, manga: Manga) -> PortResult<()> {
        self.state()?.manga.insert(manga.id, manga);
        Ok(())
    }

    async fn get_manga(&self, id: Uuid) -> PortResult<Manga> {
        self.state()?
            .manga
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Manga {} not found", id)))
    }

    async fn list_manga(&self, page: PageRequest) -> PortResult<Page<Manga>> {
        let manga: Vec<Manga> = self.state()?.manga.values().cloned().collect();
        Ok(window(sort_manga(manga, page.ascending), page))
    }

    async fn find_manga_by(
        &self,
        filter: &MangaFilter,
        page: PageRequest,
    ) -> PortResult<Page<Manga>> {
        let manga: Vec<Manga> = self
            .state()?
            .manga
            .values()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        Ok(window(sort_manga(manga, page.ascending), page))
    }

    async fn replace_manga(&self, manga: Manga) -> PortResult<()> {
        let mut state = self.state()?;
        match state.manga.get_mut(&manga.id) {
            Some(existing) => {
                *existing = manga;
                Ok(())
            }
            None => Err(PortError::NotFound(format!("Manga {} not found", manga.id))),
        }
    }

    async fn delete_manga(&self, id: Uuid) -> PortResult<()> {
        self.state()?
            .manga
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| PortError::NotFound(format!("Manga {} not found", id)))
    }
}

#[async_trait]
impl CustomDocumentRepository for InMemoryStore {
    async fn list_custom_documents(&self, user_id: Uuid) -> PortResult<Vec<CustomDocument>> {
        Ok(self.state()?.user(user_id)?.custom_documents.clone())
    }

    async fn get_custom_document(
        &self,
        user_id: Uuid,
        document_id: Uuid,
    ) -> PortResult<CustomDocument> {
        self.state()?
            .user(user_id)?
            .custom_documents
            .iter()
            .find(|d| d.id == document_id)
            .cloned()
            .ok_or_else(|| {
                PortError::NotFound(format!("Custom document {} not found", document_id))
            })
    }

    async fn push_custom_document(
        &self,
        user_id: Uuid,
        document: CustomDocument,
    ) -> PortResult<()> {
        self.state()?.user_mut(user_id)?.custom_documents.push(document);
        Ok(())
    }

    async fn patch_custom_document(
        &self,
        user_id: Uuid,
        document_id: Uuid,
        patch: CustomDocumentPatch,
        at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut state = self.state()?;
        let doc = state
            .user_mut(user_id)?
            .custom_documents
            .iter_mut()
            .find(|d| d.id == document_id)
            .ok_or_else(|| {
                PortError::NotFound(format!("Custom document {} not found", document_id))
            })?;
        patch.apply(doc, at);
        Ok(())
    }

    async fn pull_custom_document(&self, user_id: Uuid, document_id: Uuid) -> PortResult<()> {
        let mut state = self.state()?;
        let docs = &mut state.user_mut(user_id)?.custom_documents;
        let before = docs.len();
        docs.retain(|d| d.id != document_id);
        if docs.len() == before {
            return Err(PortError::NotFound(format!(
                "Custom document {} not found",
                document_id
            )));
        }
        Ok(())
    }
}

//=========================================================================================
// Users
//=========================================================================================

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert_user(&self, user: User, password_hash: &str) -> PortResult<()> {
        let mut state = self.state()?;
        let taken = state
            .users
            .values()
            .any(|e| e.user.email == user.email || e.user.username == user.username);
        if taken {
            return Err(PortError::Duplicate("username or email is already in use".to_string()));
        }
        state.users.insert(
            user.id,
            UserEntry {
                user,
                password_hash: password_hash.to_string(),
                custom_documents: Vec::new(),
                reading_lists: Vec::new(),
            },
        );
        Ok(())
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        Ok(self.state()?.user(user_id)?.user.clone())
    }

    async fn find_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.state()?
            .users
            .values()
            .find(|e| e.user.email == email)
            .map(|e| UserCredentials {
                user: e.user.clone(),
                password_hash: e.password_hash.clone(),
            })
            .ok_or_else(|| PortError::NotFound(format!("User with email {} not found", email)))
    }

    async fn find_credentials_by_username(&self, username: &str) -> PortResult<UserCredentials> {
        self.state()?
            .users
            .values()
            .find(|e| e.user.username == username)
            .map(|e| UserCredentials {
                user: e.user.clone(),
                password_hash: e.password_hash.clone(),
            })
            .ok_or_else(|| {
                PortError::NotFound(format!("User with username {} not found", username))
            })
    }

    async fn update_last_login(&self, user_id: Uuid, at: DateTime<Utc>) -> PortResult<()> {
        self.state()?.user_mut(user_id)?.user.last_login = Some(at);
        Ok(())
    }

    async fn create_auth_session(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.state()?
            .sessions
            .insert(token.to_string(), AuthSessionEntry { user_id, expires_at });
        Ok(())
    }

    async fn validate_auth_session(&self, token: &str) -> PortResult<Uuid> {
        match self.state()?.sessions.get(token) {
            Some(session) if session.expires_at > Utc::now() => Ok(session.user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, token: &str) -> PortResult<()> {
        self.state()?
            .sessions
            .remove(token)
            .map(|_| ())
            .ok_or(PortError::Unauthorized)
    }
}

//=========================================================================================
// Readings and Records
//=========================================================================================

#[async_trait]
impl ReadingRepository for InMemoryStore {
    async fn insert_reading(&self, reading: Reading) -> PortResult<()> {
        self.state()?.readings.insert(reading.id, reading);
        Ok(())
    }

    async fn get_reading(&self, id: Uuid) -> PortResult<Reading> {
        self.state()?
            .readings
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Reading {} not found", id)))
    }

    async fn reading_exists_for_user(&self, user_id: Uuid, document_id: Uuid) -> PortResult<bool> {
        Ok(self
            .state()?
            .readings
            .values()
            .any(|r| r.user_id == user_id && r.document_id == document_id))
    }

    async fn find_readings(&self, query: &ReadingQuery) -> PortResult<Page<Reading>> {
        let mut readings: Vec<Reading> = self
            .state()?
            .readings
            .values()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        readings.sort_by(|a, b| (query.sort.key(a), a.id).cmp(&(query.sort.key(b), b.id)));
        if !query.page.ascending {
            readings.reverse();
        }
        Ok(window(readings, query.page))
    }

    async fn update_reading_fields(&self, reading: &Reading) -> PortResult<()> {
        let mut state = self.state()?;
        let current = state
            .readings
            .get_mut(&reading.id)
            .ok_or_else(|| PortError::NotFound(format!("Reading {} not found", reading.id)))?;
        current.document_id = reading.document_id;
        current.reading_type = reading.reading_type;
        current.document_name = reading.document_name.clone();
        current.status = reading.status;
        current.notes = reading.notes.clone();
        current.updated_at = reading.updated_at;
        Ok(())
    }

    async fn delete_reading(&self, id: Uuid) -> PortResult<()> {
        self.state()?
            .readings
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| PortError::NotFound(format!("Reading {} not found", id)))
    }

    async fn push_record(&self, reading_id: Uuid, user_id: Uuid, record: Record) -> PortResult<()> {
        let mut state = self.state()?;
        let reading = state
            .readings
            .get_mut(&reading_id)
            .filter(|r| r.user_id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("Reading {} not found", reading_id)))?;
        reading.last_record_update = record.recorded_at;
        reading.records.push(record);
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
        let mut state = self.state()?;
        let reading = state
            .readings
            .get_mut(&reading_id)
            .filter(|r| owner.map_or(true, |o| r.user_id == o))
            .ok_or_else(|| PortError::NotFound(format!("Reading {} not found", reading_id)))?;
        let record = reading
            .records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| PortError::NotFound(format!("Record {} not found", record_id)))?;
        record.progress = progress.to_string();
        record.notes = notes.to_string();
        reading.last_record_update = at;
        Ok(())
    }

    async fn pull_record(&self, reading_id: Uuid, user_id: Uuid, record_id: Uuid) -> PortResult<()> {
        let mut state = self.state()?;
        let reading = state
            .readings
            .get_mut(&reading_id)
            .filter(|r| r.user_id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("Reading {} not found", reading_id)))?;
        let before = reading.records.len();
        reading.records.retain(|r| r.id != record_id);
        if reading.records.len() == before {
            return Err(PortError::NotFound(format!("Record {} not found", record_id)));
        }
        Ok(())
    }
}

//=========================================================================================
// Reading Lists
//=========================================================================================

#[async_trait]
impl ReadingListRepository for InMemoryStore {
    async fn list_reading_lists(&self, user_id: Uuid) -> PortResult<Vec<ReadingList>> {
        Ok(self.state()?.user(user_id)?.reading_lists.clone())
    }

    async fn push_reading_list(&self, user_id: Uuid, list: ReadingList) -> PortResult<()> {
        self.state()?.user_mut(user_id)?.reading_lists.push(list);
        Ok(())
    }

    async fn add_reading_ids(
        &self,
        user_id: Uuid,
        list_id: Uuid,
        reading_ids: &[Uuid],
        at: DateTime<Utc>,
    ) -> PortResult<usize> {
        let mut state = self.state()?;
        let list = state.reading_list_mut(user_id, list_id)?;
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
    }

    async fn remove_reading_ids(
        &self,
        user_id: Uuid,
        list_id: Uuid,
        reading_ids: &[Uuid],
        at: DateTime<Utc>,
    ) -> PortResult<usize> {
        let mut state = self.state()?;
        let list = state.reading_list_mut(user_id, list_id)?;
        let before = list.reading_ids.len();
        list.reading_ids.retain(|id| !reading_ids.contains(id));
        let removed = before - list.reading_ids.len();
        if removed > 0 {
            list.updated_at = at;
        }
        Ok(removed)
    }

    async fn purge_reading_id(&self, user_id: Uuid, reading_id: Uuid) -> PortResult<()> {
        let mut state = self.state()?;
        for list in state.user_mut(user_id)?.reading_lists.iter_mut() {
            list.reading_ids.retain(|id| *id != reading_id);
        }
        Ok(())
    }

    async fn rename_reading_list(
        &self,
        user_id: Uuid,
        list_id: Uuid,
        name: &str,
        description: &str,
        at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut state = self.state()?;
        let list = state.reading_list_mut(user_id, list_id)?;
        list.name = name.to_string();
        list.description = description.to_string();
        list.updated_at = at;
        Ok(())
    }

    async fn pull_reading_list(&self, user_id: Uuid, list_id: Uuid) -> PortResult<()> {
        let mut state = self.state()?;
        let lists = &mut state.user_mut(user_id)?.reading_lists;
        let before = lists.len();
        lists.retain(|l| l.id != list_id);
        if lists.len() == before {
            return Err(PortError::NotFound(format!("Reading list {} not found", list_id)));
        }
        Ok(())
    }
}
