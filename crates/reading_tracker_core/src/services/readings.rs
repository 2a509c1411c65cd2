//! crates/reading_tracker_core/src/services/readings.rs
//!
//! The reading store: starting, listing, updating and deleting readings.
//!
//! Listing contract: every `list_*` operation returns an empty page when nothing
//! matches. Only lookups of a single reading report `NotFound`.
//!
//! Every read path re-resolves the document so readings show its current name. A
//! document that no longer exists keeps the name captured when the reading was
//! last resolved.

use chrono::Utc;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    Page, PageRequest, Reading, ReadingInsert, ReadingQuery, ReadingSort, ReadingStatus,
    ReadingType,
};
use crate::ports::{PortError, PortResult, ReadingListRepository, ReadingRepository};
use crate::services::resolver::DocumentResolver;

#[derive(Clone)]
pub struct ReadingService {
    readings: Arc<dyn ReadingRepository>,
    reading_lists: Arc<dyn ReadingListRepository>,
    resolver: DocumentResolver,
}

impl ReadingService {
    pub fn new(
        readings: Arc<dyn ReadingRepository>,
        reading_lists: Arc<dyn ReadingListRepository>,
        resolver: DocumentResolver,
    ) -> Self {
        Self {
            readings,
            reading_lists,
            resolver,
        }
    }

    /// Starts reading a document.
    ///
    /// The duplicate check and the insert are two separate store calls, so two
    /// concurrent starts for the same document can both succeed.
    pub async fn start_reading(&self, insert: ReadingInsert, user_id: Uuid) -> PortResult<()> {
        let document_name = self
            .resolver
            .resolve(insert.reading_type, insert.document_id, user_id)
            .await?;

        if self
            .readings
            .reading_exists_for_user(user_id, insert.document_id)
            .await?
        {
            return Err(PortError::Duplicate(format!(
                "a reading for document {} already exists",
                insert.document_id
            )));
        }

        let now = Utc::now();
        let reading = Reading {
            id: Uuid::new_v4(),
            user_id,
            document_id: insert.document_id,
            reading_type: insert.reading_type,
            document_name,
            status: insert.status,
            notes: insert.notes,
            records: Vec::new(),
            created_at: now,
            updated_at: now,
            last_record_update: now,
        };
        info!(reading_id = %reading.id, %user_id, "starting reading");
        self.readings.insert_reading(reading).await
    }

    pub async fn get_reading(&self, reading_id: Uuid) -> PortResult<Reading> {
        let reading = self.readings.get_reading(reading_id).await?;
        self.with_live_name(reading).await
    }

    /// Like [`get_reading`](Self::get_reading), but only for the reading's owner.
    pub async fn get_reading_for_user(&self, reading_id: Uuid, user_id: Uuid) -> PortResult<Reading> {
        let reading = self.readings.get_reading(reading_id).await?;
        ensure_owner(&reading, user_id)?;
        self.with_live_name(reading).await
    }

    /// All of a user's readings ordered by creation time.
    pub async fn list_by_user(&self, user_id: Uuid, page: PageRequest) -> PortResult<Page<Reading>> {
        let page = self
            .readings
            .find_readings(&ReadingQuery {
                user_id,
                reading_type: None,
                status: None,
                sort: ReadingSort::CreatedAt,
                page,
            })
            .await?;
        self.with_live_names(page).await
    }

    pub async fn list_by_user_and_type(
        &self,
        user_id: Uuid,
        reading_type: ReadingType,
        sort: ReadingSort,
        page: PageRequest,
    ) -> PortResult<Page<Reading>> {
        let page = self
            .readings
            .find_readings(&ReadingQuery {
                user_id,
                reading_type: Some(reading_type),
                status: None,
                sort,
                page,
            })
            .await?;
        self.with_live_names(page).await
    }

    /// Readings in one status, ordered by their last update.
    pub async fn list_by_user_and_status(
        &self,
        user_id: Uuid,
        status: ReadingStatus,
        page: PageRequest,
    ) -> PortResult<Page<Reading>> {
        let page = self
            .readings
            .find_readings(&ReadingQuery {
                user_id,
                reading_type: None,
                status: Some(status),
                sort: ReadingSort::UpdatedAt,
                page,
            })
            .await?;
        self.with_live_names(page).await
    }

    pub async fn update_reading(
        &self,
        reading_id: Uuid,
        user_id: Uuid,
        insert: ReadingInsert,
    ) -> PortResult<()> {
        let document_name = self
            .resolver
            .resolve(insert.reading_type, insert.document_id, user_id)
            .await?;

        let mut reading = self.readings.get_reading(reading_id).await?;
        ensure_owner(&reading, user_id)?;

        if reading.document_id != insert.document_id
            && self
                .readings
                .reading_exists_for_user(user_id, insert.document_id)
                .await?
        {
            return Err(PortError::Duplicate(format!(
                "a reading for document {} already exists",
                insert.document_id
            )));
        }

        reading.document_id = insert.document_id;
        reading.reading_type = insert.reading_type;
        reading.document_name = document_name;
        reading.status = insert.status;
        reading.notes = insert.notes;
        reading.updated_at = Utc::now();
        self.readings.update_reading_fields(&reading).await
    }

    async fn with_live_name(&self, mut reading: Reading) -> PortResult<Reading> {
        match self
            .resolver
            .resolve(reading.reading_type, reading.document_id, reading.user_id)
            .await
        {
            Ok(name) => reading.document_name = name,
            Err(PortError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
        Ok(reading)
    }

    async fn with_live_names(&self, page: Page<Reading>) -> PortResult<Page<Reading>> {
        let Page {
            items,
            total,
            page,
            limit,
        } = page;
        let items = try_join_all(items.into_iter().map(|r| self.with_live_name(r))).await?;
        Ok(Page {
            items,
            total,
            page,
            limit,
        })
    }

    /// Deletes a reading, then drops it from the owner's reading lists.
    ///
    /// The list cleanup is best effort: a failure there is logged and the delete
    /// still succeeds. Consumers of lists must tolerate ids that no longer resolve.
    pub async fn delete_reading(&self, reading_id: Uuid, user_id: Uuid) -> PortResult<()> {
        let reading = self.readings.get_reading(reading_id).await?;
        ensure_owner(&reading, user_id)?;

        self.readings.delete_reading(reading_id).await?;
        info!(%reading_id, %user_id, "reading deleted");

        if let Err(e) = self.reading_lists.purge_reading_id(user_id, reading_id).await {
            warn!(%reading_id, error = %e, "failed to remove deleted reading from lists");
        }
        Ok(())
    }
}

pub(crate) fn ensure_owner(reading: &Reading, user_id: Uuid) -> PortResult<()> {
    if reading.user_id != user_id {
        return Err(PortError::Forbidden(format!(
            "reading {} belongs to another user",
            reading.id
        )));
    }
    Ok(())
}
