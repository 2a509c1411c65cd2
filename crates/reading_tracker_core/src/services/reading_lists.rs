//! crates/reading_tracker_core/src/services/reading_lists.rs
//!
//! Reading lists are embedded in their owning user, so every operation is scoped
//! by (user id, list id) and the user id doubles as the ownership check.

use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::domain::{ListChange, ReadingList, ReadingListInsert};
use crate::ports::{PortError, PortResult, ReadingListRepository, ReadingRepository};
use crate::services::readings::ensure_owner;

#[derive(Clone)]
pub struct ReadingListService {
    reading_lists: Arc<dyn ReadingListRepository>,
    readings: Arc<dyn ReadingRepository>,
}

impl ReadingListService {
    pub fn new(
        reading_lists: Arc<dyn ReadingListRepository>,
        readings: Arc<dyn ReadingRepository>,
    ) -> Self {
        Self {
            reading_lists,
            readings,
        }
    }

    /// Every list the user owns; empty when there are none.
    pub async fn get_lists(&self, user_id: Uuid) -> PortResult<Vec<ReadingList>> {
        self.reading_lists.list_reading_lists(user_id).await
    }

    pub async fn get_list(&self, list_id: Uuid, user_id: Uuid) -> PortResult<ReadingList> {
        self.reading_lists
            .list_reading_lists(user_id)
            .await?
            .into_iter()
            .find(|l| l.id == list_id)
            .ok_or_else(|| PortError::NotFound(format!("Reading list {} not found", list_id)))
    }

    /// Creates an empty list and returns its id.
    pub async fn create_list(&self, user_id: Uuid, insert: ReadingListInsert) -> PortResult<Uuid> {
        let now = Utc::now();
        let list = ReadingList {
            id: Uuid::new_v4(),
            name: insert.name,
            description: insert.description,
            reading_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        let list_id = list.id;
        self.reading_lists.push_reading_list(user_id, list).await?;
        info!(%list_id, %user_id, "reading list created");
        Ok(list_id)
    }

    /// Adds readings to the list with set semantics.
    ///
    /// Every id must name an existing reading owned by the same user at the time
    /// of the call. Adding ids that are already present reports `Unchanged`.
    pub async fn add_readings(
        &self,
        user_id: Uuid,
        list_id: Uuid,
        reading_ids: &[Uuid],
    ) -> PortResult<ListChange> {
        for reading_id in reading_ids {
            let reading = self.readings.get_reading(*reading_id).await?;
            ensure_owner(&reading, user_id)?;
        }
        let added = self
            .reading_lists
            .add_reading_ids(user_id, list_id, reading_ids, Utc::now())
            .await?;
        Ok(ListChange::from_count(added))
    }

    /// Removes readings from the list. Ids that are not in the set are ignored;
    /// when none of them were present the outcome is `Unchanged`.
    pub async fn remove_readings(
        &self,
        user_id: Uuid,
        list_id: Uuid,
        reading_ids: &[Uuid],
    ) -> PortResult<ListChange> {
        let removed = self
            .reading_lists
            .remove_reading_ids(user_id, list_id, reading_ids, Utc::now())
            .await?;
        Ok(ListChange::from_count(removed))
    }

    pub async fn update_list(
        &self,
        user_id: Uuid,
        list_id: Uuid,
        insert: ReadingListInsert,
    ) -> PortResult<()> {
        self.reading_lists
            .rename_reading_list(user_id, list_id, &insert.name, &insert.description, Utc::now())
            .await
    }

    pub async fn delete_list(&self, user_id: Uuid, list_id: Uuid) -> PortResult<()> {
        self.reading_lists.pull_reading_list(user_id, list_id).await?;
        info!(%list_id, %user_id, "reading list deleted");
        Ok(())
    }
}
