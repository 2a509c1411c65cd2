//! crates/reading_tracker_core/src/services/records.rs
//!
//! Records live inside their reading. Every mutation here is a single targeted
//! operation on the parent (reading id, optionally owner) plus the record id, never
//! a read-modify-write of the whole reading, so concurrent appends all survive.

use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::domain::{Record, RecordInsert};
use crate::ports::{PortResult, ReadingRepository};
use crate::services::readings::ensure_owner;

#[derive(Clone)]
pub struct RecordService {
    readings: Arc<dyn ReadingRepository>,
}

impl RecordService {
    pub fn new(readings: Arc<dyn ReadingRepository>) -> Self {
        Self { readings }
    }

    /// Appends a record. A reading owned by someone else does not match the
    /// filter, so it is reported as `NotFound`.
    pub async fn add_record(
        &self,
        reading_id: Uuid,
        user_id: Uuid,
        insert: RecordInsert,
    ) -> PortResult<Record> {
        let record = Record {
            id: Uuid::new_v4(),
            progress: insert.progress,
            notes: insert.notes,
            recorded_at: Utc::now(),
        };
        self.readings
            .push_record(reading_id, user_id, record.clone())
            .await?;
        info!(%reading_id, record_id = %record.id, "record added");
        Ok(record)
    }

    /// Overwrites progress and notes of one record, keeping its id and timestamp.
    pub async fn update_record(
        &self,
        reading_id: Uuid,
        record_id: Uuid,
        insert: RecordInsert,
    ) -> PortResult<()> {
        self.readings
            .set_record(reading_id, None, record_id, &insert.progress, &insert.notes, Utc::now())
            .await
    }

    /// [`update_record`](Self::update_record) with the owner folded into the filter.
    pub async fn update_record_for_user(
        &self,
        reading_id: Uuid,
        user_id: Uuid,
        record_id: Uuid,
        insert: RecordInsert,
    ) -> PortResult<()> {
        self.readings
            .set_record(
                reading_id,
                Some(user_id),
                record_id,
                &insert.progress,
                &insert.notes,
                Utc::now(),
            )
            .await
    }

    /// Records in insertion order, which is also chronological order.
    pub async fn list_records(&self, reading_id: Uuid) -> PortResult<Vec<Record>> {
        Ok(self.readings.get_reading(reading_id).await?.records)
    }

    pub async fn list_records_for_user(
        &self,
        reading_id: Uuid,
        user_id: Uuid,
    ) -> PortResult<Vec<Record>> {
        let reading = self.readings.get_reading(reading_id).await?;
        ensure_owner(&reading, user_id)?;
        Ok(reading.records)
    }

    pub async fn delete_record(
        &self,
        reading_id: Uuid,
        user_id: Uuid,
        record_id: Uuid,
    ) -> PortResult<()> {
        self.readings.pull_record(reading_id, user_id, record_id).await?;
        info!(%reading_id, %record_id, "record deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReadingType;
    use crate::memory::InMemoryStore;
    use crate::ports::PortError;
    use crate::test_support::{reading_service, seed_book, seed_user, start};
    use std::collections::HashSet;

    fn progress(p: &str) -> RecordInsert {
        RecordInsert {
            progress: p.to_string(),
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn add_list_and_delete_records_in_order() {
        let store = Arc::new(InMemoryStore::new());
        let user = seed_user(&store, "ana").await;
        let book = seed_book(&store, "B123").await;
        let reading_id = start(&reading_service(&store), user, book, ReadingType::Book).await;
        let records = RecordService::new(store.clone());

        let first = records.add_record(reading_id, user, progress("ch.3")).await.unwrap();
        records.add_record(reading_id, user, progress("ch.5")).await.unwrap();

        let listed: Vec<String> = records
            .list_records(reading_id)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.progress)
            .collect();
        assert_eq!(listed, vec!["ch.3", "ch.5"]);

        records.delete_record(reading_id, user, first.id).await.unwrap();

        let listed: Vec<String> = records
            .list_records(reading_id)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.progress)
            .collect();
        assert_eq!(listed, vec!["ch.5"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_are_all_kept() {
        let store = Arc::new(InMemoryStore::new());
        let user = seed_user(&store, "ana").await;
        let book = seed_book(&store, "Dune").await;
        let reading_id = start(&reading_service(&store), user, book, ReadingType::Book).await;
        let records = RecordService::new(store.clone());

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let records = records.clone();
                tokio::spawn(async move {
                    records
                        .add_record(reading_id, user, progress(&format!("page {}", i)))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = records.list_records(reading_id).await.unwrap();
        assert_eq!(stored.len(), 32);
        let unique: HashSet<String> = stored.into_iter().map(|r| r.progress).collect();
        assert_eq!(unique.len(), 32);
    }

    #[tokio::test]
    async fn update_touches_only_the_matching_record() {
        let store = Arc::new(InMemoryStore::new());
        let user = seed_user(&store, "ana").await;
        let book = seed_book(&store, "Dune").await;
        let reading_id = start(&reading_service(&store), user, book, ReadingType::Book).await;
        let records = RecordService::new(store.clone());

        let a = records.add_record(reading_id, user, progress("p.10")).await.unwrap();
        let b = records.add_record(reading_id, user, progress("p.20")).await.unwrap();

        records
            .update_record(
                reading_id,
                b.id,
                RecordInsert {
                    progress: "p.25".to_string(),
                    notes: "skimmed".to_string(),
                },
            )
            .await
            .unwrap();

        let stored = records.list_records(reading_id).await.unwrap();
        assert_eq!(stored[0], a);
        assert_eq!(stored[1].id, b.id);
        assert_eq!(stored[1].progress, "p.25");
        assert_eq!(stored[1].notes, "skimmed");
        assert_eq!(stored[1].recorded_at, b.recorded_at);

        let err = records
            .update_record(reading_id, Uuid::new_v4(), progress("p.99"))
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
        assert_eq!(records.list_records(reading_id).await.unwrap(), stored);
    }

    #[tokio::test]
    async fn other_users_cannot_touch_records() {
        let store = Arc::new(InMemoryStore::new());
        let owner = seed_user(&store, "owner").await;
        let other = seed_user(&store, "other").await;
        let book = seed_book(&store, "Dune").await;
        let reading_id = start(&reading_service(&store), owner, book, ReadingType::Book).await;
        let records = RecordService::new(store.clone());
        let record = records.add_record(reading_id, owner, progress("p.1")).await.unwrap();

        let err = records.add_record(reading_id, other, progress("p.2")).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));

        let err = records
            .list_records_for_user(reading_id, other)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Forbidden(_)));

        let err = records
            .update_record_for_user(reading_id, other, record.id, progress("p.9"))
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));

        let err = records.delete_record(reading_id, other, record.id).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));

        assert_eq!(
            records.list_records_for_user(reading_id, owner).await.unwrap(),
            vec![record]
        );
    }
}
