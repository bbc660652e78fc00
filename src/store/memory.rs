use std::collections::HashMap;

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::RwLock;

use crate::db::models::VideoRecord;
use crate::error::StoreError;
use crate::media::UploadPolicy;
use crate::store::VideoStore;

/// A store that keeps its records in process memory.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, VideoRecord>>,
    policy: UploadPolicy,
}

impl MemoryStore {
    pub fn new(policy: UploadPolicy) -> Self {
        MemoryStore {
            records: RwLock::new(HashMap::new()),
            policy,
        }
    }

    async fn select<F>(&self, predicate: F) -> Vec<VideoRecord>
    where
        F: Fn(&VideoRecord) -> bool,
    {
        let records = self.records.read().await;
        let mut selected: Vec<VideoRecord> =
            records.values().filter(|r| predicate(r)).cloned().collect();
        selected.sort_by(|a, b| {
            a.uploaded_at
                .cmp(&b.uploaded_at)
                .then_with(|| a.video_id.cmp(&b.video_id))
        });
        selected
    }
}

impl VideoStore for MemoryStore {
    fn put(&self, record: VideoRecord) -> BoxFuture<'_, Result<(), StoreError>> {
        memory_put(self, record).boxed()
    }

    fn get<'a>(&'a self, video_id: &'a str) -> BoxFuture<'a, Result<Option<VideoRecord>, StoreError>> {
        async move { Ok(self.records.read().await.get(video_id).cloned()) }.boxed()
    }

    fn get_all(&self) -> BoxFuture<'_, Result<Vec<VideoRecord>, StoreError>> {
        async move { Ok(self.select(|_| true).await) }.boxed()
    }

    fn find_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> BoxFuture<'a, Result<Vec<VideoRecord>, StoreError>> {
        async move {
            Ok(self
                .select(|r| r.category.as_deref() == Some(category))
                .await)
        }
        .boxed()
    }

    fn find_by_title<'a>(&'a self, title: &'a str) -> BoxFuture<'a, Result<Vec<VideoRecord>, StoreError>> {
        async move { Ok(self.select(|r| r.title == title).await) }.boxed()
    }

    fn delete<'a>(&'a self, video_id: &'a str) -> BoxFuture<'a, Result<(), StoreError>> {
        async move {
            if self.records.write().await.remove(video_id).is_some() {
                log::info!("Video {} deleted", video_id);
            }
            Ok(())
        }
        .boxed()
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        async move {
            self.records.write().await.clear();
            Ok(())
        }
        .boxed()
    }
}

async fn memory_put(store: &MemoryStore, record: VideoRecord) -> Result<(), StoreError> {
    store.policy.validate(&record)?;

    let video_id = record.video_id.clone();
    store.records.write().await.insert(video_id.clone(), record);
    log::info!("Video {} stored", video_id);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    fn record(id: &str, title: &str) -> VideoRecord {
        VideoRecord::new(id, title, format!("{}.mp4", id), "video/mp4", vec![0u8; 64])
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = MemoryStore::default();
        let mut original = record("10", "Push Up");
        original.category = Some("strength".into());
        original.sport = Some("general".into());
        original.free_content = Some(true);

        store.put(original.clone()).await.expect("put");
        let fetched = store.get("10").await.expect("get");
        assert_eq!(fetched, Some(original));
    }

    #[tokio::test]
    async fn missing_id_is_none() {
        let store = MemoryStore::default();
        assert!(store.get("nope").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn upsert_replaces_without_merging() {
        let store = MemoryStore::default();
        let mut first = record("5", "Old Title");
        first.category = Some("cardio".into());
        first.description = Some("first version".into());
        store.put(first).await.expect("put first");

        let second = record("5", "New Title");
        store.put(second.clone()).await.expect("put second");

        let fetched = store.get("5").await.expect("get").expect("present");
        assert_eq!(fetched.title, "New Title");
        assert_eq!(fetched.category, None);
        assert_eq!(fetched.description, None);
        assert_eq!(fetched, second);
    }

    #[tokio::test]
    async fn rejects_out_of_policy_records() {
        let store = MemoryStore::new(UploadPolicy {
            max_file_size: 32,
            ..UploadPolicy::default()
        });

        let err = store.put(record("1", "Too Big")).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::TooLarge { size: 64, max: 32 })
        ));

        let mut gif = record("2", "Wrong Type");
        gif.file_type = "image/gif".into();
        let err = store.put(gif).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::UnsupportedType(_))
        ));

        assert!(store.get_all().await.expect("get_all").is_empty());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStore::default();
        store.put(record("450", "Squat")).await.expect("put");

        store.delete("450").await.expect("first delete");
        assert!(store.get("450").await.expect("get").is_none());
        store.delete("450").await.expect("second delete");
    }

    #[tokio::test]
    async fn get_all_is_ordered_by_upload_time() {
        let store = MemoryStore::default();
        let mut newer = record("1", "Newer");
        let mut older = record("2", "Older");
        older.uploaded_at = newer.uploaded_at - chrono::Duration::minutes(5);
        newer.uploaded_at += chrono::Duration::seconds(1);
        store.put(newer).await.expect("put newer");
        store.put(older).await.expect("put older");

        let ids: Vec<String> = store
            .get_all()
            .await
            .expect("get_all")
            .into_iter()
            .map(|r| r.video_id)
            .collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[tokio::test]
    async fn secondary_lookups_filter_by_category_and_title() {
        let store = MemoryStore::default();
        let mut a = record("1", "Lunge");
        a.category = Some("strength".into());
        let mut b = record("2", "Row");
        b.category = Some("cardio".into());
        store.put(a).await.expect("put a");
        store.put(b).await.expect("put b");

        let strength = store.find_by_category("strength").await.expect("by category");
        assert_eq!(strength.len(), 1);
        assert_eq!(strength[0].video_id, "1");

        let rows = store.find_by_title("Row").await.expect("by title");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].video_id, "2");
    }
}
