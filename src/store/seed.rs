use serde::Deserialize;

use crate::db::models::VideoRecord;
use crate::error::StoreError;
use crate::media::placeholder_payload;
use crate::store::VideoStore;

/// How seeding treats a store that holds records without the sample flag.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SeedPolicy {
    /// Clear the store and reseed whenever any record lacks the sample flag.
    /// This also discards genuine uploads.
    #[default]
    Reset,
    /// Never clear; only insert canonical placeholders that are missing.
    Preserve,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    Untouched,
    Seeded { discarded: usize },
    ToppedUp { inserted: usize },
}

const PLACEHOLDERS: [(&str, &str, &str, &str); 2] = [
    (
        "450",
        "Dumbbell Squats",
        "beginner",
        "Professional dumbbell squat demonstration with proper form",
    ),
    (
        "451",
        "DB Curtsy Lunge",
        "intermediate",
        "Dumbbell curtsy lunge exercise with detailed form instruction",
    ),
];

/// The two system-seeded placeholder records.
pub fn canonical_placeholders() -> Vec<VideoRecord> {
    PLACEHOLDERS
        .iter()
        .map(|(video_id, title, difficulty, description)| {
            let mut record = VideoRecord::new(
                *video_id,
                *title,
                format!("sample-{}.mp4", video_id),
                "video/mp4",
                placeholder_payload(video_id),
            );
            record.category = Some("strength".to_string());
            record.difficulty = Some(difficulty.to_string());
            record.description = Some(description.to_string());
            record.is_sample = true;
            record
        })
        .collect()
}

pub async fn seed_if_needed(
    store: &dyn VideoStore,
    policy: SeedPolicy,
) -> Result<SeedOutcome, StoreError> {
    let existing = store.get_all().await?;

    match policy {
        SeedPolicy::Reset => {
            let unflagged = existing.iter().filter(|r| !r.is_sample).count();
            if !existing.is_empty() && unflagged == 0 {
                return Ok(SeedOutcome::Untouched);
            }

            if unflagged > 0 {
                log::warn!(
                    "Reseeding video store: discarding {} record(s) without the sample flag",
                    unflagged
                );
            }

            store.clear().await?;
            for record in canonical_placeholders() {
                store.put(record).await?;
            }
            Ok(SeedOutcome::Seeded {
                discarded: unflagged,
            })
        }
        SeedPolicy::Preserve => {
            let mut inserted = 0;
            for record in canonical_placeholders() {
                if existing.iter().any(|r| r.video_id == record.video_id) {
                    continue;
                }
                store.put(record).await?;
                inserted += 1;
            }

            if inserted == 0 {
                Ok(SeedOutcome::Untouched)
            } else {
                Ok(SeedOutcome::ToppedUp { inserted })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn upload(id: &str) -> VideoRecord {
        VideoRecord::new(id, "Bench Press", "bench.mp4", "video/mp4", vec![0u8; 128])
    }

    #[tokio::test]
    async fn empty_store_gets_two_placeholders() {
        let store = MemoryStore::default();
        let outcome = seed_if_needed(&store, SeedPolicy::Reset).await.expect("seed");
        assert_eq!(outcome, SeedOutcome::Seeded { discarded: 0 });

        let all = store.get_all().await.expect("get_all");
        let mut ids: Vec<&str> = all.iter().map(|r| r.video_id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["450", "451"]);
        assert!(all.iter().all(|r| r.is_sample));
    }

    #[tokio::test]
    async fn unflagged_record_triggers_full_reseed() {
        let store = MemoryStore::default();
        store.put(upload("999")).await.expect("put");

        let outcome = seed_if_needed(&store, SeedPolicy::Reset).await.expect("seed");
        assert_eq!(outcome, SeedOutcome::Seeded { discarded: 1 });

        assert!(store.get("999").await.expect("get").is_none());
        assert_eq!(store.get_all().await.expect("get_all").len(), 2);
    }

    #[tokio::test]
    async fn discarded_count_excludes_placeholders() {
        let store = MemoryStore::default();
        seed_if_needed(&store, SeedPolicy::Reset).await.expect("first seed");
        store.put(upload("999")).await.expect("put");

        let outcome = seed_if_needed(&store, SeedPolicy::Reset).await.expect("reseed");
        assert_eq!(outcome, SeedOutcome::Seeded { discarded: 1 });
        assert_eq!(store.get_all().await.expect("get_all").len(), 2);
    }

    #[tokio::test]
    async fn seeded_store_is_left_alone() {
        let store = MemoryStore::default();
        seed_if_needed(&store, SeedPolicy::Reset).await.expect("first seed");
        let outcome = seed_if_needed(&store, SeedPolicy::Reset).await.expect("second seed");
        assert_eq!(outcome, SeedOutcome::Untouched);
    }

    #[tokio::test]
    async fn preserve_keeps_uploads_and_fills_gaps() {
        let store = MemoryStore::default();
        store.put(upload("999")).await.expect("put");

        let outcome = seed_if_needed(&store, SeedPolicy::Preserve).await.expect("seed");
        assert_eq!(outcome, SeedOutcome::ToppedUp { inserted: 2 });
        assert!(store.get("999").await.expect("get").is_some());
        assert_eq!(store.get_all().await.expect("get_all").len(), 3);
    }

    #[test]
    fn placeholders_are_small_and_flagged() {
        for record in canonical_placeholders() {
            assert!(record.is_sample);
            assert!(record.file_size < 1024);
            assert_eq!(record.file_size, record.file_data.len() as u64);
            assert!(record.file_name.starts_with("sample-"));
        }
    }
}
