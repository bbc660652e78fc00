//! The flat video lists written by the older upload path. They carry
//! metadata only, never a payload.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::db::models::VideoRecord;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyEntry {
    pub video_id: Option<String>,
    pub title: Option<String>,
    pub category: Option<String>,
    pub sport: Option<String>,
    pub difficulty: Option<String>,
    pub description: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
    pub uploaded_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyLists {
    #[serde(default)]
    pub admin_videos: Vec<LegacyEntry>,
    #[serde(default)]
    pub admin_uploaded_videos: Vec<LegacyEntry>,
}

impl LegacyLists {
    fn remove(&mut self, video_id: &str) -> usize {
        let before = self.admin_videos.len() + self.admin_uploaded_videos.len();
        self.admin_videos
            .retain(|e| e.video_id.as_deref() != Some(video_id));
        self.admin_uploaded_videos
            .retain(|e| e.video_id.as_deref() != Some(video_id));
        before - self.admin_videos.len() - self.admin_uploaded_videos.len()
    }
}

/// Legacy lists backed by a JSON document on disk (or by nothing, in tests).
pub struct LegacyCatalog {
    path: Option<PathBuf>,
    lists: Mutex<LegacyLists>,
}

impl LegacyCatalog {
    pub fn new(lists: LegacyLists) -> Self {
        Self {
            path: None,
            lists: Mutex::new(lists),
        }
    }

    /// Reads the lists from `path`. A missing or malformed file yields empty lists.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lists = match tokio::fs::read(&path).await {
            Ok(raw) => serde_json::from_slice(&raw).unwrap_or_else(|e| {
                log::error!("Error loading legacy catalog {}: {}", path.display(), e);
                LegacyLists::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LegacyLists::default(),
            Err(e) => {
                log::error!("Error reading legacy catalog {}: {}", path.display(), e);
                LegacyLists::default()
            }
        };

        log::info!(
            "Loaded legacy catalog: {} admin, {} uploaded",
            lists.admin_videos.len(),
            lists.admin_uploaded_videos.len()
        );

        Self {
            path: Some(path),
            lists: Mutex::new(lists),
        }
    }

    pub async fn lists(&self) -> LegacyLists {
        self.lists.lock().await.clone()
    }

    /// Drops the id from both lists and writes the result back. A failed
    /// write leaves the lists untouched.
    pub async fn remove(&self, video_id: &str) -> std::io::Result<usize> {
        let mut lists = self.lists.lock().await;
        let mut updated = lists.clone();
        let removed = updated.remove(video_id);
        if removed == 0 {
            return Ok(0);
        }

        // Memory only changes once the file has been written.
        if let Some(path) = &self.path {
            let raw = serde_json::to_vec_pretty(&updated)?;
            tokio::fs::write(path, raw).await?;
        }
        *lists = updated;
        Ok(removed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSource {
    Store,
    LegacyAdmin,
    LegacyUploaded,
}

/// One entry in the merged video listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub video_id: String,
    pub title: String,
    pub category: Option<String>,
    pub sport: Option<String>,
    pub difficulty: Option<String>,
    pub description: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
    pub uploaded_at: Option<String>,
    pub is_sample: bool,
    pub source: CatalogSource,
}

impl From<&VideoRecord> for CatalogEntry {
    fn from(record: &VideoRecord) -> Self {
        CatalogEntry {
            video_id: record.video_id.clone(),
            title: record.title.clone(),
            category: record.category.clone(),
            sport: record.sport.clone(),
            difficulty: record.difficulty.clone(),
            description: record.description.clone(),
            file_name: Some(record.file_name.clone()),
            file_size: Some(record.file_size),
            uploaded_at: Some(record.uploaded_at.and_utc().to_rfc3339()),
            is_sample: record.is_sample,
            source: CatalogSource::Store,
        }
    }
}

impl CatalogEntry {
    fn from_legacy(entry: &LegacyEntry, source: CatalogSource) -> Option<Self> {
        let video_id = entry.video_id.clone().filter(|id| !id.is_empty())?;
        Some(CatalogEntry {
            title: entry.title.clone().unwrap_or_else(|| format!("Video {}", video_id)),
            video_id,
            category: entry.category.clone(),
            sport: entry.sport.clone(),
            difficulty: entry.difficulty.clone(),
            description: entry.description.clone(),
            file_name: entry.file_name.clone(),
            file_size: entry.file_size,
            uploaded_at: entry.uploaded_at.clone(),
            is_sample: false,
            source,
        })
    }
}

/// Store records first, then both legacy lists; the first entry seen for an
/// id wins. Legacy entries without an id are skipped.
pub fn merge_catalog(records: &[VideoRecord], legacy: &LegacyLists) -> Vec<CatalogEntry> {
    let stored = records.iter().map(CatalogEntry::from);
    let admin = legacy
        .admin_videos
        .iter()
        .filter_map(|e| CatalogEntry::from_legacy(e, CatalogSource::LegacyAdmin));
    let uploaded = legacy
        .admin_uploaded_videos
        .iter()
        .filter_map(|e| CatalogEntry::from_legacy(e, CatalogSource::LegacyUploaded));

    let mut seen = HashSet::new();
    stored
        .chain(admin)
        .chain(uploaded)
        .filter(|entry| seen.insert(entry.video_id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy(id: &str, title: &str) -> LegacyEntry {
        LegacyEntry {
            video_id: Some(id.to_string()),
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn merge_keeps_first_seen_entry() {
        let records = vec![VideoRecord::new("450", "Dumbbell Squats", "a.mp4", "video/mp4", vec![])];
        let lists = LegacyLists {
            admin_videos: vec![legacy("450", "Old Squats"), legacy("12", "Row")],
            admin_uploaded_videos: vec![legacy("12", "Row Again"), legacy("13", "Plank")],
        };

        let merged = merge_catalog(&records, &lists);
        let summary: Vec<(&str, &str, CatalogSource)> = merged
            .iter()
            .map(|e| (e.video_id.as_str(), e.title.as_str(), e.source))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("450", "Dumbbell Squats", CatalogSource::Store),
                ("12", "Row", CatalogSource::LegacyAdmin),
                ("13", "Plank", CatalogSource::LegacyUploaded),
            ]
        );
    }

    #[test]
    fn entries_without_id_are_skipped() {
        let lists = LegacyLists {
            admin_videos: vec![LegacyEntry::default(), legacy("", "Blank")],
            admin_uploaded_videos: vec![],
        };
        assert!(merge_catalog(&[], &lists).is_empty());
    }

    #[test]
    fn parses_the_browser_layout() {
        let raw = r#"{
            "adminVideos": [{"videoId": "20", "title": "Clean", "videoURL": "blob:x", "fileSize": 42}],
            "adminUploadedVideos": []
        }"#;
        let lists: LegacyLists = serde_json::from_str(raw).expect("parse");
        assert_eq!(lists.admin_videos[0].video_id.as_deref(), Some("20"));
        assert_eq!(lists.admin_videos[0].file_size, Some(42));
    }

    #[tokio::test]
    async fn remove_scrubs_both_lists_and_persists() {
        let dir = std::env::temp_dir().join(format!("legacy-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.expect("mkdir");
        let path = dir.join("catalog.json");
        let lists = LegacyLists {
            admin_videos: vec![legacy("7", "Curl")],
            admin_uploaded_videos: vec![legacy("7", "Curl"), legacy("8", "Press")],
        };
        tokio::fs::write(&path, serde_json::to_vec(&lists).expect("encode"))
            .await
            .expect("write");

        let catalog = LegacyCatalog::load(&path).await;
        assert_eq!(catalog.remove("7").await.expect("remove"), 2);
        assert_eq!(catalog.remove("7").await.expect("remove again"), 0);

        let reloaded = LegacyCatalog::load(&path).await.lists().await;
        assert!(reloaded.admin_videos.is_empty());
        assert_eq!(reloaded.admin_uploaded_videos, vec![legacy("8", "Press")]);

        tokio::fs::remove_dir_all(&dir).await.expect("cleanup");
    }

    #[tokio::test]
    async fn failed_write_keeps_lists_unchanged() {
        let lists = LegacyLists {
            admin_videos: vec![legacy("7", "Curl")],
            admin_uploaded_videos: vec![],
        };
        let catalog = LegacyCatalog {
            path: Some(PathBuf::from("/nonexistent/legacy/catalog.json")),
            lists: Mutex::new(lists.clone()),
        };

        assert!(catalog.remove("7").await.is_err());
        assert_eq!(catalog.lists().await, lists);
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let catalog = LegacyCatalog::load("/nonexistent/legacy.json").await;
        assert_eq!(catalog.lists().await, LegacyLists::default());
    }
}
