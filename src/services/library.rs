use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::db::models::VideoRecord;
use crate::error::{StoreError, ValidationError};
use crate::media::{format_file_size, MediaType, UploadPolicy};
use crate::services::legacy::{merge_catalog, CatalogEntry, LegacyCatalog, LegacyLists};
use crate::services::playback::PlaybackResolver;
use crate::store::VideoStore;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// The field set of an upload form. Only the named fields are kept.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub video: Option<UploadedFile>,
    pub video_id: Option<String>,
    pub title: Option<String>,
    pub category: Option<String>,
    pub sport: Option<String>,
    pub difficulty: Option<String>,
    pub description: Option<String>,
    pub both_side: Option<bool>,
    pub online: Option<bool>,
    pub free_content: Option<bool>,
}

impl UploadForm {
    /// Names of the text fields the form keeps.
    pub const TEXT_FIELDS: [&'static str; 9] = [
        "videoId",
        "title",
        "category",
        "sport",
        "difficulty",
        "description",
        "bothSide",
        "online",
        "freeContent",
    ];

    pub fn is_text_field(name: &str) -> bool {
        Self::TEXT_FIELDS.iter().any(|field| *field == name)
    }

    /// Stores a text field. Returns `false` for names the form does not know.
    pub fn set_text(&mut self, name: &str, value: String) -> bool {
        let value = value.trim().to_string();
        let text = Some(value.clone()).filter(|v| !v.is_empty());
        match name {
            "videoId" => self.video_id = text,
            "title" => self.title = text,
            "category" => self.category = text,
            "sport" => self.sport = text,
            "difficulty" => self.difficulty = text,
            "description" => self.description = text,
            "bothSide" => self.both_side = parse_flag(&value),
            "online" => self.online = parse_flag(&value),
            "freeContent" => self.free_content = parse_flag(&value),
            _ => return false,
        }
        true
    }

    fn into_record(self) -> Result<VideoRecord, ValidationError> {
        let file = self.video.ok_or(ValidationError::MissingField("video"))?;
        let video_id = self.video_id.ok_or(ValidationError::MissingField("videoId"))?;
        let title = self.title.ok_or(ValidationError::MissingField("title"))?;

        let file_type = file
            .content_type
            .as_deref()
            .and_then(MediaType::from_essence)
            .or_else(|| MediaType::from_extension(&file.file_name))
            .map(|t| t.essence().to_string())
            .or(file.content_type)
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let mut record = VideoRecord::new(video_id, title, file.file_name, file_type, file.data);
        record.category = self.category;
        record.sport = self.sport;
        record.difficulty = self.difficulty;
        record.description = self.description;
        record.both_side = self.both_side;
        record.online = self.online;
        record.free_content = self.free_content;
        Ok(record)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryStats {
    pub total: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_sport: BTreeMap<String, usize>,
    pub by_difficulty: BTreeMap<String, usize>,
    pub total_size: u64,
    pub total_size_formatted: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_size: Option<String>,
    pub supported_formats: Vec<&'static str>,
    pub max_file_size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Upload, listing and removal of training videos.
pub struct VideoLibrary {
    store: Arc<dyn VideoStore>,
    resolver: Arc<PlaybackResolver>,
    legacy: Option<LegacyCatalog>,
    policy: UploadPolicy,
}

impl VideoLibrary {
    pub fn new(
        store: Arc<dyn VideoStore>,
        resolver: Arc<PlaybackResolver>,
        legacy: Option<LegacyCatalog>,
        policy: UploadPolicy,
    ) -> Self {
        Self {
            store,
            resolver,
            legacy,
            policy,
        }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    pub async fn upload(&self, form: UploadForm) -> Result<VideoRecord, StoreError> {
        let mut record = form.into_record()?;
        let payload = std::mem::take(&mut record.file_data);
        let stored = record.clone();
        record.file_data = payload;

        self.store.put(record).await.map_err(|e| {
            log::error!("Video upload failed: {}", e);
            e
        })?;

        log::info!(
            "Video {} uploaded ({})",
            stored.video_id,
            format_file_size(stored.file_size)
        );
        Ok(stored)
    }

    pub async fn get(&self, video_id: &str) -> Result<Option<VideoRecord>, StoreError> {
        self.store.get(video_id).await
    }

    pub async fn catalog(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        let records = self.store.get_all().await?;
        let lists = match &self.legacy {
            Some(legacy) => legacy.lists().await,
            None => LegacyLists::default(),
        };
        Ok(merge_catalog(&records, &lists))
    }

    /// Removes the record, any live handle derived from it, and its legacy entries.
    pub async fn delete(&self, video_id: &str) -> Result<(), StoreError> {
        self.store.delete(video_id).await?;

        let released = self.resolver.invalidate(video_id).await;
        if released > 0 {
            log::info!("Invalidated {} playback handle(s) for video {}", released, video_id);
        }

        if let Some(legacy) = &self.legacy {
            if let Err(e) = legacy.remove(video_id).await {
                log::error!("Failed to update legacy catalog for {}: {}", video_id, e);
            }
        }
        Ok(())
    }

    pub async fn stats(&self) -> Result<LibraryStats, StoreError> {
        let records = self.store.get_all().await?;
        let mut stats = LibraryStats {
            total: records.len(),
            ..Default::default()
        };

        for record in &records {
            *stats.by_category.entry(bucket(&record.category)).or_default() += 1;
            *stats.by_sport.entry(bucket(&record.sport)).or_default() += 1;
            *stats.by_difficulty.entry(bucket(&record.difficulty)).or_default() += 1;
            stats.total_size += record.file_size;
        }

        stats.total_size_formatted = format_file_size(stats.total_size);
        Ok(stats)
    }

    pub async fn health(&self) -> HealthReport {
        let supported_formats = self.policy.supported_essences();
        let max_file_size = format_file_size(self.policy.max_file_size);

        match self.store.get_all().await {
            Ok(records) => {
                let total: u64 = records.iter().map(|r| r.file_size).sum();
                HealthReport {
                    healthy: true,
                    video_count: Some(records.len()),
                    total_size: Some(format_file_size(total)),
                    supported_formats,
                    max_file_size,
                    error: None,
                }
            }
            Err(e) => {
                log::error!("Video system health check failed: {}", e);
                HealthReport {
                    healthy: false,
                    video_count: None,
                    total_size: None,
                    supported_formats,
                    max_file_size,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

fn bucket(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "unspecified".to_string())
}
