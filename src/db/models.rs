use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

use crate::error::StoreError;

/// A stored training video: descriptive metadata plus the raw payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub video_id: String,
    pub title: String,
    pub category: Option<String>,
    pub sport: Option<String>,
    pub difficulty: Option<String>,
    pub description: Option<String>,
    pub file_name: String,
    pub file_size: u64,
    pub file_type: String,
    #[serde(skip_serializing)]
    pub file_data: Vec<u8>,
    pub uploaded_at: NaiveDateTime,
    pub is_sample: bool,
    pub both_side: Option<bool>,
    pub online: Option<bool>,
    pub free_content: Option<bool>,
}

impl VideoRecord {
    /// A record with only the required fields set; `file_size` follows the payload.
    pub fn new(
        video_id: impl Into<String>,
        title: impl Into<String>,
        file_name: impl Into<String>,
        file_type: impl Into<String>,
        file_data: Vec<u8>,
    ) -> Self {
        Self {
            video_id: video_id.into(),
            title: title.into(),
            category: None,
            sport: None,
            difficulty: None,
            description: None,
            file_name: file_name.into(),
            file_size: file_data.len() as u64,
            file_type: file_type.into(),
            file_data,
            uploaded_at: chrono::Utc::now().naive_utc(),
            is_sample: false,
            both_side: None,
            online: None,
            free_content: None,
        }
    }
}

/// Row shape of `video_records`. Every column is written on upsert, so a
/// `None` here clears whatever the previous record held.
#[derive(Debug, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = crate::db::schema::video_records)]
#[diesel(primary_key(video_id))]
#[diesel(treat_none_as_null = true)]
pub struct VideoRow {
    pub video_id: String,
    pub title: String,
    pub category: Option<String>,
    pub sport: Option<String>,
    pub difficulty: Option<String>,
    pub description: Option<String>,
    pub file_name: String,
    pub file_size: i64,
    pub file_type: String,
    pub file_data: Vec<u8>,
    pub uploaded_at: NaiveDateTime,
    pub is_sample: bool,
    pub both_side: Option<bool>,
    pub online: Option<bool>,
    pub free_content: Option<bool>,
}

impl TryFrom<VideoRecord> for VideoRow {
    type Error = StoreError;

    fn try_from(record: VideoRecord) -> Result<Self, Self::Error> {
        let file_size = i64::try_from(record.file_size).map_err(|_| StoreError::Corrupt {
            video_id: record.video_id.clone(),
            reason: format!("file size {} out of range", record.file_size),
        })?;

        Ok(VideoRow {
            video_id: record.video_id,
            title: record.title,
            category: record.category,
            sport: record.sport,
            difficulty: record.difficulty,
            description: record.description,
            file_name: record.file_name,
            file_size,
            file_type: record.file_type,
            file_data: record.file_data,
            uploaded_at: record.uploaded_at,
            is_sample: record.is_sample,
            both_side: record.both_side,
            online: record.online,
            free_content: record.free_content,
        })
    }
}

impl TryFrom<VideoRow> for VideoRecord {
    type Error = StoreError;

    fn try_from(row: VideoRow) -> Result<Self, Self::Error> {
        let file_size = u64::try_from(row.file_size).map_err(|_| StoreError::Corrupt {
            video_id: row.video_id.clone(),
            reason: format!("negative file size {}", row.file_size),
        })?;

        Ok(VideoRecord {
            video_id: row.video_id,
            title: row.title,
            category: row.category,
            sport: row.sport,
            difficulty: row.difficulty,
            description: row.description,
            file_name: row.file_name,
            file_size,
            file_type: row.file_type,
            file_data: row.file_data,
            uploaded_at: row.uploaded_at,
            is_sample: row.is_sample,
            both_side: row.both_side,
            online: row.online,
            free_content: row.free_content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_conversion_preserves_every_field() {
        let mut record = VideoRecord::new("12", "Deadlift", "deadlift.mp4", "video/mp4", vec![1, 2, 3]);
        record.category = Some("strength".into());
        record.online = Some(true);

        let row = VideoRow::try_from(record.clone()).expect("convert to row");
        assert_eq!(row.file_size, 3);
        let back = VideoRecord::try_from(row).expect("convert back");
        assert_eq!(back, record);
    }

    #[test]
    fn negative_sizes_are_reported_as_corrupt() {
        let mut row = VideoRow::try_from(VideoRecord::new("7", "Row", "row.mp4", "video/mp4", vec![]))
            .expect("convert to row");
        row.file_size = -1;

        match VideoRecord::try_from(row) {
            Err(StoreError::Corrupt { video_id, .. }) => assert_eq!(video_id, "7"),
            other => panic!("expected corrupt record, got {:?}", other),
        }
    }

    #[test]
    fn payload_is_not_serialized() {
        let record = VideoRecord::new("3", "Plank", "plank.mp4", "video/mp4", vec![9; 16]);
        let json = serde_json::to_value(&record).expect("serialize");
        assert!(json.get("fileData").is_none());
        assert_eq!(json["videoId"], "3");
        assert_eq!(json["fileSize"], 16);
    }
}
