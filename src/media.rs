use std::fmt;

use serde::Serialize;

use crate::db::models::VideoRecord;
use crate::error::ValidationError;

/// Container formats accepted for upload and playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MediaType {
    #[serde(rename = "video/mp4")]
    Mp4,
    #[serde(rename = "video/webm")]
    WebM,
    #[serde(rename = "video/ogg")]
    Ogg,
}

impl MediaType {
    pub const ALL: [MediaType; 3] = [MediaType::Mp4, MediaType::WebM, MediaType::Ogg];

    pub fn essence(self) -> &'static str {
        match self {
            MediaType::Mp4 => "video/mp4",
            MediaType::WebM => "video/webm",
            MediaType::Ogg => "video/ogg",
        }
    }

    pub fn from_essence(essence: &str) -> Option<Self> {
        let essence = essence.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|t| t.essence() == essence)
    }

    pub fn from_extension(file_name: &str) -> Option<Self> {
        let (_, ext) = file_name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "mp4" | "m4v" => Some(MediaType::Mp4),
            "webm" => Some(MediaType::WebM),
            "ogg" | "ogv" => Some(MediaType::Ogg),
            _ => None,
        }
    }

    /// Recognises a container by its leading bytes.
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.len() >= 8 && &data[4..8] == b"ftyp" {
            return Some(MediaType::Mp4);
        }
        if data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
            return Some(MediaType::WebM);
        }
        if data.starts_with(b"OggS") {
            return Some(MediaType::Ogg);
        }
        None
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.essence())
    }
}

/// Limits applied to every record before it is persisted, plus the size
/// under which a payload is never treated as genuine media.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub supported: Vec<MediaType>,
    pub max_file_size: u64,
    pub placeholder_threshold: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            supported: MediaType::ALL.to_vec(),
            max_file_size: 100 * 1024 * 1024,
            placeholder_threshold: 5 * 1024,
        }
    }
}

impl UploadPolicy {
    pub fn supports(&self, file_type: &str) -> bool {
        MediaType::from_essence(file_type).is_some_and(|t| self.supported.contains(&t))
    }

    pub fn validate(&self, record: &VideoRecord) -> Result<(), ValidationError> {
        if record.video_id.trim().is_empty() {
            return Err(ValidationError::MissingField("videoId"));
        }
        if record.title.trim().is_empty() {
            return Err(ValidationError::MissingField("title"));
        }
        if !self.supports(&record.file_type) {
            return Err(ValidationError::UnsupportedType(record.file_type.clone()));
        }
        let actual = record.file_data.len() as u64;
        let size = record.file_size.max(actual);
        if size > self.max_file_size {
            return Err(ValidationError::TooLarge {
                size,
                max: self.max_file_size,
            });
        }
        Ok(())
    }

    pub fn supported_essences(&self) -> Vec<&'static str> {
        self.supported.iter().map(|t| t.essence()).collect()
    }
}

const SAMPLE_MARKERS: &[&str] = &["sample", "placeholder"];

pub fn is_sample_name(file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    SAMPLE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// A minimal MP4 `ftyp` box followed by the record id. Enough for a
/// container sniff to pass; never enough to be mistaken for real footage.
pub fn placeholder_payload(video_id: &str) -> Vec<u8> {
    let mut payload = Vec::with_capacity(24 + 12 + video_id.len());
    payload.extend_from_slice(&[0x00, 0x00, 0x00, 0x18]);
    payload.extend_from_slice(b"ftyp");
    payload.extend_from_slice(b"isom");
    payload.extend_from_slice(&[0x00, 0x00, 0x02, 0x00]);
    payload.extend_from_slice(b"isom");
    payload.extend_from_slice(b"mp41");
    payload.extend_from_slice(b"PLACEHOLDER:");
    payload.extend_from_slice(video_id.as_bytes());
    payload
}

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Human-readable size: base 1024, at most two decimals, trailing zeros dropped.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_are_formatted_like_the_admin_panel() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(500), "500 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(10_485_760), "10 MB");
        assert_eq!(format_file_size(104_857_600), "100 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3 GB");
    }

    #[test]
    fn placeholder_payload_sniffs_as_mp4() {
        let payload = placeholder_payload("450");
        assert_eq!(MediaType::sniff(&payload), Some(MediaType::Mp4));
        assert!(payload.ends_with(b"PLACEHOLDER:450"));
        assert!(payload.len() < 64);
    }

    #[test]
    fn sniffs_webm_and_ogg_headers() {
        assert_eq!(
            MediaType::sniff(&[0x1A, 0x45, 0xDF, 0xA3, 0x01]),
            Some(MediaType::WebM)
        );
        assert_eq!(MediaType::sniff(b"OggS\0\x02"), Some(MediaType::Ogg));
        assert_eq!(MediaType::sniff(b"GIF89a"), None);
    }

    #[test]
    fn types_resolve_from_essence_and_extension() {
        assert_eq!(MediaType::from_essence("Video/MP4"), Some(MediaType::Mp4));
        assert_eq!(MediaType::from_essence("video/quicktime"), None);
        assert_eq!(MediaType::from_extension("squat.WEBM"), Some(MediaType::WebM));
        assert_eq!(MediaType::from_extension("noext"), None);
    }

    #[test]
    fn sample_names_match_case_insensitively() {
        assert!(is_sample_name("Sample-450.mp4"));
        assert!(is_sample_name("placeholder_clip.webm"));
        assert!(!is_sample_name("bench-press.mp4"));
    }
}
