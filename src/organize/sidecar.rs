use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::date::CaptureTime;

/// Metadata parsed from one JSON sidecar file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SidecarRecord {
    /// Original media filename as known by the export service.
    pub title: String,
    pub description: String,
    /// Upload / creation time in unix seconds.
    pub creation_timestamp: Option<i64>,
    /// Capture time in unix seconds.
    pub capture_timestamp: Option<i64>,
}

/// Timestamp object as written by the export tool.
#[derive(Debug, Default, Deserialize)]
struct TimeInfo {
    #[serde(default)]
    timestamp: String,
}

/// Raw sidecar layout, only the fields used here.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSidecar {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    creation_time: Option<TimeInfo>,
    #[serde(default)]
    photo_taken_time: Option<TimeInfo>,
}

impl SidecarRecord {
    /// Parse sidecar JSON content.
    ///
    /// # Errors
    /// Returns an error for malformed JSON or a timestamp that is not a decimal integer.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let raw: RawSidecar = serde_json::from_slice(bytes).context("Invalid sidecar JSON")?;
        let creation_timestamp =
            parse_timestamp(raw.creation_time.as_ref()).context("Invalid creationTime timestamp")?;
        let capture_timestamp =
            parse_timestamp(raw.photo_taken_time.as_ref()).context("Invalid photoTakenTime timestamp")?;

        Ok(Self {
            title: raw.title,
            description: raw.description,
            creation_timestamp,
            capture_timestamp,
        })
    }

    /// Read and parse a sidecar file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&bytes).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Capture timestamp, or the creation timestamp when capture time is missing.
    #[must_use]
    pub const fn timestamp(&self) -> Option<i64> {
        match self.capture_timestamp {
            Some(seconds) => Some(seconds),
            None => self.creation_timestamp,
        }
    }

    /// Resolved capture time in UTC, `None` if the sidecar carries no timestamp at all.
    ///
    /// # Errors
    /// Returns an error if the timestamp is out of range.
    pub fn capture_time(&self) -> Result<Option<CaptureTime>> {
        self.timestamp().map(CaptureTime::from_unix).transpose()
    }
}

/// Empty timestamp strings count as missing.
fn parse_timestamp(info: Option<&TimeInfo>) -> Result<Option<i64>> {
    let Some(value) = info.map(|info| info.timestamp.trim()).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    value
        .parse::<i64>()
        .map(Some)
        .with_context(|| format!("Not a unix timestamp: '{value}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_sidecar() {
        let json = br#"{
            "title": "IMG_0001.jpg",
            "description": "beach",
            "imageViews": "3",
            "creationTime": { "timestamp": "1610000000", "formatted": "Jan 7, 2021" },
            "photoTakenTime": { "timestamp": "1609459200", "formatted": "Jan 1, 2021" },
            "geoData": { "latitude": 0.0, "longitude": 0.0 }
        }"#;
        let record = SidecarRecord::parse(json).unwrap();
        assert_eq!(record.title, "IMG_0001.jpg");
        assert_eq!(record.description, "beach");
        assert_eq!(record.creation_timestamp, Some(1_610_000_000));
        assert_eq!(record.capture_timestamp, Some(1_609_459_200));
    }

    #[test]
    fn test_capture_time_takes_precedence() {
        let json = br#"{
            "title": "a.jpg",
            "creationTime": { "timestamp": "1592224245" },
            "photoTakenTime": { "timestamp": "1520668800" }
        }"#;
        let record = SidecarRecord::parse(json).unwrap();
        assert_eq!(record.timestamp(), Some(1_520_668_800));
        let time = record.capture_time().unwrap().unwrap();
        assert_eq!(time.stamp(), "2018_03_10_080000");
    }

    #[test]
    fn test_creation_time_used_without_capture_time() {
        let json = br#"{ "title": "a.jpg", "creationTime": { "timestamp": "1592224245" } }"#;
        let record = SidecarRecord::parse(json).unwrap();
        assert_eq!(record.capture_timestamp, None);
        assert_eq!(record.timestamp(), Some(1_592_224_245));
    }

    #[test]
    fn test_no_timestamps() {
        let record = SidecarRecord::parse(br#"{ "title": "a.jpg" }"#).unwrap();
        assert_eq!(record.timestamp(), None);
        assert!(record.capture_time().unwrap().is_none());
    }

    #[test]
    fn test_empty_timestamp_counts_as_missing() {
        let json = br#"{
            "title": "a.jpg",
            "creationTime": { "timestamp": "1592224245" },
            "photoTakenTime": { "timestamp": "" }
        }"#;
        let record = SidecarRecord::parse(json).unwrap();
        assert_eq!(record.capture_timestamp, None);
        assert_eq!(record.timestamp(), Some(1_592_224_245));
    }

    #[test]
    fn test_non_numeric_timestamp_is_error() {
        let json = br#"{ "title": "a.jpg", "photoTakenTime": { "timestamp": "yesterday" } }"#;
        assert!(SidecarRecord::parse(json).is_err());
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(SidecarRecord::parse(b"{ \"title\": ").is_err());
        assert!(SidecarRecord::parse(b"[]").is_err());
    }

    #[test]
    fn test_read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jpg.json");
        fs::write(&path, r#"{ "title": "a.jpg", "photoTakenTime": { "timestamp": "1609459200" } }"#).unwrap();
        let record = SidecarRecord::read(&path).unwrap();
        assert_eq!(record.capture_timestamp, Some(1_609_459_200));
        assert!(SidecarRecord::read(&dir.path().join("missing.json")).is_err());
    }
}
