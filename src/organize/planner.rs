use std::fmt;
use std::path::Path;

use anyhow::Result;

use crate::date::CaptureTime;
use crate::organize::listing::SIDECAR_EXTENSION;

/// Prefix for the year-month directories created in group mode.
pub const GROUP_DIRECTORY_PREFIX: &str = "photos";

/// Highest sequence number tried when looking for a free canonical name.
pub const MAX_SEQUENCE: u32 = 999;

/// File category used as the canonical name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Gif,
    Unknown,
}

/// Media category together with the extension used for the canonical name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    pub kind: MediaKind,
    /// Lowercase extension without the leading dot, can be empty.
    pub extension: String,
}

impl MediaKind {
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Image => "IMG",
            Self::Video => "VID",
            Self::Gif => "GIF",
            Self::Unknown => "UNK",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

impl MediaType {
    /// Classify a file by the extension of its name.
    #[must_use]
    pub fn from_file_name(name: &str) -> Self {
        let extension = crate::path_to_file_extension_string(Path::new(name));
        let kind = match extension.as_str() {
            "jpg" | "jpeg" | "png" => MediaKind::Image,
            "mp4" | "mov" => MediaKind::Video,
            "gif" => MediaKind::Gif,
            _ => MediaKind::Unknown,
        };
        let extension = if extension == "jpeg" {
            "jpg".to_string()
        } else {
            extension
        };
        Self { kind, extension }
    }

    /// Classify using the sidecar title, falling back to the on-disk media name
    /// when the title carries no extension.
    #[must_use]
    pub fn from_title_or_media(title: &str, media_name: &str) -> Self {
        if Path::new(title).extension().is_some() {
            Self::from_file_name(title)
        } else {
            Self::from_file_name(media_name)
        }
    }
}

/// Group directory name for a capture time, for example `photos_2021_01`.
#[must_use]
pub fn group_directory_name(time: &CaptureTime) -> String {
    format!("{GROUP_DIRECTORY_PREFIX}_{}", time.month_key())
}

/// Canonical media name, for example `IMG_2021_01_01_123055_001.jpg`.
#[must_use]
pub fn canonical_name(media_type: &MediaType, time: &CaptureTime, sequence: u32) -> String {
    let name = format!("{}_{}_{sequence:03}", media_type.kind.prefix(), time.stamp());
    if media_type.extension.is_empty() {
        name
    } else {
        format!("{name}.{}", media_type.extension)
    }
}

/// Find the canonical name with the smallest free sequence number.
///
/// `is_taken` reports whether a name exists in the target directory.
/// A name is free when neither the media nor its sidecar is taken.
/// `current` is the pair's present media name, which counts as free.
///
/// # Errors
/// Returns an error if all sequence numbers up to [`MAX_SEQUENCE`] are taken.
pub fn next_canonical_name(
    media_type: &MediaType,
    time: &CaptureTime,
    current: Option<&str>,
    is_taken: impl Fn(&str) -> bool,
) -> Result<String> {
    for sequence in 1..=MAX_SEQUENCE {
        let name = canonical_name(media_type, time, sequence);
        if current == Some(name.as_str()) {
            return Ok(name);
        }
        if !is_taken(&name) && !is_taken(&format!("{name}{SIDECAR_EXTENSION}")) {
            return Ok(name);
        }
    }
    anyhow::bail!(
        "No free sequence number left for {}",
        canonical_name(media_type, time, MAX_SEQUENCE)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs::File;

    fn exists_in(dir: &Path) -> impl Fn(&str) -> bool + '_ {
        move |name| dir.join(name).exists()
    }

    fn new_year() -> CaptureTime {
        CaptureTime::from_unix(1_609_459_200).unwrap()
    }

    #[test]
    fn test_group_directory_name() {
        assert_eq!(group_directory_name(&new_year()), "photos_2021_01");
        let time = CaptureTime::from_unix(1_562_231_103).unwrap();
        assert_eq!(group_directory_name(&time), "photos_2019_07");
    }

    #[test]
    fn test_media_type_from_extension() {
        let cases = [
            ("a.jpg", MediaKind::Image, "jpg"),
            ("a.JPEG", MediaKind::Image, "jpg"),
            ("a.png", MediaKind::Image, "png"),
            ("a.MP4", MediaKind::Video, "mp4"),
            ("a.mov", MediaKind::Video, "mov"),
            ("a.gif", MediaKind::Gif, "gif"),
            ("a.HEIC", MediaKind::Unknown, "heic"),
            ("README", MediaKind::Unknown, ""),
        ];
        for (name, kind, extension) in cases {
            let media_type = MediaType::from_file_name(name);
            assert_eq!(media_type.kind, kind, "{name}");
            assert_eq!(media_type.extension, extension, "{name}");
        }
    }

    #[test]
    fn test_media_type_falls_back_to_media_name() {
        let media_type = MediaType::from_title_or_media("Untitled", "clip.mov");
        assert_eq!(media_type.kind, MediaKind::Video);
        let media_type = MediaType::from_title_or_media("IMG_1.png", "IMG_1.jpg");
        assert_eq!(media_type.extension, "png");
    }

    #[test]
    fn test_canonical_name() {
        let time = CaptureTime::from_unix(1_562_231_103).unwrap();
        let media_type = MediaType::from_file_name("clip.mp4");
        assert_eq!(canonical_name(&media_type, &time, 7), "VID_2019_07_04_090503_007.mp4");
    }

    #[test]
    fn test_canonical_name_without_extension() {
        let media_type = MediaType::from_file_name("noext");
        assert_eq!(canonical_name(&media_type, &new_year(), 1), "UNK_2021_01_01_000000_001");
    }

    #[test]
    fn test_next_name_is_smallest_free_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let media_type = MediaType::from_file_name("a.jpg");
        File::create(dir.path().join("IMG_2021_01_01_000000_001.jpg")).unwrap();
        File::create(dir.path().join("IMG_2021_01_01_000000_002.jpg.json")).unwrap();
        File::create(dir.path().join("IMG_2021_01_01_000000_004.jpg")).unwrap();

        let first = next_canonical_name(&media_type, &new_year(), None, exists_in(dir.path())).unwrap();
        let second = next_canonical_name(&media_type, &new_year(), None, exists_in(dir.path())).unwrap();
        assert_eq!(first, "IMG_2021_01_01_000000_003.jpg");
        assert_eq!(first, second);
    }

    #[test]
    fn test_next_name_keeps_current_name() {
        let dir = tempfile::tempdir().unwrap();
        let media_type = MediaType::from_file_name("a.jpg");
        File::create(dir.path().join("IMG_2021_01_01_000000_001.jpg")).unwrap();

        let name = next_canonical_name(
            &media_type,
            &new_year(),
            Some("IMG_2021_01_01_000000_001.jpg"),
            exists_in(dir.path()),
        )
        .unwrap();
        assert_eq!(name, "IMG_2021_01_01_000000_001.jpg");
    }

    #[test]
    fn test_next_name_exhausted() {
        let dir = tempfile::tempdir().unwrap();
        let media_type = MediaType::from_file_name("a.gif");
        for sequence in 1..=MAX_SEQUENCE {
            File::create(dir.path().join(canonical_name(&media_type, &new_year(), sequence))).unwrap();
        }
        assert!(next_canonical_name(&media_type, &new_year(), None, exists_in(dir.path())).is_err());
    }
}
