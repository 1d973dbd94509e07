use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use unicode_normalization::UnicodeNormalization;

/// Extension used by sidecar metadata files.
pub const SIDECAR_EXTENSION: &str = ".json";

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Name as stored on disk.
    pub name: String,
    pub is_dir: bool,
    /// NFC form of the name used for comparisons.
    key: String,
}

/// Snapshot of one directory's entries.
///
/// Kept in sync with moves made during a run, so lookups reflect
/// the directory state without re-reading it.
#[derive(Debug, Clone)]
pub struct DirectoryListing {
    root: PathBuf,
    entries: Vec<DirectoryEntry>,
}

impl DirectoryEntry {
    pub fn new(name: impl Into<String>, is_dir: bool) -> Self {
        let name = name.into();
        let key = normalize(&name);
        Self { name, is_dir, key }
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, false)
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self::new(name, true)
    }

    /// Sidecar file that is not a macOS resource fork (`._` prefix).
    #[must_use]
    pub fn is_sidecar(&self) -> bool {
        !self.is_dir && self.name.ends_with(SIDECAR_EXTENSION) && !self.name.starts_with("._")
    }
}

impl DirectoryListing {
    /// Read the immediate entries of a directory.
    /// Entries with names that are not valid Unicode are left out.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be read.
    pub fn read(dir: &Path) -> Result<Self> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir).with_context(|| format!("Failed to read directory {}", dir.display()))? {
            let entry = entry.with_context(|| format!("Failed to read entry in {}", dir.display()))?;
            let is_dir = entry.file_type()?.is_dir();
            if let Ok(name) = entry.file_name().into_string() {
                entries.push(DirectoryEntry::new(name, is_dir));
            } else {
                crate::print_warning!("Skipping non-Unicode name in {}", dir.display());
            }
        }
        Ok(Self::from_entries(dir.to_path_buf(), entries))
    }

    /// Build a listing from given entries, sorted by name.
    #[must_use]
    pub fn from_entries(root: PathBuf, mut entries: Vec<DirectoryEntry>) -> Self {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Self { root, entries }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path for an entry name in this directory.
    #[must_use]
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Find a file (not a directory) by name.
    #[must_use]
    pub fn find_file(&self, name: &str) -> Option<&DirectoryEntry> {
        let key = normalize(name);
        self.entries.iter().find(|entry| !entry.is_dir && entry.key == key)
    }

    #[must_use]
    pub fn contains_file(&self, name: &str) -> bool {
        self.find_file(name).is_some()
    }

    /// Check for a file or directory with the given name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        let key = normalize(name);
        self.entries.iter().any(|entry| entry.key == key)
    }

    /// Files whose name starts with the given prefix, case-sensitive.
    #[must_use]
    pub fn files_with_prefix(&self, prefix: &str) -> Vec<&DirectoryEntry> {
        let prefix = normalize(prefix);
        self.entries
            .iter()
            .filter(|entry| !entry.is_dir && entry.key.starts_with(&prefix))
            .collect()
    }

    /// Sidecar file names in sorted order.
    #[must_use]
    pub fn sidecar_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.is_sidecar())
            .map(|entry| entry.name.clone())
            .collect()
    }

    /// Subdirectory names in sorted order.
    #[must_use]
    pub fn directory_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.is_dir)
            .map(|entry| entry.name.clone())
            .collect()
    }

    /// Drop an entry after it has been moved out of this directory.
    pub fn remove(&mut self, name: &str) {
        let key = normalize(name);
        self.entries.retain(|entry| entry.key != key);
    }

    /// Register a file that now exists in this directory.
    pub fn insert_file(&mut self, name: &str) {
        if self.contains_file(name) {
            return;
        }
        let entry = DirectoryEntry::file(name);
        let index = self.entries.partition_point(|existing| existing.name < entry.name);
        self.entries.insert(index, entry);
    }

    /// Record a rename within this directory.
    pub fn rename(&mut self, from: &str, to: &str) {
        if from != to {
            self.remove(from);
            self.insert_file(to);
        }
    }
}

fn normalize(name: &str) -> String {
    name.nfc().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs::File;

    fn listing(names: &[&str]) -> DirectoryListing {
        DirectoryListing::from_entries(
            PathBuf::from("/photos"),
            names.iter().map(|name| DirectoryEntry::file(*name)).collect(),
        )
    }

    #[test]
    fn test_read_directory() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("b.jpg")).unwrap();
        File::create(dir.path().join("b.jpg.json")).unwrap();
        File::create(dir.path().join("._b.jpg.json")).unwrap();
        fs::create_dir(dir.path().join("album")).unwrap();

        let listing = DirectoryListing::read(dir.path()).unwrap();
        assert!(listing.contains_file("b.jpg"));
        assert!(!listing.contains_file("album"));
        assert_eq!(listing.sidecar_names(), vec!["b.jpg.json"]);
        assert_eq!(listing.directory_names(), vec!["album"]);
    }

    #[test]
    fn test_read_missing_directory() {
        assert!(DirectoryListing::read(Path::new("/nonexistent/takeout")).is_err());
    }

    #[test]
    fn test_prefix_is_case_sensitive() {
        let listing = listing(&["Photo.jpg", "photo.png", "photo.png.json"]);
        let names: Vec<&str> = listing
            .files_with_prefix("photo")
            .iter()
            .map(|entry| entry.name.as_str())
            .collect();
        assert_eq!(names, vec!["photo.png", "photo.png.json"]);
    }

    #[test]
    fn test_decomposed_name_matches_composed_query() {
        // "a\u{308}" is the decomposed form of "ä"
        let listing = listing(&["Sa\u{308}rkija\u{308}rvi.jpg"]);
        let entry = listing.find_file("S\u{e4}rkij\u{e4}rvi.jpg").unwrap();
        assert_eq!(entry.name, "Sa\u{308}rkija\u{308}rvi.jpg");
    }

    #[test]
    fn test_rename_and_remove_keep_listing_current() {
        let mut listing = listing(&["a.jpg", "a.jpg.json"]);
        listing.rename("a.jpg", "IMG_2021_01_01_000000_001.jpg");
        assert!(!listing.contains_file("a.jpg"));
        assert!(listing.contains_file("IMG_2021_01_01_000000_001.jpg"));

        listing.remove("a.jpg.json");
        assert!(listing.sidecar_names().is_empty());
    }
}
