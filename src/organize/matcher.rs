//! Resolve which media file a sidecar describes.
//!
//! The export tool does not always name a sidecar `<media name>.json`.
//! Long names get truncated for both files, and colliding names get a
//! `(N)` counter that lands in a different place for the media and the sidecar.
//! Resolution tries the heuristics below in order and stops at the first hit:
//!
//! 1. Exact strip: `photo.jpg.json` -> `photo.jpg`
//! 2. Prefix match: `PXL_1.LONG.ORIGIN.json` -> `PXL_1.LONG.ORIGINA.jpg`,
//!    when that is the only other file sharing the prefix
//! 3. Duplicate suffix: `photo.jpg(1).json` -> `photo(1).jpg`
//! 4. Title: the `title` field of the sidecar

use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::organize::listing::{DirectoryListing, SIDECAR_EXTENSION};
use crate::organize::sidecar::SidecarRecord;

static RE_DUPLICATE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<base>.+)\((?P<number>\d+)\)\.json$").expect("Failed to create regex pattern for duplicate suffix")
});

/// Heuristic that resolved a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStep {
    ExactStrip,
    PrefixGlob,
    DuplicateSuffix,
    Title,
}

/// A sidecar and the media file it describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePair {
    pub sidecar_path: PathBuf,
    pub media_path: PathBuf,
    /// Name the media should carry at its destination.
    pub canonical_name: String,
    pub step: MatchStep,
}

/// Outcome of a single heuristic.
enum Attempt {
    Found { media: String, name: String },
    /// Try the next heuristic.
    Next,
    /// Stop without a match.
    Unresolved,
}

impl fmt::Display for MatchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ExactStrip => "exact",
            Self::PrefixGlob => "prefix",
            Self::DuplicateSuffix => "duplicate suffix",
            Self::Title => "title",
        };
        write!(f, "{name}")
    }
}

/// Find the media file for the given sidecar in the listing.
///
/// Returns `None` if no heuristic finds a match.
#[must_use]
pub fn resolve(listing: &DirectoryListing, sidecar_name: &str, record: &SidecarRecord) -> Option<FilePair> {
    let candidate = sidecar_name.strip_suffix(SIDECAR_EXTENSION)?;
    if candidate.is_empty() {
        return None;
    }

    let attempts: [(MatchStep, &dyn Fn() -> Attempt); 4] = [
        (MatchStep::ExactStrip, &|| exact_strip(listing, candidate)),
        (MatchStep::PrefixGlob, &|| prefix_glob(listing, candidate, sidecar_name, record)),
        (MatchStep::DuplicateSuffix, &|| duplicate_suffix(listing, sidecar_name)),
        (MatchStep::Title, &|| title(listing, sidecar_name, record)),
    ];

    for (step, attempt) in attempts {
        match attempt() {
            Attempt::Found { media, name } => {
                return Some(FilePair {
                    sidecar_path: listing.path(sidecar_name),
                    media_path: listing.path(&media),
                    canonical_name: name,
                    step,
                });
            }
            Attempt::Next => {}
            Attempt::Unresolved => return None,
        }
    }

    None
}

fn exact_strip(listing: &DirectoryListing, candidate: &str) -> Attempt {
    listing.find_file(candidate).map_or(Attempt::Next, |entry| Attempt::Found {
        media: entry.name.clone(),
        name: candidate.to_string(),
    })
}

/// Both names truncated to a common prefix.
/// Only trusted when the sidecar and exactly one other file share it.
fn prefix_glob(listing: &DirectoryListing, candidate: &str, sidecar_name: &str, record: &SidecarRecord) -> Attempt {
    let matches = listing.files_with_prefix(candidate);
    if matches.len() != 2 {
        return Attempt::Next;
    }

    let Some(media) = matches.iter().find(|entry| entry.name != sidecar_name) else {
        return Attempt::Next;
    };
    if media.name.ends_with(SIDECAR_EXTENSION) {
        return Attempt::Next;
    }

    let name = if record.title.is_empty() {
        media.name.clone()
    } else {
        record.title.clone()
    };
    Attempt::Found {
        media: media.name.clone(),
        name,
    }
}

/// `<stem>.<ext>(<N>).json` belongs to `<stem>(<N>).<ext>`.
fn duplicate_suffix(listing: &DirectoryListing, sidecar_name: &str) -> Attempt {
    let Some(captures) = RE_DUPLICATE_SUFFIX.captures(sidecar_name) else {
        return Attempt::Next;
    };

    let base = &captures["base"];
    let number = &captures["number"];
    let parts: Vec<&str> = base.split('.').collect();
    let [stem, extension] = parts.as_slice() else {
        return Attempt::Unresolved;
    };

    let media = format!("{stem}({number}).{extension}");
    listing.find_file(&media).map_or(Attempt::Unresolved, |entry| Attempt::Found {
        media: entry.name.clone(),
        name: media.clone(),
    })
}

fn title(listing: &DirectoryListing, sidecar_name: &str, record: &SidecarRecord) -> Attempt {
    if record.title.is_empty() || record.title == sidecar_name {
        return Attempt::Next;
    }
    listing.find_file(&record.title).map_or(Attempt::Next, |entry| Attempt::Found {
        media: entry.name.clone(),
        name: record.title.clone(),
    })
}
