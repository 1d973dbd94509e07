use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::organize::listing::SIDECAR_EXTENSION;

/// Result of moving a media and sidecar pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairMove {
    Moved { media: PathBuf, sidecar: PathBuf },
    /// Both files already have their target names.
    Unchanged,
    /// Pre-flight check failed, nothing was touched.
    Skipped(String),
}

/// Move a media and sidecar pair to `dest_dir` under `new_base_name`.
///
/// The sidecar gets the name `<new_base_name>.json`.
/// Both sources must exist and neither target may exist before anything is renamed.
/// `dest_dir` is created once those checks pass.
/// The media is moved first: if the sidecar rename then fails,
/// the media stays in its new location.
///
/// # Errors
/// Returns an error if the directory cannot be created or a rename fails.
pub fn move_pair(dest_dir: &Path, sidecar_path: &Path, media_path: &Path, new_base_name: &str) -> Result<PairMove> {
    let media_target = dest_dir.join(new_base_name);
    let sidecar_target = dest_dir.join(format!("{new_base_name}{SIDECAR_EXTENSION}"));

    if let Some(reason) = preflight(sidecar_path, media_path, &sidecar_target, &media_target) {
        return Ok(PairMove::Skipped(reason));
    }

    let move_media = media_path != media_target;
    let move_sidecar = sidecar_path != sidecar_target;
    if !move_media && !move_sidecar {
        return Ok(PairMove::Unchanged);
    }

    fs::create_dir_all(dest_dir).with_context(|| format!("Failed to create directory {}", dest_dir.display()))?;
    if move_media {
        fs::rename(media_path, &media_target).with_context(|| {
            format!(
                "Failed to move {} to {}",
                media_path.display(),
                media_target.display()
            )
        })?;
    }
    if move_sidecar {
        fs::rename(sidecar_path, &sidecar_target).with_context(|| {
            format!(
                "Failed to move {} to {} (media already moved to {})",
                sidecar_path.display(),
                sidecar_target.display(),
                media_target.display()
            )
        })?;
    }

    Ok(PairMove::Moved {
        media: media_target,
        sidecar: sidecar_target,
    })
}

/// Check both paths of the pair before renaming either one.
fn preflight(sidecar_path: &Path, media_path: &Path, sidecar_target: &Path, media_target: &Path) -> Option<String> {
    if !media_path.is_file() {
        return Some(format!("media file no longer exists: {}", media_path.display()));
    }
    if !sidecar_path.is_file() {
        return Some(format!("sidecar no longer exists: {}", sidecar_path.display()));
    }
    if media_target != media_path && media_target.exists() {
        return Some(format!("target already exists: {}", media_target.display()));
    }
    if sidecar_target != sidecar_path && sidecar_target.exists() {
        return Some(format!("target already exists: {}", sidecar_target.display()));
    }
    None
}

/// Move every entry of `subdir` into `parent` and remove the emptied directory.
///
/// Returns the number of entries moved.
///
/// # Errors
/// Returns an error if an entry name already exists in `parent`,
/// if a rename fails, or if the directory is not empty afterwards.
pub fn flatten_directory(parent: &Path, subdir: &Path) -> Result<usize> {
    let moves = plan_flatten(parent, subdir)?;

    for (source, target) in &moves {
        fs::rename(source, target)
            .with_context(|| format!("Failed to move {} to {}", source.display(), target.display()))?;
    }

    fs::remove_dir(subdir).with_context(|| format!("Failed to remove directory {}", subdir.display()))?;

    Ok(moves.len())
}

/// Source and target paths for flattening `subdir` into `parent`.
///
/// # Errors
/// Returns an error if the directory cannot be read or a target name is taken.
pub fn plan_flatten(parent: &Path, subdir: &Path) -> Result<Vec<(PathBuf, PathBuf)>> {
    let mut moves = Vec::new();
    for entry in fs::read_dir(subdir).with_context(|| format!("Failed to read directory {}", subdir.display()))? {
        let entry = entry.with_context(|| format!("Failed to read entry in {}", subdir.display()))?;
        let target = parent.join(entry.file_name());
        if target.exists() {
            anyhow::bail!(
                "Cannot move {} up: {} already exists",
                entry.path().display(),
                target.display()
            );
        }
        moves.push((entry.path(), target));
    }
    moves.sort();
    Ok(moves)
}
