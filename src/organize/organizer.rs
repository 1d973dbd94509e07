use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use walkdir::WalkDir;

use crate::date::CaptureTime;
use crate::organize::config::OrganizeConfig;
use crate::organize::listing::{DirectoryListing, SIDECAR_EXTENSION};
use crate::organize::matcher::{self, FilePair};
use crate::organize::mover::{self, PairMove};
use crate::organize::planner::{self, MediaType};
use crate::organize::sidecar::SidecarRecord;
use crate::{get_relative_path_or_filename, path_to_filename_string, print_bold, print_error, print_warning};

const PROGRESS_BAR_CHARS: &str = "=> ";
const PROGRESS_BAR_TEMPLATE: &str = "[{elapsed_precise}] {bar:80.magenta/blue} {pos}/{len} {percent}%";

/// Reorganize a photo export directory.
#[derive(Debug)]
pub struct Organizer {
    root: PathBuf,
    config: OrganizeConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Move pairs into year-month directories.
    Group,
    /// Rename pairs to the canonical name pattern.
    Rename,
    /// Flatten subdirectories into the root.
    Ungroup,
}

/// A sidecar that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchFailure {
    /// Sidecar path relative to the root directory.
    pub sidecar: String,
    pub reason: String,
}

/// Counts and failures from one run.
#[derive(Debug)]
pub struct Summary {
    pub operation: Operation,
    pub processed: usize,
    /// Sidecars without any timestamp.
    pub skipped: usize,
    /// Unique by sidecar, in the order they were encountered.
    pub failures: Vec<MatchFailure>,
    failed_sidecars: HashSet<String>,
}

impl Organizer {
    #[must_use]
    pub const fn new(root: PathBuf, config: OrganizeConfig) -> Self {
        Self { root, config }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run the given operation on the root directory.
    ///
    /// # Errors
    /// Returns an error on the first fatal failure.
    pub fn run(&self, operation: Operation) -> Result<Summary> {
        if self.config.debug {
            eprintln!("{}", self.config);
            eprintln!("Root: {}", self.root.display());
        }
        match operation {
            Operation::Group => self.group(),
            Operation::Rename => self.rename(),
            Operation::Ungroup => self.ungroup(),
        }
    }

    /// Move each media and sidecar pair in the root directory to `photos_<YYYY>_<MM>`.
    ///
    /// # Errors
    /// Returns an error if a sidecar is invalid and `skip_invalid` is not set,
    /// a directory cannot be created, or a rename fails.
    pub fn group(&self) -> Result<Summary> {
        print_bold!("Grouping files in {}", self.root.display());

        let mut listing = DirectoryListing::read(&self.root)?;
        let sidecars = listing.sidecar_names();
        println!("Found {} sidecar files", sidecars.len());

        let mut summary = Summary::new(Operation::Group);
        let progress_bar = self.create_progress_bar(sidecars.len() as u64);

        for sidecar_name in sidecars {
            let display_name = self.relative_name(&listing.path(&sidecar_name));
            let Some((record, time)) =
                self.read_sidecar(&listing.path(&sidecar_name), &display_name, &progress_bar, &mut summary)?
            else {
                continue;
            };

            let Some(pair) = matcher::resolve(&listing, &sidecar_name, &record) else {
                summary.record_failure(&display_name, "no matching media file");
                continue;
            };

            let directory_name = planner::group_directory_name(&time);
            let target_dir = self.root.join(&directory_name);
            let media_name = path_to_filename_string(&pair.media_path);

            if self.config.dryrun {
                println!(
                    "{} {media_name} -> {directory_name}/{} ({})",
                    "Dryrun:".cyan().bold(),
                    pair.canonical_name,
                    pair.step
                );
            } else if let Some(reason) = self.move_pair(&target_dir, &pair, &pair.canonical_name, &progress_bar)? {
                summary.record_failure(&display_name, &reason);
                continue;
            }

            listing.remove(&media_name);
            listing.remove(&sidecar_name);
            summary.processed += 1;
            progress_bar.inc(1);
        }

        progress_bar.finish_and_clear();
        Ok(summary)
    }

    /// Rename each media and sidecar pair in place, walking all subdirectories.
    ///
    /// # Errors
    /// Returns an error if a directory cannot be read, a sidecar is invalid and `skip_invalid` is not set,
    /// a rename fails, or no free sequence number is left for a name.
    pub fn rename(&self) -> Result<Summary> {
        print_bold!("Renaming files in {}", self.root.display());

        let mut summary = Summary::new(Operation::Rename);
        let progress_bar = self.create_progress_bar(self.count_sidecars() as u64);

        let mut worklist = vec![self.root.clone()];
        while let Some(dir) = worklist.pop() {
            let mut listing = DirectoryListing::read(&dir)?;
            // Reversed so subdirectories are popped in name order
            worklist.extend(listing.directory_names().into_iter().rev().map(|name| dir.join(name)));

            for sidecar_name in listing.sidecar_names() {
                self.rename_pair(&mut listing, &sidecar_name, &progress_bar, &mut summary)?;
            }
        }

        progress_bar.finish_and_clear();
        Ok(summary)
    }

    /// Move the contents of every immediate subdirectory into the root and remove the subdirectories.
    ///
    /// # Errors
    /// Returns an error if two entries would end up with the same name,
    /// a rename fails, or a directory cannot be removed.
    pub fn ungroup(&self) -> Result<Summary> {
        print_bold!("Ungrouping files in {}", self.root.display());

        let listing = DirectoryListing::read(&self.root)?;
        let directories = listing.directory_names();
        let mut summary = Summary::new(Operation::Ungroup);

        // Check every target name before moving anything
        let mut targets: HashSet<PathBuf> = HashSet::new();
        let mut plans = Vec::with_capacity(directories.len());
        for name in &directories {
            let subdir = self.root.join(name);
            let moves = mover::plan_flatten(&self.root, &subdir)?;
            for (source, target) in &moves {
                if !targets.insert(target.clone()) {
                    anyhow::bail!(
                        "Cannot move {} up: another subdirectory has an entry with the same name",
                        source.display()
                    );
                }
            }
            plans.push((subdir, moves));
        }

        let progress_bar = self.create_progress_bar(plans.len() as u64);
        for (subdir, moves) in plans {
            let display_name = self.relative_name(&subdir);
            if self.config.dryrun {
                println!("{} {display_name}: {} entries", "Dryrun:".cyan().bold(), moves.len());
                if self.config.verbose {
                    for (source, _) in &moves {
                        println!("  {}", path_to_filename_string(source));
                    }
                }
            } else {
                let moved = mover::flatten_directory(&self.root, &subdir)?;
                if self.config.verbose {
                    progress_bar.suspend(|| println!("Moved {moved} entries from {display_name}"));
                }
            }
            summary.processed += 1;
            progress_bar.inc(1);
        }

        progress_bar.finish_and_clear();
        Ok(summary)
    }

    fn rename_pair(
        &self,
        listing: &mut DirectoryListing,
        sidecar_name: &str,
        progress_bar: &ProgressBar,
        summary: &mut Summary,
    ) -> Result<()> {
        let display_name = self.relative_name(&listing.path(sidecar_name));
        let Some((record, time)) =
            self.read_sidecar(&listing.path(sidecar_name), &display_name, progress_bar, summary)?
        else {
            return Ok(());
        };

        let Some(pair) = matcher::resolve(listing, sidecar_name, &record) else {
            summary.record_failure(&display_name, "no matching media file");
            return Ok(());
        };

        let media_name = path_to_filename_string(&pair.media_path);
        let media_type = MediaType::from_title_or_media(&record.title, &media_name);
        let new_name = planner::next_canonical_name(&media_type, &time, Some(&media_name), |name| {
            listing.contains(name)
        })
        .with_context(|| format!("Failed to rename {display_name}"))?;

        if self.config.dryrun {
            println!("{}", "Dryrun:".cyan().bold());
            crate::show_diff(&media_name, &new_name);
        } else if let Some(reason) = self.move_pair(listing.root(), &pair, &new_name, progress_bar)? {
            summary.record_failure(&display_name, &reason);
            return Ok(());
        }

        listing.rename(&media_name, &new_name);
        listing.rename(sidecar_name, &format!("{new_name}{SIDECAR_EXTENSION}"));
        summary.processed += 1;
        progress_bar.inc(1);
        Ok(())
    }

    /// Move a resolved pair. Returns the reason if the pre-flight check refused the move.
    fn move_pair(
        &self,
        target_dir: &Path,
        pair: &FilePair,
        new_base_name: &str,
        progress_bar: &ProgressBar,
    ) -> Result<Option<String>> {
        match mover::move_pair(target_dir, &pair.sidecar_path, &pair.media_path, new_base_name)? {
            PairMove::Moved { media, .. } => {
                if self.config.verbose {
                    progress_bar.suspend(|| {
                        println!(
                            "{} -> {} ({})",
                            self.relative_name(&pair.media_path),
                            self.relative_name(&media),
                            pair.step
                        );
                    });
                }
                Ok(None)
            }
            PairMove::Unchanged => Ok(None),
            PairMove::Skipped(reason) => Ok(Some(reason)),
        }
    }

    /// Read a sidecar and its capture time.
    ///
    /// Returns `None` for sidecars that should be skipped.
    /// Parse errors abort the run unless `skip_invalid` is set.
    fn read_sidecar(
        &self,
        path: &Path,
        display_name: &str,
        progress_bar: &ProgressBar,
        summary: &mut Summary,
    ) -> Result<Option<(SidecarRecord, CaptureTime)>> {
        let parsed = SidecarRecord::read(path).and_then(|record| {
            let time = record.capture_time()?;
            Ok((record, time))
        });

        match parsed {
            Ok((record, Some(time))) => Ok(Some((record, time))),
            Ok((_, None)) => {
                progress_bar.suspend(|| print_warning!("No photo taken time found in {display_name}, skipping"));
                summary.skipped += 1;
                Ok(None)
            }
            Err(error) if self.config.skip_invalid => {
                progress_bar.suspend(|| print_error!("{error:#}"));
                summary.record_failure(display_name, &format!("{error:#}"));
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    /// Number of sidecars under the root, used as the rename progress length.
    fn count_sidecars(&self) -> usize {
        WalkDir::new(&self.root)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(SIDECAR_EXTENSION))
            .count()
    }

    fn relative_name(&self, path: &Path) -> String {
        get_relative_path_or_filename(path, &self.root)
    }

    /// Create a progress bar that is hidden during tests and when printing per-file output.
    fn create_progress_bar(&self, len: u64) -> ProgressBar {
        if cfg!(test) || self.config.dryrun || self.config.verbose {
            return ProgressBar::hidden();
        }
        let progress_bar = ProgressBar::new(len);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template(PROGRESS_BAR_TEMPLATE)
                .expect("Failed to set progress bar template")
                .progress_chars(PROGRESS_BAR_CHARS),
        );
        progress_bar
    }
}

impl Summary {
    #[must_use]
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            processed: 0,
            skipped: 0,
            failures: Vec::new(),
            failed_sidecars: HashSet::new(),
        }
    }

    /// Add a failure unless the sidecar is already listed.
    pub fn record_failure(&mut self, sidecar: &str, reason: &str) {
        if !self.failed_sidecars.insert(sidecar.to_string()) {
            return;
        }
        self.failures.push(MatchFailure {
            sidecar: sidecar.to_string(),
            reason: reason.to_string(),
        });
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Print counts and the list of failed sidecars.
    pub fn print(&self) {
        println!("\n{}", format!("{} completed", self.operation).green().bold());
        println!("Processed: {}", self.processed);
        if self.skipped > 0 {
            println!("Skipped:   {}", self.skipped);
        }
        if self.has_failures() {
            println!("{}", format!("Files with error ({}):", self.failures.len()).yellow().bold());
            for failure in &self.failures {
                println!("  {}: {}", failure.sidecar, failure.reason);
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Group => "Group",
            Self::Rename => "Rename",
            Self::Ungroup => "Ungroup",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod summary_tests {
    use super::*;

    #[test]
    fn record_failure_keeps_first_reason_per_sidecar() {
        let mut summary = Summary::new(Operation::Group);
        summary.record_failure("a.jpg.json", "no matching media file");
        summary.record_failure("b.jpg.json", "target already exists");
        summary.record_failure("a.jpg.json", "second reason");

        assert_eq!(summary.failures.len(), 2);
        assert_eq!(summary.failures[0].sidecar, "a.jpg.json");
        assert_eq!(summary.failures[0].reason, "no matching media file");
        assert_eq!(summary.failures[1].sidecar, "b.jpg.json");
    }

    #[test]
    fn record_failure_many_sidecars_in_order() {
        let mut summary = Summary::new(Operation::Rename);
        for index in 0..10_000 {
            summary.record_failure(&format!("{index}.json"), "missing");
            summary.record_failure(&format!("{index}.json"), "missing");
        }
        assert_eq!(summary.failures.len(), 10_000);
        assert_eq!(summary.failures[9_999].sidecar, "9999.json");
    }
}
