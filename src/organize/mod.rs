//! Reorganize a photo export directory of media files and their JSON sidecars.
//!
//! Supports grouping pairs into year-month directories, renaming them to a
//! canonical date-based name, and flattening grouped directories again.

mod config;
pub mod listing;
pub mod matcher;
pub mod mover;
mod organizer;
pub mod planner;
pub mod sidecar;

pub use config::{OrganizeConfig, TakeoutConfig};
pub use listing::{DirectoryEntry, DirectoryListing};
pub use matcher::{FilePair, MatchStep};
pub use organizer::{MatchFailure, Operation, Organizer, Summary};
pub use sidecar::SidecarRecord;
