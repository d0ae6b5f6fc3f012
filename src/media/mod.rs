// SPDX-License-Identifier: MPL-2.0

//! Shared media library abstraction
//!
//! Captured photos and finished recordings are published into a media
//! library that other applications read from. The contract mirrors a content
//! store: entries are inserted with a set of values, written through an output
//! stream, and only become visible once their pending flag is cleared.
//!
//! # Modules
//!
//! - [`filesystem`]: directory-backed library (`DCIM/<app>` under a media root)
//! - [`memory`]: in-memory library with failure injection

pub mod filesystem;
pub mod memory;

pub use filesystem::FsMediaLibrary;
pub use memory::{FailurePoint, InMemoryMediaLibrary};

use crate::constants::media as names;
use crate::errors::PersistenceError;
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Kind of media an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MediaCollection {
    Images,
    Video,
}

impl MediaCollection {
    pub fn name(&self) -> &'static str {
        match self {
            MediaCollection::Images => "images",
            MediaCollection::Video => "video",
        }
    }

    /// Collection for a file, judged by its extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "jpg" | "jpeg" | "png" => Some(MediaCollection::Images),
            "mp4" | "webm" | "mkv" => Some(MediaCollection::Video),
            _ => None,
        }
    }
}

/// Stable identifier of a media library entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MediaUri(String);

impl MediaUri {
    /// Content-style URI for an entry id within a collection
    pub fn new(collection: MediaCollection, id: impl std::fmt::Display) -> Self {
        Self(format!("content://media/{}/{}", collection.name(), id))
    }

    /// URI for a published file discovered on disk
    pub fn for_file(path: &Path) -> Self {
        Self(format!("file://{}", path.display()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of a `file://` URI
    pub fn file_path(&self) -> Option<PathBuf> {
        self.0.strip_prefix("file://").map(PathBuf::from)
    }
}

impl std::fmt::Display for MediaUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Column values of a media library entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaValues {
    pub display_name: String,
    /// Path relative to the media root, e.g. `DCIM/SimpleSnap`
    pub relative_path: String,
    pub mime_type: String,
    pub date_added_secs: i64,
    pub date_modified_secs: i64,
    pub date_taken_millis: i64,
    /// Pending entries are invisible to other readers
    pub is_pending: bool,
}

impl MediaValues {
    /// Values for a new entry, pending until explicitly published
    pub fn pending(
        display_name: impl Into<String>,
        relative_path: impl Into<String>,
        mime_type: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            relative_path: relative_path.into(),
            mime_type: mime_type.into(),
            date_added_secs: now.timestamp(),
            date_modified_secs: now.timestamp(),
            date_taken_millis: now.timestamp_millis(),
            is_pending: true,
        }
    }

    /// Values for a captured photo
    pub fn photo(app_name: &str, now: DateTime<Utc>) -> Self {
        Self::pending(
            names::photo_display_name(now.timestamp_millis()),
            names::relative_path(app_name),
            names::PHOTO_MIME_TYPE,
            now,
        )
    }

    /// Values for a finished recording keeping its scratch file name
    pub fn video(display_name: impl Into<String>, app_name: &str, now: DateTime<Utc>) -> Self {
        Self::pending(
            display_name,
            names::relative_path(app_name),
            names::VIDEO_MIME_TYPE,
            now,
        )
    }
}

/// A row of the media library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedMediaEntry {
    pub uri: MediaUri,
    pub collection: MediaCollection,
    pub values: MediaValues,
}

/// Content-store style media library
///
/// All methods are blocking and must be called off the UI context.
pub trait MediaLibrary: Send + Sync {
    /// Create a new entry; returns its URI
    fn insert(
        &self,
        collection: MediaCollection,
        values: &MediaValues,
    ) -> Result<MediaUri, PersistenceError>;

    /// Open a stream that replaces the entry's content
    fn open_output_stream(&self, uri: &MediaUri)
    -> Result<Box<dyn Write + Send>, PersistenceError>;

    /// Change the pending flag; clearing it makes the entry visible
    ///
    /// Returns the URI the entry is reachable under afterwards, which a
    /// library may change on publish.
    fn set_pending(&self, uri: &MediaUri, pending: bool) -> Result<MediaUri, PersistenceError>;

    /// Remove the entry and its content
    fn delete(&self, uri: &MediaUri) -> Result<(), PersistenceError>;

    /// Visible (non-pending) entries of a collection, newest first
    fn query_visible(
        &self,
        collection: MediaCollection,
    ) -> Result<Vec<PersistedMediaEntry>, PersistenceError>;

    /// Filesystem location of a relative path, if the library is disk-backed
    fn resolve_dir(&self, _relative_path: &str) -> Option<PathBuf> {
        None
    }
}
