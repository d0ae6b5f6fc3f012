// SPDX-License-Identifier: GPL-3.0-only

//! Directory-backed media library
//!
//! Entries live under `<root>/<relative_path>/`. While pending, an entry's
//! file carries a hidden `.pending-<id>-` prefix so gallery apps and
//! [`MediaLibrary::query_visible`] skip it; publishing renames it into place.
//!
//! Only pending entries are tracked in memory. A published entry is the file
//! itself and is addressed by its `file://` URI. Visible entries are
//! discovered by scanning `<root>/DCIM` and its immediate subdirectories, so
//! media from earlier runs shows up too.

use super::{MediaCollection, MediaLibrary, MediaUri, MediaValues, PersistedMediaEntry};
use crate::constants::media::{DCIM_DIRECTORY, PENDING_PREFIX};
use crate::errors::PersistenceError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct PendingEntry {
    values: MediaValues,
    path: PathBuf,
}

/// Media library stored in a directory tree
pub struct FsMediaLibrary {
    root: PathBuf,
    pending: Mutex<HashMap<MediaUri, PendingEntry>>,
}

impl FsMediaLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<MediaUri, PendingEntry>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of entries not yet published
    pub fn pending_count(&self) -> usize {
        self.pending().len()
    }

    /// File behind `uri`: a tracked pending entry or a published file
    fn path_of(&self, uri: &MediaUri) -> Result<PathBuf, PersistenceError> {
        if let Some(entry) = self.pending().get(uri) {
            return Ok(entry.path.clone());
        }
        uri.file_path()
            .filter(|path| path.starts_with(&self.root) && path.is_file())
            .ok_or_else(|| PersistenceError::NotFound(uri.to_string()))
    }

    fn pending_path(dir: &Path, id: &Uuid, display_name: &str) -> PathBuf {
        dir.join(format!("{}{}-{}", PENDING_PREFIX, id, display_name))
    }

    fn scan_dir(
        dir: &Path,
        relative_path: &str,
        collection: MediaCollection,
        out: &mut Vec<PersistedMediaEntry>,
    ) {
        let Ok(read_dir) = std::fs::read_dir(dir) else {
            return;
        };

        for entry in read_dir.flatten() {
            let path = entry.path();
            let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            if name.starts_with('.') || !path.is_file() {
                continue;
            }
            if MediaCollection::from_path(&path) != Some(collection) {
                continue;
            }

            let modified: DateTime<Utc> = entry
                .metadata()
                .and_then(|m| m.modified())
                .map(DateTime::from)
                .unwrap_or_else(|_| Utc::now());
            let date_taken_millis =
                taken_millis_from_name(&name).unwrap_or_else(|| modified.timestamp_millis());

            out.push(PersistedMediaEntry {
                uri: MediaUri::for_file(&path),
                collection,
                values: MediaValues {
                    display_name: name,
                    relative_path: relative_path.to_string(),
                    mime_type: mime_for(&path).to_string(),
                    date_added_secs: modified.timestamp(),
                    date_modified_secs: modified.timestamp(),
                    date_taken_millis,
                    is_pending: false,
                },
            });
        }
    }
}

/// Leading epoch-millis of names like `1700000000000_image.jpg`
fn taken_millis_from_name(name: &str) -> Option<i64> {
    name.split('_').next()?.parse().ok()
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        _ => "application/octet-stream",
    }
}

/// First free name in `dir`: `name`, then `stem (1).ext`, `stem (2).ext`, ...
fn unique_destination(dir: &Path, display_name: &str) -> PathBuf {
    let candidate = dir.join(display_name);
    if !candidate.exists() {
        return candidate;
    }

    let path = Path::new(display_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| display_name.to_string());
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    (1..)
        .map(|n| match &extension {
            Some(ext) => dir.join(format!("{} ({}).{}", stem, n, ext)),
            None => dir.join(format!("{} ({})", stem, n)),
        })
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

impl MediaLibrary for FsMediaLibrary {
    fn insert(
        &self,
        collection: MediaCollection,
        values: &MediaValues,
    ) -> Result<MediaUri, PersistenceError> {
        let dir = self.root.join(&values.relative_path);
        std::fs::create_dir_all(&dir)
            .map_err(|e| PersistenceError::InsertFailed(format!("{}: {}", dir.display(), e)))?;

        if !values.is_pending {
            let path = unique_destination(&dir, &values.display_name);
            File::create(&path).map_err(|e| {
                PersistenceError::InsertFailed(format!("{}: {}", path.display(), e))
            })?;
            debug!(path = %path.display(), "Media file inserted");
            return Ok(MediaUri::for_file(&path));
        }

        let id = Uuid::new_v4();
        let path = Self::pending_path(&dir, &id, &values.display_name);
        File::create(&path)
            .map_err(|e| PersistenceError::InsertFailed(format!("{}: {}", path.display(), e)))?;

        let uri = MediaUri::new(collection, id);
        debug!(%uri, path = %path.display(), "Pending media entry inserted");

        self.pending().insert(
            uri.clone(),
            PendingEntry {
                values: values.clone(),
                path,
            },
        );
        Ok(uri)
    }

    fn open_output_stream(
        &self,
        uri: &MediaUri,
    ) -> Result<Box<dyn Write + Send>, PersistenceError> {
        let path = self.path_of(uri)?;
        let file = File::create(&path)
            .map_err(|e| PersistenceError::OpenFailed(format!("{}: {}", path.display(), e)))?;
        Ok(Box::new(std::io::BufWriter::new(file)))
    }

    fn set_pending(&self, uri: &MediaUri, pending: bool) -> Result<MediaUri, PersistenceError> {
        let tracked = self.pending().get(uri).cloned();
        let Some(entry) = tracked else {
            // Published files are not tracked and cannot be hidden again
            return match self.path_of(uri) {
                Ok(_) if !pending => Ok(uri.clone()),
                Ok(path) => Err(PersistenceError::UpdateFailed(format!(
                    "{}: already published",
                    path.display()
                ))),
                Err(e) => Err(e),
            };
        };
        if pending {
            return Ok(uri.clone());
        }

        let dir = self.root.join(&entry.values.relative_path);
        let destination = unique_destination(&dir, &entry.values.display_name);
        std::fs::rename(&entry.path, &destination).map_err(|e| {
            PersistenceError::UpdateFailed(format!(
                "{} -> {}: {}",
                entry.path.display(),
                destination.display(),
                e
            ))
        })?;
        self.pending().remove(uri);

        let published = MediaUri::for_file(&destination);
        debug!(%uri, %published, "Media entry published");
        Ok(published)
    }

    fn delete(&self, uri: &MediaUri) -> Result<(), PersistenceError> {
        let removed = self.pending().remove(uri);
        let path = match removed {
            Some(entry) => entry.path,
            None => self.path_of(uri)?,
        };

        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(%uri, path = %path.display(), "Media file already gone");
                Ok(())
            }
            Err(e) => Err(PersistenceError::DeleteFailed(format!(
                "{}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn query_visible(
        &self,
        collection: MediaCollection,
    ) -> Result<Vec<PersistedMediaEntry>, PersistenceError> {
        let dcim = self.root.join(DCIM_DIRECTORY);
        let mut found = Vec::new();

        if dcim.is_dir() {
            Self::scan_dir(&dcim, DCIM_DIRECTORY, collection, &mut found);
            if let Ok(read_dir) = std::fs::read_dir(&dcim) {
                for sub in read_dir.flatten() {
                    let path = sub.path();
                    let name = sub.file_name().to_string_lossy().into_owned();
                    if path.is_dir() && !name.starts_with('.') {
                        let relative_path = format!("{}/{}", DCIM_DIRECTORY, name);
                        Self::scan_dir(&path, &relative_path, collection, &mut found);
                    }
                }
            }
        }

        found.sort_by(|a, b| b.values.date_taken_millis.cmp(&a.values.date_taken_millis));
        Ok(found)
    }

    fn resolve_dir(&self, relative_path: &str) -> Option<PathBuf> {
        Some(self.root.join(relative_path))
    }
}
