// SPDX-License-Identifier: MPL-2.0

//! Persisting photos and recordings into the shared media library
//!
//! Every write follows the same protocol:
//!
//! 1. insert a pending entry
//! 2. stream the payload into it
//! 3. clear the pending flag
//!
//! If step 2 or 3 fails the entry is deleted, so other readers never see a
//! partial file. Persistence is fire-and-forget for the caller: outcomes are
//! logged and published as [`MediaEvent`]s, never returned to the UI.

use crate::constants::{PHOTO_JPEG_QUALITY, media as names};
use crate::errors::PersistenceError;
use crate::media::{MediaCollection, MediaLibrary, MediaUri, MediaValues, PersistedMediaEntry};
use crate::pipelines::photo::{CaptureResult, encode_jpeg};
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Capacity of the media event channel
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Outcome notifications from background persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaEvent {
    /// A photo is now visible in the library
    PhotoSaved { uri: MediaUri, display_name: String },
    /// A recording is now visible in the library
    VideoSaved { uri: MediaUri, display_name: String },
    /// A write failed; the partial entry was removed
    PersistFailed {
        collection: MediaCollection,
        error: PersistenceError,
    },
    /// A recording finalized with an error and its output was dropped
    RecordingDiscarded { output: PathBuf, reason: String },
}

/// Background writer into a [`MediaLibrary`]
#[derive(Clone)]
pub struct MediaPersistence {
    library: Arc<dyn MediaLibrary>,
    app_name: Arc<str>,
    runtime: Handle,
    events: broadcast::Sender<MediaEvent>,
}

impl MediaPersistence {
    /// Create a writer whose blocking work runs on `runtime`
    pub fn new(library: Arc<dyn MediaLibrary>, app_name: &str, runtime: Handle) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            library,
            app_name: Arc::from(app_name),
            runtime,
            events,
        }
    }

    pub fn library(&self) -> &Arc<dyn MediaLibrary> {
        &self.library
    }

    /// Relative path entries are written to, e.g. `DCIM/SimpleSnap`
    pub fn relative_path(&self) -> String {
        names::relative_path(&self.app_name)
    }

    /// Subscribe to persistence outcomes
    pub fn subscribe(&self) -> broadcast::Receiver<MediaEvent> {
        self.events.subscribe()
    }

    pub(crate) fn publish(&self, event: MediaEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Persist a photo on the blocking pool
    pub fn persist_photo(&self, photo: CaptureResult) -> JoinHandle<()> {
        let this = self.clone();
        self.runtime.spawn_blocking(move || {
            match save_photo(this.library.as_ref(), &this.app_name, &photo, Utc::now()) {
                Ok((uri, display_name)) => {
                    info!(%uri, %display_name, "Photo saved");
                    this.publish(MediaEvent::PhotoSaved { uri, display_name });
                }
                Err(e) => {
                    error!(error = %e, "Failed to save photo");
                    this.publish(MediaEvent::PersistFailed {
                        collection: MediaCollection::Images,
                        error: e,
                    });
                }
            }
        })
    }

    /// Copy a finished recording into the library on the blocking pool
    ///
    /// The scratch file is removed once the copy is visible and kept if the
    /// copy failed.
    pub fn persist_video(&self, file: PathBuf) -> JoinHandle<()> {
        let this = self.clone();
        self.runtime.spawn_blocking(move || {
            match save_video(this.library.as_ref(), &this.app_name, &file, Utc::now()) {
                Ok((uri, display_name)) => {
                    info!(%uri, %display_name, "Video saved");
                    if let Err(e) = std::fs::remove_file(&file) {
                        warn!(path = %file.display(), error = %e, "Failed to remove scratch recording");
                    }
                    this.publish(MediaEvent::VideoSaved { uri, display_name });
                }
                Err(e) => {
                    error!(
                        error = %e,
                        scratch = %file.display(),
                        "Failed to save video, scratch recording kept"
                    );
                    this.publish(MediaEvent::PersistFailed {
                        collection: MediaCollection::Video,
                        error: e,
                    });
                }
            }
        })
    }

    /// Visible entries of a collection, newest first
    pub async fn latest_entries(
        &self,
        collection: MediaCollection,
    ) -> Result<Vec<PersistedMediaEntry>, PersistenceError> {
        let library = Arc::clone(&self.library);
        self.runtime
            .spawn_blocking(move || library.query_visible(collection))
            .await?
    }

    /// Directory the library stores this app's media in, if disk-backed
    pub fn media_dir(&self) -> Option<PathBuf> {
        self.library.resolve_dir(&self.relative_path())
    }
}

/// Write a photo as `<millis>_image.jpg`; returns its URI and display name
pub fn save_photo(
    library: &dyn MediaLibrary,
    app_name: &str,
    photo: &CaptureResult,
    now: DateTime<Utc>,
) -> Result<(MediaUri, String), PersistenceError> {
    let values = MediaValues::photo(app_name, now);
    let display_name = values.display_name.clone();

    let uri = write_entry(library, MediaCollection::Images, &values, |out| {
        encode_jpeg(photo.image(), PHOTO_JPEG_QUALITY, out)
    })?;
    Ok((uri, display_name))
}

/// Copy a recorded file byte for byte; returns its URI and display name
pub fn save_video(
    library: &dyn MediaLibrary,
    app_name: &str,
    file: &Path,
    now: DateTime<Utc>,
) -> Result<(MediaUri, String), PersistenceError> {
    let display_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| names::video_file_name(now.timestamp_millis()));
    let values = MediaValues::video(display_name.clone(), app_name, now);

    let uri = write_entry(library, MediaCollection::Video, &values, |out| {
        let mut input = std::fs::File::open(file).map_err(|e| {
            PersistenceError::WriteFailed(format!("{}: {}", file.display(), e))
        })?;
        let copied = std::io::copy(&mut input, out)
            .map_err(|e| PersistenceError::WriteFailed(e.to_string()))?;
        debug!(bytes = copied, "Recording copied");
        Ok(())
    })?;
    Ok((uri, display_name))
}

/// Insert a pending entry, fill it, publish it; delete it on any failure
fn write_entry<F>(
    library: &dyn MediaLibrary,
    collection: MediaCollection,
    values: &MediaValues,
    write: F,
) -> Result<MediaUri, PersistenceError>
where
    F: FnOnce(&mut dyn Write) -> Result<(), PersistenceError>,
{
    let uri = library.insert(collection, values)?;

    let result = (|| {
        let mut out = library.open_output_stream(&uri)?;
        write(&mut out)?;
        out.flush()
            .map_err(|e| PersistenceError::WriteFailed(e.to_string()))?;
        drop(out);
        library.set_pending(&uri, false)
    })();

    result.inspect_err(|e| {
        warn!(%uri, error = %e, "Write failed, deleting pending entry");
        if let Err(delete_error) = library.delete(&uri) {
            error!(%uri, error = %delete_error, "Failed to delete pending entry");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{FailurePoint, InMemoryMediaLibrary};
    use image::{Rgba, RgbaImage};

    fn photo() -> CaptureResult {
        CaptureResult::upright(RgbaImage::from_pixel(4, 6, Rgba([10, 20, 30, 255])))
    }

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    #[test]
    fn test_photo_is_visible_after_save() {
        let library = InMemoryMediaLibrary::new();
        let (uri, name) = save_photo(&library, "SimpleSnap", &photo(), at(1_700_000_000_123)).unwrap();

        assert_eq!(name, "1700000000123_image.jpg");
        let values = library.values(&uri).unwrap();
        assert!(!values.is_pending);
        assert_eq!(values.relative_path, "DCIM/SimpleSnap");
        assert_eq!(values.mime_type, "image/jpeg");
        assert_eq!(values.date_taken_millis, 1_700_000_000_123);
        assert_eq!(values.date_added_secs, 1_700_000_000);

        let bytes = library.contents(&uri).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 6));
    }

    #[test]
    fn test_failure_after_insert_leaves_no_entry() {
        for point in [
            FailurePoint::OpenStream,
            FailurePoint::Write,
            FailurePoint::SetPending,
        ] {
            let library = InMemoryMediaLibrary::new();
            library.fail_at(point);

            let result = save_photo(&library, "SimpleSnap", &photo(), at(1_000));
            assert!(result.is_err(), "{:?} should fail", point);
            assert_eq!(library.entry_count(), 0, "{:?} left an entry behind", point);
            assert!(
                library
                    .query_visible(MediaCollection::Images)
                    .unwrap()
                    .is_empty()
            );
        }
    }

    #[test]
    fn test_failed_cleanup_returns_write_error() {
        let library = InMemoryMediaLibrary::new();
        library.fail_at(FailurePoint::Write);
        library.fail_at(FailurePoint::Delete);

        let result = save_photo(&library, "SimpleSnap", &photo(), at(1_000));

        assert!(matches!(result, Err(PersistenceError::WriteFailed(_))));
        // The stranded entry stays pending, so nothing becomes visible
        assert_eq!(library.entry_count(), 1);
        assert!(
            library
                .query_visible(MediaCollection::Images)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_insert_failure_creates_nothing() {
        let library = InMemoryMediaLibrary::new();
        library.fail_at(FailurePoint::Insert);
        assert!(matches!(
            save_photo(&library, "SimpleSnap", &photo(), at(1_000)),
            Err(PersistenceError::InsertFailed(_))
        ));
        assert_eq!(library.entry_count(), 0);
    }

    #[test]
    fn test_video_copied_byte_for_byte() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("1700000000000_video.mp4");
        let payload: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        std::fs::write(&file, &payload).unwrap();

        let library = InMemoryMediaLibrary::new();
        let (uri, name) = save_video(&library, "SimpleSnap", &file, at(5_000)).unwrap();

        assert_eq!(name, "1700000000000_video.mp4");
        assert_eq!(library.contents(&uri).unwrap(), payload);
        assert_eq!(library.values(&uri).unwrap().mime_type, "video/mp4");
    }

    #[test]
    fn test_missing_video_file_cleans_up() {
        let library = InMemoryMediaLibrary::new();
        let result = save_video(
            &library,
            "SimpleSnap",
            Path::new("/nonexistent/1_video.mp4"),
            at(5_000),
        );
        assert!(matches!(result, Err(PersistenceError::WriteFailed(_))));
        assert_eq!(library.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_persist_photo_publishes_event() {
        let library = Arc::new(InMemoryMediaLibrary::new());
        let persistence = MediaPersistence::new(library.clone(), "SimpleSnap", Handle::current());
        let mut events = persistence.subscribe();

        persistence.persist_photo(photo()).await.unwrap();

        match events.recv().await.unwrap() {
            MediaEvent::PhotoSaved { uri, .. } => assert!(library.contents(&uri).is_some()),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_persist_failure_is_published_not_returned() {
        let library = Arc::new(InMemoryMediaLibrary::new());
        library.fail_at(FailurePoint::Write);
        let persistence = MediaPersistence::new(library.clone(), "SimpleSnap", Handle::current());
        let mut events = persistence.subscribe();

        persistence.persist_photo(photo()).await.unwrap();

        assert!(matches!(
            events.recv().await.unwrap(),
            MediaEvent::PersistFailed {
                collection: MediaCollection::Images,
                error: PersistenceError::WriteFailed(_),
            }
        ));
        assert_eq!(library.entry_count(), 0);
    }
}
