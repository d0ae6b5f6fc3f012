// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! This module provides command-line functionality for:
//! - Taking photos
//! - Recording videos
//! - Listing the gallery
//! - An interactive camera screen driven from stdin

use futures::future::join_all;
use simplesnap::app::{self, CameraViewModel};
use simplesnap::backends::camera::CameraController;
use simplesnap::backends::virtual_camera::VirtualCameraController;
use simplesnap::media::{FsMediaLibrary, MediaCollection, PersistedMediaEntry};
use simplesnap::permissions::{PermissionGrants, are_permissions_granted};
use simplesnap::{
    CameraRepository, CaptureOrchestrator, Config, MediaEvent, MediaPersistence, RecordToggle,
};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Runtime;
use tokio::sync::broadcast;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// How long to wait for background persistence before giving up
const PERSIST_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything a command needs, wired against the virtual camera
pub struct Session {
    runtime: Runtime,
    config: Config,
    controller: Arc<VirtualCameraController>,
    orchestrator: Arc<CaptureOrchestrator>,
    permissions: Arc<PermissionGrants>,
}

impl Session {
    /// Load config and bind the camera
    pub fn open(
        config_path: Option<&Path>,
        granted: bool,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let config = match config_path {
            Some(path) => Config::load_from(path)?,
            None => {
                let config = Config::load();
                // Seed an editable config on first run
                if Config::default_path().is_ok_and(|path| !path.exists()) {
                    if let Err(e) = config.save() {
                        tracing::warn!(error = %e, "Failed to write default config");
                    }
                }
                config
            }
        };

        let runtime = Runtime::new()?;
        let handle = runtime.handle().clone();

        let controller = Arc::new(VirtualCameraController::new(
            config.virtual_camera.clone(),
            config.default_camera,
            handle.clone(),
        ));
        controller.bind_to_lifecycle()?;

        let library = Arc::new(FsMediaLibrary::new(config.media_root()));
        let persistence = MediaPersistence::new(library, &config.app_name, handle.clone());
        let orchestrator = Arc::new(CaptureOrchestrator::from_config(
            &config,
            persistence,
            handle,
        ));

        Ok(Self {
            runtime,
            config,
            controller,
            orchestrator,
            permissions: Arc::new(PermissionGrants::new(granted, granted)),
        })
    }

    fn require_permissions(&self) -> CliResult {
        if are_permissions_granted(self.permissions.as_ref()) {
            Ok(())
        } else {
            Err("Camera and microphone permissions are required".into())
        }
    }

    /// Take a photo and wait until it is in the library
    pub fn take_photo(&self) -> CliResult {
        self.require_permissions()?;
        println!("Using camera: {}", self.controller.camera_selector());
        println!("Capturing...");

        self.runtime.block_on(async {
            let mut events = self.orchestrator.persistence().subscribe();
            let photo = self.orchestrator.take_photo(self.controller.as_ref()).await?;
            println!(
                "Captured {}x{} (remaining rotation: {})",
                photo.width(),
                photo.height(),
                photo.orientation()
            );

            match wait_for_outcome(&mut events, MediaCollection::Images).await? {
                MediaEvent::PhotoSaved { uri, display_name } => {
                    println!("Photo saved: {} ({})", display_name, uri);
                    Ok(())
                }
                other => Err(describe_failure(&other).into()),
            }
        })
    }

    /// Record for `duration` seconds or until Ctrl+C
    pub fn record_video(&self, duration: u64) -> CliResult {
        self.require_permissions()?;
        println!("Using camera: {}", self.controller.camera_selector());

        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop_flag_clone = stop_flag.clone();
        ctrlc::set_handler(move || {
            stop_flag_clone.store(true, Ordering::SeqCst);
        })?;

        self.runtime.block_on(async {
            let mut events = self.orchestrator.persistence().subscribe();

            if let RecordToggle::Started { output } =
                self.orchestrator.record_video(self.controller.as_ref()).await?
            {
                println!("Recording to {}", output.display());
            }
            println!();
            println!("Recording... (press Ctrl+C to stop early)");

            let start = Instant::now();
            let target_duration = Duration::from_secs(duration);

            while start.elapsed() < target_duration {
                if stop_flag.load(Ordering::SeqCst) {
                    println!();
                    println!("Stopping early...");
                    break;
                }

                let elapsed = start.elapsed().as_secs();
                print!("\rRecording: {:02}:{:02}", elapsed / 60, elapsed % 60);
                std::io::Write::flush(&mut std::io::stdout())?;

                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            println!();

            self.orchestrator
                .record_video(self.controller.as_ref())
                .await?;

            match wait_for_outcome(&mut events, MediaCollection::Video).await? {
                MediaEvent::VideoSaved { uri, display_name } => {
                    println!("Video saved: {} ({})", display_name, uri);
                    Ok(())
                }
                other => Err(describe_failure(&other).into()),
            }
        })
    }

    /// Print the visible library entries, newest first
    pub fn gallery(&self, open: bool) -> CliResult {
        let persistence = self.orchestrator.persistence();

        self.runtime.block_on(async {
            for collection in [MediaCollection::Images, MediaCollection::Video] {
                let entries = persistence.latest_entries(collection).await?;
                println!("{} ({}):", collection.name(), entries.len());
                for entry in &entries {
                    print_entry(entry);
                }
                println!();
            }
            Ok::<_, Box<dyn std::error::Error>>(())
        })?;

        if open {
            self.view_model().open_gallery()?;
        }
        Ok(())
    }

    fn view_model(&self) -> CameraViewModel<CaptureOrchestrator> {
        let controller: Arc<dyn CameraController> = self.controller.clone();
        app::build_view_model(
            &self.config,
            Arc::clone(&self.orchestrator),
            controller,
            self.permissions.clone(),
        )
    }

    /// Interactive camera screen
    ///
    /// Reads one command per line from stdin and prints state changes as the
    /// view model publishes them.
    pub fn shell(&self) -> CliResult {
        let view_model = self.view_model();

        println!("Camera: {}", self.controller.camera_selector());
        println!("Commands: [p]hoto, [r]ecord toggle, [f]lip camera, [g]allery, [q]uit");

        self.runtime.block_on(async {
            spawn_observers(&view_model, self.orchestrator.persistence().subscribe());
            let mut outcomes = self.orchestrator.persistence().subscribe();

            let mut photo_tasks = Vec::new();
            let mut record_tasks = Vec::new();
            let mut lines = BufReader::new(tokio::io::stdin()).lines();

            while let Some(line) = lines.next_line().await? {
                match line.trim() {
                    "p" | "photo" => match view_model.request_photo() {
                        Some(task) => photo_tasks.push(task),
                        None => println!("Permissions missing, photo ignored"),
                    },
                    "r" | "record" => match view_model.request_record_toggle() {
                        Some(task) => record_tasks.push(task),
                        None => println!("Permissions missing, record ignored"),
                    },
                    "f" | "flip" => println!("Camera: {}", view_model.flip_camera()),
                    "g" | "gallery" => {
                        if let Err(e) = view_model.open_gallery() {
                            println!("{}", e);
                        }
                    }
                    "q" | "quit" => break,
                    "" => {}
                    other => println!("Unknown command: {}", other),
                }
            }

            let mut outstanding = Outstanding::default();
            let mut toggles = join_all(record_tasks).await;
            if self.orchestrator.is_recording() {
                println!("Stopping active recording...");
                if let Some(task) = view_model.request_record_toggle() {
                    toggles.push(task.await);
                }
            }
            outstanding.videos = toggles
                .iter()
                .filter(|t| matches!(t, Ok(Ok(RecordToggle::Stopped))))
                .count();
            outstanding.photos = join_all(photo_tasks)
                .await
                .iter()
                .filter(|t| matches!(t, Ok(Ok(()))))
                .count();

            if !outstanding.is_empty() {
                println!("Waiting for the media library...");
            }
            wait_for_outstanding(&mut outcomes, outstanding).await
        })
    }
}

/// Print view model and persistence changes as they happen
fn spawn_observers(
    view_model: &CameraViewModel<CaptureOrchestrator>,
    mut events: broadcast::Receiver<MediaEvent>,
) {
    let mut recording = view_model.is_recording();
    tokio::spawn(async move {
        while recording.changed().await.is_ok() {
            let active = *recording.borrow_and_update();
            println!("{}", if active { "● Recording" } else { "■ Idle" });
        }
    });

    let mut last_photo = view_model.last_captured_photo();
    tokio::spawn(async move {
        while last_photo.changed().await.is_ok() {
            match &*last_photo.borrow_and_update() {
                Some(photo) => println!(
                    "Preview: {}x{} captured at {}",
                    photo.width(),
                    photo.height(),
                    photo.captured_at().format("%H:%M:%S")
                ),
                None => println!("Preview cleared"),
            }
        }
    });

    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(MediaEvent::PhotoSaved { display_name, .. }) => {
                    println!("Photo saved: {}", display_name)
                }
                Ok(MediaEvent::VideoSaved { display_name, .. }) => {
                    println!("Video saved: {}", display_name)
                }
                Ok(other) => println!("{}", describe_failure(&other)),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Wait for the first terminal event concerning `collection`
async fn wait_for_outcome(
    events: &mut broadcast::Receiver<MediaEvent>,
    collection: MediaCollection,
) -> Result<MediaEvent, Box<dyn std::error::Error>> {
    let wait = async {
        loop {
            match events.recv().await {
                Ok(event) if concerns(&event, collection) => return Ok(event),
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    return Err("Media event channel closed".into());
                }
            }
        }
    };

    tokio::time::timeout(PERSIST_TIMEOUT, wait)
        .await
        .map_err(|_| "Timed out waiting for the media library")?
}

/// Background saves whose outcome has not been seen yet
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Outstanding {
    photos: usize,
    videos: usize,
}

impl Outstanding {
    fn is_empty(&self) -> bool {
        self.photos == 0 && self.videos == 0
    }

    /// Count off the save `event` settles
    fn settle(&mut self, event: &MediaEvent) {
        if concerns(event, MediaCollection::Images) {
            self.photos = self.photos.saturating_sub(1);
        } else if concerns(event, MediaCollection::Video) {
            self.videos = self.videos.saturating_sub(1);
        }
    }
}

/// Wait until every outstanding save has succeeded or failed
async fn wait_for_outstanding(
    events: &mut broadcast::Receiver<MediaEvent>,
    mut outstanding: Outstanding,
) -> CliResult {
    let wait = async {
        while !outstanding.is_empty() {
            match events.recv().await {
                Ok(event) => outstanding.settle(&event),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    return Err("Media event channel closed".into());
                }
            }
        }
        Ok(())
    };

    tokio::time::timeout(PERSIST_TIMEOUT, wait)
        .await
        .map_err(|_| "Timed out waiting for the media library")?
}

fn concerns(event: &MediaEvent, collection: MediaCollection) -> bool {
    match event {
        MediaEvent::PhotoSaved { .. } => collection == MediaCollection::Images,
        MediaEvent::VideoSaved { .. } | MediaEvent::RecordingDiscarded { .. } => {
            collection == MediaCollection::Video
        }
        MediaEvent::PersistFailed { collection: c, .. } => *c == collection,
    }
}

fn describe_failure(event: &MediaEvent) -> String {
    match event {
        MediaEvent::PersistFailed { collection, error } => {
            format!("Saving to {} failed: {}", collection.name(), error)
        }
        MediaEvent::RecordingDiscarded { output, reason } => {
            format!("Recording {} discarded: {}", output.display(), reason)
        }
        MediaEvent::PhotoSaved { display_name, .. } | MediaEvent::VideoSaved { display_name, .. } => {
            format!("Saved {}", display_name)
        }
    }
}

fn print_entry(entry: &PersistedMediaEntry) {
    let taken = chrono::DateTime::from_timestamp_millis(entry.values.date_taken_millis)
        .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".to_string());
    println!("  {}  {}  {}", taken, entry.values.display_name, entry.uri);
}

#[cfg(test)]
mod tests {
    use super::*;
    use simplesnap::PersistenceError;
    use simplesnap::media::{InMemoryMediaLibrary, MediaUri};
    use tokio::runtime::Handle;

    fn photo_saved() -> MediaEvent {
        MediaEvent::PhotoSaved {
            uri: MediaUri::new(MediaCollection::Images, 1),
            display_name: "1_image.jpg".into(),
        }
    }

    #[test]
    fn test_settle_counts_off_matching_collection() {
        let mut outstanding = Outstanding {
            photos: 1,
            videos: 2,
        };

        outstanding.settle(&photo_saved());
        outstanding.settle(&MediaEvent::RecordingDiscarded {
            output: "/tmp/a.mp4".into(),
            reason: "storage full".into(),
        });
        assert_eq!(
            outstanding,
            Outstanding {
                photos: 0,
                videos: 1
            }
        );

        outstanding.settle(&MediaEvent::PersistFailed {
            collection: MediaCollection::Video,
            error: PersistenceError::WriteFailed("disk".into()),
        });
        assert!(outstanding.is_empty());

        // Extra outcomes do not underflow
        outstanding.settle(&photo_saved());
        assert!(outstanding.is_empty());
    }

    #[tokio::test]
    async fn test_wait_returns_once_every_save_lands() {
        let (tx, mut rx) = broadcast::channel(8);
        tx.send(photo_saved()).unwrap();
        tx.send(MediaEvent::VideoSaved {
            uri: MediaUri::new(MediaCollection::Video, 2),
            display_name: "2_video.mp4".into(),
        })
        .unwrap();

        let outstanding = Outstanding {
            photos: 1,
            videos: 1,
        };
        assert!(wait_for_outstanding(&mut rx, outstanding).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_when_a_save_never_lands() {
        let (tx, mut rx) = broadcast::channel(8);
        tx.send(photo_saved()).unwrap();

        let outstanding = Outstanding {
            photos: 1,
            videos: 1,
        };
        let result = wait_for_outstanding(&mut rx, outstanding).await;
        assert!(result.unwrap_err().to_string().contains("Timed out"));
        drop(tx);
    }

    #[tokio::test]
    async fn test_stopped_recording_is_in_library_after_wait() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.mp4");
        std::fs::write(&source, b"clip").unwrap();

        let mut config = Config::default();
        config.scratch_dir = Some(dir.path().join("scratch"));
        config.virtual_camera.video_source = Some(source);

        let library = Arc::new(InMemoryMediaLibrary::new());
        let persistence =
            MediaPersistence::new(library.clone(), &config.app_name, Handle::current());
        let orchestrator = CaptureOrchestrator::from_config(&config, persistence, Handle::current());
        let controller = VirtualCameraController::new(
            config.virtual_camera.clone(),
            config.default_camera,
            Handle::current(),
        );
        controller.bind_to_lifecycle().unwrap();

        let mut events = orchestrator.persistence().subscribe();
        orchestrator.record_video(&controller).await.unwrap();
        let stopped = orchestrator.record_video(&controller).await.unwrap();
        assert_eq!(stopped, RecordToggle::Stopped);

        let outstanding = Outstanding {
            photos: 0,
            videos: 1,
        };
        wait_for_outstanding(&mut events, outstanding).await.unwrap();

        let videos = orchestrator
            .persistence()
            .latest_entries(MediaCollection::Video)
            .await
            .unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(library.contents(&videos[0].uri).unwrap(), b"clip");
    }
}
