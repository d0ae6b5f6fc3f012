// SPDX-License-Identifier: MPL-2.0

//! Error types for the camera application

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Photo capture errors
    Capture(CaptureError),
    /// Recording start/stop errors
    Record(RecordError),
    /// Media library write errors
    Persistence(PersistenceError),
    /// Configuration errors
    Config(ConfigError),
    /// Generic error with message
    Other(String),
}

/// Photo capture errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The camera controller reported a capture failure
    Platform(String),
    /// The captured image could not be decoded
    Decode(String),
    /// The controller dropped the capture callback without invoking it
    Abandoned,
}

/// Recording start/stop errors
///
/// A recording that finalizes with an error is handled inside the
/// orchestrator and never surfaces here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Failed to start recording
    StartFailed(String),
    /// Failed to stop recording (the session is cleared anyway)
    StopFailed(String),
    /// Scratch directory for the recording could not be prepared
    OutputUnavailable(String),
}

/// Media library write errors
///
/// Always recovered locally: the half-written entry is deleted and the
/// failure is logged and published as a media event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// Creating the pending entry failed
    InsertFailed(String),
    /// Opening the entry's output stream failed
    OpenFailed(String),
    /// Writing or encoding the payload failed
    WriteFailed(String),
    /// Clearing the pending flag failed
    UpdateFailed(String),
    /// The compensating delete failed
    DeleteFailed(String),
    /// The entry does not exist
    NotFound(String),
    /// Background task failed to run to completion
    Task(String),
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No configuration directory on this system
    NoConfigDir,
    /// Reading or writing the config file failed
    Io(String),
    /// Config file is not valid JSON for this version
    Parse(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Capture(e) => write!(f, "Capture error: {}", e),
            AppError::Record(e) => write!(f, "Recording error: {}", e),
            AppError::Persistence(e) => write!(f, "Storage error: {}", e),
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::Platform(msg) => write!(f, "Capture failed: {}", msg),
            CaptureError::Decode(msg) => write!(f, "Failed to decode captured image: {}", msg),
            CaptureError::Abandoned => write!(f, "Capture callback was dropped without a result"),
        }
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::StartFailed(msg) => write!(f, "Failed to start recording: {}", msg),
            RecordError::StopFailed(msg) => write!(f, "Failed to stop recording: {}", msg),
            RecordError::OutputUnavailable(msg) => {
                write!(f, "Recording output unavailable: {}", msg)
            }
        }
    }
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::InsertFailed(msg) => write!(f, "Insert failed: {}", msg),
            PersistenceError::OpenFailed(msg) => write!(f, "Open failed: {}", msg),
            PersistenceError::WriteFailed(msg) => write!(f, "Write failed: {}", msg),
            PersistenceError::UpdateFailed(msg) => write!(f, "Update failed: {}", msg),
            PersistenceError::DeleteFailed(msg) => write!(f, "Delete failed: {}", msg),
            PersistenceError::NotFound(uri) => write!(f, "No media entry for {}", uri),
            PersistenceError::Task(msg) => write!(f, "Background task error: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoConfigDir => write!(f, "No configuration directory available"),
            ConfigError::Io(msg) => write!(f, "I/O error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Invalid config file: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CaptureError {}
impl std::error::Error for RecordError {}
impl std::error::Error for PersistenceError {}
impl std::error::Error for ConfigError {}

// Conversions from sub-errors to AppError
impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        AppError::Capture(err)
    }
}

impl From<RecordError> for AppError {
    fn from(err: RecordError) -> Self {
        AppError::Record(err)
    }
}

impl From<PersistenceError> for AppError {
    fn from(err: PersistenceError) -> Self {
        AppError::Persistence(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<image::ImageError> for CaptureError {
    fn from(err: image::ImageError) -> Self {
        CaptureError::Decode(err.to_string())
    }
}

impl From<tokio::task::JoinError> for PersistenceError {
    fn from(err: tokio::task::JoinError) -> Self {
        PersistenceError::Task(err.to_string())
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
