// SPDX-License-Identifier: MPL-2.0

//! Video recording pipeline
//!
//! Recording itself is done by the camera controller. This module owns the
//! session bookkeeping: the toggle, the scratch output, and handing finished
//! files to persistence.

pub mod recorder;

pub use recorder::{RecordToggle, RecordingSession, RecordingSlot, VideoRecorder};
