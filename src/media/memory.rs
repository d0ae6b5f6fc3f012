// SPDX-License-Identifier: GPL-3.0-only

//! In-memory media library
//!
//! Keeps entries and their bytes in memory. Sticky [`FailurePoint`]s make
//! stages of the write protocol fail, which is how persistence cleanup is
//! exercised without a real disk.

use super::{MediaCollection, MediaLibrary, MediaUri, MediaValues, PersistedMediaEntry};
use crate::errors::PersistenceError;
use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

/// Stage of the write protocol that should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    Insert,
    OpenStream,
    Write,
    SetPending,
    Delete,
}

#[derive(Debug)]
struct MemoryEntry {
    collection: MediaCollection,
    values: MediaValues,
    data: Arc<Mutex<Vec<u8>>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: u64,
    entries: BTreeMap<MediaUri, MemoryEntry>,
    failures: HashSet<FailurePoint>,
}

/// Media library held entirely in memory
#[derive(Debug, Default)]
pub struct InMemoryMediaLibrary {
    state: Mutex<MemoryState>,
}

impl InMemoryMediaLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make every subsequent operation at `point` fail
    pub fn fail_at(&self, point: FailurePoint) {
        self.state().failures.insert(point);
    }

    /// Number of entries, pending ones included
    pub fn entry_count(&self) -> usize {
        self.state().entries.len()
    }

    /// Current bytes of an entry
    pub fn contents(&self, uri: &MediaUri) -> Option<Vec<u8>> {
        let state = self.state();
        let entry = state.entries.get(uri)?;
        let data = entry
            .data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Some(data.clone())
    }

    /// Values of an entry
    pub fn values(&self, uri: &MediaUri) -> Option<MediaValues> {
        self.state().entries.get(uri).map(|e| e.values.clone())
    }

    fn check(&self, point: FailurePoint, uri: Option<&MediaUri>) -> Result<(), PersistenceError> {
        if !self.state().failures.contains(&point) {
            return Ok(());
        }
        let target = uri.map(|u| u.to_string()).unwrap_or_default();
        Err(match point {
            FailurePoint::Insert => PersistenceError::InsertFailed("injected".into()),
            FailurePoint::OpenStream => PersistenceError::OpenFailed(target),
            FailurePoint::Write => PersistenceError::WriteFailed(target),
            FailurePoint::SetPending => PersistenceError::UpdateFailed(target),
            FailurePoint::Delete => PersistenceError::DeleteFailed(target),
        })
    }
}

/// Output stream into an in-memory entry
struct MemoryWriter {
    data: Arc<Mutex<Vec<u8>>>,
    fail: bool,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.fail {
            return Err(std::io::Error::other("injected write failure"));
        }
        let mut data = self
            .data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl MediaLibrary for InMemoryMediaLibrary {
    fn insert(
        &self,
        collection: MediaCollection,
        values: &MediaValues,
    ) -> Result<MediaUri, PersistenceError> {
        self.check(FailurePoint::Insert, None)?;

        let mut state = self.state();
        state.next_id += 1;
        let uri = MediaUri::new(collection, state.next_id);
        state.entries.insert(
            uri.clone(),
            MemoryEntry {
                collection,
                values: values.clone(),
                data: Arc::new(Mutex::new(Vec::new())),
            },
        );
        Ok(uri)
    }

    fn open_output_stream(
        &self,
        uri: &MediaUri,
    ) -> Result<Box<dyn Write + Send>, PersistenceError> {
        self.check(FailurePoint::OpenStream, Some(uri))?;

        let state = self.state();
        let entry = state
            .entries
            .get(uri)
            .ok_or_else(|| PersistenceError::NotFound(uri.to_string()))?;
        entry
            .data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();

        Ok(Box::new(MemoryWriter {
            data: Arc::clone(&entry.data),
            fail: state.failures.contains(&FailurePoint::Write),
        }))
    }

    fn set_pending(&self, uri: &MediaUri, pending: bool) -> Result<MediaUri, PersistenceError> {
        self.check(FailurePoint::SetPending, Some(uri))?;

        let mut state = self.state();
        let entry = state
            .entries
            .get_mut(uri)
            .ok_or_else(|| PersistenceError::NotFound(uri.to_string()))?;
        entry.values.is_pending = pending;
        Ok(uri.clone())
    }

    fn delete(&self, uri: &MediaUri) -> Result<(), PersistenceError> {
        self.check(FailurePoint::Delete, Some(uri))?;

        self.state()
            .entries
            .remove(uri)
            .map(|_| ())
            .ok_or_else(|| PersistenceError::NotFound(uri.to_string()))
    }

    fn query_visible(
        &self,
        collection: MediaCollection,
    ) -> Result<Vec<PersistedMediaEntry>, PersistenceError> {
        let state = self.state();
        let mut visible: Vec<_> = state
            .entries
            .iter()
            .filter(|(_, e)| e.collection == collection && !e.values.is_pending)
            .map(|(uri, e)| PersistedMediaEntry {
                uri: uri.clone(),
                collection,
                values: e.values.clone(),
            })
            .collect();
        visible.sort_by(|a, b| b.values.date_taken_millis.cmp(&a.values.date_taken_millis));
        Ok(visible)
    }
}
