// SPDX-License-Identifier: GPL-3.0-only

//! One-shot completion signal for callback-style APIs
//!
//! Controllers report results through callbacks; the pipelines await them.
//! A [`CompletionSignal`] is the callback side of a `oneshot` channel that
//! can be shared by several callback methods and resolves at most once.
//! Resolving after the waiting side was dropped hands the value back so the
//! caller can release it.

use std::sync::Mutex;
use tokio::sync::oneshot;

pub struct CompletionSignal<T> {
    sender: Mutex<Option<oneshot::Sender<T>>>,
}

impl<T> CompletionSignal<T> {
    /// Create a signal and the receiver that awaits it
    pub fn new() -> (Self, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                sender: Mutex::new(Some(tx)),
            },
            rx,
        )
    }

    /// Resolve the signal
    ///
    /// Returns the value back if the signal was already resolved or nobody
    /// is waiting any more.
    pub fn complete(&self, value: T) -> Result<(), T> {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        match sender {
            Some(tx) => tx.send(value),
            None => Err(value),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolves_once() {
        let (signal, rx) = CompletionSignal::new();
        assert!(signal.complete(1).is_ok());
        assert_eq!(signal.complete(2), Err(2));
        assert!(signal.is_completed());
        assert_eq!(rx.await.unwrap(), 1);
    }

    #[test]
    fn test_completion_after_cancel_returns_value() {
        let (signal, rx) = CompletionSignal::new();
        drop(rx);
        assert_eq!(signal.complete("late"), Err("late"));
    }

    #[tokio::test]
    async fn test_dropped_signal_closes_receiver() {
        let (signal, rx) = CompletionSignal::<u8>::new();
        drop(signal);
        assert!(rx.await.is_err());
    }
}
