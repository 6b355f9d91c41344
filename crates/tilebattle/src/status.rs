//! # Status Line
//!
//! One line of transient text under the lobby buttons.
//!
//! ```text
//! show_for("Failed to connect to host", 1s)   ──▶ text ── 1s ──▶ ""
//! animate_waiting("Waiting for \"bob\"...")   ──▶ "", ".", "..", "...", "" ...
//!                                                 until the handle is dropped
//! ```
//!
//! Every write bumps a generation counter. A delayed clear only fires if no
//! newer text was written in the meantime.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use tilebattle_shared::constants::MAX_WAITING_DOTS;

#[derive(Default)]
struct Inner {
    text: Mutex<String>,
    generation: AtomicU64,
}

/// Shared, thread-safe status text.
#[derive(Clone, Default)]
pub struct StatusLine {
    inner: Arc<Inner>,
}

impl StatusLine {
    /// Creates an empty status line.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text.
    #[must_use]
    pub fn text(&self) -> String {
        self.inner.text.lock().clone()
    }

    /// Replaces the text. Returns the new generation.
    pub fn set(&self, text: impl Into<String>) -> u64 {
        let mut current = self.inner.text.lock();
        *current = text.into();
        self.inner.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Clears the text.
    pub fn clear(&self) {
        self.set(String::new());
    }

    /// Shows `text` and clears it after `duration`, unless something newer
    /// was written first.
    pub fn show_for(&self, text: impl Into<String>, duration: Duration) {
        let generation = self.set(text);
        let inner = Arc::clone(&self.inner);
        let spawned = thread::Builder::new()
            .name("tilebattle-status-clear".into())
            .spawn(move || {
                thread::sleep(duration);
                let mut current = inner.text.lock();
                if inner.generation.load(Ordering::Acquire) == generation {
                    current.clear();
                    inner.generation.fetch_add(1, Ordering::AcqRel);
                }
            });
        if let Err(e) = spawned {
            tracing::warn!("Status clear thread failed to start: {}", e);
        }
    }

    /// Cycles `base` followed by 0 to 3 dots every `interval` until the
    /// returned handle is stopped or dropped.
    pub fn animate_waiting(&self, base: impl Into<String>, interval: Duration) -> WaitingAnimation {
        let base = base.into();
        let status = self.clone();
        let (cancel_tx, cancel_rx) = bounded::<()>(1);

        let spawned = thread::Builder::new()
            .name("tilebattle-status-dots".into())
            .spawn(move || {
                let mut dots = 0;
                loop {
                    status.set(format!("{base}{}", ".".repeat(dots)));
                    match cancel_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        // Explicit stop or the handle was dropped
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    dots = (dots + 1) % (MAX_WAITING_DOTS + 1);
                }
            });

        let thread = match spawned {
            Ok(thread) => Some(thread),
            Err(e) => {
                tracing::warn!("Waiting animation failed to start: {}", e);
                None
            }
        };
        WaitingAnimation {
            cancel: Some(cancel_tx),
            thread,
        }
    }
}

impl std::fmt::Debug for StatusLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StatusLine").field(&self.text()).finish()
    }
}

/// Running waiting-line animation.
pub struct WaitingAnimation {
    cancel: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl WaitingAnimation {
    /// Stops the animation and waits for its thread.
    pub fn stop(mut self) {
        self.cancel.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("Waiting animation thread panicked");
            }
        }
    }
}

impl Drop for WaitingAnimation {
    fn drop(&mut self) {
        self.cancel.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn wait_until(status: &StatusLine, wanted: impl Fn(&str) -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(3);
        while Instant::now() < deadline {
            if wanted(&status.text()) {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn test_show_for_clears() {
        let status = StatusLine::new();
        status.show_for("Failed to connect to host", Duration::from_millis(20));
        assert_eq!(status.text(), "Failed to connect to host");
        assert!(wait_until(&status, str::is_empty));
    }

    #[test]
    fn test_newer_text_survives_older_clear() {
        let status = StatusLine::new();
        status.show_for("old", Duration::from_millis(10));
        status.set("new");
        thread::sleep(Duration::from_millis(60));
        assert_eq!(status.text(), "new");
    }

    #[test]
    fn test_waiting_dots_cycle_and_stop() {
        let status = StatusLine::new();
        let animation = status.animate_waiting("Waiting", Duration::from_millis(5));

        assert!(wait_until(&status, |t| t == "Waiting..."));
        assert!(wait_until(&status, |t| t == "Waiting"));
        animation.stop();

        let frozen = status.text();
        thread::sleep(Duration::from_millis(30));
        assert_eq!(status.text(), frozen);
        assert!(frozen.starts_with("Waiting"));
        assert!(frozen.len() <= "Waiting...".len());
    }
}
