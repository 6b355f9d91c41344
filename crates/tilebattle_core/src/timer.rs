//! Pausable elapsed-time counter.

use std::time::{Duration, Instant};

/// Wall-clock stopwatch that can be paused and resumed.
///
/// ```text
/// resume ──▶ running ──pause──▶ paused (accumulated += now - started)
///    ▲                             │
///    └─────────────────────────────┘
/// ```
#[derive(Clone, Debug, Default)]
pub struct Timer {
    accumulated: Duration,
    started: Option<Instant>,
}

impl Timer {
    /// Creates a paused timer at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            accumulated: Duration::ZERO,
            started: None,
        }
    }

    /// Creates a paused timer that already shows `elapsed`.
    #[must_use]
    pub const fn with_elapsed(elapsed: Duration) -> Self {
        Self {
            accumulated: elapsed,
            started: None,
        }
    }

    /// Starts counting. No-op if already running.
    pub fn resume(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    /// Stops counting, keeping the elapsed time. No-op if already paused.
    pub fn pause(&mut self) {
        if let Some(started) = self.started.take() {
            self.accumulated = self.accumulated.saturating_add(started.elapsed());
        }
    }

    /// Pauses and returns to zero.
    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        self.started = None;
    }

    /// Total time spent running.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        match self.started {
            Some(started) => self.accumulated.saturating_add(started.elapsed()),
            None => self.accumulated,
        }
    }

    /// Returns true while counting.
    #[inline]
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.started.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_paused_timer_does_not_advance() {
        let timer = Timer::with_elapsed(Duration::from_secs(3));
        thread::sleep(Duration::from_millis(5));
        assert_eq!(timer.elapsed(), Duration::from_secs(3));
        assert!(!timer.is_running());
    }

    #[test]
    fn test_elapsed_saturates() {
        let mut timer = Timer::with_elapsed(Duration::MAX);
        timer.resume();
        thread::sleep(Duration::from_millis(2));
        assert_eq!(timer.elapsed(), Duration::MAX);
        timer.pause();
        assert_eq!(timer.elapsed(), Duration::MAX);
    }

    #[test]
    fn test_resume_pause_accumulates() {
        let mut timer = Timer::new();
        timer.resume();
        assert!(timer.is_running());
        thread::sleep(Duration::from_millis(10));
        timer.pause();
        let first = timer.elapsed();
        assert!(first >= Duration::from_millis(10));

        // Double pause is a no-op
        timer.pause();
        assert_eq!(timer.elapsed(), first);

        timer.resume();
        timer.resume();
        thread::sleep(Duration::from_millis(5));
        assert!(timer.elapsed() >= first + Duration::from_millis(5));
    }

    #[test]
    fn test_reset() {
        let mut timer = Timer::with_elapsed(Duration::from_secs(9));
        timer.resume();
        timer.reset();
        assert_eq!(timer.elapsed(), Duration::ZERO);
        assert!(!timer.is_running());
    }
}
