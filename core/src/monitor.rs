//! Progress/cancellation monitor, modeled as an interface with two methods.
//!
//! Reference upstream implementation: the `ETEXT_DESC` struct forward-declared
//! in `src/ccmain/tesseractclass.h` and used throughout `control.cpp`/
//! `fixspace.cpp`, whose `progress`/`ocr_alive`/`deadline`/`cancel_func`
//! fields are an untyped-callback-plus-userdata pair, replaced here by a
//! typed interface.

use std::time::Instant;

/// Two-method interface a caller supplies to observe progress and request
/// cancellation, in place of a function-pointer-plus-untyped-userdata pair.
pub trait Monitor {
    /// Report progress in [0, 100] and whether recognition is still alive.
    fn report_progress(&mut self, progress: u8, alive: bool);

    /// Polled at word granularity; once true, the orchestrator fakes all
    /// remaining words and returns false.
    fn should_cancel(&self) -> bool;
}

/// A `Monitor` with an absolute deadline; exceeding it is equivalent to
/// cancellation.
pub struct DeadlineMonitor<M: Monitor> {
    pub inner: M,
    pub deadline: Option<Instant>,
}

impl<M: Monitor> DeadlineMonitor<M> {
    pub fn new(inner: M, deadline: Option<Instant>) -> Self {
        DeadlineMonitor { inner, deadline }
    }

    pub fn deadline_exceeded(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

impl<M: Monitor> Monitor for DeadlineMonitor<M> {
    fn report_progress(&mut self, progress: u8, alive: bool) {
        self.inner.report_progress(progress, alive);
    }

    fn should_cancel(&self) -> bool {
        self.deadline_exceeded() || self.inner.should_cancel()
    }
}

/// A monitor that never cancels and discards progress reports; the default
/// when a caller doesn't need one.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMonitor;

impl Monitor for NullMonitor {
    fn report_progress(&mut self, _progress: u8, _alive: bool) {}
    fn should_cancel(&self) -> bool {
        false
    }
}

/// A monitor that cancels once a given word index has been reached, used by
/// tests simulating mid-page cancellation.
#[derive(Debug, Clone)]
pub struct CancelAtWord {
    pub cancel_at: usize,
    pub seen: usize,
    pub last_progress: u8,
}

impl CancelAtWord {
    pub fn new(cancel_at: usize) -> Self {
        CancelAtWord {
            cancel_at,
            seen: 0,
            last_progress: 0,
        }
    }
}

impl Monitor for CancelAtWord {
    fn report_progress(&mut self, progress: u8, _alive: bool) {
        self.last_progress = progress;
        self.seen += 1;
    }

    fn should_cancel(&self) -> bool {
        self.seen >= self.cancel_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn null_monitor_never_cancels() {
        let m = NullMonitor;
        assert!(!m.should_cancel());
    }

    #[test]
    fn deadline_monitor_cancels_past_deadline() {
        let m = DeadlineMonitor::new(NullMonitor, Some(Instant::now() - Duration::from_secs(1)));
        assert!(m.should_cancel());
    }

    #[test]
    fn cancel_at_word_triggers_after_n_reports() {
        let mut m = CancelAtWord::new(3);
        for _ in 0..3 {
            assert!(!m.should_cancel());
            m.report_progress(0, true);
        }
        assert!(m.should_cancel());
    }
}
