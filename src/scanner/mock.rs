//! Scripted frame source for tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use hwinv::scanner::mock::MockSource;
//! use hwinv::scanner::{ScanOptions, ScanSession};
//!
//! let source = MockSource::new().with_failure().with_frame(frame);
//! let log = source.log();
//! let outcome = ScanSession::new(Box::new(source)).run(&ScanOptions::default(), &cancel)?;
//! assert_eq!(log.releases(), 1);
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::DynamicImage;
use tracing::trace;

use super::FrameSource;
use crate::error::{InvError, Result};

/// One scripted response to `read_frame`.
#[derive(Debug, Clone)]
pub enum SourceEvent {
    /// Return this frame.
    Frame(DynamicImage),
    /// Return no new frame.
    Idle,
    /// Fail the read.
    Failure,
}

/// Shared counters that outlive the source (which the session consumes).
#[derive(Debug, Clone, Default)]
pub struct SourceLog {
    reads: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
}

impl SourceLog {
    /// Number of `read_frame` calls.
    #[must_use]
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `release` calls.
    #[must_use]
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

/// Frame source that replays a script, then either repeats a fallback event
/// or reports exhaustion.
#[derive(Debug, Default)]
pub struct MockSource {
    script: VecDeque<SourceEvent>,
    fallback: Option<SourceEvent>,
    log: SourceLog,
}

impl MockSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_frame(mut self, frame: DynamicImage) -> Self {
        self.script.push_back(SourceEvent::Frame(frame));
        self
    }

    #[must_use]
    pub fn with_idle(mut self) -> Self {
        self.script.push_back(SourceEvent::Idle);
        self
    }

    #[must_use]
    pub fn with_failure(mut self) -> Self {
        self.script.push_back(SourceEvent::Failure);
        self
    }

    /// Keep answering with `event` once the script is used up.
    #[must_use]
    pub fn repeating(mut self, event: SourceEvent) -> Self {
        self.fallback = Some(event);
        self
    }

    /// Handle for inspecting calls after the session has taken the source.
    #[must_use]
    pub fn log(&self) -> SourceLog {
        self.log.clone()
    }
}

impl FrameSource for MockSource {
    fn describe(&self) -> String {
        "mock".to_string()
    }

    fn read_frame(&mut self) -> Result<Option<DynamicImage>> {
        self.log.reads.fetch_add(1, Ordering::SeqCst);
        let event = self.script.pop_front().or_else(|| self.fallback.clone());
        trace!(?event, "Mock frame read");
        match event {
            Some(SourceEvent::Frame(frame)) => Ok(Some(frame)),
            Some(SourceEvent::Idle) => Ok(None),
            Some(SourceEvent::Failure) => Err(InvError::CameraUnavailable {
                reason: "Mock read failure".to_string(),
            }),
            None => Err(InvError::SourceExhausted),
        }
    }

    fn release(&mut self) {
        self.log.releases.fetch_add(1, Ordering::SeqCst);
    }
}
