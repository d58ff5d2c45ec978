//! QR decoding and scan sessions.
//!
//! A scan session holds a [`FrameSource`] open, pulls one frame per tick and
//! stops on the first decoded code, cancellation, timeout, or source
//! exhaustion. The source is released when the session ends, on every path.

pub mod mock;
mod source;

pub use source::{ImageFileSource, SnapshotDirSource, SUPPORTED_EXTENSIONS};

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use image::DynamicImage;
use serde::Serialize;
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{InvError, Result};

/// A camera-like producer of image frames.
///
/// Opening happens in the implementor's constructor. `release` is called
/// exactly once by [`ScanSession`] when the session ends.
pub trait FrameSource {
    /// Short description for logs and output (e.g. a directory path).
    fn describe(&self) -> String;

    /// Pull the next frame.
    ///
    /// `Ok(None)` means no new frame is available this tick. A read failure
    /// is an error other than [`InvError::SourceExhausted`], which signals
    /// that the source will never produce another frame.
    fn read_frame(&mut self) -> Result<Option<DynamicImage>>;

    /// Close the underlying capture handle.
    fn release(&mut self);
}

/// Type alias for boxed trait object.
pub type BoxedSource = Box<dyn FrameSource>;

/// Decode the first QR code found in a frame.
///
/// Frames with no code, or only undecodable ones, yield `None`. With several
/// codes in view, the first one the detector reports wins; that order is not
/// specified.
pub fn decode_frame(frame: &DynamicImage) -> Option<String> {
    decode_all(frame).into_iter().next()
}

/// Decode every QR code found in a frame, in detector order.
#[allow(clippy::cast_possible_truncation)] // coordinates are bounded by u32 image dimensions
pub fn decode_all(frame: &DynamicImage) -> Vec<String> {
    let gray = frame.to_luma8();
    let (width, height) = gray.dimensions();

    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(width as usize, height as usize, |x, y| {
            gray.get_pixel(x as u32, y as u32).0[0]
        });
    let grids = prepared.detect_grids();
    trace!(width, height, grids = grids.len(), "Detected QR grids");

    grids
        .into_iter()
        .filter_map(|grid| match grid.decode() {
            Ok((_meta, content)) => Some(content),
            Err(e) => {
                trace!(error = %e, "Skipping undecodable grid");
                None
            }
        })
        .collect()
}

/// Scan loop parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Delay between frame pulls.
    pub interval: Duration,
    /// Consecutive read failures tolerated before `CameraUnavailable`.
    pub max_consecutive_failures: u32,
    /// Give up after this long (`None` = run until another stop condition).
    pub timeout: Option<Duration>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(30),
            max_consecutive_failures: 100,
            timeout: None,
        }
    }
}

/// How a scan session ended without error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "text", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// A code was decoded.
    Decoded(String),
    /// The cancel flag was raised.
    Cancelled,
    /// The timeout elapsed.
    TimedOut,
    /// The source ran out of frames.
    Exhausted,
}

/// Progress report passed to observers after each tick without a decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanTick {
    /// Ticks completed so far.
    pub tick: u64,
    /// Frames actually read and decoded so far.
    pub frames: u64,
    /// Current run of consecutive read failures.
    pub consecutive_failures: u32,
}

/// A single-use scan over one frame source.
///
/// Dropping the session releases the source.
pub struct ScanSession {
    source: BoxedSource,
    released: bool,
}

impl ScanSession {
    /// Take ownership of an opened source.
    pub fn new(source: BoxedSource) -> Self {
        debug!(source = %source.describe(), "Scan session opened");
        Self {
            source,
            released: false,
        }
    }

    pub fn describe(&self) -> String {
        self.source.describe()
    }

    /// Run until a code is decoded or another stop condition is met.
    pub fn run(self, options: &ScanOptions, cancel: &AtomicBool) -> Result<ScanOutcome> {
        self.run_with_progress(options, cancel, |_| {})
    }

    /// Like [`run`](Self::run), reporting each idle tick to `observer`.
    #[instrument(skip_all, fields(source = %self.source.describe()))]
    pub fn run_with_progress<F>(
        mut self,
        options: &ScanOptions,
        cancel: &AtomicBool,
        mut observer: F,
    ) -> Result<ScanOutcome>
    where
        F: FnMut(ScanTick),
    {
        let start = Instant::now();
        let max_failures = options.max_consecutive_failures.max(1);
        let mut tick = ScanTick {
            tick: 0,
            frames: 0,
            consecutive_failures: 0,
        };

        let outcome = loop {
            if cancel.load(Ordering::SeqCst) {
                info!(ticks = tick.tick, "Scan cancelled");
                break Ok(ScanOutcome::Cancelled);
            }
            if options.timeout.is_some_and(|t| start.elapsed() >= t) {
                info!(ticks = tick.tick, "Scan timed out");
                break Ok(ScanOutcome::TimedOut);
            }

            match self.source.read_frame() {
                Ok(Some(frame)) => {
                    tick.consecutive_failures = 0;
                    tick.frames += 1;
                    if let Some(text) = decode_frame(&frame) {
                        info!(frames = tick.frames, "QR code decoded");
                        break Ok(ScanOutcome::Decoded(text));
                    }
                    trace!(frame = tick.frames, "No code in frame");
                }
                Ok(None) => trace!("No new frame"),
                Err(InvError::SourceExhausted) => {
                    debug!(frames = tick.frames, "Frame source exhausted");
                    break Ok(ScanOutcome::Exhausted);
                }
                Err(e) => {
                    tick.consecutive_failures += 1;
                    debug!(
                        error = %e,
                        consecutive = tick.consecutive_failures,
                        "Frame read failed"
                    );
                    if tick.consecutive_failures >= max_failures {
                        warn!(failures = tick.consecutive_failures, "Giving up on frame source");
                        break Err(InvError::CameraUnavailable {
                            reason: format!(
                                "{} consecutive frame reads failed, last error: {e}",
                                tick.consecutive_failures
                            ),
                        });
                    }
                }
            }

            tick.tick += 1;
            observer(tick);
            thread::sleep(options.interval);
        };

        self.release();
        outcome
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.source.release();
            debug!("Frame source released");
        }
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        self.release();
    }
}
