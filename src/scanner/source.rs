//! File-backed frame sources.
//!
//! Camera hardware is driven by an external capture tool; these sources read
//! what it produces: either a fixed list of images, or the newest snapshot in
//! a directory the tool keeps writing to.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use image::DynamicImage;
use tracing::{debug, instrument, trace};

use super::FrameSource;
use crate::error::{InvError, Result};

/// Image extensions accepted as frames.
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "webp"];

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

fn load_frame(path: &Path) -> Result<DynamicImage> {
    image::open(path)
        .map_err(|e| InvError::ImageProcessing(format!("{}: {e}", path.display())))
}

/// One frame per listed image file, then exhaustion.
#[derive(Debug)]
pub struct ImageFileSource {
    pending: VecDeque<PathBuf>,
    total: usize,
}

impl ImageFileSource {
    /// Open a source over `paths`.
    ///
    /// Fails with `ImageNotFound` if any path is not an existing file.
    #[instrument(skip_all, fields(count = paths.len()))]
    pub fn open(paths: Vec<PathBuf>) -> Result<Self> {
        if paths.is_empty() {
            return Err(InvError::CameraUnavailable {
                reason: "No image files given".to_string(),
            });
        }
        if let Some(missing) = paths.iter().find(|p| !p.is_file()) {
            return Err(InvError::ImageNotFound {
                path: missing.display().to_string(),
            });
        }

        debug!("Opened image file source");
        Ok(Self {
            total: paths.len(),
            pending: paths.into(),
        })
    }
}

impl FrameSource for ImageFileSource {
    fn describe(&self) -> String {
        format!("{} image file(s)", self.total)
    }

    fn read_frame(&mut self) -> Result<Option<DynamicImage>> {
        let Some(path) = self.pending.pop_front() else {
            return Err(InvError::SourceExhausted);
        };
        trace!(path = %path.display(), "Reading frame file");
        load_frame(&path).map(Some)
    }

    fn release(&mut self) {
        self.pending.clear();
    }
}

/// Yields the newest image in a directory whenever it changes.
///
/// Suits capture tools that drop periodic snapshots into a folder. A tick on
/// which the newest file is unchanged yields no frame. The snapshot that is
/// already newest when the source opens is left out unless
/// [`include_existing`](Self::include_existing) is set, so a leftover frame
/// from an earlier session is not mistaken for a live one.
#[derive(Debug)]
pub struct SnapshotDirSource {
    dir: PathBuf,
    last_seen: Option<(PathBuf, SystemTime)>,
    open: bool,
}

impl SnapshotDirSource {
    /// Open a source watching `dir`.
    ///
    /// Fails with `CameraUnavailable` if the directory does not exist.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(InvError::CameraUnavailable {
                reason: format!("Snapshot directory {} does not exist", dir.display()),
            });
        }
        let mut source = Self {
            dir,
            last_seen: None,
            open: true,
        };
        source.last_seen = source.newest_snapshot()?;
        debug!(
            dir = %source.dir.display(),
            baseline = ?source.last_seen.as_ref().map(|(path, _)| path),
            "Opened snapshot directory source"
        );
        Ok(source)
    }

    /// Also yield the snapshot that was newest when the source opened.
    #[must_use]
    pub fn include_existing(mut self) -> Self {
        self.last_seen = None;
        self
    }

    fn newest_snapshot(&self) -> Result<Option<(PathBuf, SystemTime)>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| InvError::CameraUnavailable {
            reason: format!("Cannot read {}: {e}", self.dir.display()),
        })?;

        let newest = entries
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && has_supported_extension(path))
            .filter_map(|path| {
                let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
                Some((path, modified))
            })
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        Ok(newest)
    }
}

impl FrameSource for SnapshotDirSource {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    fn read_frame(&mut self) -> Result<Option<DynamicImage>> {
        if !self.open {
            return Err(InvError::SourceExhausted);
        }

        let Some(newest) = self.newest_snapshot()? else {
            return Ok(None);
        };
        if self.last_seen.as_ref() == Some(&newest) {
            return Ok(None);
        }

        trace!(path = %newest.0.display(), "New snapshot");
        let frame = load_frame(&newest.0)?;
        self.last_seen = Some(newest);
        Ok(Some(frame))
    }

    fn release(&mut self) {
        self.open = false;
    }
}
