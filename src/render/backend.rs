//! Rendering backends
//!
//! The orchestrator hands every backend the global ranges once and then one
//! frame per phase in ascending phase order.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::frame::{PhaseFrame, RenderRanges};

/// Consumer of rendered frames
pub trait RenderBackend {
    /// Called once before any frame
    fn begin(&mut self, ranges: &RenderRanges) -> Result<()>;

    /// Called once per phase, ascending
    fn render_phase(&mut self, frame: &PhaseFrame) -> Result<()>;

    /// Called once after the last frame
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Collects frames in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    pub ranges: Option<RenderRanges>,
    pub frames: Vec<PhaseFrame>,
    pub finished: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderBackend for MemoryBackend {
    fn begin(&mut self, ranges: &RenderRanges) -> Result<()> {
        self.ranges = Some(ranges.clone());
        self.frames.clear();
        self.finished = false;
        Ok(())
    }

    fn render_phase(&mut self, frame: &PhaseFrame) -> Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

/// Writes `<stem>ranges.json` and one `<stem><phase>.json` per frame
///
/// Files are written to a temporary file in the output directory and
/// renamed into place, so a reader never sees a half-written frame.
#[derive(Debug, Clone)]
pub struct JsonFrameBackend {
    directory: PathBuf,
    file_stem: String,
    minify: bool,
    written: Vec<PathBuf>,
}

impl JsonFrameBackend {
    pub fn new(directory: impl Into<PathBuf>, file_stem: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            file_stem: file_stem.into(),
            minify: false,
            written: Vec::new(),
        }
    }

    /// Write compact JSON instead of pretty-printed
    pub fn with_minify(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }

    /// Files written so far, in write order
    pub fn written_files(&self) -> &[PathBuf] {
        &self.written
    }

    /// Path of the frame file for `phase`
    pub fn frame_path(&self, phase: u64) -> PathBuf {
        self.directory.join(format!("{}{}.json", self.file_stem, phase))
    }

    pub fn ranges_path(&self) -> PathBuf {
        self.directory.join(format!("{}ranges.json", self.file_stem))
    }

    fn write_json<T: Serialize>(&mut self, path: PathBuf, value: &T) -> Result<()> {
        let text = if self.minify {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        write_atomically(&self.directory, &path, text.as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::debug!(path = %path.display(), "wrote frame file");
        self.written.push(path);
        Ok(())
    }
}

fn write_atomically(directory: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = tempfile::NamedTempFile::new_in(directory)?;
    file.write_all(bytes)?;
    file.persist(path)?;
    Ok(())
}

impl RenderBackend for JsonFrameBackend {
    fn begin(&mut self, ranges: &RenderRanges) -> Result<()> {
        std::fs::create_dir_all(&self.directory).with_context(|| {
            format!("Failed to create output directory {}", self.directory.display())
        })?;
        let path = self.ranges_path();
        self.write_json(path, ranges)
    }

    fn render_phase(&mut self, frame: &PhaseFrame) -> Result<()> {
        let path = self.frame_path(frame.phase);
        self.write_json(path, frame)
    }
}
