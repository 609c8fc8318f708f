use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::RgbImage;

/// Where rendered frames go
pub trait FrameSink {
    /// Present a frame. Returns `false` once the viewer wants playback to stop.
    fn show(&mut self, frame: &RgbImage) -> Result<bool>;
}

/// Writes every frame as `frame_NNNN.png`
pub struct DirectorySink {
    dir: PathBuf,
    written: usize,
}

impl DirectorySink {
    pub fn new(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            written: 0,
        })
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

impl FrameSink for DirectorySink {
    fn show(&mut self, frame: &RgbImage) -> Result<bool> {
        self.written += 1;
        let path = self.dir.join(format!("frame_{:04}.png", self.written));
        frame
            .save(&path)
            .map_err(|e| anyhow::anyhow!("Failed to save frame {}: {}", path.display(), e))?;
        tracing::trace!(path = %path.display(), "frame written");
        Ok(true)
    }
}

/// Discards frames
#[derive(Debug, Default)]
pub struct NullSink {
    pub shown: usize,
}

impl FrameSink for NullSink {
    fn show(&mut self, _frame: &RgbImage) -> Result<bool> {
        self.shown += 1;
        Ok(true)
    }
}
