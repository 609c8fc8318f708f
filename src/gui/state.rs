use std::time::{Duration, Instant};

use anyhow::Result;
use iced::widget::image::Handle;

use crate::detection::Variant;
use crate::player::Player;
use crate::source::{FrameSource, SourceSpec};
use crate::tuning::Tuning;

/// Everything needed to (re)build the viewer
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub variant: Variant,
    pub tuning: Tuning,
    pub source: SourceSpec,
    pub max_frames: Option<usize>,
    pub frame_interval: Duration,
}

pub struct ViewerState {
    pub variant: Variant,
    pub player: Player,
    source: Option<Box<dyn FrameSource>>,
    pub tuning: Tuning,
    pub initial_tuning: Tuning,
    pub frame: Option<Handle>,
    pub frames_shown: usize,
    pub max_frames: Option<usize>,
    pub frame_interval: Duration,
    pub status: String,
}

impl ViewerState {
    pub fn new(config: &ViewerConfig) -> Self {
        let (source, status) = match config.source.open() {
            Ok(source) => (Some(source), "Playing".to_string()),
            Err(e) => {
                tracing::error!("{:#}", e);
                (None, format!("{:#}", e))
            }
        };

        Self {
            variant: config.variant,
            player: Player::new(config.variant, config.tuning),
            source,
            tuning: config.tuning,
            initial_tuning: config.tuning,
            frame: None,
            frames_shown: 0,
            max_frames: config.max_frames,
            frame_interval: config.frame_interval,
            status,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.source.is_some()
    }

    pub fn set_tuning(&mut self, tuning: Tuning) {
        self.tuning = tuning;
        self.player.set_tuning(tuning);
    }

    /// Process the next frame; the source is dropped once it ends or fails
    pub fn advance(&mut self) {
        if let Err(e) = self.try_advance() {
            tracing::error!("{:#}", e);
            self.status = format!("{:#}", e);
            self.source = None;
        }
    }

    fn try_advance(&mut self) -> Result<()> {
        if self.max_frames.is_some_and(|max| self.frames_shown >= max) {
            self.stop("Frame limit reached");
            return Ok(());
        }
        let Some(source) = self.source.as_mut() else {
            return Ok(());
        };
        let start = Instant::now();
        let Some(frame) = source.next_frame()? else {
            self.stop("Can't receive frame (stream end?)");
            return Ok(());
        };

        let rendered = self.player.process_frame_since(frame, start)?;
        let (width, height) = rendered.image.dimensions();
        let rgba = image::DynamicImage::ImageRgb8(rendered.image).to_rgba8();
        self.frame = Some(Handle::from_rgba(width, height, rgba.into_raw()));
        self.frames_shown += 1;
        self.status = format!(
            "Frame {}: {} circles",
            self.frames_shown,
            rendered.data.circles.len()
        );
        Ok(())
    }

    fn stop(&mut self, reason: &str) {
        tracing::info!(frames = self.frames_shown, "{}", reason);
        self.status = reason.to_string();
        self.source = None;
    }
}
