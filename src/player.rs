//! Frame loop: grab, detect, draw, show

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use image::{GrayImage, RgbImage};

use crate::detection::Variant;
use crate::detection::preprocessing::invert_mask;
use crate::pipeline::{FrameData, Pipeline};
use crate::render::{self, DrawStyle};
use crate::sink::FrameSink;
use crate::source::FrameSource;
use crate::tuning::Tuning;

/// Mosaic panels are shrunk to this percentage of the frame
const MOSAIC_PERCENT: u32 = 60;

/// Summary of a playback run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerStats {
    pub frames: usize,
    /// Circles drawn, summed over all frames
    pub detections: usize,
    pub processing_time: Duration,
}

impl PlayerStats {
    pub fn average_fps(&self) -> f64 {
        let secs = self.processing_time.as_secs_f64();
        if self.frames == 0 || secs <= 0.0 {
            return 0.0;
        }
        self.frames as f64 / secs
    }
}

/// One processed frame ready for display
pub struct RenderedFrame {
    pub image: RgbImage,
    pub data: FrameData,
    pub elapsed: Duration,
}

pub struct Player {
    variant: Variant,
    pipeline: Pipeline,
    style: DrawStyle,
    max_frames: Option<usize>,
}

impl Player {
    pub fn new(variant: Variant, tuning: Tuning) -> Self {
        Self {
            variant,
            pipeline: variant.build_pipeline(tuning),
            style: variant.draw_style(),
            max_frames: None,
        }
    }

    /// Dump every step's image per frame into `dir`
    pub fn with_debug(mut self, dir: PathBuf) -> Result<Self> {
        self.pipeline = self.pipeline.with_debug(dir)?;
        Ok(self)
    }

    pub fn with_max_frames(mut self, frames: usize) -> Self {
        self.max_frames = Some(frames);
        self
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn tuning(&self) -> &Tuning {
        self.pipeline.tuning()
    }

    /// Takes effect on the next frame
    pub fn set_tuning(&mut self, tuning: Tuning) {
        self.pipeline.set_tuning(tuning);
    }

    pub fn process_frame(&mut self, frame: RgbImage) -> Result<RenderedFrame> {
        self.process_frame_since(frame, Instant::now())
    }

    /// Like `process_frame`, with the FPS clock started at `start`, normally
    /// just before the frame was grabbed
    pub fn process_frame_since(&mut self, frame: RgbImage, start: Instant) -> Result<RenderedFrame> {
        let data = self.pipeline.run(frame)?;

        let mut output = (*data.original).clone();
        render::draw_colored_circles(&mut output, &data.annotated(), self.style);
        let elapsed = start.elapsed();
        render::draw_fps(&mut output, elapsed);

        let image = match self.variant {
            Variant::PoolBall => compose_mosaic(output, &data),
            _ => output,
        };

        Ok(RenderedFrame {
            image,
            data,
            elapsed,
        })
    }

    /// Play `source` into `sink` until either runs out
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
    ) -> Result<PlayerStats> {
        let mut stats = PlayerStats::default();
        let mut window_start = Instant::now();
        let mut window_frames = 0usize;

        tracing::info!(variant = %self.variant, "playback started");

        loop {
            if self.max_frames.is_some_and(|max| stats.frames >= max) {
                tracing::debug!(frames = stats.frames, "frame limit reached");
                break;
            }
            let start = Instant::now();
            let Some(frame) = source.next_frame()? else {
                tracing::info!("Can't receive frame (stream end?). Exiting ...");
                break;
            };

            let rendered = self.process_frame_since(frame, start)?;
            stats.frames += 1;
            stats.detections += rendered.data.circles.len();
            stats.processing_time += rendered.elapsed;

            tracing::debug!(
                frame = stats.frames,
                circles = rendered.data.circles.len(),
                detected = ?rendered.data.get_int("detected"),
                stable = ?rendered.data.get_bool("stable"),
                elapsed_ms = rendered.elapsed.as_millis() as u64,
                "frame shown"
            );

            window_frames += 1;
            if window_start.elapsed() >= Duration::from_secs(1) {
                tracing::info!(
                    fps = render::fps_from_duration(window_start.elapsed() / window_frames as u32),
                    circles = rendered.data.circles.len(),
                    "playing"
                );
                window_start = Instant::now();
                window_frames = 0;
            }

            if !sink.show(&rendered.image)? {
                tracing::info!("viewer closed");
                break;
            }
        }

        Ok(stats)
    }
}

fn titled(mut panel: RgbImage, title: &str) -> RgbImage {
    render::draw_title(&mut panel, title);
    panel
}

fn mask_panel(mask: Option<&GrayImage>, width: u32, height: u32) -> RgbImage {
    match mask {
        Some(mask) => render::gray_to_rgb(mask),
        None => RgbImage::new(width, height),
    }
}

/// The color mask panel shows the inverted mask once circles were colored,
/// since the second color is sampled under the inverse
fn color_mask_panel(data: &FrameData, width: u32, height: u32) -> RgbImage {
    match data.color_mask.as_ref() {
        Some(mask) if !data.circles.is_empty() => render::gray_to_rgb(&invert_mask(mask)),
        mask => mask_panel(mask, width, height),
    }
}

fn compose_mosaic(output: RgbImage, data: &FrameData) -> RgbImage {
    let (width, height) = data.original.dimensions();
    let masked = data
        .masked_frame
        .clone()
        .unwrap_or_else(|| (*data.original).clone());

    let panels = [
        titled(output, "Output"),
        titled(masked, "Masked frame"),
        titled(mask_panel(data.hsv_mask.as_ref(), width, height), "Frame mask"),
        titled(color_mask_panel(data, width, height), "Color mask"),
    ];
    render::mosaic(
        [&panels[0], &panels[1], &panels[2], &panels[3]],
        MOSAIC_PERCENT,
    )
}
