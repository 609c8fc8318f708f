//! Frame sources standing in for a camera

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use rand::prelude::*;

use crate::detection::POOL_CROP_BORDER;
use crate::models::Color;

/// Anything that yields frames one at a time
pub trait FrameSource: Send {
    /// Next frame, or `None` once the stream has ended
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;
}

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// The image files of a directory, played in file name order
pub struct ImageSequence {
    paths: Vec<PathBuf>,
    next: usize,
}

impl ImageSequence {
    pub fn open(dir: &Path) -> Result<Self> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Cannot open input {}", dir.display()))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
            if is_image {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            anyhow::bail!("Cannot open input {}: no image files", dir.display());
        }
        paths.sort();

        tracing::debug!(frames = paths.len(), dir = %dir.display(), "opened image sequence");
        Ok(Self { paths, next: 0 })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageSequence {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        let Some(path) = self.paths.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;
        let frame = image::open(path)
            .with_context(|| format!("Failed to decode frame {}", path.display()))?;
        Ok(Some(frame.to_rgb8()))
    }
}

/// A single image served repeatedly
pub struct StillImage {
    frame: RgbImage,
    remaining: Option<usize>,
}

impl StillImage {
    /// Repeat `frame` `repeat` times, or forever when `None`
    pub fn new(frame: RgbImage, repeat: Option<usize>) -> Self {
        Self {
            frame,
            remaining: repeat,
        }
    }

    pub fn open(path: &Path, repeat: Option<usize>) -> Result<Self> {
        let frame = image::open(path)
            .with_context(|| format!("Cannot open input {}", path.display()))?
            .to_rgb8();
        Ok(Self::new(frame, repeat))
    }
}

impl FrameSource for StillImage {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        match &mut self.remaining {
            Some(0) => Ok(None),
            Some(n) => {
                *n -= 1;
                Ok(Some(self.frame.clone()))
            }
            None => Ok(Some(self.frame.clone())),
        }
    }
}

/// A ball of the synthetic scene, left half colored and right half white
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub radius: u32,
    /// Horizontal speed in pixels per frame
    pub vx: f32,
    pub color: Color,
}

/// Generated pool table with slowly rolling two-tone balls
pub struct SyntheticScene {
    width: u32,
    height: u32,
    balls: Vec<Ball>,
    limit: Option<usize>,
    produced: usize,
}

impl SyntheticScene {
    /// Low-saturation cloth that falls inside the default HSV range
    pub const BACKGROUND: Color = Color { r: 90, g: 100, b: 110 };
    pub const BALL_RADIUS: u32 = 14;

    const PALETTE: [Color; 6] = [
        Color { r: 220, g: 30, b: 30 },
        Color { r: 30, g: 60, b: 210 },
        Color { r: 230, g: 200, b: 20 },
        Color { r: 40, g: 170, b: 50 },
        Color { r: 150, g: 40, b: 170 },
        Color { r: 240, g: 120, b: 20 },
    ];

    /// Place up to `count` non-overlapping balls inside the playing area.
    /// The same seed always yields the same scene.
    pub fn new(width: u32, height: u32, count: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let radius = Self::BALL_RADIUS;
        let margin = POOL_CROP_BORDER + radius + 4;
        let mut balls: Vec<Ball> = Vec::with_capacity(count);

        if width > 2 * margin && height > 2 * margin {
            let span_x = width - 2 * margin;
            let span_y = height - 2 * margin;
            let spacing = (4 * radius + 8) as f32;

            for _ in 0..count * 50 {
                if balls.len() == count {
                    break;
                }
                let x = (margin + rng.random_range(0..span_x)) as f32;
                let y = (margin + rng.random_range(0..span_y)) as f32;
                let clear = balls
                    .iter()
                    .all(|b| (b.x - x).hypot(b.y - y) >= spacing);
                if !clear {
                    continue;
                }
                let vx = if rng.random_bool(0.5) { -0.5 } else { 0.5 };
                balls.push(Ball {
                    x,
                    y,
                    radius,
                    vx,
                    color: Self::PALETTE[balls.len() % Self::PALETTE.len()],
                });
            }
        }

        if balls.len() < count {
            tracing::warn!(requested = count, placed = balls.len(), "scene too small for all balls");
        }

        Self {
            width,
            height,
            balls,
            limit: None,
            produced: 0,
        }
    }

    /// End the stream after `frames` frames
    pub fn with_limit(mut self, frames: usize) -> Self {
        self.limit = Some(frames);
        self
    }

    /// Keep every ball in place
    pub fn still(mut self) -> Self {
        for ball in &mut self.balls {
            ball.vx = 0.0;
        }
        self
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    /// Draw the scene in its current state
    pub fn render(&self) -> RgbImage {
        let mut frame = RgbImage::from_pixel(self.width, self.height, Self::BACKGROUND.to_rgb());
        let white = Rgb([255, 255, 255]);

        for ball in &self.balls {
            let r = ball.radius as f32;
            let min_x = (ball.x - r).floor().max(0.0) as u32;
            let min_y = (ball.y - r).floor().max(0.0) as u32;
            let max_x = ((ball.x + r).ceil() as u32).min(self.width.saturating_sub(1));
            let max_y = ((ball.y + r).ceil() as u32).min(self.height.saturating_sub(1));

            for y in min_y..=max_y {
                for x in min_x..=max_x {
                    let dx = x as f32 - ball.x;
                    let dy = y as f32 - ball.y;
                    if dx * dx + dy * dy > r * r {
                        continue;
                    }
                    let color = if dx < 0.0 { ball.color.to_rgb() } else { white };
                    frame.put_pixel(x, y, color);
                }
            }
        }
        frame
    }

    fn advance(&mut self) {
        let margin = (POOL_CROP_BORDER + Self::BALL_RADIUS) as f32;
        let right = self.width as f32 - margin;
        for ball in &mut self.balls {
            ball.x += ball.vx;
            if ball.x < margin || ball.x > right {
                ball.vx = -ball.vx;
                ball.x = ball.x.clamp(margin, right.max(margin));
            }
        }
    }
}

impl FrameSource for SyntheticScene {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        if self.limit.is_some_and(|limit| self.produced >= limit) {
            return Ok(None);
        }
        let frame = self.render();
        self.advance();
        self.produced += 1;
        Ok(Some(frame))
    }
}

/// Description of a source that can be opened again, e.g. when a viewer restarts
#[derive(Debug, Clone, PartialEq)]
pub enum SourceSpec {
    Directory(PathBuf),
    Still {
        path: PathBuf,
        repeat: Option<usize>,
    },
    Synthetic {
        width: u32,
        height: u32,
        balls: usize,
        seed: u64,
        frames: Option<usize>,
    },
}

impl SourceSpec {
    /// Pick a directory or still-image source for `path`
    pub fn from_path(path: PathBuf) -> Self {
        if path.is_dir() {
            SourceSpec::Directory(path)
        } else {
            SourceSpec::Still { path, repeat: None }
        }
    }

    pub fn synthetic(balls: usize) -> Self {
        SourceSpec::Synthetic {
            width: 640,
            height: 480,
            balls,
            seed: 1,
            frames: None,
        }
    }

    pub fn open(&self) -> Result<Box<dyn FrameSource>> {
        Ok(match self {
            SourceSpec::Directory(dir) => Box::new(ImageSequence::open(dir)?),
            SourceSpec::Still { path, repeat } => Box::new(StillImage::open(path, *repeat)?),
            SourceSpec::Synthetic {
                width,
                height,
                balls,
                seed,
                frames,
            } => {
                let scene = SyntheticScene::new(*width, *height, *balls, *seed);
                match frames {
                    Some(n) => Box::new(scene.with_limit(*n)),
                    None => Box::new(scene),
                }
            }
        })
    }
}
