use image::Rgb;
use serde::{Deserialize, Serialize};

/// Raw circle reported by the Hough detector, in working-image coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoughCircle {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub votes: u32,
}

impl HoughCircle {
    /// Round the detection and scale it up to frame coordinates
    pub fn to_frame(&self, ratio: u32) -> Circle {
        let round = |v: f32| v.round().max(0.0) as u32;
        Circle {
            x: round(self.x) * ratio,
            y: round(self.y) * ratio,
            radius: round(self.radius) * ratio,
        }
    }
}

/// Circle in frame coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Circle {
    pub x: u32,
    pub y: u32,
    pub radius: u32,
}

impl Circle {
    pub fn new(x: u32, y: u32, radius: u32) -> Self {
        Self { x, y, radius }
    }

    /// Whether a pixel lies on the filled disk
    pub fn contains(&self, x: u32, y: u32) -> bool {
        let dx = x as i64 - self.x as i64;
        let dy = y as i64 - self.y as i64;
        let r = self.radius as i64;
        dx * dx + dy * dy <= r * r
    }

    /// Whether another circle's center lies within `dx` by `dy` pixels of this one
    pub fn is_near(&self, other: &Circle, dx: u32, dy: u32) -> bool {
        self.x.abs_diff(other.x) <= dx && self.y.abs_diff(other.y) <= dy
    }

    /// Bounding box of the disk clamped to an image, as inclusive (min_x, min_y, max_x, max_y)
    pub fn bounds(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        if width == 0 || height == 0 {
            return None;
        }
        let min_x = self.x.saturating_sub(self.radius);
        let min_y = self.y.saturating_sub(self.radius);
        if min_x >= width || min_y >= height {
            return None;
        }
        let max_x = self.x.saturating_add(self.radius).min(width - 1);
        let max_y = self.y.saturating_add(self.radius).min(height - 1);
        Some((min_x, min_y, max_x, max_y))
    }
}

/// RGB color sampled from a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from per-channel means, rounding half away from zero
    pub fn from_mean(mean: [f64; 3]) -> Self {
        let channel = |v: f64| v.round().clamp(0.0, 255.0) as u8;
        Self {
            r: channel(mean[0]),
            g: channel(mean[1]),
            b: channel(mean[2]),
        }
    }

    pub fn to_rgb(self) -> Rgb<u8> {
        Rgb([self.r, self.g, self.b])
    }
}

impl From<Rgb<u8>> for Color {
    fn from(pixel: Rgb<u8>) -> Self {
        Self::new(pixel[0], pixel[1], pixel[2])
    }
}

/// A detected circle with the colors sampled inside it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColoredCircle {
    pub circle: Circle,
    pub colors: Vec<Color>,
}

impl ColoredCircle {
    pub fn new(circle: Circle) -> Self {
        Self {
            circle,
            colors: Vec::new(),
        }
    }
}
