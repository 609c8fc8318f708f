//! Hough-gradient circle detection.
//!
//! Every Canny edge pixel votes along its Sobel gradient line for all
//! radii in range. Accumulator peaks become center candidates. Each
//! surviving center then picks the radius with the densest run of edge
//! distances.

use image::GrayImage;
use imageproc::edges::canny;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use serde::{Deserialize, Serialize};

use crate::models::HoughCircle;

/// Parameters of the Hough-gradient detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoughParams {
    /// Inverse ratio of accumulator resolution to image resolution, at least 1
    pub dp: f32,
    /// Minimum distance between accepted centers
    pub min_dist: f32,
    /// High Canny threshold, the low threshold is half of it
    pub canny_high: f32,
    /// Votes needed by a center and edge points needed by its radius
    pub acc_threshold: u32,
    pub min_radius: u32,
    /// Zero means "as large as the image"
    pub max_radius: u32,
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            dp: 1.0,
            min_dist: 35.0,
            canny_high: 150.0,
            acc_threshold: 25,
            min_radius: 5,
            max_radius: 45,
        }
    }
}

impl HoughParams {
    /// Preset tuned for pool balls seen from above
    pub fn pool_ball() -> Self {
        Self {
            dp: 1.0,
            min_dist: 25.0,
            canny_high: 140.0,
            acc_threshold: 14,
            min_radius: 12,
            max_radius: 16,
        }
    }

    fn normalized(&self, width: u32, height: u32) -> HoughParams {
        let min_radius = self.min_radius;
        let max_radius = if self.max_radius == 0 {
            width.max(height)
        } else if self.max_radius <= min_radius {
            min_radius + 2
        } else {
            self.max_radius
        };

        HoughParams {
            dp: if self.dp.is_finite() { self.dp.max(1.0) } else { 1.0 },
            min_dist: self.min_dist.max(1.0),
            canny_high: self.canny_high.max(1.0),
            acc_threshold: self.acc_threshold.max(1),
            min_radius,
            max_radius,
        }
    }
}

/// Detect circles in a grayscale image, strongest center first
pub fn detect_circles(img: &GrayImage, params: &HoughParams) -> Vec<HoughCircle> {
    let (width, height) = img.dimensions();
    if width < 3 || height < 3 {
        return Vec::new();
    }
    let p = params.normalized(width, height);

    let edges = canny(img, p.canny_high / 2.0, p.canny_high);
    let gx = horizontal_sobel(img);
    let gy = vertical_sobel(img);

    let inv_dp = 1.0 / p.dp;
    let acc_w = ((width as f32 * inv_dp).ceil() as usize).max(1);
    let acc_h = ((height as f32 * inv_dp).ceil() as usize).max(1);
    let mut acc = vec![0u32; acc_w * acc_h];
    let mut points: Vec<(f32, f32)> = Vec::new();

    for (x, y, edge) in edges.enumerate_pixels() {
        if edge[0] == 0 {
            continue;
        }
        let dx = gx.get_pixel(x, y)[0] as f32;
        let dy = gy.get_pixel(x, y)[0] as f32;
        let magnitude = (dx * dx + dy * dy).sqrt();
        if magnitude == 0.0 {
            continue;
        }
        points.push((x as f32, y as f32));

        let (ux, uy) = (dx / magnitude, dy / magnitude);
        let (px, py) = ((x as f32 + 0.5) * inv_dp, (y as f32 + 0.5) * inv_dp);
        for sign in [1.0f32, -1.0] {
            for r in p.min_radius..=p.max_radius {
                let step = sign * r as f32 * inv_dp;
                let ax = px + ux * step;
                let ay = py + uy * step;
                if ax < 0.0 || ay < 0.0 {
                    break;
                }
                let (ax, ay) = (ax as usize, ay as usize);
                if ax >= acc_w || ay >= acc_h {
                    break;
                }
                acc[ay * acc_w + ax] += 1;
            }
        }
    }

    let centers = find_centers(&acc, acc_w, acc_h, p.acc_threshold);
    if centers.is_empty() {
        return Vec::new();
    }

    let min_dist2 = p.min_dist * p.min_dist;
    let min_r2 = (p.min_radius as f32).powi(2);
    let max_r2 = (p.max_radius as f32).powi(2);
    let bin_width = p.dp;

    let mut circles: Vec<HoughCircle> = Vec::new();
    let mut distances: Vec<f32> = Vec::with_capacity(points.len());

    for (index, votes) in centers {
        let cx = ((index % acc_w) as f32 + 0.5) * p.dp - 0.5;
        let cy = ((index / acc_w) as f32 + 0.5) * p.dp - 0.5;

        let too_close = circles.iter().any(|c| {
            let (dx, dy) = (c.x - cx, c.y - cy);
            dx * dx + dy * dy < min_dist2
        });
        if too_close {
            continue;
        }

        distances.clear();
        for &(px, py) in &points {
            let d2 = (px - cx).powi(2) + (py - cy).powi(2);
            if d2 >= min_r2 && d2 <= max_r2 {
                distances.push(d2.sqrt());
            }
        }
        if distances.len() <= p.acc_threshold as usize {
            continue;
        }
        distances.sort_by(|a, b| a.total_cmp(b));

        if let Some((radius, support)) = best_radius(&distances, bin_width) {
            if support > p.acc_threshold as usize {
                circles.push(HoughCircle { x: cx, y: cy, radius, votes });
            }
        }
    }

    circles
}

/// Local accumulator maxima above `threshold`, sorted by descending votes
fn find_centers(acc: &[u32], acc_w: usize, acc_h: usize, threshold: u32) -> Vec<(usize, u32)> {
    let mut centers = Vec::new();
    if acc_w < 3 || acc_h < 3 {
        return centers;
    }

    for y in 1..acc_h - 1 {
        for x in 1..acc_w - 1 {
            let i = y * acc_w + x;
            let v = acc[i];
            if v > threshold
                && v > acc[i - 1]
                && v >= acc[i + 1]
                && v > acc[i - acc_w]
                && v >= acc[i + acc_w]
            {
                centers.push((i, v));
            }
        }
    }

    // Stable sort keeps raster order between equal peaks
    centers.sort_by(|a, b| b.1.cmp(&a.1));
    centers
}

/// Pick the run of sorted distances with the highest support per unit radius.
/// Returns the run's median distance and its size.
fn best_radius(sorted: &[f32], bin_width: f32) -> Option<(f32, usize)> {
    let mut best: Option<(f32, usize)> = None;
    let mut start = 0;

    for end in 1..=sorted.len() {
        if end < sorted.len() && sorted[end] - sorted[start] <= bin_width {
            continue;
        }
        let count = end - start;
        let r = sorted[(start + end - 1) / 2];
        let better = match best {
            None => true,
            Some((best_r, best_count)) => {
                count as f32 * best_r.max(1.0) > best_count as f32 * r.max(1.0)
            }
        };
        if better {
            best = Some((r, count));
        }
        start = end;
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::draw_filled_circle_mut;

    fn disk_image(circles: &[(i32, i32, i32)]) -> GrayImage {
        let mut img = GrayImage::from_pixel(200, 160, Luma([30]));
        for &(x, y, r) in circles {
            draw_filled_circle_mut(&mut img, (x, y), r, Luma([220]));
        }
        img
    }

    fn params() -> HoughParams {
        HoughParams {
            dp: 1.0,
            min_dist: 20.0,
            canny_high: 150.0,
            acc_threshold: 20,
            min_radius: 8,
            max_radius: 30,
        }
    }

    #[test]
    fn test_detects_single_disk() {
        let img = disk_image(&[(100, 80, 20)]);
        let circles = detect_circles(&img, &params());

        assert!(!circles.is_empty(), "expected at least one circle");
        let c = circles[0];
        assert!((c.x - 100.0).abs() <= 2.0, "x = {}", c.x);
        assert!((c.y - 80.0).abs() <= 2.0, "y = {}", c.y);
        assert!((c.radius - 20.0).abs() <= 2.0, "r = {}", c.radius);
    }

    #[test]
    fn test_detects_two_separate_disks() {
        let img = disk_image(&[(50, 80, 18), (150, 80, 14)]);
        let circles = detect_circles(&img, &params());

        let near = |x: f32, y: f32| {
            circles
                .iter()
                .any(|c| (c.x - x).abs() <= 2.0 && (c.y - y).abs() <= 2.0)
        };
        assert!(near(50.0, 80.0));
        assert!(near(150.0, 80.0));
    }

    #[test]
    fn test_blank_image_has_no_circles() {
        let img = GrayImage::from_pixel(64, 64, Luma([128]));
        assert!(detect_circles(&img, &params()).is_empty());
        assert!(detect_circles(&GrayImage::new(2, 2), &params()).is_empty());
    }

    #[test]
    fn test_min_dist_keeps_centers_apart() {
        let img = disk_image(&[(100, 80, 20)]);
        let circles = detect_circles(&img, &params());
        for (i, a) in circles.iter().enumerate() {
            for b in circles.iter().skip(i + 1) {
                let d = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
                assert!(d >= 20.0);
            }
        }
    }

    #[test]
    fn test_normalized_radius_bounds() {
        let p = HoughParams { min_radius: 12, max_radius: 10, ..params() };
        assert_eq!(p.normalized(100, 50).max_radius, 14);

        let p = HoughParams { max_radius: 0, dp: 0.0, acc_threshold: 0, ..params() };
        let n = p.normalized(100, 50);
        assert_eq!(n.max_radius, 100);
        assert_eq!(n.dp, 1.0);
        assert_eq!(n.acc_threshold, 1);
    }

    #[test]
    fn test_fractional_dp_behaves_like_one() {
        let img = disk_image(&[(100, 80, 20)]);
        let fine = detect_circles(&img, &HoughParams { dp: 0.1, ..params() });
        assert_eq!(fine, detect_circles(&img, &params()));
        assert!(!fine.is_empty());
    }

    #[test]
    fn test_best_radius_prefers_dense_run() {
        let sorted = [5.0, 9.8, 10.0, 10.2, 10.4, 10.6, 30.0, 30.5];
        let (r, count) = best_radius(&sorted, 1.0).unwrap();
        assert_eq!(count, 5);
        assert!((r - 10.2).abs() < 1e-6);
        assert!(best_radius(&[], 1.0).is_none());
    }

    #[test]
    fn test_find_centers_breaks_plateau_ties() {
        // 4x4 accumulator with a 2x2 plateau in the middle
        let mut acc = vec![0u32; 16];
        for i in [5, 6, 9, 10] {
            acc[i] = 7;
        }
        let centers = find_centers(&acc, 4, 4, 3);
        assert_eq!(centers, vec![(5, 7)]);
    }
}
