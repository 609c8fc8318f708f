use image::{GrayImage, RgbImage};

use crate::detection::kmeans::{KMeans, KMeansCriteria};
use crate::models::{Circle, Color};

/// Mean color of the pixels on the circle's disk, optionally restricted to
/// non-zero `mask` pixels. An empty selection is black.
pub fn mean_color(frame: &RgbImage, circle: &Circle, mask: Option<&GrayImage>) -> Color {
    let Some((min_x, min_y, max_x, max_y)) = circle.bounds(frame.width(), frame.height()) else {
        return Color::BLACK;
    };

    let mut sum = [0u64; 3];
    let mut count: u64 = 0;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            if !circle.contains(x, y) {
                continue;
            }
            if let Some(mask) = mask {
                match mask.get_pixel_checked(x, y) {
                    Some(m) if m[0] > 0 => {}
                    _ => continue,
                }
            }
            let pixel = frame.get_pixel(x, y);
            for c in 0..3 {
                sum[c] += pixel[c] as u64;
            }
            count += 1;
        }
    }

    if count == 0 {
        return Color::BLACK;
    }
    Color::from_mean(sum.map(|s| s as f64 / count as f64))
}

/// First color under `mask`, second color under its inverse
pub fn two_colors_by_mask(frame: &RgbImage, mask: &GrayImage, circle: &Circle) -> [Color; 2] {
    let inverted = super::preprocessing::invert_mask(mask);
    [
        mean_color(frame, circle, Some(mask)),
        mean_color(frame, circle, Some(&inverted)),
    ]
}

/// Pixels on the circle's disk, skipping pure black
pub fn disk_samples(frame: &RgbImage, circle: &Circle) -> Vec<[f32; 3]> {
    let Some((min_x, min_y, max_x, max_y)) = circle.bounds(frame.width(), frame.height()) else {
        return Vec::new();
    };

    let mut samples = Vec::new();
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            if !circle.contains(x, y) {
                continue;
            }
            let p = frame.get_pixel(x, y);
            if p.0 == [0, 0, 0] {
                continue;
            }
            samples.push([p[0] as f32, p[1] as f32, p[2] as f32]);
        }
    }
    samples
}

/// The two k-means cluster centers of the circle's pixels
pub fn two_colors_by_kmeans(frame: &RgbImage, circle: &Circle) -> [Color; 2] {
    let samples = disk_samples(frame, circle);
    match samples.len() {
        0 => [Color::BLACK; 2],
        1 => {
            let only = to_color(&samples[0]);
            [only, only]
        }
        _ => {
            let kmeans = KMeans::new(2).with_criteria(KMeansCriteria {
                max_iter: 1,
                epsilon: 1.0,
            });
            match kmeans.fit(&samples) {
                Some(result) => [to_color(&result.centers[0]), to_color(&result.centers[1])],
                None => [Color::BLACK; 2],
            }
        }
    }
}

fn to_color(center: &[f32; 3]) -> Color {
    Color::from_mean(center.map(|c| c as f64))
}
