use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;
use std::path::Path;

pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const RED: Rgb<u8> = Rgb([200, 40, 40]);

/// A frame with filled disks given as (x, y, radius, color)
pub fn disk_frame(width: u32, height: u32, disks: &[(i32, i32, i32, Rgb<u8>)]) -> RgbImage {
    let mut frame = RgbImage::from_pixel(width, height, BLACK);
    for &(x, y, r, color) in disks {
        draw_filled_circle_mut(&mut frame, (x, y), r, color);
    }
    frame
}

/// A disk whose left half is `left` and right half white, on black
pub fn two_tone_frame(width: u32, height: u32, center: (u32, u32), radius: u32, left: Rgb<u8>) -> RgbImage {
    let circle = circlecam::Circle::new(center.0, center.1, radius);
    RgbImage::from_fn(width, height, |x, y| {
        if !circle.contains(x, y) {
            BLACK
        } else if x < center.0 {
            left
        } else {
            WHITE
        }
    })
}

/// Writes `count` copies of `frame` as numbered PNG files
pub fn write_frames(dir: &Path, frame: &RgbImage, count: usize) {
    for i in 0..count {
        frame
            .save(dir.join(format!("input_{:03}.png", i)))
            .expect("Failed to save test frame");
    }
}

/// Whether `circle` lies within `tolerance` pixels of the expected center
pub fn centered_near(circle: &circlecam::Circle, x: u32, y: u32, tolerance: u32) -> bool {
    circle.x.abs_diff(x) <= tolerance && circle.y.abs_diff(y) <= tolerance
}
