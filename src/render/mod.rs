pub mod font;

use std::time::Duration;

use image::imageops::{self, FilterType};
use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use crate::models::{Circle, Color, ColoredCircle};

/// How detected circles are drawn onto the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawStyle {
    /// Thin red outline
    Plain,
    /// Thick outline in the circle's first color
    MeanColor,
    /// Left half in the first color, right half in the second
    SplitArcs { radius_offset: u32 },
}

/// Draw an arc of the given thickness. Angles are in degrees with 0 along +x
/// and 90 along +y (down), so 90..270 is the left half of the circle.
pub fn draw_arc(
    img: &mut RgbImage,
    center: (i64, i64),
    radius: f32,
    start_deg: f32,
    end_deg: f32,
    color: Rgb<u8>,
    thickness: u32,
) {
    let (width, height) = (img.width() as i64, img.height() as i64);
    if width == 0 || height == 0 || end_deg <= start_deg {
        return;
    }
    let half = thickness.max(1) as f32 / 2.0;
    let reach = (radius + half).ceil() as i64;
    let full_turn = end_deg - start_deg >= 360.0;

    let min_x = (center.0 - reach).max(0);
    let max_x = (center.0 + reach).min(width - 1);
    let min_y = (center.1 - reach).max(0);
    let max_y = (center.1 + reach).min(height - 1);

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = (x - center.0) as f32;
            let dy = (y - center.1) as f32;
            let distance = (dx * dx + dy * dy).sqrt();
            if (distance - radius).abs() > half {
                continue;
            }
            if !full_turn && !angle_in_range(dy.atan2(dx).to_degrees(), start_deg, end_deg) {
                continue;
            }
            img.put_pixel(x as u32, y as u32, color);
        }
    }
}

fn angle_in_range(angle: f32, start: f32, end: f32) -> bool {
    let angle = angle.rem_euclid(360.0);
    let start_norm = start.rem_euclid(360.0);
    let shift = start - start_norm;
    // Bring the angle into [start, start + 360)
    let mut a = angle + shift;
    if a < start {
        a += 360.0;
    }
    a <= end
}

pub fn draw_circle_outline(img: &mut RgbImage, circle: &Circle, color: Rgb<u8>, thickness: u32) {
    draw_arc(
        img,
        (circle.x as i64, circle.y as i64),
        circle.radius as f32,
        0.0,
        360.0,
        color,
        thickness,
    );
}

/// Draw every circle according to `style`. Circles missing the colors a
/// style needs are drawn in red.
pub fn draw_colored_circles(img: &mut RgbImage, circles: &[ColoredCircle], style: DrawStyle) {
    for colored in circles {
        let circle = &colored.circle;
        match style {
            DrawStyle::Plain => draw_circle_outline(img, circle, Color::RED.to_rgb(), 2),
            DrawStyle::MeanColor => {
                let color = colored.colors.first().copied().unwrap_or(Color::RED);
                draw_circle_outline(img, circle, color.to_rgb(), 4);
            }
            DrawStyle::SplitArcs { radius_offset } => {
                let radius = (circle.radius + radius_offset) as f32;
                let center = (circle.x as i64, circle.y as i64);
                match colored.colors.as_slice() {
                    [first, second, ..] => {
                        draw_arc(img, center, radius, 90.0, 270.0, first.to_rgb(), 4);
                        draw_arc(img, center, radius, 270.0, 450.0, second.to_rgb(), 4);
                    }
                    _ => draw_arc(img, center, radius, 0.0, 360.0, Color::RED.to_rgb(), 4),
                }
            }
        }
    }
}

/// Frames per second for a frame that took `duration`
pub fn fps_from_duration(duration: Duration) -> u32 {
    let millis = duration.as_millis().max(1) as f64;
    (1000.0 / millis).round() as u32
}

/// Draw the FPS counter in red near the top-right corner
pub fn draw_fps(img: &mut RgbImage, duration: Duration) {
    let label = fps_from_duration(duration).to_string();
    let scale = 3;
    let (_, text_h) = font::text_size(&label, scale);
    let x = img.width() as i32 - 60;
    let baseline = 40;
    font::draw_text(img, &label, x, baseline - text_h as i32, scale, Color::RED.to_rgb());
}

/// Label a panel in its top-left corner
pub fn draw_title(img: &mut RgbImage, title: &str) {
    let scale = 3;
    let (text_w, text_h) = font::text_size(title, scale);
    let backing = Rect::at(4, 4).of_size(text_w + 12, text_h + 12);
    draw_filled_rect_mut(img, backing, Rgb([0, 0, 0]));
    font::draw_text(img, title, 10, 10, scale, Color::WHITE.to_rgb());
}

pub fn gray_to_rgb(mask: &GrayImage) -> RgbImage {
    RgbImage::from_fn(mask.width(), mask.height(), |x, y| {
        let v = mask.get_pixel(x, y)[0];
        Rgb([v, v, v])
    })
}

/// Resize four panels to `percent`% and tile them two by two
pub fn mosaic(panels: [&RgbImage; 4], percent: u32) -> RgbImage {
    let scaled: Vec<RgbImage> = panels
        .iter()
        .map(|p| {
            let w = (p.width() * percent / 100).max(1);
            let h = (p.height() * percent / 100).max(1);
            imageops::resize(*p, w, h, FilterType::Triangle)
        })
        .collect();

    let tile_w = scaled.iter().map(|p| p.width()).max().unwrap_or(1);
    let tile_h = scaled.iter().map(|p| p.height()).max().unwrap_or(1);
    let mut canvas = RgbImage::new(tile_w * 2, tile_h * 2);
    for (i, panel) in scaled.iter().enumerate() {
        let x = (i as u32 % 2) * tile_w;
        let y = (i as u32 / 2) * tile_h;
        imageops::overlay(&mut canvas, panel, x as i64, y as i64);
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb<u8> = Rgb([255, 0, 0]);
    const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

    #[test]
    fn test_split_arcs_color_left_and_right_halves() {
        let mut img = RgbImage::new(60, 60);
        let circle = ColoredCircle {
            circle: Circle::new(30, 30, 20),
            colors: vec![Color::new(255, 0, 0), Color::new(0, 0, 255)],
        };
        draw_colored_circles(&mut img, &[circle], DrawStyle::SplitArcs { radius_offset: 0 });

        assert_eq!(img.get_pixel(10, 30), &RED);
        assert_eq!(img.get_pixel(50, 30), &BLUE);
        // center stays untouched
        assert_eq!(img.get_pixel(30, 30), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_radius_offset_grows_ring() {
        let mut img = RgbImage::new(80, 80);
        let circle = ColoredCircle {
            circle: Circle::new(40, 40, 10),
            colors: vec![Color::new(255, 0, 0), Color::new(0, 0, 255)],
        };
        draw_colored_circles(&mut img, &[circle], DrawStyle::SplitArcs { radius_offset: 8 });
        assert_eq!(img.get_pixel(22, 40), &RED);
        assert_eq!(img.get_pixel(30, 40), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_missing_colors_fall_back_to_red() {
        let mut img = RgbImage::new(40, 40);
        let circle = ColoredCircle::new(Circle::new(20, 20, 10));
        draw_colored_circles(&mut img, &[circle.clone()], DrawStyle::MeanColor);
        assert_eq!(img.get_pixel(30, 20), &RED);

        let mut img = RgbImage::new(40, 40);
        draw_colored_circles(&mut img, &[circle], DrawStyle::SplitArcs { radius_offset: 0 });
        assert_eq!(img.get_pixel(20, 10), &RED);
    }

    #[test]
    fn test_angle_ranges_wrap() {
        assert!(angle_in_range(180.0, 90.0, 270.0));
        assert!(!angle_in_range(0.0, 90.0, 270.0));
        assert!(angle_in_range(0.0, 270.0, 450.0));
        assert!(angle_in_range(-90.0, 270.0, 450.0));
        assert!(!angle_in_range(180.0, 270.0, 450.0));
    }

    #[test]
    fn test_fps_from_duration() {
        assert_eq!(fps_from_duration(Duration::from_millis(33)), 30);
        assert_eq!(fps_from_duration(Duration::from_millis(40)), 25);
        assert_eq!(fps_from_duration(Duration::ZERO), 1000);
    }

    #[test]
    fn test_mosaic_tiles_two_by_two() {
        let a = RgbImage::from_pixel(100, 50, Rgb([10, 0, 0]));
        let b = RgbImage::from_pixel(100, 50, Rgb([20, 0, 0]));
        let c = RgbImage::from_pixel(100, 50, Rgb([30, 0, 0]));
        let d = RgbImage::from_pixel(100, 50, Rgb([40, 0, 0]));
        let out = mosaic([&a, &b, &c, &d], 60);

        assert_eq!(out.dimensions(), (120, 60));
        let red_at = |x, y| out.get_pixel(x, y)[0];
        assert!(red_at(30, 15).abs_diff(10) <= 1);
        assert!(red_at(90, 15).abs_diff(20) <= 1);
        assert!(red_at(30, 45).abs_diff(30) <= 1);
        assert!(red_at(90, 45).abs_diff(40) <= 1);
    }

    #[test]
    fn test_draw_fps_stays_inside_frame() {
        let mut img = RgbImage::new(200, 100);
        draw_fps(&mut img, Duration::from_millis(40));
        let red_pixels = img.pixels().filter(|p| **p == RED).count();
        assert!(red_pixels > 0);
        // nothing drawn left of the counter column
        assert!((0..140).all(|x| (0..100).all(|y| img.get_pixel(x, y) != &RED)));
    }
}
