use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use imageproc::filter::{gaussian_blur_f32, median_filter};
use serde::{Deserialize, Serialize};

/// Convert image to grayscale
pub fn to_grayscale(img: &RgbImage) -> GrayImage {
    image::imageops::grayscale(img)
}

/// Smooth and halve an image, keeping every even row and column
pub fn pyr_down(img: &GrayImage) -> GrayImage {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return img.clone();
    }

    // sigma 1.0 approximates the 5-tap binomial kernel [1 4 6 4 1] / 16
    let smoothed = gaussian_blur_f32(img, 1.0);
    ImageBuffer::from_fn(width.div_ceil(2), height.div_ceil(2), |x, y| {
        *smoothed.get_pixel(x * 2, y * 2)
    })
}

/// Median filter with a square aperture of `ksize` pixels
pub fn median_blur(img: &GrayImage, ksize: u32) -> GrayImage {
    if ksize <= 1 {
        return img.clone();
    }
    let radius = ksize / 2;
    median_filter(img, radius, radius)
}

/// Remove `border` pixels from every side of the frame
pub fn crop_border(img: &RgbImage, border: u32) -> RgbImage {
    let (width, height) = img.dimensions();
    if border == 0 || width <= 2 * border || height <= 2 * border {
        return img.clone();
    }
    image::imageops::crop_imm(img, border, border, width - 2 * border, height - 2 * border)
        .to_image()
}

/// Integer ratio between frame width and working-image width
pub fn scale_ratio(frame_width: u32, work_width: u32) -> u32 {
    if work_width == 0 {
        return 1;
    }
    ((frame_width as f32 / work_width as f32).round() as u32).max(1)
}

/// Mask of pixels whose three channels all exceed `threshold`
pub fn channel_threshold_mask(img: &RgbImage, threshold: u8) -> GrayImage {
    ImageBuffer::from_fn(img.width(), img.height(), |x, y| {
        let p = img.get_pixel(x, y);
        if p.0.iter().all(|&c| c > threshold) {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

pub fn invert_mask(mask: &GrayImage) -> GrayImage {
    let mut inverted = mask.clone();
    for pixel in inverted.pixels_mut() {
        pixel[0] = 255 - pixel[0];
    }
    inverted
}

/// Convert RGB to HSV with hue halved into 0..=180 and S, V in 0..=255
pub fn rgb_to_hsv(img: &RgbImage) -> RgbImage {
    ImageBuffer::from_fn(img.width(), img.height(), |x, y| hsv_pixel(*img.get_pixel(x, y)))
}

fn hsv_pixel(pixel: Rgb<u8>) -> Rgb<u8> {
    let [r, g, b] = pixel.0.map(|c| c as f32);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = v - min;

    let s = if v > 0.0 { delta * 255.0 / v } else { 0.0 };
    let mut h = if delta == 0.0 {
        0.0
    } else if v == r {
        60.0 * (g - b) / delta
    } else if v == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if h < 0.0 {
        h += 360.0;
    }

    Rgb([
        (h / 2.0).round().min(180.0) as u8,
        s.round().min(255.0) as u8,
        v as u8,
    ])
}

/// Inclusive HSV bounds, hue in 0..=180
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HsvRange {
    pub low_h: u8,
    pub high_h: u8,
    pub low_s: u8,
    pub high_s: u8,
    pub low_v: u8,
    pub high_v: u8,
}

impl HsvRange {
    pub fn contains(&self, hsv: Rgb<u8>) -> bool {
        let [h, s, v] = hsv.0;
        (self.low_h..=self.high_h).contains(&h)
            && (self.low_s..=self.high_s).contains(&s)
            && (self.low_v..=self.high_v).contains(&v)
    }
}

impl Default for HsvRange {
    fn default() -> Self {
        // Table-cloth range for the pool-ball demo
        Self {
            low_h: 0,
            high_h: 180,
            low_s: 0,
            high_s: 70,
            low_v: 45,
            high_v: 160,
        }
    }
}

/// Mask of HSV pixels inside `range`
pub fn hsv_in_range(hsv: &RgbImage, range: &HsvRange) -> GrayImage {
    ImageBuffer::from_fn(hsv.width(), hsv.height(), |x, y| {
        if range.contains(*hsv.get_pixel(x, y)) {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Black out every pixel whose mask value is zero
pub fn apply_mask(img: &RgbImage, mask: &GrayImage) -> RgbImage {
    ImageBuffer::from_fn(img.width(), img.height(), |x, y| {
        match mask.get_pixel_checked(x, y) {
            Some(m) if m[0] > 0 => *img.get_pixel(x, y),
            _ => Rgb([0, 0, 0]),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pyr_down_halves_rounding_up() {
        let img = GrayImage::from_pixel(11, 8, Luma([90]));
        let down = pyr_down(&img);
        assert_eq!(down.dimensions(), (6, 4));
        assert!(down.pixels().all(|p| p[0].abs_diff(90) <= 1));
    }

    #[test]
    fn test_median_blur_removes_salt() {
        let mut img = GrayImage::from_pixel(9, 9, Luma([10]));
        img.put_pixel(4, 4, Luma([255]));
        let blurred = median_blur(&img, 5);
        assert_eq!(blurred.get_pixel(4, 4)[0], 10);
    }

    #[test]
    fn test_crop_border_too_small_is_identity() {
        let img = RgbImage::new(100, 100);
        assert_eq!(crop_border(&img, 70).dimensions(), (100, 100));
        assert_eq!(crop_border(&img, 10).dimensions(), (80, 80));
    }

    #[test]
    fn test_scale_ratio() {
        assert_eq!(scale_ratio(640, 320), 2);
        assert_eq!(scale_ratio(641, 321), 2);
        assert_eq!(scale_ratio(500, 500), 1);
        assert_eq!(scale_ratio(500, 0), 1);
    }

    #[test]
    fn test_channel_threshold_needs_every_channel() {
        let mut img = RgbImage::from_pixel(2, 1, Rgb([200, 200, 200]));
        img.put_pixel(1, 0, Rgb([255, 255, 100]));
        let mask = channel_threshold_mask(&img, 120);
        assert_eq!(mask.get_pixel(0, 0)[0], 255);
        assert_eq!(mask.get_pixel(1, 0)[0], 0);
        assert_eq!(invert_mask(&mask).get_pixel(1, 0)[0], 255);
    }

    #[test]
    fn test_hsv_primary_colors() {
        assert_eq!(hsv_pixel(Rgb([255, 0, 0])), Rgb([0, 255, 255]));
        assert_eq!(hsv_pixel(Rgb([0, 255, 0])), Rgb([60, 255, 255]));
        assert_eq!(hsv_pixel(Rgb([0, 0, 255])), Rgb([120, 255, 255]));
        assert_eq!(hsv_pixel(Rgb([128, 128, 128])), Rgb([0, 0, 128]));
    }

    #[test]
    fn test_hsv_mask_and_apply() {
        let mut img = RgbImage::from_pixel(2, 1, Rgb([60, 100, 60]));
        img.put_pixel(1, 0, Rgb([250, 250, 250]));
        let range = HsvRange::default();
        let mask = hsv_in_range(&rgb_to_hsv(&img), &range);
        // first pixel: S = 102, outside the cloth range
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
        assert_eq!(mask.get_pixel(1, 0)[0], 0);

        let masked = apply_mask(&img, &invert_mask(&mask));
        assert_eq!(masked.get_pixel(1, 0), &Rgb([250, 250, 250]));
    }
}
