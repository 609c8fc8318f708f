use crate::detection::stabilize::CircleBuffer;
use crate::detection::{colors, hough, preprocessing};
use crate::models::ColoredCircle;
use crate::pipeline::{FrameData, MetadataValue, PipelineContext, PipelineStep};
use anyhow::Result;
use image::DynamicImage;
use std::sync::{Arc, Mutex};

/// Cut a fixed border off the frame (table rails, camera vignette)
pub struct CropStep {
    pub border: u32,
}

impl PipelineStep for CropStep {
    fn process(&self, mut data: FrameData, _context: &PipelineContext) -> Result<FrameData> {
        let cropped = preprocessing::crop_border(&data.original, self.border);
        data.image = DynamicImage::ImageRgb8(cropped.clone());
        data.original = Arc::new(cropped);
        Ok(data)
    }

    fn name(&self) -> &str {
        "Crop"
    }
}

/// Black out the pixels inside the tuned HSV range (the table cloth)
pub struct HsvMaskStep;

impl PipelineStep for HsvMaskStep {
    fn process(&self, mut data: FrameData, context: &PipelineContext) -> Result<FrameData> {
        let hsv = preprocessing::rgb_to_hsv(&data.original);
        let in_range = preprocessing::hsv_in_range(&hsv, &context.tuning.hsv);
        let mask = preprocessing::invert_mask(&in_range);
        let masked = preprocessing::apply_mask(&data.original, &mask);

        data.image = DynamicImage::ImageRgb8(masked.clone());
        data.masked_frame = Some(masked);
        data.hsv_mask = Some(mask);
        Ok(data)
    }

    fn name(&self) -> &str {
        "HSV Mask"
    }
}

/// Convert image to grayscale
pub struct GrayscaleStep;

impl PipelineStep for GrayscaleStep {
    fn process(&self, mut data: FrameData, _context: &PipelineContext) -> Result<FrameData> {
        let gray = preprocessing::to_grayscale(&data.image.to_rgb8());
        data.image = DynamicImage::ImageLuma8(gray);
        Ok(data)
    }

    fn name(&self) -> &str {
        "Grayscale Conversion"
    }
}

/// Halve the working image
pub struct PyrDownStep;

impl PipelineStep for PyrDownStep {
    fn process(&self, mut data: FrameData, _context: &PipelineContext) -> Result<FrameData> {
        let gray = data.image.to_luma8();
        data.image = DynamicImage::ImageLuma8(preprocessing::pyr_down(&gray));
        Ok(data)
    }

    fn name(&self) -> &str {
        "Pyramid Down"
    }
}

/// Median blur to reduce noise
pub struct MedianBlurStep {
    pub ksize: u32,
}

impl PipelineStep for MedianBlurStep {
    fn process(&self, mut data: FrameData, _context: &PipelineContext) -> Result<FrameData> {
        let gray = data.image.to_luma8();
        data.image = DynamicImage::ImageLuma8(preprocessing::median_blur(&gray, self.ksize));
        Ok(data)
    }

    fn name(&self) -> &str {
        "Median Blur"
    }
}

/// Detect circles with the tuned Hough parameters and map them to frame coordinates
pub struct HoughCircleStep;

impl PipelineStep for HoughCircleStep {
    fn process(&self, mut data: FrameData, context: &PipelineContext) -> Result<FrameData> {
        let gray = data.image.to_luma8();
        let detections = hough::detect_circles(&gray, &context.tuning.hough);

        let detected = detections.len() as i32;
        data.scale = preprocessing::scale_ratio(data.original.width(), gray.width());
        data.circles = detections.iter().map(|c| c.to_frame(data.scale)).collect();
        data.detections = detections;
        Ok(data.with_metadata("detected", MetadataValue::Int(detected)))
    }

    fn name(&self) -> &str {
        "Hough Circles"
    }
}

/// Replace per-frame circles with the ones stable over the last frames
pub struct StabilizeStep {
    // Shared across frames, so interior mutability behind &self
    buffer: Mutex<CircleBuffer>,
}

impl StabilizeStep {
    pub fn new(window: usize) -> Self {
        Self {
            buffer: Mutex::new(CircleBuffer::new(window)),
        }
    }

    pub fn with_buffer(buffer: CircleBuffer) -> Self {
        Self {
            buffer: Mutex::new(buffer),
        }
    }
}

impl Default for StabilizeStep {
    fn default() -> Self {
        Self::new(CircleBuffer::DEFAULT_WINDOW)
    }
}

impl PipelineStep for StabilizeStep {
    fn process(&self, mut data: FrameData, _context: &PipelineContext) -> Result<FrameData> {
        let mut buffer = self
            .buffer
            .lock()
            .map_err(|_| anyhow::anyhow!("Circle buffer lock poisoned"))?;

        buffer.push(std::mem::take(&mut data.circles));
        data.circles = buffer.stable_circles();
        Ok(data
            .with_metadata("buffered_frames", MetadataValue::Int(buffer.len() as i32))
            .with_metadata("stable", MetadataValue::Bool(buffer.is_full())))
    }

    fn name(&self) -> &str {
        "Stabilize"
    }
}

/// Build the two-color mask from the frame
pub struct ColorMaskStep {
    pub threshold: u8,
}

impl PipelineStep for ColorMaskStep {
    fn process(&self, mut data: FrameData, _context: &PipelineContext) -> Result<FrameData> {
        data.color_mask = Some(preprocessing::channel_threshold_mask(
            &data.original,
            self.threshold,
        ));
        Ok(data)
    }

    fn name(&self) -> &str {
        "Color Mask"
    }
}

/// One mean color per circle
pub struct MeanColorStep;

impl PipelineStep for MeanColorStep {
    fn process(&self, mut data: FrameData, _context: &PipelineContext) -> Result<FrameData> {
        let colored = data
            .circles
            .iter()
            .map(|circle| ColoredCircle {
                circle: *circle,
                colors: vec![colors::mean_color(&data.original, circle, None)],
            })
            .collect();
        data.colored = Some(colored);
        Ok(data)
    }

    fn name(&self) -> &str {
        "Mean Color"
    }
}

/// Two colors per circle split by the color mask
pub struct MaskColorStep;

impl PipelineStep for MaskColorStep {
    fn process(&self, mut data: FrameData, _context: &PipelineContext) -> Result<FrameData> {
        let mask = data
            .color_mask
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Missing color mask"))?;

        let colored = data
            .circles
            .iter()
            .map(|circle| ColoredCircle {
                circle: *circle,
                colors: colors::two_colors_by_mask(&data.original, mask, circle).to_vec(),
            })
            .collect();
        data.colored = Some(colored);
        Ok(data)
    }

    fn name(&self) -> &str {
        "Mask Colors"
    }
}

/// Two colors per circle from k-means clustering
pub struct KMeansColorStep;

impl PipelineStep for KMeansColorStep {
    fn process(&self, mut data: FrameData, _context: &PipelineContext) -> Result<FrameData> {
        let colored = data
            .circles
            .iter()
            .map(|circle| ColoredCircle {
                circle: *circle,
                colors: colors::two_colors_by_kmeans(&data.original, circle).to_vec(),
            })
            .collect();
        data.colored = Some(colored);
        Ok(data)
    }

    fn name(&self) -> &str {
        "KMeans Colors"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Circle, Color};
    use image::{Rgb, RgbImage};

    fn context() -> PipelineContext {
        PipelineContext::default()
    }

    #[test]
    fn test_crop_replaces_original() {
        let data = FrameData::from_frame(RgbImage::new(200, 100));
        let data = CropStep { border: 10 }.process(data, &context()).unwrap();
        assert_eq!(data.original.dimensions(), (180, 80));
        assert_eq!(data.image.width(), 180);
    }

    #[test]
    fn test_mask_color_requires_mask() {
        let data = FrameData::from_frame(RgbImage::new(10, 10));
        assert!(MaskColorStep.process(data, &context()).is_err());
    }

    #[test]
    fn test_mean_color_step_colors_every_circle() {
        let mut data = FrameData::from_frame(RgbImage::from_pixel(30, 30, Rgb([9, 8, 7])));
        data.circles = vec![Circle::new(10, 10, 4), Circle::new(20, 20, 4)];
        let data = MeanColorStep.process(data, &context()).unwrap();
        let colored = data.colored.unwrap();
        assert_eq!(colored.len(), 2);
        assert_eq!(colored[1].colors, vec![Color::new(9, 8, 7)]);
    }

    #[test]
    fn test_stabilize_step_waits_for_window() {
        let step = StabilizeStep::new(2);
        let mut first = FrameData::from_frame(RgbImage::new(10, 10));
        first.circles = vec![Circle::new(5, 5, 2)];
        let first = step.process(first, &context()).unwrap();
        assert!(first.circles.is_empty());
        assert_eq!(first.get_bool("stable"), Some(false));

        let mut second = FrameData::from_frame(RgbImage::new(10, 10));
        second.circles = vec![Circle::new(5, 5, 2)];
        let second = step.process(second, &context()).unwrap();
        assert_eq!(second.circles, vec![Circle::new(5, 5, 2)]);
        assert_eq!(second.get_int("buffered_frames"), Some(2));
    }
}
