pub mod colors;
pub mod hough;
pub mod kmeans;
pub mod preprocessing;
pub mod stabilize;
pub mod steps;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::pipeline::Pipeline;
use crate::render::DrawStyle;
use crate::tuning::Tuning;
use steps::*;

/// Border cut off pool-table frames before detection
pub const POOL_CROP_BORDER: u32 = 70;

/// The circle demos, from bare detection to stabilized pool balls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Red outline around every detected circle
    Plain,
    /// Outline in the circle's mean color
    Color,
    /// Two half arcs, colors split by a brightness mask
    TwoColorMask,
    /// Two half arcs, colors from k-means
    TwoColorKMeans,
    /// Stabilized pool balls on a masked table with tunable parameters
    PoolBall,
}

impl Variant {
    pub const ALL: [Variant; 5] = [
        Variant::Plain,
        Variant::Color,
        Variant::TwoColorMask,
        Variant::TwoColorKMeans,
        Variant::PoolBall,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Variant::Plain => "plain",
            Variant::Color => "color",
            Variant::TwoColorMask => "two-color-mask",
            Variant::TwoColorKMeans => "two-color-kmeans",
            Variant::PoolBall => "pool-ball",
        }
    }

    /// Window title shown by viewers
    pub fn title(self) -> &'static str {
        match self {
            Variant::PoolBall => "Pool ball detection",
            _ => "Circle detection",
        }
    }

    pub fn default_tuning(self) -> Tuning {
        match self {
            Variant::PoolBall => Tuning::pool_ball(),
            _ => Tuning::default(),
        }
    }

    /// Whether the variant exposes runtime sliders
    pub fn is_tunable(self) -> bool {
        self == Variant::PoolBall
    }

    pub fn draw_style(self) -> DrawStyle {
        match self {
            Variant::Plain => DrawStyle::Plain,
            Variant::Color => DrawStyle::MeanColor,
            Variant::TwoColorMask | Variant::TwoColorKMeans => DrawStyle::SplitArcs { radius_offset: 0 },
            Variant::PoolBall => DrawStyle::SplitArcs { radius_offset: 8 },
        }
    }

    /// Threshold of the two-color brightness mask
    fn color_mask_threshold(self) -> u8 {
        match self {
            Variant::PoolBall => 160,
            _ => 120,
        }
    }

    /// Assemble the processing steps of this variant
    pub fn build_pipeline(self, tuning: Tuning) -> Pipeline {
        let pipeline = Pipeline::new().with_tuning(tuning);

        let pipeline = match self {
            Variant::PoolBall => pipeline
                .add_step(Arc::new(CropStep { border: POOL_CROP_BORDER }))
                .add_step(Arc::new(HsvMaskStep))
                .add_step(Arc::new(GrayscaleStep))
                .add_step(Arc::new(MedianBlurStep { ksize: 5 }))
                .add_step(Arc::new(HoughCircleStep))
                .add_step(Arc::new(StabilizeStep::default())),
            _ => pipeline
                .add_step(Arc::new(GrayscaleStep))
                .add_step(Arc::new(PyrDownStep))
                .add_step(Arc::new(MedianBlurStep { ksize: 5 }))
                .add_step(Arc::new(HoughCircleStep)),
        };

        match self {
            Variant::Plain => pipeline,
            Variant::Color => pipeline.add_step(Arc::new(MeanColorStep)),
            Variant::TwoColorMask | Variant::PoolBall => pipeline
                .add_step(Arc::new(ColorMaskStep {
                    threshold: self.color_mask_threshold(),
                }))
                .add_step(Arc::new(MaskColorStep)),
            Variant::TwoColorKMeans => pipeline.add_step(Arc::new(KMeansColorStep)),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Variant::ALL
            .into_iter()
            .find(|v| v.name() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown variant: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_ball_step_order() {
        let pipeline = Variant::PoolBall.build_pipeline(Variant::PoolBall.default_tuning());
        assert_eq!(
            pipeline.step_names(),
            vec![
                "Crop",
                "HSV Mask",
                "Grayscale Conversion",
                "Median Blur",
                "Hough Circles",
                "Stabilize",
                "Color Mask",
                "Mask Colors"
            ]
        );
    }

    #[test]
    fn test_plain_has_no_color_step() {
        let pipeline = Variant::Plain.build_pipeline(Tuning::default());
        assert_eq!(pipeline.step_names().last(), Some(&"Hough Circles"));
    }

    #[test]
    fn test_variant_names_round_trip() {
        for variant in Variant::ALL {
            assert_eq!(variant.name().parse::<Variant>().unwrap(), variant);
        }
        assert!("face".parse::<Variant>().is_err());
    }
}
