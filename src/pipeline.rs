use anyhow::Result;
use image::{DynamicImage, GrayImage, RgbImage};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::models::{Circle, ColoredCircle, HoughCircle};
use crate::tuning::Tuning;

/// Data that flows through the pipeline for a single frame
#[derive(Clone)]
pub struct FrameData {
    /// The working image (color, masked or grayscale depending on the step)
    pub image: DynamicImage,

    /// The frame circles are reported against and drawn onto
    pub original: Arc<RgbImage>,

    /// Integer ratio from working-image to frame coordinates
    pub scale: u32,

    /// Raw detector output in working-image coordinates
    pub detections: Vec<HoughCircle>,

    /// Circles in frame coordinates (stabilized when the pipeline does that)
    pub circles: Vec<Circle>,

    /// Circles with sampled colors, `None` until a color step ran
    pub colored: Option<Vec<ColoredCircle>>,

    /// Two-color mask over the frame
    pub color_mask: Option<GrayImage>,

    /// Inverted HSV range mask (white where objects may be)
    pub hsv_mask: Option<GrayImage>,

    /// Frame with the HSV background blacked out
    pub masked_frame: Option<RgbImage>,

    /// Metadata for tracking properties (e.g., "detected", "buffered_frames")
    pub metadata: HashMap<String, MetadataValue>,
}

/// Metadata value types
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Bool(bool),
    Int(i32),
}

impl FrameData {
    /// Create FrameData for a freshly grabbed frame
    pub fn from_frame(frame: RgbImage) -> Self {
        let original = Arc::new(frame);
        Self {
            image: DynamicImage::ImageRgb8((*original).clone()),
            original,
            scale: 1,
            detections: Vec::new(),
            circles: Vec::new(),
            colored: None,
            color_mask: None,
            hsv_mask: None,
            masked_frame: None,
            metadata: HashMap::new(),
        }
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: MetadataValue) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Get metadata as bool
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.metadata.get(key) {
            Some(MetadataValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    /// Get metadata as int
    pub fn get_int(&self, key: &str) -> Option<i32> {
        match self.metadata.get(key) {
            Some(MetadataValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// Circles ready for drawing, colored when a color step ran
    pub fn annotated(&self) -> Vec<ColoredCircle> {
        match &self.colored {
            Some(colored) => colored.clone(),
            None => self.circles.iter().copied().map(ColoredCircle::new).collect(),
        }
    }
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

/// Context available to all pipeline steps
#[derive(Clone, Default)]
pub struct PipelineContext {
    pub debug: Option<DebugConfig>,
    /// Runtime-tunable parameters read by the steps on every frame
    pub tuning: Tuning,
    /// Index of the frame being processed, starting at 1
    pub frame_index: usize,
}

impl PipelineContext {
    fn frame_debug_dir(&self) -> Option<PathBuf> {
        self.debug
            .as_ref()
            .map(|d| d.output_dir.join(format!("frame_{:04}", self.frame_index)))
    }
}

/// Trait that all pipeline steps must implement
pub trait PipelineStep: Send + Sync {
    /// Transform one frame's data
    fn process(&self, data: FrameData, context: &PipelineContext) -> Result<FrameData>;

    /// Human-readable name for this step (used in logs and debug output)
    fn name(&self) -> &str;
}

/// Composable pipeline builder
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    context: PipelineContext,
}

impl Pipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            context: PipelineContext::default(),
        }
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        // Check if directory exists and is empty
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            // Create directory if it doesn't exist
            std::fs::create_dir_all(&output_dir)?;
        }

        self.context.debug = Some(DebugConfig { output_dir });

        Ok(self)
    }

    pub fn with_tuning(mut self, tuning: Tuning) -> Self {
        self.context.tuning = tuning;
        self
    }

    /// Replace the tuning used from the next frame on
    pub fn set_tuning(&mut self, tuning: Tuning) {
        self.context.tuning = tuning;
    }

    pub fn tuning(&self) -> &Tuning {
        &self.context.tuning
    }

    /// Add a processing step to the pipeline
    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step on one frame
    pub fn run(&mut self, frame: RgbImage) -> Result<FrameData> {
        self.run_partial(frame, self.steps.len())
    }

    /// Run only the first `num_steps` steps (useful for debugging)
    pub fn run_partial(&mut self, frame: RgbImage, num_steps: usize) -> Result<FrameData> {
        self.context.frame_index += 1;
        let debug_dir = self.context.frame_debug_dir();

        // Save initial input in debug mode
        if let Some(dir) = &debug_dir {
            std::fs::create_dir_all(dir)?;
            frame
                .save(dir.join("00_input.png"))
                .map_err(|e| anyhow::anyhow!("Failed to save debug input: {}", e))?;
        }

        let mut data = FrameData::from_frame(frame);

        for (step_idx, step) in self.steps.iter().take(num_steps).enumerate() {
            tracing::trace!(frame = self.context.frame_index, step = step.name(), "running step");
            data = step.process(data, &self.context)?;

            if let Some(dir) = &debug_dir {
                let filename = format!(
                    "{:02}_{}.png",
                    step_idx + 1,
                    step.name().to_lowercase().replace(' ', "_")
                );
                data.image
                    .save(dir.join(&filename))
                    .map_err(|e| anyhow::anyhow!("Failed to save debug image: {}", e))?;
                tracing::trace!("Debug: saved {}", filename);
            }
        }

        tracing::debug!(
            frame = self.context.frame_index,
            detections = data.detections.len(),
            circles = data.circles.len(),
            "frame processed"
        );

        Ok(data)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
