pub mod detection;
pub mod models;
pub mod pipeline;
pub mod player;
pub mod render;
pub mod sink;
pub mod source;
pub mod tuning;

pub use detection::Variant;
pub use models::{Circle, Color, ColoredCircle, HoughCircle};
pub use pipeline::{DebugConfig, FrameData, MetadataValue, Pipeline, PipelineContext, PipelineStep};
pub use player::{Player, PlayerStats, RenderedFrame};
pub use sink::{DirectorySink, FrameSink, NullSink};
pub use source::{FrameSource, ImageSequence, SourceSpec, StillImage, SyntheticScene};
pub use tuning::{SliderKey, Tuning};

#[cfg(feature = "gui")]
pub mod gui;
