mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from circlecam for tests
pub use circlecam::{
    Circle, Color, FrameData, NullSink, Player, PlayerStats, StillImage, SyntheticScene, Tuning,
    Variant,
};
