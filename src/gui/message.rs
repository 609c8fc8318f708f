use crate::tuning::SliderKey;

#[derive(Debug, Clone)]
pub enum Message {
    /// Time to grab and show the next frame
    Tick,
    SliderChanged(SliderKey, u32),
    ResetTuning,
}
