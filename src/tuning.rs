use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::detection::hough::HoughParams;
use crate::detection::preprocessing::HsvRange;

/// Parameters that can change while frames are being processed
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub hsv: HsvRange,
    pub hough: HoughParams,
}

impl Tuning {
    pub fn pool_ball() -> Self {
        Self {
            hsv: HsvRange::default(),
            hough: HoughParams::pool_ball(),
        }
    }

    /// Load a JSON preset, falling back to `base` for missing fields
    pub fn load(path: &Path, base: Tuning) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tuning file {}", path.display()))?;
        let mut value = serde_json::to_value(base)?;
        let overrides: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("Invalid tuning file {}", path.display()))?;
        merge(&mut value, overrides);
        Ok(serde_json::from_value(value)?)
    }

    /// Current slider position for `key`
    pub fn get(&self, key: SliderKey) -> u32 {
        use SliderKey::*;
        match key {
            LowH => self.hsv.low_h as u32,
            HighH => self.hsv.high_h as u32,
            LowS => self.hsv.low_s as u32,
            HighS => self.hsv.high_s as u32,
            LowV => self.hsv.low_v as u32,
            HighV => self.hsv.high_v as u32,
            Dp => (self.hough.dp * 10.0).round().max(0.0) as u32,
            MinDist => self.hough.min_dist.round().max(0.0) as u32,
            HighThresh => self.hough.canny_high.round().max(0.0) as u32,
            AccThresh => self.hough.acc_threshold,
            MinRadius => self.hough.min_radius,
            MaxRadius => self.hough.max_radius,
        }
    }

    /// Move a slider, clamping to its range
    pub fn set(&mut self, key: SliderKey, value: u32) {
        use SliderKey::*;
        let value = value.min(key.max());
        let byte = value as u8;
        match key {
            LowH => self.hsv.low_h = byte,
            HighH => self.hsv.high_h = byte,
            LowS => self.hsv.low_s = byte,
            HighS => self.hsv.high_s = byte,
            LowV => self.hsv.low_v = byte,
            HighV => self.hsv.high_v = byte,
            Dp => self.hough.dp = value as f32 / 10.0,
            MinDist => self.hough.min_dist = value as f32,
            HighThresh => self.hough.canny_high = value as f32,
            AccThresh => self.hough.acc_threshold = value,
            MinRadius => self.hough.min_radius = value,
            MaxRadius => self.hough.max_radius = value,
        }
    }

    pub fn set_by_name(&mut self, name: &str, value: u32) -> Result<()> {
        let key: SliderKey = name.parse()?;
        self.set(key, value);
        Ok(())
    }
}

fn merge(base: &mut serde_json::Value, overrides: serde_json::Value) {
    match (base, overrides) {
        (serde_json::Value::Object(base), serde_json::Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Runtime sliders of the pool-ball panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SliderKey {
    LowH,
    HighH,
    LowS,
    HighS,
    LowV,
    HighV,
    Dp,
    MinDist,
    HighThresh,
    AccThresh,
    MinRadius,
    MaxRadius,
}

impl SliderKey {
    pub const ALL: [SliderKey; 12] = [
        SliderKey::LowH,
        SliderKey::HighH,
        SliderKey::LowS,
        SliderKey::HighS,
        SliderKey::LowV,
        SliderKey::HighV,
        SliderKey::Dp,
        SliderKey::MinDist,
        SliderKey::HighThresh,
        SliderKey::AccThresh,
        SliderKey::MinRadius,
        SliderKey::MaxRadius,
    ];

    pub fn name(self) -> &'static str {
        use SliderKey::*;
        match self {
            LowH => "lowH",
            HighH => "highH",
            LowS => "lowS",
            HighS => "highS",
            LowV => "lowV",
            HighV => "highV",
            Dp => "dp",
            MinDist => "minDist",
            HighThresh => "highThresh",
            AccThresh => "accThresh",
            MinRadius => "minRadius",
            MaxRadius => "maxRadius",
        }
    }

    pub fn max(self) -> u32 {
        use SliderKey::*;
        match self {
            LowH | HighH => 180,
            LowS | HighS | LowV | HighV => 255,
            Dp => 30,
            MinDist => 150,
            HighThresh | AccThresh => 255,
            MinRadius | MaxRadius => 100,
        }
    }
}

impl fmt::Display for SliderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SliderKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        SliderKey::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown slider: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_pool_ball_slider_positions() {
        let tuning = Tuning::pool_ball();
        let positions: Vec<u32> = SliderKey::ALL.iter().map(|k| tuning.get(*k)).collect();
        assert_eq!(positions, vec![0, 180, 0, 70, 45, 160, 10, 25, 140, 14, 12, 16]);
    }

    #[test]
    fn test_set_clamps_to_slider_max() {
        let mut tuning = Tuning::pool_ball();
        tuning.set(SliderKey::HighH, 250);
        assert_eq!(tuning.hsv.high_h, 180);
        tuning.set(SliderKey::Dp, 15);
        assert_eq!(tuning.hough.dp, 1.5);
        tuning.set(SliderKey::MaxRadius, 500);
        assert_eq!(tuning.hough.max_radius, 100);
    }

    #[test]
    fn test_set_by_name_rejects_unknown() {
        let mut tuning = Tuning::default();
        tuning.set_by_name("accThresh", 30).unwrap();
        assert_eq!(tuning.hough.acc_threshold, 30);
        assert!(tuning.set_by_name("gamma", 1).is_err());
    }

    #[test]
    fn test_load_merges_partial_preset() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "hough": {{ "min_radius": 9 }}, "hsv": {{ "high_s": 90 }} }}"#).unwrap();

        let tuning = Tuning::load(file.path(), Tuning::pool_ball()).unwrap();
        assert_eq!(tuning.hough.min_radius, 9);
        assert_eq!(tuning.hough.max_radius, 16);
        assert_eq!(tuning.hsv.high_s, 90);
        assert_eq!(tuning.hsv.low_v, 45);
    }

    #[test]
    fn test_load_missing_file_is_error() {
        assert!(Tuning::load(Path::new("/nonexistent/tuning.json"), Tuning::default()).is_err());
    }
}
