use crate::audio::SAMPLE_RATE;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What `stop()` does with the audio still playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopPolicy {
    /// Ramp to silence over `fade_out_secs`, then release the device.
    FadeOut,
    /// Release the device at once.
    Immediate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sample_rate: u32,
    /// Floor applied to the device's reported minimum buffer, in frames.
    pub min_buffer_frames: usize,
    pub fade_in_secs: f32,
    pub fade_out_secs: f32,
    pub transition_secs: f32,
    /// Volume a sound change ramps up from.
    pub transition_start_volume: f32,
    pub stop_policy: StopPolicy,
    /// Pass white noise through the two-stage smoothing cascade.
    pub smooth_white: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            min_buffer_frames: 4096,
            fade_in_secs: 3.0,
            fade_out_secs: 1.0,
            transition_secs: 0.5,
            transition_start_volume: 0.3,
            stop_policy: StopPolicy::FadeOut,
            smooth_white: false,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::Invalid("sample_rate must be positive".into()));
        }
        if self.min_buffer_frames == 0 {
            return Err(ConfigError::Invalid("min_buffer_frames must be positive".into()));
        }
        for (name, value) in [
            ("fade_in_secs", self.fade_in_secs),
            ("fade_out_secs", self.fade_out_secs),
            ("transition_secs", self.transition_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!("{} must be a non-negative number", name)));
            }
        }
        if !(0.0..=1.0).contains(&self.transition_start_volume) {
            return Err(ConfigError::Invalid(
                "transition_start_volume must be within [0, 1]".into(),
            ));
        }
        Ok(())
    }

    /// Fade-out length actually applied by `stop()`.
    pub fn effective_fade_out_secs(&self) -> f32 {
        match self.stop_policy {
            StopPolicy::FadeOut => self.fade_out_secs,
            StopPolicy::Immediate => 0.0,
        }
    }
}
