pub mod catalog;
pub mod envelopes;
pub mod filters;
pub mod generators;
pub mod modulators;
pub mod noise;
pub mod oscillators;
pub mod server;

pub const PI: f32 = std::f32::consts::PI;
pub const TWO_PI: f32 = 2.0 * PI;

/// Output rate every generator is tuned for.
pub const SAMPLE_RATE: u32 = 44100;

pub const MAX_16BIT: f32 = 32767.0;

// Basic trait for audio generators that produce a single sample output
pub trait AudioGenerator {
    fn next_sample(&mut self) -> f32;

    /// Return to the canonical initial state without reallocating.
    fn reset(&mut self);
}

/// Convert a normalized sample to 16-bit PCM, hard clamped to the i16 range.
#[inline]
pub fn to_pcm(sample: f32) -> i16 {
    if !sample.is_finite() {
        return 0;
    }
    (sample * MAX_16BIT).clamp(-32768.0, 32767.0) as i16
}

pub fn sec_to_samples(seconds: f32, sample_rate: u32) -> u32 {
    (seconds.max(0.0) * sample_rate as f32) as u32
}
