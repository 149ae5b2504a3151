use crate::audio::oscillators::{sine, PhaseGenerator};
use crate::audio::{to_pcm, TWO_PI};

const AMPLITUDE: f32 = 0.12;
const CARRIER_FREQUENCY: f32 = 150.0;
const SECOND_HARMONIC: f32 = 0.05;

pub const ALPHA_BEAT: f32 = 10.0;
pub const BETA_BEAT: f32 = 14.0;

/// Stereo sine pair whose right channel sits `beat` Hz above the left.
pub struct BinauralGenerator {
    left: PhaseGenerator,
    right: PhaseGenerator,
}

impl BinauralGenerator {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            left: PhaseGenerator::new(CARRIER_FREQUENCY, sample_rate),
            right: PhaseGenerator::new(CARRIER_FREQUENCY + ALPHA_BEAT, sample_rate),
        }
    }

    /// `2 * frames` interleaved samples of a 10 Hz beat.
    pub fn generate_alpha(&mut self, frames: usize) -> Vec<i16> {
        let mut buffer = vec![0; frames * 2];
        self.generate_into(ALPHA_BEAT, &mut buffer);
        buffer
    }

    /// `2 * frames` interleaved samples of a 14 Hz beat.
    pub fn generate_beta(&mut self, frames: usize) -> Vec<i16> {
        let mut buffer = vec![0; frames * 2];
        self.generate_into(BETA_BEAT, &mut buffer);
        buffer
    }

    /// Fill an interleaved L/R buffer. A trailing odd sample is left silent.
    pub fn generate_into(&mut self, beat: f32, buffer: &mut [i16]) {
        self.right.set_frequency(self.left.frequency() + beat);

        let mut frames = buffer.chunks_exact_mut(2);
        for frame in &mut frames {
            let (left, right) = self.next_frame();
            frame[0] = to_pcm(left);
            frame[1] = to_pcm(right);
        }
        for sample in frames.into_remainder() {
            *sample = 0;
        }
    }

    fn next_frame(&mut self) -> (f32, f32) {
        let left_phase = self.left.next_sample();
        let right_phase = self.right.next_sample();
        (warm_tone(left_phase) * AMPLITUDE, warm_tone(right_phase) * AMPLITUDE)
    }

    /// Current (left, right) phases in radians, each in [0, 2π).
    pub fn phases(&self) -> (f32, f32) {
        (self.left.phase() * TWO_PI, self.right.phase() * TWO_PI)
    }

    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}

// Pure sine with a faint second harmonic
fn warm_tone(phase: f32) -> f32 {
    sine(phase) * (1.0 - SECOND_HARMONIC) + sine(phase * 2.0) * SECOND_HARMONIC
}
