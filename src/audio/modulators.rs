// Modulators module - slow sine LFOs built on the phase generator
use crate::audio::oscillators::{sine, PhaseGenerator};

/// Very slow sine modulator producing `offset + depth * sin(phase)`.
pub struct Lfo {
    phase_gen: PhaseGenerator,
    depth: f32,
    offset: f32,
}

impl Lfo {
    pub fn new(rate_hz: f32, depth: f32, offset: f32, sample_rate: f32) -> Self {
        Self {
            phase_gen: PhaseGenerator::new(rate_hz, sample_rate),
            depth,
            offset,
        }
    }

    /// LFO with a period given in seconds rather than a rate.
    pub fn with_period(period_secs: f32, depth: f32, offset: f32, sample_rate: f32) -> Self {
        Self::new(1.0 / period_secs.max(1e-3), depth, offset, sample_rate)
    }

    pub fn rate(&self) -> f32 {
        self.phase_gen.frequency()
    }

    /// Raw phase in cycles, for callers that shape their own curve.
    pub fn phase(&self) -> f32 {
        self.phase_gen.phase()
    }

    pub fn next_sample(&mut self) -> f32 {
        let phase = self.phase_gen.next_sample();
        self.offset + self.depth * sine(phase)
    }

    pub fn reset(&mut self) {
        self.phase_gen.reset();
    }
}
