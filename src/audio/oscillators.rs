use crate::audio::{AudioGenerator, TWO_PI};
use once_cell::sync::Lazy;

const SINE_TABLE_SIZE: usize = 4096;

// One extra guard point so interpolation never wraps the index.
static SINE_TABLE: Lazy<Vec<f32>> = Lazy::new(|| {
    (0..=SINE_TABLE_SIZE)
        .map(|i| (i as f32 * TWO_PI / SINE_TABLE_SIZE as f32).sin())
        .collect()
});

/// Table sine of a phase expressed in cycles. Any real phase is accepted.
#[inline]
pub fn sine(phase: f32) -> f32 {
    let phase = phase - phase.floor();
    let position = phase * SINE_TABLE_SIZE as f32;
    let index = (position as usize).min(SINE_TABLE_SIZE - 1);
    let frac = position - index as f32;
    let a = SINE_TABLE[index];
    let b = SINE_TABLE[index + 1];
    a + (b - a) * frac
}

pub struct PhaseGenerator {
    phase: f32,
    phase_increment: f32,
    frequency: f32,
    sample_rate: f32,
}

impl PhaseGenerator {
    pub fn new(frequency: f32, sample_rate: f32) -> Self {
        Self {
            phase: 0.0,
            frequency,
            sample_rate,
            phase_increment: frequency / sample_rate,
        }
    }

    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
        self.phase_increment = frequency / self.sample_rate;
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Current phase in cycles, always in [0, 1).
    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    pub fn next_sample(&mut self) -> f32 {
        let sample = self.phase;
        self.phase += self.phase_increment;

        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }

        sample
    }
}

pub struct SineOscillator {
    phase_gen: PhaseGenerator,
}

impl SineOscillator {
    pub fn new(frequency: f32, sample_rate: f32) -> Self {
        Self {
            phase_gen: PhaseGenerator::new(frequency, sample_rate),
        }
    }

    pub fn set_frequency(&mut self, frequency: f32) {
        self.phase_gen.set_frequency(frequency);
    }

    pub fn frequency(&self) -> f32 {
        self.phase_gen.frequency()
    }

    pub fn phase(&self) -> f32 {
        self.phase_gen.phase()
    }
}

impl AudioGenerator for SineOscillator {
    fn next_sample(&mut self) -> f32 {
        sine(self.phase_gen.next_sample())
    }

    fn reset(&mut self) {
        self.phase_gen.reset();
    }
}

/// Uniform random source shared by every noise-driven generator.
///
/// Unseeded by default. A seeded source replays the same sequence after
/// every `reset`.
pub struct NoiseGenerator {
    rng: fastrand::Rng,
    seed: Option<u64>,
}

impl NoiseGenerator {
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
            seed: None,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
            seed: Some(seed),
        }
    }

    /// Uniform value in [0, 1).
    pub fn unit(&mut self) -> f32 {
        self.rng.f32()
    }

    /// Uniform value in [lo, hi).
    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + self.rng.f32() * (hi - lo)
    }

    /// True with probability `p`.
    pub fn chance(&mut self, p: f32) -> bool {
        self.rng.f32() < p
    }

    /// Random row value for the Voss-McCartney pink generator, in [-32768, 32767].
    pub fn row_value(&mut self) -> i32 {
        self.rng.i32(..) >> 16
    }
}

impl Default for NoiseGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioGenerator for NoiseGenerator {
    fn next_sample(&mut self) -> f32 {
        self.rng.f32() * 2.0 - 1.0
    }

    fn reset(&mut self) {
        if let Some(seed) = self.seed {
            self.rng.seed(seed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sine_table_matches_std_sin() {
        let mut max_error = 0.0f32;
        for i in 0..1000 {
            let phase = i as f32 / 1000.0;
            let expected = (phase * TWO_PI).sin();
            max_error = max_error.max((sine(phase) - expected).abs());
        }
        println!("Sine table max error: {:.8}", max_error);
        assert!(max_error < 1e-4, "Interpolated table error too high: {}", max_error);

        // Phases outside [0, 1) wrap
        assert!((sine(1.25) - 1.0).abs() < 1e-4);
        assert!((sine(-0.25) + 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_phase_generator_stays_wrapped() {
        let mut phase_gen = PhaseGenerator::new(15000.0, 44100.0);
        for _ in 0..100_000 {
            let phase = phase_gen.next_sample();
            assert!((0.0..1.0).contains(&phase), "Phase {} escaped [0, 1)", phase);
        }
        phase_gen.reset();
        assert_eq!(phase_gen.phase(), 0.0);
    }

    #[test]
    fn test_sine_oscillator_period() {
        // 441 Hz at 44.1 kHz is exactly 100 samples per cycle
        let mut osc = SineOscillator::new(441.0, 44100.0);
        let first: Vec<f32> = (0..100).map(|_| osc.next_sample()).collect();
        let second: Vec<f32> = (0..100).map(|_| osc.next_sample()).collect();
        for (a, b) in first.iter().zip(second.iter()) {
            assert!((a - b).abs() < 1e-3, "Cycles diverged: {} vs {}", a, b);
        }
        osc.reset();
        assert_eq!(osc.next_sample(), 0.0);
    }

    #[test]
    fn test_noise_generator_range_and_seeding() {
        let mut noise = NoiseGenerator::new();
        for _ in 0..10_000 {
            let s = noise.next_sample();
            assert!((-1.0..1.0).contains(&s));
            let row = noise.row_value();
            assert!((-32768..=32767).contains(&row));
        }

        let mut a = NoiseGenerator::with_seed(7);
        let mut b = NoiseGenerator::with_seed(7);
        let run_a: Vec<f32> = (0..64).map(|_| a.next_sample()).collect();
        let run_b: Vec<f32> = (0..64).map(|_| b.next_sample()).collect();
        assert_eq!(run_a, run_b);

        a.reset();
        let replay: Vec<f32> = (0..64).map(|_| a.next_sample()).collect();
        assert_eq!(run_a, replay, "Seeded reset should replay the sequence");
    }
}
