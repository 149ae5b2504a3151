//! Classic colored-noise primitives.
//!
//! Each primitive produces one normalized sample per call, carrying its own
//! filter state between calls. Output is amplitude-scaled but not yet
//! converted to PCM; use [`to_pcm`](crate::audio::to_pcm) or `fill`.

use crate::audio::filters::SmoothingCascade;
use crate::audio::oscillators::NoiseGenerator;
use crate::audio::{to_pcm, AudioGenerator};

/// Output level shared by the classic noise colors.
pub const NOISE_AMPLITUDE: f32 = 0.3;

const WHITE_SMOOTHING: [f32; 2] = [0.6, 0.7];
// Makeup gain for the energy the smoothing stages remove.
const WHITE_SMOOTHING_GAIN: f32 = 3.5;

const BROWN_INTEGRATION: f32 = 0.02;
const BROWN_GAIN: f32 = 3.5;

pub const PINK_ROWS: usize = 16;
const PINK_COUNTER_WRAP: u32 = 1 << PINK_ROWS;
const PINK_RANGE: f32 = 65536.0;
const PINK_GAIN: f32 = 0.5;

pub struct WhiteNoise {
    source: NoiseGenerator,
    smoothing: Option<SmoothingCascade<2>>,
}

impl WhiteNoise {
    pub fn new(source: NoiseGenerator) -> Self {
        Self {
            source,
            smoothing: None,
        }
    }

    /// White noise rounded off by a two-stage lowpass cascade.
    pub fn smoothed(source: NoiseGenerator) -> Self {
        Self {
            source,
            smoothing: Some(SmoothingCascade::new(WHITE_SMOOTHING)),
        }
    }

    pub fn is_smoothed(&self) -> bool {
        self.smoothing.is_some()
    }
}

impl AudioGenerator for WhiteNoise {
    fn next_sample(&mut self) -> f32 {
        let raw = self.source.next_sample();
        let shaped = match self.smoothing.as_mut() {
            Some(cascade) => cascade.process(raw) * WHITE_SMOOTHING_GAIN,
            None => raw,
        };
        (shaped * NOISE_AMPLITUDE).clamp(-1.0, 1.0)
    }

    fn reset(&mut self) {
        self.source.reset();
        if let Some(cascade) = self.smoothing.as_mut() {
            cascade.reset();
        }
    }
}

/// Leaky-integrated random walk.
pub struct BrownNoise {
    source: NoiseGenerator,
    integration: f32,
    state: f32,
}

impl BrownNoise {
    pub fn new(source: NoiseGenerator) -> Self {
        Self::with_integration(source, BROWN_INTEGRATION)
    }

    pub fn with_integration(source: NoiseGenerator, integration: f32) -> Self {
        Self {
            source,
            integration,
            state: 0.0,
        }
    }

    /// Unscaled integrator output, for generators building their own beds.
    pub fn next_raw(&mut self) -> f32 {
        let white = self.source.next_sample();
        self.state = (self.state + self.integration * white) / (1.0 + self.integration);
        self.state
    }

    pub fn state(&self) -> f32 {
        self.state
    }
}

impl AudioGenerator for BrownNoise {
    fn next_sample(&mut self) -> f32 {
        (self.next_raw() * BROWN_GAIN * NOISE_AMPLITUDE).clamp(-1.0, 1.0)
    }

    fn reset(&mut self) {
        self.source.reset();
        self.state = 0.0;
    }
}

/// Voss-McCartney pink noise over sixteen rows.
pub struct PinkNoise {
    source: NoiseGenerator,
    rows: [i32; PINK_ROWS],
    running_sum: i32,
    counter: u32,
}

impl PinkNoise {
    pub fn new(source: NoiseGenerator) -> Self {
        Self {
            source,
            rows: [0; PINK_ROWS],
            running_sum: 0,
            counter: 0,
        }
    }

    /// Unscaled pink value, roughly in [-8.5, 8.5].
    pub fn next_raw(&mut self) -> f32 {
        let last = self.counter;
        self.counter = (self.counter + 1) % PINK_COUNTER_WRAP;

        // Rows whose counter bit changed get a fresh value
        let mut diff = last ^ self.counter;
        let mut row = 0;
        while diff > 0 && row < PINK_ROWS {
            if diff & 1 == 1 {
                let value = self.source.row_value();
                self.running_sum += value - self.rows[row];
                self.rows[row] = value;
            }
            diff >>= 1;
            row += 1;
        }

        let white = self.source.row_value();
        (self.running_sum + white) as f32 / PINK_RANGE
    }

    pub fn rows(&self) -> &[i32; PINK_ROWS] {
        &self.rows
    }

    pub fn running_sum(&self) -> i32 {
        self.running_sum
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }
}

impl AudioGenerator for PinkNoise {
    fn next_sample(&mut self) -> f32 {
        (self.next_raw() * NOISE_AMPLITUDE * PINK_GAIN).clamp(-1.0, 1.0)
    }

    fn reset(&mut self) {
        self.source.reset();
        self.rows = [0; PINK_ROWS];
        self.running_sum = 0;
        self.counter = 0;
    }
}

/// Fill a mono PCM buffer from any generator.
pub fn fill<G: AudioGenerator + ?Sized>(generator: &mut G, buffer: &mut [i16]) {
    for sample in buffer.iter_mut() {
        *sample = to_pcm(generator.next_sample());
    }
}

/// The three classic colors, owned together by the facade.
pub struct ClassicNoise {
    pub white: WhiteNoise,
    pub brown: BrownNoise,
    pub pink: PinkNoise,
}

impl ClassicNoise {
    pub fn new(smooth_white: bool) -> Self {
        let white_source = NoiseGenerator::new();
        Self {
            white: if smooth_white {
                WhiteNoise::smoothed(white_source)
            } else {
                WhiteNoise::new(white_source)
            },
            brown: BrownNoise::new(NoiseGenerator::new()),
            pink: PinkNoise::new(NoiseGenerator::new()),
        }
    }

    pub fn with_seed(seed: u64, smooth_white: bool) -> Self {
        let white_source = NoiseGenerator::with_seed(seed);
        Self {
            white: if smooth_white {
                WhiteNoise::smoothed(white_source)
            } else {
                WhiteNoise::new(white_source)
            },
            brown: BrownNoise::new(NoiseGenerator::with_seed(seed.wrapping_add(1))),
            pink: PinkNoise::new(NoiseGenerator::with_seed(seed.wrapping_add(2))),
        }
    }

    pub fn reset(&mut self) {
        self.white.reset();
        self.brown.reset();
        self.pink.reset();
    }
}
