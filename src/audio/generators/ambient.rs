use crate::audio::filters::{soft_saturate, OnePoleFilter};
use crate::audio::modulators::Lfo;
use crate::audio::oscillators::{NoiseGenerator, SineOscillator};
use crate::audio::{to_pcm, AudioGenerator};

const AMPLITUDE: f32 = 0.25;

// Lo-fi drone
const DRONE_ROOT: f32 = 85.0;
// (frequency ratio, mix weight, wobble rate multiplier, wobble depth)
const DRONE_VOICES: [(f32, f32, f32, f32); 4] = [
    (1.0, 0.35, 1.0, 0.002),
    (1.5, 0.25, 1.3, 0.003),
    (2.0, 0.20, 0.7, 0.002),
    (0.5, 0.20, 0.0, 0.0),
];
const DRONE_WOBBLE_RATE: f32 = 0.05;
const DRONE_CEILING: f32 = 0.8;
const DRONE_SMOOTHING: f32 = 0.95;

// Deep hum
const HUM_FUNDAMENTAL: f32 = 45.0;
const HUM_PARTIALS: [(f32, f32); 3] = [(1.0, 0.6), (2.0, 0.25), (3.0, 0.15)];
const HUM_BREATH_PERIOD_SECS: f32 = 25.0;
const HUM_NOISE: f32 = 0.01;
const HUM_SMOOTHING: f32 = 0.9;

/// Lo-fi drone and deep hum beds.
pub struct AmbientGenerator {
    drone_voices: [SineOscillator; 4],
    // Per-voice detune factor around 1.0
    drone_wobbles: [Lfo; 4],
    drone_smoother: OnePoleFilter,

    hum_partials: [SineOscillator; 3],
    hum_breath: Lfo,
    hum_noise: NoiseGenerator,
    hum_smoother: OnePoleFilter,
}

impl AmbientGenerator {
    pub fn new(sample_rate: f32) -> Self {
        Self::with_noise(sample_rate, NoiseGenerator::new())
    }

    pub fn with_seed(sample_rate: f32, seed: u64) -> Self {
        Self::with_noise(sample_rate, NoiseGenerator::with_seed(seed))
    }

    fn with_noise(sample_rate: f32, hum_noise: NoiseGenerator) -> Self {
        Self {
            drone_voices: DRONE_VOICES
                .map(|(ratio, _, _, _)| SineOscillator::new(DRONE_ROOT * ratio, sample_rate)),
            drone_wobbles: DRONE_VOICES.map(|(_, _, wobble_rate, depth)| {
                Lfo::new(DRONE_WOBBLE_RATE * wobble_rate, depth, 1.0, sample_rate)
            }),
            drone_smoother: OnePoleFilter::new(DRONE_SMOOTHING),

            hum_partials: HUM_PARTIALS
                .map(|(ratio, _)| SineOscillator::new(HUM_FUNDAMENTAL * ratio, sample_rate)),
            // 80% to 100% amplitude
            hum_breath: Lfo::with_period(HUM_BREATH_PERIOD_SECS, 0.1, 0.9, sample_rate),
            hum_noise,
            hum_smoother: OnePoleFilter::new(HUM_SMOOTHING),
        }
    }

    pub fn generate_lofi_drone(&mut self, count: usize) -> Vec<i16> {
        let mut buffer = vec![0; count];
        self.lofi_drone_into(&mut buffer);
        buffer
    }

    pub fn generate_deep_hum(&mut self, count: usize) -> Vec<i16> {
        let mut buffer = vec![0; count];
        self.deep_hum_into(&mut buffer);
        buffer
    }

    pub fn lofi_drone_into(&mut self, buffer: &mut [i16]) {
        for sample in buffer.iter_mut() {
            let mut mix = 0.0;
            for ((voice, wobble), &(ratio, weight, _, _)) in self
                .drone_voices
                .iter_mut()
                .zip(self.drone_wobbles.iter_mut())
                .zip(DRONE_VOICES.iter())
            {
                voice.set_frequency(DRONE_ROOT * ratio * wobble.next_sample());
                mix += voice.next_sample() * weight;
            }

            let warm = self.drone_smoother.process(soft_saturate(mix, DRONE_CEILING));
            *sample = to_pcm(warm * AMPLITUDE);
        }
    }

    pub fn deep_hum_into(&mut self, buffer: &mut [i16]) {
        for sample in buffer.iter_mut() {
            let breath = self.hum_breath.next_sample();

            let mut tone = 0.0;
            for (partial, &(_, weight)) in self.hum_partials.iter_mut().zip(HUM_PARTIALS.iter()) {
                tone += partial.next_sample() * weight;
            }
            let texture = self.hum_noise.next_sample() * HUM_NOISE;

            let value = self.hum_smoother.process((tone + texture) * breath);
            *sample = to_pcm((value * AMPLITUDE).clamp(-1.0, 1.0));
        }
    }

    /// Phases of root, fifth, octave and sub-octave, in cycles.
    pub fn drone_phases(&self) -> [f32; 4] {
        [
            self.drone_voices[0].phase(),
            self.drone_voices[1].phase(),
            self.drone_voices[2].phase(),
            self.drone_voices[3].phase(),
        ]
    }

    pub fn breath_phase(&self) -> f32 {
        self.hum_breath.phase()
    }

    pub fn reset(&mut self) {
        for voice in self.drone_voices.iter_mut() {
            voice.reset();
        }
        for wobble in self.drone_wobbles.iter_mut() {
            wobble.reset();
        }
        self.drone_smoother.reset();

        for partial in self.hum_partials.iter_mut() {
            partial.reset();
        }
        self.hum_breath.reset();
        self.hum_noise.reset();
        self.hum_smoother.reset();
    }
}
