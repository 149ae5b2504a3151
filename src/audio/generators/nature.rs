use crate::audio::filters::OnePoleFilter;
use crate::audio::modulators::Lfo;
use crate::audio::noise::{BrownNoise, PinkNoise};
use crate::audio::oscillators::{sine, NoiseGenerator, PhaseGenerator};
use crate::audio::{to_pcm, AudioGenerator, TWO_PI};

const AMPLITUDE: f32 = 0.12;

// Rain
const RAIN_BED_LEVEL: f32 = 0.6;
const DROPLET_PROBABILITY: f32 = 0.0001;
const DROPLET_DECAY: f32 = 0.9985;
const DROPLET_FLOOR: f32 = 0.001;
const DROPLET_MIX: f32 = 0.2;
pub const MAX_DROPLETS: usize = 10;

// Ocean
const WAVE_PERIOD_SECS: f32 = 12.0;
const OCEAN_INTEGRATION: f32 = 0.01;

// Wind
const WIND_INTEGRATION: f32 = 0.008;
const WIND_GUST_RATE: f32 = 0.05;
const WIND_GAIN_RANGE: (f32, f32) = (0.2, 0.8);

// Makeup gain for the heavily smoothed brown beds
const BED_GAIN: f32 = 6.0;

/// Short damped sine burst riding on the rain bed.
#[derive(Debug, Clone, Copy)]
struct Droplet {
    amplitude: f32,
    phase_increment: f32,
    phase: f32,
}

impl Droplet {
    fn next_sample(&mut self) -> f32 {
        let sample = sine(self.phase) * self.amplitude * soft_attack(self.amplitude);
        self.phase += self.phase_increment;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        self.amplitude *= DROPLET_DECAY;
        sample
    }

    fn is_audible(&self) -> bool {
        self.amplitude >= DROPLET_FLOOR
    }
}

// Quieter droplets are rounded off harder
fn soft_attack(amplitude: f32) -> f32 {
    1.0 - (-amplitude * 10.0).exp()
}

/// Soft rain, ocean waves and wind.
pub struct NatureGenerator {
    sample_rate: f32,
    events: NoiseGenerator,

    // Rain
    rain_pink: PinkNoise,
    rain_pink_smoother: OnePoleFilter,
    rain_mix_smoother: OnePoleFilter,
    droplets: Vec<Droplet>,

    // Ocean
    ocean_brown: BrownNoise,
    ocean_smoother: OnePoleFilter,
    wave: PhaseGenerator,

    // Wind
    wind_brown: BrownNoise,
    wind_smoother: OnePoleFilter,
    gusts: [Lfo; 3],
    last_gust: f32,
}

impl NatureGenerator {
    pub fn new(sample_rate: f32) -> Self {
        Self::with_sources(
            sample_rate,
            [
                NoiseGenerator::new(),
                NoiseGenerator::new(),
                NoiseGenerator::new(),
                NoiseGenerator::new(),
            ],
        )
    }

    pub fn with_seed(sample_rate: f32, seed: u64) -> Self {
        Self::with_sources(
            sample_rate,
            [
                NoiseGenerator::with_seed(seed),
                NoiseGenerator::with_seed(seed.wrapping_add(1)),
                NoiseGenerator::with_seed(seed.wrapping_add(2)),
                NoiseGenerator::with_seed(seed.wrapping_add(3)),
            ],
        )
    }

    fn with_sources(sample_rate: f32, sources: [NoiseGenerator; 4]) -> Self {
        let [events, rain, ocean, wind] = sources;
        Self {
            sample_rate,
            events,

            rain_pink: PinkNoise::new(rain),
            rain_pink_smoother: OnePoleFilter::new(0.7),
            rain_mix_smoother: OnePoleFilter::new(0.8),
            droplets: Vec::with_capacity(MAX_DROPLETS),

            ocean_brown: BrownNoise::with_integration(ocean, OCEAN_INTEGRATION),
            ocean_smoother: OnePoleFilter::new(0.9),
            wave: PhaseGenerator::new(1.0 / WAVE_PERIOD_SECS, sample_rate),

            wind_brown: BrownNoise::with_integration(wind, WIND_INTEGRATION),
            wind_smoother: OnePoleFilter::new(0.95),
            // Unrelated slow rates so the gusting never audibly repeats
            gusts: [
                Lfo::new(WIND_GUST_RATE, 0.2, 0.0, sample_rate),
                Lfo::new(WIND_GUST_RATE * 0.3, 0.15, 0.0, sample_rate),
                Lfo::new(WIND_GUST_RATE * 0.7, 0.1, 0.0, sample_rate),
            ],
            last_gust: 0.0,
        }
    }

    pub fn generate_soft_rain(&mut self, count: usize) -> Vec<i16> {
        let mut buffer = vec![0; count];
        self.soft_rain_into(&mut buffer);
        buffer
    }

    pub fn generate_ocean_waves(&mut self, count: usize) -> Vec<i16> {
        let mut buffer = vec![0; count];
        self.ocean_waves_into(&mut buffer);
        buffer
    }

    pub fn generate_wind(&mut self, count: usize) -> Vec<i16> {
        let mut buffer = vec![0; count];
        self.wind_into(&mut buffer);
        buffer
    }

    pub fn soft_rain_into(&mut self, buffer: &mut [i16]) {
        for sample in buffer.iter_mut() {
            let bed = self.rain_pink_smoother.process(self.rain_pink.next_raw()) * RAIN_BED_LEVEL;

            if self.events.chance(DROPLET_PROBABILITY) {
                self.spawn_droplet();
            }

            let mut droplet_sum = 0.0;
            for droplet in self.droplets.iter_mut() {
                droplet_sum += droplet.next_sample();
            }
            self.droplets.retain(Droplet::is_audible);

            let mix = self.rain_mix_smoother.process(bed + droplet_sum * DROPLET_MIX);
            *sample = to_pcm((mix * AMPLITUDE).clamp(-1.0, 1.0));
        }
    }

    fn spawn_droplet(&mut self) {
        if self.droplets.len() >= MAX_DROPLETS {
            // Oldest droplet is also the quietest
            self.droplets.remove(0);
        }
        let frequency = self.events.range(2000.0, 3500.0);
        self.droplets.push(Droplet {
            amplitude: self.events.range(0.05, 0.2),
            phase_increment: frequency / self.sample_rate,
            phase: 0.0,
        });
    }

    pub fn ocean_waves_into(&mut self, buffer: &mut [i16]) {
        for sample in buffer.iter_mut() {
            let bed = self.ocean_smoother.process(self.ocean_brown.next_raw());

            // sin(phase * π)² over the wave period, lifted so troughs never go silent
            let crest = sine(self.wave.next_sample() * 0.5);
            let envelope = crest * crest * 0.5 + 0.3;

            let value = bed * BED_GAIN * envelope * AMPLITUDE;
            *sample = to_pcm(value.clamp(-1.0, 1.0));
        }
    }

    pub fn wind_into(&mut self, buffer: &mut [i16]) {
        let (floor, ceiling) = WIND_GAIN_RANGE;
        for sample in buffer.iter_mut() {
            let bed = self.wind_smoother.process(self.wind_brown.next_raw());

            let swell: f32 = self.gusts.iter_mut().map(Lfo::next_sample).sum();
            let gust = (swell + 0.55).clamp(floor, ceiling);
            self.last_gust = gust;

            let value = bed * BED_GAIN * gust * AMPLITUDE;
            *sample = to_pcm(value.clamp(-1.0, 1.0));
        }
    }

    pub fn droplet_count(&self) -> usize {
        self.droplets.len()
    }

    /// Wind gain applied to the most recent sample.
    pub fn gust_level(&self) -> f32 {
        self.last_gust
    }

    /// Ocean wave phase in radians.
    pub fn wave_phase(&self) -> f32 {
        self.wave.phase() * TWO_PI
    }

    pub fn reset(&mut self) {
        self.events.reset();

        self.rain_pink.reset();
        self.rain_pink_smoother.reset();
        self.rain_mix_smoother.reset();
        self.droplets.clear();

        self.ocean_brown.reset();
        self.ocean_smoother.reset();
        self.wave.reset();

        self.wind_brown.reset();
        self.wind_smoother.reset();
        for gust in self.gusts.iter_mut() {
            gust.reset();
        }
        self.last_gust = 0.0;
    }
}
