use crate::audio::catalog::SoundType;
use crate::audio::generators::{
    AmbientGenerator, BinauralGenerator, NatureGenerator, ALPHA_BEAT, BETA_BEAT,
};
use crate::audio::noise::{fill, ClassicNoise};
use crate::config::EngineConfig;

type Render = fn(&mut SoundServer, &mut [i16]);

/// Generator call for each sound, indexed by `SoundType as usize`.
static DISPATCH: [Render; SoundType::COUNT] = [
    |s, buf| fill(&mut s.classic.white, buf),
    |s, buf| fill(&mut s.classic.brown, buf),
    |s, buf| fill(&mut s.classic.pink, buf),
    |s, buf| s.binaural.generate_into(ALPHA_BEAT, buf),
    |s, buf| s.binaural.generate_into(BETA_BEAT, buf),
    |s, buf| s.nature.soft_rain_into(buf),
    |s, buf| s.nature.ocean_waves_into(buf),
    |s, buf| s.nature.wind_into(buf),
    |s, buf| s.ambient.lofi_drone_into(buf),
    |s, buf| s.ambient.deep_hum_into(buf),
    |_, buf| buf.fill(0),
];

/// Single entry point mapping a sound to the generator that renders it.
///
/// Owns one instance of every category generator. Not shared across
/// sessions; the playback worker holds it exclusively.
pub struct SoundServer {
    classic: ClassicNoise,
    binaural: BinauralGenerator,
    nature: NatureGenerator,
    ambient: AmbientGenerator,
    sample_rate: u32,
}

impl SoundServer {
    pub fn new(sample_rate: u32) -> Self {
        Self::with_white_smoothing(sample_rate, false)
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_white_smoothing(config.sample_rate, config.smooth_white)
    }

    fn with_white_smoothing(sample_rate: u32, smooth_white: bool) -> Self {
        let rate = sample_rate as f32;
        Self {
            classic: ClassicNoise::new(smooth_white),
            binaural: BinauralGenerator::new(rate),
            nature: NatureGenerator::new(rate),
            ambient: AmbientGenerator::new(rate),
            sample_rate,
        }
    }

    /// Fully reproducible server; every random source is derived from `seed`.
    pub fn with_seed(sample_rate: u32, seed: u64) -> Self {
        Self::seeded(sample_rate, seed, false)
    }

    /// Seeded server honouring the config's sample rate and white smoothing.
    pub fn from_config_seeded(config: &EngineConfig, seed: u64) -> Self {
        Self::seeded(config.sample_rate, seed, config.smooth_white)
    }

    fn seeded(sample_rate: u32, seed: u64, smooth_white: bool) -> Self {
        let rate = sample_rate as f32;
        Self {
            classic: ClassicNoise::with_seed(seed, smooth_white),
            binaural: BinauralGenerator::new(rate),
            nature: NatureGenerator::with_seed(rate, seed.wrapping_add(16)),
            ambient: AmbientGenerator::with_seed(rate, seed.wrapping_add(32)),
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn requires_stereo(&self, sound: SoundType) -> bool {
        sound.requires_stereo()
    }

    /// `count` frames of `sound`: `count` samples for mono sounds, `2 * count`
    /// interleaved samples for stereo ones.
    pub fn generate(&mut self, sound: SoundType, count: usize) -> Vec<i16> {
        let mut buffer = vec![0; count * sound.channels() as usize];
        self.generate_into(sound, &mut buffer);
        buffer
    }

    /// Render into a caller-owned buffer already sized for the sound's channel count.
    pub fn generate_into(&mut self, sound: SoundType, buffer: &mut [i16]) {
        DISPATCH[sound as usize](self, buffer);
    }

    /// Return every generator to its initial state.
    pub fn reset(&mut self) {
        self.classic.reset();
        self.binaural.reset();
        self.nature.reset();
        self.ambient.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SAMPLE_RATE;

    #[test]
    fn test_off_is_silence() {
        let mut server = SoundServer::new(SAMPLE_RATE);
        for n in [0, 1, 512, 4096] {
            let buffer = server.generate(SoundType::Off, n);
            assert_eq!(buffer.len(), n);
            assert!(buffer.iter().all(|&s| s == 0));
        }

        // Off also clears a dirty caller buffer
        let mut dirty = vec![123i16; 64];
        server.generate_into(SoundType::Off, &mut dirty);
        assert!(dirty.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_buffer_sizing_follows_channel_count() {
        let mut server = SoundServer::new(SAMPLE_RATE);
        for sound in SoundType::ALL {
            for n in [1, 100, 4096] {
                let buffer = server.generate(sound, n);
                let expected = if sound.requires_stereo() { 2 * n } else { n };
                assert_eq!(buffer.len(), expected, "{:?} with {} frames", sound, n);
            }
        }
    }

    #[test]
    fn test_every_sound_makes_sound() {
        let mut server = SoundServer::new(SAMPLE_RATE);
        for sound in SoundType::ALL.into_iter().filter(|s| *s != SoundType::Off) {
            server.reset();
            let buffer = server.generate(sound, SAMPLE_RATE as usize);
            let energy: f64 = buffer.iter().map(|&s| (s as f64).powi(2)).sum();
            println!("{:?}: energy {:.3e}", sound, energy);
            assert!(energy > 0.0, "{:?} produced silence", sound);
        }
    }

    #[test]
    fn test_seeded_servers_are_identical_after_reset() {
        let mut a = SoundServer::with_seed(SAMPLE_RATE, 42);
        let mut b = SoundServer::with_seed(SAMPLE_RATE, 42);
        for sound in SoundType::ALL {
            a.reset();
            b.reset();
            assert_eq!(a.generate(sound, 2048), b.generate(sound, 2048), "{:?}", sound);
        }
    }

    #[test]
    fn test_seeded_config_keeps_white_smoothing() {
        let config = EngineConfig {
            smooth_white: true,
            ..EngineConfig::default()
        };
        let smoothed = SoundServer::from_config_seeded(&config, 9).generate(SoundType::White, 8192);
        let raw = SoundServer::with_seed(SAMPLE_RATE, 9).generate(SoundType::White, 8192);

        // Sample-to-sample movement is what the smoothing cascade removes
        let roughness = |samples: &[i16]| -> f64 {
            samples
                .windows(2)
                .map(|w| (w[1] as f64 - w[0] as f64).abs())
                .sum::<f64>()
                / samples.len() as f64
        };
        println!("Roughness: raw {:.1}, smoothed {:.1}", roughness(&raw), roughness(&smoothed));
        assert!(roughness(&smoothed) < roughness(&raw) * 0.5);
    }

    #[test]
    fn test_reset_isolates_sound_changes() {
        // Pink state left over from earlier output must not leak into the next session
        let mut fresh = SoundServer::with_seed(SAMPLE_RATE, 7);
        fresh.reset();
        let expected = fresh.generate(SoundType::Pink, 1024);

        let mut used = SoundServer::with_seed(SAMPLE_RATE, 7);
        used.generate(SoundType::Pink, 5000);
        used.generate(SoundType::SoftRain, 5000);
        used.reset();
        assert_eq!(used.generate(SoundType::Pink, 1024), expected);
    }
}
