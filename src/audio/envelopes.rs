use crate::audio::sec_to_samples;

/// Ease-in-out: `2t²` below the midpoint, `1 - (-2t + 2)² / 2` above.
fn s_curve(progress: f32) -> f32 {
    let t = progress.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum FadeState {
    /// Holding a constant level.
    Steady,
    /// Moving from `start_level` to `target_level`.
    Ramping,
    /// A fade-out has completed; the session should end.
    Finished,
}

/// Session volume envelope applied to every output frame.
///
/// Handles the start-of-session fade-in, the partial-volume transition used
/// on sound changes, and the stop fade-out.
pub struct FadeEnvelope {
    sample_rate: u32,

    pub(crate) state: FadeState,
    current_level: f32,
    start_level: f32,
    target_level: f32,
    ramp_samples: u32,
    current_sample: u32,
}

impl FadeEnvelope {
    /// A silent envelope waiting for its first ramp.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            state: FadeState::Steady,
            current_level: 0.0,
            start_level: 0.0,
            target_level: 0.0,
            ramp_samples: 0,
            current_sample: 0,
        }
    }

    pub fn fade_in(&mut self, seconds: f32) {
        self.ramp(0.0, 1.0, seconds);
    }

    /// Ramp from `from_level` up to full volume.
    pub fn transition(&mut self, from_level: f32, seconds: f32) {
        self.ramp(from_level.clamp(0.0, 1.0), 1.0, seconds);
    }

    /// Like `transition`, but never raises a level already below `from_level`.
    pub fn dip(&mut self, from_level: f32, seconds: f32) {
        let from = from_level.min(self.current_level);
        self.transition(from, seconds);
    }

    /// Ramp from wherever the envelope is now down to silence.
    pub fn fade_out(&mut self, seconds: f32) {
        let from = self.current_level;
        self.ramp(from, 0.0, seconds);
        if self.state == FadeState::Steady {
            self.state = FadeState::Finished;
        }
    }

    pub fn set_level(&mut self, level: f32) {
        self.current_level = level.clamp(0.0, 1.0);
        self.state = FadeState::Steady;
    }

    fn ramp(&mut self, from: f32, to: f32, seconds: f32) {
        self.start_level = from;
        self.target_level = to;
        self.current_level = from;
        self.current_sample = 0;
        self.ramp_samples = sec_to_samples(seconds, self.sample_rate);

        if self.ramp_samples == 0 {
            self.current_level = to;
            self.state = FadeState::Steady;
        } else {
            self.state = FadeState::Ramping;
        }
    }

    pub fn current_level(&self) -> f32 {
        self.current_level
    }

    pub fn is_ramping(&self) -> bool {
        self.state == FadeState::Ramping
    }

    /// True once a fade-out has reached silence.
    pub fn is_finished(&self) -> bool {
        self.state == FadeState::Finished
    }

    /// Advance one frame and return the volume for it.
    pub fn next_sample(&mut self) -> f32 {
        if self.state != FadeState::Ramping {
            return self.current_level;
        }

        self.current_sample += 1;
        if self.current_sample >= self.ramp_samples {
            self.current_level = self.target_level;
            self.state = if self.target_level <= 0.0 {
                FadeState::Finished
            } else {
                FadeState::Steady
            };
        } else {
            let progress = self.current_sample as f32 / self.ramp_samples as f32;
            let shaped = s_curve(progress);
            self.current_level = self.start_level + (self.target_level - self.start_level) * shaped;
        }
        self.current_level
    }

    /// Scale an interleaved PCM buffer in place, one volume step per frame.
    pub fn apply(&mut self, buffer: &mut [i16], channels: usize) {
        let channels = channels.max(1);
        if !self.is_ramping() && self.current_level >= 1.0 {
            return;
        }
        for frame in buffer.chunks_mut(channels) {
            let volume = self.next_sample();
            for sample in frame.iter_mut() {
                let scaled = *sample as f32 * volume;
                *sample = scaled.clamp(-32768.0, 32767.0) as i16;
            }
        }
    }
}
