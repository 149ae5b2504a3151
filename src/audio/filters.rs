/// Single-pole lowpass smoother: `y[n] = y[n-1] * a + x[n] * (1 - a)`.
///
/// Every noise bed in this crate is shaped by one or more of these.
pub struct OnePoleFilter {
    state: f32,
    b1: f32,
    a0: f32,
}

impl OnePoleFilter {
    /// Build from the feedback coefficient `a` directly. Clamped to [0, 1).
    pub fn new(coefficient: f32) -> Self {
        let b1 = coefficient.clamp(0.0, 0.9999);
        Self {
            state: 0.0,
            b1,
            a0: 1.0 - b1,
        }
    }

    pub fn state(&self) -> f32 {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = 0.0;
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.state = self.b1 * self.state + self.a0 * input;
        self.state
    }
}

/// Cascade of one-pole smoothers run in series.
pub struct SmoothingCascade<const N: usize> {
    stages: [OnePoleFilter; N],
}

impl<const N: usize> SmoothingCascade<N> {
    pub fn new(coefficients: [f32; N]) -> Self {
        Self {
            stages: coefficients.map(OnePoleFilter::new),
        }
    }

    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.stages
            .iter_mut()
            .fold(input, |signal, stage| stage.process(signal))
    }
}

/// Smooth rounding towards `±ceiling`, never a hard corner.
///
/// Below the knee the signal passes untouched; above it a tanh curve eases
/// the remaining headroom so the output approaches but never exceeds the
/// ceiling.
pub fn soft_saturate(x: f32, ceiling: f32) -> f32 {
    let knee = ceiling * 0.5;
    let magnitude = x.abs();
    if magnitude <= knee {
        return x;
    }
    let headroom = ceiling - knee;
    let shaped = knee + headroom * ((magnitude - knee) / headroom).tanh();
    shaped.copysign(x)
}
