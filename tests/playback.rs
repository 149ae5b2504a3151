use focus_sounds_lib::audio_output::{
    DeviceConfig, DeviceFactory, DeviceRequest, OutputDevice, PcmWriter,
};
use focus_sounds_lib::{DeviceError, EngineConfig, FocusNoisePlayer, PlaybackState, SoundType};
use more_asserts::{assert_ge, assert_gt, assert_lt};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct WriteRecord {
    channels: u16,
    len: usize,
    peak: u16,
    last: u16,
    rms: f32,
}

#[derive(Default)]
struct MockState {
    opens: AtomicUsize,
    releases: AtomicUsize,
    writes: Mutex<Vec<WriteRecord>>,
    /// Taken by the next device opened; its writer fails after that many writes.
    fail_after: Mutex<Option<usize>>,
    fail_open: AtomicBool,
    fail_writer: AtomicBool,
}

impl MockState {
    fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    fn writes(&self) -> Vec<WriteRecord> {
        self.writes.lock().unwrap().clone()
    }

    fn clear_writes(&self) {
        self.writes.lock().unwrap().clear();
    }
}

struct MockFactory {
    state: Arc<MockState>,
}

impl DeviceFactory for MockFactory {
    fn open(&self, request: &DeviceRequest) -> Result<Box<dyn OutputDevice>, DeviceError> {
        if self.state.fail_open.load(Ordering::SeqCst) {
            return Err(DeviceError::NoDevice);
        }
        self.state.opens.fetch_add(1, Ordering::SeqCst);
        let fail_after = self.state.fail_after.lock().unwrap().take();
        Ok(Box::new(MockDevice {
            config: DeviceConfig::sized(request, 512),
            writer: Some(MockWriter {
                channels: request.channels,
                state: Arc::clone(&self.state),
                written: 0,
                fail_after,
            }),
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockDevice {
    config: DeviceConfig,
    writer: Option<MockWriter>,
    state: Arc<MockState>,
}

impl OutputDevice for MockDevice {
    fn config(&self) -> &DeviceConfig {
        &self.config
    }

    fn writer(&mut self) -> Result<Box<dyn PcmWriter>, DeviceError> {
        if self.state.fail_writer.load(Ordering::SeqCst) {
            return Err(DeviceError::Other("stream refused to start".into()));
        }
        match self.writer.take() {
            Some(writer) => Ok(Box::new(writer)),
            None => Err(DeviceError::Other("writer already taken".into())),
        }
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        self.state.releases.fetch_add(1, Ordering::SeqCst);
    }
}

struct MockWriter {
    channels: u16,
    state: Arc<MockState>,
    written: usize,
    fail_after: Option<usize>,
}

impl PcmWriter for MockWriter {
    fn write(&mut self, samples: &[i16]) -> Result<(), DeviceError> {
        if self.fail_after.is_some_and(|limit| self.written >= limit) {
            return Err(DeviceError::Disconnected);
        }
        self.written += 1;
        // Stand-in for the device draining its buffer
        thread::sleep(Duration::from_millis(1));
        let energy: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
        self.state.writes.lock().unwrap().push(WriteRecord {
            channels: self.channels,
            len: samples.len(),
            peak: samples.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0),
            last: samples.last().map_or(0, |s| s.unsigned_abs()),
            rms: (energy / samples.len().max(1) as f64).sqrt() as f32,
        });
        Ok(())
    }
}

fn test_config() -> EngineConfig {
    EngineConfig {
        fade_in_secs: 0.1,
        fade_out_secs: 0.2,
        transition_secs: 0.1,
        ..EngineConfig::default()
    }
}

fn mock_player(config: EngineConfig) -> (FocusNoisePlayer, Arc<MockState>) {
    let state = Arc::new(MockState::default());
    let factory = MockFactory {
        state: Arc::clone(&state),
    };
    (FocusNoisePlayer::with_factory(config, Box::new(factory)), state)
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}

#[test]
fn test_pink_then_binaural_then_stop() {
    let (mut player, state) = mock_player(test_config());

    player.play(SoundType::Pink);
    assert!(player.is_playing());
    assert_eq!(player.state(), PlaybackState::Playing);
    assert_eq!(player.current_type(), SoundType::Pink);
    assert_eq!(state.opens(), 1);

    // Default floor of 4096 frames doubles to 8192; each write is half of that
    assert!(wait_until(|| state.writes().len() >= 3));
    for write in state.writes() {
        assert_eq!(write.channels, 1);
        assert_eq!(write.len, 4096);
    }

    player.play(SoundType::BinauralAlpha);
    assert_eq!(state.opens(), 2);
    assert_eq!(state.releases(), 1);
    assert_eq!(player.current_type(), SoundType::BinauralAlpha);
    assert!(player.is_playing());

    state.clear_writes();
    assert!(wait_until(|| state.writes().len() >= 3));
    for write in state.writes() {
        assert_eq!(write.channels, 2);
        assert_eq!(write.len, 8192);
    }

    player.stop();
    assert!(!player.is_playing());
    assert_eq!(player.state(), PlaybackState::Stopped);
    assert_eq!(state.releases(), 2);
    // The last selection survives stop
    assert_eq!(player.current_type(), SoundType::BinauralAlpha);
}

#[test]
fn test_fade_in_reaches_audible_level() {
    let (mut player, state) = mock_player(test_config());
    player.play(SoundType::White);

    // 0.1 s fade-in is shorter than two chunks
    assert!(wait_until(|| state.writes().len() >= 4));
    let writes = state.writes();
    assert_ge!(writes.len(), 4);
    assert_gt!(writes[3].peak, 1000);
    player.stop();
}

#[test]
fn test_same_channel_switch_keeps_device() {
    let (mut player, state) = mock_player(test_config());

    player.play(SoundType::White);
    player.play(SoundType::Brown);
    player.set_noise_type(SoundType::SoftRain);
    assert_eq!(state.opens(), 1);
    assert_eq!(state.releases(), 0);
    assert_eq!(player.current_type(), SoundType::SoftRain);

    player.play(SoundType::BinauralBeta);
    player.set_noise_type(SoundType::BinauralAlpha);
    assert_eq!(state.opens(), 2);

    player.set_noise_type(SoundType::DeepHum);
    assert_eq!(state.opens(), 3);
    assert_eq!(state.releases(), 2);
    assert!(player.is_playing());

    player.release();
    assert_eq!(state.releases(), 3);
}

#[test]
fn test_off_stops_playback() {
    let (mut player, state) = mock_player(test_config());

    player.play(SoundType::OceanWaves);
    assert!(player.is_playing());

    player.play(SoundType::Off);
    assert!(!player.is_playing());
    assert_eq!(player.state(), PlaybackState::Stopped);
    assert_eq!(state.releases(), 1);
    assert_eq!(player.current_type(), SoundType::OceanWaves);

    // Off with nothing playing opens nothing
    player.set_noise_type(SoundType::Off);
    assert_eq!(state.opens(), 1);
}

#[test]
fn test_write_failure_ends_session_and_recovers() {
    let (mut player, state) = mock_player(test_config());
    *state.fail_after.lock().unwrap() = Some(3);

    player.play(SoundType::Wind);
    assert!(wait_until(|| !player.is_playing()));
    assert_eq!(player.state(), PlaybackState::Stopped);
    assert_eq!(state.writes().len(), 3);
    assert_eq!(state.releases(), 1);

    player.play(SoundType::Wind);
    assert_eq!(state.opens(), 2);
    assert!(player.is_playing());

    player.stop();
    assert_eq!(state.releases(), 2);
}

#[test]
fn test_write_failure_releases_without_further_calls() {
    let (mut player, state) = mock_player(test_config());
    *state.fail_after.lock().unwrap() = Some(3);

    player.play(SoundType::Pink);
    // Nothing touches the player after the failure; the worker drops the device itself
    assert!(wait_until(|| state.releases() == 1));
    assert_eq!(state.opens(), 1);
    assert!(!player.is_playing());
}

#[test]
fn test_open_failure_leaves_player_stopped() {
    let (mut player, state) = mock_player(test_config());
    state.fail_open.store(true, Ordering::SeqCst);

    player.play(SoundType::Brown);
    assert!(!player.is_playing());
    assert_eq!(player.state(), PlaybackState::Stopped);
    assert_eq!(state.releases(), 0);
    assert!(state.writes().is_empty());

    state.fail_open.store(false, Ordering::SeqCst);
    player.play(SoundType::Brown);
    assert!(player.is_playing());
    assert_eq!(state.opens(), 1);
    player.stop();
    assert_eq!(state.releases(), 1);
}

#[test]
fn test_writer_failure_releases_device() {
    let (mut player, state) = mock_player(test_config());
    state.fail_writer.store(true, Ordering::SeqCst);

    player.play(SoundType::BinauralAlpha);
    assert!(!player.is_playing());
    assert_eq!(player.state(), PlaybackState::Stopped);
    assert_eq!(state.opens(), 1);
    assert_eq!(state.releases(), 1);

    // stop on a player whose start failed is a no-op
    player.stop();
    assert_eq!(state.releases(), 1);
}

#[test]
fn test_stop_fades_to_silence() {
    let (mut player, state) = mock_player(test_config());
    player.play(SoundType::White);
    assert!(wait_until(|| state.writes().len() >= 4));

    state.clear_writes();
    player.stop();
    assert_eq!(state.releases(), 1);

    let writes = state.writes();
    assert!(!writes.is_empty());
    let first = writes[0];
    let last = writes[writes.len() - 1];
    println!(
        "Fade-out over {} writes, first peak {}, last peak {}",
        writes.len(),
        first.peak,
        last.peak
    );
    assert_eq!(last.last, 0);
    assert_lt!(last.peak, first.peak / 4);
}

#[test]
fn test_transition_ramps_from_partial_volume() {
    let config = EngineConfig {
        transition_secs: 0.5,
        ..test_config()
    };
    let (mut player, state) = mock_player(config);

    player.play(SoundType::White);
    // Well past the 0.1 s fade-in
    assert!(wait_until(|| state.writes().len() >= 6));
    let full = state.writes()[5].rms;
    assert_gt!(full, 1000.0);

    state.clear_writes();
    player.set_noise_type(SoundType::White);
    assert!(wait_until(|| state.writes().len() >= 3));

    // A write already in flight can still be at full volume; the ramp follows it
    let quietest = state
        .writes()
        .iter()
        .map(|w| w.rms)
        .fold(f32::MAX, f32::min);
    println!("Full rms {:.1}, quietest after transition {:.1}", full, quietest);
    assert_lt!(quietest, full * 0.6);
    player.stop();
}

#[test]
fn test_stop_and_release_are_idempotent() {
    let (mut player, state) = mock_player(test_config());

    player.stop();
    player.release();
    assert_eq!(player.state(), PlaybackState::Stopped);
    assert_eq!(state.opens(), 0);

    player.play(SoundType::LoFiDrone);
    player.stop();
    player.stop();
    player.release();
    player.release();
    assert_eq!(state.opens(), 1);
    assert_eq!(state.releases(), 1);
}

#[test]
fn test_immediate_stop_policy() {
    let config = EngineConfig {
        stop_policy: focus_sounds_lib::StopPolicy::Immediate,
        ..test_config()
    };
    let (mut player, state) = mock_player(config);

    player.play(SoundType::Pink);
    player.stop();
    assert!(!player.is_playing());
    assert_eq!(state.releases(), 1);
}

#[test]
fn test_drop_releases_device() {
    let (mut player, state) = mock_player(test_config());
    player.play(SoundType::BinauralBeta);
    drop(player);
    assert_eq!(state.releases(), 1);
}

#[test]
fn test_default_type_before_any_play() {
    let (player, _) = mock_player(test_config());
    assert_eq!(player.current_type(), SoundType::White);
    assert!(!player.is_playing());
}
