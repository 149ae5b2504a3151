//! Playback engine: owns the session worker and its output device.
//!
//! ```text
//! Stopped -> Starting -> Playing -> Stopping -> Stopped
//! ```
//!
//! There is no pause; pausing is stopping. Device failures never escape this
//! module. They are logged and the session ends in `Stopped`.
//!
//! The device is opened, streamed to and dropped on the worker thread, so it
//! is released as soon as the worker exits, whichever way it exits.

use crate::audio::catalog::SoundType;
use crate::audio::envelopes::FadeEnvelope;
use crate::audio::server::SoundServer;
use crate::audio_output::{CpalDeviceFactory, DeviceConfig, DeviceFactory, DeviceRequest, PcmWriter};
use crate::commands::{session_commands, SessionCommand, SessionCommandReceiver, SessionCommandSender};
use crate::config::EngineConfig;
use crate::error::DeviceError;
use crossbeam::channel::{self, Sender};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Starting,
    Playing,
    Stopping,
}

#[derive(Debug, Clone, Copy)]
enum StartRamp {
    FadeIn,
    Transition,
}

/// Controller's handle on one streaming session.
struct Session {
    channels: u16,
    commands: SessionCommandSender,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl Session {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Wait for the worker to exit. The device is gone once this returns.
    fn finish(mut self) {
        self.join();
    }

    fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Playback worker panicked");
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.running.store(false, Ordering::Release);
            self.join();
        }
    }
}

/// Everything the worker needs, moved onto its thread.
struct ProductionLoop {
    server: SoundServer,
    commands: SessionCommandReceiver,
    running: Arc<AtomicBool>,
    envelope: FadeEnvelope,
    sound: SoundType,
}

impl ProductionLoop {
    /// Open the device on this thread, report how it opened, stream until
    /// stopped, then release the device before clearing the running flag.
    fn run(
        self,
        factory: Arc<dyn DeviceFactory>,
        request: DeviceRequest,
        ready: Sender<Result<DeviceConfig, DeviceError>>,
    ) {
        let running = Arc::clone(&self.running);

        let opened = factory.open(&request).and_then(|mut device| {
            let writer = device.writer()?;
            Ok((device, writer))
        });
        let (device, writer) = match opened {
            Ok(opened) => opened,
            Err(e) => {
                running.store(false, Ordering::Release);
                let _ = ready.send(Err(e));
                return;
            }
        };

        let config = *device.config();
        if ready.send(Ok(config)).is_ok() {
            self.stream(writer, &config);
        }

        drop(device);
        debug!("Released {} channel device", config.channels);
        running.store(false, Ordering::Release);
    }

    fn stream(mut self, mut writer: Box<dyn PcmWriter>, config: &DeviceConfig) {
        let channels = config.channels as usize;
        let mut buffer = vec![0i16; config.chunk_samples()];
        self.server.reset();

        while self.running.load(Ordering::Acquire) {
            let Self {
                commands,
                server,
                envelope,
                sound,
                ..
            } = &mut self;
            commands.drain(|command| match command {
                SessionCommand::SetSound(next) => {
                    *sound = next;
                    server.reset();
                }
                SessionCommand::Transition {
                    sound: next,
                    from_volume,
                    seconds,
                } => {
                    *sound = next;
                    server.reset();
                    envelope.dip(from_volume, seconds);
                }
                SessionCommand::FadeOut { seconds } => envelope.fade_out(seconds),
            });

            self.server.generate_into(self.sound, &mut buffer);
            self.envelope.apply(&mut buffer, channels);

            if let Err(e) = writer.write(&buffer) {
                warn!("Audio write failed, ending session: {}", e);
                break;
            }

            if self.envelope.is_finished() {
                break;
            }
        }

        debug!("Production loop exited");
    }
}

/// Control surface for focus sound playback.
pub struct FocusNoisePlayer {
    config: EngineConfig,
    factory: Arc<dyn DeviceFactory>,
    session: Option<Session>,
    current: AtomicU8,
    state: PlaybackState,
}

impl FocusNoisePlayer {
    /// Player on the default cpal output device.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_factory(config, Box::new(CpalDeviceFactory))
    }

    pub fn with_factory(config: EngineConfig, factory: Box<dyn DeviceFactory>) -> Self {
        Self {
            config,
            factory: Arc::from(factory),
            session: None,
            current: AtomicU8::new(SoundType::White.tag()),
            state: PlaybackState::Stopped,
        }
    }

    /// Start `sound`, or switch to it if already playing.
    ///
    /// Same channel layout: the generators are reset and the device is kept.
    /// Different layout: the device is torn down and reopened. `Off` stops.
    pub fn play(&mut self, sound: SoundType) {
        self.change_sound(sound, false);
    }

    /// Like [`play`](Self::play), but ramps in from a partial volume instead
    /// of cutting straight to the new sound.
    pub fn set_noise_type(&mut self, sound: SoundType) {
        self.change_sound(sound, true);
    }

    fn change_sound(&mut self, sound: SoundType, soften: bool) {
        self.reap_finished_session();

        if sound == SoundType::Off {
            self.stop();
            return;
        }

        self.current.store(sound.tag(), Ordering::Release);

        match self.session.as_ref() {
            Some(session) if session.channels == sound.channels() => {
                let command = if soften {
                    SessionCommand::Transition {
                        sound,
                        from_volume: self.config.transition_start_volume,
                        seconds: self.config.transition_secs,
                    }
                } else {
                    SessionCommand::SetSound(sound)
                };
                session.commands.send(command);
                info!("Switched to {}", sound.display_name());
            }
            Some(_) => {
                info!(
                    "Switching to {} needs {} channel(s), reopening device",
                    sound.display_name(),
                    sound.channels()
                );
                self.teardown(0.0);
                let ramp = if soften { StartRamp::Transition } else { StartRamp::FadeIn };
                self.start_session(sound, ramp);
            }
            None => self.start_session(sound, StartRamp::FadeIn),
        }
    }

    fn start_session(&mut self, sound: SoundType, ramp: StartRamp) {
        self.state = PlaybackState::Starting;

        let request = DeviceRequest {
            sample_rate: self.config.sample_rate,
            channels: sound.channels(),
            min_buffer_frames: self.config.min_buffer_frames,
        };

        let mut envelope = FadeEnvelope::new(self.config.sample_rate);
        match ramp {
            StartRamp::FadeIn => envelope.fade_in(self.config.fade_in_secs),
            StartRamp::Transition => envelope.transition(
                self.config.transition_start_volume,
                self.config.transition_secs,
            ),
        }

        let (commands, receiver) = session_commands();
        let running = Arc::new(AtomicBool::new(true));
        let production = ProductionLoop {
            server: SoundServer::from_config(&self.config),
            commands: receiver,
            running: Arc::clone(&running),
            envelope,
            sound,
        };

        let (ready_tx, ready_rx) = channel::bounded(1);
        let factory = Arc::clone(&self.factory);
        let worker = thread::Builder::new()
            .name("focus-audio".into())
            .spawn(move || production.run(factory, request, ready_tx));
        let worker = match worker {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Could not start playback worker: {}", e);
                self.state = PlaybackState::Stopped;
                return;
            }
        };

        let mut session = Session {
            channels: sound.channels(),
            commands,
            running,
            worker: Some(worker),
        };

        match ready_rx.recv() {
            Ok(Ok(device_config)) => {
                info!(
                    "Playing {} ({} channel(s), {} frame buffer)",
                    sound.display_name(),
                    device_config.channels,
                    device_config.buffer_frames
                );
                self.session = Some(session);
                self.state = PlaybackState::Playing;
            }
            Ok(Err(e)) => {
                warn!("Could not open output device: {}", e);
                session.join();
                self.state = PlaybackState::Stopped;
            }
            Err(_) => {
                warn!("Playback worker exited before opening the device");
                session.join();
                self.state = PlaybackState::Stopped;
            }
        }
    }

    /// Stop playback and release the device. Safe to call at any time.
    pub fn stop(&mut self) {
        if self.session.is_none() {
            self.state = PlaybackState::Stopped;
            return;
        }
        self.teardown(self.config.effective_fade_out_secs());
        info!("Playback stopped");
    }

    /// End the current session, fading out first when `fade_secs > 0`.
    fn teardown(&mut self, fade_secs: f32) {
        let Some(session) = self.session.take() else {
            return;
        };
        self.state = PlaybackState::Stopping;

        if fade_secs > 0.0 && session.is_running() {
            session.commands.send(SessionCommand::FadeOut { seconds: fade_secs });
        } else {
            session.running.store(false, Ordering::Release);
        }
        session.finish();

        self.state = PlaybackState::Stopped;
    }

    /// Join a worker that ended on its own. Its device is already released.
    fn reap_finished_session(&mut self) {
        if self.session.as_ref().is_some_and(|s| !s.is_running()) {
            if let Some(session) = self.session.take() {
                debug!("Reaping ended session");
                session.finish();
            }
            self.state = PlaybackState::Stopped;
        }
    }

    pub fn is_playing(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_running)
    }

    /// Most recently selected sound. Survives `stop()`.
    pub fn current_type(&self) -> SoundType {
        SoundType::from_tag(self.current.load(Ordering::Acquire)).unwrap_or(SoundType::Off)
    }

    pub fn state(&self) -> PlaybackState {
        match self.session.as_ref() {
            Some(session) if !session.is_running() => PlaybackState::Stopped,
            _ => self.state,
        }
    }

    /// Full teardown at the end of the owner's lifecycle. Idempotent.
    pub fn release(&mut self) {
        self.stop();
    }
}

impl Drop for FocusNoisePlayer {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.running.store(false, Ordering::Release);
            session.finish();
        }
    }
}
